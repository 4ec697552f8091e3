use std::{fmt, str::FromStr};

use url::Url;

use crate::{IdError, OrganizationId, impl_str_serde};

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum AddrError {
    #[error("Invalid backend address ({0})")]
    InvalidUrl(String),

    #[error("Backend address must start with ws:// or wss://")]
    InvalidScheme,

    #[error(transparent)]
    InvalidOrganizationId(#[from] IdError),

    #[error("Backend organization address must contain a `rvk` parameter")]
    MissingVerifyKey,

    #[error("Backend bootstrap address must contain a `bootstrap-token` parameter")]
    MissingBootstrapToken,
}

fn parse_backend_url(raw: &str) -> Result<Url, AddrError> {
    let url = Url::parse(raw).map_err(|_| AddrError::InvalidUrl(raw.to_string()))?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(AddrError::InvalidScheme);
    }

    Ok(url)
}

fn parse_organization_id(url: &Url) -> Result<OrganizationId, AddrError> {
    let raw = url.path().trim_start_matches('/');
    Ok(raw.parse::<OrganizationId>()?)
}

/// `ws|wss://host[:port]`, where the backend listens. The core never
/// connects itself; transport is an external collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BackendAddr {
    url: Url,
}

impl BackendAddr {
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.url
            .port_or_known_default()
            .unwrap_or(if self.url.scheme() == "ws" { 80 } else { 443 })
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

impl FromStr for BackendAddr {
    type Err = AddrError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(BackendAddr { url: parse_backend_url(raw)? })
    }
}

impl fmt::Display for BackendAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.url.as_str().trim_end_matches('/'))
    }
}

impl_str_serde!(BackendAddr);

/// `ws|wss://host[:port]/<organization>?rvk=<key>`. The verify key is kept
/// opaque; only the organization id is interpreted here.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BackendOrganizationAddr {
    url: Url,
    organization_id: OrganizationId,
    root_verify_key: String,
}

impl BackendOrganizationAddr {
    pub fn build(
        backend_addr: &BackendAddr,
        organization_id: OrganizationId,
        root_verify_key: &str,
    ) -> BackendOrganizationAddr {
        let mut url = backend_addr.as_url().clone();
        url.set_path(organization_id.as_str());
        url.set_query(Some(&format!("rvk={}", root_verify_key)));

        BackendOrganizationAddr {
            url,
            organization_id,
            root_verify_key: root_verify_key.to_string(),
        }
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn root_verify_key(&self) -> &str {
        &self.root_verify_key
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

impl FromStr for BackendOrganizationAddr {
    type Err = AddrError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let url = parse_backend_url(raw)?;
        let organization_id = parse_organization_id(&url)?;

        let root_verify_key = url
            .query_pairs()
            .find(|(name, _)| name == "rvk")
            .map(|(_, value)| value.into_owned())
            .ok_or(AddrError::MissingVerifyKey)?;

        Ok(BackendOrganizationAddr { url, organization_id, root_verify_key })
    }
}

impl fmt::Display for BackendOrganizationAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl_str_serde!(BackendOrganizationAddr);

/// `ws|wss://host[:port]/<organization>?bootstrap-token=<token>`, handed to
/// the first device of a new organization.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BackendOrganizationBootstrapAddr {
    url: Url,
    organization_id: OrganizationId,
    bootstrap_token: String,
}

impl BackendOrganizationBootstrapAddr {
    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn bootstrap_token(&self) -> &str {
        &self.bootstrap_token
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

impl FromStr for BackendOrganizationBootstrapAddr {
    type Err = AddrError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let url = parse_backend_url(raw)?;
        let organization_id = parse_organization_id(&url)?;

        let bootstrap_token = url
            .query_pairs()
            .find(|(name, _)| name == "bootstrap-token")
            .map(|(_, value)| value.into_owned())
            .ok_or(AddrError::MissingBootstrapToken)?;

        Ok(BackendOrganizationBootstrapAddr { url, organization_id, bootstrap_token })
    }
}

impl fmt::Display for BackendOrganizationBootstrapAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl_str_serde!(BackendOrganizationBootstrapAddr);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_backend_addr_defaults_ports() {
        let plain: BackendAddr = "ws://example.com".parse().unwrap();
        let tls: BackendAddr = "wss://example.com".parse().unwrap();
        let custom: BackendAddr = "wss://example.com:4443".parse().unwrap();

        assert_eq!(plain.port(), 80);
        assert_eq!(tls.port(), 443);
        assert_eq!(custom.port(), 4443);
    }

    #[rstest]
    #[case("http://example.com")]
    #[case("example.com")]
    #[case("")]
    fn test_backend_addr_rejects_non_websocket(#[case] raw: &str) {
        assert!(raw.parse::<BackendAddr>().is_err());
    }

    #[test]
    fn test_organization_addr_parsing() {
        let addr: BackendOrganizationAddr =
            "wss://example.com/coolorg?rvk=P25B64LK".parse().unwrap();

        assert_eq!(addr.organization_id().as_str(), "coolorg");
        assert_eq!(addr.root_verify_key(), "P25B64LK");
    }

    #[rstest]
    #[case("wss://example.com/coolorg")]
    #[case("wss://example.com/bad!org?rvk=K")]
    #[case("wss://example.com/?rvk=K")]
    fn test_organization_addr_rejections(#[case] raw: &str) {
        assert!(raw.parse::<BackendOrganizationAddr>().is_err());
    }

    #[test]
    fn test_organization_addr_build_round_trip() {
        let backend: BackendAddr = "wss://example.com:4443".parse().unwrap();
        let addr = BackendOrganizationAddr::build(
            &backend,
            "coolorg".parse().unwrap(),
            "P25B64LK",
        );

        let reparsed: BackendOrganizationAddr = addr.to_string().parse().unwrap();
        assert_eq!(reparsed, addr);
    }

    #[test]
    fn test_bootstrap_addr_parsing() {
        let addr: BackendOrganizationBootstrapAddr =
            "wss://example.com/coolorg?bootstrap-token=123abc".parse().unwrap();

        assert_eq!(addr.organization_id().as_str(), "coolorg");
        assert_eq!(addr.bootstrap_token(), "123abc");

        assert!(
            "wss://example.com/coolorg?rvk=K"
                .parse::<BackendOrganizationBootstrapAddr>()
                .is_err()
        );
    }
}
