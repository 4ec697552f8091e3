use std::{fmt, str::FromStr, sync::LazyLock};

use crate::impl_str_serde;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid organization id: {0}")]
    InvalidOrganizationId(String),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Invalid device name: {0}")]
    InvalidDeviceName(String),

    #[error("Invalid device id: {0}")]
    InvalidDeviceId(String),
}

static ID_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\w{1,32}$").unwrap()
});

static DEVICE_ID_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\w{1,32}@\w{1,32}$").unwrap()
});

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrganizationId {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if !ID_REGEX.is_match(raw) {
            return Err(IdError::InvalidOrganizationId(raw.to_string()));
        }

        Ok(OrganizationId(raw.to_string()))
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrganizationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl_str_serde!(OrganizationId);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if !ID_REGEX.is_match(raw) {
            return Err(IdError::InvalidUserId(raw.to_string()));
        }

        Ok(UserId(raw.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl_str_serde!(UserId);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceName(String);

impl DeviceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceName {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if !ID_REGEX.is_match(raw) {
            return Err(IdError::InvalidDeviceName(raw.to_string()));
        }

        Ok(DeviceName(raw.to_string()))
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl_str_serde!(DeviceName);

/// `<user_id>@<device_name>`, the author field of every manifest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(user_id: &UserId, device_name: &DeviceName) -> DeviceId {
        DeviceId(format!("{}@{}", user_id, device_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn user_id(&self) -> UserId {
        let (user_id, _) = self.0.split_once('@').unwrap();
        UserId(user_id.to_string())
    }

    pub fn device_name(&self) -> DeviceName {
        let (_, device_name) = self.0.split_once('@').unwrap();
        DeviceName(device_name.to_string())
    }
}

impl FromStr for DeviceId {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if !DEVICE_ID_REGEX.is_match(raw) {
            return Err(IdError::InvalidDeviceId(raw.to_string()));
        }

        Ok(DeviceId(raw.to_string()))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl_str_serde!(DeviceId);
