// Serde impls for newtypes that already round-trip through
// `Display`/`FromStr`. The string form is the wire form.
#[macro_export]
macro_rules! impl_str_serde {
    ($type:ident) => {
        impl serde::Serialize for $type {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                use std::str::FromStr;

                let raw = String::deserialize(deserializer)?;
                $type::from_str(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}
