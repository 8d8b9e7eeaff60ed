use serde::{Deserialize, Deserializer};
use std::fmt;
use zeroize::ZeroizeOnDrop;

/// Credential bytes that are wiped when dropped and never printed.
#[derive(ZeroizeOnDrop, PartialEq, Eq)]
pub struct Secret {
    value: Vec<u8>,
}

impl Secret {
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    pub fn from_string(value: String) -> Self {
        Self::new(value.into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).to_string()
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::from_string(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Secret::from_string)
    }
}
