//! Client identifier type.

use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

/// Longest accepted client identifier, in bytes.
pub const MAX_CLIENT_ID_LEN: usize = 256;

/// Opaque identifier correlating requests from one client.
///
/// Issuing and verifying identifiers belongs to the transport; this type
/// only rejects values that could not have come from a sane transport:
/// empty strings, overlong strings, whitespace and non-printable bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    /// Validate and wrap a client identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, SessionError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SessionError::InvalidClientId("empty".into()));
        }
        if value.len() > MAX_CLIENT_ID_LEN {
            return Err(SessionError::InvalidClientId(format!(
                "longer than {} bytes",
                MAX_CLIENT_ID_LEN
            )));
        }
        if !value.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(SessionError::InvalidClientId(format!(
                "'{}' contains whitespace or non-printable characters",
                value.escape_default()
            )));
        }
        Ok(Self(value))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClientId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_valid() {
        let id: ClientId = "KQ4w.Zt-8aX".parse().unwrap();
        assert_eq!(id.as_str(), "KQ4w.Zt-8aX");
        assert_eq!(id.to_string(), "KQ4w.Zt-8aX");
    }

    #[test]
    fn test_parse_invalid() {
        // Empty
        assert!("".parse::<ClientId>().is_err());

        // Whitespace
        assert!("abc def".parse::<ClientId>().is_err());
        assert!("abc\n".parse::<ClientId>().is_err());

        // Non-ASCII
        assert!("clé".parse::<ClientId>().is_err());

        // Too long
        let long = "a".repeat(MAX_CLIENT_ID_LEN + 1);
        assert!(long.parse::<ClientId>().is_err());
    }

    #[test]
    fn test_max_length_accepted() {
        let exact = "a".repeat(MAX_CLIENT_ID_LEN);
        assert!(ClientId::new(exact).is_ok());
    }

    #[test]
    fn test_hash_eq() {
        let id1 = ClientId::new("client-42").unwrap();
        let id2 = ClientId::new("client-42").unwrap();
        let id3 = ClientId::new("client-43").unwrap();

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);

        let mut set = HashSet::new();
        set.insert(id1);
        assert!(set.contains(&id2));
        assert!(!set.contains(&id3));
    }
}
