//! The unified user record exposed to the application.

use serde::{Deserialize, Serialize};

use crate::types::email::Email;
use crate::types::id::UserId;

/// The current user as seen by the rest of the application.
///
/// Derived either from the remote identity provider (authoritative) or
/// from the on-device session cache when no remote session is active.
/// Exactly one `Identity` - or none - is exposed at any time; the
/// session controller owns that decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider uid, or a locally assigned id for simulated logins.
    pub id: UserId,
    /// Display name. Falls back to the email local part (and then a
    /// fixed label) when the provider has no display name on record.
    pub name: String,
    /// The user's email address.
    pub email: Email,
    /// Phone number, when the provider has one on record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Identity {
    /// Create an identity with no phone number.
    #[must_use]
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, email: Email) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email,
            phone: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_serde_roundtrip() {
        let identity = Identity::new("1", "Ayşe", Email::parse("ayse@x.com").unwrap());

        let json = serde_json::to_string(&identity).unwrap();
        let parsed: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, identity);
    }

    #[test]
    fn test_phone_omitted_when_absent() {
        let identity = Identity::new("1", "Ayşe", Email::parse("ayse@x.com").unwrap());
        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("phone"));
    }

    #[test]
    fn test_phone_serialized_when_present() {
        let mut identity = Identity::new("1", "Ayşe", Email::parse("ayse@x.com").unwrap());
        identity.phone = Some("+90 555 000 00 00".to_owned());
        let json = serde_json::to_string(&identity).unwrap();
        assert!(json.contains("+90 555 000 00 00"));
    }
}
