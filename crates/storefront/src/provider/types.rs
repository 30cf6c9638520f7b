//! Wire types for the remote identity provider API.

use numa_core::Email;
use serde::{Deserialize, Serialize};

/// An account as reported by the remote identity provider.
///
/// This is the payload carried on the identity event stream: `Some` while
/// the provider considers the session authenticated, `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    /// Provider-assigned account id.
    pub uid: String,
    /// Account email. The provider validates addresses at sign-up, so
    /// values arriving here are treated as well-formed.
    pub email: Email,
    /// Display name, when the account has one on record.
    pub display_name: Option<String>,
    /// Phone number, when the account has one on record.
    pub phone_number: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// REST payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for password sign-in and sign-up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

/// Token response from sign-in / sign-up.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TokenResponse {
    pub id_token: String,
    pub refresh_token: String,
}

/// Tokens held for the active provider session.
#[derive(Debug, Clone)]
pub(super) struct ProviderSession {
    pub id_token: String,
    pub refresh_token: String,
}

/// Response from the account lookup endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct LookupResponse {
    #[serde(default)]
    pub users: Vec<AccountInfo>,
}

/// A single account record from the lookup endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccountInfo {
    pub local_id: String,
    pub email: Email,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl From<AccountInfo> for RemoteUser {
    fn from(account: AccountInfo) -> Self {
        Self {
            uid: account.local_id,
            email: account.email,
            // Empty strings on the wire mean "not set"
            display_name: account.display_name.filter(|name| !name.trim().is_empty()),
            phone_number: account.phone_number.filter(|phone| !phone.is_empty()),
        }
    }
}

/// Error envelope returned by the provider on non-success responses.
#[derive(Debug, Deserialize)]
pub(super) struct ProviderErrorBody {
    pub error: ProviderErrorDetail,
}

/// The inner error detail: a numeric code plus a machine-readable
/// message such as `EMAIL_NOT_FOUND` (possibly with a suffix after a
/// colon, e.g. `TOO_MANY_ATTEMPTS_TRY_LATER : retry later`).
#[derive(Debug, Deserialize)]
pub(super) struct ProviderErrorDetail {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_account_info_maps_to_remote_user() {
        let account: AccountInfo = serde_json::from_value(serde_json::json!({
            "localId": "u-42",
            "email": "ayse@x.com",
            "displayName": "Ayşe",
            "phoneNumber": "+905550000000"
        }))
        .unwrap();

        let user = RemoteUser::from(account);
        assert_eq!(user.uid, "u-42");
        assert_eq!(user.email.as_str(), "ayse@x.com");
        assert_eq!(user.display_name.as_deref(), Some("Ayşe"));
        assert_eq!(user.phone_number.as_deref(), Some("+905550000000"));
    }

    #[test]
    fn test_empty_display_name_treated_as_absent() {
        let account: AccountInfo = serde_json::from_value(serde_json::json!({
            "localId": "u-42",
            "email": "ayse@x.com",
            "displayName": "  "
        }))
        .unwrap();

        let user = RemoteUser::from(account);
        assert_eq!(user.display_name, None);
        assert_eq!(user.phone_number, None);
    }

    #[test]
    fn test_error_body_parses() {
        let body: ProviderErrorBody = serde_json::from_str(
            r#"{"error": {"code": 400, "message": "EMAIL_NOT_FOUND"}}"#,
        )
        .unwrap();
        assert_eq!(body.error.message, "EMAIL_NOT_FOUND");
    }
}
