//! Identity provider error types.
//!
//! Provider error codes arrive as strings on the wire. They are mapped
//! once, at the call boundary, into [`ProviderErrorKind`] so the rest of
//! the application matches on a closed enum instead of string constants.
//! Unrecognized codes land in the `Unknown` catch-all.

use thiserror::Error;

/// Errors that can occur when talking to the remote identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the request with a known auth error code.
    #[error("authentication rejected: {kind:?}")]
    Auth {
        /// The classified provider error.
        kind: ProviderErrorKind,
    },

    /// Transport-level failure reaching the provider.
    #[error("identity provider unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider returned a body that could not be decoded.
    #[error("malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),

    /// This session controller has no provider attached (local-only
    /// operation); remote sign-in/verification is unavailable.
    #[error("no identity provider attached")]
    Detached,
}

impl ProviderError {
    /// The classified kind of this error, for status mapping and user
    /// messages.
    #[must_use]
    pub const fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Auth { kind } => *kind,
            Self::Network(_) => ProviderErrorKind::Network,
            Self::Decode(_) | Self::Detached => ProviderErrorKind::Unknown,
        }
    }

    /// The fixed user-facing message for this error.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }
}

/// Classified identity provider error codes.
///
/// One variant per code the provider is known to emit, plus `Network`
/// for transport failures and `Unknown` for anything unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// No account exists for the given email.
    UserNotFound,
    /// The password does not match the account.
    WrongPassword,
    /// The email address is not syntactically acceptable.
    InvalidEmail,
    /// The account has been disabled by an administrator.
    Disabled,
    /// An account with this email already exists (sign-up).
    EmailInUse,
    /// The provider throttled the caller.
    RateLimited,
    /// The provider could not be reached.
    Network,
    /// Any code this build does not recognize.
    Unknown,
}

impl ProviderErrorKind {
    /// Classify a provider error code string.
    ///
    /// Codes may carry a free-text suffix after a colon
    /// (`TOO_MANY_ATTEMPTS_TRY_LATER : ...`); only the leading token is
    /// significant.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let token = code.split(':').next().unwrap_or("").trim();
        match token {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => Self::WrongPassword,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "USER_DISABLED" => Self::Disabled,
            "EMAIL_EXISTS" => Self::EmailInUse,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::RateLimited,
            _ => Self::Unknown,
        }
    }

    /// The fixed user-facing message for this kind, ready for direct
    /// display in the storefront UI.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::UserNotFound => "Bu e-posta adresiyle kayıtlı bir hesap bulunamadı.",
            Self::WrongPassword => "E-posta veya şifre hatalı.",
            Self::InvalidEmail => "Geçerli bir e-posta adresi girin.",
            Self::Disabled => "Bu hesap devre dışı bırakılmış.",
            Self::EmailInUse => "Bu e-posta adresi zaten kullanımda.",
            Self::RateLimited => "Çok fazla deneme yapıldı. Lütfen daha sonra tekrar deneyin.",
            Self::Network => "Bağlantı hatası. İnternet bağlantınızı kontrol edin.",
            Self::Unknown => "Giriş yapılamadı. Lütfen tekrar deneyin.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_known_codes() {
        assert_eq!(
            ProviderErrorKind::from_code("EMAIL_NOT_FOUND"),
            ProviderErrorKind::UserNotFound
        );
        assert_eq!(
            ProviderErrorKind::from_code("INVALID_PASSWORD"),
            ProviderErrorKind::WrongPassword
        );
        assert_eq!(
            ProviderErrorKind::from_code("INVALID_LOGIN_CREDENTIALS"),
            ProviderErrorKind::WrongPassword
        );
        assert_eq!(
            ProviderErrorKind::from_code("INVALID_EMAIL"),
            ProviderErrorKind::InvalidEmail
        );
        assert_eq!(
            ProviderErrorKind::from_code("USER_DISABLED"),
            ProviderErrorKind::Disabled
        );
        assert_eq!(
            ProviderErrorKind::from_code("EMAIL_EXISTS"),
            ProviderErrorKind::EmailInUse
        );
    }

    #[test]
    fn test_from_code_strips_suffix() {
        assert_eq!(
            ProviderErrorKind::from_code("TOO_MANY_ATTEMPTS_TRY_LATER : try again later"),
            ProviderErrorKind::RateLimited
        );
    }

    #[test]
    fn test_from_code_unknown_falls_through() {
        assert_eq!(
            ProviderErrorKind::from_code("SOME_FUTURE_CODE"),
            ProviderErrorKind::Unknown
        );
        assert_eq!(ProviderErrorKind::from_code(""), ProviderErrorKind::Unknown);
    }

    #[test]
    fn test_every_kind_has_a_user_message() {
        let kinds = [
            ProviderErrorKind::UserNotFound,
            ProviderErrorKind::WrongPassword,
            ProviderErrorKind::InvalidEmail,
            ProviderErrorKind::Disabled,
            ProviderErrorKind::EmailInUse,
            ProviderErrorKind::RateLimited,
            ProviderErrorKind::Network,
            ProviderErrorKind::Unknown,
        ];
        for kind in kinds {
            assert!(!kind.user_message().is_empty());
        }
    }
}
