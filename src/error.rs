//! Error types for the share-dl library.

use thiserror::Error;

use crate::password::PasswordFailure;

/// Errors that can occur while resolving or downloading a share.
#[derive(Error, Debug)]
pub enum Error {
    /// The share is protected and no password was supplied.
    #[error("PASSWORD_REQUIRED: the share is protected by a password")]
    PasswordRequired,

    /// The supplied password was rejected.
    #[error("PASSWORD_INVALID: the share password was rejected")]
    PasswordInvalid,

    /// A local precondition failed before any backend call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Free-text failure reported by a backend (network, format, I/O).
    #[error("{0}")]
    Backend(String),

    /// I/O error while reading local files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON payload could not be decoded.
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The configured share host produced an unusable link pattern.
    #[error("invalid share link pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Classifies this error as a password failure, if it is one.
    ///
    /// Structured variants are checked first. Free-text backend errors fall
    /// back to the `PASSWORD_REQUIRED` / `PASSWORD_INVALID` markers.
    #[must_use]
    pub fn password_failure(&self) -> Option<PasswordFailure> {
        match self {
            Self::PasswordRequired => Some(PasswordFailure::Required),
            Self::PasswordInvalid => Some(PasswordFailure::Invalid),
            Self::Backend(message) => PasswordFailure::from_message(message),
            _ => None,
        }
    }
}

/// Local precondition failures. Their `Display` is the user-facing message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a share link")]
    EmptyLink,
    #[error("The share link is malformed")]
    MalformedLink,
    #[error("Resolve a share link first")]
    NotResolved,
    #[error("Choose a download directory")]
    NoSaveDir,
    #[error("No files selected")]
    NothingSelected,
    #[error("Please enter the password")]
    EmptyPassword,
}

/// A specialized `Result` type for share-dl operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_variants_classify() {
        assert_eq!(
            Error::PasswordRequired.password_failure(),
            Some(PasswordFailure::Required)
        );
        assert_eq!(
            Error::PasswordInvalid.password_failure(),
            Some(PasswordFailure::Invalid)
        );
    }

    #[test]
    fn display_keeps_markers() {
        assert!(Error::PasswordRequired.to_string().contains("PASSWORD_REQUIRED"));
        assert!(Error::PasswordInvalid.to_string().contains("PASSWORD_INVALID"));
    }

    #[test]
    fn backend_text_falls_back_to_markers() {
        let err = Error::Backend("request failed: PASSWORD_INVALID".to_string());
        assert_eq!(err.password_failure(), Some(PasswordFailure::Invalid));

        let err = Error::Backend("HTTP 500".to_string());
        assert_eq!(err.password_failure(), None);
    }

    #[test]
    fn other_errors_are_unclassified() {
        let io = Error::Io(std::io::Error::other("PASSWORD_REQUIRED"));
        assert_eq!(io.password_failure(), None);
        assert_eq!(
            Error::Validation(ValidationError::NoSaveDir).password_failure(),
            None
        );
    }

    #[test]
    fn validation_message_is_transparent() {
        let err = Error::from(ValidationError::NothingSelected);
        assert_eq!(err.to_string(), "No files selected");
    }
}
