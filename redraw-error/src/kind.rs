//! Error kinds for redraw operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on ErrorKind to decide how to react, e.g. the CLI prints
/// setup instructions for `ConfigInvalid` and a plain message otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid or missing configuration (e.g. no API key)
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// Rate limit exceeded
    RateLimited,

    /// The provider rejected the credential
    AuthenticationFailed,

    /// Network error
    NetworkFailed,

    // =========================================================================
    // Raster errors
    // =========================================================================
    /// SVG could not be parsed or rendered
    RenderFailed,

    /// Raster image could not be decoded or re-encoded
    EncodeFailed,

    // =========================================================================
    // Storage/IO errors
    // =========================================================================
    /// Writing an artifact failed
    StorageFailed,

    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Failed to parse input (e.g. a provider response body)
    ParseFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            ErrorKind::RenderFailed => "RenderFailed",
            ErrorKind::EncodeFailed => "EncodeFailed",

            ErrorKind::StorageFailed => "StorageFailed",
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",

            ErrorKind::ParseFailed => "ParseFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed | ErrorKind::NetworkFailed | ErrorKind::RateLimited
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ConfigInvalid.to_string(), "ConfigInvalid");
        assert_eq!(ErrorKind::RenderFailed.to_string(), "RenderFailed");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::ConfigInvalid.is_retryable());
        assert!(!ErrorKind::RenderFailed.is_retryable());
        assert!(!ErrorKind::AuthenticationFailed.is_retryable());
    }
}
