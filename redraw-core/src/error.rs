//! Redraw core error helpers
//!
//! Re-exports redraw-error and adds the constructors core modules reach for.

pub use redraw_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

/// Create a RenderFailed error
pub fn render_failed(message: impl Into<String>) -> Error {
    Error::render_failed(message)
}

/// Create an EncodeFailed error
pub fn encode_failed(message: impl Into<String>) -> Error {
    Error::encode_failed(message)
}

/// Create a StorageFailed error for the named artifact
pub fn storage_failed(name: impl Into<String>, reason: impl Into<String>) -> Error {
    Error::storage_failed(name, reason)
}

/// Create an IoFailed error
pub fn io_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::IoFailed, message)
}

/// Create an InvalidArgument error
pub fn invalid_argument(message: impl Into<String>) -> Error {
    Error::invalid_argument(message)
}

/// Wrap a provider failure, picking the kind from the variant
pub fn provider_failed(provider: &str, err: ProviderError) -> Error {
    let kind = match &err {
        ProviderError::Network(_) => ErrorKind::NetworkFailed,
        ProviderError::RateLimited => ErrorKind::RateLimited,
        ProviderError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
        ProviderError::ModelNotFound(_) => ErrorKind::ConfigInvalid,
        ProviderError::Parse(_) => ErrorKind::ParseFailed,
        ProviderError::Api { .. } | ProviderError::Other(_) => ErrorKind::InferenceFailed,
    };
    Error::new(kind, err.to_string())
        .with_context("provider", provider)
        .set_source(err)
}
