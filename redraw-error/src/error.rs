//! The main Error type for redraw

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// The unified error type for all redraw operations.
///
/// Carries:
/// - `kind`: what type of error occurred
/// - `message`: human-readable description
/// - `status`: whether the error is retryable
/// - `operation`: what operation produced it
/// - `context`: key/value pairs for debugging
/// - `source`: the underlying error (if any)
///
/// # Example
///
/// ```rust
/// use redraw_error::{Error, ErrorKind};
///
/// let err = Error::new(ErrorKind::InferenceFailed, "model returned no text")
///     .with_operation("drawing_loop::redraw")
///     .with_context("model", "gemini-2.5-flash")
///     .with_context("iteration", "2");
///
/// assert_eq!(err.kind(), ErrorKind::InferenceFailed);
/// assert!(err.status().is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    /// Set the operation that produced this error.
    ///
    /// A previously set operation is moved into context as "called", so the
    /// innermost operation stays visible.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    /// Mark as persistent after a failed second attempt
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// IO is the one conversion allowed to be implicit: artifact writes hit it everywhere.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    /// A required environment variable is unset or empty
    pub fn missing_env(var: &'static str) -> Self {
        Self::config_invalid(format!("environment variable {} is not set", var)).with_context("env", var)
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    pub fn inference_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InferenceFailed, message)
    }

    pub fn render_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RenderFailed, message)
    }

    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EncodeFailed, message)
    }

    /// Writing the named artifact failed
    pub fn storage_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorKind::StorageFailed, reason).with_context("artifact", name)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::RenderFailed, "svg has no root element");
        assert_eq!(err.kind(), ErrorKind::RenderFailed);
        assert_eq!(err.message(), "svg has no root element");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::InferenceFailed, "timeout")
            .with_operation("drawing_loop::redraw")
            .with_context("model", "gemini-2.5-flash")
            .with_context("iteration", "1");

        assert_eq!(err.operation(), "drawing_loop::redraw");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("model", "gemini-2.5-flash".to_string()));
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::IoFailed, "disk full")
            .with_operation("file_store::save")
            .with_operation("drawing_loop::persist");

        assert_eq!(err.operation(), "drawing_loop::persist");
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.context()[0], ("called", "file_store::save".to_string()));
    }

    #[test]
    fn test_default_status_follows_kind() {
        assert!(Error::new(ErrorKind::RateLimited, "slow down").is_retryable());
        assert!(!Error::new(ErrorKind::EncodeFailed, "bad png").is_retryable());
    }

    #[test]
    fn test_persist() {
        let err = Error::new(ErrorKind::NetworkFailed, "connection refused");
        assert!(err.is_retryable());

        let err = err.persist();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_display() {
        let err = Error::new(ErrorKind::InferenceFailed, "model unavailable")
            .with_operation("provider::complete")
            .with_context("model", "gemini-2.5-flash");

        let display = format!("{}", err);
        assert!(display.contains("InferenceFailed"));
        assert!(display.contains("temporary"));
        assert!(display.contains("provider::complete"));
        assert!(display.contains("model: gemini-2.5-flash"));
        assert!(display.ends_with("=> model unavailable"));
    }

    #[test]
    fn test_missing_env() {
        let err = Error::missing_env("GOOGLE_API_KEY");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("GOOGLE_API_KEY"));
        assert_eq!(err.context()[0], ("env", "GOOGLE_API_KEY".to_string()));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.operation(), "io");
        assert!(err.source_ref().is_some());
    }
}
