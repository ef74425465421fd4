//! Error types for tag reconciliation and paginated listing.
//!
//! [`RemoteError`] is what injected collaborators report. [`SyncError`] is what
//! the engine surfaces to callers, annotated with the phase and identifier the
//! failure occurred on.

use std::fmt;

/// Boxed error source carried by a [`RemoteError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a failure reported by a remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The target resource does not exist (anymore).
    NotFound,
    /// The remote API rejected the call because of rate limiting.
    Throttled,
    /// The remote API was temporarily unreachable.
    Unavailable,
    /// The call was cancelled before it completed.
    Cancelled,
    /// Anything else.
    Other,
}

impl RemoteErrorKind {
    /// Returns `true` for kinds that may succeed when the same call is repeated.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Throttled | Self::Unavailable)
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Throttled => write!(f, "throttled"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// An error reported by an injected remote operation.
#[derive(Debug, thiserror::Error)]
#[error("{}{message}", code_prefix(.code))]
pub struct RemoteError {
    kind: RemoteErrorKind,
    code: Option<String>,
    message: String,
    #[source]
    source: Option<BoxError>,
}

fn code_prefix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!("{c}: ")).unwrap_or_default()
}

impl RemoteError {
    /// Creates a new remote error of the given kind.
    #[must_use]
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    /// Creates a `Throttled` error.
    #[must_use]
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Throttled, message)
    }

    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unavailable, message)
    }

    /// Creates a `Cancelled` error.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(RemoteErrorKind::Cancelled, "operation cancelled")
    }

    /// Creates an `Other` error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Other, message)
    }

    /// Attaches the service-specific error code (e.g. `ResourceNotFoundException`).
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches the underlying transport or SDK error.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> RemoteErrorKind {
        self.kind
    }

    /// Returns the service error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the remote reported the target as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteErrorKind::NotFound
    }

    /// Returns `true` if repeating the call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// The step of a synchronization in which a remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Fetching the current tags.
    List,
    /// Removing keys that are no longer desired.
    Remove,
    /// Adding or overwriting desired key-value pairs.
    Upsert,
    /// Fetching one page of a listing.
    FetchPage,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "listing tags"),
            Self::Remove => write!(f, "untagging"),
            Self::Upsert => write!(f, "tagging"),
            Self::FetchPage => write!(f, "fetching page"),
        }
    }
}

/// Errors surfaced by tag reconciliation and pagination.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A programming or configuration error, such as a zero batch size.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of what is misconfigured.
        message: String,
    },

    /// A remote operation failed.
    #[error("error {phase} resource ({identifier}): {source}")]
    RemoteOperationFailed {
        /// The step that failed.
        phase: Phase,
        /// The identifier the call was made for.
        identifier: String,
        /// The error reported by the remote operation.
        #[source]
        source: RemoteError,
    },

    /// The remote reported that the target no longer exists.
    #[error("error {phase} resource ({identifier}): resource no longer exists: {source}")]
    ResourceGone {
        /// The step that failed.
        phase: Phase,
        /// The identifier the call was made for.
        identifier: String,
        /// The error reported by the remote operation.
        #[source]
        source: RemoteError,
    },
}

impl SyncError {
    /// Creates a new `InvalidConfiguration` error.
    #[must_use]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Wraps a remote failure, promoting `NotFound` to [`SyncError::ResourceGone`].
    #[must_use]
    pub fn remote(phase: Phase, identifier: impl Into<String>, source: RemoteError) -> Self {
        let identifier = identifier.into();
        if source.is_not_found() {
            Self::ResourceGone {
                phase,
                identifier,
                source,
            }
        } else {
            Self::RemoteOperationFailed {
                phase,
                identifier,
                source,
            }
        }
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }

    /// Returns `true` if the target resource is gone.
    ///
    /// Destroy-time reconciliation may treat this as success.
    #[must_use]
    pub fn is_resource_gone(&self) -> bool {
        matches!(self, Self::ResourceGone { .. })
    }

    /// Returns the phase a remote failure occurred in.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::InvalidConfiguration { .. } => None,
            Self::RemoteOperationFailed { phase, .. } | Self::ResourceGone { phase, .. } => {
                Some(*phase)
            }
        }
    }

    /// Returns the identifier a remote failure occurred on.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::InvalidConfiguration { .. } => None,
            Self::RemoteOperationFailed { identifier, .. }
            | Self::ResourceGone { identifier, .. } => Some(identifier),
        }
    }

    /// Returns the underlying remote error, if any.
    #[must_use]
    pub fn remote_error(&self) -> Option<&RemoteError> {
        match self {
            Self::InvalidConfiguration { .. } => None,
            Self::RemoteOperationFailed { source, .. } | Self::ResourceGone { source, .. } => {
                Some(source)
            }
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            Self::ResourceGone { .. } => ErrorCategory::NotFound,
            Self::RemoteOperationFailed { source, .. }
                if source.kind() == RemoteErrorKind::Cancelled =>
            {
                ErrorCategory::Cancelled
            }
            Self::RemoteOperationFailed { .. } => ErrorCategory::Remote,
        }
    }
}

/// Categories of synchronization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid configuration.
    Configuration,
    /// Target resource missing.
    NotFound,
    /// Any other remote failure.
    Remote,
    /// Cancelled step.
    Cancelled,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::NotFound => write!(f, "not_found"),
            Self::Remote => write!(f, "remote"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::remote(
            Phase::Remove,
            "stream-1",
            RemoteError::other("boom").with_code("InternalFailure"),
        );
        assert_eq!(
            err.to_string(),
            "error untagging resource (stream-1): InternalFailure: boom"
        );

        let err = SyncError::invalid_configuration("max batch size must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: max batch size must be at least 1"
        );
    }

    #[test]
    fn test_not_found_becomes_resource_gone() {
        let err = SyncError::remote(Phase::Upsert, "arn:x", RemoteError::not_found("gone"));
        assert!(err.is_resource_gone());
        assert_eq!(err.phase(), Some(Phase::Upsert));
        assert_eq!(err.identifier(), Some("arn:x"));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            SyncError::invalid_configuration("x").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            SyncError::remote(Phase::FetchPage, "fs-1", RemoteError::cancelled()).category(),
            ErrorCategory::Cancelled
        );
        assert_eq!(
            SyncError::remote(Phase::List, "fs-1", RemoteError::throttled("slow down")).category(),
            ErrorCategory::Remote
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(RemoteError::throttled("x").is_retryable());
        assert!(RemoteError::unavailable("x").is_retryable());
        assert!(!RemoteError::not_found("x").is_retryable());
        assert!(!RemoteError::cancelled().is_retryable());
        assert!(!RemoteError::other("x").is_retryable());
    }

    #[test]
    fn test_remote_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = RemoteError::unavailable("connection dropped").with_source(io);
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("reset"));
    }
}
