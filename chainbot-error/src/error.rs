//! The main Error type for chainbot

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// Every fallible chainbot call returns this.
///
/// An error carries its [`ErrorKind`], a message for humans, an
/// [`ErrorStatus`], the operation that raised it, free-form context pairs
/// and optionally the error it wraps. Callers higher up the stack add their
/// own operation with [`Error::with_operation`]; the previous one is kept in
/// context under `called`, so the chain survives.
///
/// ```rust
/// use chainbot_error::{Error, ErrorKind};
///
/// let err = Error::new(ErrorKind::RpcFailed, "eth_getBalance timed out")
///     .with_operation("wallet::balance")
///     .with_context("network", "base-sepolia");
///
/// assert_eq!(err.kind(), ErrorKind::RpcFailed);
/// assert_eq!(err.context_value("network"), Some("base-sepolia"));
/// assert!(err.is_retryable());
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
    /// Status starts as temporary for kinds that are worth retrying
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: ErrorStatus::from_kind(kind),
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

    /// Innermost-last operation name; empty if none was recorded
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// First context value recorded under `key`
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }

    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    pub fn temporary(self) -> Self {
        self.with_status(ErrorStatus::Temporary)
    }

    pub fn permanent(self) -> Self {
        self.with_status(ErrorStatus::Permanent)
    }

    /// The error outlived its retries
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    pub fn with_operation(mut self, operation: &'static str) -> Self {
        let previous = std::mem::replace(&mut self.operation, operation);
        if !previous.is_empty() {
            self.context.push(("called", previous.to_string()));
        }
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying error. Setting it twice is a bug.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "error source set twice");
        self.source = Some(source.into());
        self
    }
}

/// One line: `Kind: message (at operation, key=value, ...)`, plus the status
/// when the error is not permanent.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }

        let mut details = Vec::with_capacity(self.context.len() + 1);
        if !self.operation.is_empty() {
            details.push(format!("at {}", self.operation));
        }
        details.extend(self.context.iter().map(|(k, v)| format!("{}={}", k, v)));
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }

        if self.status != ErrorStatus::Permanent {
            write!(f, " [{}]", self.status)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Error");
        debug
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("operation", &self.operation)
            .field("message", &self.message);
        if !self.context.is_empty() {
            debug.field("context", &self.context);
        }
        if let Some(source) = &self.source {
            debug.field("source", source);
        }
        debug.finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

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
    /// Create an Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create an Unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    /// Create a ConfigInvalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a CredentialsMissing error naming the variable that was not set
    pub fn credentials_missing(variable: &'static str) -> Self {
        Self::new(
            ErrorKind::CredentialsMissing,
            format!("{} is not set", variable),
        )
        .with_context("variable", variable)
    }

    /// Create a CredentialsInvalid error
    pub fn credentials_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialsInvalid, message)
    }

    /// Create a WalletInvalid error
    pub fn wallet_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::WalletInvalid, message)
    }

    /// Create an InvalidAddress error
    pub fn invalid_address(address: impl Into<String>) -> Self {
        let address = address.into();
        Self::new(
            ErrorKind::InvalidAddress,
            format!("'{}' is not a valid address", address),
        )
        .with_context("address", address)
    }

    /// Create an RpcFailed error
    pub fn rpc_failed(method: &'static str, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::RpcFailed, reason).with_context("method", method)
    }

    /// Create a StorageFailed error
    pub fn storage_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageFailed, reason)
    }

    /// Create a SerializationFailed error
    pub fn serialization_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::SerializationFailed, reason)
    }

    /// Create a ToolNotFound error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorKind::ToolNotFound, format!("tool '{}' not found", name))
            .with_context("tool", name)
    }

    /// Create a ToolFailed error
    pub fn tool_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorKind::ToolFailed, reason).with_context("tool", name)
    }

    /// Create an InferenceFailed error
    pub fn inference_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InferenceFailed, message)
    }

    /// Create a ParseFailed error
    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }
}
