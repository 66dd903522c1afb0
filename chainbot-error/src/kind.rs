//! Error kinds for chainbot operations

use std::fmt;

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Credential errors
    // =========================================================================
    /// A required credential was not provided
    CredentialsMissing,

    /// A credential was provided but could not be used
    CredentialsInvalid,

    // =========================================================================
    // Wallet errors
    // =========================================================================
    /// Wallet data could not be restored
    WalletInvalid,

    /// Signing a transaction or message failed
    SigningFailed,

    /// Not a valid EVM address
    InvalidAddress,

    /// JSON-RPC call failed or returned an error
    RpcFailed,

    /// Transaction was mined but reverted, or never mined
    TransactionFailed,

    // =========================================================================
    // Storage errors
    // =========================================================================
    /// Wallet persistence failed
    StorageFailed,

    /// Serialization/deserialization failed
    SerializationFailed,

    // =========================================================================
    // Agent errors
    // =========================================================================
    /// The agent took more steps than allowed for one call
    StepLimitExceeded,

    /// The model asked for a tool that is not registered
    ToolNotFound,

    /// A tool invocation failed
    ToolFailed,

    /// Terminal input reached end of file
    InputClosed,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// Provider not available
    ProviderUnavailable,

    /// Rate limit exceeded
    RateLimited,

    /// Provider rejected the API key
    AuthenticationFailed,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Network error
    NetworkFailed,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Failed to parse input
    ParseFailed,

    /// Invalid argument passed to function
    InvalidArgument,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            // Credentials
            ErrorKind::CredentialsMissing => "CredentialsMissing",
            ErrorKind::CredentialsInvalid => "CredentialsInvalid",

            // Wallet
            ErrorKind::WalletInvalid => "WalletInvalid",
            ErrorKind::SigningFailed => "SigningFailed",
            ErrorKind::InvalidAddress => "InvalidAddress",
            ErrorKind::RpcFailed => "RpcFailed",
            ErrorKind::TransactionFailed => "TransactionFailed",

            // Storage
            ErrorKind::StorageFailed => "StorageFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",

            // Agent
            ErrorKind::StepLimitExceeded => "StepLimitExceeded",
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::ToolFailed => "ToolFailed",
            ErrorKind::InputClosed => "InputClosed",

            // Inference
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            // Parse
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::InvalidArgument => "InvalidArgument",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::RpcFailed
                | ErrorKind::ProviderUnavailable
        )
    }

    /// Whether this kind means startup configuration was rejected
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ErrorKind::ConfigInvalid
                | ErrorKind::CredentialsMissing
                | ErrorKind::CredentialsInvalid
                | ErrorKind::WalletInvalid
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
