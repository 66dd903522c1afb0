//! # chainbot-error
//!
//! Unified error handling for chainbot, following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., CredentialsMissing, RpcFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use chainbot_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::WalletInvalid, "wallet data is not valid JSON")
//!         .with_operation("wallet::restore")
//!         .with_context("path", "wallet_data.txt"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, chainbot_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using chainbot Error
pub type Result<T> = std::result::Result<T, Error>;
