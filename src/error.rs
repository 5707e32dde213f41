use std::path::PathBuf;
use thiserror::Error;

/// Claim lifecycle and cryptographic operation errors
///
/// Every storage and codec failure surfaces as one of these variants so the
/// caller can decide how to answer a request. Nothing in this crate panics on
/// bad input.
///
/// # Example
/// ```rust
/// use ecdsa_claims::{ClaimError, Result};
///
/// fn handle_result(result: Result<()>) {
///     match result {
///         Ok(()) => println!("Operation successful"),
///         Err(ClaimError::NotFound(id)) => println!("No claim named {}", id),
///         Err(e) if e.is_client_error() => println!("Bad request: {}", e),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Claim id is not a single path segment
    ///
    /// This error occurs when the id:
    /// - Is empty, `.` or `..`
    /// - Contains a path separator or a NUL byte
    #[error("Invalid claim id {0:?}: use a literal name without path separators")]
    InvalidId(String),

    /// A claim with this id is already stored
    #[error("Claim {0} already exists")]
    AlreadyExists(String),

    /// No claim with this id is stored
    #[error("Claim {0} does not exist")]
    NotFound(String),

    /// The device private key has not been provisioned yet
    #[error("No private key found at {}", .0.display())]
    MissingKey(PathBuf),

    /// Private key PEM is malformed or not a P-256 key
    #[error("Invalid private key: {0}")]
    KeyDecode(String),

    /// Malformed PEM, DER, JSON or token input
    ///
    /// This error occurs when:
    /// - A public key PEM block is absent or is not an EC public key
    /// - A DER signature is not a SEQUENCE of two valid INTEGERs
    /// - A stored claim file is not valid JSON
    /// - A token does not have three base64url segments
    #[error("Decode error: {0}")]
    Decode(String),

    /// Token or signature did not verify
    ///
    /// This error occurs when:
    /// - The token header names an algorithm other than ES256
    /// - The token signature doesn't match the embedded signing key
    /// - A required claim field is missing or mistyped
    #[error("Verification failed: {0}")]
    Verification(String),

    /// The signature primitive failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Key, token or JSON serialization failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Filesystem failure other than a missing or duplicate claim
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClaimError {
    /// True when the error means the requested claim is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClaimError::NotFound(_))
    }

    /// True when the caller sent something it could fix on its own side
    ///
    /// Transport layers map these to a 4xx response; everything that is not a
    /// client error and not [`ClaimError::NotFound`] is a server error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClaimError::InvalidId(_) | ClaimError::AlreadyExists(_))
    }
}

pub type Result<T> = std::result::Result<T, ClaimError>;
