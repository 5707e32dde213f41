//! # ecdsa-claims
//!
//! A Rust library for **self-issued identity claims** signed with **ECDSA P-256**.
//! A device keeps its own private key, stores claims about itself as ES256 JWTs,
//! and proves possession of its key by signing nonces sent by a control unit.
//!
//! ## Features
//!
//! - **Device Key Management** - P-256 key created on first start and kept as a PKCS#8 PEM file
//! - **Claim Tokens** - Claims encoded as ES256 JWTs carrying their own verifying key (`sgk`)
//! - **Algorithm Pinning** - Tokens signed with anything but ES256 are rejected
//! - **File-Backed Claim Store** - Create-only-if-absent, overwrite-only-if-present, delete, list
//! - **Nonce Challenges** - DER-encoded ECDSA signatures over caller supplied nonces
//! - **Typed Errors** - Every failure is a [`ClaimError`] variant, never a panic
//!
//! ## Quick Start
//!
//! ```rust
//! use ecdsa_claims::ClaimService;
//! use ecdsa_claims::config::{Environment, StoreConfig};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = StoreConfig::rooted_at(dir.path(), Environment::Test);
//!
//! // Load or create the device key
//! let service = ClaimService::open(&config).unwrap();
//!
//! // Issue a claim signed by the device key
//! let claim = service
//!     .self_signed_claim("manufacturer", "did:example:device", r#"{"certified_device":"true"}"#)
//!     .unwrap();
//! service.issue("certification", &claim).unwrap();
//!
//! // Read it back, checking the token signature
//! let verified = service.get_verified("certification").unwrap();
//! assert_eq!(verified.issuer, "manufacturer");
//!
//! // Answer a nonce challenge
//! let response = service.sign_nonce("certification", "mynonce").unwrap();
//! assert!(!response.signature.is_empty());
//! ```
//!
//! ## Trust model
//!
//! The key that verifies a claim travels inside the claim. Verification proves
//! the token is intact, not who issued it: anyone able to rewrite a claim file
//! can re-sign it with a key of their own. Compare `sgk` with a key obtained out
//! of band before trusting the issuer.
//!
//! ## Examples
//!
//! See the [claim_lifecycle demo](demos/claim_lifecycle.rs) for a complete flow:
//!
//! ```bash
//! cargo run --example claim_lifecycle
//! ```

pub mod claims;
pub mod config;
pub mod crypto;
pub mod error;
pub mod service;

// Re-export main types for easier access
pub use claims::{Claim, ClaimStore, EncodedClaim};
pub use config::{Environment, StoreConfig};
pub use crypto::challenge::{generate_nonce, ChallengeSigner};
pub use crypto::jwt::{encode_claim, verify_and_extract};
pub use crypto::keys::KeyStore;
pub use error::{ClaimError, Result};
pub use service::ClaimService;
