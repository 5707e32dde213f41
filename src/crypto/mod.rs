pub mod challenge;
pub mod ecdsa;
pub mod jwt;
pub mod keys;
pub mod pem;

// Re-export main functions for easier access
pub use ecdsa::{der_decode, der_encode, sign, verify, verify_der_signature};
pub use keys::KeyStore;
