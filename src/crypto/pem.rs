//! PEM conversions for P-256 keys.
//!
//! Private keys are written as PKCS#8. Older key files that carry SEC1 bytes,
//! either under an `EC PRIVATE KEY` label or mislabeled as `PRIVATE KEY`, are
//! still readable.

use crate::error::{ClaimError, Result};
use p256::{
    pkcs8::{
        der::pem, DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding,
    },
    PublicKey, SecretKey,
};
use secrecy::Secret;

const PRIVATE_KEY_LABELS: [&str; 2] = ["PRIVATE KEY", "EC PRIVATE KEY"];

/// Encode a private key as a PKCS#8 PEM string
///
/// The result is wrapped in [`Secret`] so it is not printed by accident.
pub fn pem_encode_private(key: &SecretKey) -> Result<Secret<String>> {
    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| ClaimError::Encode(format!("Failed to encode private key: {}", e)))?;
    Ok(Secret::new(pem.to_string()))
}

/// Decode a private key from PEM
///
/// # Returns
/// * `Ok(SecretKey)` - the P-256 private key
/// * `Err(ClaimError::KeyDecode)` - no PEM block, wrong label, or the bytes are
///   neither PKCS#8 nor SEC1 for P-256
pub fn pem_decode_private(encoded: &str) -> Result<SecretKey> {
    let (label, der) = pem::decode_vec(encoded.trim().as_bytes())
        .map_err(|e| ClaimError::KeyDecode(format!("Failed to read PEM block: {}", e)))?;
    if !PRIVATE_KEY_LABELS.contains(&label) {
        return Err(ClaimError::KeyDecode(format!(
            "Unexpected PEM label {:?}",
            label
        )));
    }
    SecretKey::from_pkcs8_der(&der)
        .or_else(|_| SecretKey::from_sec1_der(&der))
        .map_err(|e| ClaimError::KeyDecode(format!("Failed to parse P-256 private key: {}", e)))
}

/// Encode a public key as a SubjectPublicKeyInfo PEM string
///
/// # Example
/// ```rust
/// use ecdsa_claims::crypto::{keys::generate_private_key, pem};
///
/// let key = generate_private_key();
/// let pem = pem::pem_encode_public(&key.public_key()).unwrap();
/// assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
/// ```
pub fn pem_encode_public(key: &PublicKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| ClaimError::Encode(format!("Failed to encode public key: {}", e)))
}

/// Decode a public key from PEM
///
/// Fails with [`ClaimError::Decode`] if the PEM block is absent or does not
/// hold a P-256 EC public key.
pub fn pem_decode_public(encoded: &str) -> Result<PublicKey> {
    PublicKey::from_public_key_pem(encoded.trim())
        .map_err(|e| ClaimError::Decode(format!("Invalid public key PEM: {}", e)))
}
