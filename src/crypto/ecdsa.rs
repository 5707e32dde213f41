use crate::error::{ClaimError, Result};
use p256::{
    ecdsa::{
        signature::{RandomizedSigner, Verifier},
        Signature, SigningKey, VerifyingKey,
    },
    PublicKey, SecretKey,
};
use rand::rngs::OsRng;

/// Sign a message with ECDSA P-256
///
/// The message is hashed with SHA-256 by the signature primitive. Every call
/// draws fresh randomness, so two signatures over the same message differ;
/// only their verifiability is stable.
///
/// # Returns
/// * `Ok(Signature)` - the `(r, s)` pair, see [`Signature::split_scalars`]
/// * `Err(ClaimError::Signing)` - the primitive failed
pub fn sign(message: &[u8], key: &SecretKey) -> Result<Signature> {
    let signing_key = SigningKey::from(key);
    let signature: Signature = signing_key
        .try_sign_with_rng(&mut OsRng, message)
        .map_err(|e| ClaimError::Signing(format!("Failed to sign message: {}", e)))?;
    tracing::debug!("message signed");
    Ok(signature)
}

/// Verify an ECDSA P-256 signature over `message`
///
/// Never fails loudly: any mismatch is reported as `false`.
pub fn verify(key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let verified = VerifyingKey::from(key).verify(message, signature).is_ok();
    if verified {
        tracing::debug!("signature verified");
    } else {
        tracing::debug!("signature refused");
    }
    verified
}

/// DER-encode a signature as an ASN.1 SEQUENCE of the INTEGERs `r` and `s`
///
/// Both integers are always present.
pub fn der_encode(signature: &Signature) -> Vec<u8> {
    signature.to_der().as_bytes().to_vec()
}

/// Decode a DER `SEQUENCE { r INTEGER, s INTEGER }` into a signature
///
/// Fails with [`ClaimError::Decode`] on malformed DER or when either integer
/// is zero or out of range for P-256.
pub fn der_decode(der: &[u8]) -> Result<Signature> {
    Signature::from_der(der)
        .map_err(|e| ClaimError::Decode(format!("Failed to parse DER signature: {}", e)))
}

/// Verify a DER-encoded signature against a message using a public key
///
/// # Arguments
/// * `public_key` - key of the claimed signer
/// * `message` - raw bytes that were signed
/// * `signature_der` - DER-encoded signature bytes
///
/// # Returns
/// * `Ok(())` if the signature is valid
/// * `Err(ClaimError::Decode)` if the DER is malformed
/// * `Err(ClaimError::Verification)` if the signature doesn't match
///
/// # Example
/// ```rust
/// use ecdsa_claims::crypto::{ecdsa, keys::generate_private_key};
///
/// let key = generate_private_key();
/// let signature = ecdsa::sign(b"mynonce", &key).unwrap();
/// let der = ecdsa::der_encode(&signature);
///
/// assert!(ecdsa::verify_der_signature(&key.public_key(), b"mynonce", &der).is_ok());
/// assert!(ecdsa::verify_der_signature(&key.public_key(), b"othernonce", &der).is_err());
/// ```
pub fn verify_der_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature_der: &[u8],
) -> Result<()> {
    let signature = der_decode(signature_der)?;
    VerifyingKey::from(public_key)
        .verify(message, &signature)
        .map_err(|e| ClaimError::Verification(format!("Failed to verify: {}", e)))
}
