use crate::{
    claims::{model::EncodedClaim, store::ClaimStore},
    crypto::{
        ecdsa::{der_encode, sign},
        keys::KeyStore,
    },
    error::{ClaimError, Result},
};
use base64::prelude::*;
use rand::Rng;

/// Generate a cryptographically secure random nonce
///
/// Returns 32 random bytes as a base64 encoded string. A control unit sends
/// one of these to the device and expects it back signed.
///
/// # Example
/// ```rust
/// use ecdsa_claims::crypto::challenge::generate_nonce;
///
/// let nonce = generate_nonce();
/// println!("Nonce: {}", nonce);
/// ```
pub fn generate_nonce() -> String {
    let mut rng = rand::thread_rng();
    let nonce_bytes: [u8; 32] = rng.r#gen();
    BASE64_STANDARD.encode(nonce_bytes)
}

/// Decode the `signature` field of a challenge response into DER bytes
///
/// # Returns
/// * `Ok(Vec<u8>)` - DER-encoded ECDSA signature
/// * `Err(ClaimError::Decode)` - the field is empty or not base64
pub fn decode_challenge_signature(signature_b64: &str) -> Result<Vec<u8>> {
    if signature_b64.trim().is_empty() {
        return Err(ClaimError::Decode("Challenge signature is empty".to_string()));
    }
    BASE64_STANDARD
        .decode(signature_b64)
        .map_err(|e| ClaimError::Decode(format!("Failed to decode challenge signature: {}", e)))
}

/// Answers nonce challenges with the device key
///
/// The response proves that the device holding a stored claim also holds the
/// device private key right now.
pub struct ChallengeSigner<'a> {
    store: &'a ClaimStore,
    keys: &'a KeyStore,
}

impl<'a> ChallengeSigner<'a> {
    pub fn new(store: &'a ClaimStore, keys: &'a KeyStore) -> Self {
        Self { store, keys }
    }

    /// Sign `nonce` in the context of the stored claim `claim_id`
    ///
    /// Returns a copy of the stored claim whose `signature` is the base64 of
    /// the DER-encoded ECDSA signature over the literal bytes of `nonce`. The
    /// signature is a response payload only and is never written back.
    ///
    /// # Errors
    /// - `NotFound` - no claim with this id is stored
    /// - `MissingKey` - the device key is not provisioned
    /// - `Signing` - the signature primitive failed
    #[tracing::instrument(skip(self, nonce))]
    pub fn sign_nonce(&self, claim_id: &str, nonce: &str) -> Result<EncodedClaim> {
        let mut claim = self.store.get(claim_id)?;
        let key = self.keys.private_key()?;

        let signature = sign(nonce.as_bytes(), &key)?;
        claim.signature = BASE64_STANDARD.encode(der_encode(&signature));

        tracing::info!("nonce signed");
        Ok(claim)
    }
}
