use crate::{
    claims::model::Claim,
    crypto::pem::{pem_encode_private, pem_encode_public},
    error::{ClaimError, Result},
};
use base64::prelude::*;
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use p256::{PublicKey, SecretKey};
use secrecy::ExposeSecret;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// The only algorithm a claim token may be signed with
pub const CLAIM_ALGORITHM: Algorithm = Algorithm::ES256;

/// Token payload of a claim
///
/// Field order matches the serialized payload: `iss`, `sgk`, `sub`, `iat`,
/// `claim`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClaimPayload {
    /// Issuer identifier
    pub iss: String,
    /// PEM public key that verifies this token
    pub sgk: String,
    /// Subject key or DID
    pub sub: String,
    /// Issued at (Unix timestamp)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub iat: i32,
    /// JSON body of the claim
    pub claim: String,
}

impl From<&Claim> for ClaimPayload {
    fn from(claim: &Claim) -> Self {
        Self {
            iss: claim.issuer.clone(),
            sgk: claim.signing_public_key.clone(),
            sub: claim.subject_key.clone(),
            iat: claim.issued_at,
            claim: claim.claim_body.clone(),
        }
    }
}

impl From<ClaimPayload> for Claim {
    fn from(payload: ClaimPayload) -> Self {
        Self {
            issuer: payload.iss,
            signing_public_key: payload.sgk,
            subject_key: payload.sub,
            issued_at: payload.iat,
            claim_body: payload.claim,
        }
    }
}

/// Header and payload of a token read without checking its signature
#[derive(Clone, Debug)]
pub struct UnverifiedToken {
    pub header: Map<String, Value>,
    pub claims: Map<String, Value>,
}

/// Encode a claim into a compact ES256 token signed with `signer_key`
///
/// # Arguments
/// * `claim` - the claim to encode
/// * `signer_key` - private key producing the token signature
///
/// # Returns
/// * `Ok(String)` - `header.payload.signature`, each segment base64url
/// * `Err(ClaimError::Encode)` - the key could not be used for signing
///
/// # Example
/// ```rust
/// use ecdsa_claims::{Claim, crypto::{jwt, keys::generate_private_key, pem}};
///
/// let key = generate_private_key();
/// let sgk = pem::pem_encode_public(&key.public_key()).unwrap();
/// let claim = Claim::new("manufacturer", sgk.clone(), "did:example:device", r#"{"ok":true}"#);
///
/// let token = jwt::encode_claim(&claim, &key).unwrap();
/// let public_key = pem::pem_decode_public(&sgk).unwrap();
/// let verified = jwt::verify_and_extract(&token, &public_key).unwrap();
/// assert_eq!(verified, claim);
/// ```
pub fn encode_claim(claim: &Claim, signer_key: &SecretKey) -> Result<String> {
    let pem = pem_encode_private(signer_key)?;
    let encoding_key = EncodingKey::from_ec_pem(pem.expose_secret().as_bytes())
        .map_err(|e| ClaimError::Encode(format!("Failed to load signing key: {}", e)))?;

    let token = encode(
        &Header::new(CLAIM_ALGORITHM),
        &ClaimPayload::from(claim),
        &encoding_key,
    )
    .map_err(|e| ClaimError::Encode(format!("Failed to create JWT: {}", e)))?;

    tracing::debug!(issuer = %claim.issuer, "claim encoded");
    Ok(token)
}

/// Read a token's header and payload without verifying the signature
///
/// Only meant for pulling out the embedded signing key before verification;
/// nothing returned here is trustworthy.
pub fn decode_unverified(token: &str) -> Result<UnverifiedToken> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ClaimError::Decode(
            "Token must have three dot-separated segments".to_string(),
        ));
    };

    Ok(UnverifiedToken {
        header: decode_segment(header, "header")?,
        claims: decode_segment(payload, "payload")?,
    })
}

/// The `sgk` claim of a token, read without verification
pub fn embedded_signing_key(token: &str) -> Result<String> {
    let unverified = decode_unverified(token)?;
    unverified
        .claims
        .get("sgk")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClaimError::Decode("Token has no string sgk claim".to_string()))
}

/// Verify a token against `key` and map its payload back into a [`Claim`]
///
/// # Returns
/// * `Ok(Claim)` - the signature is valid and every field is present
/// * `Err(ClaimError::Verification)` - the algorithm is not ES256, the
///   signature is undecodable or does not validate, or a claim field is
///   missing or mistyped
/// * `Err(ClaimError::Decode)` - the token is not structurally a JWT
pub fn verify_and_extract(token: &str, key: &PublicKey) -> Result<Claim> {
    let header = decode_header(token).map_err(header_error)?;
    if header.alg != CLAIM_ALGORITHM {
        tracing::warn!(alg = ?header.alg, "rejected token with unexpected signing method");
        return Err(ClaimError::Verification(format!(
            "Unexpected signing method: {:?}",
            header.alg
        )));
    }

    let public_pem = pem_encode_public(key)?;
    let decoding_key = DecodingKey::from_ec_pem(public_pem.as_bytes())
        .map_err(|e| ClaimError::Decode(format!("Failed to load verifying key: {}", e)))?;

    let token_data =
        decode::<ClaimPayload>(token, &decoding_key, &claim_validation()).map_err(|e| {
            tracing::warn!(error = %e, "token verification failed");
            verification_error(e)
        })?;

    tracing::debug!("JWT validated");
    Ok(token_data.claims.into())
}

/// Signature and algorithm checks only; claims never expire
fn claim_validation() -> Validation {
    let mut validation = Validation::new(CLAIM_ALGORITHM);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation
}

/// Errors reading the header: the token is not structurally a JWT
fn header_error(e: jsonwebtoken::errors::Error) -> ClaimError {
    match e.kind() {
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
            ClaimError::Decode(format!("Malformed token: {}", e))
        }
        _ => ClaimError::Verification(format!("JWT validation failed: {}", e)),
    }
}

/// Errors past a readable ES256 header, where an undecodable signature or
/// payload is a failed verification
fn verification_error(e: jsonwebtoken::errors::Error) -> ClaimError {
    match e.kind() {
        ErrorKind::InvalidToken => ClaimError::Decode(format!("Malformed token: {}", e)),
        _ => ClaimError::Verification(format!("JWT validation failed: {}", e)),
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Map<String, Value>> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| ClaimError::Decode(format!("Failed to decode token {}: {}", name, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ClaimError::Decode(format!("Token {} is not a JSON object: {}", name, e)))
}

/// Accept `iat` as an integer, or as a float with no fractional part
///
/// Issuers that route claims through generic JSON maps emit timestamps as
/// floats (`1557905444.0`). Fractions and values outside `i32` are rejected.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let number = Number::deserialize(deserializer)?;
    if let Some(value) = number.as_i64() {
        return i32::try_from(value)
            .map_err(|_| D::Error::custom(format!("iat {} out of range", value)));
    }
    let value = number
        .as_f64()
        .ok_or_else(|| D::Error::custom("iat is not a number"))?;
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(D::Error::custom(format!(
            "iat {} is not a whole 32-bit timestamp",
            value
        )));
    }
    Ok(value as i32)
}
