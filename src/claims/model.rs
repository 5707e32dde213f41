use chrono::Utc;
use serde::{Deserialize, Serialize};

/// An identity assertion made by an issuer about a subject
///
/// The JSON form uses the short field names of the token payload
/// (`iss`, `sgk`, `sub`, `iat`, `claim`).
///
/// `signing_public_key` is the key that verifies this claim's own token. It
/// travels inside the token it verifies, so it only proves the token was not
/// altered after signing. Whoever controls the claim file can swap both the
/// key and the signature; trust in the issuer comes from knowing the expected
/// key out of band.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Identifier of the issuing entity
    #[serde(rename = "iss")]
    pub issuer: String,
    /// PEM-encoded P-256 public key that verifies this claim
    #[serde(rename = "sgk")]
    pub signing_public_key: String,
    /// PEM public key or DID of the subject
    #[serde(rename = "sub")]
    pub subject_key: String,
    /// Issued at, Unix seconds
    #[serde(rename = "iat")]
    pub issued_at: i32,
    /// Opaque JSON document with the asserted facts
    #[serde(rename = "claim")]
    pub claim_body: String,
}

impl Claim {
    /// Build a claim stamped with the current time
    pub fn new(
        issuer: impl Into<String>,
        signing_public_key: impl Into<String>,
        subject_key: impl Into<String>,
        claim_body: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            signing_public_key: signing_public_key.into(),
            subject_key: subject_key.into(),
            issued_at: unix_now(),
            claim_body: claim_body.into(),
        }
    }

    /// Compare every field except `issued_at`
    ///
    /// Re-issuing the same assertion produces a new timestamp; this tells
    /// whether the content changed.
    pub fn eq_ignoring_issued_at(&self, other: &Claim) -> bool {
        self.issuer == other.issuer
            && self.signing_public_key == other.signing_public_key
            && self.subject_key == other.subject_key
            && self.claim_body == other.claim_body
    }
}

/// Stored and transported form of a claim
///
/// Serializes as `{"id":..,"encodedData":..,"signature":..}` in that order,
/// leaving out `signature` when it is empty. At rest `signature` is always
/// empty; it is only filled on nonce-challenge responses, as base64 of the
/// DER-encoded ECDSA signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedClaim {
    pub id: String,
    /// Compact ES256 token produced from a [`Claim`]
    pub encoded_data: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

impl EncodedClaim {
    pub fn new(id: impl Into<String>, encoded_data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            encoded_data: encoded_data.into(),
            signature: String::new(),
        }
    }
}

/// Current Unix time clamped into the signed 32-bit range
fn unix_now() -> i32 {
    let now = Utc::now().timestamp();
    i32::try_from(now).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claim() -> Claim {
        Claim {
            issuer: "manufacturer_user".to_string(),
            signing_public_key: "sgk".to_string(),
            subject_key: "sub".to_string(),
            issued_at: 1557905444,
            claim_body: r#"{"certified_device":"true"}"#.to_string(),
        }
    }

    #[test]
    fn test_time_insensitive_equality() {
        let claim = sample_claim();
        let mut later = claim.clone();
        later.issued_at += 60;

        assert_ne!(claim, later);
        assert!(claim.eq_ignoring_issued_at(&later));

        later.claim_body = r#"{"certified_device":"false"}"#.to_string();
        assert!(!claim.eq_ignoring_issued_at(&later));
    }

    #[test]
    fn test_new_claim_is_stamped() {
        let before = Utc::now().timestamp();
        let claim = Claim::new("iss", "sgk", "sub", "{}");
        assert!(i64::from(claim.issued_at) >= before);
    }

    #[test]
    fn test_claim_json_field_names() {
        let json = serde_json::to_value(sample_claim()).unwrap();
        assert_eq!(json["iss"], "manufacturer_user");
        assert_eq!(json["iat"], 1557905444);
        assert_eq!(json["claim"], r#"{"certified_device":"true"}"#);
    }

    #[test]
    fn test_encoded_claim_canonical_json() {
        let claim = EncodedClaim::new(".testclaim", "a.b.c");
        assert_eq!(
            serde_json::to_string(&claim).unwrap(),
            r#"{"id":".testclaim","encodedData":"a.b.c"}"#
        );

        let signed = EncodedClaim {
            signature: "MEUCIQ==".to_string(),
            ..claim
        };
        assert_eq!(
            serde_json::to_string(&signed).unwrap(),
            r#"{"id":".testclaim","encodedData":"a.b.c","signature":"MEUCIQ=="}"#
        );
    }

    #[test]
    fn test_encoded_claim_without_signature_parses() {
        let claim: EncodedClaim =
            serde_json::from_str(r#"{"id":"x","encodedData":"a.b.c"}"#).unwrap();
        assert_eq!(claim, EncodedClaim::new("x", "a.b.c"));
    }
}
