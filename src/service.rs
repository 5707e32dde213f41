use crate::{
    claims::{
        model::{Claim, EncodedClaim},
        store::ClaimStore,
    },
    config::StoreConfig,
    crypto::{
        challenge::ChallengeSigner,
        jwt::encode_claim,
        keys::{key_fingerprint, KeyStore},
        pem::pem_encode_public,
    },
    error::Result,
};

/// Entry point for a transport layer serving claims
///
/// This service bundles the device key and the claim directory and offers:
/// - Create, overwrite, delete, get (plain and verified) and list of claims
/// - Issuing a new claim signed by the device key
/// - Signing nonce challenges against a stored claim
/// - The device public key
///
/// Every operation returns a typed [`Result`]; mapping errors to transport
/// statuses is left to the caller (see [`crate::ClaimError::is_client_error`]).
#[derive(Debug)]
pub struct ClaimService {
    keys: KeyStore,
    store: ClaimStore,
}

impl ClaimService {
    /// Open the claim and key storage described by `config`
    ///
    /// Loads the device key, creating it on first start. A failure here means
    /// the process has no signing identity and should not start serving.
    ///
    /// # Example
    /// ```rust
    /// use ecdsa_claims::{ClaimService, EncodedClaim};
    /// use ecdsa_claims::config::{Environment, StoreConfig};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let service = ClaimService::open(&StoreConfig::rooted_at(dir.path(), Environment::Test)).unwrap();
    ///
    /// service.create(&EncodedClaim::new("cert", "a.b.c")).unwrap();
    /// assert_eq!(service.list().unwrap(), vec!["cert".to_string()]);
    /// ```
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let keys = KeyStore::from_config(config);
        let key = keys.ensure_initialized()?;
        let public_pem = pem_encode_public(&key.public_key())?;
        tracing::info!(
            environment = ?config.environment,
            fingerprint = %key_fingerprint(&public_pem),
            "device key ready"
        );

        Ok(Self {
            keys,
            store: ClaimStore::from_config(config),
        })
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    pub fn claim_store(&self) -> &ClaimStore {
        &self.store
    }

    /// Store a new encoded claim; fails if the id is taken
    pub fn create(&self, claim: &EncodedClaim) -> Result<()> {
        self.store.create(claim)
    }

    /// Replace an existing encoded claim; fails if the id is unknown
    pub fn overwrite(&self, claim: &EncodedClaim) -> Result<()> {
        self.store.overwrite(claim)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id)
    }

    pub fn get(&self, id: &str) -> Result<EncodedClaim> {
        self.store.get(id)
    }

    /// Read a stored claim and check its token signature
    pub fn get_verified(&self, id: &str) -> Result<Claim> {
        self.store.get_verified_claim(id)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        self.store.list()
    }

    /// Sign `claim` with the device key and store it under `id`
    ///
    /// # Returns
    /// * `Ok(EncodedClaim)` - the stored form
    /// * `Err(ClaimError)` - invalid or taken id, or signing failed
    pub fn issue(&self, id: &str, claim: &Claim) -> Result<EncodedClaim> {
        let key = self.keys.private_key()?;
        let encoded = EncodedClaim::new(id, encode_claim(claim, &key)?);
        self.store.create(&encoded)?;
        tracing::info!(id, issuer = %claim.issuer, "claim issued");
        Ok(encoded)
    }

    /// Build a claim whose signing key is the device key, stamped now
    ///
    /// Pair with [`ClaimService::issue`] for self-issued claims.
    pub fn self_signed_claim(
        &self,
        issuer: &str,
        subject_key: &str,
        claim_body: &str,
    ) -> Result<Claim> {
        Ok(Claim::new(
            issuer,
            self.public_key_pem()?,
            subject_key,
            claim_body,
        ))
    }

    /// Sign a control unit's nonce in the context of a stored claim
    pub fn sign_nonce(&self, claim_id: &str, nonce: &str) -> Result<EncodedClaim> {
        ChallengeSigner::new(&self.store, &self.keys).sign_nonce(claim_id, nonce)
    }

    /// PEM of the device public key
    pub fn public_key_pem(&self) -> Result<String> {
        pem_encode_public(&self.keys.public_key()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Environment,
        crypto::{
            challenge::{decode_challenge_signature, generate_nonce},
            ecdsa::verify_der_signature,
            pem::pem_decode_public,
        },
        error::ClaimError,
    };

    fn create_test_service() -> (tempfile::TempDir, ClaimService) {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::rooted_at(dir.path(), Environment::Test);
        let service = ClaimService::open(&config).unwrap();
        (dir, service)
    }

    #[test]
    fn test_open_reuses_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::rooted_at(dir.path(), Environment::Test);

        let first = ClaimService::open(&config).unwrap().public_key_pem().unwrap();
        let second = ClaimService::open(&config).unwrap().public_key_pem().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_open_fails_on_corrupt_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::rooted_at(dir.path(), Environment::Test);
        std::fs::create_dir_all(&config.keys_dir).unwrap();
        std::fs::write(config.key_path(), "corrupt").unwrap();

        let result = ClaimService::open(&config);
        assert!(matches!(result, Err(ClaimError::KeyDecode(_))));
    }

    #[test]
    fn test_issue_and_verify() {
        let (_dir, service) = create_test_service();
        let claim = service
            .self_signed_claim("manufacturer_user", "did:example:device", r#"{"certified_device":"true"}"#)
            .unwrap();

        let encoded = service.issue(".testclaim", &claim).unwrap();
        assert_eq!(service.get(".testclaim").unwrap(), encoded);

        let verified = service.get_verified(".testclaim").unwrap();
        assert_eq!(verified, claim);
    }

    #[test]
    fn test_issue_twice_fails() {
        let (_dir, service) = create_test_service();
        let claim = service.self_signed_claim("iss", "sub", "{}").unwrap();
        service.issue("dup", &claim).unwrap();

        let result = service.issue("dup", &claim);
        assert!(matches!(result, Err(ref e) if e.is_client_error()));
    }

    #[test]
    fn test_full_lifecycle() {
        let (_dir, service) = create_test_service();
        let claim = EncodedClaim::new(".testclaim", "a.b.c");

        service.create(&claim).unwrap();
        assert!(service.list().unwrap().contains(&".testclaim".to_string()));

        let updated = EncodedClaim::new(".testclaim", "d.e.f");
        service.overwrite(&updated).unwrap();
        assert_eq!(service.get(".testclaim").unwrap(), updated);

        service.delete(".testclaim").unwrap();
        let result = service.get(".testclaim");
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_sign_nonce_verifies_against_public_key() {
        let (_dir, service) = create_test_service();
        let claim = service.self_signed_claim("iss", "sub", "{}").unwrap();
        service.issue("claimId", &claim).unwrap();

        let nonce = generate_nonce();
        let response = service.sign_nonce("claimId", &nonce).unwrap();

        let public_key = pem_decode_public(&service.public_key_pem().unwrap()).unwrap();
        let der = decode_challenge_signature(&response.signature).unwrap();
        assert!(verify_der_signature(&public_key, nonce.as_bytes(), &der).is_ok());
    }

    #[test]
    fn test_invalid_id_is_client_error() {
        let (_dir, service) = create_test_service();
        let result = service.create(&EncodedClaim::new("a/b", "a.b.c"));
        assert!(matches!(result, Err(ref e) if e.is_client_error()));
        assert!(matches!(result, Err(ClaimError::InvalidId(_))));
    }
}
