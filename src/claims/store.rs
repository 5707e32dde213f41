//! File-backed claim storage.
//!
//! One file per claim id, holding the canonical JSON of an [`EncodedClaim`].
//! Each id moves through `absent -> present` (create), `present -> present`
//! (overwrite) and `present -> absent` (delete); every other transition fails.
//!
//! Writes go to a temporary file in the claim directory and are renamed into
//! place, so readers see either the old or the new claim, never a partial one.
//! Operations on the same id are not serialized here. A racing duplicate
//! `create` is rejected by the no-clobber rename, but a racing `overwrite` and
//! `delete` on one id has an undefined outcome. Callers that need more must
//! lock per id.

use crate::{
    claims::model::{Claim, EncodedClaim},
    config::StoreConfig,
    crypto::{jwt, pem::pem_decode_public},
    error::{ClaimError, Result},
};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Name prefix of in-flight writes; never a valid claim id
const TEMP_PREFIX: &str = ".tmp-claim-";

/// Check that a claim id names a single path segment
///
/// Rejects empty ids, `.`, `..`, ids containing `/`, `\` or NUL, and ids
/// starting with the store's temporary file prefix.
pub fn validate_claim_id(id: &str) -> Result<()> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.starts_with(TEMP_PREFIX)
        || id.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(ClaimError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Directory of stored claims
///
/// # Example
/// ```rust
/// use ecdsa_claims::{ClaimStore, EncodedClaim};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = ClaimStore::new(dir.path().join("claims"));
///
/// store.create(&EncodedClaim::new("device-cert", "header.payload.signature")).unwrap();
/// assert_eq!(store.list().unwrap(), vec!["device-cert".to_string()]);
/// assert!(store.create(&EncodedClaim::new("device-cert", "other")).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct ClaimStore {
    dir: PathBuf,
}

impl ClaimStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.claims_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store a new claim
    ///
    /// # Errors
    /// - `InvalidId` - `claim.id` is not a single path segment
    /// - `AlreadyExists` - a claim with this id is stored
    /// - `Encode` / `Io` - serialization or the write failed
    #[tracing::instrument(skip(self, claim), fields(id = %claim.id))]
    pub fn create(&self, claim: &EncodedClaim) -> Result<()> {
        let path = self.path_for(&claim.id)?;
        let data = canonical_json(claim)?;

        let staged = self.stage(&data)?;
        staged.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                ClaimError::AlreadyExists(claim.id.clone())
            } else {
                ClaimError::Io(e.error)
            }
        })?;

        tracing::info!("claim stored");
        Ok(())
    }

    /// Replace the contents of an existing claim
    ///
    /// # Errors
    /// - `InvalidId` - `claim.id` is not a single path segment
    /// - `NotFound` - no claim with this id is stored
    #[tracing::instrument(skip(self, claim), fields(id = %claim.id))]
    pub fn overwrite(&self, claim: &EncodedClaim) -> Result<()> {
        let path = self.path_for(&claim.id)?;
        let data = canonical_json(claim)?;

        fs::metadata(&path).map_err(|e| not_found_or_io(&claim.id, e))?;
        let staged = self.stage(&data)?;
        staged.persist(&path).map_err(|e| ClaimError::Io(e.error))?;

        tracing::info!("claim overwritten");
        Ok(())
    }

    /// Remove a stored claim
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        fs::remove_file(&path).map_err(|e| not_found_or_io(id, e))?;
        tracing::info!("claim deleted");
        Ok(())
    }

    /// Read a stored claim as it was written
    ///
    /// # Errors
    /// - `NotFound` - no claim with this id is stored
    /// - `Decode` - the file is not a valid encoded claim, or it names a
    ///   different id than its file name
    #[tracing::instrument(skip(self))]
    pub fn get(&self, id: &str) -> Result<EncodedClaim> {
        let path = self.path_for(id)?;
        let data = fs::read(&path).map_err(|e| not_found_or_io(id, e))?;
        let claim: EncodedClaim = serde_json::from_slice(&data).map_err(|e| {
            ClaimError::Decode(format!("Stored claim {} is not valid JSON: {}", id, e))
        })?;
        if claim.id != id {
            return Err(ClaimError::Decode(format!(
                "Stored claim {} names a different id {:?}",
                id, claim.id
            )));
        }
        tracing::debug!("encoded claim retrieved");
        Ok(claim)
    }

    /// Read a stored claim and verify its token against its embedded key
    ///
    /// Pulls `sgk` out of the unverified token, parses it as a public key and
    /// verifies the token with it. The first failing stage decides the error.
    pub fn get_verified_claim(&self, id: &str) -> Result<Claim> {
        let encoded = self.get(id)?;
        let sgk = jwt::embedded_signing_key(&encoded.encoded_data)?;
        let public_key = pem_decode_public(&sgk)?;
        let claim = jwt::verify_and_extract(&encoded.encoded_data, &public_key)?;
        tracing::info!(id, issuer = %claim.issuer, "claim verified");
        Ok(claim)
    }

    /// Ids of all stored claims, in filesystem order
    pub fn list(&self) -> Result<Vec<String>> {
        self.ensure_dir()?;
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if name.starts_with(TEMP_PREFIX) => {}
                Ok(name) => ids.push(name),
                Err(name) => tracing::warn!(?name, "skipping non UTF-8 claim file"),
            }
        }
        Ok(ids)
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        validate_claim_id(id)?;
        Ok(self.dir.join(id))
    }

    /// Write `data` to a synced temporary file inside the claim directory
    fn stage(&self, data: &[u8]) -> Result<NamedTempFile> {
        self.ensure_dir()?;
        let mut staged = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.dir)?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "creating claim directory");
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

fn canonical_json(claim: &EncodedClaim) -> Result<Vec<u8>> {
    serde_json::to_vec(claim)
        .map_err(|e| ClaimError::Encode(format!("Failed to serialize claim {}: {}", claim.id, e)))
}

fn not_found_or_io(id: &str, e: io::Error) -> ClaimError {
    if e.kind() == io::ErrorKind::NotFound {
        ClaimError::NotFound(id.to_string())
    } else {
        ClaimError::Io(e)
    }
}
