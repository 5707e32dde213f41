use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Key storage partition
///
/// Production and test runs keep their device keys in different files so a
/// test suite can never overwrite the identity of a deployed device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Test,
}

impl Environment {
    /// File name of the private key for this partition
    pub fn key_file_name(self) -> &'static str {
        match self {
            Environment::Production => "private.pem",
            Environment::Test => "test.pem",
        }
    }
}

/// Configuration for claim and key storage
///
/// This struct names the two directories the crate owns:
/// - `claims_dir` holds one JSON file per stored claim
/// - `keys_dir` holds the device private key for `environment`
///
/// Both directories are created lazily on first write.
///
/// # Example
/// ```rust
/// use ecdsa_claims::config::{Environment, StoreConfig};
///
/// let config = StoreConfig::rooted_at("/var/lib/device", Environment::Production);
/// assert!(config.claims_dir.ends_with("claims"));
/// assert!(config.key_path().ends_with("keys/private.pem"));
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one file per claim id
    pub claims_dir: PathBuf,
    /// Directory holding the device private key
    pub keys_dir: PathBuf,
    /// Which key file inside `keys_dir` to use
    pub environment: Environment,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            claims_dir: PathBuf::from("claims"),
            keys_dir: PathBuf::from("keys"),
            environment: Environment::Production,
        }
    }
}

impl StoreConfig {
    /// Place `claims/` and `keys/` under a single root directory
    pub fn rooted_at(root: impl AsRef<Path>, environment: Environment) -> Self {
        let root = root.as_ref();
        Self {
            claims_dir: root.join("claims"),
            keys_dir: root.join("keys"),
            environment,
        }
    }

    /// Full path of the private key file for the configured environment
    pub fn key_path(&self) -> PathBuf {
        self.keys_dir.join(self.environment.key_file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = StoreConfig::default();
        assert_eq!(config.claims_dir, PathBuf::from("claims"));
        assert_eq!(config.key_path(), PathBuf::from("keys").join("private.pem"));
    }

    #[test]
    fn test_environments_use_distinct_files() {
        assert_ne!(
            Environment::Production.key_file_name(),
            Environment::Test.key_file_name()
        );
        let config = StoreConfig::rooted_at("/tmp/root", Environment::Test);
        assert_eq!(config.key_path(), PathBuf::from("/tmp/root/keys/test.pem"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"environment":"test","claims_dir":"/data/claims"}"#).unwrap();
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.claims_dir, PathBuf::from("/data/claims"));
        assert_eq!(config.keys_dir, PathBuf::from("keys"));
    }
}
