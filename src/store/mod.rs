//! Rule store
//!
//! Persists the keyword and permission configs as JSON blobs. Loading
//! never fails the caller: missing or corrupt data degrades to the
//! built-in defaults with a logged warning. Save failures are real errors
//! and must be surfaced, not swallowed.
//!
//! Session grants are deliberately not persisted; they are runtime-only
//! state owned by the permission gate.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::RouterResult;
use crate::permissions::config::PermissionConfig;
use crate::routing::rules::KeywordConfig;

/// Default directory for rule storage
const RULES_DIR: &str = "rules";

/// Contract between the engines and whatever owns persisted rule tables
pub trait RuleStore {
    /// Load the keyword config, seeding defaults if the backing data is
    /// missing or corrupt
    fn load_keyword_config(&self) -> KeywordConfig;

    /// Persist the keyword config
    fn save_keyword_config(&self, config: &KeywordConfig) -> RouterResult<()>;

    /// Load the permission config, seeding defaults if the backing data is
    /// missing or corrupt
    fn load_permission_config(&self) -> PermissionConfig;

    /// Persist the permission config
    fn save_permission_config(&self, config: &PermissionConfig) -> RouterResult<()>;
}

/// File-backed rule store (one JSON file per config kind)
#[derive(Debug, Clone)]
pub struct FileRuleStore {
    base_dir: PathBuf,
}

impl FileRuleStore {
    /// Create a store under the default directory
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from(RULES_DIR),
        }
    }

    /// Create a store under a custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
        }
    }

    /// Path of the keyword config file
    pub fn keyword_path(&self) -> PathBuf {
        self.base_dir.join("keywords.json")
    }

    /// Path of the permission config file
    pub fn permission_path(&self) -> PathBuf {
        self.base_dir.join("permissions.json")
    }

    fn ensure_dir(&self) -> RouterResult<()> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir)?;
        }
        Ok(())
    }

    fn load_or_default<T: DeserializeOwned>(path: &Path, kind: &str, default: fn() -> T) -> T {
        if !path.exists() {
            tracing::debug!("No {} config at {}; using defaults", kind, path.display());
            return default();
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(
                    "Failed to open {} config at {}: {}; using defaults",
                    kind,
                    path.display(),
                    err
                );
                return default();
            }
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Corrupt {} config at {}: {}; using defaults",
                    kind,
                    path.display(),
                    err
                );
                default()
            }
        }
    }

    fn save<T: Serialize>(&self, path: &Path, config: &T) -> RouterResult<()> {
        self.ensure_dir()?;
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, config)?;
        Ok(())
    }
}

impl RuleStore for FileRuleStore {
    fn load_keyword_config(&self) -> KeywordConfig {
        Self::load_or_default(&self.keyword_path(), "keyword", KeywordConfig::with_defaults)
    }

    fn save_keyword_config(&self, config: &KeywordConfig) -> RouterResult<()> {
        self.save(&self.keyword_path(), config)
    }

    fn load_permission_config(&self) -> PermissionConfig {
        Self::load_or_default(
            &self.permission_path(),
            "permission",
            PermissionConfig::with_defaults,
        )
    }

    fn save_permission_config(&self, config: &PermissionConfig) -> RouterResult<()> {
        self.save(&self.permission_path(), config)
    }
}

impl Default for FileRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experts::ExpertId;
    use crate::routing::rules::KeywordRule;
    use std::io::Write;

    #[test]
    fn test_missing_files_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRuleStore::with_dir(dir.path());

        let keywords = store.load_keyword_config();
        assert!(keywords.rules.iter().all(|r| r.built_in));

        let permissions = store.load_permission_config();
        assert!(permissions.enabled);
    }

    #[test]
    fn test_round_trip_preserves_user_rules() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRuleStore::with_dir(dir.path());

        let config = KeywordConfig::with_defaults().add_rule(KeywordRule::new(
            "deploy",
            vec!["deploy".into()],
            ExpertId::Coder,
        ));
        store.save_keyword_config(&config).unwrap();

        let loaded = store.load_keyword_config();
        assert_eq!(loaded.rules.len(), config.rules.len());
        assert!(loaded.rules.iter().any(|r| r.name == "deploy" && !r.built_in));
    }

    #[test]
    fn test_corrupt_file_degrades_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRuleStore::with_dir(dir.path());

        fs::create_dir_all(dir.path()).unwrap();
        let mut file = File::create(store.permission_path()).unwrap();
        file.write_all(b"{ not json").unwrap();

        let loaded = store.load_permission_config();
        assert!(loaded.enabled);
        assert!(!loaded.patterns.is_empty());
    }

    #[test]
    fn test_save_failure_is_an_error() {
        // A base dir that is actually a file makes create_dir_all fail
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        File::create(&blocker).unwrap();

        let store = FileRuleStore::with_dir(blocker.join("nested"));
        let err = store
            .save_permission_config(&PermissionConfig::with_defaults())
            .unwrap_err();
        assert!(matches!(err, crate::core::RouterError::Io(_)));
    }

    #[test]
    fn test_permission_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRuleStore::with_dir(dir.path());

        let config = PermissionConfig::with_defaults()
            .set_pattern_enabled("builtin-file-write", false)
            .unwrap();
        store.save_permission_config(&config).unwrap();

        let loaded = store.load_permission_config();
        assert!(!loaded.pattern("builtin-file-write").unwrap().enabled);
    }
}
