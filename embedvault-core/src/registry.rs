//! Versioned model artifact registry.
//!
//! Artifacts are copied under `<root>/<model>/<version>/artifacts` and the
//! version records live in a [`DurableStore`] at `<root>/registry`, one
//! collection per model with the version string as the record id. The model
//! name `registry` is therefore reserved.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Settings, StoreConfig, SyncMode};
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::storage::DurableStore;
use crate::vector::VectorRecord;

const REGISTRY_DIR: &str = "registry";
const ARTIFACTS_DIR: &str = "artifacts";

/// One registered version of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub model_name: String,
    pub version: String,
    /// Directory holding this version's `artifacts` folder.
    pub path: PathBuf,
    /// Registration time, RFC 3339.
    pub timestamp: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ModelVersion {
    /// Where the copied artifacts live.
    pub fn artifacts_path(&self) -> PathBuf {
        self.path.join(ARTIFACTS_DIR)
    }
}

/// Registry of model versions and their artifacts.
///
/// # Example
///
/// ```no_run
/// use embedvault_core::{Metadata, ModelRegistry};
///
/// let registry = ModelRegistry::open("./model_registry").unwrap();
/// let version = registry
///     .register("encoder", "./out/encoder.bin", "1.0.0", Metadata::new().with_field("dim", 384))
///     .unwrap();
///
/// assert_eq!(registry.get("encoder", "1.0.0").unwrap(), Some(version));
/// ```
#[derive(Debug)]
pub struct ModelRegistry {
    root: PathBuf,
    store: DurableStore,
    register_lock: Mutex<()>,
}

impl ModelRegistry {
    /// Opens the registry rooted at `root`, creating it if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let store = DurableStore::open(
            StoreConfig::new(root.join(REGISTRY_DIR)).with_sync_mode(SyncMode::Immediate),
        )?;
        Ok(Self {
            root,
            store,
            register_lock: Mutex::new(()),
        })
    }

    /// Opens the registry at the configured (or default) registry path.
    pub fn from_env() -> Result<Self> {
        Self::open(Settings::from_env().registry_path())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copies the artifact at `artifact_path` (a file or a directory tree) into
    /// the registry and records it as `version` of `name`.
    pub fn register<P: AsRef<Path>>(
        &self,
        name: &str,
        artifact_path: P,
        version: &str,
        metadata: Metadata,
    ) -> Result<ModelVersion> {
        check_component("model name", name)?;
        check_component("version", version)?;
        if name == REGISTRY_DIR {
            return Err(Error::InvalidRecord(format!(
                "model name {:?} is reserved for the registry's own records",
                name
            )));
        }
        let artifact_path = artifact_path.as_ref();

        let _guard = self.register_lock.lock();
        if self.store.get(name, version)?.is_some() {
            return Err(Error::AlreadyRegistered {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        let version_dir = self.root.join(name).join(version);
        let artifacts = version_dir.join(ARTIFACTS_DIR);
        copy_artifact(artifact_path, &artifacts)?;

        let entry = ModelVersion {
            model_name: name.to_string(),
            version: version.to_string(),
            path: version_dir,
            timestamp: Utc::now().to_rfc3339(),
            metadata,
        };
        let info = Metadata::from_value(serde_json::to_value(&entry)?)
            .ok_or_else(|| Error::Serialization("model version is not a JSON object".into()))?;
        self.store
            .put(name, &VectorRecord::new(version, Vec::new()).with_metadata(info))?;

        info!(model = name, version, path = %entry.path.display(), "registered model version");
        Ok(entry)
    }

    /// Returns the record of `version` of `name`, if registered.
    pub fn get(&self, name: &str, version: &str) -> Result<Option<ModelVersion>> {
        let Some(record) = self.store.get(name, version)? else {
            return Ok(None);
        };
        let entry = serde_json::from_value(record.metadata.into())?;
        Ok(Some(entry))
    }

    /// Returns every registered model name, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.store.collections())
    }

    /// Returns the versions of `name` in registration order.
    pub fn versions(&self, name: &str) -> Vec<String> {
        self.store.ids(name)
    }
}

/// Model names and versions become directory names.
fn check_component(what: &str, value: &str) -> Result<()> {
    if value.is_empty() || value == "." || value == ".." || value.contains(|c: char| c == '/' || c == '\\') {
        return Err(Error::InvalidRecord(format!("{} {:?} is not a valid path component", what, value)));
    }
    Ok(())
}

fn copy_artifact(source: &Path, dest_dir: &Path) -> Result<()> {
    let meta = fs::metadata(source).map_err(|e| {
        Error::Storage(format!("artifact {} not readable: {}", source.display(), e))
    })?;

    if meta.is_dir() {
        copy_tree(source, dest_dir)
    } else {
        fs::create_dir_all(dest_dir)
            .map_err(|e| Error::Storage(format!("create artifacts dir failed: {}", e)))?;
        let file_name = source
            .file_name()
            .ok_or_else(|| Error::Storage(format!("artifact {} has no file name", source.display())))?;
        fs::copy(source, dest_dir.join(file_name))
            .map_err(|e| Error::Storage(format!("copy artifact failed: {}", e)))?;
        Ok(())
    }
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .map_err(|e| Error::Storage(format!("create {} failed: {}", dest.display(), e)))?;

    let entries = fs::read_dir(source)
        .map_err(|e| Error::Storage(format!("read {} failed: {}", source.display(), e)))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::Storage(format!("read dir entry failed: {}", e)))?;
        let target = dest.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| Error::Storage(format!("stat {} failed: {}", entry.path().display(), e)))?;

        if file_type.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| Error::Storage(format!("copy {} failed: {}", entry.path().display(), e)))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_registry_path() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("embedvault_test_registry")
            .join(format!("registry_{}_{}", std::process::id(), id));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_register_file_and_get() {
        let root = temp_registry_path();
        let source = root.join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("weights.bin"), b"0123").unwrap();

        let registry = ModelRegistry::open(root.join("reg")).unwrap();
        let version = registry
            .register(
                "encoder",
                source.join("weights.bin"),
                "1.0",
                Metadata::new().with_field("dim", 384),
            )
            .unwrap();

        assert_eq!(version.model_name, "encoder");
        assert!(chrono::DateTime::parse_from_rfc3339(&version.timestamp).is_ok());
        assert_eq!(
            fs::read(version.artifacts_path().join("weights.bin")).unwrap(),
            b"0123"
        );

        let fetched = registry.get("encoder", "1.0").unwrap().unwrap();
        assert_eq!(fetched, version);
        assert_eq!(fetched.metadata.get_i64("dim"), Some(384));
        assert!(registry.get("encoder", "2.0").unwrap().is_none());
        assert!(registry.get("decoder", "1.0").unwrap().is_none());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_register_directory_tree() {
        let root = temp_registry_path();
        let source = root.join("model");
        fs::create_dir_all(source.join("tokenizer")).unwrap();
        fs::write(source.join("config.json"), b"{}").unwrap();
        fs::write(source.join("tokenizer").join("vocab.txt"), b"a\nb").unwrap();

        let registry = ModelRegistry::open(root.join("reg")).unwrap();
        let version = registry.register("bert", &source, "v1", Metadata::new()).unwrap();

        let artifacts = version.artifacts_path();
        assert!(artifacts.join("config.json").is_file());
        assert_eq!(fs::read(artifacts.join("tokenizer").join("vocab.txt")).unwrap(), b"a\nb");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let root = temp_registry_path();
        let artifact = root.join("a.bin");
        fs::create_dir_all(&root).unwrap();
        fs::write(&artifact, b"x").unwrap();

        let registry = ModelRegistry::open(root.join("reg")).unwrap();
        registry.register("m", &artifact, "1", Metadata::new()).unwrap();

        let result = registry.register("m", &artifact, "1", Metadata::new());
        assert!(matches!(
            result,
            Err(Error::AlreadyRegistered { name, version }) if name == "m" && version == "1"
        ));

        registry.register("m", &artifact, "2", Metadata::new()).unwrap();
        assert_eq!(registry.versions("m"), vec!["1", "2"]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_artifact_is_storage_error() {
        let root = temp_registry_path();
        let registry = ModelRegistry::open(&root).unwrap();

        let result = registry.register("m", root.join("nope"), "1", Metadata::new());
        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(registry.get("m", "1").unwrap().is_none());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_list_sorted_and_persistent() {
        let root = temp_registry_path();
        let artifact = root.join("a.bin");
        fs::create_dir_all(&root).unwrap();
        fs::write(&artifact, b"x").unwrap();

        {
            let registry = ModelRegistry::open(root.join("reg")).unwrap();
            registry.register("zeta", &artifact, "1", Metadata::new()).unwrap();
            registry.register("alpha", &artifact, "1", Metadata::new()).unwrap();
        }

        let registry = ModelRegistry::open(root.join("reg")).unwrap();
        assert_eq!(registry.list().unwrap(), vec!["alpha", "zeta"]);
        assert!(registry.get("zeta", "1").unwrap().is_some());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_rejects_path_like_names() {
        let root = temp_registry_path();
        let registry = ModelRegistry::open(&root).unwrap();

        for name in ["", "..", "a/b"] {
            let result = registry.register(name, &root, "1", Metadata::new());
            assert!(matches!(result, Err(Error::InvalidRecord(_))));
        }

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_rejects_reserved_model_name() {
        let root = temp_registry_path();
        let artifact = root.join("a.bin");
        fs::create_dir_all(&root).unwrap();
        fs::write(&artifact, b"x").unwrap();

        let registry = ModelRegistry::open(root.join("reg")).unwrap();
        let result = registry.register("registry", &artifact, "1", Metadata::new());
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
        assert!(!root.join("reg").join("registry").join("1").exists());
        drop(registry);

        // The registry's own log is untouched and still opens.
        let registry = ModelRegistry::open(root.join("reg")).unwrap();
        registry.register("m", &artifact, "1", Metadata::new()).unwrap();
        assert_eq!(registry.list().unwrap(), vec!["m"]);

        let _ = fs::remove_dir_all(&root);
    }
}
