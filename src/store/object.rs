//! Object storage - the site bucket.
//!
//! Objects are addressed by relative keys (`index.html`,
//! `assets/app.js`). Metadata set at put time (content type, cache
//! control) is preserved so the distribution can replay it on serve.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::util::fs;

/// Directory holding metadata sidecar documents inside a bucket.
const META_DIR: &str = ".meta";

/// Metadata attached to an object at put time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// MIME content type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Cache-Control header value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

impl ObjectMeta {
    fn is_empty(&self) -> bool {
        self.content_type.is_none() && self.cache_control.is_none()
    }
}

/// Options for a put operation.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// MIME content type to record
    pub content_type: Option<String>,

    /// Cache-Control header value to record
    pub cache_control: Option<String>,
}

impl PutOptions {
    fn to_meta(&self) -> ObjectMeta {
        ObjectMeta {
            content_type: self.content_type.clone(),
            cache_control: self.cache_control.clone(),
        }
    }
}

/// Object storage interface.
///
/// Put overwrites both the object and its metadata. There is no delete:
/// publishes are additive, and teardown removes the whole bucket.
pub trait ObjectStore: Send + Sync {
    /// The bucket name.
    fn name(&self) -> &str;

    /// Store an object under a key, replacing any previous version.
    fn put(&self, key: &str, body: &[u8], opts: &PutOptions) -> Result<()>;

    /// Fetch an object's body, or None if the key is absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Fetch an object's metadata, or None if the key is absent.
    fn metadata(&self, key: &str) -> Result<Option<ObjectMeta>>;

    /// All object keys, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Whether a key holds an object.
    fn exists(&self, key: &str) -> Result<bool>;
}

/// Object store over a plain directory.
///
/// Keys map to file paths under the root; metadata lives in a parallel
/// tree under `.meta/` with one JSON sidecar per object.
#[derive(Debug)]
pub struct DirObjectStore {
    name: String,
    root: PathBuf,
}

impl DirObjectStore {
    /// Open a bucket directory, creating it if needed.
    pub fn open(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let store = DirObjectStore {
            name: name.into(),
            root: root.into(),
        };
        fs::ensure_dir(&store.root)?;
        Ok(store)
    }

    /// The bucket root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to its object path, rejecting keys that would
    /// escape the bucket.
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let rel = checked_key(key)?;
        Ok(self.root.join(rel))
    }

    fn meta_path(&self, key: &str) -> Result<PathBuf> {
        let rel = checked_key(key)?;
        Ok(self.root.join(META_DIR).join(format!("{}.json", rel.display())))
    }
}

/// Validate a key and return it as a relative path.
fn checked_key(key: &str) -> Result<PathBuf> {
    if key.is_empty() {
        bail!("object key must not be empty");
    }

    let path = Path::new(key);
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                if part == META_DIR {
                    bail!("object key `{}` collides with the metadata directory", key);
                }
            }
            _ => bail!("object key `{}` must be a plain relative path", key),
        }
    }

    Ok(path.to_path_buf())
}

impl ObjectStore for DirObjectStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, key: &str, body: &[u8], opts: &PutOptions) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::ensure_dir(parent)?;
        }
        fs::write_atomic(&path, body)
            .with_context(|| format!("failed to store object `{}`", key))?;

        let meta_path = self.meta_path(key)?;
        let meta = opts.to_meta();
        if meta.is_empty() {
            fs::remove_file_if_exists(&meta_path)?;
        } else {
            if let Some(parent) = meta_path.parent() {
                fs::ensure_dir(parent)?;
            }
            let body = serde_json::to_vec_pretty(&meta)?;
            fs::write_atomic(&meta_path, &body)
                .with_context(|| format!("failed to store metadata for `{}`", key))?;
        }

        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let body = std::fs::read(&path)
            .with_context(|| format!("failed to read object `{}`", key))?;
        Ok(Some(body))
    }

    fn metadata(&self, key: &str) -> Result<Option<ObjectMeta>> {
        if !self.object_path(key)?.is_file() {
            return Ok(None);
        }

        let meta_path = self.meta_path(key)?;
        if !meta_path.is_file() {
            return Ok(Some(ObjectMeta::default()));
        }

        let content = fs::read_to_string(&meta_path)?;
        let meta = serde_json::from_str(&content)
            .with_context(|| format!("corrupt metadata for object `{}`", key))?;
        Ok(Some(meta))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.file_name() != META_DIR);
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = fs::relative_path(&self.root, entry.path());
            // Keys are slash-separated regardless of platform.
            let key = rel
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }

        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.object_path(key)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> DirObjectStore {
        DirObjectStore::open("test-site", tmp.path().join("bucket")).unwrap()
    }

    #[test]
    fn test_put_get_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        store
            .put("index.html", b"<html></html>", &PutOptions::default())
            .unwrap();

        assert!(store.exists("index.html").unwrap());
        assert_eq!(
            store.get("index.html").unwrap().unwrap(),
            b"<html></html>".to_vec()
        );
        assert_eq!(store.get("missing.html").unwrap(), None);
    }

    #[test]
    fn test_put_records_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let opts = PutOptions {
            content_type: Some("application/json".to_string()),
            cache_control: Some("max-age=0, no-cache, no-store, must-revalidate".to_string()),
        };
        store.put("config.json", b"{}", &opts).unwrap();

        let meta = store.metadata("config.json").unwrap().unwrap();
        assert_eq!(meta.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            meta.cache_control.as_deref(),
            Some("max-age=0, no-cache, no-store, must-revalidate")
        );
    }

    #[test]
    fn test_overwrite_replaces_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let opts = PutOptions {
            content_type: Some("text/plain".to_string()),
            cache_control: None,
        };
        store.put("file.txt", b"v1", &opts).unwrap();
        store.put("file.txt", b"v2", &PutOptions::default()).unwrap();

        assert_eq!(store.get("file.txt").unwrap().unwrap(), b"v2".to_vec());
        let meta = store.metadata("file.txt").unwrap().unwrap();
        assert_eq!(meta, ObjectMeta::default());
    }

    #[test]
    fn test_list_skips_metadata_tree() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let opts = PutOptions {
            content_type: Some("text/html".to_string()),
            cache_control: None,
        };
        store.put("index.html", b"x", &opts).unwrap();
        store.put("assets/app.js", b"y", &PutOptions::default()).unwrap();

        let keys = store.list().unwrap();
        assert_eq!(keys, vec!["assets/app.js", "index.html"]);
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert!(store.get("../outside").is_err());
        assert!(store.get("/etc/passwd").is_err());
        assert!(store.put(".meta/x", b"", &PutOptions::default()).is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_missing_object_has_no_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert_eq!(store.metadata("nope").unwrap(), None);
    }
}
