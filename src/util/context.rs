//! Global context for slipway operations.
//!
//! Provides centralized access to paths and manifest discovery. All
//! deployment state is project-local: everything slipway materializes
//! lives under `.slipway/` next to the manifest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::ManifestError;

/// The manifest file name slipway looks for.
pub const MANIFEST_FILE: &str = "Slipway.toml";

/// Name of the project-local state directory.
pub const STATE_DIR: &str = ".slipway";

/// Global context containing the working directory and path helpers.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext { cwd })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext { cwd }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Find the manifest file (Slipway.toml) starting from cwd and
    /// searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(MANIFEST_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(ManifestError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }

    /// Find the project root (directory containing Slipway.toml).
    pub fn find_project_root(&self) -> Result<PathBuf, ManifestError> {
        self.find_manifest()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
    }
}

impl Default for GlobalContext {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| GlobalContext {
            cwd: PathBuf::from("."),
        })
    }
}

/// Paths under a project's `.slipway/` state directory.
///
/// Layout:
/// ```text
/// .slipway/
///   staging/<bundle-id>/     bundled artifacts awaiting publish
///   buckets/<bucket>/        materialized object stores
///   tables/<table>.json      materialized key-value tables
///   state.json               deployment state and outputs
/// ```
#[derive(Debug, Clone)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    /// Create the layout for a project root.
    pub fn new(project_root: &Path) -> Self {
        StateLayout {
            root: project_root.join(STATE_DIR),
        }
    }

    /// The `.slipway/` directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root of the artifact staging area.
    pub fn staging_root(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Staging area for one bundled artifact.
    pub fn staging_dir(&self, bundle_id: &str) -> PathBuf {
        self.staging_root().join(bundle_id)
    }

    /// Directory holding all materialized buckets.
    pub fn buckets_dir(&self) -> PathBuf {
        self.root.join("buckets")
    }

    /// Root directory of one materialized bucket.
    pub fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.buckets_dir().join(bucket)
    }

    /// Directory holding all materialized tables.
    pub fn tables_dir(&self) -> PathBuf {
        self.root.join("tables")
    }

    /// Backing document of one materialized table.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.tables_dir().join(format!("{}.json", table))
    }

    /// The deployment state file.
    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("Slipway.toml");
        std::fs::write(&manifest, "[stack]\nname = \"demo\"\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        assert_eq!(ctx.find_manifest().ok(), Some(manifest));
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("Slipway.toml");
        std::fs::write(&manifest, "[stack]\nname = \"demo\"\n").unwrap();

        let nested = tmp.path().join("web/src");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_manifest().ok(), Some(manifest));
    }

    #[test]
    fn test_find_manifest_not_found() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        let result = ctx.find_manifest();
        assert!(matches!(result, Err(ManifestError::NotFound { .. })));
    }

    #[test]
    fn test_state_layout_paths() {
        let layout = StateLayout::new(Path::new("/proj"));

        assert_eq!(layout.root(), Path::new("/proj/.slipway"));
        assert_eq!(
            layout.bucket_dir("site"),
            PathBuf::from("/proj/.slipway/buckets/site")
        );
        assert_eq!(
            layout.table_path("notes"),
            PathBuf::from("/proj/.slipway/tables/notes.json")
        );
        assert_eq!(
            layout.state_path(),
            PathBuf::from("/proj/.slipway/state.json")
        );
    }
}
