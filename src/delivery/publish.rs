//! Artifact publishing - additive upload into the site bucket.

use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::store::object::{ObjectStore, PutOptions};
use crate::util::fs::relative_path;
use crate::util::shell::Shell;

/// What a publish run uploaded.
#[derive(Debug, Clone, Default)]
pub struct PublishSummary {
    /// Number of objects uploaded
    pub uploaded: usize,

    /// Total bytes uploaded
    pub bytes: u64,
}

/// Upload every file under `artifact_dir` into the store.
///
/// Keys are the slash-separated paths relative to the artifact root.
/// The upload never deletes: objects already in the bucket but absent
/// from the artifact (the endpoint config document in particular) are
/// left in place.
pub fn publish_dir(
    store: &dyn ObjectStore,
    artifact_dir: &Path,
    shell: &Shell,
) -> Result<PublishSummary> {
    let mut files = Vec::new();
    for entry in WalkDir::new(artifact_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    let mut progress = shell.progress(files.len() as u64, "Uploading");
    let mut summary = PublishSummary::default();

    for path in files {
        let rel = relative_path(artifact_dir, &path);
        let key = rel
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect::<Vec<_>>()
            .join("/");

        let body = std::fs::read(&path)
            .with_context(|| format!("failed to read artifact file {}", path.display()))?;

        let opts = PutOptions {
            content_type: Some(content_type_for(&key).to_string()),
            cache_control: None,
        };
        store
            .put(&key, &body, &opts)
            .with_context(|| format!("failed to upload `{}`", key))?;

        tracing::debug!("uploaded {} ({} bytes)", key, body.len());
        summary.uploaded += 1;
        summary.bytes += body.len() as u64;
        progress.inc(1);
    }

    progress.finish();
    Ok(summary)
}

/// MIME type for an object key, by extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match ext {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::object::DirObjectStore;
    use crate::util::fs;
    use crate::util::shell::{ColorChoice, Shell, Verbosity};
    use tempfile::TempDir;

    fn quiet_shell() -> Shell {
        Shell::new(Verbosity::Quiet, ColorChoice::Never)
    }

    #[test]
    fn test_publish_uploads_tree_with_content_types() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("artifact");
        fs::ensure_dir(&artifact.join("assets")).unwrap();
        fs::write_string(&artifact.join("index.html"), "<html></html>").unwrap();
        fs::write_string(&artifact.join("assets/app.js"), "console.log(1)").unwrap();

        let store = DirObjectStore::open("site", tmp.path().join("bucket")).unwrap();
        let summary = publish_dir(&store, &artifact, &quiet_shell()).unwrap();

        assert_eq!(summary.uploaded, 2);
        assert_eq!(store.list().unwrap(), vec!["assets/app.js", "index.html"]);

        let meta = store.metadata("index.html").unwrap().unwrap();
        assert_eq!(meta.content_type.as_deref(), Some("text/html; charset=utf-8"));
        let meta = store.metadata("assets/app.js").unwrap().unwrap();
        assert_eq!(meta.content_type.as_deref(), Some("text/javascript"));
    }

    #[test]
    fn test_publish_preserves_unrelated_objects() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("artifact");
        fs::ensure_dir(&artifact).unwrap();
        fs::write_string(&artifact.join("index.html"), "v2").unwrap();

        let store = DirObjectStore::open("site", tmp.path().join("bucket")).unwrap();
        store
            .put("config.json", b"{\"demo\":{}}", &PutOptions::default())
            .unwrap();
        store
            .put("stale-asset.js", b"old", &PutOptions::default())
            .unwrap();

        publish_dir(&store, &artifact, &quiet_shell()).unwrap();

        // Additive upload: nothing already in the bucket is pruned.
        assert!(store.exists("config.json").unwrap());
        assert!(store.exists("stale-asset.js").unwrap());
        assert_eq!(store.get("index.html").unwrap().unwrap(), b"v2".to_vec());
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for("data.bin"), "application/octet-stream");
        assert_eq!(content_type_for("no-extension"), "application/octet-stream");
        assert_eq!(content_type_for("app.css"), "text/css");
    }
}
