//! Local bundle strategy - runs the build tool on the host.

use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use semver::Version;

use crate::bundler::{detect_tool_version, BundleRequest, BundleStrategy, ToolAvailability};
use crate::core::resource::BundleSpec;
use crate::util::fs;
use crate::util::process::ProcessBuilder;

/// Bundles on the host with the project's own build tooling.
///
/// The probe runs `<tool> --version`; the build runs the manifest's
/// build command inside the frontend source directory with inherited
/// stdio, then copies the tool's output into the staging directory.
pub struct LocalBundler {
    /// Tool probed before building
    tool: String,

    /// Minimum acceptable tool version, if the manifest sets one
    min_version: Option<Version>,

    /// Cached availability (lazily computed)
    cached_availability: OnceLock<ToolAvailability>,
}

impl LocalBundler {
    /// Create a local bundler for a declared bundle.
    pub fn from_spec(spec: &BundleSpec) -> Self {
        LocalBundler {
            tool: spec.tool.clone(),
            min_version: spec.min_tool_version.clone(),
            cached_availability: OnceLock::new(),
        }
    }
}

impl BundleStrategy for LocalBundler {
    fn name(&self) -> &'static str {
        "local"
    }

    fn availability(&self) -> Result<ToolAvailability> {
        if let Some(availability) = self.cached_availability.get() {
            return Ok(availability.clone());
        }

        let availability = match detect_tool_version(&self.tool) {
            Ok(version) => match &self.min_version {
                Some(required) if version < *required => ToolAvailability::VersionTooOld {
                    found: version,
                    required: required.clone(),
                },
                _ => ToolAvailability::Available { version },
            },
            Err(_) => ToolAvailability::NotInstalled {
                tool: self.tool.clone(),
                install_hint: format!("npm install -g {}", self.tool),
            },
        };

        let _ = self.cached_availability.set(availability.clone());

        Ok(availability)
    }

    fn bundle(&self, request: &BundleRequest) -> Result<()> {
        let Some((program, args)) = request.build_command.split_first() else {
            bail!("bundle build command is empty");
        };

        let cmd = ProcessBuilder::new(program)
            .args(args)
            .cwd(&request.source_dir);

        tracing::debug!("running build command: {}", cmd.display_command());

        let status = cmd.status()?;
        if !status.success() {
            bail!(
                "build command `{}` failed with {}",
                cmd.display_command(),
                status
            );
        }

        if !request.output_dir.is_dir() {
            bail!(
                "build command `{}` produced no output directory at {}",
                cmd.display_command(),
                request.output_dir.display()
            );
        }

        fs::ensure_dir(&request.staging_dir)?;
        fs::copy_dir_all(&request.output_dir, &request.staging_dir).with_context(|| {
            format!(
                "failed to stage build output into {}",
                request.staging_dir.display()
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn spec(tool: &str) -> BundleSpec {
        BundleSpec {
            source_dir: PathBuf::from("/nonexistent/web"),
            output_dir: PathBuf::from("/nonexistent/web/dist"),
            build_command: vec!["true".to_string()],
            tool: tool.to_string(),
            min_tool_version: None,
        }
    }

    #[test]
    fn test_missing_tool_reports_not_installed() {
        let bundler = LocalBundler::from_spec(&spec("definitely-not-a-real-tool-7f3a"));

        let availability = bundler.availability().unwrap();
        assert!(!availability.is_available());
        assert!(matches!(
            availability,
            ToolAvailability::NotInstalled { .. }
        ));
    }

    #[test]
    fn test_availability_is_cached() {
        let bundler = LocalBundler::from_spec(&spec("definitely-not-a-real-tool-7f3a"));

        let first = bundler.availability().unwrap();
        let second = bundler.availability().unwrap();
        assert_eq!(first.is_available(), second.is_available());
        assert!(bundler.cached_availability.get().is_some());
    }

    #[test]
    #[cfg(unix)]
    fn test_bundle_stages_output_additively() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("web");
        let output = source.join("dist");
        let staging = tmp.path().join("staging");

        fs::ensure_dir(&output).unwrap();
        fs::write_string(&output.join("index.html"), "<html></html>").unwrap();
        fs::ensure_dir(&staging).unwrap();
        fs::write_string(&staging.join("config.json"), "{}").unwrap();

        let bundler = LocalBundler::from_spec(&spec("true"));
        let request = BundleRequest {
            source_dir: source,
            output_dir: output,
            build_command: vec!["true".to_string()],
            staging_dir: staging.clone(),
        };
        bundler.bundle(&request).unwrap();

        assert!(staging.join("index.html").is_file());
        // Files already staged but absent from the build output survive.
        assert!(staging.join("config.json").is_file());
    }

    #[test]
    #[cfg(unix)]
    fn test_bundle_fails_on_nonzero_exit() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("web");
        fs::ensure_dir(&source).unwrap();

        let bundler = LocalBundler::from_spec(&spec("true"));
        let request = BundleRequest {
            source_dir: source.clone(),
            output_dir: source.join("dist"),
            build_command: vec!["false".to_string()],
            staging_dir: tmp.path().join("staging"),
        };

        let err = bundler.bundle(&request).unwrap_err();
        assert!(err.to_string().contains("failed"));
    }

    #[test]
    #[cfg(unix)]
    fn test_bundle_fails_without_output_dir() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("web");
        fs::ensure_dir(&source).unwrap();

        let bundler = LocalBundler::from_spec(&spec("true"));
        let request = BundleRequest {
            source_dir: source.clone(),
            output_dir: source.join("dist"),
            build_command: vec!["true".to_string()],
            staging_dir: tmp.path().join("staging"),
        };

        let err = bundler.bundle(&request).unwrap_err();
        assert!(err.to_string().contains("no output directory"));
    }
}
