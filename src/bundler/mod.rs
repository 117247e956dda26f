//! Frontend artifact bundling.
//!
//! A bundle strategy turns the frontend source directory into a staged
//! directory of static files. The local strategy probes for a fast
//! bundling tool and runs the production build command; the container
//! strategy is a deliberate stub that always fails with an install hint.
//! Selection probes local first, so a missing local tool surfaces as a
//! terminal configuration error when the container path runs.

pub mod container;
pub mod local;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::Version;
use walkdir::WalkDir;

use crate::core::resource::BundleSpec;
use crate::util::fs::relative_path;
use crate::util::hash::{sha256_file, Fingerprint};
use crate::util::process::ProcessBuilder;

pub use container::ContainerBundler;
pub use local::LocalBundler;

/// Availability of a bundle strategy's tool.
#[derive(Debug, Clone)]
pub enum ToolAvailability {
    /// Tool is installed and acceptable
    Available {
        /// Detected version of the tool
        version: Version,
    },

    /// Tool is not installed
    NotInstalled {
        /// Name of the missing tool (e.g., "esbuild")
        tool: String,
        /// Hint for how to install (e.g., "npm install -g esbuild")
        install_hint: String,
    },

    /// Tool is installed but older than the manifest requires
    VersionTooOld {
        /// Found version
        found: Version,
        /// Minimum required version
        required: Version,
    },

    /// The strategy needs no probe
    AlwaysAvailable,
}

impl ToolAvailability {
    /// Check if the strategy can run.
    pub fn is_available(&self) -> bool {
        matches!(
            self,
            ToolAvailability::Available { .. } | ToolAvailability::AlwaysAvailable
        )
    }

    /// Get error message if not available.
    pub fn error_message(&self) -> Option<String> {
        match self {
            ToolAvailability::Available { .. } | ToolAvailability::AlwaysAvailable => None,
            ToolAvailability::NotInstalled { tool, install_hint } => {
                Some(format!("{} not found. {}", tool, install_hint))
            }
            ToolAvailability::VersionTooOld { found, required } => Some(format!(
                "version {} found, but {} or newer required",
                found, required
            )),
        }
    }
}

/// One bundling run: where the frontend lives, how to build it, and
/// where the staged artifact goes.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    /// Frontend source directory; the build command runs here
    pub source_dir: PathBuf,

    /// Directory the build tool writes its output to
    pub output_dir: PathBuf,

    /// Production build command, program first
    pub build_command: Vec<String>,

    /// Destination directory for the staged artifact
    pub staging_dir: PathBuf,
}

impl BundleRequest {
    /// Build a request from a declared bundle and a staging destination.
    pub fn new(spec: &BundleSpec, staging_dir: PathBuf) -> Self {
        BundleRequest {
            source_dir: spec.source_dir.clone(),
            output_dir: spec.output_dir.clone(),
            build_command: spec.build_command.clone(),
            staging_dir,
        }
    }
}

/// A way of producing the staged frontend artifact.
pub trait BundleStrategy: Send + Sync {
    /// Strategy name for status output.
    fn name(&self) -> &'static str;

    /// Check whether this strategy can run.
    ///
    /// This may run processes (e.g., `esbuild --version`) and should be
    /// called lazily when the strategy is actually needed. Results are
    /// cached per instance.
    fn availability(&self) -> Result<ToolAvailability>;

    /// Produce the staged artifact.
    ///
    /// The copy into `staging_dir` is additive: files already present
    /// there and absent from the build output are left alone.
    fn bundle(&self, request: &BundleRequest) -> Result<()>;
}

/// Select the strategy for a declared bundle.
///
/// The local tool is probed first; the container path is only reached
/// when the local tool is missing or too old, and it fails every run by
/// design. Absence of the local tool is treated as a configuration
/// error, not a retryable condition.
pub fn select_strategy(spec: &BundleSpec) -> Result<Box<dyn BundleStrategy>> {
    let local = LocalBundler::from_spec(spec);
    let availability = local.availability()?;
    if availability.is_available() {
        return Ok(Box::new(local));
    }

    if let Some(message) = availability.error_message() {
        tracing::debug!("local bundler unavailable: {}", message);
    }
    Ok(Box::new(ContainerBundler::new(&spec.tool)))
}

/// Detect a tool's version by running it with --version.
pub fn detect_tool_version(tool: &str) -> Result<Version> {
    let output = ProcessBuilder::new(tool)
        .arg("--version")
        .exec()
        .with_context(|| format!("failed to run {} --version", tool))?;

    if !output.status.success() {
        bail!("{} --version failed", tool);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);

    parse_version_flexible(&stdout).ok_or_else(|| {
        anyhow::anyhow!(
            "could not parse {} version from output: {}",
            tool,
            stdout.trim()
        )
    })
}

/// Parse a version string into semver::Version, handling incomplete versions.
///
/// Handles versions like "0.19.11", "1.3.0.dev1", or versions with only
/// major.minor parts.
pub fn parse_version_flexible(version_str: &str) -> Option<Version> {
    let clean_version = version_str
        .trim()
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()
        .unwrap_or(version_str);

    if let Ok(v) = clean_version.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = clean_version.split('.').collect();
    let major = parts.first().and_then(|s| s.parse().ok())?;
    let minor = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    Some(Version::new(major, minor, patch))
}

/// Content fingerprint of a staged artifact directory.
///
/// Files are walked in sorted order and hashed with their relative
/// paths, so the result identifies the deployment version regardless of
/// filesystem iteration order.
pub fn fingerprint_dir(dir: &Path) -> Result<String> {
    let mut fp = Fingerprint::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = relative_path(dir, entry.path());
        fp.update_str(&rel.to_string_lossy());
        fp.update_str(&sha256_file(entry.path())?);
    }

    Ok(fp.finish_short())
}
