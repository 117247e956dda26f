//! Environment and toolchain health checks.
//!
//! The `doctor` command performs fast environment checks to verify
//! that the tools a deploy leans on are available.
//!
//! ## Usage
//!
//! ```bash
//! slipway doctor           # Quick check
//! slipway doctor --verbose # Detailed output
//! ```
//!
//! ## Checks Performed
//!
//! - Node.js runtime (the frontend build runs on it)
//! - npx launcher (default build command uses it)
//! - Bundling tool from the manifest, esbuild by default
//! - Docker (informational; the container build path is stubbed)

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use anyhow::Result;
use semver::Version;

use crate::bundler::detect_tool_version;
use crate::core::manifest::Manifest;
use crate::util::context::GlobalContext;

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: false,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the tool path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: HashMap<String, String>,
}

impl DoctorReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        DoctorReport {
            checks: Vec::new(),
            total_duration: Duration::ZERO,
            environment: HashMap::new(),
        }
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get the count of required failed checks.
    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

impl Default for DoctorReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Include verbose output
    pub verbose: bool,
}

/// Run the doctor command.
pub fn doctor(_options: DoctorOptions) -> Result<DoctorReport> {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    // Pick up the project's bundling tool when run inside a project;
    // fall back to the defaults otherwise.
    let manifest = GlobalContext::new()
        .ok()
        .and_then(|ctx| ctx.find_manifest().ok())
        .and_then(|path| Manifest::load(&path).ok());
    let (tool, min_version) = match &manifest {
        Some(manifest) => (
            manifest.web.tool.clone(),
            manifest.web.min_tool_version.clone(),
        ),
        None => ("esbuild".to_string(), None),
    };

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());

    report.add(check_node());
    report.add(check_npx());
    report.add(check_bundle_tool(&tool, min_version.as_ref()));
    report.add(check_docker());

    report.total_duration = start.elapsed();
    Ok(report)
}

/// Check for the Node.js runtime.
fn check_node() -> CheckResult {
    let start = Instant::now();

    if let Ok(output) = Command::new("node").arg("--version").output() {
        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if let Ok(path) = which::which("node") {
                return CheckResult::pass("Node.js", "Node.js is available")
                    .with_path(path)
                    .with_version(version)
                    .with_duration(start.elapsed());
            }
        }
    }

    CheckResult::fail(
        "Node.js",
        "Node.js not found (required for the frontend build)",
    )
    .with_duration(start.elapsed())
}

/// Check for the npx launcher.
fn check_npx() -> CheckResult {
    let start = Instant::now();

    if let Ok(output) = Command::new("npx").arg("--version").output() {
        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if let Ok(path) = which::which("npx") {
                return CheckResult::pass("npx", "npx is available")
                    .with_path(path)
                    .with_version(version)
                    .with_duration(start.elapsed());
            }
        }
    }

    CheckResult::fail(
        "npx",
        "npx not found (the default build command runs through it)",
    )
    .with_duration(start.elapsed())
}

/// Check the bundling tool the manifest names, esbuild by default.
fn check_bundle_tool(tool: &str, min_version: Option<&Version>) -> CheckResult {
    let start = Instant::now();

    match detect_tool_version(tool) {
        Ok(version) => {
            if let Some(required) = min_version {
                if version < *required {
                    return CheckResult::fail(
                        "Bundle Tool",
                        format!("{} {} found, but {} or newer required", tool, version, required),
                    )
                    .with_version(version.to_string())
                    .with_duration(start.elapsed());
                }
            }
            let mut result = CheckResult::pass("Bundle Tool", format!("{} is available", tool))
                .with_version(version.to_string())
                .with_duration(start.elapsed());
            if let Ok(path) = which::which(tool) {
                result = result.with_path(path);
            }
            result
        }
        Err(_) => CheckResult::fail(
            "Bundle Tool",
            format!(
                "{} not found. Run 'npm install -g {}' to enable local builds; \
                 without it every deploy fails at the bundle phase",
                tool, tool
            ),
        )
        .with_duration(start.elapsed()),
    }
}

/// Check for Docker. Informational only: the container build path is a
/// stub that always refuses, so Docker's presence changes nothing yet.
fn check_docker() -> CheckResult {
    let start = Instant::now();

    if let Ok(output) = Command::new("docker").arg("--version").output() {
        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if let Ok(path) = which::which("docker") {
                return CheckResult::pass(
                    "Docker",
                    "Docker is available (container builds are not supported yet)",
                )
                .with_path(path)
                .with_version(version)
                .with_duration(start.elapsed())
                .optional();
            }
        }
    }

    CheckResult::fail(
        "Docker",
        "Docker not found (optional; container builds are not supported yet)",
    )
    .with_duration(start.elapsed())
    .optional()
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    writeln!(output, "Slipway Doctor").unwrap();
    writeln!(output, "==============\n").unwrap();

    if verbose {
        writeln!(output, "Environment:").unwrap();
        writeln!(
            output,
            "  OS: {} ({})",
            report
                .environment
                .get("os")
                .unwrap_or(&"unknown".to_string()),
            report
                .environment
                .get("arch")
                .unwrap_or(&"unknown".to_string())
        )
        .unwrap();
        writeln!(output).unwrap();
    }

    writeln!(output, "Checks:").unwrap();
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        writeln!(output, "  {} {}{}", status, check.name, required).unwrap();

        if verbose {
            writeln!(output, "      {}", check.message).unwrap();
            if let Some(path) = &check.path {
                writeln!(output, "      Path: {}", path.display()).unwrap();
            }
            if let Some(version) = &check.version {
                writeln!(output, "      Version: {}", version).unwrap();
            }
        }
    }

    writeln!(output).unwrap();

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    writeln!(output, "Summary: {} passed, {} failed", passed, failed).unwrap();

    if required_failed > 0 {
        writeln!(
            output,
            "\nWarning: {} required check(s) failed. Deploys may not work.",
            required_failed
        )
        .unwrap();
    } else if failed > 0 {
        writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        )
        .unwrap();
    } else {
        writeln!(output, "\nAll checks passed. Slipway is ready to use.").unwrap();
    }

    output
}
