//! Slipway.toml manifest parsing and schema.
//!
//! The manifest is the central configuration file for a slipway project.
//! Every section except `[stack]` is optional and fully defaulted, so a
//! minimal manifest is just a stack name.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use semver::Version;
use serde::Deserialize;
use thiserror::Error;

use crate::core::resource::RemovalPolicy;

/// Errors from manifest discovery.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(
        "could not find `Slipway.toml` in `{}` or any parent directory",
        dir.display()
    )]
    NotFound { dir: PathBuf },
}

/// Manifest parse failure with the offending span.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("invalid manifest: {message}")]
#[diagnostic(
    code(slipway::manifest::parse),
    help("run `slipway init` in an empty directory to see a starter Slipway.toml")
)]
pub struct ManifestParseError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("parse error here")]
    pub span: Option<SourceSpan>,
}

/// The parsed Slipway.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Stack identity and lifecycle settings
    pub stack: StackSection,

    /// Frontend build settings
    pub web: WebSection,

    /// HTTP API settings
    pub api: ApiSection,

    /// Key-value table settings
    pub table: TableSection,

    /// Deployment action settings
    pub deploy: DeploySection,

    /// Local host settings
    pub serve: ServeSection,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

/// `[stack]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StackSection {
    /// Stack identifier. Keys the endpoint config document and names
    /// materialized resources.
    pub name: String,

    /// What happens to stateful resources on destroy.
    #[serde(default)]
    pub removal_policy: RemovalPolicy,
}

/// `[web]` section: where the frontend lives and how to build it.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSection {
    /// Frontend source directory, relative to the manifest.
    #[serde(default = "default_web_source")]
    pub source: PathBuf,

    /// Build output directory, relative to `source`.
    #[serde(default = "default_web_output")]
    pub output: PathBuf,

    /// Production build command, run inside `source` with inherited stdio.
    #[serde(default = "default_build_command")]
    pub build_command: String,

    /// Fast bundling tool probed before building.
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Minimum acceptable tool version, if any.
    #[serde(default)]
    pub min_tool_version: Option<Version>,
}

impl Default for WebSection {
    fn default() -> Self {
        WebSection {
            source: default_web_source(),
            output: default_web_output(),
            build_command: default_build_command(),
            tool: default_tool(),
            min_tool_version: None,
        }
    }
}

/// `[api]` section: CORS and handler function settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    /// Origins allowed by CORS preflight.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Methods allowed by CORS preflight.
    #[serde(default = "default_cors_methods")]
    pub cors_methods: Vec<String>,

    /// Headers allowed by CORS preflight.
    #[serde(default = "default_cors_headers")]
    pub cors_headers: Vec<String>,

    /// Handler function log retention in days.
    #[serde(default = "default_function_retention")]
    pub log_retention_days: u32,
}

impl Default for ApiSection {
    fn default() -> Self {
        ApiSection {
            cors_origins: default_cors_origins(),
            cors_methods: default_cors_methods(),
            cors_headers: default_cors_headers(),
            log_retention_days: default_function_retention(),
        }
    }
}

/// `[table]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSection {
    /// Table name.
    #[serde(default = "default_table_name")]
    pub name: String,
}

impl Default for TableSection {
    fn default() -> Self {
        TableSection {
            name: default_table_name(),
        }
    }
}

/// `[deploy]` section: settings for the publish action itself.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploySection {
    /// Deployment action log retention in days.
    #[serde(default = "default_deploy_retention")]
    pub log_retention_days: u32,
}

impl Default for DeploySection {
    fn default() -> Self {
        DeploySection {
            log_retention_days: default_deploy_retention(),
        }
    }
}

/// `[serve]` section: the local host.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    /// Port the local host binds; also fixes the synthetic API endpoint.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServeSection {
    fn default() -> Self {
        ServeSection {
            port: default_port(),
        }
    }
}

fn default_web_source() -> PathBuf {
    PathBuf::from("web")
}

fn default_web_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_build_command() -> String {
    "npx vite build".to_string()
}

fn default_tool() -> String {
    "esbuild".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_cors_methods() -> Vec<String> {
    vec!["GET".to_string(), "POST".to_string()]
}

fn default_cors_headers() -> Vec<String> {
    vec!["Content-Type".to_string()]
}

fn default_function_retention() -> u32 {
    7
}

fn default_deploy_retention() -> u32 {
    1
}

fn default_table_name() -> String {
    "notes".to_string()
}

fn default_port() -> u16 {
    8787
}

/// Raw manifest as deserialized from TOML.
#[derive(Debug, Deserialize)]
struct RawManifest {
    stack: Option<StackSection>,

    #[serde(default)]
    web: WebSection,

    #[serde(default)]
    api: ApiSection,

    #[serde(default)]
    table: TableSection,

    #[serde(default)]
    deploy: DeploySection,

    #[serde(default)]
    serve: ServeSection,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| {
            let span = e
                .span()
                .map(|r| SourceSpan::from((r.start, r.end.saturating_sub(r.start))));
            ManifestParseError {
                message: e.message().to_string(),
                src: NamedSource::new(path.display().to_string(), content.to_string()),
                span,
            }
        })?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let Some(stack) = raw.stack else {
            anyhow::bail!(
                "manifest at {} is missing the [stack] section\n\n\
                 hint: add at least:\n\n    [stack]\n    name = \"my-stack\"",
                path.display()
            );
        };

        let manifest = Manifest {
            stack,
            web: raw.web,
            api: raw.api,
            table: raw.table,
            deploy: raw.deploy,
            serve: raw.serve,
            manifest_dir,
        };

        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        let name = &self.stack.name;
        if name.is_empty() {
            anyhow::bail!("stack name must not be empty");
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            anyhow::bail!(
                "invalid stack name `{}`: only alphanumerics, `-` and `_` are allowed",
                name
            );
        }

        if self.web.build_command.split_whitespace().next().is_none() {
            anyhow::bail!("web.build_command must not be empty");
        }
        if self.web.tool.is_empty() {
            anyhow::bail!("web.tool must not be empty");
        }
        if self.table.name.is_empty() {
            anyhow::bail!("table.name must not be empty");
        }
        if self.serve.port == 0 {
            anyhow::bail!("serve.port must not be 0");
        }

        Ok(())
    }

    /// The stack identifier.
    pub fn stack_name(&self) -> &str {
        &self.stack.name
    }

    /// Absolute path of the frontend source directory.
    pub fn web_source_dir(&self) -> PathBuf {
        self.manifest_dir.join(&self.web.source)
    }

    /// Absolute path of the build tool's output directory.
    pub fn web_output_dir(&self) -> PathBuf {
        self.web_source_dir().join(&self.web.output)
    }

    /// The build command split into program and arguments.
    ///
    /// The command is split on whitespace; shell quoting is not supported.
    pub fn build_command_parts(&self) -> Vec<String> {
        self.web
            .build_command
            .split_whitespace()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Generate a default Slipway.toml for a new project.
pub fn generate_default_manifest(name: &str) -> String {
    format!(
        r#"[stack]
name = "{name}"

[web]
source = "web"
output = "dist"
build_command = "npx vite build"
tool = "esbuild"

[serve]
port = 8787
"#
    )
}
