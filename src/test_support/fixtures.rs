//! Test fixtures for common test scenarios.
//!
//! This module provides a scaffolded project for exercising synthesis,
//! bundling, and the deploy walk against a real filesystem.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A deployable project in a temporary directory.
///
/// The manifest points the bundle tool and the build command at
/// absolute paths under `bin/` inside the fixture, so tests control
/// exactly what tooling exists: without [`with_fake_tooling`] the
/// probe finds nothing and the deploy takes the container fallback.
///
/// [`with_fake_tooling`]: ProjectFixture::with_fake_tooling
#[derive(Debug)]
pub struct ProjectFixture {
    name: String,
    removal_policy: Option<String>,
    dir: TempDir,
}

impl ProjectFixture {
    /// Scaffold a project with frontend sources and no tooling.
    pub fn new(name: impl Into<String>) -> Self {
        let fixture = ProjectFixture {
            name: name.into(),
            removal_policy: None,
            dir: TempDir::new().expect("failed to create fixture directory"),
        };

        fixture.write_manifest(&fixture.name);

        let web = fixture.root().join("web");
        std::fs::create_dir_all(&web).expect("failed to create web directory");
        std::fs::write(
            web.join("index.html"),
            "<!doctype html><html><body>fixture</body></html>\n",
        )
        .expect("failed to write index.html");
        std::fs::write(web.join("main.js"), "console.log('fixture');\n")
            .expect("failed to write main.js");

        fixture
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path to the project manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root().join("Slipway.toml")
    }

    /// Install fake build tooling: a version-reporting stand-in for
    /// esbuild and a build script that produces `web/dist/`.
    pub fn with_fake_tooling(self) -> Self {
        write_script(&self.tool_path(), "echo \"0.20.1\"");
        write_script(
            &self.build_command_path(),
            "mkdir -p dist/assets\n\
             cp index.html dist/index.html\n\
             printf 'render()' > dist/assets/app.js",
        );
        self
    }

    /// Give the stack's stateful resources a removal policy.
    pub fn with_removal_policy(mut self, policy: impl Into<String>) -> Self {
        self.removal_policy = Some(policy.into());
        self.write_manifest(&self.name);
        self
    }

    /// Rewrite the manifest under a different stack name, leaving any
    /// recorded deployment state behind.
    pub fn rename_stack(&self, name: &str) {
        self.write_manifest(name);
    }

    fn tool_path(&self) -> PathBuf {
        self.root().join("bin/esbuild")
    }

    fn build_command_path(&self) -> PathBuf {
        self.root().join("bin/build-site")
    }

    fn write_manifest(&self, name: &str) {
        let policy = match &self.removal_policy {
            Some(policy) => format!("removal_policy = \"{}\"\n", policy),
            None => String::new(),
        };
        let manifest = format!(
            r#"[stack]
name = "{name}"
{policy}
[web]
source = "web"
output = "dist"
build_command = "{build_command}"
tool = "{tool}"

[serve]
port = 8787
"#,
            name = name,
            policy = policy,
            build_command = self.build_command_path().display(),
            tool = self.tool_path().display(),
        );
        std::fs::write(self.manifest_path(), manifest).expect("failed to write manifest");
    }
}

/// Write an executable shell script with the given body.
///
/// On non-Unix platforms the file is written without the executable
/// bit; tests that spawn scripts are gated to Unix.
pub fn write_script(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create script directory");
    }
    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).expect("failed to write script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .expect("failed to mark script executable");
    }
}
