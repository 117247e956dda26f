//! Container bundle strategy - a deliberate stub.
//!
//! The container path exists so the fallback chain is complete, but it
//! never produces output: a containerized frontend build is out of
//! scope, and a missing local tool should stop the deployment with an
//! actionable message rather than silently building something else.

use anyhow::{bail, Result};

use crate::bundler::{BundleRequest, BundleStrategy, ToolAvailability};

/// The guaranteed-fail container strategy.
///
/// Its probe always reports available (a container runtime is assumed),
/// so selection can hand it the build; `bundle` then fails with an
/// instruction to install the local tool.
pub struct ContainerBundler {
    /// The local tool whose absence routed the build here
    tool: String,
}

impl ContainerBundler {
    /// Create a container bundler naming the missing local tool.
    pub fn new(tool: impl Into<String>) -> Self {
        ContainerBundler { tool: tool.into() }
    }
}

impl BundleStrategy for ContainerBundler {
    fn name(&self) -> &'static str {
        "container"
    }

    fn availability(&self) -> Result<ToolAvailability> {
        Ok(ToolAvailability::AlwaysAvailable)
    }

    fn bundle(&self, _request: &BundleRequest) -> Result<()> {
        bail!(
            "container builds are not supported; install `{}` to build locally",
            self.tool
        );
    }
}
