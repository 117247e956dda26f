//! `slipway serve` command

use anyhow::{bail, Result};

use crate::cli::ServeArgs;
use slipway::core::manifest::Manifest;
use slipway::host::{self, HostState};
use slipway::provision::DeploymentState;
use slipway::util::context::{StateLayout, MANIFEST_FILE};
use slipway::util::shell::Shell;
use slipway::util::GlobalContext;

pub fn execute(args: ServeArgs, shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;

    let root = gctx.find_project_root()?;
    let manifest = Manifest::load(&root.join(MANIFEST_FILE))?;
    let layout = StateLayout::new(&root);

    // The host serves materialized state, not declarations.
    if DeploymentState::load(&layout.state_path())?.is_none() {
        bail!(
            "nothing to serve: the stack was never deployed\n \
             hint: run `slipway deploy` first"
        );
    }

    let state = HostState::from_project(&manifest, &layout)?;
    let port = args.port.unwrap_or(manifest.serve.port);

    host::run_blocking(state, port, shell)
}
