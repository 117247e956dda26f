//! `slipway deploy` command

use anyhow::Result;

use crate::cli::DeployArgs;
use slipway::ops::{deploy, DeployOptions};
use slipway::util::shell::Shell;
use slipway::util::GlobalContext;

pub fn execute(args: DeployArgs, shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;

    let opts = DeployOptions { port: args.port };

    let result = deploy(&gctx, shell, &opts)?;

    // The outputs block mirrors what the walk recorded in state, so a
    // scripted `slipway outputs` sees the same values.
    if !shell.is_quiet() && !result.outputs.is_empty() {
        eprintln!();
        eprintln!("Outputs:");
        for (name, value) in &result.outputs {
            eprintln!("  {} = {}", name, value);
        }
    }

    Ok(())
}
