//! `slipway outputs` command

use anyhow::Result;

use crate::cli::OutputsArgs;
use slipway::provision::DeploymentState;
use slipway::util::context::StateLayout;
use slipway::util::GlobalContext;

pub fn execute(args: OutputsArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;

    let root = gctx.find_project_root()?;
    let layout = StateLayout::new(&root);

    let state = DeploymentState::load(&layout.state_path())?.ok_or_else(|| {
        anyhow::anyhow!(
            "no recorded deployment\n hint: run `slipway deploy` first"
        )
    })?;

    match args.name {
        Some(name) => {
            let value = state.outputs.get(&name).ok_or_else(|| {
                anyhow::anyhow!(
                    "stack `{}` has no output named `{}`",
                    state.stack,
                    name
                )
            })?;
            println!("{}", value);
        }
        None => {
            for (name, value) in &state.outputs {
                println!("{} = {}", name, value);
            }
        }
    }

    Ok(())
}
