//! `slipway destroy` command

use anyhow::Result;

use crate::cli::DestroyArgs;
use slipway::ops::destroy;
use slipway::util::shell::Shell;
use slipway::util::GlobalContext;

pub fn execute(args: DestroyArgs, shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;

    if !args.yes && !confirm()? {
        shell.note("destroy aborted");
        return Ok(());
    }

    let result = destroy(&gctx, shell)?;

    tracing::debug!(
        "teardown: {} removed, {} retained, {} skipped",
        result.removed,
        result.retained,
        result.skipped
    );

    Ok(())
}

/// Ask before tearing anything down. Only an explicit `y` proceeds.
fn confirm() -> Result<bool> {
    use std::io::Write;

    print!("destroy the deployed stack and its local state? [y/N]: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}
