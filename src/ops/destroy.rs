//! Implementation of `slipway destroy`.

use anyhow::{bail, Result};

use crate::core::manifest::Manifest;
use crate::core::stack::Stack;
use crate::provision::{DeploymentState, LocalProvisioner, Provisioner, Teardown};
use crate::util::context::{GlobalContext, StateLayout, MANIFEST_FILE};
use crate::util::fs;
use crate::util::shell::{Shell, Status};

/// What a destroy did.
#[derive(Debug, Default)]
pub struct DestroyResult {
    /// Resources whose materialization was deleted
    pub removed: usize,

    /// Resources left in place by a retain policy
    pub retained: usize,

    /// Resources with nothing materialized
    pub skipped: usize,
}

/// Tear down the project's stack in reverse dependency order, honoring
/// removal policies, then delete the recorded state.
pub fn destroy(gctx: &GlobalContext, shell: &Shell) -> Result<DestroyResult> {
    let root = gctx.find_project_root()?;
    let manifest = Manifest::load(&root.join(MANIFEST_FILE))?;
    let layout = StateLayout::new(&root);

    let Some(state) = DeploymentState::load(&layout.state_path())? else {
        shell.note("nothing to destroy: the stack was never deployed");
        return Ok(DestroyResult::default());
    };

    let stack = Stack::synthesize(&manifest)?;
    if state.stack != stack.name() {
        bail!(
            "state at {} belongs to stack `{}`, not `{}`\n\
             hint: restore the previous stack name before destroying",
            layout.state_path().display(),
            state.stack,
            stack.name()
        );
    }

    shell.status(Status::Destroying, format!("stack `{}`", stack.name()));

    let engine = LocalProvisioner::new(layout.clone(), manifest.serve.port);

    let mut result = DestroyResult::default();
    for id in stack.teardown_order()? {
        let Some(resource) = stack.get(id) else {
            continue;
        };

        match engine.teardown(resource)? {
            Teardown::Removed => {
                shell.status(Status::Removed, format!("{} `{}`", resource.kind(), id));
                result.removed += 1;
            }
            Teardown::Retained => {
                shell.status(Status::Retained, format!("{} `{}`", resource.kind(), id));
                result.retained += 1;
            }
            Teardown::Skipped => {
                tracing::debug!("nothing materialized for `{}`", id);
                result.skipped += 1;
            }
        }
    }

    fs::remove_file_if_exists(&layout.state_path())?;

    // Drop the bookkeeping directories when teardown emptied them.
    for dir in [
        layout.buckets_dir(),
        layout.tables_dir(),
        layout.staging_root(),
    ] {
        let _ = std::fs::remove_dir(dir);
    }
    let _ = std::fs::remove_dir(layout.root());

    shell.status(Status::Finished, format!("stack `{}` destroyed", stack.name()));

    Ok(result)
}
