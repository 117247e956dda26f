//! `slipway new` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::NewArgs;
use slipway::ops::{new_project, NewOptions};
use slipway::util::shell::{Shell, Status};

/// Determines the output path for a new project.
///
/// If a path is explicitly specified, uses that. Otherwise, creates a
/// directory with the same name as the stack.
pub fn determine_project_path(name: &str, path: &Option<PathBuf>) -> PathBuf {
    path.clone().unwrap_or_else(|| PathBuf::from(name))
}

pub fn execute(args: NewArgs, shell: &Shell) -> Result<()> {
    super::init::validate_stack_name(&args.name).map_err(|e| anyhow::anyhow!("{}", e))?;

    let path = determine_project_path(&args.name, &args.path);

    let opts = NewOptions {
        name: args.name.clone(),
        init: false,
    };

    new_project(&path, &opts)?;

    shell.status(
        Status::Created,
        format!("stack `{}` at {}", args.name, path.display()),
    );

    Ok(())
}
