//! `slipway init` command

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::InitArgs;
use slipway::ops::{init_project, NewOptions};
use slipway::util::shell::{Shell, Status};

/// Determines the stack name from the arguments or the directory.
///
/// This is extracted for testability.
pub fn determine_stack_name(name: &Option<String>, path: &Path) -> String {
    if let Some(name) = name {
        return name.clone();
    }

    // `.` has no file name until resolved against the cwd.
    let dir = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    dir.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("stack")
        .to_string()
}

/// Validates a stack name for common issues.
///
/// The name becomes the config document's top-level key, so it has to
/// survive a round trip through JSON and the frontend lookup.
pub fn validate_stack_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("stack name cannot be empty");
    }

    if name.starts_with('-') || name.starts_with('_') {
        return Err("stack name cannot start with a hyphen or underscore");
    }

    if name.starts_with('.') {
        return Err("stack name cannot start with a dot");
    }

    for c in name.chars() {
        if !c.is_alphanumeric() && c != '-' && c != '_' {
            return Err("stack name contains invalid characters");
        }
    }

    Ok(())
}

pub fn execute(args: InitArgs, shell: &Shell) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from("."));

    let name = determine_stack_name(&args.name, &path);
    validate_stack_name(&name).map_err(|e| anyhow::anyhow!("{}", e))?;

    let opts = NewOptions {
        name: name.clone(),
        init: true,
    };

    init_project(&path, &opts)?;

    shell.status(Status::Created, format!("stack `{}`", name));

    Ok(())
}
