//! `slipway graph` command

use anyhow::Result;

use crate::cli::GraphArgs;
use slipway::core::manifest::Manifest;
use slipway::core::stack::Stack;
use slipway::util::context::MANIFEST_FILE;
use slipway::util::GlobalContext;

pub fn execute(args: GraphArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;

    let root = gctx.find_project_root()?;
    let manifest = Manifest::load(&root.join(MANIFEST_FILE))?;

    let stack = Stack::synthesize(&manifest)?;
    let order = stack.materialization_order()?;

    println!(
        "stack `{}` ({} resources, materialization order)",
        stack.name(),
        stack.resources().len()
    );

    for (index, id) in order.iter().enumerate() {
        let resource = stack
            .get(*id)
            .ok_or_else(|| anyhow::anyhow!("resource `{}` missing from its own stack", id))?;

        println!("{:>3}. {} `{}`", index + 1, resource.kind(), id);

        if args.edges && !resource.depends_on.is_empty() {
            let deps: Vec<&str> = resource.depends_on.iter().map(|d| d.as_str()).collect();
            println!("     └── depends on {}", deps.join(", "));
        }
    }

    Ok(())
}
