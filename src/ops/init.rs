//! Implementation of `slipway new` and `slipway init`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::core::manifest::generate_default_manifest;
use crate::util::context::MANIFEST_FILE;

/// Options for creating a new project.
#[derive(Debug, Clone)]
pub struct NewOptions {
    /// Stack name
    pub name: String,

    /// Initialize in existing directory
    pub init: bool,
}

/// Create a new Slipway project.
pub fn new_project(path: &Path, opts: &NewOptions) -> Result<()> {
    // Check if directory already exists
    if path.exists() && !opts.init {
        bail!(
            "destination `{}` already exists\n\
             \n\
             Use `slipway init` to initialize an existing directory.",
            path.display()
        );
    }

    // Create directory if needed
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }

    // Check for existing Slipway.toml
    let manifest_path = path.join(MANIFEST_FILE);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", MANIFEST_FILE, path.display());
    }

    // Generate manifest
    let manifest_content = generate_default_manifest(&opts.name);
    fs::write(&manifest_path, &manifest_content)
        .with_context(|| format!("failed to write {}", MANIFEST_FILE))?;

    // Create the frontend starter. The page finds its API through the
    // endpoint config document the deploy writes next to it, so the
    // same artifact works against any stack.
    let web_dir = path.join("web");
    fs::create_dir_all(&web_dir).with_context(|| "failed to create web directory")?;

    let index_content = format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{name}</title>
  </head>
  <body>
    <h1>{name}</h1>
    <form id="note-form">
      <input id="subject" placeholder="Subject" />
      <input id="note" placeholder="Note" />
      <button type="submit">Save</button>
    </form>
    <ul id="notes"></ul>
    <script type="module" src="/main.js"></script>
  </body>
</html>
"#,
        name = opts.name
    );
    fs::write(web_dir.join("index.html"), index_content)?;

    let main_js = format!(
        r#"const config = await fetch('./config.json').then((r) => r.json());
const api = config['{name}'].HttpApiUrl;

async function refresh() {{
  const notes = await fetch(`${{api}}/notes`).then((r) => r.json());
  const list = document.getElementById('notes');
  list.innerHTML = '';
  for (const item of notes) {{
    const li = document.createElement('li');
    li.textContent = `${{item.subject}}: ${{item.note}}`;
    list.appendChild(li);
  }}
}}

document.getElementById('note-form').addEventListener('submit', async (event) => {{
  event.preventDefault();
  await fetch(`${{api}}/notes`, {{
    method: 'POST',
    headers: {{ 'Content-Type': 'application/json' }},
    body: JSON.stringify({{
      subject: document.getElementById('subject').value,
      note: document.getElementById('note').value,
    }}),
  }});
  await refresh();
}});

await refresh();
"#,
        name = opts.name
    );
    fs::write(web_dir.join("main.js"), main_js)?;

    // Create .gitignore
    let gitignore = r#"# Slipway deployment state
.slipway/

# Frontend build output
web/dist/
node_modules/

# Editor files
*.swp
*~
.vscode/
.idea/
"#;
    fs::write(path.join(".gitignore"), gitignore)?;

    Ok(())
}

/// Initialize a Slipway project in an existing directory.
pub fn init_project(path: &Path, opts: &NewOptions) -> Result<()> {
    let mut opts = opts.clone();
    opts.init = true;
    new_project(path, &opts)
}
