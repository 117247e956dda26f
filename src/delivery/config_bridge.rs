//! The configuration bridge.
//!
//! The frontend is static; it learns the API address at runtime by
//! fetching a JSON document from its own bucket. That document is
//! written here once per deployment, after the API address resolves.

use anyhow::{Context, Result};
use url::Url;

use crate::core::resource::EndpointConfigSpec;
use crate::store::object::{ObjectStore, PutOptions};

/// Cache policy on the endpoint config document. Viewers must
/// revalidate on every request so a fresh deployment is picked up
/// immediately, while the surrounding assets stay cacheable.
pub const NO_CACHE: &str = "max-age=0, no-cache, no-store, must-revalidate";

/// Write the endpoint config document for a stack.
///
/// The body maps the stack name to its resolved API base address:
/// `{"<stack>": {"HttpApiUrl": "<url>"}}`. The write replaces any
/// previous document, so redeploys leave exactly one address behind.
pub fn write_endpoint_config(
    store: &dyn ObjectStore,
    spec: &EndpointConfigSpec,
    stack_name: &str,
    api_url: &Url,
) -> Result<()> {
    let body = serde_json::json!({
        stack_name: { spec.output_name.as_str(): api_url.as_str() }
    });

    let opts = PutOptions {
        content_type: Some("application/json".to_string()),
        cache_control: Some(NO_CACHE.to_string()),
    };

    store
        .put(&spec.key, body.to_string().as_bytes(), &opts)
        .with_context(|| format!("failed to write endpoint config `{}`", spec.key))?;

    tracing::debug!("wrote {} for stack {}", spec.key, stack_name);
    Ok(())
}
