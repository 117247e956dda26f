//! Implementation of `slipway deploy`.
//!
//! A deploy is one sequential walk over the stack graph in dependency
//! order. Infrastructure resources go to the provisioning engine; the
//! artifact build, the site publish, and the endpoint config document
//! are driven here because they move project bytes rather than
//! materialize declarations. The walk stops at the first error and
//! rolls nothing back: completed phases keep their effects and the
//! recorded state stays at the last successful deploy.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::bundler::{fingerprint_dir, select_strategy, BundleRequest};
use crate::core::manifest::Manifest;
use crate::core::resource::{
    BucketDeploymentSpec, BundleSpec, EndpointConfigSpec, LogicalId, ResourceSpec,
};
use crate::core::stack::{Stack, NOTES_API, OUTPUT_DISTRIBUTION_DOMAIN, OUTPUT_HTTP_API_URL, SITE_DISTRIBUTION};
use crate::delivery::{publish_dir, write_endpoint_config};
use crate::provision::{
    Attributes, DeploymentState, LocalProvisioner, Provisioner, ResolvedAttributes, ATTR_API_URL,
    ATTR_BUCKET_NAME, ATTR_DISTRIBUTION_DOMAIN,
};
use crate::store::DirObjectStore;
use crate::util::context::{GlobalContext, StateLayout, MANIFEST_FILE};
use crate::util::shell::{format_duration, Shell, Status};
use crate::util::InternedString;

// Attribute keys resolved by the walk itself rather than the engine.
const ATTR_BUNDLE_FINGERPRINT: &str = "bundle.fingerprint";
const ATTR_BUNDLE_PATH: &str = "bundle.path";
const ATTR_DEPLOYMENT_OBJECTS: &str = "deployment.objects";
const ATTR_DEPLOYMENT_BYTES: &str = "deployment.bytes";
const ATTR_CONFIG_KEY: &str = "config.key";

/// Options for the deploy command.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Port the materialized addresses point at (defaults to the
    /// manifest's serve port)
    pub port: Option<u16>,
}

/// What a deploy produced.
#[derive(Debug)]
pub struct DeployResult {
    /// Stack outputs by name
    pub outputs: BTreeMap<String, String>,

    /// How many resources the stack declares
    pub resources: usize,

    /// Objects uploaded by the site publish
    pub uploaded: usize,

    /// Fingerprint of the staged artifact
    pub fingerprint: String,

    /// Wall time of the whole walk
    pub duration: Duration,
}

/// Deploy the project's stack.
pub fn deploy(gctx: &GlobalContext, shell: &Shell, opts: &DeployOptions) -> Result<DeployResult> {
    let start = Instant::now();

    let root = gctx.find_project_root()?;
    let manifest = Manifest::load(&root.join(MANIFEST_FILE))?;
    let layout = StateLayout::new(&root);
    let port = opts.port.unwrap_or(manifest.serve.port);

    let stack = Stack::synthesize(&manifest)?;
    shell.status(
        Status::Synthesizing,
        format!("stack `{}` ({} resources)", stack.name(), stack.resources().len()),
    );

    let mut state = DeploymentState::load_or_new(&layout.state_path(), stack.name())?;

    let engine = LocalProvisioner::new(layout.clone(), port);
    engine.check_ready()?;

    let mut resolved = ResolvedAttributes::new();
    let mut uploaded = 0;
    let mut fingerprint = String::new();

    for id in stack.materialization_order()? {
        let resource = stack
            .get(id)
            .ok_or_else(|| anyhow!("resource `{}` vanished from the stack", id))?;

        let attrs = match &resource.spec {
            ResourceSpec::AssetBundle(spec) => {
                let attrs = bundle_assets(id, spec, &layout, shell)?;
                if let Some(value) = attrs.get(ATTR_BUNDLE_FINGERPRINT) {
                    fingerprint = value.clone();
                }
                attrs
            }
            ResourceSpec::BucketDeployment(spec) => {
                let attrs = publish_site(spec, &resolved, &layout, &mut state, shell)?;
                if let Some(count) = attrs.get(ATTR_DEPLOYMENT_OBJECTS) {
                    uploaded = count.parse().unwrap_or(0);
                }
                attrs
            }
            ResourceSpec::EndpointConfig(spec) => {
                write_config(spec, stack.name(), &resolved, &layout, shell)?
            }
            _ => {
                shell.status(
                    Status::Materializing,
                    format!("{} `{}`", resource.kind(), id),
                );
                engine
                    .materialize(resource, &resolved)
                    .with_context(|| format!("failed to materialize `{}`", id))?
            }
        };

        state.record_resource(id.as_str(), resource.kind(), attrs.clone());
        resolved.insert(id, attrs);
    }

    state.set_fingerprint(&fingerprint);

    let mut outputs = BTreeMap::new();
    outputs.insert(
        OUTPUT_HTTP_API_URL.to_string(),
        attr(&resolved, InternedString::new(NOTES_API), ATTR_API_URL)?.to_string(),
    );
    outputs.insert(
        OUTPUT_DISTRIBUTION_DOMAIN.to_string(),
        attr(
            &resolved,
            InternedString::new(SITE_DISTRIBUTION),
            ATTR_DISTRIBUTION_DOMAIN,
        )?
        .to_string(),
    );
    for (name, value) in &outputs {
        state.set_output(name, value);
    }

    state.save()?;

    let duration = start.elapsed();
    shell.status(
        Status::Finished,
        format!("stack `{}` in {}", stack.name(), format_duration(duration)),
    );

    Ok(DeployResult {
        outputs,
        resources: stack.resources().len(),
        uploaded,
        fingerprint,
        duration,
    })
}

/// Look up an attribute a later phase needs from an earlier one.
fn attr<'a>(resolved: &'a ResolvedAttributes, id: LogicalId, key: &str) -> Result<&'a str> {
    resolved
        .get(&id)
        .and_then(|attrs| attrs.get(key))
        .map(String::as_str)
        .ok_or_else(|| anyhow!("resource `{}` resolved no `{}` attribute", id, key))
}

/// Build the frontend and stage the artifact.
fn bundle_assets(
    id: LogicalId,
    spec: &BundleSpec,
    layout: &StateLayout,
    shell: &Shell,
) -> Result<Attributes> {
    let strategy = select_strategy(spec)?;
    shell.status(
        Status::Bundling,
        format!("web assets ({} strategy)", strategy.name()),
    );

    let request = BundleRequest::new(spec, layout.staging_dir(id.as_str()));
    strategy
        .bundle(&request)
        .with_context(|| format!("failed to bundle `{}`", id))?;

    let fingerprint = fingerprint_dir(&request.staging_dir)?;
    tracing::debug!("bundle `{}` fingerprint {}", id, fingerprint);

    let mut attrs = Attributes::new();
    attrs.insert(ATTR_BUNDLE_FINGERPRINT.to_string(), fingerprint);
    attrs.insert(
        ATTR_BUNDLE_PATH.to_string(),
        request.staging_dir.display().to_string(),
    );
    Ok(attrs)
}

/// Publish the staged artifact into the site bucket, then invalidate
/// the distribution cache.
fn publish_site(
    spec: &BucketDeploymentSpec,
    resolved: &ResolvedAttributes,
    layout: &StateLayout,
    state: &mut DeploymentState,
    shell: &Shell,
) -> Result<Attributes> {
    let bucket = attr(resolved, spec.bucket, ATTR_BUCKET_NAME)?;
    let artifact = attr(resolved, spec.bundle, ATTR_BUNDLE_PATH)?.to_string();

    shell.status(Status::Publishing, format!("site to bucket `{}`", bucket));
    let store = DirObjectStore::open(bucket, layout.bucket_dir(bucket))?;
    let summary = publish_dir(&store, Path::new(&artifact), shell)?;

    shell.status(
        Status::Invalidating,
        format!("`/*` on `{}`", spec.distribution),
    );
    state.record_invalidation(vec!["/*".to_string()]);

    let mut attrs = Attributes::new();
    attrs.insert(
        ATTR_DEPLOYMENT_OBJECTS.to_string(),
        summary.uploaded.to_string(),
    );
    attrs.insert(ATTR_DEPLOYMENT_BYTES.to_string(), summary.bytes.to_string());
    Ok(attrs)
}

/// Write the endpoint config document so the published frontend can
/// find the resolved API.
fn write_config(
    spec: &EndpointConfigSpec,
    stack_name: &str,
    resolved: &ResolvedAttributes,
    layout: &StateLayout,
    shell: &Shell,
) -> Result<Attributes> {
    let address = attr(resolved, spec.api, ATTR_API_URL)?;
    let url = Url::parse(address)
        .with_context(|| format!("API resolved an invalid address: {}", address))?;
    let bucket = attr(resolved, spec.bucket, ATTR_BUCKET_NAME)?;

    shell.status(
        Status::Writing,
        format!("`{}` to bucket `{}`", spec.key, bucket),
    );
    let store = DirObjectStore::open(bucket, layout.bucket_dir(bucket))?;
    write_endpoint_config(&store, spec, stack_name, &url)?;

    let mut attrs = Attributes::new();
    attrs.insert(ATTR_CONFIG_KEY.to_string(), spec.key.clone());
    Ok(attrs)
}
