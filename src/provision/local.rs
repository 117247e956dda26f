//! The local provisioning engine.
//!
//! Resources materialize under the project's `.slipway/` directory:
//! the table becomes a JSON document, the bucket a directory, and the
//! API and distribution become addresses on the loopback host that
//! `slipway serve` binds. Functions, routes, and grants have no
//! physical form; their attributes are recorded so the host can wire
//! handlers the way the stack declares them.

use anyhow::{bail, Result};

use crate::core::resource::{RemovalPolicy, Resource, ResourceSpec};
use crate::provision::{
    Attributes, Provisioner, ResolvedAttributes, Teardown, ATTR_API_URL, ATTR_BUCKET_NAME,
    ATTR_BUCKET_PATH, ATTR_DISTRIBUTION_DOMAIN, ATTR_DISTRIBUTION_URL, ATTR_TABLE_NAME,
    ATTR_TABLE_PATH,
};
use crate::util::context::StateLayout;
use crate::util::fs;

/// Provisions the stack onto the local filesystem and loopback host.
pub struct LocalProvisioner {
    layout: StateLayout,
    port: u16,
}

impl LocalProvisioner {
    /// Create an engine over a state layout. `port` fixes the loopback
    /// address of the API and the distribution.
    pub fn new(layout: StateLayout, port: u16) -> Self {
        LocalProvisioner { layout, port }
    }

    /// The synthetic API base address.
    fn api_url(&self) -> String {
        format!("http://127.0.0.1:{}/api", self.port)
    }

    /// The synthetic distribution domain.
    fn distribution_domain(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

impl Provisioner for LocalProvisioner {
    fn name(&self) -> &str {
        "local"
    }

    fn check_ready(&self) -> Result<()> {
        fs::ensure_dir(self.layout.root())
    }

    fn materialize(
        &self,
        resource: &Resource,
        resolved: &ResolvedAttributes,
    ) -> Result<Attributes> {
        let mut attrs = Attributes::new();

        match &resource.spec {
            ResourceSpec::Table(spec) => {
                fs::ensure_dir(&self.layout.tables_dir())?;
                let path = self.layout.table_path(&spec.name);
                attrs.insert(ATTR_TABLE_NAME.to_string(), spec.name.clone());
                attrs.insert(ATTR_TABLE_PATH.to_string(), path.display().to_string());
            }

            ResourceSpec::Function(spec) => {
                attrs.insert(
                    "function.handler".to_string(),
                    spec.handler.as_str().to_string(),
                );
                attrs.insert(
                    "function.log_retention_days".to_string(),
                    spec.log_retention_days.to_string(),
                );
            }

            ResourceSpec::HttpApi(_) => {
                attrs.insert(ATTR_API_URL.to_string(), self.api_url());
            }

            ResourceSpec::Route(spec) => {
                attrs.insert("route.method".to_string(), spec.method.clone());
                attrs.insert("route.path".to_string(), spec.path.clone());
                attrs.insert("route.function".to_string(), spec.function.to_string());
            }

            ResourceSpec::Grant(spec) => {
                attrs.insert("grant.access".to_string(), spec.access.as_str().to_string());
                attrs.insert("grant.table".to_string(), spec.table.to_string());
                attrs.insert("grant.function".to_string(), spec.function.to_string());
            }

            ResourceSpec::Bucket(spec) => {
                let dir = self.layout.bucket_dir(&spec.name);
                fs::ensure_dir(&dir)?;
                attrs.insert(ATTR_BUCKET_NAME.to_string(), spec.name.clone());
                attrs.insert(ATTR_BUCKET_PATH.to_string(), dir.display().to_string());
            }

            ResourceSpec::Distribution(spec) => {
                if !resolved.contains_key(&spec.origin) {
                    bail!(
                        "distribution `{}` references origin `{}` before it materialized",
                        resource.id,
                        spec.origin
                    );
                }
                attrs.insert("distribution.origin".to_string(), spec.origin.to_string());
                attrs.insert(
                    ATTR_DISTRIBUTION_DOMAIN.to_string(),
                    self.distribution_domain(),
                );
                attrs.insert(
                    ATTR_DISTRIBUTION_URL.to_string(),
                    format!("http://{}", self.distribution_domain()),
                );
            }

            ResourceSpec::AssetBundle(_)
            | ResourceSpec::BucketDeployment(_)
            | ResourceSpec::EndpointConfig(_) => {
                bail!(
                    "resource `{}` is driven by the deploy operation, not the engine",
                    resource.id
                );
            }
        }

        Ok(attrs)
    }

    fn teardown(&self, resource: &Resource) -> Result<Teardown> {
        match &resource.spec {
            ResourceSpec::Table(spec) => {
                if spec.removal_policy == RemovalPolicy::Retain {
                    return Ok(Teardown::Retained);
                }
                let path = self.layout.table_path(&spec.name);
                if !path.is_file() {
                    return Ok(Teardown::Skipped);
                }
                fs::remove_file_if_exists(&path)?;
                Ok(Teardown::Removed)
            }

            ResourceSpec::Bucket(spec) => {
                if spec.removal_policy == RemovalPolicy::Retain {
                    return Ok(Teardown::Retained);
                }
                let dir = self.layout.bucket_dir(&spec.name);
                if !dir.is_dir() {
                    return Ok(Teardown::Skipped);
                }
                let has_objects = std::fs::read_dir(&dir)?.next().is_some();
                if has_objects && !spec.auto_delete_objects {
                    bail!(
                        "bucket `{}` still holds objects and auto_delete_objects is off",
                        spec.name
                    );
                }
                fs::remove_dir_all_if_exists(&dir)?;
                Ok(Teardown::Removed)
            }

            // The staged artifact lives on local disk even though the
            // bundle itself is built by the deploy operation.
            ResourceSpec::AssetBundle(_) => {
                let dir = self.layout.staging_dir(resource.id.as_str());
                if !dir.is_dir() {
                    return Ok(Teardown::Skipped);
                }
                fs::remove_dir_all_if_exists(&dir)?;
                Ok(Teardown::Removed)
            }

            _ => Ok(Teardown::Skipped),
        }
    }
}
