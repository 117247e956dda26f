//! Provisioning engines.
//!
//! An engine materializes declared resources and tears them down. The
//! deploy operation walks the stack graph in dependency order, passing
//! each infrastructure resource to the engine and running the artifact
//! and delivery phases itself; the engine never sees those. Everything
//! is synchronous: a provisioning pass is deployment-time work with no
//! runtime concurrency.

pub mod local;
pub mod state;

use std::collections::BTreeMap;

use anyhow::Result;

use crate::core::resource::{LogicalId, Resource};

pub use local::LocalProvisioner;
pub use state::{DeploymentState, InvalidationRecord, MaterializedResource};

/// Attributes a materialized resource exposes to later phases.
pub type Attributes = BTreeMap<String, String>;

/// Attributes of everything materialized so far, keyed by logical ID.
pub type ResolvedAttributes = BTreeMap<LogicalId, Attributes>;

// Attribute keys the local engine resolves. Later phases look these up
// by name, so they are part of the engine contract.
pub const ATTR_API_URL: &str = "api.url";
pub const ATTR_BUCKET_NAME: &str = "bucket.name";
pub const ATTR_BUCKET_PATH: &str = "bucket.path";
pub const ATTR_DISTRIBUTION_DOMAIN: &str = "distribution.domain";
pub const ATTR_DISTRIBUTION_URL: &str = "distribution.url";
pub const ATTR_TABLE_NAME: &str = "table.name";
pub const ATTR_TABLE_PATH: &str = "table.path";

/// What a teardown did with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The materialized resource was deleted
    Removed,

    /// The resource carries a retain policy and was left in place
    Retained,

    /// Nothing was materialized for this resource
    Skipped,
}

/// A provisioning engine.
pub trait Provisioner: Send + Sync {
    /// Engine name for status output.
    fn name(&self) -> &str;

    /// Check the engine can run before the walk starts.
    fn check_ready(&self) -> Result<()>;

    /// Materialize one declared resource, returning its attributes.
    ///
    /// `resolved` holds the attributes of every resource materialized
    /// earlier in the walk; the graph guarantees dependencies appear
    /// there before their dependents run.
    fn materialize(&self, resource: &Resource, resolved: &ResolvedAttributes)
        -> Result<Attributes>;

    /// Tear down one resource, honoring its removal policy.
    fn teardown(&self, resource: &Resource) -> Result<Teardown>;
}
