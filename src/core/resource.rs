//! Resource declarations - what gets deployed.
//!
//! A Resource is a typed declaration of one piece of the stack, identified
//! by a logical ID, plus the IDs it depends on. Declarations carry no
//! runtime state; materialization happens in the provisioning engine and
//! the deploy operation.

use std::path::PathBuf;

use semver::Version;
use serde::Deserialize;

use crate::util::InternedString;

/// Logical identifier of a declared resource.
pub type LogicalId = InternedString;

/// What happens to a stateful resource when the stack is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Delete the materialized resource, data included.
    #[default]
    Destroy,
    /// Leave the materialized resource in place.
    Retain,
}

/// Access level granted on a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }
}

/// Which request handler a function runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// GET /notes: most recent records, capped.
    ReadNotes,
    /// POST /notes: create a record from the request body.
    WriteNotes,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::ReadNotes => "read-notes",
            HandlerKind::WriteNotes => "write-notes",
        }
    }
}

/// CORS settings for an HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsSpec {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

/// A declared resource with its dependencies.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Logical ID, unique within a stack
    pub id: LogicalId,

    /// Typed declaration
    pub spec: ResourceSpec,

    /// Logical IDs this resource depends on
    pub depends_on: Vec<LogicalId>,
}

impl Resource {
    /// Create a resource with no dependencies.
    pub fn new(id: impl AsRef<str>, spec: ResourceSpec) -> Self {
        Resource {
            id: InternedString::new(id),
            spec,
            depends_on: Vec::new(),
        }
    }

    /// Add a dependency edge.
    pub fn depends_on(mut self, id: impl AsRef<str>) -> Self {
        self.depends_on.push(InternedString::new(id));
        self
    }

    /// Short kind name for display and state records.
    pub fn kind(&self) -> &'static str {
        self.spec.kind()
    }
}

/// The typed declaration of each resource kind.
#[derive(Debug, Clone)]
pub enum ResourceSpec {
    Table(TableSpec),
    Function(FunctionSpec),
    HttpApi(HttpApiSpec),
    Route(RouteSpec),
    Grant(GrantSpec),
    Bucket(BucketSpec),
    Distribution(DistributionSpec),
    AssetBundle(BundleSpec),
    BucketDeployment(BucketDeploymentSpec),
    EndpointConfig(EndpointConfigSpec),
}

impl ResourceSpec {
    /// Short kind name for display and state records.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::Table(_) => "table",
            ResourceSpec::Function(_) => "function",
            ResourceSpec::HttpApi(_) => "http-api",
            ResourceSpec::Route(_) => "route",
            ResourceSpec::Grant(_) => "grant",
            ResourceSpec::Bucket(_) => "bucket",
            ResourceSpec::Distribution(_) => "distribution",
            ResourceSpec::AssetBundle(_) => "asset-bundle",
            ResourceSpec::BucketDeployment(_) => "bucket-deployment",
            ResourceSpec::EndpointConfig(_) => "endpoint-config",
        }
    }
}

/// A composite-key key-value table.
#[derive(Debug, Clone)]
pub struct TableSpec {
    /// Table name
    pub name: String,

    /// Partition key attribute name
    pub partition_key: String,

    /// Sort key attribute name
    pub sort_key: String,

    /// Lifecycle on destroy
    pub removal_policy: RemovalPolicy,
}

/// A request handler function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    /// The handler this function runs
    pub handler: HandlerKind,

    /// Log retention in days
    pub log_retention_days: u32,
}

/// An HTTP API fronting handler functions.
#[derive(Debug, Clone)]
pub struct HttpApiSpec {
    /// CORS preflight settings
    pub cors: CorsSpec,
}

/// A method+path route binding an API to a function.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    /// The API resource
    pub api: LogicalId,

    /// The function handling this route
    pub function: LogicalId,

    /// HTTP method
    pub method: String,

    /// Route path
    pub path: String,
}

/// A least-privilege grant binding a function to a table.
#[derive(Debug, Clone)]
pub struct GrantSpec {
    /// The table being accessed
    pub table: LogicalId,

    /// The function receiving access
    pub function: LogicalId,

    /// Read or write, never both
    pub access: Access,
}

/// A private object storage bucket.
#[derive(Debug, Clone)]
pub struct BucketSpec {
    /// Bucket name
    pub name: String,

    /// Block all public access; objects are reachable only through the
    /// distribution
    pub block_public_access: bool,

    /// Delete remaining objects on destroy
    pub auto_delete_objects: bool,

    /// Lifecycle on destroy
    pub removal_policy: RemovalPolicy,
}

/// A caching distribution fronting a bucket.
#[derive(Debug, Clone)]
pub struct DistributionSpec {
    /// The origin bucket
    pub origin: LogicalId,

    /// Object served at the root path
    pub default_root_object: String,

    /// Rewrite missing objects to the root object with status 200
    pub spa_rewrite: bool,

    /// Redirect plain-HTTP viewers to HTTPS
    pub upgrade_insecure: bool,
}

/// A frontend artifact built from source.
#[derive(Debug, Clone)]
pub struct BundleSpec {
    /// Frontend source directory (absolute)
    pub source_dir: PathBuf,

    /// Build tool output directory (absolute)
    pub output_dir: PathBuf,

    /// Production build command, program first
    pub build_command: Vec<String>,

    /// Fast bundling tool probed before building
    pub tool: String,

    /// Minimum acceptable tool version, if any
    pub min_tool_version: Option<Version>,
}

/// Publication of a bundle into a bucket.
#[derive(Debug, Clone)]
pub struct BucketDeploymentSpec {
    /// The bundle being published
    pub bundle: LogicalId,

    /// The destination bucket
    pub bucket: LogicalId,

    /// The distribution whose cache is invalidated after publish
    pub distribution: LogicalId,

    /// Whether objects absent from the bundle are deleted. Always false:
    /// the endpoint config document must survive publishes.
    pub prune: bool,

    /// Log retention in days for the publish action
    pub log_retention_days: u32,
}

/// The endpoint config document written after the API resolves.
#[derive(Debug, Clone)]
pub struct EndpointConfigSpec {
    /// The API whose address is recorded
    pub api: LogicalId,

    /// The bucket receiving the document
    pub bucket: LogicalId,

    /// Object key of the document
    pub key: String,

    /// Field name the document stores the address under
    pub output_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_builder() {
        let r = Resource::new(
            "site-distribution",
            ResourceSpec::Distribution(DistributionSpec {
                origin: InternedString::new("site-bucket"),
                default_root_object: "index.html".to_string(),
                spa_rewrite: true,
                upgrade_insecure: true,
            }),
        )
        .depends_on("site-bucket");

        assert_eq!(r.id.as_str(), "site-distribution");
        assert_eq!(r.kind(), "distribution");
        assert_eq!(r.depends_on, vec![InternedString::new("site-bucket")]);
    }

    #[test]
    fn test_removal_policy_parse() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: RemovalPolicy,
        }

        let w: Wrapper = toml::from_str("policy = \"retain\"").unwrap();
        assert_eq!(w.policy, RemovalPolicy::Retain);

        let w: Wrapper = toml::from_str("policy = \"destroy\"").unwrap();
        assert_eq!(w.policy, RemovalPolicy::Destroy);
    }

    #[test]
    fn test_kind_names() {
        let table = ResourceSpec::Table(TableSpec {
            name: "notes".to_string(),
            partition_key: "pk".to_string(),
            sort_key: "sk".to_string(),
            removal_policy: RemovalPolicy::Destroy,
        });
        assert_eq!(table.kind(), "table");

        let grant = ResourceSpec::Grant(GrantSpec {
            table: InternedString::new("notes-table"),
            function: InternedString::new("read-function"),
            access: Access::Read,
        });
        assert_eq!(grant.kind(), "grant");
    }
}
