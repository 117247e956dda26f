//! Stack synthesis - manifest to declared resources.
//!
//! A Stack is the fully declared three-tier application: the resource set
//! plus the dependency graph over it. Synthesis is pure; nothing touches
//! the filesystem until the deploy operation walks the graph.

use crate::core::manifest::Manifest;
use crate::core::resource::{
    Access, BucketDeploymentSpec, BucketSpec, BundleSpec, CorsSpec, DistributionSpec,
    EndpointConfigSpec, FunctionSpec, GrantSpec, HandlerKind, HttpApiSpec, LogicalId, Resource,
    ResourceSpec, RouteSpec, TableSpec,
};
use crate::graph::{ResourceGraph, SynthesisError};
use crate::util::InternedString;

// Logical IDs of the fixed stack shape. The manifest parameterizes the
// resources; it does not change which resources exist.
pub const NOTES_TABLE: &str = "notes-table";
pub const READ_FUNCTION: &str = "read-function";
pub const WRITE_FUNCTION: &str = "write-function";
pub const NOTES_API: &str = "notes-api";
pub const GET_NOTES_ROUTE: &str = "get-notes-route";
pub const POST_NOTES_ROUTE: &str = "post-notes-route";
pub const READ_GRANT: &str = "read-grant";
pub const WRITE_GRANT: &str = "write-grant";
pub const SITE_BUCKET: &str = "site-bucket";
pub const SITE_DISTRIBUTION: &str = "site-distribution";
pub const WEB_BUNDLE: &str = "web-bundle";
pub const SITE_DEPLOYMENT: &str = "site-deployment";
pub const ENDPOINT_CONFIG: &str = "endpoint-config";

/// Object key of the endpoint config document in the site bucket.
pub const ENDPOINT_CONFIG_KEY: &str = "config.json";

/// Output name carrying the API base address.
pub const OUTPUT_HTTP_API_URL: &str = "HttpApiUrl";

/// Output name carrying the distribution domain.
pub const OUTPUT_DISTRIBUTION_DOMAIN: &str = "DistributionDomain";

/// A synthesized stack: declared resources plus their dependency graph.
#[derive(Debug)]
pub struct Stack {
    /// Stack identifier from the manifest
    name: String,

    /// Declared resources, in declaration order
    resources: Vec<Resource>,

    /// Dependency graph over the resource IDs
    graph: ResourceGraph,
}

impl Stack {
    /// Synthesize the stack declared by a manifest.
    pub fn synthesize(manifest: &Manifest) -> Result<Self, SynthesisError> {
        let resources = declare_resources(manifest);

        let mut graph = ResourceGraph::new();
        for resource in &resources {
            graph.add_resource(resource.id)?;
        }
        for resource in &resources {
            for dep in &resource.depends_on {
                graph.add_dependency(resource.id, *dep)?;
            }
        }

        Ok(Stack {
            name: manifest.stack_name().to_string(),
            resources,
            graph,
        })
    }

    /// The stack identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All declared resources, in declaration order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Look up a resource by logical ID.
    pub fn get(&self, id: LogicalId) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// The dependency graph.
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// Resource IDs in dependency order: every resource appears after
    /// everything it depends on.
    pub fn materialization_order(&self) -> Result<Vec<LogicalId>, SynthesisError> {
        self.graph.materialization_order()
    }

    /// Resource IDs in reverse dependency order, for teardown.
    pub fn teardown_order(&self) -> Result<Vec<LogicalId>, SynthesisError> {
        self.graph.teardown_order()
    }
}

/// Declare the fixed resource set, parameterized by the manifest.
fn declare_resources(manifest: &Manifest) -> Vec<Resource> {
    let table = Resource::new(
        NOTES_TABLE,
        ResourceSpec::Table(TableSpec {
            name: manifest.table.name.clone(),
            partition_key: "pk".to_string(),
            sort_key: "sk".to_string(),
            removal_policy: manifest.stack.removal_policy,
        }),
    );

    let read_function = Resource::new(
        READ_FUNCTION,
        ResourceSpec::Function(FunctionSpec {
            handler: HandlerKind::ReadNotes,
            log_retention_days: manifest.api.log_retention_days,
        }),
    );

    let write_function = Resource::new(
        WRITE_FUNCTION,
        ResourceSpec::Function(FunctionSpec {
            handler: HandlerKind::WriteNotes,
            log_retention_days: manifest.api.log_retention_days,
        }),
    );

    let api = Resource::new(
        NOTES_API,
        ResourceSpec::HttpApi(HttpApiSpec {
            cors: CorsSpec {
                allow_origins: manifest.api.cors_origins.clone(),
                allow_methods: manifest.api.cors_methods.clone(),
                allow_headers: manifest.api.cors_headers.clone(),
            },
        }),
    );

    let get_route = Resource::new(
        GET_NOTES_ROUTE,
        ResourceSpec::Route(RouteSpec {
            api: InternedString::new(NOTES_API),
            function: InternedString::new(READ_FUNCTION),
            method: "GET".to_string(),
            path: "/notes".to_string(),
        }),
    )
    .depends_on(NOTES_API)
    .depends_on(READ_FUNCTION);

    let post_route = Resource::new(
        POST_NOTES_ROUTE,
        ResourceSpec::Route(RouteSpec {
            api: InternedString::new(NOTES_API),
            function: InternedString::new(WRITE_FUNCTION),
            method: "POST".to_string(),
            path: "/notes".to_string(),
        }),
    )
    .depends_on(NOTES_API)
    .depends_on(WRITE_FUNCTION);

    let read_grant = Resource::new(
        READ_GRANT,
        ResourceSpec::Grant(GrantSpec {
            table: InternedString::new(NOTES_TABLE),
            function: InternedString::new(READ_FUNCTION),
            access: Access::Read,
        }),
    )
    .depends_on(NOTES_TABLE)
    .depends_on(READ_FUNCTION);

    let write_grant = Resource::new(
        WRITE_GRANT,
        ResourceSpec::Grant(GrantSpec {
            table: InternedString::new(NOTES_TABLE),
            function: InternedString::new(WRITE_FUNCTION),
            access: Access::Write,
        }),
    )
    .depends_on(NOTES_TABLE)
    .depends_on(WRITE_FUNCTION);

    let bucket = Resource::new(
        SITE_BUCKET,
        ResourceSpec::Bucket(BucketSpec {
            name: format!("{}-site", manifest.stack_name()),
            block_public_access: true,
            auto_delete_objects: true,
            removal_policy: manifest.stack.removal_policy,
        }),
    );

    let distribution = Resource::new(
        SITE_DISTRIBUTION,
        ResourceSpec::Distribution(DistributionSpec {
            origin: InternedString::new(SITE_BUCKET),
            default_root_object: "index.html".to_string(),
            spa_rewrite: true,
            upgrade_insecure: true,
        }),
    )
    .depends_on(SITE_BUCKET);

    let bundle = Resource::new(
        WEB_BUNDLE,
        ResourceSpec::AssetBundle(BundleSpec {
            source_dir: manifest.web_source_dir(),
            output_dir: manifest.web_output_dir(),
            build_command: manifest.build_command_parts(),
            tool: manifest.web.tool.clone(),
            min_tool_version: manifest.web.min_tool_version.clone(),
        }),
    );

    let deployment = Resource::new(
        SITE_DEPLOYMENT,
        ResourceSpec::BucketDeployment(BucketDeploymentSpec {
            bundle: InternedString::new(WEB_BUNDLE),
            bucket: InternedString::new(SITE_BUCKET),
            distribution: InternedString::new(SITE_DISTRIBUTION),
            prune: false,
            log_retention_days: manifest.deploy.log_retention_days,
        }),
    )
    .depends_on(WEB_BUNDLE)
    .depends_on(SITE_BUCKET)
    .depends_on(SITE_DISTRIBUTION);

    // Depends on the deployment so the config document is written after
    // the site publish, not just after the bucket exists.
    let endpoint_config = Resource::new(
        ENDPOINT_CONFIG,
        ResourceSpec::EndpointConfig(EndpointConfigSpec {
            api: InternedString::new(NOTES_API),
            bucket: InternedString::new(SITE_BUCKET),
            key: ENDPOINT_CONFIG_KEY.to_string(),
            output_name: OUTPUT_HTTP_API_URL.to_string(),
        }),
    )
    .depends_on(NOTES_API)
    .depends_on(SITE_BUCKET)
    .depends_on(SITE_DEPLOYMENT);

    vec![
        table,
        read_function,
        write_function,
        api,
        get_route,
        post_route,
        read_grant,
        write_grant,
        bucket,
        distribution,
        bundle,
        deployment,
        endpoint_config,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn test_manifest() -> Manifest {
        let content = r#"
[stack]
name = "demo"
"#;
        Manifest::parse(content, Path::new("/tmp/slipway-test/Slipway.toml")).unwrap()
    }

    fn position(order: &[LogicalId], id: &str) -> usize {
        order
            .iter()
            .position(|r| r.as_str() == id)
            .unwrap_or_else(|| panic!("{id} missing from order"))
    }

    #[test]
    fn test_synthesize_declares_full_stack() {
        let stack = Stack::synthesize(&test_manifest()).unwrap();

        let ids: Vec<&str> = stack.resources().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                NOTES_TABLE,
                READ_FUNCTION,
                WRITE_FUNCTION,
                NOTES_API,
                GET_NOTES_ROUTE,
                POST_NOTES_ROUTE,
                READ_GRANT,
                WRITE_GRANT,
                SITE_BUCKET,
                SITE_DISTRIBUTION,
                WEB_BUNDLE,
                SITE_DEPLOYMENT,
                ENDPOINT_CONFIG,
            ]
        );
        assert_eq!(stack.graph().len(), stack.resources().len());
        assert_eq!(stack.name(), "demo");
    }

    #[test]
    fn test_materialization_order_respects_dependencies() {
        let stack = Stack::synthesize(&test_manifest()).unwrap();
        let order = stack.materialization_order().unwrap();

        assert_eq!(order.len(), 13);
        assert!(position(&order, SITE_BUCKET) < position(&order, SITE_DISTRIBUTION));
        assert!(position(&order, SITE_DISTRIBUTION) < position(&order, SITE_DEPLOYMENT));
        assert!(position(&order, WEB_BUNDLE) < position(&order, SITE_DEPLOYMENT));
        assert!(position(&order, SITE_DEPLOYMENT) < position(&order, ENDPOINT_CONFIG));
        assert!(position(&order, NOTES_API) < position(&order, ENDPOINT_CONFIG));
        assert!(position(&order, NOTES_API) < position(&order, GET_NOTES_ROUTE));
        assert!(position(&order, READ_FUNCTION) < position(&order, GET_NOTES_ROUTE));
        assert!(position(&order, WRITE_FUNCTION) < position(&order, POST_NOTES_ROUTE));
        assert!(position(&order, NOTES_TABLE) < position(&order, READ_GRANT));
        assert!(position(&order, NOTES_TABLE) < position(&order, WRITE_GRANT));
    }

    #[test]
    fn test_teardown_reverses_materialization() {
        let stack = Stack::synthesize(&test_manifest()).unwrap();

        let mut expected = stack.materialization_order().unwrap();
        expected.reverse();
        assert_eq!(stack.teardown_order().unwrap(), expected);
    }

    #[test]
    fn test_grants_bind_least_privilege() {
        let stack = Stack::synthesize(&test_manifest()).unwrap();

        let read = stack.get(InternedString::new(READ_GRANT)).unwrap();
        match &read.spec {
            ResourceSpec::Grant(g) => {
                assert_eq!(g.access, Access::Read);
                assert_eq!(g.function.as_str(), READ_FUNCTION);
            }
            other => panic!("expected grant, got {}", other.kind()),
        }

        let write = stack.get(InternedString::new(WRITE_GRANT)).unwrap();
        match &write.spec {
            ResourceSpec::Grant(g) => {
                assert_eq!(g.access, Access::Write);
                assert_eq!(g.function.as_str(), WRITE_FUNCTION);
            }
            other => panic!("expected grant, got {}", other.kind()),
        }
    }

    #[test]
    fn test_manifest_parameterizes_resources() {
        let content = r#"
[stack]
name = "prod"
removal_policy = "retain"

[web]
source = "frontend"
tool = "bun"

[table]
name = "records"
"#;
        let manifest =
            Manifest::parse(content, Path::new("/tmp/slipway-test/Slipway.toml")).unwrap();
        let stack = Stack::synthesize(&manifest).unwrap();

        match &stack.get(InternedString::new(NOTES_TABLE)).unwrap().spec {
            ResourceSpec::Table(t) => {
                assert_eq!(t.name, "records");
                assert_eq!(t.removal_policy, crate::core::resource::RemovalPolicy::Retain);
            }
            other => panic!("expected table, got {}", other.kind()),
        }

        match &stack.get(InternedString::new(WEB_BUNDLE)).unwrap().spec {
            ResourceSpec::AssetBundle(b) => {
                assert_eq!(b.tool, "bun");
                assert!(b.source_dir.ends_with("frontend"));
            }
            other => panic!("expected bundle, got {}", other.kind()),
        }

        match &stack.get(InternedString::new(SITE_BUCKET)).unwrap().spec {
            ResourceSpec::Bucket(b) => assert_eq!(b.name, "prod-site"),
            other => panic!("expected bucket, got {}", other.kind()),
        }
    }

    #[test]
    fn test_endpoint_config_targets_api_and_bucket() {
        let stack = Stack::synthesize(&test_manifest()).unwrap();

        let config = stack.get(InternedString::new(ENDPOINT_CONFIG)).unwrap();
        match &config.spec {
            ResourceSpec::EndpointConfig(c) => {
                assert_eq!(c.key, "config.json");
                assert_eq!(c.output_name, "HttpApiUrl");
                assert_eq!(c.api.as_str(), NOTES_API);
                assert_eq!(c.bucket.as_str(), SITE_BUCKET);
            }
            other => panic!("expected endpoint config, got {}", other.kind()),
        }
    }
}
