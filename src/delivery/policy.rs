//! Viewer policy - how the distribution answers requests.
//!
//! Pure decision functions: the local host and tests apply them to
//! incoming paths without touching storage.

use crate::core::resource::DistributionSpec;

/// What the distribution does when a key has no object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissBehavior {
    /// Serve another key with the given status. Single-page apps route
    /// client-side, so unknown paths get the root document with 200.
    ServeKey { key: String, status: u16 },

    /// Plain 404.
    NotFound,
}

/// Distribution behavior toward viewers.
#[derive(Debug, Clone)]
pub struct ViewerPolicy {
    /// Object served at the root path
    default_root_object: String,

    /// Rewrite missing objects to the root object with status 200
    spa_rewrite: bool,

    /// Redirect plain-HTTP viewers to HTTPS
    upgrade_insecure: bool,
}

impl ViewerPolicy {
    /// Build the policy a declared distribution describes.
    pub fn from_spec(spec: &DistributionSpec) -> Self {
        ViewerPolicy {
            default_root_object: spec.default_root_object.clone(),
            spa_rewrite: spec.spa_rewrite,
            upgrade_insecure: spec.upgrade_insecure,
        }
    }

    /// The object key a viewer path resolves to.
    pub fn resolve_key(&self, path: &str) -> String {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            self.default_root_object.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// What to do when the resolved key has no object.
    pub fn on_miss(&self) -> MissBehavior {
        if self.spa_rewrite {
            MissBehavior::ServeKey {
                key: self.default_root_object.clone(),
                status: 200,
            }
        } else {
            MissBehavior::NotFound
        }
    }

    /// Redirect target for a viewer arriving over the given scheme, if
    /// the policy upgrades insecure requests.
    pub fn upgrade_target(&self, scheme: &str, host: &str, path: &str) -> Option<String> {
        if self.upgrade_insecure && scheme.eq_ignore_ascii_case("http") {
            Some(format!("https://{}{}", host, path))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::InternedString;

    fn policy(spa_rewrite: bool, upgrade_insecure: bool) -> ViewerPolicy {
        ViewerPolicy::from_spec(&DistributionSpec {
            origin: InternedString::new("site-bucket"),
            default_root_object: "index.html".to_string(),
            spa_rewrite,
            upgrade_insecure,
        })
    }

    #[test]
    fn test_root_path_resolves_to_root_object() {
        let policy = policy(true, true);
        assert_eq!(policy.resolve_key("/"), "index.html");
        assert_eq!(policy.resolve_key(""), "index.html");
        assert_eq!(policy.resolve_key("/assets/app.js"), "assets/app.js");
    }

    #[test]
    fn test_spa_rewrite_serves_root_with_200() {
        assert_eq!(
            policy(true, true).on_miss(),
            MissBehavior::ServeKey {
                key: "index.html".to_string(),
                status: 200,
            }
        );
        assert_eq!(policy(false, true).on_miss(), MissBehavior::NotFound);
    }

    #[test]
    fn test_insecure_viewers_are_upgraded() {
        let upgrading = policy(true, true);
        assert_eq!(
            upgrading.upgrade_target("http", "example.com", "/notes"),
            Some("https://example.com/notes".to_string())
        );
        assert_eq!(
            upgrading.upgrade_target("https", "example.com", "/notes"),
            None
        );

        let no_upgrade = policy(true, false);
        assert_eq!(no_upgrade.upgrade_target("http", "example.com", "/"), None);
    }
}
