//! Deployment state - what a stack's last deployment materialized.
//!
//! The state document lives at `.slipway/state.json` and tracks the
//! materialized resources with their attributes, the stack outputs, the
//! staged artifact fingerprint, and the cache invalidations issued so
//! far. Saves are atomic so an interrupted deployment never leaves a
//! half-written document behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provision::Attributes;
use crate::util::fs;

const STATE_VERSION: u32 = 1;

/// One materialized resource as recorded in state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedResource {
    /// Resource kind (table, bucket, ...)
    pub kind: String,

    /// Attributes the engine resolved at materialization time
    #[serde(default)]
    pub attributes: Attributes,
}

/// A cache invalidation issued after a publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationRecord {
    /// Invalidated path patterns
    pub paths: Vec<String>,

    /// When the invalidation was issued
    pub at: DateTime<Utc>,
}

/// The persisted state of one stack's deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentState {
    /// State document version
    pub version: u32,

    /// Stack identifier this state belongs to
    pub stack: String,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Fingerprint of the staged artifact from the last deployment
    #[serde(default)]
    pub fingerprint: Option<String>,

    /// Materialized resources keyed by logical ID
    #[serde(default)]
    pub resources: BTreeMap<String, MaterializedResource>,

    /// Stack outputs surfaced to the operator
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,

    /// Cache invalidations issued so far
    #[serde(default)]
    pub invalidations: Vec<InvalidationRecord>,

    /// Where this document is stored
    #[serde(skip)]
    path: PathBuf,
}

impl DeploymentState {
    /// Fresh state for a stack, to be saved at `path`.
    pub fn new(path: impl Into<PathBuf>, stack: impl Into<String>) -> Self {
        DeploymentState {
            version: STATE_VERSION,
            stack: stack.into(),
            updated_at: Utc::now(),
            fingerprint: None,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
            invalidations: Vec::new(),
            path: path.into(),
        }
    }

    /// Load the state document at `path`, or None if there is none.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let mut state: DeploymentState = serde_json::from_str(&content)
            .with_context(|| format!("corrupt state document at {}", path.display()))?;
        state.path = path.to_path_buf();
        Ok(Some(state))
    }

    /// Load the state for a stack, or start fresh.
    ///
    /// State written by a differently named stack is an error: two
    /// stacks must not share one project directory.
    pub fn load_or_new(path: &Path, stack: &str) -> Result<Self> {
        match Self::load(path)? {
            Some(state) if state.stack == stack => Ok(state),
            Some(state) => anyhow::bail!(
                "state at {} belongs to stack `{}`, not `{}`\n\n\
                 hint: run `slipway destroy` first, or restore the previous stack name",
                path.display(),
                state.stack,
                stack
            ),
            None => Ok(Self::new(path, stack)),
        }
    }

    /// Persist the document atomically.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::ensure_dir(parent)?;
        }
        let body = serde_json::to_vec_pretty(self)?;
        fs::write_atomic(&self.path, &body)
            .with_context(|| format!("failed to write state at {}", self.path.display()))
    }

    /// The document's location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a materialized resource and its attributes.
    pub fn record_resource(&mut self, id: &str, kind: &str, attributes: Attributes) {
        self.resources.insert(
            id.to_string(),
            MaterializedResource {
                kind: kind.to_string(),
                attributes,
            },
        );
        self.updated_at = Utc::now();
    }

    /// Forget a resource after teardown.
    pub fn remove_resource(&mut self, id: &str) -> Option<MaterializedResource> {
        let removed = self.resources.remove(id);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Look up a recorded resource.
    pub fn get_resource(&self, id: &str) -> Option<&MaterializedResource> {
        self.resources.get(id)
    }

    /// Set a stack output.
    pub fn set_output(&mut self, name: &str, value: impl Into<String>) {
        self.outputs.insert(name.to_string(), value.into());
        self.updated_at = Utc::now();
    }

    /// Record the staged artifact fingerprint.
    pub fn set_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.fingerprint = Some(fingerprint.into());
        self.updated_at = Utc::now();
    }

    /// Record a cache invalidation.
    pub fn record_invalidation(&mut self, paths: Vec<String>) {
        self.invalidations.push(InvalidationRecord {
            paths,
            at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    /// Whether anything is still materialized.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
