//! Content delivery: publishing the frontend and bridging configuration.
//!
//! The publish path uploads a staged artifact into the site bucket
//! without pruning, the viewer policy decides how the distribution
//! answers requests, and the config bridge writes the endpoint document
//! the frontend fetches at runtime.

pub mod config_bridge;
pub mod policy;
pub mod publish;

pub use config_bridge::{write_endpoint_config, NO_CACHE};
pub use policy::{MissBehavior, ViewerPolicy};
pub use publish::{publish_dir, PublishSummary};
