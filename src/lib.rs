//! Slipway - a deployment orchestrator for three-tier serverless stacks
//!
//! This crate provides the core library functionality for Slipway,
//! including stack synthesis, frontend artifact bundling, content
//! delivery with an endpoint-config bridge, and a local provisioning
//! engine with a serve-time host.

pub mod bundler;
pub mod core;
pub mod delivery;
pub mod graph;
pub mod handlers;
pub mod host;
pub mod ops;
pub mod provision;
pub mod store;
pub mod util;

pub mod test_support;

pub use crate::core::{manifest::Manifest, stack::Stack};
pub use graph::ResourceGraph;
pub use util::context::GlobalContext;
