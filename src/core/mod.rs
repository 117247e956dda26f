//! Core data structures for Slipway.
//!
//! This module contains the foundational types used throughout Slipway:
//! - The project manifest (Slipway.toml)
//! - Typed resource declarations with interned logical IDs
//! - Stack synthesis (manifest to declared resource set)
//! - The note record schema shared by handlers and stores

pub mod manifest;
pub mod note;
pub mod resource;
pub mod stack;

pub use manifest::{generate_default_manifest, Manifest, ManifestError};
pub use note::{Note, NoteInput};
pub use resource::{
    Access, HandlerKind, LogicalId, RemovalPolicy, Resource, ResourceSpec,
};
pub use stack::Stack;
