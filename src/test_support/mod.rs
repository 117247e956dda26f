//! Test utilities and fixtures for Slipway tests.
//!
//! The heart of this module is [`ProjectFixture`]: a deployable
//! project scaffolded into a temporary directory, with optional fake
//! build tooling so the bundle and deploy paths run without Node.js
//! installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use slipway::test_support::ProjectFixture;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = ProjectFixture::new("demo").with_fake_tooling();
//!     // Run operations against fixture.root()...
//! }
//! ```

pub mod fixtures;

pub use fixtures::*;
