//! High-level operations.
//!
//! This module contains the implementation of Slipway commands.

pub mod deploy;
pub mod destroy;
pub mod doctor;
pub mod init;

pub use deploy::{deploy, DeployOptions, DeployResult};
pub use destroy::{destroy, DestroyResult};
pub use doctor::{doctor, format_report, DoctorOptions, DoctorReport};
pub use init::{init_project, new_project, NewOptions};
