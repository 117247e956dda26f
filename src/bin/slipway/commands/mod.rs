//! Command implementations

pub mod completions;
pub mod deploy;
pub mod destroy;
pub mod doctor;
pub mod graph;
pub mod init;
pub mod new;
pub mod outputs;
pub mod serve;
