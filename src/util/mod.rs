//! Shared utilities

pub mod context;
pub mod fs;
pub mod hash;
pub mod interning;
pub mod process;
pub mod shell;

pub use context::GlobalContext;
pub use interning::InternedString;
pub use shell::Shell;
