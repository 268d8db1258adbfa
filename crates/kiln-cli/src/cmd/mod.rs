//! Subcommand handlers.

pub mod cpus;
pub mod flags;
pub mod preprocess;
pub mod thirdparty;
