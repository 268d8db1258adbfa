//! Core library for kiln.
//!
//! - [`flags`]: compiler flag selection from version, CPU and build variant.
//! - [`detect`]: compiler version detection through the preprocessor.
//! - [`thirdparty`]: third-party package descriptors and their fetch/unpack.
//! - [`preprocess`]: rewriting of computer-algebra generated C fragments.

pub mod config;
pub mod detect;
pub mod flags;
pub mod io;
pub mod preprocess;
pub mod reporter;
pub mod thirdparty;

pub use config::Config;
pub use flags::{FlagSelection, UnsupportedCompiler, select_flags};
pub use reporter::{NullReporter, Reporter};

/// User Agent string for outgoing HTTP requests
pub const USER_AGENT: &str = concat!("kiln/", env!("CARGO_PKG_VERSION"));
