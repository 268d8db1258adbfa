//! Shared domain types for kiln.
//!
//! Everything in this crate is plain data: compiler versions, CPU ids,
//! build tags and the flag list produced from them. No I/O happens here.

pub mod compiler;
pub mod cpu;
pub mod flagset;
pub mod host;
pub mod variant;

// Re-exports
pub use compiler::{CompilerVersion, MacroDumpError};
pub use cpu::{CpuId, CpuVendor};
pub use flagset::{Diagnostic, DiagnosticKind, FlagSet};
pub use host::HostOs;
pub use variant::{BuildTag, BuildVariant};
