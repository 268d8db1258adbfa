//! kiln - build configuration helper
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Command-line front end over `kiln-core`.
//!
//! # Overview
//!
//! - `kiln flags` picks GCC flags for a build id, CPU and compiler version.
//! - `kiln cpus` lists the CPU ids the flag table knows.
//! - `kiln thirdparty` inspects and fetches the optional third-party sources.
//! - `kiln preprocess` rewrites Maple-generated C code for the kernel.

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "kiln")]
#[command(author, version, about = "kiln - build configuration helper")]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print compiler flags for a build configuration
    Flags {
        /// Build id, e.g. opt-mpi-gcc or debug-cuda
        #[arg(long, short = 'b')]
        build_id: String,
        /// Target CPU id (see `kiln cpus`)
        #[arg(long, default_value = "unknown")]
        cpu: String,
        /// Compiler to query for its version
        #[arg(long, conflicts_with = "compiler_version")]
        compiler: Option<String>,
        /// Use this compiler version instead of querying a compiler
        #[arg(long, value_name = "X.Y.Z")]
        compiler_version: Option<String>,
        /// Host operating system (defaults to the current one)
        #[arg(long)]
        host: Option<String>,
        /// Print flags and diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recognized CPU ids
    Cpus {
        /// Host operating system (defaults to the current one)
        #[arg(long)]
        host: Option<String>,
    },
    /// Optional third-party source packages
    Thirdparty {
        #[command(subcommand)]
        command: ThirdpartyCommands,
    },
    /// Rewrite a Maple-generated C file for the kernel
    Preprocess {
        /// Maple output file
        source: PathBuf,
        /// Output file (defaults to preprocessed_<SOURCE> next to the input)
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ThirdpartyCommands {
    /// List known packages
    List {
        /// Directory holding the unpacked packages
        #[arg(long)]
        trunk: Option<PathBuf>,
    },
    /// Print a package descriptor as TOML
    Show {
        /// Package name
        name: String,
    },
    /// Print the CMake flags enabling the given packages
    CmakeFlags {
        /// Package names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Download and unpack packages
    Fetch {
        /// Package names (all known packages if empty)
        names: Vec<String>,
        /// Directory to unpack into
        #[arg(long)]
        trunk: Option<PathBuf>,
    },
}
