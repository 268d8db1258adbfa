//! Compiler version detection.
//!
//! Runs `<compiler> -dM -E -` on an empty translation unit and reads the
//! predefined version macros from the dump.

use std::io::Write;
use std::process::{Command, Stdio};

use kiln_schema::{CompilerVersion, MacroDumpError};
use thiserror::Error;

/// Errors from [`detect_version`].
#[derive(Error, Debug)]
pub enum DetectError {
    /// The compiler could not be started or its pipes failed.
    #[error("Failed to run {compiler}: {source}")]
    Spawn {
        /// Compiler command.
        compiler: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler ran but exited unsuccessfully.
    #[error("{compiler} exited with {status}: {stderr}")]
    Failed {
        /// Compiler command.
        compiler: String,
        /// Exit status as printed by the OS.
        status: std::process::ExitStatus,
        /// Captured standard error.
        stderr: String,
    },

    /// The macro dump did not contain a usable version.
    #[error("Could not read version from {compiler}: {source}")]
    MacroDump {
        /// Compiler command.
        compiler: String,
        /// Parse failure.
        source: MacroDumpError,
    },
}

/// Ask `compiler` for its version.
///
/// # Errors
///
/// Returns [`DetectError::Spawn`] if the process cannot be run,
/// [`DetectError::Failed`] on a non-zero exit, and
/// [`DetectError::MacroDump`] if the output lacks the GNU version macros
/// (for example when `compiler` is not GCC-compatible).
pub fn detect_version(compiler: &str) -> Result<CompilerVersion, DetectError> {
    let spawn_err = |source| DetectError::Spawn {
        compiler: compiler.to_string(),
        source,
    };

    let mut child = Command::new(compiler)
        .args(["-x", "c++", "-dM", "-E", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    // Empty translation unit; closing stdin lets the preprocessor finish.
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(b"").map_err(spawn_err)?;
    }

    let output = child.wait_with_output().map_err(spawn_err)?;
    if !output.status.success() {
        return Err(DetectError::Failed {
            compiler: compiler.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let dump = String::from_utf8_lossy(&output.stdout);
    let version =
        CompilerVersion::from_macro_dump(&dump).map_err(|source| DetectError::MacroDump {
            compiler: compiler.to_string(),
            source,
        })?;

    tracing::info!(%compiler, %version, "Detected gcc version");
    Ok(version)
}
