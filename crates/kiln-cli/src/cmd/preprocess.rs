//! Preprocess command

use std::path::Path;

use anyhow::{Context, Result};
use kiln_core::Reporter;
use kiln_core::preprocess::{Preprocessor, default_output_path};

use crate::ui::ConsoleReporter;

/// Rewrite `source` into `output`, or `preprocessed_<source>` when omitted.
pub fn preprocess(source: &Path, output: Option<&Path>, reporter: &ConsoleReporter) -> Result<()> {
    let output = output.map_or_else(|| default_output_path(source), Path::to_path_buf);

    let stats = Preprocessor::new()
        .process_file(source, &output)
        .with_context(|| format!("Failed to preprocess {}", source.display()))?;

    reporter.info(&format!(
        "Wrote {} ({} lines, {} dropped)",
        output.display(),
        stats.lines_written,
        stats.lines_skipped
    ));
    Ok(())
}
