//! Rewriting of Maple-generated C code into the kernel's C++ dialect.
//!
//! Maple's `CodeGeneration[C]` output uses nested array indexing and bare
//! libm calls. Each line is rewritten independently by an ordered list of
//! regex substitutions; session noise (prompt lines starting with `>` and
//! `Warning` lines) is dropped.
//!
//! | Input | Output |
//! |---|---|
//! | `grad[1][2]` | `grad(1,2)` |
//! | `h[0]` | `h(0)` |
//! | `fac_reg` | `this->_fac_reg` |
//! | `sqrt(a)` | `Math::sqrt(a)` |
//! | `0.5e1` | `DataType(5)` |

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

/// File name prefix of the default output file.
pub const OUTPUT_PREFIX: &str = "preprocessed_";

/// Errors from the preprocessor.
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// Reading the source or writing the output failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Stream error while processing.
    #[error("IO error: {0}")]
    Stream(#[from] io::Error),
}

/// Line counts from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    /// Lines read from the source.
    pub lines_read: usize,
    /// Lines written to the output.
    pub lines_written: usize,
    /// Prompt and warning lines dropped.
    pub lines_skipped: usize,
}

#[derive(Debug)]
struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

// Order matters: the literal rules wrap first, then unwrap the exponent.
const RULES: &[(&str, &str)] = &[
    (r"grad\[(.)\]\[(.)\]", "grad(${1},${2})"),
    (r"grad_norm\[(.)\]\[(.)\]", "grad_norm(${1},${2})"),
    (r"x\[(.)\]\[(.)\]", "x(${1},${2})"),
    (r"h\[(.)\]", "h(${1})"),
    (r"fac_", "this->_fac_"),
    (r"pow", "Math::pow"),
    (r"sqrt", "Math::sqrt"),
    // TODO: have Maple emit integer literals so the DataType cast loses no bits in quad precision.
    (r"(0\.[1-9]*e[1-9])", "DataType(${1})"),
    (r"0\.([1-9])e1", "${1}"),
    (r"0\.([1-9][0-9])e2", "${1}"),
    (r"0\.([1-9][0-9][0-9])e3", "${1}"),
];

const SKIP: &[&str] = &[r"^>", r"^Warning"];

/// Compiled rewrite table.
#[derive(Debug)]
pub struct Preprocessor {
    skip: Vec<Regex>,
    rules: Vec<Rule>,
}

impl Preprocessor {
    /// Compile the rule table.
    ///
    /// # Panics
    ///
    /// Panics only if a built-in pattern is malformed, which the unit tests
    /// rule out.
    pub fn new() -> Self {
        let compile = |p: &str| Regex::new(p).expect("built-in preprocessor pattern");
        Self {
            skip: SKIP.iter().map(|&p| compile(p)).collect(),
            rules: RULES
                .iter()
                .map(|&(pattern, replacement)| Rule {
                    pattern: compile(pattern),
                    replacement,
                })
                .collect(),
        }
    }

    /// Rewrite one line (without its terminator). `None` means drop it.
    pub fn rewrite_line(&self, line: &str) -> Option<String> {
        if self.skip.iter().any(|re| re.is_match(line)) {
            return None;
        }
        let mut out = line.to_string();
        for rule in &self.rules {
            out = rule
                .pattern
                .replace_all(&out, rule.replacement)
                .into_owned();
        }
        Some(out)
    }

    /// Rewrite every line of `reader` into `writer`. Each kept line is
    /// written back with its own terminator (`\n`, `\r\n` or none at EOF).
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::Stream`] on a read or write failure.
    pub fn process<R: BufRead, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
    ) -> Result<PreprocessStats, PreprocessError> {
        let mut stats = PreprocessStats::default();
        let mut buf = String::new();
        loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                break;
            }
            stats.lines_read += 1;

            let (line, terminator) = split_terminator(&buf);
            match self.rewrite_line(line) {
                Some(out) => {
                    writer.write_all(out.as_bytes())?;
                    writer.write_all(terminator.as_bytes())?;
                    stats.lines_written += 1;
                }
                None => stats.lines_skipped += 1,
            }
        }
        writer.flush()?;
        Ok(stats)
    }

    /// Rewrite the file `input` into `output`.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::Io`] if either file cannot be opened, and
    /// [`PreprocessError::Stream`] on a failure while processing.
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<PreprocessStats, PreprocessError> {
        let source = File::open(input).map_err(|source| PreprocessError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let sink = File::create(output).map_err(|source| PreprocessError::Io {
            path: output.to_path_buf(),
            source,
        })?;

        let stats = self.process(BufReader::new(source), BufWriter::new(sink))?;
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            written = stats.lines_written,
            skipped = stats.lines_skipped,
            "Preprocessed file"
        );
        Ok(stats)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn split_terminator(line: &str) -> (&str, &str) {
    let body = line
        .strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line);
    (body, &line[body.len()..])
}

/// Default output location: `preprocessed_<name>` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{OUTPUT_PREFIX}{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(line: &str) -> Option<String> {
        Preprocessor::new().rewrite_line(line)
    }

    #[test]
    fn test_index_rewrites() {
        assert_eq!(rewrite("grad[1][2]").unwrap(), "grad(1,2)");
        assert_eq!(rewrite("grad_norm[0][1]").unwrap(), "grad_norm(0,1)");
        assert_eq!(rewrite("t1 = x[2][0];").unwrap(), "t1 = x(2,0);");
        assert_eq!(rewrite("t2 = h[1];").unwrap(), "t2 = h(1);");
    }

    #[test]
    fn test_identifier_rewrites() {
        assert_eq!(
            rewrite("t3 = fac_reg * pow(t1, 2);").unwrap(),
            "t3 = this->_fac_reg * Math::pow(t1, 2);"
        );
        assert_eq!(rewrite("t4 = sqrt(t3);").unwrap(), "t4 = Math::sqrt(t3);");
    }

    #[test]
    fn test_literal_rewrites() {
        assert_eq!(rewrite("a = 0.5e1;").unwrap(), "a = DataType(5);");
        assert_eq!(rewrite("b = 0.25e2;").unwrap(), "b = DataType(25);");
        assert_eq!(rewrite("c = 0.125e3;").unwrap(), "c = DataType(125);");
        assert_eq!(rewrite("d = 0.3e2;").unwrap(), "d = DataType(0.3e2);");
    }

    #[test]
    fn test_skips_prompt_and_warnings() {
        assert_eq!(rewrite("> CodeGeneration[C](f);"), None);
        assert_eq!(rewrite("Warning, the function names {grad} are not recognized"), None);
        assert_eq!(rewrite("  > not a prompt").unwrap(), "  > not a prompt");
    }

    #[test]
    fn test_process_counts_lines() {
        let input = "> restart;\nt1 = grad[0][1];\nWarning, x\nt2 = sqrt(t1);\n";
        let mut out = Vec::new();
        let stats = Preprocessor::new()
            .process(input.as_bytes(), &mut out)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "t1 = grad(0,1);\nt2 = Math::sqrt(t1);\n"
        );
        assert_eq!(
            stats,
            PreprocessStats {
                lines_read: 4,
                lines_written: 2,
                lines_skipped: 2,
            }
        );
    }

    #[test]
    fn test_process_keeps_line_terminators() {
        let mut out = Vec::new();
        Preprocessor::new()
            .process("a = h[1];\r\n> prompt\r\nb = 2;".as_bytes(), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a = h(1);\r\nb = 2;");
    }

    #[test]
    fn test_process_file_and_default_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rumpf.c");
        std::fs::write(&input, "x[1][1] = 0.2e1;\n").unwrap();

        let output = default_output_path(&input);
        assert_eq!(output, dir.path().join("preprocessed_rumpf.c"));

        Preprocessor::new().process_file(&input, &output).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "x(1,1) = DataType(2);\n"
        );
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = Preprocessor::new()
            .process_file(&dir.path().join("nope.c"), &dir.path().join("out.c"))
            .unwrap_err();
        assert!(matches!(err, PreprocessError::Io { .. }));
    }
}
