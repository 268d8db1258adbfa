//! Flag selection output types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered list of compiler flags.
///
/// Order carries no meaning to the compiler, but it is kept stable so the
/// generated command lines diff cleanly between configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(Vec<String>);

impl FlagSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every flag in `flags`.
    pub fn extend<I, S>(&mut self, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(flags.into_iter().map(Into::into));
    }

    /// Append one flag.
    pub fn push(&mut self, flag: impl Into<String>) {
        self.0.push(flag.into());
    }

    /// True when `flag` is present verbatim.
    pub fn contains(&self, flag: &str) -> bool {
        self.0.iter().any(|f| f == flag)
    }

    /// Flags in order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of flags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no flag has been added.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Which fallback produced a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// CPU detection failed; tuned for a generic processor.
    GenericTuneFallback,
    /// CPU is not in the table; targeted the build machine's own ISA.
    NativeArchFallback,
}

/// Informational notice emitted alongside a flag selection. Never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Fallback that was taken.
    pub kind: DiagnosticKind,
    /// Human-readable explanation.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
