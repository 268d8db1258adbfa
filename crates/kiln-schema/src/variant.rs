//! Build variants.
//!
//! A build id is a loose list of tags such as `opt-mpi-gcc` or
//! `debug-quadmath`. Only the tags in [`BuildTag`] mean anything to the flag
//! selector; the rest (compiler names, backend names, ...) are ignored and
//! remembered in [`BuildVariant::ignored`] so callers can log them.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A recognized build tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTag {
    /// Unoptimized build with warnings and sanitizers.
    Debug,
    /// Optimized build (`-O3`).
    Opt,
    /// Aggressively optimized build (`-Ofast`).
    Fast,
    /// gcov instrumentation.
    Coverage,
    /// `__float128` support.
    Quadmath,
    /// MPI-enabled build.
    Mpi,
    /// CUDA backend enabled.
    Cuda,
    /// Build intended to run under valgrind.
    Valgrind,
}

impl BuildTag {
    /// All recognized tags.
    pub const ALL: [BuildTag; 8] = [
        Self::Debug,
        Self::Opt,
        Self::Fast,
        Self::Coverage,
        Self::Quadmath,
        Self::Mpi,
        Self::Cuda,
        Self::Valgrind,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Opt => "opt",
            Self::Fast => "fast",
            Self::Coverage => "coverage",
            Self::Quadmath => "quadmath",
            Self::Mpi => "mpi",
            Self::Cuda => "cuda",
            Self::Valgrind => "valgrind",
        }
    }
}

impl fmt::Display for BuildTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == lower)
            .ok_or_else(|| format!("Unknown build tag: {s}"))
    }
}

/// Set of build tags describing one build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVariant {
    tags: BTreeSet<BuildTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ignored: Vec<String>,
}

impl BuildVariant {
    /// Empty variant: no optimization or debug group is selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a variant from already-typed tags.
    pub fn from_tags(tags: impl IntoIterator<Item = BuildTag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
            ignored: Vec::new(),
        }
    }

    /// Parse a build id.
    ///
    /// Tags are separated by `-`, `_`, `,` or whitespace. Unrecognized tags
    /// are not an error.
    ///
    /// ```
    /// use kiln_schema::{BuildTag, BuildVariant};
    ///
    /// let variant = BuildVariant::from_build_id("opt-mpi-gcc");
    /// assert!(variant.contains(BuildTag::Opt));
    /// assert!(variant.contains(BuildTag::Mpi));
    /// assert_eq!(variant.ignored(), ["gcc"]);
    /// ```
    pub fn from_build_id(id: &str) -> Self {
        let mut variant = Self::default();
        for raw in id
            .split(|c: char| c == '-' || c == '_' || c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            match raw.parse::<BuildTag>() {
                Ok(tag) => {
                    variant.tags.insert(tag);
                }
                Err(_) => variant.ignored.push(raw.to_string()),
            }
        }
        variant
    }

    /// Add a tag.
    pub fn with(mut self, tag: BuildTag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// True when `tag` is part of this variant.
    pub fn contains(&self, tag: BuildTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Recognized tags, in canonical order.
    pub fn tags(&self) -> impl Iterator<Item = BuildTag> + '_ {
        self.tags.iter().copied()
    }

    /// Tags that were present in the build id but are not recognized.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// True when no recognized tag is present.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromStr for BuildVariant {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_build_id(s))
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.tags.iter().map(BuildTag::as_str).collect();
        write!(f, "{}", tags.join("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_id_separators() {
        let variant = BuildVariant::from_build_id("debug_quadmath, coverage");
        assert!(variant.contains(BuildTag::Debug));
        assert!(variant.contains(BuildTag::Quadmath));
        assert!(variant.contains(BuildTag::Coverage));
        assert!(!variant.contains(BuildTag::Opt));
        assert!(variant.ignored().is_empty());
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        let variant = BuildVariant::from_build_id("opt-clang-netcdf");
        assert_eq!(variant.tags().collect::<Vec<_>>(), vec![BuildTag::Opt]);
        assert_eq!(variant.ignored(), ["clang", "netcdf"]);
    }

    #[test]
    fn test_tags_are_case_insensitive() {
        let variant = BuildVariant::from_build_id("OPT-Fast");
        assert!(variant.contains(BuildTag::Opt));
        assert!(variant.contains(BuildTag::Fast));
    }

    #[test]
    fn test_empty_build_id() {
        assert!(BuildVariant::from_build_id("").is_empty());
        assert!(BuildVariant::from_build_id("--").is_empty());
    }

    #[test]
    fn test_display_is_canonical() {
        let variant = BuildVariant::from_tags([BuildTag::Mpi, BuildTag::Opt]);
        assert_eq!(variant.to_string(), "opt-mpi");
    }
}
