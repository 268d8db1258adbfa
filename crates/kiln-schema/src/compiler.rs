//! Compiler version model.
//!
//! A GNU-compatible compiler reports its version through predefined macros
//! (`__GNUC__`, `__GNUC_MINOR__`, `__GNUC_PATCHLEVEL__`). The macro dump is
//! obtained by running the compiler with `-dM -E -`; parsing that dump is the
//! only way a [`CompilerVersion`] enters the system apart from an explicit
//! `X.Y.Z` override.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oldest `(major, minor)` pair the flag table supports.
pub const MIN_SUPPORTED: (u32, u32) = (4, 8);

/// Errors produced while reading a compiler version.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroDumpError {
    /// A required version macro is not defined in the dump.
    #[error("Macro {0} not found in compiler output")]
    MissingMacro(&'static str),

    /// A version macro (or version string component) is not a number.
    #[error("Invalid version component for {name}: '{value}'")]
    InvalidComponent {
        /// Macro or component name.
        name: &'static str,
        /// Raw value that failed to parse.
        value: String,
    },
}

/// `major.minor.patch` version of a GNU-compatible compiler.
///
/// Ordering is lexicographic over `(major, minor, patch)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CompilerVersion {
    /// Major version (`__GNUC__`).
    pub major: u32,
    /// Minor version (`__GNUC_MINOR__`).
    pub minor: u32,
    /// Patch level (`__GNUC_PATCHLEVEL__`).
    pub patch: u32,
}

impl CompilerVersion {
    /// Create a version from its three components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True when `(major, minor)` is at least the given pair.
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// True when the flag table knows how to drive this compiler (4.8 or newer).
    pub fn is_supported(&self) -> bool {
        self.at_least(MIN_SUPPORTED.0, MIN_SUPPORTED.1)
    }

    /// Parse the output of `cxx -dM -E -`.
    ///
    /// Each line has the form `#define NAME VALUE...`; lines that do not
    /// split into at least a directive and a name are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MacroDumpError::MissingMacro`] if one of the three version
    /// macros is absent, or [`MacroDumpError::InvalidComponent`] if its value
    /// is not an unsigned integer.
    pub fn from_macro_dump(dump: &str) -> Result<Self, MacroDumpError> {
        let macros: HashMap<&str, String> = dump
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let _directive = parts.next()?;
                let name = parts.next()?;
                Some((name, parts.collect::<Vec<_>>().join(" ")))
            })
            .collect();

        let component = |name: &'static str| -> Result<u32, MacroDumpError> {
            let value = macros
                .get(name)
                .ok_or(MacroDumpError::MissingMacro(name))?;
            value
                .parse::<u32>()
                .map_err(|_| MacroDumpError::InvalidComponent {
                    name,
                    value: value.clone(),
                })
        };

        Ok(Self {
            major: component("__GNUC__")?,
            minor: component("__GNUC_MINOR__")?,
            patch: component("__GNUC_PATCHLEVEL__")?,
        })
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for CompilerVersion {
    type Err = MacroDumpError;

    /// Parse `X`, `X.Y` or `X.Y.Z`; missing components default to zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const NAMES: [&str; 3] = ["major", "minor", "patch"];

        let mut parts = [0u32; 3];
        let pieces: Vec<&str> = s.trim().split('.').collect();
        if pieces.len() > 3 {
            return Err(MacroDumpError::InvalidComponent {
                name: "patch",
                value: s.to_string(),
            });
        }
        for (i, piece) in pieces.iter().enumerate() {
            parts[i] = piece
                .parse()
                .map_err(|_| MacroDumpError::InvalidComponent {
                    name: NAMES[i],
                    value: (*piece).to_string(),
                })?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GCC_9_DUMP: &str = "\
#define __SSP_STRONG__ 3
#define __DBL_MIN_EXP__ (-1021)
#define __GNUC_PATCHLEVEL__ 0
#define __GNUC__ 9
#define __VERSION__ \"9.3.0\"
#define __GNUC_MINOR__ 3
#define __x86_64__ 1
";

    #[test]
    fn test_parse_macro_dump() {
        let version = CompilerVersion::from_macro_dump(GCC_9_DUMP).unwrap();
        assert_eq!(version, CompilerVersion::new(9, 3, 0));
    }

    #[test]
    fn test_macro_dump_missing_major() {
        let dump = "#define __GNUC_MINOR__ 3\n#define __GNUC_PATCHLEVEL__ 0\n";
        assert_eq!(
            CompilerVersion::from_macro_dump(dump),
            Err(MacroDumpError::MissingMacro("__GNUC__"))
        );
    }

    #[test]
    fn test_macro_dump_garbage_value() {
        let dump = "#define __GNUC__ nine\n#define __GNUC_MINOR__ 3\n#define __GNUC_PATCHLEVEL__ 0\n";
        assert!(matches!(
            CompilerVersion::from_macro_dump(dump),
            Err(MacroDumpError::InvalidComponent { name: "__GNUC__", .. })
        ));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "5.4.0".parse::<CompilerVersion>().unwrap(),
            CompilerVersion::new(5, 4, 0)
        );
        assert_eq!(
            "4.9".parse::<CompilerVersion>().unwrap(),
            CompilerVersion::new(4, 9, 0)
        );
        assert!("4.x".parse::<CompilerVersion>().is_err());
        assert!("1.2.3.4".parse::<CompilerVersion>().is_err());
    }

    #[test]
    fn test_supported_boundary() {
        assert!(!CompilerVersion::new(3, 9, 9).is_supported());
        assert!(!CompilerVersion::new(4, 7, 4).is_supported());
        assert!(CompilerVersion::new(4, 8, 0).is_supported());
        assert!(CompilerVersion::new(5, 0, 0).is_supported());
        assert!(CompilerVersion::new(4, 9, 1).at_least(4, 9));
        assert!(!CompilerVersion::new(4, 8, 5).at_least(4, 9));
    }
}
