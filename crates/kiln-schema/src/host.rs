//! Host operating system detection.

/// Operating system the build runs on.
///
/// A few flags are host-sensitive: the libstdc++ debug mode is broken on
/// Darwin, and the AVX `-march` values are rejected by the Darwin assembler.
///
/// # Example
///
/// ```
/// use kiln_schema::HostOs;
///
/// let host: HostOs = "macos".parse().unwrap();
/// assert_eq!(host, HostOs::Darwin);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    /// Linux and other glibc-style Unix hosts.
    #[default]
    Linux,
    /// Apple Darwin (macOS).
    Darwin,
    /// Microsoft Windows.
    Windows,
    /// Anything else; treated like a non-Darwin host.
    Other,
}

impl HostOs {
    /// Get the host this binary was compiled for
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Self::Linux,
            "macos" => Self::Darwin,
            "windows" => Self::Windows,
            _ => Self::Other,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
            Self::Other => "other",
        }
    }

    /// True for Darwin hosts.
    pub fn is_darwin(&self) -> bool {
        matches!(self, Self::Darwin)
    }
}

impl std::fmt::Display for HostOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HostOs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" | "osx" => Ok(Self::Darwin),
            "windows" | "win32" => Ok(Self::Windows),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown host OS: {s}")),
        }
    }
}
