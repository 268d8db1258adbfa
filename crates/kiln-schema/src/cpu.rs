//! Target CPU identifiers.
//!
//! The external configure step detects the host processor and hands us a
//! short lowercase tag (`sandybridge`, `cortexa15`, ...). Tags we know map to
//! a [`CpuId`] variant; `unknown` means detection failed; anything else is
//! kept verbatim as [`CpuId::Unsupported`] so the caller can report it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Processor vendor family, used for grouping in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuVendor {
    /// Intel x86 and Itanium parts.
    Intel,
    /// AMD x86 parts.
    Amd,
    /// ARM cores.
    Arm,
}

impl fmt::Display for CpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Intel => "intel",
            Self::Amd => "amd",
            Self::Arm => "arm",
        })
    }
}

/// Target CPU microarchitecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CpuId {
    /// Detection ran but could not identify the processor.
    #[default]
    Unknown,
    /// A tag that is not in the table, kept as given.
    Unsupported(String),

    // Intel
    /// Intel 486.
    I486,
    /// Intel Pentium.
    Pentium,
    /// Intel Pentium Pro.
    PentiumPro,
    /// Intel Pentium II.
    Pentium2,
    /// Intel Pentium III.
    Pentium3,
    /// Intel Pentium M.
    PentiumM,
    /// Intel mobile Pentium 4.
    Pentium4M,
    /// Intel Core Solo.
    CoreSolo,
    /// Intel Core Duo / Core 2.
    CoreDuo,
    /// Intel Penryn.
    Penryn,
    /// Intel Nehalem.
    Nehalem,
    /// Intel Westmere.
    Westmere,
    /// Intel Sandy Bridge.
    SandyBridge,
    /// Intel Ivy Bridge.
    IvyBridge,
    /// Intel Haswell.
    Haswell,
    /// Intel Itanium.
    Itanium,
    /// Intel Pentium 4 (64-bit capable).
    Pentium4,
    /// Intel Nocona.
    Nocona,
    /// Intel Itanium 2.
    Itanium2,

    // AMD
    /// AMD 486.
    Amd486,
    /// AMD K5.
    K5,
    /// AMD K6.
    K6,
    /// AMD Athlon.
    Athlon,
    /// AMD Athlon XP.
    AthlonXp,
    /// AMD Opteron.
    Opteron,
    /// AMD Athlon 64.
    Athlon64,
    /// AMD dual-core Opteron.
    OpteronX2,
    /// AMD Turion X2.
    TurionX2,
    /// AMD Barcelona.
    Barcelona,
    /// AMD Shanghai.
    Shanghai,
    /// AMD Istanbul.
    Istanbul,
    /// AMD Magny-Cours.
    MagnyCours,

    // ARM
    /// ARM Cortex-A15.
    CortexA15,
}

impl CpuId {
    /// Every recognized CPU, in table order.
    pub const KNOWN: [CpuId; 33] = [
        Self::I486,
        Self::Pentium,
        Self::PentiumPro,
        Self::Pentium2,
        Self::Pentium3,
        Self::PentiumM,
        Self::Pentium4M,
        Self::CoreSolo,
        Self::CoreDuo,
        Self::Penryn,
        Self::Nehalem,
        Self::Westmere,
        Self::SandyBridge,
        Self::IvyBridge,
        Self::Haswell,
        Self::Itanium,
        Self::Pentium4,
        Self::Nocona,
        Self::Itanium2,
        Self::Amd486,
        Self::K5,
        Self::K6,
        Self::Athlon,
        Self::AthlonXp,
        Self::Opteron,
        Self::Athlon64,
        Self::OpteronX2,
        Self::TurionX2,
        Self::Barcelona,
        Self::Shanghai,
        Self::Istanbul,
        Self::MagnyCours,
        Self::CortexA15,
    ];

    /// Parse a detected tag. Never fails: see [`CpuId::Unsupported`].
    pub fn parse(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase();
        if normalized.is_empty() || normalized == "unknown" {
            return Self::Unknown;
        }
        Self::KNOWN
            .iter()
            .find(|cpu| cpu.as_str() == normalized)
            .cloned()
            .unwrap_or_else(|| Self::Unsupported(tag.to_string()))
    }

    /// Canonical tag for this CPU.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "unknown",
            Self::Unsupported(tag) => tag,
            Self::I486 => "i486",
            Self::Pentium => "pentium",
            Self::PentiumPro => "pentiumpro",
            Self::Pentium2 => "pentium2",
            Self::Pentium3 => "pentium3",
            Self::PentiumM => "pentiumm",
            Self::Pentium4M => "pentium4m",
            Self::CoreSolo => "coresolo",
            Self::CoreDuo => "coreduo",
            Self::Penryn => "penryn",
            Self::Nehalem => "nehalem",
            Self::Westmere => "westmere",
            Self::SandyBridge => "sandybridge",
            Self::IvyBridge => "ivybridge",
            Self::Haswell => "haswell",
            Self::Itanium => "itanium",
            Self::Pentium4 => "pentium4",
            Self::Nocona => "nocona",
            Self::Itanium2 => "itanium2",
            Self::Amd486 => "amd486",
            Self::K5 => "k5",
            Self::K6 => "k6",
            Self::Athlon => "athlon",
            Self::AthlonXp => "athlonxp",
            Self::Opteron => "opteron",
            Self::Athlon64 => "athlon64",
            Self::OpteronX2 => "opteronx2",
            Self::TurionX2 => "turionx2",
            Self::Barcelona => "barcelona",
            Self::Shanghai => "shanghai",
            Self::Istanbul => "istanbul",
            Self::MagnyCours => "magnycours",
            Self::CortexA15 => "cortexa15",
        }
    }

    /// Vendor of a recognized CPU; `None` for `Unknown` and `Unsupported`.
    pub fn vendor(&self) -> Option<CpuVendor> {
        match self {
            Self::Unknown | Self::Unsupported(_) => None,
            Self::I486
            | Self::Pentium
            | Self::PentiumPro
            | Self::Pentium2
            | Self::Pentium3
            | Self::PentiumM
            | Self::Pentium4M
            | Self::CoreSolo
            | Self::CoreDuo
            | Self::Penryn
            | Self::Nehalem
            | Self::Westmere
            | Self::SandyBridge
            | Self::IvyBridge
            | Self::Haswell
            | Self::Itanium
            | Self::Pentium4
            | Self::Nocona
            | Self::Itanium2 => Some(CpuVendor::Intel),
            Self::Amd486
            | Self::K5
            | Self::K6
            | Self::Athlon
            | Self::AthlonXp
            | Self::Opteron
            | Self::Athlon64
            | Self::OpteronX2
            | Self::TurionX2
            | Self::Barcelona
            | Self::Shanghai
            | Self::Istanbul
            | Self::MagnyCours => Some(CpuVendor::Amd),
            Self::CortexA15 => Some(CpuVendor::Arm),
        }
    }

    /// True for every variant except `Unknown` and `Unsupported`.
    pub fn is_known(&self) -> bool {
        self.vendor().is_some()
    }
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CpuId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for CpuId {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<CpuId> for String {
    fn from(cpu: CpuId) -> Self {
        cpu.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known() {
        assert_eq!(CpuId::parse("sandybridge"), CpuId::SandyBridge);
        assert_eq!(CpuId::parse("CortexA15"), CpuId::CortexA15);
        assert_eq!(CpuId::parse(" athlonxp "), CpuId::AthlonXp);
    }

    #[test]
    fn test_parse_unknown_and_unsupported() {
        assert_eq!(CpuId::parse("unknown"), CpuId::Unknown);
        assert_eq!(CpuId::parse(""), CpuId::Unknown);
        assert_eq!(
            CpuId::parse("zen4"),
            CpuId::Unsupported("zen4".to_string())
        );
        assert!(!CpuId::parse("zen4").is_known());
    }

    #[test]
    fn test_unsupported_keeps_tag_verbatim() {
        assert_eq!(
            CpuId::parse(" Zen4 "),
            CpuId::Unsupported(" Zen4 ".to_string())
        );
        assert_eq!(CpuId::parse("Zen4").to_string(), "Zen4");
    }

    #[test]
    fn test_known_tags_round_trip() {
        for cpu in &CpuId::KNOWN {
            assert_eq!(&CpuId::parse(cpu.as_str()), cpu);
            assert!(cpu.is_known());
        }
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&CpuId::Haswell).unwrap();
        assert_eq!(json, "\"haswell\"");
        let back: CpuId = serde_json::from_str("\"power9\"").unwrap();
        assert_eq!(back, CpuId::Unsupported("power9".to_string()));
    }
}
