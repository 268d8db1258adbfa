//! Compiler flag selection for GNU C++ compilers.
//!
//! [`select_flags`] is a pure function of the compiler version, target CPU,
//! build variant and host OS. It appends independent flag groups in a fixed
//! order:
//!
//! | Group | Condition |
//! |---|---|
//! | `-pipe -std=c++11 -ggdb` | always |
//! | `-fdiagnostics-color=always` | gcc >= 4.9 |
//! | coverage instrumentation | `coverage` tag |
//! | `-fext-numeric-literals` | `quadmath` tag |
//! | warnings, sanitizers, `-O0` | `debug` tag |
//! | `-O3` / `-Ofast` + `-march` table | `opt` / `fast` tag, when not `debug` |
//!
//! Fallbacks taken while looking up the CPU are reported as [`Diagnostic`]s
//! in the returned [`FlagSelection`]; nothing is printed here.

use kiln_schema::{
    BuildTag, BuildVariant, CompilerVersion, CpuId, Diagnostic, DiagnosticKind, FlagSet, HostOs,
};
use serde::Serialize;
use thiserror::Error;

/// The compiler is older than gcc 4.8.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "GNU compiler version {version} is not supported (need 4.8 or newer); update the compiler or choose another one"
)]
pub struct UnsupportedCompiler {
    /// Version that was rejected.
    pub version: CompilerVersion,
}

/// Result of a flag selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagSelection {
    /// Flags to pass to the compiler, in order.
    pub flags: FlagSet,
    /// Fallback notices; informational only.
    pub diagnostics: Vec<Diagnostic>,
}

const BASELINE: &[&str] = &["-pipe", "-std=c++11", "-ggdb"];

const COVERAGE: &[&str] = &["-fprofile-arcs", "-ftest-coverage"];

const DEBUG_WARNINGS: &[&str] = &[
    "-O0",
    "-Wall",
    "-Wextra",
    "-Wundef",
    "-Wshadow",
    "-Woverloaded-virtual",
    "-Wuninitialized",
    "-Wvla",
    "-fdiagnostics-show-option",
    "-fno-omit-frame-pointer",
];

// The sanitizer runtimes need these at link time.
const SANITIZER_LIBS: &[&str] = &["-lpthread", "-ldl"];

const GCC5_SANITIZERS: &[&str] = &[
    "-fsanitize=float-divide-by-zero",
    "-fsanitize=float-cast-overflow",
    "-fsanitize=bounds",
    "-fsanitize=alignment",
    "-fsanitize=object-size",
    "-fsanitize=vptr",
];

const GCC5_WARNINGS: &[&str] = &[
    "-Wswitch-bool",
    "-Wsizeof-array-argument",
    "-Wbool-compare",
    "-Wsuggest-final-types",
    "-Wsuggest-final-methods",
];

// The Darwin assembler rejects AVX encodings, so recent Intel parts drop to SSE4.
const DARWIN_SSE4: &[&str] = &["-march=corei7", "-msse4", "-msse4.1", "-msse4.2", "-m64"];

/// Select the compiler flags for one build configuration.
///
/// # Errors
///
/// Returns [`UnsupportedCompiler`] for gcc older than 4.8. No partial
/// result is produced in that case.
///
/// # Example
///
/// ```
/// use kiln_core::select_flags;
/// use kiln_schema::{BuildVariant, CompilerVersion, CpuId, HostOs};
///
/// let selection = select_flags(
///     CompilerVersion::new(5, 4, 0),
///     &CpuId::Haswell,
///     &BuildVariant::from_build_id("opt"),
///     HostOs::Linux,
/// )
/// .unwrap();
/// assert!(selection.flags.contains("-march=core-avx2"));
/// ```
pub fn select_flags(
    version: CompilerVersion,
    cpu: &CpuId,
    variant: &BuildVariant,
    host: HostOs,
) -> Result<FlagSelection, UnsupportedCompiler> {
    if !version.is_supported() {
        return Err(UnsupportedCompiler { version });
    }

    if !variant.ignored().is_empty() {
        tracing::debug!(ignored = ?variant.ignored(), "Ignoring unrecognized build tags");
    }

    let mut flags = FlagSet::new();
    let mut diagnostics = Vec::new();

    flags.extend(BASELINE.iter().copied());

    if version.at_least(4, 9) {
        flags.push("-fdiagnostics-color=always");
    }

    if variant.contains(BuildTag::Coverage) {
        flags.extend(COVERAGE.iter().copied());
    }

    // g++ only accepts the `q` suffix on __float128 literals under
    // -std=c++11 when extended literals are switched back on.
    if variant.contains(BuildTag::Quadmath) {
        flags.push("-fext-numeric-literals");
    }

    if variant.contains(BuildTag::Debug) {
        debug_flags(version, host, &mut flags);
    } else if variant.contains(BuildTag::Opt) || variant.contains(BuildTag::Fast) {
        flags.push("-funsafe-loop-optimizations");
        if version.major >= 5 {
            flags.push("-malign-data=cacheline");
        }
        if variant.contains(BuildTag::Opt) {
            flags.push("-O3");
        } else {
            flags.push("-Ofast");
        }

        match cpu_flags(cpu, host) {
            CpuFlags::Table(group) => flags.extend(group.iter().copied()),
            CpuFlags::GenericTune => {
                flags.push("-mtune=generic");
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::GenericTuneFallback,
                    "cpu type not detected, using -mtune=generic instead",
                ));
            }
            CpuFlags::Native => {
                flags.push("-march=native");
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::NativeArchFallback,
                    format!("cpu type '{cpu}' is not supported by the gcc flag table, using -march=native instead"),
                ));
            }
        }
    }

    Ok(FlagSelection { flags, diagnostics })
}

fn debug_flags(version: CompilerVersion, host: HostOs, flags: &mut FlagSet) {
    flags.extend(DEBUG_WARNINGS.iter().copied());

    // libstdc++ debug containers are unusable with the Darwin toolchain.
    if !host.is_darwin() {
        flags.push("-D_GLIBCXX_DEBUG");
    }

    flags.extend(SANITIZER_LIBS.iter().copied());

    if version.at_least(4, 9) {
        flags.push("-fsanitize=undefined");
    }
    if version.major >= 5 {
        flags.extend(GCC5_SANITIZERS.iter().copied());
        flags.extend(GCC5_WARNINGS.iter().copied());
    }
}

/// Outcome of the CPU table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuFlags {
    /// The CPU has a dedicated flag group.
    Table(&'static [&'static str]),
    /// Detection failed: tune for a generic processor.
    GenericTune,
    /// The CPU is not in the table: target the build machine.
    Native,
}

/// Look up the architecture flags for `cpu` on `host`.
pub fn cpu_flags(cpu: &CpuId, host: HostOs) -> CpuFlags {
    let darwin = host.is_darwin();
    let group: &'static [&'static str] = match cpu {
        CpuId::Unknown => return CpuFlags::GenericTune,
        CpuId::Unsupported(_) => return CpuFlags::Native,

        // Intel
        CpuId::I486 => &["-march=i486", "-m32"],
        CpuId::Pentium => &["-march=pentium", "-m32"],
        CpuId::PentiumPro => &["-march=pentiumpro", "-m32"],
        CpuId::Pentium2 => &["-march=pentium2", "-m32"],
        CpuId::Pentium3 => &["-march=pentium3", "-m32"],
        CpuId::PentiumM => &["-march=pentium-m", "-m32"],
        CpuId::Pentium4M => &["-march=pentium4m", "-m32"],
        CpuId::CoreSolo => &["-march=prescott", "-msse2"],
        CpuId::CoreDuo => &["-march=core2", "-m64"],
        CpuId::Penryn => &["-march=core2", "-msse4.1", "-m64"],
        CpuId::Nehalem => &["-march=corei7", "-m64"],
        CpuId::Westmere => &["-march=corei7", "-msse4.2", "-m64"],
        CpuId::SandyBridge | CpuId::IvyBridge if darwin => DARWIN_SSE4,
        CpuId::SandyBridge | CpuId::IvyBridge => &["-march=corei7-avx", "-mavx", "-m64"],
        CpuId::Haswell if darwin => DARWIN_SSE4,
        CpuId::Haswell => &["-march=core-avx2", "-mavx2", "-m64"],
        CpuId::Itanium => &["-march=itanium"],
        CpuId::Pentium4 => &["-march=pentium4m", "-m64"],
        CpuId::Nocona => &["-march=nocona", "-m64"],
        CpuId::Itanium2 => &["-march=itanium2"],

        // AMD
        CpuId::Amd486 | CpuId::K5 => &["-m32"],
        CpuId::K6 => &["-m32", "-march=k6"],
        CpuId::Athlon => &["-m32", "-march=athlon"],
        CpuId::AthlonXp => &["-m32", "-march=athlon-xp"],
        CpuId::Opteron | CpuId::Athlon64 => &["-m64", "-march=k8"],
        CpuId::OpteronX2 | CpuId::TurionX2 => &["-m64", "-march=k8-sse3"],
        CpuId::Barcelona | CpuId::Shanghai | CpuId::Istanbul | CpuId::MagnyCours => {
            &["-m64", "-march=barcelona"]
        }

        // ARM
        CpuId::CortexA15 => &[
            "-ffast-math",
            "-funsafe-math-optimizations",
            "-mcpu=cortex-a15",
            "-mfpu=neon-vfpv4",
            "-mfloat-abi=hard",
            "-mthumb",
        ],
    };
    CpuFlags::Table(group)
}
