//! Third-party source package descriptors.
//!
//! A descriptor is static metadata: what the package is called, where its
//! archive lives, which directory it unpacks into, and which CMake flag the
//! build driver passes once it is present. Three packages are built in;
//! more can be declared in TOML:
//!
//! ```toml
//! names = ["zoltan"]
//! dirname = "zoltan"
//! filename = "zoltan-3.83.tar.gz"
//! url = "https://example.org/zoltan-3.83.tar.gz"
//! cmake_flags = "-DFEAT_HAVE_ZOLTAN:BOOL=ON"
//! sha256 = "..."
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Reporter;
use crate::io::download::{DownloadError, DownloadRequest, compute_file_hash};
use crate::io::extract::{self, ExtractError};

/// Errors that can occur when loading a package descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// An I/O error occurred while reading a descriptor file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized into a descriptor.
    #[error("Parse error in {path}: {source}")]
    Parse {
        /// File that failed to parse (`<inline>` for strings).
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A descriptor has no name to be looked up by.
    #[error("Descriptor {0} declares no names")]
    NoNames(String),
}

/// Errors from [`PackageDescriptor::fetch`].
#[derive(Error, Debug)]
pub enum FetchError {
    /// Downloading the archive failed.
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    /// Unpacking the archive failed.
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Filesystem error outside download/extract.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Static description of one fetchable dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Names the package may be requested by; the first is canonical.
    pub names: Vec<String>,
    /// Directory (relative to the trunk) the archive unpacks into.
    pub dirname: String,
    /// Archive file name.
    pub filename: String,
    /// Download URL of the archive.
    pub url: String,
    /// Build-system flag that enables the dependency.
    pub cmake_flags: String,
    /// Expected SHA-256 of the archive, if pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl PackageDescriptor {
    /// Canonical name.
    pub fn name(&self) -> &str {
        self.names.first().map_or(self.dirname.as_str(), String::as_str)
    }

    /// True if `name` is one of this package's names (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Directory the package unpacks into.
    pub fn target_dir(&self, trunk: &Path) -> PathBuf {
        trunk.join(&self.dirname)
    }

    /// Location of the downloaded archive.
    pub fn archive_path(&self, trunk: &Path) -> PathBuf {
        trunk.join(&self.filename)
    }

    /// True once the target directory exists.
    pub fn is_unpacked(&self, trunk: &Path) -> bool {
        self.target_dir(trunk).is_dir()
    }

    /// Parse a descriptor from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Parse`] if the TOML is invalid and
    /// [`DescriptorError::NoNames`] if `names` is empty.
    pub fn parse(content: &str) -> Result<Self, DescriptorError> {
        Self::parse_named(content, "<inline>")
    }

    /// Parse a descriptor from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Io`] if the file cannot be read, otherwise
    /// as [`PackageDescriptor::parse`].
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = fs::read_to_string(path)?;
        Self::parse_named(&content, &path.display().to_string())
    }

    fn parse_named(content: &str, origin: &str) -> Result<Self, DescriptorError> {
        let descriptor: Self = toml::from_str(content).map_err(|source| DescriptorError::Parse {
            path: origin.to_string(),
            source,
        })?;
        if descriptor.names.is_empty() {
            return Err(DescriptorError::NoNames(origin.to_string()));
        }
        Ok(descriptor)
    }

    /// Serialize this descriptor to a pretty-printed TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `toml::ser::Error` if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Make the package available under `trunk`.
    ///
    /// Does nothing if the target directory already exists. Otherwise the
    /// archive is downloaded (unless already present), checked against
    /// `sha256` when pinned, and unpacked into [`target_dir`](Self::target_dir).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the download, hash check or extraction fails.
    pub async fn fetch<R: Reporter + ?Sized>(
        &self,
        client: &Client,
        trunk: &Path,
        reporter: &R,
    ) -> Result<PathBuf, FetchError> {
        let target = self.target_dir(trunk);
        if target.is_dir() {
            tracing::debug!(package = self.name(), path = %target.display(), "Already unpacked");
            reporter.done(self.name(), "already present");
            return Ok(target);
        }

        match self.download_and_unpack(client, trunk, &target, reporter).await {
            Ok(files) => {
                tracing::info!(package = self.name(), files, path = %target.display(), "Unpacked");
                reporter.done(self.name(), &format!("{files} files"));
                Ok(target)
            }
            Err(e) => {
                reporter.failed(self.name(), &e.to_string());
                Err(e)
            }
        }
    }

    /// Check an archive already on disk against the pinned hash, removing
    /// it on mismatch. Unpinned archives are always accepted.
    fn archive_matches(&self, archive: &Path) -> Result<bool, FetchError> {
        let Some(expected) = &self.sha256 else {
            return Ok(true);
        };
        let actual = compute_file_hash(archive)?;
        if expected.eq_ignore_ascii_case(&actual) {
            return Ok(true);
        }
        tracing::warn!(
            package = self.name(),
            expected = %expected,
            actual = %actual,
            "Existing archive does not match pinned hash, downloading again"
        );
        fs::remove_file(archive)?;
        Ok(false)
    }

    async fn download_and_unpack<R: Reporter + ?Sized>(
        &self,
        client: &Client,
        trunk: &Path,
        target: &Path,
        reporter: &R,
    ) -> Result<usize, FetchError> {
        let archive = self.archive_path(trunk);
        if archive.is_file() && self.archive_matches(&archive)? {
            tracing::info!(package = self.name(), archive = %archive.display(), "Reusing downloaded archive");
        } else {
            DownloadRequest::new(client, self.name(), &self.url, &archive)
                .with_expected_hash(self.sha256.as_deref())
                .execute(reporter)
                .await?;
        }

        // Unpack into a scratch directory first so a failed extraction never
        // leaves a half-populated target that `is_unpacked` would accept.
        let staging = trunk.join(format!(".{}.partial", self.dirname));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        let files = match extract::extract_auto(&archive, &staging) {
            Ok(files) => files,
            Err(e) => {
                fs::remove_dir_all(&staging).ok();
                return Err(e.into());
            }
        };
        reporter.extracting(self.name(), files.len());
        fs::rename(&staging, target)?;
        Ok(files.len())
    }
}

/// The packages known without any configuration.
pub fn builtin_packages() -> Vec<PackageDescriptor> {
    vec![
        PackageDescriptor {
            names: vec!["fparser".into()],
            dirname: "fparser".into(),
            filename: "fparser4.5.2.zip".into(),
            url: "http://warp.povusers.org/FunctionParser/fparser4.5.2.zip".into(),
            cmake_flags: "-DFEAT_HAVE_FPARSER:BOOL=ON".into(),
            sha256: None,
        },
        PackageDescriptor {
            names: vec!["half".into()],
            dirname: "half".into(),
            filename: "half-2.1.0.zip".into(),
            url: "http://downloads.sourceforge.net/project/half/half/2.1.0/half-2.1.0.zip?r=http%3A%2F%2Fhalf.sourceforge.net%2Findex.html&ts=1581415216&use_mirror=netcologne".into(),
            cmake_flags: "-DFEAT_HAVE_HALFMATH:BOOL=ON".into(),
            sha256: None,
        },
        PackageDescriptor {
            names: vec!["triangle".into()],
            dirname: "triangle".into(),
            filename: "triangle.zip".into(),
            url: "http://www.netlib.org/voronoi/triangle.zip".into(),
            cmake_flags: "-DFEAT_HAVE_TRIANGLE:BOOL=ON".into(),
            sha256: None,
        },
    ]
}

/// Lookup table of descriptors keyed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, PackageDescriptor>,
}

impl PackageRegistry {
    /// Registry holding only the built-in packages.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for pkg in builtin_packages() {
            registry.insert(pkg);
        }
        registry
    }

    /// Add or replace a descriptor.
    pub fn insert(&mut self, pkg: PackageDescriptor) {
        if let Some(old) = self.packages.insert(pkg.name().to_string(), pkg) {
            tracing::debug!(package = old.name(), "Descriptor overridden");
        }
    }

    /// Load every `*.toml` file in `dir`, in file name order.
    ///
    /// # Errors
    ///
    /// Returns the first [`DescriptorError`] encountered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, DescriptorError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        for path in &paths {
            self.insert(PackageDescriptor::from_file(path)?);
        }
        tracing::debug!(dir = %dir.display(), count = paths.len(), "Loaded package descriptors");
        Ok(paths.len())
    }

    /// Find a package by any of its names.
    pub fn find(&self, name: &str) -> Option<&PackageDescriptor> {
        self.packages.values().find(|pkg| pkg.matches(name))
    }

    /// All descriptors, sorted by canonical name.
    pub fn iter(&self) -> impl Iterator<Item = &PackageDescriptor> {
        self.packages.values()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// True when no descriptor is registered.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Space-separated enabling flags for the requested packages.
    ///
    /// Returns the names that matched nothing as the error value.
    ///
    /// # Errors
    ///
    /// Returns the list of unknown names if any requested name is unknown.
    pub fn cmake_flags<S: AsRef<str>>(&self, names: &[S]) -> Result<String, Vec<String>> {
        let mut flags = Vec::new();
        let mut unknown = Vec::new();
        for name in names {
            match self.find(name.as_ref()) {
                Some(pkg) => flags.push(pkg.cmake_flags.trim()),
                None => unknown.push(name.as_ref().to_string()),
            }
        }
        if unknown.is_empty() {
            Ok(flags.join(" "))
        } else {
            Err(unknown)
        }
    }
}
