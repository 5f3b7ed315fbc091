//! Custom Elements Manifest (CEM) discovery and query engine.
//!
//! A CEM file (`custom-elements.json`) describes the web components a package
//! ships and their public API surface. This module locates those files in a
//! workspace and its installed dependencies, and serves component metadata
//! from cached, invalidation-aware indexes:
//!
//! - [`package`] — package descriptor parsing and the dependency-graph walk
//! - [`locator`] — workspace-wide manifest location provider
//! - [`reader`] — per-manifest parsing, indexing and caching
//! - [`provider`] — aggregation across all located manifests
//! - [`watcher`] — per-file change subscriptions
//! - [`manifest`] — the CEM data model and component extraction

pub mod locator;
pub mod manifest;
pub mod package;
pub mod provider;
pub mod reader;
pub mod watcher;

pub use locator::{LocateOptions, ManifestLocationProvider};
pub use manifest::{Component, ComponentDetail};
pub use package::ManifestSource;
pub use provider::ManifestsProvider;
pub use reader::MatchMode;

use std::fmt;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

/// File name of a package descriptor.
pub const PACKAGE_DESCRIPTOR_NAME: &str = "package.json";

/// File name of a Custom Elements Manifest.
pub const MANIFEST_FILE_NAME: &str = "custom-elements.json";

/// Directory where a package's dependencies are installed.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// The location of a manifest file, normalised to a canonical string form.
///
/// Manifest sets are deduplicated by string equality of locations, so two
/// paths that spell the same file differently (`a/b/../c` vs `a/c`) must
/// compare equal. Normalisation is lexical: `.` and `..` segments are
/// resolved without touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManifestLocation(PathBuf);

impl ManifestLocation {
    /// Creates a location from a path, normalising it lexically.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(normalize_path(path.as_ref()))
    }

    /// Resolves a relative entry against the directory containing `base_file`.
    ///
    /// Used to resolve a descriptor's `customElements` entry, which is
    /// relative to the descriptor's own directory and may contain `..`
    /// segments.
    #[must_use]
    pub fn join_relative(base_file: &Path, relative: &str) -> Self {
        let dir = base_file.parent().unwrap_or_else(|| Path::new(""));
        Self::new(dir.join(relative))
    }

    /// Returns the normalised path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ManifestLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl Serialize for ManifestLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Lexically resolves `.` and `..` components of a path.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            PathComponent::CurDir => {}
            PathComponent::ParentDir => {
                // Only pop a real directory name; keep leading `..` on
                // relative paths and never pop past a root.
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(PathComponent::Normal(_))
                ) && normalized.pop();
                if !popped
                    && !matches!(
                        normalized.components().next_back(),
                        Some(PathComponent::RootDir | PathComponent::Prefix(_))
                    )
                {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| u64::try_from(elapsed.as_millis()).ok())
        .unwrap_or(0)
}
