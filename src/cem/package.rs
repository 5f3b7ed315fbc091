//! Package descriptors and the dependency-graph manifest walk.
//!
//! A package descriptor (`package.json`) may point at the package's Custom
//! Elements Manifest via a `customElements` entry and declares the
//! dependencies whose own descriptors are worth examining. The walk is
//! bounded to exactly one dependency level: scanning a workspace package
//! follows its direct dependencies, and nothing beyond. The bound is a
//! design constant, not a shortcut; it keeps the walk finite without
//! general cycle detection.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use indexmap::IndexMap;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{ManifestLocation, DEPENDENCY_DIR, PACKAGE_DESCRIPTOR_NAME};

/// A parsed package descriptor. Read fresh on every walk, never persisted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    /// Package name.
    #[serde(default)]
    pub name: Option<String>,

    /// Relative path to the package's Custom Elements Manifest.
    #[serde(default)]
    pub custom_elements: Option<String>,

    /// Runtime dependencies, name to version range.
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    /// Development dependencies, name to version range.
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
}

impl PackageDescriptor {
    /// Merges runtime and development dependencies for the transitive walk.
    ///
    /// A devDependency overrides a same-named dependency (last write wins),
    /// matching how the original tooling merged the two maps.
    #[must_use]
    pub fn merged_dependencies(&self) -> IndexMap<String, String> {
        let mut merged = self.dependencies.clone();
        for (name, range) in &self.dev_dependencies {
            merged.insert(name.clone(), range.clone());
        }
        merged
    }
}

/// Provenance: why a manifest location was discovered.
///
/// Several sources may point at the same location; they are deduplicated by
/// `(is_local, package_descriptor, dependency_name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSource {
    /// Workspace folder the discovery originated from.
    pub workspace_folder: Option<PathBuf>,

    /// The descriptor that declared the manifest entry.
    pub package_descriptor: Option<ManifestLocation>,

    /// Name of the package declaring the entry.
    pub dependency_name: Option<String>,

    /// Whether the manifest belongs to the workspace itself rather than an
    /// installed dependency.
    pub is_local: bool,
}

impl ManifestSource {
    /// Whether two sources describe the same discovery origin.
    #[must_use]
    pub fn same_origin(&self, other: &Self) -> bool {
        self.is_local == other.is_local
            && self.package_descriptor == other.package_descriptor
            && self.dependency_name == other.dependency_name
    }
}

/// A manifest location annotated with its provenance.
#[derive(Debug, Clone)]
pub struct LocatedManifest {
    /// Where the manifest file lives.
    pub location: ManifestLocation,
    /// How it was discovered.
    pub source: ManifestSource,
}

/// Options for one walk invocation.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Follow the descriptor's direct dependencies. The nested walks always
    /// run with this unset, which is what bounds the walk to one level.
    pub allow_transitive: bool,

    /// Whether this descriptor is a workspace-local origin.
    pub is_local: bool,

    /// Workspace folder to record on resulting provenance.
    pub workspace_folder: Option<PathBuf>,
}

/// Resolves the manifests reachable from one package descriptor.
///
/// Reads and parses the descriptor at `descriptor`; a read or parse failure
/// is logged and yields an empty list, since an uninstalled dependency is an
/// everyday condition rather than an error. When `allow_transitive` is set,
/// each declared dependency's nested descriptor
/// (`<dir>/node_modules/<name>/package.json`) is resolved with transitive
/// resolution disabled, and each dependency branch fails in isolation.
///
/// The future is boxed because the transitive branch recurses.
pub fn resolve_manifests_from<'a>(
    descriptor: &'a Path,
    options: WalkOptions,
    cancel: &'a CancellationToken,
) -> Pin<Box<dyn Future<Output = Vec<LocatedManifest>> + Send + 'a>> {
    Box::pin(async move {
        let mut located = Vec::new();

        let bytes = match tokio::fs::read(descriptor).await {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(
                    descriptor = %descriptor.display(),
                    %error,
                    "package descriptor not readable"
                );
                return located;
            }
        };

        let parsed: PackageDescriptor = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(
                    descriptor = %descriptor.display(),
                    %error,
                    "package descriptor is not valid JSON"
                );
                return located;
            }
        };

        if let Some(entry) = parsed.custom_elements.as_deref().filter(|e| !e.is_empty()) {
            let location = ManifestLocation::join_relative(descriptor, entry);
            debug!(manifest = %location, descriptor = %descriptor.display(), "resolved manifest entry");
            located.push(LocatedManifest {
                location,
                source: ManifestSource {
                    workspace_folder: options.workspace_folder.clone(),
                    package_descriptor: Some(ManifestLocation::new(descriptor)),
                    dependency_name: parsed.name.clone(),
                    is_local: options.is_local,
                },
            });
        }

        if options.allow_transitive {
            let dir = descriptor.parent().unwrap_or_else(|| Path::new(""));
            for dependency in parsed.merged_dependencies().keys() {
                if cancel.is_cancelled() {
                    debug!(descriptor = %descriptor.display(), "walk cancelled");
                    break;
                }

                let nested = dir
                    .join(DEPENDENCY_DIR)
                    .join(dependency)
                    .join(PACKAGE_DESCRIPTOR_NAME);
                let nested_options = WalkOptions {
                    allow_transitive: false,
                    is_local: false,
                    workspace_folder: options.workspace_folder.clone(),
                };
                let mut nested_located =
                    resolve_manifests_from(&nested, nested_options, cancel).await;
                located.append(&mut nested_located);
            }
        }

        located
    })
}
