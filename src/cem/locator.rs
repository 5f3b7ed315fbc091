//! Workspace-wide manifest location provider.
//!
//! Scans the workspace for package descriptors (excluding installed
//! dependencies), fans the dependency walk out over each of them, and falls
//! back to a raw file scan for `custom-elements.json` when no descriptor
//! declares an entry. The resolved set is cached; an etag (change token)
//! moves exactly when the set's content changes, so consumers can skip
//! rebuilding their own caches when nothing moved.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::package::{resolve_manifests_from, LocatedManifest, ManifestSource, WalkOptions};
use super::{
    now_millis, ManifestLocation, DEPENDENCY_DIR, MANIFEST_FILE_NAME, PACKAGE_DESCRIPTOR_NAME,
};

/// Options for one [`ManifestLocationProvider::locate`] call.
#[derive(Debug, Clone, Default)]
pub struct LocateOptions {
    /// Re-walk the filesystem even when a cached result exists.
    pub force: bool,

    /// Suppress the change event even when the resolved set changed.
    pub silent: bool,

    /// Abandons the walk when cancelled; cached state is left untouched.
    pub cancel: Option<CancellationToken>,
}

impl LocateOptions {
    /// Options for a forced re-locate.
    #[must_use]
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct LocateState {
    /// The currently resolved set, deduplicated, in discovery order.
    locations: Option<Vec<ManifestLocation>>,

    /// Provenance per location string, rebuilt on every walk.
    sources: HashMap<String, Vec<ManifestSource>>,
}

/// Locates Custom Elements Manifests across a workspace.
///
/// `locate` is safe to call concurrently with itself: the walk runs under an
/// async mutex, so a second caller arriving mid-walk awaits the in-flight
/// result instead of starting a duplicate filesystem walk.
pub struct ManifestLocationProvider {
    root: PathBuf,
    state: Mutex<LocateState>,
    /// Change token; 0 means nothing has been resolved yet.
    etag: AtomicU64,
    changes: broadcast::Sender<Vec<ManifestLocation>>,
}

impl ManifestLocationProvider {
    /// Creates a provider rooted at the given workspace directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            root: root.into(),
            state: Mutex::new(LocateState::default()),
            etag: AtomicU64::new(0),
            changes,
        }
    }

    /// The workspace root this provider scans.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current change token, if a set has been resolved.
    ///
    /// The token changes iff the resolved set's content changed.
    #[must_use]
    pub fn etag(&self) -> Option<u64> {
        match self.etag.load(Ordering::Acquire) {
            0 => None,
            value => Some(value),
        }
    }

    /// Subscribes to change notifications carrying the new resolved list.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<ManifestLocation>> {
        self.changes.subscribe()
    }

    /// Returns the resolved manifest locations, locating them first if
    /// nothing is cached yet.
    pub async fn get_manifests(&self) -> Vec<ManifestLocation> {
        self.locate(LocateOptions::default()).await
    }

    /// The resolved manifest locations paired with the change token they
    /// were published under.
    ///
    /// Both halves are read under the lock `locate` publishes under, so a
    /// forced locate interleaving with this call cannot pair a newer token
    /// with an older list.
    pub async fn get_manifests_with_etag(&self) -> (Vec<ManifestLocation>, Option<u64>) {
        self.locate(LocateOptions::default()).await;
        let state = self.state.lock().await;
        (state.locations.clone().unwrap_or_default(), self.etag())
    }

    /// Resolves the set of manifest locations in the workspace.
    ///
    /// Without `force`, a previously resolved set is returned as-is with no
    /// I/O. Otherwise the workspace is re-walked; if the resulting set
    /// differs from the previous one (order-independent, by canonical string
    /// form) the stored set is replaced, the etag is bumped, and — unless
    /// `silent` — a change event fires with the new list. The current list
    /// is always returned, whether or not anything changed.
    pub async fn locate(&self, options: LocateOptions) -> Vec<ManifestLocation> {
        let mut state = self.state.lock().await;

        if !options.force {
            if let Some(cached) = &state.locations {
                return cached.clone();
            }
        }

        let cancel = options.cancel.clone().unwrap_or_default();
        let Some((resolved, sources)) = self.walk_workspace(&cancel).await else {
            // Cancelled: abandon the walk, publish nothing.
            debug!("locate cancelled, keeping previous result");
            return state.locations.clone().unwrap_or_default();
        };

        let changed = state
            .locations
            .as_deref()
            .map_or(true, |previous| !sets_equal(previous, &resolved));

        state.sources = sources;
        if changed {
            state.locations = Some(resolved.clone());
            let previous = self.etag.load(Ordering::Acquire);
            // Millisecond timestamps can collide within one tick; keep the
            // token strictly moving on every publication.
            self.etag
                .store(now_millis().max(previous + 1), Ordering::Release);

            info!(manifest_count = resolved.len(), "manifest set changed");
            if !options.silent {
                let _ = self.changes.send(resolved.clone());
            }
        }

        resolved
    }

    /// Provenance records for one location, if known.
    pub async fn manifest_sources(
        &self,
        location: &ManifestLocation,
    ) -> Option<Vec<ManifestSource>> {
        let state = self.state.lock().await;
        state.sources.get(&location.to_string()).cloned()
    }

    /// A snapshot of all provenance records, keyed by location string.
    pub async fn all_manifest_sources(&self) -> HashMap<String, Vec<ManifestSource>> {
        let state = self.state.lock().await;
        state.sources.clone()
    }

    /// Walks descriptors and the fallback scan. Returns `None` on
    /// cancellation so the caller can leave cached state untouched.
    async fn walk_workspace(
        &self,
        cancel: &CancellationToken,
    ) -> Option<(Vec<ManifestLocation>, HashMap<String, Vec<ManifestSource>>)> {
        let mut resolved: Vec<ManifestLocation> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut sources: HashMap<String, Vec<ManifestSource>> = HashMap::new();

        let descriptors = self.find_workspace_files(PACKAGE_DESCRIPTOR_NAME).await;
        debug!(
            descriptor_count = descriptors.len(),
            root = %self.root.display(),
            "scanning package descriptors"
        );

        for descriptor in descriptors {
            if cancel.is_cancelled() {
                return None;
            }

            let located = resolve_manifests_from(
                &descriptor,
                WalkOptions {
                    allow_transitive: true,
                    // A descriptor found anywhere in the workspace is a local
                    // origin, even when the manifests it resolves are not.
                    is_local: true,
                    workspace_folder: Some(self.root.clone()),
                },
                cancel,
            )
            .await;

            for LocatedManifest { location, source } in located {
                add_manifest_source(&mut sources, &location, source);
                if seen.insert(location.to_string()) {
                    resolved.push(location);
                }
            }
        }

        if resolved.is_empty() {
            if cancel.is_cancelled() {
                return None;
            }

            // No descriptor declared an entry; fall back to scanning for the
            // manifest files themselves.
            for path in self.find_workspace_files(MANIFEST_FILE_NAME).await {
                let location = ManifestLocation::new(&path);
                add_manifest_source(
                    &mut sources,
                    &location,
                    ManifestSource {
                        workspace_folder: Some(self.root.clone()),
                        package_descriptor: None,
                        dependency_name: None,
                        is_local: true,
                    },
                );
                if seen.insert(location.to_string()) {
                    resolved.push(location);
                }
            }
        }

        Some((resolved, sources))
    }

    /// Finds all files with the given name under the workspace root,
    /// excluding anything inside a dependency-install directory.
    async fn find_workspace_files(&self, file_name: &'static str) -> Vec<PathBuf> {
        let root = self.root.clone();
        let scan = tokio::task::spawn_blocking(move || {
            let pattern = format!(
                "{}/**/{file_name}",
                glob::Pattern::escape(&root.to_string_lossy())
            );

            let entries = match glob::glob(&pattern) {
                Ok(entries) => entries,
                Err(error) => {
                    warn!(%error, pattern, "invalid workspace scan pattern");
                    return Vec::new();
                }
            };

            let mut files: Vec<PathBuf> = Vec::new();
            for entry in entries {
                match entry {
                    Ok(path) if !under_dependency_dir(&path) => files.push(path),
                    Ok(_) => {}
                    Err(error) => debug!(%error, "unreadable entry during workspace scan"),
                }
            }
            files.sort();
            files
        })
        .await;

        match scan {
            Ok(files) => files,
            Err(error) => {
                warn!(%error, "workspace scan task failed");
                Vec::new()
            }
        }
    }
}

/// Records a provenance entry unless the same origin is already known for
/// the location.
fn add_manifest_source(
    sources: &mut HashMap<String, Vec<ManifestSource>>,
    location: &ManifestLocation,
    source: ManifestSource,
) {
    let entry = sources.entry(location.to_string()).or_default();
    if !entry.iter().any(|existing| existing.same_origin(&source)) {
        entry.push(source);
    }
}

/// Order-independent equality of two deduplicated location lists.
fn sets_equal(a: &[ManifestLocation], b: &[ManifestLocation]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let b_set: HashSet<&ManifestLocation> = b.iter().collect();
    a.iter().all(|location| b_set.contains(location))
}

fn under_dependency_dir(path: &Path) -> bool {
    path.components()
        .any(|component| component.as_os_str() == DEPENDENCY_DIR)
}
