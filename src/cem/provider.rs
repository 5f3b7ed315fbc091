//! The aggregate manifest view.
//!
//! A [`ManifestsProvider`] turns the locator's current manifest set into a
//! pool of [`ManifestReader`]s and answers queries across all of them. The
//! pool mirrors the locator's change token and the exclusion settings
//! revision; when either moves, the whole pool is rebuilt in one step so a
//! query never sees a half-updated mixture of old and new readers.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::Settings;

use super::locator::ManifestLocationProvider;
use super::manifest::Component;
use super::reader::{ManifestReader, MatchMode, ReaderCacheStats};

/// Cache statistics across the whole pool.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderCacheStats {
    /// Number of readers currently in the pool.
    pub manifest_count: usize,
    /// The locator change token the pool was built against.
    pub etag: Option<u64>,
    /// Per-manifest statistics.
    pub manifests: Vec<ReaderCacheStats>,
}

#[derive(Default)]
struct ProviderState {
    readers: Option<Vec<ManifestReader>>,
    cached_etag: Option<u64>,
    cached_settings_revision: Option<u64>,
}

/// Aggregates component queries over every known manifest.
pub struct ManifestsProvider {
    locator: Arc<ManifestLocationProvider>,
    settings: Arc<Settings>,
    state: Mutex<ProviderState>,
}

impl ManifestsProvider {
    /// Creates a provider over the given locator and exclusion settings.
    #[must_use]
    pub fn new(locator: Arc<ManifestLocationProvider>, settings: Arc<Settings>) -> Self {
        Self {
            locator,
            settings,
            state: Mutex::new(ProviderState::default()),
        }
    }

    /// Brings the reader pool in line with the locator and settings.
    ///
    /// Staleness is detected by comparing the locator's change token and the
    /// settings revision against the values the pool was built with; when
    /// either differs (or `force` is set) the old readers are dropped and a
    /// fresh pool is built from the current manifest list minus exclusions.
    async fn ensure_manifests(&self, state: &mut ProviderState, force: bool) {
        let etag = self.locator.etag();
        let revision = self.settings.revision();

        let stale = force
            || state.readers.is_none()
            || state.cached_etag != etag
            || state.cached_settings_revision != Some(revision);
        if !stale {
            return;
        }

        state.readers = None;

        // The token must come from the same publication as the list: a
        // forced locate landing between the walk and a separate etag read
        // would pair the new token with readers built from the old list.
        let (locations, published_etag) = self.locator.get_manifests_with_etag().await;
        let readers: Vec<ManifestReader> = locations
            .into_iter()
            .filter(|location| !self.settings.is_excluded(&location.to_string()))
            .map(ManifestReader::new)
            .collect();

        debug!(count = readers.len(), "rebuilt manifest reader pool");

        state.cached_etag = published_etag;
        state.cached_settings_revision = Some(revision);
        state.readers = Some(readers);
    }

    /// All components across every manifest, concatenated in manifest order.
    /// Duplicate tags are not collapsed here; the list shows everything.
    pub async fn get_all_components(&self) -> Vec<Component> {
        let mut state = self.state.lock().await;
        self.ensure_manifests(&mut state, false).await;

        let mut all = Vec::new();
        if let Some(readers) = &state.readers {
            for reader in readers {
                all.extend(reader.get_all_components().await);
            }
        }
        all
    }

    /// Finds a component by tag name; the first manifest defining the tag
    /// wins.
    pub async fn get_component_by_tag_name(&self, tag: &str) -> Option<Component> {
        let mut state = self.state.lock().await;
        self.ensure_manifests(&mut state, false).await;

        if let Some(readers) = &state.readers {
            for reader in readers {
                if let Some(component) = reader.get_component_by_tag_name(tag).await {
                    return Some(component);
                }
            }
        }
        None
    }

    /// Finds a component by class name; the first manifest defining the
    /// class wins.
    pub async fn get_component_by_class_name(&self, class_name: &str) -> Option<Component> {
        let mut state = self.state.lock().await;
        self.ensure_manifests(&mut state, false).await;

        if let Some(readers) = &state.readers {
            for reader in readers {
                if let Some(component) = reader.get_component_by_class_name(class_name).await {
                    return Some(component);
                }
            }
        }
        None
    }

    /// Searches every manifest, concatenating per-manifest results in
    /// manifest order.
    pub async fn search_components(&self, query: &str, matching: MatchMode) -> Vec<Component> {
        let mut state = self.state.lock().await;
        self.ensure_manifests(&mut state, false).await;

        let mut results = Vec::new();
        if let Some(readers) = &state.readers {
            for reader in readers {
                results.extend(reader.search_components(query, matching).await);
            }
        }
        results
    }

    /// Drops every reader; the next query rebuilds the pool and reloads
    /// manifests from disk.
    pub async fn clear_caches(&self) {
        let mut state = self.state.lock().await;
        state.readers = None;
        state.cached_etag = None;
        state.cached_settings_revision = None;
    }

    /// Cache statistics for the pool and every reader in it.
    pub async fn cache_stats(&self) -> ProviderCacheStats {
        let mut state = self.state.lock().await;
        self.ensure_manifests(&mut state, false).await;

        let manifests: Vec<ReaderCacheStats> = state
            .readers
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(ManifestReader::cache_stats)
            .collect();

        ProviderCacheStats {
            manifest_count: manifests.len(),
            etag: state.cached_etag,
            manifests,
        }
    }
}
