//! Per-manifest reading, indexing and caching.
//!
//! A [`ManifestReader`] owns one manifest file. Loading is lazy and gated on
//! the file's modification time; a reload clears the whole cache quartet
//! (component list, tag index, class index, search memo) in one step, so a
//! lookup can never be served against a manifest document older than the one
//! that populated it. A file watch clears the caches and resets the
//! modification marker as soon as the file changes on disk.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::UNIX_EPOCH;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::manifest::{
    extract_components, find_component_by_class, find_component_by_tag, CemPackage, Component,
};
use super::watcher::{self, FileSubscription};
use super::ManifestLocation;

/// How a search query is matched against component fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// A field must equal the query exactly (case-sensitive).
    Strict,
    /// Every word of the query must appear in some field.
    All,
    /// Any word of the query appearing in some field is enough.
    #[default]
    Any,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Strict => "strict",
            Self::All => "all",
            Self::Any => "any",
        };
        write!(f, "{name}")
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            other => Err(format!(
                "unknown match mode '{other}', expected one of: strict, all, any"
            )),
        }
    }
}

/// Cache statistics for one reader, for debugging and monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct ReaderCacheStats {
    /// The manifest location.
    pub location: String,
    /// Modification time (ms since epoch) of the loaded document.
    pub last_modified: Option<u64>,
    /// Number of components in the full-list cache.
    pub cached_components: usize,
    /// Entries in the tag-name index.
    pub tag_cache_size: usize,
    /// Entries in the class-name index.
    pub class_cache_size: usize,
    /// Memoised search result lists.
    pub search_cache_size: usize,
}

#[derive(Default)]
struct ReaderState {
    document: Option<CemPackage>,
    last_modified: Option<u64>,
    components: Option<Vec<Component>>,
    by_tag: IndexMap<String, Component>,
    by_class: IndexMap<String, Component>,
    search: HashMap<String, Vec<Component>>,
}

impl ReaderState {
    /// Clears the cache quartet together. The parsed document itself stays.
    fn clear_caches(&mut self) {
        self.components = None;
        self.by_tag.clear();
        self.by_class.clear();
        self.search.clear();
    }
}

/// Reads and indexes a single Custom Elements Manifest file.
pub struct ManifestReader {
    location: ManifestLocation,
    state: Arc<Mutex<ReaderState>>,
    changes: broadcast::Sender<()>,
    _watch: Option<FileSubscription>,
    watch_task: Option<tokio::task::JoinHandle<()>>,
}

impl ManifestReader {
    /// Creates a reader for the manifest at `location` and starts watching
    /// the file. A failed watch is logged and leaves the reader working in
    /// polling-by-mtime mode only.
    #[must_use]
    pub fn new(location: ManifestLocation) -> Self {
        let state = Arc::new(Mutex::new(ReaderState::default()));
        let (changes, _) = broadcast::channel(16);

        let (watch, watch_task) = match watcher::subscribe(location.as_path()) {
            Ok((subscription, mut events)) => {
                let task_state = Arc::clone(&state);
                let task_changes = changes.clone();
                let task_location = location.clone();
                let task = tokio::spawn(async move {
                    while let Some(event) = events.recv().await {
                        debug!(manifest = %task_location, ?event, "manifest file event");
                        if let Ok(mut state) = task_state.lock() {
                            state.clear_caches();
                            // Force a reload on next access.
                            state.last_modified = None;
                        }
                        let _ = task_changes.send(());
                    }
                });
                (Some(subscription), Some(task))
            }
            Err(error) => {
                warn!(manifest = %location, %error, "could not watch manifest file");
                (None, None)
            }
        };

        Self {
            location,
            state,
            changes,
            _watch: watch,
            watch_task,
        }
    }

    /// The manifest location this reader serves.
    #[must_use]
    pub fn location(&self) -> &ManifestLocation {
        &self.location
    }

    /// Fires whenever the watched file changes or is deleted.
    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }

    /// Loads or reloads the manifest as needed.
    ///
    /// Returns whether a document is available afterwards. A failed stat or
    /// read means not-loaded (a missing manifest is not fatal to the
    /// aggregate view); a parse failure keeps the previously loaded document
    /// — stale data beats losing everything to a write in progress.
    async fn ensure_loaded(&self, force: bool) -> bool {
        let metadata = match tokio::fs::metadata(self.location.as_path()).await {
            Ok(metadata) => metadata,
            Err(error) => {
                debug!(manifest = %self.location, %error, "manifest not readable");
                return false;
            }
        };

        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .and_then(|elapsed| u64::try_from(elapsed.as_millis()).ok());

        if !force && modified.is_some() {
            if let Ok(state) = self.state.lock() {
                if state.document.is_some() && state.last_modified == modified {
                    return true;
                }
            }
        }

        let bytes = match tokio::fs::read(self.location.as_path()).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(manifest = %self.location, %error, "failed to read manifest");
                return false;
            }
        };

        let document: CemPackage = match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(error) => {
                warn!(manifest = %self.location, %error, "manifest is not valid JSON, keeping previous document");
                return self
                    .state
                    .lock()
                    .map(|state| state.document.is_some())
                    .unwrap_or(false);
            }
        };

        if let Ok(mut state) = self.state.lock() {
            state.document = Some(document);
            state.last_modified = modified;
            state.clear_caches();
        }
        true
    }

    /// All components described by the manifest, extracting and indexing on
    /// first access.
    pub async fn get_all_components(&self) -> Vec<Component> {
        if !self.ensure_loaded(false).await {
            return Vec::new();
        }

        let Ok(mut state) = self.state.lock() else {
            return Vec::new();
        };

        if let Some(cached) = &state.components {
            return cached.clone();
        }

        let components = match state.document.as_ref() {
            Some(document) => extract_components(document),
            None => return Vec::new(),
        };

        for component in &components {
            // A blank tag or class simply isn't indexed.
            if let Some(tag) = component.tag_name.as_deref().filter(|t| !t.is_empty()) {
                state.by_tag.insert(tag.to_string(), component.clone());
            }
            if let Some(class) = component.class_name.as_deref().filter(|c| !c.is_empty()) {
                state.by_class.insert(class.to_string(), component.clone());
            }
        }
        state.components = Some(components.clone());
        components
    }

    /// Looks up one component by tag name.
    ///
    /// An index miss runs a targeted extraction and caches the hit into the
    /// index without populating the full component list.
    pub async fn get_component_by_tag_name(&self, tag: &str) -> Option<Component> {
        if !self.ensure_loaded(false).await {
            return None;
        }

        let Ok(mut state) = self.state.lock() else {
            return None;
        };

        if let Some(hit) = state.by_tag.get(tag) {
            return Some(hit.clone());
        }

        let component = find_component_by_tag(state.document.as_ref()?, tag)?;
        state.by_tag.insert(tag.to_string(), component.clone());
        Some(component)
    }

    /// Looks up one component by class name; same caching behaviour as
    /// [`Self::get_component_by_tag_name`].
    pub async fn get_component_by_class_name(&self, class_name: &str) -> Option<Component> {
        if !self.ensure_loaded(false).await {
            return None;
        }

        let Ok(mut state) = self.state.lock() else {
            return None;
        };

        if let Some(hit) = state.by_class.get(class_name) {
            return Some(hit.clone());
        }

        let component = find_component_by_class(state.document.as_ref()?, class_name)?;
        state.by_class.insert(class_name.to_string(), component.clone());
        Some(component)
    }

    /// Searches components by name, tag name and description.
    ///
    /// Results are memoised per `"<query>:<mode>"` until the manifest
    /// reloads. An empty (after trimming) query yields an empty list.
    pub async fn search_components(&self, query: &str, matching: MatchMode) -> Vec<Component> {
        if !self.ensure_loaded(false).await {
            return Vec::new();
        }

        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let key = format!("{query}:{matching}");

        let Ok(mut state) = self.state.lock() else {
            return Vec::new();
        };

        if let Some(hit) = state.search.get(&key) {
            return hit.clone();
        }

        let components = if let Some(cached) = &state.components {
            cached.clone()
        } else if let Some(document) = &state.document {
            extract_components(document)
        } else {
            return Vec::new();
        };

        let results = filter_components(&components, query, matching);
        state.search.insert(key, results.clone());
        results
    }

    /// Clears all caches; the next access reloads lazily.
    pub fn clear_caches(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.clear_caches();
        }
    }

    /// Cache statistics for this reader.
    #[must_use]
    pub fn cache_stats(&self) -> ReaderCacheStats {
        let (last_modified, cached_components, tag_cache_size, class_cache_size, search_cache_size) =
            self.state.lock().map_or((None, 0, 0, 0, 0), |state| {
                (
                    state.last_modified,
                    state.components.as_ref().map_or(0, Vec::len),
                    state.by_tag.len(),
                    state.by_class.len(),
                    state.search.len(),
                )
            });

        ReaderCacheStats {
            location: self.location.to_string(),
            last_modified,
            cached_components,
            tag_cache_size,
            class_cache_size,
            search_cache_size,
        }
    }
}

impl Drop for ManifestReader {
    fn drop(&mut self) {
        if let Some(task) = self.watch_task.take() {
            task.abort();
        }
    }
}

/// Filters components against a non-empty, trimmed query.
#[must_use]
pub fn filter_components(
    components: &[Component],
    query: &str,
    matching: MatchMode,
) -> Vec<Component> {
    if matching == MatchMode::Strict {
        return components
            .iter()
            .filter(|component| {
                component.tag_name.as_deref() == Some(query)
                    || component.name == query
                    || component.description.as_deref() == Some(query)
            })
            .cloned()
            .collect();
    }

    let matches_word = |component: &Component, word: &str| {
        component
            .tag_name
            .as_deref()
            .is_some_and(|tag| tag.to_lowercase().contains(word))
            || component.name.to_lowercase().contains(word)
            || component
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(word))
    };

    let normalized = query.to_lowercase();
    if normalized.contains(char::is_whitespace) {
        let words: Vec<&str> = normalized.split_whitespace().collect();
        return components
            .iter()
            .filter(|component| match matching {
                MatchMode::All => words.iter().all(|word| matches_word(component, word)),
                _ => words.iter().any(|word| matches_word(component, word)),
            })
            .cloned()
            .collect();
    }

    components
        .iter()
        .filter(|component| matches_word(component, &normalized))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::path::Path;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn component(tag: &str, name: &str, description: &str) -> Component {
        Component {
            name: name.to_string(),
            tag_name: Some(tag.to_string()),
            class_name: Some(name.to_string()),
            description: Some(description.to_string()),
            custom_element: true,
            ..Component::default()
        }
    }

    fn sample_components() -> Vec<Component> {
        vec![
            component("my-button", "Button", "A clickable button"),
            component("my-input", "Input", "A text input field"),
        ]
    }

    fn tags(results: &[Component]) -> Vec<&str> {
        results
            .iter()
            .filter_map(|c| c.tag_name.as_deref())
            .collect()
    }

    #[test]
    fn any_matches_single_word_as_substring() {
        let results = filter_components(&sample_components(), "button", MatchMode::Any);
        assert_eq!(tags(&results), vec!["my-button"]);
    }

    #[test]
    fn all_requires_every_word() {
        let results = filter_components(&sample_components(), "text input", MatchMode::All);
        assert_eq!(tags(&results), vec!["my-input"]);
    }

    #[test]
    fn any_with_multiple_words_matches_either() {
        let results = filter_components(&sample_components(), "text input", MatchMode::Any);
        assert_eq!(tags(&results), vec!["my-input"]);
    }

    #[test]
    fn strict_compares_fields_exactly() {
        // `name` equals "Button" exactly; no lowercasing is applied.
        let results = filter_components(&sample_components(), "Button", MatchMode::Strict);
        assert_eq!(tags(&results), vec!["my-button"]);

        let none = filter_components(&sample_components(), "button", MatchMode::Strict);
        assert!(none.is_empty());
    }

    const BUTTON_MANIFEST: &str = r#"{
        "modules": [{
            "path": "src/my-button.js",
            "declarations": [{
                "kind": "class",
                "name": "Button",
                "tagName": "my-button",
                "customElement": true,
                "description": "A clickable button"
            }]
        }]
    }"#;

    const INPUT_MANIFEST: &str = r#"{
        "modules": [{
            "path": "src/my-input.js",
            "declarations": [{
                "kind": "class",
                "name": "Input",
                "tagName": "my-input",
                "customElement": true,
                "description": "A text input field"
            }]
        }]
    }"#;

    fn write_manifest(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    /// Pushes the file's mtime forward so a rewrite is always detectable,
    /// regardless of filesystem timestamp granularity.
    fn bump_mtime(path: &Path) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();
    }

    #[tokio::test]
    async fn empty_query_returns_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom-elements.json");
        write_manifest(&path, BUTTON_MANIFEST);

        let reader = ManifestReader::new(ManifestLocation::new(&path));
        assert!(reader.search_components("   ", MatchMode::Any).await.is_empty());
        assert_eq!(reader.cache_stats().search_cache_size, 0);
    }

    #[tokio::test]
    async fn missing_manifest_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let reader = ManifestReader::new(ManifestLocation::new(
            dir.path().join("custom-elements.json"),
        ));

        assert!(reader.get_all_components().await.is_empty());
        assert!(reader.get_component_by_tag_name("my-button").await.is_none());
    }

    #[tokio::test]
    async fn full_extraction_populates_tag_and_class_indexes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom-elements.json");
        write_manifest(&path, BUTTON_MANIFEST);

        let reader = ManifestReader::new(ManifestLocation::new(&path));
        let components = reader.get_all_components().await;
        assert_eq!(components.len(), 1);

        let stats = reader.cache_stats();
        assert_eq!(stats.cached_components, 1);
        assert_eq!(stats.tag_cache_size, 1);
        assert_eq!(stats.class_cache_size, 1);
    }

    #[tokio::test]
    async fn targeted_lookup_does_not_populate_full_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom-elements.json");
        write_manifest(&path, BUTTON_MANIFEST);

        let reader = ManifestReader::new(ManifestLocation::new(&path));
        let hit = reader.get_component_by_tag_name("my-button").await;
        assert!(hit.is_some());

        let stats = reader.cache_stats();
        assert_eq!(stats.cached_components, 0);
        assert_eq!(stats.tag_cache_size, 1);
    }

    #[tokio::test]
    async fn search_results_are_memoised_until_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom-elements.json");
        write_manifest(&path, BUTTON_MANIFEST);

        let reader = ManifestReader::new(ManifestLocation::new(&path));
        let first = reader.search_components("button", MatchMode::Any).await;
        let second = reader.search_components("button", MatchMode::Any).await;
        assert_eq!(first, second);
        assert_eq!(reader.cache_stats().search_cache_size, 1);
    }

    #[tokio::test]
    async fn modification_time_change_invalidates_all_caches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom-elements.json");
        write_manifest(&path, BUTTON_MANIFEST);

        let reader = ManifestReader::new(ManifestLocation::new(&path));
        assert!(reader.get_component_by_tag_name("my-button").await.is_some());
        reader.search_components("button", MatchMode::Any).await;

        // Replace the manifest: the button tag disappears.
        write_manifest(&path, INPUT_MANIFEST);
        bump_mtime(&path);

        let components = reader.get_all_components().await;
        assert_eq!(tags(&components), vec!["my-input"]);
        // The removed tag must not survive the reload through the old index.
        assert!(reader.get_component_by_tag_name("my-button").await.is_none());
        assert!(reader.search_components("button", MatchMode::Any).await.is_empty());
    }

    #[tokio::test]
    async fn parse_failure_keeps_previous_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom-elements.json");
        write_manifest(&path, BUTTON_MANIFEST);

        let reader = ManifestReader::new(ManifestLocation::new(&path));
        assert_eq!(reader.get_all_components().await.len(), 1);

        // Simulate a write in progress: invalid JSON with a newer mtime.
        write_manifest(&path, "{ truncated");
        bump_mtime(&path);

        let components = reader.get_all_components().await;
        assert_eq!(tags(&components), vec!["my-button"]);
    }

    #[tokio::test]
    async fn match_mode_round_trips_strings() {
        assert_eq!("strict".parse::<MatchMode>(), Ok(MatchMode::Strict));
        assert_eq!(MatchMode::All.to_string(), "all");
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }
}
