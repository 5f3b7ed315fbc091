//! End-to-end manifest discovery tests.
//!
//! These tests exercise the full discovery pipeline over a realistic
//! workspace layout: package descriptors with `customElements` entries,
//! installed dependencies under `node_modules`, and the aggregate component
//! view with runtime exclusions.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use cem_mcp::cem::{
    LocateOptions, ManifestLocationProvider, ManifestsProvider, MatchMode,
};
use cem_mcp::config::Settings;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
    fs::write(path, content).expect("write file");
}

fn manifest_json(tag: &str, name: &str, description: &str) -> String {
    format!(
        r#"{{
            "schemaVersion": "1.0.0",
            "modules": [{{
                "path": "src/{tag}.js",
                "declarations": [{{
                    "kind": "class",
                    "name": "{name}",
                    "tagName": "{tag}",
                    "customElement": true,
                    "description": "{description}"
                }}]
            }}]
        }}"#
    )
}

/// Builds a workspace with a local package and two installed dependencies,
/// one of which has a nested dependency of its own (which must stay
/// invisible).
fn build_workspace() -> TempDir {
    let workspace = TempDir::new().expect("temp dir");
    let root = workspace.path();

    write(
        &root.join("package.json"),
        r#"{
            "name": "app",
            "customElements": "custom-elements.json",
            "dependencies": {"ui-kit": "^1.0.0"},
            "devDependencies": {"test-helpers": "^2.0.0"}
        }"#,
    );
    write(
        &root.join("custom-elements.json"),
        &manifest_json("app-shell", "AppShell", "The application shell"),
    );

    write(
        &root.join("node_modules/ui-kit/package.json"),
        r#"{
            "name": "ui-kit",
            "customElements": "dist/custom-elements.json",
            "dependencies": {"deep-dep": "^1.0.0"}
        }"#,
    );
    write(
        &root.join("node_modules/ui-kit/dist/custom-elements.json"),
        &manifest_json("my-button", "Button", "A clickable button"),
    );

    write(
        &root.join("node_modules/test-helpers/package.json"),
        r#"{"name": "test-helpers", "customElements": "custom-elements.json"}"#,
    );
    write(
        &root.join("node_modules/test-helpers/custom-elements.json"),
        &manifest_json("test-harness", "TestHarness", "A testing harness element"),
    );

    // Nested two levels deep; discovery must not reach it.
    write(
        &root.join("node_modules/ui-kit/node_modules/deep-dep/package.json"),
        r#"{"name": "deep-dep", "customElements": "custom-elements.json"}"#,
    );
    write(
        &root.join("node_modules/ui-kit/node_modules/deep-dep/custom-elements.json"),
        &manifest_json("deep-widget", "DeepWidget", "Should never be discovered"),
    );

    workspace
}

#[tokio::test]
async fn discovers_local_and_direct_dependency_manifests() {
    let workspace = build_workspace();
    let locator = ManifestLocationProvider::new(workspace.path());

    let manifests = locator.locate(LocateOptions::default()).await;

    assert_eq!(manifests.len(), 3, "local + two direct dependencies");
    let strings: Vec<String> = manifests.iter().map(ToString::to_string).collect();
    assert!(strings.iter().any(|s| s.ends_with("custom-elements.json")));
    assert!(
        !strings.iter().any(|s| s.contains("deep-dep")),
        "transitive dependencies beyond one level must stay invisible"
    );
}

#[tokio::test]
async fn concurrent_locates_coalesce_on_one_walk() {
    let workspace = build_workspace();
    let locator = ManifestLocationProvider::new(workspace.path());
    let mut events = locator.subscribe();

    // The second caller arrives while the first walk is in flight and must
    // await its published result rather than starting a second walk.
    let (first, second) = tokio::join!(
        locator.locate(LocateOptions::default()),
        locator.locate(LocateOptions::default())
    );

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(events.try_recv().expect("one change event"), first);
    assert!(
        events.try_recv().is_err(),
        "a coalesced locate must not publish a second event"
    );
}

#[tokio::test]
async fn dev_dependencies_participate_in_discovery() {
    let workspace = build_workspace();
    let locator = ManifestLocationProvider::new(workspace.path());

    let manifests = locator.locate(LocateOptions::default()).await;
    let strings: Vec<String> = manifests.iter().map(ToString::to_string).collect();
    assert!(strings.iter().any(|s| s.contains("test-helpers")));
}

#[tokio::test]
async fn provenance_distinguishes_local_from_dependency() {
    let workspace = build_workspace();
    let locator = ManifestLocationProvider::new(workspace.path());

    let manifests = locator.locate(LocateOptions::default()).await;
    let sources = locator.all_manifest_sources().await;

    let mut local = 0;
    let mut dependency = 0;
    for manifest in &manifests {
        for source in sources.get(&manifest.to_string()).expect("sources known") {
            if source.is_local {
                local += 1;
            } else {
                dependency += 1;
            }
        }
    }
    assert_eq!(local, 1);
    assert_eq!(dependency, 2);
}

#[tokio::test]
async fn aggregate_queries_span_all_manifests() {
    let workspace = build_workspace();
    let locator = Arc::new(ManifestLocationProvider::new(workspace.path()));
    let settings = Arc::new(Settings::default());
    let provider = ManifestsProvider::new(Arc::clone(&locator), Arc::clone(&settings));

    let all = provider.get_all_components().await;
    assert_eq!(all.len(), 3);

    let button = provider
        .get_component_by_tag_name("my-button")
        .await
        .expect("dependency component resolvable by tag");
    assert_eq!(button.class_name.as_deref(), Some("Button"));

    let shell = provider
        .get_component_by_class_name("AppShell")
        .await
        .expect("local component resolvable by class");
    assert_eq!(shell.tag_name.as_deref(), Some("app-shell"));

    let hits = provider.search_components("button", MatchMode::Any).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tag_name.as_deref(), Some("my-button"));
}

#[tokio::test]
async fn excluding_a_manifest_removes_its_components() {
    let workspace = build_workspace();
    let locator = Arc::new(ManifestLocationProvider::new(workspace.path()));
    let settings = Arc::new(Settings::default());
    let provider = ManifestsProvider::new(Arc::clone(&locator), Arc::clone(&settings));

    assert_eq!(provider.get_all_components().await.len(), 3);

    let manifests = locator.get_manifests().await;
    let ui_kit = manifests
        .iter()
        .find(|m| m.to_string().contains("ui-kit"))
        .expect("ui-kit manifest located")
        .to_string();

    settings.exclude_manifest(&ui_kit);
    assert_eq!(provider.get_all_components().await.len(), 2);
    assert!(provider.get_component_by_tag_name("my-button").await.is_none());

    settings.include_manifest(&ui_kit);
    assert_eq!(provider.get_all_components().await.len(), 3);
}

#[tokio::test]
async fn new_dependency_shows_up_after_forced_relocate() {
    let workspace = build_workspace();
    let locator = Arc::new(ManifestLocationProvider::new(workspace.path()));
    let settings = Arc::new(Settings::default());
    let provider = ManifestsProvider::new(Arc::clone(&locator), Arc::clone(&settings));

    assert_eq!(provider.get_all_components().await.len(), 3);
    let etag = locator.etag().expect("etag set after first locate");

    // Install a new dependency and declare it.
    write(
        &workspace.path().join("package.json"),
        r#"{
            "name": "app",
            "customElements": "custom-elements.json",
            "dependencies": {"ui-kit": "^1.0.0", "icons": "^1.0.0"},
            "devDependencies": {"test-helpers": "^2.0.0"}
        }"#,
    );
    write(
        &workspace.path().join("node_modules/icons/package.json"),
        r#"{"name": "icons", "customElements": "custom-elements.json"}"#,
    );
    write(
        &workspace.path().join("node_modules/icons/custom-elements.json"),
        &manifest_json("my-icon", "Icon", "A scalable icon"),
    );

    let manifests = locator.locate(LocateOptions::forced()).await;
    assert_eq!(manifests.len(), 4);
    assert_ne!(locator.etag(), Some(etag));

    // The aggregate view follows the moved change token.
    assert_eq!(provider.get_all_components().await.len(), 4);
    assert!(provider.get_component_by_tag_name("my-icon").await.is_some());
}
