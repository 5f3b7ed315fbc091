//! Custom Elements Manifest data model and component extraction.
//!
//! The manifest is a JSON document (`custom-elements.json`) listing the
//! modules of a package and the declarations they contain. Deserialisation
//! is deliberately permissive: manifests in the wild omit fields freely and
//! carry vendor extensions, and a manifest this crate cannot fully model
//! must still contribute the components it can describe.

use serde::{Deserialize, Serialize};

/// A parsed Custom Elements Manifest document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CemPackage {
    /// Manifest schema version, e.g. `"1.0.0"`.
    #[serde(default)]
    pub schema_version: String,

    /// The JavaScript modules described by this manifest.
    #[serde(default)]
    pub modules: Vec<CemModule>,
}

/// One module entry in a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CemModule {
    /// Module path relative to the package root.
    #[serde(default)]
    pub path: String,

    /// Declarations made by the module.
    #[serde(default)]
    pub declarations: Vec<CemDeclaration>,

    /// Exports of the module, including custom element definitions.
    #[serde(default)]
    pub exports: Vec<CemExport>,
}

/// A declaration inside a module. Only class declarations that describe
/// custom elements are extracted as components; everything else is carried
/// through deserialisation and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CemDeclaration {
    /// Declaration kind, e.g. `"class"`, `"function"`, `"variable"`.
    #[serde(default)]
    pub kind: String,

    /// Declared name (the class name for class declarations).
    #[serde(default)]
    pub name: String,

    /// Markdown description.
    #[serde(default)]
    pub description: Option<String>,

    /// Tag name, when declared inline on the class.
    #[serde(default)]
    pub tag_name: Option<String>,

    /// Whether the class is marked as a custom element.
    #[serde(default)]
    pub custom_element: bool,

    /// Fields and methods.
    #[serde(default)]
    pub members: Vec<Member>,

    /// HTML attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,

    /// DOM events fired by the element.
    #[serde(default)]
    pub events: Vec<Event>,
}

/// A module export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CemExport {
    /// Export kind; `"custom-element-definition"` binds a tag name to a class.
    #[serde(default)]
    pub kind: String,

    /// Exported name (the tag name for custom element definitions).
    #[serde(default)]
    pub name: String,

    /// Reference to the declaration being exported.
    #[serde(default)]
    pub declaration: Option<CemReference>,
}

/// A reference to a declaration, possibly in another module.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CemReference {
    /// Name of the referenced declaration.
    #[serde(default)]
    pub name: String,

    /// Module the declaration lives in, if not the current one.
    #[serde(default)]
    pub module: Option<String>,
}

/// A type annotation, reduced to its text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// The type as written, e.g. `"string | undefined"`.
    #[serde(default)]
    pub text: String,
}

/// A class member: a field or a method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// `"field"` or `"method"`.
    #[serde(default)]
    pub kind: String,

    /// Member name.
    #[serde(default)]
    pub name: String,

    /// Markdown description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Type annotation.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,

    /// `"public"`, `"protected"` or `"private"`; absent means public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<String>,

    /// For fields: the attribute this field reflects, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Member {
    /// Whether the member is part of the public API.
    #[must_use]
    pub fn is_public(&self) -> bool {
        !matches!(self.privacy.as_deref(), Some("private" | "protected"))
    }
}

/// An HTML attribute of a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Attribute name.
    #[serde(default)]
    pub name: String,

    /// Markdown description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Type annotation.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,

    /// Name of the field the attribute is backed by, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    /// Default value as written in the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A DOM event fired by a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event name.
    #[serde(default)]
    pub name: String,

    /// Markdown description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Type of the event object.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

/// One custom element's extracted metadata. Read-only once extracted;
/// queries hand out clones, never references into a cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Declared name (usually the class name).
    pub name: String,

    /// Tag name the element is registered under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,

    /// Implementing class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Markdown description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the declaration is a custom element.
    #[serde(default)]
    pub custom_element: bool,

    /// Fields and methods.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,

    /// HTML attributes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    /// DOM events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
}

/// How much of a component to include when presenting it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComponentDetail {
    /// Name, tag, class and description only.
    Basic,
    /// Basic info plus the public API (public fields and methods).
    #[default]
    Public,
    /// The full extracted record.
    All,
}

impl std::str::FromStr for ComponentDetail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "public" => Ok(Self::Public),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown detail level '{other}', expected one of: basic, public, all"
            )),
        }
    }
}

/// Extracts all custom element components described by a manifest, in
/// module/declaration order.
#[must_use]
pub fn extract_components(package: &CemPackage) -> Vec<Component> {
    let mut components = Vec::new();
    for module in &package.modules {
        for declaration in &module.declarations {
            if is_custom_element(declaration) {
                components.push(to_component(declaration, module));
            }
        }
    }
    components
}

/// Finds one component by its tag name without extracting the full list.
#[must_use]
pub fn find_component_by_tag(package: &CemPackage, tag: &str) -> Option<Component> {
    for module in &package.modules {
        for declaration in &module.declarations {
            if !is_custom_element(declaration) {
                continue;
            }
            let component = to_component(declaration, module);
            if component.tag_name.as_deref() == Some(tag) {
                return Some(component);
            }
        }
    }
    None
}

/// Finds one component by its class name without extracting the full list.
#[must_use]
pub fn find_component_by_class(package: &CemPackage, class_name: &str) -> Option<Component> {
    for module in &package.modules {
        for declaration in &module.declarations {
            if is_custom_element(declaration) && declaration.name == class_name {
                return Some(to_component(declaration, module));
            }
        }
    }
    None
}

/// Shapes a component for presentation at the requested detail level.
#[must_use]
pub fn shape_component(component: &Component, detail: ComponentDetail) -> Component {
    match detail {
        ComponentDetail::All => component.clone(),
        ComponentDetail::Basic => Component {
            name: component.name.clone(),
            tag_name: component.tag_name.clone(),
            class_name: component.class_name.clone(),
            description: component.description.clone(),
            custom_element: component.custom_element,
            ..Component::default()
        },
        ComponentDetail::Public => {
            let members = component
                .members
                .iter()
                .filter(|member| {
                    member.is_public()
                        // Fields reflected by an attribute are already listed
                        // under attributes; keep property-only fields.
                        && (member.kind != "field" || member.attribute.is_none())
                })
                .cloned()
                .collect();
            Component {
                members,
                ..component.clone()
            }
        }
    }
}

fn is_custom_element(declaration: &CemDeclaration) -> bool {
    declaration.kind == "class" && (declaration.custom_element || declaration.tag_name.is_some())
}

fn to_component(declaration: &CemDeclaration, module: &CemModule) -> Component {
    let tag_name = declaration
        .tag_name
        .clone()
        .filter(|tag| !tag.is_empty())
        .or_else(|| tag_from_exports(module, &declaration.name));

    Component {
        name: declaration.name.clone(),
        tag_name,
        class_name: Some(declaration.name.clone()).filter(|name| !name.is_empty()),
        description: declaration.description.clone(),
        custom_element: true,
        members: declaration.members.clone(),
        attributes: declaration.attributes.clone(),
        events: declaration.events.clone(),
    }
}

/// Derives a tag name from the module's `custom-element-definition` exports.
fn tag_from_exports(module: &CemModule, class_name: &str) -> Option<String> {
    module
        .exports
        .iter()
        .find(|export| {
            export.kind == "custom-element-definition"
                && export
                    .declaration
                    .as_ref()
                    .is_some_and(|reference| reference.name == class_name)
        })
        .map(|export| export.name.clone())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> CemPackage {
        serde_json::from_str(
            r#"{
                "schemaVersion": "1.0.0",
                "modules": [
                    {
                        "path": "src/my-button.js",
                        "declarations": [
                            {
                                "kind": "class",
                                "name": "MyButton",
                                "tagName": "my-button",
                                "customElement": true,
                                "description": "A clickable button",
                                "members": [
                                    {"kind": "field", "name": "label", "attribute": "label"},
                                    {"kind": "field", "name": "internalState", "privacy": "private"},
                                    {"kind": "field", "name": "form"},
                                    {"kind": "method", "name": "click"},
                                    {"kind": "method", "name": "render", "privacy": "protected"}
                                ],
                                "attributes": [{"name": "label", "fieldName": "label"}],
                                "events": [{"name": "my-click"}]
                            },
                            {"kind": "function", "name": "helper"}
                        ]
                    },
                    {
                        "path": "src/my-input.js",
                        "declarations": [
                            {
                                "kind": "class",
                                "name": "MyInput",
                                "customElement": true,
                                "description": "A text input field"
                            }
                        ],
                        "exports": [
                            {
                                "kind": "custom-element-definition",
                                "name": "my-input",
                                "declaration": {"name": "MyInput", "module": "src/my-input.js"}
                            }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn extracts_custom_element_classes_only() {
        let components = extract_components(&sample_manifest());
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name, "MyButton");
        assert_eq!(components[0].tag_name.as_deref(), Some("my-button"));
        assert_eq!(components[1].class_name.as_deref(), Some("MyInput"));
    }

    #[test]
    fn tag_name_falls_back_to_definition_export() {
        let components = extract_components(&sample_manifest());
        assert_eq!(components[1].tag_name.as_deref(), Some("my-input"));
    }

    #[test]
    fn targeted_lookup_by_tag_and_class() {
        let package = sample_manifest();
        assert_eq!(
            find_component_by_tag(&package, "my-input").unwrap().name,
            "MyInput"
        );
        assert_eq!(
            find_component_by_class(&package, "MyButton")
                .unwrap()
                .tag_name
                .as_deref(),
            Some("my-button")
        );
        assert!(find_component_by_tag(&package, "no-such-tag").is_none());
    }

    #[test]
    fn basic_shape_drops_api_surface() {
        let components = extract_components(&sample_manifest());
        let basic = shape_component(&components[0], ComponentDetail::Basic);
        assert_eq!(basic.name, "MyButton");
        assert!(basic.members.is_empty());
        assert!(basic.attributes.is_empty());
        assert!(basic.events.is_empty());
    }

    #[test]
    fn public_shape_keeps_property_only_fields_and_public_methods() {
        let components = extract_components(&sample_manifest());
        let public = shape_component(&components[0], ComponentDetail::Public);
        let names: Vec<&str> = public.members.iter().map(|m| m.name.as_str()).collect();
        // `label` reflects an attribute, `internalState` is private, and
        // `render` is protected; only `form` and `click` remain.
        assert_eq!(names, vec!["form", "click"]);
        assert_eq!(public.attributes.len(), 1);
    }

    #[test]
    fn detail_level_parses_from_str() {
        assert_eq!("basic".parse::<ComponentDetail>(), Ok(ComponentDetail::Basic));
        assert_eq!("all".parse::<ComponentDetail>(), Ok(ComponentDetail::All));
        assert!("everything".parse::<ComponentDetail>().is_err());
    }

    #[test]
    fn tolerates_sparse_manifests() {
        let package: CemPackage = serde_json::from_str(r#"{"modules": [{}]}"#).unwrap();
        assert!(extract_components(&package).is_empty());
    }
}
