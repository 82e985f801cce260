//! Manifest assembly and namespace override
//!
//! Pure transforms over uploaded manifest text and untyped resource
//! values: combining uploads into one multi-document manifest, and
//! stamping a target namespace onto resources, including resources
//! carried inside `*List` collections.
//!
//! Both transforms are total. Malformed input passes through verbatim
//! (assembly) or untouched (override); no error kind exists here.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::Result;

/// Separator between documents in an assembled manifest.
pub const DOCUMENT_SEPARATOR: &str = "\n---\n";

/// `kind` suffix marking a collection wrapper resource.
const LIST_KIND_SUFFIX: &str = "List";

/// One uploaded manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedManifest {
    /// Source name, recorded as a comment above the content.
    pub name: String,
    /// Document body, passed through verbatim.
    pub content: String,
}

impl UploadedManifest {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Combine uploads into one multi-document manifest.
///
/// Each upload becomes a `# {name}\n{content}` block; blocks are joined
/// with [`DOCUMENT_SEPARATOR`] in upload order. Non-empty existing text
/// is prepended, followed by one separator.
pub fn combine(existing: &str, uploads: &[UploadedManifest]) -> String {
    let blocks: Vec<String> = uploads
        .iter()
        .map(|upload| format!("# {}\n{}", upload.name, upload.content))
        .collect();
    let joined = blocks.join(DOCUMENT_SEPARATOR);

    if existing.trim().is_empty() {
        joined
    } else {
        format!("{}{}{}", existing, DOCUMENT_SEPARATOR, joined)
    }
}

/// One resource document, classified once at the boundary.
///
/// The `kind`-suffix check that distinguishes a collection wrapper from a
/// plain resource happens exactly once, here; the namespace transform is
/// then a pure structural recursion. Items of a collection are leaves:
/// this domain has a single level of list nesting, so they are never
/// re-checked for a `List` kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceNode {
    /// A single resource object.
    Single(Value),
    /// A `*List` wrapper and its items, in order.
    Collection {
        /// The wrapper's fields other than `items`.
        wrapper: Map<String, Value>,
        /// The wrapped resources.
        items: Vec<ResourceNode>,
    },
    /// A non-object value, passed through untouched.
    Opaque(Value),
}

impl ResourceNode {
    /// Classify an untyped value.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let is_collection = map
                    .get("kind")
                    .and_then(Value::as_str)
                    .is_some_and(|kind| kind.ends_with(LIST_KIND_SUFFIX))
                    && map.get("items").is_some_and(Value::is_array);

                if is_collection {
                    let items = match map.remove("items") {
                        Some(Value::Array(items)) => items,
                        // Checked above; kept total.
                        _ => Vec::new(),
                    };
                    ResourceNode::Collection {
                        items: items.into_iter().map(Self::leaf).collect(),
                        wrapper: map,
                    }
                } else {
                    ResourceNode::Single(Value::Object(map))
                }
            }
            other => ResourceNode::Opaque(other),
        }
    }

    /// Classify a collection item: a leaf resource or an opaque value.
    fn leaf(value: Value) -> Self {
        match value {
            object @ Value::Object(_) => ResourceNode::Single(object),
            other => ResourceNode::Opaque(other),
        }
    }

    /// Stamp `metadata.namespace` across the node.
    ///
    /// Guarantees `metadata` exists as an object on every resource
    /// touched; sets the namespace only when one is given, and never
    /// clears an existing namespace. Idempotent.
    pub fn with_namespace(self, namespace: Option<&str>) -> Self {
        match self {
            ResourceNode::Single(value) => ResourceNode::Single(stamp_namespace(value, namespace)),
            ResourceNode::Collection { wrapper, items } => ResourceNode::Collection {
                wrapper,
                items: items
                    .into_iter()
                    .map(|item| item.with_namespace(namespace))
                    .collect(),
            },
            opaque @ ResourceNode::Opaque(_) => opaque,
        }
    }

    /// Convert back to an untyped value.
    pub fn into_value(self) -> Value {
        match self {
            ResourceNode::Single(value) | ResourceNode::Opaque(value) => value,
            ResourceNode::Collection { mut wrapper, items } => {
                wrapper.insert(
                    "items".to_string(),
                    Value::Array(items.into_iter().map(Self::into_value).collect()),
                );
                Value::Object(wrapper)
            }
        }
    }
}

fn stamp_namespace(value: Value, namespace: Option<&str>) -> Value {
    match value {
        Value::Object(mut map) => {
            if !map.get("metadata").is_some_and(Value::is_object) {
                map.insert("metadata".to_string(), Value::Object(Map::new()));
            }
            if let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) {
                if let Some(Value::Object(metadata)) = map.get_mut("metadata") {
                    metadata.insert(
                        "namespace".to_string(),
                        Value::String(namespace.to_string()),
                    );
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Apply a namespace override to one resource value.
///
/// Total and pure: non-object values return unchanged, a missing
/// `metadata` mapping is created, and an omitted namespace leaves any
/// existing namespace untouched. Items of a `*List` collection are
/// stamped in order.
pub fn apply_namespace_override(value: Value, namespace: Option<&str>) -> Value {
    ResourceNode::classify(value)
        .with_namespace(namespace)
        .into_value()
}

/// Apply a namespace override across an assembled multi-document manifest.
///
/// Parses the documents, stamps each one, and re-emits separator-joined
/// YAML. Parsing is the only fallible step.
pub fn override_documents(manifest: &str, namespace: Option<&str>) -> Result<String> {
    let documents: Vec<Value> = crate::yaml::parse_documents(manifest)?
        .into_iter()
        .map(|doc| apply_namespace_override(doc, namespace))
        .collect();
    crate::yaml::emit_documents(&documents)
}
