//! Schema Definition - The Manifest Contract
//!
//! Single authoritative description of a valid extension manifest.
//! Normalizer, validator and feed updater all read from here.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Extension kinds accepted by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionType {
    Theme,
    Tool,
    Library,
    PromptTemplate,
    CodeInterpreter,
}

impl ExtensionType {
    pub const ALL: [ExtensionType; 5] = [
        ExtensionType::Theme,
        ExtensionType::Tool,
        ExtensionType::Library,
        ExtensionType::PromptTemplate,
        ExtensionType::CodeInterpreter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionType::Theme => "theme",
            ExtensionType::Tool => "tool",
            ExtensionType::Library => "library",
            ExtensionType::PromptTemplate => "prompt-template",
            ExtensionType::CodeInterpreter => "code-interpreter",
        }
    }

    /// Exact canonical tag lookup. Legacy aliases live in `migration`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected shape of a manifest field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Array,
    Object,
    Number,
    /// Member of the extension type enumeration.
    ExtensionType,
}

impl FieldType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Number => value.is_number(),
            FieldType::ExtensionType => value
                .as_str()
                .and_then(ExtensionType::from_tag)
                .is_some(),
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, FieldType::ExtensionType)
    }

    pub fn describe(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Array => "array".to_string(),
            FieldType::Object => "object".to_string(),
            FieldType::Number => "number".to_string(),
            FieldType::ExtensionType => {
                let tags: Vec<_> = ExtensionType::ALL.iter().map(|t| t.as_str()).collect();
                format!("one of: {}", tags.join(", "))
            }
        }
    }

    fn to_json(self) -> Value {
        match self {
            FieldType::ExtensionType => {
                Value::from(ExtensionType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>())
            }
            other => Value::from(other.describe()),
        }
    }
}

/// Name of a JSON value's type, for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldType,
}

const fn field(name: &'static str, kind: FieldType) -> FieldSpec {
    FieldSpec { name, kind }
}

pub const REQUIRED_FIELDS: &[FieldSpec] = &[
    field("id", FieldType::String),
    field("title", FieldType::String),
    field("description", FieldType::String),
    field("version", FieldType::String),
    field("author", FieldType::String),
    field("email", FieldType::String),
    field("license", FieldType::String),
    field("type", FieldType::ExtensionType),
    field("category", FieldType::String),
    field("tags", FieldType::Array),
    field("keywords", FieldType::Array),
    field("compatibility", FieldType::Object),
    field("repository", FieldType::String),
    field("mainFile", FieldType::String),
    field("permissions", FieldType::Object),
    field("dependencies", FieldType::Object),
];

/// `downloads`, `averageRating` and `ratingCount` are fed by the registry,
/// not authored.
pub const OPTIONAL_FIELDS: &[FieldSpec] = &[
    field("previewImageUrl", FieldType::String),
    field("icon", FieldType::String),
    field("config", FieldType::Object),
    field("downloads", FieldType::Number),
    field("averageRating", FieldType::Number),
    field("ratingCount", FieldType::Number),
];

/// Key order of a normalized manifest.
pub const CANONICAL_ORDER: &[&str] = &[
    "id",
    "title",
    "description",
    "version",
    "author",
    "email",
    "license",
    "type",
    "category",
    "tags",
    "keywords",
    "compatibility",
    "repository",
    "mainFile",
    "previewImageUrl",
    "icon",
    "permissions",
    "dependencies",
    "config",
];

/// Required key inside `compatibility`.
pub const COMPATIBILITY_VERSION_KEY: &str = "unboundUIVersion";

pub const DEFAULT_EMAIL: &str = "extensions@unboundui.dev";
pub const DEFAULT_LICENSE: &str = "MIT";
pub const DEFAULT_REPOSITORY: &str = "https://github.com/ivanuser/Unbound-UI-extension-marketplace";
pub const DEFAULT_HOST_VERSION_RANGE: &str = ">=1.0.0";

/// Fields backfilled by the normalizer when absent, in application order.
pub const DEFAULTED_FIELDS: &[&str] = &[
    "email",
    "license",
    "compatibility",
    "repository",
    "dependencies",
];

/// Fields that must exist after normalization, created empty when absent.
pub const ENSURED_FIELDS: &[&str] = &["permissions", "tags", "keywords"];

/// Documented default for a backfilled or ensured field.
pub fn default_value(name: &str) -> Option<Value> {
    match name {
        "email" => Some(json!(DEFAULT_EMAIL)),
        "license" => Some(json!(DEFAULT_LICENSE)),
        "compatibility" => Some(json!({ "unboundUIVersion": DEFAULT_HOST_VERSION_RANGE })),
        "repository" => Some(json!(DEFAULT_REPOSITORY)),
        "dependencies" => Some(json!({ "unboundui": DEFAULT_HOST_VERSION_RANGE })),
        "permissions" => Some(json!({})),
        "tags" | "keywords" => Some(json!([])),
        _ => None,
    }
}

pub fn required_field(name: &str) -> Option<&'static FieldSpec> {
    REQUIRED_FIELDS.iter().find(|f| f.name == name)
}

pub fn optional_field(name: &str) -> Option<&'static FieldSpec> {
    OPTIONAL_FIELDS.iter().find(|f| f.name == name)
}

/// Whether `name` belongs to the union of required and optional fields.
pub fn is_known_field(name: &str) -> bool {
    required_field(name).is_some() || optional_field(name).is_some()
}

pub fn is_canonical_field(name: &str) -> bool {
    CANONICAL_ORDER.contains(&name)
}

/// JSON description of the whole schema, used by the `schema` command.
pub fn describe() -> Value {
    let fields = |specs: &[FieldSpec]| -> Map<String, Value> {
        specs
            .iter()
            .map(|f| (f.name.to_string(), f.kind.to_json()))
            .collect()
    };
    let defaults: Map<String, Value> = DEFAULTED_FIELDS
        .iter()
        .chain(ENSURED_FIELDS)
        .filter_map(|name| default_value(name).map(|v| (name.to_string(), v)))
        .collect();

    json!({
        "required": fields(REQUIRED_FIELDS),
        "optional": fields(OPTIONAL_FIELDS),
        "canonicalOrder": CANONICAL_ORDER,
        "defaults": defaults,
        "typeMigrations": crate::migration::describe(),
    })
}
