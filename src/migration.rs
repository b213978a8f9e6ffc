//! Type Migration Table
//!
//! Maps every type tag ever published to its canonical form. Canonical tags
//! map to themselves so migration is idempotent.

use serde_json::{Map, Value};

use crate::schema::ExtensionType;

/// Plural tag used by early prompt-template extensions. Never publishable.
pub const DEPRECATED_PROMPT_TEMPLATES: &str = "prompt-templates";

const TYPE_MIGRATIONS: &[(&str, ExtensionType)] = &[
    (DEPRECATED_PROMPT_TEMPLATES, ExtensionType::PromptTemplate),
    ("prompt-template", ExtensionType::PromptTemplate),
    ("theme", ExtensionType::Theme),
    ("tool", ExtensionType::Tool),
    ("library", ExtensionType::Library),
    ("code-interpreter", ExtensionType::CodeInterpreter),
];

/// Canonical type for a known tag, legacy or current. `None` for unknown tags.
pub fn migrate_type(tag: &str) -> Option<ExtensionType> {
    TYPE_MIGRATIONS
        .iter()
        .find(|(legacy, _)| *legacy == tag)
        .map(|(_, canonical)| *canonical)
}

/// Whether `tag` is known but not canonical.
pub fn is_legacy_type(tag: &str) -> bool {
    migrate_type(tag).is_some_and(|t| t.as_str() != tag)
}

/// Replacement for a deprecated keyword, if any.
pub fn migrate_keyword(keyword: &str) -> Option<&'static str> {
    (keyword == DEPRECATED_PROMPT_TEMPLATES).then(|| ExtensionType::PromptTemplate.as_str())
}

/// Rewrite `type` in place. Returns true if the value changed.
pub fn apply_type_migration(record: &mut Map<String, Value>) -> bool {
    let Some(Value::String(tag)) = record.get_mut("type") else {
        return false;
    };
    match migrate_type(tag) {
        Some(canonical) if canonical.as_str() != tag.as_str() => {
            *tag = canonical.as_str().to_string();
            true
        }
        _ => false,
    }
}

/// Rewrite deprecated entries of a `keywords` array in place.
pub fn apply_keyword_migration(record: &mut Map<String, Value>) -> bool {
    let Some(Value::Array(keywords)) = record.get_mut("keywords") else {
        return false;
    };
    let mut changed = false;
    for keyword in keywords.iter_mut() {
        if let Some(replacement) = keyword.as_str().and_then(migrate_keyword) {
            *keyword = Value::from(replacement);
            changed = true;
        }
    }
    changed
}

pub(crate) fn describe() -> Value {
    TYPE_MIGRATIONS
        .iter()
        .map(|(legacy, canonical)| (legacy.to_string(), Value::from(canonical.as_str())))
        .collect::<Map<_, _>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_is_total_over_canonical_types() {
        for t in ExtensionType::ALL {
            assert_eq!(migrate_type(t.as_str()), Some(t));
            assert!(!is_legacy_type(t.as_str()));
        }
    }

    #[test]
    fn test_migration_is_idempotent() {
        for (legacy, _) in TYPE_MIGRATIONS {
            let once = migrate_type(legacy).unwrap();
            assert_eq!(migrate_type(once.as_str()), Some(once));
        }
    }

    #[test]
    fn test_legacy_prompt_templates() {
        assert!(is_legacy_type("prompt-templates"));
        assert_eq!(migrate_type("prompt-templates"), Some(ExtensionType::PromptTemplate));
        assert_eq!(migrate_type("widget"), None);
    }

    #[test]
    fn test_apply_type_migration_in_place() {
        let mut record = json!({"type": "prompt-templates"}).as_object().cloned().unwrap();
        assert!(apply_type_migration(&mut record));
        assert_eq!(record["type"], json!("prompt-template"));
        assert!(!apply_type_migration(&mut record));

        let mut unknown = json!({"type": "widget"}).as_object().cloned().unwrap();
        assert!(!apply_type_migration(&mut unknown));
        assert_eq!(unknown["type"], json!("widget"));
    }

    #[test]
    fn test_keyword_migration_only_touches_deprecated_literal() {
        let mut record = json!({"keywords": ["prompt-templates", "ai", 3]})
            .as_object()
            .cloned()
            .unwrap();
        assert!(apply_keyword_migration(&mut record));
        assert_eq!(record["keywords"], json!(["prompt-template", "ai", 3]));
        assert!(!apply_keyword_migration(&mut record));
    }
}
