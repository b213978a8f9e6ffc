//! Manifest Normalizer
//!
//! Upgrades one manifest to canonical form: migrated type, backfilled
//! defaults, canonical key order. Writes only when the result differs.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ManifestError;
use crate::json;
use crate::migration;
use crate::schema::{self, CANONICAL_ORDER, DEFAULTED_FIELDS, ENSURED_FIELDS};

/// What to do with keys outside the canonical order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// Remove them. Lossy, but the established marketplace behaviour.
    #[default]
    Drop,
    /// Keep them after the canonical fields, in their original order.
    Preserve,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub unknown_fields: UnknownFieldPolicy,
    /// Compute the outcome without writing.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Changed,
    Unchanged,
}

/// Canonical manifest plus the keys that did not survive.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub manifest: Map<String, Value>,
    pub dropped_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNormalization {
    pub outcome: NormalizeOutcome,
    pub dropped_fields: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Pure canonicalization of a parsed manifest.
    pub fn canonicalize(&self, mut manifest: Map<String, Value>) -> Normalized {
        if migration::apply_type_migration(&mut manifest) {
            debug!(id = ?manifest.get("id"), "migrated legacy type tag");
        }

        // Only absent keys are filled; existing values (null included) are kept.
        for name in DEFAULTED_FIELDS.iter().chain(ENSURED_FIELDS) {
            if !manifest.contains_key(*name) {
                if let Some(value) = schema::default_value(name) {
                    manifest.insert(name.to_string(), value);
                }
            }
        }

        let mut ordered = Map::with_capacity(manifest.len());
        for name in CANONICAL_ORDER {
            if let Some(value) = manifest.get(*name) {
                ordered.insert(name.to_string(), value.clone());
            }
        }

        let mut dropped_fields = Vec::new();
        for (key, value) in manifest {
            if schema::is_canonical_field(&key) {
                continue;
            }
            match self.options.unknown_fields {
                UnknownFieldPolicy::Drop => dropped_fields.push(key),
                UnknownFieldPolicy::Preserve => {
                    ordered.insert(key, value);
                }
            }
        }

        Normalized { manifest: ordered, dropped_fields }
    }

    /// Normalize the manifest at `path`, rewriting it if its canonical form differs.
    pub fn normalize_file(&self, path: &Path) -> Result<FileNormalization, ManifestError> {
        let manifest = json::read_object(path)?;
        let original = json::to_pretty(&manifest)?;

        let Normalized { manifest, dropped_fields } = self.canonicalize(manifest);
        if !dropped_fields.is_empty() {
            warn!(
                path = %path.display(),
                fields = ?dropped_fields,
                "dropping non-canonical fields"
            );
        }

        let canonical = json::to_pretty(&manifest)?;
        if canonical == original {
            debug!(path = %path.display(), "manifest already canonical");
            return Ok(FileNormalization { outcome: NormalizeOutcome::Unchanged, dropped_fields });
        }

        if self.options.dry_run {
            debug!(path = %path.display(), "dry run, not writing");
        } else {
            json::write_pretty(path, &canonical)?;
        }
        Ok(FileNormalization { outcome: NormalizeOutcome::Changed, dropped_fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn keys(map: &Map<String, Value>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_canonical_order_and_defaults() {
        let normalized = Normalizer::default().canonicalize(object(json!({
            "mainFile": "index.js",
            "type": "prompt-templates",
            "id": "prompt-library",
            "title": "Prompt Library"
        })));

        assert!(normalized.dropped_fields.is_empty());
        assert_eq!(
            keys(&normalized.manifest),
            vec![
                "id", "title", "email", "license", "type", "tags", "keywords", "compatibility",
                "repository", "mainFile", "permissions", "dependencies",
            ]
        );
        assert_eq!(normalized.manifest["type"], json!("prompt-template"));
        assert_eq!(normalized.manifest["dependencies"], json!({"unboundui": ">=1.0.0"}));
        assert_eq!(normalized.manifest["permissions"], json!({}));
    }

    #[test]
    fn test_existing_values_not_clobbered() {
        let normalized = Normalizer::default().canonicalize(object(json!({
            "license": "Apache-2.0",
            "email": null,
            "compatibility": {"unboundUIVersion": ">=2.0.0"}
        })));

        assert_eq!(normalized.manifest["license"], json!("Apache-2.0"));
        assert_eq!(normalized.manifest["email"], Value::Null);
        assert_eq!(normalized.manifest["compatibility"], json!({"unboundUIVersion": ">=2.0.0"}));
    }

    #[test]
    fn test_unknown_fields_dropped_by_default() {
        let normalized = Normalizer::default().canonicalize(object(json!({
            "id": "x",
            "homepage": "https://example.com",
            "downloads": 10
        })));

        assert!(!normalized.manifest.contains_key("homepage"));
        assert!(!normalized.manifest.contains_key("downloads"));
        assert_eq!(normalized.dropped_fields, vec!["homepage", "downloads"]);
    }

    #[test]
    fn test_unknown_fields_preserved_after_canonical() {
        let normalizer = Normalizer::new(NormalizeOptions {
            unknown_fields: UnknownFieldPolicy::Preserve,
            dry_run: false,
        });
        let normalized = normalizer.canonicalize(object(json!({
            "zeta": 1,
            "id": "x",
            "alpha": 2
        })));

        let keys = keys(&normalized.manifest);
        assert_eq!(keys.first(), Some(&"id"));
        assert_eq!(&keys[keys.len() - 2..], &["zeta", "alpha"]);
        assert!(normalized.dropped_fields.is_empty());
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let normalizer = Normalizer::default();
        let once = normalizer.canonicalize(object(json!({
            "keywords": ["a"],
            "type": "prompt-templates",
            "custom": true,
            "id": "x"
        })));
        let twice = normalizer.canonicalize(once.manifest.clone());

        assert_eq!(
            json::to_pretty(&once.manifest).unwrap(),
            json::to_pretty(&twice.manifest).unwrap()
        );
        assert!(twice.dropped_fields.is_empty());
    }
}
