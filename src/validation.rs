//! Validation System - Rules Produce Violations
//!
//! Every rule runs on every manifest so one pass reports all findings.
//! Errors block publication; warnings are advisory and never affect validity.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::error;

use crate::error::ManifestError;
use crate::json;
use crate::migration::DEPRECATED_PROMPT_TEMPLATES;
use crate::schema::{
    self, json_type_name, COMPATIBILITY_VERSION_KEY, OPTIONAL_FIELDS, REQUIRED_FIELDS,
};

static SEMVER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+").expect("semver prefix pattern is valid"));

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationViolation {
    pub fn error(rule: &str, field: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(rule, ViolationSeverity::Error, field, message.into())
    }

    pub fn warning(rule: &str, field: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(rule, ViolationSeverity::Warning, field, message.into())
    }

    fn new(rule: &str, severity: ViolationSeverity, field: Option<&str>, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            field: field.map(str::to_string),
            message,
            expected: None,
            actual: None,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    /// A manifest that could not be read or parsed.
    pub fn load_failure(error: &ManifestError) -> Self {
        let rule = if error.is_parse_error() { "parse" } else { "io" };
        Self::error(rule, None, error.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.severity == ViolationSeverity::Error
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Extension directory name.
    pub extension: String,
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn from_violations(
        extension: impl Into<String>,
        violations: Vec<ValidationViolation>,
    ) -> Self {
        let valid = !violations.iter().any(ValidationViolation::is_error);
        Self {
            extension: extension.into(),
            valid,
            violations,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.valid
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| !v.is_error())
    }

    /// Whether any violation came from `rule`.
    pub fn has_rule(&self, rule: &str) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }
}

/// A parsed manifest and where it lives.
#[derive(Debug, Clone, Copy)]
pub struct ManifestInput<'a> {
    pub extension: &'a str,
    /// Directory relative file references resolve against.
    pub base_dir: &'a Path,
    pub manifest: &'a Map<String, Value>,
}

impl ManifestInput<'_> {
    fn non_empty_str(&self, field: &str) -> Option<&str> {
        self.manifest
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Resolve a manifest file reference inside the manifest's directory.
    /// Root and prefix components are ignored, so `/src/index.js` names
    /// `<base_dir>/src/index.js` and never a host path.
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let relative: PathBuf = Path::new(reference)
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect();
        self.base_dir.join(relative)
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct RequiredFieldsRule;

impl ValidationRule for RequiredFieldsRule {
    fn name(&self) -> &'static str { "required_fields" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        let mut violations = vec![];

        for spec in REQUIRED_FIELDS {
            let Some(value) = input.manifest.get(spec.name) else {
                violations.push(ValidationViolation::error(
                    self.name(),
                    Some(spec.name),
                    format!("Missing required field '{}'", spec.name),
                ));
                continue;
            };

            if spec.kind.matches(value) {
                continue;
            }

            let violation = if spec.kind.is_enum() {
                ValidationViolation::error(
                    self.name(),
                    Some(spec.name),
                    format!("Invalid value for '{}'", spec.name),
                )
                .with_actual(value.to_string())
            } else {
                ValidationViolation::error(
                    self.name(),
                    Some(spec.name),
                    format!("Wrong type for '{}'", spec.name),
                )
                .with_actual(json_type_name(value))
            };
            violations.push(violation.with_expected(spec.kind.describe()));
        }

        violations
    }
}

pub struct OptionalFieldTypesRule;

impl ValidationRule for OptionalFieldTypesRule {
    fn name(&self) -> &'static str { "optional_field_types" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        OPTIONAL_FIELDS
            .iter()
            .filter_map(|spec| {
                let value = input.manifest.get(spec.name)?;
                (!spec.kind.matches(value)).then(|| {
                    ValidationViolation::warning(
                        self.name(),
                        Some(spec.name),
                        format!("Wrong type for optional field '{}'", spec.name),
                    )
                    .with_expected(spec.kind.describe())
                    .with_actual(json_type_name(value))
                })
            })
            .collect()
    }
}

pub struct UnknownFieldsRule;

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &'static str { "unknown_fields" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        input
            .manifest
            .keys()
            .filter(|key| !schema::is_known_field(key))
            .map(|key| {
                let message = format!("Unknown field '{}'", key);
                ValidationViolation::warning(self.name(), Some(key.as_str()), message)
            })
            .collect()
    }
}

pub struct VersionFormatRule;

impl ValidationRule for VersionFormatRule {
    fn name(&self) -> &'static str { "version_format" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        let actual = match input.manifest.get("version") {
            None | Some(Value::Null) => return vec![],
            Some(Value::String(version)) if version.is_empty() => return vec![],
            Some(Value::String(version)) if SEMVER_PREFIX.is_match(version) => return vec![],
            Some(Value::String(version)) => version.clone(),
            Some(other) => other.to_string(),
        };
        let message = "Non-standard version format";
        vec![ValidationViolation::warning(self.name(), Some("version"), message)
            .with_expected("x.y.z")
            .with_actual(actual)]
    }
}

pub struct MainFileRule;

impl ValidationRule for MainFileRule {
    fn name(&self) -> &'static str { "main_file" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        // Absence is reported by RequiredFieldsRule; nothing to resolve here.
        let Some(main_file) = input.non_empty_str("mainFile") else {
            return vec![];
        };
        if input.resolve(main_file).exists() {
            return vec![];
        }
        vec![ValidationViolation::error(self.name(), Some("mainFile"), "mainFile not found")
            .with_actual(main_file)]
    }
}

pub struct AssetFilesRule;

impl ValidationRule for AssetFilesRule {
    fn name(&self) -> &'static str { "asset_files" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        [("icon", "Icon file not found"), ("previewImageUrl", "Preview image not found")]
            .into_iter()
            .filter_map(|(field, message)| {
                let path = input.non_empty_str(field)?;
                (!input.resolve(path).exists()).then(|| {
                    ValidationViolation::warning(self.name(), Some(field), message)
                        .with_actual(path)
                })
            })
            .collect()
    }
}

pub struct CompatibilityRule;

impl ValidationRule for CompatibilityRule {
    fn name(&self) -> &'static str { "compatibility" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        let compatibility = input.manifest.get("compatibility").filter(|c| !c.is_null());
        let Some(compatibility) = compatibility else {
            return vec![];
        };
        let declared = compatibility
            .get(COMPATIBILITY_VERSION_KEY)
            .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
        if declared {
            return vec![];
        }
        vec![ValidationViolation::error(
            self.name(),
            Some("compatibility"),
            format!("Missing compatibility.{}", COMPATIBILITY_VERSION_KEY),
        )]
    }
}

/// Host version constraints must be parseable ranges.
pub struct VersionRangeRule;

impl VersionRangeRule {
    fn check(&self, field: &str, label: &str, value: &Value) -> Option<ValidationViolation> {
        let parsed = value.as_str().map(semver::VersionReq::parse);
        match parsed {
            Some(Ok(_)) => None,
            _ => Some(
                ValidationViolation::warning(
                    self.name(),
                    Some(field),
                    format!("Unparseable version range for {}", label),
                )
                .with_expected("semver range, e.g. >=1.0.0")
                .with_actual(value.to_string()),
            ),
        }
    }
}

impl ValidationRule for VersionRangeRule {
    fn name(&self) -> &'static str { "version_ranges" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        let mut violations = vec![];

        if let Some(range) = input
            .manifest
            .get("compatibility")
            .and_then(|c| c.get(COMPATIBILITY_VERSION_KEY))
            .filter(|v| !v.is_null())
        {
            let label = format!("compatibility.{}", COMPATIBILITY_VERSION_KEY);
            violations.extend(self.check("compatibility", &label, range));
        }

        if let Some(Value::Object(dependencies)) = input.manifest.get("dependencies") {
            for (name, range) in dependencies {
                let label = format!("dependencies.{}", name);
                violations.extend(self.check("dependencies", &label, range));
            }
        }

        violations
    }
}

/// The deprecated plural tag must never reach the marketplace, even though
/// enum conformance already rejects it.
pub struct LegacyTypeRule;

impl ValidationRule for LegacyTypeRule {
    fn name(&self) -> &'static str { "legacy_type" }

    fn validate(&self, input: &ManifestInput<'_>) -> Vec<ValidationViolation> {
        if input.manifest.get("type").and_then(Value::as_str) != Some(DEPRECATED_PROMPT_TEMPLATES) {
            return vec![];
        }
        vec![ValidationViolation::error(
            self.name(),
            Some("type"),
            "Type mismatch - should be 'prompt-template'",
        )
        .with_expected("prompt-template")
        .with_actual(DEPRECATED_PROMPT_TEMPLATES)]
    }
}

/// Validator runs every rule and derives validity from errors alone.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(RequiredFieldsRule),
                Box::new(OptionalFieldTypesRule),
                Box::new(UnknownFieldsRule),
                Box::new(VersionFormatRule),
                Box::new(MainFileRule),
                Box::new(AssetFilesRule),
                Box::new(CompatibilityRule),
                Box::new(VersionRangeRule),
                Box::new(LegacyTypeRule),
            ],
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, input: &ManifestInput<'_>) -> ValidationResult {
        let violations = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(input))
            .collect();
        ValidationResult::from_violations(input.extension, violations)
    }

    /// Load and validate one manifest. Unreadable or malformed files become
    /// a single error violation instead of aborting the batch.
    pub fn validate_file(&self, path: &Path, extension: &str) -> FileValidation {
        let manifest = match json::read_object(path) {
            Ok(manifest) => manifest,
            Err(e) => {
                error!(extension, error = %e, "failed to load manifest");
                let violations = vec![ValidationViolation::load_failure(&e)];
                return FileValidation {
                    result: ValidationResult::from_violations(extension, violations),
                    id: None,
                };
            }
        };
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let result = self.validate(&ManifestInput { extension, base_dir, manifest: &manifest });
        FileValidation {
            result,
            id: manifest.get("id").and_then(Value::as_str).map(str::to_string),
        }
    }
}

/// Result of validating a manifest file, plus its declared id when it
/// parsed and carried a string one.
#[derive(Debug, Clone)]
pub struct FileValidation {
    pub result: ValidationResult,
    pub id: Option<String>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(rule: &dyn ValidationRule, manifest: Value, dir: &Path) -> Vec<ValidationViolation> {
        let manifest = manifest.as_object().cloned().unwrap();
        rule.validate(&ManifestInput { extension: "ext", base_dir: dir, manifest: &manifest })
    }

    #[test]
    fn test_required_fields_reports_missing_and_wrong_types() {
        let dir = tempfile::tempdir().unwrap();
        let violations = run(
            &RequiredFieldsRule,
            json!({"id": 7, "type": "plugin", "tags": "a"}),
            dir.path(),
        );

        let field = |name: &str| {
            violations.iter().find(|v| v.field.as_deref() == Some(name)).unwrap()
        };
        assert_eq!(field("id").message, "Wrong type for 'id'");
        assert_eq!(field("id").actual.as_deref(), Some("number"));
        assert_eq!(field("type").message, "Invalid value for 'type'");
        assert_eq!(field("tags").message, "Wrong type for 'tags'");
        assert_eq!(field("mainFile").message, "Missing required field 'mainFile'");
        assert!(violations.iter().all(ValidationViolation::is_error));
        // 16 required fields: 13 missing + 3 wrong
        assert_eq!(violations.len(), 16);
    }

    #[test]
    fn test_version_format_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let v = run(&VersionFormatRule, json!({"version": "v1"}), dir.path());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].severity, ViolationSeverity::Warning);

        assert!(run(&VersionFormatRule, json!({"version": "1.2.3-beta.1"}), dir.path()).is_empty());
        assert!(run(&VersionFormatRule, json!({"version": "1.2.3.4"}), dir.path()).is_empty());
        assert!(run(&VersionFormatRule, json!({"version": ""}), dir.path()).is_empty());
        assert!(run(&VersionFormatRule, json!({}), dir.path()).is_empty());
    }

    #[test]
    fn test_version_format_warns_on_non_string() {
        let dir = tempfile::tempdir().unwrap();
        let v = run(&VersionFormatRule, json!({"version": 1}), dir.path());
        assert_eq!(v.len(), 1);
        assert!(!v[0].is_error());
        assert_eq!(v[0].actual.as_deref(), Some("1"));
    }

    #[test]
    fn test_optional_field_types_only_warn() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = json!({"downloads": "many", "icon": 3, "averageRating": 4.5});
        let v = run(&OptionalFieldTypesRule, manifest, dir.path());

        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|v| !v.is_error()));
        let fields: Vec<_> = v.iter().filter_map(|v| v.field.as_deref()).collect();
        assert!(fields.contains(&"downloads"));
        assert!(fields.contains(&"icon"));

        let result = ValidationResult::from_violations("ext", v);
        assert!(result.valid);
    }

    #[test]
    fn test_main_file_resolved_against_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.js"), "").unwrap();

        assert!(run(&MainFileRule, json!({"mainFile": "index.js"}), dir.path()).is_empty());
        let missing = run(&MainFileRule, json!({"mainFile": "src/main.js"}), dir.path());
        assert_eq!(missing.len(), 1);
        assert!(missing[0].is_error());
        assert!(run(&MainFileRule, json!({}), dir.path()).is_empty());
    }

    #[test]
    fn test_leading_slash_stays_inside_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/index.js"), "").unwrap();

        assert!(run(&MainFileRule, json!({"mainFile": "/src/index.js"}), dir.path()).is_empty());
    }

    #[test]
    fn test_host_absolute_path_is_not_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let host_file = tempfile::NamedTempFile::new().unwrap();
        let host_path = host_file.path().to_str().unwrap().to_string();
        assert!(host_file.path().is_absolute());

        let missing = run(&MainFileRule, json!({"mainFile": host_path.clone()}), dir.path());
        assert_eq!(missing.len(), 1);
        assert!(missing[0].is_error());

        let icon = run(&AssetFilesRule, json!({"icon": host_path}), dir.path());
        assert_eq!(icon.len(), 1);
        assert_eq!(icon[0].field.as_deref(), Some("icon"));
    }

    #[test]
    fn test_asset_files_only_warn() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = json!({"icon": "icon.png", "previewImageUrl": "p.png"});
        let v = run(&AssetFilesRule, manifest, dir.path());
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|v| !v.is_error()));
    }

    #[test]
    fn test_compatibility_requires_host_version() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run(&CompatibilityRule, json!({"compatibility": {}}), dir.path()).len(), 1);
        assert_eq!(run(&CompatibilityRule, json!({"compatibility": "any"}), dir.path()).len(), 1);
        assert!(run(&CompatibilityRule, json!({}), dir.path()).is_empty());
        assert!(run(
            &CompatibilityRule,
            json!({"compatibility": {"unboundUIVersion": ">=1.0.0"}}),
            dir.path()
        )
        .is_empty());
    }

    #[test]
    fn test_version_ranges_warn_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let v = run(
            &VersionRangeRule,
            json!({
                "compatibility": {"unboundUIVersion": ">=1.0.0"},
                "dependencies": {"unboundui": "latest", "other": "^2.1"}
            }),
            dir.path(),
        );
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].field.as_deref(), Some("dependencies"));
        assert!(!v[0].is_error());
    }

    #[test]
    fn test_legacy_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let v = run(&LegacyTypeRule, json!({"type": "prompt-templates"}), dir.path());
        assert_eq!(v.len(), 1);
        assert!(v[0].is_error());
        assert!(run(&LegacyTypeRule, json!({"type": "prompt-template"}), dir.path()).is_empty());
    }

    #[test]
    fn test_custom_rule_set() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::with_rules(vec![Box::new(LegacyTypeRule)]);
        assert_eq!(validator.rule_names(), vec!["legacy_type"]);

        let manifest = json!({"type": "prompt-templates"}).as_object().cloned().unwrap();
        let input = ManifestInput { extension: "ext", base_dir: dir.path(), manifest: &manifest };
        let result = validator.validate(&input);
        assert!(!result.valid);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.extension, "ext");
    }

    #[test]
    fn test_warnings_do_not_affect_validity() {
        let result = ValidationResult::from_violations(
            "ext",
            vec![ValidationViolation::warning("unknown_fields", Some("x"), "Unknown field 'x'")],
        );
        assert!(result.valid);
        assert_eq!(result.warnings().count(), 1);
        assert_eq!(result.errors().count(), 0);
    }
}
