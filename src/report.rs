//! Run reports
//!
//! Aggregates per-extension outcomes for one registry run. `Display` renders
//! the operator-facing text; `Serialize` backs `--json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::feed::FeedOutcome;
use crate::normalize::NormalizeOutcome;
use crate::validation::{ValidationResult, ValidationViolation};

/// One actionable finding, attributed to an extension and optionally a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ReportMessage {
    fn from_violation(extension: &str, violation: &ValidationViolation) -> Self {
        Self {
            extension: extension.to_string(),
            field: violation.field.clone(),
            message: violation.message.clone(),
        }
    }
}

impl fmt::Display for ReportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.extension, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub checked_at: DateTime<Utc>,
    /// Manifests found and validated.
    pub total: usize,
    pub valid: usize,
    /// Extension directories without a manifest file.
    pub missing_manifests: Vec<String>,
    pub results: Vec<ValidationResult>,
    pub errors: Vec<ReportMessage>,
    pub warnings: Vec<ReportMessage>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            checked_at: Utc::now(),
            total: 0,
            valid: 0,
            missing_manifests: vec![],
            results: vec![],
            errors: vec![],
            warnings: vec![],
        }
    }

    pub fn record(&mut self, result: ValidationResult) {
        self.total += 1;
        if result.valid {
            self.valid += 1;
        }
        for violation in &result.violations {
            let message = ReportMessage::from_violation(&result.extension, violation);
            if violation.is_error() {
                self.errors.push(message);
            } else {
                self.warnings.push(message);
            }
        }
        self.results.push(result);
    }

    pub fn record_missing_manifest(&mut self, extension: &str) {
        self.missing_manifests.push(extension.to_string());
        self.errors.push(ReportMessage {
            extension: extension.to_string(),
            field: None,
            message: "No manifest.json found".to_string(),
        });
    }

    pub fn invalid(&self) -> usize {
        self.total - self.valid
    }

    /// Batch gate: every manifest valid and no directory without one.
    pub fn is_valid(&self) -> bool {
        self.valid == self.total && self.missing_manifests.is_empty()
    }

    pub fn result(&self, extension: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.extension == extension)
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extension Manifest Schema Validation")?;
        writeln!(f, "====================================")?;

        for result in &self.results {
            writeln!(f, "\n{}", result.extension)?;
            for violation in &result.violations {
                let marker = if violation.is_error() { "error" } else { "warning" };
                write!(f, "  {}: {}", marker, violation.message)?;
                match (&violation.expected, &violation.actual) {
                    (Some(expected), Some(actual)) => {
                        write!(f, " (expected {}, got {})", expected, actual)?
                    }
                    (None, Some(actual)) => write!(f, " ({})", actual)?,
                    _ => {}
                }
                writeln!(f)?;
            }
            let status = match (result.valid, result.warnings().next().is_some()) {
                (true, false) => "all validations passed",
                (true, true) => "valid with warnings",
                (false, _) => "invalid",
            };
            writeln!(f, "  {}", status)?;
        }
        for extension in &self.missing_manifests {
            writeln!(f, "\n{}\n  error: No manifest.json found", extension)?;
        }

        writeln!(f, "\nValidation Summary")?;
        writeln!(f, "==================")?;
        writeln!(f, "Total extensions checked: {}", self.total)?;
        writeln!(f, "Valid manifests: {}", self.valid)?;
        writeln!(f, "Invalid manifests: {}", self.invalid())?;
        writeln!(f, "Missing manifests: {}", self.missing_manifests.len())?;
        writeln!(f, "Total warnings: {}", self.warnings.len())?;

        if !self.errors.is_empty() {
            writeln!(f, "\nErrors found:")?;
            for error in &self.errors {
                writeln!(f, "  - {}", error)?;
            }
        }
        if !self.warnings.is_empty() {
            writeln!(f, "\nWarnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
        }

        if self.is_valid() {
            writeln!(f, "\nAll extension manifests are valid and comply with the unified schema.")
        } else {
            writeln!(f, "\nSome manifests need attention. Fix the errors listed above.")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Updated,
    Unchanged,
    Failed { error: String },
}

impl From<NormalizeOutcome> for EntryStatus {
    fn from(outcome: NormalizeOutcome) -> Self {
        match outcome {
            NormalizeOutcome::Changed => EntryStatus::Updated,
            NormalizeOutcome::Unchanged => EntryStatus::Unchanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationEntry {
    pub extension: String,
    #[serde(flatten)]
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedStatus {
    Updated { records: usize },
    Unchanged,
    Missing,
    Failed { error: String },
}

impl From<FeedOutcome> for FeedStatus {
    fn from(outcome: FeedOutcome) -> Self {
        match outcome {
            FeedOutcome::Updated { records } => FeedStatus::Updated { records },
            FeedOutcome::Unchanged => FeedStatus::Unchanged,
            FeedOutcome::Missing => FeedStatus::Missing,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    /// Manifests found and processed, including ones that failed to parse.
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
    /// Extension directories without a manifest file; skipped, not failures.
    pub skipped: Vec<String>,
    pub entries: Vec<NormalizationEntry>,
    pub feed: FeedStatus,
}

impl NormalizationReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            dry_run,
            total: 0,
            updated: 0,
            failed: 0,
            skipped: vec![],
            entries: vec![],
            feed: FeedStatus::Missing,
        }
    }

    pub fn record(&mut self, entry: NormalizationEntry) {
        self.total += 1;
        match entry.status {
            EntryStatus::Updated => self.updated += 1,
            EntryStatus::Failed { .. } => self.failed += 1,
            EntryStatus::Unchanged => {}
        }
        self.entries.push(entry);
    }

    pub fn record_skipped(&mut self, extension: &str) {
        self.skipped.push(extension.to_string());
    }

    /// Manifests that needed no change.
    pub fn compliant(&self) -> usize {
        self.total - self.updated - self.failed
    }

    pub fn entry(&self, extension: &str) -> Option<&NormalizationEntry> {
        self.entries.iter().find(|e| e.extension == extension)
    }
}

impl fmt::Display for NormalizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "Would update" } else { "Updated" };

        writeln!(f, "Manifest update")?;
        for entry in &self.entries {
            match &entry.status {
                EntryStatus::Updated => writeln!(f, "  {} {}", verb, entry.extension)?,
                EntryStatus::Unchanged => {
                    writeln!(f, "  No changes needed for {}", entry.extension)?
                }
                EntryStatus::Failed { error } => {
                    writeln!(f, "  Error processing {}: {}", entry.extension, error)?
                }
            }
            if !entry.dropped_fields.is_empty() {
                writeln!(f, "    dropped fields: {}", entry.dropped_fields.join(", "))?;
            }
        }
        for extension in &self.skipped {
            writeln!(f, "  Skipped {} (no manifest.json)", extension)?;
        }

        writeln!(f, "\nSummary:")?;
        writeln!(f, "- Total extensions processed: {}", self.total)?;
        writeln!(f, "- Manifests updated: {}", self.updated)?;
        writeln!(f, "- Manifests already compliant: {}", self.compliant())?;
        if self.failed > 0 {
            writeln!(f, "- Manifests with errors: {}", self.failed)?;
        }

        writeln!(f, "\nMarketplace feed:")?;
        match &self.feed {
            FeedStatus::Updated { records } => writeln!(f, "  {} feed ({} records)", verb, records),
            FeedStatus::Unchanged => writeln!(f, "  Feed already compliant"),
            FeedStatus::Missing => writeln!(f, "  Feed file not found"),
            FeedStatus::Failed { error } => writeln!(f, "  Error updating feed: {}", error),
        }
    }
}
