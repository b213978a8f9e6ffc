//! Maintenance Pipeline - Registry Runs
//!
//! `update` walks the registry through the normalizer then migrates the
//! marketplace feed. `validate` walks it through the validator and produces
//! the publishing gate. A missing manifest is a skip for the former and a
//! hard error for the latter.

use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::error::ManifestError;
use crate::feed;
use crate::layout::RegistryLayout;
use crate::normalize::{FileNormalization, NormalizeOptions, Normalizer};
use crate::registry::ExtensionRegistry;
use crate::report::{
    EntryStatus, FeedStatus, NormalizationEntry, NormalizationReport, ValidationReport,
};
use crate::validation::{FileValidation, ValidationResult, ValidationViolation, Validator};

pub struct MaintenancePipeline {
    layout: RegistryLayout,
    normalizer: Normalizer,
    validator: Validator,
}

impl MaintenancePipeline {
    pub fn new(layout: RegistryLayout) -> Self {
        Self::with_options(layout, NormalizeOptions::default())
    }

    pub fn with_options(layout: RegistryLayout, options: NormalizeOptions) -> Self {
        Self {
            layout,
            normalizer: Normalizer::new(options),
            validator: Validator::new(),
        }
    }

    pub fn layout(&self) -> &RegistryLayout {
        &self.layout
    }

    /// Normalize every manifest, then the feed. Only a missing registry root
    /// is fatal; per-manifest and feed failures land in the report.
    pub fn update(&self) -> Result<NormalizationReport, ManifestError> {
        let registry = ExtensionRegistry::load_from_dir(&self.layout.extensions_dir)?;
        let dry_run = self.normalizer.options().dry_run;
        let mut report = NormalizationReport::new(dry_run);

        for extension in registry.extensions() {
            if !extension.has_manifest() {
                info!(extension = %extension.name, "no manifest.json, skipping");
                report.record_skipped(&extension.name);
                continue;
            }

            let entry = match self.normalizer.normalize_file(&extension.manifest_path()) {
                Ok(FileNormalization { outcome, dropped_fields }) => {
                    info!(extension = %extension.name, ?outcome, "processed manifest");
                    NormalizationEntry {
                        extension: extension.name.clone(),
                        status: outcome.into(),
                        dropped_fields,
                    }
                }
                Err(e) => {
                    error!(extension = %extension.name, error = %e, "failed to normalize manifest");
                    NormalizationEntry {
                        extension: extension.name.clone(),
                        status: EntryStatus::Failed { error: e.to_string() },
                        dropped_fields: vec![],
                    }
                }
            };
            report.record(entry);
        }

        report.feed = match feed::update_feed(&self.layout.feed_path, dry_run) {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                error!(
                    path = %self.layout.feed_path.display(),
                    error = %e,
                    "failed to update feed"
                );
                FeedStatus::Failed { error: e.to_string() }
            }
        };

        info!(
            total = report.total,
            updated = report.updated,
            failed = report.failed,
            "update complete"
        );
        Ok(report)
    }

    /// Validate every manifest. The report's `is_valid` is the CI gate.
    pub fn validate(&self) -> Result<ValidationReport, ManifestError> {
        let registry = ExtensionRegistry::load_from_dir(&self.layout.extensions_dir)?;
        let mut report = ValidationReport::new();
        let mut results = Vec::with_capacity(registry.len());
        let mut ids: HashMap<String, Vec<usize>> = HashMap::new();

        for extension in registry.extensions() {
            if !extension.has_manifest() {
                warn!(extension = %extension.name, "no manifest.json found");
                report.record_missing_manifest(&extension.name);
                continue;
            }

            let FileValidation { result, id } =
                self.validator.validate_file(&extension.manifest_path(), &extension.name);
            if let Some(id) = id {
                ids.entry(id).or_default().push(results.len());
            }
            results.push(result);
        }

        flag_duplicate_ids(&mut results, &ids);

        for result in results {
            if result.valid {
                let warnings = result.warnings().count();
                info!(extension = %result.extension, warnings, "manifest valid");
            } else {
                let errors = result.errors().count();
                warn!(extension = %result.extension, errors, "manifest invalid");
            }
            report.record(result);
        }

        info!(
            total = report.total,
            valid = report.valid,
            passed = report.is_valid(),
            "validation complete"
        );
        Ok(report)
    }
}

/// Ids must be unique across the registry. Duplicates are advisory so the
/// gate stays defined by per-manifest validity and manifest presence.
fn flag_duplicate_ids(results: &mut [ValidationResult], ids: &HashMap<String, Vec<usize>>) {
    for (id, owners) in ids {
        if owners.len() < 2 {
            continue;
        }
        for &index in owners {
            let others: Vec<&str> = owners
                .iter()
                .filter(|&&other| other != index)
                .map(|&other| results[other].extension.as_str())
                .collect();
            let message = format!("Duplicate id '{}' also used by {}", id, others.join(", "));
            results[index]
                .violations
                .push(ValidationViolation::warning("duplicate_id", Some("id"), message));
        }
    }
}
