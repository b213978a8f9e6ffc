//! Aggregated Feed Updater
//!
//! Keeps the marketplace feed's `type` and `keywords` consistent with the
//! migration table. The feed is rewritten in one pass, and only on change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ManifestError;
use crate::json;
use crate::migration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedOutcome {
    /// `records` is the number of records that changed.
    Updated { records: usize },
    Unchanged,
    /// No feed file at the configured path.
    Missing,
}

/// Migrate every record in place, returning how many changed.
/// Records that are not objects are left alone.
pub fn migrate_records(records: &mut [Value]) -> usize {
    records
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .map(|record| {
            let type_changed = migration::apply_type_migration(record);
            let keywords_changed = migration::apply_keyword_migration(record);
            type_changed || keywords_changed
        })
        .filter(|changed| *changed)
        .count()
}

pub fn update_feed(path: &Path, dry_run: bool) -> Result<FeedOutcome, ManifestError> {
    if !path.is_file() {
        info!(path = %path.display(), "feed file not found, skipping");
        return Ok(FeedOutcome::Missing);
    }

    let mut records = json::read_array(path)?;
    let changed = migrate_records(&mut records);
    if changed == 0 {
        debug!(path = %path.display(), "feed already compliant");
        return Ok(FeedOutcome::Unchanged);
    }

    if dry_run {
        debug!(path = %path.display(), records = changed, "dry run, not writing feed");
    } else {
        json::write_pretty(path, &json::to_pretty(&records)?)?;
        info!(path = %path.display(), records = changed, "updated feed");
    }
    Ok(FeedOutcome::Updated { records: changed })
}
