//! UnboundUI Manifests - Extension Descriptor Maintenance
//!
//! # Contracts
//! 1. One schema, read by every component
//! 2. Normalization is idempotent and writes only on change
//! 3. Every validation rule runs; only errors block publication
//! 4. One bad manifest never stops the batch
//! 5. The feed follows the same type migrations as the manifests

pub mod error;
pub mod feed;
pub mod json;
pub mod layout;
pub mod migration;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod schema;
pub mod validation;

pub use error::ManifestError;
pub use feed::{update_feed, FeedOutcome};
pub use layout::RegistryLayout;
pub use migration::{migrate_type, DEPRECATED_PROMPT_TEMPLATES};
pub use normalize::{NormalizeOptions, NormalizeOutcome, Normalizer, UnknownFieldPolicy};
pub use pipeline::MaintenancePipeline;
pub use registry::{ExtensionRegistry, MANIFEST_FILE};
pub use report::{NormalizationReport, ReportMessage, ValidationReport};
pub use schema::{ExtensionType, CANONICAL_ORDER};
pub use validation::{
    FileValidation, ValidationResult, ValidationRule, ValidationViolation, Validator,
    ViolationSeverity,
};
