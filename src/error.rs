use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a JSON object in {}", .path.display())]
    NotAnObject { path: PathBuf },

    #[error("Expected a JSON array in {}", .path.display())]
    NotAnArray { path: PathBuf },

    #[error("Registry root not found: {}", .0.display())]
    RegistryNotFound(PathBuf),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ManifestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Whether the file exists but is not usable structured data.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ManifestError::Parse { .. }
                | ManifestError::NotAnObject { .. }
                | ManifestError::NotAnArray { .. }
        )
    }
}
