//! Registry layout
//!
//! The extensions directory and the marketplace feed are fixed siblings
//! under one root; either can be overridden.

use std::path::{Path, PathBuf};

pub const EXTENSIONS_DIR: &str = "extensions";
pub const API_DIR: &str = "api";
pub const FEED_FILE: &str = "marketplace-api-extensions.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLayout {
    pub extensions_dir: PathBuf,
    pub feed_path: PathBuf,
}

impl RegistryLayout {
    pub fn from_root(root: &Path) -> Self {
        Self {
            extensions_dir: root.join(EXTENSIONS_DIR),
            feed_path: root.join(API_DIR).join(FEED_FILE),
        }
    }

    pub fn with_extensions_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.extensions_dir = dir;
        }
        self
    }

    pub fn with_feed_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.feed_path = path;
        }
        self
    }
}

impl Default for RegistryLayout {
    fn default() -> Self {
        Self::from_root(Path::new("."))
    }
}
