//! Registry Walker
//!
//! One immediate subdirectory of the registry root per extension, each
//! optionally holding a `manifest.json`.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ManifestError;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDir {
    /// Directory name, used to attribute findings.
    pub name: String,
    pub path: PathBuf,
}

impl ExtensionDir {
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path().is_file()
    }
}

/// Extension directories discovered under a registry root.
#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    root: PathBuf,
    extensions: Vec<ExtensionDir>,
}

impl ExtensionRegistry {
    /// Enumerate the root in directory-listing order. Non-directories are ignored.
    pub fn load_from_dir(root: &Path) -> Result<Self, ManifestError> {
        if !root.is_dir() {
            return Err(ManifestError::RegistryNotFound(root.to_path_buf()));
        }

        let mut extensions = vec![];
        for entry in fs::read_dir(root).map_err(|e| ManifestError::io(root, e))? {
            let entry = entry.map_err(|e| ManifestError::io(root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            extensions.push(ExtensionDir { name, path });
        }

        let count = extensions.len();
        debug!(root = %root.display(), count, "discovered extension directories");
        Ok(Self {
            root: root.to_path_buf(),
            extensions,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extensions(&self) -> &[ExtensionDir] {
        &self.extensions
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionDir> {
        self.extensions.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_directories_are_extensions() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("theme-manager")).unwrap();
        fs::create_dir(root.path().join("prompt-library")).unwrap();
        fs::write(root.path().join("README.md"), "notes").unwrap();
        fs::write(root.path().join("prompt-library").join(MANIFEST_FILE), "{}").unwrap();

        let registry = ExtensionRegistry::load_from_dir(root.path()).unwrap();
        let mut names: Vec<_> = registry.extensions().iter().map(|e| e.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["prompt-library", "theme-manager"]);

        assert!(registry.get("prompt-library").unwrap().has_manifest());
        assert!(!registry.get("theme-manager").unwrap().has_manifest());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let err = ExtensionRegistry::load_from_dir(&root.path().join("nope")).unwrap_err();
        assert!(matches!(err, ManifestError::RegistryNotFound(_)));
    }
}
