//! File-backed loop catalog
//!
//! Each role has a `loops_<ROLE>.txt` file holding a JSON array of loop
//! definitions, e.g. `[{"name": "CMD", "can_listen": true, "can_talk": true}]`.

use std::fs;
use std::path::{Path, PathBuf};

use super::{CatalogSource, normalize_role};
use crate::domain::LoopDef;
use crate::error::{Result, VoxError};

/// Catalog that reads loop files from a directory
#[derive(Debug, Clone)]
pub struct FileCatalog {
    dir: PathBuf,
}

impl FileCatalog {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the catalog file for a role
    pub fn path_for(&self, role: &str) -> PathBuf {
        self.dir.join(format!("loops_{}.txt", normalize_role(role)))
    }
}

impl CatalogSource for FileCatalog {
    fn try_load(&self, role: &str) -> Result<Vec<LoopDef>> {
        let path = self.path_for(role);
        let content = fs::read_to_string(&path)
            .map_err(|e| VoxError::Catalog(format!("failed to read {}: {}", path.display(), e)))?;
        let loops: Vec<LoopDef> = serde_json::from_str(&content)
            .map_err(|e| VoxError::Catalog(format!("failed to parse {}: {}", path.display(), e)))?;
        log::info!("Loaded {} loops for role {} from {}", loops.len(), role, path.display());
        Ok(loops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_catalog(dir: &Path, role: &str, content: &str) {
        fs::write(dir.join(format!("loops_{}.txt", role)), content).unwrap();
    }

    #[test]
    fn test_path_for_uppercases_role() {
        let catalog = FileCatalog::new("LOOPS");
        assert_eq!(catalog.path_for("capcom"), PathBuf::from("LOOPS/loops_CAPCOM.txt"));
    }

    #[test]
    fn test_load_valid_catalog() {
        let temp_dir = TempDir::new().unwrap();
        write_catalog(
            temp_dir.path(),
            "FLIGHT",
            r#"[{"name": "CMD", "can_listen": true, "can_talk": true},
                {"name": "OBS", "can_listen": true, "can_talk": false}]"#,
        );

        let catalog = FileCatalog::new(temp_dir.path());
        let loops = catalog.load("flight");
        assert_eq!(loops, vec![LoopDef::talk("CMD"), LoopDef::listen_only("OBS")]);
    }

    #[test]
    fn test_missing_file_falls_back_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FileCatalog::new(temp_dir.path());
        assert!(matches!(catalog.try_load("EVA"), Err(VoxError::Catalog(_))));
        assert!(catalog.load("EVA").is_empty());
    }

    #[test]
    fn test_malformed_file_falls_back_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        write_catalog(temp_dir.path(), "BME", "{not json");
        let catalog = FileCatalog::new(temp_dir.path());
        let err = catalog.try_load("BME").unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
        assert!(catalog.load("BME").is_empty());
    }
}
