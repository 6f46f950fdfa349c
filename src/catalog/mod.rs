// src/catalog/mod.rs

//! Catalog index
//!
//! The flat list of known package ids (`packages.json`), used by the
//! front end for discovery. Append-only in core: there is no removal
//! operation.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Index over a `packages.json` file (a JSON array of package ids).
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    path: PathBuf,
}

impl CatalogIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the known package ids. A missing file is an empty catalog.
    pub fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let ids: Vec<String> = serde_json::from_str(&content)?;
        Ok(ids)
    }

    /// Add a package id unless it is already present.
    ///
    /// Returns whether the index changed. Persistence is whole-file
    /// replace; a write failure surfaces as [`Error::IndexWrite`] and the
    /// caller's record updates are not rolled back.
    pub fn add_if_absent(&self, id: &str) -> Result<bool> {
        let mut ids = self.load()?;
        if ids.iter().any(|existing| existing == id) {
            debug!("{} already present in catalog index", id);
            return Ok(false);
        }

        ids.push(id.to_string());
        self.save(&ids)?;
        info!("Added {} to the catalog index", id);
        Ok(true)
    }

    fn save(&self, ids: &[String]) -> Result<()> {
        let write = || -> Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(ids)?;
            let temp_path = self.path.with_extension("json.tmp");
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            fs::rename(&temp_path, &self.path)?;
            Ok(())
        };

        write().map_err(|e| Error::IndexWrite(format!("{}: {}", self.path.display(), e)))
    }
}
