// src/repo/mod.rs

//! Repository layout and public URL templating
//!
//! Everything the catalog persists lives under one root:
//!
//! ```text
//! <root>/debs/<filename>.deb              inbox of processed archives
//! <root>/packageInfo/packages.json        catalog index
//! <root>/packageInfo/<id>/info.json       package record
//! <root>/packageInfo/<id>/screenshots/    screenshot files
//! <root>/packageInfo/<id>/sileo.json      derived depiction
//! ```
//!
//! The layout is an explicit value passed by parameter so every component
//! can run against a temp directory in tests.

use std::path::{Path, PathBuf};

/// Root directory plus the public base URL the catalog is served from.
#[derive(Debug, Clone)]
pub struct RepoLayout {
    root: PathBuf,
    base_url: String,
}

impl RepoLayout {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Inbox directory of processed `.deb` archives.
    pub fn debs_dir(&self) -> PathBuf {
        self.root.join("debs")
    }

    /// Catalog directory holding per-package records and the index.
    pub fn package_info_dir(&self) -> PathBuf {
        self.root.join("packageInfo")
    }

    pub fn index_path(&self) -> PathBuf {
        self.package_info_dir().join("packages.json")
    }

    /// Web depiction page for a package.
    pub fn depiction_url(&self, id: &str) -> String {
        format!("{}/depiction/{}", self.base_url, id)
    }

    /// Native (Sileo) depiction manifest for a package.
    pub fn sileo_url(&self, id: &str) -> String {
        format!("{}/packageInfo/{}/sileo.json", self.base_url, id)
    }

    pub fn icon_url(&self, id: &str) -> String {
        format!("{}/packageInfo/{}/icon.png", self.base_url, id)
    }

    pub fn banner_url(&self, id: &str) -> String {
        format!("{}/packageInfo/{}/banner.png", self.base_url, id)
    }

    pub fn screenshot_url(&self, id: &str, filename: &str) -> String {
        format!(
            "{}/packageInfo/{}/screenshots/{}",
            self.base_url, id, filename
        )
    }
}
