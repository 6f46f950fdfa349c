// src/store/mod.rs

//! Package record store
//!
//! Owns the on-disk catalog: one directory per package id containing the
//! cumulative `info.json` record, a `screenshots/` directory synced into
//! the record on every write, and the derived `sileo.json` depiction.
//!
//! Persistence is whole-file replace (write to a temp file, then rename)
//! so a crash never leaves a torn record behind. A record that exists but
//! fails to parse is fatal for that package id and is never repaired in
//! place: rewriting it would destroy changelog history.

pub mod models;

use crate::control::ControlMetadata;
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use self::models::{PackageRecord, VersionEntry};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Store rooted at the catalog directory (`packageInfo/`).
#[derive(Debug, Clone)]
pub struct PackageStore {
    root: PathBuf,
}

impl PackageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    pub fn screenshots_dir(&self, id: &str) -> PathBuf {
        self.package_dir(id).join("screenshots")
    }

    fn info_path(&self, id: &str) -> PathBuf {
        self.package_dir(id).join("info.json")
    }

    /// Load the record for a package id, or `None` if the package has
    /// never been ingested. An unparsable record is a hard error.
    pub fn load(&self, id: &str) -> Result<Option<PackageRecord>> {
        let path = self.info_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let record: PackageRecord =
            serde_json::from_str(&content).map_err(|e| Error::RecordCorrupt {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        if record.id != id {
            return Err(Error::RecordCorrupt {
                id: id.to_string(),
                reason: format!("record claims id '{}'", record.id),
            });
        }

        Ok(Some(record))
    }

    /// Persist a record with whole-file replace.
    pub fn save(&self, record: &PackageRecord) -> Result<()> {
        let path = self.info_path(&record.id);
        fs::create_dir_all(self.package_dir(&record.id))?;

        let json = serde_json::to_string_pretty(record)?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        fs::rename(&temp_path, &path)?;

        debug!("Saved package record to {}", path.display());
        Ok(())
    }

    /// List the screenshot filenames currently on disk, sorted ascending.
    pub fn list_screenshots(&self, id: &str) -> Result<Vec<String>> {
        let dir = self.screenshots_dir(id);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Reconcile patched control metadata into the catalog.
    ///
    /// First ingestion of a package id creates the directory tree, prompts
    /// for the long-form description, and seeds the version history with an
    /// "Initial release" entry. Later ingestions append a prompted
    /// changelog entry when the version key is new and leave existing
    /// entries untouched; screenshots are resynced from disk either way.
    pub fn upsert(
        &self,
        control: &ControlMetadata,
        prompter: &mut dyn Prompter,
    ) -> Result<PackageRecord> {
        let id = control.package()?.to_string();
        let version = control.version()?.to_string();

        fs::create_dir_all(self.screenshots_dir(&id))?;

        let mut record = match self.load(&id)? {
            None => {
                info!("Creating package record for {}", id);
                let default_description = control.get("Description").unwrap_or_default();
                let description =
                    prompter.ask_text("Enter the package description", Some(default_description))?;
                PackageRecord::from_control(control, description, current_timestamp())?
            }
            Some(mut record) => {
                if record.has_version(&version) {
                    debug!("Version {} of {} already recorded", version, id);
                } else {
                    info!("Recording new version {} of {}", version, id);
                    let changes = prompter.ask_lines("Enter change (or empty to finish)")?;
                    record.versions.insert(
                        version,
                        VersionEntry {
                            date: current_timestamp(),
                            changes,
                        },
                    );
                }
                record
            }
        };

        record.screenshots = self.list_screenshots(&id)?;
        self.save(&record)?;

        Ok(record)
    }
}

/// Get current timestamp as ISO 8601 string
fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
