// src/ingest/mod.rs

//! Ingestion orchestrator
//!
//! Sequences one .deb through the full pipeline: validate → unpack into a
//! scoped temp directory → patch the control metadata with repository
//! fields → repack into the inbox → reconcile the package record →
//! regenerate the depiction → update the catalog index.
//!
//! Failures are contained to the item being ingested: batch runs log the
//! offending filename and continue, and the temp extraction directory is
//! removed on every exit path. Strictly sequential; the catalog has no
//! locking and is not safe for concurrent writers.

use crate::catalog::CatalogIndex;
use crate::control::ControlMetadata;
use crate::deb;
use crate::error::{Error, Result};
use crate::depiction;
use crate::prompt::Prompter;
use crate::repo::RepoLayout;
use crate::store::PackageStore;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Outcome of a batch ingestion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Orchestrator bound to one repository layout.
pub struct Ingestor {
    layout: RepoLayout,
    store: PackageStore,
    index: CatalogIndex,
}

impl Ingestor {
    pub fn new(layout: RepoLayout) -> Self {
        let store = PackageStore::new(layout.package_info_dir());
        let index = CatalogIndex::new(layout.index_path());
        Self {
            layout,
            store,
            index,
        }
    }

    pub fn layout(&self) -> &RepoLayout {
        &self.layout
    }

    pub fn store(&self) -> &PackageStore {
        &self.store
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Ingest a single .deb. Returns the package id on success.
    pub fn ingest_file(&self, deb_path: &Path, prompter: &mut dyn Prompter) -> Result<String> {
        validate_input(deb_path)?;

        let file_name = deb_path
            .file_name()
            .ok_or_else(|| Error::Input(format!("{} has no file name", deb_path.display())))?
            .to_os_string();

        // Scoped extraction dir, removed on success and failure alike
        let extract_dir = tempfile::Builder::new()
            .prefix("debrepo-extract-")
            .tempdir()
            .map_err(|e| Error::Extraction(format!("failed to create temp directory: {}", e)))?;

        info!("Extracting {}", file_name.to_string_lossy());
        deb::unpack(deb_path, extract_dir.path())?;

        let control_path = extract_dir.path().join(deb::CONTROL_DIR).join("control");
        let control_bytes = fs::read(&control_path).map_err(|e| {
            Error::Extraction(format!("package has no control file: {}", e))
        })?;
        let mut control = ControlMetadata::parse(&control_bytes)?;
        let id = control.package()?.to_string();
        let version = control.version()?.to_string();
        debug!("Parsed control metadata: {} {}", id, version);

        info!("Patching control metadata for {}", id);
        control.set("Depiction", &self.layout.depiction_url(&id));
        control.set("SileoDepiction", &self.layout.sileo_url(&id));
        control.set("Icon", &self.layout.icon_url(&id));
        fs::write(&control_path, control.serialize())?;

        info!("Repacking {}", file_name.to_string_lossy());
        fs::create_dir_all(self.layout.debs_dir())?;
        let target_path = self.layout.debs_dir().join(&file_name);
        deb::pack(extract_dir.path(), &target_path)?;
        debug!(
            "Repacked archive sha256: {}",
            deb::file_sha256(&target_path)?
        );

        info!("Updating package record for {}", id);
        let record = self.store.upsert(&control, prompter)?;

        // Depiction is derived state: a failure here leaves the archive
        // and record valid, so it is reported rather than fatal.
        if let Err(e) = depiction::write(&record, &self.store, &self.layout) {
            warn!("Failed to regenerate depiction for {}: {}", id, e);
        }

        self.index.add_if_absent(&id)?;

        info!(
            "Successfully added {} to the repository",
            file_name.to_string_lossy()
        );
        Ok(id)
    }

    /// Ingest every .deb in a directory, ascending by filename.
    ///
    /// Processing is strictly sequential; a failing file is logged and the
    /// batch moves on to the next one.
    pub fn ingest_dir(&self, dir: &Path, prompter: &mut dyn Prompter) -> Result<IngestSummary> {
        let files = list_debs(dir)?;
        if files.is_empty() {
            info!("No debs to process in {}", dir.display());
            return Ok(IngestSummary::default());
        }

        let mut summary = IngestSummary::default();
        for file in files {
            let path = dir.join(&file);
            match self.ingest_file(&path, prompter) {
                Ok(id) => {
                    summary.succeeded += 1;
                    debug!("Ingested {} as {}", file, id);
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("Failed to ingest {}: {}", file, e);
                }
            }
        }

        Ok(summary)
    }

    /// Sorted .deb filenames in the repository inbox.
    pub fn inbox_debs(&self) -> Result<Vec<String>> {
        list_debs(&self.layout.debs_dir())
    }
}

/// The input must exist, be a regular file, and carry a .deb extension.
fn validate_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::Input(format!("{} does not exist", path.display())));
    }
    if !path.is_file() {
        return Err(Error::Input(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("deb") {
        return Err(Error::Input(format!(
            "{} is not a .deb package",
            path.display()
        )));
    }
    Ok(())
}

/// Sorted .deb filenames directly under `dir`. A missing directory is an
/// empty inbox.
fn list_debs(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".deb") && entry.file_type()?.is_file() {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}
