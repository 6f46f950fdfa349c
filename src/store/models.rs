// src/store/models.rs

//! Data models for the package catalog
//!
//! A `PackageRecord` is the durable per-package entity: identity fields
//! captured at creation time plus a cumulative version history. It is
//! persisted as `info.json` inside the package's catalog directory.

use crate::control::ControlMetadata;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in a package's version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Ingestion timestamp, RFC 3339
    pub date: String,
    /// Changelog lines for this version
    pub changes: Vec<String>,
}

/// The durable catalog entry for one package id.
///
/// Identity fields (`name`, `subtitle`, `icon`, `author`, `maintainer`,
/// the long-form `description`) are captured when the record is created
/// and never rewritten by later ingestions. `screenshots` is re-derived
/// from disk on every write; `versions` is append-only per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub name: String,
    pub subtitle: String,
    pub description: String,
    pub icon: String,
    pub author: String,
    pub maintainer: String,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionEntry>,
}

impl PackageRecord {
    /// Build a brand-new record from patched control metadata, seeded with
    /// a single "Initial release" entry for the control file's version.
    pub fn from_control(
        control: &ControlMetadata,
        description: String,
        date: String,
    ) -> Result<Self> {
        let id = control.package()?.to_string();
        let version = control.version()?.to_string();

        let mut versions = BTreeMap::new();
        versions.insert(
            version,
            VersionEntry {
                date,
                changes: vec!["Initial release".to_string()],
            },
        );

        Ok(Self {
            name: control.get("Name").unwrap_or(&id).to_string(),
            subtitle: control.get("Description").unwrap_or_default().to_string(),
            description,
            icon: control.get("Icon").unwrap_or_default().to_string(),
            author: control.get("Author").unwrap_or_default().to_string(),
            maintainer: control.get("Maintainer").unwrap_or_default().to_string(),
            screenshots: Vec::new(),
            versions,
            id,
        })
    }

    /// The most-recently-added version key: the lexicographic max.
    pub fn latest_version(&self) -> Option<&str> {
        self.versions.keys().next_back().map(String::as_str)
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.versions.contains_key(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_control() -> ControlMetadata {
        ControlMetadata::parse(
            b"Package: com.example.tweak\n\
Version: 1.0\n\
Name: Tweak\n\
Description: A test tweak\n\
Author: Someone <someone@example.com>\n\
Maintainer: Someone <someone@example.com>\n\
Icon: https://repo.example.com/packageInfo/com.example.tweak/icon.png\n",
        )
        .unwrap()
    }

    #[test]
    fn test_from_control_seeds_initial_release() {
        let record = PackageRecord::from_control(
            &sample_control(),
            "Long-form description".to_string(),
            "2024-01-01T00:00:00+00:00".to_string(),
        )
        .unwrap();

        assert_eq!(record.id, "com.example.tweak");
        assert_eq!(record.name, "Tweak");
        assert_eq!(record.subtitle, "A test tweak");
        assert_eq!(record.description, "Long-form description");
        assert_eq!(record.versions.len(), 1);
        assert_eq!(
            record.versions["1.0"].changes,
            vec!["Initial release".to_string()]
        );
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let control = ControlMetadata::parse(b"Package: com.example.bare\nVersion: 0.1\n").unwrap();
        let record =
            PackageRecord::from_control(&control, String::new(), String::new()).unwrap();
        assert_eq!(record.name, "com.example.bare");
        assert_eq!(record.subtitle, "");
    }

    #[test]
    fn test_latest_version_is_lexicographic_max() {
        let mut record = PackageRecord::from_control(
            &sample_control(),
            String::new(),
            "2024-01-01T00:00:00+00:00".to_string(),
        )
        .unwrap();
        record.versions.insert(
            "1.2".to_string(),
            VersionEntry {
                date: "2024-02-01T00:00:00+00:00".to_string(),
                changes: vec![],
            },
        );
        record.versions.insert(
            "1.10".to_string(),
            VersionEntry {
                date: "2024-03-01T00:00:00+00:00".to_string(),
                changes: vec![],
            },
        );

        // Keys compare as strings, not as dotted numbers
        assert_eq!(record.latest_version(), Some("1.2"));
    }

    #[test]
    fn test_info_json_schema_round_trip() {
        let record = PackageRecord::from_control(
            &sample_control(),
            "desc".to_string(),
            "2024-01-01T00:00:00+00:00".to_string(),
        )
        .unwrap();

        let json = serde_json::to_string_pretty(&record).unwrap();
        let parsed: PackageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);

        // Field names match the on-disk schema
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in [
            "id",
            "name",
            "subtitle",
            "description",
            "icon",
            "author",
            "maintainer",
            "screenshots",
            "versions",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
    }
}
