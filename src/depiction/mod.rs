// src/depiction/mod.rs

//! Sileo depiction generator
//!
//! Derives the native depiction document (`sileo.json`) from a package
//! record. The document is a pure function of the record and the
//! repository layout: it is regenerated on every ingestion and never
//! hand-edited or read back.

use crate::error::Result;
use crate::repo::RepoLayout;
use crate::store::PackageStore;
use crate::store::models::PackageRecord;
use serde_json::{Value, json};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Minimum depiction format version Sileo clients must support.
const MIN_VERSION: &str = "0.4";

/// Accent color for the depiction page.
const TINT_COLOR: &str = "#47afd1";

/// Generate the depiction document for a package record.
///
/// Deterministic: the same record and layout always produce the same
/// document, and `serde_json`'s ordered maps keep repeated serialization
/// byte-identical.
pub fn generate(record: &PackageRecord, layout: &RepoLayout) -> Value {
    json!({
        "minVersion": MIN_VERSION,
        "class": "DepictionTabView",
        "headerImage": layout.banner_url(&record.id),
        "tintColor": TINT_COLOR,
        "tabs": [details_tab(record, layout), changes_tab(record)],
    })
}

/// Overwrite the `sileo.json` artifact for a package.
pub fn write(record: &PackageRecord, store: &PackageStore, layout: &RepoLayout) -> Result<PathBuf> {
    let document = generate(record, layout);
    let path = store.package_dir(&record.id).join("sileo.json");

    let json = serde_json::to_string_pretty(&document)?;
    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(json.as_bytes())?;
    fs::rename(&temp_path, &path)?;

    debug!("Wrote depiction to {}", path.display());
    Ok(path)
}

fn details_tab(record: &PackageRecord, layout: &RepoLayout) -> Value {
    let screenshots: Vec<Value> = record
        .screenshots
        .iter()
        .map(|name| {
            let url = layout.screenshot_url(&record.id, name);
            json!({
                "url": url,
                "fullSizeURL": url,
                "accessibilityText": "Screenshot",
            })
        })
        .collect();

    let latest_version = record.latest_version().unwrap_or("Unknown version");

    json!({
        "tabname": "Details",
        "class": "DepictionStackView",
        "views": [
            {
                "class": "DepictionSpacerView",
                "spacing": 12,
            },
            {
                "class": "DepictionScreenshotsView",
                "itemSize": "{160, 346}",
                "itemCornerRadius": 6,
                "screenshots": screenshots,
            },
            {
                "class": "DepictionMarkdownView",
                "markdown": record.description,
            },
            {
                "class": "DepictionSeparatorView",
            },
            {
                "class": "DepictionHeaderView",
                "title": "Extra information",
            },
            {
                "class": "DepictionTableTextView",
                "title": "Version",
                "text": latest_version,
            },
            {
                "class": "DepictionTableTextView",
                "title": "Price",
                "text": "Free",
            },
            {
                "class": "DepictionTableTextView",
                "title": "Developer",
                "text": record.author,
            },
            {
                "class": "DepictionTableButtonView",
                "title": "View web depiction",
                "action": layout.depiction_url(&record.id),
            },
        ],
    })
}

/// Changelog tab: every version, newest key first.
fn changes_tab(record: &PackageRecord) -> Value {
    let mut views: Vec<Value> = Vec::new();

    for (version, entry) in record.versions.iter().rev() {
        views.push(json!({
            "class": "DepictionLayerView",
            "views": [
                {
                    "class": "DepictionSubheaderView",
                    "title": version,
                    "useBoldText": true,
                    "alignment": 0,
                },
                {
                    "class": "DepictionSubheaderView",
                    "title": display_date(&entry.date),
                    "alignment": 2,
                },
            ],
        }));

        for change in &entry.changes {
            views.push(json!({
                "class": "DepictionMarkdownView",
                "markdown": change,
                "useSpacing": true,
            }));
        }

        views.push(json!({
            "class": "DepictionSpacerView",
            "spacing": 12,
        }));
    }

    json!({
        "tabname": "Changes",
        "class": "DepictionStackView",
        "views": views,
    })
}

/// Render a stored RFC 3339 timestamp as a fixed-format date.
fn display_date(timestamp: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%Y-%m-%d").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::VersionEntry;
    use std::collections::BTreeMap;

    fn sample_record() -> PackageRecord {
        let mut versions = BTreeMap::new();
        versions.insert(
            "1.0".to_string(),
            VersionEntry {
                date: "2024-01-05T10:00:00+00:00".to_string(),
                changes: vec!["Initial release".to_string()],
            },
        );
        versions.insert(
            "2.0".to_string(),
            VersionEntry {
                date: "2024-03-17T10:00:00+00:00".to_string(),
                changes: vec!["Fixed a crash".to_string(), "New settings pane".to_string()],
            },
        );

        PackageRecord {
            id: "com.example.tweak".to_string(),
            name: "Tweak".to_string(),
            subtitle: "A test tweak".to_string(),
            description: "Long-form **markdown** description".to_string(),
            icon: "https://repo.example.com/packageInfo/com.example.tweak/icon.png".to_string(),
            author: "Someone <someone@example.com>".to_string(),
            maintainer: "Someone <someone@example.com>".to_string(),
            screenshots: vec!["01-home.png".to_string(), "02-settings.png".to_string()],
            versions,
        }
    }

    fn layout() -> RepoLayout {
        RepoLayout::new("/srv/repo", "https://repo.example.com")
    }

    #[test]
    fn test_generation_is_deterministic() {
        let record = sample_record();
        let first = serde_json::to_string_pretty(&generate(&record, &layout())).unwrap();
        let second = serde_json::to_string_pretty(&generate(&record, &layout())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_header_and_extra_information() {
        let document = generate(&sample_record(), &layout());

        assert_eq!(
            document["headerImage"],
            "https://repo.example.com/packageInfo/com.example.tweak/banner.png"
        );

        let views = document["tabs"][0]["views"].as_array().unwrap();
        let version_row = views
            .iter()
            .find(|v| v["title"] == "Version")
            .expect("version row");
        assert_eq!(version_row["text"], "2.0");

        let developer_row = views
            .iter()
            .find(|v| v["title"] == "Developer")
            .expect("developer row");
        assert_eq!(developer_row["text"], "Someone <someone@example.com>");
    }

    #[test]
    fn test_screenshots_map_to_public_urls() {
        let document = generate(&sample_record(), &layout());
        let views = document["tabs"][0]["views"].as_array().unwrap();
        let gallery = views
            .iter()
            .find(|v| v["class"] == "DepictionScreenshotsView")
            .expect("screenshots view");

        let shots = gallery["screenshots"].as_array().unwrap();
        assert_eq!(shots.len(), 2);
        assert_eq!(
            shots[0]["url"],
            "https://repo.example.com/packageInfo/com.example.tweak/screenshots/01-home.png"
        );
    }

    #[test]
    fn test_changelog_is_newest_first() {
        let document = generate(&sample_record(), &layout());
        let views = document["tabs"][1]["views"].as_array().unwrap();

        let subheaders: Vec<&str> = views
            .iter()
            .filter(|v| v["class"] == "DepictionLayerView")
            .map(|v| v["views"][0]["title"].as_str().unwrap())
            .collect();
        assert_eq!(subheaders, vec!["2.0", "1.0"]);

        // Dates render in a fixed format, independent of locale
        let date = views
            .iter()
            .find(|v| v["class"] == "DepictionLayerView")
            .map(|v| v["views"][1]["title"].as_str().unwrap())
            .unwrap();
        assert_eq!(date, "2024-03-17");
    }

    #[test]
    fn test_write_overwrites_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = PackageStore::new(dir.path());
        fs::create_dir_all(store.package_dir("com.example.tweak")).unwrap();

        let record = sample_record();
        let path = write(&record, &store, &layout()).unwrap();
        let first = fs::read(&path).unwrap();

        let path = write(&record, &store, &layout()).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }
}
