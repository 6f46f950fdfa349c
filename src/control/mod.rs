// src/control/mod.rs

//! Debian control file model
//!
//! An ordered field mapping that round-trips the control-file grammar:
//! `Field: value` lines with indented continuation lines. Unknown fields
//! are preserved as-is so a repacked package keeps everything the original
//! author wrote.

use crate::error::{Error, Result};

/// Ordered control-file metadata.
///
/// Field names are case-sensitive and insertion order is preserved, so
/// `serialize` reproduces the original layout for untouched fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlMetadata {
    fields: Vec<(String, String)>,
}

impl ControlMetadata {
    /// Parse control-file bytes into an ordered field mapping.
    ///
    /// Continuation lines (leading space or tab) are stored verbatim inside
    /// the field value, indentation included. Parsing stops at the first
    /// blank line after at least one field; a control file is a single
    /// stanza.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| Error::MalformedControl(format!("control file is not UTF-8: {}", e)))?;

        let mut fields: Vec<(String, String)> = Vec::new();

        for line in content.lines() {
            if line.is_empty() {
                if fields.is_empty() {
                    continue;
                }
                break;
            }

            // Continuation lines extend the most recent field
            if line.starts_with(' ') || line.starts_with('\t') {
                match fields.last_mut() {
                    Some((_, value)) => {
                        value.push('\n');
                        value.push_str(line);
                    }
                    None => {
                        return Err(Error::MalformedControl(format!(
                            "continuation line before any field: {:?}",
                            line
                        )));
                    }
                }
                continue;
            }

            let (name, value) = line.split_once(':').ok_or_else(|| {
                Error::MalformedControl(format!("expected 'Field: value', got {:?}", line))
            })?;

            // Exactly one space after the colon is the conventional form;
            // anything beyond that belongs to the value.
            let value = value.strip_prefix(' ').unwrap_or(value);
            fields.push((name.to_string(), value.to_string()));
        }

        Ok(Self { fields })
    }

    /// Serialize back to control-file bytes.
    ///
    /// Insertion order is preserved and the output ends with a single
    /// trailing newline. Continuation lines that came from `parse` keep
    /// their original indentation; programmatically-set multi-line values
    /// get a single-space indent.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = String::new();

        for (name, value) in &self.fields {
            out.push_str(name);
            out.push(':');

            for (i, line) in value.split('\n').enumerate() {
                if i == 0 {
                    if !line.is_empty() {
                        out.push(' ');
                        out.push_str(line);
                    }
                } else {
                    out.push('\n');
                    if !line.starts_with(' ') && !line.starts_with('\t') {
                        out.push(' ');
                    }
                    out.push_str(line);
                }
            }
            out.push('\n');
        }

        out.into_bytes()
    }

    /// Get a field value by exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a field value, overwriting in place when the field exists
    /// (preserving its position) and appending at the end otherwise.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    /// The `Package` field (package id). Required for a well-formed package.
    pub fn package(&self) -> Result<&str> {
        self.required("Package")
    }

    /// The `Version` field. Required for a well-formed package.
    pub fn version(&self) -> Result<&str> {
        self.required("Version")
    }

    fn required(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| Error::MalformedControl(format!("missing required field '{}'", name)))
    }

    /// Iterate fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
