//! The build manifest — the only durable state between runs.
//!
//! The manifest is a JSON object at `{outputDir}/manifest.json` mapping each
//! document key (`{group-slug}-{doc-slug}`) to a flat record of what was
//! built for it: the original title, the source group, the newest source
//! mtime, and the artifact filenames valid for its kind. Frozen source
//! groups (`"update": false` in the config) are reconstructed entirely from
//! these records, so the mapping must survive round-trips byte-for-byte.
//!
//! Two rules shape the store:
//!
//! - Re-processing a document with the same key overwrites its record whole;
//!   fields are never merged (last build wins).
//! - The file is written exactly once, at the end of a run, and only when
//!   the run changed at least one artifact. An unchanged run leaves the
//!   output directory's mtimes alone so external deploy tooling can trust
//!   them.
//!
//! A malformed manifest file is an error, not an empty manifest: silently
//! starting fresh would orphan every frozen group's records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::scan::DocumentKind;

/// Name of the manifest file within the output directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Artifact filenames for one document, tagged by kind.
///
/// Each variant carries exactly the filenames that exist for that kind, so a
/// record can never claim, say, a generated PDF for a pdf-only document.
/// Serializes to the manifest's flat camelCase fields with a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Artifacts {
    Docx {
        html_name: String,
        docx_name: String,
        generated_pdf_name: String,
    },
    DocxAndPdf {
        html_name: String,
        docx_name: String,
        generated_pdf_name: String,
        source_pdf_name: String,
    },
    Pdf {
        source_pdf_name: String,
    },
}

/// One document's manifest record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    /// `{group-slug}-{doc-slug}`; unique across the whole manifest.
    pub key: String,
    /// Human title, case and diacritics preserved.
    pub original_name: String,
    /// Slug of the owning source group; frozen-group reconstruction matches
    /// on this field.
    pub source_slug: String,
    /// Newest contributing source mtime, milliseconds since the Unix epoch.
    #[serde(deserialize_with = "millis_from_number")]
    pub modified_time: u64,
    /// Inherited per-group cutoff for the "recently updated" index section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_updates_after: Option<String>,
    /// Inherited template variant, when the group overrides the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(flatten)]
    pub artifacts: Artifacts,
}

/// Accept integer and fractional millisecond timestamps alike. Manifests
/// written by earlier iterations of the site carry fractional mtimes such as
/// `1716891021341.0276`; those must load, truncated to whole milliseconds.
/// Saves always write integers.
fn millis_from_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let millis = f64::deserialize(deserializer)?;
    if !millis.is_finite() || millis < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "invalid modifiedTime: {millis}"
        )));
    }
    Ok(millis.trunc() as u64)
}

impl DocumentEntry {
    pub fn kind(&self) -> DocumentKind {
        match self.artifacts {
            Artifacts::Docx { .. } => DocumentKind::Docx,
            Artifacts::DocxAndPdf { .. } => DocumentKind::DocxAndPdf,
            Artifacts::Pdf { .. } => DocumentKind::Pdf,
        }
    }

    pub fn html_name(&self) -> Option<&str> {
        match &self.artifacts {
            Artifacts::Docx { html_name, .. } | Artifacts::DocxAndPdf { html_name, .. } => {
                Some(html_name)
            }
            Artifacts::Pdf { .. } => None,
        }
    }

    pub fn source_pdf_name(&self) -> Option<&str> {
        match &self.artifacts {
            Artifacts::DocxAndPdf {
                source_pdf_name, ..
            }
            | Artifacts::Pdf { source_pdf_name } => Some(source_pdf_name),
            Artifacts::Docx { .. } => None,
        }
    }

    /// The artifact a reader opens: rendered HTML for document kinds, the
    /// copied PDF otherwise. Also the file whose live mtime stands in for
    /// `modified_time` when reconstructing frozen groups.
    pub fn primary_artifact(&self) -> &str {
        match &self.artifacts {
            Artifacts::Docx { html_name, .. } | Artifacts::DocxAndPdf { html_name, .. } => {
                html_name
            }
            Artifacts::Pdf { source_pdf_name } => source_pdf_name,
        }
    }
}

/// In-memory manifest, keyed by document key. `BTreeMap` keeps saves
/// deterministic so an unchanged site produces a byte-identical file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: BTreeMap<String, DocumentEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file yields an empty manifest; unreadable
    /// or malformed JSON is propagated.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        let entries = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }

    /// Serialize the whole mapping, pretty-printed, to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Insert or wholly replace the record under `entry.key`.
    pub fn upsert(&mut self, entry: DocumentEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&DocumentEntry> {
        self.entries.get(key)
    }

    /// All records belonging to a source group, in key order. Used to
    /// reconstruct frozen groups without touching their source directory.
    pub fn entries_for_group<'a>(
        &'a self,
        group_slug: &'a str,
    ) -> impl Iterator<Item = &'a DocumentEntry> {
        self.entries
            .values()
            .filter(move |e| e.source_slug == group_slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
