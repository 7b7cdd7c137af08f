//! Source directory discovery.
//!
//! A source group is a flat directory of lecture documents. Files sharing a
//! base name form one logical document: `Uvod do Fyziky.docx` plus
//! `Uvod do Fyziky.pdf` is a single document whose HTML comes from the docx
//! and whose original PDF is published alongside. Extensions other than
//! `.docx` and `.pdf` are ignored entirely.
//!
//! Discovery only reads directory entries and stat data; deciding what to
//! rebuild is the orchestrator's job.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

use crate::stale;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which source files make up a document. Serialized as the manifest's
/// `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A `.docx` source with no sibling PDF.
    Docx,
    /// A `.docx` source with an accompanying original `.pdf`.
    DocxAndPdf,
    /// A standalone `.pdf` with no document source; published as-is.
    Pdf,
}

impl DocumentKind {
    /// Short label used in CLI output and the manifest `type` tag.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Docx => "docx",
            DocumentKind::DocxAndPdf => "docx_and_pdf",
            DocumentKind::Pdf => "pdf",
        }
    }
}

/// The source files behind one document. Each variant carries exactly the
/// paths that exist for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFiles {
    Docx { docx: PathBuf },
    DocxAndPdf { docx: PathBuf, pdf: PathBuf },
    Pdf { pdf: PathBuf },
}

/// One logical document discovered in a source group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Original base name with case and diacritics preserved; this is the
    /// human title shown on the index page.
    pub base_name: String,
    pub files: SourceFiles,
}

impl SourceDocument {
    pub fn kind(&self) -> DocumentKind {
        match self.files {
            SourceFiles::Docx { .. } => DocumentKind::Docx,
            SourceFiles::DocxAndPdf { .. } => DocumentKind::DocxAndPdf,
            SourceFiles::Pdf { .. } => DocumentKind::Pdf,
        }
    }

    /// The `.docx` source path, if this document has one.
    pub fn docx_path(&self) -> Option<&Path> {
        match &self.files {
            SourceFiles::Docx { docx } | SourceFiles::DocxAndPdf { docx, .. } => Some(docx),
            SourceFiles::Pdf { .. } => None,
        }
    }

    /// The original `.pdf` path, if this document has one.
    pub fn pdf_path(&self) -> Option<&Path> {
        match &self.files {
            SourceFiles::DocxAndPdf { pdf, .. } | SourceFiles::Pdf { pdf } => Some(pdf),
            SourceFiles::Docx { .. } => None,
        }
    }

    /// Modification times of every contributing source file.
    pub fn input_mtimes(&self) -> Vec<SystemTime> {
        [self.docx_path(), self.pdf_path()]
            .into_iter()
            .flatten()
            .filter_map(stale::modified)
            .collect()
    }

    /// The newest contributing mtime in milliseconds — the document's
    /// `modifiedTime` in the manifest.
    pub fn modified_millis(&self) -> u64 {
        [self.docx_path(), self.pdf_path()]
            .into_iter()
            .flatten()
            .map(stale::modified_millis)
            .max()
            .unwrap_or(0)
    }
}

/// Enumerate a source group directory into logical documents, sorted by
/// base name for deterministic processing order.
pub fn scan_group(dir: &Path) -> Result<Vec<SourceDocument>, ScanError> {
    // base name → (docx?, pdf?); BTreeMap gives the deterministic order
    let mut groups: BTreeMap<String, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
            continue;
        };
        if ext != "docx" && ext != "pdf" {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        let slot = groups.entry(stem).or_default();
        if ext == "docx" {
            slot.0 = Some(path);
        } else {
            slot.1 = Some(path);
        }
    }

    let documents = groups
        .into_iter()
        .map(|(base_name, files)| {
            let files = match files {
                (Some(docx), Some(pdf)) => SourceFiles::DocxAndPdf { docx, pdf },
                (Some(docx), None) => SourceFiles::Docx { docx },
                (None, Some(pdf)) => SourceFiles::Pdf { pdf },
                (None, None) => unreachable!("entry created only on docx/pdf match"),
            };
            SourceDocument { base_name, files }
        })
        .collect();

    Ok(documents)
}
