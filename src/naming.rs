//! Artifact naming.
//!
//! Every published file for a document is named `{group-slug}-{doc-slug}`
//! plus a kind-specific suffix, flat inside the output directory:
//!
//! | Document kind | Files |
//! |---|---|
//! | docx | `{stem}.html`, `{stem}.docx`, `{stem}.pdf` (rendition) |
//! | docx_and_pdf | the above plus `{stem}.source.pdf` |
//! | pdf | `{stem}.pdf` (copy of the original) |
//!
//! Pandoc-extracted images land in `{stem}-media/`. The stem doubles as the
//! manifest key, so two documents may never share one; config validation
//! rejects colliding group slugs and the scanner cannot produce colliding
//! document stems within a directory.

use crate::manifest::Artifacts;
use crate::scan::DocumentKind;

/// The published names for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Kind-tagged artifact filenames, exactly as recorded in the manifest.
    pub artifacts: Artifacts,
    /// `{stem}-media` — per-document media extraction directory.
    pub media_dir: String,
}

impl ArtifactSet {
    /// Derive the artifact names for a document.
    pub fn derive(group_slug: &str, doc_slug: &str, kind: DocumentKind) -> Self {
        let stem = Self::key(group_slug, doc_slug);
        let media_dir = format!("{stem}-media");
        let artifacts = match kind {
            DocumentKind::Docx => Artifacts::Docx {
                html_name: format!("{stem}.html"),
                docx_name: format!("{stem}.docx"),
                generated_pdf_name: format!("{stem}.pdf"),
            },
            DocumentKind::DocxAndPdf => Artifacts::DocxAndPdf {
                html_name: format!("{stem}.html"),
                docx_name: format!("{stem}.docx"),
                generated_pdf_name: format!("{stem}.pdf"),
                source_pdf_name: format!("{stem}.source.pdf"),
            },
            DocumentKind::Pdf => Artifacts::Pdf {
                source_pdf_name: format!("{stem}.pdf"),
            },
        };
        Self {
            artifacts,
            media_dir,
        }
    }

    /// The manifest key for a document: `{group-slug}-{doc-slug}`.
    pub fn key(group_slug: &str, doc_slug: &str) -> String {
        format!("{group_slug}-{doc_slug}")
    }
}
