//! CLI output formatting for the build pipeline.
//!
//! # Output Format
//!
//! ```text
//! Copied site assets to ./site
//!
//! Úvod do fyziky
//!     prednaska-1 (docx)
//!         Converting with template "default"...
//!         Created uvod-do-fyziky-prednaska-1.html
//!         Rendering PDF...
//!         Created uvod-do-fyziky-prednaska-1.pdf
//!     skripta (pdf)
//!         Source PDF up to date
//!
//! Archiv 2023 (frozen, 4 pages from manifest)
//!
//! Manifest saved
//! index.html written
//! 2 converted, 1 PDF rendered, 0 copied, 3 up to date
//! ```
//!
//! # Architecture
//!
//! [`format_build_event`] returns lines (no I/O) so tests can assert on
//! exact output; `main` drains a channel of events through it on a printer
//! thread. Run totals live in [`BuildStats`](crate::build::BuildStats),
//! printed once at the end via its `Display` impl.

use crate::build::BuildEvent;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a single pipeline event as zero or more output lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::AssetsCopied { output_dir } => {
            vec![format!("Copied site assets to {}", output_dir.display())]
        }
        BuildEvent::GroupStarted { name } => {
            vec![String::new(), name.clone()]
        }
        BuildEvent::GroupFrozen { name, pages } => {
            vec![
                String::new(),
                format!("{name} (frozen, {pages} pages from manifest)"),
            ]
        }
        BuildEvent::GroupMissing { name, path } => {
            vec![
                String::new(),
                format!("{name} (source directory {} not found, skipped)", path.display()),
            ]
        }
        BuildEvent::DocumentStarted { name, kind } => {
            vec![format!("{}{} ({})", indent(1), name, kind.label())]
        }
        BuildEvent::MediaDirRemoved { dir } => {
            vec![format!("{}Removed stale media directory {dir}", indent(2))]
        }
        BuildEvent::Converting { template } => {
            vec![format!(
                "{}Converting with template \"{}\"...",
                indent(2),
                template.name()
            )]
        }
        BuildEvent::Converted { html_name } => {
            vec![format!("{}Created {html_name}", indent(2))]
        }
        BuildEvent::HtmlUpToDate => {
            vec![format!("{}HTML up to date", indent(2))]
        }
        BuildEvent::RenderingPdf => {
            vec![format!("{}Rendering PDF...", indent(2))]
        }
        BuildEvent::PdfRendered { pdf_name } => {
            vec![format!("{}Created {pdf_name}", indent(2))]
        }
        BuildEvent::PdfUpToDate => {
            vec![format!("{}PDF rendition up to date", indent(2))]
        }
        BuildEvent::PdfRenderFailed { error } => {
            vec![format!("{}PDF rendering failed: {error}", indent(2))]
        }
        BuildEvent::SourcePdfCopied { file_name } => {
            vec![format!("{}Copied {file_name}", indent(2))]
        }
        BuildEvent::SourcePdfUpToDate => {
            vec![format!("{}Source PDF up to date", indent(2))]
        }
        BuildEvent::ManifestSaved => {
            vec![String::new(), "Manifest saved".to_string()]
        }
        BuildEvent::IndexWritten => {
            vec!["index.html written".to_string()]
        }
        BuildEvent::NothingChanged => {
            vec![
                String::new(),
                "No changes detected, manifest and index.html left untouched".to_string(),
            ]
        }
    }
}
