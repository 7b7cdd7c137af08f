//! The build pipeline: scan, convert, render, assemble, publish.
//!
//! One [`build`] call processes every source group in the config:
//!
//! 1. Site-wide assets (`styles.css`, `favicon.svg`, an optional `fonts/`
//!    directory) are placed in the output directory.
//! 2. Frozen groups are reconstructed from the manifest without touching
//!    their source directories.
//! 3. Live groups are scanned and each document is brought up to date.
//!    A document's HTML is rebuilt when any of its sources is newer than the
//!    existing page; its PDF rendition when the HTML is newer than the
//!    existing PDF; a plain source PDF is re-copied when it is newer than
//!    the published copy. `force` rebuilds everything.
//! 4. If anything changed, the manifest is saved and `index.html` is
//!    rewritten. An unchanged run writes neither, so their mtimes stay
//!    meaningful to deploy tooling.
//!
//! Conversion failures abort the run; the converter has already cleaned up
//! its partial output, and aborting keeps a broken document from silently
//! vanishing off the index. PDF rendition failures only log and move on,
//! since the page itself is fine and the next run will retry.
//!
//! Progress is reported through an optional channel of [`BuildEvent`]s so
//! the CLI can print from a separate thread while the pipeline works.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

use crate::config::{SiteConfig, SourceConfig, Template};
use crate::convert::{ConversionJob, ConvertError, DocumentConverter};
use crate::manifest::{Artifacts, DocumentEntry, Manifest, ManifestError, MANIFEST_FILENAME};
use crate::naming::ArtifactSet;
use crate::pdf::PdfRenderer;
use crate::render::render_index;
use crate::scan::{DocumentKind, ScanError, SourceDocument, scan_group};
use crate::slug::slugify;
use crate::stale::{is_stale, modified, modified_millis};
use crate::types::{SiteGroup, SitePage, SiteStructure, format_date_millis};

const STYLES_CSS: &str = include_str!("../static/styles.css");
const FAVICON_SVG: &str = include_str!("../static/favicon.svg");

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Progress events emitted while the pipeline runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    AssetsCopied { output_dir: PathBuf },
    GroupStarted { name: String },
    GroupFrozen { name: String, pages: usize },
    GroupMissing { name: String, path: PathBuf },
    DocumentStarted { name: String, kind: DocumentKind },
    MediaDirRemoved { dir: String },
    Converting { template: Template },
    Converted { html_name: String },
    HtmlUpToDate,
    RenderingPdf,
    PdfRendered { pdf_name: String },
    PdfUpToDate,
    PdfRenderFailed { error: String },
    SourcePdfCopied { file_name: String },
    SourcePdfUpToDate,
    ManifestSaved,
    IndexWritten,
    NothingChanged,
}

/// Totals for one build run.
#[derive(Debug, Default)]
pub struct BuildStats {
    pub converted: u32,
    pub pdfs_rendered: u32,
    pub pdfs_failed: u32,
    pub copied: u32,
    pub up_to_date: u32,
    pub frozen_pages: u32,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} converted, {} PDFs rendered, {} copied, {} up to date",
            self.converted, self.pdfs_rendered, self.copied, self.up_to_date
        )?;
        if self.pdfs_failed > 0 {
            write!(f, ", {} PDF renditions failed", self.pdfs_failed)?;
        }
        if self.frozen_pages > 0 {
            write!(f, " ({} frozen pages)", self.frozen_pages)?;
        }
        Ok(())
    }
}

/// Run the full pipeline. `assets_dir` is the directory holding the page
/// templates, the Lua filter, and the optional `fonts/` directory, normally
/// wherever `config.json` lives.
pub fn build(
    config: &SiteConfig,
    assets_dir: &Path,
    converter: &dyn DocumentConverter,
    renderer: &dyn PdfRenderer,
    force: bool,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildStats, BuildError> {
    let now_millis = chrono::Local::now().timestamp_millis().max(0) as u64;
    let pipeline = Pipeline {
        config,
        assets_dir,
        converter,
        renderer,
        force,
        events,
        generation_date: format_date_millis(now_millis),
        now_millis,
        stats: BuildStats::default(),
        changed: false,
    };
    pipeline.run()
}

struct Pipeline<'a> {
    config: &'a SiteConfig,
    assets_dir: &'a Path,
    converter: &'a dyn DocumentConverter,
    renderer: &'a dyn PdfRenderer,
    force: bool,
    events: Option<Sender<BuildEvent>>,
    generation_date: String,
    now_millis: u64,
    stats: BuildStats,
    changed: bool,
}

impl Pipeline<'_> {
    fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn run(mut self) -> Result<BuildStats, BuildError> {
        let config = self.config;
        let output_dir = config.output_dir.clone();
        fs::create_dir_all(&output_dir)?;
        self.copy_site_assets(&output_dir)?;
        self.emit(BuildEvent::AssetsCopied {
            output_dir: output_dir.clone(),
        });

        let manifest_path = output_dir.join(MANIFEST_FILENAME);
        let mut manifest = Manifest::load(&manifest_path)?;

        let mut structure = SiteStructure::default();
        for source in &config.sources {
            if !source.update {
                let pages = self.frozen_pages(&manifest, source, &output_dir);
                self.emit(BuildEvent::GroupFrozen {
                    name: source.name.clone(),
                    pages: pages.len(),
                });
                self.stats.frozen_pages += pages.len() as u32;
                if !pages.is_empty() {
                    structure.groups.push(SiteGroup {
                        name: source.name.clone(),
                        pages,
                    });
                }
                continue;
            }

            if !source.path.exists() {
                self.emit(BuildEvent::GroupMissing {
                    name: source.name.clone(),
                    path: source.path.clone(),
                });
                continue;
            }

            let documents = scan_group(&source.path)?;
            if documents.is_empty() {
                continue;
            }
            self.emit(BuildEvent::GroupStarted {
                name: source.name.clone(),
            });

            let mut pages = Vec::new();
            for doc in &documents {
                let page = self.process_document(doc, source, &output_dir)?;
                manifest.upsert(page.entry.clone());
                pages.push(page);
            }
            structure.groups.push(SiteGroup {
                name: source.name.clone(),
                pages,
            });
        }

        if self.changed {
            manifest.save(&manifest_path)?;
            self.emit(BuildEvent::ManifestSaved);

            let latest = structure.latest_update_millis();
            let index = render_index(
                &config.title,
                &structure,
                &self.generation_date,
                &format_date_millis(latest),
                self.now_millis,
            );
            fs::write(output_dir.join("index.html"), index)?;
            self.emit(BuildEvent::IndexWritten);
        } else {
            self.emit(BuildEvent::NothingChanged);
        }

        Ok(self.stats)
    }

    /// Write the embedded site-wide assets and copy the local fonts
    /// directory when one exists next to the templates.
    fn copy_site_assets(&self, output_dir: &Path) -> Result<(), std::io::Error> {
        fs::write(output_dir.join("styles.css"), STYLES_CSS)?;
        fs::write(output_dir.join("favicon.svg"), FAVICON_SVG)?;

        let fonts = self.assets_dir.join("fonts");
        if fonts.is_dir() {
            let target = output_dir.join("fonts");
            for entry in walkdir::WalkDir::new(&fonts) {
                let entry = entry.map_err(std::io::Error::other)?;
                let relative = entry
                    .path()
                    .strip_prefix(&fonts)
                    .map_err(std::io::Error::other)?;
                let dest = target.join(relative);
                if entry.file_type().is_dir() {
                    fs::create_dir_all(&dest)?;
                } else {
                    fs::copy(entry.path(), &dest)?;
                }
            }
        }
        Ok(())
    }

    /// Rebuild a frozen group's pages from its manifest records. The
    /// displayed timestamp is the live mtime of each published artifact, 0
    /// when it has gone missing, so the index never claims freshness the
    /// output directory cannot back up.
    fn frozen_pages(
        &self,
        manifest: &Manifest,
        source: &SourceConfig,
        output_dir: &Path,
    ) -> Vec<SitePage> {
        manifest
            .entries_for_group(&source.slug())
            .map(|entry| SitePage {
                modified_time: modified_millis(&output_dir.join(entry.primary_artifact())),
                entry: entry.clone(),
            })
            .collect()
    }

    fn process_document(
        &mut self,
        doc: &SourceDocument,
        source: &SourceConfig,
        output_dir: &Path,
    ) -> Result<SitePage, BuildError> {
        let kind = doc.kind();
        self.emit(BuildEvent::DocumentStarted {
            name: doc.base_name.clone(),
            kind,
        });

        let group_slug = source.slug();
        let doc_slug = slugify(&doc.base_name);
        let named = ArtifactSet::derive(&group_slug, &doc_slug, kind);
        let key = ArtifactSet::key(&group_slug, &doc_slug);

        let update_time = doc.modified_millis();
        let update_date = format_date_millis(update_time);

        let mut document_changed = false;
        match &named.artifacts {
            Artifacts::Docx {
                html_name,
                docx_name,
                generated_pdf_name,
            } => {
                document_changed = self.convert_and_render(
                    doc,
                    source,
                    output_dir,
                    html_name,
                    docx_name,
                    generated_pdf_name,
                    None,
                    &named.media_dir,
                    &update_date,
                )?;
            }
            Artifacts::DocxAndPdf {
                html_name,
                docx_name,
                generated_pdf_name,
                source_pdf_name,
            } => {
                document_changed = self.convert_and_render(
                    doc,
                    source,
                    output_dir,
                    html_name,
                    docx_name,
                    generated_pdf_name,
                    Some(source_pdf_name),
                    &named.media_dir,
                    &update_date,
                )?;
            }
            Artifacts::Pdf { source_pdf_name } => {
                let out_path = output_dir.join(source_pdf_name);
                if self.force || is_stale(&doc.input_mtimes(), &out_path) {
                    self.changed = true;
                    document_changed = true;
                    // Guaranteed present for this kind.
                    let pdf = doc.pdf_path().ok_or_else(|| {
                        std::io::Error::other(format!(
                            "no .pdf source for \"{}\"",
                            doc.base_name
                        ))
                    })?;
                    fs::copy(pdf, &out_path)?;
                    self.emit(BuildEvent::SourcePdfCopied {
                        file_name: source_pdf_name.clone(),
                    });
                    self.stats.copied += 1;
                } else {
                    self.emit(BuildEvent::SourcePdfUpToDate);
                }
            }
        }

        if !document_changed {
            self.stats.up_to_date += 1;
        }

        let entry = DocumentEntry {
            key,
            original_name: doc.base_name.clone(),
            source_slug: group_slug,
            modified_time: update_time,
            show_updates_after: source.show_updates_after.clone(),
            template: source.template.map(|t| t.name().to_string()),
            artifacts: named.artifacts,
        };

        Ok(SitePage {
            entry,
            modified_time: update_time,
        })
    }

    /// Bring a docx-backed document's HTML, supporting copies, and PDF
    /// rendition up to date. Returns whether anything was rebuilt.
    #[allow(clippy::too_many_arguments)]
    fn convert_and_render(
        &mut self,
        doc: &SourceDocument,
        source: &SourceConfig,
        output_dir: &Path,
        html_name: &str,
        docx_name: &str,
        generated_pdf_name: &str,
        source_pdf_name: Option<&str>,
        media_dir: &str,
        update_date: &str,
    ) -> Result<bool, BuildError> {
        let mut document_changed = false;
        let html_path = output_dir.join(html_name);

        if self.force || is_stale(&doc.input_mtimes(), &html_path) {
            self.changed = true;
            document_changed = true;

            let media_path = output_dir.join(media_dir);
            if media_path.exists() {
                fs::remove_dir_all(&media_path)?;
                self.emit(BuildEvent::MediaDirRemoved {
                    dir: media_dir.to_string(),
                });
            }

            let template = source.template();
            self.emit(BuildEvent::Converting { template });
            // Guaranteed present for docx-backed kinds.
            let docx = doc.docx_path().ok_or_else(|| {
                std::io::Error::other(format!("no .docx source for \"{}\"", doc.base_name))
            })?;
            self.converter.convert(
                output_dir,
                &ConversionJob {
                    source_docx: docx.to_path_buf(),
                    html_name: html_name.to_string(),
                    media_dir: media_dir.to_string(),
                    template,
                    group_name: source.name.clone(),
                    docx_name: docx_name.to_string(),
                    generated_pdf_name: generated_pdf_name.to_string(),
                    source_pdf_name: source_pdf_name.map(str::to_string),
                    update_date: update_date.to_string(),
                    generation_date: self.generation_date.clone(),
                },
            )?;

            fs::copy(docx, output_dir.join(docx_name))?;
            if let (Some(pdf), Some(source_pdf_name)) = (doc.pdf_path(), source_pdf_name) {
                fs::copy(pdf, output_dir.join(source_pdf_name))?;
            }
            self.emit(BuildEvent::Converted {
                html_name: html_name.to_string(),
            });
            self.stats.converted += 1;
        } else {
            self.emit(BuildEvent::HtmlUpToDate);
        }

        let pdf_path = output_dir.join(generated_pdf_name);
        let html_inputs: Vec<_> = modified(&html_path).into_iter().collect();
        if self.force || is_stale(&html_inputs, &pdf_path) {
            self.changed = true;
            document_changed = true;
            self.emit(BuildEvent::RenderingPdf);
            match self
                .renderer
                .render(&html_path, &pdf_path, update_date, &self.generation_date)
            {
                Ok(()) => {
                    self.emit(BuildEvent::PdfRendered {
                        pdf_name: generated_pdf_name.to_string(),
                    });
                    self.stats.pdfs_rendered += 1;
                }
                Err(e) => {
                    self.emit(BuildEvent::PdfRenderFailed {
                        error: e.to_string(),
                    });
                    self.stats.pdfs_failed += 1;
                }
            }
        } else {
            self.emit(BuildEvent::PdfUpToDate);
        }

        Ok(document_changed)
    }
}
