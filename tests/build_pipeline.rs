//! End-to-end pipeline tests against recording stand-ins for pandoc and
//! Chrome. Each test drives `build::build` over a temporary source tree and
//! asserts on the published files, the manifest, and which external
//! invocations actually happened.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use lectern::build::{BuildError, BuildStats, build};
use lectern::config::{SiteConfig, SourceConfig};
use lectern::convert::{ConversionJob, ConvertError, DocumentConverter};
use lectern::pdf::{PdfRenderer, RenderError};
use lectern::stale::modified_millis;
use lectern::types::format_date_millis;

/// Records jobs and writes a placeholder page where pandoc would.
#[derive(Default)]
struct RecordingConverter {
    jobs: Mutex<Vec<ConversionJob>>,
    fail: bool,
}

impl RecordingConverter {
    fn failing() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn jobs(&self) -> Vec<ConversionJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl DocumentConverter for RecordingConverter {
    fn convert(&self, output_dir: &Path, job: &ConversionJob) -> Result<(), ConvertError> {
        self.jobs.lock().unwrap().push(job.clone());
        if self.fail {
            return Err(ConvertError::Failed {
                input: job.source_docx.display().to_string(),
                stderr: "boom".to_string(),
            });
        }
        fs::write(
            output_dir.join(&job.html_name),
            format!("<html><body>{}</body></html>", job.group_name),
        )?;
        Ok(())
    }
}

/// Records render requests and writes a placeholder PDF.
#[derive(Default)]
struct RecordingRenderer {
    renders: Mutex<Vec<(PathBuf, PathBuf)>>,
    fail: bool,
}

impl RecordingRenderer {
    fn failing() -> Self {
        Self {
            renders: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn renders(&self) -> Vec<(PathBuf, PathBuf)> {
        self.renders.lock().unwrap().clone()
    }
}

impl PdfRenderer for RecordingRenderer {
    fn render(
        &self,
        html_path: &Path,
        pdf_path: &Path,
        _update_date: &str,
        _generation_date: &str,
    ) -> Result<(), RenderError> {
        self.renders
            .lock()
            .unwrap()
            .push((html_path.to_path_buf(), pdf_path.to_path_buf()));
        if self.fail {
            return Err(RenderError::Chrome("no browser".to_string()));
        }
        fs::write(pdf_path, b"%PDF-1.4 placeholder")?;
        Ok(())
    }
}

struct Fixture {
    tmp: TempDir,
    config: SiteConfig,
}

impl Fixture {
    /// One live group "Fyzika" with a docx lecture, a docx+pdf lecture, and
    /// a standalone pdf.
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let sources = tmp.path().join("sources/fyzika");
        fs::create_dir_all(&sources).unwrap();
        fs::write(sources.join("Přednáška 1.docx"), b"docx one").unwrap();
        fs::write(sources.join("Přednáška 2.docx"), b"docx two").unwrap();
        fs::write(sources.join("Přednáška 2.pdf"), b"pdf two").unwrap();
        fs::write(sources.join("Skripta.pdf"), b"pdf skripta").unwrap();

        let config = SiteConfig {
            title: "Test notes".to_string(),
            output_dir: tmp.path().join("site"),
            sources: vec![SourceConfig {
                name: "Fyzika".to_string(),
                path: sources,
                update: true,
                template: None,
                show_updates_after: None,
            }],
        };
        Self { tmp, config }
    }

    fn assets_dir(&self) -> PathBuf {
        self.tmp.path().to_path_buf()
    }

    fn output(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(name)
    }

    fn run(
        &self,
        converter: &RecordingConverter,
        renderer: &RecordingRenderer,
        force: bool,
    ) -> Result<BuildStats, BuildError> {
        build(
            &self.config,
            &self.assets_dir(),
            converter,
            renderer,
            force,
            None,
        )
    }

    fn touch(&self, relative: &str, ahead: Duration) {
        set_mtime(&self.tmp.path().join(relative), SystemTime::now() + ahead);
    }

    /// Add a live group with a single docx document; returns the source path.
    fn add_group(&mut self, name: &str, dir: &str, doc: &str) -> PathBuf {
        let sources = self.tmp.path().join(dir);
        fs::create_dir_all(&sources).unwrap();
        let doc_path = sources.join(doc);
        fs::write(&doc_path, b"docx").unwrap();
        self.config.sources.push(SourceConfig {
            name: name.to_string(),
            path: sources,
            update: true,
            template: None,
            show_updates_after: None,
        });
        doc_path
    }
}

fn set_mtime(path: &Path, time: SystemTime) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}

#[test]
fn first_build_publishes_everything() {
    let fx = Fixture::new();
    let converter = RecordingConverter::default();
    let renderer = RecordingRenderer::default();

    let stats = fx.run(&converter, &renderer, false).unwrap();
    assert_eq!(stats.converted, 2);
    assert_eq!(stats.pdfs_rendered, 2);
    assert_eq!(stats.copied, 1);
    assert_eq!(stats.up_to_date, 0);

    // document pages, renditions, copies
    assert!(fx.output("fyzika-prednaska-1.html").exists());
    assert!(fx.output("fyzika-prednaska-1.pdf").exists());
    assert!(fx.output("fyzika-prednaska-1.docx").exists());
    assert!(fx.output("fyzika-prednaska-2.source.pdf").exists());
    assert!(fx.output("fyzika-skripta.pdf").exists());

    // site-wide files
    assert!(fx.output("styles.css").exists());
    assert!(fx.output("favicon.svg").exists());
    assert!(fx.output("manifest.json").exists());
    let index = fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(index.contains("Přednáška 1"));
    assert!(index.contains("fyzika-skripta.pdf"));
    assert!(index.contains("Test notes"));
}

#[test]
fn second_build_is_a_no_op() {
    let fx = Fixture::new();
    let converter = RecordingConverter::default();
    let renderer = RecordingRenderer::default();
    fx.run(&converter, &renderer, false).unwrap();

    let manifest_before = fs::read(fx.output("manifest.json")).unwrap();
    let index_before = fs::read(fx.output("index.html")).unwrap();

    let converter2 = RecordingConverter::default();
    let renderer2 = RecordingRenderer::default();
    let stats = fx.run(&converter2, &renderer2, false).unwrap();

    assert!(converter2.jobs().is_empty());
    assert!(renderer2.renders().is_empty());
    assert_eq!(stats.converted, 0);
    assert_eq!(stats.up_to_date, 3);
    assert_eq!(fs::read(fx.output("manifest.json")).unwrap(), manifest_before);
    assert_eq!(fs::read(fx.output("index.html")).unwrap(), index_before);
}

#[test]
fn touched_source_reconverts_only_that_document() {
    let fx = Fixture::new();
    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::default(),
        false,
    )
    .unwrap();

    // leftover media from the first conversion must be replaced wholesale
    let media = fx.output("fyzika-prednaska-1-media");
    fs::create_dir_all(&media).unwrap();
    fs::write(media.join("image1.png"), b"old").unwrap();

    fx.touch("sources/fyzika/Přednáška 1.docx", Duration::from_secs(5));

    let converter = RecordingConverter::default();
    let renderer = RecordingRenderer::default();
    let stats = fx.run(&converter, &renderer, false).unwrap();

    let jobs = converter.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].html_name, "fyzika-prednaska-1.html");
    assert!(!media.exists());
    assert_eq!(stats.converted, 1);
    assert_eq!(stats.up_to_date, 2);
}

#[test]
fn touched_pdf_sibling_also_reconverts_the_page() {
    let fx = Fixture::new();
    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::default(),
        false,
    )
    .unwrap();

    fx.touch("sources/fyzika/Přednáška 2.pdf", Duration::from_secs(5));

    let converter = RecordingConverter::default();
    let stats = fx
        .run(&converter, &RecordingRenderer::default(), false)
        .unwrap();

    let jobs = converter.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].html_name, "fyzika-prednaska-2.html");
    assert_eq!(
        jobs[0].source_pdf_name.as_deref(),
        Some("fyzika-prednaska-2.source.pdf")
    );
    assert_eq!(stats.converted, 1);
}

#[test]
fn manifest_records_kinds_and_names() {
    let fx = Fixture::new();
    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::default(),
        false,
    )
    .unwrap();

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fx.output("manifest.json")).unwrap()).unwrap();

    let lecture1 = &manifest["fyzika-prednaska-1"];
    assert_eq!(lecture1["type"], "docx");
    assert_eq!(lecture1["originalName"], "Přednáška 1");
    assert_eq!(lecture1["sourceSlug"], "fyzika");
    assert_eq!(lecture1["htmlName"], "fyzika-prednaska-1.html");

    let lecture2 = &manifest["fyzika-prednaska-2"];
    assert_eq!(lecture2["type"], "docx_and_pdf");
    assert_eq!(lecture2["sourcePdfName"], "fyzika-prednaska-2.source.pdf");

    let skripta = &manifest["fyzika-skripta"];
    assert_eq!(skripta["type"], "pdf");
    assert_eq!(skripta["sourcePdfName"], "fyzika-skripta.pdf");
    assert!(skripta.get("htmlName").is_none());
}

#[test]
fn pdf_render_failure_does_not_abort_the_build() {
    let fx = Fixture::new();
    let converter = RecordingConverter::default();
    let renderer = RecordingRenderer::failing();

    let stats = fx.run(&converter, &renderer, false).unwrap();
    assert_eq!(stats.converted, 2);
    assert_eq!(stats.pdfs_rendered, 0);
    assert_eq!(stats.pdfs_failed, 2);

    // pages, manifest, and index still published
    assert!(fx.output("fyzika-prednaska-1.html").exists());
    assert!(fx.output("manifest.json").exists());
    assert!(fx.output("index.html").exists());
}

#[test]
fn failed_rendition_is_retried_next_run() {
    let fx = Fixture::new();
    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::failing(),
        false,
    )
    .unwrap();

    let converter = RecordingConverter::default();
    let renderer = RecordingRenderer::default();
    let stats = fx.run(&converter, &renderer, false).unwrap();

    // HTML untouched, only the missing renditions are produced
    assert!(converter.jobs().is_empty());
    assert_eq!(stats.pdfs_rendered, 2);
}

#[test]
fn conversion_failure_aborts_without_writing_manifest() {
    let fx = Fixture::new();
    let converter = RecordingConverter::failing();
    let renderer = RecordingRenderer::default();

    let result = fx.run(&converter, &renderer, false);
    assert!(matches!(result, Err(BuildError::Convert(_))));
    assert!(!fx.output("manifest.json").exists());
    assert!(!fx.output("index.html").exists());
}

#[test]
fn frozen_group_served_from_manifest_without_sources() {
    let mut fx = Fixture::new();
    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::default(),
        false,
    )
    .unwrap();

    // freeze the group and archive its source directory away
    fs::remove_dir_all(&fx.config.sources[0].path).unwrap();
    fx.config.sources[0].update = false;

    let converter = RecordingConverter::default();
    let renderer = RecordingRenderer::default();
    let stats = fx.run(&converter, &renderer, false).unwrap();

    assert!(converter.jobs().is_empty());
    assert!(renderer.renders().is_empty());
    assert_eq!(stats.frozen_pages, 3);

    // nothing changed, so the published index from the first run stands
    let index = fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(index.contains("Přednáška 1"));
}

#[test]
fn frozen_page_date_tracks_live_artifact_mtime() {
    let mut fx = Fixture::new();
    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::default(),
        false,
    )
    .unwrap();

    fs::remove_dir_all(&fx.config.sources[0].path).unwrap();
    fx.config.sources[0].update = false;
    // a live group alongside, so the second run rewrites the index
    fx.add_group("Chemie", "sources/chemie", "Termodynamika.docx");

    // the frozen page's timestamp must be the published file's mtime, not
    // the one recorded in the manifest
    let html = fx.output("fyzika-prednaska-1.html");
    set_mtime(&html, SystemTime::now() + Duration::from_secs(3600));
    let expected = format_date_millis(modified_millis(&html));

    let converter = RecordingConverter::default();
    fx.run(&converter, &RecordingRenderer::default(), false)
        .unwrap();

    assert_eq!(converter.jobs().len(), 1);
    let index = fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(index.contains(&format!(
        "Notes last updated: <strong>{expected}</strong>"
    )));
}

#[test]
fn missing_frozen_artifact_has_no_date() {
    let mut fx = Fixture::new();
    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::default(),
        false,
    )
    .unwrap();

    fs::remove_dir_all(&fx.config.sources[0].path).unwrap();
    fx.config.sources[0].update = false;

    // every frozen primary artifact is gone from the output directory
    fs::remove_file(fx.output("fyzika-prednaska-1.html")).unwrap();
    fs::remove_file(fx.output("fyzika-prednaska-2.html")).unwrap();
    fs::remove_file(fx.output("fyzika-skripta.pdf")).unwrap();

    // a live document dated well in the past, so it can only win the
    // "last updated" slot if the frozen pages fell back to no date at all
    let doc = fx.add_group("Chemie", "sources/chemie", "Termodynamika.docx");
    set_mtime(&doc, SystemTime::now() - Duration::from_secs(400 * 24 * 3600));
    let expected = format_date_millis(modified_millis(&doc));

    let stats = fx
        .run(
            &RecordingConverter::default(),
            &RecordingRenderer::default(),
            false,
        )
        .unwrap();
    assert_eq!(stats.frozen_pages, 3);

    let index = fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(index.contains(&format!(
        "Notes last updated: <strong>{expected}</strong>"
    )));
    // the pages themselves stay listed
    assert!(index.contains("Přednáška 1"));
    assert!(index.contains("Přednáška 2"));
    assert!(index.contains("Skripta"));
}

#[test]
fn force_rebuilds_fresh_outputs() {
    let fx = Fixture::new();
    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::default(),
        false,
    )
    .unwrap();

    let converter = RecordingConverter::default();
    let renderer = RecordingRenderer::default();
    let stats = fx.run(&converter, &renderer, true).unwrap();

    assert_eq!(converter.jobs().len(), 2);
    assert_eq!(stats.converted, 2);
    assert_eq!(stats.copied, 1);
}

#[test]
fn missing_group_directory_is_skipped() {
    let mut fx = Fixture::new();
    fx.config.sources.push(SourceConfig {
        name: "Chemie".to_string(),
        path: fx.tmp.path().join("sources/chemie"),
        update: true,
        template: None,
        show_updates_after: None,
    });

    let stats = fx
        .run(
            &RecordingConverter::default(),
            &RecordingRenderer::default(),
            false,
        )
        .unwrap();
    assert_eq!(stats.converted, 2);

    let index = fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(!index.contains("Chemie"));
}

#[test]
fn fonts_directory_is_copied_when_present() {
    let fx = Fixture::new();
    let fonts = fx.tmp.path().join("fonts");
    fs::create_dir_all(&fonts).unwrap();
    fs::write(fonts.join("serif.woff2"), b"font bytes").unwrap();

    fx.run(
        &RecordingConverter::default(),
        &RecordingRenderer::default(),
        false,
    )
    .unwrap();

    assert!(fx.output("fonts/serif.woff2").exists());
}
