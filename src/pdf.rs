//! PDF renditions of converted pages, printed by headless Chrome.
//!
//! The [`PdfRenderer`] trait is the seam the build pipeline depends on; the
//! production [`ChromeRenderer`] loads the finished HTML over `file://`,
//! injects the update and generation dates into the print-only title and
//! closing pages, and prints to A4.
//!
//! Rendering failures are per-document and non-fatal. The pipeline logs them
//! and moves on, leaving any previous rendition in place.

use std::path::Path;
use thiserror::Error;

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Chrome error: {0}")]
    Chrome(String),
}

pub trait PdfRenderer {
    /// Print `html_path` to `pdf_path`, stamping the given dates into the
    /// page's print-only date slots.
    fn render(
        &self,
        html_path: &Path,
        pdf_path: &Path,
        update_date: &str,
        generation_date: &str,
    ) -> Result<(), RenderError>;
}

/// Renders through a fresh headless Chrome instance per document. Launch is
/// the expensive part, but renditions are rare once a site is warm and an
/// isolated browser per page cannot leak state between documents.
#[derive(Default)]
pub struct ChromeRenderer;

impl ChromeRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Fills the `.update-date` and `.generation-date` slots on the print-only
/// title and last pages. Pages without those slots are printed unchanged.
fn inject_dates_js(update_date: &str, generation_date: &str) -> String {
    let update = serde_json::to_string(update_date).unwrap_or_default();
    let generation = serde_json::to_string(generation_date).unwrap_or_default();
    format!(
        r#"(() => {{
            const update = {update};
            const generation = {generation};
            for (const root of ['#pdf-title-page', '#pdf-last-page']) {{
                const u = document.querySelector(root + ' .update-date');
                const g = document.querySelector(root + ' .generation-date');
                if (u) u.textContent = update;
                if (g) g.textContent = generation;
            }}
        }})()"#
    )
}

// 25 CSS pixels at 96 dpi.
const MARGIN_INCHES: f64 = 25.0 / 96.0;

fn a4_print_options() -> PrintToPdfOptions {
    PrintToPdfOptions {
        print_background: Some(true),
        paper_width: Some(8.27),
        paper_height: Some(11.69),
        margin_top: Some(MARGIN_INCHES),
        margin_bottom: Some(MARGIN_INCHES),
        margin_left: Some(MARGIN_INCHES),
        margin_right: Some(MARGIN_INCHES),
        display_header_footer: Some(true),
        // Blank templates suppress Chrome's default page header/footer.
        header_template: Some("<div></div>".to_string()),
        footer_template: Some("<div></div>".to_string()),
        ..Default::default()
    }
}

impl PdfRenderer for ChromeRenderer {
    fn render(
        &self,
        html_path: &Path,
        pdf_path: &Path,
        update_date: &str,
        generation_date: &str,
    ) -> Result<(), RenderError> {
        let html_path = std::path::absolute(html_path)?;
        let url = format!("file://{}", html_path.display());

        let browser = Browser::new(LaunchOptions::default())
            .map_err(|e| RenderError::Chrome(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::Chrome(e.to_string()))?;
        tab.navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| RenderError::Chrome(e.to_string()))?;
        tab.evaluate(&inject_dates_js(update_date, generation_date), false)
            .map_err(|e| RenderError::Chrome(e.to_string()))?;

        let bytes = tab
            .print_to_pdf(Some(a4_print_options()))
            .map_err(|e| RenderError::Chrome(e.to_string()))?;
        std::fs::write(pdf_path, bytes)?;
        Ok(())
    }
}
