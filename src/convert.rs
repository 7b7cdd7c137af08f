//! Document-to-HTML conversion via pandoc.
//!
//! The [`DocumentConverter`] trait defines the single operation the build
//! pipeline needs: turn one .docx into a standalone HTML page inside the
//! output directory. The production implementation shells out to `pandoc`;
//! tests substitute a recording converter.
//!
//! The converter always writes to `{html}.temp` first and renames into place
//! only after pandoc exits successfully, so a crash mid-conversion can never
//! leave a truncated page where a good one used to be. On failure both the
//! temp file and the freshly extracted media directory are removed before
//! the error is returned.
//!
//! Pandoc resolves `--extract-media` relative to its working directory, and
//! the extracted `{key}-media/` paths embedded in the HTML must be relative
//! to the page. Running pandoc with its working directory set to the output
//! directory satisfies both; every input path is absolutized first so the
//! change of directory cannot break them.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::config::Template;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to run pandoc: {0}")]
    Spawn(std::io::Error),
    #[error("pandoc failed for \"{input}\": {stderr}")]
    Failed { input: String, stderr: String },
}

/// Everything needed to convert one document. Filenames are relative to the
/// output directory; `source_docx` is wherever the scanner found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source_docx: PathBuf,
    /// Final HTML filename, `{key}.html`.
    pub html_name: String,
    /// Media extraction directory name, `{key}-media`.
    pub media_dir: String,
    pub template: Template,
    /// Metadata passed through to the page template.
    pub group_name: String,
    pub docx_name: String,
    pub generated_pdf_name: String,
    pub source_pdf_name: Option<String>,
    pub update_date: String,
    pub generation_date: String,
}

pub trait DocumentConverter {
    /// Convert `job.source_docx` into `{output_dir}/{job.html_name}`.
    fn convert(&self, output_dir: &Path, job: &ConversionJob) -> Result<(), ConvertError>;
}

/// Shells out to `pandoc` with the site's template, KaTeX math, a table of
/// contents, and the TOC-stripping Lua filter.
pub struct PandocConverter {
    /// Directory holding `template.html`, `template-tul.html` and
    /// `remove-toc.lua`; normally the config file's directory.
    assets_dir: PathBuf,
}

/// Lua filter that removes pandoc's inline TOC from the body (the template
/// places its own).
pub const LUA_FILTER_NAME: &str = "remove-toc.lua";

impl PandocConverter {
    pub fn new(assets_dir: PathBuf) -> Self {
        Self { assets_dir }
    }
}

impl DocumentConverter for PandocConverter {
    fn convert(&self, output_dir: &Path, job: &ConversionJob) -> Result<(), ConvertError> {
        // Absolute paths survive the working-directory change below.
        let source = std::path::absolute(&job.source_docx)?;
        let template = std::path::absolute(self.assets_dir.join(job.template.file_name()))?;
        let lua_filter = std::path::absolute(self.assets_dir.join(LUA_FILTER_NAME))?;

        let temp_name = format!("{}.temp", job.html_name);

        let mut command = Command::new("pandoc");
        command
            .current_dir(output_dir)
            .arg(&source)
            .args(["-t", "html", "-s", "-o"])
            .arg(&temp_name)
            .args(["--katex", "--toc"])
            .arg(format!("--lua-filter={}", lua_filter.display()))
            .arg(format!("--template={}", template.display()))
            .arg(format!("--metadata=group-name:{}", job.group_name))
            .arg(format!("--metadata=docx_path:{}", job.docx_name))
            .arg(format!("--metadata=pdf_path:{}", job.generated_pdf_name))
            .arg(format!(
                "--metadata=generation_date:{}",
                job.generation_date
            ))
            .arg(format!("--metadata=update_date:{}", job.update_date))
            .arg(format!("--extract-media={}", job.media_dir));
        if let Some(source_pdf) = &job.source_pdf_name {
            command.arg(format!("--metadata=source_pdf_path:{source_pdf}"));
        }

        let output = command.output().map_err(ConvertError::Spawn)?;

        if !output.status.success() {
            let _ = std::fs::remove_file(output_dir.join(&temp_name));
            let media_dir = output_dir.join(&job.media_dir);
            if media_dir.exists() {
                let _ = std::fs::remove_dir_all(&media_dir);
            }
            return Err(ConvertError::Failed {
                input: job.source_docx.display().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        std::fs::rename(
            output_dir.join(&temp_name),
            output_dir.join(&job.html_name),
        )?;
        Ok(())
    }
}
