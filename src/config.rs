//! Site configuration module.
//!
//! Handles loading and validating `config.json`. The config names the output
//! directory and the list of source groups to publish:
//!
//! ```json
//! {
//!   "title": "University lecture notes",
//!   "outputDir": "./site",
//!   "sources": [
//!     {
//!       "name": "Úvod do fyziky",
//!       "path": "./sources/fyzika",
//!       "update": true,
//!       "template": "tul",
//!       "showUpdatesAfter": "2025-09-01"
//!     },
//!     {
//!       "name": "Archiv 2023",
//!       "path": "./sources/archiv-2023",
//!       "update": false
//!     }
//!   ]
//! }
//! ```
//!
//! Groups with `"update": false` are frozen: their source directory is never
//! read (it may no longer exist) and their pages are reconstructed from the
//! manifest alone. `showUpdatesAfter` suppresses a group's documents from the
//! index's "recently updated" section until they change after that date.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::slug::slugify;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Template variants a source group can request for its HTML pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Default,
    Tul,
}

impl Template {
    /// Template file, relative to the config file's directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Template::Default => "template.html",
            Template::Tul => "template-tul.html",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Template::Default => "default",
            Template::Tul => "tul",
        }
    }
}

/// One source group: a directory of lecture documents published as a section
/// of the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceConfig {
    /// Display name; its slug prefixes every document key in the group.
    pub name: String,
    /// Directory holding the group's .docx/.pdf files.
    pub path: PathBuf,
    /// When false the group is frozen and served from the manifest.
    pub update: bool,
    /// Page template for the group's documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    /// ISO date (YYYY-MM-DD); documents last modified before it stay out of
    /// the index's "recently updated" section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_updates_after: Option<String>,
}

impl SourceConfig {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn template(&self) -> Template {
        self.template.unwrap_or(Template::Default)
    }
}

/// Site configuration loaded from `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title shown on the index page.
    #[serde(default = "default_title")]
    pub title: String,
    /// Directory the generated site is written to.
    pub output_dir: PathBuf,
    /// Source groups to publish; the index page sorts them by name.
    pub sources: Vec<SourceConfig>,
}

fn default_title() -> String {
    "Lecture materials".to_string()
}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "outputDir must not be empty".to_string(),
            ));
        }
        if self.sources.is_empty() {
            return Err(ConfigError::Validation(
                "at least one source group is required".to_string(),
            ));
        }
        let mut slugs = std::collections::BTreeSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "source name must not be empty".to_string(),
                ));
            }
            let slug = source.slug();
            if slug.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "source name \"{}\" slugifies to an empty string",
                    source.name
                )));
            }
            if !slugs.insert(slug.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate source group slug \"{slug}\""
                )));
            }
            if let Some(date) = &source.show_updates_after {
                chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                    ConfigError::Validation(format!(
                        "showUpdatesAfter for \"{}\" must be YYYY-MM-DD, got \"{date}\"",
                        source.name
                    ))
                })?;
            }
        }
        Ok(())
    }
}

/// Read and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: SiteConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Stock sample config, printed by `gen-config`.
pub fn stock_config_json() -> &'static str {
    r#"{
  "title": "University lecture notes",
  "outputDir": "./site",
  "sources": [
    {
      "name": "Úvod do fyziky",
      "path": "./sources/fyzika",
      "update": true
    },
    {
      "name": "Archiv 2023",
      "path": "./sources/archiv-2023",
      "update": false
    }
  ]
}
"#
}
