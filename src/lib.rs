//! # Lectern
//!
//! An incremental publisher for lecture notes. Directories of `.docx` and
//! `.pdf` files become a browsable HTML site: each document gets a rendered
//! page, a downloadable copy of the original, and a print-quality PDF
//! rendition, all linked from a searchable index.
//!
//! # Architecture: One Incremental Pass
//!
//! A build is a single pass over the configured source groups:
//!
//! ```text
//! config.json  →  scan sources  →  convert stale documents  →  index.html
//!                       ↑                    ↓
//!                  manifest.json  ←———— record artifacts
//! ```
//!
//! Timestamps drive everything. An artifact is rebuilt only when one of its
//! inputs is newer than it, so re-running the tool after editing one lecture
//! converts that lecture and nothing else. The manifest records what was
//! published for each document; groups marked `"update": false` in the
//! config are served from those records alone, which lets finished semesters
//! stay on the site after their source directories are archived away.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.json` loading and validation |
//! | [`scan`] | Pairs `.docx`/`.pdf` files in a source directory into documents |
//! | [`slug`] | Display names → filesystem/URL-safe slugs |
//! | [`naming`] | Slugs → the published filenames for each document kind |
//! | [`stale`] | mtime comparisons behind every skip/rebuild decision |
//! | [`convert`] | pandoc subprocess wrapper producing standalone HTML |
//! | [`pdf`] | Headless-Chrome PDF renditions of converted pages |
//! | [`manifest`] | The persisted record of published artifacts |
//! | [`build`] | The pipeline tying the above together |
//! | [`render`] | Index page markup (Maud) |
//! | [`types`] | Assembled site structure and date formatting |
//! | [`output`] | CLI progress formatting |
//!
//! # Design Decisions
//!
//! ## Pandoc and Chrome as Subprocesses
//!
//! Faithful .docx rendering (math, footnotes, embedded images) and faithful
//! print layout are exactly the problems pandoc and Chrome already solve.
//! Both are invoked as external tools behind small traits
//! ([`convert::DocumentConverter`], [`pdf::PdfRenderer`]) so the pipeline
//! logic is testable without either installed.
//!
//! ## Maud Over Template Engines
//!
//! The index page is generated with [Maud](https://maud.lambda.xyz/):
//! compile-time checked markup, auto-escaped interpolation, and no template
//! files to ship. Document pages are different — they go through pandoc's
//! own `--template` mechanism, because their templates are user-editable
//! input, not program structure.
//!
//! ## Write-Once Outputs
//!
//! `manifest.json` and `index.html` are written once, at the end of a run,
//! and only when something actually changed. Deploy tooling that syncs on
//! mtime sees an untouched tree for a no-op run. Converted HTML goes through
//! a `.temp` rename so a crash can never leave a half-written page live.

pub mod build;
pub mod config;
pub mod convert;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod pdf;
pub mod render;
pub mod scan;
pub mod slug;
pub mod stale;
pub mod types;
