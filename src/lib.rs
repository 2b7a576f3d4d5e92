//! # jeevpath-report
//!
//! Turn AI-generated medical report analyses into styled, paginated PDFs.
//!
//! A vision model reads photos of lab reports and X-rays and answers in a
//! small fixed tag vocabulary (`<h3>`, `<p>`, `<ul>`/`<li>`, `<strong>`).
//! This crate builds that request, and, more importantly, turns the stored
//! answer into the "JeevPath AI Medical Assessment Report" PDF: gradient
//! header, patient grid, one accent chip per section, wrapped paragraphs
//! and bullet lists, a disclaimer and a footer on every page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! stored report
//!  │
//!  ├─ 1. Parse    <h3> sections → <p>/<ul> blocks (regex, never fails)
//!  ├─ 2. Layout   chips, paragraphs, lists on A4 pages (mm, auto page break)
//!  ├─ 3. Finish   disclaimer + "Report #id | Page n" footers
//!  └─ 4. Write    base-14 Helvetica, WinAnsi text, Flate streams → PDF bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jeevpath_report::{compose_report, PatientIdentity, ReportConfig, ReportMeta};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReportConfig::default();
//!     let patient = PatientIdentity::new(7, "Asha Rao").with_age(34).with_gender("Female");
//!     let meta = ReportMeta {
//!         checkup_type: "Dengue Fever".into(),
//!         timestamp: chrono::Local::now().naive_local(),
//!     };
//!     let content = "<h3>1. OBSERVATION</h3><p>Platelets are low.</p>";
//!     let report = compose_report(12, &patient, &meta, Some(content), &config)?;
//!     std::fs::write(&report.filename, &report.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `jpreport` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod compose;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::analyze_report;
pub use compose::{
    compose_document, compose_report, compose_to_file, download_report, report_filename, Download,
    ReportMeta,
};
pub use config::{ReportConfig, ReportConfigBuilder, Rgb, Theme};
pub use error::{ContentWarning, ReportError};
pub use output::{AnalysisOutput, AnalysisStats, RenderStats, RenderedReport};
pub use pipeline::layout::DISCLAIMER;
pub use pipeline::parse::{parse_sections, Block, Section};
pub use pipeline::sanitize::sanitize;
pub use prompts::{build_analysis_prompt, AnalysisRequest, CheckupType};
pub use record::{InMemoryReportStore, PatientIdentity, ReportRecord, ReportStore};
