//! Error types for the jeevpath-report library.
//!
//! Two distinct types reflect two distinct outcomes:
//!
//! * [`ReportError`] — **Fatal**: the report cannot be produced at all
//!   (text the PDF encoding cannot carry, unreadable header image, I/O
//!   failure, missing record, wrong owner). Returned as `Err(ReportError)`
//!   from the top-level `compose*` / `analyze*` functions.
//!
//! * [`ContentWarning`] — **Non-fatal**: the AI content did not follow the
//!   tag contract (no headings, stray text outside `<p>`/`<ul>`), so part of
//!   it was degraded or dropped. Stored inside
//!   [`crate::output::RenderedReport`] so callers can see what was lost
//!   without the download failing.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the jeevpath-report library.
///
/// Content-level degradations use [`ContentWarning`] and are stored in
/// [`crate::output::RenderedReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Serialization errors ──────────────────────────────────────────────
    /// A string reached the PDF writer with a character the single-byte
    /// document encoding cannot represent.
    #[error("Cannot encode {context} for the PDF: character {ch:?} (U+{code:04X}) is outside Latin-1")]
    Encoding {
        context: String,
        ch: char,
        code: u32,
    },

    /// The decorative header bitmap could not be generated, saved or decoded.
    #[error("Header image '{path}' failed: {detail}")]
    HeaderImage { path: PathBuf, detail: String },

    // ── Record errors ─────────────────────────────────────────────────────
    /// No stored report exists with this id.
    #[error("Report #{id} not found")]
    ReportNotFound { id: u64 },

    /// The report belongs to a different user.
    #[error("Report #{id} does not belong to user #{user}")]
    Unauthorized { id: u64, user: u64 },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Image input was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The request cannot be processed as given (e.g. no images supplied).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The file exists and was read, but is neither PNG nor JPEG.
    #[error("File is not a supported image: '{path}'\nFirst bytes: {magic:?}")]
    NotAnImage { path: PathBuf, magic: [u8; 4] },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal degradation of the AI content.
///
/// Collected while parsing and stored alongside the rendered report. The
/// PDF is still produced; these only explain why it holds less than the
/// raw content did.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ContentWarning {
    /// The content is empty or whitespace only.
    #[error("report content is empty")]
    EmptyContent,

    /// No `<h3>` headings were found; the whole text was flowed as one block.
    #[error("no <h3> headings found, rendered as plain text")]
    NoHeadings,

    /// Text outside any `<p>` or `<ul>` block was dropped from a section.
    #[error("section '{section}': {chars} characters outside <p>/<ul> dropped")]
    DroppedText { section: String, chars: usize },

    /// Text before the first `<h3>` heading was dropped.
    #[error("{chars} characters before the first heading dropped")]
    DroppedPreamble { chars: usize },

    /// A section heading had no renderable block after it.
    #[error("section '{section}' has no paragraphs or lists")]
    EmptySection { section: String },
}
