//! Result types returned by rendering and analysis.

use crate::error::ContentWarning;
use crate::pipeline::parse::Section;
use serde::Serialize;

/// A finished PDF plus what went into it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedReport {
    /// The complete PDF file.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Suggested download name, `JeevPath_Analysis_<id>.pdf`.
    pub filename: String,
    /// Sections as parsed from the stored content.
    pub sections: Vec<Section>,
    pub page_count: usize,
    /// Content that was degraded or dropped while parsing.
    pub warnings: Vec<ContentWarning>,
    pub stats: RenderStats,
}

/// Counters for one render call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderStats {
    pub section_count: usize,
    pub paragraph_count: usize,
    pub list_item_count: usize,
    pub byte_len: usize,
    pub duration_ms: u64,
}

/// Outcome of one analysis call.
///
/// `content` is always present: on a failed model call it holds the error
/// report that gets stored in place of an analysis, and `error` carries the
/// cause.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub content: String,
    pub error: Option<String>,
    pub stats: AnalysisStats,
}

impl AnalysisOutput {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    pub image_count: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}
