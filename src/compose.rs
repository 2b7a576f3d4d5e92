//! Report composition: stored record → finished PDF.
//!
//! Page 1 carries the gradient header, the brand lines and the patient
//! grid; the parsed AI content flows below it and onto further pages as
//! needed, followed by the disclaimer. Footers are stamped last, once the
//! page count is known.
//!
//! Malformed AI content never fails a render (see
//! [`crate::pipeline::parse`]). Only serialisation, header image or I/O
//! problems surface as [`ReportError`].

use crate::config::{ReportConfig, Theme};
use crate::error::ReportError;
use crate::output::{RenderStats, RenderedReport};
use crate::pipeline::canvas::{Align, Canvas, Document, Ln};
use crate::pipeline::fonts::FontFace;
use crate::pipeline::layout::{render_disclaimer, render_sections, stamp_footers};
use crate::pipeline::parse::{parse_report, Block, ParsedReport};
use crate::pipeline::pdf::write_pdf;
use crate::pipeline::sanitize::sanitize;
use crate::record::{PatientIdentity, ReportRecord, ReportStore};
use chrono::NaiveDateTime;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Record fields shown in the patient grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    pub checkup_type: String,
    pub timestamp: NaiveDateTime,
}

impl From<&ReportRecord> for ReportMeta {
    fn from(record: &ReportRecord) -> Self {
        Self {
            checkup_type: record.checkup_type.clone(),
            timestamp: record.timestamp,
        }
    }
}

/// Suggested download name for report `report_id`.
pub fn report_filename(report_id: u64) -> String {
    format!("JeevPath_Analysis_{report_id}.pdf")
}

/// Bytes ready to hand to an HTTP response.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

impl Download {
    /// `Content-Disposition` header value.
    pub fn content_disposition(&self) -> String {
        format!("attachment;filename={}", self.filename)
    }
}

/// Render report `report_id` for `identity`.
///
/// `raw` is the stored AI content; `None` renders like empty content.
pub fn compose_report(
    report_id: u64,
    identity: &PatientIdentity,
    meta: &ReportMeta,
    raw: Option<&str>,
    config: &ReportConfig,
) -> Result<RenderedReport, ReportError> {
    let start = Instant::now();
    let (doc, parsed) = compose_document(report_id, identity, meta, raw, config)?;

    // ── Serialise ────────────────────────────────────────────────────────
    let page_count = doc.page_count();
    let bytes = write_pdf(&doc, &format!("JeevPath Analysis #{report_id}"))?;

    let mut stats = RenderStats {
        section_count: parsed.sections.len(),
        byte_len: bytes.len(),
        duration_ms: start.elapsed().as_millis() as u64,
        ..Default::default()
    };
    for block in parsed.sections.iter().flat_map(|s| &s.blocks) {
        match block {
            Block::Paragraph { .. } => stats.paragraph_count += 1,
            Block::List { items } => stats.list_item_count += items.len(),
        }
    }

    info!(
        "Rendered report #{}: {} section(s), {} page(s), {} bytes in {}ms",
        report_id, stats.section_count, page_count, stats.byte_len, stats.duration_ms
    );

    Ok(RenderedReport {
        bytes,
        filename: report_filename(report_id),
        sections: parsed.sections,
        page_count,
        warnings: parsed.warnings,
        stats,
    })
}

/// Lay out the report pages without encoding them: header, patient grid,
/// sections, disclaimer and footers. Also returns the parse result.
pub fn compose_document(
    report_id: u64,
    identity: &PatientIdentity,
    meta: &ReportMeta,
    raw: Option<&str>,
    config: &ReportConfig,
) -> Result<(Document, ParsedReport), ReportError> {
    let theme = &config.theme;

    let header = config.header_cache.load()?;

    let mut canvas = Canvas::a4();
    canvas.add_page();
    canvas.set_auto_page_break(true, 20.0);

    // ── Header ───────────────────────────────────────────────────────────
    canvas.image(header, 0.0, 0.0, 210.0, 30.0);
    draw_brand(&mut canvas, config);
    canvas.ln(12.0);

    // ── Patient grid ─────────────────────────────────────────────────────
    let date = format_date(&meta.timestamp, &config.date_format)?;
    canvas.set_fill_color(theme.panel);
    let y = canvas.y();
    canvas.fill_rect(10.0, y, 190.0, 30.0);
    let base_y = y + 5.0;

    let fields = [
        ("Patient:", identity.name.clone(), 15.0, base_y),
        ("Age/Sex:", identity.age_sex(), 15.0, base_y + 8.0),
        ("ID:", format!("JP-{}", identity.id), 15.0, base_y + 16.0),
        ("Date:", date, 110.0, base_y),
        ("Category:", meta.checkup_type.clone(), 110.0, base_y + 8.0),
    ];
    for (label, value, x, y) in &fields {
        draw_field(&mut canvas, theme, label, value, *x, *y);
    }
    canvas.set_y(base_y + 35.0);

    // ── Content ──────────────────────────────────────────────────────────
    let parsed = parse_report(raw.unwrap_or(""));
    for w in &parsed.warnings {
        warn!("Report #{}: {}", report_id, w);
    }
    render_sections(&mut canvas, &parsed.sections, theme);
    render_disclaimer(&mut canvas, theme);
    stamp_footers(&mut canvas, &config.footer_brand, report_id, theme);

    Ok((canvas.finish(), parsed))
}

fn draw_brand(canvas: &mut Canvas, config: &ReportConfig) {
    let theme = &config.theme;
    canvas.set_y(8.0);
    canvas.set_font(FontFace::Bold, 18.0);
    canvas.set_text_color(theme.accent);
    canvas.cell(10.0, 0.0, "", Ln::Right, Align::Left, false);
    canvas.cell(0.0, 10.0, &config.brand_title, Ln::NextLine, Align::Left, false);

    canvas.set_font(FontFace::Italic, 10.0);
    canvas.set_text_color(theme.label);
    canvas.cell(10.0, 0.0, "", Ln::Right, Align::Left, false);
    canvas.cell(0.0, 5.0, &config.brand_subtitle, Ln::NextLine, Align::Left, false);
}

fn draw_field(canvas: &mut Canvas, theme: &Theme, label: &str, value: &str, x: f32, y: f32) {
    canvas.set_xy(x, y);
    canvas.set_font(FontFace::Bold, 10.0);
    canvas.set_text_color(theme.label);
    canvas.cell(30.0, 5.0, label, Ln::Right, Align::Left, false);
    canvas.set_font(FontFace::Regular, 10.0);
    canvas.set_text_color(theme.text_main);
    canvas.cell(0.0, 5.0, &sanitize(value), Ln::Right, Align::Left, false);
}

fn format_date(ts: &NaiveDateTime, pattern: &str) -> Result<String, ReportError> {
    let mut out = String::new();
    write!(out, "{}", ts.format(pattern))
        .map_err(|_| ReportError::InvalidConfig(format!("invalid date format '{pattern}'")))?;
    Ok(out)
}

/// Render and write the PDF to `path` atomically (temp file + rename).
pub fn compose_to_file(
    path: impl AsRef<Path>,
    report_id: u64,
    identity: &PatientIdentity,
    meta: &ReportMeta,
    raw: Option<&str>,
    config: &ReportConfig,
) -> Result<RenderedReport, ReportError> {
    let rendered = compose_report(report_id, identity, meta, raw, config)?;
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    std::fs::write(&tmp_path, &rendered.bytes).map_err(|e| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("Wrote {}", path.display());
    Ok(rendered)
}

/// Owner-checked download of a stored report.
///
/// # Errors
/// - [`ReportError::ReportNotFound`] when no record has this id
/// - [`ReportError::Unauthorized`] when the record belongs to someone else
/// - any error from [`compose_report`]
pub fn download_report(
    store: &dyn ReportStore,
    report_id: u64,
    config: &ReportConfig,
) -> Result<Download, ReportError> {
    let record = store
        .fetch_report_by_id(report_id)?
        .ok_or(ReportError::ReportNotFound { id: report_id })?;
    let user = store.current_user_identity()?;

    if record.owner_id != user.id {
        warn!(
            "User #{} requested report #{} owned by #{}",
            user.id, report_id, record.owner_id
        );
        return Err(ReportError::Unauthorized {
            id: report_id,
            user: user.id,
        });
    }

    let rendered = compose_report(
        report_id,
        &user,
        &ReportMeta::from(&record),
        record.ai_content.as_deref(),
        config,
    )?;

    Ok(Download {
        bytes: rendered.bytes,
        filename: rendered.filename,
        content_type: "application/pdf",
    })
}
