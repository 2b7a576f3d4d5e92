//! Pipeline stages for report analysis and rendering.
//!
//! Each submodule implements one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! analysis:  input ──▶ encode ──▶ llm ──▶ cleanup ──▶ stored content
//!           (path/URL)  (base64)   (VLM)   (fences, *)
//!
//! rendering: stored content ──▶ parse ──▶ layout ──▶ pdf
//!                               (tags)    (canvas)   (bytes)
//! ```
//!
//! 1. [`input`]    — load a local or remote PNG/JPEG
//! 2. [`encode`]   — downscale and base64-wrap it for the multimodal request
//! 3. [`llm`]      — the single model call
//! 4. [`cleanup`]  — strip fences and Markdown emphasis from the answer
//! 5. [`parse`]    — tag stream → sections and blocks
//! 6. [`layout`]   — sections → draw operations on a [`canvas::Canvas`],
//!    using [`fonts`] for measurement and [`sanitize`] for text
//! 7. [`pdf`]      — draw operations → PDF bytes
//!
//! [`gradient`] produces the cached header bitmap drawn on page 1.

pub mod canvas;
pub mod cleanup;
pub mod encode;
pub mod fonts;
pub mod gradient;
pub mod input;
pub mod layout;
pub mod llm;
pub mod parse;
pub mod pdf;
pub mod sanitize;
