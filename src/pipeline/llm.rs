//! Model interaction: one multimodal request per analysis.
//!
//! The prompt text and every report image go into a single user message.
//! There is no retry loop: a failed call is reported back to
//! the caller, which stores an error report instead of an analysis.

use crate::config::ReportConfig;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A successful model answer, before cleanup.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Send `prompt` plus `images` to the provider once.
///
/// Errors are returned as display strings; they end up inside the stored
/// error report, not in a typed error.
pub async fn request_analysis(
    provider: &Arc<dyn LLMProvider>,
    prompt: &str,
    images: Vec<ImageData>,
    config: &ReportConfig,
) -> Result<ModelReply, String> {
    let start = Instant::now();
    let messages = vec![ChatMessage::user_with_images(prompt, images)];
    let options = build_options(config);

    let call = provider.chat(&messages, Some(&options));
    let response = match tokio::time::timeout(Duration::from_secs(config.api_timeout_secs), call)
        .await
    {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            let msg = format!("{}", e);
            warn!("Analysis call failed: {}", msg);
            return Err(msg);
        }
        Err(_) => {
            let msg = format!("model call timed out after {}s", config.api_timeout_secs);
            warn!("{}", msg);
            return Err(msg);
        }
    };

    let duration = start.elapsed();
    debug!(
        "Analysis: {} input tokens, {} output tokens, {:?}",
        response.prompt_tokens, response.completion_tokens, duration
    );

    Ok(ModelReply {
        content: response.content,
        input_tokens: response.prompt_tokens,
        output_tokens: response.completion_tokens,
        duration_ms: duration.as_millis() as u64,
    })
}

/// Build `CompletionOptions` from the report config.
fn build_options(config: &ReportConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
