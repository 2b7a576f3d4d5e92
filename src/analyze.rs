//! Report analysis: images + patient data → tagged report content.
//!
//! One call per request, no retry. A failed model call does not surface as
//! an `Err`: the returned [`AnalysisOutput`] carries a short error report in
//! the same tag vocabulary, so whatever stores and later renders it works
//! unchanged.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::output::{AnalysisOutput, AnalysisStats};
use crate::pipeline::{cleanup, encode, input, llm};
use crate::prompts::{build_analysis_prompt, AnalysisRequest};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default model for providers that have no obvious vision default.
const FALLBACK_MODEL: &str = "gpt-4.1-nano";

/// Content stored when the model call fails.
pub fn error_report(detail: &str) -> String {
    format!("<h3>Error in Analysis</h3><p>Could not process images. Error: {detail}</p>")
}

/// Vision model used for `provider` when none is configured.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "gemini" => "gemini-2.0-flash",
        "anthropic" => "claude-sonnet-4-20250514",
        "mistral" => "pixtral-12b-2409",
        _ => FALLBACK_MODEL,
    }
}

/// Analyse report images for `request`.
///
/// # Arguments
/// * `images` — local paths or `http(s)` URLs of PNG/JPEG report photos
/// * `request` — patient data and vitals for the prompt
///
/// # Errors
/// Only for problems before the model is called: no images, unreadable or
/// non-image inputs, no configured provider.
pub async fn analyze_report(
    images: &[impl AsRef<str>],
    request: &AnalysisRequest,
    config: &ReportConfig,
) -> Result<AnalysisOutput, ReportError> {
    let start = Instant::now();
    if images.is_empty() {
        return Err(ReportError::InvalidInput(
            "Please upload at least one image (X-ray, Report, Symptom, etc).".into(),
        ));
    }
    info!(
        "Analysing {} image(s) for {} ({})",
        images.len(),
        request.patient.name,
        request.checkup
    );

    // ── Step 1: Resolve inputs ───────────────────────────────────────────
    let resolved = try_join_all(
        images
            .iter()
            .map(|i| input::resolve_image(i.as_ref(), config.download_timeout_secs)),
    )
    .await?;

    // ── Step 2: Encode ───────────────────────────────────────────────────
    let max_pixels = config.max_image_pixels;
    let encoded = tokio::task::spawn_blocking(move || {
        resolved
            .iter()
            .map(|img| encode::encode_image(img, max_pixels))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| ReportError::Internal(format!("encode task panicked: {e}")))??;
    let image_count = encoded.len();

    // ── Step 3: Provider ─────────────────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 4: Model call ───────────────────────────────────────────────
    let prompt = build_analysis_prompt(request);
    debug!("Prompt is {} chars", prompt.len());

    let output = match llm::request_analysis(&provider, &prompt, encoded, config).await {
        Ok(reply) => AnalysisOutput {
            content: cleanup::clean_model_response(&reply.content),
            error: None,
            stats: AnalysisStats {
                image_count,
                input_tokens: reply.input_tokens,
                output_tokens: reply.output_tokens,
                duration_ms: start.elapsed().as_millis() as u64,
            },
        },
        Err(detail) => {
            warn!("Storing error report: {}", detail);
            AnalysisOutput {
                content: error_report(&detail),
                error: Some(detail),
                stats: AnalysisStats {
                    image_count,
                    duration_ms: start.elapsed().as_millis() as u64,
                    ..Default::default()
                },
            }
        }
    };

    info!(
        "Analysis finished in {}ms ({} → {} tokens)",
        output.stats.duration_ms, output.stats.input_tokens, output.stats.output_tokens
    );
    Ok(output)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ReportError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReportError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider`, used as-is
/// 2. `config.provider_name` with `config.model` or the provider's default
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set
/// 4. `GEMINI_API_KEY` present → gemini
/// 5. `ProviderFactory::from_env` auto-detection
fn resolve_provider(config: &ReportConfig) -> Result<Arc<dyn LLMProvider>, ReportError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(default_model(name));
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or(default_model("gemini"));
            return create_vision_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReportError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parse::{parse_sections, Block};
    use crate::prompts::CheckupType;
    use crate::record::PatientIdentity;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(PatientIdentity::new(1, "A"), CheckupType::GeneralCheckup)
    }

    #[test]
    fn error_report_parses_as_one_section() {
        let s = parse_sections(&error_report("quota exceeded"));
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].title, "Error in Analysis");
        assert_eq!(
            s[0].blocks,
            vec![Block::Paragraph {
                text: "Could not process images. Error: quota exceeded".into()
            }]
        );
    }

    #[test]
    fn default_models() {
        assert_eq!(default_model("gemini"), "gemini-2.0-flash");
        assert_eq!(default_model("ollama"), FALLBACK_MODEL);
    }

    #[tokio::test]
    async fn no_images_is_invalid_input() {
        let none: [&str; 0] = [];
        let err = analyze_report(&none, &request(), &ReportConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn missing_image_fails_before_model_call() {
        let err = analyze_report(&["/no/such/scan.jpg"], &request(), &ReportConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::FileNotFound { .. }));
    }
}
