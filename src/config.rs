//! Configuration types for report rendering and analysis.
//!
//! All behaviour is controlled through [`ReportConfig`], built via its
//! [`ReportConfigBuilder`]. The visual side (colours, brand strings, date
//! format, header cache) and the model side (provider, model, sampling)
//! live in one struct so a single value can be shared between the analysis
//! and the download path.

use crate::error::ReportError;
use crate::pipeline::gradient::{GradientSpec, HeaderCache};
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An 8-bit sRGB colour. Serialises as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub const fn gray(level: u8) -> Rgb {
        Rgb(level, level, level)
    }

    /// Channels scaled to `0.0..=1.0`, as PDF colour operators expect.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }
}

/// Report colour palette. Defaults to the JeevPath emerald theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Bottom colour of the header gradient (`#ECFDF5`).
    pub header_bg: Rgb,
    /// Brand title and section chips (`#10B981`).
    pub accent: Rgb,
    /// Body text and field values (`#374151`).
    pub text_main: Rgb,
    /// Field labels and the brand subtitle.
    pub label: Rgb,
    /// Background of the patient grid.
    pub panel: Rgb,
    /// Text inside section chips.
    pub chip_text: Rgb,
    /// Rule above the disclaimer.
    pub rule: Rgb,
    pub disclaimer: Rgb,
    pub footer: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_bg: Rgb(236, 253, 245),
            accent: Rgb(16, 185, 129),
            text_main: Rgb(55, 65, 81),
            label: Rgb::gray(100),
            panel: Rgb::gray(250),
            chip_text: Rgb::WHITE,
            rule: Rgb::gray(200),
            disclaimer: Rgb::gray(128),
            footer: Rgb::gray(120),
        }
    }
}

impl Theme {
    /// Parse a theme from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        serde_json::from_str(json)
            .map_err(|e| ReportError::InvalidConfig(format!("theme JSON: {e}")))
    }

    /// Read a theme JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ReportError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ReportError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ReportError::InvalidConfig(format!("theme file {}: {e}", path.display())),
        })?;
        Self::from_json(&json)
    }
}

/// Configuration for rendering and analysing reports.
///
/// Built via [`ReportConfig::builder()`] or using [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use jeevpath_report::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .cache_dir(std::env::temp_dir().join("jeevpath"))
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    pub theme: Theme,

    /// Large brand line on the header. Default: `JEEVPATH LABS`.
    pub brand_title: String,

    /// Line under the brand title.
    pub brand_subtitle: String,

    /// Leading part of every page footer. Default: `JeevPath AI Diagnostics`.
    pub footer_brand: String,

    /// `strftime` pattern for the report date. Default: `%d %B %Y`.
    pub date_format: String,

    /// Where the header gradient is cached. Default: `./uploads`.
    pub header_cache: Arc<HeaderCache>,

    /// LLM model identifier. If None, uses the provider default
    /// (`gemini-2.0-flash` for the gemini provider).
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the analysis call. Default: 0.4.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    pub max_tokens: usize,

    /// Longest side, in pixels, an input image is scaled down to before
    /// upload. Default: 2000.
    pub max_image_pixels: u32,

    /// Download timeout for URL image inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Timeout for the model call in seconds. Default: 120.
    pub api_timeout_secs: u64,
}

/// Default header cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "uploads";

impl Default for ReportConfig {
    fn default() -> Self {
        let theme = Theme::default();
        Self {
            theme,
            brand_title: "JEEVPATH LABS".to_string(),
            brand_subtitle: "Advanced AI Medical Assessment Report".to_string(),
            footer_brand: "JeevPath AI Diagnostics".to_string(),
            date_format: "%d %B %Y".to_string(),
            header_cache: Arc::new(HeaderCache::new(
                DEFAULT_CACHE_DIR,
                header_spec(&theme),
            )),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.4,
            max_tokens: 8192,
            max_image_pixels: 2000,
            download_timeout_secs: 120,
            api_timeout_secs: 120,
        }
    }
}

fn header_spec(theme: &Theme) -> GradientSpec {
    GradientSpec {
        end: theme.header_bg,
        ..GradientSpec::jeevpath()
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("theme", &self.theme)
            .field("brand_title", &self.brand_title)
            .field("date_format", &self.date_format)
            .field("header_cache", &self.header_cache.path())
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
            cache_dir: None,
            shared_cache: None,
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
    cache_dir: Option<PathBuf>,
    shared_cache: Option<Arc<HeaderCache>>,
}

impl ReportConfigBuilder {
    pub fn theme(mut self, theme: Theme) -> Self {
        self.config.theme = theme;
        self
    }

    pub fn brand_title(mut self, title: impl Into<String>) -> Self {
        self.config.brand_title = title.into();
        self
    }

    pub fn brand_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.config.brand_subtitle = subtitle.into();
        self
    }

    pub fn footer_brand(mut self, brand: impl Into<String>) -> Self {
        self.config.footer_brand = brand.into();
        self
    }

    pub fn date_format(mut self, fmt: impl Into<String>) -> Self {
        self.config.date_format = fmt.into();
        self
    }

    /// Directory for the cached header image.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Share an existing cache (and its decoded image) between configs.
    pub fn header_cache(mut self, cache: Arc<HeaderCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.max_image_pixels = px.max(100);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.date_format.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "date format must not be empty".into(),
            ));
        }
        if chrono::format::StrftimeItems::new(&c.date_format)
            .any(|item| matches!(item, chrono::format::Item::Error))
        {
            return Err(ReportError::InvalidConfig(format!(
                "invalid date format '{}'",
                c.date_format
            )));
        }
        if c.max_tokens == 0 {
            return Err(ReportError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 || c.api_timeout_secs == 0 {
            return Err(ReportError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }

        // The gradient follows the theme unless a cache was handed in.
        self.config.header_cache = match self.shared_cache.take() {
            Some(cache) => cache,
            None => {
                let dir = self
                    .cache_dir
                    .take()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
                Arc::new(HeaderCache::new(dir, header_spec(&self.config.theme)))
            }
        };
        Ok(self.config)
    }
}
