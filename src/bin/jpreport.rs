//! CLI binary for jeevpath-report.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ReportConfig` and prints results.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use jeevpath_report::{
    analyze_report, compose_to_file, download_report, AnalysisRequest, CheckupType,
    InMemoryReportStore, PatientIdentity, ReportConfig, ReportMeta, Theme,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render stored analysis content to a PDF
  jpreport render analysis.html --report-id 12 --name "Asha Rao" --age 34 --gender Female

  # Same, reading content from stdin
  cat analysis.html | jpreport render --report-id 12 --name "Asha Rao" -o report.pdf

  # Analyse report photos (HTML on stdout)
  jpreport analyze cbc.jpg xray.png --name "Asha Rao" --checkup "Dengue Fever" \
      --vital platelets=90000 --vital fever_days=4 --symptoms "fever, rash"

  # Analyse and render straight to PDF
  jpreport analyze cbc.jpg --name "Asha Rao" --pdf

  # Write the cached header image and print its path
  jpreport header

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (preferred when set)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  JEEVPATH_CACHE_DIR      Directory for the cached header image (default: uploads)
  JEEVPATH_THEME          Path to a theme JSON file
"#;

/// Render AI medical report analyses as styled PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "jpreport",
    version,
    about = "Render AI medical report analyses as styled PDFs",
    long_about = "Analyse photos of lab reports and X-rays with a vision LLM and render the \
stored analysis as the JeevPath AI Medical Assessment Report PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the cached header image.
    #[arg(long, global = true, env = "JEEVPATH_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Theme JSON file (missing colours keep their defaults).
    #[arg(long, global = true, env = "JEEVPATH_THEME")]
    theme: Option<PathBuf>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-nano).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "JEEVPATH_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "JEEVPATH_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, global = true, env = "JEEVPATH_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "JEEVPATH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "JEEVPATH_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render stored analysis content to a PDF.
    Render(RenderArgs),
    /// Analyse report images with a vision LLM.
    Analyze(AnalyzeArgs),
    /// Create the cached header image and print its path.
    Header,
}

#[derive(Args, Debug)]
struct PatientArgs {
    /// Patient user id.
    #[arg(long, default_value_t = 1)]
    patient_id: u64,

    /// Patient name.
    #[arg(long)]
    name: String,

    #[arg(long)]
    age: Option<u32>,

    #[arg(long)]
    gender: Option<String>,

    /// Checkup category label.
    #[arg(long, default_value = "General Checkup")]
    checkup: String,
}

impl PatientArgs {
    fn identity(&self) -> PatientIdentity {
        let mut who = PatientIdentity::new(self.patient_id, self.name.as_str());
        if let Some(age) = self.age {
            who = who.with_age(age);
        }
        if let Some(ref g) = self.gender {
            who = who.with_gender(g.as_str());
        }
        who
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// File with the stored analysis content; stdin when omitted.
    content: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    report_id: u64,

    #[command(flatten)]
    patient: PatientArgs,

    /// Report date: YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS" (default: now).
    #[arg(long)]
    date: Option<String>,

    /// Output path (default: JeevPath_Analysis_<id>.pdf).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print render metadata as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Local image paths or HTTP/HTTPS URLs (PNG or JPEG).
    #[arg(required = true)]
    images: Vec<String>,

    #[command(flatten)]
    patient: PatientArgs,

    /// Vital reading as key=value (repeatable).
    #[arg(long = "vital", value_name = "KEY=VALUE")]
    vitals: Vec<String>,

    #[arg(long)]
    height: Option<String>,

    #[arg(long)]
    weight: Option<String>,

    #[arg(long, default_value = "")]
    symptoms: String,

    #[arg(long, default_value = "")]
    diet: String,

    /// Answer language code.
    #[arg(long, default_value = "en")]
    language: String,

    /// Also render the result to a PDF in the current directory.
    #[arg(long)]
    pdf: bool,

    /// Print the full AnalysisOutput as JSON instead of the content.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    match cli.command {
        Command::Render(ref args) => run_render(args, &config, cli.quiet),
        Command::Analyze(ref args) => run_analyze(args, &config, cli.quiet).await,
        Command::Header => {
            let path = config
                .header_cache
                .get_or_create()
                .context("Failed to create header image")?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn run_render(args: &RenderArgs, config: &ReportConfig, quiet: bool) -> Result<()> {
    let content = match args.content {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content from {:?}", path))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read content from stdin")?;
            buf
        }
    };

    let meta = ReportMeta {
        checkup_type: args.patient.checkup.clone(),
        timestamp: match args.date {
            Some(ref d) => parse_date(d)?,
            None => Local::now().naive_local(),
        },
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(jeevpath_report::report_filename(args.report_id)));

    let rendered = compose_to_file(
        &output,
        args.report_id,
        &args.patient.identity(),
        &meta,
        Some(&content),
        config,
    )
    .context("Render failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rendered).context("Failed to serialise output")?
        );
    }
    if !quiet {
        for w in &rendered.warnings {
            eprintln!("  {} {}", cyan("⚠"), w);
        }
        eprintln!(
            "{}  {} sections  {} pages  {}ms  →  {}",
            green("✔"),
            rendered.stats.section_count,
            rendered.page_count,
            rendered.stats.duration_ms,
            bold(&output.display().to_string()),
        );
    }
    Ok(())
}

async fn run_analyze(args: &AnalyzeArgs, config: &ReportConfig, quiet: bool) -> Result<()> {
    let patient = args.patient.identity();
    let mut request = AnalysisRequest::new(
        patient.clone(),
        CheckupType::from_label(&args.patient.checkup),
    );
    for kv in &args.vitals {
        let (k, v) = kv
            .split_once('=')
            .with_context(|| format!("Invalid --vital '{kv}', expected KEY=VALUE"))?;
        request = request.vital(k.trim(), v.trim());
    }
    request.height = args.height.clone();
    request.weight = args.weight.clone();
    request.symptoms = args.symptoms.clone();
    request.diet = args.diet.clone();
    request.language = args.language.clone();

    let spinner = (!quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Analysing");
        bar.set_message(format!("{} image(s)…", args.images.len()));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = analyze_report(&args.images, &request, config).await;
    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }
    let output = result.context("Analysis failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else {
        let mut handle = io::stdout().lock();
        handle
            .write_all(output.content.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.content.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !quiet {
        match output.error {
            Some(ref e) => eprintln!("{} model call failed: {}", red("✘"), red(e)),
            None => eprintln!(
                "{}  {} image(s)  {}ms\n   {} tokens in  /  {} tokens out",
                green("✔"),
                output.stats.image_count,
                output.stats.duration_ms,
                dim(&output.stats.input_tokens.to_string()),
                dim(&output.stats.output_tokens.to_string()),
            ),
        }
    }

    if args.pdf {
        let store = InMemoryReportStore::new(patient.clone());
        let record = store.insert(
            patient.id,
            args.patient.checkup.as_str(),
            output.content.as_str(),
            Local::now().naive_local(),
        )?;
        let download = download_report(&store, record.id, config).context("Render failed")?;
        std::fs::write(&download.filename, &download.bytes)
            .with_context(|| format!("Failed to write {}", download.filename))?;
        if !quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&download.filename));
        }
    }
    Ok(())
}

/// Map CLI args to `ReportConfig`.
fn build_config(cli: &Cli) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref dir) = cli.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(ref path) = cli.theme {
        let theme = Theme::from_file(path)
            .with_context(|| format!("Failed to load theme from {:?}", path))?;
        builder = builder.theme(theme);
    }
    if let Some(ref p) = cli.provider {
        builder = builder.provider_name(p);
    }
    if let Some(ref m) = cli.model {
        builder = builder.model(m);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--date` as a date or a date-time.
fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))?;
    d.and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date '{s}'"))
}
