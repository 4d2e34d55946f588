//! CLI binary for edgequake-playbook.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `PlaybookForm` and `GenerationConfig` and writes the exported files.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_playbook::{
    generate, markdown_to_blocks, merge_tools, playbook_filename, render_docx, CoreFunction,
    GenerationConfig, GenerationProgressCallback, OutputFormat, PlaybookForm, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while the model writes, plus one log line per
/// failed attempt.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Building prompt…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, company: &str, role: &str, prompt_len: usize) {
        self.bar.set_prefix("Generating");
        self.bar.set_message(format!("{role} playbook for {company}"));
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(&format!("{company} / {role}")),
            dim(&format!("{prompt_len} byte prompt")),
        ));
    }

    fn on_attempt_failed(&self, attempt: u32, error: &str) {
        // Keep the log line to one terminal row.
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Attempt {attempt} failed  {}",
            red("✗"),
            red(&msg)
        ));
    }

    fn on_generation_complete(&self, markdown_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Playbook generated  {}",
            green("✔"),
            dim(&format!("{markdown_len} chars"))
        );
    }

    fn on_generation_error(&self, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate Word and Markdown files in the current directory
  playbook generate --company "Acme Coaching" --role "Appointment Setter" \
      --core-function sell-by-chat --tool Slack --tool GoHighLevel

  # Start from a saved form, write only the .docx into ./out
  playbook generate --form acme.json --format docx --output-dir out

  # Print the Markdown instead of writing files
  playbook generate --form acme.json --stdout

  # Convert existing Markdown (no API key needed)
  playbook render playbook.md --company "Acme Coaching" --role "Closer"

  # Show how the converter reads a file
  playbook render playbook.md --company Acme --role Closer --blocks

  # Serve the HTTP API
  playbook serve --addr 0.0.0.0:3000

FORM JSON (camelCase, all fields strings except tools):
  { "company": "...", "role": "...", "coreFunction": "sell-by-chat",
    "tools": ["Slack"], "contact": "...", "basePay": "...",
    "closeBonus": "...", "performanceThreshold": "...",
    "performanceBonus": "...", "hoursPerWeek": "...", "workingHours": "...",
    "remoteRequirements": "...", "winsChannel": "..." }

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY       Anthropic API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (anthropic, openai, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter
"#;

/// Generate role onboarding playbooks with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "playbook",
    version,
    about = "Generate role onboarding playbooks and export them as Word or Markdown",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PLAYBOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PLAYBOOK_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "PLAYBOOK_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a playbook from form fields.
    Generate(GenerateArgs),
    /// Convert an existing Markdown playbook to .docx (offline).
    Render(RenderArgs),
    /// Serve the HTTP API.
    #[cfg(feature = "server")]
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// JSON file with the form; flags below override its fields.
    #[arg(long, env = "PLAYBOOK_FORM")]
    form: Option<PathBuf>,

    #[command(flatten)]
    fields: FormArgs,

    /// Files to write.
    #[arg(long, env = "PLAYBOOK_FORMAT", value_enum, default_value = "both")]
    format: FormatArg,

    /// Directory to write into.
    #[arg(short, long, env = "PLAYBOOK_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Print the Markdown to stdout instead of writing files.
    #[arg(long)]
    stdout: bool,

    #[command(flatten)]
    llm: LlmArgs,
}

#[derive(Args, Debug)]
struct FormArgs {
    /// Company name.
    #[arg(long)]
    company: Option<String>,

    /// Role title, e.g. "Appointment Setter".
    #[arg(long)]
    role: Option<String>,

    /// What the role mainly does.
    #[arg(long, value_enum)]
    core_function: Option<CoreFunctionArg>,

    /// A tool the role uses (repeatable).
    #[arg(long = "tool")]
    tools: Vec<String>,

    /// Extra tools as a comma-separated list.
    #[arg(long)]
    other_tools: Option<String>,

    /// Mentor or point of contact.
    #[arg(long)]
    contact: Option<String>,

    #[arg(long)]
    base_pay: Option<String>,

    #[arg(long)]
    close_bonus: Option<String>,

    #[arg(long)]
    performance_threshold: Option<String>,

    #[arg(long)]
    performance_bonus: Option<String>,

    #[arg(long)]
    hours_per_week: Option<String>,

    #[arg(long)]
    working_hours: Option<String>,

    #[arg(long)]
    remote_requirements: Option<String>,

    /// Channel where wins are posted, e.g. "#wins".
    #[arg(long)]
    wins_channel: Option<String>,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID (default: claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: anthropic, openai, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Max output tokens.
    #[arg(long, env = "PLAYBOOK_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PLAYBOOK_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Retries on provider failure.
    #[arg(long, env = "PLAYBOOK_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PLAYBOOK_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Markdown file to convert.
    input: PathBuf,

    /// Company name for the title block.
    #[arg(long)]
    company: String,

    /// Role title for the title block.
    #[arg(long)]
    role: String,

    /// Output .docx path (default: {company}-{role}-Playbook.docx).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the parsed blocks as JSON instead of writing a .docx.
    #[arg(long)]
    blocks: bool,
}

#[cfg(feature = "server")]
#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PLAYBOOK_ADDR", default_value = "127.0.0.1:3000")]
    addr: std::net::SocketAddr,

    #[command(flatten)]
    llm: LlmArgs,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CoreFunctionArg {
    SellByChat,
    CustomerSuccess,
    Community,
    Operations,
    Closer,
    Other,
}

impl From<CoreFunctionArg> for CoreFunction {
    fn from(v: CoreFunctionArg) -> Self {
        match v {
            CoreFunctionArg::SellByChat => CoreFunction::SellByChat,
            CoreFunctionArg::CustomerSuccess => CoreFunction::CustomerSuccess,
            CoreFunctionArg::Community => CoreFunction::Community,
            CoreFunctionArg::Operations => CoreFunction::Operations,
            CoreFunctionArg::Closer => CoreFunction::Closer,
            CoreFunctionArg::Other => CoreFunction::Other,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Docx,
    Markdown,
    Both,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Docx => OutputFormat::Docx,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Both => OutputFormat::Both,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers INFO-level feedback while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && wants_progress(&cli.command);
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Generate(ref args) => run_generate(args, cli.quiet, show_progress).await,
        Command::Render(ref args) => run_render(args, cli.quiet).await,
        #[cfg(feature = "server")]
        Command::Serve(ref args) => {
            let config = build_config(&args.llm, None).await?;
            if !cli.quiet {
                eprintln!("{} Serving on {}", cyan("◆"), bold(&format!("http://{}", args.addr)));
            }
            edgequake_playbook::server::run_server(args.addr, config)
                .await
                .context("Server failed")
        }
    }
}

fn wants_progress(command: &Command) -> bool {
    matches!(command, Command::Generate(args) if !args.stdout)
}

async fn run_generate(args: &GenerateArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let form = build_form(args).await?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args.llm, progress_cb).await?;

    let playbook = generate(&form, &config)
        .await
        .context("Generation failed")?;

    if args.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(playbook.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !playbook.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        return Ok(());
    }

    let written = playbook
        .save(&args.output_dir, args.format.into())
        .await
        .context("Failed to save playbook")?;

    if !quiet {
        for path in &written {
            eprintln!("  {} {}", green("✓"), bold(&path.display().to_string()));
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out  ·  {}ms",
            dim(&playbook.stats.input_tokens.to_string()),
            dim(&playbook.stats.output_tokens.to_string()),
            playbook.stats.duration_ms,
        );
    }

    Ok(())
}

async fn run_render(args: &RenderArgs, quiet: bool) -> Result<()> {
    let markdown = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read {:?}", args.input))?;

    if args.blocks {
        let blocks = markdown_to_blocks(&markdown);
        let json = serde_json::to_string_pretty(&blocks).context("Failed to serialise blocks")?;
        println!("{json}");
        return Ok(());
    }

    let bytes = render_docx(&markdown, &args.company, &args.role).context("Conversion failed")?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(playbook_filename(&args.company, &args.role, "docx")));

    edgequake_playbook::generate::write_atomic(&output, &bytes)
        .await
        .context("Failed to write .docx")?;

    if !quiet {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&output.display().to_string()),
            dim(&format!("{} bytes", bytes.len()))
        );
    }
    Ok(())
}

/// Merge the optional `--form` file with the field flags.
async fn build_form(args: &GenerateArgs) -> Result<PlaybookForm> {
    let mut form = match args.form {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read form from {:?}", path))?;
            PlaybookForm::from_json(&json).context("Invalid form file")?
        }
        None => PlaybookForm::default(),
    };

    let f = &args.fields;
    let overrides = [
        (&mut form.company, &f.company),
        (&mut form.role, &f.role),
        (&mut form.contact, &f.contact),
        (&mut form.base_pay, &f.base_pay),
        (&mut form.close_bonus, &f.close_bonus),
        (&mut form.performance_threshold, &f.performance_threshold),
        (&mut form.performance_bonus, &f.performance_bonus),
        (&mut form.hours_per_week, &f.hours_per_week),
        (&mut form.working_hours, &f.working_hours),
        (&mut form.remote_requirements, &f.remote_requirements),
        (&mut form.wins_channel, &f.wins_channel),
    ];
    for (field, value) in overrides {
        if let Some(v) = value {
            *field = v.clone();
        }
    }

    if let Some(cf) = f.core_function {
        form.core_function = CoreFunction::from(cf).key().to_string();
    }
    if !f.tools.is_empty() {
        form.tools = f.tools.clone();
    }
    if let Some(ref other) = f.other_tools {
        form.tools = merge_tools(&form.tools, other);
    }

    Ok(form)
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(llm: &LlmArgs, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .max_tokens(llm.max_tokens)
        .temperature(llm.temperature)
        .max_retries(llm.max_retries);

    if let Some(ref path) = llm.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = llm.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = llm.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
