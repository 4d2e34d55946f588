//! # edgequake-playbook
//!
//! Generate role onboarding playbooks with an LLM and export them as Word
//! (`.docx`) or Markdown files.
//!
//! A hiring manager fills in a short form (company, role, core function,
//! tools, KPIs, mentor). The form becomes a prompt, the model answers with a
//! Markdown playbook in a fixed section layout, and a small line-oriented
//! converter turns that Markdown into a formatted Word document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PlaybookForm
//!  │
//!  ├─ 1. Validate  company, role and core function are required
//!  ├─ 2. Prompt    fill the playbook template with the form values
//!  ├─ 3. LLM       one chat call (claude-sonnet-4 by default)
//!  ├─ 4. Convert   Markdown lines → Block list (headings, checklists, tables)
//!  └─ 5. Export    WordprocessingML zip and/or the raw Markdown
//! ```
//!
//! Steps 4 and 5 need no network and no API key: [`render_docx`] converts any
//! Markdown you already have.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_playbook::{generate, GenerationConfig, OutputFormat, PlaybookForm};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let form = PlaybookForm {
//!         company: "Acme Coaching".into(),
//!         role: "Appointment Setter".into(),
//!         core_function: "sell-by-chat".into(),
//!         ..Default::default()
//!     };
//!     // Provider resolved from ANTHROPIC_API_KEY / EDGEQUAKE_LLM_PROVIDER / …
//!     let config = GenerationConfig::default();
//!     let playbook = generate(&form, &config).await?;
//!     let written = playbook.save("out", OutputFormat::Both).await?;
//!     eprintln!("wrote {:?} ({} output tokens)", written, playbook.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `playbook` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | Enables the HTTP API in [`server`] (axum) |
//!
//! Disable both when using only the library:
//! ```toml
//! edgequake-playbook = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod form;
pub mod generate;
pub mod naming;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, DEFAULT_MODEL};
pub use document::{Block, GeneratedPlaybook, GenerationStats, OutputFormat, Span};
pub use error::PlaybookError;
pub use form::{merge_tools, CoreFunction, PlaybookForm, DEFAULT_TOOLS};
pub use generate::{generate, render_docx, resolve_provider};
pub use naming::playbook_filename;
pub use pipeline::docx::{blocks_to_docx, DOCX_MIME};
pub use pipeline::markdown::{markdown_to_blocks, parse_inline};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::build_prompt;
