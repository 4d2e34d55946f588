//! Generation and export entry points.
//!
//! [`generate`] is the only network-bound call. [`render_docx`],
//! [`GeneratedPlaybook::to_docx`] and [`GeneratedPlaybook::save`] work
//! offline on the Markdown string, so a playbook can be re-exported (or a
//! hand-edited `.md` converted) without another model call.

use crate::config::{GenerationConfig, DEFAULT_MODEL};
use crate::document::{GeneratedPlaybook, OutputFormat};
use crate::error::PlaybookError;
use crate::form::PlaybookForm;
use crate::naming::playbook_filename;
use crate::pipeline::{docx, llm, markdown};
use crate::prompts::build_prompt;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate a playbook for a form.
///
/// # Errors
/// - [`PlaybookError::MissingFields`] when company, role or core function is empty
/// - [`PlaybookError::ProviderNotConfigured`] when no provider can be resolved
/// - [`PlaybookError::LlmApiError`] when the provider call fails
/// - [`PlaybookError::EmptyResponse`] when the model returns no text
pub async fn generate(
    form: &PlaybookForm,
    config: &GenerationConfig,
) -> Result<GeneratedPlaybook, PlaybookError> {
    let total_start = Instant::now();
    form.validate()?;
    info!("Generating playbook: {} / {}", form.company, form.role);

    let prompt = build_prompt(form);
    debug!("Prompt is {} bytes", prompt.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(&form.company, &form.role, prompt.len());
    }

    let result = match resolve_provider(config) {
        Ok(provider) => llm::complete(&provider, &prompt, config).await,
        Err(e) => Err(e),
    };

    let completion = match result {
        Ok(c) => c,
        Err(e) => {
            warn!("Generation failed: {}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_generation_error(&e.to_string());
            }
            return Err(e);
        }
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(completion.markdown.len());
    }
    info!(
        "Playbook generated: {} chars, {}ms total",
        completion.markdown.len(),
        total_start.elapsed().as_millis()
    );

    Ok(GeneratedPlaybook {
        company: form.company.clone(),
        role: form.role.clone(),
        markdown: completion.markdown,
        stats: completion.stats,
    })
}

/// Convert Markdown to DOCX bytes with a `company` / `role` title block.
///
/// Needs no provider or API key.
pub fn render_docx(markdown_text: &str, company: &str, role: &str) -> Result<Vec<u8>, PlaybookError> {
    let blocks = markdown::markdown_to_blocks(markdown_text);
    docx::blocks_to_docx(&blocks, company, role)
}

impl GeneratedPlaybook {
    /// File name for this playbook with the given extension.
    pub fn filename(&self, ext: &str) -> String {
        playbook_filename(&self.company, &self.role, ext)
    }

    /// The playbook as DOCX bytes.
    pub fn to_docx(&self) -> Result<Vec<u8>, PlaybookError> {
        render_docx(&self.markdown, &self.company, &self.role)
    }

    /// Write the playbook into `dir` and return the paths written.
    ///
    /// The `.md` file is the Markdown exactly as generated. Each file is
    /// written atomically (temp file + rename).
    pub async fn save(
        &self,
        dir: impl AsRef<Path>,
        format: OutputFormat,
    ) -> Result<Vec<PathBuf>, PlaybookError> {
        let dir = dir.as_ref();
        let mut written = Vec::with_capacity(2);

        for ext in format.extensions() {
            let path = dir.join(self.filename(ext));
            let bytes = match *ext {
                "docx" => self.to_docx()?,
                _ => self.markdown.clone().into_bytes(),
            };
            write_atomic(&path, &bytes).await?;
            info!("Wrote {} ({} bytes)", path.display(), bytes.len());
            written.push(path);
        }

        Ok(written)
    }
}

/// Write `bytes` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PlaybookError> {
    let write_err = |e| PlaybookError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PlaybookError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PlaybookError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`), created with
///    `config.model` or [`DEFAULT_MODEL`]; the factory reads the matching
///    API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Anthropic key** (`ANTHROPIC_API_KEY`), the house default.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, PlaybookError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            return create_provider("anthropic", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PlaybookError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set ANTHROPIC_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::GenerationStats;
    use crate::pipeline::llm::testing::{RecordingCallback, ScriptedProvider};
    use edgequake_llm::{LLMResponse, MockProvider};

    fn valid_form() -> PlaybookForm {
        PlaybookForm {
            company: "Acme Coaching".into(),
            role: "Appointment Setter".into(),
            core_function: "sell-by-chat".into(),
            ..Default::default()
        }
    }

    fn playbook() -> GeneratedPlaybook {
        GeneratedPlaybook {
            company: "Acme Coaching".into(),
            role: "Appointment Setter".into(),
            markdown: "## 1. Foundation\n- [ ] Watch mission\n## 2. Tech\n".into(),
            stats: GenerationStats::default(),
        }
    }

    #[tokio::test]
    async fn generate_rejects_incomplete_form_before_any_call() {
        let form = PlaybookForm {
            company: "Acme".into(),
            ..Default::default()
        };
        let err = generate(&form, &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybookError::MissingFields));
    }

    #[test]
    fn filename_uses_convention() {
        assert_eq!(
            playbook().filename("docx"),
            "Acme-Coaching-Appointment-Setter-Playbook.docx"
        );
    }

    #[tokio::test]
    async fn save_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let pb = playbook();
        let paths = pb.save(dir.path(), OutputFormat::Both).await.unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("Acme-Coaching-Appointment-Setter-Playbook.docx"));
        assert!(paths[1].ends_with("Acme-Coaching-Appointment-Setter-Playbook.md"));

        let md = std::fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(md, pb.markdown);

        let docx = std::fs::read(&paths[0]).unwrap();
        assert_eq!(&docx[..2], b"PK");

        // No temp files left behind.
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out/playbooks");
        let paths = playbook().save(&nested, OutputFormat::Markdown).await.unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_file());
    }

    #[test]
    fn render_docx_works_offline() {
        let bytes = render_docx("# Hi\n| A |\n|---|\n| 1 |", "Acme", "Closer").unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn generate_returns_playbook_and_fires_callbacks() {
        let mock = MockProvider::new();
        mock.add_response("## 1. Foundation\n- [ ] Watch mission").await;
        let recorder = Arc::new(RecordingCallback::default());
        let config = GenerationConfig::builder()
            .provider(Arc::new(mock))
            .progress_callback(recorder.clone())
            .build()
            .unwrap();

        let playbook = generate(&valid_form(), &config).await.unwrap();
        assert_eq!(playbook.company, "Acme Coaching");
        assert_eq!(playbook.role, "Appointment Setter");
        assert_eq!(playbook.markdown, "## 1. Foundation\n- [ ] Watch mission");
        assert_eq!(playbook.stats.retries, 0);

        let len = playbook.markdown.len();
        assert_eq!(
            recorder.events(),
            vec![
                "start Acme Coaching/Appointment Setter".to_string(),
                format!("complete {len}"),
            ]
        );
    }

    #[tokio::test]
    async fn generate_reports_provider_failure() {
        let scripted = Arc::new(ScriptedProvider::new(vec![Err("invalid x-api-key".into())]));
        let recorder = Arc::new(RecordingCallback::default());
        let config = GenerationConfig::builder()
            .provider(scripted.clone())
            .progress_callback(recorder.clone())
            .build()
            .unwrap();

        let err = generate(&valid_form(), &config).await.unwrap_err();
        assert!(matches!(err, PlaybookError::LlmApiError { .. }));
        assert!(!err.is_client_error());
        assert_eq!(scripted.calls(), 1);

        let events = recorder.events();
        assert_eq!(events.len(), 2, "got {events:?}");
        assert_eq!(events[0], "start Acme Coaching/Appointment Setter");
        assert!(events[1].starts_with("error LLM API error: "));
        assert!(events[1].contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn generate_rejects_empty_reply() {
        let scripted = Arc::new(ScriptedProvider::new(vec![Ok(LLMResponse::new(
            " \n\t",
            "scripted-model",
        ))]));
        let config = GenerationConfig::builder()
            .provider(scripted)
            .build()
            .unwrap();

        let err = generate(&valid_form(), &config).await.unwrap_err();
        assert!(matches!(err, PlaybookError::EmptyResponse));
    }
}
