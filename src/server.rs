//! HTTP API for the playbook generator.
//!
//! | Method | Path                   | Body                        | Response                   |
//! |--------|------------------------|-----------------------------|----------------------------|
//! | GET    | `/health`              | –                           | `OK`                       |
//! | POST   | `/api/generate`        | [`PlaybookForm`] JSON       | [`GenerateResponse`] JSON  |
//! | POST   | `/api/export/docx`     | [`ExportRequest`] JSON      | `.docx` attachment         |
//! | POST   | `/api/export/markdown` | [`ExportRequest`] JSON      | `.md` attachment           |
//!
//! Generation and export are separate requests: the browser keeps the
//! Markdown from `/api/generate` and asks for whichever file the user clicks,
//! without a second model call.

use crate::config::GenerationConfig;
use crate::error::PlaybookError;
use crate::form::PlaybookForm;
use crate::generate::{generate, render_docx};
use crate::naming::playbook_filename;
use crate::pipeline::docx::DOCX_MIME;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Shared, read-only state for all requests.
#[derive(Clone)]
pub struct AppState {
    config: Arc<GenerationConfig>,
}

/// Body of `/api/generate` responses, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    fn ok(content: String) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error),
        }
    }
}

/// Body of the export endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    pub company: String,
    pub role: String,
    /// Markdown, usually the `content` of an earlier `/api/generate` reply.
    pub content: String,
}

impl ExportRequest {
    fn validate(&self) -> Result<(), PlaybookError> {
        if self.company.trim().is_empty() || self.role.trim().is_empty() {
            return Err(PlaybookError::InvalidForm {
                detail: "company and role are required for export".into(),
            });
        }
        Ok(())
    }
}

/// A [`PlaybookError`] rendered as a JSON failure response.
pub struct ApiError(PlaybookError);

impl From<PlaybookError> for ApiError {
    fn from(e: PlaybookError) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(PlaybookError::InvalidForm {
            detail: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(GenerateResponse::failure(self.0.to_string()))).into_response()
    }
}

/// Build the application router.
pub fn router(config: GenerationConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/export/docx", post(export_docx_handler))
        .route("/api/export/markdown", post(export_markdown_handler))
        .with_state(AppState {
            config: Arc::new(config),
        })
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: SocketAddr, config: GenerationConfig) -> Result<(), PlaybookError> {
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PlaybookError::Internal(format!("Failed to bind {addr}: {e}")))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| PlaybookError::Internal(format!("Server error: {e}")))?;

    Ok(())
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn generate_handler(
    State(state): State<AppState>,
    body: Result<Json<PlaybookForm>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(form) = body?;
    let playbook = generate(&form, &state.config).await?;
    info!(
        "Served playbook for {} / {} ({} output tokens)",
        playbook.company, playbook.role, playbook.stats.output_tokens
    );
    Ok(Json(GenerateResponse::ok(playbook.markdown)))
}

async fn export_docx_handler(
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    req.validate()?;
    let bytes = render_docx(&req.content, &req.company, &req.role)?;
    let filename = playbook_filename(&req.company, &req.role, "docx");
    Ok(attachment(DOCX_MIME, &filename, bytes))
}

async fn export_markdown_handler(
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    req.validate()?;
    let filename = playbook_filename(&req.company, &req.role, "md");
    Ok(attachment(
        "text/markdown; charset=utf-8",
        &filename,
        req.content.into_bytes(),
    ))
}

fn attachment(mime: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        bytes,
    )
        .into_response()
}

/// `attachment; filename="…"` with anything outside printable ASCII, plus
/// quotes and backslashes, replaced so the header value is always valid.
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn body_bytes(resp: Response) -> Vec<u8> {
        axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn export(content: &str) -> ExportRequest {
        ExportRequest {
            company: "Acme Coaching".into(),
            role: "Appointment Setter".into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn health() {
        assert_eq!(health_handler().await, "OK");
    }

    #[tokio::test]
    async fn generate_rejects_missing_fields_with_400() {
        let state = AppState {
            config: Arc::new(GenerationConfig::default()),
        };
        let form = PlaybookForm {
            company: "Acme".into(),
            ..Default::default()
        };
        let resp = generate_handler(State(state), Ok(Json(form)))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: GenerateResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert!(!body.success);
        assert!(body.content.is_none());
        assert!(body.error.unwrap().contains("Missing required fields"));
    }

    #[tokio::test]
    async fn export_docx_is_an_attachment() {
        let resp = export_docx_handler(Ok(Json(export("## A\n- [ ] one\n## B"))))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], DOCX_MIME);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Acme-Coaching-Appointment-Setter-Playbook.docx\""
        );

        let bytes = body_bytes(resp).await;
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.file_names().any(|n| n == "word/document.xml"));
    }

    #[tokio::test]
    async fn export_markdown_returns_content_unchanged() {
        let md = "# Title\n\n| A |\n|---|\n";
        let resp = export_markdown_handler(Ok(Json(export(md))))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .ends_with("Playbook.md\""));
        assert_eq!(body_bytes(resp).await, md.as_bytes());
    }

    #[tokio::test]
    async fn export_requires_company_and_role() {
        let req = ExportRequest {
            content: "# x".into(),
            ..Default::default()
        };
        let resp = export_docx_handler(Ok(Json(req))).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn content_disposition_is_ascii_safe() {
        assert_eq!(
            content_disposition("Café-\"Q\"-Playbook.md"),
            "attachment; filename=\"Caf_-_Q_-Playbook.md\""
        );
    }

    #[test]
    fn generate_response_omits_empty_fields() {
        let json = serde_json::to_string(&GenerateResponse::failure("nope".into())).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"nope"}"#);
    }
}
