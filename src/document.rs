//! Document model and generation output types.
//!
//! [`Block`] and [`Span`] are what the Markdown converter produces and what
//! the DOCX packager consumes. They carry structure only: fonts, sizes and
//! colours are decided at packaging time.

use serde::{Deserialize, Serialize};

/// One inline run of text with a single style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", content = "text", rename_all = "snake_case")]
pub enum Span {
    Plain(String),
    Bold(String),
}

impl Span {
    /// The text of the span without any style markers.
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(t) | Span::Bold(t) => t,
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, Span::Bold(_))
    }
}

/// One structural unit of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// `#`, `##` or `###` heading (level 1–3).
    Heading { level: u8, text: String },
    /// A paragraph. An empty span list is vertical spacing.
    Paragraph { spans: Vec<Span> },
    BulletItem { spans: Vec<Span> },
    CheckboxItem { checked: bool, spans: Vec<Span> },
    /// Horizontal rule (`---`).
    Rule,
    /// Forces the following content onto a new page.
    PageBreak,
    /// Header cells are plain text; data cells carry inline spans. Rows may
    /// be ragged.
    Table {
        header: Vec<String>,
        rows: Vec<Vec<Vec<Span>>>,
    },
}

impl Block {
    /// An empty paragraph, used for blank input lines.
    pub fn spacer() -> Self {
        Block::Paragraph { spans: Vec::new() }
    }
}

/// Concatenate the text of a span sequence, dropping style.
pub fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

/// Which files to produce from a generated playbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Docx,
    Markdown,
    /// Both `.docx` and `.md`. (default)
    #[default]
    Both,
}

impl OutputFormat {
    /// File extensions produced by this format, in write order.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            OutputFormat::Docx => &["docx"],
            OutputFormat::Markdown => &["md"],
            OutputFormat::Both => &["docx", "md"],
        }
    }
}

/// Token usage and timing for one generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
    /// Number of retries spent before the call succeeded.
    pub retries: u32,
}

/// A generated playbook: the raw Markdown plus who it is for.
///
/// The Markdown is kept exactly as the model returned it; the `.md` export
/// writes it unchanged and the `.docx` export runs it through the converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlaybook {
    pub company: String,
    pub role: String,
    pub markdown: String,
    pub stats: GenerationStats,
}
