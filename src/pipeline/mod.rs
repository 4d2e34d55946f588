//! Pipeline stages for playbook generation and export.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the converter can run without any network access.
//!
//! ## Data Flow
//!
//! ```text
//! form ──▶ llm ──▶ markdown ──▶ docx
//! (prompt)  (text)   (blocks)    (zip bytes)
//!             │
//!             └──────────────▶ .md (unchanged)
//! ```
//!
//! 1. [`llm`]: the only stage with network I/O
//! 2. [`markdown`]: line-oriented Markdown → [`crate::document::Block`]
//!    conversion; pure and infallible
//! 3. [`docx`]: lay out blocks as WordprocessingML and zip the package

pub mod docx;
pub mod llm;
pub mod markdown;
