//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to follow a
//! generation call: the CLI drives a spinner from it, a server could forward
//! the events to a WebSocket.
//!
//! # Example
//!
//! ```rust
//! use edgequake_playbook::{GenerationConfig, GenerationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct LengthLogger {
//!     chars: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for LengthLogger {
//!     fn on_generation_complete(&self, markdown_len: usize) {
//!         self.chars.store(markdown_len, Ordering::SeqCst);
//!     }
//! }
//!
//! let logger = Arc::new(LengthLogger { chars: AtomicUsize::new(0) });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(logger as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::generate::generate`] as the provider call progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: the HTTP
/// server shares one config across request tasks.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once the form is validated and the prompt is built.
    ///
    /// # Arguments
    /// * `company`    - company the playbook is for
    /// * `role`       - role the playbook is for
    /// * `prompt_len` - byte length of the rendered prompt
    fn on_generation_start(&self, company: &str, role: &str, prompt_len: usize) {
        let _ = (company, role, prompt_len);
    }

    /// Called when one provider attempt fails and another will follow.
    ///
    /// # Arguments
    /// * `attempt` - 1-indexed attempt that failed
    /// * `error`   - human-readable error description
    fn on_attempt_failed(&self, attempt: u32, error: &str) {
        let _ = (attempt, error);
    }

    /// Called when the provider returned a non-empty playbook.
    fn on_generation_complete(&self, markdown_len: usize) {
        let _ = markdown_len;
    }

    /// Called when generation fails for good.
    fn on_generation_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
