//! Onboarding form: the structured input a playbook is generated from.
//!
//! The JSON shape (camelCase keys) is what the HTTP API accepts on
//! `POST /api/generate`; the CLI builds the same struct from flags or from a
//! JSON file passed with `--form`.

use crate::error::PlaybookError;
use serde::{Deserialize, Serialize};

/// Tools offered as one-click choices. Anything else goes in as free text.
pub const DEFAULT_TOOLS: &[&str] = &[
    "GoHighLevel",
    "Slack",
    "Google Meet",
    "Fathom",
    "Calendly",
    "Zoom",
    "Notion",
    "ClickUp",
];

/// Role details collected before generation.
///
/// Only `company`, `role` and `core_function` are required; every other field
/// falls back to a placeholder in the prompt when left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybookForm {
    pub company: String,
    pub role: String,
    /// Key of a [`CoreFunction`], e.g. `"sell-by-chat"`. Unknown keys are
    /// accepted and treated as [`CoreFunction::Other`].
    pub core_function: String,
    pub tools: Vec<String>,
    pub contact: String,

    // Compensation
    pub base_pay: String,
    pub close_bonus: String,
    pub performance_threshold: String,
    pub performance_bonus: String,

    // Time
    pub hours_per_week: String,
    pub working_hours: String,
    pub remote_requirements: String,

    // Culture
    pub wins_channel: String,
}

impl PlaybookForm {
    /// Check that the required fields are present.
    pub fn validate(&self) -> Result<(), PlaybookError> {
        let missing = [&self.company, &self.role, &self.core_function]
            .iter()
            .any(|f| f.trim().is_empty());
        if missing {
            return Err(PlaybookError::MissingFields);
        }
        Ok(())
    }

    /// The core function this form selects.
    pub fn core_function(&self) -> CoreFunction {
        CoreFunction::from_key(&self.core_function)
    }

    /// Parse a form from JSON text.
    pub fn from_json(json: &str) -> Result<Self, PlaybookError> {
        serde_json::from_str(json).map_err(|e| PlaybookError::InvalidForm {
            detail: e.to_string(),
        })
    }
}

/// Merge checked tools with a comma-separated free-text list.
///
/// Free-text entries are trimmed and empty entries dropped; order is
/// selected tools first, then free text in the order typed.
pub fn merge_tools(selected: &[String], other: &str) -> Vec<String> {
    selected
        .iter()
        .cloned()
        .chain(
            other
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        )
        .collect()
}

/// The kind of work the role does; drives the "Role Training" section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoreFunction {
    SellByChat,
    CustomerSuccess,
    Community,
    Operations,
    Closer,
    Other,
}

impl CoreFunction {
    pub const ALL: [CoreFunction; 6] = [
        CoreFunction::SellByChat,
        CoreFunction::CustomerSuccess,
        CoreFunction::Community,
        CoreFunction::Operations,
        CoreFunction::Closer,
        CoreFunction::Other,
    ];

    /// Form key, e.g. `"customer-success"`.
    pub fn key(&self) -> &'static str {
        match self {
            CoreFunction::SellByChat => "sell-by-chat",
            CoreFunction::CustomerSuccess => "customer-success",
            CoreFunction::Community => "community",
            CoreFunction::Operations => "operations",
            CoreFunction::Closer => "closer",
            CoreFunction::Other => "other",
        }
    }

    /// Label shown next to the choice in the form.
    pub fn label(&self) -> &'static str {
        match self {
            CoreFunction::SellByChat => "Sell by Chat",
            CoreFunction::CustomerSuccess => "Customer Success",
            CoreFunction::Community => "Community Management",
            CoreFunction::Operations => "Operations / Integrator",
            CoreFunction::Closer => "Sales Closer",
            CoreFunction::Other => "Other",
        }
    }

    /// Name used inside the generation prompt.
    pub fn prompt_name(&self) -> &'static str {
        match self {
            CoreFunction::SellByChat => "Sell by Chat",
            CoreFunction::CustomerSuccess => "Customer Success",
            CoreFunction::Community => "Community Management",
            CoreFunction::Operations => "Operations",
            CoreFunction::Closer => "Sales Closing",
            CoreFunction::Other => "General Role",
        }
    }

    /// Look up a form key; unknown keys map to [`CoreFunction::Other`].
    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|f| f.key() == key)
            .unwrap_or(CoreFunction::Other)
    }
}
