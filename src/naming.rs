//! Output file naming: `{company}-{role}-Playbook.{ext}`.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Replace every whitespace run with a single hyphen. Path separators are
/// hyphenated too so a name can never escape the output directory.
fn hyphenate(s: &str) -> String {
    RE_WHITESPACE.replace_all(s, "-").replace(['/', '\\'], "-")
}

/// File name for a playbook export.
///
/// ```rust
/// use edgequake_playbook::playbook_filename;
///
/// assert_eq!(
///     playbook_filename("Acme Coaching", "Appointment Setter", "docx"),
///     "Acme-Coaching-Appointment-Setter-Playbook.docx"
/// );
/// ```
pub fn playbook_filename(company: &str, role: &str, ext: &str) -> String {
    format!("{}-{}-Playbook.{}", hyphenate(company), hyphenate(role), ext)
}
