//! Prompts for playbook generation.
//!
//! Centralising every prompt here keeps the wording in one place and lets
//! unit tests inspect the rendered text without calling a model.
//!
//! The prompt asks for exactly the Markdown dialect that
//! [`crate::pipeline::markdown`] understands: `#`/`##`/`###` headings, `- [ ]`
//! checklists, pipe tables and `**bold**`. Each `##` section becomes its own
//! page in the DOCX export, so the section list below doubles as the page
//! layout of the final document.

use crate::form::PlaybookForm;

/// Default system prompt. Callers can override it through
/// [`crate::config::GenerationConfig::system_prompt`].
pub const DEFAULT_SYSTEM_PROMPT: &str = "You write onboarding playbooks for coaching \
businesses. Reply with the playbook in Markdown only: no preamble, no closing remarks, \
and do not wrap the output in code fences.";

const TO_BE_SET: &str = "[To be set]";

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Render the generation prompt for a form.
///
/// Empty optional fields are replaced with bracketed placeholders so the
/// model leaves a visible gap instead of inventing details.
pub fn build_prompt(form: &PlaybookForm) -> String {
    let function_name = form.core_function().prompt_name();
    let tools = if form.tools.is_empty() {
        "To be configured".to_string()
    } else {
        form.tools.join(", ")
    };

    format!(
        r#"You are creating a professional onboarding playbook for a coaching business.

Generate a comprehensive, ready-to-use playbook in Markdown format for the following role:

**Company:** {company}
**Role:** {role}
**Core Function:** {function_name}
**Tools:** {tools}
**Manager/Contact:** {contact}

**Compensation Details:**
- Base Pay: {base_pay}
- Close Bonus: {close_bonus}
- Performance Threshold: {performance_threshold}
- Performance Bonus: {performance_bonus}

**Time Expectations:**
- Hours per Week: {hours_per_week}
- Working Hours: {working_hours}
- Remote Requirements: {remote_requirements}

**Culture:**
- Wins Channel: {wins_channel}

Create a playbook with the following structure. Use [INSERT LOOM] or [INSERT DOC] placeholders where video/document links should go. Make it practical and actionable.

## Required Sections:

1. **Company Foundation**
   - Mission & Values (3-4 checklist items with Loom/doc placeholders)
   - Appearance & Communication (3-4 items)

2. **Tech Setup (SOPs)**
   - Essential Tools table with columns: Tool | Purpose | Setup Video
{tool_rows}
   - Account Setup Checklist (5-7 items)

3. **Role Training: {role}**
   - The System You're Implementing (based on {function_name})
   - Product Knowledge (4-5 items)
   - Scripts & Frameworks (4-5 items including practice tasks)

4. **Daily Activities**
   - Daily Rhythm table (time blocks from start to end of day)
   - Pipeline Training items

5. **Scorecard & Compensation**
   - KPIs table (Metric | Daily | Weekly | Monthly targets)
   - Compensation Structure (use the provided details or placeholders)
   - Time Expectations (use provided details)
   - Client Success & Social Proof section

6. **Communication & Support**
   - Who to Contact table (Question Type | Contact | Channel)
   - Meeting Schedule checklist

7. **Completion Confirmation**
   - 4-5 step checklist to confirm onboarding is complete
   - Include recording a Loom intro and scheduling first 1:1

Format guidelines:
- Use proper Markdown with headers, tables, and checklists
- Use ## for each of the seven sections and ### for their subsections
- Checklist items should use "- [ ]" format
- Keep it professional but warm
- Add a "Welcome to the team!" message at the end
- Make KPI targets realistic for the role type"#,
        company = form.company,
        role = form.role,
        contact = or_placeholder(&form.contact, "[To be assigned]"),
        base_pay = or_placeholder(&form.base_pay, TO_BE_SET),
        close_bonus = or_placeholder(&form.close_bonus, TO_BE_SET),
        performance_threshold = or_placeholder(&form.performance_threshold, TO_BE_SET),
        performance_bonus = or_placeholder(&form.performance_bonus, TO_BE_SET),
        hours_per_week = or_placeholder(&form.hours_per_week, TO_BE_SET),
        working_hours = or_placeholder(&form.working_hours, TO_BE_SET),
        remote_requirements = or_placeholder(&form.remote_requirements, TO_BE_SET),
        wins_channel = or_placeholder(&form.wins_channel, "#wins"),
        tool_rows = tool_table_rows(&form.tools),
    )
}

/// Starter rows for the "Essential Tools" table, one per selected tool.
fn tool_table_rows(tools: &[String]) -> String {
    if tools.is_empty() {
        return "     | [Tool] | [Purpose] | [INSERT LOOM] |".to_string();
    }
    tools
        .iter()
        .map(|t| format!("     | {t} | [Purpose] | [INSERT LOOM] |"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_form() -> PlaybookForm {
        PlaybookForm {
            company: "Acme Coaching".into(),
            role: "Appointment Setter".into(),
            core_function: "sell-by-chat".into(),
            tools: vec!["GoHighLevel".into(), "Slack".into()],
            contact: "Sarah Johnson".into(),
            base_pay: "$1,250/month".into(),
            close_bonus: "$175 per close".into(),
            performance_threshold: "10 closes".into(),
            performance_bonus: "$500".into(),
            hours_per_week: "40".into(),
            working_hours: "9am-5pm EST".into(),
            remote_requirements: "Quiet space".into(),
            wins_channel: "#celebrations".into(),
        }
    }

    #[test]
    fn every_field_is_rendered() {
        let p = build_prompt(&full_form());
        for needle in [
            "**Company:** Acme Coaching",
            "**Role:** Appointment Setter",
            "**Core Function:** Sell by Chat",
            "**Tools:** GoHighLevel, Slack",
            "**Manager/Contact:** Sarah Johnson",
            "Base Pay: $1,250/month",
            "Close Bonus: $175 per close",
            "Performance Threshold: 10 closes",
            "Performance Bonus: $500",
            "Hours per Week: 40",
            "Working Hours: 9am-5pm EST",
            "Remote Requirements: Quiet space",
            "Wins Channel: #celebrations",
            "**Role Training: Appointment Setter**",
            "| GoHighLevel | [Purpose] | [INSERT LOOM] |",
            "| Slack | [Purpose] | [INSERT LOOM] |",
        ] {
            assert!(p.contains(needle), "missing {needle:?}");
        }
    }

    #[test]
    fn empty_optional_fields_use_placeholders() {
        let form = PlaybookForm {
            company: "Acme".into(),
            role: "Closer".into(),
            core_function: "unknown".into(),
            ..Default::default()
        };
        let p = build_prompt(&form);
        assert!(p.contains("**Tools:** To be configured"));
        assert!(p.contains("**Manager/Contact:** [To be assigned]"));
        assert!(p.contains("Base Pay: [To be set]"));
        assert!(p.contains("Wins Channel: #wins"));
        assert!(p.contains("**Core Function:** General Role"));
        assert!(p.contains("| [Tool] | [Purpose] | [INSERT LOOM] |"));
    }

    #[test]
    fn prompt_asks_for_supported_markdown() {
        let p = build_prompt(&full_form());
        assert!(p.contains("\"- [ ]\" format"));
        assert!(p.contains("Welcome to the team!"));
        assert!(p.contains("7. **Completion Confirmation**"));
    }

    #[test]
    fn system_prompt_forbids_fences() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("code fences"));
    }
}
