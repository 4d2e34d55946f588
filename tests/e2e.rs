//! End-to-end tests for edgequake-playbook.
//!
//! The offline tests run a realistic playbook through the converter, the
//! DOCX packager and the file writer. The live test makes a real LLM call
//! and is gated behind the `E2E_ENABLED` environment variable so it does not
//! run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 ANTHROPIC_API_KEY=... cargo test --test e2e -- --nocapture

use edgequake_playbook::{
    build_prompt, generate, markdown_to_blocks, render_docx, Block, GeneratedPlaybook,
    GenerationConfig, GenerationStats, OutputFormat, PlaybookError, PlaybookForm, Span,
};
use std::io::{Cursor, Read};

// ── Test helpers ─────────────────────────────────────────────────────────────

const SAMPLE: &str = "\
# Welcome to Acme Coaching

**Role:** Appointment Setter
**Reports to:** Dana Lee

## 1. Foundation (Week 1)

- [ ] Watch the founder mission video
- [x] Sign the contractor agreement
- Read the **brand voice** guide

---

## 2. Tech Stack Setup

| Tool | Purpose | Access |
|------|---------|--------|
| Slack | Team chat | Invite from ops |
| GoHighLevel | CRM and inbox | Login shared by **Dana** |

## 3. Compensation

| Item | Amount |
|---|---|
| Base pay | $1,500/mo |

### Bonus rules
Bonuses pay out monthly.
";

fn form() -> PlaybookForm {
    PlaybookForm {
        company: "Acme Coaching".into(),
        role: "Appointment Setter".into(),
        core_function: "sell-by-chat".into(),
        tools: vec!["Slack".into(), "GoHighLevel".into()],
        contact: "Dana Lee".into(),
        ..Default::default()
    }
}

fn docx_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let mut file = archive.by_name(name).expect("part present");
    let mut xml = String::new();
    file.read_to_string(&mut xml).expect("utf-8 part");
    xml
}

// ── Offline pipeline ─────────────────────────────────────────────────────────

#[test]
fn sample_converts_to_expected_block_structure() {
    let blocks = markdown_to_blocks(SAMPLE);

    let headings: Vec<(u8, &str)> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading { level, text } => Some((*level, text.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        headings,
        vec![
            (1, "Welcome to Acme Coaching"),
            (2, "1. Foundation (Week 1)"),
            (2, "2. Tech Stack Setup"),
            (2, "3. Compensation"),
            (3, "Bonus rules"),
        ]
    );

    // One break before each section heading except the first.
    let breaks = blocks.iter().filter(|b| **b == Block::PageBreak).count();
    assert_eq!(breaks, 2);

    let checkboxes: Vec<bool> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::CheckboxItem { checked, .. } => Some(*checked),
            _ => None,
        })
        .collect();
    assert_eq!(checkboxes, vec![false, true]);

    assert!(blocks.contains(&Block::BulletItem {
        spans: vec![
            Span::Plain("Read the ".into()),
            Span::Bold("brand voice".into()),
            Span::Plain(" guide".into()),
        ],
    }));
    assert!(blocks.contains(&Block::Rule));
}

#[test]
fn sample_tables_drop_separator_rows() {
    let blocks = markdown_to_blocks(SAMPLE);
    let tables: Vec<&Block> = blocks
        .iter()
        .filter(|b| matches!(b, Block::Table { .. }))
        .collect();
    assert_eq!(tables.len(), 2);

    match tables[0] {
        Block::Table { header, rows } => {
            assert_eq!(header, &vec!["Tool", "Purpose", "Access"]);
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0][0], vec![Span::Plain("Slack".into())]);
            assert_eq!(
                rows[1][2],
                vec![Span::Plain("Login shared by ".into()), Span::Bold("Dana".into())]
            );
        }
        other => panic!("expected table, got {other:?}"),
    }
}

#[test]
fn sample_renders_to_word_package() {
    let bytes = render_docx(SAMPLE, "Acme Coaching", "Appointment Setter").unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let doc = docx_part(&bytes, "word/document.xml");
    assert!(doc.contains("Acme Coaching"));
    assert!(doc.contains("Appointment Setter Playbook"));
    assert_eq!(doc.matches("<w:br w:type=\"page\"/>").count(), 2);
    assert_eq!(doc.matches("<w:tbl>").count(), 2);
    assert!(doc.contains("☑"));
    assert!(doc.contains("☐"));
    assert!(doc.contains("$1,500/mo"));

    let core = docx_part(&bytes, "docProps/core.xml");
    assert!(core.contains("<dc:title>Appointment Setter Playbook</dc:title>"));

    let types = docx_part(&bytes, "[Content_Types].xml");
    assert!(types.contains("wordprocessingml.document.main+xml"));
}

#[tokio::test]
async fn saved_files_follow_naming_convention() {
    let dir = tempfile::tempdir().unwrap();
    let playbook = GeneratedPlaybook {
        company: "Acme Coaching".into(),
        role: "Appointment Setter".into(),
        markdown: SAMPLE.into(),
        stats: GenerationStats::default(),
    };

    let written = playbook.save(dir.path(), OutputFormat::Both).await.unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "Acme-Coaching-Appointment-Setter-Playbook.docx",
            "Acme-Coaching-Appointment-Setter-Playbook.md",
        ]
    );

    assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), SAMPLE);
    let docx = std::fs::read(&written[0]).unwrap();
    assert!(docx_part(&docx, "word/document.xml").contains("Tech Stack Setup"));
}

#[test]
fn prompt_carries_form_values() {
    let prompt = build_prompt(&form());
    assert!(prompt.contains("Acme Coaching"));
    assert!(prompt.contains("Appointment Setter"));
    assert!(prompt.contains("Sell by Chat"));
    assert!(prompt.contains("Dana Lee"));
    assert!(prompt.contains("GoHighLevel"));
}

#[tokio::test]
async fn incomplete_form_fails_without_network() {
    let mut f = form();
    f.core_function = "  ".into();
    let err = generate(&f, &GenerationConfig::default()).await.unwrap_err();
    assert!(matches!(err, PlaybookError::MissingFields));
    assert!(err.is_client_error());
}

#[test]
fn config_and_callback_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GenerationConfig>();
    assert_send_sync::<edgequake_playbook::NoopProgressCallback>();
}

// ── Live LLM ─────────────────────────────────────────────────────────────────

/// Requires `E2E_ENABLED=1` and a configured provider (e.g. `ANTHROPIC_API_KEY`).
#[tokio::test]
async fn live_generation_produces_convertible_playbook() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }

    let config = GenerationConfig::builder()
        .max_retries(2)
        .build()
        .unwrap();
    let playbook = generate(&form(), &config).await.expect("generation succeeds");

    assert!(!playbook.markdown.trim().is_empty());
    assert!(playbook.stats.output_tokens > 0);

    let blocks = markdown_to_blocks(&playbook.markdown);
    assert!(
        blocks.iter().any(|b| matches!(b, Block::Heading { level: 2, .. })),
        "expected at least one section heading"
    );

    let dir = tempfile::tempdir().unwrap();
    let written = playbook.save(dir.path(), OutputFormat::Both).await.unwrap();
    for path in &written {
        let len = std::fs::metadata(path).unwrap().len();
        println!("{} ({} bytes)", path.display(), len);
        assert!(len > 0);
    }
}
