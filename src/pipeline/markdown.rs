//! Markdown → [`Block`] conversion.
//!
//! The model is asked for a narrow Markdown dialect: `#`/`##`/`###` headings,
//! `-` bullets, `- [ ]` checklists, `**bold**`, pipe tables and `---` rules.
//! This module walks that dialect line by line and emits one block per line,
//! except for tables, which swallow their whole run of `|…|` lines.
//!
//! ## Leniency
//!
//! Conversion never fails. Anything the classifier does not recognise falls
//! through to a paragraph of inline spans, an unterminated `**` stays literal
//! text, and a table without a separator row is dropped silently.
//!
//! ## Pagination
//!
//! Every `## ` section after the first starts on a new page: a
//! [`Block::PageBreak`] is emitted right before the second and later level-2
//! headings. The "seen a section yet" flag lives on the stack of
//! [`markdown_to_blocks`], so concurrent conversions never share state.

use crate::document::{Block, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use std::iter::Peekable;

/// `**bold**` run; at least one non-`*` character between the markers.
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*[^*]+\*\*").unwrap());

/// `- [ ]`, `- [x]`, `-[X]`, `- [ x ]` … plus the whitespace after the bracket.
static RE_CHECKBOX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s*\[\s*([xX]?)\s*\]\s*").unwrap());

/// Table separator row such as `|---|:---:|`. Deliberately loose: only the
/// start of the line is checked, so some malformed rows match too.
static RE_TABLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\|[\s\-:]+\|").unwrap());

/// Classification of a single input line. Variants are listed in match
/// priority order.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Heading(u8, &'a str),
    Rule,
    TableRow,
    Checkbox { checked: bool, content: &'a str },
    Bullet(&'a str),
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(text) = line.strip_prefix("# ") {
        return Line::Heading(1, text);
    }
    if let Some(text) = line.strip_prefix("## ") {
        return Line::Heading(2, text);
    }
    if let Some(text) = line.strip_prefix("### ") {
        return Line::Heading(3, text);
    }
    if trimmed == "---" {
        return Line::Rule;
    }
    if is_table_line(line) {
        return Line::TableRow;
    }
    if let Some(caps) = RE_CHECKBOX.captures(line) {
        let marker = caps.get(0).map_or(0, |m| m.end());
        let checked = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        return Line::Checkbox {
            checked,
            content: &line[marker..],
        };
    }
    if let Some(text) = line.strip_prefix("- ") {
        return Line::Bullet(text);
    }
    Line::Text(line)
}

/// Convert Markdown text into an ordered sequence of document blocks.
///
/// Empty input yields no blocks. Lines may end in `\n` or `\r\n`; a final
/// line terminator does not add a trailing spacer.
///
/// ```rust
/// use edgequake_playbook::{markdown_to_blocks, Block, Span};
///
/// let blocks = markdown_to_blocks("## Setup\n- [x] Create **email**");
/// assert_eq!(blocks[0], Block::Heading { level: 2, text: "Setup".into() });
/// assert_eq!(
///     blocks[1],
///     Block::CheckboxItem {
///         checked: true,
///         spans: vec![Span::Plain("Create ".into()), Span::Bold("email".into())],
///     }
/// );
/// ```
pub fn markdown_to_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut seen_section = false;
    let mut lines = markdown.lines().peekable();

    while let Some(line) = lines.next() {
        match classify(line) {
            Line::Blank => blocks.push(Block::spacer()),
            Line::Heading(level, text) => {
                if level == 2 {
                    if seen_section {
                        blocks.push(Block::PageBreak);
                    }
                    seen_section = true;
                }
                blocks.push(Block::Heading {
                    level,
                    text: text.to_string(),
                });
            }
            Line::Rule => blocks.push(Block::Rule),
            Line::TableRow => {
                if let Some(table) = collect_table(line, &mut lines) {
                    blocks.push(table);
                }
            }
            Line::Checkbox { checked, content } => blocks.push(Block::CheckboxItem {
                checked,
                spans: parse_inline(content),
            }),
            Line::Bullet(text) => blocks.push(Block::BulletItem {
                spans: parse_inline(text),
            }),
            Line::Text(text) => blocks.push(Block::Paragraph {
                spans: parse_inline(text),
            }),
        }
    }

    blocks
}

/// Split text into plain and bold spans.
///
/// Empty plain runs are omitted, so `"**a**"` yields a single bold span and
/// `""` yields none.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for m in RE_BOLD.find_iter(text) {
        if m.start() > last {
            spans.push(Span::Plain(text[last..m.start()].to_string()));
        }
        let inner = &m.as_str()[2..m.as_str().len() - 2];
        spans.push(Span::Bold(inner.to_string()));
        last = m.end();
    }
    if last < text.len() {
        spans.push(Span::Plain(text[last..].to_string()));
    }

    spans
}

// ── Tables ───────────────────────────────────────────────────────────────────

fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    RE_TABLE_SEPARATOR.is_match(line) && line.contains("---")
}

/// Split `| a | b |` into `["a", "b"]`. The segments outside the outer pipes
/// are dropped even when they hold stray whitespace.
fn split_cells(line: &str) -> Vec<&str> {
    let segments: Vec<&str> = line.split('|').collect();
    if segments.len() < 2 {
        return Vec::new();
    }
    segments[1..segments.len() - 1]
        .iter()
        .map(|cell| cell.trim())
        .collect()
}

/// Consume the rest of a table run starting at `first` and build the block.
///
/// Returns `None` for a header-only run; its lines are consumed either way.
fn collect_table<'a, I>(first: &'a str, lines: &mut Peekable<I>) -> Option<Block>
where
    I: Iterator<Item = &'a str>,
{
    let mut run = vec![first];
    while let Some(line) = lines.next_if(|l| is_table_line(l)) {
        run.push(line);
    }

    if run.len() < 2 {
        return None;
    }

    let header = split_cells(run[0])
        .into_iter()
        .map(str::to_string)
        .collect();

    // run[1] is the separator row and is never rendered.
    let rows = run[2..]
        .iter()
        .filter(|line| !is_separator_row(line))
        .map(|line| split_cells(line).into_iter().map(parse_inline).collect())
        .collect();

    Some(Block::Table { header, rows })
}
