//! DOCX packaging: `[Block]` → OOXML bytes.
//!
//! A `.docx` file is a zip archive of a handful of XML parts. We write the
//! minimum set Word, LibreOffice and Google Docs all accept:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/core.xml
//! word/document.xml
//! word/styles.xml
//! word/_rels/document.xml.rels
//! ```
//!
//! Layout follows the playbook house style: A4 page, Arial 11pt body, a
//! company/role title block with a gold underline, gold `##` section titles,
//! `☐`/`☑` checklists, and tables with a shaded header row.

use crate::document::{Block, Span};
use crate::error::PlaybookError;
use std::borrow::Cow;
use std::io::{Cursor, Write};
use tracing::debug;
use xml::common::XmlVersion;
use xml::writer::{EventWriter, Result as XmlResult, XmlEvent};
use xml::EmitterConfig;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// MIME type of a `.docx` file.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const FONT: &str = "Arial";
const GOLD: &str = "EFBB39";
const RULE_GREY: &str = "CCCCCC";
const TABLE_HEADER_FILL: &str = "F5F5F5";

/// Font sizes in half-points.
const BODY_SIZE: u32 = 22;
const TABLE_HEADER_SIZE: u32 = 20;
const TITLE_SIZE: u32 = 48;
const SUBTITLE_SIZE: u32 = 28;

/// Indent for list and checklist items, in twips.
const LIST_INDENT: u32 = 360;

// A4 with ~20mm top/bottom and ~15mm side margins, in twips.
const PAGE_WIDTH: u32 = 11906;
const PAGE_HEIGHT: u32 = 16838;
const MARGIN_TOP_BOTTOM: u32 = 1134;
const MARGIN_SIDES: u32 = 850;
const TEXT_WIDTH: u32 = PAGE_WIDTH - 2 * MARGIN_SIDES;

/// Package blocks as a DOCX document titled for `company` / `role`.
pub fn blocks_to_docx(blocks: &[Block], company: &str, role: &str) -> Result<Vec<u8>, PlaybookError> {
    let document = document_xml(blocks, company, role)?;
    let core = core_xml(company, role)?;
    debug!(
        "Packaging DOCX: {} blocks, document.xml {} bytes",
        blocks.len(),
        document.len()
    );

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("docProps/core.xml", core.as_slice()),
        ("word/document.xml", document.as_slice()),
        ("word/styles.xml", STYLES_XML.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body)
            .map_err(|e| PlaybookError::DocxPackagingFailed {
                detail: format!("{name}: {e}"),
            })?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

// ── XML helpers ──────────────────────────────────────────────────────────────

fn xml_writer(buf: &mut Vec<u8>) -> Result<EventWriter<&mut Vec<u8>>, PlaybookError> {
    let mut writer = EmitterConfig::new()
        .pad_self_closing(false)
        .create_writer(buf);
    writer.write(XmlEvent::StartDocument {
        version: XmlVersion::Version10,
        encoding: Some("UTF-8"),
        standalone: Some(true),
    })?;
    Ok(writer)
}

/// Write `<name attr="…"/>`.
fn empty<W: Write>(w: &mut EventWriter<W>, name: &str, attrs: &[(&str, &str)]) -> XmlResult<()> {
    let mut start = XmlEvent::start_element(name);
    for (k, v) in attrs {
        start = start.attr(*k, *v);
    }
    w.write(start)?;
    w.write(XmlEvent::end_element())
}

/// Write `<name>text</name>`.
fn text_element<W: Write>(w: &mut EventWriter<W>, name: &str, text: &str) -> XmlResult<()> {
    w.write(XmlEvent::start_element(name))?;
    w.write(XmlEvent::characters(&xml_safe(text)))?;
    w.write(XmlEvent::end_element())
}

/// Drop code points XML 1.0 cannot carry: C0 controls other than tab, LF
/// and CR, plus U+FFFE and U+FFFF.
fn xml_safe(text: &str) -> Cow<'_, str> {
    let allowed = |c: char| {
        matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
    };
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| allowed(c)).collect())
    }
}

// ── Paragraph model ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Run<'a> {
    text: &'a str,
    bold: bool,
    size: Option<u32>,
    color: Option<&'static str>,
}

impl<'a> Run<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            text,
            size: Some(BODY_SIZE),
            ..Default::default()
        }
    }

    fn from_span(span: &'a Span, size: u32) -> Self {
        Self {
            text: span.text(),
            bold: span.is_bold(),
            size: Some(size),
            color: None,
        }
    }
}

#[derive(Default)]
struct Para<'a> {
    style: Option<&'static str>,
    border_bottom: Option<(u32, &'static str)>,
    before: Option<u32>,
    after: Option<u32>,
    indent: Option<u32>,
    runs: Vec<Run<'a>>,
}

fn write_run<W: Write>(w: &mut EventWriter<W>, run: &Run<'_>) -> XmlResult<()> {
    w.write(XmlEvent::start_element("w:r"))?;
    w.write(XmlEvent::start_element("w:rPr"))?;
    empty(w, "w:rFonts", &[("w:ascii", FONT), ("w:hAnsi", FONT), ("w:cs", FONT)])?;
    if run.bold {
        empty(w, "w:b", &[])?;
        empty(w, "w:bCs", &[])?;
    }
    if let Some(color) = run.color {
        empty(w, "w:color", &[("w:val", color)])?;
    }
    if let Some(size) = run.size {
        let size = size.to_string();
        empty(w, "w:sz", &[("w:val", size.as_str())])?;
        empty(w, "w:szCs", &[("w:val", size.as_str())])?;
    }
    w.write(XmlEvent::end_element())?;

    let text = xml_safe(run.text);
    w.write(XmlEvent::start_element("w:t").attr("xml:space", "preserve"))?;
    w.write(XmlEvent::characters(&text))?;
    w.write(XmlEvent::end_element())?;
    w.write(XmlEvent::end_element())
}

fn write_paragraph<W: Write>(w: &mut EventWriter<W>, para: &Para<'_>) -> XmlResult<()> {
    w.write(XmlEvent::start_element("w:p"))?;
    w.write(XmlEvent::start_element("w:pPr"))?;
    if let Some(style) = para.style {
        empty(w, "w:pStyle", &[("w:val", style)])?;
    }
    if let Some((size, color)) = para.border_bottom {
        let size = size.to_string();
        w.write(XmlEvent::start_element("w:pBdr"))?;
        empty(
            w,
            "w:bottom",
            &[("w:val", "single"), ("w:sz", size.as_str()), ("w:space", "1"), ("w:color", color)],
        )?;
        w.write(XmlEvent::end_element())?;
    }
    if para.before.is_some() || para.after.is_some() {
        let before = para.before.map(|v| v.to_string());
        let after = para.after.map(|v| v.to_string());
        let mut attrs = Vec::with_capacity(2);
        if let Some(ref before) = before {
            attrs.push(("w:before", before.as_str()));
        }
        if let Some(ref after) = after {
            attrs.push(("w:after", after.as_str()));
        }
        empty(w, "w:spacing", &attrs)?;
    }
    if let Some(left) = para.indent {
        empty(w, "w:ind", &[("w:left", left.to_string().as_str())])?;
    }
    w.write(XmlEvent::end_element())?;
    for run in &para.runs {
        write_run(w, run)?;
    }
    w.write(XmlEvent::end_element())
}

fn span_runs(spans: &[Span], size: u32) -> impl Iterator<Item = Run<'_>> {
    spans.iter().map(move |s| Run::from_span(s, size))
}

// ── document.xml ─────────────────────────────────────────────────────────────

fn document_xml(blocks: &[Block], company: &str, role: &str) -> Result<Vec<u8>, PlaybookError> {
    let mut buf = Vec::with_capacity(blocks.len() * 512 + 2048);
    let mut w = xml_writer(&mut buf)?;

    w.write(
        XmlEvent::start_element("w:document")
            .ns("w", NS_W)
            .ns("r", NS_R),
    )?;
    w.write(XmlEvent::start_element("w:body"))?;

    // Title block
    write_paragraph(
        &mut w,
        &Para {
            after: Some(120),
            runs: vec![Run {
                text: company,
                bold: true,
                size: Some(TITLE_SIZE),
                color: None,
            }],
            ..Default::default()
        },
    )?;
    let subtitle = format!("{role} Playbook");
    write_paragraph(
        &mut w,
        &Para {
            border_bottom: Some((18, GOLD)),
            after: Some(400),
            runs: vec![Run {
                text: &subtitle,
                bold: true,
                size: Some(SUBTITLE_SIZE),
                color: Some(GOLD),
            }],
            ..Default::default()
        },
    )?;

    for block in blocks {
        write_block(&mut w, block)?;
    }

    w.write(XmlEvent::start_element("w:sectPr"))?;
    empty(
        &mut w,
        "w:pgSz",
        &[("w:w", PAGE_WIDTH.to_string().as_str()), ("w:h", PAGE_HEIGHT.to_string().as_str())],
    )?;
    let (top_bottom, sides) = (MARGIN_TOP_BOTTOM.to_string(), MARGIN_SIDES.to_string());
    empty(
        &mut w,
        "w:pgMar",
        &[
            ("w:top", top_bottom.as_str()),
            ("w:right", sides.as_str()),
            ("w:bottom", top_bottom.as_str()),
            ("w:left", sides.as_str()),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    w.write(XmlEvent::end_element())?; // w:sectPr
    w.write(XmlEvent::end_element())?; // w:body
    w.write(XmlEvent::end_element())?; // w:document

    drop(w);
    Ok(buf)
}

fn write_block<W: Write>(w: &mut EventWriter<W>, block: &Block) -> XmlResult<()> {
    match block {
        Block::Heading { level, text } => {
            let (style, size, color, before, after) = match level {
                1 => ("Heading1", 36, None, 400, 200),
                2 => ("Heading2", 28, Some(GOLD), 300, 160),
                _ => ("Heading3", 24, None, 240, 120),
            };
            write_paragraph(
                w,
                &Para {
                    style: Some(style),
                    before: Some(before),
                    after: Some(after),
                    runs: vec![Run {
                        text,
                        bold: true,
                        size: Some(size),
                        color,
                    }],
                    ..Default::default()
                },
            )
        }
        Block::Paragraph { spans } => write_paragraph(
            w,
            &Para {
                after: Some(120),
                runs: span_runs(spans, BODY_SIZE).collect(),
                ..Default::default()
            },
        ),
        Block::BulletItem { spans } => write_list_item(w, "•  ", spans),
        Block::CheckboxItem { checked, spans } => {
            let mark = if *checked { "☑  " } else { "☐  " };
            write_list_item(w, mark, spans)
        }
        Block::Rule => write_paragraph(
            w,
            &Para {
                border_bottom: Some((6, RULE_GREY)),
                before: Some(200),
                after: Some(200),
                ..Default::default()
            },
        ),
        Block::PageBreak => {
            w.write(XmlEvent::start_element("w:p"))?;
            w.write(XmlEvent::start_element("w:r"))?;
            empty(w, "w:br", &[("w:type", "page")])?;
            w.write(XmlEvent::end_element())?;
            w.write(XmlEvent::end_element())
        }
        Block::Table { header, rows } => {
            write_table(w, header, rows)?;
            write_paragraph(
                w,
                &Para {
                    after: Some(200),
                    ..Default::default()
                },
            )
        }
    }
}

fn write_list_item<W: Write>(w: &mut EventWriter<W>, marker: &str, spans: &[Span]) -> XmlResult<()> {
    let mut runs = vec![Run::text(marker)];
    runs.extend(span_runs(spans, BODY_SIZE));
    write_paragraph(
        w,
        &Para {
            after: Some(80),
            indent: Some(LIST_INDENT),
            runs,
            ..Default::default()
        },
    )
}

fn write_table<W: Write>(
    w: &mut EventWriter<W>,
    header: &[String],
    rows: &[Vec<Vec<Span>>],
) -> XmlResult<()> {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
        .max(1);
    let col_width = TEXT_WIDTH / columns as u32;

    w.write(XmlEvent::start_element("w:tbl"))?;
    w.write(XmlEvent::start_element("w:tblPr"))?;
    empty(w, "w:tblW", &[("w:w", "5000"), ("w:type", "pct")])?;
    w.write(XmlEvent::start_element("w:tblBorders"))?;
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        empty(
            w,
            &format!("w:{edge}"),
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    w.write(XmlEvent::end_element())?; // w:tblBorders
    w.write(XmlEvent::end_element())?; // w:tblPr

    w.write(XmlEvent::start_element("w:tblGrid"))?;
    let width = col_width.to_string();
    for _ in 0..columns {
        empty(w, "w:gridCol", &[("w:w", width.as_str())])?;
    }
    w.write(XmlEvent::end_element())?;

    // Header row
    w.write(XmlEvent::start_element("w:tr"))?;
    if header.is_empty() {
        write_cell(w, col_width, None, &[])?;
    }
    for cell in header {
        let run = Run {
            text: cell,
            bold: true,
            size: Some(TABLE_HEADER_SIZE),
            color: None,
        };
        write_cell(w, col_width, Some(TABLE_HEADER_FILL), &[run])?;
    }
    w.write(XmlEvent::end_element())?;

    for row in rows {
        w.write(XmlEvent::start_element("w:tr"))?;
        if row.is_empty() {
            write_cell(w, col_width, None, &[])?;
        }
        for cell in row {
            let runs: Vec<Run<'_>> = span_runs(cell, BODY_SIZE).collect();
            write_cell(w, col_width, None, &runs)?;
        }
        w.write(XmlEvent::end_element())?;
    }

    w.write(XmlEvent::end_element()) // w:tbl
}

fn write_cell<W: Write>(
    w: &mut EventWriter<W>,
    width: u32,
    fill: Option<&str>,
    runs: &[Run<'_>],
) -> XmlResult<()> {
    w.write(XmlEvent::start_element("w:tc"))?;
    w.write(XmlEvent::start_element("w:tcPr"))?;
    empty(w, "w:tcW", &[("w:w", width.to_string().as_str()), ("w:type", "dxa")])?;
    if let Some(fill) = fill {
        empty(
            w,
            "w:shd",
            &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill)],
        )?;
    }
    w.write(XmlEvent::end_element())?;
    w.write(XmlEvent::start_element("w:p"))?;
    for run in runs {
        write_run(w, run)?;
    }
    w.write(XmlEvent::end_element())?; // w:p
    w.write(XmlEvent::end_element()) // w:tc
}

// ── Package parts ────────────────────────────────────────────────────────────

fn core_xml(company: &str, role: &str) -> Result<Vec<u8>, PlaybookError> {
    let mut buf = Vec::with_capacity(1024);
    let mut w = xml_writer(&mut buf)?;

    w.write(
        XmlEvent::start_element("cp:coreProperties")
            .ns("cp", "http://schemas.openxmlformats.org/package/2006/metadata/core-properties")
            .ns("dc", "http://purl.org/dc/elements/1.1/")
            .ns("dcterms", "http://purl.org/dc/terms/")
            .ns("dcmitype", "http://purl.org/dc/dcmitype/")
            .ns("xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    )?;
    text_element(&mut w, "dc:title", &format!("{role} Playbook"))?;
    text_element(&mut w, "dc:creator", company)?;
    w.write(XmlEvent::end_element())?;

    drop(w);
    Ok(buf)
}

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial" w:cs="Arial" w:eastAsia="Arial"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/></w:rPr></w:style></w:styles>"#;
