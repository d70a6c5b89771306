//! # Article Export
//!
//! Two downloads: the raw markdown, and a Word document with the topic as
//! title and one plain paragraph per non-blank line.

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::article::ArticleResult;
use crate::error::{ScribeError, ScribeResult};
use crate::topic::Topic;

pub const MARKDOWN_MIME: &str = "text/markdown";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A download ready to hand to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub filename: String,
    pub mime: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

pub fn markdown_filename(topic: &Topic) -> String {
    format!("{}_article.md", topic.file_stem())
}

pub fn docx_filename(topic: &Topic) -> String {
    format!("{}_article.docx", topic.file_stem())
}

/// Export A: the raw article text.
pub fn markdown(article: &ArticleResult) -> ExportFile {
    ExportFile {
        filename: markdown_filename(&article.topic),
        mime: MARKDOWN_MIME,
        bytes: article.raw.clone().into_bytes(),
    }
}

/// Export B: the article as a `.docx` package.
pub fn docx(article: &ArticleResult) -> ScribeResult<ExportFile> {
    let bytes = DocxDocument::from_article(article)
        .to_bytes()
        .map_err(|e| ScribeError::export(format!("{:#}", e)))?;
    Ok(ExportFile {
        filename: docx_filename(&article.topic),
        mime: DOCX_MIME,
        bytes,
    })
}

/// Block-level content of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocxNode {
    /// Title-styled heading (level 0)
    Title(String),
    Paragraph(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxDocument {
    nodes: Vec<DocxNode>,
}

impl DocxDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Title, then one paragraph per non-blank line. Markup stays as literal text.
    pub fn from_article(article: &ArticleResult) -> Self {
        let mut doc = Self::new();
        doc.add_title(article.topic.as_str());
        for line in article.raw.lines() {
            let line = line.trim();
            if !line.is_empty() {
                doc.add_paragraph(line);
            }
        }
        doc
    }

    pub fn add_title(&mut self, text: &str) {
        self.nodes.push(DocxNode::Title(text.to_string()));
    }

    pub fn add_paragraph(&mut self, text: &str) {
        self.nodes.push(DocxNode::Paragraph(text.to_string()));
    }

    pub fn nodes(&self) -> &[DocxNode] {
        &self.nodes
    }

    pub fn paragraph_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, DocxNode::Paragraph(_)))
            .count()
    }

    pub fn heading_count(&self) -> usize {
        self.nodes.len() - self.paragraph_count()
    }

    /// `word/document.xml`
    pub fn document_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        writer.write_event(Event::Start(
            BytesStart::new("w:document").with_attributes([("xmlns:w", W_NS)]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("w:body")))?;

        for node in &self.nodes {
            writer.write_event(Event::Start(BytesStart::new("w:p")))?;
            let text = match node {
                DocxNode::Title(text) => {
                    writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
                    writer.write_event(Event::Empty(
                        BytesStart::new("w:pStyle").with_attributes([("w:val", "Title")]),
                    ))?;
                    writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
                    text
                }
                DocxNode::Paragraph(text) => text,
            };
            write_run(&mut writer, text)?;
            writer.write_event(Event::End(BytesEnd::new("w:p")))?;
        }

        writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;
        writer.write_event(Event::Empty(
            BytesStart::new("w:pgSz").with_attributes([("w:w", "12240"), ("w:h", "15840")]),
        ))?;
        writer.write_event(Event::Empty(BytesStart::new("w:pgMar").with_attributes([
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ])))?;
        writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;
        writer.write_event(Event::End(BytesEnd::new("w:body")))?;
        writer.write_event(Event::End(BytesEnd::new("w:document")))?;

        String::from_utf8(writer.into_inner()).context("document.xml is not UTF-8")
    }

    /// Package the document as a zip archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, String); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
            ("word/styles.xml", STYLES_XML.to_string()),
            ("word/document.xml", self.document_xml()?),
        ];
        for (name, content) in parts {
            zip.start_file(name, options)
                .with_context(|| format!("Failed to start docx part {}", name))?;
            zip.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write docx part {}", name))?;
        }

        let cursor = zip.finish().context("Failed to finish docx archive")?;
        Ok(cursor.into_inner())
    }
}

fn write_run(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    let text: String = text.chars().filter(|c| is_xml_char(*c)).collect();
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    writer.write_event(Event::Start(
        BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    writer.write_event(Event::End(BytesEnd::new("w:t")))?;
    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    Ok(())
}

/// Characters allowed by XML 1.0 (`Char` production)
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="200" w:line="276" w:lineRule="auto"/></w:pPr><w:rPr><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:spacing w:after="300"/></w:pPr><w:rPr><w:color w:val="17365D"/><w:sz w:val="52"/></w:rPr></w:style></w:styles>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn article(topic: &str, raw: &str) -> ArticleResult {
        ArticleResult::new(Topic::parse(topic).unwrap(), raw)
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    /// `w:p` element count and the unescaped text of every `w:t`
    fn parse_body(xml: &str) -> (usize, Vec<String>) {
        let mut reader = quick_xml::Reader::from_str(xml);
        let mut paragraphs = 0;
        let mut texts = Vec::new();
        let mut in_text = false;
        loop {
            match reader.read_event().unwrap() {
                quick_xml::events::Event::Start(e) => match e.name().as_ref() {
                    b"w:p" => paragraphs += 1,
                    b"w:t" => in_text = true,
                    _ => {}
                },
                quick_xml::events::Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
                quick_xml::events::Event::Text(e) if in_text => {
                    texts.push(e.unescape().unwrap().into_owned());
                }
                quick_xml::events::Event::Eof => break,
                _ => {}
            }
        }
        (paragraphs, texts)
    }

    #[test]
    fn test_markdown_export() {
        let file = markdown(&article("AI in Healthcare", "# Title\nBody"));
        assert_eq!(file.filename, "ai_in_healthcare_article.md");
        assert_eq!(file.mime, "text/markdown");
        assert_eq!(file.bytes, b"# Title\nBody");
    }

    #[test]
    fn test_docx_nodes_skip_blank_lines() {
        let doc = DocxDocument::from_article(&article("Notes", "Line one\n\n   \nLine two"));
        assert_eq!(doc.heading_count(), 1);
        assert_eq!(doc.paragraph_count(), 2);
        assert_eq!(doc.nodes()[0], DocxNode::Title("Notes".to_string()));
    }

    #[test]
    fn test_docx_package() {
        let file = docx(&article("AI in Healthcare", "Line one\nLine two")).unwrap();
        assert_eq!(file.filename, "ai_in_healthcare_article.docx");
        assert_eq!(file.mime, DOCX_MIME);

        let xml = read_part(&file.bytes, "word/document.xml");
        let (paragraphs, texts) = parse_body(&xml);
        assert_eq!(paragraphs, 3);
        assert_eq!(texts, ["AI in Healthcare", "Line one", "Line two"]);
        assert_eq!(xml.matches("w:val=\"Title\"").count(), 1);
        assert!(read_part(&file.bytes, "[Content_Types].xml").contains("/word/document.xml"));
    }

    #[test]
    fn test_docx_keeps_markup_literal_and_escapes() {
        let doc = DocxDocument::from_article(&article("R&D", "## Costs & <risks>\n**bold**"));
        assert_eq!(
            doc.nodes()[1],
            DocxNode::Paragraph("## Costs & <risks>".to_string())
        );
        let xml = doc.document_xml().unwrap();
        assert!(xml.contains("R&amp;D"));
        assert!(xml.contains("## Costs &amp; &lt;risks&gt;"));

        let (_, texts) = parse_body(&xml);
        assert_eq!(texts, ["R&D", "## Costs & <risks>", "**bold**"]);
    }

    #[test]
    fn test_docx_drops_characters_xml_forbids() {
        let doc = DocxDocument::from_article(&article("Odd", "bad \u{FFFE} char\u{1}\tend"));
        let xml = doc.document_xml().unwrap();
        assert!(!xml.contains('\u{FFFE}'));
        assert!(!xml.contains('\u{1}'));

        let (paragraphs, texts) = parse_body(&xml);
        assert_eq!(paragraphs, 2);
        assert_eq!(texts[1], "bad  char\tend");
    }
}
