use crate::{ExtractError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the inflated main document part.
pub const MAX_DOCUMENT_XML_BYTES: u64 = 16 * 1024 * 1024;

fn failure(e: impl std::fmt::Display) -> ExtractError {
    ExtractError::ExtractionFailure(format!("Failed to read Word document: {e}"))
}

/// Text runs of the main document part. Paragraph and line breaks become
/// newlines, tabs become spaces.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    extract_with_limit(bytes, MAX_DOCUMENT_XML_BYTES)
}

pub(crate) fn extract_with_limit(bytes: &[u8], max_xml_bytes: u64) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(failure)?;
    let part = archive.by_name(DOCUMENT_PART).map_err(failure)?;
    if part.size() > max_xml_bytes {
        return Err(too_large(max_xml_bytes));
    }

    // The declared size can lie; never inflate past the limit
    let mut raw = Vec::new();
    part.take(max_xml_bytes + 1).read_to_end(&mut raw).map_err(failure)?;
    if raw.len() as u64 > max_xml_bytes {
        return Err(too_large(max_xml_bytes));
    }

    let xml = String::from_utf8(raw).map_err(failure)?;
    document_text(&xml)
}

fn too_large(limit: u64) -> ExtractError {
    ExtractError::ExtractionFailure(format!("Word document body exceeds {limit} bytes"))
}

fn document_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(failure)? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:br" | b"w:cr" | b"w:p" => out.push('\n'),
                b"w:tab" => out.push(' '),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape().map_err(failure)?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
            .collect();
        docx_with_body(&body)
    }

    #[test]
    fn test_paragraphs_tabs_and_breaks() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Skills:</w:t><w:tab/><w:t>Rust</w:t><w:br/><w:t>SQL &amp; Python</w:t></w:r></w:p>\
             <w:p><w:r><w:instrText>PAGE</w:instrText><w:t>Casablanca</w:t></w:r></w:p>",
        );
        let text = extract_docx_text(&bytes).unwrap();
        assert_eq!(text, "Skills: Rust\nSQL & Python\nCasablanca\n");
    }

    #[test]
    fn test_missing_document_part() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            extract_docx_text(&bytes),
            Err(ExtractError::ExtractionFailure(_))
        ));
    }

    #[test]
    fn test_oversized_body_is_rejected() {
        let filler = "a".repeat(64 * 1024);
        let bytes = docx_with_paragraphs(&[filler.as_str()]);
        assert!(bytes.len() < 8 * 1024);

        let err = extract_with_limit(&bytes, 4 * 1024).unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailure(ref m) if m.contains("exceeds")));

        let text = extract_with_limit(&bytes, MAX_DOCUMENT_XML_BYTES).unwrap();
        assert_eq!(text.trim_end().len(), filler.len());
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            extract_docx_text(b"plain text"),
            Err(ExtractError::ExtractionFailure(_))
        ));
    }
}
