//! Text extraction from auxiliary documents (questionnaires, history forms)
//! that accompany a recording.

use crate::error::{QeegError, Result};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Document kinds recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PlainText,
    Csv,
    Docx,
    Pdf,
    Image,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "txt" | "md" => Some(Self::PlainText),
            "csv" => Some(Self::Csv),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }

    /// Whether text can be extracted from this kind
    pub fn is_supported(self) -> bool {
        matches!(self, Self::PlainText | Self::Csv | Self::Docx)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    /// File name without directories
    pub name: String,
    pub kind: DocumentKind,
    pub text: String,
}

impl ExtractedDocument {
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.text, max_chars)
    }
}

/// First `max_chars` characters of `text`, with `...` appended when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<ExtractedDocument> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let kind = DocumentKind::from_path(path).ok_or_else(|| {
        QeegError::UnsupportedDocument(format!("{}: unrecognized extension", name))
    })?;

    let text = match kind {
        DocumentKind::PlainText => {
            let bytes = std::fs::read(path)?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        DocumentKind::Csv => render_csv(path)?,
        DocumentKind::Docx => read_docx(path)?,
        DocumentKind::Pdf => {
            return Err(QeegError::UnsupportedDocument(format!(
                "{}: PDF text extraction is not available",
                name
            )))
        }
        DocumentKind::Image => {
            return Err(QeegError::UnsupportedDocument(format!(
                "{}: image OCR is not available",
                name
            )))
        }
    };

    log::debug!("Extracted {} characters from {}", text.chars().count(), name);
    Ok(ExtractedDocument { name, kind, text })
}

/// Render a CSV file as a right-aligned text table, header first
fn render_csv(path: &Path) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let mut rows: Vec<Vec<String>> = vec![reader.headers()?.iter().map(String::from).collect()];
    for record in reader.records() {
        rows.push(record?.iter().map(String::from).collect());
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{:>width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect();
    Ok(lines.join("\n"))
}

fn read_docx(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| QeegError::Docx(format!("not a DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| QeegError::Docx(format!("word/document.xml: {}", e)))?
        .read_to_string(&mut xml)?;

    docx_paragraphs(&xml)
}

/// Text runs (`w:t`) of a WordprocessingML body, one line per paragraph
fn docx_paragraphs(xml: &str) -> Result<String> {
    let mut reader = XmlReader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_run_text = true;
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::GeneralRef(e)) if in_run_text => {
                let name = String::from_utf8_lossy(&e);
                match e.resolve_char_ref() {
                    Ok(Some(ch)) => text.push(ch),
                    _ => match quick_xml::escape::resolve_predefined_entity(&name) {
                        Some(resolved) => text.push_str(resolved),
                        None => {
                            log::debug!("Unknown entity &{}; kept verbatim", name);
                            text.push('&');
                            text.push_str(&name);
                            text.push(';');
                        }
                    },
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(QeegError::Docx(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(text)
}
