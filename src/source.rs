use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::info;
use zip::ZipArchive;

const DOCUMENT_XML: &str = "word/document.xml";

/// Read paragraphs from a local path or an http(s) URL.
pub async fn load(input: &str) -> Result<Vec<String>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let bytes = download(input).await?;
        read_docx(Cursor::new(bytes))
    } else {
        read_paragraphs(Path::new(input))
    }
}

pub async fn download(url: &str) -> Result<Vec<u8>> {
    info!("Downloading {}", url);
    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()
        .with_context(|| format!("Bad response from {}", url))?;
    let bytes = response.bytes().await.context("Failed to read response body")?;
    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

/// `.docx` files are read as Word documents, anything else as text with one paragraph per line.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>> {
    let is_docx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));

    let paragraphs = if is_docx {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        read_docx(file).with_context(|| format!("Failed to read DOCX {}", path.display()))?
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        paragraphs_from_text(&text)
    };

    info!("Read {} paragraphs from {}", paragraphs.len(), path.display());
    Ok(paragraphs)
}

pub fn read_docx<R: Read + Seek>(reader: R) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(reader).context("Failed to open DOCX as ZIP")?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_XML)
        .with_context(|| format!("DOCX has no {}", DOCUMENT_XML))?
        .read_to_string(&mut xml)
        .with_context(|| format!("Failed to read {}", DOCUMENT_XML))?;
    paragraphs_from_document_xml(&xml)
}

pub fn paragraphs_from_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text of every top-level body paragraph, trimmed, empties dropped.
/// Table cells and text boxes are skipped.
pub fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut table_depth = 0usize;
    let mut textbox_depth = 0usize;

    loop {
        let outside = table_depth == 0 && textbox_depth == 0;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:txbxContent" => textbox_depth += 1,
                b"w:p" if outside && current.is_none() => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if let Some(p) = current.as_mut().filter(|_| outside) {
                    match e.name().as_ref() {
                        b"w:tab" => p.push('\t'),
                        b"w:br" | b"w:cr" => p.push('\n'),
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) if in_text && outside => {
                if let Some(p) = current.as_mut() {
                    p.push_str(&e.unescape()?);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:txbxContent" => textbox_depth = textbox_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:p" if outside => {
                    if let Some(p) = current.take() {
                        let text = p.trim();
                        if !text.is_empty() {
                            paragraphs.push(text.to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("Malformed document.xml"),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
