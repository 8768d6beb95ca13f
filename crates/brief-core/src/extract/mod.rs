mod document;
mod table;
mod web;

pub use web::fetch_url;

use crate::ExtractError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const PREVIEW_CHARS: usize = 500;

/// File types the extractors understand, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Txt,
    Pdf,
    Docx,
    Doc,
    Xlsx,
    Xls,
    Csv,
}

impl Extension {
    pub const ALL: [Extension; 7] = [
        Extension::Txt,
        Extension::Pdf,
        Extension::Docx,
        Extension::Doc,
        Extension::Xlsx,
        Extension::Xls,
        Extension::Csv,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Extension::Txt => "txt",
            Extension::Pdf => "pdf",
            Extension::Docx => "docx",
            Extension::Doc => "doc",
            Extension::Xlsx => "xlsx",
            Extension::Xls => "xls",
            Extension::Csv => "csv",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ExtractError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Extension {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Extension::ALL
            .into_iter()
            .find(|ext| ext.as_str() == normalized)
            .ok_or_else(|| ExtractError::UnsupportedFormat(s.trim().to_string()))
    }
}

/// Extract plain text from raw file bytes.
pub fn extract(bytes: &[u8], ext: Extension) -> Result<String, ExtractError> {
    let text = match ext {
        Extension::Txt => String::from_utf8(bytes.to_vec())
            .map_err(|e| ExtractError::Extraction(format!("text is not valid UTF-8: {e}")))?,
        Extension::Pdf => document::pdf_text(bytes)?,
        Extension::Docx | Extension::Doc => document::word_text(bytes)?,
        Extension::Xlsx | Extension::Xls => table::workbook_text(bytes)?,
        Extension::Csv => table::csv_text(bytes)?,
    };
    tracing::debug!(
        format = %ext,
        bytes = bytes.len(),
        chars = text.chars().count(),
        "text extracted"
    );
    Ok(text)
}

pub fn extract_path(path: &Path) -> Result<String, ExtractError> {
    let ext = Extension::from_path(path)?;
    let bytes = std::fs::read(path)
        .map_err(|e| ExtractError::Extraction(format!("{}: {e}", path.display())))?;
    extract(&bytes, ext)
}

/// The first `PREVIEW_CHARS` characters, with `...` appended when truncated.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
