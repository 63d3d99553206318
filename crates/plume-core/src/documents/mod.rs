//! Brand document loading and chunking.
//!
//! Accepted formats are PDF, plain text and CSV. A CSV file yields one document
//! per row, rendered as `header: value` lines; every document is then split
//! with the [`RecursiveCharacterSplitter`].

mod splitter;

pub use splitter::RecursiveCharacterSplitter;

use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Document processing errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Extension outside pdf, txt and csv.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// PDF text could not be extracted.
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// A supported brand document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Portable Document Format.
    Pdf,
    /// UTF-8 plain text.
    Text,
    /// Comma-separated values with a header row.
    Csv,
}

impl DocumentKind {
    /// Extensions accepted for brand documents.
    pub const EXTENSIONS: [&'static str; 3] = ["pdf", "txt", "csv"];

    /// Maps a file extension (case-insensitive) to a kind.
    pub fn from_extension(ext: &str) -> Result<Self, DocumentError> {
        match ext.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            other => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Determines the kind from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_extension(ext)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pdf => "pdf",
            Self::Text => "txt",
            Self::Csv => "csv",
        })
    }
}

/// Turns brand files into ordered text chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentProcessor {
    splitter: RecursiveCharacterSplitter,
}

impl DocumentProcessor {
    /// A processor using `splitter`.
    pub const fn new(splitter: RecursiveCharacterSplitter) -> Self {
        Self { splitter }
    }

    /// Loads `path` and splits it into chunks.
    ///
    /// Blocking; call from `spawn_blocking` inside async code.
    pub fn process_file(&self, path: &Path) -> Result<Vec<String>, DocumentError> {
        let kind = DocumentKind::from_path(path)?;
        let documents = match kind {
            DocumentKind::Pdf => vec![load_pdf(&std::fs::read(path)?)?],
            DocumentKind::Text => vec![std::fs::read_to_string(path)?],
            DocumentKind::Csv => load_csv(std::fs::File::open(path)?)?,
        };

        let chunks: Vec<String> =
            documents.iter().flat_map(|doc| self.splitter.split_text(doc)).collect();
        debug!(
            path = %path.display(),
            kind = %kind,
            documents = documents.len(),
            chunks = chunks.len(),
            "Processed document"
        );
        Ok(chunks)
    }
}

fn load_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocumentError::Pdf(e.to_string()))
}

fn load_csv(reader: impl std::io::Read) -> Result<Vec<String>, DocumentError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let lines: Vec<String> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{}: {}", header.trim(), value.trim()))
            .collect();
        rows.push(lines.join("\n"));
    }
    Ok(rows)
}
