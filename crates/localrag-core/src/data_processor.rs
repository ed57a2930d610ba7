use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::PdfExtractor;
use crate::types::{Document, DocumentKind};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "pdf", "csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Pdf,
    Csv,
    Unsupported,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("txt" | "md" | "markdown") => Self::PlainText,
            Some("pdf") => Self::Pdf,
            Some("csv") => Self::Csv,
            _ => Self::Unsupported,
        }
    }
}

/// Result of reading one file. A bad file is skipped, never fatal.
#[derive(Debug)]
pub enum FileOutcome {
    Docs(Vec<Document>),
    Skip(String),
}

/// PDF text via the poppler `pdftotext` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdftotextExtractor;

impl PdfExtractor for PdftotextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| Error::external("pdftotext", format!("could not run pdftotext (is poppler installed?): {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::external("pdftotext", stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DataFile {
    pub path: String,
    pub bytes: u64,
}

pub struct DataProcessor {
    pdf: Box<dyn PdfExtractor>,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self { pdf: Box::new(PdftotextExtractor) }
    }
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_pdf_extractor(pdf: Box<dyn PdfExtractor>) -> Self { Self { pdf } }

    /// Walk `data_dir` recursively and read every supported file.
    ///
    /// Unsupported extensions are ignored, unreadable or empty files are
    /// logged and skipped. An empty result is not an error here; the index
    /// builder decides what zero documents means.
    pub fn process_directory(&self, data_dir: &Path) -> Vec<Document> {
        let files = list_supported_files(data_dir);
        let mut docs = Vec::new();
        let mut skipped = 0usize;
        for path in &files {
            match self.process_file(path) {
                FileOutcome::Docs(found) => {
                    debug!(path = %path.display(), docs = found.len(), "read file");
                    docs.extend(found);
                }
                FileOutcome::Skip(reason) => {
                    warn!(path = %path.display(), %reason, "skipping file");
                    skipped += 1;
                }
            }
        }
        info!(files = files.len(), skipped, docs = docs.len(), dir = %data_dir.display(), "scanned data directory");
        docs
    }

    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let source = path.to_string_lossy().to_string();
        match FileKind::from_path(path) {
            FileKind::PlainText => match read_text(path) {
                Ok(text) => single(source, text, DocumentKind::Text),
                Err(e) => FileOutcome::Skip(e.to_string()),
            },
            FileKind::Pdf => match self.pdf.extract_text(path) {
                Ok(text) => single(source, text, DocumentKind::Pdf),
                Err(e) => FileOutcome::Skip(e.to_string()),
            },
            FileKind::Csv => match read_csv_rows(path) {
                Ok(rows) if rows.is_empty() => FileOutcome::Skip("no data rows".to_string()),
                Ok(rows) => FileOutcome::Docs(rows),
                Err(e) => FileOutcome::Skip(e.to_string()),
            },
            FileKind::Unsupported => FileOutcome::Skip("unsupported extension".to_string()),
        }
    }
}

fn single(source: String, text: String, kind: DocumentKind) -> FileOutcome {
    let text = text.trim();
    if text.is_empty() {
        return FileOutcome::Skip("no text after trimming".to_string());
    }
    FileOutcome::Docs(vec![Document { source, text: text.to_string(), kind }])
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Each data row becomes `header:value; header:value` with source `<path>#row<n>`.
fn read_csv_rows(path: &Path) -> Result<Vec<Document>> {
    let csv_err = |e: csv::Error| Error::external("csv", format!("{}: {e}", path.display()));
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path).map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let text = headers
            .iter()
            .zip(record.iter())
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join("; ");
        rows.push(Document {
            source: format!("{}#row{}", path.display(), i + 1),
            text,
            kind: DocumentKind::CsvRow,
        });
    }
    Ok(rows)
}

fn list_supported_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| FileKind::from_path(p) != FileKind::Unsupported)
        .collect();
    files.sort();
    files
}

/// Every regular file under `data_dir`, relative path and size, sorted by path.
pub fn list_data_files(data_dir: &Path) -> Vec<DataFile> {
    let mut files: Vec<DataFile> = walkdir::WalkDir::new(data_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(data_dir).unwrap_or(e.path());
            let bytes = e.metadata().map(|m| m.len()).unwrap_or(0);
            DataFile { path: rel.to_string_lossy().to_string(), bytes }
        })
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Copy files into `data_dir` under their base names, accepting only
/// supported extensions. Returns what was saved. A file that already is
/// its destination is kept as is.
pub fn ingest_files(data_dir: &Path, files: &[PathBuf]) -> Result<Vec<DataFile>> {
    fs::create_dir_all(data_dir).map_err(|e| Error::io(data_dir, e))?;
    let mut saved = Vec::new();
    for src in files {
        let Some(name) = src.file_name() else { continue };
        if FileKind::from_path(src) == FileKind::Unsupported {
            warn!(path = %src.display(), "not ingesting unsupported file");
            continue;
        }
        let dest = data_dir.join(name);
        let bytes = if same_file(src, &dest) {
            debug!(path = %dest.display(), "already in data dir, not copying");
            fs::metadata(&dest).map_err(|e| Error::io(&dest, e))?.len()
        } else {
            fs::copy(src, &dest).map_err(|e| Error::io(src, e))?
        };
        saved.push(DataFile { path: name.to_string_lossy().to_string(), bytes });
    }
    if saved.is_empty() {
        return Err(Error::InvalidConfig(
            "no files saved (empty selection or unsupported extensions)".to_string(),
        ));
    }
    Ok(saved)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Remove and recreate a directory.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        fs::remove_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}
