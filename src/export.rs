use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::Document;

pub const EXPORT_EXTENSION: &str = "json";

/// `invoice-<number>.json`, with path separators in the number flattened to `-`.
pub fn export_filename(invoice_number: &str) -> String {
    let safe: String = invoice_number
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("invoice-{}.{}", safe, EXPORT_EXTENSION)
}

pub fn to_json(document: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parses an exported document and recomputes its derived values.
pub fn from_json(text: &str) -> Result<Document> {
    let mut document: Document = serde_json::from_str(text)?;
    document.normalize();
    Ok(document)
}

pub fn load(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)?;
    let document = from_json(&content)?;
    tracing::debug!(path = %path.display(), items = document.items().len(), "loaded invoice");
    Ok(document)
}

// ==========================================
// Save targets
// ==========================================

/// Receives exported bytes. Saving is fire-and-forget: nothing is reported back.
pub trait FileSink {
    fn save(&mut self, bytes: &[u8], filename: &str);
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            tracing::error!(dir = %parent.display(), error = %e, "creating output directory failed");
            println!("❌ Error: Failed to create {}: {}", parent.display(), e);
            return;
        }
    }
    match fs::write(path, bytes) {
        Ok(()) => {
            tracing::info!(path = %path.display(), bytes = bytes.len(), "invoice saved");
            println!("✅ Saved: {}", path.display());
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "saving invoice failed");
            println!("❌ Error: Failed to save {}: {}", path.display(), e);
        }
    }
}

/// Writes every export straight into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn save(&mut self, bytes: &[u8], filename: &str) {
        write_file(&self.dir.join(filename), bytes);
    }
}

/// Asks for the destination with the native save dialog.
#[derive(Debug, Clone)]
pub struct DialogSink {
    start_dir: PathBuf,
}

impl DialogSink {
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        DialogSink {
            start_dir: start_dir.into(),
        }
    }
}

impl FileSink for DialogSink {
    fn save(&mut self, bytes: &[u8], filename: &str) {
        println!("📂 Opening save dialog...");
        let picked = rfd::FileDialog::new()
            .set_title("Save Invoice")
            .set_directory(&self.start_dir)
            .set_file_name(filename)
            .add_filter("JSON", &[EXPORT_EXTENSION])
            .save_file();

        match picked {
            Some(path) => write_file(&path, bytes),
            None => {
                tracing::debug!(filename, "save dialog cancelled");
                println!("Cancelled");
            }
        }
    }
}
