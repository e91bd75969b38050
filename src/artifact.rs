//! No printed invoice layout exists yet; the PDF generator only reports that.

use thiserror::Error;

use crate::editor::DisplayMode;
use crate::model::Document;

pub const PDF_NOT_IMPLEMENTED_NOTICE: &str =
    "PDF generation is not implemented yet. Use Save to export the invoice as JSON.";

#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("{format} generation is not implemented")]
    NotImplemented { format: &'static str },
}

pub trait ArtifactGenerator {
    fn generate(&self, document: &Document, mode: DisplayMode) -> Result<Artifact, ArtifactError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPlaceholder;

impl ArtifactGenerator for PdfPlaceholder {
    fn generate(&self, document: &Document, mode: DisplayMode) -> Result<Artifact, ArtifactError> {
        tracing::warn!(
            invoice = %document.invoice_number,
            ?mode,
            "PDF generation requested but not implemented"
        );
        Err(ArtifactError::NotImplemented { format: "PDF" })
    }
}
