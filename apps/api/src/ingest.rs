//! Document ingestion: uploaded bytes → raw resume text.
//!
//! Only `.pdf` and `.txt` are accepted. PDF bytes go through a temporary file
//! that is removed when the handle drops, on success, error, or panic alike.

use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Case-insensitive extension check against the allow-list.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Extracts the text of an uploaded document.
///
/// Returns `Ok(None)` ("no content") for extensions outside the allow-list and
/// for documents whose text is blank.
pub async fn extract_text(filename: &str, bytes: Vec<u8>) -> Result<Option<String>, IngestError> {
    let Some(kind) = DocumentKind::from_filename(filename) else {
        info!("Rejected upload '{filename}': unsupported extension");
        return Ok(None);
    };

    let text = match kind {
        DocumentKind::Text => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || extract_pdf(&bytes))
            .await
            .map_err(|e| IngestError::Worker(e.to_string()))??,
    };

    if text.trim().is_empty() {
        info!("Upload '{filename}' produced no text");
        return Ok(None);
    }
    debug!("Upload '{filename}' extracted {} chars", text.chars().count());
    Ok(Some(text))
}

fn extract_pdf(bytes: &[u8]) -> Result<String, IngestError> {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    pdf_extract::extract_text(file.path()).map_err(|e| IngestError::Pdf(e.to_string()))
}
