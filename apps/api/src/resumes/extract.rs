//! In-process text extraction for uploaded resumes.

use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(10);

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("could not read DOCX: {0}")]
    Docx(String),

    #[error("text extraction timed out")]
    Timeout,

    #[error("no text found in document")]
    Empty,

    #[error("extraction task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
}

impl ResumeFormat {
    /// Picks the format from the declared content type, falling back to the
    /// file extension when the client sent a generic type.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        match content_type.map(str::to_ascii_lowercase).as_deref() {
            Some("application/pdf") => return Some(ResumeFormat::Pdf),
            Some(DOCX_MIME) => return Some(ResumeFormat::Docx),
            _ => {}
        }
        let extension = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(ResumeFormat::Pdf),
            "docx" => Some(ResumeFormat::Docx),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Docx => DOCX_MIME,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "pdf",
            ResumeFormat::Docx => "docx",
        }
    }
}

/// Extracts plain text on the blocking pool, giving up after ten seconds.
pub async fn extract_text(data: Bytes, format: ResumeFormat) -> Result<String, ExtractError> {
    let task = tokio::task::spawn_blocking(move || match format {
        ResumeFormat::Pdf => extract_pdf(&data),
        ResumeFormat::Docx => extract_docx(&data),
    });

    let text = tokio::time::timeout(EXTRACTION_TIMEOUT, task)
        .await
        .map_err(|_| ExtractError::Timeout)?
        .map_err(|e| ExtractError::Task(e.to_string()))??;

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    debug!("Extracted {} characters from {:?} resume", text.len(), format);
    Ok(text)
}

fn extract_pdf(data: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(data: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(data).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut text = String::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            for run in p.children {
                if let docx_rs::ParagraphChild::Run(run) = run {
                    for piece in run.children {
                        if let docx_rs::RunChild::Text(t) = piece {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// Trims every line and collapses runs of blank lines.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line.trim_start());
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_content_type() {
        assert_eq!(
            ResumeFormat::detect(Some("application/pdf"), None),
            Some(ResumeFormat::Pdf)
        );
        assert_eq!(
            ResumeFormat::detect(Some(DOCX_MIME), Some("cv.bin")),
            Some(ResumeFormat::Docx)
        );
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(
            ResumeFormat::detect(Some("application/octet-stream"), Some("Asha_CV.PDF")),
            Some(ResumeFormat::Pdf)
        );
        assert_eq!(ResumeFormat::detect(None, Some("cv.doc")), None);
        assert_eq!(ResumeFormat::detect(Some("image/png"), Some("scan")), None);
    }

    #[test]
    fn test_normalize_whitespace() {
        let raw = "  Asha Rao  \n\n\n\n  Backend Engineer\n\t\n";
        assert_eq!(normalize_whitespace(raw), "Asha Rao\n\nBackend Engineer");
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_an_error() {
        let result = extract_text(Bytes::from_static(b"not a pdf"), ResumeFormat::Pdf).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_garbage_docx_is_an_error() {
        let result = extract_text(Bytes::from_static(b"PK\x03\x04junk"), ResumeFormat::Docx).await;
        assert!(result.is_err());
    }
}
