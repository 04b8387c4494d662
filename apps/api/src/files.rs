//! Helpers shared by the upload and download endpoints.

use axum::{
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

use crate::errors::AppError;

pub const MB: usize = 1024 * 1024;

/// A file submitted inline as base64, optionally wrapped in a data URI.
#[derive(Debug)]
pub struct DecodedFile {
    /// Mime type from the `data:<mime>;base64,` prefix, when one was given.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl DecodedFile {
    pub fn size_kb(&self) -> i32 {
        i32::try_from(self.bytes.len().div_ceil(1024)).unwrap_or(i32::MAX)
    }
}

/// Decodes `data:<mime>;base64,<payload>` or a bare base64 payload.
pub fn decode_data_uri(input: &str) -> Result<DecodedFile, AppError> {
    let input = input.trim();
    let (mime, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| AppError::Validation("Malformed data URI".into()))?;
            let mime = header
                .split(';')
                .next()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_ascii_lowercase);
            (mime, payload)
        }
        None => (None, input),
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| AppError::Validation("File data is not valid base64".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("File data is empty".into()));
    }
    Ok(DecodedFile { mime, bytes })
}

/// Serves stored bytes for display in the browser.
pub fn inline_file(bytes: Bytes, mime: &str, filename: &str) -> Response {
    let filename: String = filename
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    (
        [
            (CONTENT_TYPE, mime.to_string()),
            (CONTENT_DISPOSITION, format!("inline; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_with_mime() {
        let decoded = decode_data_uri("data:application/pdf;base64,JVBERi0=").unwrap();
        assert_eq!(decoded.mime.as_deref(), Some("application/pdf"));
        assert_eq!(decoded.bytes, b"%PDF-");
    }

    #[test]
    fn test_bare_base64() {
        let decoded = decode_data_uri("aGVs\nbG8=").unwrap();
        assert_eq!(decoded.mime, None);
        assert_eq!(decoded.bytes, b"hello");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("!!!not base64!!!").is_err());
        assert!(decode_data_uri("").is_err());
    }

    #[test]
    fn test_size_rounds_up() {
        let file = DecodedFile {
            mime: None,
            bytes: vec![0; 1025],
        };
        assert_eq!(file.size_kb(), 2);
    }

    #[test]
    fn test_inline_headers() {
        let response = inline_file(Bytes::from_static(b"x"), "application/pdf", "cv\".pdf");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "inline; filename=\"cv.pdf\""
        );
    }
}
