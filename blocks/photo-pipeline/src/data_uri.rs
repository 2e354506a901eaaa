use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use thiserror::Error;

const MIME_PATTERN: &str = r"data:([a-zA-Z0-9]+/[a-zA-Z0-9\-.+]+).*,.*";
const BASE64_PREFIX_PATTERN: &str = r"^data:[^,]*;base64,";

#[derive(Debug, Error, PartialEq)]
pub enum DataUriError {
    #[error("Image source is not a data URI")]
    NoMatch,

    #[error("Image payload is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("Image payload is empty")]
    Empty,

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

/// A decoded `data:<mime>;base64,<payload>` image.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn parse(source: &str) -> Result<DataUri, DataUriError> {
    let mime = Regex::new(MIME_PATTERN).map_err(|e| DataUriError::Pattern(e.to_string()))?;
    let prefix = Regex::new(BASE64_PREFIX_PATTERN).map_err(|e| DataUriError::Pattern(e.to_string()))?;

    let content_type = mime
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(DataUriError::NoMatch)?;

    let payload = prefix.replace(source, "");
    let bytes = STANDARD
        .decode(payload.trim().as_bytes())
        .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?;
    if bytes.is_empty() {
        return Err(DataUriError::Empty);
    }

    Ok(DataUri { content_type, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_png_data_uri() {
        let encoded = STANDARD.encode([0x89, b'P', b'N', b'G']);
        let uri = parse(&format!("data:image/png;base64,{}", encoded)).unwrap();
        assert_eq!(uri.content_type, "image/png");
        assert_eq!(uri.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn keeps_subtype_punctuation() {
        let encoded = STANDARD.encode(b"<svg/>");
        let uri = parse(&format!("data:image/svg+xml;base64,{}", encoded)).unwrap();
        assert_eq!(uri.content_type, "image/svg+xml");
    }

    #[test]
    fn rejects_plain_strings() {
        assert_eq!(parse("hello"), Err(DataUriError::NoMatch));
        assert_eq!(parse("data:image/png;base64"), Err(DataUriError::NoMatch));
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(matches!(
            parse("data:image/png;base64,***"),
            Err(DataUriError::InvalidBase64(_))
        ));
        assert_eq!(parse("data:image/png;base64,"), Err(DataUriError::Empty));
    }
}
