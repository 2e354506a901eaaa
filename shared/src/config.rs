use chrono::{DateTime, NaiveDate, Utc};
use std::env;
use thiserror::Error;

pub const DEFAULT_TABLE_NAME: &str = "bamboo";
pub const DEFAULT_BUCKET_NAME: &str = "bamboo-media";
pub const DEFAULT_SIGNED_URL_EXPIRES_AT: &str = "2030-12-31T23:59:59Z";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("SIGNED_URL_EXPIRES_AT must be RFC 3339 or YYYY-MM-DD, got {0:?}")]
    InvalidExpiry(String),

    #[error("THUMBNAIL_CONVERTER must be `resize` or `imagemagick`, got {0:?}")]
    InvalidConverter(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConverterKind {
    #[default]
    Resize,
    ImageMagick,
}

impl ConverterKind {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "resize" => Ok(ConverterKind::Resize),
            "imagemagick" | "magick" | "convert" => Ok(ConverterKind::ImageMagick),
            _ => Err(ConfigError::InvalidConverter(value.to_string())),
        }
    }
}

/// Runtime settings shared by every lambda.
#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub bucket_name: String,
    /// Fixed expiry of every signed URL handed out.
    pub signed_url_expires_at: DateTime<Utc>,
    pub converter: ConverterKind,
    pub contact_from: Option<String>,
    pub contact_to: Option<String>,
    pub cors_allow_origin: String,
}

/// Accepts RFC 3339 timestamps or a bare date (end of that day, UTC).
pub fn parse_expiry(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|t| t.and_utc())
        .ok_or_else(|| ConfigError::InvalidExpiry(value.to_string()))
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(non_empty)
    }

    /// Build from any key lookup; `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signed_url_expires_at = parse_expiry(
            &lookup("SIGNED_URL_EXPIRES_AT")
                .unwrap_or_else(|| DEFAULT_SIGNED_URL_EXPIRES_AT.to_string()),
        )?;
        let converter = match lookup("THUMBNAIL_CONVERTER") {
            Some(v) => ConverterKind::parse(&v)?,
            None => ConverterKind::default(),
        };

        Ok(Self {
            table_name: lookup("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            bucket_name: lookup("S3_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string()),
            signed_url_expires_at,
            converter,
            contact_from: lookup("CONTACT_FROM_EMAIL"),
            contact_to: lookup("CONTACT_TO_EMAIL"),
            cors_allow_origin: lookup("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }
}
