use std::str::FromStr;

use anyhow::{Context, Result};

use crate::layout::LayoutConfig;

const DEFAULT_MAX_ASSET_BYTES: usize = 15 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every variable is optional; parse failures abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub asset_fetch_timeout_secs: u64,
    pub max_asset_bytes: usize,
    pub watermark_text: String,
    pub cover_attribution: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let layout = LayoutConfig::default();
        Ok(Config {
            port: parse_or("PORT", std::env::var("PORT").ok(), 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            asset_fetch_timeout_secs: parse_or(
                "ASSET_FETCH_TIMEOUT_SECS",
                std::env::var("ASSET_FETCH_TIMEOUT_SECS").ok(),
                20,
            )?,
            max_asset_bytes: parse_or(
                "MAX_ASSET_BYTES",
                std::env::var("MAX_ASSET_BYTES").ok(),
                DEFAULT_MAX_ASSET_BYTES,
            )?,
            watermark_text: std::env::var("WATERMARK_TEXT").unwrap_or(layout.watermark.text),
            cover_attribution: std::env::var("COVER_ATTRIBUTION").unwrap_or(layout.attribution),
        })
    }

    /// Layout knobs every build starts from.
    pub fn layout_defaults(&self) -> LayoutConfig {
        let mut layout = LayoutConfig::default();
        layout.watermark.text = self.watermark_text.clone();
        layout.attribution = self.cover_attribution.clone();
        layout
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{value}'")),
    }
}
