//! Asset resolution — turns caller-supplied image sources into probed resources.
//!
//! Fetching is async and happens before pagination. Probing (format sniffing and a full
//! decode to read dimensions) is CPU-bound and runs with the rest of the build inside
//! `spawn_blocking`. Every failure here degrades to `ImageAsset::Unavailable`; nothing
//! in this module fails a build.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use image::ImageFormat;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::ImageAsset;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid image source: {0}")]
    InvalidSource(String),
}

impl From<reqwest::Error> for AssetError {
    fn from(e: reqwest::Error) -> Self {
        AssetError::Fetch(e.to_string())
    }
}

impl From<base64::DecodeError> for AssetError {
    fn from(e: base64::DecodeError) -> Self {
        AssetError::InvalidSource(format!("bad base64 payload: {e}"))
    }
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// Raw base64 or a `data:image/...;base64,` URI.
    Inline { data_base64: String },
    Remote { url: String },
}

/// An image in the build's resource table, keyed by `id` from `DrawOp::Image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResource {
    pub id: String,
    pub format: String,
    pub width_px: u32,
    pub height_px: u32,
    pub data_base64: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageProbe {
    pub format: String,
    pub width_px: u32,
    pub height_px: u32,
}

/// Result of resolving one image: the layout-facing asset, plus the resource table
/// entry when the image is usable.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub asset: ImageAsset,
    pub resource: Option<ImageResource>,
}

// ────────────────────────────────────────────────────────────────────────────
// Fetching
// ────────────────────────────────────────────────────────────────────────────

/// Swappable so tests never touch the network.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// Fetches images over HTTP with a request timeout and a body size cap.
#[derive(Clone)]
pub struct HttpAssetFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpAssetFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, AssetError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            max_bytes,
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Fetch(format!("{url} returned HTTP {status}")));
        }
        if let Some(length) = response.content_length() {
            let size = usize::try_from(length).unwrap_or(usize::MAX);
            if size > self.max_bytes {
                return Err(AssetError::TooLarge {
                    size,
                    limit: self.max_bytes,
                });
            }
        }

        let body = response.bytes().await?;
        if body.len() > self.max_bytes {
            return Err(AssetError::TooLarge {
                size: body.len(),
                limit: self.max_bytes,
            });
        }
        debug!(url, bytes = body.len(), "Fetched image");
        Ok(body.to_vec())
    }
}

fn decode_inline(data: &str) -> Result<Vec<u8>, AssetError> {
    let payload = match data.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => {
            if !header.contains(";base64") {
                return Err(AssetError::InvalidSource(
                    "data URI is not base64 encoded".to_string(),
                ));
            }
            payload
        }
        _ => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}

/// Loads the raw bytes of a source, enforcing the size cap.
pub async fn load_source(
    source: &ImageSource,
    fetcher: &dyn AssetFetcher,
    max_bytes: usize,
) -> Result<Vec<u8>, AssetError> {
    let bytes = match source {
        ImageSource::Inline { data_base64 } => decode_inline(data_base64)?,
        ImageSource::Remote { url } => {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(AssetError::InvalidSource(format!(
                    "unsupported URL scheme: {url}"
                )));
            }
            fetcher.fetch(url).await?
        }
    };
    if bytes.len() > max_bytes {
        return Err(AssetError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ────────────────────────────────────────────────────────────────────────────
// Probing
// ────────────────────────────────────────────────────────────────────────────

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "png".to_string(),
        ImageFormat::Jpeg => "jpeg".to_string(),
        other => format!("{other:?}").to_lowercase(),
    }
}

/// Sniffs the format and decodes the image to read its dimensions.
pub fn probe_image(bytes: &[u8]) -> Result<ImageProbe, AssetError> {
    if bytes.is_empty() {
        return Err(AssetError::InvalidSource("empty image".to_string()));
    }
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    Ok(ImageProbe {
        format: format_name(format),
        width_px: decoded.width(),
        height_px: decoded.height(),
    })
}

/// Probes loaded bytes. Any failure, from loading or probing, yields an
/// `Unavailable` asset and no resource.
pub fn resolve_loaded(resource_id: &str, loaded: Result<Vec<u8>, AssetError>) -> ResolvedImage {
    let probed = loaded.and_then(|bytes| probe_image(&bytes).map(|probe| (bytes, probe)));
    match probed {
        Ok((bytes, probe)) => ResolvedImage {
            asset: ImageAsset::Available {
                resource_id: resource_id.to_string(),
                format: probe.format.clone(),
                width_px: probe.width_px,
                height_px: probe.height_px,
            },
            resource: Some(ImageResource {
                id: resource_id.to_string(),
                format: probe.format,
                width_px: probe.width_px,
                height_px: probe.height_px,
                data_base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
            }),
        },
        Err(e) => {
            warn!(resource_id, error = %e, "Image unavailable, falling back");
            ResolvedImage {
                asset: ImageAsset::Unavailable {
                    resource_id: resource_id.to_string(),
                    reason: e.to_string(),
                },
                resource: None,
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
