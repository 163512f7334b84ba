//! Build pipeline — request in, laid-out book out.
//!
//! # Flow
//! 1. Resolve the effective `LayoutConfig` and validate it (fail fast, before any I/O).
//! 2. Load image bytes for the cover and illustrations (async, may hit the network).
//! 3. Inside `spawn_blocking`: probe images, normalize content, lay out the document.
//!
//! A build is atomic: the caller gets the complete book or one error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::build::assets::{
    load_source, resolve_loaded, AssetError, AssetFetcher, ImageResource, ImageSource,
};
use crate::content::{normalize, NormalizerOptions};
use crate::errors::AppError;
use crate::layout::{
    estimate, lay_out, Color, ContentMeasure, Document, Illustration, IllustrationPosition,
    LayoutConfig, LayoutReport, LengthClass, Page, PaginationHints,
};

const COVER_RESOURCE_ID: &str = "cover";

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct IllustrationRequest {
    pub id: String,
    /// 1-based; 0 targets the front matter.
    pub target_chapter_index: usize,
    pub position: IllustrationPosition,
    pub image: ImageSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatermarkOverride {
    pub enabled: Option<bool>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildRequest {
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// `#rrggbb`; used by the flat cover.
    pub background_color: Option<String>,
    pub desired_page_count: Option<u32>,
    pub length_class: Option<LengthClass>,
    pub content: String,
    pub cover_image: Option<ImageSource>,
    #[serde(default)]
    pub illustrations: Vec<IllustrationRequest>,
    /// Replaces the server's layout defaults when present.
    pub layout: Option<LayoutConfig>,
    pub watermark: Option<WatermarkOverride>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuiltBook {
    pub build_id: Uuid,
    pub built_at: DateTime<Utc>,
    pub title: String,
    pub page_count: usize,
    pub pages: Vec<Page>,
    pub hints: PaginationHints,
    pub report: LayoutReport,
    pub resources: Vec<ImageResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateRequest {
    pub content: String,
    pub desired_page_count: Option<u32>,
    pub length_class: Option<LengthClass>,
    pub layout: Option<LayoutConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EstimateResponse {
    pub block_count: usize,
    pub word_count: u32,
    pub hints: PaginationHints,
}

/// Server-side defaults every build starts from.
#[derive(Debug, Clone)]
pub struct BuildDefaults {
    pub layout: LayoutConfig,
    pub max_asset_bytes: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

fn effective_config(
    layout: Option<LayoutConfig>,
    watermark: Option<&WatermarkOverride>,
    defaults: &LayoutConfig,
) -> Result<LayoutConfig, AppError> {
    let mut config = match layout {
        // Operator-level text survives a per-request layout.
        Some(mut layout) => {
            layout.watermark.text = defaults.watermark.text.clone();
            layout.attribution = defaults.attribution.clone();
            layout
        }
        None => defaults.clone(),
    };
    if let Some(watermark) = watermark {
        if let Some(enabled) = watermark.enabled {
            config.watermark.enabled = enabled;
        }
        if let Some(text) = &watermark.text {
            config.watermark.text = text.clone();
        }
    }
    config.validate()?;
    Ok(config)
}

fn background_color(raw: Option<&str>) -> Color {
    match raw {
        None => Color::WHITE,
        Some(hex) => Color::from_hex(hex).unwrap_or_else(|| {
            warn!(value = hex, "Unparseable background color, using white");
            Color::WHITE
        }),
    }
}

struct LoadedAssets {
    cover: Option<Result<Vec<u8>, AssetError>>,
    illustrations: Vec<(IllustrationRequest, Result<Vec<u8>, AssetError>)>,
}

async fn load_assets(
    cover: Option<&ImageSource>,
    illustrations: Vec<IllustrationRequest>,
    fetcher: &dyn AssetFetcher,
    max_bytes: usize,
) -> LoadedAssets {
    let cover = match cover {
        Some(source) => Some(load_source(source, fetcher, max_bytes).await),
        None => None,
    };
    let mut loaded = Vec::with_capacity(illustrations.len());
    for request in illustrations {
        let bytes = load_source(&request.image, fetcher, max_bytes).await;
        loaded.push((request, bytes));
    }
    LoadedAssets {
        cover,
        illustrations: loaded,
    }
}

/// Runs a full build. Only an invalid layout configuration fails it.
pub async fn build_book(
    request: BuildRequest,
    fetcher: &dyn AssetFetcher,
    defaults: &BuildDefaults,
) -> Result<BuiltBook, AppError> {
    let config = effective_config(
        request.layout.clone(),
        request.watermark.as_ref(),
        &defaults.layout,
    )?;

    info!(
        title = %request.title,
        content_chars = request.content.len(),
        illustrations = request.illustrations.len(),
        "Starting book build"
    );

    let BuildRequest {
        title,
        author,
        background_color: raw_color,
        desired_page_count,
        length_class,
        content,
        cover_image,
        illustrations,
        ..
    } = request;

    let loaded = load_assets(
        cover_image.as_ref(),
        illustrations,
        fetcher,
        defaults.max_asset_bytes,
    )
    .await;
    let background = background_color(raw_color.as_deref());

    // CPU-bound: image decoding, normalization and pagination.
    let (document, resources) = tokio::task::spawn_blocking(move || {
        let mut resources = Vec::new();

        let cover_image = loaded.cover.map(|bytes| {
            let resolved = resolve_loaded(COVER_RESOURCE_ID, bytes);
            resources.extend(resolved.resource);
            resolved.asset
        });

        let illustrations: Vec<Illustration> = loaded
            .illustrations
            .into_iter()
            .enumerate()
            .map(|(i, (request, bytes))| {
                let resolved = resolve_loaded(&format!("illustration-{i}"), bytes);
                resources.extend(resolved.resource);
                Illustration {
                    id: request.id,
                    target_chapter_index: request.target_chapter_index,
                    position: request.position,
                    image: resolved.asset,
                }
            })
            .collect();

        let document = Document {
            title,
            author,
            background_color: background,
            desired_page_count,
            length_class,
            blocks: normalize(&content, &NormalizerOptions::default()),
            cover_image,
            illustrations,
        };
        (document, resources)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed preparing build: {e}")))?;

    let title = document.title.clone();
    let book = tokio::task::spawn_blocking(move || lay_out(&document, &config))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))??;

    let built = BuiltBook {
        build_id: Uuid::new_v4(),
        built_at: Utc::now(),
        title,
        page_count: book.pages.len(),
        pages: book.pages,
        hints: book.hints,
        report: book.report,
        resources,
    };

    info!(
        build_id = %built.build_id,
        pages = built.page_count,
        target = built.report.target_page_count,
        recovered_blocks = built.report.recovered_blocks,
        placeholders = built.report.placeholder_illustrations,
        "Book build complete"
    );
    Ok(built)
}

/// Pagination hints for content without building it.
pub async fn estimate_book(
    request: EstimateRequest,
    defaults: &BuildDefaults,
) -> Result<EstimateResponse, AppError> {
    let config = effective_config(request.layout, None, &defaults.layout)?;

    tokio::task::spawn_blocking(move || {
        let blocks = normalize(&request.content, &NormalizerOptions::default());
        let measure = ContentMeasure::of(&blocks, &config);
        EstimateResponse {
            block_count: blocks.len(),
            word_count: measure.words,
            hints: estimate(
                measure,
                request.desired_page_count,
                request.length_class,
                &config,
            ),
        }
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in estimate: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::assets::tests::{png_fixture, StaticFetcher};
    use crate::layout::geometry::Margins;
    use crate::layout::page::DrawOp;
    use base64::Engine;

    fn make_defaults() -> BuildDefaults {
        BuildDefaults {
            layout: LayoutConfig::default(),
            max_asset_bytes: 1 << 20,
        }
    }

    fn make_request(content: &str) -> BuildRequest {
        BuildRequest {
            title: "The Tide".to_string(),
            author: "R. Author".to_string(),
            background_color: Some("#203040".to_string()),
            desired_page_count: None,
            length_class: None,
            content: content.to_string(),
            cover_image: None,
            illustrations: vec![],
            layout: None,
            watermark: None,
        }
    }

    fn inline_png() -> ImageSource {
        ImageSource::Inline {
            data_base64: base64::engine::general_purpose::STANDARD.encode(png_fixture(40, 30)),
        }
    }

    #[tokio::test]
    async fn test_build_short_story() {
        let fetcher = StaticFetcher { bytes: None };
        let built = build_book(
            make_request("# Chapter 1\n\nShort text."),
            &fetcher,
            &make_defaults(),
        )
        .await
        .unwrap();

        assert_eq!(built.page_count, 2);
        assert_eq!(built.report.block_count, 2);
        assert!(built.resources.is_empty());
        assert!(matches!(
            built.pages[0].ops()[0],
            DrawOp::FillRect { color, .. } if color == Color::rgb(0x20, 0x30, 0x40)
        ));
    }

    #[tokio::test]
    async fn test_build_with_cover_and_illustrations() {
        let fetcher = StaticFetcher {
            bytes: Some(png_fixture(20, 20)),
        };
        let mut request = make_request("# Chapter 1\n\nOne.\n\n# Chapter 2\n\nTwo.");
        request.cover_image = Some(inline_png());
        request.illustrations = vec![
            IllustrationRequest {
                id: "storm".to_string(),
                target_chapter_index: 2,
                position: IllustrationPosition::Top,
                image: ImageSource::Remote {
                    url: "https://img.example/storm.png".to_string(),
                },
            },
            IllustrationRequest {
                id: "broken".to_string(),
                target_chapter_index: 1,
                position: IllustrationPosition::Bottom,
                image: ImageSource::Inline {
                    data_base64: base64::engine::general_purpose::STANDARD.encode(b"not a png"),
                },
            },
        ];

        let built = build_book(request, &fetcher, &make_defaults()).await.unwrap();

        assert!(matches!(built.pages[0].ops()[0], DrawOp::Image { .. }));
        assert_eq!(built.report.illustration_pages, 2);
        assert_eq!(built.report.placeholder_illustrations, 1);
        let ids: Vec<&str> = built.resources.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["cover", "illustration-0"]);
    }

    #[tokio::test]
    async fn test_corrupt_cover_degrades_to_flat_cover() {
        let fetcher = StaticFetcher { bytes: None };
        let mut request = make_request("Just a paragraph.");
        request.cover_image = Some(ImageSource::Remote {
            url: "https://img.example/missing.png".to_string(),
        });
        let built = build_book(request, &fetcher, &make_defaults()).await.unwrap();

        assert!(built.pages[0].ops()[0].is_fill());
        assert!(built.resources.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_margins_fail_before_layout() {
        let fetcher = StaticFetcher { bytes: None };
        let mut request = make_request("# Chapter 1\n\nText.");
        request.layout = Some(LayoutConfig {
            margins: Margins {
                top: 396.0,
                bottom: 396.0,
                ..Margins::default()
            },
            ..LayoutConfig::default()
        });
        let err = build_book(request, &fetcher, &make_defaults()).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_watermark_override_applies() {
        let fetcher = StaticFetcher { bytes: None };
        let mut request = make_request("# Chapter 1\n\nText.");
        request.watermark = Some(WatermarkOverride {
            enabled: Some(true),
            text: Some("SAMPLE".to_string()),
        });
        let built = build_book(request, &fetcher, &make_defaults()).await.unwrap();
        assert_eq!(
            built.pages[1].ops()[1].as_text().map(|r| r.text.as_str()),
            Some("SAMPLE")
        );
    }

    #[test]
    fn test_request_layout_keeps_operator_text() {
        let mut defaults = LayoutConfig::default();
        defaults.watermark.text = "DRAFT COPY".to_string();
        defaults.attribution = "Printed by Lantern Press".to_string();
        let requested = LayoutConfig {
            body_size_pt: 12.0,
            ..LayoutConfig::default()
        };

        let config = effective_config(Some(requested.clone()), None, &defaults).unwrap();
        assert_eq!(config.body_size_pt, 12.0);
        assert_eq!(config.watermark.text, "DRAFT COPY");
        assert_eq!(config.attribution, "Printed by Lantern Press");

        let overridden = WatermarkOverride {
            enabled: Some(true),
            text: Some("SAMPLE".to_string()),
        };
        let config = effective_config(Some(requested), Some(&overridden), &defaults).unwrap();
        assert!(config.watermark.enabled);
        assert_eq!(config.watermark.text, "SAMPLE");
        assert_eq!(config.attribution, "Printed by Lantern Press");
    }

    #[tokio::test]
    async fn test_empty_content_builds() {
        let fetcher = StaticFetcher { bytes: None };
        let built = build_book(make_request("   "), &fetcher, &make_defaults()).await.unwrap();
        assert_eq!(built.page_count, 2);
    }

    #[test]
    fn test_bad_background_color_falls_back() {
        assert_eq!(background_color(Some("not-a-color")), Color::WHITE);
        assert_eq!(background_color(None), Color::WHITE);
        assert_eq!(background_color(Some("#000000")), Color::rgb(0, 0, 0));
    }

    #[tokio::test]
    async fn test_estimate_uses_length_class() {
        let response = estimate_book(
            EstimateRequest {
                content: "# Chapter 1\n\nA little text.".to_string(),
                desired_page_count: None,
                length_class: Some(LengthClass::Medium),
                layout: None,
            },
            &make_defaults(),
        )
        .await
        .unwrap();
        assert_eq!(response.block_count, 2);
        assert_eq!(response.hints.target_page_count, 16);
        assert_eq!(response.word_count, 5);
    }
}
