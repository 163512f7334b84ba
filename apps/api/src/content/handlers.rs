use axum::Json;
use serde::{Deserialize, Serialize};

use crate::content::blocks::{render_blocks, Block};
use crate::content::normalizer::{normalize, NormalizerOptions};
use crate::errors::AppError;

#[derive(Deserialize)]
pub struct NormalizeRequest {
    pub content: String,
    /// Overrides the sentence-split threshold.
    pub max_paragraph_chars: Option<usize>,
}

#[derive(Serialize)]
pub struct NormalizeResponse {
    pub blocks: Vec<Block>,
    pub heading_count: usize,
    pub word_count: usize,
    /// The blocks rendered back to markdown. Normalizing it again is a no-op.
    pub markdown: String,
}

/// POST /api/v1/content/normalize
pub async fn handle_normalize(
    Json(req): Json<NormalizeRequest>,
) -> Result<Json<NormalizeResponse>, AppError> {
    let mut options = NormalizerOptions::default();
    if let Some(max) = req.max_paragraph_chars {
        if max == 0 {
            return Err(AppError::Validation(
                "max_paragraph_chars must be positive".to_string(),
            ));
        }
        options.max_paragraph_chars = max;
    }

    let blocks = tokio::task::spawn_blocking(move || normalize(&req.content, &options))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in normalize: {e}")))?;

    Ok(Json(NormalizeResponse {
        heading_count: blocks.iter().filter(|b| b.kind.is_heading()).count(),
        word_count: blocks.iter().map(Block::word_count).sum(),
        markdown: render_blocks(&blocks),
        blocks,
    }))
}
