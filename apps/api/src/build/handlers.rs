use axum::{extract::State, Json};

use crate::build::pipeline::{
    build_book, estimate_book, BuildDefaults, BuildRequest, BuiltBook, EstimateRequest,
    EstimateResponse,
};
use crate::errors::AppError;
use crate::state::AppState;

fn defaults(state: &AppState) -> BuildDefaults {
    BuildDefaults {
        layout: state.layout_defaults.clone(),
        max_asset_bytes: state.config.max_asset_bytes,
    }
}

/// POST /api/v1/books/build
pub async fn handle_build(
    State(state): State<AppState>,
    Json(req): Json<BuildRequest>,
) -> Result<Json<BuiltBook>, AppError> {
    if req.illustrations.iter().any(|i| i.id.trim().is_empty()) {
        return Err(AppError::Validation(
            "every illustration needs a non-empty id".to_string(),
        ));
    }
    let book = build_book(req, state.fetcher.as_ref(), &defaults(&state)).await?;
    Ok(Json(book))
}

/// POST /api/v1/books/estimate
pub async fn handle_estimate(
    State(state): State<AppState>,
    Json(req): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    let response = estimate_book(req, &defaults(&state)).await?;
    Ok(Json(response))
}
