use std::sync::Arc;

use crate::build::assets::AssetFetcher;
use crate::config::Config;
use crate::layout::LayoutConfig;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Image fetcher for URL sources. Default: HttpAssetFetcher; tests swap in a stub.
    pub fetcher: Arc<dyn AssetFetcher>,
    /// Layout knobs a build starts from unless the request supplies its own.
    pub layout_defaults: LayoutConfig,
}
