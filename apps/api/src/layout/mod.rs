// Book layout: page geometry, pagination state machine, cover, watermark and numbering.
// Pagination is CPU-bound and synchronous; async callers run it inside tokio::task::spawn_blocking.

pub mod cover;
pub mod document;
pub mod engine;
pub mod estimator;
pub mod font_metrics;
pub mod geometry;
pub mod illustration;
pub mod numbering;
pub mod page;
pub mod paginator;
pub mod recovery;
pub mod scheduler;
pub mod watermark;

// Re-export the public API consumed by the build pipeline and handlers.
pub use document::{Document, Illustration, IllustrationPosition, ImageAsset};
pub use engine::{lay_out, LaidOutBook, LayoutReport};
pub use estimator::{estimate, ContentMeasure, LengthClass, PaginationHints};
pub use geometry::{LayoutConfig, LayoutError};
pub use page::{Color, Page};
