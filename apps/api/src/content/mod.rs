// Content normalization: raw generated prose -> ordered Block sequence.

pub mod blocks;
pub mod handlers;
pub mod normalizer;

pub use normalizer::{normalize, NormalizerOptions};
