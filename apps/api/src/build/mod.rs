// Book builds: asset resolution, the build pipeline and its HTTP handlers.

pub mod assets;
pub mod handlers;
pub mod pipeline;
