//! Periodic telemetry: the sampler publishes, the renderer and console read.

pub mod cell;
pub mod render;
pub mod sampler;

pub use cell::SnapshotCell;
pub use render::{render_status, RenderKey, StatusLine, StatusRenderer, StatusSink, StatusView};
pub use sampler::Sampler;
