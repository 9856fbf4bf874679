//! Simulation output.
//!
//! - **Animation**: GIF rendering of a field slice over time via `plotters`

mod animation;

pub use animation::{diverging_color, FieldSliceExporter};
