//! Boundary conditions and sources plugged into the step cycle.

mod extension_trait;
mod mur_abc;
mod point_source;

pub use extension_trait::{BoundaryCondition, Source};
pub use mur_abc::{Face, FirstOrderAbc};
pub use point_source::{DipoleSource, HarmonicSource};
