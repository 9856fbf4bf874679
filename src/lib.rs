//! # yee3d
//!
//! Finite-difference time-domain simulation of electromagnetic waves on a 3D
//! Yee lattice.
//!
//! - [`fdtd::FieldLattice`] holds the six staggered field components, their
//!   update coefficients and the time index.
//! - [`fdtd::Simulation`] drives the leapfrog cycle with a sequential or a
//!   Rayon engine, registered sources and boundary conditions.
//! - [`extensions`] provides the first-order Mur absorbing boundary and the
//!   dipole/harmonic point sources.
//! - [`output::FieldSliceExporter`] records a field plane over time and
//!   renders it as an animated GIF.
//! - [`config::render_request`] turns a JSON request into GIF bytes.
//!
//! ```no_run
//! use yee3d::fdtd::{FieldComponent, Simulation};
//! use yee3d::output::FieldSliceExporter;
//!
//! # fn main() -> yee3d::Result<()> {
//! let mut sim = Simulation::with_defaults(40, 40, 40, 120)?;
//! let mut exporter = FieldSliceExporter::new(FieldComponent::Hx, 0, 19);
//! exporter.record(&mut sim, 120)?;
//! exporter.write_gif("hx.gif")?;
//! # Ok(())
//! # }
//! ```

pub mod arrays;
pub mod config;
pub mod constants;
pub mod error;
pub mod extensions;
pub mod fdtd;
pub mod output;

pub use error::{Error, Result};
