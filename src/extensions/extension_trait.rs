//! Extension traits for the FDTD update cycle.
//!
//! Boundary conditions and sources hook into each step after the curl
//! passes. The update cycle of one step is:
//! 1. Advance the time index
//! 2. H-field update: H = Da*H - Db*curl(E)
//! 3. E-field update (interior): E = Ca*E + Cb*curl(H)
//! 4. [`Source::update`] for every registered source
//! 5. [`BoundaryCondition::update`] for every registered boundary, in
//!    registration order
//!
//! Extensions never hold a reference to the lattice. Binding records the
//! lattice's identity; `update` receives the lattice explicitly and fails
//! with [`Error::NotBound`](crate::Error::NotBound) when the binding is
//! missing, stale, or belongs to another lattice.

use crate::fdtd::FieldLattice;
use crate::Result;

/// Boundary treatment for the outer E layer.
///
/// An implementation owns the E cells the interior pass skips. It may
/// mutate its own state and those boundary cells, never the coefficients.
pub trait BoundaryCondition: Send {
    /// Name for logging and error messages.
    fn name(&self) -> &str;

    /// Bind to `lattice`, allocating any per-face storage.
    fn bind(&mut self, lattice: &FieldLattice) -> Result<()>;

    /// Drop the binding. Storage is kept until the next bind or drop.
    fn unbind(&mut self);

    /// Whether the boundary is currently bound to `lattice`.
    fn is_bound_to(&self, lattice: &FieldLattice) -> bool;

    /// Apply the boundary update for the current step.
    fn update(&mut self, lattice: &mut FieldLattice) -> Result<()>;
}

/// Field excitation injected every step.
pub trait Source: Send {
    /// Name for logging and error messages.
    fn name(&self) -> &str;

    /// Bind to `lattice`, validating the target cell.
    fn bind(&mut self, lattice: &FieldLattice) -> Result<()>;

    /// Drop the binding.
    fn unbind(&mut self);

    /// Whether the source is currently bound to `lattice`.
    fn is_bound_to(&self, lattice: &FieldLattice) -> bool;

    /// Inject the excitation for the lattice's current time step.
    fn update(&mut self, lattice: &mut FieldLattice) -> Result<()>;
}
