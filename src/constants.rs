//! Physical and numerical constants.

/// Characteristic impedance of free space in ohms, as used for the
/// normalized update coefficients.
pub const FREE_SPACE_IMPEDANCE: f64 = 377.0;

/// Courant number of the lattice. Fixed at the 3D stability limit 1/sqrt(3).
pub const COURANT: f64 = 0.577_350_269_189_625_8;

/// Width parameter of the default dipole (Ricker) pulse.
pub const DIPOLE_WIDTH: f64 = 0.1;
