//! Engine implementation trait.
//!
//! An engine performs the two curl passes of a leapfrog step on a
//! [`FieldLattice`]. The boundary layer of E is never touched here; the
//! controller applies boundary conditions afterwards.
//!
//! The finite-difference stencils live in this module so every engine
//! evaluates exactly the same arithmetic per cell. Engines only differ in how
//! they walk the index space.

use serde::Deserialize;

use crate::arrays::{Dimensions, Field3D, VectorField3D};
use crate::fdtd::basic_engine::BasicEngine;
use crate::fdtd::lattice::FieldLattice;
use crate::fdtd::parallel_engine::ParallelEngine;

/// Core trait that all engine implementations must satisfy.
pub trait EngineImpl: Send + Sync {
    /// Faraday pass: advance every H cell by minus the curl of E.
    fn update_h(&self, lattice: &mut FieldLattice);

    /// Ampère pass: advance interior E cells by the curl of H.
    fn update_e(&self, lattice: &mut FieldLattice);
}

/// Engine selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    /// Single-threaded triple loop
    #[default]
    Basic,
    /// Rayon over contiguous i-slices
    Parallel,
}

/// Engine with compile-time dispatch to the selected implementation.
#[derive(Debug, Clone, Copy)]
pub enum Engine {
    Basic(BasicEngine),
    Parallel(ParallelEngine),
}

impl Engine {
    pub fn new(engine_type: EngineType) -> Self {
        match engine_type {
            EngineType::Basic => Engine::Basic(BasicEngine),
            EngineType::Parallel => Engine::Parallel(ParallelEngine),
        }
    }

    pub fn engine_type(&self) -> EngineType {
        match self {
            Engine::Basic(_) => EngineType::Basic,
            Engine::Parallel(_) => EngineType::Parallel,
        }
    }
}

impl EngineImpl for Engine {
    fn update_h(&self, lattice: &mut FieldLattice) {
        match self {
            Engine::Basic(e) => e.update_h(lattice),
            Engine::Parallel(e) => e.update_h(lattice),
        }
    }

    fn update_e(&self, lattice: &mut FieldLattice) {
        match self {
            Engine::Basic(e) => e.update_e(lattice),
            Engine::Parallel(e) => e.update_e(lattice),
        }
    }
}

/// Inclusive-exclusive index ranges swept by the E pass for component `axis`.
///
/// Along the component's own axis the full extent is swept; along the two
/// transverse axes index 0 and the last index are left to the boundary.
pub(crate) fn e_interior(shape: Dimensions, axis: usize) -> [(usize, usize); 3] {
    let ext = shape.as_array();
    std::array::from_fn(|a| {
        if a == axis {
            (0, ext[a])
        } else {
            (1, ext[a].saturating_sub(1))
        }
    })
}

// Per-cell stencils. `e` and `h` hold the other field type at the previous
// half step; `decay`/`curl` are the coefficients of the updated component.

/// H = decay*H - curl_coeff * (curl E)_x, curl_x E = dEz/dy - dEy/dz.
#[inline]
pub(crate) fn hx_cell(
    old: f32,
    e: &VectorField3D,
    decay: &Field3D,
    curl: &Field3D,
    i: usize,
    j: usize,
    k: usize,
) -> f32 {
    let curl_e =
        (e.z.get(i, j + 1, k) - e.z.get(i, j, k)) - (e.y.get(i, j, k + 1) - e.y.get(i, j, k));
    decay.get(i, j, k) * old - curl.get(i, j, k) * curl_e
}

/// curl_y E = dEx/dz - dEz/dx.
#[inline]
pub(crate) fn hy_cell(
    old: f32,
    e: &VectorField3D,
    decay: &Field3D,
    curl: &Field3D,
    i: usize,
    j: usize,
    k: usize,
) -> f32 {
    let curl_e =
        (e.x.get(i, j, k + 1) - e.x.get(i, j, k)) - (e.z.get(i + 1, j, k) - e.z.get(i, j, k));
    decay.get(i, j, k) * old - curl.get(i, j, k) * curl_e
}

/// curl_z E = dEy/dx - dEx/dy.
#[inline]
pub(crate) fn hz_cell(
    old: f32,
    e: &VectorField3D,
    decay: &Field3D,
    curl: &Field3D,
    i: usize,
    j: usize,
    k: usize,
) -> f32 {
    let curl_e =
        (e.y.get(i + 1, j, k) - e.y.get(i, j, k)) - (e.x.get(i, j + 1, k) - e.x.get(i, j, k));
    decay.get(i, j, k) * old - curl.get(i, j, k) * curl_e
}

/// E = decay*E + curl_coeff * (curl H)_x, curl_x H = dHz/dy - dHy/dz.
#[inline]
pub(crate) fn ex_cell(
    old: f32,
    h: &VectorField3D,
    decay: &Field3D,
    curl: &Field3D,
    i: usize,
    j: usize,
    k: usize,
) -> f32 {
    let curl_h =
        (h.z.get(i, j, k) - h.z.get(i, j - 1, k)) - (h.y.get(i, j, k) - h.y.get(i, j, k - 1));
    decay.get(i, j, k) * old + curl.get(i, j, k) * curl_h
}

/// curl_y H = dHx/dz - dHz/dx.
#[inline]
pub(crate) fn ey_cell(
    old: f32,
    h: &VectorField3D,
    decay: &Field3D,
    curl: &Field3D,
    i: usize,
    j: usize,
    k: usize,
) -> f32 {
    let curl_h =
        (h.x.get(i, j, k) - h.x.get(i, j, k - 1)) - (h.z.get(i, j, k) - h.z.get(i - 1, j, k));
    decay.get(i, j, k) * old + curl.get(i, j, k) * curl_h
}

/// curl_z H = dHy/dx - dHx/dy.
#[inline]
pub(crate) fn ez_cell(
    old: f32,
    h: &VectorField3D,
    decay: &Field3D,
    curl: &Field3D,
    i: usize,
    j: usize,
    k: usize,
) -> f32 {
    let curl_h =
        (h.y.get(i, j, k) - h.y.get(i - 1, j, k)) - (h.x.get(i, j, k) - h.x.get(i, j - 1, k));
    decay.get(i, j, k) * old + curl.get(i, j, k) * curl_h
}

/// Signature shared by the six stencils.
pub(crate) type CellUpdate =
    fn(f32, &VectorField3D, &Field3D, &Field3D, usize, usize, usize) -> f32;

/// Stencils of the H pass, indexed by axis.
pub(crate) const H_STENCILS: [CellUpdate; 3] = [hx_cell, hy_cell, hz_cell];

/// Stencils of the E pass, indexed by axis.
pub(crate) const E_STENCILS: [CellUpdate; 3] = [ex_cell, ey_cell, ez_cell];
