//! Parallel multi-threaded FDTD engine.
//!
//! Within one curl pass every cell reads only the other field type, so the
//! updated component can be split into disjoint chunks without hazards. The
//! flat layout keeps each `i`-slice contiguous; Rayon hands whole slices to
//! worker threads via `par_chunks_mut`.

use rayon::prelude::*;

use crate::arrays::{Field3D, VectorField3D};
use crate::fdtd::engine_impl::{e_interior, CellUpdate, EngineImpl, E_STENCILS, H_STENCILS};
use crate::fdtd::lattice::FieldLattice;

/// Parallel multi-threaded FDTD engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelEngine;

impl ParallelEngine {
    /// Number of worker threads Rayon will use.
    pub fn num_threads() -> usize {
        rayon::current_num_threads()
    }
}

/// Apply `stencil` to `out` over `ranges`, one `i`-slice per task.
fn sweep(
    out: &mut Field3D,
    source: &VectorField3D,
    decay: &Field3D,
    curl: &Field3D,
    stencil: CellUpdate,
    ranges: [(usize, usize); 3],
) {
    let shape = out.dimensions();
    let [(i0, i1), (j0, j1), (k0, k1)] = ranges;

    out.as_mut_slice()
        .par_chunks_mut(shape.slice_len())
        .enumerate()
        .skip(i0)
        .take(i1.saturating_sub(i0))
        .for_each(|(i, cells)| {
            for j in j0..j1 {
                for k in k0..k1 {
                    let idx = j * shape.nz + k;
                    cells[idx] = stencil(cells[idx], source, decay, curl, i, j, k);
                }
            }
        });
}

impl EngineImpl for ParallelEngine {
    fn update_h(&self, lattice: &mut FieldLattice) {
        let FieldLattice {
            e_field,
            h_field,
            h_coeff,
            ..
        } = lattice;

        for axis in 0..3 {
            let out = h_field.component_mut(axis);
            let shape = out.dimensions();
            let ranges = [(0, shape.nx), (0, shape.ny), (0, shape.nz)];
            sweep(
                out,
                e_field,
                &h_coeff.decay[axis],
                &h_coeff.curl[axis],
                H_STENCILS[axis],
                ranges,
            );
        }
    }

    fn update_e(&self, lattice: &mut FieldLattice) {
        let FieldLattice {
            e_field,
            h_field,
            e_coeff,
            ..
        } = lattice;

        for axis in 0..3 {
            let out = e_field.component_mut(axis);
            let ranges = e_interior(out.dimensions(), axis);
            sweep(
                out,
                h_field,
                &e_coeff.decay[axis],
                &e_coeff.curl[axis],
                E_STENCILS[axis],
                ranges,
            );
        }
    }
}
