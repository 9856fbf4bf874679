//! Basic single-threaded FDTD engine implementation.
//!
//! Reference implementation of the curl passes using plain triple-nested
//! loops. It serves as:
//! - A correctness reference for the parallel engine
//! - A clear, readable implementation for understanding the algorithm

use crate::fdtd::engine_impl::{e_interior, EngineImpl, E_STENCILS, H_STENCILS};
use crate::fdtd::lattice::FieldLattice;

/// Basic single-threaded FDTD engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEngine;

impl EngineImpl for BasicEngine {
    /// Update H over each component's full shape:
    /// - Hx = HxH*Hx - HxE * (dEz/dy - dEy/dz)
    /// - Hy = HyH*Hy - HyE * (dEx/dz - dEz/dx)
    /// - Hz = HzH*Hz - HzE * (dEy/dx - dEx/dy)
    fn update_h(&self, lattice: &mut FieldLattice) {
        let FieldLattice {
            e_field,
            h_field,
            h_coeff,
            ..
        } = lattice;

        for axis in 0..3 {
            let stencil = H_STENCILS[axis];
            let decay = &h_coeff.decay[axis];
            let curl = &h_coeff.curl[axis];
            let out = h_field.component_mut(axis);
            let shape = out.dimensions();

            for i in 0..shape.nx {
                for j in 0..shape.ny {
                    for k in 0..shape.nz {
                        let old = out.get(i, j, k);
                        out.set(i, j, k, stencil(old, e_field, decay, curl, i, j, k));
                    }
                }
            }
        }
    }

    /// Update interior E cells:
    /// - Ex = ExE*Ex + ExH * (dHz/dy - dHy/dz)
    /// - Ey = EyE*Ey + EyH * (dHx/dz - dHz/dx)
    /// - Ez = EzE*Ez + EzH * (dHy/dx - dHx/dy)
    fn update_e(&self, lattice: &mut FieldLattice) {
        let FieldLattice {
            e_field,
            h_field,
            e_coeff,
            ..
        } = lattice;

        for axis in 0..3 {
            let stencil = E_STENCILS[axis];
            let decay = &e_coeff.decay[axis];
            let curl = &e_coeff.curl[axis];
            let out = e_field.component_mut(axis);
            let [(i0, i1), (j0, j1), (k0, k1)] = e_interior(out.dimensions(), axis);

            for i in i0..i1 {
                for j in j0..j1 {
                    for k in k0..k1 {
                        let old = out.get(i, j, k);
                        out.set(i, j, k, stencil(old, h_field, decay, curl, i, j, k));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COURANT;
    use crate::fdtd::FieldComponent;
    use approx::assert_relative_eq;

    #[test]
    fn test_update_h_from_single_ez() {
        let mut lattice = FieldLattice::new(5, 5, 5, 10).unwrap();
        lattice.field_mut(FieldComponent::Ez).set(2, 2, 2, 1.0);

        BasicEngine.update_h(&mut lattice);

        let ch = (COURANT / 377.0) as f32;
        let hx = lattice.field(FieldComponent::Hx);
        let hy = lattice.field(FieldComponent::Hy);
        // Hx(2,1,2) sees dEz/dy = +1, Hx(2,2,2) sees -1.
        assert_relative_eq!(hx.get(2, 1, 2), -ch);
        assert_relative_eq!(hx.get(2, 2, 2), ch);
        // Hy(1,2,2) sees dEz/dx = +1, Hy(2,2,2) sees -1.
        assert_relative_eq!(hy.get(1, 2, 2), ch);
        assert_relative_eq!(hy.get(2, 2, 2), -ch);
        assert_eq!(lattice.field(FieldComponent::Hz).max_abs(), 0.0);
        // The E pass was not run.
        assert_eq!(lattice.field(FieldComponent::Ex).max_abs(), 0.0);
    }

    #[test]
    fn test_update_e_from_single_hz() {
        let mut lattice = FieldLattice::new(5, 5, 5, 10).unwrap();
        lattice.field_mut(FieldComponent::Hz).set(2, 2, 2, 1.0);

        BasicEngine.update_e(&mut lattice);

        let ce = (COURANT * 377.0) as f32;
        let ex = lattice.field(FieldComponent::Ex);
        let ey = lattice.field(FieldComponent::Ey);
        // Ex(2,2,2) = +dHz/dy, Ex(2,3,2) = -dHz/dy.
        assert_relative_eq!(ex.get(2, 2, 2), ce);
        assert_relative_eq!(ex.get(2, 3, 2), -ce);
        // Ey(2,2,2) = -dHz/dx, Ey(3,2,2) = +dHz/dx.
        assert_relative_eq!(ey.get(2, 2, 2), -ce);
        assert_relative_eq!(ey.get(3, 2, 2), ce);
        assert_eq!(lattice.field(FieldComponent::Ez).max_abs(), 0.0);
    }

    #[test]
    fn test_update_e_leaves_boundary_layer() {
        let mut lattice = FieldLattice::new(4, 4, 4, 10).unwrap();
        lattice.h_field.x.fill(1.0);
        lattice.h_field.y.fill(-2.0);
        lattice.h_field.z.fill(0.5);
        // Nonuniform H so interior curls are nonzero near the faces.
        lattice.h_field.z.set(0, 0, 0, 3.0);
        lattice.h_field.y.set(0, 0, 0, 3.0);
        lattice.h_field.x.set(0, 0, 0, 3.0);

        BasicEngine.update_e(&mut lattice);

        let ex = lattice.field(FieldComponent::Ex);
        for i in 0..3 {
            for t in 0..4 {
                assert_eq!(ex.get(i, 0, t), 0.0);
                assert_eq!(ex.get(i, 3, t), 0.0);
                assert_eq!(ex.get(i, t, 0), 0.0);
                assert_eq!(ex.get(i, t, 3), 0.0);
            }
        }
        let ey = lattice.field(FieldComponent::Ey);
        for j in 0..3 {
            for t in 0..4 {
                assert_eq!(ey.get(0, j, t), 0.0);
                assert_eq!(ey.get(3, j, t), 0.0);
            }
        }
    }

    #[test]
    fn test_zero_fields_stay_zero() {
        let mut lattice = FieldLattice::new(6, 5, 4, 10).unwrap();
        BasicEngine.update_h(&mut lattice);
        BasicEngine.update_e(&mut lattice);
        assert_eq!(lattice.energy(), 0.0);
    }
}
