//! First-order Mur absorbing boundary condition.
//!
//! Mur's one-way wave approximation at a face with boundary cell `E0` and its
//! inward neighbour `E1`:
//!
//! ```text
//! E0[n+1] = E1[n] + coef * (E1[n+1] - E0[n]),   coef = (S - 1) / (S + 1)
//! ```
//!
//! where `S` is the Courant number. `E1[n]` is kept in a per-face ghost
//! buffer; the update reads it before refreshing it with `E1[n+1]`.
//!
//! Each tangential E component on each face has its own buffer:
//!
//! | faces  | components | buffer shape          |
//! |--------|------------|-----------------------|
//! | X0, XM | Ey         | (sy-1, sz)            |
//! | X0, XM | Ez         | (sy, sz-1)            |
//! | Y0, YN | Ex         | (sx-1, sz)            |
//! | Y0, YN | Ez         | (sx, sz-1)            |
//! | Z0, ZP | Ex         | (sx-1, sy)            |
//! | Z0, ZP | Ey         | (sx, sy-1)            |
//!
//! Edges where two faces meet are owned by the face whose normal axis comes
//! first (X before Y before Z). Faces later in that order skip the cells an
//! earlier face already owns, so every boundary cell is written exactly once
//! per step.
//!
//! Faces run in that same order. An edge cell whose inward neighbour belongs
//! to a later face (Ex on Y0 at `k = 0` reads `(i, 1, 0)`, owned by Z0) sees
//! that neighbour before its boundary update, i.e. `E1[n]` in place of
//! `E1[n+1]`, and its ghost lags one step. The error is confined to the
//! twelve lattice edges and stays first order.

use log::debug;

use crate::arrays::{Field2D, Field3D};
use crate::constants::COURANT;
use crate::extensions::BoundaryCondition;
use crate::fdtd::{require_binding, FieldComponent, FieldLattice, LatticeBinding};
use crate::Result;

/// One of the six lattice faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// x = 0
    X0,
    /// x = sx - 1
    XM,
    /// y = 0
    Y0,
    /// y = sy - 1
    YN,
    /// z = 0
    Z0,
    /// z = sz - 1
    ZP,
}

/// Ghost buffers, one per face and tangential component.
#[derive(Debug, Clone)]
struct GhostBuffers {
    ey_x0: Field2D,
    ey_xm: Field2D,
    ez_x0: Field2D,
    ez_xm: Field2D,
    ex_y0: Field2D,
    ex_yn: Field2D,
    ez_y0: Field2D,
    ez_yn: Field2D,
    ex_z0: Field2D,
    ex_zp: Field2D,
    ey_z0: Field2D,
    ey_zp: Field2D,
}

impl GhostBuffers {
    fn new(sx: usize, sy: usize, sz: usize) -> Self {
        Self {
            ey_x0: Field2D::new(sy - 1, sz),
            ey_xm: Field2D::new(sy - 1, sz),
            ez_x0: Field2D::new(sy, sz - 1),
            ez_xm: Field2D::new(sy, sz - 1),
            ex_y0: Field2D::new(sx - 1, sz),
            ex_yn: Field2D::new(sx - 1, sz),
            ez_y0: Field2D::new(sx, sz - 1),
            ez_yn: Field2D::new(sx, sz - 1),
            ex_z0: Field2D::new(sx - 1, sy),
            ex_zp: Field2D::new(sx - 1, sy),
            ey_z0: Field2D::new(sx, sy - 1),
            ey_zp: Field2D::new(sx, sy - 1),
        }
    }

    fn get(&self, component: FieldComponent, face: Face) -> Option<&Field2D> {
        use FieldComponent::*;
        match (component, face) {
            (Ey, Face::X0) => Some(&self.ey_x0),
            (Ey, Face::XM) => Some(&self.ey_xm),
            (Ez, Face::X0) => Some(&self.ez_x0),
            (Ez, Face::XM) => Some(&self.ez_xm),
            (Ex, Face::Y0) => Some(&self.ex_y0),
            (Ex, Face::YN) => Some(&self.ex_yn),
            (Ez, Face::Y0) => Some(&self.ez_y0),
            (Ez, Face::YN) => Some(&self.ez_yn),
            (Ex, Face::Z0) => Some(&self.ex_z0),
            (Ex, Face::ZP) => Some(&self.ex_zp),
            (Ey, Face::Z0) => Some(&self.ey_z0),
            (Ey, Face::ZP) => Some(&self.ey_zp),
            _ => None,
        }
    }
}

/// Mur update of one boundary cell.
#[inline]
fn mur_cell(
    field: &mut Field3D,
    ghost: &mut Field2D,
    coef: f32,
    boundary: (usize, usize, usize),
    inward: (usize, usize, usize),
    (r, c): (usize, usize),
) {
    let inner = field.get(inward.0, inward.1, inward.2);
    let outer = field.get(boundary.0, boundary.1, boundary.2);
    field.set(
        boundary.0,
        boundary.1,
        boundary.2,
        ghost.get(r, c) + coef * (inner - outer),
    );
    ghost.set(r, c, inner);
}

/// First-order Mur absorbing boundary on all six faces.
#[derive(Debug, Clone)]
pub struct FirstOrderAbc {
    name: String,
    binding: Option<LatticeBinding>,
    coef: f32,
    ghosts: Option<GhostBuffers>,
}

impl Default for FirstOrderAbc {
    fn default() -> Self {
        Self::new()
    }
}

impl FirstOrderAbc {
    /// Create an unbound boundary named `first_order_abc`.
    pub fn new() -> Self {
        Self::with_name("first_order_abc")
    }

    /// Create an unbound boundary with a custom name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding: None,
            coef: Self::mur_coefficient() as f32,
            ghosts: None,
        }
    }

    /// `(S - 1) / (S + 1)` for the lattice Courant number `S`.
    pub fn mur_coefficient() -> f64 {
        (COURANT - 1.0) / (COURANT + 1.0)
    }

    /// Coefficient in use.
    pub fn coef(&self) -> f32 {
        self.coef
    }

    /// Ghost buffer of `component` on `face`, if that pair exists and the
    /// boundary has been bound at least once.
    pub fn ghost(&self, component: FieldComponent, face: Face) -> Option<&Field2D> {
        self.ghosts.as_ref().and_then(|g| g.get(component, face))
    }
}

impl BoundaryCondition for FirstOrderAbc {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&mut self, lattice: &FieldLattice) -> Result<()> {
        let dims = lattice.dimensions();
        self.ghosts = Some(GhostBuffers::new(dims.nx, dims.ny, dims.nz));
        self.coef = ((lattice.courant() - 1.0) / (lattice.courant() + 1.0)) as f32;
        self.binding = Some(lattice.binding());
        debug!(
            "Bound {} to {}x{}x{} lattice (coef {:.5})",
            self.name, dims.nx, dims.ny, dims.nz, self.coef
        );
        Ok(())
    }

    fn unbind(&mut self) {
        self.binding = None;
    }

    fn is_bound_to(&self, lattice: &FieldLattice) -> bool {
        self.binding.is_some_and(|b| b.is_valid_for(lattice))
    }

    fn update(&mut self, lattice: &mut FieldLattice) -> Result<()> {
        require_binding(self.binding.as_ref(), lattice, &self.name)?;
        let Some(g) = self.ghosts.as_mut() else {
            return Err(crate::Error::NotBound(self.name.clone()));
        };
        let coef = self.coef;
        let dims = lattice.dimensions();
        let (sx, sy, sz) = (dims.nx, dims.ny, dims.nz);

        // X faces own every Ey/Ez cell with i in {0, sx-1}.
        {
            let last = sx - 1;
            let ey = lattice.field_mut(FieldComponent::Ey);
            for j in 0..sy - 1 {
                for k in 0..sz {
                    mur_cell(ey, &mut g.ey_x0, coef, (0, j, k), (1, j, k), (j, k));
                    mur_cell(ey, &mut g.ey_xm, coef, (last, j, k), (last - 1, j, k), (j, k));
                }
            }
            let ez = lattice.field_mut(FieldComponent::Ez);
            for j in 0..sy {
                for k in 0..sz - 1 {
                    mur_cell(ez, &mut g.ez_x0, coef, (0, j, k), (1, j, k), (j, k));
                    mur_cell(ez, &mut g.ez_xm, coef, (last, j, k), (last - 1, j, k), (j, k));
                }
            }
        }

        // Y faces own Ex with j in {0, sy-1}, and Ez with j in {0, sy-1}
        // away from the X faces.
        {
            let last = sy - 1;
            let ex = lattice.field_mut(FieldComponent::Ex);
            for i in 0..sx - 1 {
                for k in 0..sz {
                    mur_cell(ex, &mut g.ex_y0, coef, (i, 0, k), (i, 1, k), (i, k));
                    mur_cell(ex, &mut g.ex_yn, coef, (i, last, k), (i, last - 1, k), (i, k));
                }
            }
            let ez = lattice.field_mut(FieldComponent::Ez);
            for i in 1..sx - 1 {
                for k in 0..sz - 1 {
                    mur_cell(ez, &mut g.ez_y0, coef, (i, 0, k), (i, 1, k), (i, k));
                    mur_cell(ez, &mut g.ez_yn, coef, (i, last, k), (i, last - 1, k), (i, k));
                }
            }
        }

        // Z faces take what is left: Ex away from the Y faces, Ey away from
        // the X faces.
        {
            let last = sz - 1;
            let ex = lattice.field_mut(FieldComponent::Ex);
            for i in 0..sx - 1 {
                for j in 1..sy - 1 {
                    mur_cell(ex, &mut g.ex_z0, coef, (i, j, 0), (i, j, 1), (i, j));
                    mur_cell(ex, &mut g.ex_zp, coef, (i, j, last), (i, j, last - 1), (i, j));
                }
            }
            let ey = lattice.field_mut(FieldComponent::Ey);
            for i in 1..sx - 1 {
                for j in 0..sy - 1 {
                    mur_cell(ey, &mut g.ey_z0, coef, (i, j, 0), (i, j, 1), (i, j));
                    mur_cell(ey, &mut g.ey_zp, coef, (i, j, last), (i, j, last - 1), (i, j));
                }
            }
        }

        Ok(())
    }
}
