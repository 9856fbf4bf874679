//! Staggered Yee lattice state.
//!
//! The lattice owns the six field components and their update coefficients.
//! With primary extents `(sx, sy, sz)` the components have the shapes
//!
//! | component | shape              |
//! |-----------|--------------------|
//! | Ex        | (sx-1, sy,   sz)   |
//! | Ey        | (sx,   sy-1, sz)   |
//! | Ez        | (sx,   sy,   sz-1) |
//! | Hx        | (sx,   sy-1, sz-1) |
//! | Hy        | (sx-1, sy,   sz-1) |
//! | Hz        | (sx-1, sy-1, sz)   |
//!
//! H arrays already exclude the outermost E layer, so the H pass runs over
//! each array's full shape. The E pass skips the outer layer along the two
//! axes transverse to each component; those cells belong to the bound
//! boundary conditions.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::arrays::{Dimensions, Field2D, Field3D, VectorField3D};
use crate::constants::{COURANT, FREE_SPACE_IMPEDANCE};
use crate::{Error, Result};

/// One of the six field components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldComponent {
    Ex,
    Ey,
    Ez,
    Hx,
    Hy,
    Hz,
}

impl FieldComponent {
    /// All components, E first.
    pub const ALL: [FieldComponent; 6] = [
        FieldComponent::Ex,
        FieldComponent::Ey,
        FieldComponent::Ez,
        FieldComponent::Hx,
        FieldComponent::Hy,
        FieldComponent::Hz,
    ];

    /// Component name as written in configuration (`"Ex"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Ex => "Ex",
            Self::Ey => "Ey",
            Self::Ez => "Ez",
            Self::Hx => "Hx",
            Self::Hy => "Hy",
            Self::Hz => "Hz",
        }
    }

    /// Axis the component points along.
    pub fn axis(self) -> usize {
        match self {
            Self::Ex | Self::Hx => 0,
            Self::Ey | Self::Hy => 1,
            Self::Ez | Self::Hz => 2,
        }
    }

    pub fn is_electric(self) -> bool {
        matches!(self, Self::Ex | Self::Ey | Self::Ez)
    }

    /// Staggered array shape of this component for primary extents `dims`.
    pub fn shape(self, dims: Dimensions) -> Dimensions {
        let Dimensions { nx, ny, nz } = dims;
        match self {
            Self::Ex => Dimensions::new(nx - 1, ny, nz),
            Self::Ey => Dimensions::new(nx, ny - 1, nz),
            Self::Ez => Dimensions::new(nx, ny, nz - 1),
            Self::Hx => Dimensions::new(nx, ny - 1, nz - 1),
            Self::Hy => Dimensions::new(nx - 1, ny, nz - 1),
            Self::Hz => Dimensions::new(nx - 1, ny - 1, nz),
        }
    }
}

impl fmt::Display for FieldComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldComponent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldComponent::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::InvalidField(s.to_string()))
    }
}

/// Decay and curl coefficients for one field type (E or H).
///
/// `decay` scales the previous value of a component, `curl` scales the
/// finite-difference curl of the other field. Both arrays have the shape of
/// the component they update.
#[derive(Debug, Clone)]
pub struct UpdateCoefficients {
    /// Per-component decay coefficients (ExE/EyE/EzE or HxH/HyH/HzH)
    pub decay: [Field3D; 3],
    /// Per-component curl coefficients (ExH/EyH/EzH or HxE/HyE/HzE)
    pub curl: [Field3D; 3],
}

impl UpdateCoefficients {
    fn uniform(shapes: [Dimensions; 3], decay: f32, curl: f32) -> Self {
        Self {
            decay: shapes.map(|s| Field3D::filled(s, decay)),
            curl: shapes.map(|s| Field3D::filled(s, curl)),
        }
    }
}

static NEXT_LATTICE_ID: AtomicU64 = AtomicU64::new(0);

fn next_lattice_id() -> u64 {
    NEXT_LATTICE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Record of a boundary condition or source being bound to a lattice.
///
/// A binding identifies exactly one lattice instance and stays valid until
/// that lattice is reset. Other lattices of the same shape, clones included,
/// do not accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeBinding {
    dims: Dimensions,
    lattice_id: u64,
}

impl LatticeBinding {
    /// Primary extents of the bound lattice.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Whether this binding still refers to `lattice`.
    pub fn is_valid_for(&self, lattice: &FieldLattice) -> bool {
        self.lattice_id == lattice.id
    }
}

/// Check an optional binding against `lattice`, failing with
/// [`Error::NotBound`] on behalf of `owner`.
pub fn require_binding(
    binding: Option<&LatticeBinding>,
    lattice: &FieldLattice,
    owner: &str,
) -> Result<()> {
    match binding {
        Some(b) if b.is_valid_for(lattice) => Ok(()),
        _ => Err(Error::NotBound(owner.to_string())),
    }
}

/// FDTD lattice state: staggered fields, coefficients and the time index.
///
/// Cloning copies the state under a new identity, so bindings to the
/// original are not valid for the clone.
#[derive(Debug)]
pub struct FieldLattice {
    dims: Dimensions,
    time: u64,
    max_time: u64,
    permittivity: f64,
    permeability: f64,
    impedance: f64,
    pub(crate) e_field: VectorField3D,
    pub(crate) h_field: VectorField3D,
    pub(crate) e_coeff: UpdateCoefficients,
    pub(crate) h_coeff: UpdateCoefficients,
    /// Process-unique identity, renewed on every reset to invalidate bindings.
    id: u64,
}

impl Clone for FieldLattice {
    fn clone(&self) -> Self {
        Self {
            dims: self.dims,
            time: self.time,
            max_time: self.max_time,
            permittivity: self.permittivity,
            permeability: self.permeability,
            impedance: self.impedance,
            e_field: self.e_field.clone(),
            h_field: self.h_field.clone(),
            e_coeff: self.e_coeff.clone(),
            h_coeff: self.h_coeff.clone(),
            id: next_lattice_id(),
        }
    }
}

impl FieldLattice {
    /// Create a lattice filled with vacuum (relative permittivity and
    /// permeability of 1).
    pub fn new(sx: usize, sy: usize, sz: usize, max_time: u64) -> Result<Self> {
        Self::with_medium(sx, sy, sz, max_time, 1.0, 1.0)
    }

    /// Create a lattice filled with a homogeneous medium.
    pub fn with_medium(
        sx: usize,
        sy: usize,
        sz: usize,
        max_time: u64,
        permittivity: f64,
        permeability: f64,
    ) -> Result<Self> {
        if sx < 2 || sy < 2 || sz < 2 {
            return Err(Error::InvalidDimension {
                nx: sx,
                ny: sy,
                nz: sz,
            });
        }
        if !(permittivity.is_finite() && permittivity > 0.0) {
            return Err(Error::Config(format!(
                "relative permittivity must be positive, got {permittivity}"
            )));
        }
        if !(permeability.is_finite() && permeability > 0.0) {
            return Err(Error::Config(format!(
                "relative permeability must be positive, got {permeability}"
            )));
        }

        let dims = Dimensions::new(sx, sy, sz);
        let impedance = FREE_SPACE_IMPEDANCE * (permeability / permittivity).sqrt();
        let e_shapes = Self::shapes(dims, true);
        let h_shapes = Self::shapes(dims, false);

        Ok(Self {
            dims,
            time: 0,
            max_time,
            permittivity,
            permeability,
            impedance,
            e_field: VectorField3D::staggered(e_shapes),
            h_field: VectorField3D::staggered(h_shapes),
            e_coeff: UpdateCoefficients::uniform(e_shapes, 1.0, (COURANT * impedance) as f32),
            h_coeff: UpdateCoefficients::uniform(h_shapes, 1.0, (COURANT / impedance) as f32),
            id: next_lattice_id(),
        })
    }

    fn shapes(dims: Dimensions, electric: bool) -> [Dimensions; 3] {
        if electric {
            [
                FieldComponent::Ex.shape(dims),
                FieldComponent::Ey.shape(dims),
                FieldComponent::Ez.shape(dims),
            ]
        } else {
            [
                FieldComponent::Hx.shape(dims),
                FieldComponent::Hy.shape(dims),
                FieldComponent::Hz.shape(dims),
            ]
        }
    }

    /// Primary lattice extents `(sx, sy, sz)`.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Current time step.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Final time step.
    pub fn max_time(&self) -> u64 {
        self.max_time
    }

    pub fn permittivity(&self) -> f64 {
        self.permittivity
    }

    pub fn permeability(&self) -> f64 {
        self.permeability
    }

    /// Wave impedance of the medium, `377 * sqrt(mu_r / eps_r)`.
    pub fn impedance(&self) -> f64 {
        self.impedance
    }

    pub fn courant(&self) -> f64 {
        COURANT
    }

    /// Geometric center cell `((sx-1)/2, (sy-1)/2, (sz-1)/2)`.
    pub fn center(&self) -> (usize, usize, usize) {
        (
            (self.dims.nx - 1) / 2,
            (self.dims.ny - 1) / 2,
            (self.dims.nz - 1) / 2,
        )
    }

    pub fn field(&self, component: FieldComponent) -> &Field3D {
        if component.is_electric() {
            self.e_field.component(component.axis())
        } else {
            self.h_field.component(component.axis())
        }
    }

    pub fn field_mut(&mut self, component: FieldComponent) -> &mut Field3D {
        if component.is_electric() {
            self.e_field.component_mut(component.axis())
        } else {
            self.h_field.component_mut(component.axis())
        }
    }

    pub fn e_field(&self) -> &VectorField3D {
        &self.e_field
    }

    pub fn h_field(&self) -> &VectorField3D {
        &self.h_field
    }

    /// Decay/curl coefficients of the E update.
    pub fn e_coefficients(&self) -> &UpdateCoefficients {
        &self.e_coeff
    }

    /// Decay/curl coefficients of the H update.
    pub fn h_coefficients(&self) -> &UpdateCoefficients {
        &self.h_coeff
    }

    /// Sum of squared E and H values.
    pub fn energy(&self) -> f64 {
        self.e_field.energy() + self.h_field.energy()
    }

    /// Record a binding to this lattice in its current identity.
    pub fn binding(&self) -> LatticeBinding {
        LatticeBinding {
            dims: self.dims,
            lattice_id: self.id,
        }
    }

    /// Copy one plane of a component.
    ///
    /// `axis` selects the plane normal (0 = x, 1 = y, 2 = z) and `index` must
    /// be below the component's own extent along that axis. Extraction never
    /// mutates the lattice.
    pub fn extract_plane(
        &self,
        component: FieldComponent,
        axis: usize,
        index: usize,
    ) -> Result<Field2D> {
        if axis > 2 {
            return Err(Error::InvalidAxis(axis));
        }
        let field = self.field(component);
        let extent = field.dimensions().extent(axis);
        if index >= extent {
            return Err(Error::InvalidIndex {
                axis,
                index,
                extent,
            });
        }
        Ok(field.plane(axis, index))
    }

    /// [`extract_plane`](Self::extract_plane) with the component given by name.
    pub fn extract_named_plane(&self, name: &str, axis: usize, index: usize) -> Result<Field2D> {
        self.extract_plane(name.parse()?, axis, index)
    }

    /// Scan all components for the first non-finite value.
    pub fn check_finite(&self) -> Result<()> {
        for component in FieldComponent::ALL {
            if let Some(position) = self.field(component).first_non_finite() {
                return Err(Error::NumericalInstability {
                    component: component.name().to_string(),
                    position,
                    time: self.time,
                });
            }
        }
        Ok(())
    }

    /// Reinitialize every array to t = 0 with the same configuration.
    ///
    /// All previously issued bindings become invalid.
    pub fn reset(&mut self) {
        let e_shapes = Self::shapes(self.dims, true);
        let h_shapes = Self::shapes(self.dims, false);

        self.time = 0;
        self.e_field = VectorField3D::staggered(e_shapes);
        self.h_field = VectorField3D::staggered(h_shapes);
        self.e_coeff =
            UpdateCoefficients::uniform(e_shapes, 1.0, (COURANT * self.impedance) as f32);
        self.h_coeff =
            UpdateCoefficients::uniform(h_shapes, 1.0, (COURANT / self.impedance) as f32);
        self.id = next_lattice_id();

        debug!("Lattice reset (id {})", self.id);
    }

    /// Advance the time index by one step.
    pub(crate) fn advance_time(&mut self) {
        self.time += 1;
    }
}
