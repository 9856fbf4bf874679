//! Soft point sources.
//!
//! A point source adds a waveform sample to one cell of one field component
//! every step. The target cell is resolved when the source is bound: an
//! explicit position is checked against the component's staggered shape, and
//! the default position is the lattice center.

use log::debug;

use crate::constants::DIPOLE_WIDTH;
use crate::extensions::Source;
use crate::fdtd::{require_binding, FieldComponent, FieldLattice, LatticeBinding, Waveform};
use crate::{Error, Result};

/// Target cell shared by the point source variants.
#[derive(Debug, Clone)]
struct PointTarget {
    component: FieldComponent,
    /// Requested position; `None` means the lattice center.
    position: Option<(usize, usize, usize)>,
    /// Position resolved at bind time.
    cell: (usize, usize, usize),
    binding: Option<LatticeBinding>,
}

impl PointTarget {
    fn new(component: FieldComponent, position: Option<(usize, usize, usize)>) -> Self {
        Self {
            component,
            position,
            cell: (0, 0, 0),
            binding: None,
        }
    }

    fn bind(&mut self, lattice: &FieldLattice, name: &str) -> Result<()> {
        let cell = self.position.unwrap_or_else(|| lattice.center());
        let shape = lattice.field(self.component).dimensions();
        let index = [cell.0, cell.1, cell.2];
        for (axis, (&index, extent)) in index.iter().zip(shape.as_array()).enumerate() {
            if index >= extent {
                return Err(Error::InvalidIndex {
                    axis,
                    index,
                    extent,
                });
            }
        }

        self.cell = cell;
        self.binding = Some(lattice.binding());
        debug!("Bound {} to {} at {:?}", name, self.component, cell);
        Ok(())
    }

    fn is_bound_to(&self, lattice: &FieldLattice) -> bool {
        self.binding.is_some_and(|b| b.is_valid_for(lattice))
    }

    fn inject(&self, lattice: &mut FieldLattice, name: &str, value: f64) -> Result<()> {
        require_binding(self.binding.as_ref(), lattice, name)?;
        let (i, j, k) = self.cell;
        lattice.field_mut(self.component).add(i, j, k, value as f32);
        Ok(())
    }
}

/// Ricker ("dipole") pulse source.
#[derive(Debug, Clone)]
pub struct DipoleSource {
    name: String,
    target: PointTarget,
    width: f64,
    amplitude: f64,
    delay: f64,
}

impl DipoleSource {
    /// Dipole pulse on `component` at `position`.
    pub fn new(component: FieldComponent, position: (usize, usize, usize)) -> Self {
        Self::with_target(component, Some(position))
    }

    /// Dipole pulse on `component` at the lattice center.
    pub fn centered(component: FieldComponent) -> Self {
        Self::with_target(component, None)
    }

    fn with_target(component: FieldComponent, position: Option<(usize, usize, usize)>) -> Self {
        Self {
            name: format!("dipole_{component}"),
            target: PointTarget::new(component, position),
            width: DIPOLE_WIDTH,
            amplitude: 1.0,
            delay: 0.0,
        }
    }

    /// Set the pulse width; the pulse peaks at step `width / COURANT`.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Set the propagation delay in cells.
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn component(&self) -> FieldComponent {
        self.target.component
    }

    /// Waveform injected by this source.
    pub fn waveform(&self) -> Waveform {
        Waveform::Ricker { width: self.width }
    }

    /// Sample injected at `time`.
    pub fn sample(&self, time: u64) -> f64 {
        self.amplitude * self.waveform().evaluate(time as f64, self.delay)
    }
}

impl Source for DipoleSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&mut self, lattice: &FieldLattice) -> Result<()> {
        self.target.bind(lattice, &self.name)
    }

    fn unbind(&mut self) {
        self.target.binding = None;
    }

    fn is_bound_to(&self, lattice: &FieldLattice) -> bool {
        self.target.is_bound_to(lattice)
    }

    fn update(&mut self, lattice: &mut FieldLattice) -> Result<()> {
        let value = self.sample(lattice.time());
        self.target.inject(lattice, &self.name, value)
    }
}

/// Sinusoidal ("harmonic") source.
#[derive(Debug, Clone)]
pub struct HarmonicSource {
    name: String,
    target: PointTarget,
    wavenumber: f64,
    amplitude: f64,
    delay: f64,
}

impl HarmonicSource {
    /// Harmonic source on `component` at `position` with a spatial period of
    /// `wavenumber` cells.
    pub fn new(
        component: FieldComponent,
        position: (usize, usize, usize),
        wavenumber: f64,
        amplitude: f64,
    ) -> Self {
        Self::with_target(component, Some(position), wavenumber, amplitude)
    }

    /// Harmonic source at the lattice center.
    pub fn centered(component: FieldComponent, wavenumber: f64, amplitude: f64) -> Self {
        Self::with_target(component, None, wavenumber, amplitude)
    }

    fn with_target(
        component: FieldComponent,
        position: Option<(usize, usize, usize)>,
        wavenumber: f64,
        amplitude: f64,
    ) -> Self {
        Self {
            name: format!("harmonic_{component}"),
            target: PointTarget::new(component, position),
            wavenumber,
            amplitude,
            delay: 0.0,
        }
    }

    /// Set the propagation delay in cells.
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn component(&self) -> FieldComponent {
        self.target.component
    }

    pub fn waveform(&self) -> Waveform {
        Waveform::Harmonic {
            wavenumber: self.wavenumber,
            amplitude: self.amplitude,
        }
    }

    pub fn sample(&self, time: u64) -> f64 {
        self.waveform().evaluate(time as f64, self.delay)
    }
}

impl Source for HarmonicSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&mut self, lattice: &FieldLattice) -> Result<()> {
        if !(self.wavenumber.is_finite() && self.wavenumber > 0.0) {
            return Err(Error::Config(format!(
                "{}: wavenumber must be positive, got {}",
                self.name, self.wavenumber
            )));
        }
        self.target.bind(lattice, &self.name)
    }

    fn unbind(&mut self) {
        self.target.binding = None;
    }

    fn is_bound_to(&self, lattice: &FieldLattice) -> bool {
        self.target.is_bound_to(lattice)
    }

    fn update(&mut self, lattice: &mut FieldLattice) -> Result<()> {
        let value = self.sample(lattice.time());
        self.target.inject(lattice, &self.name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdtd::{dipole_pulse, harmonic_pulse};
    use approx::assert_relative_eq;

    #[test]
    fn test_centered_dipole_targets_center() {
        let mut lattice = FieldLattice::new(7, 6, 5, 10).unwrap();
        let mut src = DipoleSource::centered(FieldComponent::Ex).with_width(2.0);
        src.bind(&lattice).unwrap();
        assert!(src.is_bound_to(&lattice));

        lattice.advance_time();
        src.update(&mut lattice).unwrap();

        let expected = src.sample(1) as f32;
        assert!(expected != 0.0);
        assert_eq!(lattice.field(FieldComponent::Ex).get(3, 2, 2), expected);
        assert_relative_eq!(
            lattice.field(FieldComponent::Ex).energy(),
            (expected as f64).powi(2),
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_default_dipole_matches_pulse() {
        let src = DipoleSource::centered(FieldComponent::Ex);
        for t in 0..4 {
            assert_eq!(src.sample(t), dipole_pulse(t as f64, 0.0));
        }
    }

    #[test]
    fn test_source_injection_is_additive() {
        let mut lattice = FieldLattice::new(5, 5, 5, 10).unwrap();
        lattice.field_mut(FieldComponent::Ez).set(1, 2, 3, 0.5);
        let mut src = HarmonicSource::new(FieldComponent::Ez, (1, 2, 3), 8.0, 2.0);
        src.bind(&lattice).unwrap();

        for _ in 0..3 {
            lattice.advance_time();
            src.update(&mut lattice).unwrap();
        }

        let expected: f64 = 0.5 + (1..=3)
            .map(|t| harmonic_pulse(t as f64, 0.0, 8.0, 2.0))
            .sum::<f64>();
        assert_relative_eq!(
            lattice.field(FieldComponent::Ez).get(1, 2, 3),
            expected as f32,
            max_relative = 1e-5
        );
    }

    #[test]
    fn test_bind_rejects_out_of_range_cell() {
        let lattice = FieldLattice::new(5, 5, 5, 10).unwrap();
        // Ex has only 4 cells along x.
        let mut src = DipoleSource::new(FieldComponent::Ex, (4, 0, 0));
        assert!(matches!(
            src.bind(&lattice),
            Err(Error::InvalidIndex {
                axis: 0,
                index: 4,
                extent: 4
            })
        ));
        assert!(!src.is_bound_to(&lattice));
    }

    #[test]
    fn test_update_requires_binding() {
        let mut lattice = FieldLattice::new(4, 4, 4, 10).unwrap();
        let mut src = HarmonicSource::centered(FieldComponent::Ey, 4.0, 1.0);
        assert!(matches!(src.update(&mut lattice), Err(Error::NotBound(_))));

        src.bind(&lattice).unwrap();
        src.unbind();
        assert!(matches!(src.update(&mut lattice), Err(Error::NotBound(_))));
    }

    #[test]
    fn test_harmonic_rejects_bad_wavenumber() {
        let lattice = FieldLattice::new(4, 4, 4, 10).unwrap();
        let mut src = HarmonicSource::centered(FieldComponent::Ey, 0.0, 1.0);
        assert!(matches!(src.bind(&lattice), Err(Error::Config(_))));
    }
}
