//! Excitation waveforms.
//!
//! Waveforms are pure functions of the integer time step and a propagation
//! delay `location` (zero for a source evaluated at its own cell). Time is
//! converted to distance travelled through the Courant number, so a delay of
//! one unit corresponds to one cell.

use std::f64::consts::PI;

use crate::constants::{COURANT, DIPOLE_WIDTH};

/// Ricker (second derivative of Gaussian) pulse with the given width.
///
/// The pulse peaks at `time = width / COURANT` for zero delay.
pub fn ricker_pulse(time: f64, location: f64, width: f64) -> f64 {
    let arg = (PI * ((COURANT * time - location) / width - 1.0)).powi(2);
    (1.0 - 2.0 * arg) * (-arg).exp()
}

/// Dipole pulse: a Ricker pulse of width 0.1, peaking near `time = 0.1 / COURANT`.
pub fn dipole_pulse(time: f64, location: f64) -> f64 {
    ricker_pulse(time, location, DIPOLE_WIDTH)
}

/// Harmonic pulse `amplitude * sin(2*pi/wavenumber * (COURANT*time - location))`.
///
/// `wavenumber` is the spatial period in cells.
pub fn harmonic_pulse(time: f64, location: f64, wavenumber: f64, amplitude: f64) -> f64 {
    amplitude * (2.0 * PI / wavenumber * (COURANT * time - location)).sin()
}

/// Excitation waveform with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// Ricker pulse
    Ricker {
        /// Width in units of `COURANT * time`
        width: f64,
    },
    /// Sinusoid
    Harmonic {
        /// Spatial period in cells
        wavenumber: f64,
        /// Peak amplitude
        amplitude: f64,
    },
}

impl Waveform {
    /// The default dipole waveform.
    pub fn dipole() -> Self {
        Waveform::Ricker {
            width: DIPOLE_WIDTH,
        }
    }

    /// Evaluate the waveform at `time` with delay `location`.
    pub fn evaluate(&self, time: f64, location: f64) -> f64 {
        match *self {
            Waveform::Ricker { width } => ricker_pulse(time, location, width),
            Waveform::Harmonic {
                wavenumber,
                amplitude,
            } => harmonic_pulse(time, location, wavenumber, amplitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dipole_pulse_at_origin() {
        // arg = pi^2, (1 - 2 pi^2) * exp(-pi^2)
        let expected = (1.0 - 2.0 * PI * PI) * (-PI * PI).exp();
        assert_relative_eq!(dipole_pulse(0.0, 0.0), expected, max_relative = 1e-12);
        assert_relative_eq!(dipole_pulse(0.0, 0.0), -9.6925e-4, max_relative = 1e-4);
    }

    #[test]
    fn test_dipole_pulse_peak() {
        let t_peak = DIPOLE_WIDTH / COURANT;
        assert_relative_eq!(dipole_pulse(t_peak, 0.0), 1.0, epsilon = 1e-12);
        assert!(dipole_pulse(t_peak + 0.05, 0.0) < 1.0);
    }

    #[test]
    fn test_ricker_delay_shifts_peak() {
        let width = 5.0;
        let t_peak = width / COURANT;
        assert_relative_eq!(ricker_pulse(t_peak, 0.0, width), 1.0, epsilon = 1e-12);
        // Three cells of delay move the peak by 3 / COURANT steps.
        assert_relative_eq!(
            ricker_pulse(t_peak + 3.0 / COURANT, 3.0, width),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_harmonic_pulse() {
        assert_relative_eq!(harmonic_pulse(0.0, 0.0, 1.0, 1.0), 0.0, epsilon = 1e-12);
        // Quarter period: COURANT * t = k / 4.
        let t = 10.0 / 4.0 / COURANT;
        assert_relative_eq!(harmonic_pulse(t, 0.0, 10.0, 2.5), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_waveform_evaluate() {
        assert_eq!(
            Waveform::dipole().evaluate(3.0, 0.0),
            dipole_pulse(3.0, 0.0)
        );
        let w = Waveform::Harmonic {
            wavenumber: 4.0,
            amplitude: 0.5,
        };
        assert_eq!(w.evaluate(7.0, 1.0), harmonic_pulse(7.0, 1.0, 4.0, 0.5));
    }
}
