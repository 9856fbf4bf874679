//! Error types for yee3d.

use thiserror::Error;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building, stepping or exporting a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// A lattice extent is below the minimum of two cells.
    #[error("invalid lattice dimensions {nx}x{ny}x{nz}: every extent must be at least 2")]
    InvalidDimension {
        /// Extent along x
        nx: usize,
        /// Extent along y
        ny: usize,
        /// Extent along z
        nz: usize,
    },

    /// The requested end time lies outside the advanceable window.
    #[error("invalid end time {end_time}: must lie between {time} and {max_time}")]
    InvalidTimeRange {
        /// Requested end time
        end_time: u64,
        /// Current lattice time
        time: u64,
        /// Final time of the lattice
        max_time: u64,
    },

    /// The lattice already reached its final time step.
    #[error("simulation already reached its final step {max_time}; reset to restart")]
    SimulationComplete {
        /// Final time of the lattice
        max_time: u64,
    },

    /// A boundary condition or source was updated without a valid lattice binding.
    #[error("{0} is not bound to this lattice")]
    NotBound(String),

    /// Unknown field component name.
    #[error("invalid field component '{0}': expected one of Ex, Ey, Ez, Hx, Hy, Hz")]
    InvalidField(String),

    /// Plane axis outside 0..=2.
    #[error("invalid axis {0}: expected 0 (x), 1 (y) or 2 (z)")]
    InvalidAxis(usize),

    /// Plane or cell index outside the component's extent.
    #[error("index {index} out of range for axis {axis} (extent {extent})")]
    InvalidIndex {
        /// Axis the index applies to
        axis: usize,
        /// Offending index
        index: usize,
        /// Extent of the component along that axis
        extent: usize,
    },

    /// A non-finite field value was detected.
    #[error("numerical instability: non-finite value in {component} at {position:?} (time step {time})")]
    NumericalInstability {
        /// Component holding the value
        component: String,
        /// Cell index of the value
        position: (usize, usize, usize),
        /// Lattice time at detection
        time: u64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Animation rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
