//! JSON request configuration.
//!
//! A request carries one `gridConfig` object:
//!
//! ```json
//! { "gridConfig": { "sx": 30, "sy": 30, "sz": 30, "maxTime": 100 } }
//! ```
//!
//! Optional keys select the medium, the recorded slice and the engine:
//! `permittivity`, `permeability`, `field`, `axis`, `sliceIndex`, `period`,
//! `pulseWidth` and `engine` (`"basic"` or `"parallel"`).

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;
use serde::Deserialize;

use crate::constants::DIPOLE_WIDTH;
use crate::extensions::{DipoleSource, FirstOrderAbc};
use crate::fdtd::{EngineType, FieldComponent, FieldLattice, Simulation};
use crate::output::FieldSliceExporter;
use crate::{Error, Result};

/// Top-level request document.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationRequest {
    #[serde(rename = "gridConfig")]
    pub grid_config: GridConfig,
}

impl SimulationRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Lattice, source and output parameters of one request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub max_time: u64,

    /// Relative permittivity of the medium
    #[serde(default = "default_relative")]
    pub permittivity: f64,

    /// Relative permeability of the medium
    #[serde(default = "default_relative")]
    pub permeability: f64,

    /// Recorded component name
    #[serde(default = "default_field")]
    pub field: String,

    /// Normal axis of the recorded plane
    #[serde(default)]
    pub axis: usize,

    /// Plane index; defaults to the middle of the lattice along `axis`
    #[serde(default)]
    pub slice_index: Option<usize>,

    /// Steps between recorded frames
    #[serde(default = "default_period")]
    pub period: u64,

    /// Width of the centered dipole pulse
    #[serde(default)]
    pub pulse_width: Option<f64>,

    #[serde(default)]
    pub engine: EngineType,
}

fn default_relative() -> f64 {
    1.0
}

fn default_field() -> String {
    "Hx".to_string()
}

fn default_period() -> u64 {
    1
}

impl GridConfig {
    /// Create a configuration with every optional key at its default.
    pub fn new(sx: usize, sy: usize, sz: usize, max_time: u64) -> Self {
        Self {
            sx,
            sy,
            sz,
            max_time,
            permittivity: default_relative(),
            permeability: default_relative(),
            field: default_field(),
            axis: 0,
            slice_index: None,
            period: default_period(),
            pulse_width: None,
            engine: EngineType::default(),
        }
    }

    /// Recorded component.
    pub fn component(&self) -> Result<FieldComponent> {
        self.field.parse()
    }

    /// Plane index, defaulting to `(n - 1) / 2` for the primary extent `n`
    /// along `axis`.
    pub fn slice_index(&self) -> Result<usize> {
        if let Some(index) = self.slice_index {
            return Ok(index);
        }
        let extent = match self.axis {
            0 => self.sx,
            1 => self.sy,
            2 => self.sz,
            axis => return Err(Error::InvalidAxis(axis)),
        };
        Ok(extent.saturating_sub(1) / 2)
    }

    /// Build the lattice with a centered `Ex` dipole and a first-order Mur
    /// boundary.
    pub fn build_simulation(&self) -> Result<Simulation> {
        let lattice = FieldLattice::with_medium(
            self.sx,
            self.sy,
            self.sz,
            self.max_time,
            self.permittivity,
            self.permeability,
        )?;
        if self.max_time == 0 {
            return Err(Error::InvalidTimeRange {
                end_time: 0,
                time: 0,
                max_time: 0,
            });
        }

        let width = self.pulse_width.unwrap_or(DIPOLE_WIDTH);
        if !(width.is_finite() && width > 0.0) {
            return Err(Error::Config(format!(
                "pulse width must be positive, got {width}"
            )));
        }

        let mut sim = Simulation::new(lattice);
        sim.set_engine_type(self.engine);
        sim.add_source(DipoleSource::centered(FieldComponent::Ex).with_width(width))?;
        sim.add_boundary(FirstOrderAbc::new())?;
        Ok(sim)
    }

    /// Exporter for the configured slice, validated against `lattice`.
    pub fn exporter(&self, lattice: &FieldLattice) -> Result<FieldSliceExporter> {
        let exporter = FieldSliceExporter::new(self.component()?, self.axis, self.slice_index()?)
            .with_period(self.period);
        exporter.validate(lattice)?;
        Ok(exporter)
    }
}

static RENDER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Handle one JSON request: simulate to `maxTime`, record the configured
/// slice and return the GIF bytes. The temporary GIF in `workdir` is removed.
pub fn render_request(json: &str, workdir: &Path) -> Result<Vec<u8>> {
    let request = SimulationRequest::from_json(json)?;
    let config = &request.grid_config;

    let mut sim = config.build_simulation()?;
    sim.set_show_progress(false);
    let mut exporter = config.exporter(sim.lattice())?;

    info!(
        "Rendering {} slice (axis {}, index {}) of a {}x{}x{} lattice over {} steps",
        exporter.component(),
        exporter.axis(),
        exporter.index(),
        config.sx,
        config.sy,
        config.sz,
        config.max_time
    );
    exporter.record(&mut sim, config.max_time)?;

    let name = format!(
        "yee3d-{}-{}.gif",
        std::process::id(),
        RENDER_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    exporter.to_gif_bytes(workdir.join(name))
}
