//! Animated field slices.
//!
//! [`FieldSliceExporter`] records one plane of one field component while a
//! simulation runs and renders the recorded frames as an animated GIF with
//! `plotters`. All frames share one symmetric color scale so that amplitude
//! changes over time stay visible.

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};
use plotters::prelude::*;

use crate::arrays::Field2D;
use crate::fdtd::{FieldComponent, FieldLattice, Simulation, SimulationStats};
use crate::{Error, Result};

/// Diverging color for `value` on a symmetric scale `[-limit, limit]`.
///
/// Negative values fade from white to blue, positive values from white to
/// red. `limit` must be positive.
pub fn diverging_color(value: f32, limit: f32) -> RGBColor {
    let t = (value / limit).clamp(-1.0, 1.0);
    let fade = |t: f32| (255.0 * (1.0 - t.abs())).round() as u8;
    if t >= 0.0 {
        RGBColor(255, fade(t), fade(t))
    } else {
        RGBColor(fade(t), fade(t), 255)
    }
}

/// Pixel extent of `cells` cells of `cell` pixels, bounded so that every
/// drawing coordinate fits the backend's `i32`.
fn pixel_extent(cells: usize, cell: u32) -> Result<u32> {
    u32::try_from(cells)
        .ok()
        .and_then(|n| n.checked_mul(cell))
        .filter(|&px| i32::try_from(px).is_ok())
        .ok_or_else(|| {
            Error::Render(format!(
                "{cells} cells at {cell} px per cell exceed the image size limit"
            ))
        })
}

/// Removes a temporary file when dropped, on success and error paths alike.
struct TempFile<'a>(&'a Path);

impl Drop for TempFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(self.0) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Could not remove {}: {}", self.0.display(), e);
            }
        }
    }
}

/// Records a fixed plane of one component and renders it as a GIF.
#[derive(Debug, Clone)]
pub struct FieldSliceExporter {
    component: FieldComponent,
    axis: usize,
    index: usize,
    /// Capture a frame whenever `time % period == 0`
    period: u64,
    /// Pixels per lattice cell
    cell_size: u32,
    frame_delay_ms: u32,
    frames: Vec<Field2D>,
}

impl FieldSliceExporter {
    pub fn new(component: FieldComponent, axis: usize, index: usize) -> Self {
        Self {
            component,
            axis,
            index,
            period: 1,
            cell_size: 8,
            frame_delay_ms: 50,
            frames: Vec::new(),
        }
    }

    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    pub fn with_cell_size(mut self, pixels: u32) -> Self {
        self.cell_size = pixels;
        self
    }

    pub fn with_frame_delay(mut self, millis: u32) -> Self {
        self.frame_delay_ms = millis;
        self
    }

    pub fn component(&self) -> FieldComponent {
        self.component
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn frames(&self) -> &[Field2D] {
        &self.frames
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Check the slice selection against `lattice` without capturing.
    pub fn validate(&self, lattice: &FieldLattice) -> Result<()> {
        if self.period == 0 {
            return Err(Error::Config("snapshot period must be at least 1".into()));
        }
        if self.cell_size == 0 {
            return Err(Error::Config("cell size must be at least 1 pixel".into()));
        }
        lattice
            .extract_plane(self.component, self.axis, self.index)
            .map(|_| ())
    }

    /// Append the current plane as a frame.
    pub fn capture(&mut self, lattice: &FieldLattice) -> Result<()> {
        let frame = lattice.extract_plane(self.component, self.axis, self.index)?;
        self.frames.push(frame);
        Ok(())
    }

    /// Capture a frame if the lattice time is a multiple of the period.
    pub fn observe(&mut self, lattice: &FieldLattice) -> Result<()> {
        if lattice.time() % self.period == 0 {
            self.capture(lattice)?;
        }
        Ok(())
    }

    /// Run `sim` to `end_time`, capturing frames before each step.
    pub fn record(&mut self, sim: &mut Simulation, end_time: u64) -> Result<SimulationStats> {
        self.validate(sim.lattice())?;
        let stats = sim.run_observed(end_time, |lattice| self.observe(lattice))?;
        debug!(
            "Recorded {} frame(s) of {} (axis {}, index {})",
            self.frames.len(),
            self.component,
            self.axis,
            self.index
        );
        Ok(stats)
    }

    /// Largest magnitude over all frames, used as the color scale limit.
    pub fn color_limit(&self) -> f32 {
        let limit = self
            .frames
            .iter()
            .map(Field2D::max_abs)
            .fold(0.0f32, f32::max);
        if limit > 0.0 && limit.is_finite() {
            limit
        } else {
            1.0
        }
    }

    /// Render every frame into an animated GIF at `path`.
    pub fn write_gif<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let Some(first) = self.frames.first() else {
            return Err(Error::Render("no frames captured".into()));
        };
        let (rows, cols) = (first.rows(), first.cols());
        let cell = self.cell_size.max(1);
        let size = (pixel_extent(cols, cell)?, pixel_extent(rows, cell)?);
        // Both extents fit i32, so per-cell coordinates do as well.
        let step = cell as i32;
        let limit = self.color_limit();

        let root = BitMapBackend::gif(path.as_ref(), size, self.frame_delay_ms)
            .map_err(|e| Error::Render(e.to_string()))?
            .into_drawing_area();

        for frame in &self.frames {
            root.fill(&WHITE)
                .map_err(|e| Error::Render(e.to_string()))?;
            for r in 0..rows {
                for c in 0..cols {
                    let x0 = c as i32 * step;
                    let y0 = r as i32 * step;
                    let rect = Rectangle::new(
                        [(x0, y0), (x0 + step, y0 + step)],
                        diverging_color(frame.get(r, c), limit).filled(),
                    );
                    root.draw(&rect)
                        .map_err(|e| Error::Render(e.to_string()))?;
                }
            }
            root.present()
                .map_err(|e| Error::Render(e.to_string()))?;
        }

        info!(
            "Wrote {} frame(s) ({}x{} px) to {}",
            self.frames.len(),
            size.0,
            size.1,
            path.as_ref().display()
        );
        Ok(())
    }

    /// Render to `path`, read the GIF back and remove the file. The file is
    /// removed even when rendering or reading fails.
    pub fn to_gif_bytes<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let _cleanup = TempFile(path);
        self.write_gif(path)?;
        Ok(fs::read(path)?)
    }
}
