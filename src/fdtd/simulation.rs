//! High-level simulation control.
//!
//! [`Simulation`] owns the lattice, the update engine and the registered
//! boundary conditions and sources, and drives the leapfrog cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::{debug, info, warn};

use crate::extensions::{BoundaryCondition, DipoleSource, FirstOrderAbc, Source};
use crate::fdtd::{Engine, EngineImpl, EngineType, FieldComponent, FieldLattice};
use crate::{Error, Result};

/// Simulation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Ready to step
    Ready,
    /// Inside `run`
    Running,
    /// Reached the final time step
    Finished,
    /// Last run was cancelled or failed
    Stopped,
}

/// Why a run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Reached the requested end time
    Completed,
    /// Cancelled through a [`CancelHandle`]
    Cancelled,
}

/// Statistics from a simulation run
#[derive(Debug, Clone)]
pub struct SimulationStats {
    /// Timesteps executed by this run
    pub timesteps: u64,
    /// Lattice time when the run returned
    pub end_time: u64,
    /// Wall clock time (seconds)
    pub wall_time: f64,
    /// Peak field energy over the sampled steps
    pub peak_energy: f64,
    /// Final field energy
    pub final_energy: f64,
    /// Average speed (million cells per second)
    pub speed_mcells_per_sec: f64,
    pub termination: TerminationReason,
}

/// Cooperative cancellation flag for a running simulation.
///
/// The flag is checked between steps; a cancelled run returns normally with
/// [`TerminationReason::Cancelled`] and the lattice left at a whole step.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Main simulation controller.
pub struct Simulation {
    lattice: FieldLattice,
    engine: Engine,
    /// Boundary conditions, updated in registration order
    boundaries: Vec<Box<dyn BoundaryCondition>>,
    sources: Vec<Box<dyn Source>>,
    state: SimulationState,
    /// Verbosity level
    verbose: u8,
    /// Show progress bar
    show_progress: bool,
    /// Steps between energy samples and finiteness checks
    check_interval: u64,
    cancel: CancelHandle,
}

impl Simulation {
    /// Wrap a lattice with the basic engine and no extensions.
    pub fn new(lattice: FieldLattice) -> Self {
        Self {
            lattice,
            engine: Engine::new(EngineType::default()),
            boundaries: Vec::new(),
            sources: Vec::new(),
            state: SimulationState::Ready,
            verbose: 1,
            show_progress: true,
            check_interval: 100,
            cancel: CancelHandle::default(),
        }
    }

    /// Vacuum lattice with a centered `Ex` dipole and a first-order Mur
    /// boundary on all six faces.
    pub fn with_defaults(sx: usize, sy: usize, sz: usize, max_time: u64) -> Result<Self> {
        let lattice = FieldLattice::new(sx, sy, sz, max_time)?;
        let mut sim = Self::new(lattice);
        sim.add_source(DipoleSource::centered(FieldComponent::Ex))?;
        sim.add_boundary(FirstOrderAbc::new())?;
        Ok(sim)
    }

    /// Set engine type.
    pub fn set_engine_type(&mut self, engine_type: EngineType) -> &mut Self {
        self.engine = Engine::new(engine_type);
        self
    }

    /// Set verbosity level (0=quiet, 1=normal, 2=verbose).
    pub fn set_verbose(&mut self, level: u8) -> &mut Self {
        self.verbose = level;
        self
    }

    /// Enable/disable progress bar.
    pub fn set_show_progress(&mut self, show: bool) -> &mut Self {
        self.show_progress = show;
        self
    }

    /// Set the number of steps between energy samples and non-finite checks.
    /// Zero disables the periodic check; the final state is always checked.
    pub fn set_check_interval(&mut self, interval: u64) -> &mut Self {
        self.check_interval = interval;
        self
    }

    /// Bind `boundary` to the lattice and append it to the update order.
    pub fn add_boundary<B>(&mut self, mut boundary: B) -> Result<&mut Self>
    where
        B: BoundaryCondition + 'static,
    {
        boundary.bind(&self.lattice)?;
        self.boundaries.push(Box::new(boundary));
        Ok(self)
    }

    /// Bind `source` to the lattice and register it.
    pub fn add_source<S>(&mut self, mut source: S) -> Result<&mut Self>
    where
        S: Source + 'static,
    {
        source.bind(&self.lattice)?;
        self.sources.push(Box::new(source));
        Ok(self)
    }

    pub fn lattice(&self) -> &FieldLattice {
        &self.lattice
    }

    /// Mutable lattice access, e.g. for seeding initial fields.
    pub fn lattice_mut(&mut self) -> &mut FieldLattice {
        &mut self.lattice
    }

    pub fn time(&self) -> u64 {
        self.lattice.time()
    }

    pub fn max_time(&self) -> u64 {
        self.lattice.max_time()
    }

    pub fn engine_type(&self) -> EngineType {
        self.engine.engine_type()
    }

    pub fn boundaries(&self) -> &[Box<dyn BoundaryCondition>] {
        &self.boundaries
    }

    pub fn sources(&self) -> &[Box<dyn Source>] {
        &self.sources
    }

    /// Get the current state.
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Handle for cancelling `run` from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    fn ensure_bound(&self) -> Result<()> {
        if let Some(bc) = self
            .boundaries
            .iter()
            .find(|bc| !bc.is_bound_to(&self.lattice))
        {
            return Err(Error::NotBound(bc.name().to_string()));
        }
        if let Some(src) = self
            .sources
            .iter()
            .find(|src| !src.is_bound_to(&self.lattice))
        {
            return Err(Error::NotBound(src.name().to_string()));
        }
        Ok(())
    }

    /// Advance one leapfrog cycle: time, H, E, sources, boundaries.
    ///
    /// Fails without touching the lattice when the final step has been
    /// reached or an extension is not bound.
    pub fn step(&mut self) -> Result<()> {
        if self.lattice.time() >= self.lattice.max_time() {
            return Err(Error::SimulationComplete {
                max_time: self.lattice.max_time(),
            });
        }
        self.ensure_bound()?;
        self.advance()
    }

    // Bindings are checked by the caller.
    fn advance(&mut self) -> Result<()> {
        self.lattice.advance_time();
        self.engine.update_h(&mut self.lattice);
        self.engine.update_e(&mut self.lattice);
        for source in &mut self.sources {
            source.update(&mut self.lattice)?;
        }
        for boundary in &mut self.boundaries {
            boundary.update(&mut self.lattice)?;
        }
        if self.lattice.time() == self.lattice.max_time() {
            self.state = SimulationState::Finished;
        }
        Ok(())
    }

    /// Run until `time == max_time`.
    pub fn run_to_max(&mut self) -> Result<SimulationStats> {
        self.run(self.lattice.max_time())
    }

    /// Run until `time == end_time`.
    ///
    /// Fails with [`Error::SimulationComplete`] when the lattice is already at
    /// its final step and with [`Error::InvalidTimeRange`] when `end_time`
    /// lies outside `time..=max_time`. Neither failure changes the lattice.
    pub fn run(&mut self, end_time: u64) -> Result<SimulationStats> {
        self.run_observed(end_time, |_| Ok(()))
    }

    /// [`run`](Self::run), calling `observer` with the lattice before every
    /// step.
    pub fn run_observed<F>(&mut self, end_time: u64, mut observer: F) -> Result<SimulationStats>
    where
        F: FnMut(&FieldLattice) -> Result<()>,
    {
        let time = self.lattice.time();
        let max_time = self.lattice.max_time();
        if time >= max_time {
            return Err(Error::SimulationComplete { max_time });
        }
        if end_time > max_time || end_time < time {
            return Err(Error::InvalidTimeRange {
                end_time,
                time,
                max_time,
            });
        }
        self.ensure_bound()?;

        let steps = end_time - time;
        if self.verbose >= 1 {
            self.log_setup(steps);
        }

        let progress = if self.show_progress {
            let pb = ProgressBar::new(steps);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec})")
            {
                pb.set_style(style.progress_chars("##-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        self.state = SimulationState::Running;
        let start_time = Instant::now();
        let (termination, timesteps_run, mut peak_energy) =
            match self.step_until(end_time, &mut observer, &progress) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.state = SimulationState::Stopped;
                    progress.abandon_with_message("Simulation failed");
                    warn!(
                        "Simulation stopped at timestep {}: {}",
                        self.lattice.time(),
                        e
                    );
                    return Err(e);
                }
            };

        let final_energy = self.lattice.energy();
        peak_energy = peak_energy.max(final_energy);
        let wall_time = start_time.elapsed().as_secs_f64();

        let cells = self.lattice.dimensions().total() as f64;
        let speed = if wall_time > 0.0 {
            timesteps_run as f64 * cells / wall_time / 1e6
        } else {
            0.0
        };

        self.state = match termination {
            TerminationReason::Cancelled => {
                self.cancel.clear();
                progress.abandon_with_message("Simulation cancelled");
                warn!(
                    "Simulation cancelled at timestep {} of {}",
                    self.lattice.time(),
                    end_time
                );
                SimulationState::Stopped
            }
            TerminationReason::Completed => {
                progress.finish_with_message("Simulation complete");
                if self.lattice.time() == max_time {
                    SimulationState::Finished
                } else {
                    SimulationState::Ready
                }
            }
        };

        let stats = SimulationStats {
            timesteps: timesteps_run,
            end_time: self.lattice.time(),
            wall_time,
            peak_energy,
            final_energy,
            speed_mcells_per_sec: speed,
            termination,
        };

        if self.verbose >= 1 {
            info!(
                "Completed {} timesteps in {:.2}s ({:.2} MC/s)",
                stats.timesteps, stats.wall_time, stats.speed_mcells_per_sec
            );
        }

        Ok(stats)
    }

    // Inner loop of `run_observed`; the caller settles the state on error.
    fn step_until<F>(
        &mut self,
        end_time: u64,
        observer: &mut F,
        progress: &ProgressBar,
    ) -> Result<(TerminationReason, u64, f64)>
    where
        F: FnMut(&FieldLattice) -> Result<()>,
    {
        let mut peak_energy = self.lattice.energy();
        let mut termination = TerminationReason::Completed;
        let mut timesteps_run = 0u64;

        while self.lattice.time() < end_time {
            if self.cancel.is_cancelled() {
                termination = TerminationReason::Cancelled;
                break;
            }

            observer(&self.lattice)?;
            self.advance()?;
            timesteps_run += 1;
            progress.inc(1);

            if self.check_interval > 0 && timesteps_run % self.check_interval == 0 {
                self.lattice.check_finite()?;
                peak_energy = peak_energy.max(self.lattice.energy());
            }
        }

        self.lattice.check_finite()?;
        Ok((termination, timesteps_run, peak_energy))
    }

    fn log_setup(&self, steps: u64) {
        let dims = self.lattice.dimensions();
        // Six fields plus their decay and curl coefficients, all f32.
        let bytes = FieldComponent::ALL
            .iter()
            .map(|&c| self.lattice.field(c).dimensions().total() * 3 * 4)
            .sum::<usize>();

        info!(
            "FDTD simulation size: {}x{}x{} -> {} cells",
            dims.nx,
            dims.ny,
            dims.nz,
            dims.total()
        );
        info!(
            "Running {} timesteps ({} -> {}) with the {:?} engine",
            steps,
            self.lattice.time(),
            self.lattice.time() + steps,
            self.engine.engine_type()
        );
        info!("Estimated memory: {:.2} MB", bytes as f64 / (1024.0 * 1024.0));
        if self.verbose >= 2 {
            info!(
                "Impedance {:.3}, Courant {:.6}, {} source(s), {} boundary condition(s)",
                self.lattice.impedance(),
                self.lattice.courant(),
                self.sources.len(),
                self.boundaries.len()
            );
        }
    }

    /// Reinitialize the lattice to `time = 0`.
    ///
    /// Every registered boundary and source is unbound; call
    /// [`rebind`](Self::rebind) before stepping again.
    pub fn reset(&mut self) {
        self.lattice.reset();
        for boundary in &mut self.boundaries {
            boundary.unbind();
        }
        for source in &mut self.sources {
            source.unbind();
        }
        self.cancel.clear();
        self.state = SimulationState::Ready;
        debug!(
            "Simulation reset, {} extension(s) awaiting rebind",
            self.boundaries.len() + self.sources.len()
        );
    }

    /// Bind every registered boundary and source to the current lattice.
    pub fn rebind(&mut self) -> Result<()> {
        for boundary in &mut self.boundaries {
            boundary.bind(&self.lattice)?;
        }
        for source in &mut self.sources {
            source.bind(&self.lattice)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COURANT;

    fn quiet(mut sim: Simulation) -> Simulation {
        sim.set_verbose(0).set_show_progress(false);
        sim
    }

    #[test]
    fn test_simulation_basic() {
        let mut sim = quiet(Simulation::with_defaults(12, 12, 12, 40).unwrap());
        assert_eq!(sim.boundaries().len(), 1);
        assert_eq!(sim.sources().len(), 1);

        let stats = sim.run_to_max().unwrap();
        assert_eq!(stats.timesteps, 40);
        assert_eq!(stats.end_time, 40);
        assert_eq!(stats.termination, TerminationReason::Completed);
        assert_eq!(sim.time(), 40);
        assert_eq!(sim.state(), SimulationState::Finished);
        assert!(stats.peak_energy >= stats.final_energy);

        assert!(matches!(
            sim.run_to_max(),
            Err(Error::SimulationComplete { max_time: 40 })
        ));
        assert!(matches!(
            sim.step(),
            Err(Error::SimulationComplete { .. })
        ));
        assert_eq!(sim.time(), 40);
    }

    #[test]
    fn test_run_in_segments() {
        let mut sim = quiet(Simulation::with_defaults(8, 8, 8, 30).unwrap());
        let first = sim.run(10).unwrap();
        assert_eq!(first.timesteps, 10);
        assert_eq!(sim.state(), SimulationState::Ready);

        // Running to the current time is an empty run.
        assert_eq!(sim.run(10).unwrap().timesteps, 0);

        let second = sim.run_to_max().unwrap();
        assert_eq!(second.timesteps, 20);
        assert_eq!(sim.time(), 30);
    }

    #[test]
    fn test_invalid_time_range() {
        let mut sim = quiet(Simulation::with_defaults(6, 6, 6, 20).unwrap());
        assert!(matches!(
            sim.run(21),
            Err(Error::InvalidTimeRange {
                end_time: 21,
                time: 0,
                max_time: 20
            })
        ));
        assert_eq!(sim.time(), 0);

        sim.run(5).unwrap();
        assert!(matches!(
            sim.run(3),
            Err(Error::InvalidTimeRange { time: 5, .. })
        ));
        assert_eq!(sim.time(), 5);
    }

    #[test]
    fn test_step_order_injects_after_curl() {
        let lattice = FieldLattice::new(7, 7, 7, 10).unwrap();
        let mut sim = quiet(Simulation::new(lattice));
        let source = DipoleSource::centered(FieldComponent::Ex).with_width(3.0 * COURANT);
        let expected = source.sample(1) as f32;
        sim.add_source(source).unwrap();

        sim.step().unwrap();
        // Fields start at zero, so after one step only the injected cell is set.
        assert_eq!(sim.lattice().field(FieldComponent::Ex).get(3, 3, 3), expected);
        assert_eq!(sim.lattice().h_field().energy(), 0.0);
    }

    #[test]
    fn test_reset_requires_rebind() {
        let mut sim = quiet(Simulation::with_defaults(8, 8, 8, 20).unwrap());
        sim.run(10).unwrap();
        sim.reset();
        assert_eq!(sim.time(), 0);
        assert_eq!(sim.lattice().energy(), 0.0);

        assert!(matches!(sim.step(), Err(Error::NotBound(_))));
        assert!(matches!(sim.run(5), Err(Error::NotBound(_))));
        assert_eq!(sim.time(), 0);

        sim.rebind().unwrap();
        assert_eq!(sim.run_to_max().unwrap().timesteps, 20);
    }

    #[test]
    fn test_reset_reproduces_run() {
        let mut sim = quiet(Simulation::new(FieldLattice::new(9, 9, 9, 15).unwrap()));
        sim.add_source(DipoleSource::centered(FieldComponent::Ex).with_width(5.0 * COURANT))
            .unwrap();
        sim.add_boundary(FirstOrderAbc::new()).unwrap();

        sim.run_to_max().unwrap();
        let first = sim.lattice().field(FieldComponent::Ex).clone();

        sim.reset();
        sim.rebind().unwrap();
        sim.run_to_max().unwrap();
        assert_eq!(sim.lattice().field(FieldComponent::Ex), &first);
    }

    #[test]
    fn test_instability_detected() {
        let mut sim = quiet(Simulation::with_defaults(6, 6, 6, 20).unwrap());
        sim.set_check_interval(1);
        sim.lattice_mut()
            .field_mut(FieldComponent::Hz)
            .set(2, 2, 2, f32::NAN);

        match sim.run(10) {
            Err(Error::NumericalInstability { time, .. }) => assert_eq!(time, 1),
            other => panic!("expected instability, got {other:?}"),
        }
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[test]
    fn test_failed_run_leaves_stopped_state() {
        let mut sim = quiet(Simulation::with_defaults(6, 6, 6, 20).unwrap());
        sim.set_check_interval(0);
        sim.lattice_mut()
            .field_mut(FieldComponent::Ez)
            .set(1, 1, 1, f32::INFINITY);
        assert!(matches!(
            sim.run(5),
            Err(Error::NumericalInstability { time: 5, .. })
        ));
        assert_eq!(sim.state(), SimulationState::Stopped);

        let mut sim = quiet(Simulation::with_defaults(6, 6, 6, 20).unwrap());
        let result = sim.run_observed(10, |lattice| {
            if lattice.time() == 3 {
                Err(Error::Config("observer failed".into()))
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(sim.time(), 3);
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[test]
    fn test_cancel_before_run() {
        let mut sim = quiet(Simulation::with_defaults(6, 6, 6, 20).unwrap());
        let handle = sim.cancel_handle();
        handle.cancel();

        let stats = sim.run_to_max().unwrap();
        assert_eq!(stats.termination, TerminationReason::Cancelled);
        assert_eq!(stats.timesteps, 0);
        assert_eq!(sim.state(), SimulationState::Stopped);
        assert!(!handle.is_cancelled());

        // The flag is consumed; the next run completes.
        let stats = sim.run_to_max().unwrap();
        assert_eq!(stats.termination, TerminationReason::Completed);
        assert_eq!(sim.time(), 20);
    }

    #[test]
    fn test_cancel_from_observer() {
        let mut sim = quiet(Simulation::with_defaults(6, 6, 6, 20).unwrap());
        let handle = sim.cancel_handle();

        let stats = sim
            .run_observed(20, |lattice| {
                if lattice.time() == 7 {
                    handle.cancel();
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(stats.termination, TerminationReason::Cancelled);
        assert_eq!(sim.time(), 8);
    }

    #[test]
    fn test_observer_sees_pre_step_lattice() {
        let mut sim = quiet(Simulation::with_defaults(6, 6, 6, 5).unwrap());
        let mut seen = Vec::new();
        sim.run_observed(5, |lattice| {
            seen.push(lattice.time());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_engines_agree_through_simulation() {
        let run = |engine| {
            let mut sim = quiet(Simulation::new(FieldLattice::new(10, 9, 8, 25).unwrap()));
            sim.set_engine_type(engine);
            sim.add_source(DipoleSource::centered(FieldComponent::Ex).with_width(4.0 * COURANT))
                .unwrap();
            sim.add_boundary(FirstOrderAbc::new()).unwrap();
            sim.run_to_max().unwrap();
            sim
        };
        let basic = run(EngineType::Basic);
        let parallel = run(EngineType::Parallel);
        assert_eq!(parallel.engine_type(), EngineType::Parallel);
        for c in FieldComponent::ALL {
            assert_eq!(basic.lattice().field(c), parallel.lattice().field(c));
        }
        assert_eq!(basic.lattice().energy(), parallel.lattice().energy());
    }
}
