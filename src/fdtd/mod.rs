//! FDTD core: lattice state, update engines, waveforms and the simulation
//! controller.

mod basic_engine;
mod engine_impl;
mod excitation;
mod lattice;
mod parallel_engine;
mod simulation;

pub use basic_engine::BasicEngine;
pub use engine_impl::{Engine, EngineImpl, EngineType};
pub use excitation::{dipole_pulse, harmonic_pulse, ricker_pulse, Waveform};
pub use lattice::{require_binding, FieldComponent, FieldLattice, LatticeBinding, UpdateCoefficients};
pub use parallel_engine::ParallelEngine;
pub use simulation::{
    CancelHandle, Simulation, SimulationState, SimulationStats, TerminationReason,
};
