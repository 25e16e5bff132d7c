//! A bridge that runs a host molecular-dynamics package's simulations on an
//! external GPU-accelerated engine. It translates the host's in-memory
//! topology and run options into the engine's object graph, drives the
//! integrator in blocks of steps, and copies the selected state subsets back
//! in the host's units and conventions.
//!
//! # Features
//!
//! - **Compatibility checking** — Validates the host configuration against
//!   the backend's feature subset up front, failing fast with a specific
//!   message for each unsupported feature
//! - **Model translation** — Bonded terms, Urey-Bradley splitting, torsions
//!   with degree-to-radian conversion, `(c12, c6)` → `(sigma, epsilon)`
//!   Lennard-Jones conversion, exclusions and scaled 1-4 exceptions,
//!   implicit solvent, and rigid-water expansion into pairwise constraints
//! - **Platform selection** — Plugin discovery, case-insensitive platform
//!   matching, a supported-hardware check for accelerator devices, and
//!   pre-/post-run device memory self-tests
//! - **State copy-back** — Masked state queries so only the requested
//!   subsets cross the device boundary, with instantaneous temperature
//!   derived from the kinetic energy and the run's degrees of freedom
//!
//! # Quick Start
//!
//! [`initialize`] performs the whole front half of the pipeline and returns
//! a [`RunHandle`] for stepping and state queries:
//!
//! ```no_run
//! use mdbridge::{initialize, HostState, HostSystem, SimulationOptions, StateSelection};
//!
//! # fn main() -> Result<(), mdbridge::Error> {
//! let mut system = HostSystem::new();
//! // ... populate atoms, bonded terms, and exclusions from the host model.
//! let options = SimulationOptions::default();
//! let state = HostState::zeroed(system.num_atoms());
//!
//! let mut run = initialize("platform=CUDA,memtest=30", &system, &options, &state)?;
//! run.step(1000)?;
//!
//! let snapshot = run.copy_state(StateSelection::energy_only())?;
//! if let Some(t) = snapshot.temperature {
//!     println!("T = {t:.1} K");
//! }
//!
//! run.teardown()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`model`] — The host-side input model: topology ([`HostSystem`]), run
//!   options ([`SimulationOptions`]), and dynamical state
//! - [`backend`] — The engine capability surface: the [`Platform`] and
//!   [`Context`] traits, plugin discovery, and the built-in reference
//!   platform used for validation
//! - [`bridge`] — The pipeline itself: option parsing, compatibility
//!   checking, translation, platform selection, and the run handle
//!
//! [`Platform`]: backend::Platform
//! [`Context`]: backend::Context

pub mod backend;
pub mod bridge;
mod error;
pub mod model;

pub use backend::{RawState, StateSelection};
pub use bridge::options::PlatformOptions;
pub use bridge::{initialize, RunHandle, BOLTZMANN};
pub use error::{DiagnosticStage, Error, Result};
pub use model::options::{
    BoundaryKind, ConstraintAlgorithm, ElectrostaticsKind, EwaldGeometry, IntegratorKind,
    SimulationOptions,
};
pub use model::state::{HostState, StateSnapshot};
pub use model::system::HostSystem;
