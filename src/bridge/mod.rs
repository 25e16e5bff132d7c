//! The bridge pipeline: validate, translate, select, run, copy back.
//!
//! [`initialize`] performs the whole front half in order: option parsing,
//! the compatibility check, platform selection with device binding, the
//! device capability check and pre-run memory test, translation into the
//! backend model, and context construction with the initial state uploaded. The returned
//! [`RunHandle`] then drives stepping and state copy-back, and
//! [`RunHandle::teardown`] finishes the run with the post-run memory test.

pub mod check;
pub mod convert;
pub mod devices;
pub mod options;
pub mod select;
pub mod translate;

use log::info;
use std::sync::Arc;

use crate::backend::system::{BackendSystem, IntegratorSpec};
use crate::backend::{Context, Platform, StateSelection};
use crate::error::{DiagnosticStage, Error, Result};
use crate::model::options::SimulationOptions;
use crate::model::state::{HostState, StateSnapshot};
use crate::model::system::HostSystem;
use options::{keys, PlatformOptions};

/// Boltzmann constant in kJ/(mol·K), the host package's energy units.
pub const BOLTZMANN: f64 = 8.314_462_618e-3;

/// Validates inputs, selects a platform, and builds a running context.
///
/// `option_string` is the user-facing comma-separated option list (see
/// [`options`]). The host model must already be complete; `state` must carry
/// one position and one velocity per atom.
pub fn initialize(
    option_string: &str,
    system: &HostSystem,
    sim_options: &SimulationOptions,
    state: &HostState,
) -> Result<RunHandle> {
    let platform_options = PlatformOptions::parse(option_string)?;
    check::check_compatibility(system, sim_options)?;
    check_state_shape(system, state)?;

    let platform = select::select_platform(&platform_options)?;
    bind_device(platform.as_ref(), &platform_options)?;
    select::check_device(platform.as_ref(), &platform_options)?;
    select::run_memory_test(platform.as_ref(), &platform_options, DiagnosticStage::Pre)?;

    let translated = translate::translate(system, sim_options)?;

    let mut context = platform
        .create_context(&translated.system, &translated.integrator)
        .map_err(|e| Error::backend("creating the execution context", e))?;
    context
        .set_positions(&state.positions)
        .map_err(|e| Error::backend("uploading initial positions", e))?;
    context
        .set_velocities(&state.velocities)
        .map_err(|e| Error::backend("uploading initial velocities", e))?;

    info!(
        "initialized a bridged run: {} particles, {} constraints, {} platform",
        translated.system.num_particles(),
        translated.system.num_constraints(),
        platform.name()
    );

    Ok(RunHandle {
        context,
        system: translated.system,
        integrator: translated.integrator,
        platform,
        options: platform_options,
        removes_cm: translated.removes_cm,
        steps_taken: 0,
    })
}

fn check_state_shape(system: &HostSystem, state: &HostState) -> Result<()> {
    let n = system.num_atoms();
    if state.positions.len() != n || state.velocities.len() != n {
        return Err(Error::translation(format!(
            "state shape mismatch: {} positions and {} velocities for {n} atoms",
            state.positions.len(),
            state.velocities.len()
        )));
    }
    Ok(())
}

/// Forwards the device selection to accelerator platforms before any
/// device-specific work runs, so the capability check, the memory test, and
/// context construction all target the selected device.
fn bind_device(platform: &dyn Platform, options: &PlatformOptions) -> Result<()> {
    if !platform.is_accelerator() {
        return Ok(());
    }
    if let Some(value) = options.get(keys::DEVICE_ID) {
        platform
            .set_property(keys::DEVICE_ID, value)
            .map_err(|e| Error::backend("binding the device", e))?;
    }
    Ok(())
}

/// A live bridged simulation: the context plus everything needed to
/// interpret its state and to finish the run.
pub struct RunHandle {
    context: Box<dyn Context>,
    system: BackendSystem,
    integrator: IntegratorSpec,
    platform: Arc<dyn Platform>,
    options: PlatformOptions,
    removes_cm: bool,
    steps_taken: u64,
}

impl std::fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunHandle")
            .field("platform", &self.platform.name())
            .field("options", &self.options)
            .field("removes_cm", &self.removes_cm)
            .field("steps_taken", &self.steps_taken)
            .finish_non_exhaustive()
    }
}

impl RunHandle {
    /// Advances the simulation by `steps` integrator steps.
    pub fn step(&mut self, steps: u64) -> Result<()> {
        self.context
            .step(steps)
            .map_err(|e| Error::backend("taking simulation steps", e))?;
        self.steps_taken += steps;
        Ok(())
    }

    /// Copies the selected state subsets back from the backend.
    ///
    /// An empty selection returns a default snapshot without touching the
    /// backend. Requesting energy also yields the instantaneous temperature,
    /// derived from the kinetic energy and the run's degrees of freedom.
    pub fn copy_state(&mut self, selection: StateSelection) -> Result<StateSnapshot> {
        if selection.is_empty() {
            return Ok(StateSnapshot::default());
        }

        let raw = self
            .context
            .state(selection)
            .map_err(|e| Error::backend("copying state from the backend", e))?;

        let temperature = raw.kinetic_energy.and_then(|kinetic| {
            let dof = degrees_of_freedom(
                self.system.num_particles(),
                self.system.num_constraints(),
                self.removes_cm,
            );
            (dof > 0.0).then(|| 2.0 * kinetic / (dof * BOLTZMANN))
        });

        Ok(StateSnapshot {
            time: raw.time,
            positions: raw.positions,
            velocities: raw.velocities,
            forces: raw.forces,
            potential_energy: raw.potential_energy,
            kinetic_energy: raw.kinetic_energy,
            temperature,
        })
    }

    /// The backend system this run executes. Mainly for inspection in
    /// validation harnesses.
    pub fn system(&self) -> &BackendSystem {
        &self.system
    }

    /// The integrator the backend was constructed with.
    pub fn integrator(&self) -> &IntegratorSpec {
        &self.integrator
    }

    /// The platform the run is bound to.
    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    /// Total steps advanced through [`step`](Self::step).
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Finishes the run: post-run memory test, then releases the context
    /// before the system and integrator it was built from.
    pub fn teardown(self) -> Result<()> {
        let result =
            select::run_memory_test(self.platform.as_ref(), &self.options, DiagnosticStage::Post);
        drop(self.context);
        drop(self.system);
        drop(self.integrator);
        drop(self.options);
        result
    }
}

/// Degrees of freedom for the temperature calculation: three per particle,
/// minus one per constraint, minus three when center-of-mass motion is
/// removed.
fn degrees_of_freedom(num_particles: usize, num_constraints: usize, removes_cm: bool) -> f64 {
    let mut dof = 3.0 * num_particles as f64 - num_constraints as f64;
    if removes_cm {
        dof -= 3.0;
    }
    dof
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::state::HostState;
    use crate::model::system::HostSystem;

    #[test]
    fn degrees_of_freedom_accounting() {
        assert_eq!(degrees_of_freedom(2, 0, false), 6.0);
        assert_eq!(degrees_of_freedom(3, 3, false), 6.0);
        assert_eq!(degrees_of_freedom(3, 3, true), 3.0);
        assert_eq!(degrees_of_freedom(1, 0, true), 0.0);
    }

    #[test]
    fn temperature_formula_matches_hand_calculation() {
        // Two particles of mass 12 amu, one moving at 1 nm/ps along x:
        // Ekin = 6 kJ/mol over 6 degrees of freedom.
        let kinetic = 6.0;
        let dof = degrees_of_freedom(2, 0, false);
        let t = 2.0 * kinetic / (dof * BOLTZMANN);
        assert!((t - 240.544_7).abs() < 1e-3);
    }

    #[test]
    fn state_shape_mismatch_is_rejected() {
        let mut system = HostSystem::new();
        system.add_atom(1.0, 0.0, 0);
        system.add_atom(1.0, 0.0, 0);
        let state = HostState::zeroed(1);
        assert!(check_state_shape(&system, &state).is_err());
        let state = HostState::zeroed(2);
        check_state_shape(&system, &state).unwrap();
    }
}
