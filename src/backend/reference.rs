//! Built-in reference platform: a deterministic CPU mirror of the backend.
//!
//! This adapter exists so the bridge can be exercised end-to-end without a
//! GPU: it owns the full lifecycle (context construction, stepping, masked
//! state queries) but integrates only the harmonic-bond terms of the model
//! with velocity-Verlet. It is a validation mirror, not a production engine;
//! adapters for real backends own integrator and force fidelity.

use std::collections::HashMap;
use std::sync::Mutex;

use super::system::{BackendSystem, ForceTerm, HarmonicBond, IntegratorSpec};
use super::{BackendError, Context, MemoryDiagnostic, Platform, RawState, StateSelection};

/// The always-available CPU platform, registered during plugin loading.
#[derive(Debug, Default)]
pub struct ReferencePlatform {
    properties: Mutex<HashMap<String, String>>,
}

impl ReferencePlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Platform for ReferencePlatform {
    fn name(&self) -> &str {
        "Reference"
    }

    fn is_accelerator(&self) -> bool {
        false
    }

    fn set_property(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.properties
            .lock()
            .expect("reference platform properties poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn property(&self, key: &str) -> Option<String> {
        self.properties
            .lock()
            .expect("reference platform properties poisoned")
            .get(key)
            .cloned()
    }

    fn property_names(&self) -> Vec<String> {
        self.properties
            .lock()
            .expect("reference platform properties poisoned")
            .keys()
            .cloned()
            .collect()
    }

    fn device_name(&self, _device_id: i64) -> Option<String> {
        None
    }

    fn diagnostics(&self) -> Option<&dyn MemoryDiagnostic> {
        None
    }

    fn create_context(
        &self,
        system: &BackendSystem,
        integrator: &IntegratorSpec,
    ) -> Result<Box<dyn Context>, BackendError> {
        Ok(Box::new(ReferenceContext::new(system, integrator)))
    }
}

/// CPU execution context backing [`ReferencePlatform`].
pub struct ReferenceContext {
    masses: Vec<f64>,
    bonds: Vec<HarmonicBond>,
    time_step: f64,
    time: f64,
    positions: Vec<[f64; 3]>,
    velocities: Vec<[f64; 3]>,
}

impl ReferenceContext {
    fn new(system: &BackendSystem, integrator: &IntegratorSpec) -> Self {
        let bonds = system
            .forces
            .iter()
            .filter_map(|f| match f {
                ForceTerm::HarmonicBonds(bonds) => Some(bonds.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        let n = system.num_particles();
        Self {
            masses: system.particle_masses.clone(),
            bonds,
            time_step: integrator.time_step(),
            time: 0.0,
            positions: vec![[0.0; 3]; n],
            velocities: vec![[0.0; 3]; n],
        }
    }

    fn check_length(&self, what: &str, len: usize) -> Result<(), BackendError> {
        if len != self.masses.len() {
            return Err(BackendError::new(format!(
                "{what} array has {len} entries for a {}-particle system",
                self.masses.len()
            )));
        }
        Ok(())
    }

    /// Harmonic-bond forces and potential energy at the current positions.
    fn evaluate(&self) -> (Vec<[f64; 3]>, f64) {
        let mut forces = vec![[0.0; 3]; self.masses.len()];
        let mut potential = 0.0;
        for bond in &self.bonds {
            let (ri, rj) = (self.positions[bond.i], self.positions[bond.j]);
            let d = [rj[0] - ri[0], rj[1] - ri[1], rj[2] - ri[2]];
            let r = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            let dr = r - bond.length;
            potential += 0.5 * bond.k * dr * dr;
            if r > 0.0 {
                let scale = bond.k * dr / r;
                for axis in 0..3 {
                    forces[bond.i][axis] += scale * d[axis];
                    forces[bond.j][axis] -= scale * d[axis];
                }
            }
        }
        (forces, potential)
    }

    fn kinetic_energy(&self) -> f64 {
        self.masses
            .iter()
            .zip(&self.velocities)
            .map(|(m, v)| 0.5 * m * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
            .sum()
    }
}

impl Context for ReferenceContext {
    fn set_positions(&mut self, positions: &[[f64; 3]]) -> Result<(), BackendError> {
        self.check_length("position", positions.len())?;
        self.positions.copy_from_slice(positions);
        Ok(())
    }

    fn set_velocities(&mut self, velocities: &[[f64; 3]]) -> Result<(), BackendError> {
        self.check_length("velocity", velocities.len())?;
        self.velocities.copy_from_slice(velocities);
        Ok(())
    }

    fn step(&mut self, steps: u64) -> Result<(), BackendError> {
        let dt = self.time_step;
        let (mut forces, _) = self.evaluate();
        for _ in 0..steps {
            for i in 0..self.masses.len() {
                // Zero mass marks a fixed particle.
                if self.masses[i] == 0.0 {
                    continue;
                }
                let inv_m = 1.0 / self.masses[i];
                for axis in 0..3 {
                    self.velocities[i][axis] += 0.5 * dt * forces[i][axis] * inv_m;
                    self.positions[i][axis] += dt * self.velocities[i][axis];
                }
            }
            let (new_forces, _) = self.evaluate();
            for i in 0..self.masses.len() {
                if self.masses[i] == 0.0 {
                    continue;
                }
                let inv_m = 1.0 / self.masses[i];
                for axis in 0..3 {
                    self.velocities[i][axis] += 0.5 * dt * new_forces[i][axis] * inv_m;
                }
            }
            forces = new_forces;
            self.time += dt;
        }
        Ok(())
    }

    fn state(&mut self, selection: StateSelection) -> Result<RawState, BackendError> {
        let mut raw = RawState {
            time: self.time,
            ..RawState::default()
        };
        if selection.positions {
            raw.positions = Some(self.positions.clone());
        }
        if selection.velocities {
            raw.velocities = Some(self.velocities.clone());
        }
        if selection.forces || selection.energy {
            let (forces, potential) = self.evaluate();
            if selection.forces {
                raw.forces = Some(forces);
            }
            if selection.energy {
                raw.potential_energy = Some(potential);
                raw.kinetic_energy = Some(self.kinetic_energy());
            }
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::system::{ForceTerm, HarmonicBond};

    fn two_atom_system() -> (BackendSystem, IntegratorSpec) {
        let mut system = BackendSystem::new();
        system.add_particle(12.011);
        system.add_particle(12.011);
        system.add_force(ForceTerm::HarmonicBonds(vec![HarmonicBond {
            i: 0,
            j: 1,
            length: 0.1,
            k: 1000.0,
        }]));
        let integrator = IntegratorSpec::Verlet {
            time_step: 0.002,
            constraint_tolerance: 1e-4,
        };
        (system, integrator)
    }

    #[test]
    fn rejects_mismatched_state_arrays() {
        let (system, integrator) = two_atom_system();
        let mut ctx = ReferenceContext::new(&system, &integrator);
        assert!(ctx.set_positions(&[[0.0; 3]]).is_err());
    }

    #[test]
    fn equilibrium_bond_has_zero_energy_and_forces() {
        let (system, integrator) = two_atom_system();
        let mut ctx = ReferenceContext::new(&system, &integrator);
        ctx.set_positions(&[[0.0; 3], [0.1, 0.0, 0.0]]).unwrap();
        let raw = ctx
            .state(StateSelection {
                forces: true,
                energy: true,
                ..Default::default()
            })
            .unwrap();
        assert!(raw.potential_energy.unwrap().abs() < 1e-12);
        let f = raw.forces.unwrap();
        assert!(f[0][0].abs() < 1e-12 && f[1][0].abs() < 1e-12);
    }

    #[test]
    fn stretched_bond_pulls_atoms_together() {
        let (system, integrator) = two_atom_system();
        let mut ctx = ReferenceContext::new(&system, &integrator);
        ctx.set_positions(&[[0.0; 3], [0.12, 0.0, 0.0]]).unwrap();
        let raw = ctx
            .state(StateSelection {
                forces: true,
                energy: true,
                ..Default::default()
            })
            .unwrap();
        // V = 0.5 * 1000 * 0.02^2
        assert!((raw.potential_energy.unwrap() - 0.2).abs() < 1e-10);
        let f = raw.forces.unwrap();
        assert!(f[0][0] > 0.0 && f[1][0] < 0.0);
    }

    #[test]
    fn stepping_advances_time_and_conserves_energy_roughly() {
        let (system, integrator) = two_atom_system();
        let mut ctx = ReferenceContext::new(&system, &integrator);
        ctx.set_positions(&[[0.0; 3], [0.105, 0.0, 0.0]]).unwrap();
        let before = ctx.state(StateSelection::energy_only()).unwrap();
        let e0 = before.potential_energy.unwrap() + before.kinetic_energy.unwrap();
        ctx.step(100).unwrap();
        let after = ctx.state(StateSelection::energy_only()).unwrap();
        let e1 = after.potential_energy.unwrap() + after.kinetic_energy.unwrap();
        assert!((after.time - 0.2).abs() < 1e-12);
        assert!((e1 - e0).abs() < 1e-3 * e0.abs().max(1.0));
    }

    #[test]
    fn platform_properties_round_trip() {
        let platform = ReferencePlatform::new();
        platform.set_property("device-id", "0").unwrap();
        assert_eq!(platform.property("device-id").as_deref(), Some("0"));
        assert!(platform.property("missing").is_none());
        assert!(!platform.is_accelerator());
        assert!(platform.diagnostics().is_none());
    }
}
