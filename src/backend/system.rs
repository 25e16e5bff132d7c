//! The backend-native object graph constructed by the translator.
//!
//! A [`BackendSystem`] is the complete, immutable description handed to a
//! platform when an execution context is created: particle masses, an
//! ordered list of force terms, and the expanded constraint list. Force
//! ordering matters only in that particle indices in every term must match
//! host atom indices 1:1.
//!
//! All angle and phase values here are in radians; the translator converts
//! from the host's degree convention.

/// One pairwise distance constraint in the backend model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub i: usize,
    pub j: usize,
    pub length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicBond {
    pub i: usize,
    pub j: usize,
    pub length: f64,
    pub k: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicAngle {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    /// Equilibrium angle in radians.
    pub angle: f64,
    pub k_force: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicTorsion {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
    pub periodicity: i32,
    /// Phase offset in radians.
    pub phase: f64,
    pub k_force: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RbTorsion {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
    pub c: [f64; 6],
}

/// Nonbonded treatment, selected from the host's boundary mode and
/// electrostatics method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonbondedMethod {
    NoCutoff,
    CutoffNonPeriodic,
    CutoffPeriodic,
    Ewald,
    Pme,
}

/// Per-particle nonbonded parameters in the backend's sigma/epsilon form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedParticle {
    pub charge: f64,
    pub sigma: f64,
    pub epsilon: f64,
}

/// A per-pair override of the default nonbonded interaction.
///
/// Zero-interaction exceptions (`charge_product == 0`, `epsilon == 0`)
/// implement exclusions; scaled exceptions implement 1-4 pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedException {
    pub i: usize,
    pub j: usize,
    pub charge_product: f64,
    pub sigma: f64,
    pub epsilon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NonbondedForce {
    pub method: NonbondedMethod,
    pub cutoff: f64,
    /// Orthogonal box edge lengths; present only for periodic methods.
    pub box_lengths: Option<[f64; 3]>,
    pub particles: Vec<NonbondedParticle>,
    pub exceptions: Vec<NonbondedException>,
}

/// Implicit-solvent boundary treatment; a subset of the nonbonded methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplicitSolventMethod {
    NoCutoff,
    CutoffNonPeriodic,
    CutoffPeriodic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImplicitSolventParticle {
    pub charge: f64,
    pub radius: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplicitSolventForce {
    pub solute_dielectric: f64,
    pub solvent_dielectric: f64,
    pub cutoff: f64,
    pub method: ImplicitSolventMethod,
    pub particles: Vec<ImplicitSolventParticle>,
}

/// One force-like term in the backend model, in construction order.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceTerm {
    CmMotionRemover {
        interval: u32,
    },
    HarmonicBonds(Vec<HarmonicBond>),
    HarmonicAngles(Vec<HarmonicAngle>),
    PeriodicTorsions(Vec<PeriodicTorsion>),
    RbTorsions(Vec<RbTorsion>),
    Nonbonded(NonbondedForce),
    ImplicitSolvent(ImplicitSolventForce),
    AndersenThermostat {
        temperature: f64,
        /// Collision frequency, `1/tau_t` (1/ps).
        frequency: f64,
    },
}

/// Integrator to construct in the backend, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegratorSpec {
    Verlet {
        time_step: f64,
        constraint_tolerance: f64,
    },
    Langevin {
        temperature: f64,
        friction: f64,
        time_step: f64,
        seed: i64,
        constraint_tolerance: f64,
    },
    Brownian {
        temperature: f64,
        friction: f64,
        time_step: f64,
        seed: i64,
        constraint_tolerance: f64,
    },
}

impl IntegratorSpec {
    #[inline]
    pub fn time_step(&self) -> f64 {
        match self {
            Self::Verlet { time_step, .. }
            | Self::Langevin { time_step, .. }
            | Self::Brownian { time_step, .. } => *time_step,
        }
    }

    #[inline]
    pub fn constraint_tolerance(&self) -> f64 {
        match self {
            Self::Verlet {
                constraint_tolerance,
                ..
            }
            | Self::Langevin {
                constraint_tolerance,
                ..
            }
            | Self::Brownian {
                constraint_tolerance,
                ..
            } => *constraint_tolerance,
        }
    }
}

/// The particle/force/constraint graph handed to the platform.
#[derive(Debug, Clone, Default)]
pub struct BackendSystem {
    pub particle_masses: Vec<f64>,
    pub forces: Vec<ForceTerm>,
    pub constraints: Vec<Constraint>,
}

impl BackendSystem {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_particles(&self) -> usize {
        self.particle_masses.len()
    }

    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn add_particle(&mut self, mass: f64) {
        self.particle_masses.push(mass);
    }

    pub fn add_force(&mut self, force: ForceTerm) {
        self.forces.push(force);
    }

    pub fn add_constraint(&mut self, i: usize, j: usize, length: f64) {
        self.constraints.push(Constraint { i, j, length });
    }

    /// The nonbonded force term, if one was constructed.
    pub fn nonbonded(&self) -> Option<&NonbondedForce> {
        self.forces.iter().find_map(|f| match f {
            ForceTerm::Nonbonded(nb) => Some(nb),
            _ => None,
        })
    }

    /// Number of bonded force terms (bond/angle/torsion groups) with at
    /// least one entry.
    pub fn num_bonded_forces(&self) -> usize {
        self.forces
            .iter()
            .filter(|f| match f {
                ForceTerm::HarmonicBonds(v) => !v.is_empty(),
                ForceTerm::HarmonicAngles(v) => !v.is_empty(),
                ForceTerm::PeriodicTorsions(v) => !v.is_empty(),
                ForceTerm::RbTorsions(v) => !v.is_empty(),
                _ => false,
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_track_registration() {
        let mut sys = BackendSystem::new();
        sys.add_particle(15.999);
        sys.add_particle(1.008);
        sys.add_constraint(0, 1, 0.09572);
        assert_eq!(sys.num_particles(), 2);
        assert_eq!(sys.num_constraints(), 1);
    }

    #[test]
    fn nonbonded_lookup_and_bonded_force_count() {
        let mut sys = BackendSystem::new();
        sys.add_force(ForceTerm::HarmonicBonds(vec![HarmonicBond {
            i: 0,
            j: 1,
            length: 0.1,
            k: 1000.0,
        }]));
        sys.add_force(ForceTerm::HarmonicAngles(Vec::new()));
        sys.add_force(ForceTerm::Nonbonded(NonbondedForce {
            method: NonbondedMethod::Ewald,
            cutoff: 1.0,
            box_lengths: Some([2.0, 2.0, 2.0]),
            particles: Vec::new(),
            exceptions: Vec::new(),
        }));
        assert_eq!(sys.num_bonded_forces(), 1);
        let nb = sys.nonbonded().unwrap();
        assert_eq!(nb.method, NonbondedMethod::Ewald);
    }

    #[test]
    fn integrator_accessors() {
        let spec = IntegratorSpec::Langevin {
            temperature: 300.0,
            friction: 10.0,
            time_step: 0.002,
            seed: 1993,
            constraint_tolerance: 1e-4,
        };
        assert_eq!(spec.time_step(), 0.002);
        assert_eq!(spec.constraint_tolerance(), 1e-4);
    }
}
