//! Host run options relevant to the backend translation.

use std::fmt;

/// Integrator selected in the host input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    /// Leap-frog. Not available in the backend; silently substituted with
    /// velocity-Verlet (with a warning).
    LeapFrog,
    VelocityVerlet,
    /// Velocity-Verlet with averaged kinetic energy.
    VelocityVerletAveK,
    /// Stochastic (Langevin) dynamics.
    Langevin,
    /// Brownian dynamics.
    Brownian,
    /// Energy minimization; no backend counterpart.
    SteepestDescent,
}

impl IntegratorKind {
    /// True for the family mapped onto the backend's Verlet integrator.
    #[inline]
    pub fn is_velocity_verlet_family(self) -> bool {
        matches!(
            self,
            Self::LeapFrog | Self::VelocityVerlet | Self::VelocityVerletAveK
        )
    }

    /// True for integrators with their own stochastic thermostatting.
    #[inline]
    pub fn is_stochastic(self) -> bool {
        matches!(self, Self::Langevin | Self::Brownian)
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LeapFrog => "leap-frog",
            Self::VelocityVerlet => "velocity-verlet",
            Self::VelocityVerletAveK => "velocity-verlet-avek",
            Self::Langevin => "langevin",
            Self::Brownian => "brownian",
            Self::SteepestDescent => "steepest-descent",
        };
        f.write_str(name)
    }
}

/// Electrostatics method selected in the host input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectrostaticsKind {
    /// Plain cutoff; supported only as no-cutoff (`rcoulomb == rvdw == 0`).
    Cutoff,
    ReactionField,
    /// Generalized reaction field; no backend counterpart.
    GeneralizedReactionField,
    Ewald,
    Pme,
}

impl ElectrostaticsKind {
    /// True for full (lattice-sum) methods.
    #[inline]
    pub fn is_full(self) -> bool {
        matches!(self, Self::Ewald | Self::Pme)
    }
}

impl fmt::Display for ElectrostaticsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cutoff => "cutoff",
            Self::ReactionField => "reaction-field",
            Self::GeneralizedReactionField => "generalized-reaction-field",
            Self::Ewald => "ewald",
            Self::Pme => "pme",
        };
        f.write_str(name)
    }
}

/// Constraint algorithm selected in the host input.
///
/// The backend enforces all constraints to the SHAKE tolerance; other host
/// algorithms are accepted with a warning about the accuracy difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintAlgorithm {
    Shake,
    Lincs,
}

impl fmt::Display for ConstraintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shake => "shake",
            Self::Lincs => "lincs",
        };
        f.write_str(name)
    }
}

/// Periodic boundary mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    None,
    /// Full 3-D periodicity.
    Xyz,
    /// 2-D periodicity; no backend counterpart.
    Xy,
}

/// Ewald summation geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EwaldGeometry {
    ThreeD,
    /// 3-D with slab correction; no backend counterpart.
    ThreeDCorrected,
}

/// The subset of host run options the bridge inspects.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub integrator: IntegratorKind,
    /// Integration time step (ps).
    pub time_step: f64,

    pub electrostatics: ElectrostaticsKind,
    pub rcoulomb: f64,
    pub rvdw: f64,

    pub boundary: BoundaryKind,
    /// Full 3x3 box matrix; only the diagonal is representable.
    pub box_vectors: [[f64; 3]; 3],
    pub ewald_geometry: EwaldGeometry,
    pub epsilon_surface: f64,

    pub temperature_coupling: bool,
    /// Number of temperature-coupling groups.
    pub coupling_groups: usize,
    /// Reference temperature of the first coupling group (K).
    pub reference_temperature: f64,
    /// Coupling time constant of the first group (ps); 0 disables friction.
    pub tau_t: f64,

    pub pressure_coupling: bool,
    pub annealing: bool,
    pub walls: usize,
    pub pulling: bool,
    pub free_energy: bool,
    pub accelerated_groups: usize,
    pub electric_field: bool,
    pub qmmm: bool,

    pub implicit_solvent: bool,
    pub epsilon_r: f64,
    pub gb_epsilon_solvent: f64,

    pub constraint_algorithm: ConstraintAlgorithm,
    /// SHAKE tolerance; becomes the backend integrator's constraint tolerance.
    pub shake_tolerance: f64,
    /// Seed for stochastic integrators.
    pub random_seed: i64,
    /// Center-of-mass motion removal interval in steps; 0 disables removal.
    pub comm_removal_interval: u32,
}

impl SimulationOptions {
    /// True when any off-diagonal box element is nonzero.
    pub fn is_triclinic(&self) -> bool {
        let b = &self.box_vectors;
        b[0][1] != 0.0
            || b[0][2] != 0.0
            || b[1][0] != 0.0
            || b[1][2] != 0.0
            || b[2][0] != 0.0
            || b[2][1] != 0.0
    }

    /// The diagonal of the box matrix.
    #[inline]
    pub fn box_diagonal(&self) -> [f64; 3] {
        [
            self.box_vectors[0][0],
            self.box_vectors[1][1],
            self.box_vectors[2][2],
        ]
    }
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            integrator: IntegratorKind::VelocityVerlet,
            time_step: 0.002,
            electrostatics: ElectrostaticsKind::Pme,
            rcoulomb: 1.0,
            rvdw: 1.0,
            boundary: BoundaryKind::Xyz,
            box_vectors: [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]],
            ewald_geometry: EwaldGeometry::ThreeD,
            epsilon_surface: 0.0,
            temperature_coupling: false,
            coupling_groups: 1,
            reference_temperature: 300.0,
            tau_t: 0.1,
            pressure_coupling: false,
            annealing: false,
            walls: 0,
            pulling: false,
            free_energy: false,
            accelerated_groups: 0,
            electric_field: false,
            qmmm: false,
            implicit_solvent: false,
            epsilon_r: 1.0,
            gb_epsilon_solvent: 80.0,
            constraint_algorithm: ConstraintAlgorithm::Lincs,
            shake_tolerance: 1e-4,
            random_seed: 1993,
            comm_removal_interval: 0,
        }
    }
}
