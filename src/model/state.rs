//! Dynamical state crossing the bridge in both directions.

/// Initial positions and velocities uploaded to the backend at
/// initialization. Both vectors have one entry per atom, in nm and nm/ps.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    pub positions: Vec<[f64; 3]>,
    pub velocities: Vec<[f64; 3]>,
}

impl HostState {
    /// A zeroed state for `num_atoms` atoms.
    pub fn zeroed(num_atoms: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; num_atoms],
            velocities: vec![[0.0; 3]; num_atoms],
        }
    }
}

/// The selected subset of backend state copied back to the host.
///
/// Fields the caller did not request stay `None`; an all-false request
/// yields the default snapshot without a backend round-trip. When energy is
/// requested, `temperature` is derived from the kinetic energy and the run's
/// degrees of freedom.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    /// Simulation time (ps) at which the snapshot was taken.
    pub time: f64,
    pub positions: Option<Vec<[f64; 3]>>,
    pub velocities: Option<Vec<[f64; 3]>>,
    pub forces: Option<Vec<[f64; 3]>>,
    pub potential_energy: Option<f64>,
    pub kinetic_energy: Option<f64>,
    pub temperature: Option<f64>,
}
