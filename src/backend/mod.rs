//! Backend capability surface.
//!
//! The external simulation engine is consumed only through the traits here:
//! a [`Platform`] constructs execution contexts from a [`BackendSystem`] and
//! [`IntegratorSpec`], and a [`Context`] advances the integrator and answers
//! masked state queries. The bridge is polymorphic over platforms — one
//! concrete adapter per actual engine backend, plus the built-in
//! [`reference`] platform used for validation.
//!
//! Failures cross this boundary as [`BackendError`] (the engine's own report,
//! an opaque message); the bridge wraps them with the phase that triggered
//! the call.
//!
//! [`BackendSystem`]: system::BackendSystem
//! [`IntegratorSpec`]: system::IntegratorSpec

use std::fmt;

pub mod plugins;
pub mod reference;
pub mod system;

use system::{BackendSystem, IntegratorSpec};

/// An error reported by the backend engine itself.
#[derive(Debug, Clone)]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BackendError {}

impl From<&str> for BackendError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for BackendError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Which state fields a [`Context::state`] query should fetch.
///
/// Copying state off the device is the bridge's main bottleneck; only the
/// requested subsets are transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateSelection {
    pub positions: bool,
    pub velocities: bool,
    pub forces: bool,
    pub energy: bool,
}

impl StateSelection {
    pub fn all() -> Self {
        Self {
            positions: true,
            velocities: true,
            forces: true,
            energy: true,
        }
    }

    pub fn energy_only() -> Self {
        Self {
            energy: true,
            ..Self::default()
        }
    }

    /// True when nothing is requested; such a query is a no-op.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.positions || self.velocities || self.forces || self.energy)
    }
}

/// State fetched from a context, filtered by the request mask.
#[derive(Debug, Clone, Default)]
pub struct RawState {
    /// Simulation time (ps).
    pub time: f64,
    pub positions: Option<Vec<[f64; 3]>>,
    pub velocities: Option<Vec<[f64; 3]>>,
    pub forces: Option<Vec<[f64; 3]>>,
    pub potential_energy: Option<f64>,
    pub kinetic_energy: Option<f64>,
}

/// Memory self-test mode resolved from the `memtest` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemtestMode {
    /// Wall-clock-bounded test of roughly this many seconds.
    Timed(u32),
    /// Exhaustive test.
    Full,
}

/// Device-memory diagnostic offered by accelerator platforms.
///
/// Returns the number of memory errors detected; any nonzero count makes
/// simulation results untrustworthy and is treated as fatal by the caller.
pub trait MemoryDiagnostic: Send + Sync {
    fn run(&self, mode: MemtestMode) -> Result<u64, BackendError>;
}

/// One execution platform of the backend engine.
///
/// Adapters are registered process-wide (see [`plugins`]) and selected by
/// case-insensitive name match against the `platform` option.
pub trait Platform: Send + Sync {
    /// Platform name as matched against the `platform` option.
    fn name(&self) -> &str;

    /// True for GPU-accelerated platforms, which get the device capability
    /// check and the pre-/post-run memory diagnostic.
    fn is_accelerator(&self) -> bool;

    /// Sets a platform property's default value before context construction.
    fn set_property(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Reads a platform property.
    fn property(&self, key: &str) -> Option<String>;

    /// Names of the properties the platform exposes.
    fn property_names(&self) -> Vec<String>;

    /// The marketing name of the device with the given id, or `None` when
    /// the platform cannot identify it. The bridge checks the name against
    /// its supported-hardware table.
    fn device_name(&self, device_id: i64) -> Option<String>;

    /// The platform's memory diagnostic, if it has one.
    fn diagnostics(&self) -> Option<&dyn MemoryDiagnostic>;

    /// Builds an execution context bound to this platform.
    fn create_context(
        &self,
        system: &BackendSystem,
        integrator: &IntegratorSpec,
    ) -> Result<Box<dyn Context>, BackendError>;
}

impl std::fmt::Debug for dyn Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").field("name", &self.name()).finish()
    }
}

/// A live execution context: one device binding, one integrator, one system.
pub trait Context: Send {
    fn set_positions(&mut self, positions: &[[f64; 3]]) -> Result<(), BackendError>;

    fn set_velocities(&mut self, velocities: &[[f64; 3]]) -> Result<(), BackendError>;

    /// Advances the integrator by exactly `steps` steps; blocking.
    fn step(&mut self, steps: u64) -> Result<(), BackendError>;

    /// Fetches the requested state subsets.
    fn state(&mut self, selection: StateSelection) -> Result<RawState, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection() {
        assert!(StateSelection::default().is_empty());
        assert!(!StateSelection::energy_only().is_empty());
        assert!(!StateSelection::all().is_empty());
    }

    #[test]
    fn backend_error_display() {
        let err = BackendError::new("out of device memory");
        assert_eq!(err.to_string(), "out of device memory");
    }
}
