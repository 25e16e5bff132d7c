//! Host-side data model consumed by the bridge.
//!
//! These types mirror the subset of the host simulation package's in-memory
//! description that the backend can represent:
//!
//! - [`system`] – Topology: per-atom properties, bonded term lists with their
//!   coefficient side tables, constraints, and exclusion sets.
//! - [`options`] – Run options: integrator, electrostatics, boundary
//!   conditions, coupling, and feature flags.
//! - [`state`] – Dynamical state going in ([`HostState`]) and the selected
//!   state subset coming back ([`StateSnapshot`]).
//!
//! The model is read-only input: the bridge queries it through these structs
//! and never mutates it. The parameterization it carries is the host's own;
//! all unit conversion to the backend's conventions happens during
//! translation.
//!
//! [`HostState`]: state::HostState
//! [`StateSnapshot`]: state::StateSnapshot

pub mod options;
pub mod state;
pub mod system;
