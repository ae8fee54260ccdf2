//! Core engine types: roles, RNG, configuration, state, errors.
//!
//! This module contains the fundamental building blocks that are
//! game-agnostic. Games describe themselves via a `circuit::Topology`
//! rather than modifying the core.

pub mod config;
pub mod error;
pub mod rng;
pub mod role;
pub mod state;

pub use config::EngineConfig;
pub use error::{EngineError, MalformedCircuitError};
pub use rng::{PlayoutRng, PlayoutRngState};
pub use role::{RoleId, RoleMap};
pub use state::StateVector;
