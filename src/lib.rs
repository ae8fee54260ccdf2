//! # propnet
//!
//! A propositional-network (propnet) evaluation engine for general game
//! playing, optimized for Monte Carlo playouts.
//!
//! A propnet encodes a game's rules as a boolean logic circuit: base
//! propositions hold the persistent state, input propositions carry the
//! chosen moves, and derived gates compute legality, termination, goal
//! values and the next state. Search algorithms call the engine millions
//! of times per second, so everything here is built for the hot path.
//!
//! ## Design Principles
//!
//! 1. **Arrays, not object graphs**: Nodes are parallel arrays (kind,
//!    predecessor list) addressed by integer index; the state is one flat
//!    boolean vector. No per-call allocation, no virtual dispatch.
//!
//! 2. **Pay at build time**: Validation, the deterministic topological
//!    order, and the dependency cone of every output family (terminal,
//!    per-role legal, per-role goal) are computed once in
//!    `Circuit::build` and reused for every propagation.
//!
//! 3. **Partial propagation**: Queries evaluate only the cone they need.
//!    Asking "is this terminal?" touches the terminal cone, not the
//!    whole circuit, and is guaranteed bit-identical to full
//!    propagation on that slot.
//!
//! 4. **Shared circuit, private everything else**: A built `Circuit` is
//!    immutable and safely shared across threads; each `Engine` owns its
//!    own state vectors and seeded RNG, so parallel playouts need no
//!    locks.
//!
//! ## Modules
//!
//! - `core`: roles, RNG, configuration, state vector, errors
//! - `circuit`: topology description, builder, validation, compiled circuit
//! - `engine`: propagation, transition, queries, Monte Carlo driver
//! - `games`: hand-built example games for tests and benchmarks

pub mod circuit;
pub mod core;
pub mod engine;
pub mod games;

// Re-export commonly used types
pub use crate::core::{
    EngineConfig, EngineError, MalformedCircuitError, PlayoutRng, PlayoutRngState, RoleId, RoleMap,
    StateVector,
};

pub use crate::circuit::{Circuit, GoalSpec, NodeId, NodeKind, NodeSpec, Topology, TopologyBuilder};

pub use crate::engine::{Engine, PlayoutOutcome};
