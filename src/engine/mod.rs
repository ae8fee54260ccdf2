//! The propagation engine: evaluation, transition, and queries.
//!
//! An [`Engine`] pairs an immutable compiled [`Circuit`] with an engine
//! configuration and a private playout RNG. It is created *uninitialized*
//! and armed exactly once with [`Engine::init_monte_carlo`] (or
//! [`Engine::init_with_circuit`] to share a circuit already built by
//! another engine); every evaluation call before that fails with
//! [`EngineError::Uninitialized`] and writes nothing.
//!
//! All evaluation operations take the caller's [`StateVector`] by mutable
//! reference and update derived slots in place. Argument checks run
//! before any write, so a rejected call leaves the state bit-for-bit
//! untouched. The hot path performs no allocation and no I/O.
//!
//! Engines are single-threaded by design: for parallel playouts, build
//! the circuit once and give each thread its own engine via
//! [`Engine::fork`].

pub mod playout;

pub use playout::PlayoutOutcome;

use log::debug;
use std::sync::Arc;

use crate::circuit::{Circuit, Topology};
use crate::core::{EngineConfig, EngineError, PlayoutRng, RoleId, StateVector};

/// The propnet evaluation engine.
pub struct Engine {
    config: EngineConfig,
    rng: PlayoutRng,
    circuit: Option<Arc<Circuit>>,
}

impl Engine {
    /// Create an uninitialized engine. The playout RNG is seeded from
    /// `config.seed` here and never reseeded.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let rng = PlayoutRng::new(config.seed);
        Self {
            config,
            rng,
            circuit: None,
        }
    }

    /// The configuration this engine was created with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether `init_monte_carlo`/`init_with_circuit` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.circuit.is_some()
    }

    /// Build the circuit from a topology and arm the engine.
    ///
    /// Validates the whole description (see [`Circuit::build`]); nothing
    /// is retained on failure. Calling again replaces the circuit; the
    /// RNG stream is unaffected.
    pub fn init_monte_carlo(&mut self, topology: &Topology) -> Result<(), EngineError> {
        let circuit = Circuit::build(topology)?;
        self.init_with_circuit(Arc::new(circuit))
    }

    /// Arm the engine with an already-built circuit.
    ///
    /// The circuit is shared read-only; every engine keeps its own state
    /// vectors and RNG, so a pool of engines over one `Arc<Circuit>` can
    /// run playouts on separate threads without locking.
    pub fn init_with_circuit(&mut self, circuit: Arc<Circuit>) -> Result<(), EngineError> {
        let scored = self.config.scored_role;
        if scored.index() >= circuit.role_count() {
            return Err(EngineError::IndexOutOfRange {
                what: "scored role",
                index: scored.index(),
                bound: circuit.role_count(),
            });
        }
        debug!(
            "engine armed: {} nodes, {} roles, scoring {}",
            circuit.len(),
            circuit.role_count(),
            scored,
        );
        self.circuit = Some(circuit);
        Ok(())
    }

    /// Fork an engine for another playout thread: same circuit and
    /// config, independent RNG stream.
    pub fn fork(&mut self) -> Engine {
        Engine {
            config: self.config.clone(),
            rng: self.rng.fork(),
            circuit: self.circuit.clone(),
        }
    }

    /// The compiled circuit.
    pub fn circuit(&self) -> Result<&Arc<Circuit>, EngineError> {
        self.circuit.as_ref().ok_or(EngineError::Uninitialized)
    }

    pub(crate) fn compiled(&self) -> Result<&Circuit, EngineError> {
        self.circuit.as_deref().ok_or(EngineError::Uninitialized)
    }

    // === State construction ===

    /// Create an all-false state vector sized to the circuit.
    pub fn new_state(&self) -> Result<StateVector, EngineError> {
        Ok(self.compiled()?.new_state())
    }

    /// Create a state vector from a base-proposition snapshot.
    pub fn state_from_base(&self, base: &[bool]) -> Result<StateVector, EngineError> {
        let circuit = self.compiled()?;
        let expected = circuit.base_range().len();
        if base.len() != expected {
            return Err(EngineError::IndexOutOfRange {
                what: "base vector length",
                index: base.len(),
                bound: expected,
            });
        }
        let mut state = circuit.new_state();
        circuit.load_base(&mut state, base);
        Ok(state)
    }

    /// Compute the game's initial state: raise the init proposition (if
    /// the game declares one), propagate, and extract the next base
    /// values. Games without an init proposition start from all-false.
    pub fn initial_state(&self) -> Result<StateVector, EngineError> {
        let circuit = self.compiled()?;
        let mut state = circuit.new_state();
        if let Some(init) = circuit.init_index() {
            state.set(init, true);
        }
        circuit.eval_order(circuit.full_order(), state.as_mut_slice());
        circuit.apply_transition(state.as_mut_slice());
        Ok(state)
    }

    // === Propagation ===

    /// Full propagation: evaluate every derived node in topological
    /// order. Afterwards every derived slot — legal, terminal, goal, all
    /// views — reflects the current base+input assignment.
    pub fn propagate(&self, state: &mut StateVector) -> Result<(), EngineError> {
        let circuit = self.compiled()?;
        check_state(circuit, state)?;
        circuit.eval_order(circuit.full_order(), state.as_mut_slice());
        Ok(())
    }

    /// Evaluate only the terminal proposition's dependency cone.
    ///
    /// The terminal slot ends bit-identical to full propagation; slots
    /// outside the cone are stale and must not be read.
    pub fn propagate_terminal_only(&self, state: &mut StateVector) -> Result<(), EngineError> {
        let circuit = self.compiled()?;
        check_state(circuit, state)?;
        circuit.eval_order(circuit.terminal_order(), state.as_mut_slice());
        Ok(())
    }

    /// Evaluate only the dependency cone of the legal propositions in
    /// `[start, end)`, which must be exactly one role's declared legal
    /// range. Same bit-identity guarantee and staleness caveat as
    /// [`Engine::propagate_terminal_only`].
    pub fn propagate_legal_only(
        &self,
        state: &mut StateVector,
        start: usize,
        end: usize,
    ) -> Result<(), EngineError> {
        let circuit = self.compiled()?;
        check_state(circuit, state)?;
        let role = circuit
            .role_for_legal_range(start, end)
            .ok_or(EngineError::IndexOutOfRange {
                what: "legal range",
                index: start,
                bound: circuit.len(),
            })?;
        circuit.eval_order(circuit.legal_order(role), state.as_mut_slice());
        Ok(())
    }

    /// [`Engine::propagate_legal_only`] addressed by role.
    pub fn propagate_legal_for(
        &self,
        state: &mut StateVector,
        role: RoleId,
    ) -> Result<(), EngineError> {
        let circuit = self.compiled()?;
        check_state(circuit, state)?;
        check_role(circuit, role)?;
        circuit.eval_order(circuit.legal_order(role), state.as_mut_slice());
        Ok(())
    }

    /// Evaluate only the dependency cone of one role's goal
    /// propositions.
    pub fn propagate_goal_only(
        &self,
        state: &mut StateVector,
        role: RoleId,
    ) -> Result<(), EngineError> {
        let circuit = self.compiled()?;
        check_state(circuit, state)?;
        check_role(circuit, role)?;
        circuit.eval_order(circuit.goal_order(role), state.as_mut_slice());
        Ok(())
    }

    // === Transition ===

    /// Apply one joint move: write the one-hot move vector into the input
    /// slots, run full propagation, then overwrite each base slot with
    /// its next-state value (`next = δ(base, moves)`).
    ///
    /// `moves` must contain one slot per input proposition and be one-hot
    /// per role; the one-hot invariant is the caller's obligation and is
    /// deliberately not checked here.
    pub fn transition(&self, state: &mut StateVector, moves: &[bool]) -> Result<(), EngineError> {
        let circuit = self.compiled()?;
        check_state(circuit, state)?;
        if moves.len() != circuit.input_count() {
            return Err(EngineError::IndexOutOfRange {
                what: "move vector length",
                index: moves.len(),
                bound: circuit.input_count(),
            });
        }
        state.as_mut_slice()[circuit.input_range()].copy_from_slice(moves);
        circuit.eval_order(circuit.full_order(), state.as_mut_slice());
        circuit.apply_transition(state.as_mut_slice());
        Ok(())
    }

    // === Queries ===

    /// Terminal-cone propagation plus a read of the terminal slot.
    pub fn is_terminal(&self, state: &mut StateVector) -> Result<bool, EngineError> {
        self.propagate_terminal_only(state)?;
        Ok(state.get(self.compiled()?.terminal_index()))
    }

    /// The role-local indices of every legal move in the current state.
    ///
    /// Index k corresponds to the k-th input proposition of the role's
    /// range.
    pub fn legal_moves(
        &self,
        state: &mut StateVector,
        role: RoleId,
    ) -> Result<Vec<usize>, EngineError> {
        self.propagate_legal_for(state, role)?;
        let circuit = self.compiled()?;
        let range = circuit.legal_range(role);
        Ok(state.as_slice()[range]
            .iter()
            .enumerate()
            .filter_map(|(k, &legal)| legal.then_some(k))
            .collect())
    }

    /// Goal-cone propagation plus a read of the role's score.
    ///
    /// Exactly one goal proposition must be true, else `GoalUndefined`.
    pub fn goal(&self, state: &mut StateVector, role: RoleId) -> Result<u32, EngineError> {
        self.propagate_goal_only(state, role)?;
        read_goal(self.compiled()?, state, role)
    }

    /// The declared goal values for a role, ascending.
    pub fn goal_values(&self, role: RoleId) -> Result<Vec<u32>, EngineError> {
        let circuit = self.compiled()?;
        check_role(circuit, role)?;
        Ok(circuit.goal_values(role))
    }
}

/// Reject state vectors sized for a different circuit.
pub(crate) fn check_state(circuit: &Circuit, state: &StateVector) -> Result<(), EngineError> {
    if state.len() != circuit.len() {
        return Err(EngineError::IndexOutOfRange {
            what: "state vector length",
            index: state.len(),
            bound: circuit.len(),
        });
    }
    Ok(())
}

/// Reject role indices outside the bounds fixed at initialization.
pub(crate) fn check_role(circuit: &Circuit, role: RoleId) -> Result<(), EngineError> {
    if role.index() >= circuit.role_count() {
        return Err(EngineError::IndexOutOfRange {
            what: "role",
            index: role.index(),
            bound: circuit.role_count(),
        });
    }
    Ok(())
}

/// Scan a role's goal propositions; exactly one must be true.
pub(crate) fn read_goal(
    circuit: &Circuit,
    state: &StateVector,
    role: RoleId,
) -> Result<u32, EngineError> {
    let mut result = None;
    for spec in circuit.goal_specs(role) {
        if state.get(spec.node.index()) {
            if result.is_some() {
                return Err(EngineError::GoalUndefined { role });
            }
            result = Some(spec.value);
        }
    }
    result.ok_or(EngineError::GoalUndefined { role })
}
