//! Monte Carlo random-playout driver.
//!
//! A playout repeatedly: checks the terminal cone; if not over, runs each
//! role's legal cone, samples one true legal slot uniformly, raises the
//! paired input slot, and transitions. On termination it reads goal
//! cones. Only the cones actually needed are evaluated at each step —
//! the whole point of partial propagation.
//!
//! The loop allocates nothing: moves are staged directly in the state
//! vector's input slots instead of assembling a separate one-hot vector,
//! and sampling walks the legal slots in place.

use std::ops::Range;

use crate::circuit::Circuit;
use crate::core::{EngineError, RoleId, RoleMap, StateVector};

use super::{check_state, read_goal, Engine};

/// The result of one full random playout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayoutOutcome {
    /// Transitions taken to reach the terminal state.
    pub depth: u32,
    /// Every role's goal value at the terminal state.
    pub scores: RoleMap<u32>,
}

impl Engine {
    /// Run one random playout in place and return the configured scored
    /// role's goal value.
    ///
    /// `state`'s base slots must describe the start position; on success
    /// it holds the terminal position reached. Randomness comes from the
    /// engine's own seeded RNG, so equal seeds replay identical playouts.
    pub fn monte_carlo(&mut self, state: &mut StateVector) -> Result<u32, EngineError> {
        let circuit = self.circuit.clone().ok_or(EngineError::Uninitialized)?;
        check_state(&circuit, state)?;

        self.playout_to_terminal(&circuit, state)?;
        let role = self.config.scored_role;
        circuit.eval_order(circuit.goal_order(role), state.as_mut_slice());
        read_goal(&circuit, state, role)
    }

    /// Run one random playout and score *every* role.
    ///
    /// The multi-role variant of [`Engine::monte_carlo`], for callers
    /// that want all goal values from a single playout.
    pub fn run_playout(&mut self, state: &mut StateVector) -> Result<PlayoutOutcome, EngineError> {
        let circuit = self.circuit.clone().ok_or(EngineError::Uninitialized)?;
        check_state(&circuit, state)?;

        let depth = self.playout_to_terminal(&circuit, state)?;
        let mut scores = RoleMap::with_value(circuit.role_count(), 0);
        for role in RoleId::all(circuit.role_count()) {
            circuit.eval_order(circuit.goal_order(role), state.as_mut_slice());
            scores[role] = read_goal(&circuit, state, role)?;
        }
        Ok(PlayoutOutcome { depth, scores })
    }

    /// Sum the scored role's goal value over `probes` independent
    /// playouts from the same start state.
    ///
    /// The start state is left untouched; one scratch vector is reused
    /// across all probes.
    pub fn multi_monte(&mut self, state: &StateVector, probes: usize) -> Result<u64, EngineError> {
        let circuit = self.circuit.clone().ok_or(EngineError::Uninitialized)?;
        check_state(&circuit, state)?;

        let mut scratch = state.clone();
        let mut sum = 0u64;
        for _ in 0..probes {
            scratch.copy_from(state);
            sum += u64::from(self.monte_carlo(&mut scratch)?);
        }
        Ok(sum)
    }

    /// The playout loop: advance `state` to a terminal position, return
    /// the number of transitions taken.
    fn playout_to_terminal(
        &mut self,
        circuit: &Circuit,
        state: &mut StateVector,
    ) -> Result<u32, EngineError> {
        let max_depth = self.config.max_playout_depth;
        let mut depth = 0u32;

        loop {
            circuit.eval_order(circuit.terminal_order(), state.as_mut_slice());
            if state.get(circuit.terminal_index()) {
                return Ok(depth);
            }
            if max_depth != 0 && depth >= max_depth {
                return Err(EngineError::NonTerminatingPlayout { depth });
            }

            for slot in circuit.input_range() {
                state.set(slot, false);
            }
            for role in RoleId::all(circuit.role_count()) {
                circuit.eval_order(circuit.legal_order(role), state.as_mut_slice());
                let legal_range = circuit.legal_range(role);
                let count = state.count_true(legal_range.clone());
                if count == 0 {
                    return Err(EngineError::NoLegalMoves { role });
                }
                let pick = self.rng.gen_range_usize(0..count);
                let k = nth_true(state, legal_range, pick);
                state.set(circuit.input_range_for(role).start + k, true);
            }

            // Inputs are staged one-hot per role; this is `transition`
            // without the separate move vector.
            circuit.eval_order(circuit.full_order(), state.as_mut_slice());
            circuit.apply_transition(state.as_mut_slice());
            depth += 1;
        }
    }
}

/// Offset (within `range`) of the n-th true slot. Caller guarantees at
/// least n+1 true slots.
fn nth_true(state: &StateVector, range: Range<usize>, n: usize) -> usize {
    let start = range.start;
    let mut seen = 0;
    for slot in range {
        if state.get(slot) {
            if seen == n {
                return slot - start;
            }
            seen += 1;
        }
    }
    unreachable!("fewer true slots than sampled index")
}
