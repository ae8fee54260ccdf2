//! Engine-level integration tests: initialization, determinism,
//! transition consistency, serialization.

use std::sync::Arc;

use propnet::games::{lines, tictactoe};
use propnet::{
    Circuit, Engine, EngineConfig, EngineError, PlayoutRng, RoleId, StateVector, Topology,
};

const R0: RoleId = RoleId::new(0);

fn lines_engine() -> Engine {
    let mut engine = Engine::new(EngineConfig::default());
    engine.init_monte_carlo(&lines::topology()).unwrap();
    engine
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_every_operation_guards_initialization() {
    let mut engine = Engine::new(EngineConfig::default());
    let mut state = StateVector::zeroed(8);
    let before = state.clone();

    assert_eq!(engine.propagate(&mut state), Err(EngineError::Uninitialized));
    assert_eq!(
        engine.propagate_terminal_only(&mut state),
        Err(EngineError::Uninitialized)
    );
    assert_eq!(
        engine.propagate_legal_only(&mut state, 0, 1),
        Err(EngineError::Uninitialized)
    );
    assert_eq!(
        engine.propagate_goal_only(&mut state, R0),
        Err(EngineError::Uninitialized)
    );
    assert_eq!(
        engine.transition(&mut state, &[true]),
        Err(EngineError::Uninitialized)
    );
    assert_eq!(
        engine.monte_carlo(&mut state),
        Err(EngineError::Uninitialized)
    );
    assert_eq!(engine.initial_state().unwrap_err(), EngineError::Uninitialized);
    assert_eq!(engine.new_state().unwrap_err(), EngineError::Uninitialized);

    // No partial output was written anywhere.
    assert_eq!(state, before);
}

#[test]
fn test_reinit_replaces_circuit() {
    let mut engine = lines_engine();
    assert_eq!(engine.circuit().unwrap().input_count(), 9);

    engine.init_monte_carlo(&tictactoe::topology()).unwrap();
    assert_eq!(engine.circuit().unwrap().input_count(), 20);
}

#[test]
fn test_shared_circuit_between_engines() {
    let circuit = Arc::new(Circuit::build(&lines::topology()).unwrap());

    let mut a = Engine::new(EngineConfig::default().with_seed(1));
    let mut b = Engine::new(EngineConfig::default().with_seed(2));
    a.init_with_circuit(Arc::clone(&circuit)).unwrap();
    b.init_with_circuit(Arc::clone(&circuit)).unwrap();

    // Both evaluate against the same immutable circuit, each with a
    // private state vector.
    let mut state_a = a.new_state().unwrap();
    let mut state_b = b.new_state().unwrap();
    a.propagate(&mut state_a).unwrap();
    b.propagate(&mut state_b).unwrap();
    assert_eq!(state_a, state_b);
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_identical_engines_produce_identical_derived_vectors() {
    let topo = tictactoe::topology();
    let mut a = Engine::new(EngineConfig::default());
    let mut b = Engine::new(EngineConfig::default());
    a.init_monte_carlo(&topo).unwrap();
    b.init_monte_carlo(&topo).unwrap();

    // A spread of arbitrary base+input assignments, not just reachable
    // positions.
    let mut rng = PlayoutRng::new(7);
    for _ in 0..20 {
        let mut state_a = a.new_state().unwrap();
        for slot in 0..40 {
            state_a.set(slot, rng.gen_bool(0.5));
        }
        let mut state_b = state_a.clone();

        a.propagate(&mut state_a).unwrap();
        b.propagate(&mut state_b).unwrap();
        assert_eq!(state_a, state_b);
    }
}

// =============================================================================
// Transition consistency
// =============================================================================

#[test]
fn test_transition_matches_manual_extraction() {
    let topo = lines::topology();
    let engine = lines_engine();
    let circuit = engine.circuit().unwrap();

    // Mark cell 4 via the transition operator.
    let mut moves = vec![false; circuit.input_count()];
    moves[4] = true;
    let mut transitioned = engine.new_state().unwrap();
    engine.transition(&mut transitioned, &moves).unwrap();

    // Same thing by hand: set the input slot, full propagate, then read
    // each base's next value from its documented source node.
    let mut manual = engine.new_state().unwrap();
    let input_start = circuit.input_range().start;
    manual.set(input_start + 4, true);
    engine.propagate(&mut manual).unwrap();

    for slot in circuit.base_range() {
        let src = topo.nodes[slot].inputs[0];
        assert_eq!(
            transitioned.get(slot),
            manual.get(src.index()),
            "base slot {slot}"
        );
    }
}

#[test]
fn test_one_hot_sequence_reaches_expected_board() {
    let engine = lines_engine();
    let circuit = engine.circuit().unwrap();
    let mut state = engine.new_state().unwrap();

    for cell in [0, 4, 8] {
        let mut moves = vec![false; circuit.input_count()];
        moves[cell] = true;
        engine.transition(&mut state, &moves).unwrap();
    }

    for cell in 0..lines::CELLS {
        assert_eq!(state.get(cell), matches!(cell, 0 | 4 | 8));
    }
}

// =============================================================================
// State construction
// =============================================================================

#[test]
fn test_state_from_base_round_trip() {
    let engine = lines_engine();
    let circuit = engine.circuit().unwrap();

    let mut base = vec![false; 9];
    base[2] = true;
    base[6] = true;
    let state = engine.state_from_base(&base).unwrap();
    assert_eq!(circuit.extract_base(&state), base);

    let err = engine.state_from_base(&[true; 4]).unwrap_err();
    assert!(matches!(err, EngineError::IndexOutOfRange { .. }));
}

#[test]
fn test_base_equivalence_ignores_stale_derived_slots() {
    let engine = lines_engine();
    let circuit = engine.circuit().unwrap();

    let mut a = engine.state_from_base(&[true, false, false, false, false, false, false, false, false]).unwrap();
    let b = a.clone();

    // Propagating only dirties derived slots; equivalence is unchanged.
    engine.propagate(&mut a).unwrap();
    assert!(circuit.same_base(&a, &b));
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn test_topology_json_round_trip() {
    let topo = tictactoe::topology();

    let json = serde_json::to_string(&topo).unwrap();
    let restored: Topology = serde_json::from_str(&json).unwrap();
    assert_eq!(topo, restored);

    // And the restored description compiles to an equivalent circuit.
    let mut engine = Engine::new(EngineConfig::default());
    engine.init_monte_carlo(&restored).unwrap();
    assert_eq!(engine.circuit().unwrap().input_count(), 20);
}

#[test]
fn test_topology_bytes_round_trip() {
    let topo = lines::topology();

    let bytes = topo.to_bytes().unwrap();
    let restored = Topology::from_bytes(&bytes).unwrap();
    assert_eq!(topo, restored);
}
