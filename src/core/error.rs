//! Error taxonomy.
//!
//! Circuit-structure problems are detected once at build time and are
//! fatal to construction (`MalformedCircuitError`); per-call argument
//! problems are detected by cheap bounds checks and reported to the
//! immediate caller (`EngineError`) with the state vector left in its
//! pre-call condition.

use super::RoleId;
use std::fmt;

/// A structural defect in a topology, detected at circuit build time.
///
/// No partial circuit is ever returned: build either validates the whole
/// description or fails with the first defect found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MalformedCircuitError {
    /// A predecessor list references a node index outside the circuit.
    DanglingIndex { node: u32, input: u32 },
    /// An AND/OR gate with zero inputs.
    EmptyGate { node: u32 },
    /// A node kind with the wrong number of inputs (NOT/View/Base take
    /// exactly one, Input/Constant take none).
    BadArity {
        node: u32,
        expected: usize,
        found: usize,
    },
    /// A cycle among derived nodes; `node` is on the cycle.
    Cycle { node: u32 },
    /// An index table (base/input/legal/goal/terminal/init) references an
    /// out-of-range node or a node of the wrong kind.
    BadIndexTable { table: &'static str, index: u32 },
    /// Per-role tables disagree: differing role counts, or a role whose
    /// legal and input ranges differ in length.
    RoleMismatch { expected: usize, found: usize },
}

impl fmt::Display for MalformedCircuitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingIndex { node, input } => {
                write!(f, "node {node} references out-of-range input {input}")
            }
            Self::EmptyGate { node } => write!(f, "gate {node} has no inputs"),
            Self::BadArity {
                node,
                expected,
                found,
            } => write!(f, "node {node} expects {expected} input(s), found {found}"),
            Self::Cycle { node } => write!(f, "cycle through derived node {node}"),
            Self::BadIndexTable { table, index } => {
                write!(f, "{table} table references invalid node {index}")
            }
            Self::RoleMismatch { expected, found } => {
                write!(f, "per-role tables disagree: expected {expected} entries, found {found}")
            }
        }
    }
}

impl std::error::Error for MalformedCircuitError {}

/// A failure of an engine operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The topology handed to `init_monte_carlo` was structurally invalid.
    MalformedCircuit(MalformedCircuitError),
    /// An evaluation operation was called before `init_monte_carlo`.
    Uninitialized,
    /// A role index, legal range or array length outside the bounds fixed
    /// at initialization.
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },
    /// A role had no legal move in a non-terminal state; the game
    /// description is defective.
    NoLegalMoves { role: RoleId },
    /// Not exactly one goal proposition was true for the role.
    GoalUndefined { role: RoleId },
    /// A playout exceeded the configured depth bound.
    NonTerminatingPlayout { depth: u32 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCircuit(err) => write!(f, "malformed circuit: {err}"),
            Self::Uninitialized => write!(f, "engine not initialized"),
            Self::IndexOutOfRange { what, index, bound } => {
                write!(f, "{what} {index} out of range (bound {bound})")
            }
            Self::NoLegalMoves { role } => {
                write!(f, "no legal move for {role} in a non-terminal state")
            }
            Self::GoalUndefined { role } => {
                write!(f, "goal undefined for {role}: not exactly one goal proposition true")
            }
            Self::NonTerminatingPlayout { depth } => {
                write!(f, "playout exceeded depth bound at depth {depth}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedCircuit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MalformedCircuitError> for EngineError {
    fn from(err: MalformedCircuitError) -> Self {
        Self::MalformedCircuit(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MalformedCircuitError::EmptyGate { node: 7 };
        assert_eq!(format!("{err}"), "gate 7 has no inputs");

        let err = EngineError::NoLegalMoves {
            role: RoleId::new(1),
        };
        assert_eq!(format!("{err}"), "no legal move for Role 1 in a non-terminal state");
    }

    #[test]
    fn test_from_malformed() {
        let inner = MalformedCircuitError::Cycle { node: 3 };
        let err: EngineError = inner.clone().into();
        assert_eq!(err, EngineError::MalformedCircuit(inner));
    }

    #[test]
    fn test_error_source() {
        use std::error::Error;

        let err = EngineError::MalformedCircuit(MalformedCircuitError::EmptyGate { node: 0 });
        assert!(err.source().is_some());
        assert!(EngineError::Uninitialized.source().is_none());
    }
}
