//! Circuit nodes: identifiers and gate kinds.
//!
//! Nodes are addressed by dense integer index; the circuit stores them as
//! parallel arrays rather than an object graph, so a node is nothing but
//! its kind plus an ordered predecessor list.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Node identifier: a dense index into the circuit's node arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index as a usize.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The kind of a circuit node.
///
/// A single flat `match` over this enum is the whole of gate dispatch;
/// there is no per-kind vtable anywhere in the evaluation loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// One bit of persistent game state. External root: propagation never
    /// writes it. Its single predecessor is the node computing its value
    /// in the *next* state, read only by the transition operator.
    Base,
    /// One candidate move for one role. External root, no predecessors;
    /// exactly one per role is true per transition.
    Input,
    /// Conjunction of all predecessors.
    And,
    /// Disjunction of all predecessors.
    Or,
    /// Negation of the single predecessor.
    Not,
    /// Fixed value, no predecessors.
    Constant(bool),
    /// Derived proposition aliasing its single predecessor. Legal, goal
    /// and terminal propositions are typically views over gates.
    View,
}

impl NodeKind {
    /// True for kinds whose value propagation computes (everything except
    /// the external roots).
    #[must_use]
    pub const fn is_derived(self) -> bool {
        !matches!(self, NodeKind::Base | NodeKind::Input)
    }
}

/// One node of a topology description: kind plus ordered predecessors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Gate kind.
    pub kind: NodeKind,
    /// Predecessor node indices. Most gates have one or two.
    pub inputs: SmallVec<[NodeId; 2]>,
}

impl NodeSpec {
    /// Create a node spec.
    #[must_use]
    pub fn new(kind: NodeKind, inputs: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            kind,
            inputs: inputs.into_iter().collect(),
        }
    }
}
