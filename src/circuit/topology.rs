//! The externally-supplied circuit description.
//!
//! A `Topology` is what a game loader hands the engine: node kinds,
//! wiring, and the index tables that give slots their meaning (base
//! block, per-role input and legal ranges, goal tables, terminal). It is
//! plain serializable data; all validation and preprocessing happens in
//! `Circuit::build`.
//!
//! ## Canonical layout
//!
//! Node indices follow the layout the engine expects: the base block
//! first, then the input block partitioned by role, then each role's
//! legal propositions, then every remaining derived node. `TopologyBuilder`
//! produces this layout automatically; descriptions loaded from
//! elsewhere must already conform (build rejects anything else).
//!
//! ## Caching
//!
//! Factoring a game description down to a topology is expensive for the
//! loader, so topologies serialize compactly (`to_bytes`/`from_bytes`)
//! for callers that cache them between runs.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::ops::Range;

use crate::core::RoleId;

use super::node::{NodeId, NodeKind, NodeSpec};

/// One goal proposition: the node and the score it awards when true.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSpec {
    /// The goal proposition node.
    pub node: NodeId,
    /// The score this proposition encodes (typically 0–100).
    pub value: u32,
}

/// A complete propnet description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Every node: kind plus ordered predecessor indices.
    pub nodes: Vec<NodeSpec>,
    /// The contiguous base-proposition block.
    pub base: Range<u32>,
    /// Per-role input ranges; consecutive, tiling one input block.
    pub inputs: Vec<Range<u32>>,
    /// Per-role legal ranges. `legals[r]` is parallel to `inputs[r]`:
    /// the k-th legal proposition guards the k-th input proposition.
    pub legals: Vec<Range<u32>>,
    /// Per-role goal propositions with their score values.
    pub goals: Vec<Vec<GoalSpec>>,
    /// The terminal proposition.
    pub terminal: NodeId,
    /// Optional init proposition: a base node raised only when computing
    /// the initial state (its transition source is constant false, so it
    /// clears itself on the first transition).
    pub init: Option<NodeId>,
}

impl Topology {
    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of roles.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.inputs.len()
    }

    /// Serialize to a compact binary blob for caching.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize a blob produced by [`Topology::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Programmatic topology construction.
///
/// Nodes may be created in any order; `finish` renumbers them into the
/// canonical layout and rewires every reference. Positions are stable
/// within each block: the k-th `base()` call becomes base slot k, the
/// k-th `input(role)`/`legal(role, ..)` call becomes that role's move k.
///
/// ## Example
///
/// ```
/// use propnet::circuit::{Circuit, TopologyBuilder};
/// use propnet::core::RoleId;
///
/// let mut tb = TopologyBuilder::new(1);
/// let bit = tb.base();
/// let flip = tb.not(bit);
/// tb.set_next(bit, flip);
///
/// tb.input(RoleId::new(0));
/// let always = tb.constant(true);
/// tb.legal(RoleId::new(0), always);
/// tb.terminal(bit);
/// tb.goal(RoleId::new(0), bit, 100);
///
/// let circuit = Circuit::build(&tb.finish()).unwrap();
/// assert_eq!(circuit.role_count(), 1);
/// ```
#[derive(Debug)]
pub struct TopologyBuilder {
    nodes: Vec<NodeSpec>,
    bases: Vec<NodeId>,
    inputs: Vec<Vec<NodeId>>,
    legals: Vec<Vec<NodeId>>,
    goals: Vec<Vec<(NodeId, u32)>>,
    terminal: Option<NodeId>,
    init: Option<NodeId>,
}

impl TopologyBuilder {
    /// Start a topology for a game with `role_count` roles.
    #[must_use]
    pub fn new(role_count: usize) -> Self {
        assert!(role_count > 0, "Must have at least 1 role");
        assert!(role_count <= 255, "At most 255 roles supported");

        Self {
            nodes: Vec::new(),
            bases: Vec::new(),
            inputs: vec![Vec::new(); role_count],
            legals: vec![Vec::new(); role_count],
            goals: vec![Vec::new(); role_count],
            terminal: None,
            init: None,
        }
    }

    fn push(&mut self, kind: NodeKind, inputs: SmallVec<[NodeId; 2]>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(NodeSpec { kind, inputs });
        id
    }

    /// Add a base proposition. Wire its next-state source later with
    /// [`TopologyBuilder::set_next`].
    pub fn base(&mut self) -> NodeId {
        let id = self.push(NodeKind::Base, smallvec![]);
        self.bases.push(id);
        id
    }

    /// Wire a base proposition to the node computing its next-state value.
    pub fn set_next(&mut self, base: NodeId, src: NodeId) {
        let spec = &mut self.nodes[base.index()];
        assert!(spec.kind == NodeKind::Base, "set_next target must be a base");
        spec.inputs = smallvec![src];
    }

    /// Add an input (move) proposition for a role.
    pub fn input(&mut self, role: RoleId) -> NodeId {
        let id = self.push(NodeKind::Input, smallvec![]);
        self.inputs[role.index()].push(id);
        id
    }

    /// Add an AND gate.
    pub fn and(&mut self, inputs: &[NodeId]) -> NodeId {
        self.push(NodeKind::And, inputs.iter().copied().collect())
    }

    /// Add an OR gate.
    pub fn or(&mut self, inputs: &[NodeId]) -> NodeId {
        self.push(NodeKind::Or, inputs.iter().copied().collect())
    }

    /// Add a NOT gate.
    pub fn not(&mut self, input: NodeId) -> NodeId {
        self.push(NodeKind::Not, smallvec![input])
    }

    /// Add a constant.
    pub fn constant(&mut self, value: bool) -> NodeId {
        self.push(NodeKind::Constant(value), smallvec![])
    }

    /// Add a view proposition over `src`.
    pub fn view(&mut self, src: NodeId) -> NodeId {
        self.push(NodeKind::View, smallvec![src])
    }

    /// Add a legal proposition for a role, as a view over `src`.
    ///
    /// Paired by position with the role's input propositions: the k-th
    /// legal guards the k-th input.
    pub fn legal(&mut self, role: RoleId, src: NodeId) -> NodeId {
        let id = self.push(NodeKind::View, smallvec![src]);
        self.legals[role.index()].push(id);
        id
    }

    /// Add a goal proposition for a role, as a view over `src`, awarding
    /// `value` when true.
    pub fn goal(&mut self, role: RoleId, src: NodeId, value: u32) -> NodeId {
        let id = self.push(NodeKind::View, smallvec![src]);
        self.goals[role.index()].push((id, value));
        id
    }

    /// Declare the terminal proposition, as a view over `src`.
    pub fn terminal(&mut self, src: NodeId) -> NodeId {
        assert!(self.terminal.is_none(), "terminal already declared");
        let id = self.push(NodeKind::View, smallvec![src]);
        self.terminal = Some(id);
        id
    }

    /// Add the init proposition: a base that is true only in the initial
    /// state (its next-state source is constant false).
    pub fn init(&mut self) -> NodeId {
        assert!(self.init.is_none(), "init already declared");
        let off = self.constant(false);
        let id = self.base();
        self.set_next(id, off);
        self.init = Some(id);
        id
    }

    /// Renumber into the canonical layout and produce the description.
    ///
    /// Structural validation (arities, pairing of legal and input ranges,
    /// acyclicity) is `Circuit::build`'s job; `finish` only requires that
    /// a terminal proposition was declared.
    #[must_use]
    pub fn finish(self) -> Topology {
        let terminal = self.terminal.expect("terminal proposition not declared");
        let role_count = self.inputs.len();
        let node_count = self.nodes.len();

        // Placement: bases, per-role inputs, per-role legals, the rest in
        // creation order.
        let mut placed = vec![false; node_count];
        let mut order: Vec<NodeId> = Vec::with_capacity(node_count);
        let place = |order: &mut Vec<NodeId>, placed: &mut Vec<bool>, id: NodeId| {
            debug_assert!(!placed[id.index()]);
            placed[id.index()] = true;
            order.push(id);
        };

        for &id in &self.bases {
            place(&mut order, &mut placed, id);
        }
        let mut input_ranges = Vec::with_capacity(role_count);
        for role_inputs in &self.inputs {
            let start = order.len() as u32;
            for &id in role_inputs {
                place(&mut order, &mut placed, id);
            }
            input_ranges.push(start..order.len() as u32);
        }
        let mut legal_ranges = Vec::with_capacity(role_count);
        for role_legals in &self.legals {
            let start = order.len() as u32;
            for &id in role_legals {
                place(&mut order, &mut placed, id);
            }
            legal_ranges.push(start..order.len() as u32);
        }
        for id in (0..node_count as u32).map(NodeId::new) {
            if !placed[id.index()] {
                order.push(id);
            }
        }

        let mut remap = vec![NodeId::new(0); node_count];
        for (new, &old) in order.iter().enumerate() {
            remap[old.index()] = NodeId::new(new as u32);
        }

        let mut nodes = vec![
            NodeSpec {
                kind: NodeKind::View,
                inputs: smallvec![],
            };
            node_count
        ];
        for (old, spec) in self.nodes.into_iter().enumerate() {
            nodes[remap[old].index()] = NodeSpec {
                kind: spec.kind,
                inputs: spec.inputs.iter().map(|&p| remap[p.index()]).collect(),
            };
        }

        Topology {
            nodes,
            base: 0..self.bases.len() as u32,
            inputs: input_ranges,
            legals: legal_ranges,
            goals: self
                .goals
                .into_iter()
                .map(|role_goals| {
                    role_goals
                        .into_iter()
                        .map(|(node, value)| GoalSpec {
                            node: remap[node.index()],
                            value,
                        })
                        .collect()
                })
                .collect(),
            terminal: remap[terminal.index()],
            init: self.init.map(|id| remap[id.index()]),
        }
    }
}
