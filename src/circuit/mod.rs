//! The circuit model: static, immutable propnet representation.
//!
//! A [`Topology`] is the external description; [`Circuit::build`]
//! validates it once, computes the deterministic topological order and
//! the per-output-family dependency cones, and produces an immutable
//! [`Circuit`]. Nodes live in parallel arrays (kind, predecessor list)
//! addressed by integer index; the evaluation loop is one flat match with
//! no allocation and no indirect dispatch.
//!
//! A built circuit is read-only and may be shared (`Arc`) across engine
//! instances on different threads, each with its own state vector.

pub mod node;
pub mod order;
pub mod topology;

pub use node::{NodeId, NodeKind, NodeSpec};
pub use topology::{GoalSpec, Topology, TopologyBuilder};

use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::ops::Range;

use crate::core::{MalformedCircuitError, RoleId, StateVector};

use self::order::{cone_order, topological_order};

/// A compiled, immutable propnet.
#[derive(Clone, Debug)]
pub struct Circuit {
    kinds: Box<[NodeKind]>,
    preds: Box<[SmallVec<[u32; 2]>]>,

    full_order: Box<[u32]>,
    terminal_order: Box<[u32]>,
    legal_orders: Box<[Box<[u32]>]>,
    goal_orders: Box<[Box<[u32]>]>,

    base: Range<u32>,
    inputs: Box<[Range<u32>]>,
    legals: Box<[Range<u32>]>,
    /// `(start, end)` of a legal range back to its role, for validating
    /// range-addressed partial propagation in O(1).
    legal_lookup: FxHashMap<(u32, u32), RoleId>,
    goals: Box<[Box<[GoalSpec]>]>,
    terminal: u32,
    init: Option<u32>,
}

impl Circuit {
    /// Validate a topology and compile it.
    ///
    /// Detects every structural defect up front — dangling indices, bad
    /// arities, malformed index tables, cycles among derived nodes — and
    /// fails without producing a partial circuit. Identical topologies
    /// compile to bit-identical orders and cones.
    pub fn build(topology: &Topology) -> Result<Self, MalformedCircuitError> {
        let n = topology.nodes.len();
        let kinds: Box<[NodeKind]> = topology.nodes.iter().map(|spec| spec.kind).collect();
        let preds: Box<[SmallVec<[u32; 2]>]> = topology
            .nodes
            .iter()
            .map(|spec| spec.inputs.iter().map(|id| id.0).collect())
            .collect();

        validate_wiring(&kinds, &preds)?;
        validate_tables(topology, &kinds)?;

        let full_order = topological_order(&kinds, &preds)?;

        let terminal_order = cone_order(&full_order, &kinds, &preds, [topology.terminal.0]);
        let legal_orders: Vec<Box<[u32]>> = topology
            .legals
            .iter()
            .map(|range| cone_order(&full_order, &kinds, &preds, range.clone()).into_boxed_slice())
            .collect();
        let goal_orders: Vec<Box<[u32]>> = topology
            .goals
            .iter()
            .map(|specs| {
                cone_order(&full_order, &kinds, &preds, specs.iter().map(|g| g.node.0))
                    .into_boxed_slice()
            })
            .collect();

        debug!(
            "compiled circuit: {} nodes ({} base, {} input, {} derived), {} roles, cones: terminal={}, legal={:?}, goal={:?}",
            n,
            topology.base.len(),
            topology.inputs.iter().map(|r| r.len()).sum::<usize>(),
            full_order.len(),
            topology.role_count(),
            terminal_order.len(),
            legal_orders.iter().map(|o| o.len()).collect::<Vec<_>>(),
            goal_orders.iter().map(|o| o.len()).collect::<Vec<_>>(),
        );

        let legal_lookup = topology
            .legals
            .iter()
            .enumerate()
            .map(|(role, range)| ((range.start, range.end), RoleId::new(role as u8)))
            .collect();

        Ok(Self {
            kinds,
            preds,
            full_order: full_order.into_boxed_slice(),
            terminal_order: terminal_order.into_boxed_slice(),
            legal_orders: legal_orders.into_boxed_slice(),
            goal_orders: goal_orders.into_boxed_slice(),
            base: topology.base.clone(),
            inputs: topology.inputs.clone().into_boxed_slice(),
            legals: topology.legals.clone().into_boxed_slice(),
            legal_lookup,
            goals: topology
                .goals
                .iter()
                .map(|specs| specs.clone().into_boxed_slice())
                .collect(),
            terminal: topology.terminal.0,
            init: topology.init.map(|id| id.0),
        })
    }

    // === Shape ===

    /// Number of nodes (and state-vector slots).
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True for the empty circuit (never produced by `build`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Number of roles.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.inputs.len()
    }

    /// The kind of a node.
    #[must_use]
    pub fn kind(&self, node: usize) -> NodeKind {
        self.kinds[node]
    }

    // === Index tables ===

    /// The contiguous base-proposition slot range.
    #[must_use]
    pub fn base_range(&self) -> Range<usize> {
        self.base.start as usize..self.base.end as usize
    }

    /// The whole input-proposition block (all roles).
    #[must_use]
    pub fn input_range(&self) -> Range<usize> {
        let start = self.inputs.first().map_or(0, |r| r.start as usize);
        let end = self.inputs.last().map_or(0, |r| r.end as usize);
        start..end
    }

    /// Total number of input propositions (the one-hot move vector size).
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.input_range().len()
    }

    /// One role's input-proposition slot range.
    #[must_use]
    pub fn input_range_for(&self, role: RoleId) -> Range<usize> {
        let r = &self.inputs[role.index()];
        r.start as usize..r.end as usize
    }

    /// One role's legal-proposition slot range.
    #[must_use]
    pub fn legal_range(&self, role: RoleId) -> Range<usize> {
        let r = &self.legals[role.index()];
        r.start as usize..r.end as usize
    }

    /// The role whose declared legal range is exactly `[start, end)`.
    #[must_use]
    pub fn role_for_legal_range(&self, start: usize, end: usize) -> Option<RoleId> {
        let start = u32::try_from(start).ok()?;
        let end = u32::try_from(end).ok()?;
        self.legal_lookup.get(&(start, end)).copied()
    }

    /// One role's goal propositions with their score values.
    #[must_use]
    pub fn goal_specs(&self, role: RoleId) -> &[GoalSpec] {
        &self.goals[role.index()]
    }

    /// The declared goal values for a role, ascending.
    #[must_use]
    pub fn goal_values(&self, role: RoleId) -> Vec<u32> {
        let mut values: Vec<u32> = self.goals[role.index()].iter().map(|g| g.value).collect();
        values.sort_unstable();
        values
    }

    /// The terminal-proposition slot.
    #[must_use]
    pub fn terminal_index(&self) -> usize {
        self.terminal as usize
    }

    /// The init-proposition slot, if the game declares one.
    #[must_use]
    pub fn init_index(&self) -> Option<usize> {
        self.init.map(|i| i as usize)
    }

    // === States ===

    /// Create an all-false state vector sized to this circuit.
    #[must_use]
    pub fn new_state(&self) -> StateVector {
        StateVector::zeroed(self.len())
    }

    /// Two states are equivalent iff they agree on every base slot;
    /// derived values are a pure function of base+input and are ignored.
    #[must_use]
    pub fn same_base(&self, a: &StateVector, b: &StateVector) -> bool {
        let range = self.base_range();
        a.as_slice()[range.clone()] == b.as_slice()[range]
    }

    /// Snapshot the base slots.
    #[must_use]
    pub fn extract_base(&self, state: &StateVector) -> Vec<bool> {
        state.as_slice()[self.base_range()].to_vec()
    }

    /// Overwrite the base slots from a snapshot.
    ///
    /// Panics if `base` is not exactly the base-block length; the engine
    /// front end checks and reports before calling.
    pub fn load_base(&self, state: &mut StateVector, base: &[bool]) {
        let range = self.base_range();
        state.as_mut_slice()[range].copy_from_slice(base);
    }

    // === Evaluation (the hot path) ===

    /// Evaluate the given order slice in place. No allocation, no
    /// branching beyond the flat kind dispatch.
    pub(crate) fn eval_order(&self, order: &[u32], values: &mut [bool]) {
        for &node in order {
            let preds = &self.preds[node as usize];
            values[node as usize] = match self.kinds[node as usize] {
                NodeKind::And => preds.iter().all(|&p| values[p as usize]),
                NodeKind::Or => preds.iter().any(|&p| values[p as usize]),
                NodeKind::Not => !values[preds[0] as usize],
                NodeKind::View => values[preds[0] as usize],
                NodeKind::Constant(v) => v,
                // Orders never contain external roots.
                NodeKind::Base | NodeKind::Input => continue,
            };
        }
    }

    /// Copy every base slot from its next-state source. Sources are
    /// guaranteed non-base by validation, so a single pass is exact.
    pub(crate) fn apply_transition(&self, values: &mut [bool]) {
        for node in self.base.clone() {
            values[node as usize] = values[self.preds[node as usize][0] as usize];
        }
    }

    pub(crate) fn full_order(&self) -> &[u32] {
        &self.full_order
    }

    pub(crate) fn terminal_order(&self) -> &[u32] {
        &self.terminal_order
    }

    pub(crate) fn legal_order(&self, role: RoleId) -> &[u32] {
        &self.legal_orders[role.index()]
    }

    pub(crate) fn goal_order(&self, role: RoleId) -> &[u32] {
        &self.goal_orders[role.index()]
    }
}

/// Per-node wiring checks: predecessor indices in range, arities
/// consistent with kinds.
fn validate_wiring(
    kinds: &[NodeKind],
    preds: &[SmallVec<[u32; 2]>],
) -> Result<(), MalformedCircuitError> {
    let n = kinds.len() as u32;
    for (node, (kind, inputs)) in kinds.iter().zip(preds.iter()).enumerate() {
        let node = node as u32;
        for &input in inputs {
            if input >= n {
                return Err(MalformedCircuitError::DanglingIndex { node, input });
            }
        }
        let found = inputs.len();
        let expected = match kind {
            NodeKind::And | NodeKind::Or => {
                if found == 0 {
                    return Err(MalformedCircuitError::EmptyGate { node });
                }
                continue;
            }
            NodeKind::Not | NodeKind::View | NodeKind::Base => 1,
            NodeKind::Input | NodeKind::Constant(_) => 0,
        };
        if found != expected {
            return Err(MalformedCircuitError::BadArity {
                node,
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Index-table checks: ranges in bounds, kinds match their tables, role
/// tables consistent, transition sources non-base.
fn validate_tables(topology: &Topology, kinds: &[NodeKind]) -> Result<(), MalformedCircuitError> {
    let n = kinds.len() as u32;
    let roles = topology.inputs.len();

    if topology.legals.len() != roles {
        return Err(MalformedCircuitError::RoleMismatch {
            expected: roles,
            found: topology.legals.len(),
        });
    }
    if topology.goals.len() != roles {
        return Err(MalformedCircuitError::RoleMismatch {
            expected: roles,
            found: topology.goals.len(),
        });
    }

    let check_range = |table: &'static str, range: &Range<u32>| {
        if range.start > range.end || range.end > n {
            return Err(MalformedCircuitError::BadIndexTable {
                table,
                index: range.end,
            });
        }
        Ok(())
    };

    // Base block: every slot a Base node, every Base node in the block,
    // and every next-state source a non-base node (one-pass transition
    // copy reads only slots it does not write).
    check_range("base", &topology.base)?;
    for node in 0..n {
        let in_block = topology.base.contains(&node);
        let is_base = kinds[node as usize] == NodeKind::Base;
        if in_block != is_base {
            return Err(MalformedCircuitError::BadIndexTable {
                table: "base",
                index: node,
            });
        }
        if is_base {
            let src = topology.nodes[node as usize].inputs[0];
            if kinds[src.index()] == NodeKind::Base {
                return Err(MalformedCircuitError::BadIndexTable {
                    table: "transition",
                    index: node,
                });
            }
        }
    }

    // Input block: per-role ranges tile one block starting at the end of
    // the base block; every slot an Input node and vice versa.
    let mut expected_start = topology.base.end;
    for range in &topology.inputs {
        check_range("input", range)?;
        if range.start != expected_start {
            return Err(MalformedCircuitError::BadIndexTable {
                table: "input",
                index: range.start,
            });
        }
        expected_start = range.end;
    }
    let input_block = topology.base.end..expected_start;
    for node in 0..n {
        let in_block = input_block.contains(&node);
        let is_input = kinds[node as usize] == NodeKind::Input;
        if in_block != is_input {
            return Err(MalformedCircuitError::BadIndexTable {
                table: "input",
                index: node,
            });
        }
    }

    // Legal ranges: derived nodes, paired one-to-one with the role's
    // input range.
    for (role, range) in topology.legals.iter().enumerate() {
        check_range("legal", range)?;
        for node in range.clone() {
            if !kinds[node as usize].is_derived() {
                return Err(MalformedCircuitError::BadIndexTable {
                    table: "legal",
                    index: node,
                });
            }
        }
        let moves = topology.inputs[role].len();
        if range.len() != moves {
            return Err(MalformedCircuitError::RoleMismatch {
                expected: moves,
                found: range.len(),
            });
        }
    }

    // Goal propositions and terminal: in-range derived nodes.
    for specs in &topology.goals {
        for spec in specs {
            if spec.node.0 >= n || !kinds[spec.node.index()].is_derived() {
                return Err(MalformedCircuitError::BadIndexTable {
                    table: "goal",
                    index: spec.node.0,
                });
            }
        }
    }
    if topology.terminal.0 >= n || !kinds[topology.terminal.index()].is_derived() {
        return Err(MalformedCircuitError::BadIndexTable {
            table: "terminal",
            index: topology.terminal.0,
        });
    }

    // Init: a base node (it must persist across the initial transition).
    if let Some(init) = topology.init {
        if init.0 >= n || kinds[init.index()] != NodeKind::Base {
            return Err(MalformedCircuitError::BadIndexTable {
                table: "init",
                index: init.0,
            });
        }
    }

    Ok(())
}
