//! Topological ordering and dependency cones.
//!
//! Computed once per circuit and reused for every propagation. Ordering
//! is Kahn's algorithm with a min-heap on node index, so ties among
//! independent nodes always break toward the lowest index: two circuits
//! built from the same topology evaluate in bit-identical order.

use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::core::MalformedCircuitError;

use super::node::NodeKind;

/// Dependency edges run predecessor → successor, but only between
/// derived nodes: base and input propositions are external roots, and a
/// base node's stored predecessor (its next-state source) crosses the
/// transition boundary rather than constraining evaluation order.
fn is_edge(kinds: &[NodeKind], pred: u32, node: u32) -> bool {
    kinds[node as usize].is_derived() && kinds[pred as usize].is_derived()
}

/// Compute the full deterministic topological order over derived nodes.
///
/// Fails with `Cycle` if the derived subgraph is not a DAG.
pub(crate) fn topological_order(
    kinds: &[NodeKind],
    preds: &[SmallVec<[u32; 2]>],
) -> Result<Vec<u32>, MalformedCircuitError> {
    let n = kinds.len();
    let mut indegree = vec![0u32; n];
    let mut successors: Vec<SmallVec<[u32; 2]>> = vec![SmallVec::new(); n];

    for node in 0..n as u32 {
        for &pred in &preds[node as usize] {
            if is_edge(kinds, pred, node) {
                indegree[node as usize] += 1;
                successors[pred as usize].push(node);
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<u32>> = (0..n as u32)
        .filter(|&node| kinds[node as usize].is_derived() && indegree[node as usize] == 0)
        .map(Reverse)
        .collect();

    let derived_count = kinds.iter().filter(|k| k.is_derived()).count();
    let mut order = Vec::with_capacity(derived_count);

    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &succ in &successors[node as usize] {
            indegree[succ as usize] -= 1;
            if indegree[succ as usize] == 0 {
                ready.push(Reverse(succ));
            }
        }
    }

    if order.len() != derived_count {
        // Any derived node still carrying indegree sits on (or behind) a
        // cycle; report the lowest for a stable message.
        let node = (0..n as u32)
            .find(|&node| kinds[node as usize].is_derived() && indegree[node as usize] > 0)
            .unwrap_or(0);
        return Err(MalformedCircuitError::Cycle { node });
    }

    Ok(order)
}

/// Restrict `full_order` to the backward dependency cone of `targets`.
///
/// The cone is every derived node the targets transitively depend on;
/// traversal stops at base/input roots. Filtering the full order keeps
/// both the topological property and the deterministic tie-break.
pub(crate) fn cone_order(
    full_order: &[u32],
    kinds: &[NodeKind],
    preds: &[SmallVec<[u32; 2]>],
    targets: impl IntoIterator<Item = u32>,
) -> Vec<u32> {
    let mut in_cone = vec![false; kinds.len()];
    let mut stack: Vec<u32> = Vec::new();

    for target in targets {
        if !in_cone[target as usize] {
            in_cone[target as usize] = true;
            stack.push(target);
        }
    }

    while let Some(node) = stack.pop() {
        if !kinds[node as usize].is_derived() {
            continue;
        }
        for &pred in &preds[node as usize] {
            if !in_cone[pred as usize] {
                in_cone[pred as usize] = true;
                stack.push(pred);
            }
        }
    }

    full_order
        .iter()
        .copied()
        .filter(|&node| in_cone[node as usize])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    // A chain: base 0 -> NOT 1 -> VIEW 2, plus independent constant 3.
    fn chain() -> (Vec<NodeKind>, Vec<SmallVec<[u32; 2]>>) {
        let kinds = vec![
            NodeKind::Base,
            NodeKind::Not,
            NodeKind::View,
            NodeKind::Constant(true),
        ];
        let preds: Vec<SmallVec<[u32; 2]>> =
            vec![smallvec![2], smallvec![0], smallvec![1], smallvec![]];
        (kinds, preds)
    }

    #[test]
    fn test_order_respects_dependencies() {
        let (kinds, preds) = chain();
        let order = topological_order(&kinds, &preds).unwrap();

        let pos = |n: u32| order.iter().position(|&x| x == n).unwrap();
        assert!(pos(1) < pos(2));
        assert_eq!(order.len(), 3); // base excluded
    }

    #[test]
    fn test_ties_break_by_ascending_index() {
        // Two independent NOTs over the same base, plus a constant.
        let kinds = vec![
            NodeKind::Base,
            NodeKind::Not,
            NodeKind::Not,
            NodeKind::Constant(false),
        ];
        let preds: Vec<SmallVec<[u32; 2]>> =
            vec![smallvec![1], smallvec![0], smallvec![0], smallvec![]];

        let order = topological_order(&kinds, &preds).unwrap();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_base_next_edge_is_not_a_dependency() {
        // The base's next source (NOT over the base itself) must not
        // register as a cycle.
        let kinds = vec![NodeKind::Base, NodeKind::Not];
        let preds: Vec<SmallVec<[u32; 2]>> = vec![smallvec![1], smallvec![0]];

        let order = topological_order(&kinds, &preds).unwrap();
        assert_eq!(order, vec![1]);
    }

    #[test]
    fn test_cycle_detected() {
        // NOT 0 <-> NOT 1
        let kinds = vec![NodeKind::Not, NodeKind::Not];
        let preds: Vec<SmallVec<[u32; 2]>> = vec![smallvec![1], smallvec![0]];

        let err = topological_order(&kinds, &preds).unwrap_err();
        assert_eq!(err, MalformedCircuitError::Cycle { node: 0 });
    }

    #[test]
    fn test_cone_excludes_independent_nodes() {
        let (kinds, preds) = chain();
        let order = topological_order(&kinds, &preds).unwrap();

        let cone = cone_order(&order, &kinds, &preds, [2]);
        assert_eq!(cone, vec![1, 2]); // constant 3 not in the cone

        let cone = cone_order(&order, &kinds, &preds, [3]);
        assert_eq!(cone, vec![3]);
    }

    #[test]
    fn test_cone_stops_at_roots() {
        let (kinds, preds) = chain();
        let order = topological_order(&kinds, &preds).unwrap();

        // Even though base 0's stored predecessor is view 2, the cone of
        // node 1 must not pull the next-state logic back in through it.
        let cone = cone_order(&order, &kinds, &preds, [1]);
        assert_eq!(cone, vec![1]);
    }
}
