//! Single-role 3×3 line-marking game.
//!
//! One role marks empty cells on a 3×3 grid, one per turn. The game ends
//! when a row, column or diagonal is fully marked (score 100) or the
//! grid fills up without one (score 0; a full grid necessarily contains
//! complete lines, so this outcome exists only to make the goal set
//! total). Every playout terminates within 9 transitions.
//!
//! ## Slot layout
//!
//! - base slot `i` (0–8): cell `i` is marked
//! - move `k` of role 0: mark cell `k`; legal iff the cell is unmarked

use crate::circuit::{Topology, TopologyBuilder};
use crate::core::RoleId;

use super::LINES;

/// Number of cells (= base propositions = moves).
pub const CELLS: usize = 9;

/// Build the game's topology.
#[must_use]
pub fn topology() -> Topology {
    let role = RoleId::new(0);
    let mut tb = TopologyBuilder::new(1);

    let cells: Vec<_> = (0..CELLS).map(|_| tb.base()).collect();
    let marks: Vec<_> = (0..CELLS).map(|_| tb.input(role)).collect();

    // A cell stays marked once marked.
    for (&cell, &mark) in cells.iter().zip(&marks) {
        let next = tb.or(&[cell, mark]);
        tb.set_next(cell, next);
    }

    // Marking is legal while the cell is empty.
    for &cell in &cells {
        let empty = tb.not(cell);
        tb.legal(role, empty);
    }

    let line_gates: Vec<_> = LINES
        .iter()
        .map(|&[a, b, c]| tb.and(&[cells[a], cells[b], cells[c]]))
        .collect();
    let any_line = tb.or(&line_gates);
    let full = tb.and(&cells);

    let over = tb.or(&[any_line, full]);
    tb.terminal(over);

    tb.goal(role, any_line, 100);
    let no_line = tb.not(any_line);
    let draw = tb.and(&[full, no_line]);
    tb.goal(role, draw, 0);

    tb.finish()
}
