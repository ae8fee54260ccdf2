//! Two-role tic-tac-toe.
//!
//! X (role 0) and O (role 1) alternate; the idle role plays an explicit
//! noop move, so every transition stays one-hot per role, GGP style. A
//! turn-marker base tracks whose turn it is, seeded to X by the init
//! proposition; `Engine::initial_state` therefore yields the empty board
//! with X to move.
//!
//! ## Slot layout
//!
//! - base slots 0–8: X marks, row-major
//! - base slots 9–17: O marks
//! - base slot 18: X's turn
//! - base slot 19: init
//! - moves 0–8 of either role: mark that cell; move 9: noop
//!
//! Goals: 100 for making a line, 0 for the opponent's line, 50 each for
//! a full board with no line.

use crate::circuit::{Topology, TopologyBuilder};
use crate::core::RoleId;

use super::LINES;

/// Number of cells per role.
pub const CELLS: usize = 9;

/// The move index of the idle role's noop.
pub const NOOP_MOVE: usize = 9;

/// Base slot of X's mark on `cell`.
#[must_use]
pub fn x_cell(cell: usize) -> usize {
    cell
}

/// Base slot of O's mark on `cell`.
#[must_use]
pub fn o_cell(cell: usize) -> usize {
    CELLS + cell
}

/// Base slot of the "X to move" marker.
pub const TURN_SLOT: usize = 18;

/// Build the game's topology.
#[must_use]
pub fn topology() -> Topology {
    let x = RoleId::new(0);
    let o = RoleId::new(1);
    let mut tb = TopologyBuilder::new(2);

    let x_cells: Vec<_> = (0..CELLS).map(|_| tb.base()).collect();
    let o_cells: Vec<_> = (0..CELLS).map(|_| tb.base()).collect();
    let x_turn = tb.base();
    let init = tb.init();

    let x_marks: Vec<_> = (0..CELLS).map(|_| tb.input(x)).collect();
    tb.input(x); // noop: drives no transition, only carries legality
    let o_marks: Vec<_> = (0..CELLS).map(|_| tb.input(o)).collect();
    tb.input(o); // noop

    // Marks persist; a mark lands when its move is played.
    for (&cell, &mark) in x_cells.iter().zip(&x_marks) {
        let next = tb.or(&[cell, mark]);
        tb.set_next(cell, next);
    }
    for (&cell, &mark) in o_cells.iter().zip(&o_marks) {
        let next = tb.or(&[cell, mark]);
        tb.set_next(cell, next);
    }

    // The turn marker starts at X (raised by init) and flips thereafter.
    let not_turn = tb.not(x_turn);
    let not_init = tb.not(init);
    let flipped = tb.and(&[not_turn, not_init]);
    let next_turn = tb.or(&[init, flipped]);
    tb.set_next(x_turn, next_turn);

    let empties: Vec<_> = (0..CELLS)
        .map(|i| {
            let occupied = tb.or(&[x_cells[i], o_cells[i]]);
            tb.not(occupied)
        })
        .collect();

    // Legal moves, in move order: 9 marks then the noop.
    let o_turn = tb.not(x_turn);
    for &empty in &empties {
        let can_mark = tb.and(&[x_turn, empty]);
        tb.legal(x, can_mark);
    }
    tb.legal(x, o_turn);
    for &empty in &empties {
        let can_mark = tb.and(&[o_turn, empty]);
        tb.legal(o, can_mark);
    }
    tb.legal(o, x_turn);

    let x_line_gates: Vec<_> = LINES
        .iter()
        .map(|&[a, b, c]| tb.and(&[x_cells[a], x_cells[b], x_cells[c]]))
        .collect();
    let x_line = tb.or(&x_line_gates);
    let o_line_gates: Vec<_> = LINES
        .iter()
        .map(|&[a, b, c]| tb.and(&[o_cells[a], o_cells[b], o_cells[c]]))
        .collect();
    let o_line = tb.or(&o_line_gates);

    let occupied: Vec<_> = empties.iter().map(|&e| tb.not(e)).collect();
    let full = tb.and(&occupied);

    let over = tb.or(&[x_line, o_line, full]);
    tb.terminal(over);

    let no_x_line = tb.not(x_line);
    let no_o_line = tb.not(o_line);
    let draw = tb.and(&[full, no_x_line, no_o_line]);

    tb.goal(x, x_line, 100);
    tb.goal(x, draw, 50);
    tb.goal(x, o_line, 0);
    tb.goal(o, o_line, 100);
    tb.goal(o, draw, 50);
    tb.goal(o, x_line, 0);

    tb.finish()
}
