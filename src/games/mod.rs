//! Hand-built propnet games for tests and benchmarks.
//!
//! Real topologies come from an external game loader; these two are
//! assembled with `TopologyBuilder` and kept deliberately small:
//!
//! - `lines`: a single-role 3×3 marking game (the smallest interesting
//!   propnet: 9 base cells, one terminal, goal set {0, 100})
//! - `tictactoe`: full two-role tic-tac-toe with alternating turns,
//!   noop moves for the idle role, and goal set {0, 50, 100}

pub mod lines;
pub mod tictactoe;

/// The eight winning triples of a 3×3 grid, row-major cells 0–8.
pub(crate) const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];
