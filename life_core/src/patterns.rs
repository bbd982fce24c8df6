// patterns.rs - Named starting patterns, as (row, col) cells

use crate::grid::{Grid, GridError};

pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

/// Seed applied at start-up on the default 13x13 board.
pub const INITIAL: Pattern = Pattern {
    name: "Initial",
    cells: &[
        (4, 6),
        (5, 5), (6, 5), (7, 5), (8, 5),
        (9, 6),
        (5, 7), (6, 7), (7, 7), (8, 7),
    ],
};

pub const PATTERNS: &[Pattern] = &[
    INITIAL,
    Pattern {
        name: "Block",
        cells: &[(5, 5), (5, 6), (6, 5), (6, 6)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(6, 5), (6, 6), (6, 7)],
    },
    Pattern {
        name: "Toad",
        cells: &[(5, 6), (5, 7), (5, 8), (6, 5), (6, 6), (6, 7)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(3, 3), (3, 4), (4, 3), (4, 4), (5, 5), (5, 6), (6, 5), (6, 6)],
    },
    Pattern {
        name: "Glider",
        cells: &[(1, 2), (2, 3), (3, 1), (3, 2), (3, 3)],
    },
];

impl Pattern {
    pub fn by_name(name: &str) -> Option<&'static Pattern> {
        PATTERNS.iter().find(|pattern| pattern.name.eq_ignore_ascii_case(name))
    }

    pub fn fits(&self, size: usize) -> bool {
        self.cells.iter().all(|&(row, col)| row < size && col < size)
    }

    /// Clears `grid` and seeds this pattern. Nothing is written if any cell falls outside.
    pub fn apply(&self, grid: &mut Grid) -> Result<(), GridError> {
        let size = grid.size();
        let outside = self.cells.iter().find(|&&(row, col)| row >= size || col >= size);
        if let Some(&(row, col)) = outside {
            return Err(GridError::PatternOutOfBounds { pattern: self.name, row, col, size });
        }

        grid.clear();
        for &(row, col) in self.cells {
            grid.set_alive(row, col);
        }
        Ok(())
    }
}
