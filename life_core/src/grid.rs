// grid.rs - Bounded NxN grid for Conway's Game of Life
//
// Cells outside the board do not exist: edge cells have 5 neighbours,
// corner cells 3. There is no wraparound and no materialised dead border.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Board edge used when nothing else is configured.
pub const DEFAULT_SIZE: usize = 13;

/// Moore neighbourhood offsets as (row, col) deltas.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid size must be at least 1")]
    EmptyGrid,
    #[error("a {size}x{size} grid has more cells than fit in memory")]
    TooLarge { size: usize },
    #[error("pattern {pattern:?} places a cell at ({row}, {col}) outside a {size}x{size} grid")]
    PatternOutOfBounds {
        pattern: &'static str,
        row: usize,
        col: usize,
        size: usize,
    },
    #[error("cannot parse grid: {0}")]
    Parse(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    #[default]
    Dead,
    Alive,
}

impl CellState {
    pub fn is_alive(self) -> bool {
        self == CellState::Alive
    }

    pub fn toggled(self) -> Self {
        match self {
            CellState::Dead => CellState::Alive,
            CellState::Alive => CellState::Dead,
        }
    }

    /// B3/S23 applied to a single cell.
    pub fn next(self, live_neighbors: u8) -> Self {
        match (self, live_neighbors) {
            (CellState::Alive, 2 | 3) => CellState::Alive, // Survival
            (CellState::Dead, 3)      => CellState::Alive, // Birth
            _                         => CellState::Dead,  // Death or stays dead
        }
    }
}

/// Square board of cells, stored row-major.
///
/// `step` computes the whole next generation into a scratch buffer and swaps
/// it in, so every cell is evaluated against the same generation.
#[derive(Debug)]
pub struct Grid {
    size: usize,
    cells: Vec<CellState>,
    scratch: Vec<CellState>,
    generation: u64,
}

impl Grid {
    pub fn new(size: usize) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::EmptyGrid);
        }
        let cell_count = size.checked_mul(size).ok_or(GridError::TooLarge { size })?;
        Ok(Self {
            size,
            cells: vec![CellState::Dead; cell_count],
            scratch: Vec::with_capacity(cell_count),
            generation: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Steps taken since construction or the last reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_alive()).count()
    }

    /// Panics when `(row, col)` is outside the board.
    pub fn get(&self, row: usize, col: usize) -> CellState {
        self.cells[self.index(row, col)]
    }

    /// Non-panicking variant of [`Grid::get`].
    pub fn cell(&self, row: usize, col: usize) -> Option<CellState> {
        (row < self.size && col < self.size).then(|| self.cells[row * self.size + col])
    }

    pub fn set(&mut self, row: usize, col: usize, state: CellState) {
        let index = self.index(row, col);
        self.cells[index] = state;
    }

    pub fn set_alive(&mut self, row: usize, col: usize) {
        self.set(row, col, CellState::Alive);
    }

    pub fn toggle(&mut self, row: usize, col: usize) {
        let index = self.index(row, col);
        self.cells[index] = self.cells[index].toggled();
    }

    /// Kills every cell and resets the generation counter.
    pub fn clear(&mut self) {
        self.cells.fill(CellState::Dead);
        self.generation = 0;
    }

    /// Rows top to bottom, each `size` cells wide.
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.chunks(self.size)
    }

    /// In-bounds Moore neighbours of `(row, col)`.
    pub fn neighbors(
        &self,
        row: usize,
        col: usize,
    ) -> impl Iterator<Item = (usize, usize)> + use<> {
        self.check_bounds(row, col);
        let size = self.size;
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            (r < size && c < size).then_some((r, c))
        })
    }

    pub fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        self.neighbors(row, col)
            .filter(|&(r, c)| self.cells[r * self.size + c].is_alive())
            .count() as u8
    }

    /// Advances the whole board by one generation.
    pub fn step(&mut self) {
        let mut next = std::mem::take(&mut self.scratch);
        next.clear();
        next.extend(self.cells.iter().enumerate().map(|(index, &cell)| {
            let (row, col) = (index / self.size, index % self.size);
            cell.next(self.live_neighbors(row, col))
        }));

        std::mem::swap(&mut self.cells, &mut next);
        self.scratch = next;
        self.generation += 1;
    }

    /// The generation after this one, leaving `self` untouched.
    pub fn next_generation(&self) -> Grid {
        let mut next = self.clone();
        next.step();
        next
    }

    fn index(&self, row: usize, col: usize) -> usize {
        self.check_bounds(row, col);
        row * self.size + col
    }

    fn check_bounds(&self, row: usize, col: usize) {
        assert!(
            row < self.size && col < self.size,
            "cell ({row}, {col}) is outside the {0}x{0} grid",
            self.size
        );
    }
}

// The scratch buffer is never part of a grid's observable state.
impl Clone for Grid {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            cells: self.cells.clone(),
            scratch: Vec::new(),
            generation: self.generation,
        }
    }
}

/// Two grids are equal when they hold the same cells; generation counts are ignored.
impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.cells == other.cells
    }
}

impl Eq for Grid {}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row_index, row) in self.rows().enumerate() {
            if row_index > 0 {
                writeln!(f)?;
            }
            for cell in row {
                f.write_str(if cell.is_alive() { "o" } else { "." })?;
            }
        }
        Ok(())
    }
}

/// Parses the `Display` form: one line per row, `o` alive, `.` dead.
/// Blank lines and surrounding whitespace are ignored.
impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
        let mut grid = Grid::new(lines.len())?;
        for (row, line) in lines.iter().enumerate() {
            if line.chars().count() != grid.size {
                return Err(GridError::Parse(format!(
                    "row {row} has {} cells, expected {}",
                    line.chars().count(),
                    grid.size
                )));
            }
            for (col, c) in line.chars().enumerate() {
                match c {
                    '.' => (),
                    'o' => grid.set_alive(row, col),
                    _ => return Err(GridError::Parse(format!("unexpected character {c:?}"))),
                }
            }
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Grid {
        s.parse().unwrap()
    }

    #[test]
    fn new_grid_is_all_dead() {
        let grid = Grid::new(5).unwrap();
        assert_eq!(grid.size(), 5);
        assert_eq!(grid.population(), 0);
        assert!(grid.rows().flatten().all(|&cell| cell == CellState::Dead));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(Grid::new(0), Err(GridError::EmptyGrid)));
    }

    #[test]
    fn overflowing_cell_count_is_rejected() {
        let size = usize::MAX / 2;
        assert!(matches!(Grid::new(size), Err(GridError::TooLarge { size: s }) if s == size));
    }

    #[test]
    fn toggle_flips_and_set_alive_forces() {
        let mut grid = Grid::new(3).unwrap();
        grid.toggle(1, 2);
        assert_eq!(grid.get(1, 2), CellState::Alive);
        grid.toggle(1, 2);
        assert_eq!(grid.get(1, 2), CellState::Dead);

        grid.set_alive(0, 0);
        grid.set_alive(0, 0);
        assert_eq!(grid.get(0, 0), CellState::Alive);
    }

    #[test]
    #[should_panic(expected = "outside the 4x4 grid")]
    fn get_out_of_bounds_panics() {
        Grid::new(4).unwrap().get(4, 0);
    }

    #[test]
    #[should_panic]
    fn toggle_out_of_bounds_panics() {
        Grid::new(4).unwrap().toggle(0, 7);
    }

    #[test]
    fn cell_probe_does_not_panic() {
        let grid = Grid::new(2).unwrap();
        assert_eq!(grid.cell(1, 1), Some(CellState::Dead));
        assert_eq!(grid.cell(2, 0), None);
    }

    #[test]
    fn neighbour_counts_by_position() {
        let grid = Grid::new(5).unwrap();
        assert_eq!(grid.neighbors(2, 2).count(), 8);
        assert_eq!(grid.neighbors(0, 2).count(), 5);
        assert_eq!(grid.neighbors(2, 4).count(), 5);
        assert_eq!(grid.neighbors(0, 0).count(), 3);
        assert_eq!(grid.neighbors(4, 4).count(), 3);
    }

    #[test]
    fn no_wraparound_at_edges() {
        let grid = Grid::new(5).unwrap();
        assert!(grid.neighbors(2, 0).all(|(_, c)| c != 4));
        assert!(grid.neighbors(0, 2).all(|(r, _)| r != 4));

        let mut grid = grid;
        grid.set_alive(2, 4);
        grid.set_alive(1, 4);
        grid.set_alive(3, 4);
        assert_eq!(grid.live_neighbors(2, 0), 0);
    }

    #[test]
    fn edge_truncation_differs_from_torus() {
        // On a torus the column-0 cell would see the three cells in column 4 and be born.
        let mut grid = parse(
            "
            ....o
            ....o
            ....o
            .....
            .....
        ",
        );
        grid.step();
        assert_eq!(grid.get(1, 0), CellState::Dead);
        assert_eq!(grid.get(1, 3), CellState::Alive);
    }

    #[test]
    fn empty_grid_stays_empty() {
        let mut grid = Grid::new(7).unwrap();
        grid.step();
        assert_eq!(grid, Grid::new(7).unwrap());
        assert_eq!(grid.generation(), 1);
    }

    #[test]
    fn lonely_cells_die() {
        let mut grid = parse(
            "
            .....
            .o...
            .....
            ...oo
            .....
        ",
        );
        grid.step();
        assert_eq!(grid.population(), 0);
    }

    #[test]
    fn two_neighbours_keep_state() {
        // (1, 1) alive with two neighbours survives; (0, 0) dead with two stays dead.
        let mut grid = parse(
            "
            .o...
            .o...
            .o...
            .....
            .....
        ",
        );
        assert_eq!(grid.live_neighbors(1, 1), 2);
        assert_eq!(grid.live_neighbors(0, 0), 2);
        grid.step();
        assert_eq!(grid.get(1, 1), CellState::Alive);
        assert_eq!(grid.get(0, 0), CellState::Dead);
    }

    #[test]
    fn three_neighbours_always_alive() {
        for centre in [CellState::Dead, CellState::Alive] {
            let mut grid = parse(
                "
                o.o
                ...
                .o.
            ",
            );
            grid.set(1, 1, centre);
            assert_eq!(grid.live_neighbors(1, 1), 3);
            grid.step();
            assert_eq!(grid.get(1, 1), CellState::Alive);
        }
    }

    #[test]
    fn overcrowded_cell_dies() {
        let mut grid = parse(
            "
            ooo
            oo.
            ...
        ",
        );
        grid.step();
        assert_eq!(grid.get(1, 1), CellState::Dead);
    }

    #[test]
    fn block_is_still_life() {
        let block = parse(
            "
            ......
            ......
            ..oo..
            ..oo..
            ......
            ......
        ",
        );
        let once = block.next_generation();
        assert_eq!(once, block);
        assert_eq!(once.next_generation(), block);
    }

    #[test]
    fn blinker_oscillates() {
        let horizontal = parse(
            "
            .....
            .....
            .ooo.
            .....
            .....
        ",
        );
        let vertical = parse(
            "
            .....
            ..o..
            ..o..
            ..o..
            .....
        ",
        );
        assert_eq!(horizontal.next_generation(), vertical);
        assert_eq!(vertical.next_generation(), horizontal);
    }

    #[test]
    fn next_generation_leaves_source_untouched() {
        let grid = parse(
            "
            ...
            ooo
            ...
        ",
        );
        let before = grid.clone();
        let _ = grid.next_generation();
        assert_eq!(grid, before);
        assert_eq!(grid.generation(), 0);
    }

    #[test]
    fn clear_resets_cells_and_generation() {
        let mut grid = parse("oo\noo");
        grid.step();
        grid.clear();
        assert_eq!(grid.population(), 0);
        assert_eq!(grid.generation(), 0);
    }

    #[test]
    fn display_matches_parse() {
        let text = "o..\n.o.\n..o";
        assert_eq!(parse(text).to_string(), text);
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        assert!(matches!("oo\no".parse::<Grid>(), Err(GridError::Parse(_))));
        assert!(matches!("ox\n..".parse::<Grid>(), Err(GridError::Parse(_))));
    }
}
