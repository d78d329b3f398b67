use crate::grid::Grid;
use rand::prelude::*;
use rand::rngs::SmallRng;

/// Set of candidate values 1..=N packed into a `u32`, bit `v - 1`
/// representing value `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueSet(u32);

impl ValueSet {
    pub const EMPTY: ValueSet = ValueSet(0);

    /// The set {1, ..., n}.
    pub fn full(n: usize) -> ValueSet {
        debug_assert!(n <= 32);
        ValueSet(if n == 32 { u32::MAX } else { (1 << n) - 1 })
    }

    pub fn insert(&mut self, value: u8) {
        self.0 |= 1 << (value - 1);
    }

    pub fn remove(&mut self, value: u8) {
        self.0 &= !(1 << (value - 1));
    }

    pub fn contains(self, value: u8) -> bool {
        self.0 & (1 << (value - 1)) != 0
    }

    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Elements of `self` not present in `other`.
    pub fn without(self, other: ValueSet) -> ValueSet {
        ValueSet(self.0 & !other.0)
    }

    pub fn union(self, other: ValueSet) -> ValueSet {
        ValueSet(self.0 | other.0)
    }

    /// Smallest member, if any.
    pub fn lowest(self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u8 + 1)
        }
    }

    /// Members in ascending order, by repeatedly clearing the lowest
    /// set bit.
    pub fn iter(self) -> ValueSetIter {
        ValueSetIter(self.0)
    }
}

pub struct ValueSetIter(u32);

impl Iterator for ValueSetIter {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let value = self.0.trailing_zeros() as u8 + 1;
        self.0 &= self.0 - 1;
        Some(value)
    }
}

/// Classic-rules solver over row/column/box bitmasks, used for the
/// 16x16 path where scanning units per candidate would be too slow.
/// Placement and removal update three masks each; candidate lookup is
/// a couple of bit ops.
pub struct BitmaskSolver {
    grid: Grid,
    full: ValueSet,
    row_used: [ValueSet; 16],
    col_used: [ValueSet; 16],
    box_used: [ValueSet; 16],
}

impl BitmaskSolver {
    /// Builds masks from the current grid contents. Panics if the grid
    /// already violates a row, column or box.
    pub fn new(grid: &Grid) -> Self {
        let n = grid.size();
        let mut solver = Self {
            grid: grid.clone(),
            full: ValueSet::full(n),
            row_used: [ValueSet::EMPTY; 16],
            col_used: [ValueSet::EMPTY; 16],
            box_used: [ValueSet::EMPTY; 16],
        };
        for row in 0..n {
            for col in 0..n {
                let value = solver.grid.get(row, col);
                if value == 0 {
                    continue;
                }
                let b = solver.grid.box_of(row, col);
                assert!(
                    !solver.row_used[row].contains(value)
                        && !solver.col_used[col].contains(value)
                        && !solver.box_used[b].contains(value),
                    "grid contains a conflict at ({row}, {col})"
                );
                solver.row_used[row].insert(value);
                solver.col_used[col].insert(value);
                solver.box_used[b].insert(value);
            }
        }
        solver
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    fn available(&self, row: usize, col: usize) -> ValueSet {
        let b = self.grid.box_of(row, col);
        self.full
            .without(self.row_used[row].union(self.col_used[col]).union(self.box_used[b]))
    }

    fn place(&mut self, row: usize, col: usize, value: u8) {
        let b = self.grid.box_of(row, col);
        self.grid.set(row, col, value);
        self.row_used[row].insert(value);
        self.col_used[col].insert(value);
        self.box_used[b].insert(value);
    }

    fn unplace(&mut self, row: usize, col: usize, value: u8) {
        let b = self.grid.box_of(row, col);
        self.grid.clear(row, col);
        self.row_used[row].remove(value);
        self.col_used[col].remove(value);
        self.box_used[b].remove(value);
    }

    /// Empty cell with the fewest candidates by popcount; an empty
    /// candidate set wins outright so the caller prunes immediately.
    fn most_constrained(&self) -> Option<(usize, usize, ValueSet)> {
        let n = self.grid.size();
        let mut best: Option<(usize, usize, ValueSet)> = None;
        for row in 0..n {
            for col in 0..n {
                if self.grid.get(row, col) != 0 {
                    continue;
                }
                let available = self.available(row, col);
                if available.is_empty() {
                    return Some((row, col, available));
                }
                if best.map_or(true, |(_, _, b)| available.len() < b.len()) {
                    let single = available.len() == 1;
                    best = Some((row, col, available));
                    if single {
                        return best;
                    }
                }
            }
        }
        best
    }

    /// Completes the grid in ascending candidate order.
    pub fn solve(&mut self) -> bool {
        let Some((row, col, available)) = self.most_constrained() else {
            return true;
        };
        for value in available.iter() {
            self.place(row, col, value);
            if self.solve() {
                return true;
            }
            self.unplace(row, col, value);
        }
        false
    }

    /// Completes the grid trying candidates in random order.
    pub fn fill(&mut self, rng: &mut SmallRng) -> bool {
        let Some((row, col, available)) = self.most_constrained() else {
            return true;
        };
        let mut candidates: Vec<u8> = available.iter().collect();
        candidates.shuffle(rng);
        for value in candidates {
            self.place(row, col, value);
            if self.fill(rng) {
                return true;
            }
            self.unplace(row, col, value);
        }
        false
    }

    /// Counts completions up to `limit`, restoring the grid afterwards.
    pub fn count_solutions(&mut self, limit: usize) -> usize {
        let mut count = 0;
        self.count_recursive(&mut count, limit);
        count
    }

    fn count_recursive(&mut self, count: &mut usize, limit: usize) {
        if *count >= limit {
            return;
        }
        let Some((row, col, available)) = self.most_constrained() else {
            *count += 1;
            return;
        };
        for value in available.iter() {
            if *count >= limit {
                return;
            }
            self.place(row, col, value);
            self.count_recursive(count, limit);
            self.unplace(row, col, value);
        }
    }
}
