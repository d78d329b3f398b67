use crate::grid::Grid;
use crate::rules;
use crate::variant::{Variant, VariantData};
use rand::prelude::*;
use rand::rngs::SmallRng;
use tracing::trace;

/// Recursive backtracking solver over an exclusively-owned grid.
///
/// Variable selection is most-constrained-first (MRV): the empty cell
/// with the fewest legal values is branched on next, with ties broken
/// by scan order. Placement and undo are explicit and always paired
/// around the recursive call.
pub struct Solver<'a> {
    variant: Variant,
    data: &'a VariantData,
}

impl<'a> Solver<'a> {
    pub fn new(variant: Variant, data: &'a VariantData) -> Self {
        assert!(
            data.matches(variant),
            "variant data shape does not match {variant:?}"
        );
        Self { variant, data }
    }

    /// Picks the empty cell with the fewest legal values. Returns
    /// `None` when the grid is complete; a cell with an empty
    /// candidate list signals a dead end the caller must prune.
    fn most_constrained(&self, grid: &Grid) -> Option<(usize, usize, Vec<u8>)> {
        let mut best: Option<(usize, usize, Vec<u8>)> = None;
        for (row, col) in grid.empty_positions() {
            let candidates = rules::legal_values(grid, row, col, self.variant, self.data);
            if candidates.is_empty() {
                return Some((row, col, candidates));
            }
            let single = candidates.len() == 1;
            if best
                .as_ref()
                .map_or(true, |(_, _, b)| candidates.len() < b.len())
            {
                best = Some((row, col, candidates));
                if single {
                    break;
                }
            }
        }
        best
    }

    /// Fills the grid to completion in deterministic candidate order.
    /// Returns false if no completion exists; the grid is restored to
    /// its input state in that case.
    pub fn solve(&self, grid: &mut Grid) -> bool {
        let Some((row, col, candidates)) = self.most_constrained(grid) else {
            return true;
        };
        for value in candidates {
            trace!(row, col, value, "trying candidate");
            grid.set(row, col, value);
            if self.solve(grid) {
                return true;
            }
            grid.clear(row, col);
        }
        false
    }

    /// Like [`solve`](Self::solve) but shuffles each candidate list,
    /// producing varied solutions for puzzle generation.
    pub fn fill(&self, grid: &mut Grid, rng: &mut SmallRng) -> bool {
        let Some((row, col, mut candidates)) = self.most_constrained(grid) else {
            return true;
        };
        candidates.shuffle(rng);
        for value in candidates {
            grid.set(row, col, value);
            if self.fill(grid, rng) {
                return true;
            }
            grid.clear(row, col);
        }
        false
    }

    /// Counts completions of `grid`, stopping early once `limit` is
    /// reached. `limit = 2` answers the uniqueness question without
    /// paying for exhaustive enumeration: 1 means unique, 2 means
    /// not-unique, 0 means unsolvable.
    pub fn count_solutions(&self, grid: &Grid, limit: usize) -> usize {
        let mut working = grid.clone();
        let mut count = 0;
        self.count_recursive(&mut working, &mut count, limit);
        count
    }

    pub fn has_unique_solution(&self, grid: &Grid) -> bool {
        self.count_solutions(grid, 2) == 1
    }

    fn count_recursive(&self, grid: &mut Grid, count: &mut usize, limit: usize) {
        if *count >= limit {
            return;
        }
        let Some((row, col, candidates)) = self.most_constrained(grid) else {
            *count += 1;
            return;
        };
        for value in candidates {
            if *count >= limit {
                return;
            }
            grid.set(row, col, value);
            self.count_recursive(grid, count, limit);
            grid.clear(row, col);
        }
    }
}
