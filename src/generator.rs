use crate::bitmask::BitmaskSolver;
use crate::grid::Grid;
use crate::rules;
use crate::solver::Solver;
use crate::variant::{Arrow, Cage, Parity, Variant, VariantData, JIGSAW_LAYOUTS};
use crate::{Difficulty, EngineError, Puzzle, Result};
use rand::prelude::*;
use rand::rngs::SmallRng;
use tracing::{debug, info};

/// Attempts allowed for seeded solution fills before giving up.
const MAX_FILL_ATTEMPTS: usize = 100;

/// No valid 9x9 puzzle has fewer than 17 givens.
const MIN_CLUES_9: usize = 17;

/// Retries allowed when a killer cage layout has too many singletons.
const MAX_CAGE_LAYOUT_ATTEMPTS: usize = 8;

const DIRECTIONS_8: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Produces puzzles end to end: complete solution, variant data derived
/// from it, then carving down to a difficulty-driven clue target while
/// keeping the solution unique.
pub struct PuzzleGenerator {
    rng: SmallRng,
}

impl Default for PuzzleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PuzzleGenerator {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests and benchmarks.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generates a 9x9 puzzle. `time_limit_seconds` shifts the clue
    /// target: tighter time controls get more givens (0 means
    /// untimed).
    pub fn generate(
        &mut self,
        difficulty: Difficulty,
        time_limit_seconds: u32,
        variant: Variant,
    ) -> Result<Puzzle> {
        info!(?variant, ?difficulty, "generating puzzle");
        let pregame = self.pregame_data(variant);
        let solution = self.fill_solution(variant, &pregame)?;

        let (lo, hi) = difficulty.clue_band(9);
        let shift = time_control_shift(time_limit_seconds);
        let target =
            (self.rng.gen_range(lo..=hi) as i32 + shift).clamp(MIN_CLUES_9 as i32, 81) as usize;

        // Killer decides its cages and givens together: the board
        // starts blank, but only when the cage sums alone pin down the
        // solution. Everything else derives data first, then carves.
        let (data, givens) = if variant == Variant::Killer {
            self.killer_data_and_givens(&solution, difficulty)
        } else {
            let data = self.derive_variant_data(variant, pregame, &solution, difficulty);
            let givens = self.carve(&solution, target, variant, &data);
            (data, givens)
        };
        debug!(givens = givens.filled_count(), target, "carving finished");

        Ok(Puzzle {
            givens,
            solution,
            variant,
            variant_data: data,
            difficulty,
        })
    }

    /// Generates a classic 16x16 puzzle on the bitmask path. Carving
    /// removes 180-degree-symmetric cell pairs without re-proving
    /// uniqueness; at these clue densities non-unique boards are rare
    /// and per-removal uniqueness probes would dominate generation
    /// time.
    pub fn generate_16(&mut self, difficulty: Difficulty) -> Result<Puzzle> {
        info!(?difficulty, "generating 16x16 puzzle");
        let solution = self.fill_16()?;
        let (lo, hi) = difficulty.clue_band(16);
        let target = self.rng.gen_range(lo..=hi);

        let mut givens = solution.clone();
        let mut pair_indices: Vec<usize> = (0..128).collect();
        pair_indices.shuffle(&mut self.rng);
        let mut remaining = 256;
        for idx in pair_indices {
            if remaining <= target {
                break;
            }
            let (row, col) = (idx / 16, idx % 16);
            givens.clear(row, col);
            givens.clear(15 - row, 15 - col);
            remaining -= 2;
        }

        Ok(Puzzle {
            givens,
            solution,
            variant: Variant::Classic,
            variant_data: VariantData::None,
            difficulty,
        })
    }

    /// Produces a complete, valid solution grid for `variant` without
    /// carving anything.
    pub fn complete_solution(&mut self, variant: Variant) -> Result<Grid> {
        let pregame = self.pregame_data(variant);
        self.fill_solution(variant, &pregame)
    }

    /// Variant data that must exist before the solution fill. Only
    /// jigsaw qualifies: its regions replace boxes during the fill
    /// itself. Everything else is derived from the finished solution.
    fn pregame_data(&mut self, variant: Variant) -> VariantData {
        if variant != Variant::Jigsaw {
            return VariantData::None;
        }
        let layout = JIGSAW_LAYOUTS
            .choose(&mut self.rng)
            .expect("layout table is non-empty");
        let mut relabel: Vec<usize> = (0..9).collect();
        relabel.shuffle(&mut self.rng);
        VariantData::Jigsaw {
            regions: layout.iter().map(|&id| relabel[id]).collect(),
        }
    }

    fn fill_solution(&mut self, variant: Variant, pregame: &VariantData) -> Result<Grid> {
        // Constraints that only exist as derived data (cages, thermos,
        // dots, arrows, parity tags) play no part in the fill; those
        // solutions are plain classic grids.
        let (fill_variant, fill_data) = match variant {
            Variant::Jigsaw => (Variant::Jigsaw, pregame),
            Variant::Diagonal | Variant::Windoku | Variant::AntiKnight => {
                (variant, &VariantData::None)
            }
            _ => (Variant::Classic, &VariantData::None),
        };
        let solver = Solver::new(fill_variant, fill_data);
        for attempt in 0..MAX_FILL_ATTEMPTS {
            let mut grid = Grid::new(9);
            // Seeding the three diagonal boxes cuts the search down;
            // they share no row or column so a random permutation each
            // is safe under classic rules. Antiknight moves can still
            // link adjacent diagonal boxes, so each seed cell is
            // checked and an unlucky seed is simply re-rolled.
            if matches!(fill_variant, Variant::Classic | Variant::AntiKnight) {
                self.seed_diagonal_boxes(&mut grid, fill_variant, fill_data);
            }
            if solver.fill(&mut grid, &mut self.rng) {
                return Ok(grid);
            }
            debug!(attempt, "seeded fill failed, re-rolling");
        }
        Err(EngineError::GenerationFailed {
            attempts: MAX_FILL_ATTEMPTS,
        })
    }

    fn seed_diagonal_boxes(&mut self, grid: &mut Grid, variant: Variant, data: &VariantData) {
        for b in 0..3 {
            let mut values: Vec<u8> = (1..=9).collect();
            values.shuffle(&mut self.rng);
            for i in 0..3 {
                for j in 0..3 {
                    let (row, col) = (b * 3 + i, b * 3 + j);
                    let value = values[i * 3 + j];
                    if rules::is_legal_placement(grid, row, col, value, variant, data) {
                        grid.set(row, col, value);
                    }
                }
            }
        }
    }

    fn fill_16(&mut self) -> Result<Grid> {
        for _ in 0..MAX_FILL_ATTEMPTS {
            let mut grid = Grid::new(16);
            for b in 0..4 {
                let mut values: Vec<u8> = (1..=16).collect();
                values.shuffle(&mut self.rng);
                for i in 0..4 {
                    for j in 0..4 {
                        grid.set(b * 4 + i, b * 4 + j, values[i * 4 + j]);
                    }
                }
            }
            let mut solver = BitmaskSolver::new(&grid);
            if solver.fill(&mut self.rng) {
                return Ok(solver.into_grid());
            }
        }
        Err(EngineError::GenerationFailed {
            attempts: MAX_FILL_ATTEMPTS,
        })
    }

    /// Removes givens in random order down to `target`, keeping only
    /// removals that preserve a unique solution. May stop above the
    /// target when every remaining removal would break uniqueness.
    fn carve(
        &mut self,
        solution: &Grid,
        target: usize,
        variant: Variant,
        data: &VariantData,
    ) -> Grid {
        let mut grid = solution.clone();
        let mut order = grid.all_positions();
        order.shuffle(&mut self.rng);
        let solver = Solver::new(variant, data);
        let mut givens = grid.filled_count();
        for (row, col) in order {
            if givens <= target {
                break;
            }
            let value = grid.get(row, col);
            grid.clear(row, col);
            if solver.count_solutions(&grid, 2) == 1 {
                givens -= 1;
            } else {
                grid.set(row, col, value);
            }
        }
        grid
    }

    fn derive_variant_data(
        &mut self,
        variant: Variant,
        pregame: VariantData,
        solution: &Grid,
        difficulty: Difficulty,
    ) -> VariantData {
        match variant {
            Variant::Classic | Variant::Diagonal | Variant::Windoku | Variant::AntiKnight => {
                VariantData::None
            }
            Variant::Jigsaw => pregame,
            // Killer cages are derived together with their givens in
            // `killer_data_and_givens`, never here.
            Variant::Killer => unreachable!("killer data carries its own givens"),
            Variant::Thermo => self.thermometers(solution),
            Variant::Consecutive => self.consecutive_pairs(solution),
            Variant::Arrow => self.arrows(solution),
            Variant::EvenOdd => self.parity_tags(solution),
        }
    }

    /// Partitions the board into cages of distinct solution values and
    /// decides the killer givens. A layout is accepted only when it
    /// has at most two singleton cages and its sums alone leave
    /// exactly one completion of the blank board; otherwise the growth
    /// is re-rolled. If no attempt qualifies, the last layout is kept
    /// and solution cells are pinned as givens until the board becomes
    /// unique.
    fn killer_data_and_givens(
        &mut self,
        solution: &Grid,
        difficulty: Difficulty,
    ) -> (VariantData, Grid) {
        let mut last = None;
        for attempt in 0..MAX_CAGE_LAYOUT_ATTEMPTS {
            let (cages, cell_cage) = self.grow_cage_layout(solution, difficulty);
            let singletons = cages.iter().filter(|c| c.cells.len() == 1).count();
            if singletons > 2 {
                debug!(attempt, singletons, "re-rolling cage layout");
                continue;
            }
            let data = VariantData::Killer { cages, cell_cage };
            let solver = Solver::new(Variant::Killer, &data);
            if solver.count_solutions(&Grid::new(9), 2) == 1 {
                return (data, Grid::new(9));
            }
            debug!(attempt, "cage sums leave multiple solutions, re-rolling");
            last = Some(data);
        }
        let data = last.unwrap_or_else(|| {
            let (cages, cell_cage) = self.grow_cage_layout(solution, difficulty);
            VariantData::Killer { cages, cell_cage }
        });
        let givens = self.pin_until_unique(solution, &data);
        debug!(givens = givens.filled_count(), "pinned killer givens");
        (data, givens)
    }

    /// Fallback for cage layouts whose sums underdetermine the board:
    /// reveal solution cells in random order until the puzzle has
    /// exactly one completion.
    fn pin_until_unique(&mut self, solution: &Grid, data: &VariantData) -> Grid {
        let solver = Solver::new(Variant::Killer, data);
        let mut givens = Grid::new(9);
        let mut order = solution.all_positions();
        order.shuffle(&mut self.rng);
        for (row, col) in order {
            if solver.count_solutions(&givens, 2) == 1 {
                break;
            }
            givens.set(row, col, solution.get(row, col));
        }
        givens
    }

    fn grow_cage_layout(
        &mut self,
        solution: &Grid,
        difficulty: Difficulty,
    ) -> (Vec<Cage>, Vec<usize>) {
        let mut cell_cage = vec![usize::MAX; 81];
        let mut cages: Vec<Cage> = Vec::new();
        let mut order = solution.all_positions();
        order.shuffle(&mut self.rng);

        for (r0, c0) in order {
            if cell_cage[r0 * 9 + c0] != usize::MAX {
                continue;
            }
            let target = self.cage_size_target(difficulty);
            let id = cages.len();
            let mut cells = vec![(r0, c0)];
            let mut values = vec![solution.get(r0, c0)];
            cell_cage[r0 * 9 + c0] = id;
            while cells.len() < target {
                // Frontier: unclaimed orthogonal neighbours whose
                // solution value the cage does not hold yet.
                let mut frontier: Vec<(usize, usize)> = Vec::new();
                for &(r, c) in &cells {
                    for (nr, nc) in orthogonal_neighbors(r, c) {
                        if cell_cage[nr * 9 + nc] == usize::MAX
                            && !values.contains(&solution.get(nr, nc))
                            && !frontier.contains(&(nr, nc))
                        {
                            frontier.push((nr, nc));
                        }
                    }
                }
                let Some(&(nr, nc)) = frontier.choose(&mut self.rng) else {
                    break;
                };
                cell_cage[nr * 9 + nc] = id;
                values.push(solution.get(nr, nc));
                cells.push((nr, nc));
            }
            let sum = values.iter().map(|&v| v as u32).sum();
            cages.push(Cage { cells, sum });
        }

        // Fold leftover singletons into an adjacent cage when the
        // neighbour has room and no clashing value.
        let mut removed = vec![false; cages.len()];
        for i in 0..cages.len() {
            if cages[i].cells.len() != 1 {
                continue;
            }
            let (r, c) = cages[i].cells[0];
            let value = solution.get(r, c);
            for (nr, nc) in orthogonal_neighbors(r, c) {
                let j = cell_cage[nr * 9 + nc];
                if j == i || removed[j] || cages[j].cells.len() >= 5 {
                    continue;
                }
                let clash = cages[j]
                    .cells
                    .iter()
                    .any(|&(rr, cc)| solution.get(rr, cc) == value);
                if clash {
                    continue;
                }
                cages[j].cells.push((r, c));
                cages[j].sum += value as u32;
                cell_cage[r * 9 + c] = j;
                removed[i] = true;
                break;
            }
        }

        let mut remap = vec![usize::MAX; cages.len()];
        let mut kept: Vec<Cage> = Vec::new();
        for (i, cage) in cages.into_iter().enumerate() {
            if removed[i] {
                continue;
            }
            remap[i] = kept.len();
            kept.push(cage);
        }
        for idx in cell_cage.iter_mut() {
            *idx = remap[*idx];
        }
        (kept, cell_cage)
    }

    /// Cage size drawn from a per-difficulty distribution: harder
    /// puzzles lean towards larger cages, whose sums constrain less.
    fn cage_size_target(&mut self, difficulty: Difficulty) -> usize {
        let weights: [f64; 4] = match difficulty {
            Difficulty::Easy => [0.50, 0.35, 0.12, 0.03],
            Difficulty::Medium => [0.30, 0.35, 0.25, 0.10],
            Difficulty::Hard => [0.15, 0.30, 0.35, 0.20],
        };
        let roll: f64 = self.rng.gen();
        let mut cumulative = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            cumulative += w;
            if roll < cumulative {
                return i + 2;
            }
        }
        5
    }

    /// Up to five thermometers of length 3..=5, built by random walks
    /// that only step onto strictly larger solution values. Walks that
    /// stall below length 3 are discarded.
    fn thermometers(&mut self, solution: &Grid) -> VariantData {
        let mut used = [false; 81];
        let mut thermometers: Vec<Vec<(usize, usize)>> = Vec::new();
        for _ in 0..40 {
            if thermometers.len() >= 5 {
                break;
            }
            let start = (self.rng.gen_range(0..9), self.rng.gen_range(0..9));
            if used[start.0 * 9 + start.1] {
                continue;
            }
            let target_len = self.rng.gen_range(3..=5);
            let mut chain = vec![start];
            while chain.len() < target_len {
                let (r, c) = *chain.last().expect("chain starts non-empty");
                let current = solution.get(r, c);
                let options: Vec<(usize, usize)> = DIRECTIONS_8
                    .iter()
                    .filter_map(|&(dr, dc)| step(r, c, dr, dc, 9))
                    .filter(|&(nr, nc)| !used[nr * 9 + nc] && solution.get(nr, nc) > current)
                    .collect();
                let Some(&next) = options.choose(&mut self.rng) else {
                    break;
                };
                chain.push(next);
            }
            if chain.len() >= 3 {
                for &(r, c) in &chain {
                    used[r * 9 + c] = true;
                }
                thermometers.push(chain);
            }
        }
        VariantData::Thermo { thermometers }
    }

    /// Marks a random 45% subset of the solution's consecutive
    /// adjacencies. Unmarked adjacencies carry no constraint.
    fn consecutive_pairs(&mut self, solution: &Grid) -> VariantData {
        let mut pairs = Vec::new();
        for r in 0..9 {
            for c in 0..9 {
                let value = solution.get(r, c);
                if c + 1 < 9
                    && value.abs_diff(solution.get(r, c + 1)) == 1
                    && self.rng.gen_bool(0.45)
                {
                    pairs.push(((r, c), (r, c + 1)));
                }
                if r + 1 < 9
                    && value.abs_diff(solution.get(r + 1, c)) == 1
                    && self.rng.gen_bool(0.45)
                {
                    pairs.push(((r, c), (r + 1, c)));
                }
            }
        }
        VariantData::Consecutive { pairs }
    }

    /// Up to five non-overlapping arrows. Each candidate circle scans
    /// the eight directions for a straight shaft of 2..=4 unused cells
    /// whose solution values sum to the circle's value; the first hit
    /// wins.
    fn arrows(&mut self, solution: &Grid) -> VariantData {
        let mut used = [false; 81];
        let mut arrows: Vec<Arrow> = Vec::new();
        let mut order = solution.all_positions();
        order.shuffle(&mut self.rng);
        'circles: for (r, c) in order {
            if arrows.len() >= 5 {
                break;
            }
            if used[r * 9 + c] {
                continue;
            }
            let circle_value = solution.get(r, c) as u32;
            for &(dr, dc) in &DIRECTIONS_8 {
                let mut shaft: Vec<(usize, usize)> = Vec::new();
                let mut sum = 0u32;
                let (mut cr, mut cc) = (r, c);
                for _ in 0..4 {
                    let Some((nr, nc)) = step(cr, cc, dr, dc, 9) else {
                        break;
                    };
                    if used[nr * 9 + nc] {
                        break;
                    }
                    sum += solution.get(nr, nc) as u32;
                    shaft.push((nr, nc));
                    (cr, cc) = (nr, nc);
                    if sum == circle_value && shaft.len() >= 2 {
                        used[r * 9 + c] = true;
                        for &(sr, sc) in &shaft {
                            used[sr * 9 + sc] = true;
                        }
                        arrows.push(Arrow {
                            circle: (r, c),
                            shaft,
                        });
                        continue 'circles;
                    }
                    if sum >= circle_value {
                        break;
                    }
                }
            }
        }
        VariantData::Arrow { arrows }
    }

    /// Tags roughly 60% of cells with the parity of their solution
    /// value; the rest stay unconstrained.
    fn parity_tags(&mut self, solution: &Grid) -> VariantData {
        let parity = solution
            .all_positions()
            .into_iter()
            .map(|(r, c)| {
                if self.rng.gen_bool(0.6) {
                    Some(Parity::of(solution.get(r, c)))
                } else {
                    None
                }
            })
            .collect();
        VariantData::EvenOdd { parity }
    }
}

/// Clue-target adjustment for timed play: blitz games get easier
/// boards, very long games get slightly harder ones.
fn time_control_shift(seconds: u32) -> i32 {
    match seconds {
        0 => 0,
        1..=180 => 4,
        181..=600 => 2,
        601..=1800 => 0,
        _ => -2,
    }
}

fn orthogonal_neighbors(row: usize, col: usize) -> Vec<(usize, usize)> {
    [(-1, 0), (1, 0), (0, -1), (0, 1)]
        .iter()
        .filter_map(|&(dr, dc)| step(row, col, dr, dc, 9))
        .collect()
}

fn step(row: usize, col: usize, dr: i32, dc: i32, n: usize) -> Option<(usize, usize)> {
    let r = row as i32 + dr;
    let c = col as i32 + dc;
    if r < 0 || c < 0 || r >= n as i32 || c >= n as i32 {
        None
    } else {
        Some((r as usize, c as usize))
    }
}
