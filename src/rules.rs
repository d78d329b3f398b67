//! The candidate evaluator: pure legality checks for a single
//! placement against the base row/column/box rules plus whichever
//! variant constraints are active.

use crate::grid::Grid;
use crate::variant::{Parity, Variant, VariantData};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// Top-left corners of the four fixed windoku windows.
const WINDOW_ORIGINS: [(usize, usize); 4] = [(1, 1), (1, 5), (5, 1), (5, 5)];

/// Checks whether placing `value` at (row, col) is legal under the
/// active constraint set. Pure: the grid is never mutated, and the
/// cell's own current content is ignored (only *other* cells count).
///
/// Panics on caller contract violations: out-of-range value or
/// coordinates, or variant data of the wrong shape.
pub fn is_legal_placement(
    grid: &Grid,
    row: usize,
    col: usize,
    value: u8,
    variant: Variant,
    data: &VariantData,
) -> bool {
    let n = grid.size();
    assert!(
        value >= 1 && value as usize <= n,
        "value {value} out of range 1..={n}"
    );
    assert!(
        data.matches(variant),
        "variant data shape does not match {variant:?}"
    );
    assert!(
        variant == Variant::Classic || n == 9,
        "variant {variant:?} is only supported at 9x9"
    );

    // Row
    for c in 0..n {
        if c != col && grid.get(row, c) == value {
            return false;
        }
    }

    // Column
    for r in 0..n {
        if r != row && grid.get(r, col) == value {
            return false;
        }
    }

    // Box, or jigsaw region in place of it
    if let VariantData::Jigsaw { regions } = data {
        let region = regions[row * n + col];
        for r in 0..n {
            for c in 0..n {
                if (r, c) != (row, col) && regions[r * n + c] == region && grid.get(r, c) == value {
                    return false;
                }
            }
        }
    } else {
        let (br, bc) = grid.box_origin(row, col);
        for r in br..br + grid.box_size() {
            for c in bc..bc + grid.box_size() {
                if (r, c) != (row, col) && grid.get(r, c) == value {
                    return false;
                }
            }
        }
    }

    // Variant-specific extra checks, each independent and additive.
    match (variant, data) {
        (Variant::Classic, _) | (Variant::Jigsaw, _) => true,
        (Variant::Diagonal, _) => diagonal_ok(grid, row, col, value),
        (Variant::Windoku, _) => windoku_ok(grid, row, col, value),
        (Variant::AntiKnight, _) => antiknight_ok(grid, row, col, value),
        (Variant::Killer, VariantData::Killer { cages, cell_cage }) => {
            let cage = &cages[cell_cage[row * n + col]];
            let mut sum = value as u32;
            let mut unfilled = 0;
            for &(r, c) in &cage.cells {
                if (r, c) == (row, col) {
                    continue;
                }
                let v = grid.get(r, c);
                if v == value {
                    return false;
                }
                if v == 0 {
                    unfilled += 1;
                } else {
                    sum += v as u32;
                }
            }
            if sum > cage.sum {
                return false;
            }
            unfilled > 0 || sum == cage.sum
        }
        (Variant::Thermo, VariantData::Thermo { thermometers }) => {
            for chain in thermometers {
                let Some(i) = chain.iter().position(|&p| p == (row, col)) else {
                    continue;
                };
                if i > 0 {
                    let prev = grid.get(chain[i - 1].0, chain[i - 1].1);
                    if prev != 0 && value <= prev {
                        return false;
                    }
                }
                if i + 1 < chain.len() {
                    let next = grid.get(chain[i + 1].0, chain[i + 1].1);
                    if next != 0 && value >= next {
                        return false;
                    }
                }
            }
            true
        }
        (Variant::Consecutive, VariantData::Consecutive { pairs }) => {
            for &(a, b) in pairs {
                let partner = if a == (row, col) {
                    b
                } else if b == (row, col) {
                    a
                } else {
                    continue;
                };
                let pv = grid.get(partner.0, partner.1);
                if pv != 0 && (value as i32 - pv as i32).abs() != 1 {
                    return false;
                }
            }
            true
        }
        (Variant::Arrow, VariantData::Arrow { arrows }) => {
            for arrow in arrows {
                let on_shaft = arrow.shaft.contains(&(row, col));
                if arrow.circle != (row, col) && !on_shaft {
                    continue;
                }
                let circle = if arrow.circle == (row, col) {
                    value
                } else {
                    grid.get(arrow.circle.0, arrow.circle.1)
                };
                if circle == 0 {
                    // Circle still unknown; nothing to bound against.
                    continue;
                }
                let mut sum = 0u32;
                let mut unfilled = 0;
                for &(r, c) in &arrow.shaft {
                    let v = if (r, c) == (row, col) {
                        value
                    } else {
                        grid.get(r, c)
                    };
                    if v == 0 {
                        unfilled += 1;
                    } else {
                        sum += v as u32;
                    }
                }
                if sum > circle as u32 {
                    return false;
                }
                if unfilled == 0 && sum != circle as u32 {
                    return false;
                }
            }
            true
        }
        (Variant::EvenOdd, VariantData::EvenOdd { parity }) => match parity[row * n + col] {
            Some(tag) => Parity::of(value) == tag,
            None => true,
        },
        _ => unreachable!("data shape checked above"),
    }
}

/// Every value 1..=N that passes the full legality check for the cell.
/// Used by the solver's MRV ordering and by external hint/AI callers.
pub fn legal_values(
    grid: &Grid,
    row: usize,
    col: usize,
    variant: Variant,
    data: &VariantData,
) -> Vec<u8> {
    (1..=grid.size() as u8)
        .filter(|&value| is_legal_placement(grid, row, col, value, variant, data))
        .collect()
}

fn diagonal_ok(grid: &Grid, row: usize, col: usize, value: u8) -> bool {
    let n = grid.size();
    if row == col {
        for i in 0..n {
            if i != row && grid.get(i, i) == value {
                return false;
            }
        }
    }
    if row + col == n - 1 {
        for i in 0..n {
            if i != row && grid.get(i, n - 1 - i) == value {
                return false;
            }
        }
    }
    true
}

fn windoku_ok(grid: &Grid, row: usize, col: usize, value: u8) -> bool {
    for &(wr, wc) in &WINDOW_ORIGINS {
        if (wr..wr + 3).contains(&row) && (wc..wc + 3).contains(&col) {
            for r in wr..wr + 3 {
                for c in wc..wc + 3 {
                    if (r, c) != (row, col) && grid.get(r, c) == value {
                        return false;
                    }
                }
            }
        }
    }
    true
}

fn antiknight_ok(grid: &Grid, row: usize, col: usize, value: u8) -> bool {
    let n = grid.size() as i32;
    for &(dr, dc) in &KNIGHT_OFFSETS {
        let (r, c) = (row as i32 + dr, col as i32 + dc);
        if r >= 0 && r < n && c >= 0 && c < n && grid.get(r as usize, c as usize) == value {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{Arrow, Cage};

    fn empty() -> Grid {
        Grid::new(9)
    }

    #[test]
    fn test_row_duplicate_rejected_regardless_of_variant() {
        let mut grid = empty();
        grid.set(3, 1, 5);
        for variant in [Variant::Classic, Variant::Diagonal, Variant::AntiKnight] {
            assert!(!is_legal_placement(
                &grid,
                3,
                7,
                5,
                variant,
                &VariantData::None
            ));
        }
    }

    #[test]
    fn test_column_and_box_duplicates_rejected() {
        let mut grid = empty();
        grid.set(0, 4, 8);
        assert!(!is_legal_placement(
            &grid,
            6,
            4,
            8,
            Variant::Classic,
            &VariantData::None
        ));

        let mut grid = empty();
        grid.set(0, 0, 2);
        assert!(!is_legal_placement(
            &grid,
            2,
            2,
            2,
            Variant::Classic,
            &VariantData::None
        ));
        assert!(is_legal_placement(
            &grid,
            2,
            3,
            2,
            Variant::Classic,
            &VariantData::None
        ));
    }

    #[test]
    fn test_evaluation_ignores_the_cell_itself() {
        let mut grid = empty();
        grid.set(4, 4, 6);
        // Re-evaluating the occupied cell must not see its own value.
        assert!(is_legal_placement(
            &grid,
            4,
            4,
            6,
            Variant::Classic,
            &VariantData::None
        ));
    }

    #[test]
    fn test_evaluation_is_pure() {
        let mut grid = empty();
        grid.set(0, 0, 1);
        let snapshot = grid.clone();
        let first = is_legal_placement(&grid, 5, 5, 1, Variant::Classic, &VariantData::None);
        let second = is_legal_placement(&grid, 5, 5, 1, Variant::Classic, &VariantData::None);
        assert_eq!(first, second);
        assert_eq!(grid, snapshot);
    }

    #[test]
    fn test_diagonal_constraint() {
        let mut grid = empty();
        grid.set(0, 0, 9);
        assert!(!is_legal_placement(
            &grid,
            5,
            5,
            9,
            Variant::Diagonal,
            &VariantData::None
        ));
        grid.set(2, 6, 4);
        assert!(!is_legal_placement(
            &grid,
            7,
            1,
            4,
            Variant::Diagonal,
            &VariantData::None
        ));
        // Off-diagonal cells are unaffected.
        assert!(is_legal_placement(
            &grid,
            5,
            6,
            9,
            Variant::Diagonal,
            &VariantData::None
        ));
    }

    #[test]
    fn test_windoku_constraint() {
        let mut grid = empty();
        grid.set(1, 1, 3);
        assert!(!is_legal_placement(
            &grid,
            3,
            3,
            3,
            Variant::Windoku,
            &VariantData::None
        ));
        // Same offsets outside any window are fine.
        let mut grid = empty();
        grid.set(0, 0, 3);
        assert!(is_legal_placement(
            &grid,
            4,
            4,
            3,
            Variant::Windoku,
            &VariantData::None
        ));
    }

    #[test]
    fn test_antiknight_rejects_knight_move() {
        let mut grid = empty();
        grid.set(4, 4, 7);
        // All 8 knight offsets from (4, 4).
        for (r, c) in [
            (2, 3),
            (2, 5),
            (3, 2),
            (3, 6),
            (5, 2),
            (5, 6),
            (6, 3),
            (6, 5),
        ] {
            assert!(
                !is_legal_placement(&grid, r, c, 7, Variant::AntiKnight, &VariantData::None),
                "knight move to ({r}, {c}) should be rejected"
            );
        }
        // Not a knight move and otherwise clear.
        assert!(is_legal_placement(
            &grid,
            0,
            8,
            7,
            Variant::AntiKnight,
            &VariantData::None
        ));
    }

    #[test]
    fn test_killer_full_cage_must_hit_sum() {
        let cage = Cage {
            cells: vec![(0, 0), (0, 1), (1, 0)],
            sum: 10,
        };
        let mut cell_cage = vec![usize::MAX; 81];
        // Park every other cell in a huge dummy cage so lookups stay
        // in bounds.
        let dummy = Cage {
            cells: (0..81)
                .map(|i| (i / 9, i % 9))
                .filter(|&p| ![(0, 0), (0, 1), (1, 0)].contains(&p))
                .collect(),
            sum: 405 - 10,
        };
        for &(r, c) in &cage.cells {
            cell_cage[r * 9 + c] = 0;
        }
        for &(r, c) in &dummy.cells {
            cell_cage[r * 9 + c] = 1;
        }
        let data = VariantData::Killer {
            cages: vec![cage, dummy],
            cell_cage,
        };

        let mut grid = empty();
        grid.set(0, 0, 4);
        grid.set(0, 1, 6);
        // Two cells already sum to the target; any third value busts it.
        for value in 1..=9 {
            assert!(
                !is_legal_placement(&grid, 1, 0, value, Variant::Killer, &data),
                "value {value} should exceed the cage sum"
            );
        }

        // A partial sum below target stays legal.
        let mut grid = empty();
        grid.set(0, 0, 4);
        assert!(is_legal_placement(&grid, 0, 1, 5, Variant::Killer, &data));
        // Completing the cage must hit the sum exactly.
        grid.set(0, 1, 5);
        assert!(is_legal_placement(&grid, 1, 0, 1, Variant::Killer, &data));
        assert!(!is_legal_placement(&grid, 1, 0, 2, Variant::Killer, &data));
        // No repeats inside a cage.
        assert!(!is_legal_placement(&grid, 1, 0, 4, Variant::Killer, &data));
    }

    #[test]
    fn test_thermo_ordering() {
        let data = VariantData::Thermo {
            thermometers: vec![vec![(0, 0), (1, 1), (2, 2)]],
        };
        let mut grid = empty();
        grid.set(0, 0, 3);
        grid.set(2, 2, 7);
        assert!(is_legal_placement(&grid, 1, 1, 5, Variant::Thermo, &data));
        assert!(!is_legal_placement(&grid, 1, 1, 3, Variant::Thermo, &data));
        assert!(!is_legal_placement(&grid, 1, 1, 2, Variant::Thermo, &data));
        assert!(!is_legal_placement(&grid, 1, 1, 8, Variant::Thermo, &data));
        // Unfilled neighbors impose nothing yet.
        let grid = empty();
        assert!(is_legal_placement(&grid, 1, 1, 1, Variant::Thermo, &data));
    }

    #[test]
    fn test_consecutive_marked_pair() {
        let data = VariantData::Consecutive {
            pairs: vec![((4, 4), (4, 5))],
        };
        let mut grid = empty();
        grid.set(4, 4, 5);
        assert!(is_legal_placement(
            &grid,
            4,
            5,
            6,
            Variant::Consecutive,
            &data
        ));
        assert!(is_legal_placement(
            &grid,
            4,
            5,
            4,
            Variant::Consecutive,
            &data
        ));
        assert!(!is_legal_placement(
            &grid,
            4,
            5,
            8,
            Variant::Consecutive,
            &data
        ));
        // Unmarked adjacencies carry no constraint.
        assert!(is_legal_placement(
            &grid,
            3,
            4,
            8,
            Variant::Consecutive,
            &data
        ));
    }

    #[test]
    fn test_arrow_sum_bounds() {
        let data = VariantData::Arrow {
            arrows: vec![Arrow {
                circle: (0, 0),
                shaft: vec![(1, 1), (2, 2)],
            }],
        };
        let mut grid = empty();
        grid.set(0, 0, 7);
        grid.set(1, 1, 3);
        // Completing the shaft must match the circle exactly.
        assert!(is_legal_placement(&grid, 2, 2, 4, Variant::Arrow, &data));
        assert!(!is_legal_placement(&grid, 2, 2, 5, Variant::Arrow, &data));
        assert!(!is_legal_placement(&grid, 2, 2, 2, Variant::Arrow, &data));
        // A partial shaft may not already exceed the circle.
        let mut grid = empty();
        grid.set(0, 0, 4);
        assert!(!is_legal_placement(&grid, 1, 1, 5, Variant::Arrow, &data));
        assert!(is_legal_placement(&grid, 1, 1, 3, Variant::Arrow, &data));
    }

    #[test]
    fn test_evenodd_parity_tags() {
        let mut parity = vec![None; 81];
        parity[4 * 9 + 4] = Some(Parity::Even);
        parity[4 * 9 + 5] = Some(Parity::Odd);
        let data = VariantData::EvenOdd { parity };
        let grid = empty();
        assert!(is_legal_placement(&grid, 4, 4, 2, Variant::EvenOdd, &data));
        assert!(!is_legal_placement(&grid, 4, 4, 3, Variant::EvenOdd, &data));
        assert!(is_legal_placement(&grid, 4, 5, 3, Variant::EvenOdd, &data));
        assert!(!is_legal_placement(&grid, 4, 5, 2, Variant::EvenOdd, &data));
        // Untagged cells accept either parity.
        assert!(is_legal_placement(&grid, 0, 0, 2, Variant::EvenOdd, &data));
        assert!(is_legal_placement(&grid, 0, 0, 3, Variant::EvenOdd, &data));
    }

    #[test]
    fn test_jigsaw_region_replaces_box() {
        let regions = crate::variant::JIGSAW_LAYOUTS[0].clone();
        let data = VariantData::Jigsaw {
            regions: regions.clone(),
        };
        let mut grid = empty();
        // (0, 0) and (1, 4) share region 0 in layout 0 but not a box.
        assert_eq!(regions[0], regions[9 + 4]);
        grid.set(0, 0, 5);
        assert!(!is_legal_placement(&grid, 1, 4, 5, Variant::Jigsaw, &data));
        // (1, 1) is region 2: same value is fine there (different row,
        // column and region).
        assert_ne!(regions[9 + 1], regions[0]);
        assert!(is_legal_placement(&grid, 1, 1, 5, Variant::Jigsaw, &data));
    }

    #[test]
    fn test_legal_values_on_empty_grid() {
        let grid = empty();
        let values = legal_values(&grid, 0, 0, Variant::Classic, &VariantData::None);
        assert_eq!(values, (1..=9).collect::<Vec<u8>>());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_value_zero_is_a_contract_violation() {
        let grid = empty();
        is_legal_placement(&grid, 0, 0, 0, Variant::Classic, &VariantData::None);
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_mismatched_data_shape_panics() {
        let grid = empty();
        is_legal_placement(&grid, 0, 0, 1, Variant::Killer, &VariantData::None);
    }
}
