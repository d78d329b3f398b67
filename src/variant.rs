use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The rule set layered on top of row/column/box uniqueness. Exactly
/// one variant is active per puzzle; 16x16 grids support `Classic`
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Classic,
    Diagonal,
    Windoku,
    AntiKnight,
    Killer,
    Jigsaw,
    Thermo,
    Consecutive,
    Arrow,
    EvenOdd,
}

impl Variant {
    pub const ALL: [Variant; 10] = [
        Variant::Classic,
        Variant::Diagonal,
        Variant::Windoku,
        Variant::AntiKnight,
        Variant::Killer,
        Variant::Jigsaw,
        Variant::Thermo,
        Variant::Consecutive,
        Variant::Arrow,
        Variant::EvenOdd,
    ];
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(Variant::Classic),
            "diagonal" => Ok(Variant::Diagonal),
            "windoku" => Ok(Variant::Windoku),
            "antiknight" => Ok(Variant::AntiKnight),
            "killer" => Ok(Variant::Killer),
            "jigsaw" => Ok(Variant::Jigsaw),
            "thermo" => Ok(Variant::Thermo),
            "consecutive" => Ok(Variant::Consecutive),
            "arrow" => Ok(Variant::Arrow),
            "evenodd" => Ok(Variant::EvenOdd),
            other => Err(format!("unknown variant: {other}")),
        }
    }
}

/// A killer cage: member cells plus the sum their solution values must
/// reach, with no repeated digits inside the cage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cage {
    pub cells: Vec<(usize, usize)>,
    pub sum: u32,
}

/// An arrow: the digit in the circle cell equals the sum of the digits
/// along the shaft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    pub circle: (usize, usize),
    pub shaft: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(value: u8) -> Parity {
        if value % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

/// Auxiliary data owned by a puzzle instance, keyed by its variant.
/// Created once from the completed solution (or, for jigsaw, before the
/// fill) and immutable afterwards. Passed explicitly alongside the grid
/// to every evaluator and solver call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantData {
    /// Classic, diagonal, windoku and antiknight need only the grid
    /// plus fixed geometric rules.
    None,
    Killer {
        cages: Vec<Cage>,
        /// Cell index (row * N + col) to cage index.
        cell_cage: Vec<usize>,
    },
    Jigsaw {
        /// Cell index to region id, 9 regions of 9 cells.
        regions: Vec<usize>,
    },
    Thermo {
        /// Each chain runs from bulb to tip; values strictly increase.
        thermometers: Vec<Vec<(usize, usize)>>,
    },
    Consecutive {
        /// Marked adjacent pairs whose values must differ by exactly 1.
        pairs: Vec<((usize, usize), (usize, usize))>,
    },
    Arrow {
        arrows: Vec<Arrow>,
    },
    EvenOdd {
        /// Cell index to parity tag, `None` where untagged.
        parity: Vec<Option<Parity>>,
    },
}

impl VariantData {
    /// Whether this data payload is the right shape for `variant`.
    pub fn matches(&self, variant: Variant) -> bool {
        matches!(
            (variant, self),
            (Variant::Classic, VariantData::None)
                | (Variant::Diagonal, VariantData::None)
                | (Variant::Windoku, VariantData::None)
                | (Variant::AntiKnight, VariantData::None)
                | (Variant::Killer, VariantData::Killer { .. })
                | (Variant::Jigsaw, VariantData::Jigsaw { .. })
                | (Variant::Thermo, VariantData::Thermo { .. })
                | (Variant::Consecutive, VariantData::Consecutive { .. })
                | (Variant::Arrow, VariantData::Arrow { .. })
                | (Variant::EvenOdd, VariantData::EvenOdd { .. })
        )
    }
}

/// Fixed 9-region jigsaw partitions, one region id per cell in
/// row-major order. Layout 0 was verified by hand: every region covers
/// all nine anti-diagonal classes (r + c) mod 9, so the cyclic Latin
/// square ((r + c) mod 9) + 1 satisfies its rows, columns and regions.
/// Layouts 1-3 are a transpose, a rotation and a mirror of it; the
/// transpose keeps the anti-diagonal property, the other two map it to
/// diagonal classes (r - c) mod 9, which the cyclic square
/// ((r - c) mod 9) + 1 satisfies instead. Either way each layout is
/// satisfiable before carving begins.
const JIGSAW_LAYOUT_STRINGS: [[&str; 9]; 4] = [
    [
        "000001111",
        "222200001",
        "333222221",
        "453333331",
        "455555551",
        "466666651",
        "477777666",
        "488887777",
        "444488888",
    ],
    [
        "023444444",
        "023556784",
        "023356784",
        "022356784",
        "002356788",
        "102356778",
        "102356678",
        "102355678",
        "111111678",
    ],
    [
        "444444320",
        "487655320",
        "487653320",
        "487653220",
        "887653200",
        "877653201",
        "876653201",
        "876553201",
        "876111111",
    ],
    [
        "111100000",
        "100002222",
        "122222333",
        "133333354",
        "155555554",
        "156666664",
        "666777774",
        "777788884",
        "888884444",
    ],
];

/// Parsed jigsaw layouts: region id per cell, row-major.
pub static JIGSAW_LAYOUTS: Lazy<Vec<Vec<usize>>> = Lazy::new(|| {
    JIGSAW_LAYOUT_STRINGS
        .iter()
        .map(|rows| {
            rows.iter()
                .flat_map(|row| row.bytes().map(|b| (b - b'0') as usize))
                .collect()
        })
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!("killer".parse::<Variant>().unwrap(), Variant::Killer);
        assert_eq!("Classic".parse::<Variant>().unwrap(), Variant::Classic);
        assert!("sandwich".parse::<Variant>().is_err());
    }

    #[test]
    fn test_data_shape_matching() {
        assert!(VariantData::None.matches(Variant::Classic));
        assert!(VariantData::None.matches(Variant::AntiKnight));
        assert!(!VariantData::None.matches(Variant::Killer));
        let jigsaw = VariantData::Jigsaw {
            regions: JIGSAW_LAYOUTS[0].clone(),
        };
        assert!(jigsaw.matches(Variant::Jigsaw));
        assert!(!jigsaw.matches(Variant::Classic));
    }

    #[test]
    fn test_jigsaw_layouts_partition_the_grid() {
        for layout in JIGSAW_LAYOUTS.iter() {
            assert_eq!(layout.len(), 81);
            let mut counts = [0usize; 9];
            for &region in layout {
                counts[region] += 1;
            }
            assert!(counts.iter().all(|&c| c == 9), "unbalanced regions");
        }
    }

    #[test]
    fn test_jigsaw_layouts_admit_cyclic_solution() {
        // Each layout must be rainbow on anti-diagonal classes
        // (r + c) mod 9 or on diagonal classes (r - c) mod 9; the
        // matching cyclic Latin square then solves the layout.
        let rainbow = |layout: &[usize], class: &dyn Fn(usize, usize) -> usize| {
            let mut seen = [[false; 9]; 9];
            for r in 0..9 {
                for c in 0..9 {
                    let region = layout[r * 9 + c];
                    if seen[region][class(r, c)] {
                        return false;
                    }
                    seen[region][class(r, c)] = true;
                }
            }
            true
        };
        for (i, layout) in JIGSAW_LAYOUTS.iter().enumerate() {
            let anti = rainbow(layout, &|r, c| (r + c) % 9);
            let diag = rainbow(layout, &|r, c| (9 + r - c) % 9);
            assert!(anti || diag, "layout {i} admits no cyclic solution");
        }
    }

    #[test]
    fn test_jigsaw_regions_are_connected() {
        for layout in JIGSAW_LAYOUTS.iter() {
            for region in 0..9 {
                let cells: Vec<(usize, usize)> = (0..81)
                    .filter(|&i| layout[i] == region)
                    .map(|i| (i / 9, i % 9))
                    .collect();
                let mut visited = vec![false; cells.len()];
                let mut stack = vec![0];
                visited[0] = true;
                while let Some(i) = stack.pop() {
                    let (r, c) = cells[i];
                    for (j, &(r2, c2)) in cells.iter().enumerate() {
                        if !visited[j] && r.abs_diff(r2) + c.abs_diff(c2) == 1 {
                            visited[j] = true;
                            stack.push(j);
                        }
                    }
                }
                assert!(
                    visited.iter().all(|&v| v),
                    "region {region} is disconnected"
                );
            }
        }
    }

    #[test]
    fn test_parity_of() {
        assert_eq!(Parity::of(2), Parity::Even);
        assert_eq!(Parity::of(7), Parity::Odd);
    }
}
