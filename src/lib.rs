use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod benchmark;
pub mod bitmask;
pub mod generator;
pub mod grid;
pub mod rules;
pub mod solver;
pub mod variant;

pub use generator::PuzzleGenerator;
pub use grid::Grid;
pub use solver::Solver;
pub use variant::{Arrow, Cage, Parity, Variant, VariantData};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to generate a complete solution after {attempts} attempts")]
    GenerationFailed { attempts: usize },
    #[error("benchmark error: {0}")]
    BenchmarkError(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Named clue-count band used at generation time to pick a target
/// number of givens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Inclusive clue-count band for the given grid size.
    pub fn clue_band(self, size: usize) -> (usize, usize) {
        match (self, size) {
            (Difficulty::Easy, 9) => (36, 40),
            (Difficulty::Medium, 9) => (30, 34),
            (Difficulty::Hard, 9) => (25, 29),
            (Difficulty::Easy, 16) => (108, 116),
            (Difficulty::Medium, 16) => (96, 104),
            (Difficulty::Hard, 16) => (84, 92),
            (_, size) => panic!("no clue band for grid size {size}"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A generated puzzle: carved givens, the full solution, and whatever
/// auxiliary data the active variant needs. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    pub givens: Grid,
    pub solution: Grid,
    pub variant: Variant,
    pub variant_data: VariantData,
    pub difficulty: Difficulty,
}

impl Puzzle {
    pub fn given_count(&self) -> usize {
        self.givens.filled_count()
    }
}
