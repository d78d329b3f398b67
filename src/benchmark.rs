use crate::solver::Solver;
use crate::{Difficulty, EngineError, PuzzleGenerator, Result, Variant};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Results from a generation benchmark run
#[derive(Debug)]
pub struct BenchmarkResults {
    pub total_duration: Duration,
    pub average_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
    pub total_puzzles: usize,
    pub unique_puzzles: usize,
    pub min_givens: usize,
    pub max_givens: usize,
}

impl BenchmarkResults {
    pub fn unique_rate(&self) -> f64 {
        if self.total_puzzles == 0 {
            return 0.0;
        }
        self.unique_puzzles as f64 / self.total_puzzles as f64
    }

    pub fn print_results(&self) {
        println!("Benchmark Results:");
        println!("  Total puzzles:    {}", self.total_puzzles);
        println!(
            "  Unique solutions: {} ({:.1}%)",
            self.unique_puzzles,
            self.unique_rate() * 100.0
        );
        println!("  Givens:           {}..{}", self.min_givens, self.max_givens);
        println!("  Total time:       {:?}", self.total_duration);
        println!("  Average time:     {:?}", self.average_duration);
        println!("  Min time:         {:?}", self.min_duration);
        println!("  Max time:         {:?}", self.max_duration);
    }
}

/// Generates `count` puzzles in parallel and reports per-puzzle timing
/// plus a uniqueness re-check of every generated board.
pub fn run_benchmark(
    count: usize,
    variant: Variant,
    difficulty: Difficulty,
) -> Result<BenchmarkResults> {
    if count == 0 {
        return Err(EngineError::BenchmarkError(
            "benchmark requires at least one puzzle".to_string(),
        ));
    }
    info!(count, ?variant, ?difficulty, "starting benchmark");
    let start = Instant::now();

    let runs = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut generator = PuzzleGenerator::new();
            let puzzle_start = Instant::now();
            let puzzle = generator.generate(difficulty, 0, variant)?;
            let elapsed = puzzle_start.elapsed();
            let solver = Solver::new(variant, &puzzle.variant_data);
            let unique = solver.count_solutions(&puzzle.givens, 2) == 1;
            debug!(i, ?elapsed, unique, givens = puzzle.given_count(), "puzzle generated");
            Ok((elapsed, unique, puzzle.given_count()))
        })
        .collect::<Result<Vec<_>>>()?;

    let total_duration = start.elapsed();
    let sum: Duration = runs.iter().map(|&(d, _, _)| d).sum();
    let min_duration = runs.iter().map(|&(d, _, _)| d).min().unwrap_or_default();
    let max_duration = runs.iter().map(|&(d, _, _)| d).max().unwrap_or_default();
    let unique_puzzles = runs.iter().filter(|&&(_, u, _)| u).count();
    let min_givens = runs.iter().map(|&(_, _, g)| g).min().unwrap_or_default();
    let max_givens = runs.iter().map(|&(_, _, g)| g).max().unwrap_or_default();

    Ok(BenchmarkResults {
        total_duration,
        average_duration: sum / count as u32,
        min_duration,
        max_duration,
        total_puzzles: count,
        unique_puzzles,
        min_givens,
        max_givens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_run() {
        assert!(run_benchmark(0, Variant::Classic, Difficulty::Easy).is_err());
    }

    #[test]
    fn test_small_classic_run() {
        let results = run_benchmark(3, Variant::Classic, Difficulty::Easy).unwrap();
        assert_eq!(results.total_puzzles, 3);
        // Carving re-proves uniqueness after every removal, so each
        // generated board must check out.
        assert_eq!(results.unique_puzzles, 3);
        assert!(results.min_duration <= results.max_duration);
        assert!(results.min_givens >= 17);
    }
}
