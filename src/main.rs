//! Command-line front end for the puzzle engine.
//!
//! Subcommands:
//! - `generate [variant] [difficulty]`: one 9x9 puzzle, defaulting to
//!   classic medium
//! - `generate16 [difficulty]`: one classic 16x16 puzzle
//! - `benchmark [count]`: timed batch generation with a uniqueness
//!   re-check

use std::env;
use sudoku_engine::{benchmark, Difficulty, Grid, PuzzleGenerator, Variant};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_ansi(true)
        .init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("benchmark") => {
            let count = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
            info!("Running benchmark with {} puzzles...", count);
            match benchmark::run_benchmark(count, Variant::Classic, Difficulty::Medium) {
                Ok(results) => results.print_results(),
                Err(e) => error!("Benchmark failed: {}", e),
            }
        }
        Some("generate16") => {
            let difficulty = parse_or(args.get(2), Difficulty::Easy);
            let mut generator = PuzzleGenerator::new();
            match generator.generate_16(difficulty) {
                Ok(puzzle) => {
                    info!("16x16 puzzle ({:?}, {} givens):", difficulty, puzzle.given_count());
                    print_board(&puzzle.givens);
                    info!("Solution:");
                    print_board(&puzzle.solution);
                }
                Err(e) => error!("Generation failed: {}", e),
            }
        }
        Some("generate") | None => {
            let variant = parse_or(args.get(2), Variant::Classic);
            let difficulty = parse_or(args.get(3), Difficulty::Medium);
            let mut generator = PuzzleGenerator::new();
            match generator.generate(difficulty, 0, variant) {
                Ok(puzzle) => {
                    info!(
                        "{:?} puzzle ({:?}, {} givens):",
                        variant,
                        difficulty,
                        puzzle.given_count()
                    );
                    print_board(&puzzle.givens);
                    info!("Solution:");
                    print_board(&puzzle.solution);
                }
                Err(e) => error!("Generation failed: {}", e),
            }
        }
        Some(other) => {
            error!("Unknown command: {}", other);
            eprintln!("Usage: sudoku-engine [generate [variant] [difficulty] | generate16 [difficulty] | benchmark [count]]");
        }
    }
}

fn parse_or<T: std::str::FromStr>(arg: Option<&String>, default: T) -> T {
    arg.and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Prints a board with box grid lines. Cells are two characters wide
/// so 16x16 values line up.
fn print_board(board: &Grid) {
    let n = board.size();
    let bs = board.box_size();
    let segment = "─".repeat(bs * 3 + 1);
    let line = |left: &str, mid: &str, right: &str| {
        let parts: Vec<String> = (0..bs).map(|_| segment.clone()).collect();
        println!("{}{}{}", left, parts.join(mid), right);
    };

    line("┌", "┬", "┐");
    for row in 0..n {
        print!("│ ");
        for col in 0..n {
            let cell = board.get(row, col);
            if cell == 0 {
                print!(" · ");
            } else {
                print!("{:>2} ", cell);
            }
            if (col + 1) % bs == 0 && col < n - 1 {
                print!("│ ");
            }
        }
        println!("│");
        if (row + 1) % bs == 0 && row < n - 1 {
            line("├", "┼", "┤");
        }
    }
    line("└", "┴", "┘");
}
