use serde::{Deserialize, Serialize};

/// An NxN cell matrix with values 0..=N, where 0 marks an empty cell.
///
/// The grid is pure data: it knows its own geometry (including the
/// `box_size` x `box_size` box partition) but nothing about variant
/// rules. It is owned exclusively by whichever component is currently
/// mutating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    box_size: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Creates an empty grid. Only 9x9 and 16x16 are supported.
    pub fn new(size: usize) -> Self {
        let box_size = match size {
            9 => 3,
            16 => 4,
            other => panic!("unsupported grid size: {other}"),
        };
        Self {
            size,
            box_size,
            cells: vec![0; size * size],
        }
    }

    /// Builds a grid from row-major rows. Panics if the shape is not
    /// NxN or a value is out of range.
    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let size = rows.len();
        let mut grid = Grid::new(size);
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), size, "row {r} is not {size} cells wide");
            for (c, &value) in row.iter().enumerate() {
                assert!(value as usize <= size, "value {value} out of range");
                grid.cells[r * size + c] = value;
            }
        }
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn box_size(&self) -> usize {
        self.box_size
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        assert!(value as usize <= self.size, "value {value} out of range");
        let idx = self.index(row, col);
        self.cells[idx] = value;
    }

    pub fn clear(&mut self, row: usize, col: usize) {
        let idx = self.index(row, col);
        self.cells[idx] = 0;
    }

    /// Index of the box containing (row, col), row-major over boxes.
    pub fn box_of(&self, row: usize, col: usize) -> usize {
        (row / self.box_size) * self.box_size + col / self.box_size
    }

    /// Top-left corner of the box containing (row, col).
    pub fn box_origin(&self, row: usize, col: usize) -> (usize, usize) {
        (
            (row / self.box_size) * self.box_size,
            (col / self.box_size) * self.box_size,
        )
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|&v| v != 0)
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0).count()
    }

    pub fn empty_positions(&self) -> Vec<(usize, usize)> {
        let mut positions = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size {
                if self.get(row, col) == 0 {
                    positions.push((row, col));
                }
            }
        }
        positions
    }

    /// All cell coordinates in row-major order.
    pub fn all_positions(&self) -> Vec<(usize, usize)> {
        (0..self.size)
            .flat_map(|r| (0..self.size).map(move |c| (r, c)))
            .collect()
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.size && col < self.size,
            "position ({row}, {col}) out of bounds for size {}",
            self.size
        );
        row * self.size + col
    }
}
