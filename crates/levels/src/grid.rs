//! Row-major tile id grid

use crate::{LevelError, Result};

/// A `height x width` grid of global tile ids, indexed `[row][col]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    rows: Vec<Vec<u32>>,
}

impl TileGrid {
    /// Reshape a flat id list into rows of `width`
    ///
    /// `grid[row][col] == flat[row * width + col]`. Dimensions whose product
    /// overflows report `usize::MAX` as the expected count.
    pub fn from_flat(flat: &[u32], width: usize, height: usize) -> Result<Self> {
        let expected = width.saturating_mul(height);
        if flat.len() != expected {
            return Err(LevelError::Dimension {
                width,
                height,
                expected,
                actual: flat.len(),
            });
        }

        let rows = if width == 0 {
            vec![Vec::new(); height]
        } else {
            flat.chunks_exact(width).map(|row| row.to_vec()).collect()
        };

        Ok(Self { width, height, rows })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        self.rows.get(row)?.get(col).copied()
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    /// Iterate `(row, col, id)` over every cell
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, &id)| (r, c, id)))
    }

    /// Number of non-empty cells
    pub fn occupied(&self) -> usize {
        self.cells().filter(|&(_, _, id)| id != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshape_row_major() {
        let grid = TileGrid::from_flat(&[1, 2, 5, 0], 2, 2).unwrap();
        assert_eq!(grid.rows(), &[vec![1, 2], vec![5, 0]]);
        assert_eq!(grid.get(1, 0), Some(5));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.occupied(), 3);
    }

    #[test]
    fn test_roundtrip_non_square() {
        for (width, height) in [(1, 1), (3, 2), (2, 3), (7, 1), (1, 5), (16, 9)] {
            let flat: Vec<u32> = (0..(width * height) as u32).collect();
            let grid = TileGrid::from_flat(&flat, width, height).unwrap();
            assert_eq!(grid.height(), height);
            assert!(grid.rows().iter().all(|row| row.len() == width));
            for (row, col, id) in grid.cells() {
                assert_eq!(id, flat[row * width + col]);
            }
            assert_eq!(grid.cells().count(), flat.len());
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        match TileGrid::from_flat(&[1, 2, 3], 2, 2) {
            Err(LevelError::Dimension { expected, actual, .. }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected Dimension error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_grid() {
        let grid = TileGrid::from_flat(&[0; 6], 3, 2).unwrap();
        assert_eq!(grid.rows(), &[vec![0, 0, 0], vec![0, 0, 0]]);
        assert_eq!(grid.occupied(), 0);

        let zero_width = TileGrid::from_flat(&[], 0, 4).unwrap();
        assert_eq!(zero_width.height(), 4);
    }
}
