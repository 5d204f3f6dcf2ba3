//! Decoded grid and windowed queries over it.

use rain_common::{BoundingBox, CellCoord, IndexWindow, GRID_COLS, GRID_LEN, GRID_ROWS};

use crate::decode::normalize;
use crate::error::{ParseError, Result};
use crate::GRID_BYTES;

/// One decoded snapshot: 1200 x 3600 rain rates in mm/h, row-major, no-data
/// already mapped to 0.0.
#[derive(Clone)]
pub struct Grid {
    values: Vec<f32>,
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("rows", &GRID_ROWS)
            .field("cols", &GRID_COLS)
            .finish()
    }
}

impl Grid {
    /// Wrap values that are already normalized.
    pub(crate) fn from_normalized(values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), GRID_LEN);
        Self { values }
    }

    /// Build a grid from raw values, applying no-data normalization.
    pub fn from_values(mut values: Vec<f32>) -> Result<Self> {
        if values.len() != GRID_LEN {
            return Err(ParseError::Format {
                expected: GRID_BYTES,
                actual: values.len() * 4,
            });
        }
        for v in values.iter_mut() {
            *v = normalize(*v);
        }
        Ok(Self { values })
    }

    /// A grid with no rain anywhere.
    pub fn zeros() -> Self {
        Self {
            values: vec![0.0; GRID_LEN],
        }
    }

    /// Value at a grid index, `None` outside the grid.
    pub fn value(&self, row: usize, col: usize) -> Option<f32> {
        if row >= GRID_ROWS || col >= GRID_COLS {
            return None;
        }
        Some(self.values[row * GRID_COLS + col])
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// View of the cells covered by a bounding box, clamped to the grid.
    pub fn window(&self, bbox: &BoundingBox) -> GridWindow<'_> {
        self.window_indices(IndexWindow::from_bbox(bbox))
    }

    /// View of an explicit index range.
    pub fn window_indices(&self, index: IndexWindow) -> GridWindow<'_> {
        GridWindow { grid: self, index }
    }

    /// Maximum intensity inside a bounding box; 0.0 for an empty window.
    pub fn max_in(&self, bbox: &BoundingBox) -> f32 {
        self.window(bbox).max()
    }

    /// First cell (row-major) inside the box whose value exceeds `threshold`.
    pub fn first_exceeding(&self, bbox: &BoundingBox, threshold: f32) -> Option<CellCoord> {
        self.window(bbox).first_exceeding(threshold)
    }

    /// Summary statistics inside a bounding box.
    pub fn stats_in(&self, bbox: &BoundingBox) -> WindowStats {
        self.window(bbox).stats()
    }
}

/// A borrowed rectangular view into a [`Grid`].
#[derive(Debug, Clone, Copy)]
pub struct GridWindow<'a> {
    grid: &'a Grid,
    index: IndexWindow,
}

impl<'a> GridWindow<'a> {
    /// Index range this view covers.
    pub fn bounds(&self) -> IndexWindow {
        self.index
    }

    pub fn rows(&self) -> usize {
        self.index.rows()
    }

    pub fn cols(&self) -> usize {
        self.index.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Value at a position relative to the window's top-left cell.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        self.grid
            .value(self.index.row_start + row, self.index.col_start + col)
    }

    /// Cells in row-major order as `(row, col, value)` with absolute indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + 'a {
        let grid = self.grid;
        let index = self.index;
        (index.row_start..index.row_end).flat_map(move |row| {
            let start = row * GRID_COLS;
            grid.values[start + index.col_start..start + index.col_end]
                .iter()
                .enumerate()
                .map(move |(offset, &value)| (row, index.col_start + offset, value))
        })
    }

    /// Maximum value; 0.0 for an empty window.
    pub fn max(&self) -> f32 {
        self.iter().map(|(_, _, v)| v).fold(0.0, f32::max)
    }

    /// Reference corner of the first cell whose value is strictly greater than `threshold`.
    pub fn first_exceeding(&self, threshold: f32) -> Option<CellCoord> {
        self.iter()
            .find(|&(_, _, v)| v > threshold)
            .map(|(row, col, _)| CellCoord::from_index(row, col))
    }

    pub fn stats(&self) -> WindowStats {
        let mut stats = WindowStats::default();
        let mut sum = 0.0_f64;
        for (_, _, v) in self.iter() {
            stats.cells += 1;
            if v > 0.0 {
                stats.wet_cells += 1;
            }
            stats.max = stats.max.max(v);
            sum += v as f64;
        }
        if stats.cells > 0 {
            stats.mean = (sum / stats.cells as f64) as f32;
        }
        stats
    }
}

/// Summary of the values inside a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowStats {
    pub cells: usize,
    pub wet_cells: usize,
    pub max: f32,
    pub mean: f32,
}
