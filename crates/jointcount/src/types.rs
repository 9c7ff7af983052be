use image::GrayImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Integer class code, the position of a label in the model vocabulary.
pub type LabelCode = i64;

/// Per-pixel class codes as produced by the segmentation model.
pub type LabelRaster = Array2<LabelCode>;

/// Boolean pixel grid derived from a raster or an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(Array2<bool>);

impl BinaryMask {
    pub fn new(values: Array2<bool>) -> Self {
        Self(values)
    }

    /// Treats every non-zero pixel as set.
    pub fn from_gray(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let values = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            image.get_pixel(x as u32, y as u32)[0] != 0
        });
        Self(values)
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }

    pub fn pixel_count(&self) -> usize {
        self.0.len()
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&v| v).count()
    }

    pub fn is_blank(&self) -> bool {
        !self.0.iter().any(|&v| v)
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.0
    }
}

/// Statistic values for one image, ordered to match a table header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticRow {
    pub filename: String,
    pub values: Vec<f64>,
}

impl StatisticRow {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }
}

/// Where the filename column sits when a table is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilenameColumn {
    Leading,
    Trailing,
}

/// Ordered rows with a fixed header of statistic columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsTable {
    /// Statistic column names, excluding the filename column
    pub columns: Vec<String>,
    pub filename_column: FilenameColumn,
    pub rows: Vec<StatisticRow>,
}

impl ResultsTable {
    pub const FILENAME: &'static str = "filename";

    pub fn new(columns: Vec<String>, filename_column: FilenameColumn) -> Self {
        Self {
            columns,
            filename_column,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: StatisticRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full header including the filename column at its position.
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        if self.filename_column == FilenameColumn::Leading {
            header.push(Self::FILENAME.to_string());
        }
        header.extend(self.columns.iter().cloned());
        if self.filename_column == FilenameColumn::Trailing {
            header.push(Self::FILENAME.to_string());
        }
        header
    }

    /// Replaces every NaN with `value`.
    pub fn fill_nan(&mut self, value: f64) {
        for row in &mut self.rows {
            for v in row.values.iter_mut().filter(|v| v.is_nan()) {
                *v = value;
            }
        }
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.filename.as_str())
    }
}

/// A per-image failure recorded by a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub file: String,
    pub reason: String,
}

/// Output of a batch run: the surviving rows plus every skipped image.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub table: ResultsTable,
    pub failures: Vec<ImageFailure>,
}

impl BatchReport {
    pub fn new(table: ResultsTable) -> Self {
        Self {
            table,
            failures: Vec::new(),
        }
    }

    pub fn skipped(&self) -> usize {
        self.failures.len()
    }
}

/// Green-screen statistics for one semantic category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreenScore {
    pub joint_count: f64,
    pub percent_coverage: f64,
}
