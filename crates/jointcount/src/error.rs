use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Label '{0}' is not part of the segmentation vocabulary")]
    UnknownLabel(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Could not process image {file}: {reason}")]
    ImageProcessing { file: String, reason: String },

    #[error("Could not process image pair {file}: {reason}")]
    PairProcessing { file: String, reason: String },

    #[error("Schema mismatch in {file}: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        file: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Dimension mismatch: image is {image:?}, raster is {raster:?}")]
    DimensionMismatch {
        image: (usize, usize),
        raster: (usize, usize),
    },

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("No tables found in {0}")]
    EmptyFolder(String),

    #[error("Failed to read npy array: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    #[error("Failed to write npy array: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error("Unsupported config format. Please use .toml or .json files")]
    UnsupportedConfigFormat,
}

pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Taxonomy errors abort a batch; everything else only skips an image.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownLabel(_) | Self::UnknownCategory(_))
    }
}
