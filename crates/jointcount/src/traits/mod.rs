use std::path::Path;

use image::RgbImage;
use crate::{error::Result, types::{BinaryMask, LabelRaster}};

/// Trait for loading per-pixel class rasters
pub trait RasterLoader: Send + Sync {
    /// Load a 2-D array of class codes
    fn load_raster(&self, path: &Path) -> Result<LabelRaster>;
}

/// Trait for decoding color images
pub trait ColorImageLoader: Send + Sync {
    /// Decode an image file to an RGB pixel grid
    fn load_image(&self, path: &Path) -> Result<RgbImage>;
}

/// Trait for vegetation detection on color images
pub trait GreenDetector: Send + Sync {
    /// Mark the pixels considered green
    fn detect(&self, image: &RgbImage) -> Result<BinaryMask>;
}
