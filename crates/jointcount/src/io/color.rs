use std::path::Path;

use image::RgbImage;
use crate::{error::Result, traits::ColorImageLoader};

/// Decodes any format enabled in the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct ImageCrateLoader;

impl ColorImageLoader for ImageCrateLoader {
    fn load_image(&self, path: &Path) -> Result<RgbImage> {
        Ok(image::open(path)?.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("street.png");
        RgbImage::from_pixel(4, 3, Rgb([1, 2, 3])).save(&path).unwrap();

        let loaded = ImageCrateLoader.load_image(&path).unwrap();
        assert_eq!(loaded.dimensions(), (4, 3));
        assert_eq!(loaded.get_pixel(2, 1), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageCrateLoader.load_image(&dir.path().join("absent.jpg")).is_err());
    }
}
