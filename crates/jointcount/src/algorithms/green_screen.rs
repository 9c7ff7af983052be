//! Color-threshold vegetation detection and its intersection with
//! semantic masks.

use std::collections::BTreeSet;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    algorithms::{joint_count, masking::build_mask},
    error::{Result, StatsError},
    traits::GreenDetector,
    types::{BinaryMask, GreenScore, LabelCode, LabelRaster},
};

/// Channel order fed to the HSV conversion.
///
/// `Bgr` reproduces imagery decoded as BGR and converted with an RGB→HSV
/// routine, which is how the published green-screen statistics were made.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    IntoStaticStr,
    PartialEq,
    Eq,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChannelOrder {
    #[default]
    Bgr,
    Rgb,
}

/// Converts one pixel to 8-bit HSV: hue in `[0, 180)`, saturation and
/// value in `[0, 255]`.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let saturation = if max > 0.0 { 255.0 * diff / max } else { 0.0 };

    let hue = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue };
    let hue = (hue / 2.0).round() as u16 % 180;

    [hue as u8, saturation.round() as u8, max as u8]
}

/// Per-pixel HSV image, stored in an `Rgb` buffer as (H, S, V).
pub fn to_hsv(image: &RgbImage, order: ChannelOrder) -> RgbImage {
    let mut hsv = RgbImage::new(image.width(), image.height());
    for (x, y, Rgb([c0, c1, c2])) in image.enumerate_pixels() {
        let converted = match order {
            ChannelOrder::Rgb => rgb_to_hsv(*c0, *c1, *c2),
            ChannelOrder::Bgr => rgb_to_hsv(*c2, *c1, *c0),
        };
        hsv.put_pixel(x, y, Rgb(converted));
    }
    hsv
}

/// HSV box threshold followed by a square morphological opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HsvGreenScreen {
    /// Inclusive lower (H, S, V) bound
    pub lower: [u8; 3],
    /// Inclusive upper (H, S, V) bound
    pub upper: [u8; 3],
    /// Opening uses a `(2r + 1)` square; 2 gives 5×5
    pub opening_radius: u8,
    pub channel_order: ChannelOrder,
}

impl Default for HsvGreenScreen {
    fn default() -> Self {
        Self {
            lower: [57, 26, 0],
            upper: [98, 255, 255],
            opening_radius: 2,
            channel_order: ChannelOrder::Bgr,
        }
    }
}

impl HsvGreenScreen {
    fn in_range(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }

    /// Thresholded mask before the opening, as 0/255.
    pub fn threshold(&self, image: &RgbImage) -> GrayImage {
        let hsv = to_hsv(image, self.channel_order);
        GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
            if self.in_range(hsv.get_pixel(x, y).0) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }
}

impl GreenDetector for HsvGreenScreen {
    fn detect(&self, image: &RgbImage) -> Result<BinaryMask> {
        let thresholded = self.threshold(image);
        let opened = if self.opening_radius > 0 {
            imageproc::morphology::open(&thresholded, Norm::LInf, self.opening_radius)
        } else {
            thresholded
        };
        Ok(BinaryMask::from_gray(&opened))
    }
}

/// Default detection with the legacy thresholds and a 5×5 opening.
pub fn detect_green_mask(image: &RgbImage) -> Result<BinaryMask> {
    HsvGreenScreen::default().detect(image)
}

fn check_dimensions(image: &RgbImage, mask_dim: (usize, usize)) -> Result<()> {
    let image_dim = (image.height() as usize, image.width() as usize);
    if image_dim != mask_dim {
        return Err(StatsError::DimensionMismatch {
            image: image_dim,
            raster: mask_dim,
        });
    }
    Ok(())
}

/// Zeroes every channel where `mask` is false.
pub fn apply_semantic_mask(image: &RgbImage, mask: &BinaryMask) -> Result<RgbImage> {
    check_dimensions(image, mask.dim())?;
    let values = mask.as_array();
    let mut output = image.clone();
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        if !values[[y as usize, x as usize]] {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    Ok(output)
}

/// Keeps only the pixels the detector marks as green.
pub fn green_screen<D: GreenDetector + ?Sized>(detector: &D, image: &RgbImage) -> Result<RgbImage> {
    let mask = detector.detect(image)?;
    apply_semantic_mask(image, &mask)
}

/// 1 where any channel is non-zero.
pub fn coverage_mask(image: &RgbImage) -> BinaryMask {
    let (width, height) = image.dimensions();
    BinaryMask::new(ndarray::Array2::from_shape_fn(
        (height as usize, width as usize),
        |(y, x)| image.get_pixel(x as u32, y as u32).0.iter().any(|&c| c != 0),
    ))
}

/// Joint count and percent coverage of green pixels inside the semantic
/// mask for `codes`. `screened` is an already green-screened image.
pub fn score_one_category(
    codes: &BTreeSet<LabelCode>,
    screened: &RgbImage,
    raster: &LabelRaster,
) -> Result<GreenScore> {
    let semantic = build_mask(codes, raster);
    let intersected = apply_semantic_mask(screened, &semantic)?;
    let coverage = coverage_mask(&intersected);

    let pixels = coverage.pixel_count();
    let percent_coverage = if pixels == 0 {
        0.0
    } else {
        100.0 * coverage.count() as f64 / pixels as f64
    };

    Ok(GreenScore {
        joint_count: joint_count::joint_count(&coverage),
        percent_coverage,
    })
}
