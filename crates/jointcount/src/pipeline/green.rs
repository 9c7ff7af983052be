//! Green-pixel coverage inside the vegetation classes of each image.

use std::{
    collections::{BTreeSet, HashSet},
    path::Path,
};

use image::RgbImage;
use tracing::{debug, info, warn};
use crate::{
    algorithms::{green_screen::green_screen, score_one_category},
    config::StatsConfig,
    error::{Result, StatsError},
    pipeline::{builder::PipelineBuilder, has_extension, list_files},
    registry::{Category, CategoryRegistry},
    traits::{ColorImageLoader, GreenDetector, RasterLoader},
    types::{
        BatchReport, FilenameColumn, GreenScore, ImageFailure, LabelCode, LabelRaster,
        ResultsTable, StatisticRow,
    },
};

/// Vegetation labels scored on their own, after the composite.
pub const GREEN_SUB_LABELS: [&str; 5] = ["tree", "grass", "plant", "field", "flower"];

/// Column stems, composite first.
pub const GREEN_COLUMN_NAMES: [&str; 6] = ["green", "tree", "grass", "plant", "field", "flower"];

/// Width of a legacy green-screen row.
pub const GREEN_ROW_WIDTH: usize = 2 * GREEN_COLUMN_NAMES.len();

/// Scores for the greenspace composite followed by each sub-label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreenRow {
    pub scores: [GreenScore; 6],
}

impl GreenRow {
    /// Interleaved (joint, perc) pairs in column order.
    pub fn legacy_values(&self) -> Vec<f64> {
        self.scores
            .iter()
            .flat_map(|score| [score.joint_count, score.percent_coverage])
            .collect()
    }
}

/// Renders an outcome as a legacy row; failures become all ones.
pub fn render_legacy(outcome: &Result<GreenRow>) -> Vec<f64> {
    match outcome {
        Ok(row) => row.legacy_values(),
        Err(_) => vec![1.0; GREEN_ROW_WIDTH],
    }
}

/// True for the all-ones row that marks a failed pair.
pub fn is_failure_sentinel(values: &[f64]) -> bool {
    !values.is_empty() && values.iter().all(|&v| v == 1.0)
}

pub struct GreenScreenPipeline {
    image_loader: Box<dyn ColorImageLoader>,
    raster_loader: Box<dyn RasterLoader>,
    detector: Box<dyn GreenDetector>,
    raster_extension: String,
    progress_interval: usize,
}

impl GreenScreenPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn new(
        image_loader: Box<dyn ColorImageLoader>,
        raster_loader: Box<dyn RasterLoader>,
        detector: Box<dyn GreenDetector>,
        config: &StatsConfig,
    ) -> Self {
        Self {
            image_loader,
            raster_loader,
            detector,
            raster_extension: config.raster_extension.clone(),
            progress_interval: config.progress_interval.max(1),
        }
    }

    pub fn header() -> Vec<String> {
        GREEN_COLUMN_NAMES
            .iter()
            .flat_map(|name| [format!("g_{name}_joint"), format!("g_{name}_perc")])
            .collect()
    }

    /// Code sets in column order.
    fn targets(registry: &CategoryRegistry) -> Result<Vec<BTreeSet<LabelCode>>> {
        let mut targets = vec![registry.resolve(Category::Greenspace)?.clone()];
        for label in GREEN_SUB_LABELS {
            targets.push(BTreeSet::from([registry.code_of(label)?]));
        }
        Ok(targets)
    }

    /// Scores an already loaded image and raster.
    pub fn score_pair(
        &self,
        image: &RgbImage,
        raster: &LabelRaster,
        registry: &CategoryRegistry,
    ) -> Result<GreenRow> {
        let targets = Self::targets(registry)?;
        let screened = green_screen(self.detector.as_ref(), image)?;

        let mut scores = [GreenScore {
            joint_count: f64::NAN,
            percent_coverage: 0.0,
        }; 6];
        for (slot, codes) in scores.iter_mut().zip(&targets) {
            *slot = score_one_category(codes, &screened, raster)?;
        }
        Ok(GreenRow { scores })
    }

    /// Loads and scores one image with its raster. Load and scoring
    /// failures come back as [`StatsError::PairProcessing`].
    pub fn process_image_pair<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        color_path: P,
        raster_path: Q,
        registry: &CategoryRegistry,
    ) -> Result<GreenRow> {
        let color_path = color_path.as_ref();
        Self::targets(registry)?;

        let pair_error = |err: StatsError| StatsError::PairProcessing {
            file: color_path.display().to_string(),
            reason: err.to_string(),
        };
        let image = self.image_loader.load_image(color_path).map_err(pair_error)?;
        let raster = self
            .raster_loader
            .load_raster(raster_path.as_ref())
            .map_err(pair_error)?;
        self.score_pair(&image, &raster, registry).map_err(pair_error)
    }

    /// Legacy form of [`Self::process_image_pair`]: twelve values, or the
    /// all-ones sentinel when the pair could not be processed.
    pub fn process_image_pair_legacy<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        color_path: P,
        raster_path: Q,
        registry: &CategoryRegistry,
    ) -> Vec<f64> {
        let outcome = self.process_image_pair(color_path.as_ref(), raster_path, registry);
        if let Err(err) = &outcome {
            warn!("Couldn't load imagery for file {}: {}", color_path.as_ref().display(), err);
        }
        render_legacy(&outcome)
    }

    /// Scores every image in `image_folder` that has a raster with the same
    /// stem in `raster_folder`. Rows are keyed by the image stem.
    pub fn process_batch<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        image_folder: P,
        raster_folder: Q,
        registry: &CategoryRegistry,
    ) -> Result<BatchReport> {
        let image_folder = image_folder.as_ref();
        let raster_folder = raster_folder.as_ref();
        Self::targets(registry)?;

        let images = list_files(image_folder)?;
        let rasters: HashSet<String> = list_files(raster_folder)?
            .into_iter()
            .filter(|name| has_extension(name, &self.raster_extension))
            .collect();
        if images.len() != rasters.len() {
            warn!(
                "Unequal number of img ({}) and {} ({}) files",
                images.len(),
                self.raster_extension,
                rasters.len()
            );
        }

        let table = ResultsTable::new(Self::header(), FilenameColumn::Trailing);
        let mut report = BatchReport::new(table);

        for (index, image_name) in images.iter().enumerate() {
            if (index + 1) % self.progress_interval == 0 {
                debug!("Processed {} images", index + 1);
            }
            let Some(stem) = Path::new(image_name).file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raster_name = format!("{stem}.{}", self.raster_extension);
            if !rasters.contains(&raster_name) {
                debug!("No raster for {}, skipping", image_name);
                continue;
            }

            let outcome = self.process_image_pair(
                image_folder.join(image_name),
                raster_folder.join(&raster_name),
                registry,
            );
            match outcome {
                Ok(row) => report.table.push(StatisticRow {
                    filename: stem.to_string(),
                    values: row.legacy_values(),
                }),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!("Couldn't process image {}: {}", image_name, err);
                    report.failures.push(ImageFailure {
                        file: image_name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            "Green screened {} images, skipped {}",
            report.table.len(),
            report.skipped()
        );
        Ok(report)
    }
}
