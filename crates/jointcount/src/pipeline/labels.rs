//! Per-image joint-count statistics for every category and label.

use std::{collections::HashSet, path::Path};

use tracing::{debug, info, warn};
use crate::{
    algorithms::{build_label_mask, build_mask, joint_count},
    config::StatsConfig,
    error::{Result, StatsError},
    pipeline::{builder::PipelineBuilder, has_extension, list_files},
    registry::CategoryRegistry,
    traits::RasterLoader,
    types::{BatchReport, FilenameColumn, ImageFailure, LabelRaster, ResultsTable, StatisticRow},
};

/// Statistic suffix used in the label-pipeline header.
pub const STAT_NAMES: [&str; 1] = ["ratio"];

pub struct LabelStatsPipeline {
    raster_loader: Box<dyn RasterLoader>,
    raster_extension: String,
    progress_interval: usize,
    listing_progress_interval: usize,
}

impl LabelStatsPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn new(raster_loader: Box<dyn RasterLoader>, config: &StatsConfig) -> Self {
        Self {
            raster_loader,
            raster_extension: config.raster_extension.clone(),
            progress_interval: config.progress_interval.max(1),
            listing_progress_interval: config.listing_progress_interval.max(1),
        }
    }

    /// Column names matching the rows this pipeline produces.
    pub fn header(registry: &CategoryRegistry) -> Vec<String> {
        registry.header(&STAT_NAMES)
    }

    /// Raster files in `folder` that are not in `already_processed`.
    pub fn list_unprocessed<P: AsRef<Path>>(
        &self,
        folder: P,
        already_processed: &HashSet<String>,
    ) -> Result<Vec<String>> {
        let candidates = list_files(folder.as_ref())?;
        let mut to_process = Vec::new();
        for (index, name) in candidates.iter().enumerate() {
            if has_extension(name, &self.raster_extension) && !already_processed.contains(name) {
                to_process.push(name.clone());
            }
            if (index + 1) % self.listing_progress_interval == 0 {
                debug!("Scanned {} files", index + 1);
            }
        }
        info!(
            "Found {} images to process. {} images were already processed",
            to_process.len(),
            candidates.len() - to_process.len()
        );
        Ok(to_process)
    }

    /// Statistics for one raster, in header order.
    pub fn process_raster(
        &self,
        raster: &LabelRaster,
        registry: &CategoryRegistry,
        image_name: &str,
    ) -> Result<StatisticRow> {
        let mut row = StatisticRow::new(image_name);
        for category in registry.sorted_categories() {
            let codes = registry.resolve(category)?;
            row.push(joint_count(&build_mask(codes, raster)));

            for (_, code) in registry.sorted_sub_labels(category)? {
                let mask = build_label_mask(code, raster);
                if mask.is_blank() {
                    row.push(f64::NAN);
                } else {
                    row.push(joint_count(&mask));
                }
            }
        }
        Ok(row)
    }

    pub fn process_image<P: AsRef<Path>>(
        &self,
        raster_path: P,
        registry: &CategoryRegistry,
        image_name: &str,
    ) -> Result<StatisticRow> {
        let raster = self
            .raster_loader
            .load_raster(raster_path.as_ref())
            .map_err(|err| StatsError::ImageProcessing {
                file: image_name.to_string(),
                reason: err.to_string(),
            })?;
        self.process_raster(&raster, registry, image_name)
    }

    /// Processes every file, skipping the ones that fail. Only taxonomy
    /// errors abort the run.
    pub fn process_batch<P: AsRef<Path>>(
        &self,
        folder: P,
        filenames: &[String],
        registry: &CategoryRegistry,
    ) -> Result<BatchReport> {
        let folder = folder.as_ref();
        let table = ResultsTable::new(Self::header(registry), FilenameColumn::Leading);
        let mut report = BatchReport::new(table);

        for (index, filename) in filenames.iter().enumerate() {
            match self.process_image(folder.join(filename), registry, filename) {
                Ok(row) => report.table.push(row),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!("Couldn't process image {}: {}", filename, err);
                    report.failures.push(ImageFailure {
                        file: filename.clone(),
                        reason: err.to_string(),
                    });
                }
            }
            if (index + 1) % self.progress_interval == 0 {
                debug!("Derived spatial statistics for {} images", index + 1);
            }
        }

        info!(
            "Processed {} images, skipped {}",
            report.table.len(),
            report.skipped()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::{NpyRasterLoader, write_raster}, registry::Category};
    use ndarray::{Array2, array};
    use std::{collections::BTreeMap, fs};

    fn pipeline() -> LabelStatsPipeline {
        LabelStatsPipeline::new(Box::new(NpyRasterLoader), &StatsConfig::default())
    }

    fn small_registry() -> CategoryRegistry {
        let labels = ["sky", "tree", "grass", "water"].map(String::from).to_vec();
        let mut definitions = BTreeMap::new();
        definitions.insert(Category::Greenspace, vec!["tree".to_string(), "grass".to_string()]);
        definitions.insert(Category::Bluespace, vec!["water".to_string()]);
        CategoryRegistry::new(labels, definitions).unwrap()
    }

    #[test]
    fn test_row_follows_header_order() {
        let registry = small_registry();
        // header: bluespace, water, greenspace, grass, tree
        assert_eq!(
            LabelStatsPipeline::header(&registry),
            vec!["bluespace_ratio", "water_ratio", "greenspace_ratio", "grass_ratio", "tree_ratio"]
        );

        let raster = array![[1, 1, 0], [1, 1, 0], [0, 0, 0]];
        let row = pipeline().process_raster(&raster, &registry, "img.npy").unwrap();
        assert_eq!(row.filename, "img.npy");
        assert_eq!(row.values.len(), 5);

        // no water anywhere
        assert!(row.values[0].is_nan());
        assert!(row.values[1].is_nan());
        // greenspace and tree share the same 2x2 block in the top-left corner
        assert_eq!(row.values[2], row.values[4]);
        assert!((row.values[2] - 100.0).abs() < 1e-9);
        // grass absent
        assert!(row.values[3].is_nan());
    }

    #[test]
    fn test_default_registry_row_width() {
        let registry = CategoryRegistry::ade20k().unwrap();
        let raster = Array2::from_elem((4, 4), 4);
        let row = pipeline().process_raster(&raster, &registry, "x.npy").unwrap();
        assert_eq!(row.values.len(), LabelStatsPipeline::header(&registry).len());
    }

    #[test]
    fn test_list_unprocessed_filters_extension_and_done() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.npy", "b.npy", "c.npy", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let done = HashSet::from(["b.npy".to_string()]);

        let mut pending = pipeline().list_unprocessed(dir.path(), &done).unwrap();
        pending.sort();
        assert_eq!(pending, vec!["a.npy", "c.npy"]);
    }

    #[test]
    fn test_batch_skips_corrupt_raster() {
        let dir = tempfile::tempdir().unwrap();
        write_raster(dir.path().join("first.npy"), &array![[1, 1], [0, 2]]).unwrap();
        fs::write(dir.path().join("broken.npy"), b"not an array").unwrap();
        write_raster(dir.path().join("last.npy"), &array![[3, 3], [3, 3]]).unwrap();

        let files = ["first.npy", "broken.npy", "last.npy"].map(String::from).to_vec();
        let report = pipeline()
            .process_batch(dir.path(), &files, &small_registry())
            .unwrap();

        assert_eq!(report.table.len(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failures[0].file, "broken.npy");
        let names: Vec<&str> = report.table.filenames().collect();
        assert_eq!(names, vec!["first.npy", "last.npy"]);
    }

    #[test]
    fn test_batch_skips_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec!["ghost.npy".to_string()];
        let report = pipeline()
            .process_batch(dir.path(), &files, &small_registry())
            .unwrap();
        assert!(report.table.is_empty());
        assert_eq!(report.skipped(), 1);
    }
}
