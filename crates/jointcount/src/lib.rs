//! # Joint-Count Statistics Library
//!
//! Spatial clustering and green-pixel coverage statistics for street-level
//! imagery, computed from per-pixel class rasters produced by a semantic
//! segmentation model and the matching color images.
//!
//! ## Core Features
//!
//! - **Category Registry**: composite categories over the model vocabulary,
//!   resolved to class codes once at startup
//! - **Joint Count**: 2×2 neighborhood self-clustering score for binary masks
//! - **Label Pipeline**: per-image statistics for every category and label
//! - **Green Screen Pipeline**: HSV vegetation detection intersected with
//!   the semantic vegetation classes
//! - **Consolidation**: merge CSV tables from several batch runs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jointcount::{CategoryRegistry, LabelStatsPipeline};
//! use std::collections::HashSet;
//!
//! let registry = CategoryRegistry::ade20k()?;
//! let pipeline = LabelStatsPipeline::builder().build_labels();
//!
//! let pending = pipeline.list_unprocessed("rasters", &HashSet::new())?;
//! let report = pipeline.process_batch("rasters", &pending, &registry)?;
//! report.table.write_csv("spatial_stats.csv")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod registry;
pub mod algorithms;
pub mod pipeline;
pub mod io;
pub mod config;

pub use error::{Result, StatsError};
pub use types::*;
pub use traits::*;
pub use registry::{Category, CategoryRegistry, ADE20K_LABELS};
pub use algorithms::*;
pub use pipeline::{GreenRow, GreenScreenPipeline, LabelStatsPipeline, PipelineBuilder};
pub use pipeline::green::{GREEN_SUB_LABELS, is_failure_sentinel, render_legacy};
pub use io::*;
pub use config::StatsConfig;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_label_and_green_pipelines_agree_on_vegetation_masks() {
        let registry = CategoryRegistry::ade20k().expect("default taxonomy");
        let raster = Array2::from_shape_fn((6, 6), |(y, x)| if y < 3 && x < 3 { 4 } else { 2 });

        let row = LabelStatsPipeline::builder()
            .build_labels()
            .process_raster(&raster, &registry, "scene.npy")
            .expect("raster should process");
        let header = LabelStatsPipeline::header(&registry);
        let tree = header.iter().position(|c| c == "tree_ratio").expect("tree column");
        let greenspace = header
            .iter()
            .position(|c| c == "greenspace_ratio")
            .expect("greenspace column");

        let mask = build_label_mask(4, &raster);
        assert_eq!(row.values[tree], joint_count(&mask));
        assert_eq!(row.values[greenspace], row.values[tree]);
    }

    #[test]
    fn test_unknown_label_surfaces_from_registry() {
        let registry = CategoryRegistry::ade20k().expect("default taxonomy");
        let result = registry.resolve_labels(&["tree", "hedge"]);
        assert!(matches!(result, Err(StatsError::UnknownLabel(label)) if label == "hedge"));
    }
}
