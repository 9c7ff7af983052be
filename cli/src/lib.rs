use std::collections::HashSet;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use jointcount::{
    BatchReport, CategoryRegistry, LabelStatsPipeline, GreenScreenPipeline, ResultsAssembler,
    StatsConfig, processed_filenames,
};
use tracing::{info, warn};

/// Load a config file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<StatsConfig> {
    match path {
        Some(path) => StatsConfig::from_file(path)
            .wrap_err_with(|| format!("Failed to load config {}", path.display())),
        None => Ok(StatsConfig::default()),
    }
}

fn write_report(report: &BatchReport, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    report.table.write_csv(output)?;
    for failure in &report.failures {
        warn!("Skipped {}: {}", failure.file, failure.reason);
    }
    info!(
        "Wrote {} rows to {} ({} skipped)",
        report.table.len(),
        output.display(),
        report.skipped()
    );
    Ok(())
}

/// Joint-count statistics for every raster in `rasters` not already in
/// the `previous` results file.
pub fn run_labels(
    config: StatsConfig,
    rasters: &Path,
    output: &Path,
    previous: Option<&Path>,
) -> Result<BatchReport> {
    let registry = CategoryRegistry::ade20k()?;
    let done = match previous {
        Some(path) => processed_filenames(path)?,
        None => HashSet::new(),
    };

    let pipeline = LabelStatsPipeline::builder().with_config(config).build_labels();
    let pending = pipeline.list_unprocessed(rasters, &done)?;
    let report = pipeline.process_batch(rasters, &pending, &registry)?;
    write_report(&report, output)?;
    Ok(report)
}

/// Green-screen statistics for every image with a matching raster.
pub fn run_green(
    config: StatsConfig,
    images: &Path,
    rasters: &Path,
    output: &Path,
) -> Result<BatchReport> {
    let registry = CategoryRegistry::ade20k()?;
    let pipeline = GreenScreenPipeline::builder().with_config(config).build_green();
    let report = pipeline.process_batch(images, rasters, &registry)?;
    write_report(&report, output)?;
    Ok(report)
}

/// Merge every table in `folder` into `output`.
pub fn run_consolidate(config: &StatsConfig, folder: &Path, output: &Path) -> Result<usize> {
    let assembler = ResultsAssembler {
        fill_value: config.fill_value,
        extension: config.table_extension.clone(),
    };
    let table = assembler
        .consolidate(folder)
        .wrap_err_with(|| format!("Failed to consolidate {}", folder.display()))?;
    table.write_csv(output)?;
    info!("Wrote {} consolidated rows to {}", table.len(), output.display());
    Ok(table.len())
}
