pub mod builder;
pub mod labels;
pub mod green;

use std::{fs, path::Path};

use tracing::warn;

use crate::error::Result;

pub use builder::PipelineBuilder;
pub use labels::LabelStatsPipeline;
pub use green::{GreenRow, GreenScreenPipeline};

/// Names of the regular files in `folder`, in directory listing order.
pub(crate) fn list_files(folder: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(_) => warn!("Skipping {}: file name is not valid UTF-8", entry.path().display()),
        }
    }
    Ok(names)
}

pub(crate) fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}
