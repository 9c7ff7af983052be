use std::{fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::{
    algorithms::green_screen::HsvGreenScreen,
    error::{Result, StatsError},
};

/// Run settings shared by both pipelines and the assembler.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// Extension of label raster files, without the dot
    pub raster_extension: String,
    /// Extension of results tables picked up by consolidation
    pub table_extension: String,
    /// Log batch progress every this many images
    pub progress_interval: usize,
    /// Log directory scan progress every this many entries
    pub listing_progress_interval: usize,
    /// Value that replaces missing statistics on consolidation
    pub fill_value: f64,
    pub green_screen: HsvGreenScreen,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            raster_extension: "npy".to_string(),
            table_extension: "csv".to_string(),
            progress_interval: 100,
            listing_progress_interval: 5000,
            fill_value: 0.0,
            green_screen: HsvGreenScreen::default(),
        }
    }
}

impl StatsConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path)?),
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(StatsError::UnsupportedConfigFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StatsConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::green_screen::ChannelOrder;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StatsConfig::from_toml(
            r#"
            progress_interval = 10

            [green_screen]
            channel_order = "rgb"
            "#,
        )
        .unwrap();

        assert_eq!(config.progress_interval, 10);
        assert_eq!(config.raster_extension, "npy");
        assert_eq!(config.green_screen.channel_order, ChannelOrder::Rgb);
        assert_eq!(config.green_screen.lower, [57, 26, 0]);
        assert_eq!(config.green_screen.opening_radius, 2);
    }

    #[test]
    fn test_toml_and_json_round_trip() {
        let config = StatsConfig::default();
        assert_eq!(StatsConfig::from_toml(&config.to_toml().unwrap()).unwrap(), config);
        assert_eq!(StatsConfig::from_json(&config.to_json().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("run.json");
        fs::write(&json, r#"{ "raster_extension": "npz" }"#).unwrap();
        assert_eq!(StatsConfig::from_file(&json).unwrap().raster_extension, "npz");

        let yaml = dir.path().join("run.yaml");
        fs::write(&yaml, "raster_extension: npy").unwrap();
        assert!(matches!(
            StatsConfig::from_file(&yaml),
            Err(StatsError::UnsupportedConfigFormat)
        ));
    }

    #[test]
    fn test_schema_names_fields() {
        let schema = serde_json::to_string(&StatsConfig::schema()).unwrap();
        assert!(schema.contains("raster_extension"));
        assert!(schema.contains("green_screen"));
    }
}
