use crate::{
    config::StatsConfig,
    io::{ImageCrateLoader, NpyRasterLoader},
    pipeline::{GreenScreenPipeline, LabelStatsPipeline},
    traits::{ColorImageLoader, GreenDetector, RasterLoader},
};

/// Builder for both batch pipelines with a fluent API
pub struct PipelineBuilder {
    config: StatsConfig,
    raster_loader: Option<Box<dyn RasterLoader>>,
    image_loader: Option<Box<dyn ColorImageLoader>>,
    green_detector: Option<Box<dyn GreenDetector>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: StatsConfig::default(),
            raster_loader: None,
            image_loader: None,
            green_detector: None,
        }
    }

    /// Use the extensions, intervals and thresholds of `config`
    pub fn with_config(mut self, config: StatsConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the raster loader (replaces any existing one)
    pub fn set_raster_loader<L>(mut self, loader: L) -> Self
    where
        L: RasterLoader + 'static,
    {
        self.raster_loader = Some(Box::new(loader));
        self
    }

    /// Set the color image loader (replaces any existing one)
    pub fn set_image_loader<L>(mut self, loader: L) -> Self
    where
        L: ColorImageLoader + 'static,
    {
        self.image_loader = Some(Box::new(loader));
        self
    }

    /// Set the green detector; defaults to the config's HSV screen
    pub fn set_green_detector<D>(mut self, detector: D) -> Self
    where
        D: GreenDetector + 'static,
    {
        self.green_detector = Some(Box::new(detector));
        self
    }

    pub fn build_labels(self) -> LabelStatsPipeline {
        let raster_loader = self.raster_loader
            .unwrap_or_else(|| Box::new(NpyRasterLoader));
        LabelStatsPipeline::new(raster_loader, &self.config)
    }

    pub fn build_green(self) -> GreenScreenPipeline {
        let raster_loader = self.raster_loader
            .unwrap_or_else(|| Box::new(NpyRasterLoader));
        let image_loader = self.image_loader
            .unwrap_or_else(|| Box::new(ImageCrateLoader));
        let detector: Box<dyn GreenDetector> = match self.green_detector {
            Some(detector) => detector,
            None => Box::new(self.config.green_screen.clone()),
        };
        GreenScreenPipeline::new(image_loader, raster_loader, detector, &self.config)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
