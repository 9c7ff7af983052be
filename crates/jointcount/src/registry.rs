//! Label vocabulary and composite category definitions.
//!
//! The vocabulary order is the segmentation model's class order, so a
//! label's position is its integer code in every raster. Categories are
//! resolved to code sets once, when the registry is built.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    error::{Result, StatsError},
    types::LabelCode,
};

/// The 150 ADE20K classes, in PSPNet output order.
pub const ADE20K_LABELS: [&str; 150] = [
    "wall", "building", "sky", "floor", "tree", "ceiling", "road", "bed", "windowpane",
    "grass", "cabinet", "sidewalk", "person", "earth", "door", "table", "mountain",
    "plant", "curtain", "chair", "car", "water", "painting", "sofa", "shelf", "house",
    "sea", "mirror", "rug", "field", "armchair", "seat", "fence", "desk", "rock",
    "wardrobe", "lamp", "bathtub", "railing", "cushion", "base", "box", "column",
    "signboard", "chest of drawers", "counter", "sand", "sink", "skyscraper",
    "fireplace", "refrigerator", "grandstand", "path", "stairs", "runway", "case",
    "pool table", "pillow", "screen door", "stairway", "river", "bridge", "bookcase",
    "blind", "coffee table", "toilet", "flower", "book", "hill", "bench", "countertop",
    "stove", "palm", "kitchen island", "computer", "swivel chair", "boat", "bar",
    "arcade machine", "hovel", "bus", "towel", "light", "truck", "tower", "chandelier",
    "awning", "streetlight", "booth", "television receiver", "airplane", "dirt track",
    "apparel", "pole", "land", "bannister", "escalator", "ottoman", "bottle", "buffet",
    "poster", "stage", "van", "ship", "fountain", "conveyer belt", "canopy", "washer",
    "plaything", "swimming pool", "stool", "barrel", "basket", "waterfall", "tent",
    "bag", "minibike", "cradle", "oven", "ball", "food", "step", "tank", "trade name",
    "microwave", "pot", "animal", "bicycle", "lake", "dishwasher", "screen", "blanket",
    "sculpture", "hood", "sconce", "vase", "traffic light", "tray", "ashcan", "fan",
    "pier", "crt screen", "plate", "monitor", "bulletin board", "shower", "radiator",
    "glass", "clock", "flag",
];

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Category {
    /// Walkable infrastructure
    Accessibility,
    /// Every natural surface, green or not
    AllNature,
    /// People, vehicles and animals
    Animate,
    /// Water bodies
    Bluespace,
    /// Built environment
    BuiltEnv,
    /// Vegetation
    Greenspace,
    /// Non-vegetated natural surfaces
    OtherNature,
}

impl Category {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Labels that make up the category in the default taxonomy.
    pub fn default_labels(&self) -> &'static [&'static str] {
        match self {
            Self::Greenspace => &["tree", "grass", "plant", "field", "flower"],
            Self::Accessibility => &[
                "sidewalk", "escalator", "path", "stairs", "stairway", "bench", "step",
            ],
            Self::AllNature => &[
                "tree", "grass", "plant", "field", "land", "flower", "water", "sea",
                "waterfall", "lake", "earth", "mountain", "rock", "sky", "sand", "hill",
                "dirt track",
            ],
            Self::Bluespace => &["water", "sea", "waterfall", "lake"],
            Self::OtherNature => &[
                "earth", "mountain", "rock", "sky", "sand", "hill", "dirt track", "land",
            ],
            Self::Animate => &[
                "person", "boat", "car", "bus", "truck", "airplane", "van", "ship",
                "minibike", "animal", "bicycle",
            ],
            Self::BuiltEnv => &[
                "wall", "building", "road", "windowpane", "sidewalk", "hovel", "house",
                "fence", "railing", "signboard", "skyscraper", "path", "stairs", "runway",
                "screen", "door", "screen door", "stairway", "bridge", "bench", "booth",
                "awning", "streetlight", "pole", "bannister", "escalator", "fountain",
                "swimming pool", "step", "sculpture", "traffic light", "pier",
                "bulletin board",
            ],
        }
    }
}

/// Immutable taxonomy shared by both pipelines.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    labels: Vec<String>,
    codes: HashMap<String, LabelCode>,
    definitions: BTreeMap<Category, Vec<String>>,
    resolved: BTreeMap<Category, BTreeSet<LabelCode>>,
}

impl CategoryRegistry {
    /// Builds a registry, resolving every category label against `labels`.
    pub fn new(labels: Vec<String>, definitions: BTreeMap<Category, Vec<String>>) -> Result<Self> {
        let mut codes = HashMap::with_capacity(labels.len());
        for (position, label) in labels.iter().enumerate() {
            // First occurrence wins, as a positional lookup would.
            codes.entry(label.clone()).or_insert(position as LabelCode);
        }

        let mut resolved = BTreeMap::new();
        for (category, members) in &definitions {
            let set = members
                .iter()
                .map(|label| {
                    codes
                        .get(label)
                        .copied()
                        .ok_or_else(|| StatsError::UnknownLabel(label.clone()))
                })
                .collect::<Result<BTreeSet<_>>>()?;
            resolved.insert(*category, set);
        }

        Ok(Self {
            labels,
            codes,
            definitions,
            resolved,
        })
    }

    /// The ADE20K vocabulary with the default category definitions.
    pub fn ade20k() -> Result<Self> {
        let labels = ADE20K_LABELS.iter().map(|l| l.to_string()).collect();
        let definitions = Category::iter()
            .map(|category| {
                let members = category.default_labels().iter().map(|l| l.to_string()).collect();
                (category, members)
            })
            .collect();
        Self::new(labels, definitions)
    }

    /// Ordered vocabulary; position is the label code.
    pub fn all_labels(&self) -> &[String] {
        &self.labels
    }

    pub fn categories(&self) -> &BTreeMap<Category, Vec<String>> {
        &self.definitions
    }

    pub fn code_of(&self, label: &str) -> Result<LabelCode> {
        self.codes
            .get(label)
            .copied()
            .ok_or_else(|| StatsError::UnknownLabel(label.to_string()))
    }

    pub fn resolve_labels<S: AsRef<str>>(&self, labels: &[S]) -> Result<BTreeSet<LabelCode>> {
        labels.iter().map(|l| self.code_of(l.as_ref())).collect()
    }

    pub fn resolve(&self, category: Category) -> Result<&BTreeSet<LabelCode>> {
        self.resolved
            .get(&category)
            .ok_or_else(|| StatsError::UnknownCategory(category.to_string()))
    }

    pub fn resolve_named(&self, name: &str) -> Result<&BTreeSet<LabelCode>> {
        let category =
            Category::from_str(name).map_err(|_| StatsError::UnknownCategory(name.to_string()))?;
        self.resolve(category)
    }

    /// Defined categories, sorted by name.
    pub fn sorted_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.definitions.keys().copied().collect();
        categories.sort_by_key(|c| c.name());
        categories
    }

    /// Labels of `category` sorted by name, paired with their codes.
    pub fn sorted_sub_labels(&self, category: Category) -> Result<Vec<(&str, LabelCode)>> {
        let members = self
            .definitions
            .get(&category)
            .ok_or_else(|| StatsError::UnknownCategory(category.to_string()))?;
        let mut labels = members
            .iter()
            .map(|label| Ok((label.as_str(), self.code_of(label)?)))
            .collect::<Result<Vec<_>>>()?;
        labels.sort_by(|a, b| a.0.cmp(b.0));
        Ok(labels)
    }

    /// Column names in row order: each category's stats, then each of its
    /// labels' stats, categories and labels sorted by name.
    pub fn header<S: AsRef<str>>(&self, stat_names: &[S]) -> Vec<String> {
        let mut header = Vec::new();
        for category in self.sorted_categories() {
            for stat in stat_names {
                header.push(format!("{}_{}", category.name(), stat.as_ref()));
            }
            let mut members: Vec<&String> = self.definitions[&category].iter().collect();
            members.sort();
            for label in members {
                for stat in stat_names {
                    header.push(format!("{}_{}", label, stat.as_ref()));
                }
            }
        }
        header
    }
}
