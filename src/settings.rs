//! Run configuration.
//!
//! Values are layered: built-in defaults, an optional TOML/JSON/YAML file,
//! `ROSTER__*` environment variables (`ROSTER__OUTPUT__OVERWRITE=false`,
//! `ROSTER__COUNTRIES=Canada,Sweden`), then command-line overrides.

use crate::error::Result;
use crate::utils::constants::{
    DEFAULT_COUNTRY_FIELD, DEFAULT_HEIGHT_FIELD, DEFAULT_LATITUDE_COLUMN,
    DEFAULT_LONGITUDE_COLUMN, DEFAULT_POSITION_FIELD, DEFAULT_WEIGHT_FIELD, ENV_PREFIX,
};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: InputConfig,
    pub output: OutputConfig,

    #[validate(length(min = 1), custom(function = "validate_distinct"))]
    pub countries: Vec<String>,

    #[validate(length(min = 1), custom(function = "validate_distinct"))]
    pub positions: Vec<String>,

    #[validate(nested)]
    pub fields: FieldNames,

    pub missing_country: MissingCountryPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub countries_path: PathBuf,
    pub players_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub workspace: PathBuf,
    /// Replace existing datasets with the same computed name.
    pub overwrite: bool,
}

/// Attribute names in the input datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FieldNames {
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 1))]
    pub position: String,
    #[validate(length(min = 1))]
    pub height: String,
    #[validate(length(min = 1))]
    pub weight: String,
    #[validate(length(min = 1))]
    pub longitude: String,
    #[validate(length(min = 1))]
    pub latitude: String,
}

/// What to do when a configured country matches no polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingCountryPolicy {
    /// Produce empty datasets for every position.
    #[default]
    Empty,
    /// Fail the run.
    Error,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            countries: vec![
                "United States".to_string(),
                "Canada".to_string(),
                "Russia".to_string(),
            ],
            positions: vec!["C".to_string(), "G".to_string(), "RW".to_string()],
            fields: FieldNames::default(),
            missing_country: MissingCountryPolicy::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            countries_path: PathBuf::from("Countries_WGS84.shp"),
            players_path: PathBuf::from("nhlrosters.shp"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("output"),
            overwrite: true,
        }
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY_FIELD.to_string(),
            position: DEFAULT_POSITION_FIELD.to_string(),
            height: DEFAULT_HEIGHT_FIELD.to_string(),
            weight: DEFAULT_WEIGHT_FIELD.to_string(),
            longitude: DEFAULT_LONGITUDE_COLUMN.to_string(),
            latitude: DEFAULT_LATITUDE_COLUMN.to_string(),
        }
    }
}

/// Command-line values that take precedence over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub countries_path: Option<PathBuf>,
    pub players_path: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub countries: Vec<String>,
    pub positions: Vec<String>,
    pub no_overwrite: bool,
}

impl ConfigOverrides {
    fn apply(
        &self,
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>> {
        let paths = [
            ("input.countries_path", &self.countries_path),
            ("input.players_path", &self.players_path),
            ("output.workspace", &self.workspace),
        ];
        for (key, value) in paths {
            builder = builder.set_override_option(
                key,
                value.as_ref().map(|p| p.to_string_lossy().into_owned()),
            )?;
        }
        if !self.countries.is_empty() {
            builder = builder.set_override("countries", self.countries.clone())?;
        }
        if !self.positions.is_empty() {
            builder = builder.set_override("positions", self.positions.clone())?;
        }
        if self.no_overwrite {
            builder = builder.set_override("output.overwrite", false)?;
        }
        Ok(builder)
    }
}

impl PipelineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_overrides(path, &ConfigOverrides::default())
    }

    pub fn load_with_overrides(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("countries")
                .with_list_parse_key("positions")
                .try_parsing(true),
        );
        builder = overrides.apply(builder)?;

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

fn validate_distinct(values: &[String]) -> std::result::Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for value in values {
        if value.trim().is_empty() {
            return Err(ValidationError::new("blank_entry"));
        }
        if !seen.insert(value.as_str()) {
            return Err(ValidationError::new("duplicate_entry"));
        }
    }
    Ok(())
}
