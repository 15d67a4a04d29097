use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("dBASE table error: {0}")]
    Dbase(#[from] shapefile::dbase::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid height '{raw}': {reason}")]
    HeightParse { raw: String, reason: String },

    #[error("Invalid weight '{raw}': expected a number of pounds")]
    WeightParse { raw: String },

    #[error("Field '{field}' is missing or null")]
    MissingField { field: String },

    #[error("No polygon named '{country}' in the country dataset")]
    UnknownCountry { country: String },

    #[error("Dataset '{name}' not found")]
    DatasetNotFound { name: String },

    #[error("Dataset '{name}' already exists and overwrite is disabled")]
    DatasetExists { name: String },

    #[error("Dataset '{name}' is locked by another cursor")]
    DatasetLocked { name: String },

    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("{stage} stage failed at {location}: {source}")]
    Stage {
        stage: Stage,
        location: FailureLocation,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Attach the pipeline stage and location to an error. Already located
    /// errors are returned unchanged so the innermost location wins.
    pub fn at(self, stage: Stage, location: FailureLocation) -> Self {
        match self {
            located @ ProcessingError::Stage { .. } => located,
            other => ProcessingError::Stage {
                stage,
                location,
                source: Box::new(other),
            },
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            ProcessingError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&FailureLocation> {
        match self {
            ProcessingError::Stage { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The underlying error with any stage wrapper removed.
    pub fn root(&self) -> &ProcessingError {
        match self {
            ProcessingError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SpatialFilter,
    Partition,
    FieldDerivation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SpatialFilter => "spatial filter",
            Stage::Partition => "partition",
            Stage::FieldDerivation => "field derivation",
        };
        f.write_str(name)
    }
}

/// Where in the run a failure happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureLocation {
    pub country: String,
    pub position: Option<String>,
    pub dataset: Option<String>,
    pub record: Option<usize>,
}

impl FailureLocation {
    pub fn country(country: &str) -> Self {
        Self {
            country: country.to_string(),
            ..Default::default()
        }
    }

    pub fn with_position(mut self, position: &str) -> Self {
        self.position = Some(position.to_string());
        self
    }

    pub fn with_dataset(mut self, dataset: &str) -> Self {
        self.dataset = Some(dataset.to_string());
        self
    }

    pub fn with_record(mut self, record: usize) -> Self {
        self.record = Some(record);
        self
    }
}

impl fmt::Display for FailureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "country '{}'", self.country)?;
        if let Some(position) = &self.position {
            write!(f, ", position '{}'", position)?;
        }
        if let Some(dataset) = &self.dataset {
            write!(f, ", dataset '{}'", dataset)?;
        }
        if let Some(record) = self.record {
            write!(f, ", record {}", record)?;
        }
        Ok(())
    }
}
