use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, FieldDef, FieldValue, PlayerRecord};
use crate::readers::attributes::{
    declared_decimals, field_def_for, field_def_from_dbase, value_from_dbase, value_from_json,
    widen_field,
};
use crate::utils::constants::{DEFAULT_LATITUDE_COLUMN, DEFAULT_LONGITUDE_COLUMN};
use csv::ReaderBuilder;
use geo::Point;
use geojson::GeoJson;
use shapefile::{dbase, Reader, Shape};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

const DELETION_FLAG_FIELD: &str = "DeletionFlag";

/// Reads player point features into a [`Dataset`], keeping every attribute.
pub struct PlayerReader {
    longitude_column: String,
    latitude_column: String,
}

impl PlayerReader {
    pub fn new() -> Self {
        Self {
            longitude_column: DEFAULT_LONGITUDE_COLUMN.to_string(),
            latitude_column: DEFAULT_LATITUDE_COLUMN.to_string(),
        }
    }

    /// Coordinate columns used for CSV input.
    pub fn with_coordinate_columns(mut self, longitude: &str, latitude: &str) -> Self {
        self.longitude_column = longitude.to_string();
        self.latitude_column = latitude.to_string();
        self
    }

    pub fn read_players(&self, path: &Path) -> Result<Dataset> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Player file has no extension: {}",
                    path.display()
                ))
            })?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("players")
            .to_string();

        let dataset = match extension.as_str() {
            "shp" => read_point_shapefile(&name, path)?,
            "geojson" | "json" => self.read_geojson(&name, path)?,
            "csv" => self.read_csv(&name, path)?,
            other => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Unsupported player format: {}",
                    other
                )))
            }
        };

        info!(
            "Loaded {} players ({} fields) from {}",
            dataset.len(),
            dataset.schema.len(),
            path.display()
        );
        Ok(dataset)
    }

    fn read_geojson(&self, name: &str, path: &Path) -> Result<Dataset> {
        let file = File::open(path)?;
        let geojson = GeoJson::from_reader(BufReader::new(file))?;

        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => {
                return Err(ProcessingError::InvalidFormat(
                    "GeoJSON must be a FeatureCollection".to_string(),
                ))
            }
        };

        let mut schema: Vec<FieldDef> = Vec::new();
        let mut records = Vec::new();

        for feature in collection.features {
            let location = match feature.geometry {
                Some(geometry) => {
                    let value: geo::Geometry<f64> = geometry.value.try_into().map_err(|e| {
                        ProcessingError::UnsupportedGeometry(format!("{:?}", e))
                    })?;
                    match value {
                        geo::Geometry::Point(point) => point,
                        other => {
                            return Err(ProcessingError::UnsupportedGeometry(format!(
                                "player features must be points, found {:?}",
                                other
                            )))
                        }
                    }
                }
                None => {
                    debug!("Skipping player feature without geometry");
                    continue;
                }
            };

            let mut attributes = HashMap::new();
            if let Some(properties) = feature.properties {
                for (key, value) in properties {
                    let value = value_from_json(&value);
                    match schema.iter_mut().find(|f| f.name == key) {
                        Some(def) => widen_field(def, &value),
                        None => schema.push(field_def_for(&key, &value)),
                    }
                    attributes.insert(key, value);
                }
            }
            records.push(PlayerRecord::new(location, attributes));
        }

        Ok(normalise(Dataset::new(name, schema, records)))
    }

    fn read_csv(&self, name: &str, path: &Path) -> Result<Dataset> {
        let file = File::open(path)?;
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let headers = rdr.headers()?.clone();

        let column = |wanted: &str| {
            headers.iter().position(|h| h == wanted).ok_or_else(|| {
                ProcessingError::MissingField {
                    field: wanted.to_string(),
                }
            })
        };
        let lon_idx = column(self.longitude_column.as_str())?;
        let lat_idx = column(self.latitude_column.as_str())?;

        let mut schema: Vec<FieldDef> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != lon_idx && *i != lat_idx)
            .map(|(_, h)| FieldDef::character(h, 1))
            .collect();

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let coordinate = |idx: usize, label: &str| {
                let raw = record.get(idx).unwrap_or("");
                raw.parse::<f64>().map_err(|_| {
                    ProcessingError::InvalidFormat(format!(
                        "row {}: invalid {} '{}'",
                        row + 1,
                        label,
                        raw
                    ))
                })
            };
            let location = Point::new(
                coordinate(lon_idx, "longitude")?,
                coordinate(lat_idx, "latitude")?,
            );

            let mut attributes = HashMap::new();
            for (idx, header) in headers.iter().enumerate() {
                if idx == lon_idx || idx == lat_idx {
                    continue;
                }
                let value = match record.get(idx) {
                    Some(v) if !v.is_empty() => FieldValue::Character(Some(v.to_string())),
                    _ => FieldValue::Character(None),
                };
                if let Some(def) = schema.iter_mut().find(|f| f.name == header) {
                    widen_field(def, &value);
                }
                attributes.insert(header.to_string(), value);
            }
            records.push(PlayerRecord::new(location, attributes));
        }

        Ok(Dataset::new(name, schema, records))
    }
}

impl Default for PlayerReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a point shapefile with its full attribute schema.
pub fn read_point_shapefile(name: &str, path: &Path) -> Result<Dataset> {
    let dbf = path.with_extension("dbf");
    let decimals = declared_decimals(&dbf)?;
    let table = dbase::Reader::from_path(&dbf)?;
    let schema: Vec<FieldDef> = table
        .fields()
        .iter()
        .filter(|info| info.name() != DELETION_FLAG_FIELD)
        .map(|info| field_def_from_dbase(info, decimals.get(info.name()).copied()))
        .collect();
    drop(table);

    let mut reader = Reader::from_path(path)?;
    let mut records = Vec::new();

    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result?;

        let location = match shape {
            Shape::Point(p) => Point::new(p.x, p.y),
            Shape::PointM(p) => Point::new(p.x, p.y),
            Shape::PointZ(p) => Point::new(p.x, p.y),
            Shape::NullShape => {
                warn!("Skipping feature {} in {} with null geometry", index, name);
                continue;
            }
            other => {
                return Err(ProcessingError::UnsupportedGeometry(format!(
                    "expected points in {}, found {:?}",
                    name,
                    other.shapetype()
                )))
            }
        };

        let attributes = schema
            .iter()
            .map(|field| {
                let value = record
                    .get(&field.name)
                    .map(value_from_dbase)
                    .unwrap_or_else(|| field.null_value());
                (field.name.clone(), value)
            })
            .collect();

        records.push(PlayerRecord::new(location, attributes));
    }

    Ok(Dataset::new(name, schema, records))
}

/// Fill absent attributes with nulls so every record covers the schema.
fn normalise(mut dataset: Dataset) -> Dataset {
    for record in &mut dataset.records {
        for field in &dataset.schema {
            record
                .attributes
                .entry(field.name.clone())
                .or_insert_with(|| field.null_value());
        }
    }
    dataset
}
