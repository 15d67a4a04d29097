use crate::error::{ProcessingError, Result};
use crate::models::CountryPolygon;
use crate::utils::constants::DEFAULT_COUNTRY_FIELD;
use geo::MultiPolygon;
use geojson::GeoJson;
use shapefile::dbase;
use shapefile::{Reader, Shape};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Reads named country polygons from a shapefile or GeoJSON file.
pub struct CountryReader {
    name_field: String,
}

impl CountryReader {
    pub fn new() -> Self {
        Self {
            name_field: DEFAULT_COUNTRY_FIELD.to_string(),
        }
    }

    pub fn with_name_field(name_field: &str) -> Self {
        Self {
            name_field: name_field.to_string(),
        }
    }

    pub fn read_countries(&self, path: &Path) -> Result<Vec<CountryPolygon>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Country file has no extension: {}",
                    path.display()
                ))
            })?;

        let countries = match extension.as_str() {
            "shp" => self.read_shapefile(path)?,
            "geojson" | "json" => self.read_geojson(path)?,
            other => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Unsupported country format: {}",
                    other
                )))
            }
        };

        info!(
            "Loaded {} country polygons from {}",
            countries.len(),
            path.display()
        );
        Ok(countries)
    }

    fn read_shapefile(&self, path: &Path) -> Result<Vec<CountryPolygon>> {
        let mut reader = Reader::from_path(path)?;
        let mut countries = Vec::new();

        for result in reader.iter_shapes_and_records() {
            let (shape, record) = result?;

            let name = match record.get(&self.name_field) {
                Some(dbase::FieldValue::Character(Some(name))) => name.trim().to_string(),
                Some(dbase::FieldValue::Character(None)) => {
                    debug!("Skipping country polygon with null name");
                    continue;
                }
                Some(_) => {
                    return Err(ProcessingError::InvalidFormat(format!(
                        "Country field '{}' must be a string",
                        self.name_field
                    )))
                }
                None => {
                    return Err(ProcessingError::MissingField {
                        field: self.name_field.clone(),
                    })
                }
            };

            let geometry: MultiPolygon<f64> = match shape {
                Shape::Polygon(polygon) => polygon.try_into().map_err(|e| {
                    ProcessingError::UnsupportedGeometry(format!(
                        "polygon for '{}': {:?}",
                        name, e
                    ))
                })?,
                Shape::PolygonM(polygon) => polygon.try_into().map_err(|e| {
                    ProcessingError::UnsupportedGeometry(format!(
                        "polygonM for '{}': {:?}",
                        name, e
                    ))
                })?,
                Shape::PolygonZ(polygon) => polygon.try_into().map_err(|e| {
                    ProcessingError::UnsupportedGeometry(format!(
                        "polygonZ for '{}': {:?}",
                        name, e
                    ))
                })?,
                other => {
                    debug!("Skipping non-polygon shape {:?} for '{}'", other.shapetype(), name);
                    continue;
                }
            };

            countries.push(CountryPolygon { name, geometry });
        }

        Ok(countries)
    }

    fn read_geojson(&self, path: &Path) -> Result<Vec<CountryPolygon>> {
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

        let mut countries = Vec::new();
        for feature in collection.features {
            let name = match feature
                .properties
                .as_ref()
                .and_then(|props| props.get(&self.name_field))
            {
                Some(serde_json::Value::String(s)) => s.trim().to_string(),
                _ => {
                    debug!("Skipping country feature without a '{}' string", self.name_field);
                    continue;
                }
            };

            let geometry = match feature.geometry {
                Some(geometry) => {
                    let value: geo::Geometry<f64> = geometry.value.try_into().map_err(|e| {
                        ProcessingError::UnsupportedGeometry(format!("'{}': {:?}", name, e))
                    })?;
                    match value {
                        geo::Geometry::MultiPolygon(mp) => mp,
                        geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                        _ => continue,
                    }
                }
                None => continue,
            };

            countries.push(CountryPolygon { name, geometry });
        }

        Ok(countries)
    }
}

impl Default for CountryReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_read_geojson_countries() -> Result<()> {
        let mut file = Builder::new().suffix(".geojson").tempfile()?;
        write!(
            file,
            r#"{{
              "type": "FeatureCollection",
              "features": [
                {{ "type": "Feature",
                   "properties": {{ "CNTRY_NAME": "Canada" }},
                   "geometry": {{ "type": "Polygon",
                     "coordinates": [[[-140,42],[-52,42],[-52,83],[-140,83],[-140,42]]] }} }},
                {{ "type": "Feature",
                   "properties": {{ "CNTRY_NAME": null }},
                   "geometry": {{ "type": "Polygon",
                     "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] }} }},
                {{ "type": "Feature",
                   "properties": {{ "CNTRY_NAME": "Nowhere" }},
                   "geometry": {{ "type": "Point", "coordinates": [0,0] }} }}
              ]
            }}"#
        )?;

        let countries = CountryReader::new().read_countries(file.path())?;
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].name, "Canada");
        assert!(countries[0].contains(&geo::Point::new(-75.7, 45.4)));

        Ok(())
    }

    #[test]
    fn test_custom_name_field() -> Result<()> {
        let mut file = Builder::new().suffix(".json").tempfile()?;
        write!(
            file,
            r#"{{ "type": "FeatureCollection", "features": [
                {{ "type": "Feature", "properties": {{ "country_name": "Russia" }},
                   "geometry": {{ "type": "MultiPolygon",
                     "coordinates": [[[[30,50],[60,50],[60,70],[30,70],[30,50]]]] }} }}
            ] }}"#
        )?;

        let countries = CountryReader::with_name_field("country_name").read_countries(file.path())?;
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].name, "Russia");

        Ok(())
    }

    #[test]
    fn test_unsupported_extension() {
        let err = CountryReader::new()
            .read_countries(Path::new("countries.kml"))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidFormat(_)));
    }
}
