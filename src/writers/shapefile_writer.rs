use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, FieldDef, FieldKind, PlayerRecord};
use crate::readers::attributes::value_to_dbase;
use shapefile::dbase::{self, FieldName, TableWriterBuilder};
use std::path::Path;
use tracing::debug;

/// Writes a point [`Dataset`] as an ESRI shapefile (`.shp`, `.shx`, `.dbf`).
pub struct ShapefileWriter;

impl ShapefileWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let table = self.table_builder(&dataset.schema)?;
        let mut writer = shapefile::Writer::from_path(path, table)?;

        for record in &dataset.records {
            let point = shapefile::Point::new(record.location.x(), record.location.y());
            let row = self.to_row(&dataset.schema, record);
            writer.write_shape_and_record(&point, &row)?;
        }

        debug!(
            "Wrote {} records to {}",
            dataset.records.len(),
            path.display()
        );
        Ok(())
    }

    fn table_builder(&self, schema: &[FieldDef]) -> Result<TableWriterBuilder> {
        let mut builder = TableWriterBuilder::new();
        for field in schema {
            let name = FieldName::try_from(field.name.as_str()).map_err(|e| {
                ProcessingError::InvalidFormat(format!(
                    "Invalid dBASE field name '{}': {:?}",
                    field.name, e
                ))
            })?;
            builder = match field.kind {
                FieldKind::Character => builder.add_character_field(name, field.length),
                FieldKind::Numeric => {
                    builder.add_numeric_field(name, field.length, field.decimals)
                }
                FieldKind::Float => builder.add_float_field(name, field.length, field.decimals),
                FieldKind::Integer => builder.add_integer_field(name),
                FieldKind::Logical => builder.add_logical_field(name),
            };
        }
        Ok(builder)
    }

    fn to_row(&self, schema: &[FieldDef], record: &PlayerRecord) -> dbase::Record {
        let mut row = dbase::Record::default();
        for field in schema {
            let value = record
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| field.null_value());
            row.insert(field.name.clone(), value_to_dbase(&value));
        }
        row
    }
}

impl Default for ShapefileWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use crate::readers::read_point_shapefile;
    use geo::Point;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn sample_dataset() -> Dataset {
        let schema = vec![
            FieldDef::character("name", 30),
            FieldDef::character("position", 2),
            FieldDef::character("height", 6),
            FieldDef::numeric("weight", 10, 0),
            FieldDef::float("height_cm", 13, 1),
        ];

        let mut attributes = HashMap::new();
        attributes.insert(
            "name".to_string(),
            FieldValue::Character(Some("Nathan MacKinnon".to_string())),
        );
        attributes.insert(
            "position".to_string(),
            FieldValue::Character(Some("C".to_string())),
        );
        attributes.insert(
            "height".to_string(),
            FieldValue::Character(Some("6'0\"".to_string())),
        );
        attributes.insert("weight".to_string(), FieldValue::Numeric(Some(200.0)));
        attributes.insert("height_cm".to_string(), FieldValue::Float(Some(182.9)));

        Dataset::new(
            "CFromCanada",
            schema,
            vec![PlayerRecord::new(Point::new(-63.57, 44.65), attributes)],
        )
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("CFromCanada.shp");
        let dataset = sample_dataset();

        ShapefileWriter::new().write_dataset(&dataset, &path)?;
        assert!(path.exists());
        assert!(dir.path().join("CFromCanada.dbf").exists());

        let back = read_point_shapefile("CFromCanada", &path)?;
        assert_eq!(back.len(), 1);
        assert_eq!(back.schema.len(), 5);
        let record = &back.records[0];
        assert_eq!(record.location, Point::new(-63.57, 44.65));
        assert_eq!(record.text("position")?, "C");
        assert_eq!(record.text("height")?, "6'0\"");
        assert_eq!(record.get("weight").and_then(FieldValue::as_f64), Some(200.0));
        let height_cm = record.get("height_cm").and_then(FieldValue::as_f64).unwrap();
        assert!((height_cm - 182.9).abs() < 1e-4);

        Ok(())
    }

    #[test]
    fn test_rejects_overlong_field_name() {
        let dir = TempDir::new().unwrap();
        let dataset = Dataset::new(
            "bad",
            vec![FieldDef::character("a_field_name_that_is_far_too_long", 5)],
            vec![],
        );
        let result = ShapefileWriter::new().write_dataset(&dataset, &dir.path().join("bad.shp"));
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }
}
