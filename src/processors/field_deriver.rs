use crate::error::{FailureLocation, ProcessingError, Result, Stage};
use crate::models::{Dataset, FieldDef, FieldValue, PlayerRecord};
use crate::utils::constants::{
    DEFAULT_HEIGHT_FIELD, DEFAULT_WEIGHT_FIELD, DERIVED_FIELD_DECIMALS, DERIVED_FIELD_LENGTH,
    HEIGHT_CM_FIELD, WEIGHT_KG_FIELD,
};
use crate::utils::{height_to_cm, pounds_to_kg};
use crate::workspace::{FeatureStore, UpdateCursor};
use tracing::debug;

/// Metric values derived for one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub height_cm: f64,
    pub weight_kg: f64,
}

/// Computes `height_cm` and `weight_kg` from the imperial attributes.
pub struct FieldDeriver {
    height_field: String,
    weight_field: String,
}

impl FieldDeriver {
    pub fn new() -> Self {
        Self {
            height_field: DEFAULT_HEIGHT_FIELD.to_string(),
            weight_field: DEFAULT_WEIGHT_FIELD.to_string(),
        }
    }

    pub fn with_fields(height_field: &str, weight_field: &str) -> Self {
        Self {
            height_field: height_field.to_string(),
            weight_field: weight_field.to_string(),
        }
    }

    /// Columns appended to every output dataset.
    pub fn derived_fields() -> [FieldDef; 2] {
        [
            FieldDef::float(HEIGHT_CM_FIELD, DERIVED_FIELD_LENGTH, DERIVED_FIELD_DECIMALS),
            FieldDef::float(WEIGHT_KG_FIELD, DERIVED_FIELD_LENGTH, DERIVED_FIELD_DECIMALS),
        ]
    }

    pub fn measure(&self, player: &PlayerRecord) -> Result<Measurements> {
        let height_cm = match player.get(&self.height_field) {
            Some(FieldValue::Character(Some(raw))) => height_to_cm(raw)?,
            Some(value) if !value.is_null() => {
                return Err(ProcessingError::HeightParse {
                    raw: value.to_string(),
                    reason: "expected text such as 6'2\"".to_string(),
                })
            }
            _ => {
                return Err(ProcessingError::MissingField {
                    field: self.height_field.clone(),
                })
            }
        };

        let pounds = self.weight_pounds(player)?;
        Ok(Measurements {
            height_cm,
            weight_kg: pounds_to_kg(pounds),
        })
    }

    fn weight_pounds(&self, player: &PlayerRecord) -> Result<f64> {
        let value = player
            .get(&self.weight_field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ProcessingError::MissingField {
                field: self.weight_field.clone(),
            })?;

        let pounds = match value {
            FieldValue::Character(Some(raw)) => {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| ProcessingError::WeightParse { raw: raw.clone() })?
            }
            other => other.as_f64().ok_or_else(|| ProcessingError::WeightParse {
                raw: other.to_string(),
            })?,
        };

        if !pounds.is_finite() {
            return Err(ProcessingError::WeightParse {
                raw: value.to_string(),
            });
        }
        Ok(pounds)
    }

    /// Fill the derived columns of one record.
    pub fn apply(&self, player: &mut PlayerRecord) -> Result<()> {
        let measurements = self.measure(player)?;
        player.set(
            HEIGHT_CM_FIELD,
            FieldValue::Float(Some(measurements.height_cm as f32)),
        );
        player.set(
            WEIGHT_KG_FIELD,
            FieldValue::Float(Some(measurements.weight_kg as f32)),
        );
        Ok(())
    }

    /// Update every row of a persisted dataset through an update cursor.
    ///
    /// The first failing row aborts the update. Nothing is committed in that
    /// case and the error carries the row index within the dataset.
    pub fn populate<S: FeatureStore + ?Sized>(
        &self,
        store: &mut S,
        dataset: &str,
        location: &FailureLocation,
    ) -> Result<usize> {
        let located = |e: ProcessingError, record: Option<usize>| {
            let mut location = location.clone().with_dataset(dataset);
            location.record = record;
            e.at(Stage::FieldDerivation, location)
        };

        let mut cursor = UpdateCursor::open(store, dataset).map_err(|e| located(e, None))?;
        for (index, row) in cursor.rows().enumerate() {
            self.apply(row).map_err(|e| located(e, Some(index)))?;
        }
        let updated = cursor.commit().map_err(|e| located(e, None))?;

        debug!("Derived metric fields for {} rows of {}", updated, dataset);
        Ok(updated)
    }

    /// Every record whose height or weight cannot be converted, with its index.
    pub fn check(&self, players: &Dataset) -> Vec<(usize, ProcessingError)> {
        players
            .records
            .iter()
            .enumerate()
            .filter_map(|(index, player)| self.measure(player).err().map(|e| (index, e)))
            .collect()
    }
}

impl Default for FieldDeriver {
    fn default() -> Self {
        Self::new()
    }
}
