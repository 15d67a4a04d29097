use crate::error::{ProcessingError, Result};
use crate::models::FieldValue;
use geo::Point;
use std::collections::HashMap;

/// A player point feature and its attribute row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub location: Point<f64>,
    pub attributes: HashMap<String, FieldValue>,
}

impl PlayerRecord {
    pub fn new(location: Point<f64>, attributes: HashMap<String, FieldValue>) -> Self {
        Self {
            location,
            attributes,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.attributes.get(field)
    }

    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.attributes.insert(field.to_string(), value);
    }

    /// Non-null text value of a field.
    pub fn text(&self, field: &str) -> Result<&str> {
        match self.attributes.get(field) {
            Some(FieldValue::Character(Some(value))) => Ok(value.as_str()),
            Some(FieldValue::Character(None)) | None => Err(ProcessingError::MissingField {
                field: field.to_string(),
            }),
            Some(other) => Err(ProcessingError::InvalidFormat(format!(
                "field '{}' holds {:?}, expected text",
                field,
                other.kind()
            ))),
        }
    }

    /// Whether the categorical field equals `value`. Null never matches.
    pub fn has_value(&self, field: &str, value: &str) -> bool {
        self.attributes
            .get(field)
            .and_then(FieldValue::as_str)
            .map(|v| v == value)
            .unwrap_or(false)
    }
}
