use crate::models::{FieldDef, PlayerRecord};

/// A named point dataset: attribute schema plus records in cursor order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub schema: Vec<FieldDef>,
    pub records: Vec<PlayerRecord>,
}

impl Dataset {
    pub fn new(name: &str, schema: Vec<FieldDef>, records: Vec<PlayerRecord>) -> Self {
        Self {
            name: name.to_string(),
            schema,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.schema.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Append columns not already in the schema. Every record gains a null
    /// value for each appended column. Returns the number of columns added.
    pub fn add_fields(&mut self, fields: &[FieldDef]) -> usize {
        let mut added = 0;
        for field in fields {
            if self.has_field(&field.name) {
                continue;
            }
            for record in &mut self.records {
                record
                    .attributes
                    .entry(field.name.clone())
                    .or_insert_with(|| field.null_value());
            }
            self.schema.push(field.clone());
            added += 1;
        }
        added
    }

    /// Copy of this dataset under a new name holding only matching records.
    pub fn select<F>(&self, name: &str, predicate: F) -> Dataset
    where
        F: Fn(&PlayerRecord) -> bool,
    {
        Dataset {
            name: name.to_string(),
            schema: self.schema.clone(),
            records: self
                .records
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use geo::Point;
    use std::collections::HashMap;

    fn player(position: &str) -> PlayerRecord {
        let mut attributes = HashMap::new();
        attributes.insert(
            "position".to_string(),
            FieldValue::Character(Some(position.to_string())),
        );
        PlayerRecord::new(Point::new(0.0, 0.0), attributes)
    }

    #[test]
    fn test_add_fields_is_idempotent() {
        let mut dataset = Dataset::new(
            "players",
            vec![FieldDef::character("position", 2)],
            vec![player("C"), player("G")],
        );

        let fields = [
            FieldDef::float("height_cm", 13, 1),
            FieldDef::float("weight_kg", 13, 1),
        ];
        assert_eq!(dataset.add_fields(&fields), 2);
        assert_eq!(dataset.add_fields(&fields), 0);
        assert_eq!(dataset.schema.len(), 3);
        assert!(dataset.records[0].get("height_cm").unwrap().is_null());
    }

    #[test]
    fn test_select_keeps_schema() {
        let dataset = Dataset::new(
            "players",
            vec![FieldDef::character("position", 2)],
            vec![player("C"), player("G"), player("C")],
        );

        let centres = dataset.select("centres", |r| r.has_value("position", "C"));
        assert_eq!(centres.name, "centres");
        assert_eq!(centres.len(), 2);
        assert_eq!(centres.schema, dataset.schema);
    }
}
