use geo::{Contains, MultiPolygon, Point};

#[derive(Debug, Clone, PartialEq)]
pub struct CountryPolygon {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl CountryPolygon {
    pub fn new(name: &str, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.to_string(),
            geometry,
        }
    }

    /// Strict containment: points on the boundary are not contained.
    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.geometry.contains(point)
    }
}
