pub mod country;
pub mod dataset;
pub mod field;
pub mod player;

pub use country::CountryPolygon;
pub use dataset::Dataset;
pub use field::{FieldDef, FieldKind, FieldValue};
pub use player::PlayerRecord;
