pub(crate) mod attributes;
pub mod country_reader;
pub mod player_reader;

pub use country_reader::CountryReader;
pub use player_reader::{read_point_shapefile, PlayerReader};
