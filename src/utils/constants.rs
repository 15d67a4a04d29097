/// Default attribute names
pub const DEFAULT_COUNTRY_FIELD: &str = "CNTRY_NAME";
pub const DEFAULT_POSITION_FIELD: &str = "position";
pub const DEFAULT_HEIGHT_FIELD: &str = "height";
pub const DEFAULT_WEIGHT_FIELD: &str = "weight";

/// CSV coordinate columns
pub const DEFAULT_LONGITUDE_COLUMN: &str = "longitude";
pub const DEFAULT_LATITUDE_COLUMN: &str = "latitude";

/// Derived fields
pub const HEIGHT_CM_FIELD: &str = "height_cm";
pub const WEIGHT_KG_FIELD: &str = "weight_kg";
pub const DERIVED_FIELD_LENGTH: u8 = 13;
pub const DERIVED_FIELD_DECIMALS: u8 = 1;

/// Unit conversion
pub const INCHES_PER_FOOT: u32 = 12;
pub const CM_PER_INCH: f64 = 2.54;
pub const KG_PER_POUND: f64 = 0.453592;
pub const DERIVED_PRECISION: i32 = 1;

/// dBASE limits
pub const MAX_CHARACTER_LENGTH: u8 = 254;
pub const DEFAULT_NUMERIC_LENGTH: u8 = 18;
pub const DEFAULT_NUMERIC_DECIMALS: u8 = 6;

/// Workspace file extensions
pub const SHAPEFILE_EXTENSION: &str = "shp";
pub const LOCK_EXTENSION: &str = "lock";
pub const SHAPEFILE_COMPONENTS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ROSTER";

/// Message printed when a run fails
pub const GENERIC_FAILURE_MESSAGE: &str = "Script has produced an error.";

/// Output dataset name for a (position, country) group.
pub fn group_dataset_name(position: &str, country: &str) -> String {
    format!("{}From{}", position, country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_dataset_name() {
        assert_eq!(group_dataset_name("C", "Canada"), "CFromCanada");
        assert_eq!(
            group_dataset_name("RW", "United States"),
            "RWFromUnited States"
        );
    }
}
