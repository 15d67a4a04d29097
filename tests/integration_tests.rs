use pretty_assertions::assert_eq;
use roster_splitter::error::{ProcessingError, Result, Stage};
use geo::Point;
use roster_splitter::models::{CountryPolygon, Dataset, FieldDef, FieldValue, PlayerRecord};
use roster_splitter::processors::{CountryMatch, GroupAndConvertPipeline};
use roster_splitter::readers::{CountryReader, PlayerReader};
use roster_splitter::settings::{ConfigOverrides, MissingCountryPolicy, PipelineConfig};
use roster_splitter::workspace::{DirectoryWorkspace, FeatureStore, MemoryWorkspace};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const COUNTRIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "CNTRY_NAME": "Canada" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-140.0, 42.0], [-52.0, 42.0], [-52.0, 70.0], [-140.0, 70.0], [-140.0, 42.0]]]
      }
    },
    {
      "type": "Feature",
      "properties": { "CNTRY_NAME": "Russia" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[30.0, 42.0], [180.0, 42.0], [180.0, 78.0], [30.0, 78.0], [30.0, 42.0]]]
      }
    }
  ]
}"#;

fn player_feature(
    name: &str,
    position: &str,
    height: &str,
    weight: i64,
    lon: f64,
    lat: f64,
) -> String {
    format!(
        r#"{{
      "type": "Feature",
      "properties": {{ "name": "{}", "position": "{}", "height": "{}", "weight": {} }},
      "geometry": {{ "type": "Point", "coordinates": [{}, {}] }}
    }}"#,
        name,
        position,
        height.replace('"', "\\\""),
        weight,
        lon,
        lat
    )
}

fn write_inputs(dir: &Path, players: &[String]) -> Result<(PathBuf, PathBuf)> {
    let countries_path = dir.join("countries.geojson");
    fs::write(&countries_path, COUNTRIES)?;

    let players_path = dir.join("nhlrosters.geojson");
    fs::write(
        &players_path,
        format!(
            r#"{{ "type": "FeatureCollection", "features": [{}] }}"#,
            players.join(",")
        ),
    )?;

    Ok((countries_path, players_path))
}

fn load(countries_path: &Path, players_path: &Path) -> Result<(Vec<CountryPolygon>, Dataset)> {
    let countries = CountryReader::new().read_countries(countries_path)?;
    let players = PlayerReader::new().read_players(players_path)?;
    Ok((countries, players))
}

fn settings(countries: &[&str], positions: &[&str]) -> PipelineConfig {
    PipelineConfig {
        countries: countries.iter().map(|s| s.to_string()).collect(),
        positions: positions.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn float(dataset: &Dataset, record: usize, field: &str) -> f32 {
    match dataset.records[record].get(field) {
        Some(FieldValue::Float(Some(v))) => *v,
        Some(FieldValue::Numeric(Some(v))) => *v as f32,
        other => panic!("{} is not a number: {:?}", field, other),
    }
}

#[test]
fn test_single_centre_from_canada() -> Result<()> {
    let dir = TempDir::new()?;
    let (countries_path, players_path) = write_inputs(
        dir.path(),
        &[player_feature("Player One", "C", "6'0\"", 180, -79.4, 43.7)],
    )?;
    let (countries, players) = load(&countries_path, &players_path)?;

    let mut store = DirectoryWorkspace::open(&dir.path().join("output"))?;
    let report = GroupAndConvertPipeline::new(settings(&["Canada"], &["C"]))
        .run(&mut store, &countries, &players, None)
        .into_result()?;

    assert_eq!(report.dataset_names(), vec!["CFromCanada"]);
    assert_eq!(store.list()?, vec!["CFromCanada".to_string()]);

    let output = store.read_dataset("CFromCanada")?;
    assert_eq!(output.len(), 1);
    assert!(output.has_field("name"));
    assert!(output.has_field("height_cm"));
    assert!(output.has_field("weight_kg"));
    assert!((float(&output, 0, "height_cm") - 182.9).abs() < 1e-3);
    assert!((float(&output, 0, "weight_kg") - 81.6).abs() < 1e-3);
    assert!(output.records[0].has_value("position", "C"));

    Ok(())
}

#[test]
fn test_groups_hold_only_contained_players_of_their_position() -> Result<()> {
    let dir = TempDir::new()?;
    let (countries_path, players_path) = write_inputs(
        dir.path(),
        &[
            player_feature("Toronto Centre", "C", "6'1\"", 193, -79.4, 43.7),
            player_feature("Montreal Goalie", "G", "6'3\"", 205, -73.6, 45.5),
            player_feature("Moscow Centre", "C", "5'11\"", 185, 37.6, 55.7),
            player_feature("Moscow Goalie", "G", "6'2\"", 200, 37.7, 55.8),
            player_feature("Helsinki Centre", "C", "6'0\"", 190, 24.9, 60.2),
            player_feature("Boston Goalie", "G", "6'4\"", 215, -71.1, 40.0),
        ],
    )?;
    let (countries, players) = load(&countries_path, &players_path)?;

    let mut store = DirectoryWorkspace::open(&dir.path().join("output"))?;
    let pipeline = GroupAndConvertPipeline::new(settings(&["Canada", "Russia"], &["C", "G"]));
    let report = pipeline
        .run(&mut store, &countries, &players, None)
        .into_result()?;

    assert_eq!(report.total_records(), 4);
    assert_eq!(
        store.list()?,
        vec!["CFromCanada", "CFromRussia", "GFromCanada", "GFromRussia"]
    );

    for country in &countries {
        for position in ["C", "G"] {
            let dataset = store.read_dataset(&format!("{}From{}", position, country.name))?;
            assert_eq!(dataset.len(), 1);
            for record in &dataset.records {
                assert!(country.contains(&record.location));
                assert!(record.has_value("position", position));
            }
        }
    }

    let goalie = store.read_dataset("GFromRussia")?;
    assert!((float(&goalie, 0, "height_cm") - 188.0).abs() < 1e-3);
    assert!((float(&goalie, 0, "weight_kg") - 90.7).abs() < 1e-3);

    Ok(())
}

#[test]
fn test_rerun_with_overwrite_is_idempotent() -> Result<()> {
    let dir = TempDir::new()?;
    let (countries_path, players_path) = write_inputs(
        dir.path(),
        &[
            player_feature("First", "RW", "6'0\"", 180, -100.0, 55.0),
            player_feature("Second", "RW", "5'10\"", 175, -110.0, 60.0),
        ],
    )?;
    let (countries, players) = load(&countries_path, &players_path)?;
    let pipeline = GroupAndConvertPipeline::new(settings(&["Canada"], &["RW"]));

    let mut store = DirectoryWorkspace::open(&dir.path().join("output"))?;
    pipeline.run(&mut store, &countries, &players, None).into_result()?;
    let first = store.read_dataset("RWFromCanada")?;

    pipeline.run(&mut store, &countries, &players, None).into_result()?;
    let second = store.read_dataset("RWFromCanada")?;

    assert_eq!(first, second);
    assert_eq!(store.list()?, vec!["RWFromCanada".to_string()]);

    Ok(())
}

#[test]
fn test_empty_and_missing_groups_are_still_created() -> Result<()> {
    let dir = TempDir::new()?;
    let (countries_path, players_path) = write_inputs(
        dir.path(),
        &[player_feature("Only Centre", "C", "6'0\"", 180, -79.4, 43.7)],
    )?;
    let (countries, players) = load(&countries_path, &players_path)?;

    let mut store = MemoryWorkspace::new();
    let report = GroupAndConvertPipeline::new(settings(&["Canada", "Atlantis"], &["C", "LW"]))
        .run(&mut store, &countries, &players, None)
        .into_result()?;

    assert_eq!(report.countries[1].polygon_match, CountryMatch::Missing);
    assert_eq!(store.read_dataset("CFromCanada")?.len(), 1);
    assert!(store.read_dataset("LWFromCanada")?.is_empty());
    assert!(store.read_dataset("CFromAtlantis")?.is_empty());
    assert!(store.read_dataset("LWFromAtlantis")?.is_empty());
    assert!(store.read_dataset("LWFromAtlantis")?.has_field("weight_kg"));

    Ok(())
}

/// Point shapefile roster with a narrow integer-valued weight column.
fn write_shapefile_roster(
    dir: &Path,
    players: &[(&str, &str, &str, f64, f64, f64)],
) -> Result<PathBuf> {
    let records = players
        .iter()
        .map(|(name, position, height, weight, lon, lat)| {
            let mut attributes = HashMap::new();
            attributes.insert("name".to_string(), FieldValue::Character(Some(name.to_string())));
            attributes.insert(
                "position".to_string(),
                FieldValue::Character(Some(position.to_string())),
            );
            attributes.insert(
                "height".to_string(),
                FieldValue::Character(Some(height.to_string())),
            );
            attributes.insert("weight".to_string(), FieldValue::Numeric(Some(*weight)));
            PlayerRecord::new(Point::new(*lon, *lat), attributes)
        })
        .collect();
    let roster = Dataset::new(
        "nhlrosters",
        vec![
            FieldDef::character("name", 24),
            FieldDef::character("position", 2),
            FieldDef::character("height", 8),
            FieldDef::numeric("weight", 3, 0),
        ],
        records,
    );

    let mut input = DirectoryWorkspace::open(&dir.join("input"))?;
    input.write_dataset(&roster)?;
    Ok(input.dataset_path("nhlrosters"))
}

#[test]
fn test_shapefile_outputs_keep_input_schema_plus_metric_fields() -> Result<()> {
    let dir = TempDir::new()?;
    let (countries_path, _) = write_inputs(dir.path(), &[])?;
    let players_path = write_shapefile_roster(
        dir.path(),
        &[("Only Centre", "C", "6'0\"", 180.0, -79.4, 43.7)],
    )?;
    let (countries, players) = load(&countries_path, &players_path)?;
    assert_eq!(
        players.field("weight").cloned(),
        Some(FieldDef::numeric("weight", 3, 0))
    );

    let mut store = DirectoryWorkspace::open(&dir.path().join("output"))?;
    GroupAndConvertPipeline::new(settings(&["Canada"], &["C", "G"]))
        .run(&mut store, &countries, &players, None)
        .into_result()?;

    let mut expected = players.schema.clone();
    expected.push(FieldDef::float("height_cm", 13, 1));
    expected.push(FieldDef::float("weight_kg", 13, 1));

    let centres = store.read_dataset("CFromCanada")?;
    assert_eq!(centres.schema, expected);
    assert_eq!(centres.len(), 1);
    assert!((float(&centres, 0, "height_cm") - 182.9).abs() < 1e-3);
    assert!((float(&centres, 0, "weight_kg") - 81.6).abs() < 1e-3);

    // no goalie lives in Canada, the group is still persisted with the full schema
    assert!(store.exists("GFromCanada"));
    let goalies = store.read_dataset("GFromCanada")?;
    assert!(goalies.is_empty());
    assert_eq!(goalies.schema, expected);

    Ok(())
}

#[test]
fn test_unknown_country_fails_under_error_policy() -> Result<()> {
    let dir = TempDir::new()?;
    let (countries_path, players_path) = write_inputs(
        dir.path(),
        &[player_feature("Only Centre", "C", "6'0\"", 180, -79.4, 43.7)],
    )?;
    let (countries, players) = load(&countries_path, &players_path)?;

    let mut config = settings(&["Atlantis"], &["C"]);
    config.missing_country = MissingCountryPolicy::Error;

    let mut store = MemoryWorkspace::new();
    let err = GroupAndConvertPipeline::new(config)
        .run(&mut store, &countries, &players, None)
        .into_result()
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::SpatialFilter));
    assert!(matches!(err.root(), ProcessingError::UnknownCountry { .. }));
    assert!(store.list()?.is_empty());

    Ok(())
}

#[test]
fn test_malformed_height_aborts_with_location() -> Result<()> {
    let dir = TempDir::new()?;
    let (countries_path, players_path) = write_inputs(
        dir.path(),
        &[
            player_feature("Fine", "D", "6'1\"", 200, -79.4, 43.7),
            player_feature("Broken", "D", "185cm", 200, -75.7, 45.4),
        ],
    )?;
    let (countries, players) = load(&countries_path, &players_path)?;

    let mut store = DirectoryWorkspace::open(&dir.path().join("output"))?;
    let report = GroupAndConvertPipeline::new(settings(&["Canada"], &["D"]))
        .run(&mut store, &countries, &players, None);

    assert!(!report.is_success());
    assert!(report.generate_summary().contains("DFromCanada"));

    let err = report.into_result().unwrap_err();
    assert_eq!(err.stage(), Some(Stage::FieldDerivation));
    let location = err.location().cloned().unwrap_or_default();
    assert_eq!(location.country, "Canada");
    assert_eq!(location.position.as_deref(), Some("D"));
    assert_eq!(location.record, Some(1));
    assert!(matches!(err.root(), ProcessingError::HeightParse { .. }));

    // the partitioned dataset stays, with its derived fields still null
    let output = store.read_dataset("DFromCanada")?;
    assert_eq!(output.len(), 2);
    assert!(!store.is_locked("DFromCanada"));
    assert!(!dir.path().join("output").join("DFromCanada.lock").exists());

    Ok(())
}

#[test]
fn test_csv_players_through_config_file() -> Result<()> {
    let dir = TempDir::new()?;
    let (countries_path, _) = write_inputs(dir.path(), &[])?;

    let players_path = dir.path().join("players.csv");
    fs::write(
        &players_path,
        "name,position,height,weight,lon,lat\n\
         Centre,C,\"6'0\"\"\",180,-79.4,43.7\n\
         Winger,RW,\"6'2\"\"\",200,-79.5,43.8\n",
    )?;

    let config_path = dir.path().join("roster.toml");
    fs::write(
        &config_path,
        format!(
            r#"
countries = ["Canada"]
positions = ["C", "RW"]

[input]
countries_path = "{}"
players_path = "{}"

[fields]
longitude = "lon"
latitude = "lat"
"#,
            countries_path.display(),
            players_path.display()
        ),
    )?;

    let overrides = ConfigOverrides {
        workspace: Some(dir.path().join("output")),
        ..Default::default()
    };
    let config = PipelineConfig::load_with_overrides(Some(&config_path), &overrides)?;

    let countries = CountryReader::with_name_field(&config.fields.country)
        .read_countries(&config.input.countries_path)?;
    let players = PlayerReader::new()
        .with_coordinate_columns(&config.fields.longitude, &config.fields.latitude)
        .read_players(&config.input.players_path)?;
    assert_eq!(players.len(), 2);

    let mut store = DirectoryWorkspace::open(&config.output.workspace)?;
    GroupAndConvertPipeline::new(config)
        .run(&mut store, &countries, &players, None)
        .into_result()?;

    let wingers = store.read_dataset("RWFromCanada")?;
    assert_eq!(wingers.len(), 1);
    assert!((float(&wingers, 0, "height_cm") - 188.0).abs() < 1e-3);
    assert!((float(&wingers, 0, "weight_kg") - 90.7).abs() < 1e-3);

    Ok(())
}
