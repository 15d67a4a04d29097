use crate::error::{ProcessingError, Result};
use crate::models::{CountryPolygon, Dataset};
use crate::settings::MissingCountryPolicy;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// How many polygons carried a configured country name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryMatch {
    Missing,
    Single,
    Multiple(usize),
}

impl CountryMatch {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => CountryMatch::Missing,
            1 => CountryMatch::Single,
            n => CountryMatch::Multiple(n),
        }
    }
}

impl fmt::Display for CountryMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryMatch::Missing => f.write_str("no polygon"),
            CountryMatch::Single => f.write_str("1 polygon"),
            CountryMatch::Multiple(n) => write!(f, "{} polygons", n),
        }
    }
}

/// Players contained in one country's polygons. Lives only for the duration
/// of that country's iteration and is never persisted.
#[derive(Debug)]
pub struct StagingSelection {
    pub country: String,
    pub polygon_match: CountryMatch,
    pub players: Dataset,
}

impl StagingSelection {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

pub struct SpatialFilter<'a> {
    countries: &'a [CountryPolygon],
    missing_country: MissingCountryPolicy,
}

impl<'a> SpatialFilter<'a> {
    pub fn new(countries: &'a [CountryPolygon]) -> Self {
        Self {
            countries,
            missing_country: MissingCountryPolicy::default(),
        }
    }

    pub fn with_missing_country(mut self, policy: MissingCountryPolicy) -> Self {
        self.missing_country = policy;
        self
    }

    /// Polygons whose name equals `country` exactly.
    pub fn polygons_for(&self, country: &str) -> Vec<&'a CountryPolygon> {
        self.countries.iter().filter(|c| c.name == country).collect()
    }

    /// Select the players whose point lies strictly inside any polygon named
    /// `country`.
    pub fn stage(&self, country: &str, players: &Dataset) -> Result<StagingSelection> {
        let polygons = self.polygons_for(country);
        let polygon_match = CountryMatch::from_count(polygons.len());

        match polygon_match {
            CountryMatch::Missing => {
                if self.missing_country == MissingCountryPolicy::Error {
                    return Err(ProcessingError::UnknownCountry {
                        country: country.to_string(),
                    });
                }
                warn!(
                    "No polygon named '{}'; its datasets will be empty",
                    country
                );
            }
            CountryMatch::Multiple(n) => {
                warn!("{} polygons named '{}'; using their union", n, country);
            }
            CountryMatch::Single => {}
        }

        let staging_name = format!("{}_staging", country);
        let selected = players.select(&staging_name, |player| {
            polygons.iter().any(|p| p.contains(&player.location))
        });
        debug!(
            "Staged {} of {} players inside {}",
            selected.len(),
            players.len(),
            country
        );

        Ok(StagingSelection {
            country: country.to_string(),
            polygon_match,
            players: selected,
        })
    }
}
