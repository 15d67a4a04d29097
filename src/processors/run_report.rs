use crate::error::{FailureLocation, ProcessingError, Result, Stage};
use crate::processors::CountryMatch;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fs;
use std::path::Path;

/// Outcome of one pipeline run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub countries: Vec<CountrySummary>,
    #[serde(serialize_with = "serialize_failure")]
    pub failure: Option<ProcessingError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountrySummary {
    pub country: String,
    pub polygon_match: CountryMatch,
    pub contained_players: usize,
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub position: String,
    pub dataset: String,
    pub records: usize,
    /// Whether the metric fields were filled in.
    pub derived: bool,
}

#[derive(Serialize)]
struct FailureView<'a> {
    stage: Option<Stage>,
    location: Option<&'a FailureLocation>,
    message: String,
}

fn serialize_failure<S>(
    failure: &Option<ProcessingError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match failure {
        None => serializer.serialize_none(),
        Some(error) => serializer.serialize_some(&FailureView {
            stage: error.stage(),
            location: error.location(),
            message: error.root().to_string(),
        }),
    }
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            countries: Vec::new(),
            failure: None,
        }
    }

    pub fn finish(&mut self, failure: Option<ProcessingError>) {
        self.finished_at = Some(Utc::now());
        self.failure = failure;
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn dataset_names(&self) -> Vec<&str> {
        self.countries
            .iter()
            .flat_map(|c| c.groups.iter().map(|g| g.dataset.as_str()))
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.countries
            .iter()
            .flat_map(|c| &c.groups)
            .map(|g| g.records)
            .sum()
    }

    /// Hand back the run failure, if any, consuming the report.
    pub fn into_result(self) -> Result<Self> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Roster Split Report ===\n");
        if self.dry_run {
            summary.push_str("Mode: dry run (nothing written)\n");
        }
        summary.push_str(&format!("Started: {}\n", self.started_at.to_rfc3339()));
        if let Some(finished) = self.finished_at {
            let elapsed = finished - self.started_at;
            summary.push_str(&format!(
                "Finished: {} ({} ms)\n",
                finished.to_rfc3339(),
                elapsed.num_milliseconds()
            ));
        }
        summary.push_str(&format!(
            "Datasets: {}  Records: {}\n",
            self.dataset_names().len(),
            self.total_records()
        ));

        for country in &self.countries {
            summary.push_str(&format!(
                "\n{}: {}, {} players inside\n",
                country.country, country.polygon_match, country.contained_players
            ));
            for group in &country.groups {
                let marker = if group.derived { "" } else { " (not derived)" };
                summary.push_str(&format!(
                    "  {:<24} {:>6} records{}\n",
                    group.dataset, group.records, marker
                ));
            }
        }

        match &self.failure {
            Some(error) => summary.push_str(&format!("\nFAILED: {}\n", error)),
            None => summary.push_str("\nCompleted successfully\n"),
        }

        summary
    }
}
