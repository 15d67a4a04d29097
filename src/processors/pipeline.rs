use crate::error::{FailureLocation, ProcessingError, Result, Stage};
use crate::models::{CountryPolygon, Dataset};
use crate::processors::{
    CountryMatch, CountrySummary, FieldDeriver, GroupSummary, Partitioner, RunReport,
    SpatialFilter,
};
use crate::settings::PipelineConfig;
use crate::utils::ProgressReporter;
use crate::workspace::FeatureStore;
use tracing::{debug, error, info};

/// Splits the player dataset into one output per (position, country) and
/// adds metric height and weight to every output record.
pub struct GroupAndConvertPipeline {
    config: PipelineConfig,
    partitioner: Partitioner,
    deriver: FieldDeriver,
}

impl GroupAndConvertPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let partitioner = Partitioner::with_position_field(&config.fields.position);
        let deriver = FieldDeriver::with_fields(&config.fields.height, &config.fields.weight);
        Self {
            config,
            partitioner,
            deriver,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of output datasets a complete run produces.
    pub fn group_count(&self) -> usize {
        self.config.countries.len() * self.config.positions.len()
    }

    /// Run every country in order. The first error stops the run; datasets
    /// written before it stay in the store.
    pub fn run<S: FeatureStore + ?Sized>(
        &self,
        store: &mut S,
        countries: &[CountryPolygon],
        players: &Dataset,
        progress: Option<&ProgressReporter>,
    ) -> RunReport {
        let mut report = RunReport::new(false);
        let filter = SpatialFilter::new(countries).with_missing_country(self.config.missing_country);

        info!(
            "Splitting {} players across {} countries and {} positions",
            players.len(),
            self.config.countries.len(),
            self.config.positions.len()
        );

        let mut failure = None;
        for country in &self.config.countries {
            let mut summary = CountrySummary {
                country: country.clone(),
                polygon_match: CountryMatch::Missing,
                contained_players: 0,
                groups: Vec::new(),
            };
            let outcome =
                self.process_country(store, &filter, country, players, &mut summary, progress);
            report.countries.push(summary);

            if let Err(e) = outcome {
                error!("Run stopped: {}", e);
                failure = Some(e);
                break;
            }
        }

        report.finish(failure);
        if report.is_success() {
            info!(
                "Produced {} datasets with {} records",
                report.dataset_names().len(),
                report.total_records()
            );
        }
        report
    }

    fn process_country<S: FeatureStore + ?Sized>(
        &self,
        store: &mut S,
        filter: &SpatialFilter<'_>,
        country: &str,
        players: &Dataset,
        summary: &mut CountrySummary,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        let location = FailureLocation::country(country);
        info!("Processing {}", country);

        let staged = filter
            .stage(country, players)
            .map_err(|e| e.at(Stage::SpatialFilter, location.clone()))?;
        summary.polygon_match = staged.polygon_match;
        summary.contained_players = staged.len();
        info!(
            "{}: {}, {} players inside",
            country,
            staged.polygon_match,
            staged.len()
        );

        let derived_fields = FieldDeriver::derived_fields();
        for position in &self.config.positions {
            let group = self.partitioner.partition(&staged, position);
            let group_location = location
                .clone()
                .with_position(position)
                .with_dataset(&group.name);
            let partition_error =
                |e: ProcessingError| e.at(Stage::Partition, group_location.clone());

            store
                .copy_features(&group, self.config.output.overwrite)
                .map_err(partition_error)?;
            store
                .add_fields(&group.name, &derived_fields)
                .map_err(partition_error)?;

            let records = group.len();
            debug!("Wrote {} with {} records", group.name, records);
            summary.groups.push(GroupSummary {
                position: position.clone(),
                dataset: group.name,
                records,
                derived: false,
            });
        }

        drop(staged);
        debug!("Released staging selection for {}", country);

        for group in &mut summary.groups {
            if let Some(progress) = progress {
                progress.set_message(&format!("Deriving fields for {}", group.dataset));
            }
            let group_location = location.clone().with_position(&group.position);
            group.records = self
                .deriver
                .populate(store, &group.dataset, &group_location)?;
            group.derived = true;
            info!("{}: {} records", group.dataset, group.records);

            if let Some(progress) = progress {
                progress.increment(1);
            }
        }

        Ok(())
    }
}
