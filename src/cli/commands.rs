use crate::cli::args::{Cli, Commands};
use crate::error::{ProcessingError, Result};
use crate::processors::{FieldDeriver, GroupAndConvertPipeline};
use crate::readers::{CountryReader, PlayerReader};
use crate::settings::{ConfigOverrides, PipelineConfig};
use crate::utils::progress::ProgressReporter;
use crate::workspace::{DirectoryWorkspace, FeatureStore, MemoryWorkspace};
use std::collections::BTreeMap;
use std::path::Path;

pub fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;

    match cli.command {
        Commands::Run {
            config,
            countries_file,
            players_file,
            workspace,
            countries,
            positions,
            no_overwrite,
            dry_run,
            report,
        } => {
            let overrides = ConfigOverrides {
                countries_path: countries_file,
                players_path: players_file,
                workspace,
                countries,
                positions,
                no_overwrite,
            };
            let settings = PipelineConfig::load_with_overrides(config.as_deref(), &overrides)?;
            run_pipeline(settings, dry_run, report.as_deref(), quiet)
        }

        Commands::Validate {
            config,
            players_file,
            limit,
        } => {
            let overrides = ConfigOverrides {
                players_path: players_file,
                ..Default::default()
            };
            let settings = PipelineConfig::load_with_overrides(config.as_deref(), &overrides)?;
            validate_players(&settings, limit, quiet)
        }

        Commands::Info {
            config,
            workspace,
            dataset,
            sample,
        } => {
            let overrides = ConfigOverrides {
                workspace,
                ..Default::default()
            };
            let settings = PipelineConfig::load_with_overrides(config.as_deref(), &overrides)?;
            show_dataset(&settings.output.workspace, dataset.as_deref(), sample)
        }

        Commands::Countries {
            config,
            countries_file,
        } => {
            let overrides = ConfigOverrides {
                countries_path: countries_file,
                ..Default::default()
            };
            let settings = PipelineConfig::load_with_overrides(config.as_deref(), &overrides)?;
            list_countries(&settings)
        }
    }
}

fn run_pipeline(
    settings: PipelineConfig,
    dry_run: bool,
    report_path: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    println!("Splitting rosters...");
    println!("Countries: {}", settings.countries.join(", "));
    println!("Positions: {}", settings.positions.join(", "));
    if dry_run {
        println!("Dry run: results are kept in memory only");
    } else {
        println!("Workspace: {}", settings.output.workspace.display());
    }

    let loading = ProgressReporter::new_spinner("Loading input datasets...", quiet);
    let countries = CountryReader::with_name_field(&settings.fields.country)
        .read_countries(&settings.input.countries_path)?;
    let players = PlayerReader::new()
        .with_coordinate_columns(&settings.fields.longitude, &settings.fields.latitude)
        .read_players(&settings.input.players_path)?;
    loading.finish_with_message(&format!(
        "Loaded {} polygons and {} players",
        countries.len(),
        players.len()
    ));

    let pipeline = GroupAndConvertPipeline::new(settings);
    let progress = ProgressReporter::new(
        pipeline.group_count() as u64,
        "Deriving metric fields...",
        quiet,
    );

    let mut report = if dry_run {
        let mut store = MemoryWorkspace::new();
        pipeline.run(&mut store, &countries, &players, Some(&progress))
    } else {
        let mut store = DirectoryWorkspace::open(&pipeline.config().output.workspace)?;
        pipeline.run(&mut store, &countries, &players, Some(&progress))
    };
    report.dry_run = dry_run;

    if report.is_success() {
        progress.finish_with_message(&format!(
            "Wrote {} datasets",
            report.dataset_names().len()
        ));
    } else {
        progress.abandon();
    }

    println!("\n{}", report.generate_summary());

    if let Some(path) = report_path {
        report.write_json(path)?;
        println!("Report written to {}", path.display());
    }

    report.into_result()?;
    println!("Processing complete!");
    Ok(())
}

fn validate_players(settings: &PipelineConfig, limit: usize, quiet: bool) -> Result<()> {
    println!("Validating {}", settings.input.players_path.display());

    let progress = ProgressReporter::new_spinner("Checking heights and weights...", quiet);
    let players = PlayerReader::new()
        .with_coordinate_columns(&settings.fields.longitude, &settings.fields.latitude)
        .read_players(&settings.input.players_path)?;
    let problems = FieldDeriver::with_fields(&settings.fields.height, &settings.fields.weight)
        .check(&players);
    progress.finish_with_message(&format!("Checked {} players", players.len()));

    if problems.is_empty() {
        println!("✅ All {} players have convertible height and weight", players.len());
        return Ok(());
    }

    println!("\nProblems (showing up to {}):", limit);
    for (index, problem) in problems.iter().take(limit) {
        println!("  record {}: {}", index, problem);
    }

    Err(ProcessingError::InvalidFormat(format!(
        "{} of {} players have an unconvertible height or weight",
        problems.len(),
        players.len()
    )))
}

fn show_dataset(workspace: &Path, dataset: Option<&str>, sample: usize) -> Result<()> {
    let store = DirectoryWorkspace::open(workspace)?;

    let Some(name) = dataset else {
        let names = store.list()?;
        println!("{} datasets in {}", names.len(), workspace.display());
        for name in names {
            println!("  {}", name);
        }
        return Ok(());
    };

    let dataset = store.read_dataset(name)?;
    println!("Dataset: {}", store.dataset_path(name).display());
    println!("Records: {}", dataset.len());

    println!("\nFields:");
    for field in &dataset.schema {
        println!(
            "  {:<12} {:?}({}, {})",
            field.name, field.kind, field.length, field.decimals
        );
    }

    if sample > 0 && !dataset.is_empty() {
        println!("\nSample Records (showing {} records):", sample.min(dataset.len()));
        for (i, record) in dataset.records.iter().take(sample).enumerate() {
            let values: Vec<String> = dataset
                .schema
                .iter()
                .map(|f| match record.get(&f.name) {
                    Some(value) => format!("{}={}", f.name, value),
                    None => format!("{}=<null>", f.name),
                })
                .collect();
            println!(
                "{}. ({:.4}, {:.4}) {}",
                i + 1,
                record.location.x(),
                record.location.y(),
                values.join(", ")
            );
        }
    }

    Ok(())
}

fn list_countries(settings: &PipelineConfig) -> Result<()> {
    let countries = CountryReader::with_name_field(&settings.fields.country)
        .read_countries(&settings.input.countries_path)?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for country in &countries {
        *counts.entry(country.name.as_str()).or_default() += 1;
    }

    println!(
        "{} country names in {}",
        counts.len(),
        settings.input.countries_path.display()
    );
    for (name, polygons) in counts {
        if polygons > 1 {
            println!("  {} ({} polygons)", name, polygons);
        } else {
            println!("  {}", name);
        }
    }

    Ok(())
}
