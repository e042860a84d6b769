use reqwest::Client;

use crate::analyze::Analyzer;
use crate::cli::args::{Cli, Commands};
use crate::config::{Settings, SinkCredentials};
use crate::error::{PipelineError, Result};
use crate::fetch::{Fetcher, OpenMeteoClient, RawWriter};
use crate::load::{BatchLoader, SupabaseSink};
use crate::pipeline::{run_pipeline, EtlStages};
use crate::transform::Transformer;
use crate::utils::constants::{REQUEST_TIMEOUT, STAGED_PREFIX};
use crate::utils::latest_matching;
use crate::utils::progress::ProgressReporter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    let settings = Settings::new(&cli.data_dir)?;
    let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

    match cli.command {
        Commands::Run {
            max_attempts,
            batch_size,
        } => {
            println!("Starting full ETL + analysis pipeline...");

            // Credentials are a startup precondition for the load and
            // analyze stages; missing values fail before any fetch.
            let credentials = SinkCredentials::from_env()?;
            let api = OpenMeteoClient::new(http.clone());
            let sink = SupabaseSink::new(http, &credentials);

            let mut stages = EtlStages::new(settings, api, sink)
                .with_fetcher(Fetcher::new().with_max_attempts(max_attempts))
                .with_loader(BatchLoader::new().with_batch_size(batch_size));

            let run = run_pipeline(&mut stages).await;

            if run.succeeded() {
                println!("Pipeline finished successfully.");
                Ok(())
            } else {
                let (stage, message) = run
                    .reports
                    .last()
                    .map(|(s, r)| (s.as_str().to_string(), r.diagnostics.clone()))
                    .unwrap_or_else(|| ("pipeline".to_string(), "no stages executed".to_string()));
                Err(PipelineError::StageFailed { stage, message })
            }
        }

        Commands::Extract { max_attempts } => {
            println!("Fetching air quality data for {} cities...", settings.cities.len());
            let progress = ProgressReporter::new_spinner("Fetching cities...", false);

            let api = OpenMeteoClient::new(http);
            let writer = RawWriter::new(&settings.raw_dir)?;
            let fetcher = Fetcher::new().with_max_attempts(max_attempts);

            let saved = fetcher
                .extract_cities(&api, &settings.cities, &writer)
                .await;
            progress.finish_with_message(&format!(
                "Captured {}/{} cities",
                saved.len(),
                settings.cities.len()
            ));

            for path in &saved {
                println!("  {}", path.display());
            }

            if saved.is_empty() {
                return Err(PipelineError::MissingInput(
                    "no data saved; check the log for per-city errors".to_string(),
                ));
            }
            Ok(())
        }

        Commands::Transform => {
            println!("Staging latest raw artifacts...");
            let transformer = Transformer::new(&settings.raw_dir, &settings.staged_dir)?;
            let staged = transformer.transform_latest(&settings.cities)?;
            println!("Staged dataset written to {}", staged.display());
            Ok(())
        }

        Commands::Load { batch_size } => {
            let credentials = SinkCredentials::from_env()?;
            let sink = SupabaseSink::new(http, &credentials);

            let staged = latest_matching(&settings.staged_dir, STAGED_PREFIX, ".csv")?
                .ok_or_else(|| {
                    PipelineError::MissingInput(format!(
                        "no staged dataset found in {}; run transform first",
                        settings.staged_dir.display()
                    ))
                })?;

            println!("Loading {} into the sink table...", staged.display());
            let progress = ProgressReporter::new_spinner("Inserting batches...", false);

            let loader = BatchLoader::new().with_batch_size(batch_size);
            let outcome = loader.load(&sink, &staged).await?;

            progress.finish_with_message(&outcome.summary());
            println!("{}", outcome.summary());
            Ok(())
        }

        Commands::Analyze => {
            let credentials = SinkCredentials::from_env()?;
            let sink = SupabaseSink::new(http, &credentials);

            println!("Computing KPI metrics...");
            let analyzer = Analyzer::new(&settings.processed_dir)?;
            let kpis = analyzer.analyze(&sink).await?;

            println!("{}", kpis.summary());
            println!("CSV outputs written to {}", settings.processed_dir.display());
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
