use crate::analyze::Analyzer;
use crate::config::Settings;
use crate::fetch::{AirQualityApi, Fetcher, RawWriter};
use crate::load::{BatchLoader, SinkClient};
use crate::models::LoadStatus;
use crate::pipeline::{StageReport, StageSet};
use crate::transform::Transformer;
use crate::utils::constants::STAGED_PREFIX;
use crate::utils::latest_matching;

/// Production stage set: wires the fetcher, transformer, loader and
/// analyzer to the configured directories and injected clients.
pub struct EtlStages<C, S> {
    settings: Settings,
    api: C,
    sink: S,
    fetcher: Fetcher,
    loader: BatchLoader,
}

impl<C, S> EtlStages<C, S>
where
    C: AirQualityApi + Send + Sync,
    S: SinkClient + Send + Sync,
{
    pub fn new(settings: Settings, api: C, sink: S) -> Self {
        Self {
            settings,
            api,
            sink,
            fetcher: Fetcher::new(),
            loader: BatchLoader::new(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_loader(mut self, loader: BatchLoader) -> Self {
        self.loader = loader;
        self
    }
}

impl<C, S> StageSet for EtlStages<C, S>
where
    C: AirQualityApi + Send + Sync,
    S: SinkClient + Send + Sync,
{
    async fn extract(&mut self) -> StageReport {
        let writer = match RawWriter::new(&self.settings.raw_dir) {
            Ok(writer) => writer,
            Err(e) => return StageReport::failed(e.to_string()),
        };

        let total = self.settings.cities.len();
        let saved = self
            .fetcher
            .extract_cities(&self.api, &self.settings.cities, &writer)
            .await;

        let diagnostics = format!("Extract complete: captured {}/{} cities", saved.len(), total);
        if saved.is_empty() {
            StageReport::failed(format!("{}; nothing to stage", diagnostics))
        } else if saved.len() < total {
            StageReport::partial(diagnostics)
        } else {
            StageReport::success(diagnostics)
        }
    }

    async fn transform(&mut self) -> StageReport {
        let transformer =
            match Transformer::new(&self.settings.raw_dir, &self.settings.staged_dir) {
                Ok(transformer) => transformer,
                Err(e) => return StageReport::failed(e.to_string()),
            };

        match transformer.transform_latest(&self.settings.cities) {
            Ok(path) => {
                StageReport::success(format!("Transform complete: staged {}", path.display()))
            }
            Err(e) => StageReport::failed(e.to_string()),
        }
    }

    async fn load(&mut self) -> StageReport {
        let staged =
            match latest_matching(&self.settings.staged_dir, STAGED_PREFIX, ".csv") {
                Ok(Some(path)) => path,
                Ok(None) => {
                    return StageReport::failed(format!(
                        "no staged dataset found in {}; run transform first",
                        self.settings.staged_dir.display()
                    ))
                }
                Err(e) => return StageReport::failed(e.to_string()),
            };

        match self.loader.load(&self.sink, &staged).await {
            Ok(outcome) => match outcome.status() {
                LoadStatus::Full => StageReport::success(outcome.summary()),
                LoadStatus::Partial => StageReport::partial(outcome.summary()),
                LoadStatus::Nothing => StageReport::failed(outcome.summary()),
            },
            Err(e) => StageReport::failed(e.to_string()),
        }
    }

    async fn analyze(&mut self) -> StageReport {
        let analyzer = match Analyzer::new(&self.settings.processed_dir) {
            Ok(analyzer) => analyzer,
            Err(e) => return StageReport::failed(e.to_string()),
        };

        match analyzer.analyze(&self.sink).await {
            Ok(kpis) => StageReport::success(format!("Analysis complete: {}", kpis.summary())),
            Err(e) => StageReport::failed(e.to_string()),
        }
    }
}
