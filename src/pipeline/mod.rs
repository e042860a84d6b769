pub mod stages;

pub use stages::EtlStages;

/// Pipeline state machine. Transitions are linear; any stage failure
/// moves straight to `Failed` and the remaining stages never run, since
/// downstream stages assume upstream artifacts exist and are
/// well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
    Analyze,
    Done,
    Failed,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::Extract => Stage::Transform,
            Stage::Transform => Stage::Load,
            Stage::Load => Stage::Analyze,
            Stage::Analyze => Stage::Done,
            Stage::Done => Stage::Done,
            Stage::Failed => Stage::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
            Stage::Analyze => "analyze",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Success,
    /// The stage completed with losses (for example a partially loaded
    /// dataset); the pipeline continues so analysis runs on whatever
    /// made it through.
    Partial,
    Failed,
}

/// What a stage hands back to the orchestrator: a status plus its
/// diagnostic text, surfaced verbatim to the operator. The orchestrator
/// never sees per-item errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub status: StageStatus,
    pub diagnostics: String,
}

impl StageReport {
    pub fn success(diagnostics: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Success,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn partial(diagnostics: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Partial,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn failed(diagnostics: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Failed,
            diagnostics: diagnostics.into(),
        }
    }
}

/// The four pipeline stages, injectable so each can be exercised in
/// isolation without touching the network or filesystem.
pub trait StageSet {
    fn extract(&mut self) -> impl std::future::Future<Output = StageReport> + Send;
    fn transform(&mut self) -> impl std::future::Future<Output = StageReport> + Send;
    fn load(&mut self) -> impl std::future::Future<Output = StageReport> + Send;
    fn analyze(&mut self) -> impl std::future::Future<Output = StageReport> + Send;
}

/// Record of one pipeline run: the terminal state and each executed
/// stage's report, in order.
#[derive(Debug)]
pub struct PipelineRun {
    pub final_stage: Stage,
    pub reports: Vec<(Stage, StageReport)>,
}

impl PipelineRun {
    pub fn succeeded(&self) -> bool {
        self.final_stage == Stage::Done
    }
}

/// Drive the state machine over the given stage set, one stage at a
/// time, halting at the first failure.
pub async fn run_pipeline<S: StageSet>(stages: &mut S) -> PipelineRun {
    let mut stage = Stage::Extract;
    let mut reports = Vec::new();

    loop {
        let report = match stage {
            Stage::Extract => stages.extract().await,
            Stage::Transform => stages.transform().await,
            Stage::Load => stages.load().await,
            Stage::Analyze => stages.analyze().await,
            Stage::Done | Stage::Failed => break,
        };

        tracing::info!(stage = stage.as_str(), status = ?report.status, "stage finished");
        if !report.diagnostics.is_empty() {
            println!("{}", report.diagnostics);
        }

        let failed = report.status == StageStatus::Failed;
        reports.push((stage, report));
        stage = if failed { Stage::Failed } else { stage.next() };
    }

    PipelineRun {
        final_stage: stage,
        reports,
    }
}
