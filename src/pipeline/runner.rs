use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{info, instrument};

use super::error::PipelineResult;
use super::session::{ScanPass, classify_unit};
use super::types::{ModelBackends, PipelineOutcome, PipelineSettings};
use crate::corpus::CorpusUnit;
use crate::report::ReportSink;

/// Runs the two-pass search of one query over a corpus.
///
/// Backends (and the gateways behind them) are shared across runs; caches and the
/// accumulator are created per run.
pub struct Pipeline {
    settings: PipelineSettings,
    backends: ModelBackends,
    sink: Arc<dyn ReportSink>,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings, backends: ModelBackends, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            settings,
            backends,
            sink,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Starts a run driven by an external walker instead of [`run`](Self::run).
    pub fn start_scan(&self) -> ScanPass {
        ScanPass::new(&self.settings, &self.backends, Arc::clone(&self.sink))
    }

    #[instrument(skip_all, fields(units = units.len(), rule = self.settings.rule.name()))]
    pub async fn run(&self, units: &[CorpusUnit]) -> PipelineResult<PipelineOutcome> {
        let mut scan = self.start_scan();
        for unit in units {
            scan.scan_unit(unit).await?;
        }
        let pass = scan.finish();
        if pass.top_k().is_empty() {
            info!("No candidates found, nothing to classify");
        }

        let mut per_unit: Vec<_> = stream::iter(units.iter().enumerate())
            .map(|(index, unit)| {
                let pass = pass.clone();
                async move { classify_unit(pass, unit).await.map(|r| (index, r)) }
            })
            .buffer_unordered(self.settings.unit_concurrency.max(1))
            .try_collect()
            .await?;
        per_unit.sort_by_key(|(index, _)| *index);

        let mut outcome = PipelineOutcome {
            top_k: Arc::clone(pass.top_k()),
            decisions: Vec::new(),
            failures: Vec::new(),
            units: Vec::with_capacity(per_unit.len()),
        };
        for (_, unit) in per_unit {
            outcome.decisions.extend(unit.decisions);
            outcome.failures.extend(unit.failures);
            outcome.units.push(unit.summary);
        }

        info!(
            top_k = outcome.top_k.len(),
            classified = outcome.decisions.len(),
            matches = outcome.matches().count(),
            escalations = outcome.escalations(),
            failures = outcome.failures.len(),
            "Pipeline finished"
        );
        Ok(outcome)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .finish()
    }
}
