//! The two passes of a run and the per-unit classify session.
//!
//! ```text
//! ScanPass::candidate*  --finish-->  ClassifyPass --begin_unit--> UnitSession::occurrence* --end
//! ```
//!
//! The scan pass is driven sequentially so tie-breaks follow corpus order. A
//! [`ClassifyPass`] is cheap to clone; each clone can drive units concurrently.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::error::{PipelineError, PipelineResult};
use super::types::{
    ModelBackends, OccurrenceDecision, OccurrenceFailure, PipelineSettings, UnitSummary,
};
use crate::classifier::{
    CascadeClassifier, ClassifyError, ClassifyResult, EmbeddingTier, GenerativeTier,
};
use crate::corpus::CorpusUnit;
use crate::embedding::EmbeddingService;
use crate::perf::{Tier, UnitPerformance};
use crate::ranking::{TopK, TopKAccumulator};
use crate::report::{CodeSearchRow, FailureRow, ReportSink, SuggestedPatternRow, TopKRow};

/// First pass: score every distinct candidate of the corpus.
pub struct ScanPass {
    query: Arc<str>,
    accumulator: TopKAccumulator,
    classifier: Arc<CascadeClassifier>,
    sink: Arc<dyn ReportSink>,
}

impl ScanPass {
    /// Builds fresh per-run caches around the shared backends.
    pub fn new(
        settings: &PipelineSettings,
        backends: &ModelBackends,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        let embeddings = Arc::new(EmbeddingService::new(
            Arc::clone(&backends.embedding),
            settings.cache_capacity,
        ));
        let embedding_tier = EmbeddingTier::from_rule(
            &settings.rule,
            Arc::clone(&embeddings),
            Arc::clone(&backends.relatedness),
            settings.cache_capacity,
        );
        let generative_tier = GenerativeTier::new(
            Arc::clone(&backends.generative),
            settings.yes_threshold,
            settings.cache_capacity,
        )
        .with_params(settings.sampling);

        Self {
            query: Arc::from(settings.query.as_str()),
            accumulator: TopKAccumulator::new(settings.query.as_str(), settings.top_k, embeddings),
            classifier: Arc::new(CascadeClassifier::new(embedding_tier, generative_tier)),
            sink,
        }
    }

    /// Offers one candidate. Returns `true` if it was new and got scored.
    pub async fn candidate(&mut self, signature: &str, pattern: &str) -> PipelineResult<bool> {
        Ok(self.accumulator.add(signature, pattern).await?)
    }

    /// Offers every candidate of `unit`, in order. Returns how many were new.
    #[instrument(skip(self, unit), fields(source = %unit.source))]
    pub async fn scan_unit(&mut self, unit: &CorpusUnit) -> PipelineResult<usize> {
        let mut added = 0;
        for candidate in unit.rendered_candidates() {
            if self.candidate(&candidate.signature, &candidate.pattern).await? {
                added += 1;
            }
        }
        debug!(added, "Scanned unit");
        Ok(added)
    }

    /// Freezes the Top-K and reports it. Consumes the pass, so the rows are written once.
    pub fn finish(mut self) -> ClassifyPass {
        let top_k = self.accumulator.populate_top_k();
        for entry in top_k.entries() {
            self.sink.top_k(TopKRow {
                pattern: entry.candidate.pattern.clone(),
                signature: entry.candidate.signature.clone(),
                distance: entry.distance,
                query: self.query.to_string(),
            });
        }

        ClassifyPass {
            query: self.query,
            top_k,
            classifier: self.classifier,
            sink: self.sink,
        }
    }
}

impl std::fmt::Debug for ScanPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanPass")
            .field("accumulator", &self.accumulator)
            .finish()
    }
}

#[derive(Clone)]
/// Second pass: classify occurrences that fall under a Top-K pattern.
pub struct ClassifyPass {
    query: Arc<str>,
    top_k: Arc<TopK>,
    classifier: Arc<CascadeClassifier>,
    sink: Arc<dyn ReportSink>,
}

impl ClassifyPass {
    pub fn top_k(&self) -> &Arc<TopK> {
        &self.top_k
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn begin_unit(&self, source: impl Into<String>) -> UnitSession {
        UnitSession {
            pass: self.clone(),
            source: source.into(),
            perf: UnitPerformance::new(),
            summary: UnitSummary::default(),
        }
    }
}

impl std::fmt::Debug for ClassifyPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifyPass")
            .field("top_k", &self.top_k.len())
            .finish()
    }
}

/// Classification of one corpus unit. Occurrences are processed one at a time.
pub struct UnitSession {
    pass: ClassifyPass,
    source: String,
    perf: UnitPerformance,
    summary: UnitSummary,
}

impl UnitSession {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Classifies one occurrence reported under `pattern`.
    ///
    /// Returns `Ok(None)` when the pattern is not in the Top-K. Every classified
    /// occurrence yields a code-search row, matches also a suggested-pattern row.
    pub async fn occurrence(
        &mut self,
        text: &str,
        pattern: &str,
    ) -> ClassifyResult<Option<OccurrenceDecision>> {
        let Some(matched) = self.pass.top_k.matching(pattern) else {
            self.summary.skipped += 1;
            return Ok(None);
        };
        let matched = matched.to_string();

        let classification = self.pass.classifier.classify(&self.pass.query, text).await?;

        self.perf
            .record(Tier::Embedding, classification.embedding_latency);
        if let Some(latency) = classification.generative_latency {
            self.perf.record(Tier::Generative, latency);
        }

        let sink = &self.pass.sink;
        sink.code_search(CodeSearchRow {
            source: self.source.clone(),
            occurrence: text.to_string(),
            query: self.pass.query.to_string(),
            embedding_verdict: classification.embedding_verdict,
            escalated: classification.escalated,
            generative_verdict: classification.generative_verdict,
            decision: classification.decision,
        });
        if classification.decision.is_match() {
            sink.suggested_pattern(SuggestedPatternRow {
                occurrence: text.to_string(),
                pattern: matched.clone(),
            });
        }

        self.summary.classified += 1;
        Ok(Some(OccurrenceDecision {
            source: self.source.clone(),
            occurrence: text.to_string(),
            pattern: matched,
            classification,
        }))
    }

    /// Reports a classification error that does not abort the run.
    pub fn record_failure(&mut self, text: &str, error: &ClassifyError) -> OccurrenceFailure {
        self.summary.failed += 1;
        self.pass.sink.failure(FailureRow {
            source: self.source.clone(),
            occurrence: text.to_string(),
            error: error.to_string(),
        });
        OccurrenceFailure {
            source: self.source.clone(),
            occurrence: text.to_string(),
            error: error.to_string(),
        }
    }

    /// Closes the unit and writes one performance row per tier that was used.
    pub fn end(mut self) -> UnitSummary {
        for row in self.perf.rows(&self.source) {
            self.pass.sink.performance(row);
        }
        self.summary.source = std::mem::take(&mut self.source);
        info!(
            source = %self.summary.source,
            classified = self.summary.classified,
            skipped = self.summary.skipped,
            failed = self.summary.failed,
            "Unit classified"
        );
        self.summary
    }
}

impl std::fmt::Debug for UnitSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitSession")
            .field("source", &self.source)
            .field("summary", &self.summary)
            .finish()
    }
}

pub(crate) struct UnitOutcome {
    pub decisions: Vec<OccurrenceDecision>,
    pub failures: Vec<OccurrenceFailure>,
    pub summary: UnitSummary,
}

/// Classifies every occurrence of `unit`, aborting only when a service is gone.
pub(crate) async fn classify_unit(pass: ClassifyPass, unit: &CorpusUnit) -> PipelineResult<UnitOutcome> {
    let mut session = pass.begin_unit(unit.source.as_str());
    let mut decisions = Vec::new();
    let mut failures = Vec::new();

    for occurrence in &unit.occurrences {
        match session.occurrence(&occurrence.text, &occurrence.pattern).await {
            Ok(Some(decision)) => decisions.push(decision),
            Ok(None) => {}
            Err(err) if err.is_service_unavailable() => {
                session.end();
                return Err(PipelineError::from(err));
            }
            Err(err) => {
                warn!(
                    source = %unit.source,
                    occurrence = %occurrence.text,
                    error = %err,
                    "Occurrence classification failed"
                );
                failures.push(session.record_failure(&occurrence.text, &err));
            }
        }
    }

    Ok(UnitOutcome {
        decisions,
        failures,
        summary: session.end(),
    })
}
