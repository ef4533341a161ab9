mod reply;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use triage_core::{
    Catalog, Decision, EntityExtractor, EscalationReason, IntentClassifier, IntentScore,
    NerCapability, PolicyEngine, TriageReply,
};
use triage_ml::default_capability;
use triage_observability::{AppMetrics, MetricsSnapshot};

pub use reply::{fallback_text, render, render_backend_error};
pub use triage_core::ESCALATION_MARKER;

static DEFAULT_AGENT: OnceCell<Result<SupportAgent, String>> = OnceCell::new();

/// Composes extraction, classification and escalation policy into one reply.
#[derive(Clone)]
pub struct SupportAgent {
    catalog: Arc<Catalog>,
    classifier: IntentClassifier,
    policy_engine: PolicyEngine,
    extractor: EntityExtractor,
    metrics: Arc<AppMetrics>,
}

impl SupportAgent {
    pub fn new(catalog: Arc<Catalog>, capability: NerCapability, metrics: Arc<AppMetrics>) -> Self {
        for intent in catalog.intents_without_response() {
            warn!(intent = %intent, "intent has no response record, queries will fall back");
        }

        Self {
            classifier: IntentClassifier::new(catalog.clone()),
            policy_engine: PolicyEngine::new(catalog.clone()),
            extractor: EntityExtractor::new(&capability),
            catalog,
            metrics,
        }
    }

    /// Builtin catalogue with the process-wide recognizer capability.
    pub fn load_default() -> Result<Self> {
        let catalog = Catalog::builtin().context("failed building builtin intent catalog")?;
        Ok(Self::new(
            Arc::new(catalog),
            default_capability(),
            AppMetrics::shared(),
        ))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ner_enabled(&self) -> bool {
        self.extractor.ner_enabled()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Always returns a non-empty reply; internal failures become an
    /// escalation message with a `Backend error:` line.
    pub fn handle_query(&self, text: &str) -> String {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.resolve_query(text)));

        match outcome {
            Ok(Ok(reply)) => reply.reply_text,
            Ok(Err(err)) => {
                self.metrics.inc_backend_error();
                self.metrics.inc_fallback();
                warn!(error = %format!("{err:#}"), "query failed, escalating");
                render_backend_error(format!("{err:#}"))
            }
            Err(payload) => {
                self.metrics.inc_backend_error();
                self.metrics.inc_fallback();
                let message = panic_message(payload.as_ref());
                warn!(error = %message, "query panicked, escalating");
                render_backend_error(message)
            }
        }
    }

    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub fn resolve_query(&self, text: &str) -> Result<TriageReply> {
        self.metrics.inc_query();

        let entities = self.extractor.extract(text).with_context(|| {
            format!(
                "entity recognizer {} failed",
                self.extractor.recognizer_name()
            )
        })?;
        if self.extractor.ner_enabled() && entities.iter().any(|(kind, _)| kind.is_coarse()) {
            self.metrics.inc_ner_augmented();
        }

        let classification = self.classifier.classify(text);
        let decision = self.policy_engine.resolve_classification(&classification);

        match &decision {
            Decision::Direct { .. } => self.metrics.inc_direct(),
            Decision::Escalate {
                reason: EscalationReason::Policy,
                ..
            } => self.metrics.inc_escalated_policy(),
            Decision::Escalate {
                reason: EscalationReason::LowConfidence,
                ..
            } => self.metrics.inc_escalated_low_confidence(),
            Decision::Fallback { .. } => self.metrics.inc_fallback(),
        }

        let reply_text = render(&decision, &self.catalog);

        info!(
            intent = classification.intent.map(|intent| intent.as_str()).unwrap_or("none"),
            confidence = classification.confidence,
            decision = decision.kind(),
            entities = entities.iter().count(),
            "query handled"
        );

        Ok(TriageReply {
            reply_text,
            intent: classification.intent,
            confidence: classification.confidence,
            decision,
            entities,
            ner_enabled: self.extractor.ner_enabled(),
            handled_at: Utc::now(),
        })
    }

    pub fn explain(&self, text: &str) -> Vec<IntentScore> {
        let scores = self.classifier.score_all(text);
        for score in scores.iter().filter(|score| score.score > 0.0) {
            debug!(intent = %score.intent, hits = score.pattern_hits, score = score.score, "intent score");
        }
        scores
    }
}

/// Entry point for callers that only need text back. The default agent is
/// built on first call and shared for the life of the process.
pub fn handle_query(text: &str) -> String {
    let agent = DEFAULT_AGENT
        .get_or_init(|| SupportAgent::load_default().map_err(|err| format!("{err:#}")));

    match agent {
        Ok(agent) => agent.handle_query(text),
        Err(message) => render_backend_error(message),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "internal panic".to_string()
    }
}
