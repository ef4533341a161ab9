use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    queries_total: AtomicU64,
    direct_total: AtomicU64,
    escalated_policy_total: AtomicU64,
    escalated_low_confidence_total: AtomicU64,
    fallback_total: AtomicU64,
    backend_errors_total: AtomicU64,
    ner_augmented_total: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub direct_total: u64,
    pub escalated_policy_total: u64,
    pub escalated_low_confidence_total: u64,
    pub fallback_total: u64,
    pub backend_errors_total: u64,
    pub ner_augmented_total: u64,
    pub escalation_rate: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_query(&self) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_direct(&self) {
        self.direct_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_escalated_policy(&self) {
        self.escalated_policy_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_escalated_low_confidence(&self) {
        self.escalated_low_confidence_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback(&self) {
        self.fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_backend_error(&self) {
        self.backend_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ner_augmented(&self) {
        self.ner_augmented_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let queries = self.queries_total.load(Ordering::Relaxed);
        let direct = self.direct_total.load(Ordering::Relaxed);

        MetricsSnapshot {
            queries_total: queries,
            direct_total: direct,
            escalated_policy_total: self.escalated_policy_total.load(Ordering::Relaxed),
            escalated_low_confidence_total: self
                .escalated_low_confidence_total
                .load(Ordering::Relaxed),
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            backend_errors_total: self.backend_errors_total.load(Ordering::Relaxed),
            ner_augmented_total: self.ner_augmented_total.load(Ordering::Relaxed),
            escalation_rate: if queries == 0 {
                0.0
            } else {
                queries.saturating_sub(direct) as f64 / queries as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,triage_agents=info,triage_ml=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
