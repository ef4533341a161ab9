use std::sync::Arc;

use crate::catalog::Catalog;
use crate::models::{Classification, Decision, EscalationReason, Intent};

/// Substring every escalated or fallback reply carries. Callers detect
/// escalation by scanning for it, so direct responses must never contain it.
pub const ESCALATION_MARKER: &str = "escalating to a human specialist";

#[derive(Debug, Clone)]
pub struct PolicyEngine {
    catalog: Arc<Catalog>,
}

impl PolicyEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// First matching rule wins:
    /// 1. no intent -> fallback
    /// 2. no response record -> fallback
    /// 3. forced-escalation intent -> escalate (policy), whatever the confidence
    /// 4. confidence below threshold -> escalate (low confidence)
    /// 5. direct response
    pub fn resolve(&self, intent: Option<Intent>, confidence: f32) -> Decision {
        let Some(intent) = intent else {
            return Decision::Fallback { intent: None };
        };

        let Some(response) = self.catalog.response_for(intent) else {
            return Decision::Fallback {
                intent: Some(intent),
            };
        };

        if self.catalog.requires_forced_escalation(intent) {
            return Decision::Escalate {
                intent,
                reason: EscalationReason::Policy,
            };
        }

        if confidence < self.catalog.scoring().low_confidence_threshold {
            return Decision::Escalate {
                intent,
                reason: EscalationReason::LowConfidence,
            };
        }

        Decision::Direct {
            intent,
            response: response.to_string(),
        }
    }

    pub fn resolve_classification(&self, classification: &Classification) -> Decision {
        self.resolve(classification.intent, classification.confidence)
    }
}
