use std::fmt::Display;

use triage_core::{Catalog, Decision, EscalationReason, ESCALATION_MARKER};

pub fn fallback_text() -> String {
    format!("I couldn't find a direct answer, so I'm {ESCALATION_MARKER}.")
}

fn escalation_notice(reason: EscalationReason) -> String {
    match reason {
        EscalationReason::Policy => {
            format!("This request needs a specialist, so I'm {ESCALATION_MARKER}.")
        }
        EscalationReason::LowConfidence => format!(
            "I'm not fully sure I understood your request, so I'm {ESCALATION_MARKER} to confirm."
        ),
    }
}

pub fn render(decision: &Decision, catalog: &Catalog) -> String {
    match decision {
        Decision::Direct { response, .. } => response.clone(),
        Decision::Escalate { intent, reason } => match catalog.response_for(*intent) {
            Some(response) => format!("{response}\n\n{}", escalation_notice(*reason)),
            None => escalation_notice(*reason),
        },
        Decision::Fallback { .. } => fallback_text(),
    }
}

pub fn render_backend_error(err: impl Display) -> String {
    format!("{}\nBackend error: {err}", fallback_text())
}
