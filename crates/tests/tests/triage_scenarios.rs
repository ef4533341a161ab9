use std::sync::Arc;

use triage_agents::{handle_query, SupportAgent, ESCALATION_MARKER};
use triage_core::{
    Catalog, Decision, EntityKind, EscalationReason, Intent, NerCapability,
};
use triage_ml::{load_capability, NerSettings};
use triage_observability::AppMetrics;

fn agent(capability: NerCapability) -> SupportAgent {
    SupportAgent::new(
        Arc::new(Catalog::builtin().expect("builtin catalog")),
        capability,
        AppMetrics::shared(),
    )
}

fn with_ner() -> SupportAgent {
    agent(load_capability(&NerSettings::default()))
}

fn without_ner() -> SupportAgent {
    agent(NerCapability::Unavailable)
}

#[test]
fn order_tracking_is_answered_directly() {
    let agent = with_ner();
    let reply = agent.resolve_query("Track my order #ABC-12345").unwrap();

    assert_eq!(reply.intent, Some(Intent::OrderStatus));
    assert_eq!(reply.entities.first(EntityKind::OrderId), Some("ABC-12345"));
    assert_eq!(
        reply.decision,
        Decision::Direct {
            intent: Intent::OrderStatus,
            response: agent
                .catalog()
                .response_for(Intent::OrderStatus)
                .unwrap()
                .to_string(),
        }
    );
    assert_eq!(
        reply.reply_text,
        agent.catalog().response_for(Intent::OrderStatus).unwrap()
    );
}

#[test]
fn double_charge_is_escalated_by_policy() {
    let reply = with_ner().resolve_query("I was charged twice").unwrap();

    assert_eq!(reply.intent, Some(Intent::PaymentDispute));
    assert_eq!(
        reply.decision,
        Decision::Escalate {
            intent: Intent::PaymentDispute,
            reason: EscalationReason::Policy,
        }
    );
    assert!(reply.reply_text.contains(ESCALATION_MARKER));
}

#[test]
fn gibberish_falls_back() {
    let reply = with_ner().resolve_query("asdkjh qweoiu").unwrap();

    assert_eq!(reply.intent, None);
    assert_eq!(reply.confidence, 0.0);
    assert_eq!(reply.decision, Decision::Fallback { intent: None });
    assert!(!reply.reply_text.is_empty());
    assert!(reply.reply_text.contains(ESCALATION_MARKER));
}

#[test]
fn confident_cancellation_still_escalates() {
    let agent = with_ner();
    let reply = agent.resolve_query("cancel my subscription").unwrap();

    assert_eq!(reply.intent, Some(Intent::CancelSubscription));
    assert_eq!(reply.confidence, 1.0);
    assert!(matches!(
        reply.decision,
        Decision::Escalate {
            reason: EscalationReason::Policy,
            ..
        }
    ));
    let canned = agent
        .catalog()
        .response_for(Intent::CancelSubscription)
        .unwrap();
    assert_ne!(reply.reply_text, canned);
    assert!(reply.reply_text.contains(ESCALATION_MARKER));
}

#[test]
fn password_reset_has_no_escalation_framing() {
    let agent = without_ner();
    let reply = agent.handle_query("I forgot my password");

    assert!(reply.contains("To reset your password, use \"Forgot Password\""));
    assert!(!reply.contains(ESCALATION_MARKER));
}

#[test]
fn weak_match_escalates_for_low_confidence() {
    let reply = without_ner().resolve_query("order_status").unwrap();

    assert_eq!(reply.intent, Some(Intent::OrderStatus));
    assert!(reply.confidence >= 0.2 && reply.confidence < 0.4);
    assert_eq!(
        reply.decision,
        Decision::Escalate {
            intent: Intent::OrderStatus,
            reason: EscalationReason::LowConfidence,
        }
    );
    assert!(reply.reply_text.contains(ESCALATION_MARKER));
}

#[test]
fn intent_without_response_falls_back() {
    let catalog = Catalog::builder()
        .patterns(Intent::FeatureRequest, [r"\bdark mode\b"])
        .build()
        .unwrap();
    let agent = SupportAgent::new(
        Arc::new(catalog),
        NerCapability::Unavailable,
        AppMetrics::shared(),
    );

    let reply = agent.resolve_query("please add dark mode").unwrap();
    assert_eq!(
        reply.decision,
        Decision::Fallback {
            intent: Some(Intent::FeatureRequest)
        }
    );
    assert!(reply.reply_text.contains(ESCALATION_MARKER));
}

#[test]
fn repeated_queries_are_identical() {
    let agent = with_ner();
    for text in [
        "I forgot my password",
        "I was charged $40 twice on March 3",
        "order_status",
        "asdkjh qweoiu",
    ] {
        let first = agent.resolve_query(text).unwrap();
        let second = agent.resolve_query(text).unwrap();
        assert_eq!(first.reply_text, second.reply_text);
        assert_eq!(first.intent, second.intent);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.decision, second.decision);
        assert_eq!(first.entities, second.entities);
    }
}

#[test]
fn disabling_ner_only_changes_auxiliary_entities() {
    let enabled = with_ner();
    let disabled = without_ner();

    for text in [
        "I was charged $40 twice on March 3",
        "refund of 20 dollars by friday please",
        "Track my order #ABC-12345 before 6pm tomorrow",
        "cancel my subscription next week",
        "order_status",
        "",
    ] {
        let rich = enabled.resolve_query(text).unwrap();
        let plain = disabled.resolve_query(text).unwrap();

        assert_eq!(rich.intent, plain.intent, "{text}");
        assert_eq!(rich.decision, plain.decision, "{text}");
        assert_eq!(rich.reply_text, plain.reply_text, "{text}");
        assert_eq!(
            rich.entities.first(EntityKind::OrderId),
            plain.entities.first(EntityKind::OrderId)
        );
        assert!(plain.entities.iter().all(|(kind, _)| !kind.is_coarse()));
    }

    let rich = enabled
        .resolve_query("I was charged $40 twice on March 3")
        .unwrap();
    assert_eq!(rich.entities.get(EntityKind::Money), ["$40"]);
    assert_eq!(rich.entities.get(EntityKind::Date), ["March 3"]);
}

#[test]
fn odd_inputs_always_get_a_reply() {
    let agent = with_ner();
    for text in ["", "   ", "\n\t", "¿Dónde está mi pedido?", "注文はどこ", "🙂🙂🙂"] {
        let reply = agent.handle_query(text);
        assert!(!reply.is_empty());
        assert!(reply.contains(ESCALATION_MARKER));
    }
}

#[test]
fn every_builtin_intent_is_reachable() {
    let agent = without_ner();
    let samples = [
        ("How do I create an account?", Intent::AccountCreation),
        ("My account is locked", Intent::AccountLocked),
        ("How do I enable 2FA?", Intent::AccountSecurity),
        ("The app keeps crashing", Intent::AppCrash),
        ("What's my billing cycle?", Intent::BillingInquiry),
        ("I found a bug", Intent::BugReport),
        ("What are your support hours?", Intent::BusinessHours),
        ("I want to cancel my subscription", Intent::CancelSubscription),
        ("I need to export my data", Intent::DataExport),
        ("Can I downgrade?", Intent::DowngradePlan),
        ("I have a feature request", Intent::FeatureRequest),
        ("Is there a feature to share dashboards?", Intent::FeatureRequest),
        ("Webhook setup help", Intent::IntegrationHelp),
        ("Can I get a receipt?", Intent::InvoiceRequest),
        ("Is there an iOS version?", Intent::MobileApp),
        ("I need a second account", Intent::MultipleAccounts),
        ("How do I turn off notifications?", Intent::NotificationSettings),
        ("Check shipment status", Intent::OrderStatus),
        ("I forgot my password", Intent::PasswordReset),
        ("I want to dispute this payment", Intent::PaymentDispute),
        ("How much does it cost?", Intent::Pricing),
        ("I want my money back", Intent::RefundStatus),
        ("Can I extend my free trial?", Intent::TrialExtension),
        ("Can I upgrade to premium?", Intent::UpgradePlan),
    ];

    for (text, expected) in samples {
        let reply = agent.resolve_query(text).unwrap();
        assert_eq!(reply.intent, Some(expected), "{text}");

        let escalated = reply.reply_text.contains(ESCALATION_MARKER);
        assert_eq!(
            escalated,
            agent.catalog().requires_forced_escalation(expected),
            "{text}"
        );
    }
}

#[test]
fn process_wide_entry_point_answers() {
    let reply = handle_query("I forgot my password");
    assert!(reply.contains("Forgot Password"));
    assert!(!reply.contains(ESCALATION_MARKER));
}
