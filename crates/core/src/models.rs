use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AccountCreation,
    AccountLocked,
    AccountSecurity,
    AppCrash,
    BillingInquiry,
    BugReport,
    BusinessHours,
    CancelSubscription,
    DataExport,
    DowngradePlan,
    FeatureRequest,
    IntegrationHelp,
    InvoiceRequest,
    MobileApp,
    MultipleAccounts,
    NotificationSettings,
    OrderStatus,
    PasswordReset,
    PaymentDispute,
    Pricing,
    RefundStatus,
    TrialExtension,
    UpgradePlan,
}

impl Intent {
    pub const ALL: [Intent; 23] = [
        Self::AccountCreation,
        Self::AccountLocked,
        Self::AccountSecurity,
        Self::AppCrash,
        Self::BillingInquiry,
        Self::BugReport,
        Self::BusinessHours,
        Self::CancelSubscription,
        Self::DataExport,
        Self::DowngradePlan,
        Self::FeatureRequest,
        Self::IntegrationHelp,
        Self::InvoiceRequest,
        Self::MobileApp,
        Self::MultipleAccounts,
        Self::NotificationSettings,
        Self::OrderStatus,
        Self::PasswordReset,
        Self::PaymentDispute,
        Self::Pricing,
        Self::RefundStatus,
        Self::TrialExtension,
        Self::UpgradePlan,
    ];

    /// Stable identifier; also the literal the classifier looks for in text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccountCreation => "account_creation",
            Self::AccountLocked => "account_locked",
            Self::AccountSecurity => "account_security",
            Self::AppCrash => "app_crash",
            Self::BillingInquiry => "billing_inquiry",
            Self::BugReport => "bug_report",
            Self::BusinessHours => "business_hours",
            Self::CancelSubscription => "cancel_subscription",
            Self::DataExport => "data_export",
            Self::DowngradePlan => "downgrade_plan",
            Self::FeatureRequest => "feature_request",
            Self::IntegrationHelp => "integration_help",
            Self::InvoiceRequest => "invoice_request",
            Self::MobileApp => "mobile_app",
            Self::MultipleAccounts => "multiple_accounts",
            Self::NotificationSettings => "notification_settings",
            Self::OrderStatus => "order_status",
            Self::PasswordReset => "password_reset",
            Self::PaymentDispute => "payment_dispute",
            Self::Pricing => "pricing",
            Self::RefundStatus => "refund_status",
            Self::TrialExtension => "trial_extension",
            Self::UpgradePlan => "upgrade_plan",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == value)
            .ok_or(UnknownIntent(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent id `{0}`")]
pub struct UnknownIntent(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    OrderId,
    Email,
    Date,
    Time,
    Money,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderId => "order_id",
            Self::Email => "email",
            Self::Date => "date",
            Self::Time => "time",
            Self::Money => "money",
        }
    }

    /// Categories only a secondary recognizer may populate.
    pub fn is_coarse(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Money)
    }
}

/// Extracted values for a single query, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entities(BTreeMap<EntityKind, Vec<String>>);

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` unless it is already recorded for `kind`.
    pub fn push(&mut self, kind: EntityKind, value: impl Into<String>) {
        let value = value.into();
        let values = self.0.entry(kind).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn get(&self, kind: EntityKind) -> &[String] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, kind: EntityKind) -> Option<&str> {
        self.get(kind).first().map(String::as_str)
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        !self.get(kind).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &[String])> {
        self.0.iter().map(|(kind, values)| (*kind, values.as_slice()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Option<Intent>,
    pub confidence: f32,
}

impl Classification {
    pub fn none() -> Self {
        Self {
            intent: None,
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentScore {
    pub intent: Intent,
    pub pattern_hits: usize,
    pub literal_bonus: bool,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    LowConfidence,
    Policy,
}

impl EscalationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowConfidence => "low_confidence",
            Self::Policy => "policy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// No usable intent/response pairing. `intent` is set when an intent was
    /// classified but has no response record.
    Fallback { intent: Option<Intent> },
    Escalate {
        intent: Intent,
        reason: EscalationReason,
    },
    Direct { intent: Intent, response: String },
}

impl Decision {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fallback { .. } => "fallback",
            Self::Escalate { .. } => "escalate",
            Self::Direct { .. } => "direct",
        }
    }

    pub fn is_escalation(&self) -> bool {
        !matches!(self, Self::Direct { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReply {
    pub reply_text: String,
    pub intent: Option<Intent>,
    pub confidence: f32,
    pub decision: Decision,
    pub entities: Entities,
    pub ner_enabled: bool,
    pub handled_at: DateTime<Utc>,
}
