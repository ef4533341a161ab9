use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Intent;
use crate::policy::ESCALATION_MARKER;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid pattern `{pattern}` for intent {intent}")]
    InvalidPattern {
        intent: Intent,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("intent {0} has more than one response record")]
    DuplicateResponse(Intent),
    #[error("direct response for intent {0} contains the escalation marker")]
    ResponseContainsMarker(Intent),
}

/// Weights and thresholds shared by the classifier and the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub pattern_weight: f32,
    pub literal_bonus: f32,
    pub max_score: f32,
    pub min_intent_score: f32,
    pub low_confidence_threshold: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pattern_weight: 0.5,
            literal_bonus: 0.3,
            max_score: 1.0,
            min_intent_score: 0.2,
            low_confidence_threshold: 0.4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternSet {
    intent: Intent,
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }
}

/// Immutable intent configuration: pattern sets, response records and the
/// forced-escalation policy set.
///
/// Pattern sets are kept ordered by intent id, which is the order the
/// classifier walks them in and therefore its tie-break.
#[derive(Debug, Clone)]
pub struct Catalog {
    pattern_sets: Vec<PatternSet>,
    responses: BTreeMap<Intent, String>,
    forced_escalation: BTreeSet<Intent>,
    scoring: ScoringConfig,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The support catalogue the assistant ships with.
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut builder = Self::builder();
        for (intent, patterns) in BUILTIN_PATTERNS {
            builder = builder.patterns(*intent, patterns.iter().copied());
        }
        for (intent, response) in BUILTIN_RESPONSES {
            builder = builder.response(*intent, *response);
        }
        for intent in BUILTIN_FORCED_ESCALATION {
            builder = builder.force_escalation(*intent);
        }
        builder.build()
    }

    pub fn pattern_sets(&self) -> &[PatternSet] {
        &self.pattern_sets
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn response_for(&self, intent: Intent) -> Option<&str> {
        self.responses.get(&intent).map(String::as_str)
    }

    pub fn requires_forced_escalation(&self, intent: Intent) -> bool {
        self.forced_escalation.contains(&intent)
    }

    pub fn intents(&self) -> impl Iterator<Item = Intent> + '_ {
        self.pattern_sets.iter().map(PatternSet::intent)
    }

    /// Intents that can be classified but would route to fallback.
    pub fn intents_without_response(&self) -> Vec<Intent> {
        self.intents()
            .filter(|intent| !self.responses.contains_key(intent))
            .collect()
    }

    pub fn summary(&self) -> Vec<CatalogEntry> {
        self.pattern_sets
            .iter()
            .map(|set| CatalogEntry {
                intent: set.intent,
                patterns: set.patterns.iter().map(|re| re.as_str().to_string()).collect(),
                response: self.responses.get(&set.intent).cloned(),
                forced_escalation: self.forced_escalation.contains(&set.intent),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub intent: Intent,
    pub patterns: Vec<String>,
    pub response: Option<String>,
    pub forced_escalation: bool,
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    patterns: BTreeMap<Intent, Vec<String>>,
    responses: Vec<(Intent, String)>,
    forced_escalation: BTreeSet<Intent>,
    scoring: ScoringConfig,
}

impl CatalogBuilder {
    pub fn scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn patterns<I, S>(mut self, intent: Intent, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns
            .entry(intent)
            .or_default()
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn response(mut self, intent: Intent, text: impl Into<String>) -> Self {
        self.responses.push((intent, text.into()));
        self
    }

    pub fn force_escalation(mut self, intent: Intent) -> Self {
        self.forced_escalation.insert(intent);
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut pattern_sets = Vec::with_capacity(self.patterns.len());
        for (intent, sources) in self.patterns {
            let mut patterns = Vec::with_capacity(sources.len());
            for pattern in sources {
                let regex = Regex::new(&pattern).map_err(|source| CatalogError::InvalidPattern {
                    intent,
                    pattern: pattern.clone(),
                    source,
                })?;
                patterns.push(regex);
            }
            pattern_sets.push(PatternSet { intent, patterns });
        }
        pattern_sets.sort_by_key(|set| set.intent.as_str());

        let mut responses = BTreeMap::new();
        for (intent, text) in self.responses {
            if responses.insert(intent, text).is_some() {
                return Err(CatalogError::DuplicateResponse(intent));
            }
        }

        for (intent, text) in &responses {
            if !self.forced_escalation.contains(intent)
                && text.to_lowercase().contains(ESCALATION_MARKER)
            {
                return Err(CatalogError::ResponseContainsMarker(*intent));
            }
        }

        Ok(Catalog {
            pattern_sets,
            responses,
            forced_escalation: self.forced_escalation,
            scoring: self.scoring,
        })
    }
}

const BUILTIN_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::BillingInquiry,
        &[
            r"\bbill(ing)?\b",
            r"\binvoice\b",
            r"\bcharge(d|s)?\b",
            r"\bbilled\b",
            r"\bpayment method\b",
            r"\bsubscription\b",
        ],
    ),
    (
        Intent::RefundStatus,
        &[
            r"\brefund\b",
            r"\bmoney back\b",
            r"\breversal\b",
            r"\breimburs\w*\b",
        ],
    ),
    (
        Intent::PasswordReset,
        &[
            r"\bforgot (my )?password\b",
            r"\breset (my )?password\b",
            r"\bcan'?t log ?in\b",
            r"\bpassword (not )?work\w*\b",
            r"\bpassword doesn'?t work\b",
        ],
    ),
    (
        Intent::AppCrash,
        &[
            r"\b(crash\w*|freez(e|es|ing))\b",
            r"\bapp (stops|hangs)\b",
            r"\bnot (working|responding)\b",
            r"\bforce clos\w*\b",
            r"\bkeeps closing\b",
        ],
    ),
    (
        Intent::OrderStatus,
        &[
            r"\btrack(ing)?\b",
            r"\border status\b",
            r"\bdelivery\b",
            r"\bwhere.*order\b",
            r"\bshipment\b",
            r"\bshipping status\b",
        ],
    ),
    (
        Intent::BusinessHours,
        &[
            r"\bhours\b",
            r"\bwhen.*open\b",
            r"\bsupport time\b",
            r"\bavailable\b",
            r"\bcontact.*time\b",
            r"\bwhen can.*(reach|contact)\b",
        ],
    ),
    (
        Intent::Pricing,
        &[
            r"\bpric(e|es|ing)\b",
            r"\bplans?\b",
            r"\bcosts?\b",
            r"\bhow much\b",
            r"\bfees?\b",
            r"\bsubscription cost\b",
        ],
    ),
    (
        Intent::AccountLocked,
        &[
            r"\blocked\b",
            r"\baccount locked\b",
            r"\bcannot login\b",
            r"\baccount (was )?suspended\b",
            r"\baccess denied\b",
            r"\bsuspended account\b",
            r"\bcan'?t access my account\b",
        ],
    ),
    (
        Intent::PaymentDispute,
        &[
            r"\bdispute\b",
            r"\bincorrect charge\b",
            r"\bdouble charged\b",
            r"\bwrong amount\b",
            r"\bunauthori[sz]ed charge\b",
            r"\bchargeback\b",
            r"\bcharged twice\b",
            r"\b(charged|billed|paid)\b.*\b(twice|two times)\b",
            r"\bcharge is (incorrect|wrong)\b",
        ],
    ),
    (
        Intent::CancelSubscription,
        &[
            r"\bcancel\b",
            r"\bunsubscribe\b",
            r"\bstop (my )?(billing|subscription)\b",
            r"\bend (my )?subscription\b",
            r"\bdelete.*account\b",
            r"\bcancel (my )?(subscription|plan|account)\b",
        ],
    ),
    (
        Intent::UpgradePlan,
        &[
            r"\bupgrade\b",
            r"\bchange plan\b",
            r"\bhigher tier\b",
            r"\bpremium\b",
            r"\bbetter plan\b",
            r"\bswitch.*plan\b",
            r"\bmore features\b",
        ],
    ),
    (
        Intent::DowngradePlan,
        &[
            r"\bdowngrade\b",
            r"\blower plan\b",
            r"\bbasic plan\b",
            r"\breduce.*costs?\b",
            r"\bcheaper plan\b",
        ],
    ),
    (
        Intent::AccountCreation,
        &[
            r"\bcreate (an )?account\b",
            r"\bsign up\b",
            r"\bregister\b",
            r"\bnew account\b",
            r"\bhow.*join\b",
            r"\bget started\b",
        ],
    ),
    (
        Intent::DataExport,
        &[
            r"\bexport.*data\b",
            r"\bdownload.*(data|information)\b",
            r"\bget.*data\b",
            r"\bdata export\b",
            r"\bcopy.*information\b",
            r"\bbackup.*data\b",
        ],
    ),
    (
        Intent::FeatureRequest,
        &[
            r"\bfeature\b",
            r"\bfeature request\b",
            r"\bsuggestion\b",
            r"\bwish list\b",
            r"\bcan you add\b",
            r"\bnew feature\b",
            r"\bwould be nice\b",
            r"\bi wish\b",
        ],
    ),
    (
        Intent::IntegrationHelp,
        &[
            r"\bintegrat(e|ion)\b",
            r"\bapi\b",
            r"\bconnect\b",
            r"\bwebhook\b",
            r"\bthird[- ]?party\b",
            r"\blink.*account\b",
        ],
    ),
    (
        Intent::BugReport,
        &[
            r"\bbug\b",
            r"\berror\b",
            r"\bissue\b",
            r"\bproblem\b",
            r"\bglitch\b",
            r"\bbroken\b",
            r"\bnot working (correctly|properly|right)\b",
            r"\bsomething.*(wrong|not working)\b",
        ],
    ),
    (
        Intent::AccountSecurity,
        &[
            r"\bsecurity\b",
            r"\b2fa\b",
            r"\btwo[- ]?factor\b",
            r"\bhacked\b",
            r"\bunauthori[sz]ed access\b",
            r"\bsuspicious activity\b",
            r"\bsecure\b",
        ],
    ),
    (
        Intent::MobileApp,
        &[
            r"\bmobile app\b",
            r"\bphone app\b",
            r"\bios\b",
            r"\bandroid\b",
            r"\bdownload (the )?(mobile )?app\b",
            r"\bapp store\b",
            r"\bplay store\b",
        ],
    ),
    (
        Intent::NotificationSettings,
        &[
            r"\bnotifications?\b",
            r"\bemail alerts?\b",
            r"\bstop.*emails\b",
            r"\bturn off.*notifications\b",
            r"\balert settings\b",
            r"\bunsubscribe.*emails\b",
        ],
    ),
    (
        Intent::InvoiceRequest,
        &[
            r"\binvoice\b",
            r"\breceipt\b",
            r"\bproof.*payment\b",
            r"\bbilling statement\b",
            r"\bpayment confirmation\b",
            r"\btax.*document\b",
        ],
    ),
    (
        Intent::TrialExtension,
        &[
            r"\bextend.*trial\b",
            r"\btrial extension\b",
            r"\bmore (trial )?time\b",
            r"\btrial.*end\w*\b",
            r"\bfree trial\b",
            r"\btrial.*expir\w*\b",
        ],
    ),
    (
        Intent::MultipleAccounts,
        &[
            r"\bmultiple accounts?\b",
            r"\bmore than one\b",
            r"\bsecond account\b",
            r"\bteam (account|plan)\b",
            r"\bshared account\b",
            r"\bfamily (plan|account)\b",
        ],
    ),
];

const BUILTIN_RESPONSES: &[(Intent, &str)] = &[
    (
        Intent::BillingInquiry,
        "Your billing cycle is monthly. You can view invoices in the Billing section of your account.",
    ),
    (
        Intent::RefundStatus,
        "Refunds are processed within 5-7 business days after approval.",
    ),
    (
        Intent::InvoiceRequest,
        "You can download invoices from Account Settings -> Billing -> Invoice History. Need a specific invoice? Share the date and I'll help locate it.",
    ),
    (
        Intent::PaymentDispute,
        "Sorry about the trouble with this charge. Payment disputes are reviewed by our billing team, who can see the full transaction history.",
    ),
    (
        Intent::PasswordReset,
        "To reset your password, use \"Forgot Password\" on the login page. Check spam for the reset email.",
    ),
    (
        Intent::AppCrash,
        "Please update to the latest app version. If it still crashes, share logs via Settings -> Diagnostics.",
    ),
    (
        Intent::BugReport,
        "Thanks for reporting! Please describe the issue in detail and share screenshots if possible. Our team will investigate within 24-48 hours.",
    ),
    (
        Intent::OrderStatus,
        "You can track your order in My Orders -> Track. Share your order ID if you need me to check.",
    ),
    (
        Intent::BusinessHours,
        "Our support hours are 9:00-18:00 IST, Monday to Friday.",
    ),
    (
        Intent::Pricing,
        "We offer Basic, Pro, and Enterprise plans. Pricing details are on the Plans page in your dashboard.",
    ),
    (
        Intent::AccountLocked,
        "For your protection, locked or suspended accounts can only be restored after an identity check.",
    ),
    (
        Intent::CancelSubscription,
        "You can cancel anytime from Account Settings -> Subscription -> Cancel. You'll retain access until the end of your billing period.",
    ),
    (
        Intent::UpgradePlan,
        "Great! You can upgrade from Account Settings -> Subscription -> Change Plan. Upgrades are prorated.",
    ),
    (
        Intent::DowngradePlan,
        "You can downgrade from Account Settings -> Subscription -> Change Plan. Changes take effect at the next billing cycle.",
    ),
    (
        Intent::AccountCreation,
        "Sign up at our homepage! Click \"Get Started\" and follow the steps. The Basic plan includes a 14-day free trial.",
    ),
    (
        Intent::MultipleAccounts,
        "You can create separate accounts for different uses. For team features, check out our Team Plan with shared workspaces.",
    ),
    (
        Intent::AccountSecurity,
        "Enable 2FA in Account Settings -> Security for extra protection. Use a strong, unique password and review login activity regularly.",
    ),
    (
        Intent::DataExport,
        "Export your data from Account Settings -> Privacy -> Download Data. You'll receive a link within 24 hours.",
    ),
    (
        Intent::FeatureRequest,
        "We love hearing ideas! Submit feature requests at feedback.example.com or via the Feedback button in your dashboard.",
    ),
    (
        Intent::IntegrationHelp,
        "We integrate with 100+ tools. Check our Integration Directory or visit docs.example.com/integrations for setup guides.",
    ),
    (
        Intent::MobileApp,
        "Download our app from the App Store (iOS) or Google Play Store (Android). Search \"YourApp Support\".",
    ),
    (
        Intent::NotificationSettings,
        "Manage notifications in Account Settings -> Notifications. You can customize email, SMS, and push alerts.",
    ),
    (
        Intent::TrialExtension,
        "Trial extensions are handled case-by-case by our support team, who can review your account history.",
    ),
];

const BUILTIN_FORCED_ESCALATION: &[Intent] = &[
    Intent::AccountLocked,
    Intent::PaymentDispute,
    Intent::TrialExtension,
    // identity verification before release
    Intent::DataExport,
    // retention team
    Intent::CancelSubscription,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_covers_every_intent() {
        let catalog = Catalog::builtin().expect("builtin catalog builds");
        let intents = catalog.intents().collect::<Vec<_>>();
        assert_eq!(intents, Intent::ALL.to_vec());
        assert!(catalog.intents_without_response().is_empty());
    }

    #[test]
    fn builtin_policy_set_matches_escalation_intents() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.requires_forced_escalation(Intent::CancelSubscription));
        assert!(catalog.requires_forced_escalation(Intent::PaymentDispute));
        assert!(!catalog.requires_forced_escalation(Intent::PasswordReset));
    }

    #[test]
    fn missing_response_is_absent_not_an_error() {
        let catalog = Catalog::builder()
            .patterns(Intent::Pricing, [r"\bprice\b"])
            .build()
            .unwrap();
        assert_eq!(catalog.response_for(Intent::Pricing), None);
        assert_eq!(catalog.intents_without_response(), vec![Intent::Pricing]);
    }

    #[test]
    fn rejects_invalid_pattern() {
        let err = Catalog::builder()
            .patterns(Intent::Pricing, [r"(unclosed"])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidPattern {
                intent: Intent::Pricing,
                ..
            }
        ));
    }

    #[test]
    fn rejects_duplicate_response() {
        let err = Catalog::builder()
            .response(Intent::Pricing, "a")
            .response(Intent::Pricing, "b")
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateResponse(Intent::Pricing)));
    }

    #[test]
    fn rejects_marker_in_direct_response() {
        let text = "Hold on, escalating to a human specialist.";
        let err = Catalog::builder()
            .response(Intent::Pricing, text)
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::ResponseContainsMarker(Intent::Pricing)));

        let forced = Catalog::builder()
            .response(Intent::Pricing, text)
            .force_escalation(Intent::Pricing)
            .build();
        assert!(forced.is_ok());
    }
}
