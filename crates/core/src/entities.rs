use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Entities, EntityKind};

static ORDER_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\border\s*#?\s*([A-Z0-9\-]{6,})\b").expect("valid order id regex")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedEntity {
    pub kind: EntityKind,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("failed reading lexicon at {path}")]
    LexiconIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid lexicon json")]
    LexiconParse(#[from] serde_json::Error),
    #[error("invalid {kind} pattern `{pattern}` in lexicon")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("recognizer {name} failed: {message}")]
    Inference { name: &'static str, message: String },
}

/// Secondary entity recognizer for coarse categories (date, time, money).
pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError>;
}

/// Stand-in used when no recognizer could be loaded; contributes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecognizer;

impl EntityRecognizer for NullRecognizer {
    fn name(&self) -> &'static str {
        "none"
    }

    fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError> {
        Ok(Vec::new())
    }
}

/// Whether the secondary recognizer is present, decided once at startup.
#[derive(Clone)]
pub enum NerCapability {
    Available(Arc<dyn EntityRecognizer>),
    Unavailable,
}

impl NerCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn recognizer(&self) -> Arc<dyn EntityRecognizer> {
        match self {
            Self::Available(recognizer) => recognizer.clone(),
            Self::Unavailable => Arc::new(NullRecognizer),
        }
    }
}

impl fmt::Debug for NerCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(recognizer) => write!(f, "Available({})", recognizer.name()),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Structural extraction (order id, email), first match per category.
///
/// The order id is the first candidate that contains a digit rather than the
/// first raw match, so "order status" yields no id instead of `status`.
pub fn extract_patterns(text: &str) -> Entities {
    let mut entities = Entities::new();

    if let Some(order_id) = ORDER_ID
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|candidate| candidate.chars().any(|ch| ch.is_ascii_digit()))
    {
        entities.push(EntityKind::OrderId, order_id);
    }

    if let Some(email) = EMAIL.find(text) {
        entities.push(EntityKind::Email, email.as_str());
    }

    entities
}

#[derive(Clone)]
pub struct EntityExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
    ner_enabled: bool,
}

impl EntityExtractor {
    pub fn new(capability: &NerCapability) -> Self {
        Self {
            recognizer: capability.recognizer(),
            ner_enabled: capability.is_available(),
        }
    }

    pub fn ner_enabled(&self) -> bool {
        self.ner_enabled
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Pattern entities plus whatever coarse categories the recognizer adds.
    /// Structural categories reported by the recognizer are ignored.
    pub fn extract(&self, text: &str) -> Result<Entities, RecognizerError> {
        let mut entities = extract_patterns(text);
        for entity in self.recognizer.recognize(text)? {
            if entity.kind.is_coarse() {
                entities.push(entity.kind, entity.text);
            }
        }
        Ok(entities)
    }
}

impl fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityExtractor")
            .field("recognizer", &self.recognizer.name())
            .field("ner_enabled", &self.ner_enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRecognizer(Vec<RecognizedEntity>);

    impl EntityRecognizer for FixedRecognizer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn extracts_order_id() {
        let entities = extract_patterns("Track my order #ABC-12345");
        assert_eq!(entities.first(EntityKind::OrderId), Some("ABC-12345"));
    }

    #[test]
    fn order_phrase_without_digits_is_not_an_id() {
        let entities = extract_patterns("what's my order status?");
        assert!(!entities.contains(EntityKind::OrderId));
    }

    #[test]
    fn keeps_only_first_order_id_and_email() {
        let entities = extract_patterns(
            "order 123456 and order 987654, mail a@example.com or b@example.org",
        );
        assert_eq!(entities.get(EntityKind::OrderId), ["123456"]);
        assert_eq!(entities.get(EntityKind::Email), ["a@example.com"]);
    }

    #[test]
    fn unavailable_capability_yields_pattern_entities_only() {
        let extractor = EntityExtractor::new(&NerCapability::Unavailable);
        assert!(!extractor.ner_enabled());
        let entities = extractor.extract("refund to jo@example.com tomorrow").unwrap();
        assert_eq!(entities.first(EntityKind::Email), Some("jo@example.com"));
        assert!(!entities.contains(EntityKind::Date));
    }

    #[test]
    fn recognizer_only_adds_coarse_categories() {
        let recognizer = FixedRecognizer(vec![
            RecognizedEntity {
                kind: EntityKind::Money,
                text: "$20".to_string(),
            },
            RecognizedEntity {
                kind: EntityKind::Email,
                text: "spoofed@example.com".to_string(),
            },
        ]);
        let extractor = EntityExtractor::new(&NerCapability::Available(Arc::new(recognizer)));
        let entities = extractor.extract("charged $20").unwrap();
        assert_eq!(entities.get(EntityKind::Money), ["$20"]);
        assert!(!entities.contains(EntityKind::Email));
    }
}
