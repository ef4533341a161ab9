use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use triage_core::{EntityKind, EntityRecognizer, RecognizedEntity, RecognizerError};

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";
const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

/// Pattern lexicon per coarse category. Patterns are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    pub date: Vec<String>,
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub money: Vec<String>,
}

impl Lexicon {
    pub fn builtin() -> Self {
        Self {
            date: vec![
                format!(r"\b(?:{MONTHS})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?\b"),
                format!(r"\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:{MONTHS})(?:,?\s+\d{{4}})?\b"),
                r"\b\d{4}-\d{2}-\d{2}\b".to_string(),
                r"\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b".to_string(),
                r"\b(?:today|tomorrow|yesterday)\b".to_string(),
                format!(r"\b(?:next|last|this)\s+(?:week|month|year|{WEEKDAYS})\b"),
                format!(r"\b(?:{WEEKDAYS})\b"),
                r"\b\d+(?:-\d+)?\s+(?:business\s+)?(?:days?|weeks?|months?|years?)\b".to_string(),
            ],
            time: vec![
                r"\b\d{1,2}(?::\d{2})?\s*[ap]m\b".to_string(),
                r"\b\d{1,2}:\d{2}\b".to_string(),
                r"\b(?:noon|midnight|tonight)\b".to_string(),
                r"\b(?:this|tomorrow|yesterday)\s+(?:morning|afternoon|evening|night)\b".to_string(),
            ],
            money: vec![
                r"[$€£₹]\s?\d+(?:[.,]\d+)*(?:\s?(?:k|m|million|billion)\b)?".to_string(),
                r"\b\d+(?:[.,]\d+)*\s?(?:dollars?|usd|euros?|eur|pounds?|gbp|rupees?|inr|cents?)\b"
                    .to_string(),
            ],
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RecognizerError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| RecognizerError::LexiconIo {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone)]
struct Span {
    start: usize,
    end: usize,
    kind: EntityKind,
}

/// Regex-lexicon recognizer for dates, times and money amounts.
#[derive(Debug, Clone)]
pub struct LexiconRecognizer {
    patterns: Vec<(EntityKind, Regex)>,
}

impl LexiconRecognizer {
    pub fn new(lexicon: &Lexicon) -> Result<Self, RecognizerError> {
        let mut patterns = Vec::new();
        for (kind, sources) in [
            (EntityKind::Date, &lexicon.date),
            (EntityKind::Time, &lexicon.time),
            (EntityKind::Money, &lexicon.money),
        ] {
            for source in sources {
                let regex = Regex::new(&format!("(?i){source}")).map_err(|err| {
                    RecognizerError::InvalidPattern {
                        kind: kind.as_str(),
                        pattern: source.clone(),
                        source: err,
                    }
                })?;
                patterns.push((kind, regex));
            }
        }
        Ok(Self { patterns })
    }

    pub fn builtin() -> Result<Self, RecognizerError> {
        Self::new(&Lexicon::builtin())
    }
}

impl EntityRecognizer for LexiconRecognizer {
    fn name(&self) -> &'static str {
        "lexicon-ner"
    }

    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError> {
        let mut spans = self
            .patterns
            .iter()
            .flat_map(|(kind, regex)| {
                regex.find_iter(text).map(move |m| Span {
                    start: m.start(),
                    end: m.end(),
                    kind: *kind,
                })
            })
            .collect::<Vec<_>>();

        // Earliest first; on equal start the longer span wins.
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut entities = Vec::new();
        let mut covered_until = 0;
        for span in spans {
            if span.start < covered_until {
                continue;
            }
            covered_until = span.end;
            entities.push(RecognizedEntity {
                kind: span.kind,
                text: text[span.start..span.end].trim().to_string(),
            });
        }
        Ok(entities)
    }
}
