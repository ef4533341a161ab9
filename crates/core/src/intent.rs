use std::sync::Arc;

use crate::catalog::Catalog;
use crate::models::{Classification, IntentScore};

/// Case-folds, trims and collapses runs of whitespace.
pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Weighted pattern-hit classifier over a [`Catalog`].
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    catalog: Arc<Catalog>,
}

impl IntentClassifier {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Scores every intent in catalogue order (ascending intent id).
    pub fn score_all(&self, text: &str) -> Vec<IntentScore> {
        let normalized = normalize_text(text);
        let scoring = self.catalog.scoring();

        self.catalog
            .pattern_sets()
            .iter()
            .map(|set| {
                let pattern_hits = set
                    .patterns()
                    .iter()
                    .filter(|pattern| pattern.is_match(&normalized))
                    .count();
                let literal_bonus = normalized.contains(set.intent().as_str());

                let mut score = scoring.pattern_weight * pattern_hits as f32;
                if literal_bonus {
                    score += scoring.literal_bonus;
                }

                IntentScore {
                    intent: set.intent(),
                    pattern_hits,
                    literal_bonus,
                    score: score.min(scoring.max_score),
                }
            })
            .collect()
    }

    /// Best-scoring intent, or none when the best score is under the floor.
    /// Ties go to the lexicographically smallest intent id.
    pub fn classify(&self, text: &str) -> Classification {
        let mut best: Option<IntentScore> = None;
        for candidate in self.score_all(text) {
            match best {
                Some(current) if candidate.score <= current.score => {}
                _ => best = Some(candidate),
            }
        }

        match best {
            Some(best) if best.score >= self.catalog.scoring().min_intent_score => {
                Classification {
                    intent: Some(best.intent),
                    confidence: best.score,
                }
            }
            _ => Classification::none(),
        }
    }
}
