pub mod catalog;
pub mod entities;
pub mod intent;
pub mod models;
pub mod policy;

pub use catalog::{Catalog, CatalogBuilder, CatalogEntry, CatalogError, PatternSet, ScoringConfig};
pub use entities::{
    extract_patterns, EntityExtractor, EntityRecognizer, NerCapability, NullRecognizer,
    RecognizedEntity, RecognizerError,
};
pub use intent::{normalize_text, IntentClassifier};
pub use models::*;
pub use policy::{PolicyEngine, ESCALATION_MARKER};
