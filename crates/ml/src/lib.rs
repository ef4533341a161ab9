mod lexicon;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{info, warn};
use triage_core::NerCapability;

pub use lexicon::{Lexicon, LexiconRecognizer};

static DEFAULT_CAPABILITY: OnceCell<NerCapability> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct NerSettings {
    pub enabled: bool,
    pub lexicon_path: Option<PathBuf>,
}

impl Default for NerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lexicon_path: None,
        }
    }
}

impl NerSettings {
    /// Reads `TRIAGE_NER` (`off`/`0`/`false` disables) and `TRIAGE_NER_LEXICON`.
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("TRIAGE_NER")
                .map(|value| parse_switch(&value))
                .unwrap_or(true),
            lexicon_path: env::var("TRIAGE_NER_LEXICON")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

pub fn parse_switch(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "off" | "0" | "false" | "no" | "disabled"
    )
}

/// Loads the secondary recognizer. Any load failure degrades to
/// [`NerCapability::Unavailable`].
pub fn load_capability(settings: &NerSettings) -> NerCapability {
    if !settings.enabled {
        info!("secondary entity recognizer disabled");
        return NerCapability::Unavailable;
    }

    let lexicon = match &settings.lexicon_path {
        Some(path) => match Lexicon::from_json_file(path) {
            Ok(lexicon) => lexicon,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "lexicon load failed, using pattern-only extraction");
                return NerCapability::Unavailable;
            }
        },
        None => Lexicon::builtin(),
    };

    match LexiconRecognizer::new(&lexicon) {
        Ok(recognizer) => NerCapability::Available(Arc::new(recognizer)),
        Err(err) => {
            warn!(error = %err, "lexicon compile failed, using pattern-only extraction");
            NerCapability::Unavailable
        }
    }
}

/// Process-wide capability, loaded from the environment on first use.
pub fn default_capability() -> NerCapability {
    DEFAULT_CAPABILITY
        .get_or_init(|| load_capability(&NerSettings::from_env()))
        .clone()
}
