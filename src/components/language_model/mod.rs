mod openai;

pub use openai::{parse_candidate, OpenAiUnderstanding};

use crate::config::Config;
use crate::extraction::{HeuristicUnderstanding, LanguageUnderstanding};
use std::sync::Arc;
use tracing::info;

/// Pick the understanding backend: the language model when an API key is
/// configured, keyword heuristics otherwise
pub fn from_config(config: &Config, heuristics: HeuristicUnderstanding) -> Arc<dyn LanguageUnderstanding> {
    match OpenAiUnderstanding::from_config(config) {
        Some(model) => {
            info!("Using language model {} for understanding", config.openai_model);
            Arc::new(model)
        }
        None => {
            info!("Using heuristic understanding");
            Arc::new(heuristics)
        }
    }
}
