use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use once_cell::sync::Lazy;
use tracing::{info, warn};

use super::{AutoScorer, DisabledScorer, OpenAiScorer, ScorerError};
use crate::config::EvaluationConfig;

pub type ScorerConstructor =
    Arc<dyn Fn(&EvaluationConfig) -> Result<Arc<dyn AutoScorer>, ScorerError> + Send + Sync>;

static SCORER_REGISTRY: Lazy<RwLock<HashMap<String, ScorerConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub fn register_scorer_plugin<S: Into<String>>(name: S, constructor: ScorerConstructor) {
    let name = name.into();
    let mut registry = SCORER_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.insert(name, constructor);
}

pub fn get_scorer_plugin(name: &str) -> Option<ScorerConstructor> {
    SCORER_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(name)
        .cloned()
}

pub fn debug_scorer_registry() {
    let registry = SCORER_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if registry.is_empty() {
        tracing::debug!("No scorer plugins registered.");
    } else {
        tracing::debug!("Registered scorer plugins:");
        for key in registry.keys() {
            tracing::debug!(" - {}", key);
        }
    }
}

/// 注册内置评分后端
pub fn register_builtin_scorers() {
    register_scorer_plugin(
        "disabled",
        Arc::new(
            |_: &EvaluationConfig| -> Result<Arc<dyn AutoScorer>, ScorerError> {
                Ok(Arc::new(DisabledScorer))
            },
        ),
    );
    register_scorer_plugin(
        "openai",
        Arc::new(
            |config: &EvaluationConfig| -> Result<Arc<dyn AutoScorer>, ScorerError> {
                Ok(Arc::new(OpenAiScorer::new(&config.openai)?))
            },
        ),
    );
}

/// 按配置创建评分后端；未知或无法初始化时退回 disabled
pub fn create_scorer(config: &EvaluationConfig) -> Arc<dyn AutoScorer> {
    register_builtin_scorers();

    let Some(constructor) = get_scorer_plugin(&config.scorer) else {
        warn!(
            "Unknown scorer backend '{}', automated evaluation disabled",
            config.scorer
        );
        return Arc::new(DisabledScorer);
    };

    match constructor(config) {
        Ok(scorer) => {
            info!("Automated scorer backend: {}", scorer.name());
            scorer
        }
        Err(e) => {
            warn!(
                "Scorer backend '{}' unavailable ({}), automated evaluation disabled",
                config.scorer, e
            );
            Arc::new(DisabledScorer)
        }
    }
}
