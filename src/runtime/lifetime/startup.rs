use crate::config::AppConfig;
use crate::errors::{ExamSystemError, Result};
use crate::models::exams::requests::ExamSeedFile;
use crate::scoring::{AutoScorer, create_scorer};
use crate::storage::Storage;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub scorer: Arc<dyn AutoScorer>,
}

/// 读取考试定义文件
pub async fn load_seed_file(path: &str) -> Result<ExamSeedFile> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ExamSystemError::validation(format!("无法读取考试定义文件 {path}: {e}"))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// 导入考试定义；同一出题人下已有同名考试时跳过，返回新导入的数量
pub async fn seed_exams(storage: &Arc<dyn Storage>, seed: ExamSeedFile) -> Result<usize> {
    let mut created = 0;
    for exam in seed.exams {
        if let Err(e) = exam.validate() {
            warn!("Skipping invalid exam '{}': {}", exam.title, e);
            continue;
        }
        if storage
            .find_exam_by_title_and_owner(&exam.title, exam.owner_id)
            .await?
            .is_some()
        {
            debug!("Exam '{}' already exists, skipping", exam.title);
            continue;
        }

        let (exam, questions) = storage.create_exam(exam).await?;
        info!(
            "Seeded exam {} '{}' with {} question(s)",
            exam.id,
            exam.title,
            questions.len()
        );
        created += 1;
    }
    Ok(created)
}

async fn seed_from_config(storage: &Arc<dyn Storage>) {
    let Some(path) = AppConfig::get().exam_seed_file() else {
        debug!("No exam seed file configured");
        return;
    };

    match load_seed_file(path).await {
        Ok(seed) => match seed_exams(storage, seed).await {
            Ok(count) => warn!("Exam seeding from {} finished: {} new exam(s)", path, count),
            Err(e) => warn!("Exam seeding from {} failed: {}", path, e),
        },
        Err(e) => warn!("Failed to load exam seed file: {}", e),
    }
}

/// 准备服务器启动的上下文
/// 包括存储、评分后端与考试导入
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    seed_from_config(&storage).await;

    let scorer = create_scorer(&AppConfig::get().evaluation);
    if cfg!(debug_assertions) {
        crate::scoring::register::debug_scorer_registry();
    }
    warn!("Scorer backend '{}' initialized", scorer.name());

    StartupContext { storage, scorer }
}
