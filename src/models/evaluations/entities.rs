use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 评分来源，按优先级从低到高：Automatic = AiModel < ManualReviewer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub enum Evaluator {
    Automatic,      // 规则判分（单选题）
    AiModel,        // 自动评分服务
    ManualReviewer, // 人工评阅
}

impl Evaluator {
    pub const AUTOMATIC: &'static str = "automatic";
    pub const AI_MODEL: &'static str = "ai_model";
    pub const MANUAL_REVIEWER: &'static str = "manual_reviewer";

    /// 优先级，高优先级的评分不能被低优先级覆盖
    pub fn priority(&self) -> u8 {
        match self {
            Evaluator::Automatic | Evaluator::AiModel => 1,
            Evaluator::ManualReviewer => 2,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Evaluator::ManualReviewer)
    }
}

impl std::fmt::Display for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evaluator::Automatic => write!(f, "{}", Evaluator::AUTOMATIC),
            Evaluator::AiModel => write!(f, "{}", Evaluator::AI_MODEL),
            Evaluator::ManualReviewer => write!(f, "{}", Evaluator::MANUAL_REVIEWER),
        }
    }
}

impl std::str::FromStr for Evaluator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Evaluator::AUTOMATIC => Ok(Evaluator::Automatic),
            Evaluator::AI_MODEL => Ok(Evaluator::AiModel),
            Evaluator::MANUAL_REVIEWER => Ok(Evaluator::ManualReviewer),
            _ => Err(format!("Invalid evaluator: {s}")),
        }
    }
}

// 评分状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub enum EvaluationStatus {
    Pending,
    Evaluated,
}

impl EvaluationStatus {
    pub const PENDING: &'static str = "pending";
    pub const EVALUATED: &'static str = "evaluated";
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationStatus::Pending => write!(f, "{}", EvaluationStatus::PENDING),
            EvaluationStatus::Evaluated => write!(f, "{}", EvaluationStatus::EVALUATED),
        }
    }
}

impl std::str::FromStr for EvaluationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            EvaluationStatus::PENDING => Ok(EvaluationStatus::Pending),
            EvaluationStatus::EVALUATED => Ok(EvaluationStatus::Evaluated),
            _ => Err(format!("Invalid evaluation status: {s}")),
        }
    }
}

/// 某条作答当前的评分
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub id: i64,
    pub response_id: i64,
    pub marks_awarded: f64,
    pub feedback: Option<String>,
    // 待评阅时为空
    pub evaluator: Option<Evaluator>,
    // 人工评阅时为评阅人 ID
    pub evaluator_id: Option<i64>,
    pub status: EvaluationStatus,
    pub evaluated_at: Option<DateTime<Utc>>,
    // 最近一次自动评分失败原因
    pub last_error: Option<String>,
}

impl Evaluation {
    pub fn is_evaluated(&self) -> bool {
        self.status == EvaluationStatus::Evaluated
    }

    pub fn is_locked(&self) -> bool {
        self.evaluator.is_some_and(|e| e.is_manual())
    }
}

/// 待写入的评分结果
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationDraft {
    pub marks_awarded: f64,
    pub feedback: Option<String>,
    pub evaluator: Option<Evaluator>,
    pub evaluator_id: Option<i64>,
    pub status: EvaluationStatus,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl EvaluationDraft {
    /// 主观题提交时的初始状态
    pub fn pending() -> Self {
        Self {
            marks_awarded: 0.0,
            feedback: None,
            evaluator: None,
            evaluator_id: None,
            status: EvaluationStatus::Pending,
            evaluated_at: None,
        }
    }

    pub fn evaluated(
        evaluator: Evaluator,
        evaluator_id: Option<i64>,
        marks_awarded: f64,
        feedback: Option<String>,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            marks_awarded,
            feedback,
            evaluator: Some(evaluator),
            evaluator_id,
            status: EvaluationStatus::Evaluated,
            evaluated_at: Some(evaluated_at),
        }
    }
}
