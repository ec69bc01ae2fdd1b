use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 题目类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub enum QuestionType {
    Mcq,         // 单选题，提交即自动判分
    ShortAnswer, // 简答题
    LongAnswer,  // 论述题
}

impl QuestionType {
    pub const MCQ: &'static str = "mcq";
    pub const SHORT_ANSWER: &'static str = "short_answer";
    pub const LONG_ANSWER: &'static str = "long_answer";

    /// 客观题可在提交时直接判分
    pub fn is_objective(&self) -> bool {
        matches!(self, QuestionType::Mcq)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "{}", QuestionType::MCQ),
            QuestionType::ShortAnswer => write!(f, "{}", QuestionType::SHORT_ANSWER),
            QuestionType::LongAnswer => write!(f, "{}", QuestionType::LONG_ANSWER),
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            QuestionType::MCQ => Ok(QuestionType::Mcq),
            QuestionType::SHORT_ANSWER => Ok(QuestionType::ShortAnswer),
            QuestionType::LONG_ANSWER => Ok(QuestionType::LongAnswer),
            _ => Err(format!("Invalid question type: {s}")),
        }
    }
}

/// 考试定义（由出题方维护，对本服务只读）
#[derive(Debug, Clone, PartialEq)]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    // 开放时间
    pub scheduled_start: DateTime<Utc>,
    // 作答时长（分钟）
    pub duration_minutes: i32,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Exam {
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    /// 开放窗口结束时刻
    pub fn window_end(&self) -> DateTime<Utc> {
        self.scheduled_start + self.duration()
    }

    /// `scheduled_start <= now < window_end`
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_start <= now && now < self.window_end()
    }
}

/// 题目
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub exam_id: i64,
    pub position: i32,
    pub question_type: QuestionType,
    pub text: String,
    // 选项 key -> 文本，仅单选题
    pub options: Option<BTreeMap<String, String>>,
    // 正确选项 key，仅单选题
    pub correct_answer: Option<String>,
    pub max_marks: f64,
    // 建议字数，仅主观题
    pub word_limit: Option<i32>,
}
