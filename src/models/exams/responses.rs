use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::models::exams::entities::{Question, QuestionType};

/// 下发给考生的题目（不含答案）
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct SanitizedQuestion {
    pub id: i64,
    pub position: i32,
    pub question_type: QuestionType,
    pub text: String,
    pub options: Option<BTreeMap<String, String>>,
    pub max_marks: f64,
    pub word_limit: Option<i32>,
}

impl From<&Question> for SanitizedQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            position: q.position,
            question_type: q.question_type,
            text: q.text.clone(),
            options: q.options.clone(),
            max_marks: q.max_marks,
            word_limit: q.word_limit,
        }
    }
}
