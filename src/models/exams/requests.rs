use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::{ExamSystemError, Result};
use crate::models::exams::entities::QuestionType;

/// 创建考试请求（出题方导入）
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExamRequest {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_start: i64, // epoch 秒
    pub duration_minutes: i32,
    pub owner_id: i64,
    pub questions: Vec<CreateQuestionRequest>,
}

/// 创建题目请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionRequest {
    pub question_type: QuestionType,
    pub text: String,
    pub options: Option<BTreeMap<String, String>>,
    pub correct_answer: Option<String>,
    pub max_marks: f64,
    pub word_limit: Option<i32>,
}

/// 考试导入文件格式
#[derive(Debug, Clone, Deserialize)]
pub struct ExamSeedFile {
    pub exams: Vec<CreateExamRequest>,
}

impl CreateExamRequest {
    /// 校验考试定义，任何一处不合法都整体拒绝
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ExamSystemError::validation("考试标题不能为空"));
        }
        if self.duration_minutes <= 0 {
            return Err(ExamSystemError::validation(format!(
                "考试时长必须为正整数: {}",
                self.duration_minutes
            )));
        }
        if chrono::DateTime::from_timestamp(self.scheduled_start, 0).is_none() {
            return Err(ExamSystemError::validation(format!(
                "无效的开放时间: {}",
                self.scheduled_start
            )));
        }
        for (index, question) in self.questions.iter().enumerate() {
            question
                .validate()
                .map_err(|e| ExamSystemError::validation(format!("第 {} 题: {}", index + 1, e.message())))?;
        }
        Ok(())
    }
}

impl CreateQuestionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(ExamSystemError::validation("题目内容不能为空"));
        }
        if !self.max_marks.is_finite() || self.max_marks <= 0.0 {
            return Err(ExamSystemError::validation(format!(
                "题目分值必须为正数: {}",
                self.max_marks
            )));
        }

        match self.question_type {
            QuestionType::Mcq => {
                let options = self
                    .options
                    .as_ref()
                    .filter(|o| !o.is_empty())
                    .ok_or_else(|| ExamSystemError::validation("单选题必须提供选项"))?;
                let correct = self
                    .correct_answer
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| ExamSystemError::validation("单选题必须提供正确答案"))?;
                if !options.keys().any(|k| k.trim().eq_ignore_ascii_case(correct)) {
                    return Err(ExamSystemError::validation(format!(
                        "正确答案 '{correct}' 不在选项中"
                    )));
                }
            }
            QuestionType::ShortAnswer | QuestionType::LongAnswer => {
                if let Some(limit) = self.word_limit.filter(|l| *l <= 0) {
                    return Err(ExamSystemError::validation(format!(
                        "字数限制必须为正整数: {limit}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(correct: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_type: QuestionType::Mcq,
            text: "2 + 2 = ?".to_string(),
            options: Some(BTreeMap::from([
                ("A".to_string(), "4".to_string()),
                ("B".to_string(), "5".to_string()),
            ])),
            correct_answer: Some(correct.to_string()),
            max_marks: 2.0,
            word_limit: None,
        }
    }

    fn exam(questions: Vec<CreateQuestionRequest>) -> CreateExamRequest {
        CreateExamRequest {
            title: "Midterm".to_string(),
            description: None,
            scheduled_start: 1_700_000_000,
            duration_minutes: 30,
            owner_id: 1,
            questions,
        }
    }

    #[test]
    fn test_valid_exam() {
        assert!(exam(vec![mcq("A")]).validate().is_ok());
    }

    #[test]
    fn test_mcq_correct_answer_must_be_an_option() {
        let err = exam(vec![mcq("C")]).validate().unwrap_err();
        assert_eq!(err.code(), "E010");
        assert!(err.message().contains("第 1 题"));
    }

    #[test]
    fn test_non_positive_marks_rejected() {
        let mut q = mcq("A");
        q.max_marks = 0.0;
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let mut e = exam(vec![]);
        e.duration_minutes = 0;
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_word_limit_must_be_positive() {
        let q = CreateQuestionRequest {
            question_type: QuestionType::LongAnswer,
            text: "Explain ownership.".to_string(),
            options: None,
            correct_answer: None,
            max_marks: 10.0,
            word_limit: Some(0),
        };
        assert!(q.validate().is_err());
    }
}
