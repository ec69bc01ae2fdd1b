//! 测试夹具

use std::collections::BTreeMap;

use crate::models::exams::{
    entities::QuestionType,
    requests::{CreateExamRequest, CreateQuestionRequest},
};
use crate::storage::sea_orm_storage::SeaOrmStorage;

/// 内存 SQLite 存储
pub async fn memory_storage() -> SeaOrmStorage {
    SeaOrmStorage::connect("sqlite::memory:", 1, 5)
        .await
        .expect("in-memory sqlite should open")
}

/// 测试用考试：一道单选题（5 分）、一道简答题（5 分）、一道论述题（10 分）
pub fn sample_exam(scheduled_start: i64) -> CreateExamRequest {
    CreateExamRequest {
        title: "Systems Programming Midterm".to_string(),
        description: Some("Ownership and lifetimes".to_string()),
        scheduled_start,
        duration_minutes: 30,
        owner_id: 7,
        questions: vec![
            CreateQuestionRequest {
                question_type: QuestionType::Mcq,
                text: "Which keyword moves a value into a closure?".to_string(),
                options: Some(BTreeMap::from([
                    ("A".to_string(), "move".to_string()),
                    ("B".to_string(), "ref".to_string()),
                ])),
                correct_answer: Some("A".to_string()),
                max_marks: 5.0,
                word_limit: None,
            },
            CreateQuestionRequest {
                question_type: QuestionType::ShortAnswer,
                text: "What does the borrow checker enforce?".to_string(),
                options: None,
                correct_answer: None,
                max_marks: 5.0,
                word_limit: Some(50),
            },
            CreateQuestionRequest {
                question_type: QuestionType::LongAnswer,
                text: "Explain interior mutability.".to_string(),
                options: None,
                correct_answer: None,
                max_marks: 10.0,
                word_limit: Some(300),
            },
        ],
    }
}
