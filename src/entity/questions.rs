//! 题目实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exam_id: i64,
    pub position: i32,
    pub question_type: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    // 选项 JSON 对象，形如 {"A": "...", "B": "..."}
    #[sea_orm(column_type = "Text", nullable)]
    pub options: Option<String>,
    pub correct_answer: Option<String>,
    pub max_marks: f64,
    pub word_limit: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exams::Entity",
        from = "Column::ExamId",
        to = "super::exams::Column::Id"
    )]
    Exam,
    #[sea_orm(has_many = "super::responses::Entity")]
    Responses,
}

impl Related<super::exams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl Related<super::responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_question(self) -> crate::models::exams::entities::Question {
        use crate::models::exams::entities::{Question, QuestionType};

        Question {
            id: self.id,
            exam_id: self.exam_id,
            position: self.position,
            question_type: self.question_type.parse().unwrap_or(QuestionType::LongAnswer),
            text: self.text,
            options: self
                .options
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            correct_answer: self.correct_answer,
            max_marks: self.max_marks,
            word_limit: self.word_limit,
        }
    }
}
