//! 作答实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "responses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    #[sea_orm(column_type = "Text")]
    pub answer_text: String,
    pub last_saved_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exam_sessions::Entity",
        from = "Column::SessionId",
        to = "super::exam_sessions::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::questions::Entity",
        from = "Column::QuestionId",
        to = "super::questions::Column::Id"
    )]
    Question,
    #[sea_orm(has_one = "super::evaluations::Entity")]
    Evaluation,
}

impl Related<super::exam_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl Related<super::evaluations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evaluation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_response(self) -> crate::models::responses::entities::Response {
        use crate::models::responses::entities::Response;
        use chrono::{DateTime, Utc};

        Response {
            id: self.id,
            session_id: self.session_id,
            question_id: self.question_id,
            answer_text: self.answer_text,
            last_saved_at: DateTime::<Utc>::from_timestamp(self.last_saved_at, 0)
                .unwrap_or_default(),
        }
    }
}
