//! 考试会话实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exam_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub started_at: i64,
    pub expires_at: i64,
    pub state: String,
    pub submitted_at: Option<i64>,
    pub auto_submitted: bool,
    pub last_saved_at: Option<i64>,
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
    pub fn into_session(self) -> crate::models::sessions::entities::ExamSession {
        use crate::models::sessions::entities::{ExamSession, SessionState};
        use chrono::{DateTime, Utc};

        ExamSession {
            id: self.id,
            exam_id: self.exam_id,
            student_id: self.student_id,
            started_at: DateTime::<Utc>::from_timestamp(self.started_at, 0).unwrap_or_default(),
            expires_at: DateTime::<Utc>::from_timestamp(self.expires_at, 0).unwrap_or_default(),
            // 无法识别的状态按已提交处理，避免再次写入
            state: self.state.parse().unwrap_or(SessionState::Submitted),
            submitted_at: self
                .submitted_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            auto_submitted: self.auto_submitted,
            last_saved_at: self
                .last_saved_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        }
    }
}
