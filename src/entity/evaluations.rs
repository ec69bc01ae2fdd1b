//! 评分实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "evaluations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub response_id: i64,
    pub marks_awarded: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub evaluator: Option<String>,
    pub evaluator_id: Option<i64>,
    pub status: String,
    pub evaluated_at: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::responses::Entity",
        from = "Column::ResponseId",
        to = "super::responses::Column::Id"
    )]
    Response,
}

impl Related<super::responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_evaluation(self) -> crate::models::evaluations::entities::Evaluation {
        use crate::models::evaluations::entities::{Evaluation, EvaluationStatus};
        use chrono::{DateTime, Utc};

        Evaluation {
            id: self.id,
            response_id: self.response_id,
            marks_awarded: self.marks_awarded,
            feedback: self.feedback,
            evaluator: self.evaluator.and_then(|e| e.parse().ok()),
            evaluator_id: self.evaluator_id,
            status: self.status.parse().unwrap_or(EvaluationStatus::Pending),
            evaluated_at: self
                .evaluated_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            last_error: self.last_error,
        }
    }
}
