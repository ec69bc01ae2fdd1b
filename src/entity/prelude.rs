//! 预导入模块，方便使用

pub use super::evaluations::{
    ActiveModel as EvaluationActiveModel, Entity as Evaluations, Model as EvaluationModel,
};
pub use super::exam_sessions::{
    ActiveModel as ExamSessionActiveModel, Entity as ExamSessions, Model as ExamSessionModel,
};
pub use super::exams::{ActiveModel as ExamActiveModel, Entity as Exams, Model as ExamModel};
pub use super::questions::{
    ActiveModel as QuestionActiveModel, Entity as Questions, Model as QuestionModel,
};
pub use super::responses::{
    ActiveModel as ResponseActiveModel, Entity as Responses, Model as ResponseModel,
};
