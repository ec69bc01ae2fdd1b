//! 考试与题目存储操作

use super::SeaOrmStorage;
use crate::entity::exams::{ActiveModel, Column, Entity as Exams};
use crate::entity::questions::{
    ActiveModel as QuestionActiveModel, Column as QuestionColumn, Entity as Questions,
};
use crate::errors::{ExamSystemError, Result};
use crate::models::exams::{
    entities::{Exam, Question},
    requests::CreateExamRequest,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建考试及题目（同一事务）
    pub async fn create_exam_impl(&self, req: CreateExamRequest) -> Result<(Exam, Vec<Question>)> {
        req.validate()?;
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let exam = ActiveModel {
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            scheduled_start: Set(req.scheduled_start),
            duration_minutes: Set(req.duration_minutes),
            owner_id: Set(req.owner_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ExamSystemError::database_operation(format!("创建考试失败: {e}")))?;

        let mut questions = Vec::with_capacity(req.questions.len());
        for (index, q) in req.questions.into_iter().enumerate() {
            let options = q.options.as_ref().map(serde_json::to_string).transpose()?;
            let model = QuestionActiveModel {
                exam_id: Set(exam.id),
                position: Set(index as i32 + 1),
                question_type: Set(q.question_type.to_string()),
                text: Set(q.text),
                options: Set(options),
                correct_answer: Set(q.correct_answer.map(|c| c.trim().to_string())),
                max_marks: Set(q.max_marks),
                word_limit: Set(q.word_limit),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("创建题目失败: {e}")))?;
            questions.push(model.into_question());
        }

        txn.commit()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok((exam.into_exam(), questions))
    }

    /// 通过 ID 获取考试
    pub async fn get_exam_by_id_impl(&self, exam_id: i64) -> Result<Option<Exam>> {
        let result = Exams::find_by_id(exam_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询考试失败: {e}")))?;

        Ok(result.map(|m| m.into_exam()))
    }

    /// 通过标题与出题人查找考试
    pub async fn find_exam_by_title_and_owner_impl(
        &self,
        title: &str,
        owner_id: i64,
    ) -> Result<Option<Exam>> {
        let result = Exams::find()
            .filter(Column::Title.eq(title.trim()))
            .filter(Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询考试失败: {e}")))?;

        Ok(result.map(|m| m.into_exam()))
    }

    /// 按顺序列出考试题目
    pub async fn list_exam_questions_impl(&self, exam_id: i64) -> Result<Vec<Question>> {
        let results = Questions::find()
            .filter(QuestionColumn::ExamId.eq(exam_id))
            .order_by_asc(QuestionColumn::Position)
            .order_by_asc(QuestionColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询题目列表失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_question()).collect())
    }

    /// 通过 ID 获取题目
    pub async fn get_question_by_id_impl(&self, question_id: i64) -> Result<Option<Question>> {
        let result = Questions::find_by_id(question_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询题目失败: {e}")))?;

        Ok(result.map(|m| m.into_question()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exams::entities::QuestionType;
    use crate::test_support::{memory_storage, sample_exam};

    #[tokio::test]
    async fn test_create_exam_keeps_question_order_and_options() {
        let storage = memory_storage().await;
        let (exam, questions) = storage
            .create_exam_impl(sample_exam(1_700_000_000))
            .await
            .unwrap();

        assert_eq!(exam.duration_minutes, 30);
        assert_eq!(questions.len(), 3);

        let listed = storage.list_exam_questions_impl(exam.id).await.unwrap();
        assert_eq!(listed, questions);
        assert_eq!(listed[0].question_type, QuestionType::Mcq);
        assert_eq!(
            listed[0].options.as_ref().and_then(|o| o.get("A")).map(String::as_str),
            Some("move")
        );
        assert_eq!(listed[2].position, 3);
    }

    #[tokio::test]
    async fn test_find_exam_by_title_and_owner() {
        let storage = memory_storage().await;
        let (exam, _) = storage
            .create_exam_impl(sample_exam(1_700_000_000))
            .await
            .unwrap();

        let found = storage
            .find_exam_by_title_and_owner_impl("Systems Programming Midterm", 7)
            .await
            .unwrap();
        assert_eq!(found.map(|e| e.id), Some(exam.id));

        let other_owner = storage
            .find_exam_by_title_and_owner_impl("Systems Programming Midterm", 8)
            .await
            .unwrap();
        assert!(other_owner.is_none());
    }

    #[tokio::test]
    async fn test_invalid_exam_is_not_written() {
        let storage = memory_storage().await;
        let mut req = sample_exam(1_700_000_000);
        req.questions[0].correct_answer = Some("Z".to_string());

        let err = storage.create_exam_impl(req).await.unwrap_err();
        assert_eq!(err.code(), "E010");
        assert!(
            storage
                .find_exam_by_title_and_owner_impl("Systems Programming Midterm", 7)
                .await
                .unwrap()
                .is_none()
        );
    }
}
