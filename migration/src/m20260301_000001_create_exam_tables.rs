use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建考试表
        manager
            .create_table(
                Table::create()
                    .table(Exams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Exams::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Exams::Title).string().not_null())
                    .col(ColumnDef::new(Exams::Description).text().null())
                    .col(
                        ColumnDef::new(Exams::ScheduledStart)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Exams::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Exams::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(Exams::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建题目表
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::ExamId).big_integer().not_null())
                    .col(ColumnDef::new(Questions::Position).integer().not_null())
                    .col(ColumnDef::new(Questions::QuestionType).string().not_null())
                    .col(ColumnDef::new(Questions::Text).text().not_null())
                    .col(ColumnDef::new(Questions::Options).text().null())
                    .col(ColumnDef::new(Questions::CorrectAnswer).string().null())
                    .col(ColumnDef::new(Questions::MaxMarks).double().not_null())
                    .col(ColumnDef::new(Questions::WordLimit).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Questions::Table, Questions::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建考试会话表（作答记录）
        manager
            .create_table(
                Table::create()
                    .table(ExamSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExamSessions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExamSessions::ExamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamSessions::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamSessions::StartedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamSessions::ExpiresAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExamSessions::State).string().not_null())
                    .col(
                        ColumnDef::new(ExamSessions::SubmittedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ExamSessions::AutoSubmitted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ExamSessions::LastSavedAt)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExamSessions::Table, ExamSessions::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建作答表
        manager
            .create_table(
                Table::create()
                    .table(Responses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Responses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Responses::SessionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Responses::QuestionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Responses::AnswerText).text().not_null())
                    .col(
                        ColumnDef::new(Responses::LastSavedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Responses::Table, Responses::SessionId)
                            .to(ExamSessions::Table, ExamSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Responses::Table, Responses::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分表
        manager
            .create_table(
                Table::create()
                    .table(Evaluations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Evaluations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Evaluations::ResponseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Evaluations::MarksAwarded)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Evaluations::Feedback).text().null())
                    .col(ColumnDef::new(Evaluations::Evaluator).string().null())
                    .col(
                        ColumnDef::new(Evaluations::EvaluatorId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Evaluations::Status).string().not_null())
                    .col(
                        ColumnDef::new(Evaluations::EvaluatedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Evaluations::LastError).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Evaluations::Table, Evaluations::ResponseId)
                            .to(Responses::Table, Responses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 题目表索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_questions_exam_id")
                    .table(Questions::Table)
                    .col(Questions::ExamId)
                    .to_owned(),
            )
            .await?;

        // 每个学生每场考试只能有一次作答
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_exam_sessions_exam_student")
                    .table(ExamSessions::Table)
                    .col(ExamSessions::ExamId)
                    .col(ExamSessions::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_exam_sessions_state_expires_at")
                    .table(ExamSessions::Table)
                    .col(ExamSessions::State)
                    .col(ExamSessions::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // 每道题在一次作答中只保留一份答案
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_responses_session_question")
                    .table(Responses::Table)
                    .col(Responses::SessionId)
                    .col(Responses::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_evaluations_response_id")
                    .table(Evaluations::Table)
                    .col(Evaluations::ResponseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(Evaluations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Responses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExamSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exams::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Exams {
    #[sea_orm(iden = "exams")]
    Table,
    Id,
    Title,
    Description,
    ScheduledStart,
    DurationMinutes,
    OwnerId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    #[sea_orm(iden = "questions")]
    Table,
    Id,
    ExamId,
    Position,
    QuestionType,
    Text,
    Options,
    CorrectAnswer,
    MaxMarks,
    WordLimit,
}

#[derive(DeriveIden)]
enum ExamSessions {
    #[sea_orm(iden = "exam_sessions")]
    Table,
    Id,
    ExamId,
    StudentId,
    StartedAt,
    ExpiresAt,
    State,
    SubmittedAt,
    AutoSubmitted,
    LastSavedAt,
}

#[derive(DeriveIden)]
enum Responses {
    #[sea_orm(iden = "responses")]
    Table,
    Id,
    SessionId,
    QuestionId,
    AnswerText,
    LastSavedAt,
}

#[derive(DeriveIden)]
enum Evaluations {
    #[sea_orm(iden = "evaluations")]
    Table,
    Id,
    ResponseId,
    MarksAwarded,
    Feedback,
    Evaluator,
    EvaluatorId,
    Status,
    EvaluatedAt,
    LastError,
}
