use chrono::{DateTime, Utc};

/// 考生对某道题的作答，(session_id, question_id) 唯一
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    pub answer_text: String,
    pub last_saved_at: DateTime<Utc>,
}
