pub mod evaluations;
pub mod exam_sessions;
pub mod results;

pub use evaluations::EvaluationService;
pub use exam_sessions::ExamSessionService;
pub use results::ResultService;
