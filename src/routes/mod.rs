pub mod evaluations;

pub mod exams;

pub mod results;

pub mod sessions;

pub use evaluations::configure_evaluation_routes;
pub use exams::configure_exam_routes;
pub use sessions::configure_session_routes;
