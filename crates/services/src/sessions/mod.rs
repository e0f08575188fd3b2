mod manager;
mod plan;
mod service;

// Public API of the quiz session subsystem.
pub use crate::error::SessionError;
pub use manager::SessionManager;
pub use plan::{QuizBuilder, QuizPlan};
pub use service::QuizService;
