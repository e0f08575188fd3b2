#![forbid(unsafe_code)]

pub mod artifacts;
pub mod error;
pub mod sessions;

pub use hygiene_core::Clock;

pub use artifacts::{ArtifactRenderer, TextRenderer};
pub use error::{RenderError, SessionError};
pub use sessions::{QuizBuilder, QuizPlan, QuizService, SessionManager};
