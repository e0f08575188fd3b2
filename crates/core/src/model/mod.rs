mod catalog;
mod certificate;
mod ids;
mod question;
mod quiz;
mod score;
mod settings;
mod stats;
mod summary;
mod tip;

pub use ids::{CertificateId, ParseIdError, QuestionId, QuizId, UserId};

pub use catalog::{Category, CatalogError, QuestionBank};
pub use certificate::{Certificate, CertificateError};
pub use question::{DifficultyFilter, Question, QuestionDraft, QuestionError};
pub use quiz::{QuizError, QuizSession, QuizState};
pub use score::{Grade, PASSING_PERCENTAGE, ParseGradeError, ScoreCard, is_passing, percentage};
pub use settings::{DEFAULT_MAX_QUESTIONS, QuizSettings, SettingsError};
pub use stats::{CategoryPerformance, UserStats, UserStatsError};
pub use summary::{IncorrectAnswer, QuizSummary};
pub use tip::{Tip, TipCategory};
