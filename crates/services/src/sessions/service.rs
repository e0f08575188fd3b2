use std::path::PathBuf;
use std::sync::Arc;

use hygiene_core::Clock;
use hygiene_core::model::{
    Category, Certificate, DifficultyFilter, Question, QuizId, QuizSettings, QuizSummary, UserId,
    UserStats,
};
use storage::repository::{
    CertificateRepository, QuestionRepository, Storage, UserStatsRepository,
};

use super::manager::SessionManager;
use crate::artifacts::ArtifactRenderer;
use crate::error::SessionError;

/// Orchestrates quizzes against the question, statistics and certificate
/// repositories.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    settings: QuizSettings,
    questions: Arc<dyn QuestionRepository>,
    stats: Arc<dyn UserStatsRepository>,
    certificates: Arc<dyn CertificateRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        stats: Arc<dyn UserStatsRepository>,
        certificates: Arc<dyn CertificateRepository>,
    ) -> Self {
        Self {
            clock,
            settings: QuizSettings::default(),
            questions,
            stats,
            certificates,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.stats),
            Arc::clone(&storage.certificates),
        )
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Category names in bank order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the names cannot be read.
    pub async fn categories(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.questions.list_category_names().await?)
    }

    async fn category(&self, name: &str) -> Result<Category, SessionError> {
        self.questions
            .get_category(name)
            .await?
            .ok_or_else(|| SessionError::UnknownCategory(name.to_owned()))
    }

    /// # Errors
    ///
    /// Returns `SessionError::UnknownCategory` for a category not in the bank.
    pub async fn category_description(&self, name: &str) -> Result<String, SessionError> {
        Ok(self.category(name).await?.description().to_owned())
    }

    /// Every question of `category` matching `difficulty`, in bank order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownCategory` for a category not in the bank.
    pub async fn questions_for(
        &self,
        category: &str,
        difficulty: &DifficultyFilter,
    ) -> Result<Vec<Arc<Question>>, SessionError> {
        let category = self.category(category).await?;
        Ok(category.filtered(difficulty).cloned().collect())
    }

    /// Load (or create) the statistics for a user and wrap them in a manager.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Stats` for a blank name of a first-time user, or
    /// `SessionError::Storage` when loading fails.
    pub async fn open_session(
        &self,
        user_id: UserId,
        user_name: &str,
    ) -> Result<SessionManager, SessionError> {
        let stats = match self.stats.get_stats(&user_id).await? {
            Some(stats) => stats,
            None => {
                log::info!("creating statistics for new user {user_id}");
                UserStats::new(user_id, user_name)?
            }
        };
        Ok(SessionManager::new(self.clock, self.settings, stats))
    }

    /// Stored statistics for a user, if any quiz was ever completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when loading fails.
    pub async fn stats_for(&self, user_id: &UserId) -> Result<Option<UserStats>, SessionError> {
        Ok(self.stats.get_stats(user_id).await?)
    }

    /// Start a quiz for `category` on `manager`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownCategory` or `SessionError::NoQuestions`
    /// when no quiz can start.
    pub async fn start_quiz(
        &self,
        manager: &mut SessionManager,
        category: &str,
        difficulty: DifficultyFilter,
    ) -> Result<QuizId, SessionError> {
        let category = self.category(category).await?;
        let quiz = manager.start_quiz(&category, difficulty)?;
        Ok(quiz.id())
    }

    /// Complete the active quiz and persist the updated statistics.
    ///
    /// If persisting fails the statistics are already folded in `manager`;
    /// retry with [`QuizService::save_stats`].
    ///
    /// # Errors
    ///
    /// Returns the manager's completion error, or `SessionError::Storage`.
    pub async fn complete_quiz(
        &self,
        manager: &mut SessionManager,
    ) -> Result<QuizSummary, SessionError> {
        let summary = manager.complete()?;
        self.save_stats(manager).await?;
        Ok(summary)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the statistics cannot be stored.
    pub async fn save_stats(&self, manager: &SessionManager) -> Result<(), SessionError> {
        let stats = manager.stats();
        self.stats.upsert_stats(stats).await?;
        log::info!(
            "saved statistics for {}: {} quizzes, {:.1}% average",
            stats.user_id(),
            stats.total_sessions(),
            stats.average_score()
        );
        Ok(())
    }

    /// Issue, render and store a certificate for the completed active quiz.
    ///
    /// A renderer failure is logged and the certificate is kept un-generated;
    /// it is still stored and returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotPassing` below the passing percentage, or
    /// `SessionError::Storage` if the certificate cannot be stored.
    pub async fn issue_certificate(
        &self,
        manager: &SessionManager,
        renderer: &dyn ArtifactRenderer,
    ) -> Result<Certificate, SessionError> {
        let mut certificate = manager.issue_certificate()?;
        match renderer.render_certificate(&certificate) {
            Ok(path) => certificate.mark_generated(path)?,
            Err(e) => log::warn!("certificate {} was not rendered: {e}", certificate.id()),
        }
        self.certificates.append_certificate(&certificate).await?;
        log::info!(
            "issued certificate {} for {} ({})",
            certificate.id(),
            certificate.course_name(),
            certificate.formatted_score()
        );
        Ok(certificate)
    }

    /// Render the report of the completed active quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Render` if the renderer fails.
    pub fn write_report(
        &self,
        manager: &SessionManager,
        renderer: &dyn ArtifactRenderer,
    ) -> Result<PathBuf, SessionError> {
        let summary = manager.summary()?;
        Ok(renderer.render_report(&summary)?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` when loading fails.
    pub async fn certificates(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Certificate>, SessionError> {
        Ok(self.certificates.list_certificates(user_id, limit).await?)
    }
}
