use std::fmt;

use rand::Rng;
use rand::rng;

use hygiene_core::Clock;
use hygiene_core::model::{
    Category, Certificate, CertificateId, DifficultyFilter, QuizId, QuizSession, QuizSettings,
    QuizSummary, UserStats, is_passing,
};

use super::plan::QuizBuilder;
use crate::error::SessionError;

/// Owns the active quiz and the lifetime statistics of one user.
///
/// Passed explicitly to whatever drives the quiz; there is no global
/// instance. Completing a quiz folds it into the statistics exactly once
/// because a completed quiz rejects a second `complete`.
pub struct SessionManager {
    clock: Clock,
    settings: QuizSettings,
    stats: UserStats,
    current: Option<QuizSession>,
}

impl SessionManager {
    #[must_use]
    pub fn new(clock: Clock, settings: QuizSettings, stats: UserStats) -> Self {
        Self {
            clock,
            settings,
            stats,
            current: None,
        }
    }

    /// Start a quiz drawn from `category`, replacing any active quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` when nothing matches `difficulty`.
    pub fn start_quiz(
        &mut self,
        category: &Category,
        difficulty: DifficultyFilter,
    ) -> Result<&QuizSession, SessionError> {
        let mut rng = rng();
        self.start_quiz_with_rng(category, difficulty, &mut rng)
    }

    /// As [`SessionManager::start_quiz`] with a caller-supplied generator.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` when nothing matches `difficulty`.
    pub fn start_quiz_with_rng<R: Rng + ?Sized>(
        &mut self,
        category: &Category,
        difficulty: DifficultyFilter,
        rng: &mut R,
    ) -> Result<&QuizSession, SessionError> {
        let plan = QuizBuilder::new(category, &difficulty)
            .with_settings(&self.settings)
            .build_with_rng(rng);
        if plan.is_empty() {
            return Err(SessionError::NoQuestions {
                category: category.name().to_owned(),
                difficulty: difficulty.label().to_owned(),
            });
        }

        let mut quiz = QuizSession::new(
            QuizId::generate(),
            format!("{} Quiz", category.name()),
            category.name(),
            difficulty,
            self.stats.user_id().clone(),
        );
        quiz.start(plan.questions, self.clock.now())?;
        log::info!(
            "quiz {} started: {} ({} questions, {})",
            quiz.id(),
            quiz.category(),
            quiz.total_questions(),
            quiz.difficulty()
        );

        if let Some(previous) = self.current.replace(quiz) {
            if !previous.is_completed() {
                log::debug!("discarded unfinished quiz {}", previous.id());
            }
        }
        self.current.as_ref().ok_or(SessionError::NoActiveQuiz)
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuizSession> {
        self.current.as_ref()
    }

    fn current_mut(&mut self) -> Result<&mut QuizSession, SessionError> {
        self.current.as_mut().ok_or(SessionError::NoActiveQuiz)
    }

    /// Record `option` for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveQuiz` without a quiz, or the quiz's own
    /// state error.
    pub fn answer(&mut self, option: usize) -> Result<(), SessionError> {
        self.current_mut()?.record_answer(option)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NoActiveQuiz` without a quiz, or the quiz's own
    /// state error.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        Ok(self.current_mut()?.advance()?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NoActiveQuiz` without a quiz, or the quiz's own
    /// state error.
    pub fn previous(&mut self) -> Result<bool, SessionError> {
        Ok(self.current_mut()?.retreat()?)
    }

    /// Complete the active quiz and fold its score into the user's statistics.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveQuiz` without a quiz and
    /// `SessionError::Quiz(QuizError::Completed)` when it was already completed;
    /// the statistics are left untouched in both cases.
    pub fn complete(&mut self) -> Result<QuizSummary, SessionError> {
        let now = self.clock.now();
        let quiz = self.current.as_mut().ok_or(SessionError::NoActiveQuiz)?;
        let score = quiz.complete(now)?;
        let total = u32::try_from(quiz.total_questions()).unwrap_or(u32::MAX);

        self.stats.update_stats(quiz.category(), score, total, now);
        log::info!(
            "quiz {} completed: {score}/{total} ({:.1}%, {})",
            quiz.id(),
            quiz.percentage(),
            quiz.grade()
        );

        Ok(QuizSummary::from_quiz(quiz, self.stats.user_name())?)
    }

    /// Summary of the completed active quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveQuiz` or `QuizError::NotCompleted`.
    pub fn summary(&self) -> Result<QuizSummary, SessionError> {
        let quiz = self.current.as_ref().ok_or(SessionError::NoActiveQuiz)?;
        Ok(QuizSummary::from_quiz(quiz, self.stats.user_name())?)
    }

    /// Issue a certificate for the completed active quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotPassing` below the passing percentage, and
    /// `CertificateError::QuizNotCompleted` for an open quiz.
    pub fn issue_certificate(&self) -> Result<Certificate, SessionError> {
        let quiz = self.current.as_ref().ok_or(SessionError::NoActiveQuiz)?;
        let certificate = Certificate::for_quiz(CertificateId::generate(), &self.stats, quiz)?;
        if !is_passing(certificate.score()) {
            return Err(SessionError::NotPassing(certificate.score()));
        }
        Ok(certificate)
    }

    /// Drop the active quiz without touching the statistics.
    pub fn discard(&mut self) -> Option<QuizSession> {
        self.current.take()
    }

    #[must_use]
    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Move the manager's clock, e.g. to simulate time spent answering.
    pub fn advance_clock(&mut self, delta: chrono::Duration) {
        self.clock.advance(delta);
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("user_id", self.stats.user_id())
            .field("current", &self.current.as_ref().map(QuizSession::id))
            .finish_non_exhaustive()
    }
}
