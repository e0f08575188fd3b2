use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{QuizId, UserId};
use crate::model::question::{DifficultyFilter, Question};
use crate::model::score::{Grade, ScoreCard};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejections for operations attempted in the wrong quiz state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has not been started")]
    NotStarted,

    #[error("quiz already completed")]
    Completed,

    #[error("quiz has not been completed yet")]
    NotCompleted,

    #[error("quiz has no question at the current position")]
    NoQuestion,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz attempt. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    NotStarted,
    InProgress,
    Completed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a fixed, ordered set of questions.
///
/// The question list is a snapshot taken at `start`; it is never re-queried.
/// Answers are keyed by position and may be overwritten until the quiz is
/// completed, at which point the score is frozen together with the answers.
#[derive(Clone)]
pub struct QuizSession {
    id: QuizId,
    title: String,
    category: String,
    difficulty: DifficultyFilter,
    user_id: UserId,
    questions: Vec<Arc<Question>>,
    current: usize,
    answers: BTreeMap<usize, usize>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    score: Option<u32>,
}

impl QuizSession {
    /// Create a quiz in the `NotStarted` state.
    #[must_use]
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        category: impl Into<String>,
        difficulty: DifficultyFilter,
        user_id: UserId,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            category: category.into(),
            difficulty,
            user_id,
            questions: Vec::new(),
            current: 0,
            answers: BTreeMap::new(),
            started_at: None,
            completed_at: None,
            score: None,
        }
    }

    /// Load `questions` as this attempt's question set and begin the quiz.
    ///
    /// Calling `start` again on a quiz in progress discards the position and
    /// every recorded answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Completed` if the quiz is already finished.
    pub fn start(
        &mut self,
        questions: Vec<Arc<Question>>,
        started_at: DateTime<Utc>,
    ) -> Result<(), QuizError> {
        if self.is_completed() {
            return Err(QuizError::Completed);
        }
        self.questions = questions;
        self.current = 0;
        self.answers.clear();
        self.started_at = Some(started_at);
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        if self.completed_at.is_some() {
            QuizState::Completed
        } else if self.started_at.is_some() {
            QuizState::InProgress
        } else {
            QuizState::NotStarted
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state() == QuizState::Completed
    }

    fn ensure_in_progress(&self) -> Result<(), QuizError> {
        match self.state() {
            QuizState::InProgress => Ok(()),
            QuizState::NotStarted => Err(QuizError::NotStarted),
            QuizState::Completed => Err(QuizError::Completed),
        }
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> &DifficultyFilter {
        &self.difficulty
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current).map(Arc::as_ref)
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    /// The option recorded at `position`, if any.
    #[must_use]
    pub fn answer_at(&self, position: usize) -> Option<usize> {
        self.answers.get(&position).copied()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Final score, frozen at completion. `None` until then.
    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.score
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current + 1 < self.questions.len()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// Move to the next question. Returns whether the position changed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` or `QuizError::Completed` outside of
    /// the `InProgress` state.
    pub fn advance(&mut self) -> Result<bool, QuizError> {
        self.ensure_in_progress()?;
        if !self.has_next() {
            return Ok(false);
        }
        self.current += 1;
        Ok(true)
    }

    /// Move to the previous question. Returns whether the position changed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` or `QuizError::Completed` outside of
    /// the `InProgress` state.
    pub fn retreat(&mut self) -> Result<bool, QuizError> {
        self.ensure_in_progress()?;
        if !self.has_previous() {
            return Ok(false);
        }
        self.current -= 1;
        Ok(true)
    }

    /// Record `option` as the answer to the current question, replacing any
    /// earlier answer at this position.
    ///
    /// An index outside the question's options is kept as entered; it will
    /// simply never score.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestion` for an empty quiz, and
    /// `QuizError::NotStarted`/`QuizError::Completed` outside `InProgress`.
    pub fn record_answer(&mut self, option: usize) -> Result<(), QuizError> {
        self.ensure_in_progress()?;
        let question = self.current_question().ok_or(QuizError::NoQuestion)?;
        if !question.accepts_option(option) {
            log::warn!(
                "quiz {}: option {option} is out of range for question {} ({} options)",
                self.id,
                question.id(),
                question.options().len()
            );
        }
        self.answers.insert(self.current, option);
        Ok(())
    }

    /// Finish the quiz and freeze its score.
    ///
    /// A second call is rejected and leaves `completed_at` and the score as
    /// they were.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` before `start`, and
    /// `QuizError::Completed` if the quiz was already completed.
    pub fn complete(&mut self, completed_at: DateTime<Utc>) -> Result<u32, QuizError> {
        self.ensure_in_progress()?;
        let score = self.score_card().score();
        self.completed_at = Some(completed_at);
        self.score = Some(score);
        Ok(score)
    }

    /// Scoring view over the current questions and answers.
    #[must_use]
    pub fn score_card(&self) -> ScoreCard<'_> {
        ScoreCard::new(
            &self.questions,
            &self.answers,
            self.started_at,
            self.completed_at,
        )
    }

    /// Percentage of the frozen score, `0.0` before completion.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        match self.score {
            Some(score) => crate::model::score::percentage(
                score,
                u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
            ),
            None => 0.0,
        }
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        Grade::from_percentage(self.percentage())
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u64 {
        self.score_card().duration_minutes()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("difficulty", &self.difficulty)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("score", &self.score)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::tests::question;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn new_quiz() -> QuizSession {
        QuizSession::new(
            QuizId::generate(),
            "Phishing Quiz",
            "Phishing",
            DifficultyFilter::All,
            UserId::new("default_user").unwrap(),
        )
    }

    fn started_quiz(correct: &[usize]) -> QuizSession {
        let mut quiz = new_quiz();
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, c)| Arc::new(question(&format!("q{i}"), *c)))
            .collect();
        quiz.start(questions, fixed_now()).unwrap();
        quiz
    }

    #[test]
    fn new_quiz_rejects_interaction_before_start() {
        let mut quiz = new_quiz();
        assert_eq!(quiz.state(), QuizState::NotStarted);
        assert_eq!(quiz.advance().unwrap_err(), QuizError::NotStarted);
        assert_eq!(quiz.record_answer(0).unwrap_err(), QuizError::NotStarted);
        assert_eq!(quiz.complete(fixed_now()).unwrap_err(), QuizError::NotStarted);
        assert!(quiz.current_question().is_none());
    }

    #[test]
    fn navigation_is_clamped() {
        let mut quiz = started_quiz(&[0, 1, 2]);
        assert_eq!(quiz.state(), QuizState::InProgress);
        assert!(!quiz.has_previous());
        assert!(!quiz.retreat().unwrap());
        assert_eq!(quiz.current_index(), 0);

        assert!(quiz.advance().unwrap());
        assert!(quiz.advance().unwrap());
        assert!(!quiz.has_next());
        assert!(!quiz.advance().unwrap());
        assert_eq!(quiz.current_index(), 2);
        assert_eq!(quiz.current_question().unwrap().id().as_str(), "q2");

        assert!(quiz.retreat().unwrap());
        assert_eq!(quiz.current_index(), 1);
    }

    #[test]
    fn answers_overwrite_at_current_position() {
        let mut quiz = started_quiz(&[0, 1]);
        quiz.record_answer(3).unwrap();
        quiz.record_answer(0).unwrap();
        quiz.advance().unwrap();
        quiz.record_answer(1).unwrap();

        assert_eq!(quiz.answer_at(0), Some(0));
        assert_eq!(quiz.answer_at(1), Some(1));
        assert_eq!(quiz.answered_count(), 2);
    }

    #[test]
    fn out_of_range_answer_is_kept_but_never_scores() {
        let mut quiz = started_quiz(&[1]);
        quiz.record_answer(9).unwrap();
        assert_eq!(quiz.answer_at(0), Some(9));
        assert_eq!(quiz.complete(fixed_now()).unwrap(), 0);
    }

    #[test]
    fn complete_scores_unanswered_as_incorrect() {
        let mut quiz = started_quiz(&[0, 1, 2, 3]);
        quiz.record_answer(0).unwrap();
        quiz.advance().unwrap();
        quiz.record_answer(1).unwrap();
        quiz.advance().unwrap();
        quiz.record_answer(0).unwrap();

        let end = fixed_now() + Duration::minutes(4);
        assert_eq!(quiz.complete(end).unwrap(), 2);
        assert_eq!(quiz.score(), Some(2));
        assert_eq!(quiz.percentage(), 50.0);
        assert_eq!(quiz.grade(), Grade::CPlus);
        assert_eq!(quiz.duration_minutes(), 4);
        assert_eq!(quiz.state(), QuizState::Completed);
    }

    #[test]
    fn second_complete_keeps_score_and_end_time() {
        let mut quiz = started_quiz(&[0, 1]);
        quiz.record_answer(0).unwrap();
        let end = fixed_now() + Duration::minutes(1);
        quiz.complete(end).unwrap();

        let later = end + Duration::minutes(10);
        assert_eq!(quiz.complete(later).unwrap_err(), QuizError::Completed);
        assert_eq!(quiz.completed_at(), Some(end));
        assert_eq!(quiz.score(), Some(1));
    }

    #[test]
    fn completed_quiz_is_frozen() {
        let mut quiz = started_quiz(&[0, 1]);
        quiz.record_answer(0).unwrap();
        quiz.complete(fixed_now()).unwrap();

        assert_eq!(quiz.record_answer(1).unwrap_err(), QuizError::Completed);
        assert_eq!(quiz.advance().unwrap_err(), QuizError::Completed);
        assert_eq!(quiz.retreat().unwrap_err(), QuizError::Completed);
        assert_eq!(
            quiz.start(Vec::new(), fixed_now()).unwrap_err(),
            QuizError::Completed
        );
        assert_eq!(quiz.score(), Some(1));
        assert_eq!(quiz.score_card().score(), 1);
    }

    #[test]
    fn restart_resets_position_and_answers() {
        let mut quiz = started_quiz(&[0, 1]);
        quiz.record_answer(0).unwrap();
        quiz.advance().unwrap();

        let questions = quiz.questions().to_vec();
        let restart_at = fixed_now() + Duration::minutes(2);
        quiz.start(questions, restart_at).unwrap();

        assert_eq!(quiz.current_index(), 0);
        assert!(quiz.answers().is_empty());
        assert_eq!(quiz.started_at(), Some(restart_at));
    }

    #[test]
    fn empty_quiz_has_no_current_question() {
        let mut quiz = started_quiz(&[]);
        assert!(quiz.current_question().is_none());
        assert!(!quiz.has_next());
        assert_eq!(quiz.record_answer(0).unwrap_err(), QuizError::NoQuestion);
        assert_eq!(quiz.complete(fixed_now()).unwrap(), 0);
        assert_eq!(quiz.percentage(), 0.0);
    }
}
