use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::quiz::{QuizError, QuizSession};
use crate::model::score::Grade;

/// A question the user missed, with what they picked and why it was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncorrectAnswer {
    pub position: usize,
    pub question_id: QuestionId,
    pub question: String,
    pub selected: Option<usize>,
    pub correct: usize,
    pub correct_option: String,
    pub explanation: String,
}

/// Read-only result of a completed quiz.
///
/// Everything a certificate or report formatter needs, so formatters never
/// reach back into the quiz itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSummary {
    pub quiz_id: QuizId,
    pub user_name: String,
    pub course_name: String,
    pub category: String,
    pub difficulty: String,
    pub completed_at: DateTime<Utc>,
    pub completion_date: NaiveDate,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub grade: Grade,
    pub duration_minutes: u64,
    pub incorrect: Vec<IncorrectAnswer>,
}

impl QuizSummary {
    /// # Errors
    ///
    /// Returns `QuizError::NotCompleted` while the quiz is still open.
    pub fn from_quiz(quiz: &QuizSession, user_name: &str) -> Result<Self, QuizError> {
        let (Some(completed_at), Some(score)) = (quiz.completed_at(), quiz.score()) else {
            return Err(QuizError::NotCompleted);
        };
        let card = quiz.score_card();

        let incorrect = card
            .incorrect_questions()
            .map(|(position, q)| IncorrectAnswer {
                position,
                question_id: q.id().clone(),
                question: q.text().to_owned(),
                selected: quiz.answer_at(position),
                correct: q.correct_index(),
                correct_option: q.correct_option().to_owned(),
                explanation: q.explanation().to_owned(),
            })
            .collect();

        Ok(Self {
            quiz_id: quiz.id(),
            user_name: user_name.to_owned(),
            course_name: quiz.title().to_owned(),
            category: quiz.category().to_owned(),
            difficulty: quiz.difficulty().label().to_owned(),
            completed_at,
            completion_date: completed_at.date_naive(),
            score,
            total: card.total(),
            percentage: quiz.percentage(),
            grade: quiz.grade(),
            duration_minutes: card.duration_minutes(),
            incorrect,
        })
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.incorrect.is_empty()
    }
}
