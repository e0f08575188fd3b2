use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::score::{is_passing, percentage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserStatsError {
    #[error("display name cannot be empty")]
    EmptyName,

    #[error("correct answers ({correct}) exceed questions answered ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("longest streak ({longest}) is below current streak ({current})")]
    StreakMismatch { current: u32, longest: u32 },
}

/// Accuracy of one category, ready for charts and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub correct: u32,
    pub attempts: u32,
    pub accuracy: f64,
}

/// Lifetime quiz statistics for one user.
///
/// Category attempts count quizzes while category correct counts questions,
/// so `category_accuracy` is "correct answers per attempt" and can exceed 100.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    user_id: UserId,
    user_name: String,
    total_sessions: u32,
    total_questions: u32,
    total_correct: u32,
    category_correct: BTreeMap<String, u32>,
    category_attempts: BTreeMap<String, u32>,
    last_session_at: Option<DateTime<Utc>>,
    current_streak: u32,
    longest_streak: u32,
}

impl UserStats {
    /// Zeroed statistics for a first-time user.
    ///
    /// # Errors
    ///
    /// Returns `UserStatsError::EmptyName` for a blank display name.
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> Result<Self, UserStatsError> {
        let user_name = user_name.into().trim().to_owned();
        if user_name.is_empty() {
            return Err(UserStatsError::EmptyName);
        }
        Ok(Self {
            user_id,
            user_name,
            total_sessions: 0,
            total_questions: 0,
            total_correct: 0,
            category_correct: BTreeMap::new(),
            category_attempts: BTreeMap::new(),
            last_session_at: None,
            current_streak: 0,
            longest_streak: 0,
        })
    }

    /// Rehydrate statistics from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `UserStatsError` if the counters contradict each other.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        user_name: String,
        total_sessions: u32,
        total_questions: u32,
        total_correct: u32,
        category_correct: BTreeMap<String, u32>,
        category_attempts: BTreeMap<String, u32>,
        last_session_at: Option<DateTime<Utc>>,
        current_streak: u32,
        longest_streak: u32,
    ) -> Result<Self, UserStatsError> {
        if total_correct > total_questions {
            return Err(UserStatsError::CorrectExceedsTotal {
                correct: total_correct,
                total: total_questions,
            });
        }
        if longest_streak < current_streak {
            return Err(UserStatsError::StreakMismatch {
                current: current_streak,
                longest: longest_streak,
            });
        }
        let mut stats = Self::new(user_id, user_name)?;
        stats.total_sessions = total_sessions;
        stats.total_questions = total_questions;
        stats.total_correct = total_correct;
        stats.category_correct = category_correct;
        stats.category_attempts = category_attempts;
        stats.last_session_at = last_session_at;
        stats.current_streak = current_streak;
        stats.longest_streak = longest_streak;
        Ok(stats)
    }

    /// Fold one completed quiz into the lifetime totals.
    ///
    /// A quiz at or above the passing percentage extends the current streak;
    /// any other quiz resets it.
    pub fn update_stats(
        &mut self,
        category: &str,
        session_score: u32,
        question_count: u32,
        completed_at: DateTime<Utc>,
    ) {
        let session_score = session_score.min(question_count);
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.total_questions = self.total_questions.saturating_add(question_count);
        self.total_correct = self.total_correct.saturating_add(session_score);

        let correct = self.category_correct.entry(category.to_owned()).or_insert(0);
        *correct = correct.saturating_add(session_score);
        let attempts = self.category_attempts.entry(category.to_owned()).or_insert(0);
        *attempts = attempts.saturating_add(1);

        self.last_session_at = Some(completed_at);

        if is_passing(percentage(session_score, question_count)) {
            self.current_streak = self.current_streak.saturating_add(1);
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn total_sessions(&self) -> u32 {
        self.total_sessions
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn total_incorrect(&self) -> u32 {
        self.total_questions - self.total_correct
    }

    /// `total_correct / total_questions * 100`, or `0.0` before any answers.
    #[must_use]
    pub fn average_score(&self) -> f64 {
        percentage(self.total_correct, self.total_questions)
    }

    #[must_use]
    pub fn last_session_at(&self) -> Option<DateTime<Utc>> {
        self.last_session_at
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    #[must_use]
    pub fn category_correct(&self, category: &str) -> u32 {
        self.category_correct.get(category).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn category_attempts(&self, category: &str) -> u32 {
        self.category_attempts.get(category).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn category_correct_map(&self) -> &BTreeMap<String, u32> {
        &self.category_correct
    }

    #[must_use]
    pub fn category_attempts_map(&self) -> &BTreeMap<String, u32> {
        &self.category_attempts
    }

    #[must_use]
    pub fn category_accuracy(&self, category: &str) -> f64 {
        percentage(
            self.category_correct(category),
            self.category_attempts(category),
        )
    }

    /// Per-category counters for every category attempted, sorted by name.
    #[must_use]
    pub fn category_breakdown(&self) -> Vec<CategoryPerformance> {
        self.category_attempts
            .keys()
            .map(|category| CategoryPerformance {
                category: category.clone(),
                correct: self.category_correct(category),
                attempts: self.category_attempts(category),
                accuracy: self.category_accuracy(category),
            })
            .collect()
    }

    /// True once every named category has at least one attempt.
    pub fn has_completed_all_categories<'a>(
        &self,
        categories: impl IntoIterator<Item = &'a str>,
    ) -> bool {
        let mut any = false;
        for category in categories {
            any = true;
            if self.category_attempts(category) == 0 {
                return false;
            }
        }
        any
    }
}
