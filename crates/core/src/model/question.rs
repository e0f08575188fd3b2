use std::fmt;

use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least two options, got {len}")]
    TooFewOptions { len: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct option {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("question category cannot be empty")]
    EmptyCategory,

    #[error("question difficulty cannot be empty")]
    EmptyDifficulty,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question fields as they come out of a question store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
    pub category: String,
    pub difficulty: String,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// Text, category and difficulty are trimmed. Options keep their wording
    /// but must not be blank.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if any field violates the question schema.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let text = self.text.trim().to_owned();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let len = self.options.len();
        if len < 2 {
            return Err(QuestionError::TooFewOptions { len });
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        if self.correct_index >= len {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
                len,
            });
        }

        let category = self.category.trim().to_owned();
        if category.is_empty() {
            return Err(QuestionError::EmptyCategory);
        }
        let difficulty = self.difficulty.trim().to_owned();
        if difficulty.is_empty() {
            return Err(QuestionError::EmptyDifficulty);
        }

        Ok(Question {
            id: self.id,
            text,
            options: self.options,
            correct_index: self.correct_index,
            explanation: self.explanation.trim().to_owned(),
            category,
            difficulty,
        })
    }
}

/// A multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: String,
    category: String,
    difficulty: String,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    /// Returns true when `option` is a valid index into this question's options.
    #[must_use]
    pub fn accepts_option(&self, option: usize) -> bool {
        option < self.options.len()
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }
}

//
// ─── DIFFICULTY FILTER ─────────────────────────────────────────────────────────
//

/// Difficulty selection for a new quiz: every question, or one difficulty label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DifficultyFilter {
    #[default]
    All,
    Only(String),
}

impl DifficultyFilter {
    /// Label used by question stores for the unfiltered selection.
    pub const ALL_LABEL: &'static str = "All";

    /// Parses a user-facing label; `"All"` (or a blank label) selects everything.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == Self::ALL_LABEL {
            Self::All
        } else {
            Self::Only(label.to_owned())
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            DifficultyFilter::All => Self::ALL_LABEL,
            DifficultyFilter::Only(label) => label,
        }
    }

    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            DifficultyFilter::All => true,
            DifficultyFilter::Only(label) => question.difficulty() == label,
        }
    }
}

impl fmt::Display for DifficultyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
