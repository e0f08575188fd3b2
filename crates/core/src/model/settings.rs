use thiserror::Error;

/// Upper bound on questions per quiz when nothing else is configured.
pub const DEFAULT_MAX_QUESTIONS: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("max questions per quiz must be greater than zero")]
    InvalidMaxQuestions,
}

/// Knobs for building new quizzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    max_questions: usize,
}

impl QuizSettings {
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidMaxQuestions` when `max_questions` is zero.
    pub fn new(max_questions: usize) -> Result<Self, SettingsError> {
        if max_questions == 0 {
            return Err(SettingsError::InvalidMaxQuestions);
        }
        Ok(Self { max_questions })
    }

    #[must_use]
    pub fn max_questions(&self) -> usize {
        self.max_questions
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_caps_at_ten() {
        assert_eq!(QuizSettings::default().max_questions(), 10);
    }

    #[test]
    fn zero_is_rejected() {
        assert_eq!(
            QuizSettings::new(0).unwrap_err(),
            SettingsError::InvalidMaxQuestions
        );
        assert_eq!(QuizSettings::new(3).unwrap().max_questions(), 3);
    }
}
