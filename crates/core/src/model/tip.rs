use serde::{Deserialize, Serialize};

/// A single awareness tip shown alongside quizzes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub icon: String,
    pub title: String,
    pub description: String,
}

/// Tips grouped under one heading, e.g. "Password Security".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipCategory {
    pub category: String,
    pub tips: Vec<Tip>,
}

impl TipCategory {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }
}
