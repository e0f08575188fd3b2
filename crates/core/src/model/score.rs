use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::question::Question;
use crate::time::whole_minutes_between;

/// Percentage at or above which a quiz counts as passed.
pub const PASSING_PERCENTAGE: f64 = 60.0;

/// `score / total * 100`, or `0.0` for an empty quiz.
#[must_use]
pub fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(total) * 100.0
}

#[must_use]
pub fn is_passing(percentage: f64) -> bool {
    percentage >= PASSING_PERCENTAGE
}

//
// ─── GRADE ─────────────────────────────────────────────────────────────────────
//

/// Letter grade derived from a percentage. Bands are closed at the lower bound.
///
/// | band  | percentage |
/// |-------|------------|
/// | `A+`  | ≥ 90       |
/// | `A`   | ≥ 80       |
/// | `B+`  | ≥ 70       |
/// | `B`   | ≥ 60       |
/// | `C+`  | ≥ 50       |
/// | `C`   | ≥ 40       |
/// | `F`   | otherwise  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "F")]
    F,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    /// Maps a percentage onto the grade table. `NaN` grades as `F`.
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::APlus
        } else if percentage >= 80.0 {
            Self::A
        } else if percentage >= 70.0 {
            Self::BPlus
        } else if percentage >= 60.0 {
            Self::B
        } else if percentage >= 50.0 {
            Self::CPlus
        } else if percentage >= 40.0 {
            Self::C
        } else {
            Self::F
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::F => "F",
        }
    }

    /// Short feedback line printed next to the grade on certificates.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Grade::APlus => "Excellent - Outstanding performance!",
            Grade::A => "Very Good - Great job!",
            Grade::BPlus => "Good - Well done!",
            Grade::B => "Satisfactory - Good effort!",
            Grade::CPlus => "Fair - Keep practicing!",
            Grade::C => "Pass - Room for improvement",
            Grade::F => "Needs Improvement - Try again!",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored grade label is not part of the grade table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown grade label: {0}")]
pub struct ParseGradeError(pub String);

impl FromStr for Grade {
    type Err = ParseGradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A+" => Ok(Grade::APlus),
            "A" => Ok(Grade::A),
            "B+" => Ok(Grade::BPlus),
            "B" => Ok(Grade::B),
            "C+" => Ok(Grade::CPlus),
            "C" => Ok(Grade::C),
            "F" => Ok(Grade::F),
            other => Err(ParseGradeError(other.to_owned())),
        }
    }
}

//
// ─── SCORE CARD ────────────────────────────────────────────────────────────────
//

/// Read-only scoring view over a quiz's questions and recorded answers.
///
/// Positions without an answer count as incorrect, so every accessor is total.
#[derive(Debug, Clone, Copy)]
pub struct ScoreCard<'a> {
    questions: &'a [Arc<Question>],
    answers: &'a BTreeMap<usize, usize>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl<'a> ScoreCard<'a> {
    #[must_use]
    pub fn new(
        questions: &'a [Arc<Question>],
        answers: &'a BTreeMap<usize, usize>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            questions,
            answers,
            started_at,
            completed_at,
        }
    }

    fn answered_correctly(&self, position: usize, question: &Question) -> bool {
        self.answers
            .get(&position)
            .is_some_and(|&answer| question.is_correct(answer))
    }

    /// Number of positions whose recorded answer matches the correct option.
    #[must_use]
    pub fn score(&self) -> u32 {
        let correct = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| self.answered_correctly(*i, q))
            .count();
        u32::try_from(correct).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        percentage(self.score(), self.total())
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        Grade::from_percentage(self.percentage())
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        is_passing(self.percentage())
    }

    /// Questions answered wrongly or left unanswered, in quiz order.
    ///
    /// Each call yields a fresh iterator.
    pub fn incorrect_questions(self) -> impl Iterator<Item = (usize, &'a Question)> + 'a {
        let answers = self.answers;
        self.questions
            .iter()
            .enumerate()
            .filter(move |(i, q)| !answers.get(i).is_some_and(|&a| q.is_correct(a)))
            .map(|(i, q)| (i, &**q))
    }

    /// Whole minutes between start and completion; `0` while either is missing.
    #[must_use]
    pub fn duration_minutes(&self) -> u64 {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => whole_minutes_between(start, end),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::tests::question;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn questions(correct: &[usize]) -> Vec<Arc<Question>> {
        correct
            .iter()
            .enumerate()
            .map(|(i, c)| Arc::new(question(&format!("q{i}"), *c)))
            .collect()
    }

    #[test]
    fn percentage_of_empty_quiz_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 4), 75.0);
    }

    #[test]
    fn grade_bands_are_closed_below() {
        assert_eq!(Grade::from_percentage(90.0), Grade::APlus);
        assert_eq!(Grade::from_percentage(89.9), Grade::A);
        assert_eq!(Grade::from_percentage(80.0), Grade::A);
        assert_eq!(Grade::from_percentage(70.0), Grade::BPlus);
        assert_eq!(Grade::from_percentage(60.0), Grade::B);
        assert_eq!(Grade::from_percentage(59.99), Grade::CPlus);
        assert_eq!(Grade::from_percentage(50.0), Grade::CPlus);
        assert_eq!(Grade::from_percentage(40.0), Grade::C);
        assert_eq!(Grade::from_percentage(39.9), Grade::F);
        assert_eq!(Grade::from_percentage(f64::NAN), Grade::F);
    }

    #[test]
    fn grade_labels_parse_back() {
        for grade in [
            Grade::APlus,
            Grade::A,
            Grade::BPlus,
            Grade::B,
            Grade::CPlus,
            Grade::C,
            Grade::F,
        ] {
            assert_eq!(grade.as_str().parse::<Grade>().unwrap(), grade);
        }
        assert!("D".parse::<Grade>().is_err());
        assert!(Grade::APlus > Grade::B);
    }

    #[test]
    fn score_counts_matching_answers_only() {
        let qs = questions(&[0, 1, 2, 3]);
        let answers = BTreeMap::from([(0, 0), (1, 0), (3, 3)]);
        let card = ScoreCard::new(&qs, &answers, None, None);

        assert_eq!(card.score(), 2);
        assert_eq!(card.total(), 4);
        assert_eq!(card.percentage(), 50.0);
        assert_eq!(card.grade(), Grade::CPlus);
        assert!(!card.passed());
    }

    #[test]
    fn out_of_range_answer_never_counts() {
        let qs = questions(&[1]);
        let answers = BTreeMap::from([(0, 42)]);
        let card = ScoreCard::new(&qs, &answers, None, None);
        assert_eq!(card.score(), 0);
        assert_eq!(card.incorrect_questions().count(), 1);
    }

    #[test]
    fn incorrect_questions_keep_order_and_include_unanswered() {
        let qs = questions(&[0, 1, 2, 3]);
        let answers = BTreeMap::from([(0, 0), (1, 3)]);
        let card = ScoreCard::new(&qs, &answers, None, None);

        let ids: Vec<_> = card
            .incorrect_questions()
            .map(|(_, q)| q.id().as_str())
            .collect();
        assert_eq!(ids, ["q1", "q2", "q3"]);
        // restartable
        assert_eq!(card.incorrect_questions().count(), 3);
    }

    #[test]
    fn duration_needs_both_timestamps() {
        let qs = questions(&[0]);
        let answers = BTreeMap::new();
        let start = fixed_now();
        let open = ScoreCard::new(&qs, &answers, Some(start), None);
        assert_eq!(open.duration_minutes(), 0);

        let done = ScoreCard::new(&qs, &answers, Some(start), Some(start + Duration::seconds(330)));
        assert_eq!(done.duration_minutes(), 5);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let qs: Vec<Arc<Question>> = Vec::new();
        let answers = BTreeMap::new();
        let card = ScoreCard::new(&qs, &answers, None, None);
        assert_eq!(card.score(), 0);
        assert_eq!(card.percentage(), 0.0);
        assert_eq!(card.grade(), Grade::F);
    }
}
