use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ids::{CertificateId, UserId};
use crate::model::quiz::QuizSession;
use crate::model::score::{Grade, is_passing};
use crate::model::stats::UserStats;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CertificateError {
    #[error("certificates can only be issued for completed quizzes")]
    QuizNotCompleted,

    #[error("certificate score must be between 0 and 100, got {0}")]
    InvalidScore(f64),

    #[error("certificate artifact was already generated")]
    AlreadyGenerated,
}

fn checked_score(score: f64) -> Result<f64, CertificateError> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(score)
    } else {
        Err(CertificateError::InvalidScore(score))
    }
}

//
// ─── CERTIFICATE ───────────────────────────────────────────────────────────────
//

/// Proof of completion for a quiz. The grade always follows the score.
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    id: CertificateId,
    user_id: UserId,
    user_name: String,
    course_name: String,
    category: String,
    completion_date: NaiveDate,
    score: f64,
    grade: Grade,
    artifact_path: Option<PathBuf>,
    generated: bool,
}

impl Certificate {
    /// # Errors
    ///
    /// Returns `CertificateError::InvalidScore` unless `score` is within `0..=100`.
    pub fn new(
        id: CertificateId,
        user_id: UserId,
        user_name: impl Into<String>,
        course_name: impl Into<String>,
        category: impl Into<String>,
        completion_date: NaiveDate,
        score: f64,
    ) -> Result<Self, CertificateError> {
        let score = checked_score(score)?;
        Ok(Self {
            id,
            user_id,
            user_name: user_name.into(),
            course_name: course_name.into(),
            category: category.into(),
            completion_date,
            score,
            grade: Grade::from_percentage(score),
            artifact_path: None,
            generated: false,
        })
    }

    /// Build a certificate for a finished quiz, named after the quiz title.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::QuizNotCompleted` if `quiz` is still open.
    pub fn for_quiz(
        id: CertificateId,
        stats: &UserStats,
        quiz: &QuizSession,
    ) -> Result<Self, CertificateError> {
        let completed_at = quiz
            .completed_at()
            .ok_or(CertificateError::QuizNotCompleted)?;
        Self::new(
            id,
            stats.user_id().clone(),
            stats.user_name(),
            quiz.title(),
            quiz.category(),
            completed_at.date_naive(),
            quiz.percentage(),
        )
    }

    /// Rehydrate a certificate from persisted storage. The grade is
    /// recomputed from the score.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::InvalidScore` for an out-of-range score.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: CertificateId,
        user_id: UserId,
        user_name: String,
        course_name: String,
        category: String,
        completion_date: NaiveDate,
        score: f64,
        artifact_path: Option<PathBuf>,
    ) -> Result<Self, CertificateError> {
        let mut certificate = Self::new(
            id,
            user_id,
            user_name,
            course_name,
            category,
            completion_date,
            score,
        )?;
        certificate.generated = artifact_path.is_some();
        certificate.artifact_path = artifact_path;
        Ok(certificate)
    }

    /// Replace the score; the grade is recomputed.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::InvalidScore` unless `score` is within `0..=100`.
    pub fn set_score(&mut self, score: f64) -> Result<(), CertificateError> {
        self.score = checked_score(score)?;
        self.grade = Grade::from_percentage(self.score);
        Ok(())
    }

    /// Record where a formatter wrote this certificate. Only allowed once.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::AlreadyGenerated` on a second call.
    pub fn mark_generated(&mut self, path: impl Into<PathBuf>) -> Result<(), CertificateError> {
        if self.generated {
            return Err(CertificateError::AlreadyGenerated);
        }
        self.artifact_path = Some(path.into());
        self.generated = true;
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> CertificateId {
        self.id
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
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn completion_date(&self) -> NaiveDate {
        self.completion_date
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    #[must_use]
    pub fn grade_description(&self) -> &'static str {
        self.grade.description()
    }

    #[must_use]
    pub fn is_passing(&self) -> bool {
        is_passing(self.score)
    }

    /// Score with one decimal, e.g. `"87.5%"`.
    #[must_use]
    pub fn formatted_score(&self) -> String {
        format!("{:.1}%", self.score)
    }

    #[must_use]
    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact_path.as_deref()
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.generated
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuizId;
    use crate::model::question::DifficultyFilter;
    use crate::model::question::tests::question;
    use crate::time::fixed_now;
    use std::sync::Arc;

    fn stats() -> UserStats {
        UserStats::new(UserId::new("default_user").unwrap(), "Ada").unwrap()
    }

    fn certificate(score: f64) -> Certificate {
        Certificate::new(
            CertificateId::generate(),
            UserId::new("default_user").unwrap(),
            "Ada",
            "Phishing Quiz",
            "Phishing",
            fixed_now().date_naive(),
            score,
        )
        .unwrap()
    }

    #[test]
    fn grade_follows_score() {
        let mut cert = certificate(91.0);
        assert_eq!(cert.grade(), Grade::APlus);
        assert_eq!(cert.grade_description(), "Excellent - Outstanding performance!");

        cert.set_score(55.0).unwrap();
        assert_eq!(cert.grade(), Grade::CPlus);
        assert!(!cert.is_passing());
        assert_eq!(cert.formatted_score(), "55.0%");
    }

    #[test]
    fn score_must_be_a_percentage() {
        let err = Certificate::new(
            CertificateId::generate(),
            UserId::new("u").unwrap(),
            "Ada",
            "Quiz",
            "Phishing",
            fixed_now().date_naive(),
            120.0,
        )
        .unwrap_err();
        assert_eq!(err, CertificateError::InvalidScore(120.0));
        assert!(certificate(60.0).set_score(f64::NAN).is_err());
    }

    #[test]
    fn generated_flag_is_set_once() {
        let mut cert = certificate(75.0);
        assert!(!cert.is_generated());
        cert.mark_generated("/tmp/certificate.txt").unwrap();
        assert!(cert.is_generated());
        assert_eq!(cert.artifact_path(), Some(Path::new("/tmp/certificate.txt")));
        assert_eq!(
            cert.mark_generated("/tmp/other.txt").unwrap_err(),
            CertificateError::AlreadyGenerated
        );
    }

    #[test]
    fn for_quiz_requires_completion() {
        let mut quiz = QuizSession::new(
            QuizId::generate(),
            "Phishing Quiz",
            "Phishing",
            DifficultyFilter::All,
            UserId::new("default_user").unwrap(),
        );
        quiz.start(vec![Arc::new(question("q1", 0))], fixed_now())
            .unwrap();
        quiz.record_answer(0).unwrap();

        let err = Certificate::for_quiz(CertificateId::generate(), &stats(), &quiz).unwrap_err();
        assert_eq!(err, CertificateError::QuizNotCompleted);

        quiz.complete(fixed_now()).unwrap();
        let cert = Certificate::for_quiz(CertificateId::generate(), &stats(), &quiz).unwrap();
        assert_eq!(cert.course_name(), "Phishing Quiz");
        assert_eq!(cert.user_name(), "Ada");
        assert_eq!(cert.score(), 100.0);
        assert_eq!(cert.completion_date(), fixed_now().date_naive());
    }
}
