//! Plain-text certificates and quiz reports.
//!
//! Renderers only see a `Certificate` or a `QuizSummary`; they never reach
//! back into the quiz.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use hygiene_core::model::{Certificate, QuizSummary};

use crate::error::RenderError;

/// Writes finished quiz artifacts somewhere and reports where.
pub trait ArtifactRenderer: Send + Sync {
    /// # Errors
    ///
    /// Returns `RenderError` if the artifact cannot be written.
    fn render_certificate(&self, certificate: &Certificate) -> Result<PathBuf, RenderError>;

    /// # Errors
    ///
    /// Returns `RenderError` if the artifact cannot be written.
    fn render_report(&self, summary: &QuizSummary) -> Result<PathBuf, RenderError>;
}

/// Renders artifacts as UTF-8 text files inside `out_dir`.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    out_dir: PathBuf,
}

impl TextRenderer {
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf, RenderError> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(file_name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

impl ArtifactRenderer for TextRenderer {
    fn render_certificate(&self, certificate: &Certificate) -> Result<PathBuf, RenderError> {
        self.write(
            &format!("certificate_{}.txt", certificate.id()),
            &certificate_text(certificate),
        )
    }

    fn render_report(&self, summary: &QuizSummary) -> Result<PathBuf, RenderError> {
        self.write(
            &format!("quiz_report_{}.txt", summary.quiz_id),
            &report_text(summary),
        )
    }
}

#[must_use]
pub fn certificate_text(certificate: &Certificate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "CYBER HYGIENE TRAINING CERTIFICATE");
    let _ = writeln!(out);
    let _ = writeln!(out, "This certifies that");
    let _ = writeln!(out, "    {}", certificate.user_name());
    let _ = writeln!(out, "has successfully completed the");
    let _ = writeln!(out, "    {}", certificate.course_name());
    let _ = writeln!(out);
    let _ = writeln!(out, "Score:    {}", certificate.formatted_score());
    let _ = writeln!(out, "Grade:    {}", certificate.grade());
    let _ = writeln!(out, "Category: {}", certificate.category());
    let _ = writeln!(out, "Date:     {}", certificate.completion_date());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", certificate.grade_description());
    let _ = writeln!(out);
    let _ = writeln!(out, "Certificate ID: {}", certificate.id());
    out
}

#[must_use]
pub fn report_text(summary: &QuizSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "QUIZ REPORT");
    let _ = writeln!(out, "{}", summary.course_name);
    let _ = writeln!(out);
    let _ = writeln!(out, "Name:       {}", summary.user_name);
    let _ = writeln!(out, "Category:   {}", summary.category);
    let _ = writeln!(out, "Difficulty: {}", summary.difficulty);
    let _ = writeln!(out, "Score:      {}/{}", summary.score, summary.total);
    let _ = writeln!(out, "Percentage: {:.1}%", summary.percentage);
    let _ = writeln!(out, "Grade:      {}", summary.grade);
    let _ = writeln!(out, "Duration:   {} minutes", summary.duration_minutes);
    let _ = writeln!(
        out,
        "Date:       {}",
        summary.completed_at.format("%Y-%m-%d %H:%M")
    );

    if !summary.incorrect.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Areas for Improvement:");
        for miss in &summary.incorrect {
            let _ = writeln!(out);
            let _ = writeln!(out, "Q{}: {}", miss.position + 1, miss.question);
            let _ = writeln!(out, "Correct answer: {}", miss.correct_option);
            if !miss.explanation.is_empty() {
                let _ = writeln!(out, "Explanation: {}", miss.explanation);
            }
        }
    }
    out
}

/// Machine-readable form of a quiz summary.
///
/// # Errors
///
/// Returns `RenderError::Json` if the summary cannot be encoded.
pub fn report_json(summary: &QuizSummary) -> Result<String, RenderError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hygiene_core::model::{
        CertificateId, DifficultyFilter, QuestionDraft, QuestionId, QuizId, QuizSession, UserId,
    };
    use hygiene_core::time::fixed_now;
    use std::sync::Arc;

    fn completed_summary() -> QuizSummary {
        let questions = (0..2)
            .map(|i| {
                Arc::new(
                    QuestionDraft {
                        id: QuestionId::new(format!("q{i}")).unwrap(),
                        text: format!("Is link {i} safe?"),
                        options: vec!["Yes".into(), "No".into()],
                        correct_index: 1,
                        explanation: "Hover before you click.".into(),
                        category: "Phishing".into(),
                        difficulty: "Easy".into(),
                    }
                    .validate()
                    .unwrap(),
                )
            })
            .collect();
        let mut quiz = QuizSession::new(
            QuizId::generate(),
            "Phishing Quiz",
            "Phishing",
            DifficultyFilter::All,
            UserId::new("u").unwrap(),
        );
        quiz.start(questions, fixed_now()).unwrap();
        quiz.record_answer(1).unwrap();
        quiz.complete(fixed_now() + Duration::minutes(2)).unwrap();
        QuizSummary::from_quiz(&quiz, "Ada").unwrap()
    }

    #[test]
    fn certificate_text_carries_grade_and_score() {
        let cert = Certificate::new(
            CertificateId::generate(),
            UserId::new("u").unwrap(),
            "Ada",
            "Phishing Quiz",
            "Phishing",
            fixed_now().date_naive(),
            87.5,
        )
        .unwrap();
        let text = certificate_text(&cert);
        assert!(text.contains("Ada"));
        assert!(text.contains("Score:    87.5%"));
        assert!(text.contains("Grade:    A"));
        assert!(text.contains("Very Good - Great job!"));
        assert!(text.contains("Date:     2023-11-14"));
    }

    #[test]
    fn report_lists_missed_questions() {
        let text = report_text(&completed_summary());
        assert!(text.contains("Score:      1/2"));
        assert!(text.contains("Percentage: 50.0%"));
        assert!(text.contains("Duration:   2 minutes"));
        assert!(text.contains("Q2: Is link 1 safe?"));
        assert!(!text.contains("Q1:"));
        assert!(text.contains("Explanation: Hover before you click."));
    }

    #[test]
    fn json_report_lists_incorrect_answers() {
        let json = report_json(&completed_summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["score"], 1);
        assert_eq!(value["grade"], "C+");
        assert_eq!(value["incorrect"][0]["question_id"], "q1");
        assert_eq!(value["incorrect"][0]["selected"], serde_json::Value::Null);
    }

    #[test]
    fn text_renderer_writes_named_files() {
        let dir = std::env::temp_dir().join(format!("hygiene-render-{}", QuizId::generate()));
        let renderer = TextRenderer::new(&dir);
        let summary = completed_summary();

        let path = renderer.render_report(&summary).unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(format!("quiz_report_{}.txt", summary.quiz_id).as_str())
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report_text(&summary));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
