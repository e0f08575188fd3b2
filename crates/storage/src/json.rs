//! Typed loaders for the question bank and tips files.
//!
//! Both files are validated while parsing: a missing field, a wrong type, or a
//! question that breaks the question schema fails the whole load.

use std::path::{Path, PathBuf};

use hygiene_core::model::{
    CatalogError, Category, ParseIdError, QuestionBank, QuestionDraft, QuestionError, QuestionId,
    TipCategory,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question id `{raw}` is invalid: {source}")]
    QuestionId {
        raw: String,
        #[source]
        source: ParseIdError,
    },

    #[error("question `{id}` has a negative correctAnswer ({value})")]
    NegativeCorrectAnswer { id: String, value: i64 },

    #[error("question `{id}` is invalid: {source}")]
    Question {
        id: String,
        #[source]
        source: QuestionError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionFile {
    categories: Vec<CategoryRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRecord {
    name: String,
    #[serde(default)]
    description: String,
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    id: String,
    question: String,
    options: Vec<String>,
    correct_answer: i64,
    explanation: String,
    category: String,
    difficulty: String,
}

impl QuestionRecord {
    fn into_draft(self) -> Result<QuestionDraft, LoadError> {
        let id = QuestionId::new(self.id.as_str()).map_err(|source| LoadError::QuestionId {
            raw: self.id.clone(),
            source,
        })?;
        let correct_index =
            usize::try_from(self.correct_answer).map_err(|_| LoadError::NegativeCorrectAnswer {
                id: self.id.clone(),
                value: self.correct_answer,
            })?;
        Ok(QuestionDraft {
            id,
            text: self.question,
            options: self.options,
            correct_index,
            explanation: self.explanation,
            category: self.category,
            difficulty: self.difficulty,
        })
    }
}

/// Parse a question bank from the JSON text of a questions file.
///
/// # Errors
///
/// Returns `LoadError` for malformed JSON, invalid questions, or duplicate
/// categories/question ids.
pub fn parse_question_bank(json: &str) -> Result<QuestionBank, LoadError> {
    let file: QuestionFile = serde_json::from_str(json)?;

    let mut categories = Vec::with_capacity(file.categories.len());
    for record in file.categories {
        let mut questions = Vec::with_capacity(record.questions.len());
        for q in record.questions {
            let id = q.id.clone();
            let question = q
                .into_draft()?
                .validate()
                .map_err(|source| LoadError::Question { id, source })?;
            questions.push(question);
        }
        categories.push(Category::new(record.name, record.description, questions)?);
    }

    let bank = QuestionBank::new(categories)?;
    log::debug!(
        "parsed question bank: {} categories, {} questions",
        bank.categories().len(),
        bank.total_questions()
    );
    Ok(bank)
}

/// Read and parse a questions file.
///
/// # Errors
///
/// Returns `LoadError::Io` if the file cannot be read, otherwise as
/// [`parse_question_bank`].
pub fn load_question_bank(path: impl AsRef<Path>) -> Result<QuestionBank, LoadError> {
    let path = path.as_ref();
    parse_question_bank(&read(path)?)
}

//
// ─── TIPS ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TipsFile {
    cybersecurity_tips: Vec<TipCategory>,
}

/// # Errors
///
/// Returns `LoadError::Json` if the text does not match the tips schema.
pub fn parse_tips(json: &str) -> Result<Vec<TipCategory>, LoadError> {
    let file: TipsFile = serde_json::from_str(json)?;
    Ok(file.cybersecurity_tips)
}

/// # Errors
///
/// Returns `LoadError::Io` if the file cannot be read, otherwise as [`parse_tips`].
pub fn load_tips(path: impl AsRef<Path>) -> Result<Vec<TipCategory>, LoadError> {
    parse_tips(&read(path.as_ref())?)
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANK: &str = r#"{
      "categories": [
        {
          "name": "Phishing",
          "description": "Spot fake emails and links",
          "questions": [
            {
              "id": "phish_001",
              "question": "What is phishing?",
              "options": ["A fishing sport", "A social engineering attack", "A firewall", "A virus scanner"],
              "correctAnswer": 1,
              "explanation": "Phishing tricks people into revealing information.",
              "category": "Phishing",
              "difficulty": "Easy"
            },
            {
              "id": "phish_002",
              "question": "Which sender address is suspicious?",
              "options": ["support@yourbank.com", "support@yourbank-secure-login.net"],
              "correctAnswer": 1,
              "explanation": "Look-alike domains are a classic sign.",
              "category": "Phishing",
              "difficulty": "Medium"
            }
          ]
        },
        {
          "name": "Passwords",
          "description": "Build strong credentials",
          "questions": []
        }
      ]
    }"#;

    fn with_question(question: &str) -> String {
        format!(
            r#"{{"categories":[{{"name":"Phishing","description":"","questions":[{question}]}}]}}"#
        )
    }

    #[test]
    fn parses_categories_in_file_order() {
        let bank = parse_question_bank(BANK).unwrap();
        assert_eq!(
            bank.category_names().collect::<Vec<_>>(),
            ["Phishing", "Passwords"]
        );
        assert_eq!(bank.description("Passwords"), Some("Build strong credentials"));

        let phishing = bank.category("Phishing").unwrap();
        assert_eq!(phishing.len(), 2);
        assert_eq!(phishing.questions()[0].correct_option(), "A social engineering attack");
        assert_eq!(phishing.difficulties(), ["Easy", "Medium"]);
    }

    #[test]
    fn missing_field_is_rejected() {
        let json = with_question(
            r#"{"id":"q","question":"?","options":["a","b"],"explanation":"","category":"Phishing","difficulty":"Easy"}"#,
        );
        assert!(matches!(parse_question_bank(&json), Err(LoadError::Json(_))));
    }

    #[test]
    fn negative_correct_answer_is_rejected() {
        let json = with_question(
            r#"{"id":"q","question":"?","options":["a","b"],"correctAnswer":-1,"explanation":"","category":"Phishing","difficulty":"Easy"}"#,
        );
        assert!(matches!(
            parse_question_bank(&json),
            Err(LoadError::NegativeCorrectAnswer { value: -1, .. })
        ));
    }

    #[test]
    fn out_of_range_correct_answer_is_rejected() {
        let json = with_question(
            r#"{"id":"q","question":"?","options":["a","b"],"correctAnswer":2,"explanation":"","category":"Phishing","difficulty":"Easy"}"#,
        );
        match parse_question_bank(&json) {
            Err(LoadError::Question { id, source }) => {
                assert_eq!(id, "q");
                assert_eq!(source, QuestionError::CorrectIndexOutOfRange { index: 2, len: 2 });
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn single_option_is_rejected() {
        let json = with_question(
            r#"{"id":"q","question":"?","options":["a"],"correctAnswer":0,"explanation":"","category":"Phishing","difficulty":"Easy"}"#,
        );
        assert!(matches!(
            parse_question_bank(&json),
            Err(LoadError::Question {
                source: QuestionError::TooFewOptions { len: 1 },
                ..
            })
        ));
    }

    #[test]
    fn duplicate_category_is_rejected() {
        let json = r#"{"categories":[
            {"name":"Phishing","questions":[]},
            {"name":"Phishing","questions":[]}
        ]}"#;
        assert!(matches!(
            parse_question_bank(json),
            Err(LoadError::Catalog(CatalogError::DuplicateCategory(_)))
        ));
    }

    #[test]
    fn parses_tips() {
        let json = r#"{"cybersecurityTips":[
            {"category":"Password Security","tips":[
                {"icon":"🔑","title":"Use a password manager","description":"Let it generate unique passwords."}
            ]}
        ]}"#;
        let tips = parse_tips(json).unwrap();
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].category, "Password Security");
        assert_eq!(tips[0].tips[0].title, "Use a password manager");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_tips("/definitely/not/here/tips.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here/tips.json"));
    }
}
