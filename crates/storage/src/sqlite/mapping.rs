use std::path::PathBuf;

use hygiene_core::model::{
    Certificate, CertificateId, Grade, Question, QuestionDraft, QuestionId, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

fn options_from_json(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let correct_index: i64 = row.try_get("correct_index").map_err(ser)?;
    let correct_index = usize::try_from(correct_index).map_err(|_| {
        StorageError::Serialization(format!("invalid correct_index: {correct_index}"))
    })?;

    QuestionDraft {
        id: QuestionId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?,
        text: row.try_get("question").map_err(ser)?,
        options: options_from_json(&row.try_get::<String, _>("options").map_err(ser)?)?,
        correct_index,
        explanation: row.try_get("explanation").map_err(ser)?,
        category: row.try_get("category").map_err(ser)?,
        difficulty: row.try_get("difficulty").map_err(ser)?,
    }
    .validate()
    .map_err(ser)
}

pub(crate) fn map_certificate_row(row: &SqliteRow) -> Result<Certificate, StorageError> {
    let id: CertificateId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let grade: Grade = row
        .try_get::<String, _>("grade")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    let certificate = Certificate::from_persisted(
        id,
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?).map_err(ser)?,
        row.try_get("user_name").map_err(ser)?,
        row.try_get("course_name").map_err(ser)?,
        row.try_get("category").map_err(ser)?,
        row.try_get("completion_date").map_err(ser)?,
        row.try_get("score").map_err(ser)?,
        row.try_get::<Option<String>, _>("artifact_path")
            .map_err(ser)?
            .map(PathBuf::from),
    )
    .map_err(ser)?;

    if certificate.grade() != grade {
        return Err(StorageError::Serialization(format!(
            "certificate {id}: stored grade {grade} does not match score {}",
            certificate.formatted_score()
        )));
    }
    Ok(certificate)
}
