use hygiene_core::model::{Certificate, UserId};

use super::SqliteRepository;
use super::mapping::map_certificate_row;
use crate::repository::{CertificateRepository, StorageError};

#[async_trait::async_trait]
impl CertificateRepository for SqliteRepository {
    async fn append_certificate(&self, certificate: &Certificate) -> Result<(), StorageError> {
        let artifact_path = certificate
            .artifact_path()
            .map(|p| p.to_string_lossy().into_owned());

        sqlx::query(
            r"
            INSERT INTO certificates (
                id, user_id, user_name, course_name, category,
                completion_date, score, grade, artifact_path, issued_seq
            )
            VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                (SELECT COALESCE(MAX(issued_seq), 0) + 1 FROM certificates)
            )
            ",
        )
        .bind(certificate.id().to_string())
        .bind(certificate.user_id().as_str())
        .bind(certificate.user_name())
        .bind(certificate.course_name())
        .bind(certificate.category())
        .bind(certificate.completion_date())
        .bind(certificate.score())
        .bind(certificate.grade().as_str())
        .bind(artifact_path)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => StorageError::Connection(other.to_string()),
        })?;

        Ok(())
    }

    async fn list_certificates(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Certificate>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, user_name, course_name, category,
                   completion_date, score, grade, artifact_path
            FROM certificates
            WHERE user_id = ?1
            ORDER BY completion_date DESC, issued_seq DESC
            LIMIT ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_certificate_row(row)?);
        }
        Ok(out)
    }
}
