use async_trait::async_trait;
use hygiene_core::model::{Category, Certificate, QuestionBank, UserId, UserStats};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist a category, replacing any stored category with the same name
    /// together with all of its questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the category cannot be stored.
    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError>;

    /// Category names in the order they were first stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the names cannot be read.
    async fn list_category_names(&self) -> Result<Vec<String>, StorageError>;

    /// Fetch a category and its questions by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures. A missing
    /// category is `Ok(None)`.
    async fn get_category(&self, name: &str) -> Result<Option<Category>, StorageError>;
}

#[async_trait]
pub trait UserStatsRepository: Send + Sync {
    /// Fetch the lifetime statistics for a user, if any quiz was recorded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, StorageError>;

    /// Persist or replace a user's statistics, including per-category counters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the statistics cannot be stored.
    async fn upsert_stats(&self, stats: &UserStats) -> Result<(), StorageError>;
}

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Append a newly issued certificate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a certificate with the same id exists.
    async fn append_certificate(&self, certificate: &Certificate) -> Result<(), StorageError>;

    /// Certificates for a user, newest completion date first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn list_certificates(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Certificate>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    categories: Arc<Mutex<Vec<Category>>>,
    stats: Arc<Mutex<HashMap<UserId, UserStats>>>,
    certificates: Arc<Mutex<Vec<Certificate>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-loaded with every category of `bank`.
    #[must_use]
    pub fn with_bank(bank: QuestionBank) -> Self {
        Self {
            categories: Arc::new(Mutex::new(bank.into_categories())),
            ..Self::default()
        }
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError> {
        let mut guard = self
            .categories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.iter_mut().find(|c| c.name() == category.name()) {
            Some(existing) => *existing = category.clone(),
            None => guard.push(category.clone()),
        }
        Ok(())
    }

    async fn list_category_names(&self) -> Result<Vec<String>, StorageError> {
        let guard = self
            .categories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().map(|c| c.name().to_owned()).collect())
    }

    async fn get_category(&self, name: &str) -> Result<Option<Category>, StorageError> {
        let guard = self
            .categories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().find(|c| c.name() == name).cloned())
    }
}

#[async_trait]
impl UserStatsRepository for InMemoryRepository {
    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, StorageError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(user_id).cloned())
    }

    async fn upsert_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(stats.user_id().clone(), stats.clone());
        Ok(())
    }
}

#[async_trait]
impl CertificateRepository for InMemoryRepository {
    async fn append_certificate(&self, certificate: &Certificate) -> Result<(), StorageError> {
        let mut guard = self
            .certificates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|c| c.id() == certificate.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(certificate.clone());
        Ok(())
    }

    async fn list_certificates(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Certificate>, StorageError> {
        let guard = self
            .certificates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<Certificate> = guard
            .iter()
            .rev()
            .filter(|c| c.user_id() == user_id)
            .cloned()
            .collect();
        // stable sort keeps insertion order (newest first) within a day
        out.sort_by(|a, b| b.completion_date().cmp(&a.completion_date()));
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub stats: Arc<dyn UserStatsRepository>,
    pub certificates: Arc<dyn CertificateRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// In-memory storage whose question repository starts with `bank`.
    #[must_use]
    pub fn in_memory_with_bank(bank: QuestionBank) -> Self {
        Self::from_repository(InMemoryRepository::with_bank(bank))
    }

    fn from_repository(repo: InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let stats: Arc<dyn UserStatsRepository> = Arc::new(repo.clone());
        let certificates: Arc<dyn CertificateRepository> = Arc::new(repo);
        Self {
            questions,
            stats,
            certificates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hygiene_core::model::{CertificateId, QuestionDraft, QuestionId};
    use hygiene_core::time::fixed_now;

    fn category(name: &str, ids: &[&str]) -> Category {
        let questions = ids
            .iter()
            .map(|id| {
                QuestionDraft {
                    id: QuestionId::new(*id).unwrap(),
                    text: format!("What about {id}?"),
                    options: vec!["yes".into(), "no".into()],
                    correct_index: 0,
                    explanation: String::new(),
                    category: name.into(),
                    difficulty: "Easy".into(),
                }
                .validate()
                .unwrap()
            })
            .collect();
        Category::new(name, format!("{name} basics"), questions).unwrap()
    }

    fn user() -> UserId {
        UserId::new("default_user").unwrap()
    }

    fn certificate(days_ago: i64) -> Certificate {
        Certificate::new(
            CertificateId::generate(),
            user(),
            "Ada",
            "Phishing Quiz",
            "Phishing",
            (fixed_now() - Duration::days(days_ago)).date_naive(),
            80.0,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_category_replaces_by_name_and_keeps_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_category(&category("Phishing", &["p1"])).await.unwrap();
        repo.upsert_category(&category("Malware", &["m1"])).await.unwrap();
        repo.upsert_category(&category("Phishing", &["p1", "p2"]))
            .await
            .unwrap();

        assert_eq!(
            repo.list_category_names().await.unwrap(),
            ["Phishing", "Malware"]
        );
        let phishing = repo.get_category("Phishing").await.unwrap().unwrap();
        assert_eq!(phishing.len(), 2);
        assert!(repo.get_category("Wi-Fi").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stats_round_trip_by_user() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_stats(&user()).await.unwrap().is_none());

        let mut stats = UserStats::new(user(), "Ada").unwrap();
        stats.update_stats("Phishing", 4, 5, fixed_now());
        repo.upsert_stats(&stats).await.unwrap();

        let fetched = repo.get_stats(&user()).await.unwrap().unwrap();
        assert_eq!(fetched, stats);
    }

    #[tokio::test]
    async fn certificates_list_newest_first_and_reject_duplicates() {
        let repo = InMemoryRepository::new();
        let old = certificate(3);
        let new = certificate(0);
        repo.append_certificate(&old).await.unwrap();
        repo.append_certificate(&new).await.unwrap();

        assert!(matches!(
            repo.append_certificate(&old).await,
            Err(StorageError::Conflict)
        ));

        let listed = repo.list_certificates(&user(), 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id(), new.id());
        assert_eq!(repo.list_certificates(&user(), 1).await.unwrap().len(), 1);

        let other = UserId::new("someone_else").unwrap();
        assert!(repo.list_certificates(&other, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_in_memory_shares_one_backend() {
        let storage = Storage::in_memory();
        storage
            .questions
            .upsert_category(&category("Passwords", &["pw1"]))
            .await
            .unwrap();
        assert_eq!(
            storage.questions.list_category_names().await.unwrap(),
            ["Passwords"]
        );
        assert!(storage.stats.get_stats(&user()).await.unwrap().is_none());
    }
}
