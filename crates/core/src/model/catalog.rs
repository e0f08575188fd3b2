use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{DifficultyFilter, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("category name cannot be empty")]
    EmptyName,

    #[error("category `{0}` appears more than once")]
    DuplicateCategory(String),

    #[error("question `{id}` appears more than once in category `{category}`")]
    DuplicateQuestion { category: String, id: QuestionId },
}

/// A named group of questions, e.g. "Phishing" or "Password Security".
///
/// Questions are shared read-only with every quiz drawn from the category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    description: String,
    questions: Vec<Arc<Question>>,
}

impl Category {
    /// Creates a category, trimming the name and description.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyName` for a blank name and
    /// `CatalogError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, CatalogError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !seen.insert(q.id()) {
                return Err(CatalogError::DuplicateQuestion {
                    category: name,
                    id: q.id().clone(),
                });
            }
        }

        Ok(Self {
            name,
            description: description.into().trim().to_owned(),
            questions: questions.into_iter().map(Arc::new).collect(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions matching `filter`, in bank order.
    pub fn filtered<'a>(
        &'a self,
        filter: &'a DifficultyFilter,
    ) -> impl Iterator<Item = &'a Arc<Question>> + 'a {
        self.questions.iter().filter(move |q| filter.matches(q))
    }

    /// Distinct difficulty labels in order of first appearance.
    #[must_use]
    pub fn difficulties(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for q in &self.questions {
            if !out.contains(&q.difficulty()) {
                out.push(q.difficulty());
            }
        }
        out
    }
}

/// Every category known to a question store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionBank {
    categories: Vec<Category>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateCategory` if two categories share a name.
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(categories.len());
        for c in &categories {
            if !seen.insert(c.name()) {
                return Err(CatalogError::DuplicateCategory(c.name().to_owned()));
            }
        }
        Ok(Self { categories })
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(Category::name)
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn description(&self, name: &str) -> Option<&str> {
        self.category(name).map(Category::description)
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.categories.iter().map(Category::len).sum()
    }

    #[must_use]
    pub fn into_categories(self) -> Vec<Category> {
        self.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::tests::{draft, question};

    #[test]
    fn category_rejects_duplicate_question_ids() {
        let err = Category::new("Phishing", "", vec![question("q1", 0), question("q1", 1)])
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateQuestion { .. }));
    }

    #[test]
    fn category_rejects_blank_name() {
        assert_eq!(
            Category::new("  ", "desc", Vec::new()).unwrap_err(),
            CatalogError::EmptyName
        );
    }

    #[test]
    fn difficulties_are_distinct_in_order() {
        let mut hard = draft("q2", 0);
        hard.difficulty = "Hard".into();
        let category = Category::new(
            "Phishing",
            "Spot the bait",
            vec![question("q1", 0), hard.validate().unwrap(), question("q3", 1)],
        )
        .unwrap();

        assert_eq!(category.difficulties(), vec!["Easy", "Hard"]);
        let only_hard = DifficultyFilter::Only("Hard".into());
        assert_eq!(category.filtered(&only_hard).count(), 1);
        assert_eq!(category.filtered(&DifficultyFilter::All).count(), 3);
    }

    #[test]
    fn bank_looks_up_categories_and_descriptions() {
        let bank = QuestionBank::new(vec![
            Category::new("Phishing", "Spot the bait", vec![question("q1", 0)]).unwrap(),
            Category::new("Passwords", "Strong secrets", vec![question("p1", 1)]).unwrap(),
        ])
        .unwrap();

        assert_eq!(bank.category_names().collect::<Vec<_>>(), ["Phishing", "Passwords"]);
        assert_eq!(bank.description("Passwords"), Some("Strong secrets"));
        assert_eq!(bank.description("Malware"), None);
        assert_eq!(bank.total_questions(), 2);
    }

    #[test]
    fn bank_rejects_duplicate_category_names() {
        let err = QuestionBank::new(vec![
            Category::new("Phishing", "", Vec::new()).unwrap(),
            Category::new("Phishing", "", Vec::new()).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateCategory("Phishing".into()));
    }
}
