use std::sync::Arc;

use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use hygiene_core::model::{Category, DifficultyFilter, Question, QuizSettings};

/// Selection result for a new quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizPlan {
    pub questions: Vec<Arc<Question>>,
    /// Number of questions that matched the difficulty filter before truncation.
    pub pool_size: usize,
}

impl QuizPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Picks the questions for a quiz: filter by difficulty, shuffle, then keep at
/// most `max_questions`.
pub struct QuizBuilder<'a> {
    category: &'a Category,
    difficulty: &'a DifficultyFilter,
    max_questions: usize,
}

impl<'a> QuizBuilder<'a> {
    #[must_use]
    pub fn new(category: &'a Category, difficulty: &'a DifficultyFilter) -> Self {
        Self {
            category,
            difficulty,
            max_questions: QuizSettings::default().max_questions(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: &QuizSettings) -> Self {
        self.max_questions = settings.max_questions();
        self
    }

    /// Build a plan using the thread-local random generator.
    #[must_use]
    pub fn build(self) -> QuizPlan {
        let mut rng = rng();
        self.build_with_rng(&mut rng)
    }

    /// Build a plan with a caller-supplied generator, e.g. a seeded `StdRng`.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> QuizPlan {
        let mut pool: Vec<Arc<Question>> =
            self.category.filtered(self.difficulty).cloned().collect();
        let pool_size = pool.len();

        pool.as_mut_slice().shuffle(rng);
        pool.truncate(self.max_questions);

        log::debug!(
            "selected {} of {} {} questions from {}",
            pool.len(),
            pool_size,
            self.difficulty,
            self.category.name()
        );

        QuizPlan {
            questions: pool,
            pool_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hygiene_core::model::{QuestionDraft, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn category(easy: usize, hard: usize) -> Category {
        let questions = (0..easy + hard)
            .map(|i| {
                QuestionDraft {
                    id: QuestionId::new(format!("q{i}")).unwrap(),
                    text: format!("Question {i}?"),
                    options: vec!["a".into(), "b".into(), "c".into()],
                    correct_index: i % 3,
                    explanation: String::new(),
                    category: "Phishing".into(),
                    difficulty: if i < easy { "Easy" } else { "Hard" }.into(),
                }
                .validate()
                .unwrap()
            })
            .collect();
        Category::new("Phishing", "", questions).unwrap()
    }

    fn ids(plan: &QuizPlan) -> Vec<String> {
        plan.questions
            .iter()
            .map(|q| q.id().as_str().to_owned())
            .collect()
    }

    #[test]
    fn caps_at_ten_without_duplicates() {
        let category = category(15, 0);
        let plan = QuizBuilder::new(&category, &DifficultyFilter::All)
            .build_with_rng(&mut StdRng::seed_from_u64(7));

        assert_eq!(plan.total(), 10);
        assert_eq!(plan.pool_size, 15);
        let unique: HashSet<_> = ids(&plan).into_iter().collect();
        assert_eq!(unique.len(), 10);
        assert!(
            plan.questions
                .iter()
                .all(|q| category.questions().iter().any(|c| c.id() == q.id()))
        );
    }

    #[test]
    fn difficulty_filter_applies_before_truncation() {
        let category = category(12, 3);
        let hard = DifficultyFilter::Only("Hard".into());
        let plan = QuizBuilder::new(&category, &hard).build();

        assert_eq!(plan.total(), 3);
        assert!(plan.questions.iter().all(|q| q.difficulty() == "Hard"));
    }

    #[test]
    fn smaller_pool_is_taken_whole() {
        let category = category(4, 0);
        let plan = QuizBuilder::new(&category, &DifficultyFilter::All).build();
        assert_eq!(plan.total(), 4);
    }

    #[test]
    fn unknown_difficulty_yields_empty_plan() {
        let category = category(5, 0);
        let expert = DifficultyFilter::Only("Expert".into());
        let plan = QuizBuilder::new(&category, &expert).build();
        assert!(plan.is_empty());
        assert_eq!(plan.pool_size, 0);
    }

    #[test]
    fn settings_override_the_cap() {
        let category = category(15, 0);
        let settings = QuizSettings::new(5).unwrap();
        let plan = QuizBuilder::new(&category, &DifficultyFilter::All)
            .with_settings(&settings)
            .build();
        assert_eq!(plan.total(), 5);
    }

    #[test]
    fn same_seed_same_order() {
        let category = category(15, 0);
        let a = QuizBuilder::new(&category, &DifficultyFilter::All)
            .build_with_rng(&mut StdRng::seed_from_u64(42));
        let b = QuizBuilder::new(&category, &DifficultyFilter::All)
            .build_with_rng(&mut StdRng::seed_from_u64(42));
        assert_eq!(ids(&a), ids(&b));
    }
}
