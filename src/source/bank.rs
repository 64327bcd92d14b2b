use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rust_embed::Embed;
use tracing::{info, warn};

use crate::quiz::Question;

#[derive(Embed)]
#[folder = "assets/bank/"]
struct BankAssets;

const BUNDLED_BANK: &str = "questions.json";

/// The fixed question bank. Read-only once loaded.
#[derive(Clone, Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Load the bank compiled into the binary.
    pub fn bundled() -> Result<Self> {
        let file = BankAssets::get(BUNDLED_BANK)
            .ok_or_else(|| anyhow!("bundled question bank is missing"))?;
        let content = std::str::from_utf8(file.data.as_ref())
            .context("bundled question bank is not valid UTF-8")?;
        Self::from_json(content)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading question bank {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Prefer a user-supplied bank, falling back to the bundled one.
    pub fn load(user_path: Option<&Path>) -> Result<Self> {
        match user_path {
            Some(path) => Self::from_path(path),
            None => Self::bundled(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Vec<Question> = serde_json::from_str(content)?;
        Ok(Self::from_questions(raw))
    }

    /// Keep only well-formed questions with a unique id (first one wins).
    pub fn from_questions(raw: Vec<Question>) -> Self {
        let total = raw.len();
        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(total);
        for q in raw {
            if let Err(err) = q.validate() {
                warn!(id = q.id, %err, "skipping malformed question");
                continue;
            }
            if !seen.insert(q.id) {
                warn!(id = q.id, "skipping duplicate question id");
                continue;
            }
            questions.push(q);
        }
        info!(kept = questions.len(), total, "question bank loaded");
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn in_categories<'a>(&'a self, categories: &'a [String]) -> impl Iterator<Item = &'a Question> {
        self.questions.iter().filter(move |q| {
            q.category
                .as_deref()
                .is_some_and(|c| categories.iter().any(|want| want == c))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::question::sample;

    #[test]
    fn bundled_bank_is_well_formed() {
        let bank = QuestionBank::bundled().unwrap();
        assert!(bank.len() >= 30);
        let ids: HashSet<u64> = bank.questions().iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), bank.len());
        for q in bank.questions() {
            assert!(q.validate().is_ok(), "question {} is malformed", q.id);
        }
    }

    #[test]
    fn bundled_bank_covers_every_default_pool() {
        let bank = QuestionBank::bundled().unwrap();
        for pool in crate::source::sampler::default_pools() {
            let available = bank.in_categories(&pool.categories).count();
            assert!(
                available >= pool.target,
                "pool {} has {available} questions, needs {}",
                pool.name,
                pool.target
            );
        }
    }

    #[test]
    fn drops_duplicates_and_malformed() {
        let mut bad = sample(3, "Mecânica", 0);
        bad.options.truncate(2);
        let bank = QuestionBank::from_questions(vec![
            sample(1, "Mecânica", 0),
            sample(1, "Legislação", 1),
            sample(2, "Mecânica", 2),
            bad,
        ]);
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.questions()[0].category.as_deref(), Some("Mecânica"));
    }

    #[test]
    fn category_filter() {
        let mut uncategorised = sample(9, "", 0);
        uncategorised.category = None;
        let bank = QuestionBank::from_questions(vec![
            sample(1, "Sinalização", 0),
            sample(2, "Mecânica", 0),
            sample(3, "Infrações", 0),
            uncategorised,
        ]);
        let wanted = vec!["Sinalização".to_string(), "Infrações".to_string()];
        let ids: Vec<u64> = bank.in_categories(&wanted).map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn loads_user_bank_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banco.json");
        let json = serde_json::to_string(&vec![sample(10, "Mecânica", 1)]).unwrap();
        fs::write(&path, json).unwrap();

        let bank = QuestionBank::load(Some(&path)).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.questions()[0].id, 10);
    }

    #[test]
    fn unreadable_user_bank_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(QuestionBank::load(Some(&dir.path().join("nope.json"))).is_err());

        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(QuestionBank::from_path(&path).is_err());
    }
}
