use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::quiz::Question;
use crate::source::QuestionSource;
use crate::source::bank::QuestionBank;

/// A category group drawn as one unit, with the number of questions a
/// standard session takes from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub name: String,
    pub categories: Vec<String>,
    pub target: usize,
}

impl PoolSpec {
    fn new(name: &str, categories: &[&str], target: usize) -> Self {
        Self {
            name: name.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            target,
        }
    }
}

/// The official exam split: 30 questions over five groups.
pub fn default_pools() -> Vec<PoolSpec> {
    vec![
        PoolSpec::new("legislacao", &["Legislação", "Sinalização", "Infrações"], 12),
        PoolSpec::new("direcao_defensiva", &["Direção Defensiva"], 10),
        PoolSpec::new("primeiros_socorros", &["Primeiros Socorros"], 3),
        PoolSpec::new("meio_ambiente", &["Meio Ambiente", "Cidadania"], 3),
        PoolSpec::new("mecanica", &["Mecânica"], 2),
    ]
}

/// Draws a standard session from the bank.
///
/// Each pool is shuffled and cut to its target, the picks are concatenated
/// and the whole list is shuffled again so the category order does not leak.
/// A pool shorter than its target gives everything it has. With no pools the
/// sampler takes a flat slice of `flat_count` from the whole bank.
pub struct StandardSampler {
    bank: QuestionBank,
    pools: Vec<PoolSpec>,
    flat_count: usize,
    rng: SmallRng,
}

impl StandardSampler {
    pub fn new(bank: QuestionBank, pools: Vec<PoolSpec>, flat_count: usize, rng: SmallRng) -> Self {
        Self {
            bank,
            pools,
            flat_count,
            rng,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn sample(&mut self) -> Vec<Question> {
        if self.pools.is_empty() {
            return self.sample_flat();
        }

        let mut taken: HashSet<u64> = HashSet::new();
        let mut selected: Vec<Question> = Vec::new();

        for pool in &self.pools {
            let mut candidates: Vec<&Question> = self
                .bank
                .in_categories(&pool.categories)
                .filter(|q| !taken.contains(&q.id))
                .collect();
            if candidates.len() < pool.target {
                warn!(
                    pool = %pool.name,
                    available = candidates.len(),
                    target = pool.target,
                    "pool smaller than target, taking all"
                );
            }
            candidates.shuffle(&mut self.rng);
            candidates.truncate(pool.target);
            for q in candidates {
                taken.insert(q.id);
                selected.push(q.clone());
            }
        }

        selected.shuffle(&mut self.rng);
        debug!(count = selected.len(), "standard session drawn");
        selected
    }

    fn sample_flat(&mut self) -> Vec<Question> {
        let mut all: Vec<Question> = self.bank.questions().to_vec();
        all.shuffle(&mut self.rng);
        all.truncate(self.flat_count);
        all
    }
}

impl QuestionSource for StandardSampler {
    fn draw(&mut self) -> Vec<Question> {
        self.sample()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;

    use super::*;
    use crate::quiz::question::sample;

    fn bank_with(counts: &[(&str, usize)]) -> QuestionBank {
        let mut id = 0;
        let mut qs = Vec::new();
        for (category, n) in counts {
            for _ in 0..*n {
                id += 1;
                qs.push(sample(id, category, 0));
            }
        }
        QuestionBank::from_questions(qs)
    }

    fn rich_bank() -> QuestionBank {
        bank_with(&[
            ("Legislação", 20),
            ("Sinalização", 10),
            ("Infrações", 10),
            ("Direção Defensiva", 25),
            ("Primeiros Socorros", 10),
            ("Meio Ambiente", 6),
            ("Cidadania", 6),
            ("Mecânica", 8),
        ])
    }

    fn pool_of(pools: &[PoolSpec], q: &Question) -> String {
        let cat = q.category.as_deref().unwrap_or_default();
        pools
            .iter()
            .find(|p| p.categories.iter().any(|c| c == cat))
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    #[test]
    fn composition_matches_targets() {
        let pools = default_pools();
        let mut sampler =
            StandardSampler::new(rich_bank(), pools.clone(), 30, SmallRng::seed_from_u64(7));
        let drawn = sampler.sample();
        assert_eq!(drawn.len(), 30);

        let mut per_pool: HashMap<String, usize> = HashMap::new();
        for q in &drawn {
            *per_pool.entry(pool_of(&pools, q)).or_default() += 1;
        }
        for pool in &pools {
            assert_eq!(per_pool.get(&pool.name).copied().unwrap_or(0), pool.target);
        }
    }

    #[test]
    fn no_duplicate_ids() {
        let mut sampler =
            StandardSampler::new(rich_bank(), default_pools(), 30, SmallRng::seed_from_u64(1));
        for _ in 0..20 {
            let drawn = sampler.sample();
            let ids: HashSet<u64> = drawn.iter().map(|q| q.id).collect();
            assert_eq!(ids.len(), drawn.len());
        }
    }

    #[test]
    fn short_pool_contributes_everything_it_has() {
        let bank = bank_with(&[("Legislação", 20), ("Mecânica", 1)]);
        let pools = vec![
            PoolSpec::new("legislacao", &["Legislação"], 5),
            PoolSpec::new("mecanica", &["Mecânica"], 2),
        ];
        let mut sampler = StandardSampler::new(bank, pools, 30, SmallRng::seed_from_u64(3));
        let drawn = sampler.sample();
        assert_eq!(drawn.len(), 6);
        let mech = drawn
            .iter()
            .filter(|q| q.category.as_deref() == Some("Mecânica"))
            .count();
        assert_eq!(mech, 1);
    }

    #[test]
    fn exact_pool_size_returns_all_without_duplication() {
        let bank = bank_with(&[("Mecânica", 2)]);
        let pools = vec![PoolSpec::new("mecanica", &["Mecânica"], 2)];
        let mut sampler = StandardSampler::new(bank, pools, 30, SmallRng::seed_from_u64(11));
        let mut ids: Vec<u64> = sampler.sample().iter().map(|q| q.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn overlapping_pools_never_draw_the_same_question_twice() {
        let bank = bank_with(&[("Legislação", 4)]);
        let pools = vec![
            PoolSpec::new("a", &["Legislação"], 3),
            PoolSpec::new("b", &["Legislação"], 3),
        ];
        let mut sampler = StandardSampler::new(bank, pools, 30, SmallRng::seed_from_u64(5));
        let drawn = sampler.sample();
        assert_eq!(drawn.len(), 4);
        let ids: HashSet<u64> = drawn.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn flat_slice_without_pools() {
        let bank = bank_with(&[("Legislação", 15), ("Mecânica", 15)]);
        let mut sampler = StandardSampler::new(bank, Vec::new(), 10, SmallRng::seed_from_u64(9));
        let drawn = sampler.sample();
        assert_eq!(drawn.len(), 10);
        let ids: HashSet<u64> = drawn.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn flat_slice_larger_than_bank_returns_whole_bank() {
        let bank = bank_with(&[("Legislação", 4)]);
        let mut sampler = StandardSampler::new(bank, Vec::new(), 10, SmallRng::seed_from_u64(9));
        assert_eq!(sampler.draw().len(), 4);
    }

    #[test]
    fn category_order_is_mixed() {
        // With a single pool drawn last, an unshuffled concatenation would
        // always end with mechanics questions.
        let pools = default_pools();
        let mut sampler =
            StandardSampler::new(rich_bank(), pools.clone(), 30, SmallRng::seed_from_u64(42));
        let mut tail_always_mechanics = true;
        for _ in 0..10 {
            let drawn = sampler.sample();
            let tail = &drawn[drawn.len() - 2..];
            if tail.iter().any(|q| q.category.as_deref() != Some("Mecânica")) {
                tail_always_mechanics = false;
            }
        }
        assert!(!tail_always_mechanics);
    }

    #[test]
    fn shuffle_is_roughly_uniform() {
        // Every question of a 4-item bank should land in first position
        // about a quarter of the time.
        let bank = bank_with(&[("Legislação", 4)]);
        let pools = vec![PoolSpec::new("l", &["Legislação"], 4)];
        let mut sampler = StandardSampler::new(bank, pools, 30, SmallRng::seed_from_u64(2024));
        let mut firsts: HashMap<u64, usize> = HashMap::new();
        let rounds = 4000;
        for _ in 0..rounds {
            let drawn = sampler.sample();
            *firsts.entry(drawn[0].id).or_default() += 1;
        }
        for id in 1..=4 {
            let share = firsts.get(&id).copied().unwrap_or(0) as f64 / rounds as f64;
            assert!((share - 0.25).abs() < 0.05, "id {id} came first {share:.3} of the time");
        }
    }
}
