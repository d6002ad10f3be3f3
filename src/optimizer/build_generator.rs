//! Randomized-greedy build search.
//!
//! Each attempt shuffles the capsule pool and fills slots one at a time with the best
//! affordable capsule. Attempts that end too small or break the ruleset are dropped; the
//! rest are deduplicated by member set. The attempt budget is `max_builds * 10`, so fewer
//! builds than requested is a normal outcome for tight rulesets.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use tracing::debug;

use crate::data::{Capsule, Catalog, Ruleset};
use crate::optimizer::scorer::{mean, score_build, ScoreTarget, ScoringContext};
use crate::optimizer::validator::validate_build;
use crate::optimizer::BuildCandidate;
use crate::parallel::WorkerPool;

pub const ATTEMPTS_PER_BUILD: usize = 10;
pub const DEFAULT_MIN_CAPSULES: usize = 3;
const SYNERGY_PICK_WEIGHT: f64 = 0.5;
const STRATEGY_PICK_WEIGHT: f64 = 0.3;
const ARCHETYPE_PICK_BONUS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub max_builds: usize,
    /// Attempts ending with fewer capsules are discarded.
    pub min_capsules: usize,
    pub prefer_synergy: bool,
    pub target: ScoreTarget,
    /// Drops capsules bound to other characters.
    pub character: Option<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            max_builds: 5,
            min_capsules: DEFAULT_MIN_CAPSULES,
            prefer_synergy: true,
            target: ScoreTarget::default(),
            character: None,
        }
    }
}

impl GeneratorSettings {
    pub fn max_attempts(&self) -> usize {
        self.max_builds.saturating_mul(ATTEMPTS_PER_BUILD)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildGenerator<'a> {
    catalog: &'a Catalog,
    context: ScoringContext<'a>,
    ruleset: &'a Ruleset,
}

impl<'a> BuildGenerator<'a> {
    pub fn new(catalog: &'a Catalog, context: ScoringContext<'a>, ruleset: &'a Ruleset) -> Self {
        Self {
            catalog,
            context,
            ruleset,
        }
    }

    /// Capsules eligible for this request: not banned and available to the character.
    pub fn pool(&self, settings: &GeneratorSettings) -> Vec<&'a Capsule> {
        self.catalog
            .capsules()
            .iter()
            .filter(|capsule| !self.ruleset.is_banned(&capsule.id))
            .filter(|capsule| capsule.is_available_to(settings.character.as_deref()))
            .collect()
    }

    fn required(&self, pool: &[&'a Capsule]) -> Vec<&'a Capsule> {
        let mut required: Vec<&'a Capsule> = Vec::new();
        for id in &self.ruleset.required_capsules {
            if let Some(capsule) = pool.iter().copied().find(|capsule| &capsule.id == id) {
                if !required.iter().any(|chosen| chosen.id == capsule.id) {
                    required.push(capsule);
                }
            }
        }
        required
    }

    /// Greedy desirability of adding `capsule` to `chosen`.
    pub fn pick_score(
        &self,
        capsule: &Capsule,
        chosen: &[&Capsule],
        settings: &GeneratorSettings,
    ) -> f64 {
        let mut score = self.context.composite_score(&capsule.id).unwrap_or(0.0);
        if settings.prefer_synergy {
            let bonuses = self.context.pair_bonuses(capsule, chosen);
            score += SYNERGY_PICK_WEIGHT * mean(&bonuses).unwrap_or(0.0);
        }
        if let Some(strategy) = settings.target.strategy.as_deref() {
            score += STRATEGY_PICK_WEIGHT
                * self
                    .context
                    .strategy_score(strategy, &capsule.id)
                    .unwrap_or(0.0);
        }
        if settings.target.archetype == Some(capsule.primary_archetype()) {
            score += ARCHETYPE_PICK_BONUS;
        }
        score
    }

    /// One shuffled greedy fill. `None` when the result is too small or invalid.
    pub fn attempt<R: Rng + ?Sized>(
        &self,
        settings: &GeneratorSettings,
        pool: &[&'a Capsule],
        rng: &mut R,
    ) -> Option<BuildCandidate<'a>> {
        let mut order: Vec<&'a Capsule> = pool.to_vec();
        order.shuffle(rng);

        let mut chosen = self.required(pool);
        let mut taken: HashSet<&'a str> = chosen.iter().map(|&capsule| capsule.id.as_str()).collect();
        let mut total_cost: u32 = chosen.iter().map(|capsule| capsule.cost).sum();

        while chosen.len() < self.ruleset.max_capsules {
            let mut best: Option<(&'a Capsule, f64)> = None;
            for &capsule in &order {
                if taken.contains(capsule.id.as_str())
                    || total_cost.saturating_add(capsule.cost) > self.ruleset.max_cost
                {
                    continue;
                }
                let score = self.pick_score(capsule, &chosen, settings);
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((capsule, score));
                }
            }
            let Some((capsule, _)) = best else {
                break;
            };
            taken.insert(capsule.id.as_str());
            total_cost += capsule.cost;
            chosen.push(capsule);
        }

        if chosen.len() < settings.min_capsules {
            return None;
        }
        let validation = validate_build(&chosen, self.ruleset);
        if !validation.valid {
            return None;
        }
        let score = score_build(&chosen, self.context, self.ruleset, &settings.target);
        Some(BuildCandidate::new(chosen, score, validation))
    }

    /// Sequential search driven by the caller's random source.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        settings: &GeneratorSettings,
        rng: &mut R,
    ) -> Vec<BuildCandidate<'a>> {
        let pool = self.pool(settings);
        let max_attempts = settings.max_attempts();
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut attempts = 0usize;

        while attempts < max_attempts && accepted.len() < settings.max_builds {
            attempts += 1;
            if let Some(candidate) = self.attempt(settings, &pool, rng) {
                if seen.insert(candidate.key()) {
                    accepted.push(candidate);
                }
            }
        }

        debug!(
            attempts,
            accepted = accepted.len(),
            pool = pool.len(),
            "build generation finished"
        );
        sort_candidates(&mut accepted);
        accepted
    }

    /// Runs the whole attempt budget on `workers`, attempt `i` seeded from `seed` and `i`,
    /// then merges in attempt order. Same seed, same builds.
    pub fn generate_parallel(
        &self,
        settings: &GeneratorSettings,
        seed: u64,
        workers: &WorkerPool,
    ) -> Vec<BuildCandidate<'a>> {
        let pool = self.pool(settings);
        let max_attempts = settings.max_attempts();

        let outcomes: Vec<Option<BuildCandidate<'a>>> = workers.install(|| {
            (0..max_attempts)
                .into_par_iter()
                .map(|attempt| {
                    let mut rng = Pcg64::seed_from_u64(attempt_seed(seed, attempt));
                    self.attempt(settings, &pool, &mut rng)
                })
                .collect()
        });

        let mut seen = HashSet::new();
        let mut accepted: Vec<BuildCandidate<'a>> = outcomes
            .into_iter()
            .flatten()
            .filter(|candidate| seen.insert(candidate.key()))
            .take(settings.max_builds)
            .collect();

        debug!(
            attempts = max_attempts,
            accepted = accepted.len(),
            pool = pool.len(),
            "parallel build generation finished"
        );
        sort_candidates(&mut accepted);
        accepted
    }
}

fn attempt_seed(seed: u64, attempt: usize) -> u64 {
    seed ^ (attempt as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Best total score first; member key settles ties.
pub fn sort_candidates(candidates: &mut [BuildCandidate<'_>]) {
    candidates.sort_by(|left, right| {
        right
            .score
            .total_score
            .total_cmp(&left.score.total_score)
            .then_with(|| left.key().cmp(&right.key()))
    });
}
