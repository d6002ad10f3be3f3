//! Capsule pair statistics in two phases: [accumulate_pairs] tallies co-occurrence from the
//! match history, then [PairTally::enrich] turns the tallies into a [SynergyMap] once the
//! per-capsule performance map exists.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::analytics::{CountedMatch, MatchTally, PerformanceMap};
use crate::classify::Archetype;
use crate::data::{Capsule, Catalog};

/// Canonical, order-independent key for a capsule pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, id: &str) -> bool {
        self.first == id || self.second == id
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.first, self.second)
    }
}

impl Serialize for PairKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SynergyType {
    Multiplicative,
    Complementary,
    AntiSynergy,
    Neutral,
}

/// Text heuristics used for the anti-synergy check.
#[derive(Debug, Clone)]
pub struct SynergyRules {
    pub defense_reduction: Regex,
    pub healing: Regex,
}

impl SynergyRules {
    pub fn standard() -> Result<Self, regex::Error> {
        Ok(Self {
            defense_reduction: Regex::new(
                r"(?i)\b(reduc|lower|decreas|cut|weaken|break)\w*\b.*\b(defen[cs]e|armou?r)|\b(defen[cs]e|armou?r) (down|reduction|break)",
            )?,
            healing: Regex::new(r"(?i)\b(heal|health|hp|recover|restor|regenerat)")?,
        })
    }

    fn lowers_defense_without_healing(&self, capsule: &Capsule) -> bool {
        self.defense_reduction.is_match(&capsule.effect) && !self.healing.is_match(&capsule.effect)
    }

    pub fn classify_pair(&self, a: &Capsule, b: &Capsule) -> SynergyType {
        let (left, right) = (a.primary_archetype(), b.primary_archetype());
        if left == right {
            return SynergyType::Multiplicative;
        }
        let complementary = matches!(
            (left, right),
            (Archetype::Aggressive, Archetype::Technical)
                | (Archetype::Technical, Archetype::Aggressive)
                | (Archetype::Defensive, Archetype::Technical)
                | (Archetype::Technical, Archetype::Defensive)
        );
        if complementary {
            return SynergyType::Complementary;
        }
        if self.lowers_defense_without_healing(a) && self.lowers_defense_without_healing(b) {
            return SynergyType::AntiSynergy;
        }
        SynergyType::Neutral
    }
}

/// First-phase pair statistics; no synergy bonus yet.
#[derive(Debug, Clone)]
pub struct PairStats {
    pub tally: MatchTally,
    pub synergy_type: SynergyType,
}

#[derive(Debug, Clone, Default)]
pub struct PairTally {
    pairs: BTreeMap<PairKey, PairStats>,
}

impl PairTally {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<&PairStats> {
        self.pairs.get(&PairKey::new(a, b))
    }

    /// Second phase: compare each pair against its members' individual performance.
    pub fn enrich(self, performance: &PerformanceMap) -> SynergyMap {
        let pairs = self
            .pairs
            .into_iter()
            .map(|(pair, stats)| {
                let synergy = PairSynergy::enrich(pair.clone(), stats, performance);
                (pair, synergy)
            })
            .collect();
        SynergyMap { pairs }
    }
}

pub fn accumulate_pairs(
    catalog: &Catalog,
    rules: &SynergyRules,
    matches: &[CountedMatch<'_>],
) -> PairTally {
    let mut tally = PairTally::default();
    for counted in matches {
        if counted.capsules.len() < 2 {
            continue;
        }
        for (index, &a) in counted.capsules.iter().enumerate() {
            for &b in &counted.capsules[index + 1..] {
                let pair = PairKey::new(a, b);
                let stats = tally.pairs.entry(pair).or_insert_with(|| PairStats {
                    tally: MatchTally::default(),
                    synergy_type: match (catalog.get(a), catalog.get(b)) {
                        (Some(left), Some(right)) => rules.classify_pair(left, right),
                        _ => SynergyType::Neutral,
                    },
                });
                stats.tally.record(counted);
            }
        }
    }
    tally
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSynergy {
    pub pair: PairKey,
    pub appearances: u32,
    pub wins: u32,
    pub pair_win_rate: f64,
    pub total_damage_dealt: f64,
    pub total_damage_taken: f64,
    pub avg_damage_dealt: f64,
    pub avg_damage_taken: f64,
    pub characters: BTreeSet<String>,
    pub synergy_type: SynergyType,
    /// Mean of the members' win rates; `None` when either member lacks performance data.
    pub expected_win_rate: Option<f64>,
    pub expected_damage: Option<f64>,
    /// Zero when the expectation is unavailable.
    pub synergy_bonus: f64,
}

impl PairSynergy {
    fn enrich(pair: PairKey, stats: PairStats, performance: &PerformanceMap) -> Self {
        let tally = stats.tally;
        let pair_win_rate = tally.win_rate();
        let avg_damage_dealt = tally.avg_damage_dealt();

        let members = performance
            .get(pair.first())
            .zip(performance.get(pair.second()));
        let (expected_win_rate, expected_damage, synergy_bonus) = match members {
            Some((a, b)) => {
                let expected_win_rate = (a.win_rate + b.win_rate) / 2.0;
                let expected_damage = (a.avg_damage_dealt + b.avg_damage_dealt) / 2.0;
                let bonus = 0.4 * (pair_win_rate - expected_win_rate)
                    + 0.6 * ((avg_damage_dealt - expected_damage) / 100.0);
                (Some(expected_win_rate), Some(expected_damage), bonus)
            }
            None => (None, None, 0.0),
        };

        Self {
            appearances: tally.matches,
            wins: tally.wins,
            pair_win_rate,
            total_damage_dealt: tally.damage_dealt,
            total_damage_taken: tally.damage_taken,
            avg_damage_dealt,
            avg_damage_taken: tally.avg_damage_taken(),
            characters: tally.characters,
            synergy_type: stats.synergy_type,
            expected_win_rate,
            expected_damage,
            synergy_bonus,
            pair,
        }
    }
}

/// Enriched pair statistics keyed by [PairKey]; lookups accept either member order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SynergyMap {
    pairs: BTreeMap<PairKey, PairSynergy>,
}

impl SynergyMap {
    pub fn get(&self, a: &str, b: &str) -> Option<&PairSynergy> {
        self.pairs.get(&PairKey::new(a, b))
    }

    pub fn bonus(&self, a: &str, b: &str) -> Option<f64> {
        self.get(a, b).map(|synergy| synergy.synergy_bonus)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PairSynergy> {
        self.pairs.values()
    }

    /// Highest synergy bonuses among pairs seen at least `min_appearances` times.
    pub fn top(&self, limit: usize, min_appearances: u32) -> Vec<&PairSynergy> {
        let mut ranked: Vec<&PairSynergy> = self
            .pairs
            .values()
            .filter(|synergy| synergy.appearances >= min_appearances)
            .collect();
        ranked.sort_by(|left, right| {
            right
                .synergy_bonus
                .total_cmp(&left.synergy_bonus)
                .then_with(|| left.pair.cmp(&right.pair))
        });
        ranked.truncate(limit);
        ranked
    }
}
