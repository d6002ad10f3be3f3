//! Rule-table driven text classifier shared by the archetype and build-type taxonomies.
//!
//! A [RuleTable] lists scored categories in priority order, each with its patterns. Every
//! matching pattern adds 1 to that category's weight; the heaviest category wins. Ties are
//! settled by [TieBreak] overrides first and the table order second. Text that scores
//! nothing falls back to the table's fallback category.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

/// Patterns that vote for one category.
#[derive(Debug, Clone)]
pub struct CategoryRule<C> {
    pub category: C,
    pub patterns: Vec<Regex>,
}

/// Prefer `prefer` among tied categories when `trigger` matches and `unless` does not.
#[derive(Debug, Clone)]
pub struct TieBreak<C> {
    pub trigger: Regex,
    pub unless: Option<Regex>,
    pub prefer: C,
}

/// Text matching `trigger` is classified as `category` regardless of weights.
#[derive(Debug, Clone)]
pub struct Exclusive<C> {
    pub trigger: Regex,
    pub category: C,
}

/// One pattern of `category` is not evaluated when `trigger` matches. The category's other
/// patterns still count.
#[derive(Debug, Clone)]
pub struct Suppression<C> {
    pub trigger: Regex,
    pub category: C,
    pub pattern: Regex,
}

impl<C: PartialEq> Suppression<C> {
    fn hides(&self, category: &C, pattern: &Regex) -> bool {
        self.category == *category && self.pattern.as_str() == pattern.as_str()
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable<C> {
    /// Scored categories, highest priority first.
    pub categories: Vec<CategoryRule<C>>,
    pub fallback: C,
    pub tie_breaks: Vec<TieBreak<C>>,
    pub exclusives: Vec<Exclusive<C>>,
    pub suppressions: Vec<Suppression<C>>,
}

impl<C> RuleTable<C> {
    pub fn new(fallback: C) -> Self {
        Self {
            categories: Vec::new(),
            fallback,
            tie_breaks: Vec::new(),
            exclusives: Vec::new(),
            suppressions: Vec::new(),
        }
    }

    pub fn category(mut self, category: C, patterns: &[&str]) -> Result<Self, regex::Error> {
        self.categories.push(CategoryRule {
            category,
            patterns: compile_all(patterns)?,
        });
        Ok(self)
    }

    pub fn tie_break(
        mut self,
        trigger: &str,
        unless: Option<&str>,
        prefer: C,
    ) -> Result<Self, regex::Error> {
        self.tie_breaks.push(TieBreak {
            trigger: compile(trigger)?,
            unless: unless.map(compile).transpose()?,
            prefer,
        });
        Ok(self)
    }

    pub fn exclusive(mut self, trigger: &str, category: C) -> Result<Self, regex::Error> {
        self.exclusives.push(Exclusive {
            trigger: compile(trigger)?,
            category,
        });
        Ok(self)
    }

    /// `pattern` must be spelled exactly as in the category's pattern list.
    pub fn suppress(mut self, trigger: &str, category: C, pattern: &str) -> Result<Self, regex::Error> {
        self.suppressions.push(Suppression {
            trigger: compile(trigger)?,
            category,
            pattern: compile(pattern)?,
        });
        Ok(self)
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){pattern}"))
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|pattern| compile(pattern)).collect()
}

/// Result of classifying one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification<C: Ord> {
    pub primary: C,
    /// Categories with a positive weight in table order, or just the fallback.
    pub tags: Vec<C>,
    /// One entry per scored category, including zero weights.
    pub weights: BTreeMap<C, u32>,
}

impl<C: Ord + Copy> Classification<C> {
    pub fn weight(&self, category: C) -> u32 {
        self.weights.get(&category).copied().unwrap_or(0)
    }

    pub fn has_tag(&self, category: C) -> bool {
        self.tags.contains(&category)
    }
}

/// Pure classifier over an injected [RuleTable].
#[derive(Debug, Clone)]
pub struct RuleClassifier<C> {
    table: RuleTable<C>,
}

impl<C: Copy + Ord> RuleClassifier<C> {
    pub fn new(table: RuleTable<C>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable<C> {
        &self.table
    }

    /// Classify `text`. `name` is only consulted by tie-break triggers.
    pub fn classify(&self, text: &str, name: &str) -> Classification<C> {
        let mut weights: BTreeMap<C, u32> = self
            .table
            .categories
            .iter()
            .map(|rule| (rule.category, 0))
            .collect();

        if text.trim().is_empty() {
            return Classification {
                primary: self.table.fallback,
                tags: vec![self.table.fallback],
                weights,
            };
        }

        let active: Vec<&Suppression<C>> = self
            .table
            .suppressions
            .iter()
            .filter(|rule| rule.trigger.is_match(text))
            .collect();

        for rule in &self.table.categories {
            let hits = rule
                .patterns
                .iter()
                .filter(|p| !active.iter().any(|s| s.hides(&rule.category, p)))
                .filter(|p| p.is_match(text))
                .count() as u32;
            if let Some(weight) = weights.get_mut(&rule.category) {
                *weight += hits;
            }
        }

        let tags: Vec<C> = self
            .table
            .categories
            .iter()
            .map(|rule| rule.category)
            .filter(|category| weights.get(category).copied().unwrap_or(0) > 0)
            .collect();

        let primary = self
            .table
            .exclusives
            .iter()
            .find(|rule| rule.trigger.is_match(text))
            .map(|rule| rule.category)
            .unwrap_or_else(|| self.pick_primary(&weights, text, name));

        let mut tags = if tags.is_empty() {
            vec![self.table.fallback]
        } else {
            tags
        };
        if !tags.contains(&primary) {
            tags.insert(0, primary);
        }

        Classification {
            primary,
            tags,
            weights,
        }
    }

    fn pick_primary(&self, weights: &BTreeMap<C, u32>, text: &str, name: &str) -> C {
        let max = weights.values().copied().max().unwrap_or(0);
        if max == 0 {
            return self.table.fallback;
        }

        // Table order doubles as the final priority order.
        let tied: Vec<C> = self
            .table
            .categories
            .iter()
            .map(|rule| rule.category)
            .filter(|category| weights.get(category).copied() == Some(max))
            .collect();
        if tied.len() == 1 {
            return tied[0];
        }

        let mentions = |re: &Regex| re.is_match(text) || re.is_match(name);
        for rule in &self.table.tie_breaks {
            if !tied.contains(&rule.prefer) || !mentions(&rule.trigger) {
                continue;
            }
            if rule.unless.as_ref().is_some_and(|unless| unless.is_match(text)) {
                continue;
            }
            return rule.prefer;
        }

        tied[0]
    }
}

#[cfg(test)]
mod tests {
    use super::{RuleClassifier, RuleTable};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Color {
        Red,
        Blue,
        Grey,
    }

    fn classifier() -> RuleClassifier<Color> {
        let table = RuleTable::new(Color::Grey)
            .category(Color::Red, &[r"\bred\b", r"crimson"])
            .and_then(|t| t.category(Color::Blue, &[r"\bblue\b", r"navy"]))
            .and_then(|t| t.tie_break(r"\bsky\b", Some(r"night"), Color::Blue))
            .expect("patterns compile");
        RuleClassifier::new(table)
    }

    #[test]
    fn counts_one_per_matching_pattern() {
        let result = classifier().classify("Crimson and red", "");
        assert_eq!(result.weight(Color::Red), 2);
        assert_eq!(result.weight(Color::Blue), 0);
        assert_eq!(result.primary, Color::Red);
        assert_eq!(result.tags, vec![Color::Red]);
    }

    #[test]
    fn empty_text_falls_back_with_zero_weights() {
        let result = classifier().classify("   ", "Red Thing");
        assert_eq!(result.primary, Color::Grey);
        assert!(result.weights.values().all(|w| *w == 0));
        assert_eq!(result.weights.len(), 2);
    }

    #[test]
    fn tie_uses_override_then_table_order() {
        let c = classifier();
        assert_eq!(c.classify("red blue", "").primary, Color::Red);
        assert_eq!(c.classify("red blue sky", "").primary, Color::Blue);
        assert_eq!(c.classify("red blue sky at night", "").primary, Color::Red);
        assert_eq!(c.classify("red blue", "Sky Piece").primary, Color::Blue);
    }

    #[test]
    fn suppression_hides_only_the_named_pattern() {
        let table = RuleTable::new(Color::Grey)
            .category(Color::Red, &[r"\bred\b", r"crimson"])
            .and_then(|t| t.suppress(r"\bdark red\b", Color::Red, r"\bred\b"))
            .expect("patterns compile");
        let c = RuleClassifier::new(table);

        let result = c.classify("dark red crimson", "");
        assert_eq!(result.weight(Color::Red), 1);
        assert_eq!(result.primary, Color::Red);
        assert_eq!(c.classify("dark red", "").primary, Color::Grey);
        assert_eq!(c.classify("bright red crimson", "").weight(Color::Red), 2);
    }

    #[test]
    fn unmatched_text_is_fallback() {
        let result = classifier().classify("green", "");
        assert_eq!(result.primary, Color::Grey);
        assert_eq!(result.tags, vec![Color::Grey]);
    }
}
