//! Dataset checks for the catalog and match corpus, reported as diagnostics rather than
//! failures so a partially broken export can still be analysed.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::data::{CapsuleDefinition, MatchCorpus, MAX_EQUIPPED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

pub fn validate_catalog(rows: &[CapsuleDefinition]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_ids = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        let id = row.id.trim();
        let context = format!("capsule[{index}]");
        if id.is_empty() {
            report.push(ValidationSeverity::Error, format!("{context}.id"), "missing non-empty 'id'");
        } else if !seen_ids.insert(id) {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.id"),
                format!("duplicate id '{id}'"),
            );
        }

        if row.name.trim().is_empty() {
            report.push(
                ValidationSeverity::Warning,
                format!("{context} id='{id}'.name"),
                "missing name",
            );
        }
        if row.effect.trim().is_empty() {
            report.push(
                ValidationSeverity::Info,
                format!("{context} id='{id}'.effect"),
                "empty effect text; capsule will classify as utility",
            );
        }
    }

    report
}

pub fn validate_corpus(corpus: &MatchCorpus, rows: &[CapsuleDefinition]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let known: HashSet<&str> = rows.iter().map(|row| row.id.trim()).collect();
    let mut reported_unknown = HashSet::new();

    for (character_index, record) in corpus.characters.iter().enumerate() {
        if record.character.trim().is_empty() {
            report.push(
                ValidationSeverity::Warning,
                format!("character[{character_index}]"),
                "missing character name",
            );
        }

        for (match_index, entry) in record.matches.iter().enumerate() {
            let context = format!("{}.matches[{match_index}]", record.character);
            let equipped = entry.equipped();

            if equipped.len() > MAX_EQUIPPED {
                report.push(
                    ValidationSeverity::Error,
                    format!("{context}.capsules"),
                    format!("{} capsules equipped (max {MAX_EQUIPPED})", equipped.len()),
                );
            }
            let non_blank = entry.capsules.iter().filter(|id| !id.trim().is_empty()).count();
            if non_blank != equipped.len() {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{context}.capsules"),
                    "duplicate capsule ids in one match",
                );
            }
            for id in equipped {
                if !known.contains(id) && reported_unknown.insert(id.to_string()) {
                    report.push(
                        ValidationSeverity::Warning,
                        format!("{context}.capsules"),
                        format!("unknown capsule id '{id}' (ignored by analytics)"),
                    );
                }
            }

            for (field, value) in [
                ("damageDealt", entry.damage_dealt),
                ("damageTaken", entry.damage_taken),
                ("hpRemaining", entry.hp_remaining),
                ("hpMax", entry.hp_max),
                ("battleTime", entry.battle_time),
            ] {
                if value < 0.0 || !value.is_finite() {
                    report.push(
                        ValidationSeverity::Error,
                        format!("{context}.{field}"),
                        format!("expected a finite non-negative number, got {value}"),
                    );
                }
            }
            if entry.hp_max > 0.0 && entry.hp_remaining > entry.hp_max {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{context}.hpRemaining"),
                    "hpRemaining exceeds hpMax",
                );
            }
        }
    }

    report
}
