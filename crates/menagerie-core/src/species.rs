//! Species metadata, evolution rules and experience curves
//!
//! These are collaborator traits: the engine consumes them, it does not own
//! the data behind them. A built-in table implementation lives in
//! [`catalog`](crate::catalog); real deployments can substitute their own.

use crate::creature::Ability;
use crate::items::ItemKind;
use crate::SpeciesId;
use serde::{Deserialize, Serialize};

/// Experience growth family for a species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthRate {
    Fast,
    MediumFast,
    MediumSlow,
    Slow,
}

/// Coarse time-of-day bucket used by evolution rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,
    Morning,
    Day,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Bucket a local hour (0-23)
    pub fn from_hour(hour: u32) -> TimeOfDay {
        match hour {
            5..=6 => TimeOfDay::Dawn,
            7..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Day,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    /// Dawn is treated as morning everywhere evolution rules are evaluated
    pub fn collapse_dawn(self) -> TimeOfDay {
        if self == TimeOfDay::Dawn {
            TimeOfDay::Morning
        } else {
            self
        }
    }
}

/// How a species evolves, if it does
#[derive(Debug, Clone, Copy)]
pub struct EvolutionRule {
    /// The species evolved into
    pub into: SpeciesId,
    /// Minimum level, ignored when an item requirement is present
    pub min_level: u8,
    /// Required time-of-day bucket, if any
    pub time: Option<TimeOfDay>,
    /// Required held item, if any
    pub item: Option<ItemKind>,
    /// Whether the evolved form is selected by the player's branch argument
    pub branched: bool,
    /// Secondary species emitted alongside the evolution (split-form case)
    pub split: Option<SpeciesId>,
}

/// Static data for one species
#[derive(Debug, Clone)]
pub struct SpeciesData {
    pub id: SpeciesId,
    pub name: &'static str,
    /// Form names; index 0 is the default form with no display suffix
    pub forms: &'static [&'static str],
    pub base_experience: u16,
    pub growth: GrowthRate,
    pub base_friendship: u8,
    pub hatch_cycles: u8,
    pub abilities: [Ability; 2],
    pub is_legendary: bool,
    /// Breeding wildcard: pairs with any non-mirror partner
    pub is_mirror: bool,
    pub evolution: Option<EvolutionRule>,
}

/// Species/ability/form metadata lookup
///
/// Implementations are shared by reference across the dispatcher, so they
/// must be thread-safe.
pub trait SpeciesCatalog: Send + Sync {
    /// Full data for a species
    fn get(&self, id: SpeciesId) -> Option<&SpeciesData>;

    /// Resolve a species name, case-insensitively
    fn by_name(&self, name: &str) -> Option<SpeciesId>;

    /// The pool the species roll draws uniformly from
    fn pool(&self) -> &[SpeciesId];

    /// Species only distributed at the cherish tier
    fn cherish_only(&self) -> &[SpeciesId];

    /// Registry size that counts as a completed dex
    fn dex_size(&self) -> usize {
        self.pool().len()
    }

    /// Species name, or a placeholder for an unknown id
    fn name_of(&self, id: SpeciesId) -> &str {
        self.get(id).map(|s| s.name).unwrap_or("???")
    }

    /// Display suffix for a form index ("" for the default form)
    fn form_suffix(&self, id: SpeciesId, form: u8) -> String {
        match self.get(id) {
            Some(data) if form > 0 => data
                .forms
                .get(form as usize)
                .map(|f| format!("-{f}"))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// "Name" or "Name-Form" display string
    fn display(&self, id: SpeciesId, form: u8) -> String {
        format!("{}{}", self.name_of(id), self.form_suffix(id, form))
    }

    /// Whether a species is flagged legendary
    fn is_legendary(&self, id: SpeciesId) -> bool {
        self.get(id).map(|s| s.is_legendary).unwrap_or(false)
    }

    /// Resolve a branch-form argument against every known form name
    ///
    /// The front end's branch argument names a form, not a species, so any
    /// species' form list may match.
    fn branch_form_index(&self, name: &str) -> Option<u8> {
        let wanted = name.trim().to_lowercase();
        for id in self.pool() {
            if let Some(data) = self.get(*id) {
                for (index, form) in data.forms.iter().enumerate() {
                    if !form.is_empty() && form.to_lowercase() == wanted {
                        return Some(index as u8);
                    }
                }
            }
        }
        None
    }
}

/// Outcome of a resolved evolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionOutcome {
    pub species: SpeciesId,
    pub form: u8,
    /// Secondary species to register as a brand-new catch
    pub split: Option<SpeciesId>,
}

/// Evolution-rules resolver
pub trait EvolutionResolver: Send + Sync {
    /// The base-evolution ancestor of a species (itself when unevolved)
    fn base_species(&self, id: SpeciesId) -> SpeciesId;

    /// Resolve a transition, or `None` when the creature cannot evolve under
    /// the given conditions
    fn evolve(
        &self,
        species: SpeciesId,
        level: u8,
        time: TimeOfDay,
        held_item: Option<ItemKind>,
        branch: Option<u8>,
    ) -> Option<EvolutionOutcome>;
}

/// Experience-curve table: total experience required to be at a level
pub trait ExperienceCurve: Send + Sync {
    fn exp_at(&self, level: u8, growth: GrowthRate) -> u32;
}

/// The classic cubic growth formulas
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCurve;

impl ExperienceCurve for StandardCurve {
    fn exp_at(&self, level: u8, growth: GrowthRate) -> u32 {
        let n = level as i64;
        let exp = match growth {
            GrowthRate::Fast => 4 * n * n * n / 5,
            GrowthRate::MediumFast => n * n * n,
            GrowthRate::MediumSlow => 6 * n * n * n / 5 - 15 * n * n + 100 * n - 140,
            GrowthRate::Slow => 5 * n * n * n / 4,
        };
        exp.max(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_buckets() {
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Dawn);
        assert_eq!(TimeOfDay::from_hour(9), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(13), TimeOfDay::Day);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(2), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
    }

    #[test]
    fn test_dawn_collapses_into_morning() {
        assert_eq!(TimeOfDay::Dawn.collapse_dawn(), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::Night.collapse_dawn(), TimeOfDay::Night);
    }

    #[test]
    fn test_curves_are_monotonic() {
        let curve = StandardCurve;
        for growth in [
            GrowthRate::Fast,
            GrowthRate::MediumFast,
            GrowthRate::MediumSlow,
            GrowthRate::Slow,
        ] {
            for level in 2..=100u8 {
                assert!(
                    curve.exp_at(level, growth) > curve.exp_at(level - 1, growth),
                    "curve not monotonic for {growth:?} at level {level}"
                );
            }
        }
    }

    #[test]
    fn test_medium_fast_is_cubic() {
        let curve = StandardCurve;
        assert_eq!(curve.exp_at(10, GrowthRate::MediumFast), 1000);
        assert_eq!(curve.exp_at(100, GrowthRate::MediumFast), 1_000_000);
    }
}
