//! Built-in static species catalog
//!
//! A self-contained table implementing [`SpeciesCatalog`] and
//! [`EvolutionResolver`]. Deployments with richer metadata can swap in their
//! own implementation; the engine only ever talks to the traits.

use crate::creature::Ability;
use crate::items::ItemKind;
use crate::species::{
    EvolutionOutcome, EvolutionResolver, EvolutionRule, GrowthRate, SpeciesCatalog, SpeciesData,
    TimeOfDay,
};
use crate::SpeciesId;

pub const EMBERLING: SpeciesId = SpeciesId(1);
pub const PYRELISK: SpeciesId = SpeciesId(2);
pub const INFERNYX: SpeciesId = SpeciesId(3);
pub const RIPLET: SpeciesId = SpeciesId(4);
pub const TIDARUN: SpeciesId = SpeciesId(5);
pub const TORRENTIDE: SpeciesId = SpeciesId(6);
pub const SPRIGIT: SpeciesId = SpeciesId(7);
pub const THORNWICK: SpeciesId = SpeciesId(8);
pub const BRAMBLOOM: SpeciesId = SpeciesId(9);
pub const VOLTINE: SpeciesId = SpeciesId(10);
pub const FULGORA: SpeciesId = SpeciesId(11);
pub const UMBRAT: SpeciesId = SpeciesId(12);
pub const NOCTURNYX: SpeciesId = SpeciesId(13);
pub const LARVAGLOW: SpeciesId = SpeciesId(14);
pub const AURORAYNE: SpeciesId = SpeciesId(15);
pub const HUSKLIT: SpeciesId = SpeciesId(16);
pub const CICADRONE: SpeciesId = SpeciesId(17);
pub const HOLLOWSHELL: SpeciesId = SpeciesId(18);
pub const MIRRORLING: SpeciesId = SpeciesId(19);
pub const FERROLING: SpeciesId = SpeciesId(20);
pub const FERROTITAN: SpeciesId = SpeciesId(21);
pub const CHIMERANT: SpeciesId = SpeciesId(22);
pub const UMBRYS: SpeciesId = SpeciesId(23);
pub const SOLCREST: SpeciesId = SpeciesId(24);
pub const LUNAVANE: SpeciesId = SpeciesId(25);
pub const PEBBLIT: SpeciesId = SpeciesId(26);
pub const BOULDERON: SpeciesId = SpeciesId(27);
pub const CREAMLING: SpeciesId = SpeciesId(28);
pub const GATEAUX: SpeciesId = SpeciesId(29);
pub const GALEWING: SpeciesId = SpeciesId(30);

const DEFAULT_FORM: &[&str] = &[""];

macro_rules! species {
    ($id:expr, $name:expr, $forms:expr, $bexp:expr, $growth:expr, $friend:expr, $hatch:expr,
     $abilities:expr, legendary: $leg:expr, mirror: $mirror:expr, evolution: $evo:expr) => {
        SpeciesData {
            id: $id,
            name: $name,
            forms: $forms,
            base_experience: $bexp,
            growth: $growth,
            base_friendship: $friend,
            hatch_cycles: $hatch,
            abilities: $abilities,
            is_legendary: $leg,
            is_mirror: $mirror,
            evolution: $evo,
        }
    };
}

fn level_evolution(into: SpeciesId, min_level: u8) -> Option<EvolutionRule> {
    Some(EvolutionRule {
        into,
        min_level,
        time: None,
        item: None,
        branched: false,
        split: None,
    })
}

fn item_evolution(into: SpeciesId, item: ItemKind) -> Option<EvolutionRule> {
    Some(EvolutionRule {
        into,
        min_level: 0,
        time: None,
        item: Some(item),
        branched: false,
        split: None,
    })
}

fn species_table() -> Vec<SpeciesData> {
    use GrowthRate::*;
    vec![
        species!(EMBERLING, "Emberling", DEFAULT_FORM, 62, MediumFast, 70, 20,
            [Ability::FLAME_AURA, Ability::THICK_HIDE], legendary: false, mirror: false,
            evolution: level_evolution(PYRELISK, 16)),
        species!(PYRELISK, "Pyrelisk", DEFAULT_FORM, 142, MediumFast, 70, 20,
            [Ability::FLAME_AURA, Ability::THICK_HIDE], legendary: false, mirror: false,
            evolution: level_evolution(INFERNYX, 36)),
        species!(INFERNYX, "Infernyx", DEFAULT_FORM, 240, MediumFast, 70, 20,
            [Ability::FLAME_AURA, Ability::THICK_HIDE], legendary: false, mirror: false,
            evolution: None),
        species!(RIPLET, "Riplet", DEFAULT_FORM, 63, MediumSlow, 70, 20,
            [Ability::SWIFT_CURRENT, Ability::STEAM_VENT], legendary: false, mirror: false,
            evolution: level_evolution(TIDARUN, 18)),
        species!(TIDARUN, "Tidarun", DEFAULT_FORM, 142, MediumSlow, 70, 20,
            [Ability::SWIFT_CURRENT, Ability::STEAM_VENT], legendary: false, mirror: false,
            evolution: level_evolution(TORRENTIDE, 36)),
        species!(TORRENTIDE, "Torrentide", DEFAULT_FORM, 239, MediumSlow, 70, 20,
            [Ability::SWIFT_CURRENT, Ability::STEAM_VENT], legendary: false, mirror: false,
            evolution: None),
        species!(SPRIGIT, "Sprigit", DEFAULT_FORM, 64, MediumSlow, 70, 20,
            [Ability::OVERGROWTH, Ability::FORAGER], legendary: false, mirror: false,
            evolution: level_evolution(THORNWICK, 17)),
        species!(THORNWICK, "Thornwick", DEFAULT_FORM, 141, MediumSlow, 70, 20,
            [Ability::OVERGROWTH, Ability::FORAGER], legendary: false, mirror: false,
            evolution: item_evolution(BRAMBLOOM, ItemKind::LeafStone)),
        species!(BRAMBLOOM, "Brambloom", DEFAULT_FORM, 236, MediumSlow, 70, 20,
            [Ability::OVERGROWTH, Ability::FORAGER], legendary: false, mirror: false,
            evolution: None),
        species!(VOLTINE, "Voltine", DEFAULT_FORM, 60, MediumFast, 70, 20,
            [Ability::STATIC_CHARGE, Ability::SWIFT_CURRENT], legendary: false, mirror: false,
            evolution: item_evolution(FULGORA, ItemKind::ThunderStone)),
        species!(FULGORA, "Fulgora", DEFAULT_FORM, 228, MediumFast, 70, 20,
            [Ability::STATIC_CHARGE, Ability::SWIFT_CURRENT], legendary: false, mirror: false,
            evolution: None),
        species!(UMBRAT, "Umbrat", DEFAULT_FORM, 55, Fast, 70, 15,
            [Ability::NIGHT_VEIL, Ability::FILCHER], legendary: false, mirror: false,
            evolution: Some(EvolutionRule {
                into: NOCTURNYX,
                min_level: 20,
                time: Some(TimeOfDay::Night),
                item: None,
                branched: false,
                split: None,
            })),
        species!(NOCTURNYX, "Nocturnyx", DEFAULT_FORM, 160, Fast, 70, 15,
            [Ability::NIGHT_VEIL, Ability::FILCHER], legendary: false, mirror: false,
            evolution: None),
        species!(LARVAGLOW, "Larvaglow", DEFAULT_FORM, 58, Slow, 70, 25,
            [Ability::LUMINOUS, Ability::FLAME_AURA], legendary: false, mirror: false,
            evolution: Some(EvolutionRule {
                into: AURORAYNE,
                min_level: 25,
                time: Some(TimeOfDay::Morning),
                item: None,
                branched: false,
                split: None,
            })),
        species!(AURORAYNE, "Aurorayne", DEFAULT_FORM, 200, Slow, 70, 25,
            [Ability::LUMINOUS, Ability::FLAME_AURA], legendary: false, mirror: false,
            evolution: None),
        species!(HUSKLIT, "Husklit", DEFAULT_FORM, 53, MediumFast, 70, 15,
            [Ability::THICK_HIDE, Ability::STONE_GUARD], legendary: false, mirror: false,
            evolution: Some(EvolutionRule {
                into: CICADRONE,
                min_level: 20,
                time: None,
                item: None,
                branched: false,
                split: Some(HOLLOWSHELL),
            })),
        species!(CICADRONE, "Cicadrone", DEFAULT_FORM, 155, MediumFast, 70, 15,
            [Ability::THICK_HIDE, Ability::SWIFT_CURRENT], legendary: false, mirror: false,
            evolution: None),
        species!(HOLLOWSHELL, "Hollowshell", DEFAULT_FORM, 130, MediumFast, 70, 15,
            [Ability::NIGHT_VEIL, Ability::STONE_GUARD], legendary: false, mirror: false,
            evolution: None),
        species!(MIRRORLING, "Mirrorling", DEFAULT_FORM, 101, MediumFast, 70, 20,
            [Ability::MIRROR_SKIN, Ability::MIRROR_SKIN], legendary: false, mirror: true,
            evolution: None),
        species!(FERROLING, "Ferroling", DEFAULT_FORM, 70, Slow, 70, 30,
            [Ability::STONE_GUARD, Ability::THICK_HIDE], legendary: false, mirror: false,
            evolution: level_evolution(FERROTITAN, 40)),
        species!(FERROTITAN, "Ferrotitan", DEFAULT_FORM, 270, Slow, 70, 30,
            [Ability::STONE_GUARD, Ability::THICK_HIDE], legendary: false, mirror: false,
            evolution: None),
        species!(CHIMERANT, "Chimerant", &["", "Aspect"], 257, MediumFast, 35, 60,
            [Ability::THICK_HIDE, Ability::SWIFT_CURRENT], legendary: false, mirror: false,
            evolution: None),
        species!(UMBRYS, "Umbrys", &["", "Origin"], 300, Slow, 35, 120,
            [Ability::NIGHT_VEIL, Ability::NIGHT_VEIL], legendary: true, mirror: false,
            evolution: None),
        species!(SOLCREST, "Solcrest", DEFAULT_FORM, 290, Slow, 35, 120,
            [Ability::LUMINOUS, Ability::LUMINOUS], legendary: true, mirror: false,
            evolution: None),
        species!(LUNAVANE, "Lunavane", DEFAULT_FORM, 280, Slow, 35, 120,
            [Ability::NIGHT_VEIL, Ability::LUMINOUS], legendary: true, mirror: false,
            evolution: None),
        species!(PEBBLIT, "Pebblit", DEFAULT_FORM, 60, MediumSlow, 70, 20,
            [Ability::STONE_GUARD, Ability::THICK_HIDE], legendary: false, mirror: false,
            evolution: level_evolution(BOULDERON, 25)),
        species!(BOULDERON, "Boulderon", DEFAULT_FORM, 175, MediumSlow, 70, 20,
            [Ability::STONE_GUARD, Ability::THICK_HIDE], legendary: false, mirror: false,
            evolution: None),
        species!(CREAMLING, "Creamling", DEFAULT_FORM, 68, Fast, 70, 20,
            [Ability::LUMINOUS, Ability::FORAGER], legendary: false, mirror: false,
            evolution: Some(EvolutionRule {
                into: GATEAUX,
                min_level: 0,
                time: None,
                item: Some(ItemKind::HoneySweet),
                branched: true,
                split: None,
            })),
        species!(GATEAUX, "Gateaux", &["", "Caramel", "Ruby"], 210, Fast, 70, 20,
            [Ability::LUMINOUS, Ability::FORAGER], legendary: false, mirror: false,
            evolution: None),
        species!(GALEWING, "Galewing", DEFAULT_FORM, 66, MediumFast, 70, 15,
            [Ability::SWIFT_CURRENT, Ability::FORAGER], legendary: false, mirror: false,
            evolution: None),
    ]
}

/// The built-in catalog
#[derive(Debug)]
pub struct StaticCatalog {
    species: Vec<SpeciesData>,
    pool: Vec<SpeciesId>,
    cherish_only: Vec<SpeciesId>,
}

impl StaticCatalog {
    /// Build the catalog from the built-in table
    pub fn new() -> Self {
        let species = species_table();
        let pool = species.iter().map(|s| s.id).collect();
        Self {
            species,
            pool,
            cherish_only: vec![LUNAVANE],
        }
    }

}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeciesCatalog for StaticCatalog {
    fn get(&self, id: SpeciesId) -> Option<&SpeciesData> {
        self.species.iter().find(|s| s.id == id)
    }

    fn by_name(&self, name: &str) -> Option<SpeciesId> {
        let wanted = name.trim().to_lowercase();
        self.species
            .iter()
            .find(|s| s.name.to_lowercase() == wanted)
            .map(|s| s.id)
    }

    fn pool(&self) -> &[SpeciesId] {
        &self.pool
    }

    fn cherish_only(&self) -> &[SpeciesId] {
        &self.cherish_only
    }
}

impl EvolutionResolver for StaticCatalog {
    fn base_species(&self, id: SpeciesId) -> SpeciesId {
        let mut current = id;
        loop {
            let parent = self
                .species
                .iter()
                .find(|s| s.evolution.map(|e| e.into) == Some(current));
            match parent {
                Some(p) => current = p.id,
                None => return current,
            }
        }
    }

    fn evolve(
        &self,
        species: SpeciesId,
        level: u8,
        time: TimeOfDay,
        held_item: Option<ItemKind>,
        branch: Option<u8>,
    ) -> Option<EvolutionOutcome> {
        let rule = self.get(species)?.evolution?;

        if let Some(required) = rule.item {
            if held_item != Some(required) {
                return None;
            }
        } else if level < rule.min_level {
            return None;
        }

        if let Some(required_time) = rule.time {
            if time.collapse_dawn() != required_time {
                return None;
            }
        }

        let target_forms = self.get(rule.into).map(|s| s.forms.len()).unwrap_or(1);
        let form = if rule.branched {
            branch
                .filter(|b| (*b as usize) < target_forms)
                .unwrap_or(0)
        } else {
            0
        };

        Some(EvolutionOutcome {
            species: rule.into,
            form,
            split: rule.split,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let catalog = StaticCatalog::new();
        assert_eq!(catalog.by_name("emberling"), Some(EMBERLING));
        assert_eq!(catalog.by_name("Ferrotitan"), Some(FERROTITAN));
        assert_eq!(catalog.by_name("no-such"), None);
    }

    #[test]
    fn test_base_species_walks_the_chain() {
        let catalog = StaticCatalog::new();
        assert_eq!(catalog.base_species(INFERNYX), EMBERLING);
        assert_eq!(catalog.base_species(PYRELISK), EMBERLING);
        assert_eq!(catalog.base_species(EMBERLING), EMBERLING);
        assert_eq!(catalog.base_species(MIRRORLING), MIRRORLING);
    }

    #[test]
    fn test_level_evolution() {
        let catalog = StaticCatalog::new();
        assert!(catalog
            .evolve(EMBERLING, 15, TimeOfDay::Day, None, None)
            .is_none());
        let outcome = catalog
            .evolve(EMBERLING, 16, TimeOfDay::Day, None, None)
            .unwrap();
        assert_eq!(outcome.species, PYRELISK);
        assert_eq!(outcome.split, None);
    }

    #[test]
    fn test_time_gated_evolution() {
        let catalog = StaticCatalog::new();
        assert!(catalog
            .evolve(UMBRAT, 30, TimeOfDay::Day, None, None)
            .is_none());
        assert!(catalog
            .evolve(UMBRAT, 30, TimeOfDay::Night, None, None)
            .is_some());
        // Dawn counts as morning for the morning-gated line
        assert!(catalog
            .evolve(LARVAGLOW, 30, TimeOfDay::Dawn, None, None)
            .is_some());
    }

    #[test]
    fn test_item_evolution_ignores_level() {
        let catalog = StaticCatalog::new();
        assert!(catalog
            .evolve(THORNWICK, 1, TimeOfDay::Day, Some(ItemKind::LeafStone), None)
            .is_some());
        assert!(catalog
            .evolve(THORNWICK, 99, TimeOfDay::Day, None, None)
            .is_none());
    }

    #[test]
    fn test_split_evolution() {
        let catalog = StaticCatalog::new();
        let outcome = catalog
            .evolve(HUSKLIT, 20, TimeOfDay::Day, None, None)
            .unwrap();
        assert_eq!(outcome.species, CICADRONE);
        assert_eq!(outcome.split, Some(HOLLOWSHELL));
    }

    #[test]
    fn test_branched_evolution_selects_form() {
        let catalog = StaticCatalog::new();
        let outcome = catalog
            .evolve(
                CREAMLING,
                5,
                TimeOfDay::Day,
                Some(ItemKind::HoneySweet),
                Some(2),
            )
            .unwrap();
        assert_eq!(outcome.species, GATEAUX);
        assert_eq!(outcome.form, 2);

        // Out-of-range branch falls back to the default form
        let outcome = catalog
            .evolve(
                CREAMLING,
                5,
                TimeOfDay::Day,
                Some(ItemKind::HoneySweet),
                Some(9),
            )
            .unwrap();
        assert_eq!(outcome.form, 0);
    }

    #[test]
    fn test_branch_form_lookup() {
        let catalog = StaticCatalog::new();
        assert_eq!(catalog.branch_form_index("ruby"), Some(2));
        assert_eq!(catalog.branch_form_index("Origin"), Some(1));
        assert_eq!(catalog.branch_form_index("unknown"), None);
    }
}
