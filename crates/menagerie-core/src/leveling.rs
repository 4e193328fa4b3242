//! Buddy progression: experience, friendship and egg hatching
//!
//! Runs once per successful catch event against the current buddy. An egg
//! buddy counts down toward hatching instead of gaining experience; the
//! countdown lives in the friendship field while the egg flag is set.

use crate::creature::{Creature, FRIENDSHIP_CAP, LEVEL_CAP};
use crate::error::{Error, Result};
use crate::items::ItemKind;
use crate::species::{ExperienceCurve, SpeciesCatalog};

/// Experience subtracted from the hatch countdown per catch event
const HATCH_STEP: u8 = 5;

/// Gains below this floor are raised to [`MIN_GAIN_SUBSTITUTE`]
const MIN_GAIN_FLOOR: u32 = 100;

/// The substituted minimum experience award
const MIN_GAIN_SUBSTITUTE: u32 = 175;

/// Friendship gained per level-up
const FRIENDSHIP_PER_LEVEL: u8 = 2;

/// Held calm bell bonus per catch event
const BELL_BONUS: u8 = 2;

/// Bonus for a shiny encounter
const SHINY_BONUS: u8 = 5;

/// What happened to the buddy this catch event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuddyProgress {
    /// Egg countdown ticked down, still unhatched
    HatchTick,
    /// The egg hatched; carries the hatched creature's display nickname
    Hatched { nickname: String },
    /// Experience was gained; `leveled_to` is set when at least one level was crossed
    Experience { gained: u32, leveled_to: Option<u8> },
    /// Nothing applied (level cap, or no encounter to learn from)
    Unchanged,
}

/// Advance the buddy's creature for one catch event
///
/// `encounter` is the creature caught this event, if the catch roll
/// succeeded. The caller re-encodes the payload and stages the mutations.
pub fn advance_buddy(
    creature: &mut Creature,
    encounter: Option<&Creature>,
    catalog: &dyn SpeciesCatalog,
    curve: &dyn ExperienceCurve,
) -> Result<BuddyProgress> {
    let data = catalog
        .get(creature.species)
        .ok_or(Error::UnknownSpecies(creature.species))?;

    if creature.is_egg {
        let cycles = data.hatch_cycles.max(1);
        let status = (creature.friendship as f64 - HATCH_STEP as f64) / cycles as f64;
        if status > 0.0 {
            creature.friendship = creature.friendship.saturating_sub(HATCH_STEP);
            return Ok(BuddyProgress::HatchTick);
        }
        // Countdown crossed zero: hatch permanently
        creature.is_egg = false;
        creature.friendship = data.base_friendship;
        creature.nickname = None;
        return Ok(BuddyProgress::Hatched {
            nickname: catalog.display(creature.species, creature.form),
        });
    }

    let encounter = match encounter {
        Some(e) if creature.level < LEVEL_CAP => e,
        _ => return Ok(BuddyProgress::Unchanged),
    };
    let enc_data = catalog
        .get(encounter.species)
        .ok_or(Error::UnknownSpecies(encounter.species))?;

    // Held bell and shiny-encounter bonuses, each only if the ceiling allows
    let bell = if creature.held_item == Some(ItemKind::CalmBell)
        && creature.friendship as u16 + BELL_BONUS as u16 <= FRIENDSHIP_CAP as u16
    {
        BELL_BONUS
    } else {
        0
    };
    let shiny = if encounter.is_shiny()
        && creature.friendship as u16 + SHINY_BONUS as u16 + bell as u16 <= FRIENDSHIP_CAP as u16
    {
        SHINY_BONUS
    } else {
        0
    };
    creature.friendship = creature.friendship.saturating_add(bell + shiny);

    let level_old = creature.level;
    let next_threshold = curve.exp_at(creature.level + 1, data.growth);

    // Base experience of the encounter scaled by the level-ratio curve
    let enc_level = encounter.level as f64;
    let own_level = creature.level as f64;
    let calc = enc_data.base_experience as f64 * enc_level / 5.0
        * ((2.0 * enc_level + 10.0) / (enc_level + own_level + 10.0)).powf(2.5);
    let bonus = if encounter.is_shiny() { 1.1 } else { 1.0 };
    let mut gained = (calc * bonus).round() as u32;
    if gained < MIN_GAIN_FLOOR {
        gained = MIN_GAIN_SUBSTITUTE;
    }

    creature.experience += gained;
    while creature.level < LEVEL_CAP
        && creature.experience >= curve.exp_at(creature.level + 1, data.growth)
    {
        creature.level += 1;
    }
    if creature.level == LEVEL_CAP {
        creature.experience = curve.exp_at(LEVEL_CAP, data.growth);
    }

    if creature.experience >= next_threshold {
        // Leveled at least once; award friendship per level crossed
        let delta = creature.level - level_old;
        for _ in 0..delta {
            if creature.friendship as u16 + FRIENDSHIP_PER_LEVEL as u16 >= FRIENDSHIP_CAP as u16 {
                creature.friendship = FRIENDSHIP_CAP;
                break;
            }
            creature.friendship += FRIENDSHIP_PER_LEVEL;
        }
        Ok(BuddyProgress::Experience {
            gained,
            leveled_to: Some(creature.level),
        })
    } else {
        Ok(BuddyProgress::Experience {
            gained,
            leveled_to: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::creature::{Ability, BallKind, ShinyTier, TrainerProfile};
    use crate::services::Services;
    use crate::SpeciesId;

    fn creature(species: SpeciesId, level: u8, curve_exp: u32) -> Creature {
        Creature {
            species,
            form: 0,
            shiny: ShinyTier::None,
            ball: BallKind::Standard,
            level,
            experience: curve_exp,
            friendship: 70,
            held_item: None,
            is_egg: false,
            nickname: None,
            ability: Ability::NONE,
            trainer: TrainerProfile::default(),
            fateful_event: false,
        }
    }

    fn setup() -> Services {
        Services::standard()
    }

    #[test]
    fn test_experience_gain_and_level_up() {
        let services = setup();
        let exp = services
            .curve
            .exp_at(5, crate::species::GrowthRate::MediumFast);
        let mut buddy = creature(catalog::EMBERLING, 5, exp);
        let encounter = creature(catalog::PYRELISK, 30, 0);

        let progress = advance_buddy(
            &mut buddy,
            Some(&encounter),
            &*services.catalog,
            &*services.curve,
        )
        .unwrap();

        match progress {
            BuddyProgress::Experience { gained, leveled_to } => {
                assert!(gained > 0);
                // A level-30 encounter against a level-5 buddy always levels it
                let new_level = leveled_to.expect("should level up");
                assert!(new_level > 5);
                assert_eq!(buddy.level, new_level);
                // +2 friendship per level crossed
                assert!(buddy.friendship > 70);
            }
            other => panic!("expected experience gain, got {other:?}"),
        }
    }

    #[test]
    fn test_minimum_gain_floor() {
        let services = setup();
        // High-level buddy, weak encounter: the computed gain is tiny
        let exp = services
            .curve
            .exp_at(95, crate::species::GrowthRate::MediumFast);
        let mut buddy = creature(catalog::EMBERLING, 95, exp);
        let encounter = creature(catalog::EMBERLING, 1, 0);

        let progress = advance_buddy(
            &mut buddy,
            Some(&encounter),
            &*services.catalog,
            &*services.curve,
        )
        .unwrap();

        match progress {
            BuddyProgress::Experience { gained, .. } => assert_eq!(gained, MIN_GAIN_SUBSTITUTE),
            other => panic!("expected experience gain, got {other:?}"),
        }
    }

    #[test]
    fn test_level_cap_clamps_experience() {
        let services = setup();
        let growth = crate::species::GrowthRate::MediumFast;
        // Sitting just below the final threshold so any gain crosses it
        let exp = services.curve.exp_at(LEVEL_CAP, growth) - 50;
        let mut buddy = creature(catalog::EMBERLING, 99, exp);
        let encounter = creature(catalog::FERROTITAN, 60, 0);

        advance_buddy(
            &mut buddy,
            Some(&encounter),
            &*services.catalog,
            &*services.curve,
        )
        .unwrap();

        assert_eq!(buddy.level, LEVEL_CAP);
        assert_eq!(buddy.experience, services.curve.exp_at(LEVEL_CAP, growth));

        // At the cap, further events leave the buddy untouched
        let progress = advance_buddy(
            &mut buddy,
            Some(&encounter),
            &*services.catalog,
            &*services.curve,
        )
        .unwrap();
        assert_eq!(progress, BuddyProgress::Unchanged);
    }

    #[test]
    fn test_shiny_encounter_scales_gain() {
        let services = setup();
        let growth = crate::species::GrowthRate::MediumFast;
        let exp = services.curve.exp_at(20, growth);

        let mut plain_buddy = creature(catalog::EMBERLING, 20, exp);
        let mut shiny_buddy = creature(catalog::EMBERLING, 20, exp);
        let plain = creature(catalog::PYRELISK, 40, 0);
        let mut shiny = creature(catalog::PYRELISK, 40, 0);
        shiny.shiny = ShinyTier::Star;

        let p1 = advance_buddy(
            &mut plain_buddy,
            Some(&plain),
            &*services.catalog,
            &*services.curve,
        )
        .unwrap();
        let p2 = advance_buddy(
            &mut shiny_buddy,
            Some(&shiny),
            &*services.catalog,
            &*services.curve,
        )
        .unwrap();

        let (BuddyProgress::Experience { gained: g1, .. }, BuddyProgress::Experience { gained: g2, .. }) =
            (p1, p2)
        else {
            panic!("expected experience gains");
        };
        assert!(g2 > g1, "shiny gain {g2} should exceed plain gain {g1}");
    }

    #[test]
    fn test_bell_and_shiny_friendship_bonuses() {
        let services = setup();
        let growth = crate::species::GrowthRate::MediumFast;
        let exp = services.curve.exp_at(50, growth);
        let mut buddy = creature(catalog::EMBERLING, 50, exp);
        buddy.held_item = Some(ItemKind::CalmBell);
        buddy.friendship = 100;
        let mut encounter = creature(catalog::EMBERLING, 10, 0);
        encounter.shiny = ShinyTier::Star;

        advance_buddy(
            &mut buddy,
            Some(&encounter),
            &*services.catalog,
            &*services.curve,
        )
        .unwrap();

        // +2 bell, +5 shiny, before any level-up bonus
        assert!(buddy.friendship >= 107);
    }

    #[test]
    fn test_hatch_countdown_and_hatch() {
        let services = setup();
        // Emberling hatch cycles: 20 -> countdown 20, 15, 10, 5, hatch
        let mut egg = creature(catalog::EMBERLING, 1, 0);
        egg.is_egg = true;
        egg.friendship = 20;
        egg.nickname = None;

        for expected in [15u8, 10, 5] {
            let progress =
                advance_buddy(&mut egg, None, &*services.catalog, &*services.curve).unwrap();
            assert_eq!(progress, BuddyProgress::HatchTick);
            assert_eq!(egg.friendship, expected);
            assert!(egg.is_egg);
        }

        let progress = advance_buddy(&mut egg, None, &*services.catalog, &*services.curve).unwrap();
        assert_eq!(
            progress,
            BuddyProgress::Hatched {
                nickname: "Emberling".to_string()
            }
        );
        assert!(!egg.is_egg);
        // Friendship resets to the species base
        assert_eq!(egg.friendship, 70);
    }

    #[test]
    fn test_no_encounter_no_gain() {
        let services = setup();
        let mut buddy = creature(catalog::EMBERLING, 10, 1000);
        let progress =
            advance_buddy(&mut buddy, None, &*services.catalog, &*services.curve).unwrap();
        assert_eq!(progress, BuddyProgress::Unchanged);
        assert_eq!(buddy.experience, 1000);
    }
}
