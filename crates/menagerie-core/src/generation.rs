//! Generation engine: the weighted rolls behind every catch attempt
//!
//! Each attempt draws a fresh [`RollSet`], layers the player's modifiers on
//! top, and resolves in a fixed order: egg eligibility, species selection,
//! rarity escalation, catch success, consolation item. Nothing here touches
//! the aggregate or stages mutations - the catch handler does both.

use crate::breeding;
use crate::creature::{BallKind, Creature, ShinyTier, LEVEL_CAP};
use crate::error::{Error, Result};
use crate::items::{ItemKind, CHARM_STOCK_CAP};
use crate::player::{PerkKind, PlayerAggregate};
use crate::rng::GameRng;
use crate::services::Services;
use crate::settings::GameSettings;
use crate::species::SpeciesCatalog;
use crate::SpeciesId;

/// Species-boost proc threshold: the boost roll must land at or above this
pub const SPECIES_BOOST_PROC: f64 = 99.0;

/// Charm rolls at or below this bias the item drop toward the charm itself
pub const CHARM_DROP_BIAS: f64 = 10.0;

/// Shiny rolls compare against this ceiling rather than 100
pub const SHINY_ROLL_CEILING: f64 = 150.0;

/// Flat bonus a warming or scrounging buddy ability adds to its roll
pub const BUDDY_ABILITY_BONUS: f64 = 10.0;

/// Flat egg-shiny bonus when both parents are shiny
pub const SHINY_PARENTS_BONUS: f64 = 5.0;

/// Highest encounter level the species roll produces
const ENCOUNTER_LEVEL_CAP: i64 = 60;

/// One catch attempt's worth of random draws
///
/// Drawn fresh per attempt, then adjusted by [`RollSet::apply_modifiers`].
/// Tests build these directly to force specific outcomes.
#[derive(Debug, Clone)]
pub struct RollSet {
    /// Catch-success roll, [0, 100)
    pub catch: f64,
    /// Egg-eligibility roll, [0, 100)
    pub egg: f64,
    /// Item-drop roll, [0, 100)
    pub item: f64,
    /// Cherish escalation roll, [0, 100)
    pub cherish: f64,
    /// Titan sub-roll, [0, 100)
    pub titan: f64,
    /// Shiny roll for the main catch, against [`SHINY_ROLL_CEILING`]
    pub shiny: f64,
    /// Shiny roll for a synthesized egg, against [`SHINY_ROLL_CEILING`]
    pub egg_shiny: f64,
    /// Species-boost proc roll, [0, 100)
    pub boost: f64,
    /// Charm bias roll for item-drop selection, [0, 100)
    pub charm: f64,
    /// Uniform species selection from the catalog pool
    pub species: SpeciesId,
    /// Encounter level of the generated creature
    pub encounter_level: u8,
    /// Ball handed out for an ordinary catch
    pub ball: BallKind,
    /// Which of the species' two ability slots the creature gets
    pub ability_slot: u8,
    /// Uniform item selection for unbiased drops
    pub item_pick: ItemKind,
}

impl RollSet {
    /// Draw a fresh set of rolls
    pub fn draw(rng: &mut GameRng, catalog: &dyn SpeciesCatalog) -> Self {
        Self {
            catch: rng.range_f64(0.0, 100.0),
            egg: rng.range_f64(0.0, 100.0),
            item: rng.range_f64(0.0, 100.0),
            cherish: rng.range_f64(0.0, 100.0),
            titan: rng.range_f64(0.0, 100.0),
            shiny: rng.range_f64(0.0, 100.0),
            egg_shiny: rng.range_f64(0.0, 100.0),
            boost: rng.range_f64(0.0, 100.0),
            charm: rng.range_f64(0.0, 100.0),
            species: rng
                .pick(catalog.pool())
                .copied()
                .unwrap_or(SpeciesId::new(0)),
            encounter_level: rng.range_i64(1, ENCOUNTER_LEVEL_CAP) as u8,
            ball: rng
                .pick(BallKind::FIELD)
                .copied()
                .unwrap_or(BallKind::Standard),
            ability_slot: (rng.next_u64() & 1) as u8,
            item_pick: rng
                .pick(ItemKind::ALL)
                .copied()
                .unwrap_or(ItemKind::HoneySweet),
        }
    }

    /// Layer the player's standing modifiers onto the raw rolls
    ///
    /// Perk instances add their count (doubled for the cherish and titan
    /// kinds), half the held charm stock feeds both shiny rolls, and a buddy
    /// with a warming or scrounging ability adds a flat bonus to the egg or
    /// item roll.
    pub fn apply_modifiers(&mut self, player: &PlayerAggregate) {
        self.boost += player.perks.count(PerkKind::SpeciesBoost) as f64;
        self.catch += player.perks.count(PerkKind::CatchBoost) as f64;
        self.item += player.perks.count(PerkKind::ItemBoost) as f64;
        self.cherish += player.perks.count(PerkKind::CherishBoost) as f64 * 2.0;
        self.titan += player.perks.count(PerkKind::TitanBoost) as f64 * 2.0;

        let charm_half = player.items.count(ItemKind::ShinyCharm) as f64 / 2.0;
        self.shiny += charm_half;
        self.egg_shiny += charm_half;

        if let Some(buddy) = &player.buddy {
            if buddy.ability.boosts_egg_rate() {
                self.egg += BUDDY_ABILITY_BONUS;
            } else if buddy.ability.boosts_item_rate() {
                self.item += BUDDY_ABILITY_BONUS;
            }
        }
    }
}

/// What one generation call produced
#[derive(Debug, Clone, Default)]
pub struct GenerationOutcome {
    pub caught: Option<Creature>,
    pub egg: Option<Creature>,
    pub item_drop: Option<ItemKind>,
    /// The catch roll failed; the item drop may still have happened
    pub failed_catch: bool,
}

/// Resolve a shiny roll into a tier
pub fn shiny_tier(roll: f64, bonus: f64, settings: &GameSettings) -> ShinyTier {
    if roll + bonus >= SHINY_ROLL_CEILING - settings.square_shiny_rate {
        ShinyTier::Square
    } else if roll + bonus >= SHINY_ROLL_CEILING - settings.star_shiny_rate {
        ShinyTier::Star
    } else {
        ShinyTier::None
    }
}

/// Run one catch attempt against a modifier-adjusted roll set
///
/// Every produced creature passes the validity check exactly once; a failure
/// fails the whole call with diagnostic context. There is no retry loop.
pub fn generate(
    player: &PlayerAggregate,
    settings: &GameSettings,
    services: &Services,
    rolls: &RollSet,
) -> Result<GenerationOutcome> {
    let mut out = GenerationOutcome::default();

    // Egg eligibility first: a failed egg fails the whole attempt.
    if rolls.egg >= 100.0 - settings.egg_rate && breeding::can_breed(player, services) {
        out.egg = Some(breeding::synthesize_egg(player, settings, services, rolls)?);
    }

    // Species selection: event override beats the species-boost proc.
    let mut species = rolls.species;
    let mut form = 0u8;
    let mut event_forced = false;
    if settings.events_enabled {
        if let Some(event) = services.events.active_event(services.clock.now_utc()) {
            species = event.species;
            form = event.form;
            event_forced = event.cherish;
        }
    } else if let Some(boosted) = player.perks.species_boost {
        if rolls.boost >= SPECIES_BOOST_PROC {
            species = boosted;
        }
    }

    if rolls.catch >= 100.0 - settings.catch_rate {
        let titan_proc =
            species == settings.titan_species && rolls.titan >= 100.0 - settings.titan_rate;
        let cherish = event_forced
            || services.catalog.cherish_only().contains(&species)
            || rolls.cherish >= 100.0 - settings.cherish_rate
            || titan_proc;

        let data = services
            .catalog
            .get(species)
            .ok_or(Error::UnknownSpecies(species))?;
        let level = rolls.encounter_level.clamp(1, LEVEL_CAP);
        let creature = Creature {
            species,
            form,
            shiny: shiny_tier(rolls.shiny, 0.0, settings),
            ball: if cherish { BallKind::Cherish } else { rolls.ball },
            level,
            experience: services.curve.exp_at(level, data.growth),
            friendship: data.base_friendship,
            held_item: None,
            is_egg: false,
            nickname: None,
            ability: data.abilities[(rolls.ability_slot.min(1)) as usize],
            trainer: player.trainer.clone(),
            fateful_event: cherish,
        };

        if !services.validator.is_valid(&creature) {
            return Err(Error::InvalidCreature {
                stage: "catch",
                species,
            });
        }
        out.caught = Some(creature);
    } else {
        out.failed_catch = true;
    }

    if rolls.item >= 100.0 - settings.item_rate {
        let kind = if rolls.charm <= CHARM_DROP_BIAS {
            // Low charm roll: bootstrap the charm stock, then fall back to sweets
            if player.items.count(ItemKind::ShinyCharm) < CHARM_STOCK_CAP {
                ItemKind::ShinyCharm
            } else {
                ItemKind::HoneySweet
            }
        } else {
            rolls.item_pick
        };
        out.item_drop = Some(kind);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::creature::Ability;
    use crate::player::Buddy;
    use crate::CatchId;
    use crate::PlayerId;

    fn player() -> PlayerAggregate {
        PlayerAggregate::new(PlayerId::new(1), "Robin")
    }

    /// A roll set where nothing procs
    fn quiet_rolls() -> RollSet {
        RollSet {
            catch: 0.0,
            egg: 0.0,
            item: 0.0,
            cherish: 0.0,
            titan: 0.0,
            shiny: 0.0,
            egg_shiny: 0.0,
            boost: 0.0,
            charm: 50.0,
            species: catalog::EMBERLING,
            encounter_level: 12,
            ball: BallKind::Great,
            ability_slot: 0,
            item_pick: ItemKind::MoonStone,
        }
    }

    #[test]
    fn test_forced_ordinary_catch() {
        // Max catch roll, rarity roll below threshold: a successful ordinary catch
        let services = Services::standard();
        let settings = GameSettings::default();
        let mut rolls = quiet_rolls();
        rolls.catch = 99.9;

        let out = generate(&player(), &settings, &services, &rolls).unwrap();
        let caught = out.caught.expect("catch should succeed");
        assert_eq!(caught.species, catalog::EMBERLING);
        assert_eq!(caught.ball, BallKind::Great);
        assert_eq!(caught.shiny, ShinyTier::None);
        assert!(!caught.fateful_event);
        assert!(!out.failed_catch);
        assert!(out.egg.is_none());
    }

    #[test]
    fn test_failed_catch_still_drops_item() {
        let services = Services::standard();
        let settings = GameSettings::default();
        let mut rolls = quiet_rolls();
        rolls.catch = 0.0;
        rolls.item = 99.9;

        let out = generate(&player(), &settings, &services, &rolls).unwrap();
        assert!(out.caught.is_none());
        assert!(out.failed_catch);
        assert_eq!(out.item_drop, Some(ItemKind::MoonStone));
    }

    #[test]
    fn test_charm_biased_drop_bootstraps_then_falls_back() {
        let services = Services::standard();
        let settings = GameSettings::default();
        let mut rolls = quiet_rolls();
        rolls.item = 99.9;
        rolls.charm = 5.0;

        let mut poor = player();
        let out = generate(&poor, &settings, &services, &rolls).unwrap();
        assert_eq!(out.item_drop, Some(ItemKind::ShinyCharm));

        poor.items.add(ItemKind::ShinyCharm, CHARM_STOCK_CAP);
        let out = generate(&poor, &settings, &services, &rolls).unwrap();
        assert_eq!(out.item_drop, Some(ItemKind::HoneySweet));
    }

    #[test]
    fn test_cherish_escalation_forces_cherish_ball() {
        let services = Services::standard();
        let settings = GameSettings::default();
        let mut rolls = quiet_rolls();
        rolls.catch = 99.9;
        rolls.cherish = 99.9;

        let out = generate(&player(), &settings, &services, &rolls).unwrap();
        let caught = out.caught.unwrap();
        assert_eq!(caught.ball, BallKind::Cherish);
        assert!(caught.fateful_event);
    }

    #[test]
    fn test_cherish_only_species_always_escalates() {
        let services = Services::standard();
        let settings = GameSettings::default();
        let mut rolls = quiet_rolls();
        rolls.catch = 99.9;
        rolls.species = catalog::LUNAVANE;

        let out = generate(&player(), &settings, &services, &rolls).unwrap();
        assert_eq!(out.caught.unwrap().ball, BallKind::Cherish);
    }

    #[test]
    fn test_titan_sub_roll_escalates() {
        let services = Services::standard();
        let settings = GameSettings::default();
        let mut rolls = quiet_rolls();
        rolls.catch = 99.9;
        rolls.species = settings.titan_species;
        rolls.titan = 99.9;

        let out = generate(&player(), &settings, &services, &rolls).unwrap();
        assert_eq!(out.caught.unwrap().ball, BallKind::Cherish);

        // Without the sub-roll the same species stays ordinary
        rolls.titan = 0.0;
        let out = generate(&player(), &settings, &services, &rolls).unwrap();
        assert_eq!(out.caught.unwrap().ball, BallKind::Great);
    }

    #[test]
    fn test_species_boost_proc() {
        let services = Services::standard();
        let settings = GameSettings::default();
        let mut boosted = player();
        boosted.perks.species_boost = Some(catalog::GALEWING);

        let mut rolls = quiet_rolls();
        rolls.catch = 99.9;
        rolls.boost = 99.5;
        let out = generate(&boosted, &settings, &services, &rolls).unwrap();
        assert_eq!(out.caught.unwrap().species, catalog::GALEWING);

        rolls.boost = 50.0;
        let out = generate(&boosted, &settings, &services, &rolls).unwrap();
        assert_eq!(out.caught.unwrap().species, catalog::EMBERLING);
    }

    #[test]
    fn test_shiny_tier_thresholds() {
        let settings = GameSettings::default();
        // star_shiny_rate 45 -> threshold 105; square 10 -> threshold 140
        assert_eq!(shiny_tier(100.0, 0.0, &settings), ShinyTier::None);
        assert_eq!(shiny_tier(106.0, 0.0, &settings), ShinyTier::Star);
        assert_eq!(shiny_tier(141.0, 0.0, &settings), ShinyTier::Square);
        // Bonuses push a roll over
        assert_eq!(shiny_tier(103.0, 5.0, &settings), ShinyTier::Star);
    }

    #[test]
    fn test_modifiers_stack() {
        let mut subject = player();
        subject.perks.active = vec![PerkKind::CatchBoost; 3];
        subject.items.add(ItemKind::ShinyCharm, 10);
        subject.buddy = Some(Buddy {
            id: CatchId::new(0),
            nickname: "Cinder".to_string(),
            ability: Ability::FLAME_AURA,
        });

        let mut rolls = quiet_rolls();
        rolls.apply_modifiers(&subject);
        assert_eq!(rolls.catch, 3.0);
        assert_eq!(rolls.shiny, 5.0);
        assert_eq!(rolls.egg_shiny, 5.0);
        assert_eq!(rolls.egg, BUDDY_ABILITY_BONUS);
        assert_eq!(rolls.item, 0.0);
    }
}
