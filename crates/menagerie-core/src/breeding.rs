//! Daycare compatibility and egg synthesis
//!
//! Two occupants are compatible when neither is itself an egg and both
//! resolve to the same base-evolution ancestor. The mirror species is the
//! wildcard: it pairs with anything except another mirror. The synthesized
//! egg takes slot 1's base form as its template unless only slot 2
//! qualifies (slot 1 being the mirror).

use crate::creature::{BallKind, Creature};
use crate::error::{Error, Result};
use crate::generation::{shiny_tier, RollSet, SHINY_PARENTS_BONUS};
use crate::player::{DaycareSlot, PlayerAggregate};
use crate::services::Services;
use crate::settings::GameSettings;
use crate::SpeciesId;

fn is_mirror(services: &Services, species: SpeciesId) -> bool {
    services
        .catalog
        .get(species)
        .map(|s| s.is_mirror)
        .unwrap_or(false)
}

/// Whether the current daycare occupants can produce an egg
///
/// Symmetric in its two occupants: swapping the slots never changes the
/// answer.
pub fn can_breed(player: &PlayerAggregate, services: &Services) -> bool {
    let (slot1, slot2) = match (player.daycare.slot1, player.daycare.slot2) {
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };

    let occupant1 = match player.catches.get(&slot1.id) {
        Some(c) => c,
        None => return false,
    };
    let occupant2 = match player.catches.get(&slot2.id) {
        Some(c) => c,
        None => return false,
    };
    if occupant1.is_egg || occupant2.is_egg {
        return false;
    }

    match (
        is_mirror(services, slot1.species),
        is_mirror(services, slot2.species),
    ) {
        (true, true) => false,
        (true, false) | (false, true) => true,
        (false, false) => {
            services.evolutions.base_species(slot1.species)
                == services.evolutions.base_species(slot2.species)
        }
    }
}

fn template_slot(player: &PlayerAggregate, services: &Services) -> Option<(DaycareSlot, DaycareSlot)> {
    let slot1 = player.daycare.slot1?;
    let slot2 = player.daycare.slot2?;
    if is_mirror(services, slot1.species) {
        Some((slot2, slot1))
    } else {
        Some((slot1, slot2))
    }
}

/// Synthesize an egg from the current daycare occupants
///
/// The produced creature inherits the invoking player's trainer metadata and
/// must pass the validity check; a failure here aborts the entire enclosing
/// catch attempt.
pub fn synthesize_egg(
    player: &PlayerAggregate,
    settings: &GameSettings,
    services: &Services,
    rolls: &RollSet,
) -> Result<Creature> {
    let (template, partner) = template_slot(player, services).ok_or(Error::InvalidEgg {
        parent1: SpeciesId::new(0),
        parent2: SpeciesId::new(0),
    })?;

    let base = services.evolutions.base_species(template.species);
    let data = services
        .catalog
        .get(base)
        .ok_or(Error::UnknownSpecies(base))?;

    let both_shiny = template.shiny && partner.shiny;
    let bonus = if both_shiny { SHINY_PARENTS_BONUS } else { 0.0 };

    // Special-distribution balls do not pass down
    let ball = match template.ball {
        BallKind::Cherish | BallKind::Master => BallKind::Standard,
        other => other,
    };

    let creature = Creature {
        species: base,
        form: 0,
        shiny: shiny_tier(rolls.egg_shiny, bonus, settings),
        ball,
        level: 1,
        experience: services.curve.exp_at(1, data.growth),
        // For an egg, friendship stores the remaining hatch countdown
        friendship: data.hatch_cycles,
        held_item: None,
        is_egg: true,
        nickname: None,
        ability: data.abilities[0],
        trainer: player.trainer.clone(),
        fateful_event: false,
    };

    if !services.validator.is_valid(&creature) {
        return Err(Error::InvalidEgg {
            parent1: template.species,
            parent2: partner.species,
        });
    }
    Ok(creature)
}
