//! Buddy commands: set/remove/view, nickname, evolve

use super::{
    arg, buddy_mutation, catch_label, decode_payload, dex_message, parse_catch_id,
    payload_mutation, star, HandlerInput,
};
use crate::command::Outcome;
use crate::creature::{Ability, BallKind, Creature, ShinyTier};
use crate::error::{Error, Result};
use crate::items::ItemKind;
use crate::mutation::{Mutation, Table};
use crate::player::Buddy;
use crate::progression;
use crate::species::TimeOfDay;

/// Set, remove or view the active buddy
pub fn buddy(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;
    let raw = arg(input.args, 0).trim().to_lowercase();

    if raw == "remove" && player.buddy.is_some() {
        player.buddy = None;
        let mut out = Outcome::success("Buddy removed!");
        out.batch.push(buddy_mutation(player));
        return Ok(out);
    }

    let parsed = if raw.is_empty() {
        None
    } else {
        match parse_catch_id(&raw) {
            Some(id) => Some(id),
            None => return Ok(Outcome::failure("Please enter a numerical catch ID.")),
        }
    };

    match parsed {
        // View the current buddy
        None => {
            let Some(buddy) = &player.buddy else {
                return Ok(Outcome::failure("You don't have an active buddy."));
            };
            let Some(catch) = player.catches.get(&buddy.id) else {
                return Ok(Outcome::failure("Could not find this creature."));
            };
            let creature = decode_payload(catch)?;
            let name = if creature.is_nicknamed() {
                buddy.nickname.clone()
            } else {
                services.catalog.display(catch.species, catch.form)
            };
            let mut out = Outcome::success(format!(
                "Level {}, EXP {}, Friendship {}.",
                creature.level, creature.experience, creature.friendship
            ))
            .titled(format!(
                "{}'s {}{name} (ID: {})",
                player.username,
                star(catch.shiny),
                buddy.id
            ));
            out.caught = Some(creature);
            out.caught_id = Some(buddy.id);
            Ok(out)
        }
        // Set a new buddy
        Some(id) => {
            if player.is_buddy(id) {
                return Ok(Outcome::failure("This is already your buddy!"));
            }
            let Some(catch) = player.catches.get(&id) else {
                return Ok(Outcome::failure("Could not find this creature."));
            };
            let creature = decode_payload(catch)?;
            let label = catch_label(services, catch);
            let nickname = creature
                .nickname
                .clone()
                .unwrap_or_else(|| services.catalog.display(catch.species, catch.form));

            player.buddy = Some(Buddy {
                id,
                nickname: nickname.clone(),
                ability: creature.ability,
            });

            let display = if creature.is_nicknamed() {
                nickname
            } else {
                label
            };
            let mut out = Outcome::success(format!("Set your {display} as your new buddy!"));
            out.batch.push(buddy_mutation(player));
            Ok(out)
        }
    }
}

/// Rename or clear the buddy's nickname
pub fn nickname(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;
    let raw = arg(input.args, 0).trim();

    let Some(buddy) = player.buddy.clone() else {
        return Ok(Outcome::failure("You don't have an active buddy!"));
    };
    if services.word_filter.is_filtered(raw) {
        return Ok(Outcome::failure(
            "Nickname triggered the word filter. Please choose a different nickname.",
        ));
    }
    if raw.chars().count() > 12 {
        return Ok(Outcome::failure("Nickname is too long."));
    }

    let Some(catch) = player.available_catch(buddy.id) else {
        return Ok(Outcome::failure("Could not find this creature."));
    };
    if catch.is_egg {
        return Ok(Outcome::failure("Cannot nickname eggs."));
    }

    let mut creature = decode_payload(catch)?;
    let clear = raw.to_lowercase() == "clear";
    if clear {
        creature.nickname = None;
    } else {
        creature.nickname = Some(raw.to_string());
    }

    if !services.validator.is_valid(&creature) {
        return Ok(Outcome::failure("Nickname is not valid."));
    }

    let cached = creature
        .nickname
        .clone()
        .unwrap_or_else(|| services.catalog.display(catch.species, catch.form));
    let column = creature.nickname.clone().unwrap_or_default();
    let payload = creature.encode()?;

    if let Some(b) = player.buddy.as_mut() {
        b.nickname = cached;
    }
    if let Some(c) = player.catches.get_mut(&buddy.id) {
        c.nickname = creature.nickname.clone();
        c.payload = payload.clone();
    }

    let mut out = Outcome::success(if clear {
        "Your buddy's nickname was cleared!"
    } else {
        "Your buddy's nickname was updated!"
    });
    out.batch.push(buddy_mutation(player));
    out.batch.push(
        Mutation::update(Table::Catches)
            .set("nickname", column)
            .filter("user_id", player.id.raw())
            .filter("id", buddy.id.raw()),
    );
    out.batch.push(payload_mutation(player.id, buddy.id, payload));
    Ok(out)
}

/// Infer which ability slot a creature occupies so evolution can carry it over
fn ability_slot(current: Ability, abilities: [Ability; 2]) -> usize {
    if current == abilities[1] {
        1
    } else {
        0
    }
}

/// Evolve the current buddy through the external rules resolver
pub fn evolve(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;
    let raw = arg(input.args, 0).trim();

    let Some(buddy) = player.buddy.clone() else {
        return Ok(Outcome::failure("You don't have an active buddy."));
    };

    let branch = if raw.is_empty() {
        None
    } else {
        match services.catalog.branch_form_index(raw) {
            Some(index) => Some(index),
            None => return Ok(Outcome::failure("Unable to parse input.")),
        }
    };

    let Some(catch) = player.available_catch(buddy.id) else {
        return Ok(Outcome::failure("Could not find this creature."));
    };
    if catch.is_egg {
        return Ok(Outcome::failure("Eggs cannot evolve."));
    }

    let mut creature = decode_payload(catch)?;
    if creature.held_item == Some(ItemKind::StasisStone) {
        return Ok(Outcome::failure(
            "Your buddy cannot evolve while holding a Stasis Stone.",
        ));
    }

    let old_name = creature.nickname.clone().unwrap_or_else(|| {
        services
            .catalog
            .display(creature.species, creature.form)
    });

    // Local time-of-day bucket, dawn collapsing into morning
    let local = services.clock.now_utc() + chrono::Duration::hours(player.timezone_offset as i64);
    let hour = chrono::Timelike::hour(&local);
    let time = TimeOfDay::from_hour(hour).collapse_dawn();

    let Some(outcome) = services.evolutions.evolve(
        creature.species,
        creature.level,
        time,
        creature.held_item,
        branch,
    ) else {
        return Ok(Outcome::failure(
            "This creature can't evolve right now. Check its level, held item, and the time of day.",
        ));
    };

    let old_slot = services
        .catalog
        .get(creature.species)
        .map(|d| ability_slot(creature.ability, d.abilities))
        .unwrap_or(0);
    let new_data = services
        .catalog
        .get(outcome.species)
        .ok_or(Error::UnknownSpecies(outcome.species))?;

    creature.species = outcome.species;
    creature.form = outcome.form;
    creature.ability = new_data.abilities[old_slot];
    let payload = creature.encode()?;

    let mut out = Outcome::default();
    out.success = true;

    // Cached display fields follow the transition everywhere they appear
    if let Some(c) = player.catches.get_mut(&buddy.id) {
        c.species = outcome.species;
        c.form = outcome.form;
        c.payload = payload.clone();
    }
    for slot in [&mut player.daycare.slot1, &mut player.daycare.slot2] {
        if let Some(s) = slot {
            if s.id == buddy.id {
                s.species = outcome.species;
                s.form = outcome.form;
            }
        }
    }
    if player.daycare.holds(buddy.id) {
        out.batch.push(super::daycare_mutation(player));
    }
    if let Some(b) = player.buddy.as_mut() {
        b.ability = creature.ability;
    }

    out.batch.push(
        Mutation::update(Table::Catches)
            .set("species", outcome.species.raw())
            .set("form", outcome.form)
            .set("nickname", creature.nickname.clone().unwrap_or_default())
            .filter("user_id", player.id.raw())
            .filter("id", buddy.id.raw()),
    );
    out.batch.push(buddy_mutation(player));
    out.batch.push(payload_mutation(player.id, buddy.id, payload));

    // A split-form transition emits a second, brand-new creature; the
    // dispatcher registers it and allocates its id.
    if let Some(split_species) = outcome.split {
        let split_data = services
            .catalog
            .get(split_species)
            .ok_or(Error::UnknownSpecies(split_species))?;
        let split = Creature {
            species: split_species,
            form: 0,
            shiny: creature.shiny,
            ball: BallKind::Standard,
            level: creature.level,
            experience: services.curve.exp_at(creature.level, split_data.growth),
            friendship: split_data.base_friendship,
            held_item: None,
            is_egg: false,
            nickname: None,
            ability: split_data.abilities[0],
            trainer: player.trainer.clone(),
            fateful_event: false,
        };
        if !services.validator.is_valid(&split) {
            return Err(Error::InvalidCreature {
                stage: "evolution",
                species: split_species,
            });
        }
        out.split = Some(split);
    }

    let new_display = services.catalog.display(outcome.species, outcome.form);
    let highlight = if creature.shiny != ShinyTier::None {
        format!("**{new_display}**")
    } else {
        new_display
    };
    let mut message = format!("{old_name} evolved into {highlight}!");
    let reg = progression::register_species(
        player,
        outcome.species,
        services.catalog.dex_size(),
        &mut out.batch,
    );
    message.push_str(&dex_message(reg, None));
    out.message = message;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::command::CommandKind;
    use crate::creature::TrainerProfile;
    use crate::handlers::{dispatch, register_catch, HandlerInput};
    use crate::mutation::MutationBatch;
    use crate::player::PlayerAggregate;
    use crate::rng::GameRng;
    use crate::services::{Services, WallClock, WordFilter};
    use crate::settings::GameSettings;
    use crate::{CatchId, PlayerId, SpeciesId};
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    struct FixedClock(DateTime<Utc>);

    impl WallClock for FixedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct BlockEverything;

    impl WordFilter for BlockEverything {
        fn is_filtered(&self, _text: &str) -> bool {
            true
        }
    }

    fn creature(species: SpeciesId, level: u8) -> Creature {
        Creature {
            species,
            form: 0,
            shiny: ShinyTier::None,
            ball: BallKind::Standard,
            level,
            experience: 10_000,
            friendship: 70,
            held_item: None,
            is_egg: false,
            nickname: None,
            ability: Ability::FLAME_AURA,
            trainer: TrainerProfile::default(),
            fateful_event: false,
        }
    }

    fn player_with(species: SpeciesId, level: u8) -> PlayerAggregate {
        let services = Services::standard();
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let mut batch = MutationBatch::new();
        register_catch(&mut player, &creature(species, level), &services, &mut batch).unwrap();
        player
    }

    fn run_with(
        kind: CommandKind,
        player: &mut PlayerAggregate,
        args: &[&str],
        services: &Services,
    ) -> Outcome {
        let settings = GameSettings::default();
        let mut rng = GameRng::new(7);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        dispatch(
            kind,
            HandlerInput {
                player,
                giftee: None,
                args: &args,
                settings: &settings,
                services,
                rng: &mut rng,
            },
        )
        .unwrap()
    }

    fn run(kind: CommandKind, player: &mut PlayerAggregate, args: &[&str]) -> Outcome {
        run_with(kind, player, args, &Services::standard())
    }

    #[test]
    fn test_buddy_set_view_remove() {
        let mut player = player_with(catalog::EMBERLING, 10);

        let out = run(CommandKind::Buddy, &mut player, &["0"]);
        assert!(out.success, "{}", out.message);
        assert!(player.is_buddy(CatchId::new(0)));
        assert_eq!(player.buddy.as_ref().unwrap().ability, Ability::FLAME_AURA);

        let out = run(CommandKind::Buddy, &mut player, &["0"]);
        assert!(!out.success);
        assert!(out.message.contains("already your buddy"));

        let out = run(CommandKind::Buddy, &mut player, &[]);
        assert!(out.success);
        assert!(out.title.contains("Emberling"));

        let out = run(CommandKind::Buddy, &mut player, &["remove"]);
        assert!(out.success);
        assert!(player.buddy.is_none());
    }

    #[test]
    fn test_nickname_set_and_clear() {
        let mut player = player_with(catalog::EMBERLING, 10);
        run(CommandKind::Buddy, &mut player, &["0"]);

        let out = run(CommandKind::Nickname, &mut player, &["Scout"]);
        assert!(out.success, "{}", out.message);
        assert_eq!(player.buddy.as_ref().unwrap().nickname, "Scout");
        assert_eq!(
            player.catches.get(&CatchId::new(0)).unwrap().nickname,
            Some("Scout".to_string())
        );

        let out = run(CommandKind::Nickname, &mut player, &["clear"]);
        assert!(out.success);
        assert_eq!(player.buddy.as_ref().unwrap().nickname, "Emberling");
        assert_eq!(player.catches.get(&CatchId::new(0)).unwrap().nickname, None);
    }

    #[test]
    fn test_nickname_rejections() {
        let mut player = player_with(catalog::EMBERLING, 10);

        let out = run(CommandKind::Nickname, &mut player, &["Scout"]);
        assert!(!out.success);
        assert!(out.message.contains("active buddy"));

        run(CommandKind::Buddy, &mut player, &["0"]);
        let out = run(CommandKind::Nickname, &mut player, &["MuchTooLongNickname"]);
        assert!(!out.success);
        assert!(out.message.contains("too long"));

        let mut services = Services::standard();
        services.word_filter = Arc::new(BlockEverything);
        let out = run_with(CommandKind::Nickname, &mut player, &["Scout"], &services);
        assert!(!out.success);
        assert!(out.message.contains("word filter"));
    }

    #[test]
    fn test_evolve_by_level() {
        let mut player = player_with(catalog::EMBERLING, 20);
        run(CommandKind::Buddy, &mut player, &["0"]);

        let out = run(CommandKind::Evolve, &mut player, &[]);
        assert!(out.success, "{}", out.message);
        assert!(out.message.contains("Emberling evolved into Pyrelisk!"));

        let catch = player.catches.get(&CatchId::new(0)).unwrap();
        assert_eq!(catch.species, catalog::PYRELISK);
        // The dex learned the evolved species
        assert!(player.dex.entries.contains(&catalog::PYRELISK));
    }

    #[test]
    fn test_evolve_blocked_by_stasis_stone() {
        let services = Services::standard();
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let mut held = creature(catalog::EMBERLING, 20);
        held.held_item = Some(ItemKind::StasisStone);
        let mut batch = MutationBatch::new();
        register_catch(&mut player, &held, &services, &mut batch).unwrap();
        run(CommandKind::Buddy, &mut player, &["0"]);

        let out = run(CommandKind::Evolve, &mut player, &[]);
        assert!(!out.success);
        assert!(out.message.contains("Stasis Stone"));
    }

    #[test]
    fn test_evolve_time_gate_respects_timezone() {
        // 02:00 UTC; a +8 offset makes it 10:00 local, which is morning -
        // wrong for the night-gated line
        let mut services = Services::standard();
        services.clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap(),
        ));

        let mut player = player_with(catalog::UMBRAT, 30);
        player.timezone_offset = 8;
        run(CommandKind::Buddy, &mut player, &["0"]);
        let out = run_with(CommandKind::Evolve, &mut player, &[], &services);
        assert!(!out.success);

        // At offset 0 it is 02:00 local - night - and the evolution runs
        player.timezone_offset = 0;
        let out = run_with(CommandKind::Evolve, &mut player, &[], &services);
        assert!(out.success, "{}", out.message);
        assert_eq!(
            player.catches.get(&CatchId::new(0)).unwrap().species,
            catalog::NOCTURNYX
        );
    }

    #[test]
    fn test_split_evolution_emits_secondary() {
        let mut player = player_with(catalog::HUSKLIT, 25);
        run(CommandKind::Buddy, &mut player, &["0"]);

        let out = run(CommandKind::Evolve, &mut player, &[]);
        assert!(out.success, "{}", out.message);
        let split = out.split.expect("split creature");
        assert_eq!(split.species, catalog::HOLLOWSHELL);
        assert_eq!(split.level, 25);
        // Not yet registered: that is the dispatcher's job
        assert_eq!(out.split_id, None);
        assert_eq!(player.catches.len(), 1);
    }

    #[test]
    fn test_branched_evolution() {
        let services = Services::standard();
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let mut held = creature(catalog::CREAMLING, 10);
        held.held_item = Some(ItemKind::HoneySweet);
        let mut batch = MutationBatch::new();
        register_catch(&mut player, &held, &services, &mut batch).unwrap();
        run(CommandKind::Buddy, &mut player, &["0"]);

        let out = run(CommandKind::Evolve, &mut player, &["ruby"]);
        assert!(out.success, "{}", out.message);
        let catch = player.catches.get(&CatchId::new(0)).unwrap();
        assert_eq!(catch.species, catalog::GATEAUX);
        assert_eq!(catch.form, 2);

        let mut player = player_with(catalog::EMBERLING, 20);
        run(CommandKind::Buddy, &mut player, &["0"]);
        let out = run(CommandKind::Evolve, &mut player, &["nonsense"]);
        assert!(!out.success);
        assert!(out.message.contains("Unable to parse input."));
    }

    #[test]
    fn test_evolve_updates_daycare_cache() {
        let mut player = player_with(catalog::EMBERLING, 20);
        run(CommandKind::Buddy, &mut player, &["0"]);
        run(CommandKind::Daycare, &mut player, &["d", "0"]);

        let out = run(CommandKind::Evolve, &mut player, &[]);
        assert!(out.success, "{}", out.message);
        assert_eq!(
            player.daycare.slot1.unwrap().species,
            catalog::PYRELISK
        );
    }
}
