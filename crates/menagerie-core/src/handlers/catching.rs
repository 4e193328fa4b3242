//! The catch command and new-catch registration

use super::{dex_message, grant_item, payload_mutation, HandlerInput};
use crate::command::Outcome;
use crate::creature::Creature;
use crate::error::Result;
use crate::generation::{self, RollSet};
use crate::leveling::{self, BuddyProgress};
use crate::mutation::{Mutation, MutationBatch, Table};
use crate::player::{Catch, PlayerAggregate};
use crate::progression;
use crate::services::Services;
use crate::settings::GameSettings;
use crate::CatchId;

/// Handle the catch command with freshly drawn rolls
pub fn catch_creature(input: HandlerInput<'_>) -> Result<Outcome> {
    let mut rolls = RollSet::draw(input.rng, &*input.services.catalog);
    rolls.apply_modifiers(input.player);
    catch_with_rolls(input.player, input.settings, input.services, &rolls)
}

/// Handle the catch command against an explicit roll set
///
/// Split out so scenario tests can force rolls; the dispatcher path always
/// goes through [`catch_creature`].
pub fn catch_with_rolls(
    player: &mut PlayerAggregate,
    settings: &GameSettings,
    services: &Services,
    rolls: &RollSet,
) -> Result<Outcome> {
    let generated = generation::generate(player, settings, services, rolls)?;

    let mut out = Outcome::default();
    out.success = true;
    let mut batch = MutationBatch::new();
    let mut message = String::new();

    if let Some(caught) = &generated.caught {
        player.catch_count += 1;
        let name = services.catalog.display(caught.species, caught.form);
        let label = if caught.is_shiny() {
            format!("**{name}**")
        } else {
            name
        };
        message.push_str(&format!("It put up a fight, but you caught {label}!"));
        let reg = progression::register_species(
            player,
            caught.species,
            services.catalog.dex_size(),
            &mut batch,
        );
        message.push_str(&dex_message(reg, None));
    } else {
        message.push_str("It got away...");
    }

    // Buddy progression runs on every successful catch event
    message.push_str(&advance_buddy(
        player,
        generated.caught.as_ref(),
        services,
        &mut batch,
    )?);

    if let Some(egg) = &generated.egg {
        player.catch_count += 1;
        let name = services.catalog.display(egg.species, egg.form);
        let welcome = if egg.is_shiny() {
            format!("a **shiny egg** from the daycare! Welcome, **{name}**!")
        } else {
            format!("an egg from the daycare! Welcome, {name}!")
        };
        message.push_str(&format!("\nYou got {welcome}"));
        let reg = progression::register_species(
            player,
            egg.species,
            services.catalog.dex_size(),
            &mut batch,
        );
        message.push_str(&dex_message(reg, None));
    }

    batch.push(
        Mutation::update(Table::Players)
            .set("catch_count", player.catch_count)
            .filter("user_id", player.id.raw()),
    );

    if let Some(kind) = generated.item_drop {
        grant_item(player, kind, 1, &mut batch);
        let line = if generated.failed_catch {
            format!(
                "\nAs it fled it dropped {} {}! Added to the item bag.",
                kind.article(),
                kind
            )
        } else {
            format!(
                "\nOh? It was holding {} {}! Added to the item bag.",
                kind.article(),
                kind
            )
        };
        message.push_str(&line);
        out.item = Some(kind);
    }

    out.failed_catch = generated.failed_catch;
    out.caught = generated.caught;
    out.egg = generated.egg;
    out.title = "Catch Results".to_string();
    out.message = message;
    out.batch = batch;
    Ok(out)
}

/// Register a freshly produced creature as a brand-new catch
///
/// Called by the dispatcher after a successful handler: allocates the
/// smallest free id, caches the display fields, and stages the two insert
/// mutations. Returns the allocated id.
pub fn register_catch(
    player: &mut PlayerAggregate,
    creature: &Creature,
    services: &Services,
    batch: &mut MutationBatch,
) -> Result<CatchId> {
    let id = player.next_catch_id();
    let payload = creature.encode()?;
    let legendary = services.catalog.is_legendary(creature.species);

    batch.push(
        Mutation::insert(Table::Catches)
            .set("user_id", player.id.raw())
            .set("id", id.raw())
            .set("species", creature.species.raw())
            .set("form", creature.form)
            .set("is_shiny", creature.is_shiny())
            .set("ball", creature.ball.as_str())
            .set("nickname", creature.nickname.clone().unwrap_or_default())
            .set("is_egg", creature.is_egg)
            .set("was_traded", false)
            .set("is_favorite", false)
            .set("is_legendary", legendary)
            .set("is_event", creature.fateful_event),
    );
    batch.push(
        Mutation::insert(Table::CatchPayloads)
            .set("user_id", player.id.raw())
            .set("id", id.raw())
            .set("data", payload.clone()),
    );

    player.catches.insert(
        id,
        Catch {
            id,
            species: creature.species,
            form: creature.form,
            shiny: creature.is_shiny(),
            ball: creature.ball,
            nickname: creature.nickname.clone(),
            is_egg: creature.is_egg,
            traded: false,
            favorite: false,
            legendary,
            event: creature.fateful_event,
            payload,
        },
    );
    Ok(id)
}

/// Apply one catch event to the buddy, staging payload and hatch mutations
fn advance_buddy(
    player: &mut PlayerAggregate,
    encounter: Option<&Creature>,
    services: &Services,
    batch: &mut MutationBatch,
) -> Result<String> {
    let Some(buddy) = player.buddy.clone() else {
        return Ok(String::new());
    };
    let Some(catch) = player.catches.get(&buddy.id) else {
        return Ok(String::new());
    };
    if catch.traded {
        return Ok(String::new());
    }

    let mut creature = super::decode_payload(catch)?;
    let progress = leveling::advance_buddy(
        &mut creature,
        encounter,
        &*services.catalog,
        &*services.curve,
    )?;

    let mut msg = String::new();
    match progress {
        BuddyProgress::Hatched { nickname } => {
            msg.push_str("\nUh-oh!... You've just hatched an egg!");
            if let Some(b) = player.buddy.as_mut() {
                b.nickname = nickname;
            }
            if let Some(c) = player.catches.get_mut(&buddy.id) {
                c.is_egg = false;
                c.nickname = None;
            }
            batch.push(super::buddy_mutation(player));
            batch.push(
                Mutation::update(Table::Catches)
                    .set("is_egg", false)
                    .set("nickname", "")
                    .filter("user_id", player.id.raw())
                    .filter("id", buddy.id.raw()),
            );
        }
        BuddyProgress::Experience {
            gained,
            leveled_to: Some(level),
        } => {
            msg.push_str(&format!(
                "\n{} gained {gained} EXP and leveled up to level {level}!",
                buddy.nickname
            ));
        }
        BuddyProgress::Experience {
            gained,
            leveled_to: None,
        } => {
            msg.push_str(&format!("\n{} gained {gained} EXP!", buddy.nickname));
        }
        BuddyProgress::HatchTick | BuddyProgress::Unchanged => {}
    }

    let payload = creature.encode()?;
    if let Some(c) = player.catches.get_mut(&buddy.id) {
        c.payload = payload.clone();
    }
    batch.push(payload_mutation(player.id, buddy.id, payload));
    Ok(msg)
}
