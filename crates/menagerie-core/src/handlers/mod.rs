//! Command handlers
//!
//! One handler per command tag, routed by [`dispatch`]. Handlers mutate the
//! aggregate clone they are given and stage mutations into the outcome's
//! batch; they never touch storage or the cache. A failed outcome means the
//! dispatcher discards the clone, so partially-applied in-memory changes on
//! the failure path are harmless by construction.

mod buddy;
mod catching;
mod collection;
mod daycare;
mod items;
mod profile;
mod progression;

pub use catching::{catch_with_rolls, register_catch};

use crate::command::{CommandKind, Outcome};
use crate::creature::Creature;
use crate::error::{Error, Result};
use crate::items::ItemKind;
use crate::mutation::{Mutation, MutationBatch, Table};
use crate::player::{Catch, PlayerAggregate};
use crate::progression::DexRegistration;
use crate::rng::GameRng;
use crate::services::Services;
use crate::settings::GameSettings;
use crate::{CatchId, PlayerId};

/// Everything a handler gets to work with
pub struct HandlerInput<'a> {
    /// Clone of the acting player's aggregate; committed only on success
    pub player: &'a mut PlayerAggregate,
    /// Clone of the receiving player's aggregate for two-party commands
    pub giftee: Option<&'a mut PlayerAggregate>,
    /// Pre-tokenized command arguments
    pub args: &'a [String],
    pub settings: &'a GameSettings,
    pub services: &'a Services,
    pub rng: &'a mut GameRng,
}

/// Route a command to its handler
///
/// The command set is closed; every tag maps to exactly one handler.
pub fn dispatch(kind: CommandKind, input: HandlerInput<'_>) -> Result<Outcome> {
    match kind {
        CommandKind::Catch => catching::catch_creature(input),
        CommandKind::Trade => collection::trade(input),
        CommandKind::List => collection::list(input),
        CommandKind::Info => collection::info(input),
        CommandKind::MassRelease => collection::mass_release(input),
        CommandKind::Release => collection::release(input),
        CommandKind::DaycareInfo => daycare::daycare_info(input),
        CommandKind::Daycare => daycare::daycare(input),
        CommandKind::Gift => collection::gift(input),
        CommandKind::SetTrainerInfo => profile::set_trainer_info(input),
        CommandKind::TrainerInfo => profile::trainer_info(input),
        CommandKind::FavoritesInfo => collection::favorites_info(input),
        CommandKind::Favorites => collection::favorites(input),
        CommandKind::Dex => progression::dex(input),
        CommandKind::Perks => progression::perks(input),
        CommandKind::SpeciesBoost => progression::species_boost(input),
        CommandKind::Buddy => buddy::buddy(input),
        CommandKind::Nickname => buddy::nickname(input),
        CommandKind::Evolve => buddy::evolve(input),
        CommandKind::GiveItem => items::give_item(input),
        CommandKind::GiftItem => items::gift_item(input),
        CommandKind::TakeItem => items::take_item(input),
        CommandKind::ItemList => items::item_list(input),
        CommandKind::ItemDrop => items::item_drop(input),
        CommandKind::SetTimezone => profile::set_timezone(input),
        CommandKind::DeletePlayer => profile::delete_player(input),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Argument at `index`, empty string when absent
pub(crate) fn arg(args: &[String], index: usize) -> &str {
    args.get(index).map(String::as_str).unwrap_or("")
}

pub(crate) fn parse_catch_id(input: &str) -> Option<CatchId> {
    input.trim().parse::<u32>().ok().map(CatchId::new)
}

pub(crate) fn star(shiny: bool) -> &'static str {
    if shiny {
        "★"
    } else {
        ""
    }
}

/// "★Name-Form" display label for a catch
pub(crate) fn catch_label(services: &Services, catch: &Catch) -> String {
    format!(
        "{}{}",
        star(catch.shiny),
        services.catalog.display(catch.species, catch.form)
    )
}

/// Decode a catch's payload, surfacing corruption as an internal error
pub(crate) fn decode_payload(catch: &Catch) -> Result<Creature> {
    Creature::decode(&catch.payload)
        .map_err(|e| Error::Payload(format!("catch {}: {e}", catch.id)))
}

pub(crate) fn payload_mutation(player_id: PlayerId, id: CatchId, payload: Vec<u8>) -> Mutation {
    Mutation::update(Table::CatchPayloads)
        .set("data", payload)
        .filter("user_id", player_id.raw())
        .filter("id", id.raw())
}

/// Add items to the bag and stage the matching insert or update
pub(crate) fn grant_item(
    player: &mut PlayerAggregate,
    kind: ItemKind,
    n: u32,
    batch: &mut MutationBatch,
) {
    let had = player.items.has(kind);
    let count = player.items.add(kind, n);
    if had {
        batch.push(
            Mutation::update(Table::Items)
                .set("count", count)
                .filter("user_id", player.id.raw())
                .filter("id", kind.as_str()),
        );
    } else {
        batch.push(
            Mutation::insert(Table::Items)
                .set("user_id", player.id.raw())
                .set("id", kind.as_str())
                .set("count", count),
        );
    }
}

/// Remove items from the bag and stage the matching update or delete
///
/// Returns false (staging nothing) when the bag holds fewer than `n`.
pub(crate) fn consume_item(
    player: &mut PlayerAggregate,
    kind: ItemKind,
    n: u32,
    batch: &mut MutationBatch,
) -> bool {
    match player.items.remove(kind, n) {
        None => false,
        Some(0) => {
            batch.push(
                Mutation::delete(Table::Items)
                    .filter("user_id", player.id.raw())
                    .filter("id", kind.as_str()),
            );
            true
        }
        Some(remaining) => {
            batch.push(
                Mutation::update(Table::Items)
                    .set("count", remaining)
                    .filter("user_id", player.id.raw())
                    .filter("id", kind.as_str()),
            );
            true
        }
    }
}

/// Full-row daycare update reflecting the aggregate's current slots
pub(crate) fn daycare_mutation(player: &PlayerAggregate) -> Mutation {
    let mut m = Mutation::update(Table::Daycare);
    for (slot, occ, id, species, form, ball, shiny) in [
        (
            player.daycare.slot1,
            "occupied1",
            "id1",
            "species1",
            "form1",
            "ball1",
            "shiny1",
        ),
        (
            player.daycare.slot2,
            "occupied2",
            "id2",
            "species2",
            "form2",
            "ball2",
            "shiny2",
        ),
    ] {
        match slot {
            Some(s) => {
                m = m
                    .set(occ, true)
                    .set(id, s.id.raw())
                    .set(species, s.species.raw())
                    .set(form, s.form)
                    .set(ball, s.ball.as_str())
                    .set(shiny, s.shiny);
            }
            None => {
                m = m
                    .set(occ, false)
                    .set(id, 0u32)
                    .set(species, 0u16)
                    .set(form, 0u8)
                    .set(ball, "")
                    .set(shiny, false);
            }
        }
    }
    m.filter("user_id", player.id.raw())
}

/// Full-row buddy update reflecting the aggregate's current buddy
pub(crate) fn buddy_mutation(player: &PlayerAggregate) -> Mutation {
    let m = Mutation::update(Table::Buddy);
    let m = match &player.buddy {
        Some(b) => m
            .set("occupied", true)
            .set("id", b.id.raw())
            .set("name", b.nickname.clone())
            .set("ability", b.ability.raw()),
        None => m
            .set("occupied", false)
            .set("id", 0u32)
            .set("name", "")
            .set("ability", 0u16),
    };
    m.filter("user_id", player.id.raw())
}

/// Serialized active-perk list for the `perks` column
pub(crate) fn perks_text(player: &PlayerAggregate) -> String {
    player
        .perks
        .active
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Compose the registration suffix appended to catch/gift/evolve messages
///
/// Also used by the dispatcher when it registers a split-evolution catch.
pub fn dex_message(reg: DexRegistration, giftee_name: Option<&str>) -> String {
    let mut msg = String::new();
    if reg.newly_registered {
        msg.push_str(&match giftee_name {
            Some(name) => format!("\n{name} registered a new entry to the dex!"),
            None => "\nRegistered to the dex.".to_string(),
        });
    }
    if reg.completed {
        if reg.granted_charm {
            msg.push_str(" Level increased! Received a ★**Shiny Charm**★");
        } else {
            msg.push_str(" Level increased!");
        }
    }
    msg
}
