//! Progression ledger: dex registration and the perk-point economy
//!
//! The completion counter doubles as the perk-point wallet. Registering the
//! final missing species clears the registry and bumps the counter; spending
//! a point converts it into one active perk instance; clearing perks refunds
//! everything back into the counter.

use crate::mutation::{Mutation, MutationBatch, Table};
use crate::player::{PlayerAggregate, MAX_DEX_COMPLETIONS};
use crate::items::ItemKind;
use crate::SpeciesId;

/// What a registration attempt did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DexRegistration {
    /// The species was new to the current registry
    pub newly_registered: bool,
    /// This registration crossed the completion threshold
    pub completed: bool,
    /// The one-time first-completion charm was granted
    pub granted_charm: bool,
    /// The completion counter has hit its ceiling; registration is inert
    pub capped: bool,
}

/// Serialize the registry for the `entries` column
pub fn entries_text(player: &PlayerAggregate) -> String {
    player
        .dex
        .entries
        .iter()
        .map(|s| s.raw().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Register a species into the player's dex, staging the mutations
///
/// Crossing the threshold (`dex_size` distinct species) clears the registry
/// and increments the completion counter, capped at
/// [`MAX_DEX_COMPLETIONS`]. The very first completion grants a shiny charm
/// if the player owns none. Re-registering a known species is a no-op for
/// the counter.
pub fn register_species(
    player: &mut PlayerAggregate,
    species: SpeciesId,
    dex_size: usize,
    batch: &mut MutationBatch,
) -> DexRegistration {
    let mut reg = DexRegistration::default();

    if player.dex.completion_count >= MAX_DEX_COMPLETIONS {
        reg.capped = true;
        return reg;
    }

    if player.dex.entries.insert(species) {
        reg.newly_registered = true;
        batch.push(
            Mutation::update(Table::Dex)
                .set("entries", entries_text(player))
                .filter("user_id", player.id.raw()),
        );
    }

    if player.dex.entries.len() >= dex_size && player.dex.completion_count < MAX_DEX_COMPLETIONS {
        player.dex.entries.clear();
        player.dex.completion_count += 1;
        reg.completed = true;

        if player.dex.completion_count == 1 && !player.items.has(ItemKind::ShinyCharm) {
            player.items.add(ItemKind::ShinyCharm, 1);
            reg.granted_charm = true;
            batch.push(
                Mutation::insert(Table::Items)
                    .set("user_id", player.id.raw())
                    .set("id", ItemKind::ShinyCharm.as_str())
                    .set("count", 1u32),
            );
        }

        batch.push(
            Mutation::update(Table::Dex)
                .set("entries", String::new())
                .set("dex_count", player.dex.completion_count)
                .filter("user_id", player.id.raw()),
        );
    }

    reg
}
