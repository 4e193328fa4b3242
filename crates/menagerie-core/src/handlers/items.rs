//! Item commands: give, gift, take, list, drop

use super::{
    arg, buddy_mutation, consume_item, decode_payload, grant_item, payload_mutation, HandlerInput,
};
use crate::command::Outcome;
use crate::error::Result;
use crate::items::ItemKind;
use crate::mutation::{Mutation, Table};
use crate::services::Services;

/// Apply the held-item form reactions for the chimera and origin species
///
/// Returns true when the buddy's cached ability must be refreshed as well.
fn apply_form_reaction(
    creature: &mut crate::creature::Creature,
    services: &Services,
    settings: &crate::settings::GameSettings,
) -> bool {
    let held = creature.held_item;
    let reactive_form = match held {
        Some(ItemKind::ChimeraMemory) if creature.species == settings.chimera_species => Some(1),
        Some(ItemKind::OriginOrb) if creature.species == settings.origin_species => Some(1),
        _ if creature.species == settings.chimera_species
            || creature.species == settings.origin_species =>
        {
            Some(0)
        }
        _ => None,
    };

    let mut refresh_ability = false;
    if let Some(form) = reactive_form {
        if creature.form != form {
            creature.form = form;
            if creature.species == settings.origin_species {
                // The orb shift also swaps the ability slot back in
                if let Some(data) = services.catalog.get(creature.species) {
                    creature.ability = data.abilities[0];
                }
                refresh_ability = true;
            }
        }
    }
    refresh_ability
}

/// Hand an item from the bag to the buddy
pub fn give_item(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;
    let settings = input.settings;

    let Some(buddy) = player.buddy.clone() else {
        return Ok(Outcome::failure(
            "You don't have an active buddy to give an item to.",
        ));
    };
    let Some(item) = ItemKind::parse(arg(input.args, 0)) else {
        return Ok(Outcome::failure("You do not have this item."));
    };
    if !player.items.has(item) {
        return Ok(Outcome::failure("You do not have this item."));
    }
    let Some(catch) = player.available_catch(buddy.id) else {
        return Ok(Outcome::failure("Could not find this creature."));
    };

    let mut creature = decode_payload(catch)?;
    if creature.is_egg {
        return Ok(Outcome::failure("Eggs cannot hold items!"));
    }

    let mut out = Outcome::default();
    out.success = true;

    // Anything already held goes back into the bag first
    if let Some(previous) = creature.held_item.take() {
        grant_item(player, previous, 1, &mut out.batch);
    }

    creature.held_item = Some(item);
    let refresh_ability = apply_form_reaction(&mut creature, services, settings);

    if !services.validator.is_valid(&creature) {
        let name = creature
            .nickname
            .clone()
            .unwrap_or_else(|| services.catalog.display(creature.species, creature.form));
        return Ok(Outcome::failure(format!(
            "Oops, something went wrong while giving an item to {name}!"
        )));
    }

    consume_item(player, item, 1, &mut out.batch);

    let payload = creature.encode()?;
    if let Some(c) = player.catches.get_mut(&buddy.id) {
        c.form = creature.form;
        c.payload = payload.clone();
    }
    if refresh_ability {
        if let Some(b) = player.buddy.as_mut() {
            b.ability = creature.ability;
        }
        out.batch.push(buddy_mutation(player));
    }
    out.batch.push(payload_mutation(player.id, buddy.id, payload));

    out.item = Some(item);
    out.message = format!("You gave {} {item} to your buddy!", item.article());
    Ok(out)
}

/// Transfer items from one player's bag to another's
pub fn gift_item(input: HandlerInput<'_>) -> Result<Outcome> {
    let HandlerInput {
        player,
        giftee,
        args,
        ..
    } = input;
    let Some(giftee) = giftee else {
        return Ok(Outcome::failure("Cannot find the receiving player."));
    };

    let Some(item) = ItemKind::parse(arg(args, 0)) else {
        return Ok(Outcome::failure("You do not have this item."));
    };
    let Some(count) = arg(args, 1).trim().parse::<u32>().ok() else {
        return Ok(Outcome::failure("Please enter a numerical item count."));
    };
    if count == 0 {
        return Ok(Outcome::failure("Please enter a non-zero amount."));
    }
    if !player.items.has(item) {
        return Ok(Outcome::failure("You do not have this item."));
    }
    if player.items.count(item) < count {
        return Ok(Outcome::failure("You do not have enough of this item."));
    }

    let mut out = Outcome::default();
    out.success = true;
    grant_item(giftee, item, count, &mut out.batch);
    consume_item(player, item, count, &mut out.batch);

    let plural = if count == 1 { "" } else { "s" };
    out.message = format!(
        "You gifted {count} {item}{plural} to {}!",
        giftee.username
    );
    out.item = Some(item);
    Ok(out)
}

/// Take the buddy's held item back into the bag
pub fn take_item(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;
    let settings = input.settings;

    let Some(buddy) = player.buddy.clone() else {
        return Ok(Outcome::failure(
            "You don't have an active buddy to take an item from.",
        ));
    };
    let Some(catch) = player.available_catch(buddy.id) else {
        return Ok(Outcome::failure("Could not find this creature."));
    };

    let mut creature = decode_payload(catch)?;
    let Some(item) = creature.held_item.take() else {
        return Ok(Outcome::failure("Your buddy isn't holding an item."));
    };

    let mut out = Outcome::default();
    out.success = true;
    grant_item(player, item, 1, &mut out.batch);

    let refresh_ability = apply_form_reaction(&mut creature, services, settings);

    let payload = creature.encode()?;
    if let Some(c) = player.catches.get_mut(&buddy.id) {
        c.form = creature.form;
        c.payload = payload.clone();
    }
    if refresh_ability {
        if let Some(b) = player.buddy.as_mut() {
            b.ability = creature.ability;
        }
        out.batch.push(buddy_mutation(player));
    }
    out.batch.push(payload_mutation(player.id, buddy.id, payload));

    out.item = Some(item);
    out.message = format!("You took {} {item} from your buddy!", item.article());
    Ok(out)
}

/// List held items, optionally filtered to one kind
pub fn item_list(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = &*input.player;
    let raw = arg(input.args, 0).trim().to_lowercase();

    let filter = if raw == "all" {
        None
    } else if raw.is_empty() {
        return Ok(Outcome::failure("Nothing to search for."));
    } else {
        match ItemKind::parse(&raw) {
            Some(kind) => Some(kind),
            None => return Ok(Outcome::failure("Unrecognized item.")),
        }
    };

    let entries: Vec<String> = player
        .items
        .iter()
        .filter(|(kind, _)| filter.map(|f| *kind == f).unwrap_or(true))
        .map(|(kind, count)| format!("**{kind}**: {count}"))
        .collect();

    if entries.is_empty() {
        return Ok(Outcome::failure(
            "Nothing found that meets the search criteria, or you have no items left.",
        ));
    }

    let title = match filter {
        Some(kind) => format!("{}'s {kind} List", player.username),
        None => format!("{}'s Item List", player.username),
    };
    Ok(Outcome::success(entries.join(" | ")).titled(title))
}

/// Drop every instance of one kind, or the whole bag
pub fn item_drop(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let raw = arg(input.args, 0).trim().to_lowercase();

    let filter = if raw == "all" {
        None
    } else if raw.is_empty() {
        return Ok(Outcome::failure("Nothing specified to drop."));
    } else {
        match ItemKind::parse(&raw) {
            Some(kind) => Some(kind),
            None => return Ok(Outcome::failure("Unrecognized item.")),
        }
    };

    let dropped: Vec<(ItemKind, u32)> = match filter {
        None => player.items.take_all(),
        Some(kind) => match player.items.take(kind) {
            Some(count) => vec![(kind, count)],
            None => Vec::new(),
        },
    };

    if dropped.is_empty() {
        return Ok(Outcome::failure(
            "Nothing found that meets the search criteria, or you have no items.",
        ));
    }

    let mut out = Outcome::default();
    out.success = true;
    for (kind, _) in &dropped {
        out.batch.push(
            Mutation::delete(Table::Items)
                .filter("user_id", player.id.raw())
                .filter("id", kind.as_str()),
        );
    }

    out.message = match filter {
        None => "Dropped all items!".to_string(),
        Some(kind) => {
            let plural = if dropped[0].1 > 1 { "s" } else { "" };
            format!("Dropped all {kind}{plural}!")
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::command::CommandKind;
    use crate::creature::{Ability, BallKind, Creature, ShinyTier, TrainerProfile};
    use crate::handlers::{dispatch, register_catch, HandlerInput};
    use crate::mutation::MutationBatch;
    use crate::player::PlayerAggregate;
    use crate::rng::GameRng;
    use crate::settings::GameSettings;
    use crate::{CatchId, PlayerId, SpeciesId};

    fn creature(species: SpeciesId) -> Creature {
        Creature {
            species,
            form: 0,
            shiny: ShinyTier::None,
            ball: BallKind::Standard,
            level: 10,
            experience: 1000,
            friendship: 70,
            held_item: None,
            is_egg: false,
            nickname: None,
            ability: Ability::NONE,
            trainer: TrainerProfile::default(),
            fateful_event: false,
        }
    }

    fn player_with_buddy(species: SpeciesId) -> PlayerAggregate {
        let services = Services::standard();
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let mut batch = MutationBatch::new();
        register_catch(&mut player, &creature(species), &services, &mut batch).unwrap();
        player.buddy = Some(crate::player::Buddy {
            id: CatchId::new(0),
            nickname: "Buddy".to_string(),
            ability: Ability::NONE,
        });
        player
    }

    fn run(
        kind: CommandKind,
        player: &mut PlayerAggregate,
        giftee: Option<&mut PlayerAggregate>,
        args: &[&str],
    ) -> Outcome {
        let services = Services::standard();
        let settings = GameSettings::default();
        let mut rng = GameRng::new(7);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        dispatch(
            kind,
            HandlerInput {
                player,
                giftee,
                args: &args,
                settings: &settings,
                services: &services,
                rng: &mut rng,
            },
        )
        .unwrap()
    }

    fn held_item(player: &PlayerAggregate) -> Option<ItemKind> {
        let catch = player.catches.get(&CatchId::new(0)).unwrap();
        Creature::decode(&catch.payload).unwrap().held_item
    }

    #[test]
    fn test_give_and_take_item() {
        let mut player = player_with_buddy(catalog::EMBERLING);
        player.items.add(ItemKind::CalmBell, 1);

        let out = run(CommandKind::GiveItem, &mut player, None, &["calm bell"]);
        assert!(out.success, "{}", out.message);
        assert_eq!(held_item(&player), Some(ItemKind::CalmBell));
        assert!(!player.items.has(ItemKind::CalmBell));

        let out = run(CommandKind::TakeItem, &mut player, None, &[]);
        assert!(out.success);
        assert_eq!(held_item(&player), None);
        assert_eq!(player.items.count(ItemKind::CalmBell), 1);
    }

    #[test]
    fn test_give_swaps_held_item_back_to_bag() {
        let mut player = player_with_buddy(catalog::EMBERLING);
        player.items.add(ItemKind::CalmBell, 1);
        player.items.add(ItemKind::MoonStone, 1);

        run(CommandKind::GiveItem, &mut player, None, &["calm bell"]);
        let out = run(CommandKind::GiveItem, &mut player, None, &["moon stone"]);
        assert!(out.success, "{}", out.message);
        assert_eq!(held_item(&player), Some(ItemKind::MoonStone));
        // The bell came back
        assert_eq!(player.items.count(ItemKind::CalmBell), 1);
        assert!(!player.items.has(ItemKind::MoonStone));
    }

    #[test]
    fn test_give_item_requires_stock_and_buddy() {
        let mut player = player_with_buddy(catalog::EMBERLING);
        let out = run(CommandKind::GiveItem, &mut player, None, &["calm bell"]);
        assert!(!out.success);

        let mut no_buddy = PlayerAggregate::new(PlayerId::new(2), "Sam");
        no_buddy.items.add(ItemKind::CalmBell, 1);
        let out = run(CommandKind::GiveItem, &mut no_buddy, None, &["calm bell"]);
        assert!(!out.success);
        assert!(out.message.contains("active buddy"));
    }

    #[test]
    fn test_origin_orb_shifts_form() {
        let mut player = player_with_buddy(catalog::UMBRYS);
        player.items.add(ItemKind::OriginOrb, 1);

        let out = run(CommandKind::GiveItem, &mut player, None, &["origin orb"]);
        assert!(out.success, "{}", out.message);
        assert_eq!(player.catches.get(&CatchId::new(0)).unwrap().form, 1);

        let out = run(CommandKind::TakeItem, &mut player, None, &[]);
        assert!(out.success);
        assert_eq!(player.catches.get(&CatchId::new(0)).unwrap().form, 0);
    }

    #[test]
    fn test_gift_item_transfers_counts() {
        let mut giver = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let mut giftee = PlayerAggregate::new(PlayerId::new(2), "Sam");
        giver.items.add(ItemKind::HoneySweet, 5);

        let out = run(
            CommandKind::GiftItem,
            &mut giver,
            Some(&mut giftee),
            &["honey sweet", "3"],
        );
        assert!(out.success, "{}", out.message);
        assert_eq!(giver.items.count(ItemKind::HoneySweet), 2);
        assert_eq!(giftee.items.count(ItemKind::HoneySweet), 3);

        let out = run(
            CommandKind::GiftItem,
            &mut giver,
            Some(&mut giftee),
            &["honey sweet", "5"],
        );
        assert!(!out.success);
        assert!(out.message.contains("not have enough"));
    }

    #[test]
    fn test_item_list_and_drop() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        player.items.add(ItemKind::HoneySweet, 2);
        player.items.add(ItemKind::FireStone, 1);

        let out = run(CommandKind::ItemList, &mut player, None, &["all"]);
        assert!(out.success);
        assert!(out.message.contains("**Honey Sweet**: 2"));
        assert!(out.message.contains("**Fire Stone**: 1"));

        let out = run(CommandKind::ItemDrop, &mut player, None, &["honey sweet"]);
        assert!(out.success);
        assert!(!player.items.has(ItemKind::HoneySweet));
        assert!(player.items.has(ItemKind::FireStone));

        let out = run(CommandKind::ItemDrop, &mut player, None, &["all"]);
        assert!(out.success);
        assert!(player.items.is_empty());

        let out = run(CommandKind::ItemDrop, &mut player, None, &["all"]);
        assert!(!out.success);
    }

    #[test]
    fn test_eggs_cannot_hold_items() {
        let services = Services::standard();
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let mut egg = creature(catalog::EMBERLING);
        egg.is_egg = true;
        egg.level = 1;
        let mut batch = MutationBatch::new();
        register_catch(&mut player, &egg, &services, &mut batch).unwrap();
        player.buddy = Some(crate::player::Buddy {
            id: CatchId::new(0),
            nickname: "Egg".to_string(),
            ability: Ability::NONE,
        });
        player.items.add(ItemKind::CalmBell, 1);

        let out = run(CommandKind::GiveItem, &mut player, None, &["calm bell"]);
        assert!(!out.success);
        assert!(out.message.contains("Eggs cannot hold items!"));
    }
}
