//! Collection commands: trade, list, info, release, mass-release, gift,
//! favorites

use super::{arg, catch_label, decode_payload, dex_message, parse_catch_id, HandlerInput};
use crate::command::Outcome;
use crate::creature::BallKind;
use crate::error::Result;
use crate::mutation::{Mutation, Table};
use crate::player::{Catch, MAX_DEX_COMPLETIONS};
use crate::progression;
use crate::services::Services;
use crate::{CatchId, SpeciesId};

/// Mark a catch as pending trade and hand its creature to the front end
pub fn trade(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;

    let Some(id) = parse_catch_id(arg(input.args, 0)) else {
        return Ok(Outcome::failure("Please enter a numerical catch ID."));
    };
    let Some(catch) = player.available_catch(id) else {
        return Ok(Outcome::failure("There is no creature with this ID."));
    };
    if player.daycare.holds(id) || catch.favorite || player.is_buddy(id) {
        return Ok(Outcome::failure(
            "Please remove your creature from favorites and daycare before trading!",
        ));
    }

    let creature = decode_payload(catch)?;
    if !services.validator.is_valid(&creature) {
        return Ok(Outcome::failure("Oops, I cannot trade this creature!"));
    }

    let label = catch_label(services, catch);
    if let Some(c) = player.catches.get_mut(&id) {
        c.traded = true;
    }

    let mut out = Outcome::success(format!("Your {label} is ready to trade!")).titled("Trade");
    out.batch.push(
        Mutation::update(Table::Catches)
            .set("was_traded", true)
            .filter("user_id", player.id.raw())
            .filter("id", id.raw()),
    );
    out.caught = Some(creature);
    out.caught_id = Some(id);
    out.pending_trade = Some(id);
    Ok(out)
}

enum ListCategory {
    All,
    Legendaries,
    Events,
    Eggs,
    Shinies,
    Ball(BallKind),
    SpeciesForm(SpeciesId, u8),
    Species(SpeciesId),
    Form(String),
    Nickname(String),
}

fn resolve_category(target: &str, services: &Services) -> ListCategory {
    match target.to_lowercase().as_str() {
        "all" => return ListCategory::All,
        "legendaries" => return ListCategory::Legendaries,
        "events" => return ListCategory::Events,
        "eggs" => return ListCategory::Eggs,
        "shinies" => return ListCategory::Shinies,
        _ => {}
    }
    if let Some(ball) = BallKind::parse(target) {
        return ListCategory::Ball(ball);
    }
    if let Some((species_name, form_name)) = target.split_once('-') {
        if let Some(species) = services.catalog.by_name(species_name) {
            if let Some(data) = services.catalog.get(species) {
                if let Some(form) = data
                    .forms
                    .iter()
                    .position(|f| f.eq_ignore_ascii_case(form_name.trim()))
                {
                    return ListCategory::SpeciesForm(species, form as u8);
                }
            }
        }
    }
    if let Some(species) = services.catalog.by_name(target) {
        return ListCategory::Species(species);
    }
    if services.catalog.branch_form_index(target).is_some() {
        return ListCategory::Form(target.trim().to_lowercase());
    }
    ListCategory::Nickname(target.trim().to_string())
}

fn category_matches(
    category: &ListCategory,
    catch: &Catch,
    services: &Services,
) -> bool {
    match category {
        ListCategory::All => true,
        ListCategory::Legendaries => catch.legendary,
        ListCategory::Events => catch.event,
        ListCategory::Eggs => catch.is_egg,
        ListCategory::Shinies => catch.shiny,
        ListCategory::Ball(ball) => catch.ball == *ball,
        ListCategory::SpeciesForm(species, form) => {
            catch.species == *species && catch.form == *form
        }
        ListCategory::Species(species) => catch.species == *species,
        ListCategory::Form(name) => services
            .catalog
            .form_suffix(catch.species, catch.form)
            .trim_start_matches('-')
            .eq_ignore_ascii_case(name),
        ListCategory::Nickname(name) => catch.nickname.as_deref() == Some(name.as_str()),
    }
}

/// Filtered listing of the player's collection
pub fn list(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = &*input.player;
    let services = input.services;

    let raw = arg(input.args, 0);
    let (target, refinements): (&str, Vec<String>) = match raw.split_once('=') {
        Some((head, tail)) => (
            head.trim(),
            tail.split('=').map(|p| p.trim().to_lowercase()).collect(),
        ),
        None => (raw.trim(), Vec::new()),
    };

    if target.is_empty() {
        return Ok(Outcome::failure(
            "In order to filter creatures, we need to know which creatures to filter.",
        ));
    }

    let refine_shiny = refinements.iter().any(|f| f == "shiny");
    let mut refine_ball = None;
    if let Some(other) = refinements.iter().find(|f| f.as_str() != "shiny") {
        match BallKind::parse(other) {
            Some(ball) => refine_ball = Some(ball),
            None => return Ok(Outcome::failure("No results found.")),
        }
    }

    let category = resolve_category(target, services);
    let shinies_only = matches!(category, ListCategory::Shinies);

    let matches: Vec<&Catch> = player
        .catches
        .values()
        .filter(|c| !c.traded)
        .filter(|c| category_matches(&category, c, services))
        .filter(|c| !refine_shiny || c.shiny)
        .filter(|c| refine_ball.map(|b| c.ball == b).unwrap_or(true))
        .collect();

    if matches.is_empty() {
        return Ok(Outcome::failure("No results found."));
    }

    let mut entries = Vec::new();
    let mut shiny_count = 0usize;
    for catch in &matches {
        let name = services.catalog.display(catch.species, catch.form);
        if catch.shiny {
            shiny_count += 1;
            entries.push(format!("(__{}__) {name}", catch.id));
        } else {
            entries.push(format!("({}) {name}", catch.id));
        }
    }

    let list_name = match &category {
        ListCategory::Shinies => "Shiny Creatures".to_string(),
        ListCategory::All => "Creatures".to_string(),
        ListCategory::Eggs => "Eggs".to_string(),
        _ => format!("{target} List"),
    };
    let counts = if shinies_only {
        format!("★{shiny_count}")
    } else {
        format!("{}, ★{shiny_count}", matches.len())
    };

    let out = Outcome::success(entries.join(", ")).titled(format!(
        "{}'s {list_name} (Total: {counts})",
        player.username
    ));
    Ok(out)
}

/// Full detail view of one catch
pub fn info(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = &*input.player;
    let services = input.services;

    let Some(id) = parse_catch_id(arg(input.args, 0)) else {
        return Ok(Outcome::failure("Please enter a numerical catch ID."));
    };
    let Some(catch) = player.available_catch(id) else {
        return Ok(Outcome::failure("Could not find this ID."));
    };

    let creature = decode_payload(catch)?;
    let mut out = Outcome::success(format!(
        "Level {}, {} Ball, Friendship {}.",
        creature.level, creature.ball, creature.friendship
    ))
    .titled(format!(
        "{}'s {} (ID: {id})",
        player.username,
        catch_label(services, catch)
    ));
    out.caught = Some(creature);
    out.caught_id = Some(id);
    Ok(out)
}

/// Release one catch
pub fn release(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;

    let Some(id) = parse_catch_id(arg(input.args, 0)) else {
        return Ok(Outcome::failure("Please enter a numerical catch ID."));
    };
    let Some(catch) = player.available_catch(id) else {
        return Ok(Outcome::failure("Cannot find this creature."));
    };
    if player.daycare.holds(id) || catch.favorite || player.is_buddy(id) {
        return Ok(Outcome::failure(
            "Cannot release a creature in daycare, favorites, or if it's your buddy.",
        ));
    }

    let label = catch_label(services, catch);
    player.catches.remove(&id);

    let mut out = Outcome::success(format!("You release your {label}."));
    out.batch.push(
        Mutation::delete(Table::Catches)
            .filter("user_id", player.id.raw())
            .filter("id", id.raw()),
    );
    out.batch.push(
        Mutation::delete(Table::CatchPayloads)
            .filter("user_id", player.id.raw())
            .filter("id", id.raw()),
    );
    Ok(out)
}

fn is_mirror_species(services: &Services, species: SpeciesId) -> bool {
    services
        .catalog
        .get(species)
        .map(|s| s.is_mirror)
        .unwrap_or(false)
}

/// Release every catch matching a category filter
///
/// Favorites, pending trades, daycare occupants, the buddy and the mirror
/// species are never released; shinies, events and legendaries are only
/// released by their own categories.
pub fn mass_release(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;
    let target = arg(input.args, 0).trim().to_lowercase();

    let ball = BallKind::parse(&target);
    let (species, species_form) = match target.split_once('-') {
        Some((name, form_name)) => {
            let species = services.catalog.by_name(name);
            let form = species.and_then(|s| {
                services.catalog.get(s).and_then(|data| {
                    data.forms
                        .iter()
                        .position(|f| f.eq_ignore_ascii_case(form_name.trim()))
                })
            });
            (species, form.map(|f| f as u8))
        }
        None => (services.catalog.by_name(&target), None),
    };

    let releasable: Vec<CatchId> = player
        .catches
        .values()
        .filter(|c| {
            !c.favorite
                && !c.traded
                && !player.daycare.holds(c.id)
                && !player.is_buddy(c.id)
                && !is_mirror_species(services, c.species)
        })
        .filter(|c| {
            if let Some(ball) = ball {
                c.ball == ball && !c.shiny && !c.legendary
            } else if target == "shinies" {
                c.shiny && !c.event && !c.legendary
            } else if target == "legendaries" {
                c.legendary && !c.shiny && !c.event
            } else if target == "events" {
                c.event && !c.shiny && !c.legendary
            } else if let Some(species) = species {
                c.species == species
                    && species_form.map(|f| c.form == f).unwrap_or(c.form == 0)
                    && !c.shiny
                    && c.ball != BallKind::Cherish
            } else {
                target.is_empty() && !c.shiny && !c.event && !c.legendary
            }
        })
        .map(|c| c.id)
        .collect();

    if releasable.is_empty() {
        let message = if target.is_empty() {
            "Cannot find any more non-shiny, non-mirror, non-favorite, non-event, non-buddy, non-legendary creatures to release."
        } else {
            "Cannot find anything that could be released with the specified criteria."
        };
        return Ok(Outcome::failure(message));
    }

    let mut out = Outcome::default();
    out.success = true;
    for id in &releasable {
        player.catches.remove(id);
        out.batch.push(
            Mutation::delete(Table::Catches)
                .filter("user_id", player.id.raw())
                .filter("id", id.raw()),
        );
    }
    for id in &releasable {
        out.batch.push(
            Mutation::delete(Table::CatchPayloads)
                .filter("user_id", player.id.raw())
                .filter("id", id.raw()),
        );
    }

    out.message = if target.is_empty() {
        "Every non-shiny creature was released, excluding favorites, buddy, events, legendaries, the mirror species, and those in daycare.".to_string()
    } else {
        let described = if target == "shinies" {
            "shiny creature".to_string()
        } else if target == "events" {
            "non-shiny event creature".to_string()
        } else if target == "legendaries" {
            "non-shiny legendary creature".to_string()
        } else if let Some(ball) = ball {
            format!("creature in a {ball} Ball")
        } else {
            format!("non-shiny {target}")
        };
        format!("Every {described} was released, excluding favorites, buddy, and those in daycare.")
    };
    Ok(out)
}

/// Move a catch from one player's collection to another's
pub fn gift(input: HandlerInput<'_>) -> Result<Outcome> {
    let HandlerInput {
        player,
        giftee,
        args,
        services,
        ..
    } = input;
    let Some(giftee) = giftee else {
        return Ok(Outcome::failure("Cannot find the receiving player."));
    };

    let Some(id) = parse_catch_id(arg(args, 0)) else {
        return Ok(Outcome::failure("Please enter a numerical catch ID."));
    };
    let Some(catch) = player.available_catch(id) else {
        return Ok(Outcome::failure("Cannot find this creature."));
    };
    if player.daycare.holds(id) || catch.favorite || player.is_buddy(id) {
        return Ok(Outcome::failure(
            "Please remove your creature from favorites, daycare, and make sure it's not an active buddy before gifting!",
        ));
    }

    let label = catch_label(services, catch);
    let species = catch.species;
    let legendary = services.catalog.is_legendary(species);
    let new_id = giftee.next_catch_id();

    let mut moved = catch.clone();
    moved.id = new_id;
    moved.favorite = false;
    moved.traded = false;
    moved.legendary = legendary;

    let mut out = Outcome::default();
    out.success = true;
    out.batch.push(
        Mutation::insert(Table::Catches)
            .set("user_id", giftee.id.raw())
            .set("id", new_id.raw())
            .set("species", moved.species.raw())
            .set("form", moved.form)
            .set("is_shiny", moved.shiny)
            .set("ball", moved.ball.as_str())
            .set("nickname", moved.nickname.clone().unwrap_or_default())
            .set("is_egg", moved.is_egg)
            .set("was_traded", false)
            .set("is_favorite", false)
            .set("is_legendary", legendary)
            .set("is_event", moved.event),
    );
    out.batch.push(
        Mutation::insert(Table::CatchPayloads)
            .set("user_id", giftee.id.raw())
            .set("id", new_id.raw())
            .set("data", moved.payload.clone()),
    );
    out.batch.push(
        Mutation::delete(Table::Catches)
            .filter("user_id", player.id.raw())
            .filter("id", id.raw()),
    );
    out.batch.push(
        Mutation::delete(Table::CatchPayloads)
            .filter("user_id", player.id.raw())
            .filter("id", id.raw()),
    );

    giftee.catches.insert(new_id, moved);
    player.catches.remove(&id);

    let mut message = format!(
        "You gifted your {label} to {}. New ID is {new_id}.",
        giftee.username
    );

    // Register into the giftee's dex while they are still progressing
    let dex_size = services.catalog.dex_size();
    let missing = dex_size.saturating_sub(giftee.dex.entries.len());
    if giftee.dex.completion_count == 0
        || (giftee.dex.completion_count < MAX_DEX_COMPLETIONS && missing <= 50)
    {
        let giftee_name = giftee.username.clone();
        let reg = progression::register_species(giftee, species, dex_size, &mut out.batch);
        message.push_str(&dex_message(reg, Some(&giftee_name)));
    }

    out.message = message;
    Ok(out)
}

/// Listing of favorited catches
pub fn favorites_info(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = &*input.player;
    let services = input.services;

    let favorites: Vec<&Catch> = player
        .catches
        .values()
        .filter(|c| c.favorite && !c.traded)
        .collect();
    if favorites.is_empty() {
        return Ok(Outcome::failure("You don't have anything in favorites yet!"));
    }

    let entries: Vec<String> = favorites
        .iter()
        .map(|c| {
            let name = services.catalog.display(c.species, c.form);
            if c.shiny {
                format!("(__{}__) {name}", c.id)
            } else {
                format!("({}) {name}", c.id)
            }
        })
        .collect();

    Ok(Outcome::success(entries.join(", "))
        .titled(format!("{}'s Favorites", player.username)))
}

/// Toggle one favorite, or clear them all
pub fn favorites(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;
    let raw = arg(input.args, 0).trim().to_lowercase();

    if raw == "clear" {
        for catch in player.catches.values_mut() {
            catch.favorite = false;
        }
        let mut out = Outcome::success(format!(
            "{}, all of your favorites were cleared!",
            player.username
        ))
        .titled("Favorites Clear");
        out.batch.push(
            Mutation::update(Table::Catches)
                .set("is_favorite", false)
                .filter("user_id", player.id.raw())
                .filter("is_favorite", true),
        );
        return Ok(out);
    }

    let Some(id) = parse_catch_id(&raw) else {
        return Ok(Outcome::failure("Please enter a numerical catch ID."));
    };
    let Some(catch) = player.available_catch(id) else {
        return Ok(Outcome::failure("Cannot find this creature."));
    };

    let label = catch_label(services, catch);
    let now_favorite = !catch.favorite;
    if let Some(c) = player.catches.get_mut(&id) {
        c.favorite = now_favorite;
    }

    let (title, message) = if now_favorite {
        (
            "Favorites Addition",
            format!("{}, added your {label} to favorites!", player.username),
        )
    } else {
        (
            "Favorites Removal",
            format!("{}, removed your {label} from favorites!", player.username),
        )
    };

    let mut out = Outcome::success(message).titled(title);
    out.batch.push(
        Mutation::update(Table::Catches)
            .set("is_favorite", now_favorite)
            .filter("user_id", player.id.raw())
            .filter("id", id.raw()),
    );
    Ok(out)
}
