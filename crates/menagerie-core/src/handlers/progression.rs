//! Dex and perk commands

use super::{arg, perks_text, HandlerInput};
use crate::command::Outcome;
use crate::error::Result;
use crate::mutation::{Mutation, Table};
use crate::player::{PerkKind, PERK_CAP};

/// Dex summary, or the list of missing species
pub fn dex(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = &*input.player;
    let services = input.services;
    let raw = arg(input.args, 0).trim().to_lowercase();

    if raw == "missing" {
        let mut missing: Vec<&str> = services
            .catalog
            .pool()
            .iter()
            .filter(|s| !player.dex.entries.contains(s))
            .map(|s| services.catalog.name_of(*s))
            .collect();
        missing.sort_unstable();
        return Ok(Outcome::success(missing.join(", ")).titled("Missing Dex Entries"));
    }

    let boost = match player.perks.species_boost {
        Some(species) => services.catalog.name_of(species).to_string(),
        None => "N/A".to_string(),
    };
    Ok(Outcome::success(format!(
        "\n**Dex:** {}/{}\n**Level:** {}\n**Species Boost:** {boost}",
        player.dex.entries.len(),
        services.catalog.dex_size(),
        player.dex.completion_count as usize + player.perks.active.len(),
    ))
    .titled(format!("{}'s Dex", player.username)))
}

/// Perk summary, allocation, or full refund
pub fn perks(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let args = input.args;
    let raw = arg(args, 0).trim().to_lowercase();

    if raw.is_empty() && (player.dex.completion_count > 0 || !player.perks.active.is_empty()) {
        let lines: Vec<String> = PerkKind::ASSIGNABLE
            .iter()
            .map(|kind| format!("**{}:** {}", kind.as_str(), player.perks.count(*kind)))
            .collect();
        return Ok(Outcome::success(lines.join("\n"))
            .titled(format!("{}'s Perks", player.username)));
    }

    if raw == "clear" {
        player.dex.completion_count += player.perks.active.len() as u32;
        player.perks.active.clear();
        player.perks.species_boost = None;

        let mut out = Outcome::success("All active perks cleared!");
        out.batch.push(
            Mutation::update(Table::Perks)
                .set("perks", String::new())
                .set("species_boost", 0u16)
                .filter("user_id", player.id.raw()),
        );
        out.batch.push(
            Mutation::update(Table::Dex)
                .set("dex_count", player.dex.completion_count)
                .filter("user_id", player.id.raw()),
        );
        return Ok(out);
    }

    if player.dex.completion_count == 0 {
        return Ok(Outcome::failure(
            "No perks available. Unassign a perk or complete the dex to get more!",
        ));
    }
    if args.len() < 2 {
        return Ok(Outcome::failure("Not enough parameters provided."));
    }

    let Ok(requested) = arg(args, 1).trim().parse::<u32>() else {
        return Ok(Outcome::failure(
            "Incorrect input, could not parse perk point amount.",
        ));
    };
    if requested > player.dex.completion_count {
        return Ok(Outcome::failure(
            "Not enough points available to assign all requested perks.",
        ));
    }
    if requested == 0 {
        return Ok(Outcome::failure("Please enter a non-zero amount."));
    }

    let kind = match PerkKind::parse(&raw) {
        Some(kind) if PerkKind::ASSIGNABLE.contains(&kind) => kind,
        _ => return Ok(Outcome::failure("Perk name was not recognized.")),
    };

    // Truncate to the per-kind headroom, never over-grant
    let active = player.perks.count(kind);
    let granted = (requested as usize).min(PERK_CAP - active) as u32;
    if granted == 0 {
        return Ok(Outcome::failure("Perk is already maxed out."));
    }

    for _ in 0..granted {
        player.perks.active.push(kind);
        player.dex.completion_count -= 1;
    }

    let mut out = Outcome::success(if granted > 1 {
        format!("Added {granted} perk points to {}!", kind.as_str())
    } else {
        format!("{} perk added!", kind.as_str())
    });
    out.batch.push(
        Mutation::update(Table::Perks)
            .set("perks", perks_text(player))
            .filter("user_id", player.id.raw()),
    );
    out.batch.push(
        Mutation::update(Table::Dex)
            .set("dex_count", player.dex.completion_count)
            .filter("user_id", player.id.raw()),
    );
    Ok(out)
}

/// Point the species-boost perk at a species
pub fn species_boost(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;

    if player.perks.count(PerkKind::SpeciesBoost) == 0 {
        return Ok(Outcome::failure("SpeciesBoost perk isn't active."));
    }
    let Some(species) = services.catalog.by_name(arg(input.args, 0)) else {
        return Ok(Outcome::failure("Entered species was not recognized."));
    };

    player.perks.species_boost = Some(species);
    let mut out = Outcome::success(format!(
        "Catch chance for {} was slightly boosted!",
        services.catalog.name_of(species)
    ));
    out.batch.push(
        Mutation::update(Table::Perks)
            .set("species_boost", species.raw())
            .filter("user_id", player.id.raw()),
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::command::CommandKind;
    use crate::handlers::{dispatch, HandlerInput};
    use crate::player::PlayerAggregate;
    use crate::rng::GameRng;
    use crate::services::Services;
    use crate::settings::GameSettings;
    use crate::PlayerId;

    fn run(kind: CommandKind, player: &mut PlayerAggregate, args: &[&str]) -> Outcome {
        let services = Services::standard();
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
                services: &services,
                rng: &mut rng,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_dex_summary_counts_level() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        player.dex.completion_count = 2;
        player.perks.active = vec![PerkKind::CatchBoost; 3];

        let out = run(CommandKind::Dex, &mut player, &[]);
        assert!(out.success);
        assert!(out.message.contains("**Level:** 5"));
        assert!(out.message.contains("**Species Boost:** N/A"));
    }

    #[test]
    fn test_dex_missing_lists_unseen() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        player.dex.entries.insert(catalog::EMBERLING);

        let out = run(CommandKind::Dex, &mut player, &["missing"]);
        assert!(out.success);
        assert!(!out.message.contains("Emberling"));
        assert!(out.message.contains("Riplet"));
    }

    #[test]
    fn test_perk_assignment_spends_points() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        player.dex.completion_count = 4;

        let out = run(CommandKind::Perks, &mut player, &["catchboost", "3"]);
        assert!(out.success, "{}", out.message);
        assert_eq!(player.perks.count(PerkKind::CatchBoost), 3);
        assert_eq!(player.dex.completion_count, 1);
    }

    #[test]
    fn test_perk_cap_truncates() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        player.dex.completion_count = 10;
        player.perks.active = vec![PerkKind::CatchBoost; 4];

        // Requesting 3 with 4 active grants only 1
        let out = run(CommandKind::Perks, &mut player, &["catchboost", "3"]);
        assert!(out.success);
        assert_eq!(player.perks.count(PerkKind::CatchBoost), PERK_CAP);
        assert_eq!(player.dex.completion_count, 9);

        let out = run(CommandKind::Perks, &mut player, &["catchboost", "1"]);
        assert!(!out.success);
        assert!(out.message.contains("maxed out"));
    }

    #[test]
    fn test_perk_assignment_rejections() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");

        let out = run(CommandKind::Perks, &mut player, &["catchboost", "1"]);
        assert!(!out.success);
        assert!(out.message.contains("No perks available"));

        player.dex.completion_count = 2;
        let out = run(CommandKind::Perks, &mut player, &["catchboost", "3"]);
        assert!(!out.success);
        assert!(out.message.contains("Not enough points"));

        let out = run(CommandKind::Perks, &mut player, &["shinyboost", "1"]);
        assert!(!out.success);
        assert!(out.message.contains("not recognized"));

        let out = run(CommandKind::Perks, &mut player, &["catchboost", "zero"]);
        assert!(!out.success);
    }

    #[test]
    fn test_perk_clear_refunds_everything() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        player.dex.completion_count = 5;
        run(CommandKind::Perks, &mut player, &["catchboost", "3"]);
        run(CommandKind::Perks, &mut player, &["speciesboost", "1"]);
        run(CommandKind::SpeciesBoost, &mut player, &["Galewing"]);
        assert_eq!(player.dex.completion_count, 1);

        let out = run(CommandKind::Perks, &mut player, &["clear"]);
        assert!(out.success);
        assert!(player.perks.active.is_empty());
        assert_eq!(player.perks.species_boost, None);
        assert_eq!(player.dex.completion_count, 5);
    }

    #[test]
    fn test_species_boost_requires_perk() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let out = run(CommandKind::SpeciesBoost, &mut player, &["Galewing"]);
        assert!(!out.success);

        player.perks.active.push(PerkKind::SpeciesBoost);
        let out = run(CommandKind::SpeciesBoost, &mut player, &["Galewing"]);
        assert!(out.success);
        assert_eq!(player.perks.species_boost, Some(catalog::GALEWING));

        let out = run(CommandKind::SpeciesBoost, &mut player, &["Missingno"]);
        assert!(!out.success);
    }
}
