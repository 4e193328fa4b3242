//! Trainer profile, timezone and player-deletion commands

use super::{arg, HandlerInput};
use crate::command::Outcome;
use crate::creature::Gender;
use crate::error::Result;
use crate::items::ItemKind;
use crate::mutation::{Mutation, Table};
use crate::PlayerId;

/// Lowest accepted UTC offset
const MIN_UTC_OFFSET: i32 = -12;

/// Highest accepted UTC offset
const MAX_UTC_OFFSET: i32 = 14;

/// Update the trainer metadata stamped onto produced creatures
pub fn set_trainer_info(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;
    let args = input.args;

    let name = arg(args, 0).trim();
    if name.is_empty() || name.chars().count() > 12 {
        return Ok(Outcome::failure(
            "Trainer name must be between 1 and 12 characters.",
        ));
    }
    if services.word_filter.is_filtered(name) {
        return Ok(Outcome::failure(
            "Trainer name triggered the word filter. Please choose a different name.",
        ));
    }
    let Ok(gender) = arg(args, 1).parse::<Gender>() else {
        return Ok(Outcome::failure("Could not parse gender; use Male or Female."));
    };
    let Ok(public_id) = arg(args, 2).trim().parse::<u16>() else {
        return Ok(Outcome::failure("TID must be a number between 0 and 65535."));
    };
    let Ok(secret_id) = arg(args, 3).trim().parse::<u16>() else {
        return Ok(Outcome::failure("SID must be a number between 0 and 65535."));
    };
    let language = arg(args, 4).trim();
    if language.is_empty() {
        return Ok(Outcome::failure("Please provide a language."));
    }

    player.trainer.name = name.to_string();
    player.trainer.gender = gender;
    player.trainer.public_id = public_id;
    player.trainer.secret_id = secret_id;
    player.trainer.language = language.to_string();

    let mut out = Outcome::success(format!(
        "\nYour trainer info was set to the following:\n**OT:** {}\n**OTGender:** {}\n**TID:** {}\n**SID:** {}\n**Language:** {}",
        player.trainer.name,
        player.trainer.gender,
        player.trainer.public_id,
        player.trainer.secret_id,
        player.trainer.language
    ));
    out.batch.push(
        Mutation::update(Table::Players)
            .set("ot", player.trainer.name.clone())
            .set("ot_gender", player.trainer.gender.to_string())
            .set("tid", player.trainer.public_id)
            .set("sid", player.trainer.secret_id)
            .set("language", player.trainer.language.clone())
            .filter("user_id", player.id.raw()),
    );
    Ok(out)
}

/// Display the trainer metadata, charm stock and timezone
pub fn trainer_info(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = &*input.player;
    Ok(Outcome::success(format!(
        "\n**OT:** {}\n**OTGender:** {}\n**TID:** {}\n**SID:** {}\n**Language:** {}\n**Shiny Charm:** {}\n**UTC Time Offset:** {}",
        player.trainer.name,
        player.trainer.gender,
        player.trainer.public_id,
        player.trainer.secret_id,
        player.trainer.language,
        player.items.count(ItemKind::ShinyCharm),
        player.timezone_offset
    ))
    .titled(format!("{}'s Trainer Info", player.username)))
}

/// Set the UTC offset used for time-of-day buckets
pub fn set_timezone(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;

    let Ok(offset) = arg(input.args, 0).trim().parse::<i32>() else {
        return Ok(Outcome::failure(
            "Input must be a number (i.e. -2, 5...), or a zero.",
        ));
    };
    if !(MIN_UTC_OFFSET..=MAX_UTC_OFFSET).contains(&offset) {
        return Ok(Outcome::failure("Invalid UTC time offset."));
    }

    player.timezone_offset = offset;
    let local = services.clock.now_utc() + chrono::Duration::hours(offset as i64);

    let mut out = Outcome::success(format!(
        "UTC time offset set to **{offset}**. Your current time should be **{}**.",
        local.format("%Y-%m-%d %H:%M")
    ));
    out.batch.push(
        Mutation::update(Table::Players)
            .set("time_offset", offset)
            .filter("user_id", player.id.raw()),
    );
    Ok(out)
}

/// Erase every row a player owns
///
/// The dispatcher verifies the target exists before routing here and evicts
/// the cache entry after the batch lands.
pub fn delete_player(input: HandlerInput<'_>) -> Result<Outcome> {
    let Ok(raw) = arg(input.args, 0).trim().parse::<u64>() else {
        return Ok(Outcome::failure("Please enter a numerical player ID."));
    };
    let target = PlayerId::new(raw);

    let mut out = Outcome::success("Player data deleted.").titled("Player Deletion");
    for table in [
        Table::Catches,
        Table::CatchPayloads,
        Table::Daycare,
        Table::Buddy,
        Table::Items,
        Table::Dex,
        Table::Perks,
        Table::Players,
    ] {
        out.batch
            .push(Mutation::delete(table).filter("user_id", target.raw()));
    }
    out.deleted_player = Some(target);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_set_trainer_info() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let out = run(
            CommandKind::SetTrainerInfo,
            &mut player,
            &["Robin", "Female", "31337", "777", "English"],
        );
        assert!(out.success, "{}", out.message);
        assert_eq!(player.trainer.public_id, 31337);
        assert_eq!(player.trainer.gender, crate::creature::Gender::Female);

        let out = run(
            CommandKind::SetTrainerInfo,
            &mut player,
            &["Robin", "Female", "not-a-number", "777", "English"],
        );
        assert!(!out.success);
        assert!(out.message.contains("TID"));
    }

    #[test]
    fn test_trainer_info_reports_charm_count() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        player.items.add(crate::items::ItemKind::ShinyCharm, 4);
        let out = run(CommandKind::TrainerInfo, &mut player, &[]);
        assert!(out.success);
        assert!(out.message.contains("**Shiny Charm:** 4"));
    }

    #[test]
    fn test_timezone_bounds() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");

        let out = run(CommandKind::SetTimezone, &mut player, &["-5"]);
        assert!(out.success);
        assert_eq!(player.timezone_offset, -5);

        let out = run(CommandKind::SetTimezone, &mut player, &["15"]);
        assert!(!out.success);
        let out = run(CommandKind::SetTimezone, &mut player, &["-13"]);
        assert!(!out.success);
        let out = run(CommandKind::SetTimezone, &mut player, &["soon"]);
        assert!(!out.success);
        assert_eq!(player.timezone_offset, -5);
    }

    #[test]
    fn test_delete_player_stages_every_table() {
        let mut player = PlayerAggregate::new(PlayerId::new(1), "Robin");
        let out = run(CommandKind::DeletePlayer, &mut player, &["42"]);
        assert!(out.success);
        assert_eq!(out.deleted_player, Some(PlayerId::new(42)));
        assert_eq!(out.batch.len(), 8);
        // Players row goes last so dependent rows are gone first
        let last = out.batch.iter().last().unwrap();
        assert_eq!(last.table, Table::Players);
    }
}
