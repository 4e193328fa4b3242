//! Daycare commands: info, deposit, withdraw

use super::{arg, catch_label, daycare_mutation, parse_catch_id, star, HandlerInput};
use crate::breeding;
use crate::command::Outcome;
use crate::error::Result;
use crate::player::DaycareSlot;
use crate::services::Services;

fn slot_line(services: &Services, slot: &DaycareSlot) -> String {
    format!(
        "(ID: {}) {}{} ({} Ball)",
        slot.id,
        star(slot.shiny),
        services.catalog.display(slot.species, slot.form),
        slot.ball
    )
}

/// Describe the daycare's occupants and their compatibility
pub fn daycare_info(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = &*input.player;
    let services = input.services;

    let message = match (player.daycare.slot1, player.daycare.slot2) {
        (None, None) => return Ok(Outcome::success("You do not have anything in daycare.")),
        (Some(a), Some(b)) => {
            let verdict = if breeding::can_breed(player, services) {
                "\n\nThey seem to really like each other."
            } else {
                "\n\nThey don't really seem to be fond of each other. Make sure they're of the same evolution tree and have been hatched!"
            };
            format!(
                "{}\n{}{verdict}",
                slot_line(services, &a),
                slot_line(services, &b)
            )
        }
        (Some(a), None) | (None, Some(a)) => {
            format!("{}\n\nIt seems lonely.", slot_line(services, &a))
        }
    };

    Ok(Outcome::success(message).titled(format!("{}'s Daycare", player.username)))
}

/// Deposit into or withdraw from the daycare
pub fn daycare(input: HandlerInput<'_>) -> Result<Outcome> {
    let player = input.player;
    let services = input.services;

    let action = arg(input.args, 0).trim().to_lowercase();
    let target = arg(input.args, 1).trim().to_lowercase();
    let deposit = action == "d" || action == "deposit";
    let withdraw = action == "w" || action == "withdraw";

    if !deposit && !withdraw {
        return Ok(Outcome::failure("Invalid daycare action."));
    }
    let parsed = parse_catch_id(&target);
    if target != "all" && parsed.is_none() {
        return Ok(Outcome::failure("Please enter a numerical catch ID."));
    }

    let title = format!("{}'s Daycare", player.username);

    if withdraw {
        if player.daycare.is_empty() {
            return Ok(Outcome::failure("You do not have anything in daycare."));
        }

        let removed: Vec<DaycareSlot> = match parsed {
            None => {
                let mut all = Vec::new();
                if let Some(s) = player.daycare.slot1.take() {
                    all.push(s);
                }
                if let Some(s) = player.daycare.slot2.take() {
                    all.push(s);
                }
                all
            }
            Some(id) => match player.daycare.withdraw(id) {
                Some(slot) => vec![slot],
                None => {
                    return Ok(Outcome::failure(
                        "You do not have that creature in daycare.",
                    ))
                }
            },
        };

        let described: Vec<String> = removed.iter().map(|s| slot_line(services, s)).collect();
        let mut out = Outcome::success(format!(
            "You withdrew your {} from the daycare.",
            described.join(" and ")
        ))
        .titled(format!("{title} Withdraw"));
        out.batch.push(daycare_mutation(player));
        return Ok(out);
    }

    // Deposit
    let Some(id) = parsed else {
        return Ok(Outcome::failure("Please enter a numerical catch ID."));
    };
    let Some(catch) = player.available_catch(id) else {
        return Ok(Outcome::failure("There is no creature with this ID."));
    };
    if player.daycare.is_full() {
        return Ok(Outcome::failure(
            "Daycare full, please withdraw something first.",
        ));
    }

    let label = catch_label(services, catch);
    let ball = catch.ball;
    let slot = DaycareSlot {
        id,
        species: catch.species,
        form: catch.form,
        ball,
        shiny: catch.shiny,
    };
    if !player.daycare.deposit(slot) {
        return Ok(Outcome::failure(
            "You've already deposited that creature to daycare.",
        ));
    }

    let mut out = Outcome::success(format!("Deposited your {label} ({ball} Ball) to daycare!"))
        .titled(format!("{title} Deposit"));
    out.batch.push(daycare_mutation(player));
    Ok(out)
}
