//! Creature data and its payload codec
//!
//! A [`Creature`] is the decoded form of the opaque payload persisted in the
//! `catch_payloads` table. The engines manipulate decoded creatures; the
//! storage boundary only ever sees the encoded bytes, so the codec here is
//! the single place where the two representations meet.

use crate::error::{Error, Result};
use crate::items::ItemKind;
use crate::SpeciesId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum creature level
pub const LEVEL_CAP: u8 = 100;

/// Friendship ceiling
pub const FRIENDSHIP_CAP: u8 = 255;

/// The two shiny strengths; square is the rarer tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShinyTier {
    #[default]
    None,
    Star,
    Square,
}

impl ShinyTier {
    /// Whether this tier counts as shiny at all
    pub fn is_shiny(&self) -> bool {
        !matches!(self, ShinyTier::None)
    }
}

/// Trainer gender as recorded on creatures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unset,
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("Male"),
            Gender::Female => f.write_str("Female"),
            Gender::Unset => f.write_str("Unset"),
        }
    }
}

/// An ability slot on a creature
///
/// Abilities are opaque to most of the engine; the two predicates below are
/// the only ones generation cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ability(pub u16);

impl Ability {
    pub const NONE: Ability = Ability(0);
    /// Warms eggs; raises the egg roll while on the buddy
    pub const FLAME_AURA: Ability = Ability(1);
    /// Warms eggs; raises the egg roll while on the buddy
    pub const STEAM_VENT: Ability = Ability(2);
    /// Scrounges items; raises the item roll while on the buddy
    pub const FORAGER: Ability = Ability(3);
    /// Scrounges items; raises the item roll while on the buddy
    pub const FILCHER: Ability = Ability(4);
    pub const THICK_HIDE: Ability = Ability(5);
    pub const SWIFT_CURRENT: Ability = Ability(6);
    pub const LUMINOUS: Ability = Ability(7);
    pub const OVERGROWTH: Ability = Ability(8);
    pub const STATIC_CHARGE: Ability = Ability(9);
    pub const NIGHT_VEIL: Ability = Ability(10);
    pub const STONE_GUARD: Ability = Ability(11);
    pub const MIRROR_SKIN: Ability = Ability(12);

    /// Raw ability id
    pub fn raw(&self) -> u16 {
        self.0
    }

    /// Buddy bonus: flat boost to the egg roll
    pub fn boosts_egg_rate(&self) -> bool {
        matches!(*self, Ability::FLAME_AURA | Ability::STEAM_VENT)
    }

    /// Buddy bonus: flat boost to the item roll
    pub fn boosts_item_rate(&self) -> bool {
        matches!(*self, Ability::FORAGER | Ability::FILCHER)
    }
}

/// The ball a creature was caught in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallKind {
    #[default]
    Standard,
    Great,
    Ultra,
    Master,
    Premier,
    Luxury,
    Heavy,
    Lure,
    Moon,
    Love,
    Friend,
    Fast,
    Safari,
    Sport,
    Dream,
    Beast,
    /// Reserved for special-distribution creatures
    Cherish,
}

impl BallKind {
    /// Balls the generation engine may hand out for ordinary catches
    pub const FIELD: &'static [BallKind] = &[
        BallKind::Standard,
        BallKind::Great,
        BallKind::Ultra,
        BallKind::Premier,
        BallKind::Luxury,
        BallKind::Heavy,
        BallKind::Lure,
        BallKind::Moon,
        BallKind::Love,
        BallKind::Friend,
        BallKind::Fast,
        BallKind::Safari,
        BallKind::Sport,
        BallKind::Dream,
        BallKind::Beast,
    ];

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            BallKind::Standard => "Standard",
            BallKind::Great => "Great",
            BallKind::Ultra => "Ultra",
            BallKind::Master => "Master",
            BallKind::Premier => "Premier",
            BallKind::Luxury => "Luxury",
            BallKind::Heavy => "Heavy",
            BallKind::Lure => "Lure",
            BallKind::Moon => "Moon",
            BallKind::Love => "Love",
            BallKind::Friend => "Friend",
            BallKind::Fast => "Fast",
            BallKind::Safari => "Safari",
            BallKind::Sport => "Sport",
            BallKind::Dream => "Dream",
            BallKind::Beast => "Beast",
            BallKind::Cherish => "Cherish",
        }
    }

    /// Parse a ball name from user input, case-insensitively
    pub fn parse(input: &str) -> Option<BallKind> {
        let wanted = input.trim().to_lowercase();
        [
            BallKind::Standard,
            BallKind::Great,
            BallKind::Ultra,
            BallKind::Master,
            BallKind::Premier,
            BallKind::Luxury,
            BallKind::Heavy,
            BallKind::Lure,
            BallKind::Moon,
            BallKind::Love,
            BallKind::Friend,
            BallKind::Fast,
            BallKind::Safari,
            BallKind::Sport,
            BallKind::Dream,
            BallKind::Beast,
            BallKind::Cherish,
        ]
        .into_iter()
        .find(|b| b.as_str().to_lowercase() == wanted)
    }
}

impl fmt::Display for BallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trainer metadata stamped onto every creature a player produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainerProfile {
    pub name: String,
    pub gender: Gender,
    pub public_id: u16,
    pub secret_id: u16,
    pub language: String,
}

/// A single creature, decoded from its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub species: SpeciesId,
    pub form: u8,
    pub shiny: ShinyTier,
    pub ball: BallKind,
    pub level: u8,
    pub experience: u32,
    pub friendship: u8,
    pub held_item: Option<ItemKind>,
    pub is_egg: bool,
    pub nickname: Option<String>,
    pub ability: Ability,
    pub trainer: TrainerProfile,
    /// Marked on event-distribution creatures
    pub fateful_event: bool,
}

impl Creature {
    /// Encode into the opaque payload representation
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Payload(e.to_string()))
    }

    /// Decode from the opaque payload representation
    pub fn decode(payload: &[u8]) -> Result<Creature> {
        bincode::deserialize(payload).map_err(|e| Error::Payload(e.to_string()))
    }

    /// Whether the creature is any shiny tier
    pub fn is_shiny(&self) -> bool {
        self.shiny.is_shiny()
    }

    /// Whether the creature carries a nickname distinct from its species name
    pub fn is_nicknamed(&self) -> bool {
        self.nickname.is_some()
    }
}
