//! Player aggregate and its owned state
//!
//! One [`PlayerAggregate`] is the unit the cache stores and the dispatcher
//! hands to handlers. Everything a player owns hangs off it; removal from
//! `catches` is the single authority for whether a catch exists.

use crate::creature::{Ability, BallKind, TrainerProfile};
use crate::items::ItemBag;
use crate::{CatchId, PlayerId, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Active perk instances are capped per kind
pub const PERK_CAP: usize = 5;

/// The dex completion counter never exceeds this level
pub const MAX_DEX_COMPLETIONS: u32 = 20;

/// A player-purchasable modifier that biases generation rolls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerkKind {
    CatchBoost,
    ItemBoost,
    SpeciesBoost,
    TitanBoost,
    CherishBoost,
    /// Reserved, not player-assignable
    ShinyBoost,
    /// Reserved, not player-assignable
    EggRateBoost,
}

impl PerkKind {
    /// Kinds a player may spend points on
    pub const ASSIGNABLE: &'static [PerkKind] = &[
        PerkKind::CatchBoost,
        PerkKind::ItemBoost,
        PerkKind::SpeciesBoost,
        PerkKind::TitanBoost,
        PerkKind::CherishBoost,
    ];

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            PerkKind::CatchBoost => "CatchBoost",
            PerkKind::ItemBoost => "ItemBoost",
            PerkKind::SpeciesBoost => "SpeciesBoost",
            PerkKind::TitanBoost => "TitanBoost",
            PerkKind::CherishBoost => "CherishBoost",
            PerkKind::ShinyBoost => "ShinyBoost",
            PerkKind::EggRateBoost => "EggRateBoost",
        }
    }

    /// Parse from user input, case-insensitively
    pub fn parse(input: &str) -> Option<PerkKind> {
        let wanted = input.trim().to_lowercase();
        [
            PerkKind::CatchBoost,
            PerkKind::ItemBoost,
            PerkKind::SpeciesBoost,
            PerkKind::TitanBoost,
            PerkKind::CherishBoost,
            PerkKind::ShinyBoost,
            PerkKind::EggRateBoost,
        ]
        .into_iter()
        .find(|p| p.as_str().to_lowercase() == wanted)
    }
}

/// One collected creature as the player's collection sees it
///
/// Cached display fields (species, form, shiny, ball) duplicate what the
/// payload holds so listings never decode payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catch {
    pub id: CatchId,
    pub species: SpeciesId,
    pub form: u8,
    pub shiny: bool,
    pub ball: BallKind,
    pub nickname: Option<String>,
    pub is_egg: bool,
    pub traded: bool,
    pub favorite: bool,
    pub legendary: bool,
    pub event: bool,
    /// Encoded creature data; decoded only by the engines that need it
    pub payload: Vec<u8>,
}

/// Cached display fields for one daycare occupant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaycareSlot {
    pub id: CatchId,
    pub species: SpeciesId,
    pub form: u8,
    pub ball: BallKind,
    pub shiny: bool,
}

/// The two-slot daycare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Daycare {
    pub slot1: Option<DaycareSlot>,
    pub slot2: Option<DaycareSlot>,
}

impl Daycare {
    /// Whether a catch id currently occupies either slot
    pub fn holds(&self, id: CatchId) -> bool {
        self.slot1.map(|s| s.id) == Some(id) || self.slot2.map(|s| s.id) == Some(id)
    }

    /// Whether both slots are taken
    pub fn is_full(&self) -> bool {
        self.slot1.is_some() && self.slot2.is_some()
    }

    /// Whether both slots are empty
    pub fn is_empty(&self) -> bool {
        self.slot1.is_none() && self.slot2.is_none()
    }

    /// Deposit into the first free slot; returns false when full or already present
    pub fn deposit(&mut self, slot: DaycareSlot) -> bool {
        if self.holds(slot.id) {
            return false;
        }
        if self.slot1.is_none() {
            self.slot1 = Some(slot);
            true
        } else if self.slot2.is_none() {
            self.slot2 = Some(slot);
            true
        } else {
            false
        }
    }

    /// Withdraw a specific occupant; returns the removed slot
    pub fn withdraw(&mut self, id: CatchId) -> Option<DaycareSlot> {
        if self.slot1.map(|s| s.id) == Some(id) {
            self.slot1.take()
        } else if self.slot2.map(|s| s.id) == Some(id) {
            self.slot2.take()
        } else {
            None
        }
    }
}

/// The catch actively accompanying the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buddy {
    pub id: CatchId,
    /// Cached from the payload so messages never decode it
    pub nickname: String,
    pub ability: Ability,
}

/// The species registry and its completion counter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DexState {
    pub entries: BTreeSet<SpeciesId>,
    pub completion_count: u32,
}

/// Active perks and the optional species-boost target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerkState {
    pub active: Vec<PerkKind>,
    pub species_boost: Option<SpeciesId>,
}

impl PerkState {
    /// Number of active instances of a kind
    pub fn count(&self, kind: PerkKind) -> usize {
        self.active.iter().filter(|p| **p == kind).count()
    }
}

/// Everything one player owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAggregate {
    pub id: PlayerId,
    pub username: String,
    pub trainer: TrainerProfile,
    /// UTC offset in hours, [-12, 14]
    pub timezone_offset: i32,
    pub catch_count: u32,
    pub catches: BTreeMap<CatchId, Catch>,
    pub items: ItemBag,
    pub daycare: Daycare,
    pub buddy: Option<Buddy>,
    pub dex: DexState,
    pub perks: PerkState,
}

impl PlayerAggregate {
    /// Default-initialized aggregate for a first-time player
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id,
            trainer: TrainerProfile {
                name: username.clone(),
                ..TrainerProfile::default()
            },
            username,
            timezone_offset: 0,
            catch_count: 0,
            catches: BTreeMap::new(),
            items: ItemBag::new(),
            daycare: Daycare::default(),
            buddy: None,
            dex: DexState::default(),
            perks: PerkState::default(),
        }
    }

    /// Smallest non-negative catch id not currently in use
    ///
    /// Ids are reused: releasing catch 1 out of {0, 1, 2} makes the next
    /// allocation return 1 again.
    pub fn next_catch_id(&self) -> CatchId {
        let mut candidate = 0u32;
        for id in self.catches.keys() {
            if id.raw() == candidate {
                candidate += 1;
            } else {
                break;
            }
        }
        CatchId::new(candidate)
    }

    /// Whether a catch id is the active buddy
    pub fn is_buddy(&self, id: CatchId) -> bool {
        self.buddy.as_ref().map(|b| b.id) == Some(id)
    }

    /// A catch that exists and has not been handed to a pending trade
    pub fn available_catch(&self, id: CatchId) -> Option<&Catch> {
        self.catches.get(&id).filter(|c| !c.traded)
    }
}
