//! Stored-row models for the logical tables.
//!
//! Per-player rows (catches, payloads, items) use a composite string key so
//! two players can both own catch 0; single-row-per-player tables key on the
//! player id directly.

use menagerie_core::{
    Ability, BallKind, Buddy, Catch, CatchId, Daycare, DaycareSlot, ItemKind, PerkKind, SpeciesId,
};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Composite key for rows scoped to one player's catch id.
pub fn catch_key(user_id: u64, id: u32) -> String {
    format!("{user_id}:{id}")
}

/// Composite key for one player's holding of one item kind.
pub fn item_key(user_id: u64, item: &str) -> String {
    format!("{user_id}:{item}")
}

/// The `players` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredPlayer {
    #[primary_key]
    pub user_id: u64,
    pub username: String,
    pub ot: String,
    pub ot_gender: String,
    pub tid: u16,
    pub sid: u16,
    pub language: String,
    pub time_offset: i32,
    pub catch_count: u32,
}

/// The `catches` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredCatch {
    #[primary_key]
    pub key: String,
    #[secondary_key]
    pub user_id: u64,
    pub id: u32,
    pub species: u16,
    pub form: u8,
    pub is_shiny: bool,
    pub ball: String,
    pub nickname: String,
    pub is_egg: bool,
    pub was_traded: bool,
    pub is_favorite: bool,
    pub is_legendary: bool,
    pub is_event: bool,
}

impl StoredCatch {
    /// Rebuild the in-memory catch, attaching its payload.
    pub fn to_catch(&self, payload: Vec<u8>) -> Catch {
        Catch {
            id: CatchId::new(self.id),
            species: SpeciesId::new(self.species),
            form: self.form,
            shiny: self.is_shiny,
            ball: BallKind::parse(&self.ball).unwrap_or_default(),
            nickname: if self.nickname.is_empty() {
                None
            } else {
                Some(self.nickname.clone())
            },
            is_egg: self.is_egg,
            traded: self.was_traded,
            favorite: self.is_favorite,
            legendary: self.is_legendary,
            event: self.is_event,
            payload,
        }
    }
}

/// The `catch_payloads` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredPayload {
    #[primary_key]
    pub key: String,
    #[secondary_key]
    pub user_id: u64,
    pub id: u32,
    pub data: Vec<u8>,
}

/// The `daycare` table, one row per player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredDaycare {
    #[primary_key]
    pub user_id: u64,
    pub occupied1: bool,
    pub id1: u32,
    pub species1: u16,
    pub form1: u8,
    pub ball1: String,
    pub shiny1: bool,
    pub occupied2: bool,
    pub id2: u32,
    pub species2: u16,
    pub form2: u8,
    pub ball2: String,
    pub shiny2: bool,
}

impl StoredDaycare {
    /// Empty daycare row for a player.
    pub fn empty(user_id: u64) -> Self {
        Self {
            user_id,
            occupied1: false,
            id1: 0,
            species1: 0,
            form1: 0,
            ball1: String::new(),
            shiny1: false,
            occupied2: false,
            id2: 0,
            species2: 0,
            form2: 0,
            ball2: String::new(),
            shiny2: false,
        }
    }

    /// Rebuild the in-memory daycare.
    pub fn to_daycare(&self) -> Daycare {
        let slot = |occupied: bool, id: u32, species: u16, form: u8, ball: &str, shiny: bool| {
            occupied.then(|| DaycareSlot {
                id: CatchId::new(id),
                species: SpeciesId::new(species),
                form,
                ball: BallKind::parse(ball).unwrap_or_default(),
                shiny,
            })
        };
        Daycare {
            slot1: slot(
                self.occupied1,
                self.id1,
                self.species1,
                self.form1,
                &self.ball1,
                self.shiny1,
            ),
            slot2: slot(
                self.occupied2,
                self.id2,
                self.species2,
                self.form2,
                &self.ball2,
                self.shiny2,
            ),
        }
    }
}

/// The `buddy` table, one row per player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 5, version = 1)]
#[native_db]
pub struct StoredBuddy {
    #[primary_key]
    pub user_id: u64,
    pub occupied: bool,
    pub id: u32,
    pub name: String,
    pub ability: u16,
}

impl StoredBuddy {
    /// Empty buddy row for a player.
    pub fn empty(user_id: u64) -> Self {
        Self {
            user_id,
            occupied: false,
            id: 0,
            name: String::new(),
            ability: 0,
        }
    }

    /// Rebuild the in-memory buddy reference.
    pub fn to_buddy(&self) -> Option<Buddy> {
        self.occupied.then(|| Buddy {
            id: CatchId::new(self.id),
            nickname: self.name.clone(),
            ability: Ability(self.ability),
        })
    }
}

/// The `items` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 6, version = 1)]
#[native_db]
pub struct StoredItem {
    #[primary_key]
    pub key: String,
    #[secondary_key]
    pub user_id: u64,
    pub item: String,
    pub count: u32,
}

impl StoredItem {
    /// The item kind this row stores, if the name still parses.
    pub fn kind(&self) -> Option<ItemKind> {
        ItemKind::parse(&self.item)
    }
}

/// The `dex` table, one row per player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 7, version = 1)]
#[native_db]
pub struct StoredDex {
    #[primary_key]
    pub user_id: u64,
    /// Comma-separated species ids.
    pub entries: String,
    pub dex_count: u32,
}

impl StoredDex {
    /// Empty dex row for a player.
    pub fn empty(user_id: u64) -> Self {
        Self {
            user_id,
            entries: String::new(),
            dex_count: 0,
        }
    }

    /// Parse the entries column back into species ids.
    pub fn parsed_entries(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.entries
            .split(',')
            .filter_map(|part| part.trim().parse::<u16>().ok())
            .map(SpeciesId::new)
    }
}

/// The `perks` table, one row per player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 8, version = 1)]
#[native_db]
pub struct StoredPerks {
    #[primary_key]
    pub user_id: u64,
    /// Comma-separated perk kind names.
    pub perks: String,
    /// Zero when no boost target is set.
    pub species_boost: u16,
}

impl StoredPerks {
    /// Empty perks row for a player.
    pub fn empty(user_id: u64) -> Self {
        Self {
            user_id,
            perks: String::new(),
            species_boost: 0,
        }
    }

    /// Parse the perks column back into kinds.
    pub fn parsed_perks(&self) -> impl Iterator<Item = PerkKind> + '_ {
        self.perks
            .split(',')
            .filter_map(|part| PerkKind::parse(part.trim()))
    }
}
