//! Command tags, command context and the handler outcome
//!
//! The command set is closed: the front end maps user text onto a
//! [`CommandKind`] and the dispatcher routes it to exactly one handler. An
//! unmapped tag is a programming error in the front end, not a user error.

use crate::creature::Creature;
use crate::items::ItemKind;
use crate::mutation::MutationBatch;
use crate::{CatchId, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of command tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Catch,
    Trade,
    List,
    Info,
    MassRelease,
    Release,
    DaycareInfo,
    Daycare,
    Gift,
    SetTrainerInfo,
    TrainerInfo,
    FavoritesInfo,
    Favorites,
    Dex,
    Perks,
    SpeciesBoost,
    Buddy,
    Nickname,
    Evolve,
    GiveItem,
    GiftItem,
    TakeItem,
    ItemList,
    ItemDrop,
    SetTimezone,
    DeletePlayer,
}

impl CommandKind {
    /// Tag name used in logs and generic failure messages
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Catch => "catch",
            CommandKind::Trade => "trade",
            CommandKind::List => "list",
            CommandKind::Info => "info",
            CommandKind::MassRelease => "mass-release",
            CommandKind::Release => "release",
            CommandKind::DaycareInfo => "daycare-info",
            CommandKind::Daycare => "daycare",
            CommandKind::Gift => "gift",
            CommandKind::SetTrainerInfo => "set-trainer-info",
            CommandKind::TrainerInfo => "get-trainer-info",
            CommandKind::FavoritesInfo => "favorites-info",
            CommandKind::Favorites => "favorites",
            CommandKind::Dex => "dex",
            CommandKind::Perks => "perks",
            CommandKind::SpeciesBoost => "species-boost",
            CommandKind::Buddy => "buddy",
            CommandKind::Nickname => "nickname",
            CommandKind::Evolve => "evolve",
            CommandKind::GiveItem => "give-item",
            CommandKind::GiftItem => "gift-item",
            CommandKind::TakeItem => "take-item",
            CommandKind::ItemList => "item-list",
            CommandKind::ItemDrop => "item-drop",
            CommandKind::SetTimezone => "set-timezone",
            CommandKind::DeletePlayer => "delete-player",
        }
    }

    /// Whether the command also touches a second player's aggregate
    pub fn needs_counterparty(&self) -> bool {
        matches!(self, CommandKind::Gift | CommandKind::GiftItem)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who issued the command, as resolved by the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    pub player_id: PlayerId,
    pub username: String,
    /// Receiving player for two-party commands
    pub giftee_id: Option<PlayerId>,
    pub giftee_name: Option<String>,
}

impl CommandContext {
    /// Context for a single-party command
    pub fn new(player_id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            player_id,
            username: username.into(),
            giftee_id: None,
            giftee_name: None,
        }
    }

    /// Attach the receiving player for gift commands
    pub fn with_giftee(mut self, id: PlayerId, name: impl Into<String>) -> Self {
        self.giftee_id = Some(id);
        self.giftee_name = Some(name.into());
        self
    }
}

/// What a handler produced
///
/// A failed outcome carries a specific user-facing message and an empty
/// batch - the dispatcher commits nothing. Newly generated creatures ride in
/// `caught`/`egg`/`split` without ids; the dispatcher allocates ids and fills
/// in the `*_id` fields at commit time.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub success: bool,
    /// Display label for the front end's embed/header
    pub title: String,
    pub message: String,
    /// The catch roll failed (an item may still have dropped)
    pub failed_catch: bool,
    pub caught: Option<Creature>,
    pub caught_id: Option<CatchId>,
    pub egg: Option<Creature>,
    pub egg_id: Option<CatchId>,
    /// Secondary creature from a split-form evolution
    pub split: Option<Creature>,
    pub split_id: Option<CatchId>,
    /// Consolation or held item involved in the command
    pub item: Option<ItemKind>,
    /// Catch now awaiting an external trade; the dispatcher records the marker
    pub pending_trade: Option<CatchId>,
    /// Player whose data this command erased; the dispatcher evicts the cache entry
    pub deleted_player: Option<PlayerId>,
    /// Mutations to apply on success, in staged order
    pub batch: MutationBatch,
}

impl Outcome {
    /// A successful outcome with a message
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    /// A failed outcome with a specific user-facing message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    /// Set the display label
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}
