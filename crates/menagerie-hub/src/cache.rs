//! Read-through/write-back player cache and pending-trade markers
//!
//! Both maps are plain data guarded by the hub's single lock; nothing here
//! synchronizes on its own. An aggregate, once loaded, lives in the cache
//! for the process lifetime - eviction only happens through player
//! deletion.

use menagerie_core::{CatchId, PlayerAggregate, PlayerId};
use std::collections::HashMap;

/// In-memory map of every player aggregate touched this process lifetime
#[derive(Debug, Default)]
pub struct PlayerCache {
    players: HashMap<PlayerId, PlayerAggregate>,
}

impl PlayerCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an aggregate is cached
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Borrow a cached aggregate
    pub fn get(&self, id: PlayerId) -> Option<&PlayerAggregate> {
        self.players.get(&id)
    }

    /// Mutably borrow a cached aggregate
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut PlayerAggregate> {
        self.players.get_mut(&id)
    }

    /// Write an aggregate back (insert or replace)
    pub fn insert(&mut self, player: PlayerAggregate) {
        self.players.insert(player.id, player);
    }

    /// Evict an aggregate
    pub fn remove(&mut self, id: PlayerId) -> Option<PlayerAggregate> {
        self.players.remove(&id)
    }

    /// Number of cached aggregates
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Outstanding trade markers, at most one per player
#[derive(Debug, Default)]
pub struct PendingTrades {
    markers: HashMap<PlayerId, CatchId>,
}

impl PendingTrades {
    /// Create an empty marker set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a marker, replacing any previous one for the player
    pub fn insert(&mut self, player: PlayerId, catch: CatchId) {
        self.markers.insert(player, catch);
    }

    /// The player's outstanding marker, if any
    pub fn get(&self, player: PlayerId) -> Option<CatchId> {
        self.markers.get(&player).copied()
    }

    /// Clear and return the player's marker
    pub fn take(&mut self, player: PlayerId) -> Option<CatchId> {
        self.markers.remove(&player)
    }

    /// Whether the player has a trade in flight
    pub fn contains(&self, player: PlayerId) -> bool {
        self.markers.contains_key(&player)
    }
}
