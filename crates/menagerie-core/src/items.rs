//! Item kinds and the per-player item bag
//!
//! The bag maintains one invariant: a stored count is always greater than
//! zero. Any operation that would leave a kind at zero removes the entry
//! instead, so "do I have this item" is always a plain presence check.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Charm count at which the consolation drop stops handing out more charms
/// and falls back to sweets.
pub const CHARM_STOCK_CAP: u32 = 20;

/// Every item kind the engine can hand out or hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Bootstrap luck item; half the held count is added to every shiny roll
    ShinyCharm,
    /// Fallback consolation drop once charms are stocked to the cap
    HoneySweet,
    /// Grants bonus friendship to the buddy on each catch event while held
    CalmBell,
    /// Blocks evolution while held
    StasisStone,
    FireStone,
    WaterStone,
    ThunderStone,
    LeafStone,
    MoonStone,
    SunStone,
    DuskStone,
    DawnStone,
    ShinyStone,
    IceStone,
    RazorFang,
    SeaAmulet,
    /// Shifts the origin species into its alternate form while held
    OriginOrb,
    /// Shifts the chimera species into its alternate form while held
    ChimeraMemory,
}

impl ItemKind {
    /// All item kinds, in drop-table order
    pub const ALL: &'static [ItemKind] = &[
        ItemKind::ShinyCharm,
        ItemKind::HoneySweet,
        ItemKind::CalmBell,
        ItemKind::StasisStone,
        ItemKind::FireStone,
        ItemKind::WaterStone,
        ItemKind::ThunderStone,
        ItemKind::LeafStone,
        ItemKind::MoonStone,
        ItemKind::SunStone,
        ItemKind::DuskStone,
        ItemKind::DawnStone,
        ItemKind::ShinyStone,
        ItemKind::IceStone,
        ItemKind::RazorFang,
        ItemKind::SeaAmulet,
        ItemKind::OriginOrb,
        ItemKind::ChimeraMemory,
    ];

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::ShinyCharm => "Shiny Charm",
            ItemKind::HoneySweet => "Honey Sweet",
            ItemKind::CalmBell => "Calm Bell",
            ItemKind::StasisStone => "Stasis Stone",
            ItemKind::FireStone => "Fire Stone",
            ItemKind::WaterStone => "Water Stone",
            ItemKind::ThunderStone => "Thunder Stone",
            ItemKind::LeafStone => "Leaf Stone",
            ItemKind::MoonStone => "Moon Stone",
            ItemKind::SunStone => "Sun Stone",
            ItemKind::DuskStone => "Dusk Stone",
            ItemKind::DawnStone => "Dawn Stone",
            ItemKind::ShinyStone => "Shiny Stone",
            ItemKind::IceStone => "Ice Stone",
            ItemKind::RazorFang => "Razor Fang",
            ItemKind::SeaAmulet => "Sea Amulet",
            ItemKind::OriginOrb => "Origin Orb",
            ItemKind::ChimeraMemory => "Chimera Memory",
        }
    }

    /// Parse from user input, ignoring case, spaces and hyphens
    pub fn parse(input: &str) -> Option<ItemKind> {
        let wanted: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_lowercase();
        ItemKind::ALL.iter().copied().find(|kind| {
            let name: String = kind
                .as_str()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            name == wanted
        })
    }

    /// Indefinite article for message composition ("an Origin Orb", "a Fire Stone")
    pub fn article(&self) -> &'static str {
        match self.as_str().chars().next() {
            Some('A' | 'E' | 'I' | 'O' | 'U') => "an",
            _ => "a",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player's item holdings, kind to count
///
/// Insertion order is preserved so item listings read in acquisition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemBag {
    counts: IndexMap<ItemKind, u32>,
}

impl ItemBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a kind (zero when absent)
    pub fn count(&self, kind: ItemKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Whether the bag holds at least one of the kind
    pub fn has(&self, kind: ItemKind) -> bool {
        self.count(kind) > 0
    }

    /// Add `n` of a kind, returning the new count
    pub fn add(&mut self, kind: ItemKind, n: u32) -> u32 {
        let entry = self.counts.entry(kind).or_insert(0);
        *entry += n;
        *entry
    }

    /// Remove `n` of a kind
    ///
    /// Returns the remaining count, or `None` without touching the bag when
    /// fewer than `n` are held. A count that reaches zero removes the entry.
    pub fn remove(&mut self, kind: ItemKind, n: u32) -> Option<u32> {
        let current = self.count(kind);
        if current < n {
            return None;
        }
        let remaining = current - n;
        if remaining == 0 {
            self.counts.shift_remove(&kind);
        } else {
            self.counts.insert(kind, remaining);
        }
        Some(remaining)
    }

    /// Remove every held instance of a kind, returning the count removed
    pub fn take(&mut self, kind: ItemKind) -> Option<u32> {
        self.counts.shift_remove(&kind)
    }

    /// Empty the bag, returning what it held
    pub fn take_all(&mut self) -> Vec<(ItemKind, u32)> {
        self.counts.drain(..).collect()
    }

    /// Iterate over held kinds and counts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u32)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }

    /// Whether the bag is empty
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct kinds held
    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ItemKind::parse("shiny charm"), Some(ItemKind::ShinyCharm));
        assert_eq!(ItemKind::parse("ShinyCharm"), Some(ItemKind::ShinyCharm));
        assert_eq!(ItemKind::parse("fire-stone"), Some(ItemKind::FireStone));
        assert_eq!(ItemKind::parse("nonsense"), None);
    }

    #[test]
    fn test_article() {
        assert_eq!(ItemKind::OriginOrb.article(), "an");
        assert_eq!(ItemKind::FireStone.article(), "a");
    }

    #[test]
    fn test_count_invariant() {
        let mut bag = ItemBag::new();
        bag.add(ItemKind::FireStone, 2);
        assert_eq!(bag.count(ItemKind::FireStone), 2);

        assert_eq!(bag.remove(ItemKind::FireStone, 1), Some(1));
        assert!(bag.has(ItemKind::FireStone));

        // Hitting zero removes the entry entirely
        assert_eq!(bag.remove(ItemKind::FireStone, 1), Some(0));
        assert!(!bag.has(ItemKind::FireStone));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_remove_insufficient() {
        let mut bag = ItemBag::new();
        bag.add(ItemKind::CalmBell, 1);
        assert_eq!(bag.remove(ItemKind::CalmBell, 2), None);
        // Bag untouched
        assert_eq!(bag.count(ItemKind::CalmBell), 1);
    }

    #[test]
    fn test_take_all() {
        let mut bag = ItemBag::new();
        bag.add(ItemKind::ShinyCharm, 3);
        bag.add(ItemKind::MoonStone, 1);
        let taken = bag.take_all();
        assert_eq!(taken, vec![(ItemKind::ShinyCharm, 3), (ItemKind::MoonStone, 1)]);
        assert!(bag.is_empty());
    }
}
