//! Game settings
//!
//! Every generation rate in one place. Rates are percentages: a roll in
//! [0, 100) succeeds when it lands at or above `100 - rate`, so raising a
//! rate widens the success window. Shiny rates compare against 150 instead,
//! which keeps unmodified rolls out of reach - shinies need charm stock or
//! parent bonuses pushing the roll up.

use crate::catalog;
use crate::SpeciesId;
use serde::{Deserialize, Serialize};

/// Tunable rates and special-species wiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Catch-success rate
    pub catch_rate: f64,
    /// Egg-eligibility rate (still gated by daycare compatibility)
    pub egg_rate: f64,
    /// Consolation item-drop rate
    pub item_rate: f64,
    /// Rarity escalation to the cherish tier
    pub cherish_rate: f64,
    /// Extra sub-roll rate for the titan species
    pub titan_rate: f64,
    /// Star shiny rate, against 150
    pub star_shiny_rate: f64,
    /// Square shiny rate, against 150
    pub square_shiny_rate: f64,
    /// Whether the event provider is consulted at all
    pub events_enabled: bool,
    /// The one species whose roll takes the extra titan sub-roll
    pub titan_species: SpeciesId,
    /// Species whose form follows the chimera memory item
    pub chimera_species: SpeciesId,
    /// Species whose form follows the origin orb
    pub origin_species: SpeciesId,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            catch_rate: 80.0,
            egg_rate: 10.0,
            item_rate: 30.0,
            cherish_rate: 5.0,
            titan_rate: 10.0,
            star_shiny_rate: 45.0,
            square_shiny_rate: 10.0,
            events_enabled: false,
            titan_species: catalog::FERROTITAN,
            chimera_species: catalog::CHIMERANT,
            origin_species: catalog::UMBRYS,
        }
    }
}
