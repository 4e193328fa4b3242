//! External collaborator traits and the service bundle
//!
//! The engine treats the validity checker, word filter, event provider and
//! wall clock as black boxes, called synchronously. [`Services`] bundles
//! them together with the metadata traits so handlers take one parameter
//! instead of seven.

use crate::creature::Creature;
use crate::species::{EvolutionResolver, ExperienceCurve, SpeciesCatalog};
use crate::SpeciesId;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Confirms a creature's data is game-legal
pub trait CreatureValidator: Send + Sync {
    fn is_valid(&self, creature: &Creature) -> bool;
}

/// Screens player-provided text
pub trait WordFilter: Send + Sync {
    fn is_filtered(&self, text: &str) -> bool;
}

/// A special-distribution creature provided by an active event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpawn {
    pub species: SpeciesId,
    pub form: u8,
    /// Whether the event forces the cherish tier
    pub cherish: bool,
}

/// Supplies mystery event creatures while an event window is open
pub trait EventProvider: Send + Sync {
    fn active_event(&self, now: DateTime<Utc>) -> Option<EventSpawn>;
}

/// Wall-clock source, injected so tests can pin the hour
pub trait WallClock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Structural validity checks that need no metadata
///
/// Real deployments are expected to bring a stricter checker; this one
/// catches the failure modes the engine itself can produce.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicValidator;

impl CreatureValidator for BasicValidator {
    fn is_valid(&self, creature: &Creature) -> bool {
        let level_ok = (1..=crate::creature::LEVEL_CAP).contains(&creature.level);
        let nickname_ok = creature
            .nickname
            .as_ref()
            .map(|n| !n.is_empty() && n.chars().count() <= 12)
            .unwrap_or(true);
        let egg_ok = !creature.is_egg || creature.level == 1;
        level_ok && nickname_ok && egg_ok
    }
}

/// A filter that lets everything through
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl WordFilter for NoFilter {
    fn is_filtered(&self, _text: &str) -> bool {
        false
    }
}

/// An event provider with no events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl EventProvider for NoEvents {
    fn active_event(&self, _now: DateTime<Utc>) -> Option<EventSpawn> {
        None
    }
}

/// The real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Every collaborator a handler needs, bundled
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn SpeciesCatalog>,
    pub evolutions: Arc<dyn EvolutionResolver>,
    pub curve: Arc<dyn ExperienceCurve>,
    pub validator: Arc<dyn CreatureValidator>,
    pub word_filter: Arc<dyn WordFilter>,
    pub events: Arc<dyn EventProvider>,
    pub clock: Arc<dyn WallClock>,
}

impl Services {
    /// The built-in stack: static catalog, standard curves, structural
    /// validation, no filter, no events, system clock
    pub fn standard() -> Self {
        let catalog = Arc::new(crate::catalog::StaticCatalog::new());
        Self {
            evolutions: catalog.clone(),
            catalog,
            curve: Arc::new(crate::species::StandardCurve),
            validator: Arc::new(BasicValidator),
            word_filter: Arc::new(NoFilter),
            events: Arc::new(NoEvents),
            clock: Arc::new(SystemClock),
        }
    }
}
