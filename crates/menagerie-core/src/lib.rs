//! Menagerie Core - the stateful engine behind the collection game
//!
//! This crate provides the types and engines for a persistent, per-player
//! collection/breeding/leveling game:
//! - Player aggregate model (catches, item bag, daycare, buddy, dex, perks)
//! - Deterministic RNG and the weighted generation rolls
//! - Breeding, evolution, leveling and hatching engines
//! - Progression ledger (dex registration, perk-point economy)
//! - Typed mutation batch and the storage-executor trait
//! - Command handlers routed by tag
//!
//! ## Architecture
//!
//! ```text
//! Hub (menagerie-hub, owns cache + lock)
//!  │
//!  ├── handlers::dispatch ← one handler per command tag
//!  │    └── generation / breeding / leveling / progression
//!  │
//!  └── StorageExecutor (trait) ← implemented by menagerie-db
//! ```
//!
//! Handlers mutate an aggregate clone and stage [`Mutation`]s; the hub
//! commits both only when the handler succeeds. This crate never talks to
//! storage directly.

mod breeding;
pub mod catalog;
mod command;
mod creature;
mod error;
mod generation;
pub mod handlers;
mod identity;
mod items;
mod leveling;
mod mutation;
mod player;
mod progression;
mod rng;
mod services;
mod settings;
mod species;

pub use breeding::{can_breed, synthesize_egg};
pub use command::{CommandContext, CommandKind, Outcome};
pub use creature::{
    Ability, BallKind, Creature, Gender, ShinyTier, TrainerProfile, FRIENDSHIP_CAP, LEVEL_CAP,
};
pub use error::{Error, Result};
pub use generation::{generate, GenerationOutcome, RollSet, SHINY_ROLL_CEILING};
pub use identity::{CatchId, PlayerId, SpeciesId};
pub use items::{ItemBag, ItemKind, CHARM_STOCK_CAP};
pub use leveling::{advance_buddy, BuddyProgress};
pub use mutation::{Mutation, MutationBatch, StatementKind, StorageExecutor, Table, Value};
pub use player::{
    Buddy, Catch, Daycare, DaycareSlot, DexState, PerkKind, PerkState, PlayerAggregate,
    MAX_DEX_COMPLETIONS, PERK_CAP,
};
pub use progression::{register_species, DexRegistration};
pub use rng::GameRng;
pub use services::{
    BasicValidator, CreatureValidator, EventProvider, EventSpawn, NoEvents, NoFilter, Services,
    SystemClock, WallClock, WordFilter,
};
pub use settings::GameSettings;
pub use species::{
    EvolutionOutcome, EvolutionResolver, EvolutionRule, ExperienceCurve, GrowthRate,
    SpeciesCatalog, SpeciesData, StandardCurve, TimeOfDay,
};
