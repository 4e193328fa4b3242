//! Hub - the command dispatcher and concurrency guard
//!
//! The hub owns the player cache, the pending-trade markers and the single
//! process-wide lock. It is the only writer to storage and to the cache:
//! handlers receive aggregate clones and stage mutations, and the hub
//! commits both sides together only when a handler reports success.
//!
//! ## Commit protocol
//!
//! 1. Park while the maintenance flag is set (fixed-interval poll)
//! 2. Take the global lock
//! 3. Resolve aggregates read-through; sweep stale trade flags
//! 4. Dispatch to the handler for the command tag
//! 5. On unexpected failure: log with context, return a generic failure
//! 6. On success: allocate ids for new catches, apply the mutation batch,
//!    write the clones back into the cache
//!
//! A command either fully commits or fully no-ops; no partial state is ever
//! observable from the cache or the store.

use crate::cache::{PendingTrades, PlayerCache};
use crate::config::HubConfig;
use crate::error::{Error, Result};
use crate::instance::InstanceGuard;
use menagerie_core::handlers::{self, HandlerInput};
use menagerie_core::{
    CommandContext, CommandKind, GameRng, GameSettings, Mutation, MutationBatch, Outcome,
    PlayerAggregate, PlayerId, Services, StorageExecutor, Table,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

struct HubState {
    cache: PlayerCache,
    trades: PendingTrades,
    rng: GameRng,
}

/// The command dispatcher
pub struct Hub {
    state: Mutex<HubState>,
    storage: Box<dyn StorageExecutor + Send + Sync>,
    services: Services,
    settings: GameSettings,
    config: HubConfig,
    maintenance: AtomicBool,
}

impl Hub {
    /// Construct the dispatcher, acquiring the single-instance guard
    ///
    /// Fails with [`Error::AlreadyRunning`] when another instance holds the
    /// guard; callers are expected to terminate the process rather than risk
    /// a second writer.
    pub fn new(
        storage: Box<dyn StorageExecutor + Send + Sync>,
        services: Services,
        settings: GameSettings,
        config: HubConfig,
        guard: &dyn InstanceGuard,
    ) -> Result<Self> {
        if !guard.acquire() {
            return Err(Error::AlreadyRunning);
        }
        let rng = GameRng::new(config.rng_seed);
        Ok(Self {
            state: Mutex::new(HubState {
                cache: PlayerCache::new(),
                trades: PendingTrades::new(),
                rng,
            }),
            storage,
            services,
            settings,
            config,
            maintenance: AtomicBool::new(false),
        })
    }

    /// Raise or clear the cooperative maintenance barrier
    ///
    /// While set, new command admission parks; commands already inside the
    /// lock run to completion.
    pub fn set_maintenance(&self, paused: bool) {
        self.maintenance.store(paused, Ordering::Release);
    }

    /// Execute one command under the global lock
    ///
    /// Always returns an outcome: internal faults are logged with full
    /// context and surfaced as a generic failure with zero mutation.
    pub fn execute(&self, ctx: &CommandContext, kind: CommandKind, args: &[String]) -> Outcome {
        while self.maintenance.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(self.config.maintenance_poll_ms));
        }

        // A poisoned lock means a prior command panicked before committing;
        // nothing was written on that path, so recovering the state is safe.
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        self.execute_locked(&mut state, ctx, kind, args)
    }

    fn execute_locked(
        &self,
        state: &mut HubState,
        ctx: &CommandContext,
        kind: CommandKind,
        args: &[String],
    ) -> Outcome {
        if kind == CommandKind::DeletePlayer {
            return self.delete_player_command(state, ctx, args);
        }

        let mut player = match self.resolve_player(state, ctx.player_id, &ctx.username) {
            Ok(player) => player,
            Err(e) => return self.internal_failure(kind, ctx, &e),
        };

        let mut giftee = if kind.needs_counterparty() {
            let (Some(id), Some(name)) = (ctx.giftee_id, ctx.giftee_name.as_deref()) else {
                return Outcome::failure("Cannot find the receiving player.");
            };
            match self.resolve_player(state, id, name) {
                Ok(giftee) => Some(giftee),
                Err(e) => return self.internal_failure(kind, ctx, &e),
            }
        } else {
            None
        };

        let result = handlers::dispatch(
            kind,
            HandlerInput {
                player: &mut player,
                giftee: giftee.as_mut(),
                args,
                settings: &self.settings,
                services: &self.services,
                rng: &mut state.rng,
            },
        );

        let mut outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => return self.internal_failure(kind, ctx, &e.into()),
        };
        if !outcome.success {
            return outcome;
        }

        if let Err(e) = self.register_new_catches(&mut player, &mut outcome) {
            return self.internal_failure(kind, ctx, &e);
        }

        // Read-only commands stage nothing; skip the storage round trip
        if !outcome.batch.is_empty() {
            if let Err(e) = self.storage.apply(&outcome.batch) {
                return self.internal_failure(kind, ctx, &e.into());
            }
        }

        // Both sides committed together: storage above, cache here
        state.cache.insert(player);
        if let Some(giftee) = giftee {
            state.cache.insert(giftee);
        }
        if let Some(catch_id) = outcome.pending_trade {
            state.trades.insert(ctx.player_id, catch_id);
        }

        tracing::debug!(
            command = %kind,
            player = %ctx.player_id,
            mutations = outcome.batch.len(),
            "command committed"
        );
        outcome
    }

    /// Allocate ids and stage inserts for creatures the handler produced
    ///
    /// Order matters for id allocation: split-evolution catch first, then
    /// the main catch, then the egg.
    fn register_new_catches(
        &self,
        player: &mut PlayerAggregate,
        outcome: &mut Outcome,
    ) -> Result<()> {
        if let Some(split) = outcome.split.clone() {
            let id = handlers::register_catch(player, &split, &self.services, &mut outcome.batch)?;
            outcome.split_id = Some(id);

            let name = self.services.catalog.display(split.species, split.form);
            let label = if split.is_shiny() {
                format!("**{name}**")
            } else {
                name
            };
            outcome.message.push_str(&format!(
                "\n\nA spare ball in your bag clicks quietly... You also caught {label} (ID: {id})!"
            ));
            let reg = menagerie_core::register_species(
                player,
                split.species,
                self.services.catalog.dex_size(),
                &mut outcome.batch,
            );
            outcome.message.push_str(&handlers::dex_message(reg, None));
        }

        if outcome.caught_id.is_none() {
            if let Some(caught) = outcome.caught.clone() {
                let id =
                    handlers::register_catch(player, &caught, &self.services, &mut outcome.batch)?;
                outcome.caught_id = Some(id);
            }
        }

        if outcome.egg_id.is_none() {
            if let Some(egg) = outcome.egg.clone() {
                let id =
                    handlers::register_catch(player, &egg, &self.services, &mut outcome.batch)?;
                outcome.egg_id = Some(id);
            }
        }
        Ok(())
    }

    /// Read-through aggregate resolution
    ///
    /// Cache hit returns a clone of the cached entry; a miss loads from
    /// storage or default-initializes and persists a first-time player.
    /// Stale trade flags are swept before the clone is taken.
    fn resolve_player(
        &self,
        state: &mut HubState,
        id: PlayerId,
        username: &str,
    ) -> Result<PlayerAggregate> {
        if !state.cache.contains(id) {
            match self.storage.load_player(id)? {
                Some(mut loaded) => {
                    // The front end's display name wins over the stored one
                    loaded.username = username.to_string();
                    state.cache.insert(loaded);
                }
                None => {
                    let fresh = PlayerAggregate::new(id, username);
                    self.storage.apply(&creation_batch(&fresh))?;
                    state.cache.insert(fresh);
                }
            }
        }

        self.sweep_trade_flags(state, id)?;

        state
            .cache
            .get(id)
            .cloned()
            .ok_or_else(|| menagerie_core::Error::Storage("cache entry vanished".into()).into())
    }

    /// Repair policy for trade flags
    ///
    /// With a marker outstanding the trade is in flight and the flag is left
    /// alone. Without one - the trade was never finalized, or the process
    /// restarted mid-trade - every flagged catch is restored. The same sweep
    /// covers both the warm-cache and the fresh-load path.
    fn sweep_trade_flags(&self, state: &mut HubState, id: PlayerId) -> Result<()> {
        if state.trades.contains(id) {
            return Ok(());
        }
        let Some(player) = state.cache.get_mut(id) else {
            return Ok(());
        };

        let mut batch = MutationBatch::new();
        for catch in player.catches.values_mut() {
            if catch.traded {
                catch.traded = false;
                batch.push(
                    Mutation::update(Table::Catches)
                        .set("was_traded", false)
                        .filter("user_id", id.raw())
                        .filter("id", catch.id.raw()),
                );
            }
        }
        if !batch.is_empty() {
            self.storage.apply(&batch)?;
        }
        Ok(())
    }

    fn delete_player_command(
        &self,
        state: &mut HubState,
        ctx: &CommandContext,
        args: &[String],
    ) -> Outcome {
        // Deletion never resolves the acting player; a scratch aggregate
        // satisfies the handler signature without touching the cache.
        let mut scratch = PlayerAggregate::new(ctx.player_id, &ctx.username);
        let result = handlers::dispatch(
            CommandKind::DeletePlayer,
            HandlerInput {
                player: &mut scratch,
                giftee: None,
                args,
                settings: &self.settings,
                services: &self.services,
                rng: &mut state.rng,
            },
        );

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => return self.internal_failure(CommandKind::DeletePlayer, ctx, &e.into()),
        };
        if !outcome.success {
            return outcome;
        }
        let Some(target) = outcome.deleted_player else {
            return outcome;
        };

        let exists = state.cache.contains(target)
            || match self.storage.load_player(target) {
                Ok(found) => found.is_some(),
                Err(e) => {
                    return self.internal_failure(CommandKind::DeletePlayer, ctx, &e.into());
                }
            };
        if !exists {
            return Outcome::failure("Cannot find that player.").titled("Player Deletion");
        }

        if let Err(e) = self.storage.apply(&outcome.batch) {
            return self.internal_failure(CommandKind::DeletePlayer, ctx, &e.into());
        }
        state.cache.remove(target);
        state.trades.take(target);
        outcome
    }

    /// Complete an in-flight trade: the catch left the player for good
    ///
    /// Returns false when no trade was pending or the removal could not be
    /// persisted.
    pub fn finalize_trade(&self, player_id: PlayerId) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(catch_id) = state.trades.take(player_id) else {
            return false;
        };

        let mut batch = MutationBatch::new();
        batch.push(
            Mutation::delete(Table::Catches)
                .filter("user_id", player_id.raw())
                .filter("id", catch_id.raw()),
        );
        batch.push(
            Mutation::delete(Table::CatchPayloads)
                .filter("user_id", player_id.raw())
                .filter("id", catch_id.raw()),
        );
        if let Err(e) = self.storage.apply(&batch) {
            tracing::error!(player = %player_id, error = %e, "failed to finalize trade");
            state.trades.insert(player_id, catch_id);
            return false;
        }
        if let Some(player) = state.cache.get_mut(player_id) {
            player.catches.remove(&catch_id);
        }
        true
    }

    /// Cancel an in-flight trade: the catch returns to normal circulation
    pub fn cancel_trade(&self, player_id: PlayerId) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(catch_id) = state.trades.take(player_id) else {
            return false;
        };

        let mut batch = MutationBatch::new();
        batch.push(
            Mutation::update(Table::Catches)
                .set("was_traded", false)
                .filter("user_id", player_id.raw())
                .filter("id", catch_id.raw()),
        );
        if let Err(e) = self.storage.apply(&batch) {
            tracing::error!(player = %player_id, error = %e, "failed to cancel trade");
            state.trades.insert(player_id, catch_id);
            return false;
        }
        if let Some(player) = state.cache.get_mut(player_id) {
            if let Some(catch) = player.catches.get_mut(&catch_id) {
                catch.traded = false;
            }
        }
        true
    }

    /// The player's outstanding trade marker, if any
    pub fn pending_trade(&self, player_id: PlayerId) -> Option<menagerie_core::CatchId> {
        let state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.trades.get(player_id)
    }

    /// A snapshot of a cached aggregate, mostly useful to tests and tooling
    pub fn cached_player(&self, player_id: PlayerId) -> Option<PlayerAggregate> {
        let state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.cache.get(player_id).cloned()
    }

    fn internal_failure(&self, kind: CommandKind, ctx: &CommandContext, error: &Error) -> Outcome {
        tracing::error!(
            command = %kind,
            player = %ctx.player_id,
            username = %ctx.username,
            error = %error,
            "command failed unexpectedly"
        );
        Outcome::failure(format!(
            "Something went wrong while executing command {kind} for {}!",
            ctx.username
        ))
        .titled("Oops!")
    }
}

/// The insert batch that persists a first-time player's default rows
fn creation_batch(player: &PlayerAggregate) -> MutationBatch {
    let id = player.id.raw();
    let mut batch = MutationBatch::new();
    batch.push(
        Mutation::insert(Table::Players)
            .set("user_id", id)
            .set("username", player.username.clone())
            .set("ot", player.trainer.name.clone())
            .set("ot_gender", player.trainer.gender.to_string())
            .set("tid", player.trainer.public_id)
            .set("sid", player.trainer.secret_id)
            .set("language", player.trainer.language.clone())
            .set("time_offset", player.timezone_offset)
            .set("catch_count", player.catch_count),
    );
    batch.push(
        Mutation::insert(Table::Daycare)
            .set("user_id", id)
            .set("occupied1", false)
            .set("id1", 0u32)
            .set("species1", 0u16)
            .set("form1", 0u8)
            .set("ball1", "")
            .set("shiny1", false)
            .set("occupied2", false)
            .set("id2", 0u32)
            .set("species2", 0u16)
            .set("form2", 0u8)
            .set("ball2", "")
            .set("shiny2", false),
    );
    batch.push(
        Mutation::insert(Table::Buddy)
            .set("user_id", id)
            .set("occupied", false)
            .set("id", 0u32)
            .set("name", "")
            .set("ability", 0u16),
    );
    batch.push(
        Mutation::insert(Table::Dex)
            .set("user_id", id)
            .set("entries", "")
            .set("dex_count", 0u32),
    );
    batch.push(
        Mutation::insert(Table::Perks)
            .set("user_id", id)
            .set("perks", "")
            .set("species_boost", 0u16),
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Unguarded;
    use menagerie_core::{
        catalog, Ability, BallKind, CatchId, Creature, ItemKind, ShinyTier, SpeciesId,
        TrainerProfile,
    };
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[derive(Default)]
    struct MemoryExecutor {
        players: Mutex<HashMap<PlayerId, PlayerAggregate>>,
        batches: Mutex<Vec<MutationBatch>>,
        fail_next: AtomicBool,
    }

    impl MemoryExecutor {
        fn batch_count(&self) -> usize {
            self.batches.lock().unwrap().len()
        }

        fn seed(&self, player: PlayerAggregate) {
            self.players.lock().unwrap().insert(player.id, player);
        }
    }

    struct SharedExecutor(Arc<MemoryExecutor>);

    impl StorageExecutor for SharedExecutor {
        fn load_player(
            &self,
            id: PlayerId,
        ) -> menagerie_core::Result<Option<PlayerAggregate>> {
            Ok(self.0.players.lock().unwrap().get(&id).cloned())
        }

        fn apply(&self, batch: &MutationBatch) -> menagerie_core::Result<()> {
            if self.0.fail_next.swap(false, Ordering::SeqCst) {
                return Err(menagerie_core::Error::Storage("injected failure".into()));
            }
            self.0.batches.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    fn new_hub() -> (Hub, Arc<MemoryExecutor>) {
        let executor = Arc::new(MemoryExecutor::default());
        let hub = Hub::new(
            Box::new(SharedExecutor(executor.clone())),
            Services::standard(),
            GameSettings::default(),
            HubConfig::with_seed(42),
            &Unguarded,
        )
        .unwrap();
        (hub, executor)
    }

    fn ctx(id: u64, name: &str) -> CommandContext {
        CommandContext::new(PlayerId::new(id), name)
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn creature(species: SpeciesId) -> Creature {
        Creature {
            species,
            form: 0,
            shiny: ShinyTier::None,
            ball: BallKind::Standard,
            level: 10,
            experience: 1000,
            friendship: 70,
            held_item: None,
            is_egg: false,
            nickname: None,
            ability: Ability::NONE,
            trainer: TrainerProfile::default(),
            fateful_event: false,
        }
    }

    /// An aggregate already owning one catch, as storage would return it
    fn stored_player(id: u64, species: SpeciesId) -> PlayerAggregate {
        let services = Services::standard();
        let mut player = PlayerAggregate::new(PlayerId::new(id), "Seeded");
        let mut scratch = MutationBatch::new();
        handlers::register_catch(&mut player, &creature(species), &services, &mut scratch)
            .unwrap();
        player
    }

    struct Occupied;

    impl InstanceGuard for Occupied {
        fn acquire(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_second_instance_is_fatal() {
        let executor = Arc::new(MemoryExecutor::default());
        let result = Hub::new(
            Box::new(SharedExecutor(executor)),
            Services::standard(),
            GameSettings::default(),
            HubConfig::default(),
            &Occupied,
        );
        assert!(matches!(result, Err(Error::AlreadyRunning)));
    }

    #[test]
    fn test_first_command_creates_and_persists_player() {
        let (hub, executor) = new_hub();
        let outcome = hub.execute(&ctx(1, "Robin"), CommandKind::TrainerInfo, &[]);
        assert!(outcome.success);

        // The creation batch landed before the (read-only) command ran
        let batches = executor.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 5);
        drop(batches);
        assert!(hub.cached_player(PlayerId::new(1)).is_some());
    }

    #[test]
    fn test_catch_command_commits_cache_and_storage_together() {
        let (hub, executor) = new_hub();
        let outcome = hub.execute(&ctx(1, "Robin"), CommandKind::Catch, &[]);
        assert!(outcome.success, "{}", outcome.message);

        let cached = hub.cached_player(PlayerId::new(1)).unwrap();
        if let Some(id) = outcome.caught_id {
            assert!(cached.catches.contains_key(&id));
        }
        // Creation batch plus the command batch
        assert_eq!(executor.batch_count(), 2);
    }

    #[test]
    fn test_failed_handler_commits_nothing() {
        let (hub, executor) = new_hub();
        hub.execute(&ctx(1, "Robin"), CommandKind::TrainerInfo, &[]);
        let before_batches = executor.batch_count();
        let before_cache = hub.cached_player(PlayerId::new(1)).unwrap();

        let outcome = hub.execute(&ctx(1, "Robin"), CommandKind::Release, &args(&["7"]));
        assert!(!outcome.success);
        assert!(outcome.message.contains("Cannot find"));
        assert_eq!(executor.batch_count(), before_batches);
        assert_eq!(hub.cached_player(PlayerId::new(1)).unwrap(), before_cache);
    }

    #[test]
    fn test_storage_failure_surfaces_generic_failure_without_cache_write() {
        let (hub, executor) = new_hub();
        executor.seed(stored_player(1, catalog::EMBERLING));
        hub.execute(&ctx(1, "Robin"), CommandKind::TrainerInfo, &[]);
        let before = hub.cached_player(PlayerId::new(1)).unwrap();

        executor.fail_next.store(true, Ordering::SeqCst);
        let outcome = hub.execute(&ctx(1, "Robin"), CommandKind::Release, &args(&["0"]));
        assert!(!outcome.success);
        assert!(outcome.message.contains("Something went wrong"));
        // The cache still owns the catch the handler tried to release
        assert_eq!(hub.cached_player(PlayerId::new(1)).unwrap(), before);
    }

    #[test]
    fn test_trade_lifecycle_cancel_restores_flag() {
        let (hub, executor) = new_hub();
        let player_id = PlayerId::new(1);
        executor.seed(stored_player(1, catalog::EMBERLING));

        let outcome = hub.execute(&ctx(1, "Seeded"), CommandKind::Trade, &args(&["0"]));
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(hub.pending_trade(player_id), Some(CatchId::new(0)));

        // With the marker outstanding, other commands leave the flag alone
        hub.execute(&ctx(1, "Seeded"), CommandKind::TrainerInfo, &[]);
        let cached = hub.cached_player(player_id).unwrap();
        assert!(cached.catches.get(&CatchId::new(0)).unwrap().traded);

        assert!(hub.cancel_trade(player_id));
        assert_eq!(hub.pending_trade(player_id), None);
        let cached = hub.cached_player(player_id).unwrap();
        assert!(!cached.catches.get(&CatchId::new(0)).unwrap().traded);
    }

    #[test]
    fn test_trade_finalize_removes_catch() {
        let (hub, executor) = new_hub();
        executor.seed(stored_player(1, catalog::EMBERLING));
        let player_id = PlayerId::new(1);

        hub.execute(&ctx(1, "Seeded"), CommandKind::Trade, &args(&["0"]));
        assert!(hub.finalize_trade(player_id));
        assert!(!hub
            .cached_player(player_id)
            .unwrap()
            .catches
            .contains_key(&CatchId::new(0)));
        // Nothing left to finalize
        assert!(!hub.finalize_trade(player_id));
    }

    #[test]
    fn test_restart_mid_trade_restores_flag_on_next_command() {
        let (hub, executor) = new_hub();
        // Storage still carries the flag, but this process has no marker -
        // exactly the restart-mid-trade shape
        let mut seeded = stored_player(1, catalog::EMBERLING);
        seeded
            .catches
            .get_mut(&CatchId::new(0))
            .unwrap()
            .traded = true;
        executor.seed(seeded);

        hub.execute(&ctx(1, "Seeded"), CommandKind::TrainerInfo, &[]);
        let cached = hub.cached_player(PlayerId::new(1)).unwrap();
        assert!(!cached.catches.get(&CatchId::new(0)).unwrap().traded);

        // The repair was persisted, not just cached
        let repaired = executor
            .batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|b| b.iter().cloned().collect::<Vec<_>>())
            .any(|m| {
                m.table == Table::Catches
                    && m.column("was_traded") == Some(&menagerie_core::Value::Bool(false))
            });
        assert!(repaired);
    }

    #[test]
    fn test_gift_moves_between_cached_aggregates() {
        let (hub, executor) = new_hub();
        executor.seed(stored_player(1, catalog::GALEWING));

        let ctx = CommandContext::new(PlayerId::new(1), "Robin")
            .with_giftee(PlayerId::new(2), "Sam");
        let outcome = hub.execute(&ctx, CommandKind::Gift, &args(&["0"]));
        assert!(outcome.success, "{}", outcome.message);

        let giver = hub.cached_player(PlayerId::new(1)).unwrap();
        let giftee = hub.cached_player(PlayerId::new(2)).unwrap();
        assert!(giver.catches.is_empty());
        let received = giftee.catches.get(&CatchId::new(0)).unwrap();
        assert_eq!(received.species, catalog::GALEWING);
    }

    #[test]
    fn test_delete_player_evicts_cache() {
        let (hub, executor) = new_hub();
        executor.seed(stored_player(7, catalog::EMBERLING));
        hub.execute(&ctx(7, "Seeded"), CommandKind::TrainerInfo, &[]);
        assert!(hub.cached_player(PlayerId::new(7)).is_some());

        let outcome = hub.execute(&ctx(1, "Admin"), CommandKind::DeletePlayer, &args(&["7"]));
        assert!(outcome.success, "{}", outcome.message);
        assert!(hub.cached_player(PlayerId::new(7)).is_none());

        let outcome = hub.execute(&ctx(1, "Admin"), CommandKind::DeletePlayer, &args(&["99"]));
        assert!(!outcome.success);
        assert!(outcome.message.contains("Cannot find that player."));
    }

    #[test]
    fn test_split_evolution_registers_second_catch() {
        let (hub, executor) = new_hub();
        let mut seeded = PlayerAggregate::new(PlayerId::new(1), "Seeded");
        let services = Services::standard();
        let mut scratch = MutationBatch::new();
        let mut husklit = creature(catalog::HUSKLIT);
        husklit.level = 25;
        handlers::register_catch(&mut seeded, &husklit, &services, &mut scratch).unwrap();
        executor.seed(seeded);

        hub.execute(&ctx(1, "Seeded"), CommandKind::Buddy, &args(&["0"]));
        let outcome = hub.execute(&ctx(1, "Seeded"), CommandKind::Evolve, &[]);
        assert!(outcome.success, "{}", outcome.message);
        assert!(outcome.split_id.is_some());
        assert!(outcome.message.contains("You also caught"));

        let cached = hub.cached_player(PlayerId::new(1)).unwrap();
        assert_eq!(cached.catches.len(), 2);
        let split = cached.catches.get(&outcome.split_id.unwrap()).unwrap();
        assert_eq!(split.species, catalog::HOLLOWSHELL);
    }

    #[test]
    fn test_item_bag_invariant_through_commands() {
        let (hub, executor) = new_hub();
        let mut seeded = stored_player(1, catalog::EMBERLING);
        seeded.items.add(ItemKind::CalmBell, 1);
        executor.seed(seeded);

        hub.execute(&ctx(1, "Seeded"), CommandKind::Buddy, &args(&["0"]));
        let outcome = hub.execute(
            &ctx(1, "Seeded"),
            CommandKind::GiveItem,
            &args(&["calm bell"]),
        );
        assert!(outcome.success, "{}", outcome.message);

        // Count hit zero, so the entry is gone rather than stored as zero
        let cached = hub.cached_player(PlayerId::new(1)).unwrap();
        assert!(!cached.items.has(ItemKind::CalmBell));
        assert!(cached.items.is_empty());
    }
}
