//! Database store wrapper.
//!
//! [`Store`] implements the engine's `StorageExecutor`: a mutation batch is
//! applied inside one read-write transaction, so either every statement in a
//! command's batch lands or none does. Loads rebuild a full player aggregate
//! from the per-table rows.

use crate::error::{Error, Result};
use crate::models::*;
use menagerie_core::{
    Gender, ItemBag, Mutation, MutationBatch, PlayerAggregate, PlayerId, StatementKind,
    StorageExecutor, Table, TrainerProfile, Value,
};
use native_db::transaction::RwTransaction;
use native_db::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredPlayer>().unwrap();
    models.define::<StoredCatch>().unwrap();
    models.define::<StoredPayload>().unwrap();
    models.define::<StoredDaycare>().unwrap();
    models.define::<StoredBuddy>().unwrap();
    models.define::<StoredItem>().unwrap();
    models.define::<StoredDex>().unwrap();
    models.define::<StoredPerks>().unwrap();
    models
});

/// Database store for persistent game state.
pub struct Store {
    db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Apply a whole batch inside one transaction.
    pub fn apply_batch(&self, batch: &MutationBatch) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        for mutation in batch.iter() {
            apply_mutation(&rw, mutation)?;
        }
        rw.commit()?;
        Ok(())
    }

    /// Load and assemble a player aggregate.
    pub fn fetch_player(&self, id: PlayerId) -> Result<Option<PlayerAggregate>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredPlayer> = r.get().primary(id.raw())?;
        let Some(stored) = stored else {
            return Ok(None);
        };

        // Payloads first so catches can take theirs by id
        let mut payloads: HashMap<u32, Vec<u8>> = HashMap::new();
        {
            let scan = r.scan().primary::<StoredPayload>()?;
            let iter = scan.all()?;
            for row in iter {
                let row = row.map_err(|e| Error::Database(e.to_string()))?;
                if row.user_id == id.raw() {
                    payloads.insert(row.id, row.data);
                }
            }
        }

        let mut catches = BTreeMap::new();
        {
            let scan = r.scan().primary::<StoredCatch>()?;
            let iter = scan.all()?;
            for row in iter {
                let row = row.map_err(|e| Error::Database(e.to_string()))?;
                if row.user_id == id.raw() {
                    let payload = payloads.remove(&row.id).unwrap_or_default();
                    let catch = row.to_catch(payload);
                    catches.insert(catch.id, catch);
                }
            }
        }

        let mut items = ItemBag::new();
        {
            let scan = r.scan().primary::<StoredItem>()?;
            let iter = scan.all()?;
            for row in iter {
                let row = row.map_err(|e| Error::Database(e.to_string()))?;
                if row.user_id == id.raw() && row.count > 0 {
                    if let Some(kind) = row.kind() {
                        items.add(kind, row.count);
                    }
                }
            }
        }

        let daycare = r
            .get()
            .primary::<StoredDaycare>(id.raw())?
            .map(|row| row.to_daycare())
            .unwrap_or_default();
        let buddy = r
            .get()
            .primary::<StoredBuddy>(id.raw())?
            .and_then(|row| row.to_buddy());

        let mut player = PlayerAggregate::new(id, stored.username.clone());
        if let Some(dex) = r.get().primary::<StoredDex>(id.raw())? {
            player.dex.entries = dex.parsed_entries().collect::<BTreeSet<_>>();
            player.dex.completion_count = dex.dex_count;
        }
        if let Some(perks) = r.get().primary::<StoredPerks>(id.raw())? {
            player.perks.active = perks.parsed_perks().collect();
            player.perks.species_boost = if perks.species_boost == 0 {
                None
            } else {
                Some(menagerie_core::SpeciesId::new(perks.species_boost))
            };
        }

        player.trainer = TrainerProfile {
            name: stored.ot,
            gender: stored.ot_gender.parse::<Gender>().unwrap_or(Gender::Unset),
            public_id: stored.tid,
            secret_id: stored.sid,
            language: stored.language,
        };
        player.timezone_offset = stored.time_offset;
        player.catch_count = stored.catch_count;
        player.catches = catches;
        player.items = items;
        player.daycare = daycare;
        player.buddy = buddy;
        Ok(Some(player))
    }
}

impl StorageExecutor for Store {
    fn load_player(&self, id: PlayerId) -> menagerie_core::Result<Option<PlayerAggregate>> {
        self.fetch_player(id)
            .map_err(|e| menagerie_core::Error::Storage(e.to_string()))
    }

    fn apply(&self, batch: &MutationBatch) -> menagerie_core::Result<()> {
        self.apply_batch(batch)
            .map_err(|e| menagerie_core::Error::Storage(e.to_string()))
    }
}

// ============================================================================
// Value extraction
// ============================================================================

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::UInt(n) => Some(*n),
        Value::Int(n) if *n >= 0 => Some(*n as u64),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::UInt(n) => i64::try_from(*n).ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<&str> {
    match value {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

fn as_blob(value: &Value) -> Option<&[u8]> {
    match value {
        Value::Blob(b) => Some(b),
        _ => None,
    }
}

fn missing(table: Table, column: &str) -> Error {
    Error::Mutation(format!("{table} is missing column {column}"))
}

fn col_u64(m: &Mutation, name: &str) -> Result<u64> {
    m.column(name)
        .and_then(as_u64)
        .ok_or_else(|| missing(m.table, name))
}

fn col_u32(m: &Mutation, name: &str) -> Result<u32> {
    Ok(col_u64(m, name)? as u32)
}

fn col_u16(m: &Mutation, name: &str) -> Result<u16> {
    Ok(col_u64(m, name)? as u16)
}

fn col_u8(m: &Mutation, name: &str) -> Result<u8> {
    Ok(col_u64(m, name)? as u8)
}

fn col_i32(m: &Mutation, name: &str) -> Result<i32> {
    m.column(name)
        .and_then(as_i64)
        .map(|n| n as i32)
        .ok_or_else(|| missing(m.table, name))
}

fn col_bool(m: &Mutation, name: &str) -> Result<bool> {
    m.column(name)
        .and_then(as_bool)
        .ok_or_else(|| missing(m.table, name))
}

fn col_text(m: &Mutation, name: &str) -> Result<String> {
    m.column(name)
        .and_then(as_text)
        .map(str::to_string)
        .ok_or_else(|| missing(m.table, name))
}

fn col_blob(m: &Mutation, name: &str) -> Result<Vec<u8>> {
    m.column(name)
        .and_then(as_blob)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| missing(m.table, name))
}

fn filter_u64(m: &Mutation, name: &str) -> Result<u64> {
    m.filter_value(name)
        .and_then(as_u64)
        .ok_or_else(|| missing(m.table, name))
}

// ============================================================================
// Per-table application
// ============================================================================

fn apply_mutation(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    match m.table {
        Table::Players => apply_players(rw, m),
        Table::Catches => apply_catches(rw, m),
        Table::CatchPayloads => apply_payloads(rw, m),
        Table::Daycare => apply_daycare(rw, m),
        Table::Buddy => apply_buddy(rw, m),
        Table::Items => apply_items(rw, m),
        Table::Dex => apply_dex(rw, m),
        Table::Perks => apply_perks(rw, m),
    }
}

fn apply_players(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    match m.kind {
        StatementKind::Insert => {
            rw.upsert(StoredPlayer {
                user_id: col_u64(m, "user_id")?,
                username: col_text(m, "username")?,
                ot: col_text(m, "ot")?,
                ot_gender: col_text(m, "ot_gender")?,
                tid: col_u16(m, "tid")?,
                sid: col_u16(m, "sid")?,
                language: col_text(m, "language")?,
                time_offset: col_i32(m, "time_offset")?,
                catch_count: col_u32(m, "catch_count")?,
            })?;
        }
        StatementKind::Update => {
            let user_id = filter_u64(m, "user_id")?;
            let row: Option<StoredPlayer> = rw.get().primary(user_id)?;
            let Some(mut row) = row else {
                return Ok(());
            };
            for (name, value) in &m.columns {
                match name.as_str() {
                    "username" => row.username = required(as_text(value), m, name)?.to_string(),
                    "ot" => row.ot = required(as_text(value), m, name)?.to_string(),
                    "ot_gender" => row.ot_gender = required(as_text(value), m, name)?.to_string(),
                    "tid" => row.tid = required(as_u64(value), m, name)? as u16,
                    "sid" => row.sid = required(as_u64(value), m, name)? as u16,
                    "language" => row.language = required(as_text(value), m, name)?.to_string(),
                    "time_offset" => row.time_offset = required(as_i64(value), m, name)? as i32,
                    "catch_count" => row.catch_count = required(as_u64(value), m, name)? as u32,
                    other => return Err(Error::Mutation(format!("unknown players column {other}"))),
                }
            }
            rw.upsert(row)?;
        }
        StatementKind::Delete => {
            let user_id = filter_u64(m, "user_id")?;
            if let Some(row) = rw.get().primary::<StoredPlayer>(user_id)? {
                rw.remove(row)?;
            }
        }
    }
    Ok(())
}

fn required<T>(value: Option<T>, m: &Mutation, name: &str) -> Result<T> {
    value.ok_or_else(|| Error::Mutation(format!("{} column {name} has the wrong type", m.table)))
}

fn catch_filter_matches(row: &StoredCatch, m: &Mutation) -> Result<bool> {
    for (name, value) in &m.filter {
        let matched = match name.as_str() {
            "user_id" => required(as_u64(value), m, name)? == row.user_id,
            "id" => required(as_u64(value), m, name)? as u32 == row.id,
            "is_favorite" => required(as_bool(value), m, name)? == row.is_favorite,
            "was_traded" => required(as_bool(value), m, name)? == row.was_traded,
            other => {
                return Err(Error::Mutation(format!("unknown catches filter {other}")));
            }
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn all_catches(rw: &RwTransaction) -> Result<Vec<StoredCatch>> {
    let scan = rw.scan().primary::<StoredCatch>()?;
    let iter = scan.all()?;
    let rows: std::result::Result<Vec<StoredCatch>, _> = iter.collect();
    rows.map_err(|e| Error::Database(e.to_string()))
}

fn apply_catches(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    match m.kind {
        StatementKind::Insert => {
            let user_id = col_u64(m, "user_id")?;
            let id = col_u32(m, "id")?;
            rw.upsert(StoredCatch {
                key: catch_key(user_id, id),
                user_id,
                id,
                species: col_u16(m, "species")?,
                form: col_u8(m, "form")?,
                is_shiny: col_bool(m, "is_shiny")?,
                ball: col_text(m, "ball")?,
                nickname: col_text(m, "nickname")?,
                is_egg: col_bool(m, "is_egg")?,
                was_traded: col_bool(m, "was_traded")?,
                is_favorite: col_bool(m, "is_favorite")?,
                is_legendary: col_bool(m, "is_legendary")?,
                is_event: col_bool(m, "is_event")?,
            })?;
        }
        StatementKind::Update => {
            for row in all_catches(rw)? {
                if !catch_filter_matches(&row, m)? {
                    continue;
                }
                let mut row = row;
                for (name, value) in &m.columns {
                    match name.as_str() {
                        "species" => row.species = required(as_u64(value), m, name)? as u16,
                        "form" => row.form = required(as_u64(value), m, name)? as u8,
                        "is_shiny" => row.is_shiny = required(as_bool(value), m, name)?,
                        "ball" => row.ball = required(as_text(value), m, name)?.to_string(),
                        "nickname" => row.nickname = required(as_text(value), m, name)?.to_string(),
                        "is_egg" => row.is_egg = required(as_bool(value), m, name)?,
                        "was_traded" => row.was_traded = required(as_bool(value), m, name)?,
                        "is_favorite" => row.is_favorite = required(as_bool(value), m, name)?,
                        "is_legendary" => row.is_legendary = required(as_bool(value), m, name)?,
                        "is_event" => row.is_event = required(as_bool(value), m, name)?,
                        other => {
                            return Err(Error::Mutation(format!("unknown catches column {other}")));
                        }
                    }
                }
                rw.upsert(row)?;
            }
        }
        StatementKind::Delete => {
            for row in all_catches(rw)? {
                if catch_filter_matches(&row, m)? {
                    rw.remove(row)?;
                }
            }
        }
    }
    Ok(())
}

fn all_payloads(rw: &RwTransaction) -> Result<Vec<StoredPayload>> {
    let scan = rw.scan().primary::<StoredPayload>()?;
    let iter = scan.all()?;
    let rows: std::result::Result<Vec<StoredPayload>, _> = iter.collect();
    rows.map_err(|e| Error::Database(e.to_string()))
}

fn apply_payloads(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    match m.kind {
        StatementKind::Insert => {
            let user_id = col_u64(m, "user_id")?;
            let id = col_u32(m, "id")?;
            rw.upsert(StoredPayload {
                key: catch_key(user_id, id),
                user_id,
                id,
                data: col_blob(m, "data")?,
            })?;
        }
        StatementKind::Update => {
            let user_id = filter_u64(m, "user_id")?;
            let id = filter_u64(m, "id")? as u32;
            let row: Option<StoredPayload> = rw.get().primary(catch_key(user_id, id))?;
            let Some(mut row) = row else {
                return Ok(());
            };
            row.data = col_blob(m, "data")?;
            rw.upsert(row)?;
        }
        StatementKind::Delete => {
            let user_id = filter_u64(m, "user_id")?;
            let id = m.filter_value("id").and_then(as_u64);
            for row in all_payloads(rw)? {
                if row.user_id == user_id && id.map(|id| row.id == id as u32).unwrap_or(true) {
                    rw.remove(row)?;
                }
            }
        }
    }
    Ok(())
}

fn apply_daycare(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    let user_id = match m.kind {
        StatementKind::Insert => col_u64(m, "user_id")?,
        _ => filter_u64(m, "user_id")?,
    };
    match m.kind {
        StatementKind::Insert | StatementKind::Update => {
            let mut row = rw
                .get()
                .primary::<StoredDaycare>(user_id)?
                .unwrap_or_else(|| StoredDaycare::empty(user_id));
            for (name, value) in &m.columns {
                match name.as_str() {
                    "user_id" => {}
                    "occupied1" => row.occupied1 = required(as_bool(value), m, name)?,
                    "id1" => row.id1 = required(as_u64(value), m, name)? as u32,
                    "species1" => row.species1 = required(as_u64(value), m, name)? as u16,
                    "form1" => row.form1 = required(as_u64(value), m, name)? as u8,
                    "ball1" => row.ball1 = required(as_text(value), m, name)?.to_string(),
                    "shiny1" => row.shiny1 = required(as_bool(value), m, name)?,
                    "occupied2" => row.occupied2 = required(as_bool(value), m, name)?,
                    "id2" => row.id2 = required(as_u64(value), m, name)? as u32,
                    "species2" => row.species2 = required(as_u64(value), m, name)? as u16,
                    "form2" => row.form2 = required(as_u64(value), m, name)? as u8,
                    "ball2" => row.ball2 = required(as_text(value), m, name)?.to_string(),
                    "shiny2" => row.shiny2 = required(as_bool(value), m, name)?,
                    other => return Err(Error::Mutation(format!("unknown daycare column {other}"))),
                }
            }
            rw.upsert(row)?;
        }
        StatementKind::Delete => {
            if let Some(row) = rw.get().primary::<StoredDaycare>(user_id)? {
                rw.remove(row)?;
            }
        }
    }
    Ok(())
}

fn apply_buddy(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    let user_id = match m.kind {
        StatementKind::Insert => col_u64(m, "user_id")?,
        _ => filter_u64(m, "user_id")?,
    };
    match m.kind {
        StatementKind::Insert | StatementKind::Update => {
            let mut row = rw
                .get()
                .primary::<StoredBuddy>(user_id)?
                .unwrap_or_else(|| StoredBuddy::empty(user_id));
            for (name, value) in &m.columns {
                match name.as_str() {
                    "user_id" => {}
                    "occupied" => row.occupied = required(as_bool(value), m, name)?,
                    "id" => row.id = required(as_u64(value), m, name)? as u32,
                    "name" => row.name = required(as_text(value), m, name)?.to_string(),
                    "ability" => row.ability = required(as_u64(value), m, name)? as u16,
                    other => return Err(Error::Mutation(format!("unknown buddy column {other}"))),
                }
            }
            rw.upsert(row)?;
        }
        StatementKind::Delete => {
            if let Some(row) = rw.get().primary::<StoredBuddy>(user_id)? {
                rw.remove(row)?;
            }
        }
    }
    Ok(())
}

fn all_items(rw: &RwTransaction) -> Result<Vec<StoredItem>> {
    let scan = rw.scan().primary::<StoredItem>()?;
    let iter = scan.all()?;
    let rows: std::result::Result<Vec<StoredItem>, _> = iter.collect();
    rows.map_err(|e| Error::Database(e.to_string()))
}

fn apply_items(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    match m.kind {
        StatementKind::Insert => {
            let user_id = col_u64(m, "user_id")?;
            let item = col_text(m, "id")?;
            rw.upsert(StoredItem {
                key: item_key(user_id, &item),
                user_id,
                item,
                count: col_u32(m, "count")?,
            })?;
        }
        StatementKind::Update => {
            let user_id = filter_u64(m, "user_id")?;
            let item = m
                .filter_value("id")
                .and_then(as_text)
                .ok_or_else(|| missing(m.table, "id"))?
                .to_string();
            let mut row = rw
                .get()
                .primary::<StoredItem>(item_key(user_id, &item))?
                .unwrap_or(StoredItem {
                    key: item_key(user_id, &item),
                    user_id,
                    item,
                    count: 0,
                });
            row.count = col_u32(m, "count")?;
            rw.upsert(row)?;
        }
        StatementKind::Delete => {
            let user_id = filter_u64(m, "user_id")?;
            let item = m.filter_value("id").and_then(as_text).map(str::to_string);
            for row in all_items(rw)? {
                if row.user_id == user_id
                    && item.as_deref().map(|i| row.item == i).unwrap_or(true)
                {
                    rw.remove(row)?;
                }
            }
        }
    }
    Ok(())
}

fn apply_dex(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    let user_id = match m.kind {
        StatementKind::Insert => col_u64(m, "user_id")?,
        _ => filter_u64(m, "user_id")?,
    };
    match m.kind {
        StatementKind::Insert | StatementKind::Update => {
            let mut row = rw
                .get()
                .primary::<StoredDex>(user_id)?
                .unwrap_or_else(|| StoredDex::empty(user_id));
            for (name, value) in &m.columns {
                match name.as_str() {
                    "user_id" => {}
                    "entries" => row.entries = required(as_text(value), m, name)?.to_string(),
                    "dex_count" => row.dex_count = required(as_u64(value), m, name)? as u32,
                    other => return Err(Error::Mutation(format!("unknown dex column {other}"))),
                }
            }
            rw.upsert(row)?;
        }
        StatementKind::Delete => {
            if let Some(row) = rw.get().primary::<StoredDex>(user_id)? {
                rw.remove(row)?;
            }
        }
    }
    Ok(())
}

fn apply_perks(rw: &RwTransaction, m: &Mutation) -> Result<()> {
    let user_id = match m.kind {
        StatementKind::Insert => col_u64(m, "user_id")?,
        _ => filter_u64(m, "user_id")?,
    };
    match m.kind {
        StatementKind::Insert | StatementKind::Update => {
            let mut row = rw
                .get()
                .primary::<StoredPerks>(user_id)?
                .unwrap_or_else(|| StoredPerks::empty(user_id));
            for (name, value) in &m.columns {
                match name.as_str() {
                    "user_id" => {}
                    "perks" => row.perks = required(as_text(value), m, name)?.to_string(),
                    "species_boost" => {
                        row.species_boost = required(as_u64(value), m, name)? as u16
                    }
                    other => return Err(Error::Mutation(format!("unknown perks column {other}"))),
                }
            }
            rw.upsert(row)?;
        }
        StatementKind::Delete => {
            if let Some(row) = rw.get().primary::<StoredPerks>(user_id)? {
                rw.remove(row)?;
            }
        }
    }
    Ok(())
}
