//! Typed storage mutations and the per-command batch
//!
//! Handlers never talk to storage. They stage [`Mutation`]s into a
//! [`MutationBatch`] while mutating their aggregate clone; the dispatcher
//! submits the whole batch to the storage executor after the handler reports
//! success. Values keep their exact types (boolean, integer, text, blob) all
//! the way to the executor - this boundary is where a stringly-typed bug
//! would silently corrupt a payload, so everything stays typed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A column value, preserving the exact storage type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

/// The logical tables the engine persists to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Players,
    Catches,
    CatchPayloads,
    Daycare,
    Buddy,
    Items,
    Dex,
    Perks,
}

impl Table {
    /// Table name as known to the storage executor
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Players => "players",
            Table::Catches => "catches",
            Table::CatchPayloads => "catch_payloads",
            Table::Daycare => "daycare",
            Table::Buddy => "buddy",
            Table::Items => "items",
            Table::Dex => "dex",
            Table::Perks => "perks",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement kind of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
}

/// One parameterized storage statement
///
/// `columns` carries the written values (all of them for an insert, the
/// changed ones for an update); `filter` carries equality conditions
/// identifying the affected rows. A delete removes every row matching its
/// filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: StatementKind,
    pub table: Table,
    pub columns: Vec<(String, Value)>,
    pub filter: Vec<(String, Value)>,
}

impl Mutation {
    /// Start an insert statement
    pub fn insert(table: Table) -> Self {
        Self {
            kind: StatementKind::Insert,
            table,
            columns: Vec::new(),
            filter: Vec::new(),
        }
    }

    /// Start an update statement
    pub fn update(table: Table) -> Self {
        Self {
            kind: StatementKind::Update,
            table,
            columns: Vec::new(),
            filter: Vec::new(),
        }
    }

    /// Start a delete statement
    pub fn delete(table: Table) -> Self {
        Self {
            kind: StatementKind::Delete,
            table,
            columns: Vec::new(),
            filter: Vec::new(),
        }
    }

    /// Add a written column
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push((column.into(), value.into()));
        self
    }

    /// Add an equality filter condition
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.push((column.into(), value.into()));
        self
    }

    /// Look up a written column value by name
    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, v)| v)
    }

    /// Look up a filter value by name
    pub fn filter_value(&self, name: &str) -> Option<&Value> {
        self.filter
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, v)| v)
    }
}

/// An ordered collection of mutations applied atomically per command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationBatch {
    mutations: Vec<Mutation>,
}

impl MutationBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a mutation at the end of the batch
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    /// Append another batch, preserving order
    pub fn extend(&mut self, other: MutationBatch) {
        self.mutations.extend(other.mutations);
    }

    /// Number of staged mutations
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether nothing has been staged
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Iterate in staged order
    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations.iter()
    }

    /// Consume the batch and return the underlying mutations
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

/// The external storage executor
///
/// Implementations apply a whole batch atomically: either every mutation
/// lands or none does. The engine never observes partial application.
pub trait StorageExecutor {
    /// Load a player aggregate, `Ok(None)` for a first-time player
    fn load_player(
        &self,
        id: crate::PlayerId,
    ) -> crate::Result<Option<crate::player::PlayerAggregate>>;

    /// Apply every mutation in staged order, atomically
    fn apply(&self, batch: &MutationBatch) -> crate::Result<()>;
}
