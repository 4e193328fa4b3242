//! Error types for menagerie-core
//!
//! User-facing rejections (bad input, state conflicts) are not errors: they
//! are failed [`Outcome`](crate::Outcome)s carrying a specific message.
//! `Error` is reserved for internal faults - a generated creature failing the
//! validity check, a payload that cannot be decoded, a storage fault - which
//! the dispatcher logs and surfaces as a generic failure.

use crate::SpeciesId;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("generated creature failed validity check during {stage}: {species}")]
    InvalidCreature { stage: &'static str, species: SpeciesId },

    #[error("egg synthesis produced an invalid creature: {parent1} x {parent2}")]
    InvalidEgg { parent1: SpeciesId, parent2: SpeciesId },

    #[error("creature payload could not be decoded: {0}")]
    Payload(String),

    #[error("species not present in catalog: {0}")]
    UnknownSpecies(SpeciesId),

    #[error("evolution failed for {species}: {reason}")]
    Evolution { species: SpeciesId, reason: String },

    #[error("storage fault: {0}")]
    Storage(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
