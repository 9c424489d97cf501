use npc_core::{CharacterId, CoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("zone {zone} already has an agent for {id}")]
    DuplicateAgent { zone: String, id: CharacterId },

    #[error("zone {zone} has no agent for {id}")]
    UnknownAgent { zone: String, id: CharacterId },

    #[error("could not build the zone thread pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Config(#[from] CoreError),
}

pub type ZoneResult<T> = Result<T, ZoneError>;
