//! Error taxonomy for the simulation core.
//!
//! Not-found, duplicate-id and resource-exhaustion conditions are recoverable:
//! they are logged at the registry boundary and the operation is skipped.
//! Drain-phase mutations surface them as `Err` so the drain can log and carry on.
//! Physics writes outside the drain phase are not represented here: they panic.

use thiserror::Error;

use crate::components::entityid::{EntityId, PlayerId};
use crate::resources::physics::BodyHandle;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    #[error("entity id {0} is already in use")]
    DuplicateId(EntityId),

    #[error("physics body {0:?} not found")]
    BodyNotFound(BodyHandle),

    #[error("no spawn point available for player {0}")]
    NoSpawnAvailable(PlayerId),

    #[error("unknown participant {0}")]
    UnknownParticipant(PlayerId),

    #[error("failed to read level layout: {0}")]
    LayoutIo(#[from] std::io::Error),

    #[error("failed to parse level layout: {0}")]
    LayoutParse(#[from] serde_json::Error),
}

pub type SimResult<T = ()> = Result<T, SimError>;
