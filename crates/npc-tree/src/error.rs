//! Faults raised by node, condition and steering logic.

use thiserror::Error;

use npc_core::CharacterId;

/// An internal fault.  The node boundary turns it into
/// `TreeNodeStatus::Exception`; it never leaves `Agent::update`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NodeError {
    #[error("{0}")]
    Fault(String),

    #[error("agent is not in a zone")]
    MissingZone,

    #[error("{0} is not known to the zone")]
    UnknownCharacter(CharacterId),
}

impl NodeError {
    pub fn fault(message: impl Into<String>) -> Self {
        NodeError::Fault(message.into())
    }
}

pub type NodeResult<T> = Result<T, NodeError>;
