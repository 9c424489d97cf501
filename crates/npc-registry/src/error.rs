use std::fmt;

use thiserror::Error;

/// Which of the four factory maps an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryKind {
    Node,
    Condition,
    Filter,
    Steering,
}

impl fmt::Display for FactoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FactoryKind::Node      => "node",
            FactoryKind::Condition => "condition",
            FactoryKind::Filter    => "filter",
            FactoryKind::Steering  => "steering",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("{kind} type {name:?} is already registered")]
    Duplicate { kind: FactoryKind, name: String },

    #[error("unknown {kind} type {name:?}")]
    Unknown { kind: FactoryKind, name: String },

    #[error("{name}: expected {expected} children, got {found}")]
    ChildCount { name: String, expected: &'static str, found: usize },

    #[error("{name}: invalid parameter {value:?}: {reason}")]
    InvalidParameter { name: String, value: String, reason: String },
}

impl RegistryError {
    pub(crate) fn invalid(name: &str, value: &str, reason: impl Into<String>) -> Self {
        RegistryError::InvalidParameter {
            name:   name.to_string(),
            value:  value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("tree document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tree {0:?} is defined more than once")]
    DuplicateTree(String),

    #[error("the document defines no trees")]
    Empty,
}

pub type LoaderResult<T> = Result<T, LoaderError>;
