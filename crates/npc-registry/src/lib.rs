//! `npc-registry` — builds behaviour trees from names and text.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                       |
//! |---------------|----------------------------------------------------------------|
//! | [`registry`]  | `AIRegistry` — type name → factory, four maps behind `RwLock`  |
//! | [`factory`]   | factory signatures and their context structs                   |
//! | `builtins`    | factories for the built-in node, condition, filter and steering types |
//! | [`expr`]      | `Name{params}(args)` expression syntax                         |
//! | [`parser`]    | `ConditionParser`, `TreeNodeParser`                            |
//! | [`loader`]    | `TreeLoader`, `JsonTreeLoader`, `load_tree_file`               |
//! | [`script`]    | `ScriptContext` and the script adapters                        |
//! | [`error`]     | `RegistryError`, `LoaderError`                                 |
//!
//! # Construction-time validation
//!
//! Factories reject wrong child counts and malformed parameters with a
//! [`RegistryError`], so a tree that was built never needs checking again
//! while it ticks.

mod builtins;
pub mod error;
pub mod expr;
pub mod factory;
pub mod loader;
pub mod parser;
pub mod registry;
pub mod script;

#[cfg(test)]
mod tests;

pub use error::{FactoryKind, LoaderError, LoaderResult, RegistryError, RegistryResult};
pub use expr::Expr;
pub use factory::{
    ConditionFactoryContext, FilterFactoryContext, NodeFactoryContext, SteeringFactoryContext,
};
pub use loader::{JsonTreeLoader, TreeLoader, load_tree_file, load_tree_reader};
pub use parser::{ConditionParser, TreeNodeParser};
pub use registry::AIRegistry;
pub use script::{ScriptCondition, ScriptContext, ScriptFilter, ScriptNode, ScriptSteering};
