//! `npc-tree` — flyweight behaviour trees and the agent that runs them.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`agent`]     | `Agent`, `BehaviourHandle`                                   |
//! | [`state`]     | `NodeStates` — per-agent, per-node execution state           |
//! | [`node`]      | `TreeNode`, `NodeBase`, `Tree` and the built-in node kinds   |
//! | [`condition`] | `Condition`, `ConditionExt` and the built-in conditions      |
//! | [`filter`]    | `Filter` and the built-in candidate filters                  |
//! | [`steering`]  | `Steering`, `WeightedSteering` and the built-in steerings    |
//! | [`error`]     | `NodeError`, `NodeResult<T>`                                 |
//!
//! # Design notes
//!
//! One tree serves many agents.  A tree is an `Arc<dyn TreeNode>` that is
//! never mutated after construction; each agent keeps what the tree needs to
//! resume (running child indices, timers, limit counters, debug records) in
//! its own [`NodeStates`], keyed by node id.  Ticking different agents on
//! different threads therefore needs no synchronisation beyond the zone's
//! read-mostly directory.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | `FxHashMap` instead of `HashMap` for the per-node maps.    |
//! | `serde`   | Propagates serde derives to `npc-core` and `npc-aggro`.    |

pub mod agent;
pub mod condition;
pub mod error;
pub mod filter;
pub mod node;
pub mod state;
pub mod steering;


pub use agent::{Agent, BehaviourHandle};
pub use condition::{Condition, ConditionExt, ConditionPtr};
pub use error::{NodeError, NodeResult};
pub use filter::{Filter, FilterPtr};
pub use node::{IntoTree, NodeBase, Tree, TreeNode};
pub use state::NodeStates;
pub use steering::{Steering, SteeringPtr, WeightedSteering};
