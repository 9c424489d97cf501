//! Behaviour tree documents.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "trees": [
//!     {
//!       "name": "guard",
//!       "root": {
//!         "name": "root",
//!         "type": "PrioritySelector",
//!         "children": [
//!           { "name": "chase", "type": "Steer(SelectionSeek)",
//!             "condition": "Filter(SelectHighestAggro)" },
//!           { "name": "wait", "type": "Idle{1000}" }
//!         ]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! | Field       | Required | Meaning                                           |
//! |-------------|----------|---------------------------------------------------|
//! | `type`      | yes      | node-type expression, see [`TreeNodeParser`]      |
//! | `name`      | no       | instance name; defaults to the type expression   |
//! | `condition` | no       | condition expression, see [`ConditionParser`]     |
//! | `children`  | no       | child nodes, in order                             |
//!
//! Unknown fields are rejected.  Children are built before their parent, so
//! the first error reported is the deepest one.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use npc_tree::Tree;
use npc_tree::condition::True;

use crate::error::{LoaderError, LoaderResult};
use crate::factory::NodeFactoryContext;
use crate::parser::{ConditionParser, TreeNodeParser};
use crate::registry::AIRegistry;

/// Builds named trees from a textual document.
pub trait TreeLoader {
    fn load(&self, registry: &AIRegistry, text: &str) -> LoaderResult<BTreeMap<String, Tree>>;
}

// ── JSON records ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TreeDocument {
    trees: Vec<TreeRecord>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TreeRecord {
    name: String,
    root: NodeRecord,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeRecord {
    #[serde(rename = "type")]
    kind:      String,
    #[serde(default)]
    name:      Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    children:  Vec<NodeRecord>,
}

// ── JsonTreeLoader ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeLoader;

impl TreeLoader for JsonTreeLoader {
    fn load(&self, registry: &AIRegistry, text: &str) -> LoaderResult<BTreeMap<String, Tree>> {
        let document: TreeDocument = serde_json::from_str(text)?;
        if document.trees.is_empty() {
            return Err(LoaderError::Empty);
        }

        let builder = Builder {
            conditions: ConditionParser::new(registry),
            nodes:      TreeNodeParser::new(registry),
        };
        let mut trees = BTreeMap::new();
        for record in document.trees {
            if trees.contains_key(&record.name) {
                return Err(LoaderError::DuplicateTree(record.name));
            }
            let tree = builder.build(&record.root)?;
            debug!(tree = %record.name, root = tree.base().name(), "behaviour tree loaded");
            trees.insert(record.name, tree);
        }
        Ok(trees)
    }
}

struct Builder<'r> {
    conditions: ConditionParser<'r>,
    nodes:      TreeNodeParser<'r>,
}

impl Builder<'_> {
    fn build(&self, record: &NodeRecord) -> LoaderResult<Tree> {
        let children = record.children.iter().map(|c| self.build(c)).collect::<LoaderResult<Vec<_>>>()?;
        let condition = match &record.condition {
            Some(text) => self.conditions.parse(text)?,
            None => True::shared(),
        };
        let name = record.name.clone().unwrap_or_else(|| record.kind.clone());
        let ctx = NodeFactoryContext::new(name).with_condition(condition).with_children(children);
        self.nodes.parse(&record.kind, ctx)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load every tree of a JSON document on disk.
pub fn load_tree_file(registry: &AIRegistry, path: &Path) -> LoaderResult<BTreeMap<String, Tree>> {
    let text = std::fs::read_to_string(path)?;
    JsonTreeLoader.load(registry, &text)
}

/// Like [`load_tree_file`] but accepts any `Read` source.
pub fn load_tree_reader<R: Read>(registry: &AIRegistry, mut reader: R) -> LoaderResult<BTreeMap<String, Tree>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    JsonTreeLoader.load(registry, &text)
}
