//! Parsers from expression text to registry-built objects.
//!
//! ```text
//! And(Not(HasEnemies{2}),Filter(SelectZone,SelectHighestAggro))   condition
//! Steer{1,2}(SelectionSeek,Wander{0.5})                           node type
//! ```
//!
//! Inside a condition expression the arguments of `Filter` are filter
//! expressions; every other condition takes conditions.  The arguments of a
//! node-type expression are steerings.

use npc_tree::condition::FilterCondition;
use npc_tree::{ConditionPtr, FilterPtr, SteeringPtr, Tree};

use crate::error::{LoaderError, LoaderResult};
use crate::expr::{self, Expr};
use crate::factory::{ConditionFactoryContext, FilterFactoryContext, NodeFactoryContext, SteeringFactoryContext};
use crate::registry::AIRegistry;

pub struct ConditionParser<'r> {
    registry: &'r AIRegistry,
}

impl<'r> ConditionParser<'r> {
    pub fn new(registry: &'r AIRegistry) -> Self {
        Self { registry }
    }

    pub fn parse(&self, text: &str) -> LoaderResult<ConditionPtr> {
        self.condition(&expr::parse(text)?)
    }

    fn condition(&self, e: &Expr) -> LoaderResult<ConditionPtr> {
        let mut ctx = ConditionFactoryContext::new(e.parameters.as_str());
        if e.name == FilterCondition::NAME {
            ctx.filters = e.args.iter().map(|a| self.filter(a)).collect::<LoaderResult<_>>()?;
        } else {
            ctx.children = e.args.iter().map(|a| self.condition(a)).collect::<LoaderResult<_>>()?;
        }
        Ok(self.registry.create_condition(&e.name, &ctx)?)
    }

    fn filter(&self, e: &Expr) -> LoaderResult<FilterPtr> {
        let children = e.args.iter().map(|a| self.filter(a)).collect::<LoaderResult<_>>()?;
        let ctx = FilterFactoryContext::new(e.parameters.as_str()).with_children(children);
        Ok(self.registry.create_filter(&e.name, &ctx)?)
    }
}

pub struct TreeNodeParser<'r> {
    registry: &'r AIRegistry,
}

impl<'r> TreeNodeParser<'r> {
    pub fn new(registry: &'r AIRegistry) -> Self {
        Self { registry }
    }

    /// Build a node from its type expression.  `ctx` supplies the name,
    /// guard and children; parameters and steerings come from `text`.
    pub fn parse(&self, text: &str, ctx: NodeFactoryContext) -> LoaderResult<Tree> {
        let e = expr::parse(text)?;
        let steerings = e.args.iter().map(|a| self.steering(a)).collect::<LoaderResult<Vec<_>>>()?;
        let ctx = ctx.with_parameters(e.parameters.as_str()).with_steerings(steerings);
        Ok(self.registry.create_node(&e.name, &ctx)?)
    }

    fn steering(&self, e: &Expr) -> LoaderResult<SteeringPtr> {
        if !e.args.is_empty() {
            return Err(LoaderError::Syntax {
                position: e.position,
                message:  format!("steering {} takes no arguments", e.name),
            });
        }
        let ctx = SteeringFactoryContext::new(e.parameters.as_str());
        Ok(self.registry.create_steering(&e.name, &ctx)?)
    }
}
