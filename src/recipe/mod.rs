//! Recipes: named, gated visitors and the machinery that sequences them.

pub mod pipeline;
pub mod precondition;
pub mod scheduler;

use std::sync::Arc;

use crate::ir::visitor::TreeVisitor;

pub use pipeline::RecipePipeline;
pub use precondition::{Precondition, Preconditions};

/// A declarative rewrite rule.
///
/// Recipes are stateless and shared between threads; per-run state belongs in
/// the [`VisitContext`](crate::ir::context::VisitContext) the visitor receives.
pub trait Recipe: Send + Sync {
    /// Stable identifier. Also the source id of markers the recipe adds.
    fn id(&self) -> &str;

    fn display_name(&self) -> &str {
        self.id()
    }

    /// Documentation only.
    fn description(&self) -> &str {
        ""
    }

    /// Upper bound on the cycles in which this recipe runs. The engine's
    /// own cap still applies.
    fn max_cycles(&self) -> usize {
        usize::MAX
    }

    fn precondition(&self) -> Precondition {
        Precondition::Always
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor>;

    /// Ids of recipes that must run before this one.
    fn prerequisites(&self) -> Vec<String> {
        Vec::new()
    }
}
