//! Runs one recipe pass over a tree and drains the passes it queues.

use std::sync::Arc;

use tracing::trace;

use crate::error::VisitResult;
use crate::ir::context::VisitContext;
use crate::ir::node::Node;
use crate::ir::visitor::TreeVisitor;

/// Visits `tree` with `visitor`, then runs every visitor queued with
/// [`VisitContext::and_then`] over the resulting tree in FIFO order,
/// including passes queued by those passes.
///
/// The first error aborts the remaining passes.
pub fn run_pass(
    visitor: &dyn TreeVisitor,
    tree: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    ctx.reset_cursor();
    let mut current = visitor.visit(tree, ctx)?;
    while let Some(next) = ctx.next_pass() {
        trace!("Running queued pass '{}' for {}", next.name(), ctx.source_id());
        ctx.reset_cursor();
        current = next.visit(&current, ctx)?;
    }
    Ok(current)
}
