use std::sync::Arc;

use crate::error::VisitResult;
use crate::ir::builder::with_prefix_of;
use crate::ir::context::VisitContext;
use crate::ir::node::{Node, NodeKind};
use crate::ir::visitor::{TreeVisitor, walk_parenthesized};
use crate::recipe::{Precondition, Preconditions, Recipe};

/// Removes parentheses that do not affect evaluation order.
#[derive(Debug, Clone, Default)]
pub struct UnwrapParentheses;

impl Recipe for UnwrapParentheses {
    fn id(&self) -> &str {
        "unwrap-parentheses"
    }

    fn display_name(&self) -> &str {
        "Remove unnecessary parentheses"
    }

    fn precondition(&self) -> Precondition {
        Preconditions::has_kind(NodeKind::Parenthesized)
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor> {
        Arc::new(UnwrapVisitor)
    }
}

struct UnwrapVisitor;

/// Expressions that bind tighter than any operator they could be an operand of.
fn is_primary(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Identifier
            | NodeKind::Literal
            | NodeKind::MethodInvocation
            | NodeKind::FieldAccess
            | NodeKind::NewClass
            | NodeKind::Parenthesized
    )
}

impl TreeVisitor for UnwrapVisitor {
    fn visit_parenthesized(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let visited = walk_parenthesized(self, node, ctx)?;
        let Node::Parenthesized { expr, .. } = &*visited else {
            return Ok(visited);
        };
        let operand_position = match ctx.cursor().parent_node().map(|p| &**p) {
            Some(Node::Binary { .. } | Node::Unary { .. } | Node::FieldAccess { .. }) => true,
            Some(Node::MethodInvocation { select: Some(select), .. }) => select.id() == node.id(),
            _ => false,
        };
        if operand_position && !is_primary(expr.kind()) {
            return Ok(visited);
        }
        Ok(with_prefix_of(expr, &visited))
    }
}
