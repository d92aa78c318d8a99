use std::sync::Arc;

use tracing::debug;

use crate::error::VisitResult;
use crate::ir::context::VisitContext;
use crate::ir::cursor::{Cursor, ScopeRef};
use crate::ir::node::{Node, NodeId};
use crate::ir::visitor::{TreeVisitor, walk_block, walk_method_decl, walk_named_variable};
use crate::recipe::Recipe;

/// Renames one local variable or parameter and every reference to it that
/// is not shadowed by another declaration of the same name.
///
/// The variable is identified by the id of its `NamedVariable` node, so
/// same-named variables in other scopes are left alone.
#[derive(Debug, Clone)]
pub struct RenameVariable {
    id: String,
    declaration: NodeId,
    to: String,
}

impl RenameVariable {
    pub fn new(declaration: NodeId, to: impl Into<String>) -> Self {
        let to = to.into();
        RenameVariable {
            id: format!("rename-variable:{}->{}", declaration, to),
            declaration,
            to,
        }
    }
}

impl Recipe for RenameVariable {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "Rename variable"
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor> {
        Arc::new(RenameDeclaration { declaration: self.declaration, to: self.to.clone() })
    }
}

struct RenameDeclaration {
    declaration: NodeId,
    to: String,
}

impl RenameDeclaration {
    /// Current name of the target if `decls` holds it and it still needs renaming.
    fn pending_name(&self, decls: &Arc<Node>) -> Option<String> {
        let Node::VariableDecls { variables, .. } = &**decls else {
            return None;
        };
        variables
            .iter()
            .find(|v| v.id() == self.declaration)
            .and_then(|v| v.simple_name())
            .filter(|name| *name != self.to)
            .map(str::to_string)
    }

    fn schedule_references(&self, scope: &Node, from: Option<String>, ctx: &mut VisitContext) {
        if let Some(from) = from {
            debug!(
                "Renaming references to '{}' as '{}' in {} {}",
                from,
                self.to,
                scope.kind(),
                scope.id()
            );
            ctx.do_after_visit(Arc::new(RenameReferences {
                scope: ScopeRef::of(scope),
                from,
                to: self.to.clone(),
            }));
        }
    }
}

impl TreeVisitor for RenameDeclaration {
    fn visit_block(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let Node::Block { statements, .. } = &**node else {
            return walk_block(self, node, ctx);
        };
        let from = statements.iter().find_map(|s| self.pending_name(s));
        let visited = walk_block(self, node, ctx)?;
        self.schedule_references(node, from, ctx);
        Ok(visited)
    }

    fn visit_method_decl(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let Node::MethodDecl { params, .. } = &**node else {
            return walk_method_decl(self, node, ctx);
        };
        let from = params.iter().find_map(|p| self.pending_name(p));
        let visited = walk_method_decl(self, node, ctx)?;
        self.schedule_references(node, from, ctx);
        Ok(visited)
    }

    fn visit_named_variable(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let visited = walk_named_variable(self, node, ctx)?;
        match &*visited {
            Node::NamedVariable { base, name, initializer }
                if base.id() == self.declaration && *name != self.to =>
            {
                Ok(Arc::new(Node::NamedVariable {
                    base: base.clone(),
                    name: self.to.clone(),
                    initializer: initializer.clone(),
                }))
            }
            _ => Ok(visited),
        }
    }
}

/// Renames identifiers `from` that resolve to the binding introduced in `scope`.
struct RenameReferences {
    scope: ScopeRef,
    from: String,
    to: String,
}

impl TreeVisitor for RenameReferences {
    fn visit_identifier(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let Node::Identifier { base, name } = &**node else {
            return Ok(Arc::clone(node));
        };
        if *name != self.from {
            return Ok(Arc::clone(node));
        }
        let cursor = ctx.cursor();
        let resolves_here = cursor
            .find_frame(self.scope.id())
            .is_some_and(|scope| Cursor::is_in_same_name_scope(scope, cursor, &self.from));
        if !resolves_here {
            return Ok(Arc::clone(node));
        }
        Ok(Arc::new(Node::Identifier { base: base.clone(), name: self.to.clone() }))
    }
}
