use std::sync::Arc;

use tracing::trace;

use crate::error::{MalformedPatternError, VisitResult};
use crate::ir::context::VisitContext;
use crate::ir::node::Node;
use crate::ir::visitor::{TreeVisitor, walk_method_decl, walk_method_invocation};
use crate::matching::MethodMatcher;
use crate::recipe::{Precondition, Preconditions, Recipe};

/// Renames the invocations and declarations of methods matching a pattern,
/// keeping their attributed method type in step.
#[derive(Debug, Clone)]
pub struct ChangeMethodName {
    id: String,
    matcher: Arc<MethodMatcher>,
    new_name: String,
}

impl ChangeMethodName {
    pub fn new(
        pattern: &str,
        new_name: impl Into<String>,
        match_overrides: bool,
    ) -> Result<Self, MalformedPatternError> {
        let matcher = MethodMatcher::compile(pattern)?.match_overrides(match_overrides);
        let new_name = new_name.into();
        Ok(ChangeMethodName {
            id: format!("change-method-name:{}->{}", matcher.pattern(), new_name),
            matcher: Arc::new(matcher),
            new_name,
        })
    }
}

impl Recipe for ChangeMethodName {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "Change method name"
    }

    fn precondition(&self) -> Precondition {
        Preconditions::uses_method(MethodMatcher::clone(&self.matcher))
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor> {
        Arc::new(RenameMethods {
            matcher: Arc::clone(&self.matcher),
            new_name: self.new_name.clone(),
        })
    }
}

struct RenameMethods {
    matcher: Arc<MethodMatcher>,
    new_name: String,
}

impl RenameMethods {
    fn applies(&self, node: &Node, name: &str, ctx: &VisitContext) -> bool {
        name != self.new_name && self.matcher.matches_in(node, ctx.type_hierarchy())
    }
}

impl TreeVisitor for RenameMethods {
    fn visit_method_invocation(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let visited = walk_method_invocation(self, node, ctx)?;
        match &*visited {
            Node::MethodInvocation { base, select, name, args, method_type }
                if self.applies(&visited, name, ctx) =>
            {
                trace!("Renaming call {} to {}", name, self.new_name);
                Ok(Arc::new(Node::MethodInvocation {
                    base: base.clone(),
                    select: select.clone(),
                    name: self.new_name.clone(),
                    args: args.clone(),
                    method_type: method_type
                        .as_ref()
                        .map(|m| Arc::new(m.with_name(&self.new_name))),
                }))
            }
            _ => Ok(visited),
        }
    }

    fn visit_method_decl(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let visited = walk_method_decl(self, node, ctx)?;
        match &*visited {
            Node::MethodDecl { base, modifiers, return_type, name, params, body, method_type }
                if self.applies(&visited, name, ctx) =>
            {
                trace!("Renaming declaration {} to {}", name, self.new_name);
                Ok(Arc::new(Node::MethodDecl {
                    base: base.clone(),
                    modifiers: modifiers.clone(),
                    return_type: return_type.clone(),
                    name: self.new_name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    method_type: method_type
                        .as_ref()
                        .map(|m| Arc::new(m.with_name(&self.new_name))),
                }))
            }
            _ => Ok(visited),
        }
    }
}
