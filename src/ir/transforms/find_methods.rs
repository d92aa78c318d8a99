use std::sync::Arc;

use crate::error::{MalformedPatternError, VisitResult};
use crate::ir::context::VisitContext;
use crate::ir::markers::{Marker, MarkerPayload};
use crate::ir::node::Node;
use crate::ir::visitor::{TreeVisitor, walk_method_decl, walk_method_invocation, walk_new_class};
use crate::matching::MethodMatcher;
use crate::recipe::{Precondition, Preconditions, Recipe};

/// Marks invocations, constructor calls and declarations matching a method
/// pattern with a search result.
#[derive(Debug, Clone)]
pub struct FindMethods {
    id: String,
    matcher: Arc<MethodMatcher>,
}

impl FindMethods {
    pub fn new(pattern: &str, match_overrides: bool) -> Result<Self, MalformedPatternError> {
        let matcher = MethodMatcher::compile(pattern)?.match_overrides(match_overrides);
        let id = if match_overrides {
            format!("find-methods:{} (overrides)", matcher.pattern())
        } else {
            format!("find-methods:{}", matcher.pattern())
        };
        Ok(FindMethods { id, matcher: Arc::new(matcher) })
    }
}

impl Recipe for FindMethods {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "Find method usages"
    }

    fn precondition(&self) -> Precondition {
        Preconditions::uses_method(MethodMatcher::clone(&self.matcher))
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor> {
        Arc::new(MarkMatches { matcher: Arc::clone(&self.matcher) })
    }
}

struct MarkMatches {
    matcher: Arc<MethodMatcher>,
}

impl MarkMatches {
    fn mark(&self, node: Arc<Node>, ctx: &VisitContext) -> Arc<Node> {
        if !self.matcher.matches_in(&node, ctx.type_hierarchy()) {
            return node;
        }
        let payload = MarkerPayload::search_result(Some(self.matcher.pattern().to_string()));
        node.with_marker(Marker::new(ctx.source_id(), payload))
    }
}

impl TreeVisitor for MarkMatches {
    fn visit_method_invocation(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let visited = walk_method_invocation(self, node, ctx)?;
        Ok(self.mark(visited, ctx))
    }

    fn visit_new_class(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let visited = walk_new_class(self, node, ctx)?;
        Ok(self.mark(visited, ctx))
    }

    fn visit_method_decl(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let visited = walk_method_decl(self, node, ctx)?;
        Ok(self.mark(visited, ctx))
    }
}
