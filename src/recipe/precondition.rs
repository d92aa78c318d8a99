//! Cheap whole-tree checks that gate a recipe's visitor.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::VisitResult;
use crate::ir::context::VisitContext;
use crate::ir::node::{Node, NodeKind};
use crate::ir::types::TypeHierarchy;
use crate::ir::visitor::TreeVisitor;
use crate::matching::{MethodMatcher, TypePattern};

pub type TreeTest = Arc<dyn Fn(&Arc<Node>) -> bool + Send + Sync>;
pub type NodeTest = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

/// A predicate over a whole tree. Evaluation never fails: missing type
/// information counts as "does not apply".
#[derive(Clone, Default)]
pub enum Precondition {
    #[default]
    Always,
    /// Arbitrary test of the tree root.
    Tree { name: String, test: TreeTest },
    /// True if any node in the tree passes `test`.
    AnyNode { name: String, test: NodeTest },
    UsesMethod(Arc<MethodMatcher>),
    UsesType(Arc<TypePattern>),
    HasKind(NodeKind),
    And(Vec<Precondition>),
    Or(Vec<Precondition>),
    Not(Box<Precondition>),
}

impl Precondition {
    pub fn tree(
        name: impl Into<String>,
        test: impl Fn(&Arc<Node>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Precondition::Tree { name: name.into(), test: Arc::new(test) }
    }

    pub fn any_node(
        name: impl Into<String>,
        test: impl Fn(&Node) -> bool + Send + Sync + 'static,
    ) -> Self {
        Precondition::AnyNode { name: name.into(), test: Arc::new(test) }
    }

    pub fn evaluate(&self, tree: &Arc<Node>, hierarchy: &dyn TypeHierarchy) -> bool {
        match self {
            Precondition::Always => true,
            Precondition::Tree { test, .. } => test(tree),
            Precondition::AnyNode { test, .. } => tree.any(|n| test(n)),
            Precondition::UsesMethod(matcher) => tree.any(|n| matcher.matches_in(n, hierarchy)),
            Precondition::UsesType(pattern) => tree.any(|n| uses_type(n, pattern, hierarchy)),
            Precondition::HasKind(kind) => tree.any(|n| n.kind() == *kind),
            Precondition::And(all) => all.iter().all(|p| p.evaluate(tree, hierarchy)),
            Precondition::Or(any) => any.iter().any(|p| p.evaluate(tree, hierarchy)),
            Precondition::Not(inner) => !inner.evaluate(tree, hierarchy),
        }
    }
}

fn uses_type(node: &Node, pattern: &TypePattern, hierarchy: &dyn TypeHierarchy) -> bool {
    let matches = |name: &str| pattern.matches_in(name, hierarchy);
    match node {
        Node::TypeRef { name, .. } => matches(name.as_str()),
        Node::ClassDecl { class_type: Some(fqn), .. } => matches(fqn.as_str()),
        _ => node.method_type().is_some_and(|m| {
            matches(m.declaring_type.as_str())
                || m.parameter_types.iter().any(|p| matches(p.as_str()))
                || m.return_type.as_deref().is_some_and(matches)
        }),
    }
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Always => f.write_str("Always"),
            Precondition::Tree { name, .. } => write!(f, "Tree({})", name),
            Precondition::AnyNode { name, .. } => write!(f, "AnyNode({})", name),
            Precondition::UsesMethod(m) => write!(f, "UsesMethod({})", m),
            Precondition::UsesType(p) => write!(f, "UsesType({})", p),
            Precondition::HasKind(k) => write!(f, "HasKind({})", k),
            Precondition::And(all) => f.debug_tuple("And").field(all).finish(),
            Precondition::Or(any) => f.debug_tuple("Or").field(any).finish(),
            Precondition::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}

/// Constructors for stock preconditions and the gating wrapper.
pub struct Preconditions;

impl Preconditions {
    pub fn and(all: Vec<Precondition>) -> Precondition {
        Precondition::And(all)
    }

    pub fn or(any: Vec<Precondition>) -> Precondition {
        Precondition::Or(any)
    }

    pub fn not(inner: Precondition) -> Precondition {
        Precondition::Not(Box::new(inner))
    }

    pub fn uses_method(matcher: MethodMatcher) -> Precondition {
        Precondition::UsesMethod(Arc::new(matcher))
    }

    pub fn uses_type(pattern: TypePattern) -> Precondition {
        Precondition::UsesType(Arc::new(pattern))
    }

    pub fn has_kind(kind: NodeKind) -> Precondition {
        Precondition::HasKind(kind)
    }

    /// Wraps `visitor` so that it only runs on trees satisfying `precondition`.
    /// The check happens once, at the node the wrapper is first applied to.
    pub fn check(
        precondition: Precondition,
        visitor: Arc<dyn TreeVisitor>,
    ) -> Arc<dyn TreeVisitor> {
        match precondition {
            Precondition::Always => visitor,
            precondition => Arc::new(Gated { precondition, inner: visitor }),
        }
    }
}

struct Gated {
    precondition: Precondition,
    inner: Arc<dyn TreeVisitor>,
}

impl TreeVisitor for Gated {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn visit(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        if !self.precondition.evaluate(node, ctx.type_hierarchy()) {
            debug!(
                "Skipping '{}': precondition {:?} not met",
                self.inner.name(),
                self.precondition
            );
            return Ok(Arc::clone(node));
        }
        self.inner.visit(node, ctx)
    }
}
