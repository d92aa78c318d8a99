use std::sync::Arc;

use tracing::trace;

use crate::error::VisitResult;
use crate::ir::context::VisitContext;
use crate::ir::node::{Modifier, Node, NodeKind};
use crate::ir::visitor::{TreeVisitor, walk_variable_decls};
use crate::recipe::{Precondition, Preconditions, Recipe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
    /// No visibility keyword.
    Package,
}

impl Visibility {
    fn modifier(self) -> Option<Modifier> {
        match self {
            Visibility::Public => Some(Modifier::Public),
            Visibility::Protected => Some(Modifier::Protected),
            Visibility::Private => Some(Modifier::Private),
            Visibility::Package => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
            Visibility::Package => "package",
        }
    }
}

/// Sets the visibility of every field declaration.
#[derive(Debug, Clone)]
pub struct ChangeFieldVisibility {
    id: String,
    visibility: Visibility,
}

impl ChangeFieldVisibility {
    pub fn new(visibility: Visibility) -> Self {
        ChangeFieldVisibility {
            id: format!("change-field-visibility:{}", visibility.keyword()),
            visibility,
        }
    }

    pub fn make_private() -> Self {
        Self::new(Visibility::Private)
    }
}

impl Recipe for ChangeFieldVisibility {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "Change field visibility"
    }

    fn description(&self) -> &str {
        "Replaces the visibility modifier of every field declaration."
    }

    fn precondition(&self) -> Precondition {
        Preconditions::has_kind(NodeKind::ClassDecl)
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor> {
        Arc::new(FieldVisibilityVisitor { visibility: self.visibility })
    }
}

struct FieldVisibilityVisitor {
    visibility: Visibility,
}

/// `modifiers` with its visibility replaced, or `None` if it already has
/// exactly that visibility.
fn with_visibility(modifiers: &[Modifier], visibility: Visibility) -> Option<Vec<Modifier>> {
    let current: Vec<Modifier> =
        modifiers.iter().copied().filter(Modifier::is_visibility).collect();
    if current.as_slice() == visibility.modifier().as_slice() {
        return None;
    }
    let at = modifiers.iter().position(Modifier::is_visibility).unwrap_or(0);
    let mut updated: Vec<Modifier> =
        modifiers.iter().copied().filter(|m| !m.is_visibility()).collect();
    if let Some(modifier) = visibility.modifier() {
        updated.insert(at.min(updated.len()), modifier);
    }
    Some(updated)
}

impl TreeVisitor for FieldVisibilityVisitor {
    fn visit_variable_decls(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let cursor = ctx.cursor();
        let in_class_body = cursor.parent_node().is_some_and(|p| p.kind() == NodeKind::Block)
            && cursor
                .parent()
                .and_then(|p| p.parent_node())
                .is_some_and(|p| p.kind() == NodeKind::ClassDecl);

        let visited = walk_variable_decls(self, node, ctx)?;
        if !in_class_body {
            return Ok(visited);
        }
        let Node::VariableDecls { base, modifiers, type_expr, variables } = &*visited else {
            return Ok(visited);
        };
        let Some(modifiers) = with_visibility(modifiers, self.visibility) else {
            return Ok(visited);
        };
        trace!("Changing field visibility to {:?} on {}", self.visibility, base.id());
        Ok(Arc::new(Node::VariableDecls {
            base: base.clone(),
            modifiers,
            type_expr: type_expr.clone(),
            variables: variables.clone(),
        }))
    }
}
