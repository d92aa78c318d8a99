use std::sync::Arc;

use tracing::trace;

use crate::error::VisitResult;
use crate::ir::context::VisitContext;
use crate::ir::node::Node;
use crate::ir::visitor::{TreeVisitor, walk_class_decl};
use crate::matching::{PackageMatcher, Reference, ReferenceMatcher, RenamePolicy, Renamer};
use crate::recipe::{Precondition, Recipe};

/// Moves references from one package to another: package declarations,
/// imports, type references and the attributed names of declared classes.
#[derive(Debug, Clone)]
pub struct ChangePackage {
    id: String,
    matcher: Arc<PackageMatcher>,
    new_package: String,
}

impl ChangePackage {
    pub fn new(
        old_package: impl Into<String>,
        new_package: impl Into<String>,
        policy: RenamePolicy,
    ) -> Self {
        let matcher = PackageMatcher::new(old_package, policy);
        let new_package = new_package.into();
        ChangePackage {
            id: format!("change-package:{}->{}", matcher.package(), new_package),
            matcher: Arc::new(matcher),
            new_package,
        }
    }
}

impl Recipe for ChangePackage {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "Change package"
    }

    fn precondition(&self) -> Precondition {
        let matcher = Arc::clone(&self.matcher);
        Precondition::any_node(format!("references {}", self.matcher.package()), move |n| {
            Reference::of(n).is_some_and(|r| matcher.matches_reference(&r))
        })
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor> {
        Arc::new(MovePackageReferences {
            matcher: Arc::clone(&self.matcher),
            new_package: self.new_package.clone(),
        })
    }
}

struct MovePackageReferences {
    matcher: Arc<PackageMatcher>,
    new_package: String,
}

impl MovePackageReferences {
    fn renamed(&self, value: &str) -> Option<String> {
        self.matcher
            .rename(value, self.matcher.package(), &self.new_package)
            .filter(|renamed| renamed != value)
    }

    fn rename_reference(&self, node: &Arc<Node>) -> Arc<Node> {
        let Some(reference) = Reference::of(node) else {
            return Arc::clone(node);
        };
        if !self.matcher.matches_reference(&reference) {
            return Arc::clone(node);
        }
        let Some(value) = self.renamed(&reference.value) else {
            return Arc::clone(node);
        };
        trace!("Renaming {:?} reference {} to {}", reference.kind, reference.value, value);
        Arc::new(match &**node {
            Node::Package { base, .. } => Node::Package { base: base.clone(), name: value },
            Node::Import { base, is_static, .. } => {
                Node::Import { base: base.clone(), name: value, is_static: *is_static }
            }
            Node::TypeRef { base, .. } => Node::TypeRef { base: base.clone(), name: value },
            other => other.clone(),
        })
    }
}

impl TreeVisitor for MovePackageReferences {
    fn visit_package(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        Ok(self.rename_reference(node))
    }

    fn visit_import(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        Ok(self.rename_reference(node))
    }

    fn visit_type_ref(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        Ok(self.rename_reference(node))
    }

    fn visit_class_decl(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        let visited = walk_class_decl(self, node, ctx)?;
        let Node::ClassDecl {
            base,
            modifiers,
            name,
            extends,
            implements,
            body,
            class_type: Some(fqn),
        } = &*visited
        else {
            return Ok(visited);
        };
        let Some(renamed) = self.renamed(fqn) else {
            return Ok(visited);
        };
        Ok(Arc::new(Node::ClassDecl {
            base: base.clone(),
            modifiers: modifiers.clone(),
            name: name.clone(),
            extends: extends.clone(),
            implements: implements.clone(),
            body: body.clone(),
            class_type: Some(renamed),
        }))
    }
}
