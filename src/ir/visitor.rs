use std::sync::Arc;

use tracing::trace;

use crate::error::{RewriteError, VisitResult};

use super::context::VisitContext;
use super::node::{Node, NodeKind, NodeVector, Slot};

/// Provides a visitor pattern for traversing and transforming the syntax tree.
///
/// Every node kind has a `visit_<kind>` method whose default delegates to the
/// matching `walk_<kind>` function: visit each child, and if every child came
/// back as the same `Arc`, return the original node; otherwise rebuild the node
/// with the new children, keeping its identity, prefix and markers.
///
/// An override is not descended into automatically. Return a new node to
/// "handle and stop", or call the `walk_<kind>` function (before or after the
/// edit) to "handle and continue".
///
/// Visitors hold no per-traversal state. Anything a traversal needs to
/// remember goes in the [`VisitContext`].
pub trait TreeVisitor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Entry point for visiting a node. Pushes a cursor frame, dispatches on
    /// the node kind and runs visitors deferred with `do_after_visit`.
    /// Implementors typically do not override this method.
    fn visit(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        dispatch(self, node, ctx)
    }

    fn visit_compilation_unit(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_compilation_unit(self, node, ctx)
    }

    fn visit_package(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        Ok(Arc::clone(node))
    }

    fn visit_import(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        Ok(Arc::clone(node))
    }

    fn visit_class_decl(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_class_decl(self, node, ctx)
    }

    fn visit_method_decl(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_method_decl(self, node, ctx)
    }

    fn visit_variable_decls(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_variable_decls(self, node, ctx)
    }

    fn visit_named_variable(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_named_variable(self, node, ctx)
    }

    fn visit_block(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_block(self, node, ctx)
    }

    fn visit_if(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_if(self, node, ctx)
    }

    fn visit_return(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_return(self, node, ctx)
    }

    fn visit_method_invocation(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_method_invocation(self, node, ctx)
    }

    fn visit_new_class(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_new_class(self, node, ctx)
    }

    fn visit_field_access(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_field_access(self, node, ctx)
    }

    fn visit_identifier(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        Ok(Arc::clone(node))
    }

    fn visit_literal(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        Ok(Arc::clone(node))
    }

    fn visit_parenthesized(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_parenthesized(self, node, ctx)
    }

    fn visit_unary(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_unary(self, node, ctx)
    }

    fn visit_binary(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_binary(self, node, ctx)
    }

    fn visit_assignment(&self, node: &Arc<Node>, ctx: &mut VisitContext) -> VisitResult {
        walk_assignment(self, node, ctx)
    }

    fn visit_type_ref(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        Ok(Arc::clone(node))
    }
}

/// Double dispatch on the node kind, bracketed by cursor bookkeeping.
///
/// Visitors queued with [`VisitContext::do_after_visit`] while this node was
/// being visited run on the result, in FIFO order, with the cursor back at the
/// parent. Each of them is itself dispatched, so anything they defer is drained
/// before they return.
pub fn dispatch<V: TreeVisitor + ?Sized>(
    visitor: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    ctx.enter(node);
    let visited = match node.kind() {
        NodeKind::CompilationUnit => visitor.visit_compilation_unit(node, ctx),
        NodeKind::Package => visitor.visit_package(node, ctx),
        NodeKind::Import => visitor.visit_import(node, ctx),
        NodeKind::ClassDecl => visitor.visit_class_decl(node, ctx),
        NodeKind::MethodDecl => visitor.visit_method_decl(node, ctx),
        NodeKind::VariableDecls => visitor.visit_variable_decls(node, ctx),
        NodeKind::NamedVariable => visitor.visit_named_variable(node, ctx),
        NodeKind::Block => visitor.visit_block(node, ctx),
        NodeKind::If => visitor.visit_if(node, ctx),
        NodeKind::Return => visitor.visit_return(node, ctx),
        NodeKind::MethodInvocation => visitor.visit_method_invocation(node, ctx),
        NodeKind::NewClass => visitor.visit_new_class(node, ctx),
        NodeKind::FieldAccess => visitor.visit_field_access(node, ctx),
        NodeKind::Identifier => visitor.visit_identifier(node, ctx),
        NodeKind::Literal => visitor.visit_literal(node, ctx),
        NodeKind::Parenthesized => visitor.visit_parenthesized(node, ctx),
        NodeKind::Unary => visitor.visit_unary(node, ctx),
        NodeKind::Binary => visitor.visit_binary(node, ctx),
        NodeKind::Assignment => visitor.visit_assignment(node, ctx),
        NodeKind::TypeRef => visitor.visit_type_ref(node, ctx),
    };
    let mut deferred = ctx.exit();
    let mut current = visited?;
    while let Some(after) = deferred.pop_front() {
        trace!(
            "Running deferred visitor '{}' on {} {}",
            after.name(),
            current.kind(),
            current.id()
        );
        current = after.visit(&current, ctx)?;
    }
    Ok(current)
}

/// Tracks whether any child of the node being walked was replaced, and
/// enforces the parent's slot constraints on replacements.
struct Rebuild<'v, V: ?Sized> {
    visitor: &'v V,
    parent: NodeKind,
    changed: bool,
}

impl<'v, V: TreeVisitor + ?Sized> Rebuild<'v, V> {
    fn new(visitor: &'v V, parent: NodeKind) -> Self {
        Rebuild { visitor, parent, changed: false }
    }

    fn one(&mut self, child: &Arc<Node>, slot: Slot, ctx: &mut VisitContext) -> VisitResult {
        let visited = self.visitor.visit(child, ctx)?;
        if !Arc::ptr_eq(child, &visited) {
            if !slot.accepts(visited.kind()) {
                return Err(RewriteError::InvalidReplacement {
                    parent: self.parent,
                    slot,
                    found: visited.kind(),
                });
            }
            self.changed = true;
        }
        Ok(visited)
    }

    fn opt(
        &mut self,
        child: &Option<Arc<Node>>,
        slot: Slot,
        ctx: &mut VisitContext,
    ) -> Result<Option<Arc<Node>>, RewriteError> {
        match child {
            Some(child) => self.one(child, slot, ctx).map(Some),
            None => Ok(None),
        }
    }

    fn many(
        &mut self,
        children: &NodeVector,
        slot: Slot,
        ctx: &mut VisitContext,
    ) -> Result<NodeVector, RewriteError> {
        let mut any_changed = false;
        let mut visited = Vec::with_capacity(children.len());
        for child in children.iter() {
            let new_child = self.one(child, slot, ctx)?;
            any_changed |= !Arc::ptr_eq(child, &new_child);
            visited.push(new_child);
        }
        if any_changed {
            Ok(visited.into_iter().collect())
        } else {
            Ok(children.clone())
        }
    }

    fn finish(self, original: &Arc<Node>, rebuild: impl FnOnce() -> Node) -> VisitResult {
        if self.changed {
            Ok(Arc::new(rebuild()))
        } else {
            Ok(Arc::clone(original))
        }
    }
}

fn unexpected(expected: NodeKind, found: &Node) -> RewriteError {
    RewriteError::UnexpectedNode { expected, found: found.kind() }
}

pub fn walk_compilation_unit<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::CompilationUnit { base, source_path, package, imports, types } = &**node else {
        return Err(unexpected(NodeKind::CompilationUnit, node));
    };
    let mut r = Rebuild::new(v, NodeKind::CompilationUnit);
    let package = r.opt(package, Slot::Package, ctx)?;
    let imports = r.many(imports, Slot::Import, ctx)?;
    let types = r.many(types, Slot::TypeDecl, ctx)?;
    r.finish(node, || Node::CompilationUnit {
        base: base.clone(),
        source_path: source_path.clone(),
        package,
        imports,
        types,
    })
}

pub fn walk_class_decl<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::ClassDecl { base, modifiers, name, extends, implements, body, class_type } = &**node
    else {
        return Err(unexpected(NodeKind::ClassDecl, node));
    };
    let mut r = Rebuild::new(v, NodeKind::ClassDecl);
    let extends = r.opt(extends, Slot::TypeTree, ctx)?;
    let implements = r.many(implements, Slot::TypeTree, ctx)?;
    let body = r.one(body, Slot::Block, ctx)?;
    r.finish(node, || Node::ClassDecl {
        base: base.clone(),
        modifiers: modifiers.clone(),
        name: name.clone(),
        extends,
        implements,
        body,
        class_type: class_type.clone(),
    })
}

pub fn walk_method_decl<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::MethodDecl { base, modifiers, return_type, name, params, body, method_type } = &**node
    else {
        return Err(unexpected(NodeKind::MethodDecl, node));
    };
    let mut r = Rebuild::new(v, NodeKind::MethodDecl);
    let return_type = r.opt(return_type, Slot::TypeTree, ctx)?;
    let params = r.many(params, Slot::Parameter, ctx)?;
    let body = r.opt(body, Slot::Block, ctx)?;
    r.finish(node, || Node::MethodDecl {
        base: base.clone(),
        modifiers: modifiers.clone(),
        return_type,
        name: name.clone(),
        params,
        body,
        method_type: method_type.clone(),
    })
}

pub fn walk_variable_decls<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::VariableDecls { base, modifiers, type_expr, variables } = &**node else {
        return Err(unexpected(NodeKind::VariableDecls, node));
    };
    let mut r = Rebuild::new(v, NodeKind::VariableDecls);
    let type_expr = r.opt(type_expr, Slot::TypeTree, ctx)?;
    let variables = r.many(variables, Slot::Variable, ctx)?;
    r.finish(node, || Node::VariableDecls {
        base: base.clone(),
        modifiers: modifiers.clone(),
        type_expr,
        variables,
    })
}

pub fn walk_named_variable<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::NamedVariable { base, name, initializer } = &**node else {
        return Err(unexpected(NodeKind::NamedVariable, node));
    };
    let mut r = Rebuild::new(v, NodeKind::NamedVariable);
    let initializer = r.opt(initializer, Slot::Expression, ctx)?;
    r.finish(node, || Node::NamedVariable { base: base.clone(), name: name.clone(), initializer })
}

pub fn walk_block<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::Block { base, statements } = &**node else {
        return Err(unexpected(NodeKind::Block, node));
    };
    let mut r = Rebuild::new(v, NodeKind::Block);
    let statements = r.many(statements, Slot::Statement, ctx)?;
    r.finish(node, || Node::Block { base: base.clone(), statements })
}

pub fn walk_if<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::If { base, condition, then_branch, else_branch } = &**node else {
        return Err(unexpected(NodeKind::If, node));
    };
    let mut r = Rebuild::new(v, NodeKind::If);
    let condition = r.one(condition, Slot::Expression, ctx)?;
    let then_branch = r.one(then_branch, Slot::Statement, ctx)?;
    let else_branch = r.opt(else_branch, Slot::Statement, ctx)?;
    r.finish(node, || Node::If { base: base.clone(), condition, then_branch, else_branch })
}

pub fn walk_return<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::Return { base, expr } = &**node else {
        return Err(unexpected(NodeKind::Return, node));
    };
    let mut r = Rebuild::new(v, NodeKind::Return);
    let expr = r.opt(expr, Slot::Expression, ctx)?;
    r.finish(node, || Node::Return { base: base.clone(), expr })
}

pub fn walk_method_invocation<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::MethodInvocation { base, select, name, args, method_type } = &**node else {
        return Err(unexpected(NodeKind::MethodInvocation, node));
    };
    let mut r = Rebuild::new(v, NodeKind::MethodInvocation);
    let select = r.opt(select, Slot::Expression, ctx)?;
    let args = r.many(args, Slot::Expression, ctx)?;
    r.finish(node, || Node::MethodInvocation {
        base: base.clone(),
        select,
        name: name.clone(),
        args,
        method_type: method_type.clone(),
    })
}

pub fn walk_new_class<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::NewClass { base, class, args, constructor_type } = &**node else {
        return Err(unexpected(NodeKind::NewClass, node));
    };
    let mut r = Rebuild::new(v, NodeKind::NewClass);
    let class = r.one(class, Slot::TypeTree, ctx)?;
    let args = r.many(args, Slot::Expression, ctx)?;
    r.finish(node, || Node::NewClass {
        base: base.clone(),
        class,
        args,
        constructor_type: constructor_type.clone(),
    })
}

pub fn walk_field_access<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::FieldAccess { base, target, name } = &**node else {
        return Err(unexpected(NodeKind::FieldAccess, node));
    };
    let mut r = Rebuild::new(v, NodeKind::FieldAccess);
    let target = r.one(target, Slot::Expression, ctx)?;
    r.finish(node, || Node::FieldAccess { base: base.clone(), target, name: name.clone() })
}

pub fn walk_parenthesized<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::Parenthesized { base, expr } = &**node else {
        return Err(unexpected(NodeKind::Parenthesized, node));
    };
    let mut r = Rebuild::new(v, NodeKind::Parenthesized);
    let expr = r.one(expr, Slot::Expression, ctx)?;
    r.finish(node, || Node::Parenthesized { base: base.clone(), expr })
}

pub fn walk_unary<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::Unary { base, op, operand } = &**node else {
        return Err(unexpected(NodeKind::Unary, node));
    };
    let mut r = Rebuild::new(v, NodeKind::Unary);
    let operand = r.one(operand, Slot::Expression, ctx)?;
    r.finish(node, || Node::Unary { base: base.clone(), op: *op, operand })
}

pub fn walk_binary<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::Binary { base, op, left, right } = &**node else {
        return Err(unexpected(NodeKind::Binary, node));
    };
    let mut r = Rebuild::new(v, NodeKind::Binary);
    let left = r.one(left, Slot::Expression, ctx)?;
    let right = r.one(right, Slot::Expression, ctx)?;
    r.finish(node, || Node::Binary { base: base.clone(), op: *op, left, right })
}

pub fn walk_assignment<V: TreeVisitor + ?Sized>(
    v: &V,
    node: &Arc<Node>,
    ctx: &mut VisitContext,
) -> VisitResult {
    let Node::Assignment { base, target, value } = &**node else {
        return Err(unexpected(NodeKind::Assignment, node));
    };
    let mut r = Rebuild::new(v, NodeKind::Assignment);
    let target = r.one(target, Slot::Expression, ctx)?;
    let value = r.one(value, Slot::Expression, ctx)?;
    r.finish(node, || Node::Assignment { base: base.clone(), target, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;
    use crate::ir::node::{BinaryOperator, LiteralValue};

    // Preserves every node
    struct IdentityVisitor;

    impl TreeVisitor for IdentityVisitor {}

    // Replaces every integer literal with its double
    struct DoubleInts;

    impl TreeVisitor for DoubleInts {
        fn visit_literal(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
            match &**node {
                Node::Literal { base, value: LiteralValue::Int(i) } => Ok(Arc::new(Node::Literal {
                    base: base.clone(),
                    value: LiteralValue::Int(i * 2),
                })),
                _ => Ok(Arc::clone(node)),
            }
        }
    }

    // Turns every identifier into a block, which no expression slot accepts
    struct IdentToBlock;

    impl TreeVisitor for IdentToBlock {
        fn visit_identifier(&self, _node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
            Ok(block(vec![]))
        }
    }

    fn sample() -> Arc<Node> {
        let sum = binary(BinaryOperator::Add, identifier("a"), literal_int(2));
        let body = block(vec![local_var(Some(type_ref("int")), "b", Some(sum)), return_stmt(None)]);
        let method = method_decl(vec![], None, "m", vec![], Some(body), None);
        class_decl(vec![], "A", None, vec![method], None)
    }

    #[test]
    fn test_identity_visitor_preserves_root() {
        let tree = sample();
        let mut ctx = VisitContext::detached("identity");
        let result = IdentityVisitor.visit(&tree, &mut ctx).unwrap();
        assert!(Arc::ptr_eq(&tree, &result));
        assert_eq!(ctx.nodes_visited(), tree.descendants().count());
        assert!(ctx.cursor().is_root());
    }

    #[test]
    fn test_rebuild_keeps_identity_and_shares_untouched_siblings() {
        let tree = sample();
        let mut ctx = VisitContext::detached("double");
        let result = DoubleInts.visit(&tree, &mut ctx).unwrap();
        assert!(!Arc::ptr_eq(&tree, &result));
        assert_eq!(tree.id(), result.id());

        let literal = result
            .descendants()
            .find(|n| n.kind() == NodeKind::Literal)
            .unwrap();
        assert!(matches!(&*literal, Node::Literal { value: LiteralValue::Int(4), .. }));

        // the return statement was not touched and is shared between both trees
        let old_return = tree.descendants().find(|n| n.kind() == NodeKind::Return).unwrap();
        let new_return = result.descendants().find(|n| n.kind() == NodeKind::Return).unwrap();
        assert!(Arc::ptr_eq(&old_return, &new_return));
    }

    #[test]
    fn test_slot_violation_is_reported() {
        let tree = sample();
        let mut ctx = VisitContext::detached("bad");
        let err = IdentToBlock.visit(&tree, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            RewriteError::InvalidReplacement {
                parent: NodeKind::Binary,
                slot: Slot::Expression,
                found: NodeKind::Block,
            }
        );
    }

    #[test]
    fn test_walk_rejects_wrong_kind() {
        let mut ctx = VisitContext::detached("walk");
        let err = walk_block(&IdentityVisitor, &identifier("x"), &mut ctx).unwrap_err();
        assert!(matches!(err, RewriteError::UnexpectedNode { expected: NodeKind::Block, .. }));
    }
}
