//! Constructors for synthesized nodes.
//!
//! Every node built here gets a fresh [`NodeId`](super::node::NodeId), an empty
//! formatting prefix and no markers. Recipes that replace an existing node
//! usually want [`with_prefix_of`] so the printer keeps the original layout.

use std::sync::Arc;

use super::node::{
    BinaryOperator, LiteralValue, Modifier, Node, NodeBase, NodeVector, UnaryOperator,
};
use super::types::MethodType;

pub fn node_vector(nodes: Vec<Arc<Node>>) -> NodeVector {
    nodes.into_iter().collect()
}

/// Copies `donor`'s prefix onto `node`. Identity and markers of `node` are kept.
pub fn with_prefix_of(node: &Arc<Node>, donor: &Node) -> Arc<Node> {
    if node.prefix() == donor.prefix() {
        return Arc::clone(node);
    }
    Arc::new(node.with_prefix(donor.prefix().clone()))
}

pub fn compilation_unit(
    source_path: &str,
    package: Option<&str>,
    imports: Vec<Arc<Node>>,
    types: Vec<Arc<Node>>,
) -> Arc<Node> {
    Arc::new(Node::CompilationUnit {
        base: NodeBase::fresh(),
        source_path: source_path.to_string(),
        package: package.map(self::package),
        imports: node_vector(imports),
        types: node_vector(types),
    })
}

pub fn package(name: &str) -> Arc<Node> {
    Arc::new(Node::Package { base: NodeBase::fresh(), name: name.to_string() })
}

pub fn import(name: &str) -> Arc<Node> {
    Arc::new(Node::Import { base: NodeBase::fresh(), name: name.to_string(), is_static: false })
}

pub fn static_import(name: &str) -> Arc<Node> {
    Arc::new(Node::Import { base: NodeBase::fresh(), name: name.to_string(), is_static: true })
}

pub fn class_decl(
    modifiers: Vec<Modifier>,
    name: &str,
    extends: Option<Arc<Node>>,
    members: Vec<Arc<Node>>,
    class_type: Option<&str>,
) -> Arc<Node> {
    Arc::new(Node::ClassDecl {
        base: NodeBase::fresh(),
        modifiers,
        name: name.to_string(),
        extends,
        implements: node_vector(Vec::new()),
        body: block(members),
        class_type: class_type.map(str::to_string),
    })
}

pub fn method_decl(
    modifiers: Vec<Modifier>,
    return_type: Option<Arc<Node>>,
    name: &str,
    params: Vec<Arc<Node>>,
    body: Option<Arc<Node>>,
    method_type: Option<MethodType>,
) -> Arc<Node> {
    Arc::new(Node::MethodDecl {
        base: NodeBase::fresh(),
        modifiers,
        return_type,
        name: name.to_string(),
        params: node_vector(params),
        body,
        method_type: method_type.map(Arc::new),
    })
}

/// A field declaration with a single variable.
pub fn field(
    modifiers: Vec<Modifier>,
    type_expr: Arc<Node>,
    name: &str,
    initializer: Option<Arc<Node>>,
) -> Arc<Node> {
    Arc::new(Node::VariableDecls {
        base: NodeBase::fresh(),
        modifiers,
        type_expr: Some(type_expr),
        variables: node_vector(vec![named_variable(name, initializer)]),
    })
}

/// A local variable declaration. `type_expr` is `None` for `var x = ...`.
pub fn local_var(
    type_expr: Option<Arc<Node>>,
    name: &str,
    initializer: Option<Arc<Node>>,
) -> Arc<Node> {
    Arc::new(Node::VariableDecls {
        base: NodeBase::fresh(),
        modifiers: Vec::new(),
        type_expr,
        variables: node_vector(vec![named_variable(name, initializer)]),
    })
}

pub fn parameter(type_expr: Arc<Node>, name: &str) -> Arc<Node> {
    local_var(Some(type_expr), name, None)
}

pub fn named_variable(name: &str, initializer: Option<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::NamedVariable {
        base: NodeBase::fresh(),
        name: name.to_string(),
        initializer,
    })
}

pub fn block(statements: Vec<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::Block { base: NodeBase::fresh(), statements: node_vector(statements) })
}

pub fn if_stmt(
    condition: Arc<Node>,
    then_branch: Arc<Node>,
    else_branch: Option<Arc<Node>>,
) -> Arc<Node> {
    Arc::new(Node::If { base: NodeBase::fresh(), condition, then_branch, else_branch })
}

pub fn return_stmt(expr: Option<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::Return { base: NodeBase::fresh(), expr })
}

pub fn invocation(
    select: Option<Arc<Node>>,
    name: &str,
    args: Vec<Arc<Node>>,
    method_type: Option<MethodType>,
) -> Arc<Node> {
    Arc::new(Node::MethodInvocation {
        base: NodeBase::fresh(),
        select,
        name: name.to_string(),
        args: node_vector(args),
        method_type: method_type.map(Arc::new),
    })
}

pub fn new_class(
    class: Arc<Node>,
    args: Vec<Arc<Node>>,
    constructor_type: Option<MethodType>,
) -> Arc<Node> {
    Arc::new(Node::NewClass {
        base: NodeBase::fresh(),
        class,
        args: node_vector(args),
        constructor_type: constructor_type.map(Arc::new),
    })
}

pub fn field_access(target: Arc<Node>, name: &str) -> Arc<Node> {
    Arc::new(Node::FieldAccess { base: NodeBase::fresh(), target, name: name.to_string() })
}

pub fn identifier(name: &str) -> Arc<Node> {
    Arc::new(Node::Identifier { base: NodeBase::fresh(), name: name.to_string() })
}

pub fn literal(value: LiteralValue) -> Arc<Node> {
    Arc::new(Node::Literal { base: NodeBase::fresh(), value })
}

pub fn literal_int(value: i64) -> Arc<Node> {
    literal(LiteralValue::Int(value))
}

pub fn literal_bool(value: bool) -> Arc<Node> {
    literal(LiteralValue::Bool(value))
}

pub fn literal_str(value: &str) -> Arc<Node> {
    literal(LiteralValue::Str(value.to_string()))
}

pub fn parenthesized(expr: Arc<Node>) -> Arc<Node> {
    Arc::new(Node::Parenthesized { base: NodeBase::fresh(), expr })
}

pub fn unary(op: UnaryOperator, operand: Arc<Node>) -> Arc<Node> {
    Arc::new(Node::Unary { base: NodeBase::fresh(), op, operand })
}

pub fn binary(op: BinaryOperator, left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
    Arc::new(Node::Binary { base: NodeBase::fresh(), op, left, right })
}

pub fn assignment(target: Arc<Node>, value: Arc<Node>) -> Arc<Node> {
    Arc::new(Node::Assignment { base: NodeBase::fresh(), target, value })
}

pub fn type_ref(name: &str) -> Arc<Node> {
    Arc::new(Node::TypeRef { base: NodeBase::fresh(), name: name.to_string() })
}
