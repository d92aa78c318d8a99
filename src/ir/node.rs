use std::fmt;
use std::sync::Arc;

use archery::ArcK;
use rpds::Vector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::markers::{Marker, Markers};
use super::types::MethodType;

pub type NodeVector = Vector<Arc<Node>, ArcK>;

/// Stable identity of a node.
///
/// Assigned by the parser for nodes it produces and minted fresh for nodes the
/// engine synthesizes. Two structurally identical nodes with different ids are
/// different sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Mints a new, globally unique identity.
    pub fn fresh() -> Self {
        NodeId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        NodeId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Leading whitespace (and comments) before a node, as recorded by the parser.
/// The printer renders it verbatim; the engine only copies it around.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Space(String);

impl Space {
    pub const EMPTY: Space = Space(String::new());

    pub fn new(whitespace: impl Into<String>) -> Self {
        Space(whitespace.into())
    }

    /// A single space, the default prefix for synthesized tokens following another token.
    pub fn single() -> Self {
        Space(" ".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Data shared by every node: identity, formatting prefix and attached markers.
#[derive(Debug, Clone)]
pub struct NodeBase {
    id: NodeId,
    prefix: Space,
    markers: Arc<Markers>,
}

impl NodeBase {
    pub fn new(id: NodeId, prefix: Space, markers: Arc<Markers>) -> Self {
        NodeBase { id, prefix, markers }
    }

    /// Base for a synthesized node: fresh id, empty prefix, no markers.
    pub fn fresh() -> Self {
        NodeBase::new(NodeId::fresh(), Space::EMPTY, Markers::empty())
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &Space {
        &self.prefix
    }

    pub fn markers(&self) -> &Arc<Markers> {
        &self.markers
    }

    pub fn with_prefix(&self, prefix: Space) -> Self {
        NodeBase { prefix, ..self.clone() }
    }

    pub fn with_markers(&self, markers: Arc<Markers>) -> Self {
        NodeBase { markers, ..self.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Abstract => "abstract",
        }
    }

    pub fn is_visibility(&self) -> bool {
        matches!(self, Modifier::Public | Modifier::Protected | Modifier::Private)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Bool(bool),
    Str(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Neg,
}

/// Kind tag of a node, used for dispatch, slot checks and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    Package,
    Import,
    ClassDecl,
    MethodDecl,
    VariableDecls,
    NamedVariable,
    Block,
    If,
    Return,
    MethodInvocation,
    NewClass,
    FieldAccess,
    Identifier,
    Literal,
    Parenthesized,
    Unary,
    Binary,
    Assignment,
    TypeRef,
}

impl NodeKind {
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::MethodInvocation
                | NodeKind::NewClass
                | NodeKind::FieldAccess
                | NodeKind::Identifier
                | NodeKind::Literal
                | NodeKind::Parenthesized
                | NodeKind::Unary
                | NodeKind::Binary
                | NodeKind::Assignment
        )
    }

    pub fn is_statement(&self) -> bool {
        self.is_expression()
            || matches!(
                self,
                NodeKind::VariableDecls
                    | NodeKind::Block
                    | NodeKind::If
                    | NodeKind::Return
                    | NodeKind::ClassDecl
                    | NodeKind::MethodDecl
            )
    }

    pub fn is_type_tree(&self) -> bool {
        matches!(self, NodeKind::TypeRef | NodeKind::Identifier | NodeKind::FieldAccess)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Constraint a parent places on one of its child positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Expression,
    Statement,
    TypeTree,
    Block,
    TypeDecl,
    Import,
    Package,
    Variable,
    Parameter,
}

impl Slot {
    pub fn accepts(&self, kind: NodeKind) -> bool {
        match self {
            Slot::Expression => kind.is_expression(),
            Slot::Statement => kind.is_statement(),
            Slot::TypeTree => kind.is_type_tree(),
            Slot::Block => kind == NodeKind::Block,
            Slot::TypeDecl => kind == NodeKind::ClassDecl,
            Slot::Import => kind == NodeKind::Import,
            Slot::Package => kind == NodeKind::Package,
            Slot::Variable => kind == NodeKind::NamedVariable,
            Slot::Parameter => kind == NodeKind::VariableDecls,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A syntax tree node. Children are `Arc`-shared so that rewriting one site
/// rebuilds only the spine from that site to the root.
#[derive(Debug, Clone)]
pub enum Node {
    /// One source file.
    CompilationUnit {
        base: NodeBase,
        source_path: String,
        package: Option<Arc<Node>>,
        imports: NodeVector,
        types: NodeVector,
    },
    /// `package com.example;`
    Package { base: NodeBase, name: String },
    /// `import java.util.List;` or `import static org.junit.Assert.assertEquals;`
    Import { base: NodeBase, name: String, is_static: bool },
    /// Class declaration. `body` is a `Block` whose statements are members.
    ClassDecl {
        base: NodeBase,
        modifiers: Vec<Modifier>,
        name: String,
        extends: Option<Arc<Node>>,
        implements: NodeVector,
        body: Arc<Node>,
        /// Fully qualified name from type attribution, if available.
        class_type: Option<String>,
    },
    MethodDecl {
        base: NodeBase,
        modifiers: Vec<Modifier>,
        return_type: Option<Arc<Node>>,
        name: String,
        params: NodeVector,
        body: Option<Arc<Node>>,
        method_type: Option<Arc<MethodType>>,
    },
    /// Field, local variable or parameter declaration (`int a = 1, b;`).
    VariableDecls {
        base: NodeBase,
        modifiers: Vec<Modifier>,
        type_expr: Option<Arc<Node>>,
        variables: NodeVector,
    },
    NamedVariable {
        base: NodeBase,
        name: String,
        initializer: Option<Arc<Node>>,
    },
    Block { base: NodeBase, statements: NodeVector },
    If {
        base: NodeBase,
        condition: Arc<Node>,
        then_branch: Arc<Node>,
        else_branch: Option<Arc<Node>>,
    },
    Return { base: NodeBase, expr: Option<Arc<Node>> },
    MethodInvocation {
        base: NodeBase,
        select: Option<Arc<Node>>,
        name: String,
        args: NodeVector,
        method_type: Option<Arc<MethodType>>,
    },
    NewClass {
        base: NodeBase,
        class: Arc<Node>,
        args: NodeVector,
        constructor_type: Option<Arc<MethodType>>,
    },
    /// `target.name`
    FieldAccess { base: NodeBase, target: Arc<Node>, name: String },
    Identifier { base: NodeBase, name: String },
    Literal { base: NodeBase, value: LiteralValue },
    Parenthesized { base: NodeBase, expr: Arc<Node> },
    Unary { base: NodeBase, op: UnaryOperator, operand: Arc<Node> },
    Binary {
        base: NodeBase,
        op: BinaryOperator,
        left: Arc<Node>,
        right: Arc<Node>,
    },
    Assignment { base: NodeBase, target: Arc<Node>, value: Arc<Node> },
    /// A (possibly qualified) type name used in type position.
    TypeRef { base: NodeBase, name: String },
}

impl Node {
    pub fn base(&self) -> &NodeBase {
        match self {
            Node::CompilationUnit { base, .. }
            | Node::Package { base, .. }
            | Node::Import { base, .. }
            | Node::ClassDecl { base, .. }
            | Node::MethodDecl { base, .. }
            | Node::VariableDecls { base, .. }
            | Node::NamedVariable { base, .. }
            | Node::Block { base, .. }
            | Node::If { base, .. }
            | Node::Return { base, .. }
            | Node::MethodInvocation { base, .. }
            | Node::NewClass { base, .. }
            | Node::FieldAccess { base, .. }
            | Node::Identifier { base, .. }
            | Node::Literal { base, .. }
            | Node::Parenthesized { base, .. }
            | Node::Unary { base, .. }
            | Node::Binary { base, .. }
            | Node::Assignment { base, .. }
            | Node::TypeRef { base, .. } => base,
        }
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        match self {
            Node::CompilationUnit { base, .. }
            | Node::Package { base, .. }
            | Node::Import { base, .. }
            | Node::ClassDecl { base, .. }
            | Node::MethodDecl { base, .. }
            | Node::VariableDecls { base, .. }
            | Node::NamedVariable { base, .. }
            | Node::Block { base, .. }
            | Node::If { base, .. }
            | Node::Return { base, .. }
            | Node::MethodInvocation { base, .. }
            | Node::NewClass { base, .. }
            | Node::FieldAccess { base, .. }
            | Node::Identifier { base, .. }
            | Node::Literal { base, .. }
            | Node::Parenthesized { base, .. }
            | Node::Unary { base, .. }
            | Node::Binary { base, .. }
            | Node::Assignment { base, .. }
            | Node::TypeRef { base, .. } => base,
        }
    }

    pub fn id(&self) -> NodeId {
        self.base().id()
    }

    pub fn prefix(&self) -> &Space {
        self.base().prefix()
    }

    pub fn markers(&self) -> &Arc<Markers> {
        self.base().markers()
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::CompilationUnit { .. } => NodeKind::CompilationUnit,
            Node::Package { .. } => NodeKind::Package,
            Node::Import { .. } => NodeKind::Import,
            Node::ClassDecl { .. } => NodeKind::ClassDecl,
            Node::MethodDecl { .. } => NodeKind::MethodDecl,
            Node::VariableDecls { .. } => NodeKind::VariableDecls,
            Node::NamedVariable { .. } => NodeKind::NamedVariable,
            Node::Block { .. } => NodeKind::Block,
            Node::If { .. } => NodeKind::If,
            Node::Return { .. } => NodeKind::Return,
            Node::MethodInvocation { .. } => NodeKind::MethodInvocation,
            Node::NewClass { .. } => NodeKind::NewClass,
            Node::FieldAccess { .. } => NodeKind::FieldAccess,
            Node::Identifier { .. } => NodeKind::Identifier,
            Node::Literal { .. } => NodeKind::Literal,
            Node::Parenthesized { .. } => NodeKind::Parenthesized,
            Node::Unary { .. } => NodeKind::Unary,
            Node::Binary { .. } => NodeKind::Binary,
            Node::Assignment { .. } => NodeKind::Assignment,
            Node::TypeRef { .. } => NodeKind::TypeRef,
        }
    }

    /// Returns a copy of this node with its base replaced. Children stay shared.
    pub fn with_base(&self, base: NodeBase) -> Node {
        let mut node = self.clone();
        *node.base_mut() = base;
        node
    }

    /// Returns a copy with the given formatting prefix.
    pub fn with_prefix(&self, prefix: Space) -> Node {
        self.with_base(self.base().with_prefix(prefix))
    }

    /// Replaces the marker set, returning `self` unchanged when the set is the same `Arc`.
    pub fn with_markers(self: &Arc<Self>, markers: Arc<Markers>) -> Arc<Node> {
        if Arc::ptr_eq(self.markers(), &markers) {
            return Arc::clone(self);
        }
        Arc::new(self.with_base(self.base().with_markers(markers)))
    }

    /// Attaches `marker` unless an equal one is already present.
    pub fn with_marker(self: &Arc<Self>, marker: Marker) -> Arc<Node> {
        let markers = Markers::add_if_absent(self.markers(), marker);
        self.with_markers(markers)
    }

    /// Resolved signature for invocations, constructor calls and method declarations.
    pub fn method_type(&self) -> Option<&Arc<MethodType>> {
        match self {
            Node::MethodInvocation { method_type, .. } | Node::MethodDecl { method_type, .. } => {
                method_type.as_ref()
            }
            Node::NewClass { constructor_type, .. } => constructor_type.as_ref(),
            _ => None,
        }
    }

    /// Simple name of declarations and references that have one.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Node::ClassDecl { name, .. }
            | Node::MethodDecl { name, .. }
            | Node::NamedVariable { name, .. }
            | Node::MethodInvocation { name, .. }
            | Node::FieldAccess { name, .. }
            | Node::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        match self {
            Node::ClassDecl { modifiers, .. }
            | Node::MethodDecl { modifiers, .. }
            | Node::VariableDecls { modifiers, .. } => modifiers,
            _ => &[],
        }
    }

    /// Direct children in source order. Absent optional children are skipped.
    pub fn children(&self) -> Vec<&Arc<Node>> {
        let mut out = Vec::new();
        match self {
            Node::CompilationUnit { package, imports, types, .. } => {
                out.extend(package.iter());
                out.extend(imports.iter());
                out.extend(types.iter());
            }
            Node::ClassDecl { extends, implements, body, .. } => {
                out.extend(extends.iter());
                out.extend(implements.iter());
                out.push(body);
            }
            Node::MethodDecl { return_type, params, body, .. } => {
                out.extend(return_type.iter());
                out.extend(params.iter());
                out.extend(body.iter());
            }
            Node::VariableDecls { type_expr, variables, .. } => {
                out.extend(type_expr.iter());
                out.extend(variables.iter());
            }
            Node::NamedVariable { initializer, .. } => out.extend(initializer.iter()),
            Node::Block { statements, .. } => out.extend(statements.iter()),
            Node::If { condition, then_branch, else_branch, .. } => {
                out.push(condition);
                out.push(then_branch);
                out.extend(else_branch.iter());
            }
            Node::Return { expr, .. } => out.extend(expr.iter()),
            Node::MethodInvocation { select, args, .. } => {
                out.extend(select.iter());
                out.extend(args.iter());
            }
            Node::NewClass { class, args, .. } => {
                out.push(class);
                out.extend(args.iter());
            }
            Node::FieldAccess { target, .. } => out.push(target),
            Node::Parenthesized { expr, .. } => out.push(expr),
            Node::Unary { operand, .. } => out.push(operand),
            Node::Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            Node::Assignment { target, value, .. } => {
                out.push(target);
                out.push(value);
            }
            Node::Package { .. }
            | Node::Import { .. }
            | Node::Identifier { .. }
            | Node::Literal { .. }
            | Node::TypeRef { .. } => {}
        }
        out
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn descendants(self: &Arc<Self>) -> Descendants {
        Descendants { stack: vec![Arc::clone(self)] }
    }

    /// True if this node or any descendant satisfies `pred`. Stops at the first hit.
    pub fn any(self: &Arc<Self>, mut pred: impl FnMut(&Node) -> bool) -> bool {
        self.descendants().any(|n| pred(n.as_ref()))
    }

    /// Collects every marker in the tree along with the id of the node carrying it.
    pub fn collect_markers(self: &Arc<Self>) -> Vec<(NodeId, Arc<Marker>)> {
        self.descendants()
            .flat_map(|n| {
                let id = n.id();
                n.markers().iter().map(move |m| (id, Arc::clone(m))).collect::<Vec<_>>()
            })
            .collect()
    }

    /// Does this node introduce a binding named `name` for its descendants?
    ///
    /// Blocks bind their local variable declarations, methods bind their
    /// parameters, classes bind their fields.
    pub fn declares_name(&self, name: &str) -> bool {
        let binds = |decls: &Arc<Node>| match &**decls {
            Node::VariableDecls { variables, .. } => {
                variables.iter().any(|v| v.simple_name() == Some(name))
            }
            _ => false,
        };
        match self {
            Node::Block { statements, .. } => statements.iter().any(binds),
            Node::MethodDecl { params, .. } => params.iter().any(binds),
            Node::ClassDecl { body, .. } => match &**body {
                Node::Block { statements, .. } => statements.iter().any(binds),
                _ => false,
            },
            _ => false,
        }
    }
}

/// See [`Node::descendants`].
pub struct Descendants {
    stack: Vec<Arc<Node>>,
}

impl Iterator for Descendants {
    type Item = Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        for child in node.children().into_iter().rev() {
            self.stack.push(Arc::clone(child));
        }
        Some(node)
    }
}
