//! Hand-built trees shared by the integration tests.

use std::sync::Arc;

use syntax_rewrite::ir::builder::*;
use syntax_rewrite::ir::node::{BinaryOperator, Modifier, Node, NodeId};
use syntax_rewrite::ir::types::{ClassType, MethodType, TypeTable};

/// ```java
/// package com.example;
/// class Holder {
///     public int a;
///     private int b;
/// }
/// ```
pub struct FieldsFixture {
    pub tree: Arc<Node>,
    pub field_a: Arc<Node>,
    pub field_b: Arc<Node>,
}

pub fn class_with_fields() -> FieldsFixture {
    let field_a = field(vec![Modifier::Public], type_ref("int"), "a", None);
    let field_b = field(vec![Modifier::Private], type_ref("int"), "b", None);
    let class = class_decl(
        Vec::new(),
        "Holder",
        None,
        vec![Arc::clone(&field_a), Arc::clone(&field_b)],
        Some("com.example.Holder"),
    );
    let tree = compilation_unit("Holder.java", Some("com.example"), Vec::new(), vec![class]);
    FieldsFixture { tree, field_a, field_b }
}

/// ```java
/// void run(Point obj) {
///     { int x = 1; x = x + 1; obj.x = x; }
///     { int x = 2; foo(x); }
/// }
/// ```
///
/// `target` is the first block's `x`.
pub struct ScopesFixture {
    pub tree: Arc<Node>,
    pub target: NodeId,
    pub first_block: Arc<Node>,
    pub second_block: Arc<Node>,
}

pub fn sibling_scopes() -> ScopesFixture {
    let first_decl = local_var(Some(type_ref("int")), "x", Some(literal_int(1)));
    let target = match &*first_decl {
        Node::VariableDecls { variables, .. } => variables[0].id(),
        _ => unreachable!("local_var builds VariableDecls"),
    };
    let first_block = block(vec![
        first_decl,
        assignment(identifier("x"), binary(BinaryOperator::Add, identifier("x"), literal_int(1))),
        assignment(field_access(identifier("obj"), "x"), identifier("x")),
    ]);
    let second_block = block(vec![
        local_var(Some(type_ref("int")), "x", Some(literal_int(2))),
        invocation(None, "foo", vec![identifier("x")], None),
    ]);
    let body = block(vec![Arc::clone(&first_block), Arc::clone(&second_block)]);
    let method = method_decl(
        Vec::new(),
        None,
        "run",
        vec![parameter(type_ref("Point"), "obj")],
        Some(body),
        None,
    );
    let class = class_decl(Vec::new(), "Runner", None, vec![method], Some("com.example.Runner"));
    let tree = compilation_unit("Runner.java", Some("com.example"), Vec::new(), vec![class]);
    ScopesFixture { tree, target, first_block, second_block }
}

/// `com.example.Base` declares `foo(int)`, `Mid extends Base`,
/// `Leaf extends Mid` overrides `foo(int)`.
pub fn base_mid_leaf() -> TypeTable {
    vec![
        ClassType::new("com.example.Base").declares("foo", &["int"]),
        ClassType::new("com.example.Mid").extends("com.example.Base"),
        ClassType::new("com.example.Leaf")
            .extends("com.example.Mid")
            .declares("foo", &["int"]),
    ]
    .into_iter()
    .collect()
}

pub fn method_type(declaring: &str, name: &str, params: &[&str]) -> MethodType {
    MethodType::new(declaring, name, params.iter().map(|p| p.to_string()).collect(), None)
}

/// A class with one method whose body calls `leaf.foo(1)` and `leaf.bar()`,
/// both attributed to `com.example.Leaf`.
pub fn leaf_calls() -> Arc<Node> {
    let foo = invocation(
        Some(identifier("leaf")),
        "foo",
        vec![literal_int(1)],
        Some(method_type("com.example.Leaf", "foo", &["int"])),
    );
    let bar = invocation(
        Some(identifier("leaf")),
        "bar",
        Vec::new(),
        Some(method_type("com.example.Leaf", "bar", &[])),
    );
    let body = block(vec![foo, bar]);
    let method = method_decl(Vec::new(), None, "main", Vec::new(), Some(body), None);
    let class = class_decl(Vec::new(), "App", None, vec![method], Some("com.example.App"));
    compilation_unit("App.java", Some("com.example"), Vec::new(), vec![class])
}
