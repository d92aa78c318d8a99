//! Random syntax trees for property-based testing.
//!
//! Trees are shaped like real compilation units: a package, a few imports and
//! classes whose bodies hold fields and methods with statement blocks.
//! Expressions and statements are generated with a depth budget so that trees
//! stay small enough for quickcheck to shrink through and to keep recursion
//! bounded. Invocations carry resolved method types so matchers have
//! something to look at.

use std::sync::Arc;

use quickcheck::{Arbitrary, Gen};
use syntax_rewrite::ir::builder::*;
use syntax_rewrite::ir::node::{BinaryOperator, Modifier, Node, UnaryOperator};
use syntax_rewrite::ir::types::MethodType;

const NAMES: &[&str] = &["a", "b", "x", "y", "count", "obj", "result"];
const METHODS: &[&str] = &["foo", "bar", "process", "get", "size"];
const TYPES: &[&str] = &["int", "boolean", "java.lang.String", "java.util.List"];
const DECLARING: &[&str] = &["com.example.Service", "com.example.Base", "java.util.List"];
const BINARY_OPS: &[BinaryOperator] = &[
    BinaryOperator::Add,
    BinaryOperator::Sub,
    BinaryOperator::Mul,
    BinaryOperator::Div,
    BinaryOperator::Eq,
    BinaryOperator::Ne,
    BinaryOperator::Lt,
    BinaryOperator::Gt,
    BinaryOperator::And,
    BinaryOperator::Or,
];

fn pick<T: Copy>(g: &mut Gen, items: &[T]) -> T {
    items[usize::arbitrary(g) % items.len()]
}

fn below(g: &mut Gen, n: usize) -> usize {
    usize::arbitrary(g) % n
}

fn gen_method_type(g: &mut Gen, name: &str, arity: usize) -> MethodType {
    let params = (0..arity).map(|_| pick(g, TYPES).to_string()).collect();
    MethodType::new(pick(g, DECLARING), name, params, None)
}

pub fn gen_expression(g: &mut Gen, depth: usize) -> Arc<Node> {
    if depth == 0 {
        return match below(g, 4) {
            0 => identifier(pick(g, NAMES)),
            1 => literal_int(i64::from(i16::arbitrary(g))),
            2 => literal_bool(bool::arbitrary(g)),
            _ => literal_str(pick(g, NAMES)),
        };
    }
    match below(g, 7) {
        0 => {
            let op = pick(g, BINARY_OPS);
            binary(op, gen_expression(g, depth - 1), gen_expression(g, depth - 1))
        }
        1 => {
            let op = if bool::arbitrary(g) { UnaryOperator::Not } else { UnaryOperator::Neg };
            unary(op, gen_expression(g, depth - 1))
        }
        2 => parenthesized(gen_expression(g, depth - 1)),
        3 => {
            let name = pick(g, METHODS);
            let args: Vec<_> = (0..below(g, 3)).map(|_| gen_expression(g, depth - 1)).collect();
            let select = bool::arbitrary(g).then(|| identifier(pick(g, NAMES)));
            let method_type = gen_method_type(g, name, args.len());
            invocation(select, name, args, Some(method_type))
        }
        4 => field_access(gen_expression(g, depth - 1), pick(g, NAMES)),
        5 => assignment(identifier(pick(g, NAMES)), gen_expression(g, depth - 1)),
        _ => gen_expression(g, 0),
    }
}

pub fn gen_statement(g: &mut Gen, depth: usize) -> Arc<Node> {
    if depth == 0 {
        let name = pick(g, NAMES);
        return local_var(Some(type_ref(pick(g, TYPES))), name, Some(gen_expression(g, 0)));
    }
    match below(g, 5) {
        0 => local_var(
            Some(type_ref(pick(g, TYPES))),
            pick(g, NAMES),
            Some(gen_expression(g, depth - 1)),
        ),
        1 => {
            let else_branch = bool::arbitrary(g).then(|| gen_block(g, depth - 1));
            if_stmt(gen_expression(g, depth - 1), gen_block(g, depth - 1), else_branch)
        }
        2 => return_stmt(bool::arbitrary(g).then(|| gen_expression(g, depth - 1))),
        3 => gen_block(g, depth - 1),
        _ => gen_expression(g, depth - 1),
    }
}

pub fn gen_block(g: &mut Gen, depth: usize) -> Arc<Node> {
    let statements = (0..below(g, 4)).map(|_| gen_statement(g, depth)).collect();
    block(statements)
}

fn gen_modifiers(g: &mut Gen) -> Vec<Modifier> {
    let mut modifiers = Vec::new();
    match below(g, 4) {
        0 => modifiers.push(Modifier::Public),
        1 => modifiers.push(Modifier::Protected),
        2 => modifiers.push(Modifier::Private),
        _ => {}
    }
    if bool::arbitrary(g) {
        modifiers.push(Modifier::Static);
    }
    modifiers
}

pub fn gen_member(g: &mut Gen, depth: usize) -> Arc<Node> {
    if bool::arbitrary(g) {
        let init = bool::arbitrary(g).then(|| gen_expression(g, depth.min(1)));
        return field(gen_modifiers(g), type_ref(pick(g, TYPES)), pick(g, NAMES), init);
    }
    let name = pick(g, METHODS);
    let params: Vec<_> = (0..below(g, 3))
        .map(|_| parameter(type_ref(pick(g, TYPES)), pick(g, NAMES)))
        .collect();
    let method_type = gen_method_type(g, name, params.len());
    let body = gen_block(g, depth);
    method_decl(gen_modifiers(g), None, name, params, Some(body), Some(method_type))
}

pub fn gen_compilation_unit(g: &mut Gen, depth: usize) -> Arc<Node> {
    let imports = (0..below(g, 3)).map(|_| import(pick(g, DECLARING))).collect();
    let classes = (0..1 + below(g, 2))
        .map(|i| {
            let name = format!("Generated{}", i);
            let members = (0..below(g, 4)).map(|_| gen_member(g, depth)).collect();
            let fqn = format!("com.example.{}", name);
            class_decl(gen_modifiers(g), &name, None, members, Some(&fqn))
        })
        .collect();
    compilation_unit("Generated.java", Some("com.example"), imports, classes)
}

/// A random compilation unit.
#[derive(Clone, Debug)]
pub struct ArbitraryTree(pub Arc<Node>);

impl Arbitrary for ArbitraryTree {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = 1 + below(g, 3);
        ArbitraryTree(gen_compilation_unit(g, depth))
    }
}
