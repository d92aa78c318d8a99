use std::sync::Arc;

use syntax_rewrite::engine::run;
use syntax_rewrite::ir::builder::*;
use syntax_rewrite::ir::cursor::Cursor;
use syntax_rewrite::ir::node::Node;
use syntax_rewrite::ir::transforms::RenameVariable;
use syntax_rewrite::recipe::Recipe;
use test_utils::ir::fixtures::sibling_scopes;

fn identifier_names(tree: &Arc<Node>) -> Vec<String> {
    tree.descendants()
        .filter_map(|n| match &*n {
            Node::Identifier { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn variable_names(tree: &Arc<Node>) -> Vec<String> {
    tree.descendants()
        .filter_map(|n| match &*n {
            Node::NamedVariable { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn field_access_names(tree: &Arc<Node>) -> Vec<String> {
    tree.descendants()
        .filter_map(|n| match &*n {
            Node::FieldAccess { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_rename_leaves_sibling_scope_and_field_access_alone() {
    let fixture = sibling_scopes();
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(RenameVariable::new(fixture.target, "y"))];
    let result = run(&fixture.tree, &recipes, 3);

    // declarations: obj, first x (renamed), second x
    assert_eq!(variable_names(&result.tree), vec!["obj", "y", "x"]);
    // first block: y = y + 1; obj.x = y;  second block: foo(x)
    assert_eq!(identifier_names(&result.tree), vec!["y", "y", "obj", "y", "x"]);
    assert_eq!(field_access_names(&result.tree), vec!["x"]);

    let second = result
        .tree
        .descendants()
        .find(|n| n.id() == fixture.second_block.id())
        .unwrap();
    assert!(Arc::ptr_eq(&second, &fixture.second_block));
    let first = result
        .tree
        .descendants()
        .find(|n| n.id() == fixture.first_block.id())
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &fixture.first_block));
}

#[test]
fn test_rename_stops_at_shadowing_declaration() {
    // { int x; x = 1; { int x; x = 2; } x = 3; }
    let outer_decl = local_var(None, "x", None);
    let target = match &*outer_decl {
        Node::VariableDecls { variables, .. } => variables[0].id(),
        _ => unreachable!(),
    };
    let inner =
        block(vec![local_var(None, "x", None), assignment(identifier("x"), literal_int(2))]);
    let outer = block(vec![
        outer_decl,
        assignment(identifier("x"), literal_int(1)),
        Arc::clone(&inner),
        assignment(identifier("x"), literal_int(3)),
    ]);
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(RenameVariable::new(target, "renamed"))];
    let result = run(&outer, &recipes, 3);

    assert_eq!(identifier_names(&result.tree), vec!["renamed", "x", "renamed"]);
    assert_eq!(variable_names(&result.tree), vec!["renamed", "x"]);
    let inner_after = result.tree.descendants().find(|n| n.id() == inner.id()).unwrap();
    assert!(Arc::ptr_eq(&inner_after, &inner));
}

#[test]
fn test_rename_method_parameter() {
    // void m(int count) { return count; }
    let param = parameter(type_ref("int"), "count");
    let target = match &*param {
        Node::VariableDecls { variables, .. } => variables[0].id(),
        _ => unreachable!(),
    };
    let method = method_decl(
        vec![],
        Some(type_ref("int")),
        "m",
        vec![param],
        Some(block(vec![return_stmt(Some(identifier("count")))])),
        None,
    );
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(RenameVariable::new(target, "total"))];
    let result = run(&method, &recipes, 3);
    assert_eq!(variable_names(&result.tree), vec!["total"]);
    assert_eq!(identifier_names(&result.tree), vec!["total"]);
    assert_eq!(result.tree.id(), method.id());
}

#[test]
fn test_unknown_declaration_changes_nothing() {
    let fixture = sibling_scopes();
    let recipes: Vec<Arc<dyn Recipe>> =
        vec![Arc::new(RenameVariable::new(syntax_rewrite::ir::node::NodeId::fresh(), "y"))];
    let result = run(&fixture.tree, &recipes, 3);
    assert!(Arc::ptr_eq(&result.tree, &fixture.tree));
}

#[test]
fn test_same_name_scope_on_fixture_paths() {
    let fixture = sibling_scopes();
    let Node::Block { statements, .. } = &*fixture.first_block else {
        panic!("first block is a block");
    };
    let assign = &statements[1];
    let target = match &**assign {
        Node::Assignment { target, .. } => Arc::clone(target),
        other => panic!("unexpected statement {:?}", other),
    };
    let scope = Cursor::root().push(&fixture.first_block);
    let child = scope.push(assign).push(&target);
    assert!(Cursor::is_in_same_name_scope(&scope, &child, "x"));

    let elsewhere = Cursor::root().push(&fixture.second_block);
    let stranger = elsewhere.push(&target);
    assert!(!Cursor::is_in_same_name_scope(&scope, &stranger, "x"));
}
