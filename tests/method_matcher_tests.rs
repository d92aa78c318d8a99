use std::sync::Arc;

use syntax_rewrite::config::EngineConfig;
use syntax_rewrite::engine::{Engine, Termination};
use syntax_rewrite::ir::builder::*;
use syntax_rewrite::ir::node::Node;
use syntax_rewrite::ir::transforms::{ChangeMethodName, FindMethods};
use syntax_rewrite::ir::types::{ClassType, TypeTable};
use syntax_rewrite::matching::MethodMatcher;
use syntax_rewrite::recipe::Recipe;
use test_utils::ir::fixtures::{base_mid_leaf, leaf_calls, method_type};

#[test]
fn test_pattern_matches_its_own_signature_only() {
    let call = invocation(
        None,
        "process",
        vec![literal_str("a"), literal_int(1)],
        Some(method_type("com.example.Service", "process", &["java.lang.String", "int"])),
    );
    let exact =
        MethodMatcher::compile("com.example.Service process(java.lang.String, int)").unwrap();
    assert!(exact.matches(&call));

    let other_name =
        MethodMatcher::compile("com.example.Service handle(java.lang.String, int)").unwrap();
    assert!(!other_name.matches(&call));

    let other_params = MethodMatcher::compile("com.example.Service process(int)").unwrap();
    assert!(!other_params.matches(&call));
}

#[test]
fn test_override_matching_through_intermediate_class() {
    let table = base_mid_leaf();
    let leaf_type = method_type("com.example.Leaf", "foo", &["int"]);
    let leaf_foo = invocation(None, "foo", vec![literal_int(1)], Some(leaf_type));

    let direct = MethodMatcher::compile("com.example.Base foo(int)").unwrap();
    assert!(!direct.matches_in(&leaf_foo, &table));
    let overrides = direct.match_overrides(true);
    assert!(overrides.matches_in(&leaf_foo, &table));

    // without hierarchy facts the override cannot be seen
    assert!(!overrides.matches(&leaf_foo));
}

#[test]
fn test_subtype_pattern_uses_hierarchy() {
    let table = base_mid_leaf();
    let call = invocation(None, "bar", vec![], Some(method_type("com.example.Leaf", "bar", &[])));
    let matcher = MethodMatcher::compile("com.example.Base+ bar()").unwrap();
    assert!(matcher.matches_in(&call, &table));
    assert!(!matcher.matches(&call));
}

#[test]
fn test_cyclic_hierarchy_terminates() {
    let table: TypeTable = vec![
        ClassType::new("a.A").extends("a.B").implements("a.C"),
        ClassType::new("a.B").extends("a.A"),
        ClassType::new("a.C").implements("a.A"),
    ]
    .into_iter()
    .collect();
    let call = invocation(None, "foo", vec![], Some(method_type("a.A", "foo", &[])));
    let matcher = MethodMatcher::compile("a.Missing foo()").unwrap().match_overrides(true);
    assert!(!matcher.matches_in(&call, &table));
    let subtype = MethodMatcher::compile("a.Missing+ foo()").unwrap();
    assert!(!subtype.matches_in(&call, &table));
}

#[test]
fn test_find_methods_marks_overrides_through_engine() {
    let tree = leaf_calls();
    let recipes: Vec<Arc<dyn Recipe>> =
        vec![Arc::new(FindMethods::new("com.example.Base foo(int)", true).unwrap())];
    let engine =
        Engine::new(EngineConfig::default()).with_type_hierarchy(Arc::new(base_mid_leaf()));
    let result = engine.run(&tree, &recipes);

    assert_eq!(result.termination, Termination::Converged);
    let hits: Vec<_> = result.markers_from(recipes[0].id()).collect();
    assert_eq!(hits.len(), 1);
    let marked = result.tree.descendants().find(|n| n.id() == hits[0].0).unwrap();
    assert_eq!(marked.simple_name(), Some("foo"));

    // the same recipe without hierarchy facts finds nothing and changes nothing
    let plain = Engine::default().run(&tree, &recipes);
    assert!(plain.markers.is_empty());
    assert!(Arc::ptr_eq(&plain.tree, &tree));
}

#[test]
fn test_change_method_name_updates_calls_and_types() {
    let tree = leaf_calls();
    let recipes: Vec<Arc<dyn Recipe>> =
        vec![Arc::new(ChangeMethodName::new("com.example.Leaf bar()", "baz", false).unwrap())];
    let result = Engine::default().run(&tree, &recipes);

    assert_eq!(
        result.changed_recipes,
        vec!["change-method-name:com.example.Leaf bar()->baz".to_string()]
    );
    let names: Vec<_> = result
        .tree
        .descendants()
        .filter_map(|n| match &*n {
            Node::MethodInvocation { name, method_type, .. } => {
                Some((name.clone(), method_type.as_ref().map(|m| m.name.clone())))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        names,
        vec![
            ("foo".to_string(), Some("foo".to_string())),
            ("baz".to_string(), Some("baz".to_string())),
        ]
    );
    assert_eq!(result.termination, Termination::Converged);
}

#[test]
fn test_malformed_pattern_rejected_before_any_tree() {
    let err = FindMethods::new("com.example.Base foo(int", false).unwrap_err();
    assert_eq!(err.pattern, "com.example.Base foo(int");
    assert!(ChangeMethodName::new("foo()", "bar", false).is_err());
}
