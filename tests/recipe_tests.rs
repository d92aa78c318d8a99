use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indoc::indoc;
use syntax_rewrite::config::EngineConfig;
use syntax_rewrite::engine::{Engine, Termination, run};
use syntax_rewrite::error::{PipelineError, VisitResult};
use syntax_rewrite::ir::builder::*;
use syntax_rewrite::ir::context::VisitContext;
use syntax_rewrite::ir::node::{BinaryOperator, Node, NodeKind, UnaryOperator};
use syntax_rewrite::ir::transforms::{
    ChangeFieldVisibility, ChangePackage, UnwrapParentheses, Visibility,
};
use syntax_rewrite::ir::visitor::TreeVisitor;
use syntax_rewrite::matching::RenamePolicy;
use syntax_rewrite::recipe::{Precondition, Preconditions, Recipe, RecipePipeline};
use test_utils::ir::fixtures::class_with_fields;

fn names(tree: &Arc<Node>, kind: NodeKind) -> Vec<String> {
    tree.descendants()
        .filter(|n| n.kind() == kind)
        .filter_map(|n| match &*n {
            Node::Package { name, .. } | Node::Import { name, .. } | Node::TypeRef { name, .. } => {
                Some(name.clone())
            }
            _ => None,
        })
        .collect()
}

fn packaged_tree() -> Arc<Node> {
    let class = class_decl(
        vec![],
        "Widget",
        Some(type_ref("com.acme.ui.Base")),
        vec![field(vec![], type_ref("com.acme.Config"), "config", None)],
        Some("com.acme.Widget"),
    );
    compilation_unit(
        "Widget.java",
        Some("com.acme"),
        vec![import("com.acme.Config"), import("com.acme.ui.Base"), import("com.acmex.Other")],
        vec![class],
    )
}

#[test]
fn test_change_package_exact_segment() {
    let recipes: Vec<Arc<dyn Recipe>> =
        vec![Arc::new(ChangePackage::new("com.acme", "org.acme", RenamePolicy::ExactSegment))];
    let result = run(&packaged_tree(), &recipes, 3);

    assert_eq!(names(&result.tree, NodeKind::Package), vec!["org.acme"]);
    assert_eq!(
        names(&result.tree, NodeKind::Import),
        vec!["org.acme.Config", "com.acme.ui.Base", "com.acmex.Other"]
    );
    assert_eq!(names(&result.tree, NodeKind::TypeRef), vec!["com.acme.ui.Base", "org.acme.Config"]);
    let class_type = result.tree.descendants().find_map(|n| match &*n {
        Node::ClassDecl { class_type, .. } => class_type.clone(),
        _ => None,
    });
    assert_eq!(class_type.as_deref(), Some("org.acme.Widget"));
    assert_eq!(result.termination, Termination::Converged);
}

#[test]
fn test_change_package_recursive() {
    let recipes: Vec<Arc<dyn Recipe>> =
        vec![Arc::new(ChangePackage::new("com.acme", "org.acme", RenamePolicy::Recursive))];
    let result = run(&packaged_tree(), &recipes, 3);
    assert_eq!(
        names(&result.tree, NodeKind::Import),
        vec!["org.acme.Config", "org.acme.ui.Base", "com.acmex.Other"]
    );
    assert_eq!(names(&result.tree, NodeKind::TypeRef), vec!["org.acme.ui.Base", "org.acme.Config"]);
}

#[test]
fn test_unwrap_parentheses_respects_precedence() {
    // return (a) + (b * c) ; x = (y);
    let sum = binary(
        BinaryOperator::Add,
        parenthesized(identifier("a")),
        parenthesized(binary(BinaryOperator::Mul, identifier("b"), identifier("c"))),
    );
    let difference = binary(BinaryOperator::Sub, identifier("d"), identifier("e"));
    let negated = unary(UnaryOperator::Neg, parenthesized(difference));
    let tree = block(vec![
        return_stmt(Some(sum)),
        assignment(identifier("x"), parenthesized(identifier("y"))),
        assignment(identifier("z"), negated),
    ]);
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(UnwrapParentheses)];
    let result = run(&tree, &recipes, 3);

    let remaining =
        result.tree.descendants().filter(|n| n.kind() == NodeKind::Parenthesized).count();
    assert_eq!(remaining, 2);
    assert_eq!(result.termination, Termination::Converged);
}

struct Counting {
    visits: Arc<AtomicUsize>,
}

impl TreeVisitor for Counting {
    fn visit_identifier(&self, node: &Arc<Node>, _ctx: &mut VisitContext) -> VisitResult {
        self.visits.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(node))
    }
}

struct GatedCounting {
    visits: Arc<AtomicUsize>,
}

impl Recipe for GatedCounting {
    fn id(&self) -> &str {
        "gated-counting"
    }

    fn precondition(&self) -> Precondition {
        Preconditions::has_kind(NodeKind::If)
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor> {
        Arc::new(Counting { visits: Arc::clone(&self.visits) })
    }
}

#[test]
fn test_false_precondition_never_calls_inner_visitor() {
    let visits = Arc::new(AtomicUsize::new(0));
    let recipes: Vec<Arc<dyn Recipe>> =
        vec![Arc::new(GatedCounting { visits: Arc::clone(&visits) })];

    let without_if = block(vec![assignment(identifier("x"), identifier("y"))]);
    let result = run(&without_if, &recipes, 3);
    assert!(Arc::ptr_eq(&result.tree, &without_if));
    assert_eq!(visits.load(Ordering::SeqCst), 0);

    let with_if = block(vec![if_stmt(identifier("flag"), block(vec![]), None)]);
    run(&with_if, &recipes, 3);
    assert_eq!(visits.load(Ordering::SeqCst), 1);
}

struct Requires {
    id: &'static str,
    requires: Vec<String>,
}

impl Recipe for Requires {
    fn id(&self) -> &str {
        self.id
    }

    fn visitor(&self) -> Arc<dyn TreeVisitor> {
        ChangeFieldVisibility::make_private().visitor()
    }

    fn prerequisites(&self) -> Vec<String> {
        self.requires.clone()
    }
}

#[test]
fn test_pipeline_orders_recipes_for_engine() {
    let mut pipeline = RecipePipeline::new();
    pipeline
        .add(Arc::new(Requires { id: "second", requires: vec!["first".into()] }))
        .unwrap();
    pipeline.add(Arc::new(Requires { id: "first", requires: vec![] })).unwrap();
    let ordered = pipeline.ordered().unwrap();
    let ids: Vec<_> = ordered.iter().map(|r| r.id().to_string()).collect();
    assert_eq!(ids, vec!["first", "second"]);

    let fixture = class_with_fields();
    let result = Engine::default().run(&fixture.tree, &ordered);
    // first makes the change, second then sees nothing to do
    assert_eq!(result.changed_recipes, vec!["first".to_string()]);
}

#[test]
fn test_parameterized_recipes_have_distinct_ids() {
    let to_b = ChangePackage::new("com.a", "com.b", RenamePolicy::ExactSegment);
    let to_c = ChangePackage::new("com.a", "com.c", RenamePolicy::ExactSegment);
    assert_eq!(to_b.id(), "change-package:com.a->com.b");
    assert_ne!(to_b.id(), to_c.id());
    assert_ne!(
        ChangeFieldVisibility::make_private().id(),
        ChangeFieldVisibility::new(Visibility::Public).id()
    );

    let mut pipeline = RecipePipeline::new();
    pipeline.add(Arc::new(to_b)).unwrap();
    pipeline.add(Arc::new(to_c)).unwrap();
    assert_eq!(pipeline.len(), 2);
}

#[test]
fn test_pipeline_rejects_cycles() {
    let mut pipeline = RecipePipeline::new();
    pipeline.add(Arc::new(Requires { id: "a", requires: vec!["b".into()] })).unwrap();
    pipeline.add(Arc::new(Requires { id: "b", requires: vec!["a".into()] })).unwrap();
    assert!(matches!(pipeline.ordered(), Err(PipelineError::PrerequisiteCycle { .. })));
}

#[test]
fn test_engine_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        indoc! {r#"
            {
                "max_cycles": 1,
                "parallel": false,
                "log_level": "debug"
            }
        "#}
        .as_bytes(),
    )
    .unwrap();
    let config = EngineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_cycles, 1);
    assert!(!config.parallel);
    assert_eq!(config.log_level.as_deref(), Some("debug"));

    let trees = vec![class_with_fields().tree, class_with_fields().tree];
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(ChangeFieldVisibility::make_private())];
    let results = Engine::new(config).run_all(&trees, &recipes);
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result.cycles, 1);
        assert_eq!(result.termination, Termination::CycleLimitReached);
    }
}

#[test]
fn test_engine_config_missing_file_has_context() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.json"));
}
