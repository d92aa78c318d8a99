use std::collections::HashMap;
use std::sync::Arc;

use petgraph::Graph;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::error::PipelineError;

use super::Recipe;

/// Orders recipes so that every recipe runs after the recipes it names as
/// prerequisites.
///
/// Recipes are kept in a dependency graph and the execution order is its
/// topological sort. Prerequisites are resolved when the order is computed, so
/// recipes may be added in any order.
#[derive(Default)]
pub struct RecipePipeline {
    /// One graph node per registered recipe; edges are added by [`ordered`](Self::ordered).
    graph: Graph<Arc<dyn Recipe>, ()>,
    /// Maps recipe ids to their indices in the graph.
    node_indices: HashMap<String, NodeIndex>,
}

impl RecipePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, recipe: Arc<dyn Recipe>) -> Result<(), PipelineError> {
        let id = recipe.id().to_string();
        if self.node_indices.contains_key(&id) {
            return Err(PipelineError::DuplicateRecipe(id));
        }
        let node = self.graph.add_node(recipe);
        self.node_indices.insert(id, node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.node_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_indices.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Recipes in execution order.
    pub fn ordered(&self) -> Result<Vec<Arc<dyn Recipe>>, PipelineError> {
        let mut graph = self.graph.clone();
        for node in self.graph.node_indices() {
            let recipe = &self.graph[node];
            for prerequisite in recipe.prerequisites() {
                let Some(&dep) = self.node_indices.get(&prerequisite) else {
                    return Err(PipelineError::UnknownPrerequisite {
                        recipe: recipe.id().to_string(),
                        prerequisite,
                    });
                };
                graph.add_edge(dep, node, ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| PipelineError::PrerequisiteCycle {
            recipe: graph[cycle.node_id()].id().to_string(),
        })?;
        let recipes: Vec<_> = order.into_iter().map(|idx| Arc::clone(&graph[idx])).collect();
        debug!(
            "Recipe order: {}",
            recipes.iter().map(|r| r.id()).collect::<Vec<_>>().join(" -> ")
        );
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::visitor::TreeVisitor;

    struct Named {
        id: &'static str,
        requires: Vec<&'static str>,
    }

    struct Noop;

    impl TreeVisitor for Noop {}

    impl Recipe for Named {
        fn id(&self) -> &str {
            self.id
        }

        fn visitor(&self) -> Arc<dyn TreeVisitor> {
            Arc::new(Noop)
        }

        fn prerequisites(&self) -> Vec<String> {
            self.requires.iter().map(|r| r.to_string()).collect()
        }
    }

    fn recipe(id: &'static str, requires: &[&'static str]) -> Arc<dyn Recipe> {
        Arc::new(Named { id, requires: requires.to_vec() })
    }

    fn position(order: &[Arc<dyn Recipe>], id: &str) -> usize {
        order.iter().position(|r| r.id() == id).unwrap()
    }

    #[test]
    fn test_prerequisites_run_first() {
        let mut pipeline = RecipePipeline::new();
        pipeline.add(recipe("c", &["b"])).unwrap();
        pipeline.add(recipe("b", &["a"])).unwrap();
        pipeline.add(recipe("a", &[])).unwrap();
        let order = pipeline.ordered().unwrap();
        assert_eq!(order.len(), 3);
        assert!(position(&order, "a") < position(&order, "b"));
        assert!(position(&order, "b") < position(&order, "c"));
    }

    #[test]
    fn test_unknown_prerequisite() {
        let mut pipeline = RecipePipeline::new();
        pipeline.add(recipe("a", &["missing"])).unwrap();
        assert_eq!(
            pipeline.ordered().err(),
            Some(PipelineError::UnknownPrerequisite {
                recipe: "a".into(),
                prerequisite: "missing".into()
            })
        );
    }

    #[test]
    fn test_cycle_and_duplicates_are_rejected() {
        let mut pipeline = RecipePipeline::new();
        pipeline.add(recipe("a", &["b"])).unwrap();
        pipeline.add(recipe("b", &["a"])).unwrap();
        assert!(matches!(pipeline.ordered(), Err(PipelineError::PrerequisiteCycle { .. })));
        assert_eq!(pipeline.add(recipe("a", &[])), Err(PipelineError::DuplicateRecipe("a".into())));
    }
}
