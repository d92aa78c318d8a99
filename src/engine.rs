//! Fixpoint driver: applies an ordered recipe list to a tree until nothing
//! changes, the cycle cap is reached, or the run is cancelled.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::RewriteError;
use crate::ir::context::VisitContext;
use crate::ir::markers::Marker;
use crate::ir::node::{Node, NodeId};
use crate::ir::types::{EmptyHierarchy, TypeHierarchy};
use crate::recipe::scheduler::run_pass;
use crate::recipe::{Preconditions, Recipe};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A full cycle ran without any recipe changing the tree.
    Converged,
    /// The last allowed cycle still changed the tree.
    CycleLimitReached,
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Converged => "converged",
            Termination::CycleLimitReached => "cycle limit reached",
            Termination::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A recipe whose pass failed. Its changes from that pass were discarded and
/// it did not run again in later cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFailure {
    pub recipe_id: String,
    pub cycle: usize,
    pub error: RewriteError,
}

#[derive(Debug, Clone)]
pub struct RewriteResult {
    pub tree: Arc<Node>,
    /// Every marker on the final tree, with the node carrying it.
    pub markers: Vec<(NodeId, Arc<Marker>)>,
    /// Ids of recipes that changed the tree, in order of first change. One
    /// entry per recipe instance.
    pub changed_recipes: Vec<String>,
    pub failures: Vec<RecipeFailure>,
    pub cycles: usize,
    pub termination: Termination,
}

impl RewriteResult {
    pub fn is_changed(&self) -> bool {
        !self.changed_recipes.is_empty()
    }

    /// Markers added by `source_id`.
    pub fn markers_from<'a>(
        &'a self,
        source_id: &'a str,
    ) -> impl Iterator<Item = &'a (NodeId, Arc<Marker>)> {
        self.markers.iter().filter(move |(_, m)| m.source_id == source_id)
    }
}

pub struct Engine {
    config: EngineConfig,
    hierarchy: Arc<dyn TypeHierarchy>,
    cancelled: Arc<AtomicBool>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            hierarchy: Arc::new(EmptyHierarchy),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Type facts consulted by override-aware matching and subtype patterns.
    pub fn with_type_hierarchy(mut self, hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Flag observed between cycles. Setting it stops runs at the next cycle
    /// boundary; a cycle already started completes.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Applies `recipes`, in order, to `tree` until a fixpoint.
    ///
    /// Within a cycle each recipe sees the tree produced by the previous one.
    /// A recipe that fails leaves the tree as it was before its pass.
    pub fn run(&self, tree: &Arc<Node>, recipes: &[Arc<dyn Recipe>]) -> RewriteResult {
        let max_cycles = self.config.max_cycles.max(1);
        let mut current = Arc::clone(tree);
        // Keyed by position in `recipes`; ids need not be unique.
        let mut changed: Vec<usize> = Vec::new();
        let mut failed: FxHashSet<usize> = FxHashSet::default();
        let mut failures = Vec::new();
        let mut cycles = 0;
        let mut termination = Termination::CycleLimitReached;

        for cycle in 1..=max_cycles {
            if self.cancelled.load(Ordering::SeqCst) {
                info!("Run cancelled before cycle {}", cycle);
                termination = Termination::Cancelled;
                break;
            }
            cycles = cycle;
            let mut cycle_changed = false;

            for (index, recipe) in recipes.iter().enumerate() {
                let id = recipe.id();
                if failed.contains(&index) || cycle > recipe.max_cycles() {
                    continue;
                }
                let visitor = Preconditions::check(recipe.precondition(), recipe.visitor());
                let mut ctx = VisitContext::new(id, Arc::clone(&self.hierarchy), cycle);
                match run_pass(visitor.as_ref(), &current, &mut ctx) {
                    Ok(next) if Arc::ptr_eq(&next, &current) => {
                        debug!("Recipe '{}' made no change in cycle {}", id, cycle);
                    }
                    Ok(next) => {
                        debug!(
                            "Recipe '{}' changed the tree in cycle {} ({} nodes visited)",
                            id,
                            cycle,
                            ctx.nodes_visited()
                        );
                        if !changed.contains(&index) {
                            changed.push(index);
                        }
                        cycle_changed = true;
                        current = next;
                    }
                    Err(error) => {
                        warn!("Recipe '{}' failed in cycle {}: {}", id, cycle, error);
                        failed.insert(index);
                        failures.push(RecipeFailure {
                            recipe_id: id.to_string(),
                            cycle,
                            error,
                        });
                    }
                }
            }

            if !cycle_changed {
                termination = Termination::Converged;
                break;
            }
        }

        if termination == Termination::CycleLimitReached {
            warn!("Stopped after {} cycles without converging", cycles);
        }
        debug!("Run finished: {} after {} cycle(s)", termination, cycles);

        RewriteResult {
            markers: current.collect_markers(),
            tree: current,
            changed_recipes: changed.iter().map(|&i| recipes[i].id().to_string()).collect(),
            failures,
            cycles,
            termination,
        }
    }

    /// Runs the same recipes over independent trees, in parallel when the
    /// configuration allows it. Results are in input order.
    pub fn run_all(
        &self,
        trees: &[Arc<Node>],
        recipes: &[Arc<dyn Recipe>],
    ) -> Vec<RewriteResult> {
        if self.config.parallel {
            trees.par_iter().map(|tree| self.run(tree, recipes)).collect()
        } else {
            trees.iter().map(|tree| self.run(tree, recipes)).collect()
        }
    }
}

/// Applies `recipes` to `tree` with at most `max_cycles` cycles and no type
/// hierarchy. A cap of 0 is treated as 1.
pub fn run(tree: &Arc<Node>, recipes: &[Arc<dyn Recipe>], max_cycles: usize) -> RewriteResult {
    Engine::new(EngineConfig::default().with_max_cycles(max_cycles)).run(tree, recipes)
}
