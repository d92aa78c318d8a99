//! Per-traversal state threaded through every dispatch call.
//!
//! Visitors are immutable and may be shared across threads; anything a
//! traversal accumulates (the cursor, deferred visitors, counters) lives here
//! instead, one context per tree per recipe pass.

use std::collections::VecDeque;
use std::sync::Arc;

use super::cursor::Cursor;
use super::node::Node;
use super::types::{EmptyHierarchy, TypeHierarchy};
use super::visitor::TreeVisitor;

pub struct VisitContext {
    source_id: String,
    cursor: Cursor,
    hierarchy: Arc<dyn TypeHierarchy>,
    /// One queue per active dispatch frame; `do_after_visit` appends to the top.
    after_visit: Vec<VecDeque<Arc<dyn TreeVisitor>>>,
    /// Whole-tree passes to run once the current pass finishes.
    and_then: VecDeque<Arc<dyn TreeVisitor>>,
    nodes_visited: usize,
    cycle: usize,
}

impl VisitContext {
    /// A context for one pass of the recipe `source_id` in cycle `cycle`.
    pub fn new(
        source_id: impl Into<String>,
        hierarchy: Arc<dyn TypeHierarchy>,
        cycle: usize,
    ) -> Self {
        VisitContext {
            source_id: source_id.into(),
            cursor: Cursor::root(),
            hierarchy,
            after_visit: Vec::new(),
            and_then: VecDeque::new(),
            nodes_visited: 0,
            cycle,
        }
    }

    /// A context with no type information, for ad-hoc traversals and tests.
    pub fn detached(source_id: impl Into<String>) -> Self {
        Self::new(source_id, Arc::new(EmptyHierarchy), 1)
    }

    /// Id used as the origin of markers added during this traversal.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn type_hierarchy(&self) -> &dyn TypeHierarchy {
        self.hierarchy.as_ref()
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub fn nodes_visited(&self) -> usize {
        self.nodes_visited
    }

    /// Runs `visitor` on the result of the current `visit` call, before any
    /// sibling is visited. Outside of a traversal it is queued as a whole-tree pass.
    pub fn do_after_visit(&mut self, visitor: Arc<dyn TreeVisitor>) {
        match self.after_visit.last_mut() {
            Some(queue) => queue.push_back(visitor),
            None => self.and_then.push_back(visitor),
        }
    }

    /// Runs `visitor` over the whole tree after the current pass completes.
    pub fn and_then(&mut self, visitor: Arc<dyn TreeVisitor>) {
        self.and_then.push_back(visitor);
    }

    pub fn has_pending_passes(&self) -> bool {
        !self.and_then.is_empty()
    }

    pub(crate) fn next_pass(&mut self) -> Option<Arc<dyn TreeVisitor>> {
        self.and_then.pop_front()
    }

    /// Pushes a cursor frame for `node` and opens its after-visit queue.
    pub(crate) fn enter(&mut self, node: &Arc<Node>) {
        self.cursor = self.cursor.push(node);
        self.after_visit.push(VecDeque::new());
        self.nodes_visited += 1;
    }

    /// Pops the frame opened by [`enter`](Self::enter), handing back the
    /// visitors deferred while it was open.
    pub(crate) fn exit(&mut self) -> VecDeque<Arc<dyn TreeVisitor>> {
        if let Some(parent) = self.cursor.parent() {
            self.cursor = parent.clone();
        }
        self.after_visit.pop().unwrap_or_default()
    }

    /// Puts the cursor back at the root sentinel before a new whole-tree pass.
    pub(crate) fn reset_cursor(&mut self) {
        self.cursor = Cursor::root();
        self.after_visit.clear();
    }
}
