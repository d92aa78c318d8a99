//! Root-to-node path maintained by the dispatcher.
//!
//! A cursor is an immutable linked list of frames. Pushing a frame is O(1) and
//! never copies the path, so a visitor may capture a cursor and keep it after
//! the traversal moved on. The chain always ends at a root sentinel that holds
//! no node.

use std::fmt;
use std::sync::Arc;

use crate::error::ScopeNotFoundError;

use super::node::{Node, NodeId, NodeKind};

struct Frame {
    node: Option<Arc<Node>>,
    parent: Option<Cursor>,
    depth: usize,
}

#[derive(Clone)]
pub struct Cursor(Arc<Frame>);

impl Cursor {
    /// The root sentinel. Its depth is 0.
    pub fn root() -> Self {
        Cursor(Arc::new(Frame { node: None, parent: None, depth: 0 }))
    }

    /// A cursor one level deeper, positioned at `node`.
    pub fn push(&self, node: &Arc<Node>) -> Cursor {
        Cursor(Arc::new(Frame {
            node: Some(Arc::clone(node)),
            parent: Some(self.clone()),
            depth: self.0.depth + 1,
        }))
    }

    /// The node at this position, `None` for the root sentinel.
    pub fn node(&self) -> Option<&Arc<Node>> {
        self.0.node.as_ref()
    }

    pub fn parent(&self) -> Option<&Cursor> {
        self.0.parent.as_ref()
    }

    /// The node one frame up, if it is not the sentinel.
    pub fn parent_node(&self) -> Option<&Arc<Node>> {
        self.parent().and_then(Cursor::node)
    }

    pub fn is_root(&self) -> bool {
        self.0.node.is_none()
    }

    /// Number of node frames between here and the sentinel.
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    /// Nodes from this frame up to the tree root.
    pub fn path(&self) -> impl Iterator<Item = &Arc<Node>> {
        let mut current = Some(self);
        std::iter::from_fn(move || {
            let cursor = current?;
            current = cursor.parent();
            cursor.node()
        })
    }

    /// Nodes strictly above this frame, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.parent().into_iter().flat_map(|p| p.path())
    }

    pub fn first_enclosing(&self, mut pred: impl FnMut(&Node) -> bool) -> Option<&Arc<Node>> {
        self.ancestors().find(|n| pred(n))
    }

    pub fn first_enclosing_kind(&self, kind: NodeKind) -> Option<&Arc<Node>> {
        self.first_enclosing(|n| n.kind() == kind)
    }

    /// Like [`first_enclosing`](Self::first_enclosing) for callers whose
    /// invariants guarantee the enclosing node exists.
    pub fn first_enclosing_required(
        &self,
        expected: &str,
        pred: impl FnMut(&Node) -> bool,
    ) -> Result<&Arc<Node>, ScopeNotFoundError> {
        self.first_enclosing(pred).ok_or_else(|| ScopeNotFoundError {
            expected: expected.to_string(),
            from: self.node().map_or_else(|| "root".to_string(), |n| n.kind().to_string()),
            depth: self.depth(),
        })
    }

    /// The frame positioned at the node with `id`, searching from here upward.
    pub fn find_frame(&self, id: NodeId) -> Option<&Cursor> {
        let mut current = Some(self);
        while let Some(cursor) = current {
            if cursor.node().is_some_and(|n| n.id() == id) {
                return Some(cursor);
            }
            current = cursor.parent();
        }
        None
    }

    /// Is `child` inside `scope` with no frame strictly between them
    /// introducing another binding for `name`?
    ///
    /// `scope` is matched by identity, so a cursor captured in an earlier pass
    /// still works as long as the scope node itself was not replaced.
    pub fn is_in_same_name_scope(scope: &Cursor, child: &Cursor, name: &str) -> bool {
        let Some(scope_node) = scope.node() else {
            return true;
        };
        let scope_id = scope_node.id();
        for node in child.ancestors() {
            if node.id() == scope_id {
                return true;
            }
            if node.declares_name(name) {
                return false;
            }
        }
        false
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.path().map(|n| n.kind()).collect();
        kinds.reverse();
        f.debug_struct("Cursor").field("path", &kinds).finish()
    }
}

/// A node captured by identity when a rule decides to act on it, so a later
/// pass can recognize the same site again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeRef(NodeId);

impl ScopeRef {
    pub fn of(node: &Node) -> Self {
        ScopeRef(node.id())
    }

    pub fn id(&self) -> NodeId {
        self.0
    }

    pub fn is_scope(&self, candidate: &Node) -> bool {
        candidate.id() == self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;

    fn cursor_to(path: &[&Arc<Node>]) -> Cursor {
        path.iter().fold(Cursor::root(), |c, n| c.push(n))
    }

    #[test]
    fn test_depth_matches_path_length() {
        let x = identifier("x");
        let body = block(vec![Arc::clone(&x)]);
        let cursor = cursor_to(&[&body, &x]);
        assert_eq!(cursor.depth(), 2);
        assert_eq!(cursor.path().count(), 2);
        assert!(Cursor::root().is_root());
    }

    #[test]
    fn test_first_enclosing_stops_at_root() {
        let x = identifier("x");
        let body = block(vec![Arc::clone(&x)]);
        let cursor = cursor_to(&[&body, &x]);
        assert!(cursor.first_enclosing_kind(NodeKind::Block).is_some());
        assert!(cursor.first_enclosing_kind(NodeKind::ClassDecl).is_none());

        // the node itself is not its own enclosing node
        assert!(cursor.first_enclosing_kind(NodeKind::Identifier).is_none());
    }

    #[test]
    fn test_first_enclosing_required_reports_missing_scope() {
        let x = identifier("x");
        let cursor = cursor_to(&[&x]);
        let err = cursor
            .first_enclosing_required("class declaration", |n| n.kind() == NodeKind::ClassDecl)
            .unwrap_err();
        assert_eq!(err.expected, "class declaration");
        assert_eq!(err.from, "Identifier");
        assert_eq!(err.depth, 1);
    }

    #[test]
    fn test_same_name_scope_detects_shadowing() {
        let inner_ref = identifier("x");
        let inner = block(vec![local_var(None, "x", None), Arc::clone(&inner_ref)]);
        let outer = block(vec![local_var(None, "x", None), Arc::clone(&inner)]);

        let scope = cursor_to(&[&outer]);
        let shadowed = cursor_to(&[&outer, &inner, &inner_ref]);
        assert!(!Cursor::is_in_same_name_scope(&scope, &shadowed, "x"));
        assert!(Cursor::is_in_same_name_scope(&scope, &shadowed, "y"));

        let inner_scope = cursor_to(&[&outer, &inner]);
        assert!(Cursor::is_in_same_name_scope(&inner_scope, &shadowed, "x"));
    }

    #[test]
    fn test_scope_ref_uses_identity() {
        let a = identifier("x");
        let b = identifier("x");
        let scope = ScopeRef::of(&a);
        assert!(scope.is_scope(&a));
        assert!(!scope.is_scope(&b));
    }
}
