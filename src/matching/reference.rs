//! Matching and renaming of names that refer to packages and types.
//!
//! A [`Reference`] is a view of a node whose text names a package or a type:
//! package declarations, imports and type references.

use crate::ir::node::{Node, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Package,
    Import,
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub value: String,
    pub node_id: NodeId,
}

impl Reference {
    /// The reference a node makes, if it is a package, import or type reference.
    pub fn of(node: &Node) -> Option<Reference> {
        let (kind, value) = match node {
            Node::Package { name, .. } => (ReferenceKind::Package, name),
            Node::Import { name, .. } => (ReferenceKind::Import, name),
            Node::TypeRef { name, .. } => (ReferenceKind::Type, name),
            _ => return None,
        };
        Some(Reference { kind, value: value.clone(), node_id: node.id() })
    }
}

pub trait ReferenceMatcher: Send + Sync {
    fn matches_reference(&self, reference: &Reference) -> bool;
}

pub trait Renamer: Send + Sync {
    /// The new text for `value` when `old` is renamed to `new`, or `None` if
    /// `value` is not affected.
    fn rename(&self, value: &str, old: &str, new: &str) -> Option<String>;
}

/// Which names below a package count as part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenamePolicy {
    /// The package and every sub-package.
    Recursive,
    /// The package itself and types directly inside it. A segment that
    /// starts with an uppercase letter is taken to be a type.
    #[default]
    ExactSegment,
}

impl RenamePolicy {
    /// The part of `value` after `prefix` if `value` falls under `prefix`.
    /// The returned suffix keeps its leading `.`.
    fn covered_suffix<'v>(&self, value: &'v str, prefix: &str) -> Option<&'v str> {
        let suffix = value.strip_prefix(prefix)?;
        if suffix.is_empty() {
            return Some(suffix);
        }
        let segment = suffix.strip_prefix('.')?;
        let covered = match self {
            RenamePolicy::Recursive => !segment.is_empty(),
            RenamePolicy::ExactSegment => segment.chars().next().is_some_and(char::is_uppercase),
        };
        covered.then_some(suffix)
    }
}

/// Matches references to one package and renames them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMatcher {
    package: String,
    policy: RenamePolicy,
}

impl PackageMatcher {
    pub fn new(package: impl Into<String>, policy: RenamePolicy) -> Self {
        PackageMatcher { package: package.into(), policy }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn policy(&self) -> RenamePolicy {
        self.policy
    }
}

impl ReferenceMatcher for PackageMatcher {
    fn matches_reference(&self, reference: &Reference) -> bool {
        self.policy.covered_suffix(&reference.value, &self.package).is_some()
    }
}

impl Renamer for PackageMatcher {
    fn rename(&self, value: &str, old: &str, new: &str) -> Option<String> {
        self.policy
            .covered_suffix(value, old)
            .map(|suffix| format!("{}{}", new, suffix))
    }
}
