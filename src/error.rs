use thiserror::Error;

use crate::ir::node::{NodeKind, Slot};

/// A required enclosing node was not found on the cursor path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no enclosing {expected} found above {from} (depth {depth})")]
pub struct ScopeNotFoundError {
    /// Human-readable description of what was expected, e.g. "class declaration".
    pub expected: String,
    /// Kind of the node the search started from, or "root".
    pub from: String,
    pub depth: usize,
}

/// Pattern text that does not compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed pattern '{pattern}': {reason}")]
pub struct MalformedPatternError {
    pub pattern: String,
    pub reason: String,
}

impl MalformedPatternError {
    pub fn new(pattern: &str, reason: impl Into<String>) -> Self {
        MalformedPatternError { pattern: pattern.to_string(), reason: reason.into() }
    }
}

/// Failures that abort one recipe's pass. The engine records them per recipe
/// and continues with the next recipe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error(transparent)]
    ScopeNotFound(#[from] ScopeNotFoundError),

    #[error(transparent)]
    MalformedPattern(#[from] MalformedPatternError),

    #[error("{parent} cannot hold a {found} in its {slot} slot")]
    InvalidReplacement { parent: NodeKind, slot: Slot, found: NodeKind },

    #[error("expected a {expected} node, got {found}")]
    UnexpectedNode { expected: NodeKind, found: NodeKind },
}

/// Problems ordering recipes by their prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("recipe '{recipe}' requires unknown recipe '{prerequisite}'")]
    UnknownPrerequisite { recipe: String, prerequisite: String },

    #[error("recipe '{recipe}' is part of a prerequisite cycle")]
    PrerequisiteCycle { recipe: String },

    #[error("recipe '{0}' registered twice")]
    DuplicateRecipe(String),
}

pub type VisitResult = Result<std::sync::Arc<crate::ir::node::Node>, RewriteError>;
