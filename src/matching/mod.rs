//! Pattern matchers consulted by recipes and preconditions.

pub mod method_matcher;
pub mod reference;
pub mod type_pattern;

pub use method_matcher::MethodMatcher;
pub use reference::{
    PackageMatcher, Reference, ReferenceKind, ReferenceMatcher, RenamePolicy, Renamer,
};
pub use type_pattern::TypePattern;
