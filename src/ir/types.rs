//! Type attribution facts consumed by the matchers.
//!
//! The engine never computes these. A parser/attribution front end attaches a
//! [`MethodType`] to invocations and declarations and exposes the class
//! hierarchy through [`TypeHierarchy`]. Supertypes are referenced by name and
//! looked up lazily, so malformed (cyclic) hierarchies are representable and
//! every walk over them keeps a visited set.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Resolved signature of a method, constructor or call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodType {
    /// Fully qualified name of the declaring type.
    pub declaring_type: String,
    pub name: String,
    /// Fully qualified parameter types, in order.
    pub parameter_types: Vec<String>,
    pub return_type: Option<String>,
}

impl MethodType {
    pub const CONSTRUCTOR_NAME: &'static str = "<constructor>";

    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        parameter_types: Vec<String>,
        return_type: Option<String>,
    ) -> Self {
        MethodType {
            declaring_type: declaring_type.into(),
            name: name.into(),
            parameter_types,
            return_type,
        }
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        MethodType { name: name.into(), ..self.clone() }
    }

    /// Same name and erased parameter types; the override relation ignores the declaring type.
    pub fn has_same_signature(&self, other: &MethodType) -> bool {
        self.name == other.name
            && self.parameter_types.len() == other.parameter_types.len()
            && self
                .parameter_types
                .iter()
                .zip(&other.parameter_types)
                .all(|(a, b)| erase_generics(a) == erase_generics(b))
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({})", self.declaring_type, self.name, self.parameter_types.join(", "))
    }
}

/// Facts about one class or interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassType {
    pub fully_qualified_name: String,
    pub supertype: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Methods declared (not inherited) by this type.
    #[serde(default)]
    pub methods: Vec<MethodType>,
}

impl ClassType {
    pub fn new(fully_qualified_name: impl Into<String>) -> Self {
        ClassType {
            fully_qualified_name: fully_qualified_name.into(),
            supertype: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Declares a method on this type. The method's declaring type is set to this type.
    pub fn declares(mut self, name: &str, parameter_types: &[&str]) -> Self {
        let method = MethodType::new(
            self.fully_qualified_name.clone(),
            name,
            parameter_types.iter().map(|p| p.to_string()).collect(),
            None,
        );
        self.methods.push(method);
        self
    }

    pub fn declared_method(&self, like: &MethodType) -> Option<&MethodType> {
        self.methods.iter().find(|m| m.has_same_signature(like))
    }
}

/// Lookup of class facts by fully qualified name.
pub trait TypeHierarchy: Send + Sync {
    fn lookup(&self, fully_qualified_name: &str) -> Option<Arc<ClassType>>;
}

/// Hierarchy that knows nothing. Matchers fall back to direct matching only.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyHierarchy;

impl TypeHierarchy for EmptyHierarchy {
    fn lookup(&self, _fully_qualified_name: &str) -> Option<Arc<ClassType>> {
        None
    }
}

/// Concurrent, read-through table of class facts shared by all workers of a run.
#[derive(Debug, Default)]
pub struct TypeTable {
    classes: DashMap<String, Arc<ClassType>>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, class: ClassType) {
        self.classes.insert(class.fully_qualified_name.clone(), Arc::new(class));
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassType> for TypeTable {
    fn from_iter<I: IntoIterator<Item = ClassType>>(iter: I) -> Self {
        let table = TypeTable::new();
        for class in iter {
            table.insert(class);
        }
        table
    }
}

impl TypeHierarchy for TypeTable {
    fn lookup(&self, fully_qualified_name: &str) -> Option<Arc<ClassType>> {
        self.classes
            .get(erase_generics(fully_qualified_name))
            .map(|entry| Arc::clone(entry.value()))
    }
}

/// Walks the supertypes of `type_name` breadth-first (interfaces before the
/// superclass at each level) and returns true as soon as `pred` accepts one.
///
/// `type_name` itself is not offered to `pred`. Types the hierarchy does not
/// know end their branch. Each type is visited at most once, so cyclic
/// hierarchies terminate.
pub fn any_supertype(
    hierarchy: &dyn TypeHierarchy,
    type_name: &str,
    mut pred: impl FnMut(&ClassType) -> bool,
) -> bool {
    let start = erase_generics(type_name).to_string();
    let mut visited = FxHashSet::default();
    visited.insert(start.clone());
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let Some(class) = hierarchy.lookup(&current) else {
            continue;
        };
        let supers = class.interfaces.iter().chain(class.supertype.iter());
        for next in supers {
            let next = erase_generics(next);
            if !visited.insert(next.to_string()) {
                trace!("Supertype {} already visited from {}", next, type_name);
                continue;
            }
            if let Some(super_class) = hierarchy.lookup(next) {
                if pred(&super_class) {
                    return true;
                }
            }
            queue.push_back(next.to_string());
        }
    }
    false
}

/// Strips generic arguments: `java.util.List<java.lang.String>` becomes `java.util.List`.
pub fn erase_generics(type_name: &str) -> &str {
    match type_name.find('<') {
        Some(idx) => type_name[..idx].trim_end(),
        None => type_name,
    }
}
