//! Signature patterns over resolved method types.
//!
//! ```text
//! java.util.List add(..)
//! com.example.Service process(java.lang.String, *)
//! java.util.Collection+ size()
//! java.util.ArrayList <constructor>(int)
//! org.junit..* assert*(..)
//! ```

use std::fmt;

use regex::Regex;

use crate::error::MalformedPatternError;
use crate::ir::node::Node;
use crate::ir::types::{EmptyHierarchy, MethodType, TypeHierarchy, any_supertype};

use super::type_pattern::TypePattern;

#[derive(Debug, Clone)]
enum NamePattern {
    Any,
    Exact(String),
    Glob(Regex),
}

impl NamePattern {
    fn compile(pattern: &str, name: &str) -> Result<NamePattern, MalformedPatternError> {
        if name == "*" {
            return Ok(NamePattern::Any);
        }
        if name == MethodType::CONSTRUCTOR_NAME {
            return Ok(NamePattern::Exact(name.to_string()));
        }
        let allowed = |c: &char| c.is_alphanumeric() || matches!(c, '_' | '$' | '*');
        if let Some(bad) = name.chars().find(|c| !allowed(c)) {
            return Err(MalformedPatternError::new(
                pattern,
                format!("unexpected character '{}' in method name", bad),
            ));
        }
        if !name.contains('*') {
            return Ok(NamePattern::Exact(name.to_string()));
        }
        let source = format!("^{}$", name.replace('$', r"\$").replace('*', r"[\w$]*"));
        Regex::new(&source)
            .map(NamePattern::Glob)
            .map_err(|e| MalformedPatternError::new(pattern, e.to_string()))
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Exact(expected) => expected == name,
            NamePattern::Glob(regex) => regex.is_match(name),
        }
    }
}

#[derive(Debug, Clone)]
enum ParamSlot {
    Type(TypePattern),
    /// `*`: exactly one parameter of any type.
    One,
    /// `..`: any number of parameters, including none.
    Rest,
}

/// Parameter slots against concrete parameter types. `..` may appear
/// anywhere and backtracks.
fn match_params(slots: &[ParamSlot], params: &[String]) -> bool {
    match slots.split_first() {
        None => params.is_empty(),
        Some((ParamSlot::Rest, rest)) => {
            (0..=params.len()).any(|skip| match_params(rest, &params[skip..]))
        }
        Some((ParamSlot::One, rest)) => !params.is_empty() && match_params(rest, &params[1..]),
        Some((ParamSlot::Type(pattern), rest)) => {
            params.first().is_some_and(|p| pattern.matches(p)) && match_params(rest, &params[1..])
        }
    }
}

/// Compiled `<qualifying-type> <member-name>(<param-types>)` pattern.
///
/// Compilation is the only fallible step. A compiled matcher is immutable and
/// can be shared across threads and reused for any number of candidates.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    text: String,
    declaring: TypePattern,
    name: NamePattern,
    params: Vec<ParamSlot>,
    match_overrides: bool,
}

impl MethodMatcher {
    pub fn compile(text: &str) -> Result<MethodMatcher, MalformedPatternError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MalformedPatternError::new(text, "empty method pattern"));
        }
        let open = trimmed
            .find('(')
            .ok_or_else(|| MalformedPatternError::new(text, "missing parameter list"))?;
        let Some(params_text) = trimmed[open + 1..].strip_suffix(')') else {
            return Err(MalformedPatternError::new(text, "parameter list is not closed"));
        };
        if params_text.contains('(') || params_text.contains(')') {
            return Err(MalformedPatternError::new(text, "unbalanced parentheses"));
        }

        let head: Vec<&str> = trimmed[..open].split_whitespace().collect();
        let (declaring, name) = match head.as_slice() {
            [declaring, name] => (*declaring, *name),
            [_] | [] => return Err(MalformedPatternError::new(text, "missing method name")),
            _ => {
                return Err(MalformedPatternError::new(
                    text,
                    "expected '<type> <name>(<params>)'",
                ));
            }
        };

        let params = if params_text.trim().is_empty() {
            Vec::new()
        } else {
            params_text
                .split(',')
                .map(|slot| match slot.trim() {
                    "" => Err(MalformedPatternError::new(text, "empty parameter slot")),
                    ".." => Ok(ParamSlot::Rest),
                    "*" => Ok(ParamSlot::One),
                    other => TypePattern::compile(other)
                        .map(ParamSlot::Type)
                        .map_err(|e| MalformedPatternError::new(text, e.reason)),
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(MethodMatcher {
            text: trimmed.to_string(),
            declaring: TypePattern::compile(declaring)
                .map_err(|e| MalformedPatternError::new(text, e.reason))?,
            name: NamePattern::compile(text, name)?,
            params,
            match_overrides: false,
        })
    }

    /// Also match methods that override one declared on a matching supertype.
    pub fn match_overrides(mut self, enabled: bool) -> Self {
        self.match_overrides = enabled;
        self
    }

    pub fn is_matching_overrides(&self) -> bool {
        self.match_overrides
    }

    pub fn pattern(&self) -> &str {
        &self.text
    }

    /// Name and parameter shape only; the declaring type is not consulted.
    fn matches_shape(&self, method: &MethodType) -> bool {
        self.name.matches(&method.name) && match_params(&self.params, &method.parameter_types)
    }

    pub fn matches_method(&self, method: &MethodType) -> bool {
        self.matches_method_in(method, &EmptyHierarchy)
    }

    pub fn matches_method_in(&self, method: &MethodType, hierarchy: &dyn TypeHierarchy) -> bool {
        if !self.matches_shape(method) {
            return false;
        }
        if self.declaring.matches_in(&method.declaring_type, hierarchy) {
            return true;
        }
        self.match_overrides
            && any_supertype(hierarchy, &method.declaring_type, |class| {
                class.declared_method(method).is_some()
                    && self.declaring.matches(&class.fully_qualified_name)
            })
    }

    /// Matches a node carrying a resolved method type (invocation,
    /// declaration or constructor call). Untyped nodes never match.
    pub fn matches(&self, node: &Node) -> bool {
        self.matches_in(node, &EmptyHierarchy)
    }

    pub fn matches_in(&self, node: &Node, hierarchy: &dyn TypeHierarchy) -> bool {
        node.method_type()
            .is_some_and(|method| self.matches_method_in(method, hierarchy))
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
