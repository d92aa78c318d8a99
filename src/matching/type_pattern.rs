//! Qualifying-type patterns: `java.util.List`, `java.util.*`, `com..Service`,
//! `java.util.Collection+`.

use std::fmt;

use regex::Regex;

use crate::error::MalformedPatternError;
use crate::ir::types::{TypeHierarchy, any_supertype, erase_generics};

/// A compiled type pattern.
///
/// `*` matches within one name segment, `..` matches any number of whole
/// segments (including none) and a trailing `+` also accepts subtypes of
/// whatever the rest of the pattern matches.
#[derive(Debug, Clone)]
pub struct TypePattern {
    text: String,
    /// Set when the pattern has no wildcards; compared without the regex.
    literal: Option<String>,
    regex: Regex,
    subtypes: bool,
}

impl TypePattern {
    pub fn compile(text: &str) -> Result<TypePattern, MalformedPatternError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MalformedPatternError::new(text, "empty type pattern"));
        }
        let (body, subtypes) = match trimmed.strip_suffix('+') {
            Some(body) => (body, true),
            None => (trimmed, false),
        };
        if body.is_empty() {
            return Err(MalformedPatternError::new(text, "'+' without a type"));
        }
        if body.starts_with("..") || body.ends_with('.') {
            return Err(MalformedPatternError::new(text, "'..' must sit between name segments"));
        }
        if body.contains("...") {
            return Err(MalformedPatternError::new(text, "unexpected '...'"));
        }

        let mut source = String::from("^");
        let mut wildcard = false;
        let mut chars = body.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '.' if chars.peek() == Some(&'.') => {
                    chars.next();
                    source.push_str(r"\.(?:[\w$]+\.)*");
                    wildcard = true;
                }
                '.' => source.push_str(r"\."),
                '*' => {
                    source.push_str(r"[\w$]*");
                    wildcard = true;
                }
                '[' | ']' | '$' => {
                    source.push('\\');
                    source.push(c);
                }
                c if c.is_alphanumeric() || c == '_' => source.push(c),
                other => {
                    return Err(MalformedPatternError::new(
                        text,
                        format!("unexpected character '{}' in type pattern", other),
                    ));
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source)
            .map_err(|e| MalformedPatternError::new(text, e.to_string()))?;
        Ok(TypePattern {
            text: trimmed.to_string(),
            literal: (!wildcard).then(|| body.to_string()),
            regex,
            subtypes,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn matches_subtypes(&self) -> bool {
        self.subtypes
    }

    /// Matches `type_name` itself, ignoring the subtype flag.
    pub fn matches(&self, type_name: &str) -> bool {
        let erased = erase_generics(type_name);
        match &self.literal {
            Some(literal) => literal == erased,
            None => self.regex.is_match(erased),
        }
    }

    /// Matches `type_name`, or when the pattern ends in `+`, any of its supertypes.
    pub fn matches_in(&self, type_name: &str, hierarchy: &dyn TypeHierarchy) -> bool {
        if self.matches(type_name) {
            return true;
        }
        self.subtypes
            && any_supertype(hierarchy, type_name, |class| {
                self.matches(&class.fully_qualified_name)
            })
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
