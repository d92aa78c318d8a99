//! Identity-keyed metadata attached to nodes.
//!
//! Markers never change what a node means; they record search hits and
//! diagnostics so callers can report them after a run. Adding a marker that is
//! already present (same origin, equal payload) is a no-op that returns the
//! original set by `Arc` identity, which keeps the sharing invariant intact when
//! a search recipe runs more than once.

use std::fmt;
use std::sync::Arc;

use archery::ArcK;
use once_cell::sync::Lazy;
use rpds::Vector;
use serde::{Deserialize, Serialize};

static EMPTY_MARKERS: Lazy<Arc<Markers>> = Lazy::new(|| Arc::new(Markers::default()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// What a marker says about its node. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerPayload {
    SearchResult { description: Option<String> },
    Diagnostic { severity: Severity, message: String },
    Custom { kind: String, data: serde_json::Value },
}

impl MarkerPayload {
    pub fn search_result(description: Option<String>) -> Self {
        MarkerPayload::SearchResult { description }
    }

    pub fn diagnostic(severity: Severity, message: impl Into<String>) -> Self {
        MarkerPayload::Diagnostic { severity, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Id of the recipe (or other producer) that attached the marker.
    pub source_id: String,
    pub payload: MarkerPayload,
}

impl Marker {
    pub fn new(source_id: impl Into<String>, payload: MarkerPayload) -> Self {
        Marker { source_id: source_id.into(), payload }
    }

    pub fn is_search_result(&self) -> bool {
        matches!(self.payload, MarkerPayload::SearchResult { .. })
    }
}

/// Ordered, persistent set of markers on one node.
#[derive(Debug, Clone, Default)]
pub struct Markers {
    entries: Vector<Arc<Marker>, ArcK>,
}

impl Markers {
    /// The shared empty set. Every freshly built node points at the same instance.
    pub fn empty() -> Arc<Markers> {
        Arc::clone(&EMPTY_MARKERS)
    }

    /// Adds `marker` unless an equal `(source_id, payload)` is present.
    /// Returns `markers` itself (same `Arc`) when nothing was added.
    pub fn add_if_absent(markers: &Arc<Markers>, marker: Marker) -> Arc<Markers> {
        if markers.contains(&marker) {
            return Arc::clone(markers);
        }
        Arc::new(Markers {
            entries: markers.entries.push_back(Arc::new(marker)),
        })
    }

    /// Removes every marker produced by `source_id`.
    pub fn remove_source(markers: &Arc<Markers>, source_id: &str) -> Arc<Markers> {
        if !markers.iter().any(|m| m.source_id == source_id) {
            return Arc::clone(markers);
        }
        Arc::new(Markers {
            entries: markers
                .iter()
                .filter(|m| m.source_id != source_id)
                .cloned()
                .collect(),
        })
    }

    pub fn contains(&self, marker: &Marker) -> bool {
        self.entries.iter().any(|m| **m == *marker)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Marker>> {
        self.entries.iter()
    }

    pub fn from_source<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a Arc<Marker>> {
        self.entries.iter().filter(move |m| m.source_id == source_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_if_absent_dedups_on_source_and_payload() {
        let empty = Markers::empty();
        let hit = Marker::new("find-methods", MarkerPayload::search_result(Some("call".into())));

        let once = Markers::add_if_absent(&empty, hit.clone());
        let twice = Markers::add_if_absent(&once, hit);
        assert_eq!(once.len(), 1);
        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn test_different_source_is_not_a_duplicate() {
        let payload = MarkerPayload::diagnostic(Severity::Warning, "unused");
        let a = Markers::add_if_absent(&Markers::empty(), Marker::new("a", payload.clone()));
        let ab = Markers::add_if_absent(&a, Marker::new("b", payload));
        assert_eq!(ab.len(), 2);
        assert_eq!(ab.from_source("b").count(), 1);
    }

    #[test]
    fn test_remove_source() {
        let set = Markers::add_if_absent(
            &Markers::empty(),
            Marker::new("a", MarkerPayload::search_result(None)),
        );
        let untouched = Markers::remove_source(&set, "b");
        assert!(Arc::ptr_eq(&set, &untouched));
        assert!(Markers::remove_source(&set, "a").is_empty());
    }

    #[test]
    fn test_payload_serializes_with_tag() {
        let payload = MarkerPayload::diagnostic(Severity::Error, "boom");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "diagnostic");
        assert_eq!(json["severity"], "error");
    }
}
