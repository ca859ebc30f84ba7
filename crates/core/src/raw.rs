//! Raw fact records as delivered by the scanning collaborator.
//!
//! Two shapes exist in the wild: a flat legacy record of named signal fields,
//! and a structured record grouped under `meta` / `coverage` / `signals`.
//! The shape is decided exactly once, here, and carried as a tag.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Raw scan facts, tagged by input shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum RawFacts {
    /// Flat record: every signal is a top-level field.
    Legacy(Map<String, Value>),
    /// Grouped record. `coverage` is optional in practice and defaults to empty.
    Structured {
        meta: Map<String, Value>,
        coverage: Map<String, Value>,
        signals: Map<String, Value>,
    },
}

const META_KEYS: &[&str] = &["meta", "metadata"];
const COVERAGE_KEYS: &[&str] = &["coverage"];
const SIGNALS_KEYS: &[&str] = &["signals", "facts"];

impl RawFacts {
    pub fn is_structured(&self) -> bool {
        matches!(self, RawFacts::Structured { .. })
    }
}

impl From<Value> for RawFacts {
    fn from(value: Value) -> Self {
        let Value::Object(mut record) = value else {
            return RawFacts::Legacy(Map::new());
        };

        let meta_key = find_object_key(&record, META_KEYS);
        let signals_key = find_object_key(&record, SIGNALS_KEYS);

        match (meta_key, signals_key) {
            (Some(meta_key), Some(signals_key)) => {
                let meta = take_object(&mut record, meta_key);
                let signals = take_object(&mut record, signals_key);
                let coverage = find_object_key(&record, COVERAGE_KEYS)
                    .map(|key| take_object(&mut record, key))
                    .unwrap_or_default();
                RawFacts::Structured {
                    meta,
                    coverage,
                    signals,
                }
            }
            _ => RawFacts::Legacy(record),
        }
    }
}

fn find_object_key(record: &Map<String, Value>, candidates: &[&'static str]) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|key| matches!(record.get(*key), Some(Value::Object(_))))
}

fn take_object(record: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match record.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Read-only view over one group of a raw record with alias-aware lookup.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields<'a>(Option<&'a Map<String, Value>>);

impl<'a> Fields<'a> {
    pub(crate) fn new(map: &'a Map<String, Value>) -> Self {
        Fields(Some(map))
    }

    pub(crate) fn empty() -> Self {
        Fields(None)
    }

    /// First alias that is present and not `null`.
    pub(crate) fn lookup(&self, aliases: &[&str]) -> Option<&'a Value> {
        let map = self.0?;
        aliases
            .iter()
            .filter_map(|alias| map.get(*alias))
            .find(|value| !value.is_null())
    }

    /// Nested group by alias; absent or non-object groups read as empty.
    pub(crate) fn group(&self, aliases: &[&str]) -> Fields<'a> {
        match self.lookup(aliases) {
            Some(Value::Object(map)) => Fields::new(map),
            _ => Fields::empty(),
        }
    }
}
