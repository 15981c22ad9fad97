//! Graph store port.
//!
//! A narrow contract over a property-graph backing store: parameterized
//! queries plus keyed save/load of the flat session record. Higher components
//! depend only on this trait, never on the native driver, so the store is
//! swappable and the state machine is unit-testable against an in-memory
//! fake.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StoreError;

/// A value in the store's flat property model.
///
/// Nested structures never appear here; they are JSON-encoded into `String`
/// by the persistence layer before they reach the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    StringList(Vec<String>),
}

impl StoreValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for StoreValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for StoreValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for StoreValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for StoreValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value)
    }
}

/// One row of a query result / one flat node record, keyed by field name.
pub type Record = BTreeMap<String, StoreValue>;

/// Named query parameters. Values are always bound, never interpolated.
pub type Params = Vec<(String, StoreValue)>;

/// Build a params list from `(&str, impl Into<StoreValue>)` pairs.
pub fn params<const N: usize>(pairs: [(&str, StoreValue); N]) -> Params {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Uniform query/save/load contract over the property-graph store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a read query and collect the named projected columns of every row.
    /// Columns the row lacks (or holds null in) come back as `StoreValue::Null`.
    async fn query(
        &self,
        text: &str,
        params: Params,
        columns: &[&str],
    ) -> Result<Vec<Record>, StoreError>;

    /// Run a write query with no result rows.
    async fn run(&self, text: &str, params: Params) -> Result<(), StoreError>;

    /// Upsert the session record stored under `key` (MERGE semantics:
    /// repeated saves of the same key never create duplicates).
    async fn save(&self, key: &str, record: Record) -> Result<(), StoreError>;

    /// Load the named fields of the session record stored under `key`.
    /// Returns `None` when no record exists for the key.
    async fn load(&self, key: &str, fields: &[&str]) -> Result<Option<Record>, StoreError>;

    /// Release the underlying connection.
    async fn close(&self);
}
