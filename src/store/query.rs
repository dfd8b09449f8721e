//! Collection queries
//!
//! Queries are linear scans over one collection in insertion order. The
//! operator set is closed: equality and inequality. Anything else is
//! rejected at parse time instead of silently matching everything, and
//! results are never sorted here; ordering beyond insertion order is the
//! caller's job.

use crate::core::error::StoreError;
use crate::store::document::{Document, Fields};
use crate::store::file::FileStore;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Supported filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Exact match on the field value
    Eq,
    /// Exact mismatch on the field value
    Ne,
}

impl FromStr for FilterOp {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(FilterOp::Eq),
            "!=" => Ok(FilterOp::Ne),
            other => Err(StoreError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Eq => f.write_str("=="),
            FilterOp::Ne => f.write_str("!="),
        }
    }
}

/// One field condition.
#[derive(Debug, Clone)]
pub(crate) struct Filter {
    pub(crate) field: String,
    pub(crate) op: FilterOp,
    pub(crate) value: Value,
}

impl Filter {
    /// A missing field is not equal to any value, so `Eq` fails and `Ne`
    /// matches, same as comparing against an absent property.
    pub(crate) fn matches(&self, fields: &Fields) -> bool {
        let actual = fields.get(&self.field);
        match self.op {
            FilterOp::Eq => actual == Some(&self.value),
            FilterOp::Ne => actual != Some(&self.value),
        }
    }
}

/// Builder for filtered reads of one collection.
#[must_use = "queries do nothing until .documents() or .first() runs"]
pub struct Query<'a> {
    store: &'a FileStore,
    collection: String,
    filters: Vec<Filter>,
    limit: Option<usize>,
}

impl<'a> Query<'a> {
    pub(crate) fn new(store: &'a FileStore, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Add a field condition. Conditions are ANDed.
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Truncate results to the first `n` matches in insertion order.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Execute and collect matching documents.
    pub fn documents(self) -> Vec<Document> {
        self.store.scan(&self.collection, &self.filters, self.limit)
    }

    /// Execute and return the first match, if any.
    pub fn first(self) -> Option<Document> {
        self.store
            .scan(&self.collection, &self.filters, Some(1))
            .into_iter()
            .next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_operators() {
        assert_eq!("==".parse::<FilterOp>().unwrap(), FilterOp::Eq);
        assert_eq!("!=".parse::<FilterOp>().unwrap(), FilterOp::Ne);
    }

    #[test]
    fn rejects_unknown_operators() {
        for op in [">", "<", ">=", "array-contains", ""] {
            let err = op.parse::<FilterOp>().unwrap_err();
            assert!(matches!(err, StoreError::UnknownOperator(_)), "{op}");
        }
    }

    #[test]
    fn missing_field_fails_eq_and_passes_ne() {
        let fields: Fields = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        let eq = Filter {
            field: "category".into(),
            op: FilterOp::Eq,
            value: "villa".into(),
        };
        let ne = Filter {
            field: "category".into(),
            op: FilterOp::Ne,
            value: "villa".into(),
        };
        assert!(!eq.matches(&fields));
        assert!(ne.matches(&fields));
    }
}
