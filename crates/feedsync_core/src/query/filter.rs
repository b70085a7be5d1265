//! Query filters.
//!
//! A [`Filter`] is sent to the backend as its JSON filter object and can also
//! be evaluated locally, so that real-time inserts into a filtered collection
//! only admit matching items.

use crate::ids::FeedId;
use serde_json::{Map, Value};
use std::fmt;

/// A scalar or list value a filter compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Missing value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Text.
    Text(String),
    /// Multi-valued field (matches when any element matches).
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Returns true for [`FilterValue::Null`] and empty lists.
    pub fn is_null(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::List(values) => values.is_empty(),
            _ => false,
        }
    }

    /// Returns true if this (actual) value satisfies `expected`.
    ///
    /// A list matches when any of its elements equals `expected`.
    pub fn satisfies(&self, expected: &FilterValue) -> bool {
        match self {
            FilterValue::List(values) => values.iter().any(|value| value == expected),
            value => value == expected,
        }
    }

    /// Renders the value as JSON.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Null => Value::Null,
            FilterValue::Bool(b) => Value::Bool(*b),
            FilterValue::Int(i) => Value::from(*i),
            FilterValue::Text(s) => Value::String(s.clone()),
            FilterValue::List(values) => Value::Array(values.iter().map(|v| v.to_json()).collect()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<&FeedId> for FilterValue {
    fn from(value: &FeedId) -> Self {
        FilterValue::Text(value.raw_value())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// A field a model collection can be filtered by.
pub trait FilterField: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Model the field belongs to.
    type Model;

    /// Name of the field in backend requests.
    fn remote_name(&self) -> &'static str;

    /// Extracts the field's value from a model for local matching.
    fn value_of(&self, model: &Self::Model) -> FilterValue;
}

/// A filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<F> {
    /// Field equals value.
    Equal(F, FilterValue),
    /// Field equals any of the values.
    In(F, Vec<FilterValue>),
    /// Field is (or is not) present.
    Exists(F, bool),
    /// All sub-filters match.
    And(Vec<Filter<F>>),
    /// Any sub-filter matches.
    Or(Vec<Filter<F>>),
}

impl<F: FilterField> Filter<F> {
    /// `field == value`.
    pub fn equal(field: F, value: impl Into<FilterValue>) -> Self {
        Filter::Equal(field, value.into())
    }

    /// `field in values`.
    pub fn any_of<V: Into<FilterValue>>(field: F, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field, values.into_iter().map(Into::into).collect())
    }

    /// `field exists`.
    pub fn exists(field: F, exists: bool) -> Self {
        Filter::Exists(field, exists)
    }

    /// Conjunction.
    pub fn and(filters: Vec<Filter<F>>) -> Self {
        Filter::And(filters)
    }

    /// Disjunction.
    pub fn or(filters: Vec<Filter<F>>) -> Self {
        Filter::Or(filters)
    }

    /// Evaluates the filter against a model.
    pub fn matches(&self, model: &F::Model) -> bool {
        match self {
            Filter::Equal(field, expected) => field.value_of(model).satisfies(expected),
            Filter::In(field, expected) => {
                let actual = field.value_of(model);
                expected.iter().any(|value| actual.satisfies(value))
            }
            Filter::Exists(field, exists) => field.value_of(model).is_null() != *exists,
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(model)),
            Filter::Or(filters) => filters.iter().any(|filter| filter.matches(model)),
        }
    }

    /// Renders the backend JSON filter object.
    pub fn to_json(&self) -> Value {
        match self {
            Filter::Equal(field, value) => field_op(field.remote_name(), "$eq", value.to_json()),
            Filter::In(field, values) => field_op(
                field.remote_name(),
                "$in",
                Value::Array(values.iter().map(|v| v.to_json()).collect()),
            ),
            Filter::Exists(field, exists) => {
                field_op(field.remote_name(), "$exists", Value::Bool(*exists))
            }
            Filter::And(filters) => group("$and", filters),
            Filter::Or(filters) => group("$or", filters),
        }
    }
}

fn field_op(field: &str, op: &str, operand: Value) -> Value {
    let mut inner = Map::new();
    inner.insert(op.to_string(), operand);
    let mut outer = Map::new();
    outer.insert(field.to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn group<F: FilterField>(op: &str, filters: &[Filter<F>]) -> Value {
    let mut outer = Map::new();
    outer.insert(
        op.to_string(),
        Value::Array(filters.iter().map(|f| f.to_json()).collect()),
    );
    Value::Object(outer)
}
