//! Query primitives: sort directives, list options and filter criteria.
//!
//! Fields are addressed by name on the record's JSON form. Equality is exact
//! (numbers compare numerically, so `1` equals `1.0`); ordering follows a
//! fixed rank across JSON kinds so mixed collections still sort
//! deterministically.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

/// Field ordering for `list`/`filter`.
///
/// Parsed from the portal's string form: `"created_date"` sorts ascending,
/// `"-created_date"` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDirective {
    /// Field to order by.
    pub field: String,
    /// True for descending order.
    pub descending: bool,
}

impl SortDirective {
    /// Ascending order on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parse the string form. Blank input (or a bare `-`) means no directive.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest.trim(), true),
            None => (raw, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }

    /// Compare two records' field maps under this directive.
    #[must_use]
    pub fn compare(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Ordering and truncation applied to a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Sort directive; `None` keeps insertion order.
    pub sort: Option<SortDirective>,
    /// Maximum number of records returned; `None` is unlimited.
    pub limit: Option<usize>,
}

impl Query {
    /// Insertion order, unlimited.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort directive from its string form.
    #[must_use]
    pub fn sort(mut self, directive: &str) -> Self {
        self.sort = SortDirective::parse(directive);
        self
    }

    /// Set an explicit sort directive.
    #[must_use]
    pub fn sort_by(mut self, directive: SortDirective) -> Self {
        self.sort = Some(directive);
        self
    }

    /// Truncate to at most `limit` records.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Conjunction of exact field matches.
///
/// An empty criteria matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    fields: Map<String, Value>,
}

impl Criteria {
    /// Criteria matching everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// True when no field is constrained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a record's field map satisfies every constraint.
    ///
    /// A field missing from the record never matches, even when the expected
    /// value is `null`.
    #[must_use]
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| record.get(field).is_some_and(|v| values_equal(v, expected)))
    }
}

impl From<Map<String, Value>> for Criteria {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Exact JSON equality, with numbers compared by value.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn parse_instant(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(s)) if parse_instant(s).is_some() => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

fn compare_strings(a: &str, b: &str) -> Ordering {
    // Only reached for strings of the same rank: either both parse as
    // RFC 3339 or neither does.
    match (parse_instant(a), parse_instant(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// Total order over optional JSON values used by sort directives.
///
/// missing/null < booleans < numbers < RFC 3339 strings < other strings <
/// arrays < objects. RFC 3339 strings compare by instant, then by code
/// point; other strings by code point. Arrays
/// and objects compare equal among themselves, so a stable sort keeps
/// their insertion order.
#[must_use]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = kind_rank(a).cmp(&kind_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => compare_strings(x, y),
        _ => Ordering::Equal,
    }
}
