use chrono::{DateTime, Utc};
use regex::Regex;

use crate::fragment::Fragment;

/// A value attached to a key in a filter fragment.
///
/// Every scalar arrives as a string token; coercion and operator formatting
/// widen it into the variants below. Fragments nest: a field condition such
/// as `location,$gte,5` becomes `Fragment(..)` and a logical combinator
/// becomes `FragmentList(..)` with one element per sibling condition.
///
/// # Examples
///
/// ```
/// use query_sieve::Value;
///
/// let literal = Value::String("12".to_string());
/// assert_eq!(literal.as_str(), Some("12"));
///
/// let flag = Value::Boolean(true);
/// assert_eq!(flag.as_bool(), Some(true));
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// The literal `null` inside a logical combinator block.
    Null,

    /// Result of the boolean operator shape.
    Boolean(bool),

    /// An uncoerced string token.
    String(String),

    /// A `date-`-prefixed token. `None` marks a token whose remainder did not
    /// parse as a date; it is carried through for downstream validation
    /// rather than raised as an error.
    Date(Option<DateTime<Utc>>),

    /// A compiled `$regex` value.
    Regex(Regex),

    /// An array-shaped operator's argument list.
    Array(Vec<Value>),

    /// A nested condition, e.g. the `{$gte: "5"}` under a field name.
    Fragment(Fragment),

    /// A logical combinator's operand list, one fragment per condition.
    FragmentList(Vec<Fragment>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            Value::Regex(re) => Some(re),
            _ => None,
        }
    }

    pub fn as_fragment(&self) -> Option<&Fragment> {
        match self {
            Value::Fragment(fragment) => Some(fragment),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Fragment]> {
        match self {
            Value::FragmentList(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// Regex carries no equality of its own; compare compiled patterns by source.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Fragment(a), Value::Fragment(b)) => a == b,
            (Value::FragmentList(a), Value::FragmentList(b)) => a == b,
            _ => false,
        }
    }
}
