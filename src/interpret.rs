//! The token-stream interpreter.
//!
//! Turns a flat, comma-split token sequence into a filter fragment tree. The
//! stream has no structural delimiters beyond the `$` sigil: each iteration
//! classifies the two leading tokens into one of four windows (field/operator,
//! field/literal, leading combinator, leading operator), consumes a variable
//! number of tokens, and dispatches to the operator formatter. Logical
//! combinators (`$or`, `$and`, `$nor`) carry a caller-declared token count and
//! recurse into the same interpreter for their operand block.
//!
//! Conditions are collected as an ordered sequence of `(key, value)` pairs
//! rather than a keyed map. Inside one combinator block the same field name
//! may appear several times and each occurrence must survive as a distinct
//! sibling; the pair sequence preserves them all, and only the final
//! non-combinator scope collapses repeats last-write-wins when the fragment
//! is materialized.
//!
//! Malformed input never raises: unknown operators, short argument lists, and
//! missing counts degrade by omission, each recorded as a [`Diagnostic`] on
//! the result.

use crate::format::format_operator;
use crate::fragment::Fragment;
use crate::ops::{ArgShape, arg_shape, is_operator_token};
use crate::value::Value;

/// Non-fatal problems found while interpreting a stream. These accompany the
/// best-effort output instead of aborting it.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A sigil-prefixed token with no operator table entry; the condition was
    /// dropped rather than forwarded.
    UnknownOperator(String),

    /// An operator reached the end of the stream before its argument.
    MissingArgument(String),

    /// An array-shaped operator without a usable decimal argument count; its
    /// argument list was treated as empty.
    MissingCount(String),

    /// A `$regex` pattern that failed to compile.
    InvalidRegex { pattern: String, error: String },

    /// A leading operator token with no table entry and no preceding field;
    /// the rest of the stream was abandoned.
    Structural(String),

    /// A sort direction that did not parse as an integer; the pair was
    /// skipped.
    InvalidSortDirection { field: String, raw: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownOperator(op) => write!(f, "unrecognized operator: {}", op),
            Diagnostic::MissingArgument(op) => write!(f, "missing argument for operator {}", op),
            Diagnostic::MissingCount(op) => {
                write!(f, "missing or invalid argument count for {}", op)
            }
            Diagnostic::InvalidRegex { pattern, error } => {
                write!(f, "invalid regex pattern '{}': {}", pattern, error)
            }
            Diagnostic::Structural(token) => {
                write!(f, "operator {} has no preceding field or value", token)
            }
            Diagnostic::InvalidSortDirection { field, raw } => {
                write!(f, "sort direction for '{}' is not an integer: {}", field, raw)
            }
        }
    }
}

impl std::error::Error for Diagnostic {}

/// The interpreter's output: conditions in encounter order, with duplicates
/// preserved, plus everything that went wrong along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpretation {
    pub conditions: Vec<(String, Value)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Interpretation {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Materializes the conditions into a fragment, collapsing repeated keys
    /// last-write-wins. Valid at the top level only; combinator blocks keep
    /// the pair representation.
    pub fn into_fragment(self) -> Fragment {
        Fragment::from_pairs(self.conditions)
    }

    pub fn fragment(&self) -> Fragment {
        Fragment::from_pairs(self.conditions.clone())
    }
}

/// Interprets a flat token stream into filter conditions.
///
/// # Examples
///
/// ```
/// use query_sieve::interpret;
///
/// let result = interpret(&["price", "12", "location", "$gte", "5"]);
/// let fragment = result.into_fragment();
/// assert_eq!(fragment.get("price").and_then(|v| v.as_str()), Some("12"));
/// let location = fragment.get("location").and_then(|v| v.as_fragment()).unwrap();
/// assert_eq!(location.get("$gte").and_then(|v| v.as_str()), Some("5"));
/// ```
pub fn interpret(tokens: &[&str]) -> Interpretation {
    let mut diagnostics = Vec::new();
    let conditions = digest(tokens, &mut diagnostics);
    Interpretation {
        conditions,
        diagnostics,
    }
}

/// Explicit position over the token stream. Consumption only ever moves
/// forward; consumed tokens are never revisited.
struct Cursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [&'a str]) -> Self {
        Cursor { tokens, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    fn peek(&self, offset: usize) -> Option<&'a str> {
        self.tokens.get(self.pos + offset).copied()
    }

    fn take(&mut self) -> Option<&'a str> {
        let token = self.peek(0);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Takes up to `n` tokens; a count past the end truncates.
    fn take_n(&mut self, n: usize) -> &'a [&'a str] {
        let end = (self.pos + n).min(self.tokens.len());
        let taken = &self.tokens[self.pos..end];
        self.pos = end;
        taken
    }
}

pub(crate) fn digest(tokens: &[&str], diagnostics: &mut Vec<Diagnostic>) -> Vec<(String, Value)> {
    let mut cursor = Cursor::new(tokens);
    let mut conditions = Vec::new();

    // A dangling single token is a leftover of an earlier explicit-count
    // argument list, not an error; the loop simply leaves it behind.
    while cursor.remaining() > 1 {
        let (Some(head), Some(next)) = (cursor.peek(0), cursor.peek(1)) else {
            break;
        };

        if !is_operator_token(head) {
            if is_operator_token(next) {
                field_then_operator(&mut cursor, &mut conditions, diagnostics);
            } else {
                // Plain equality shorthand: field followed by a verbatim,
                // uncoerced literal.
                let field = take_owned(&mut cursor);
                let literal = take_owned(&mut cursor);
                conditions.push((field, Value::String(literal)));
            }
            continue;
        }

        match arg_shape(head) {
            Some(ArgShape::ArrayExpressions) => {
                leading_combinator(&mut cursor, &mut conditions, diagnostics);
            }
            Some(ArgShape::ArrayValues) => {
                // Bare array operator describing the current field, which the
                // caller supplies one level up. Keyed by the operator itself.
                let op = take_owned(&mut cursor);
                let count = read_count(&mut cursor, &op, diagnostics);
                let args = cursor.take_n(count);
                if let Some(value) = format_operator(&op, args, diagnostics) {
                    conditions.push((op, value));
                }
            }
            Some(_) => {
                let op = take_owned(&mut cursor);
                let args: Vec<&str> = cursor.take().into_iter().collect();
                if let Some(value) = format_operator(&op, &args, diagnostics) {
                    conditions.push((op, value));
                }
            }
            None => {
                // Formation error: a leading unknown operator leaves no way
                // to resynchronize. Keep what has accumulated so far.
                diagnostics.push(Diagnostic::Structural(head.to_string()));
                break;
            }
        }
    }

    conditions
}

fn field_then_operator(
    cursor: &mut Cursor<'_>,
    conditions: &mut Vec<(String, Value)>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let field = take_owned(cursor);
    let op = take_owned(cursor);

    let args: Vec<&str> = match arg_shape(&op) {
        Some(ArgShape::ArrayValues) | Some(ArgShape::ArrayExpressions) => {
            // The token after the operator is the caller-declared argument
            // count; it is consumed here and never forwarded.
            let count = read_count(cursor, &op, diagnostics);
            cursor.take_n(count).to_vec()
        }
        _ => cursor.take().into_iter().collect(),
    };

    if let Some(value) = format_operator(&op, &args, diagnostics) {
        conditions.push((field, Value::Fragment(Fragment::singleton(op, value))));
    }
}

fn leading_combinator(
    cursor: &mut Cursor<'_>,
    conditions: &mut Vec<(String, Value)>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let op = take_owned(cursor);
    let count = read_count(cursor, &op, diagnostics);
    let block = cursor.take_n(count);

    let nested = digest(block, diagnostics);

    // Each pair of the recursive result becomes exactly one element of the
    // combinator's sequence, in order. Repeated field names within the block
    // therefore survive as distinct siblings instead of merging.
    let mut elements = Vec::with_capacity(nested.len());
    for (key, value) in nested {
        let value = match value {
            Value::String(s) if s == "null" => Value::Null,
            other => other,
        };
        elements.push(Fragment::singleton(key, value));
    }

    conditions.push((op, Value::FragmentList(elements)));
}

fn read_count(cursor: &mut Cursor<'_>, op: &str, diagnostics: &mut Vec<Diagnostic>) -> usize {
    match cursor.take().map(str::parse::<usize>) {
        Some(Ok(n)) => n,
        _ => {
            diagnostics.push(Diagnostic::MissingCount(op.to_string()));
            0
        }
    }
}

fn take_owned(cursor: &mut Cursor<'_>) -> String {
    cursor.take().unwrap_or_default().to_string()
}
