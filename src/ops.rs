/// The character that marks a token as an operator reference.
pub const SIGIL: char = '$';

/// Argument-shape categories. The shape of an operator fully determines how
/// many tokens it consumes from the stream and how they are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// One scalar argument, coerced.
    Value,
    /// One argument compared against the literal string `"true"`.
    Boolean,
    /// A caller-counted list of scalar arguments.
    ArrayValues,
    /// A caller-counted token block that is itself re-interpreted.
    ArrayExpressions,
}

/// Whether a token is an operator reference rather than a field name or
/// literal value.
pub fn is_operator_token(token: &str) -> bool {
    token.starts_with(SIGIL)
}

/// Looks up the argument shape for an operator token.
///
/// Unknown sigil-prefixed tokens return `None` and are rejected by the
/// formatter rather than forwarded into the underlying query. Tokens without
/// the sigil are never looked up by callers.
pub fn arg_shape(token: &str) -> Option<ArgShape> {
    match token {
        "$eq" | "$gt" | "$gte" | "$lt" | "$lte" | "$ne" | "$type" | "$not" | "$size" => {
            Some(ArgShape::Value)
        }
        "$exists" => Some(ArgShape::Boolean),
        "$in" | "$nin" | "$mod" | "$all" | "$regex" => Some(ArgShape::ArrayValues),
        "$or" | "$nor" | "$and" => Some(ArgShape::ArrayExpressions),
        _ => None,
    }
}

#[test]
fn test_shapes() {
    assert_eq!(arg_shape("$gte"), Some(ArgShape::Value));
    assert_eq!(arg_shape("$exists"), Some(ArgShape::Boolean));
    assert_eq!(arg_shape("$nin"), Some(ArgShape::ArrayValues));
    assert_eq!(arg_shape("$or"), Some(ArgShape::ArrayExpressions));
    assert_eq!(arg_shape("$where"), None);
    assert_eq!(arg_shape("price"), None);
}

#[test]
fn test_operator_detection() {
    assert!(is_operator_token("$gt"));
    assert!(!is_operator_token("price"));
    assert!(!is_operator_token(""));
}
