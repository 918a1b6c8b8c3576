use regex::Regex;

use crate::coerce::coerce;
use crate::fragment::Fragment;
use crate::interpret::{Diagnostic, digest};
use crate::ops::{ArgShape, arg_shape, is_operator_token};
use crate::value::Value;

/// Formats one operator and its already-sliced argument tokens into the value
/// the operator contributes under its key.
///
/// Returns `None`, with a diagnostic, when the operator carries the sigil but
/// has no table entry or its required argument is missing; the caller drops
/// the condition instead of forwarding it.
pub fn format_operator(op: &str, args: &[&str], diagnostics: &mut Vec<Diagnostic>) -> Option<Value> {
    let shape = arg_shape(op);
    if shape.is_none() && is_operator_token(op) {
        diagnostics.push(Diagnostic::UnknownOperator(op.to_string()));
        return None;
    }

    match shape {
        Some(ArgShape::Value) => {
            let Some(first) = args.first() else {
                diagnostics.push(Diagnostic::MissingArgument(op.to_string()));
                return None;
            };
            Some(coerce(first))
        }

        // Anything other than the literal "true" is false.
        Some(ArgShape::Boolean) => Some(Value::Boolean(args.first() == Some(&"true"))),

        Some(ArgShape::ArrayValues) if op == "$regex" => {
            let Some(pattern) = args.first() else {
                diagnostics.push(Diagnostic::MissingArgument(op.to_string()));
                return None;
            };
            let flags = args.get(1).copied().unwrap_or("");
            match compile_regex(pattern, flags) {
                Ok(re) => Some(Value::Regex(re)),
                Err(error) => {
                    diagnostics.push(Diagnostic::InvalidRegex {
                        pattern: pattern.to_string(),
                        error: error.to_string(),
                    });
                    None
                }
            }
        }

        Some(ArgShape::ArrayValues) => {
            Some(Value::Array(args.iter().map(|arg| coerce(arg)).collect()))
        }

        // A combinator nested as another operator's argument: its tokens are
        // re-interpreted and the merged result wrapped as a one-element list.
        // Top-level combinators take the multi-element path in the
        // interpreter instead.
        Some(ArgShape::ArrayExpressions) => {
            let nested = digest(args, diagnostics);
            Some(Value::FragmentList(vec![Fragment::from_pairs(nested)]))
        }

        // Plain field continuation: first argument, untouched.
        None => {
            let Some(first) = args.first() else {
                diagnostics.push(Diagnostic::MissingArgument(op.to_string()));
                return None;
            };
            Some(Value::String(first.to_string()))
        }
    }
}

/// Compiles a pattern with query-string style flags. `i`, `m`, `s`, and `x`
/// map onto inline groups; flags with no counterpart here (`g`, `u`, `y`) are
/// ignored.
fn compile_regex(pattern: &str, flags: &str) -> Result<Regex, regex::Error> {
    let inline: String = flags
        .chars()
        .filter(|f| matches!(f, 'i' | 'm' | 's' | 'x'))
        .collect();

    if inline.is_empty() {
        Regex::new(pattern)
    } else {
        Regex::new(&format!("(?{}){}", inline, pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_shape_is_strict_true() {
        let mut diagnostics = Vec::new();
        assert_eq!(
            format_operator("$exists", &["true"], &mut diagnostics),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            format_operator("$exists", &["anythingElse"], &mut diagnostics),
            Some(Value::Boolean(false))
        );
        assert_eq!(
            format_operator("$exists", &["false"], &mut diagnostics),
            Some(Value::Boolean(false))
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn regex_takes_pattern_and_flags_uncoerced() {
        let mut diagnostics = Vec::new();
        let value = format_operator("$regex", &["date-title", "i"], &mut diagnostics).unwrap();
        let re = value.as_regex().unwrap();
        // no scalar coercion of the pattern, flags become an inline group
        assert_eq!(re.as_str(), "(?i)date-title");
        assert!(re.is_match("DATE-TITLE"));
    }

    #[test]
    fn bad_regex_degrades_with_diagnostic() {
        let mut diagnostics = Vec::new();
        assert_eq!(format_operator("$regex", &["(unclosed", ""], &mut diagnostics), None);
        assert!(matches!(diagnostics[0], Diagnostic::InvalidRegex { .. }));
    }

    #[test]
    fn unknown_sigil_operator_rejected() {
        let mut diagnostics = Vec::new();
        assert_eq!(format_operator("$__evil", &["x"], &mut diagnostics), None);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnknownOperator("$__evil".to_string())]
        );
    }

    #[test]
    fn array_values_coerce_elementwise() {
        let mut diagnostics = Vec::new();
        let value = format_operator("$in", &["1", "date-2020-01-01"], &mut diagnostics).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items[0], Value::String("1".into()));
        assert!(matches!(items[1], Value::Date(Some(_))));
    }
}
