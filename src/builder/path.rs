//! Predicate text preparation and field-accessor flattening.

use crate::core::{MapperError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use sqlparser::ast::{AccessExpr, Expr, Subscript, Value as SqlValue};

lazy_static! {
    // `p => ...` or `(p) => ...`
    static ref LAMBDA_HEAD: Regex =
        Regex::new(r"^\s*\(?\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)?\s*=>\s*").unwrap();
}

/// Split an optional lambda head off the predicate text
pub(crate) fn split_lambda(text: &str) -> (Option<&str>, &str) {
    match LAMBDA_HEAD.captures(text) {
        Some(caps) => {
            let param = caps.get(1).map(|m| m.as_str());
            let body_start = caps.get(0).map(|m| m.end()).unwrap_or(0);
            (param, &text[body_start..])
        }
        None => (None, text),
    }
}

/// Rewrite C-style operators to SQL ones outside of string literals.
///
/// `&&` -> `AND`, `||` -> `OR`, `==` -> `=`, `"text"` -> `'text'`, and numeric
/// indexers (`[0]`) are removed.
pub(crate) fn normalize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match (c, next) {
            ('\'', _) => {
                i = copy_single_quoted(&chars, i, &mut out);
                continue;
            }
            ('"', _) => {
                i = convert_double_quoted(&chars, i, &mut out);
                continue;
            }
            ('&', Some('&')) => {
                out.push_str(" AND ");
                i += 2;
                continue;
            }
            ('|', Some('|')) => {
                out.push_str(" OR ");
                i += 2;
                continue;
            }
            ('=', Some('=')) => {
                out.push('=');
                i += 2;
                continue;
            }
            ('[', _) => {
                if let Some(len) = indexer_len(&chars[i..]) {
                    i += len;
                    continue;
                }
                out.push(c);
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

fn copy_single_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('\'');
    let mut i = start + 1;
    while i < chars.len() {
        out.push(chars[i]);
        if chars[i] == '\'' {
            return i + 1;
        }
        i += 1;
    }
    i
}

fn convert_double_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('\'');
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '"' => {
                out.push('\'');
                return i + 1;
            }
            '\\' if i + 1 < chars.len() => {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '\'' => out.push_str("''"),
            other => out.push(other),
        }
        i += 1;
    }
    i
}

/// Length of a `[ 12 ]` indexer at the start of `chars`
fn indexer_len(chars: &[char]) -> Option<usize> {
    let close = chars.iter().position(|c| *c == ']')?;
    let inner: String = chars[1..close].iter().collect();
    let inner = inner.trim();
    if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
        Some(close + 1)
    } else {
        None
    }
}

/// Flatten a member-access chain into its segment names, outermost first
pub(crate) fn flatten(expr: &Expr, out: &mut Vec<String>) -> Result<()> {
    match expr {
        Expr::Identifier(ident) => out.push(ident.value.clone()),
        Expr::CompoundIdentifier(idents) => {
            out.extend(idents.iter().map(|i| i.value.clone()));
        }
        Expr::CompoundFieldAccess { root, access_chain } => {
            flatten(root, out)?;
            for access in access_chain {
                match access {
                    AccessExpr::Dot(inner) => flatten(inner, out)?,
                    AccessExpr::Subscript(Subscript::Index { index }) if is_index_literal(index) => {}
                    other => {
                        return Err(MapperError::UnsupportedExpressionShape(format!(
                            "unsupported member access: {:?}",
                            other
                        )));
                    }
                }
            }
        }
        other => {
            return Err(MapperError::UnsupportedExpressionShape(format!(
                "expected a field accessor, got: {}",
                other
            )));
        }
    }
    Ok(())
}

fn is_index_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Value(v) if matches!(v.value, SqlValue::Number(_, _)))
}

/// Dotted path for an accessor, with the lambda parameter dropped
pub(crate) fn field_path(expr: &Expr, parameter: Option<&str>) -> Result<String> {
    let mut segments = Vec::new();
    flatten(expr, &mut segments)?;

    if let Some(param) = parameter {
        if segments.first().map(String::as_str) == Some(param) {
            if segments.len() == 1 {
                return Err(MapperError::UnsupportedExpressionShape(format!(
                    "'{}' refers to the whole document, not a field",
                    param
                )));
            }
            segments.remove(0);
        }
    }

    Ok(segments.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lambda() {
        assert_eq!(split_lambda("post => post.Title"), (Some("post"), "post.Title"));
        assert_eq!(split_lambda("(p)=>p.Title == 'x'"), (Some("p"), "p.Title == 'x'"));
        assert_eq!(split_lambda("Title = 'x'"), (None, "Title = 'x'"));
    }

    #[test]
    fn test_normalize_operators() {
        assert_eq!(
            normalize("p.A == \"x\" && p.B[0].C != null || p.D >= 2"),
            "p.A = 'x'  AND  p.B.C != null  OR  p.D >= 2"
        );
    }

    #[test]
    fn test_normalize_leaves_literals_alone() {
        assert_eq!(normalize("A = 'a && b [1]'"), "A = 'a && b [1]'");
        assert_eq!(normalize("A == \"it's\""), "A = 'it''s'");
        assert_eq!(normalize("A[i] = 1"), "A[i] = 1");
    }
}
