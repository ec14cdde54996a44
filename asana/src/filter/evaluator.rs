use super::ast::Expr;
use serde_json::Value;
use thiserror::Error;

/// Reasons an expression cannot be evaluated against one event
///
/// Never surfaced to callers: an event that fails evaluation is excluded.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum EvalError {
    #[error("field '{0}' does not exist")]
    MissingField(String),

    #[error("cannot read '{field}' from a non-object value")]
    NotAnObject { field: String },

    #[error("expected a boolean, found {0}")]
    NotBoolean(String),
}

/// Evaluates `expr` with `event` bound to `root`
pub(crate) fn evaluate(expr: &Expr, root: &Value) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(segments) => resolve(root, segments).cloned(),
        Expr::Not(inner) => Ok(Value::Bool(!truth(inner, root)?)),
        Expr::And(left, right) => Ok(Value::Bool(truth(left, root)? && truth(right, root)?)),
        Expr::Or(left, right) => Ok(Value::Bool(truth(left, root)? || truth(right, root)?)),
        Expr::Eq(left, right) => Ok(Value::Bool(equal(
            &evaluate(left, root)?,
            &evaluate(right, root)?,
        ))),
        Expr::Ne(left, right) => Ok(Value::Bool(!equal(
            &evaluate(left, root)?,
            &evaluate(right, root)?,
        ))),
    }
}

/// Evaluates `expr` and requires a boolean
pub(crate) fn truth(expr: &Expr, root: &Value) -> Result<bool, EvalError> {
    match evaluate(expr, root)? {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::NotBoolean(other.to_string())),
    }
}

/// Follows `segments` from `root`
///
/// A missing last key reads as `null`. Reading through a missing key or a
/// non-object value is an error.
fn resolve<'v>(root: &'v Value, segments: &[String]) -> Result<&'v Value, EvalError> {
    static ABSENT: Value = Value::Null;

    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let object = current.as_object().ok_or_else(|| EvalError::NotAnObject {
            field: segment.clone(),
        })?;
        current = match object.get(segment) {
            Some(value) => value,
            None if i + 1 == segments.len() => &ABSENT,
            None => return Err(EvalError::MissingField(segment.clone())),
        };
    }
    Ok(current)
}

/// JSON equality, with numbers compared by value (`1 == 1.0`)
fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}
