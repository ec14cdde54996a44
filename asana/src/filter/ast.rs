use serde_json::Value;

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    /// Field path below `event`, e.g. `["change", "field"]`
    Path(Vec<String>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Literals other than `true`/`false` can never yield a boolean
    pub fn non_boolean_literal(&self) -> Option<&Value> {
        match self {
            Expr::Literal(Value::Bool(_)) => None,
            Expr::Literal(value) => Some(value),
            _ => None,
        }
    }
}
