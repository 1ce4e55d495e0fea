use std::{collections::BTreeSet, fmt::Display};

use crate::{parser::Operator, Func, Identifier};

use super::Bindings;

/// A parsed expression.
///
/// Every node owns its children, and a tree is never mutated once built:
/// editing the source text produces a whole new tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(f64),
    Variable(Identifier),
    Binary(Operator, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Call(Func, Box<Expr>),
}

impl From<f64> for Expr {
    fn from(number: f64) -> Self {
        Expr::Literal(number)
    }
}

impl From<Identifier> for Expr {
    fn from(id: Identifier) -> Self {
        Expr::Variable(id)
    }
}

impl Expr {
    pub fn binary(op: Operator, left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::Binary(op, Box::new(left.into()), Box::new(right.into()))
    }

    pub fn negate(operand: impl Into<Expr>) -> Expr {
        Expr::Negate(Box::new(operand.into()))
    }

    pub fn call(func: Func, arg: impl Into<Expr>) -> Expr {
        Expr::Call(func, Box::new(arg.into()))
    }

    /// Evaluates the tree. Never fails: domain errors come back as NaN or
    /// an infinity and propagate through the rest of the tree.
    pub fn evaluate<B: Bindings + ?Sized>(&self, bindings: &B) -> f64 {
        match self {
            Expr::Literal(n) => *n,
            Expr::Variable(id) => bindings.value_of(*id),
            Expr::Binary(op, left, right) => {
                op.apply(left.evaluate(bindings), right.evaluate(bindings))
            }
            Expr::Negate(operand) => -operand.evaluate(bindings),
            Expr::Call(func, arg) => func.evaluate(arg.evaluate(bindings)),
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Expr::Literal(n) => Some(*n),
            _ => None,
        }
    }

    pub fn variables(&self) -> BTreeSet<Identifier> {
        let mut found = BTreeSet::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables(&self, found: &mut BTreeSet<Identifier>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(id) => {
                found.insert(*id);
            }
            Expr::Binary(_, left, right) => {
                left.collect_variables(found);
                right.collect_variables(found);
            }
            Expr::Negate(operand) | Expr::Call(_, operand) => operand.collect_variables(found),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Variable(_) => 1,
            Expr::Binary(_, left, right) => 1 + left.depth().max(right.depth()),
            Expr::Negate(operand) | Expr::Call(_, operand) => 1 + operand.depth(),
        }
    }

    /// Folds every variable-free subtree into a literal.
    ///
    /// Folding uses the same arithmetic as [`Expr::evaluate`], so the result
    /// evaluates to exactly the same value, NaN included.
    pub fn simplify(&self) -> Expr {
        #[cfg(feature = "tracy")]
        profiling::scope!("Expr::simplify");
        match self {
            Expr::Literal(_) | Expr::Variable(_) => self.clone(),
            Expr::Binary(op, left, right) => {
                let (left, right) = (left.simplify(), right.simplify());
                match (left.as_num(), right.as_num()) {
                    (Some(a), Some(b)) => Expr::Literal(op.apply(a, b)),
                    _ => Expr::binary(*op, left, right),
                }
            }
            Expr::Negate(operand) => {
                let operand = operand.simplify();
                match operand.as_num() {
                    Some(n) => Expr::Literal(-n),
                    None => Expr::negate(operand),
                }
            }
            Expr::Call(func, arg) => {
                let arg = arg.simplify();
                match arg.as_num() {
                    Some(n) => Expr::Literal(func.evaluate(n)),
                    None => Expr::call(*func, arg),
                }
            }
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // non-finite values print as text that lexes back to the same value
            Expr::Literal(n) if n.is_nan() => write!(f, "(0/0)"),
            Expr::Literal(n) if n.is_infinite() && *n > 0.0 => write!(f, "1e999"),
            Expr::Literal(n) if n.is_infinite() => write!(f, "(-1e999)"),
            Expr::Literal(n) if n.is_sign_negative() => write!(f, "({n})"),
            Expr::Literal(n) => write!(f, "{n}"),
            Expr::Variable(id) => write!(f, "{id}"),
            Expr::Binary(op, left, right) => write!(f, "({left} {op} {right})"),
            Expr::Negate(operand) => write!(f, "(-{operand})"),
            Expr::Call(func, arg) => write!(f, "{func}({arg})"),
        }
    }
}
