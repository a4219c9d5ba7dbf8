//! # Symbolic Expression Simplification Module
//!
//! Constant folding for equations and their partial derivatives.
//!
//! ## Simplification Strategy
//!
//! 1. **Constant Folding**: binary operations on two constants and functions of a constant
//!    are evaluated
//! 2. **Algebraic Identities**: x + 0 = 0 + x = x, x * 1 = 1 * x = x, x * 0 = 0 * x = 0
//!
//! Nothing else is rewritten. In particular `0 - x` stays a subtraction: the isolation
//! routine in `numerical::isolate` relies on the operator shapes written by the constraint
//! layer surviving the fold.

use crate::symbolic::symbolic_engine::Expr;

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Folds constant subtrees bottom-up.
    ///
    /// ## Examples
    ///
    /// - `2 * 3 + x` → `6 + x`
    /// - `(x * 1) + 0` → `x`
    /// - `sqrt(4) * y` → `2 * y`
    /// - `0 * (x + y)` → `0`
    pub fn fold_constants(&self) -> Expr {
        match self {
            Expr::Param(_) | Expr::ParamSlot(..) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => match (lhs.fold_constants(), rhs.fold_constants()) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
                (lhs, Expr::Const(b)) if b == 0.0 => lhs,
                (Expr::Const(a), rhs) if a == 0.0 => rhs,
                (lhs, rhs) => Expr::Add(lhs.boxed(), rhs.boxed()),
            },
            Expr::Sub(lhs, rhs) => match (lhs.fold_constants(), rhs.fold_constants()) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b),
                (lhs, rhs) => Expr::Sub(lhs.boxed(), rhs.boxed()),
            },
            Expr::Mul(lhs, rhs) => match (lhs.fold_constants(), rhs.fold_constants()) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
                (lhs, Expr::Const(b)) if b == 1.0 => lhs,
                (Expr::Const(a), rhs) if a == 1.0 => rhs,
                (_, Expr::Const(b)) if b == 0.0 => Expr::Const(0.0),
                (Expr::Const(a), _) if a == 0.0 => Expr::Const(0.0),
                (lhs, rhs) => Expr::Mul(lhs.boxed(), rhs.boxed()),
            },
            Expr::Div(lhs, rhs) => match (lhs.fold_constants(), rhs.fold_constants()) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a / b),
                (lhs, rhs) => Expr::Div(lhs.boxed(), rhs.boxed()),
            },
            Expr::Neg(expr) => fold_unary(expr, Expr::Neg, |v| -v),
            Expr::Square(expr) => fold_unary(expr, Expr::Square, |v| v * v),
            Expr::Sqrt(expr) => fold_unary(expr, Expr::Sqrt, f64::sqrt),
            Expr::sin(expr) => fold_unary(expr, Expr::sin, f64::sin),
            Expr::cos(expr) => fold_unary(expr, Expr::cos, f64::cos),
            Expr::arcsin(expr) => fold_unary(expr, Expr::arcsin, f64::asin),
            Expr::arccos(expr) => fold_unary(expr, Expr::arccos, f64::acos),
        }
    }

    /// True when folding reduces the expression to the literal constant zero.
    pub fn folds_to_zero(&self) -> bool {
        self.fold_constants().is_zero_const()
    }
}

fn fold_unary<W, F>(expr: &Expr, wrap: W, f: F) -> Expr
where
    W: Fn(Box<Expr>) -> Expr,
    F: Fn(f64) -> f64,
{
    match expr.fold_constants() {
        Expr::Const(v) => Expr::Const(f(v)),
        folded => wrap(folded.boxed()),
    }
}
