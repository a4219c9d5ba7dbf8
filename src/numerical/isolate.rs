//! Algebraic isolation of one unknown from an equation `e = 0`.
//!
//! The equation is read as `lhs = rhs` with `rhs = 0`, and operators are peeled off `lhs` one at
//! a time until only the target unknown is left:
//!
//! | root of `lhs` | target in | new `rhs`          |
//! |---------------|-----------|--------------------|
//! | `a + b`       | `a`       | `rhs - b`          |
//! | `a + b`       | `b`       | `rhs - a`          |
//! | `a - b`       | `a`       | `rhs + b`          |
//! | `a - b`       | `b`       | `-(rhs - a)`       |
//! | `a * b`       | `a`       | `rhs / b`          |
//! | `a * b`       | `b`       | `rhs / a`          |
//! | `sqrt(a)`     | `a`       | `rhs^2`            |
//! | `a^2`         | `a`       | `±sqrt(rhs)`       |
//!
//! For the square the sign is the one that lands closer to the current value of `a`.
use crate::symbolic::symbolic_engine::{Expr, ParamHandle};
use crate::symbolic::symbolic_engine_derivatives::ParamLookup;

/// True when `isolate` can solve `equation` for `target`: every node on the way down is one
/// of the operators in the table above and exactly one operand depends on the target.
pub fn can_isolate(equation: &Expr, target: ParamHandle) -> bool {
    if equation.as_param() == Some(target) {
        return true;
    }
    match equation {
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
            match (a.depends_on(target), b.depends_on(target)) {
                (true, false) => can_isolate(a, target),
                (false, true) => can_isolate(b, target),
                _ => false,
            }
        }
        Expr::Sqrt(a) | Expr::Square(a) => can_isolate(a, target),
        _ => false,
    }
}

/// Returns the expression `target` equals when `equation = 0` holds. Square roots are
/// disambiguated by evaluating against `lookup`.
///
/// # Panics
/// If `equation` has a shape `can_isolate` rejects. Callers check first; reaching the panic
/// means the equation writer produced something the elimination passes did not expect.
pub fn isolate<L: ParamLookup + ?Sized>(equation: &Expr, target: ParamHandle, lookup: &L) -> Expr {
    let mut lhs = equation.clone();
    let mut rhs = Expr::Const(0.0);
    loop {
        if lhs.as_param() == Some(target) {
            return rhs;
        }
        (lhs, rhs) = match lhs {
            Expr::Add(a, b) => {
                if a.depends_on(target) {
                    (*a, rhs - *b)
                } else if b.depends_on(target) {
                    (*b, rhs - *a)
                } else {
                    panic!("neither side of a sum depends on {:?}", target)
                }
            }
            Expr::Sub(a, b) => {
                if a.depends_on(target) {
                    (*a, rhs + *b)
                } else if b.depends_on(target) {
                    (*b, -(rhs - *a))
                } else {
                    panic!("neither side of a difference depends on {:?}", target)
                }
            }
            Expr::Mul(a, b) => {
                if a.depends_on(target) {
                    (*a, rhs / *b)
                } else if b.depends_on(target) {
                    (*b, rhs / *a)
                } else {
                    panic!("neither side of a product depends on {:?}", target)
                }
            }
            Expr::Sqrt(a) => (*a, rhs.square()),
            Expr::Square(a) => {
                let root = rhs.sqrt();
                let lhs_ev = a.eval(lookup);
                let rhs_ev = root.eval(lookup);
                if (-rhs_ev - lhs_ev).abs() < (lhs_ev - rhs_ev).abs() {
                    (*a, -root)
                } else {
                    (*a, root)
                }
            }
            other => panic!("cannot isolate {:?} from {}", target, other),
        };
    }
}
