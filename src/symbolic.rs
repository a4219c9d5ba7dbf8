#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// expression trees for constraint equations: handles, constructors, operator overloads, printing
///# Example#
/// ```
/// use RustedGCS::symbolic::symbolic_engine::{Expr, ParamHandle};
/// use std::collections::HashMap;
/// let x = Expr::Param(ParamHandle(1));
/// let y = Expr::Param(ParamHandle(2));
/// // x^2 + x*y - 3 = 0
/// let eq = x.clone().square() + x * y - Expr::Const(3.0);
/// let mut values: HashMap<ParamHandle, f64> = HashMap::new();
/// values.insert(ParamHandle(1), 1.0);
/// values.insert(ParamHandle(2), 2.0);
/// assert_eq!(eq.eval(&values), 0.0);
/// // partial derivative with respect to x: 2x + y
/// let d = eq.partial_wrt(ParamHandle(1)).fold_constants();
/// assert_eq!(d.eval(&values), 4.0);
/// ```
pub mod symbolic_engine;
/// partial derivatives, evaluation, parameter reference queries and rewriting
pub mod symbolic_engine_derivatives;
/// constant folding
pub mod symbolic_simplify;
#[cfg(test)]
mod symbolic_engine_tests;
