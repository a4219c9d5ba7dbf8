//! # Symbolic Engine Derivatives Module
//!
//! This module extends the symbolic engine with differentiation, evaluation and the
//! parameter reference queries the solver is built on.
//!
//! ## Purpose
//!
//! This module enables:
//! - **Analytical Differentiation**: partial derivative with respect to one parameter
//! - **Evaluation**: numerical value of an expression at the current operating point
//! - **Reference Queries**: which parameters an equation uses, and how often
//! - **Rewriting**: replacing parameter handles by arena slots or by other parameters
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `partial_wrt(h)` - Analytical partial derivative
//!
//! ### Evaluation
//! - `eval(lookup)` - values come from anything implementing `ParamLookup`
//!
//! ### Parameter queries
//! - `params_used()` - distinct parameters in order of first appearance
//! - `depends_on()`, `count_references()`
//! - `referenced_params()` - none, exactly one or several solver parameters
//!
//! ## Interesting Code Features
//!
//! 1. **Recursive Differentiation Rules**: product rule, quotient rule and chain rule for all
//!    supported functions. A subtree that does not depend on the parameter differentiates
//!    straight to zero without being walked
//!
//! 2. **Slot Rewriting**: `rewrite_params_as_slots` turns handle lookups into direct arena
//!    indices once per Jacobian assembly so the Newton loop never hashes a handle

use crate::symbolic::symbolic_engine::{Expr, ParamHandle};
use std::collections::HashMap;

/// Source of parameter values for `Expr::eval`.
pub trait ParamLookup {
    fn param_value(&self, h: ParamHandle) -> f64;
    /// value stored at arena position `slot`; by default resolved through the handle
    fn slot_value(&self, slot: usize, h: ParamHandle) -> f64 {
        let _ = slot;
        self.param_value(h)
    }
}

/// plain value tables; unknown handles evaluate to NaN
impl ParamLookup for HashMap<ParamHandle, f64> {
    fn param_value(&self, h: ParamHandle) -> f64 {
        self.get(&h).copied().unwrap_or(f64::NAN)
    }
}

/// Summary of the solver parameters an expression references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencedParams {
    None,
    Exactly(ParamHandle),
    Multiple,
}

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical partial derivative of the expression with respect to a parameter.
    ///
    /// Implements the standard rules:
    /// - Product rule: d(f*g) = f'*g + f*g'
    /// - Quotient rule: d(f/g) = (f'*g - f*g')/g^2
    /// - Chain rule for square, square root and trigonometric functions
    ///
    /// The result is not simplified; callers fold it with `fold_constants`.
    ///
    /// # Arguments
    /// * `wrt` - parameter to differentiate with respect to. Slots and handles of the same
    ///   parameter are treated alike
    pub fn partial_wrt(&self, wrt: ParamHandle) -> Expr {
        if !self.depends_on(wrt) {
            return Expr::Const(0.0);
        }
        match self {
            Expr::Param(h) | Expr::ParamSlot(h, _) => {
                Expr::Const(if *h == wrt { 1.0 } else { 0.0 })
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => lhs.partial_wrt(wrt) + rhs.partial_wrt(wrt),
            Expr::Sub(lhs, rhs) => lhs.partial_wrt(wrt) - rhs.partial_wrt(wrt),
            Expr::Mul(lhs, rhs) => {
                lhs.partial_wrt(wrt) * *rhs.clone() + *lhs.clone() * rhs.partial_wrt(wrt)
            }
            Expr::Div(lhs, rhs) => {
                (lhs.partial_wrt(wrt) * *rhs.clone() - *lhs.clone() * rhs.partial_wrt(wrt))
                    / rhs.as_ref().clone().square()
            }
            Expr::Neg(expr) => -expr.partial_wrt(wrt),
            Expr::Square(expr) => Expr::Const(2.0) * *expr.clone() * expr.partial_wrt(wrt),
            Expr::Sqrt(expr) => {
                expr.partial_wrt(wrt) / (Expr::Const(2.0) * expr.as_ref().clone().sqrt())
            }
            Expr::sin(expr) => Expr::cos(expr.clone()) * expr.partial_wrt(wrt),
            Expr::cos(expr) => -(Expr::sin(expr.clone()) * expr.partial_wrt(wrt)),
            Expr::arcsin(expr) => {
                expr.partial_wrt(wrt)
                    / (Expr::Const(1.0) - expr.as_ref().clone().square()).sqrt()
            }
            Expr::arccos(expr) => {
                -(expr.partial_wrt(wrt)
                    / (Expr::Const(1.0) - expr.as_ref().clone().square()).sqrt())
            }
        }
    }

    /// EVALUATION

    /// Evaluates the expression, resolving parameters through `lookup`.
    pub fn eval<L: ParamLookup + ?Sized>(&self, lookup: &L) -> f64 {
        match self {
            Expr::Param(h) => lookup.param_value(*h),
            Expr::ParamSlot(h, slot) => lookup.slot_value(*slot, *h),
            Expr::Const(val) => *val,
            Expr::Add(lhs, rhs) => lhs.eval(lookup) + rhs.eval(lookup),
            Expr::Sub(lhs, rhs) => lhs.eval(lookup) - rhs.eval(lookup),
            Expr::Mul(lhs, rhs) => lhs.eval(lookup) * rhs.eval(lookup),
            Expr::Div(lhs, rhs) => lhs.eval(lookup) / rhs.eval(lookup),
            Expr::Neg(expr) => -expr.eval(lookup),
            Expr::Square(expr) => {
                let v = expr.eval(lookup);
                v * v
            }
            Expr::Sqrt(expr) => expr.eval(lookup).sqrt(),
            Expr::sin(expr) => expr.eval(lookup).sin(),
            Expr::cos(expr) => expr.eval(lookup).cos(),
            Expr::arcsin(expr) => expr.eval(lookup).asin(),
            Expr::arccos(expr) => expr.eval(lookup).acos(),
        }
    }

    /// PARAMETER QUERIES

    /// Appends every distinct parameter referenced by the expression, in order of first
    /// appearance, skipping those already in `out`.
    pub fn params_used(&self, out: &mut Vec<ParamHandle>) {
        if let Some(h) = self.as_param() {
            if !out.contains(&h) {
                out.push(h);
            }
            return;
        }
        for child in self.children() {
            child.params_used(out);
        }
    }

    pub fn depends_on(&self, h: ParamHandle) -> bool {
        match self.as_param() {
            Some(p) => p == h,
            None => self.children().iter().any(|child| child.depends_on(h)),
        }
    }

    /// Number of syntactic occurrences of `h`.
    pub fn count_references(&self, h: ParamHandle) -> u32 {
        match self.as_param() {
            Some(p) => u32::from(p == h),
            None => self
                .children()
                .iter()
                .map(|child| child.count_references(h))
                .sum(),
        }
    }

    /// Which solver parameters the expression references. Parameters for which
    /// `is_solver_param` is false are treated as constants. A parameter referenced several
    /// times still counts once.
    pub fn referenced_params<F>(&self, is_solver_param: &F) -> ReferencedParams
    where
        F: Fn(ParamHandle) -> bool,
    {
        if let Some(h) = self.as_param() {
            return if is_solver_param(h) {
                ReferencedParams::Exactly(h)
            } else {
                ReferencedParams::None
            };
        }
        let mut found = ReferencedParams::None;
        for child in self.children() {
            found = match (found, child.referenced_params(is_solver_param)) {
                (ReferencedParams::None, other) => other,
                (current, ReferencedParams::None) => current,
                (ReferencedParams::Exactly(a), ReferencedParams::Exactly(b)) if a == b => {
                    ReferencedParams::Exactly(a)
                }
                _ => ReferencedParams::Multiple,
            };
            if found == ReferencedParams::Multiple {
                break;
            }
        }
        found
    }

    /// REWRITING

    /// Deep copy in which every parameter found in `index` becomes a direct arena reference.
    /// Parameters outside the index (owned by other groups) keep their handle.
    pub fn rewrite_params_as_slots(&self, index: &HashMap<ParamHandle, usize>) -> Expr {
        self.map_params(&|node: &Expr| match node.as_param() {
            Some(h) => match index.get(&h) {
                Some(&slot) => Expr::ParamSlot(h, slot),
                None => Expr::Param(h),
            },
            None => node.clone(),
        })
    }

    /// Deep copy with parameter handles replaced according to `map`. Slot references are
    /// turned back into handle references.
    pub fn substitute_params(&self, map: &HashMap<ParamHandle, ParamHandle>) -> Expr {
        self.map_params(&|node: &Expr| match node.as_param() {
            Some(h) => Expr::Param(*map.get(&h).unwrap_or(&h)),
            None => node.clone(),
        })
    }
}
