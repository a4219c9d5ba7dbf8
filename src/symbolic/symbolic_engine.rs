//! # Symbolic Engine Module
//!
//! Expression trees for the constraint equations. Every equation handed to the solver is an
//! `Expr` whose root means "expression = 0".
//!
//! ## Purpose
//!
//! The symbolic engine allows the solver to:
//! - Build equations out of parameter references and constants
//! - Differentiate them analytically with respect to any parameter
//! - Fold constants and rewrite parameter references into direct arena slots
//! - Rearrange them algebraically (see `numerical::isolate`)
//!
//! ## Main Structures
//!
//! ### Handles
//! `ParamHandle`, `EquationHandle`, `ConstraintHandle`, `EntityHandle`, `GroupHandle` are
//! small copyable identities. An `EquationHandle` remembers where the equation came from so
//! that a failing row of the Jacobian can be mapped back to the constraint that wrote it.
//!
//! ### `Expr` Enum
//! - **Parameters**: `Param(handle)` and `ParamSlot(handle, slot)` - the latter points straight
//!   into the solver's parameter arena and is produced by `rewrite_params_as_slots`
//! - **Constants**: `Const(f64)`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Neg`, `Square`, `Sqrt`
//! - **Functions**: `sin`, `cos`, `arcsin`, `arccos`
//!
//! ## Interesting Code Features
//!
//! 1. **Operator Overloading**: std::ops traits are implemented so equations read naturally:
//!    `(x1 - x2).square() + (y1 - y2).square()`
//!
//! 2. **Two parameter forms**: handles are what the constraint layer writes, slots are what the
//!    Jacobian evaluates. Both differentiate the same way because a slot keeps its handle.

#![allow(non_camel_case_types)]

use std::fmt;

/// Identity of an unknown. Stable and unique within a sketch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(pub u32);

/// What wrote an equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EquationOrigin {
    Constraint(ConstraintHandle),
    Entity(EntityHandle),
    Group(GroupHandle),
}

/// Identity of an equation: its origin plus the index of the equation among those the origin
/// wrote (a coincidence constraint writes two, one per coordinate).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EquationHandle {
    pub origin: EquationOrigin,
    pub index: u32,
}

impl EquationHandle {
    pub fn new(origin: EquationOrigin, index: u32) -> Self {
        Self { origin, index }
    }

    pub fn is_from_constraint(&self) -> bool {
        matches!(self.origin, EquationOrigin::Constraint(_))
    }

    /// The constraint that wrote this equation, if any.
    pub fn constraint(&self) -> Option<ConstraintHandle> {
        match self.origin {
            EquationOrigin::Constraint(c) => Some(c),
            _ => None,
        }
    }
}

/// Core symbolic expression enum representing an equation as an abstract syntax tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedGCS::symbolic::symbolic_engine::{Expr, ParamHandle};
/// let x = Expr::Param(ParamHandle(1));
/// let expr = x - Expr::Const(2.0); // x - 2 = 0
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Parameter referenced by handle
    Param(ParamHandle),
    /// Parameter referenced by its position in the solver's parameter arena
    ParamSlot(ParamHandle, usize),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Negation: -x
    Neg(Box<Expr>),
    /// Square: x^2
    Square(Box<Expr>),
    /// Square root
    Sqrt(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Param(h) => write!(f, "p{}", h.0),
            Expr::ParamSlot(h, slot) => write!(f, "p{}@{}", h.0, slot),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Neg(expr) => write!(f, "(-{})", expr),
            Expr::Square(expr) => write!(f, "({})^2", expr),
            Expr::Sqrt(expr) => write!(f, "sqrt({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::arcsin(expr) => write!(f, "arcsin({})", expr),
            Expr::arccos(expr) => write!(f, "arccos({})", expr),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Neg(self.boxed())
    }
}

impl From<f64> for Expr {
    fn from(val: f64) -> Self {
        Expr::Const(val)
    }
}

impl From<ParamHandle> for Expr {
    fn from(h: ParamHandle) -> Self {
        Expr::Param(h)
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn param(h: ParamHandle) -> Expr {
        Expr::Param(h)
    }

    pub fn plus(self, rhs: Expr) -> Expr {
        self + rhs
    }

    pub fn minus(self, rhs: Expr) -> Expr {
        self - rhs
    }

    pub fn times(self, rhs: Expr) -> Expr {
        self * rhs
    }

    pub fn div(self, rhs: Expr) -> Expr {
        self / rhs
    }

    pub fn negate(self) -> Expr {
        -self
    }

    pub fn square(self) -> Expr {
        Expr::Square(self.boxed())
    }

    pub fn sqrt(self) -> Expr {
        Expr::Sqrt(self.boxed())
    }

    /// Checks if expression is exactly the constant zero.
    pub fn is_zero_const(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    /// Handle of the parameter this node refers to, if it is a parameter node.
    pub fn as_param(&self) -> Option<ParamHandle> {
        match self {
            Expr::Param(h) | Expr::ParamSlot(h, _) => Some(*h),
            _ => None,
        }
    }

    /// Children of this node, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Param(_) | Expr::ParamSlot(..) | Expr::Const(_) => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
            Expr::Neg(expr)
            | Expr::Square(expr)
            | Expr::Sqrt(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::arcsin(expr)
            | Expr::arccos(expr) => vec![expr.as_ref()],
        }
    }

    /// Rebuilds the tree bottom-up, replacing every parameter node by `f(node)`.
    ///
    /// Every rewrite the solver performs on parameter references (substitution to chain roots,
    /// slot rewriting) goes through here.
    pub fn map_params<F>(&self, f: &F) -> Expr
    where
        F: Fn(&Expr) -> Expr,
    {
        match self {
            Expr::Param(_) | Expr::ParamSlot(..) => f(self),
            Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(lhs.map_params(f).boxed(), rhs.map_params(f).boxed()),
            Expr::Sub(lhs, rhs) => Expr::Sub(lhs.map_params(f).boxed(), rhs.map_params(f).boxed()),
            Expr::Mul(lhs, rhs) => Expr::Mul(lhs.map_params(f).boxed(), rhs.map_params(f).boxed()),
            Expr::Div(lhs, rhs) => Expr::Div(lhs.map_params(f).boxed(), rhs.map_params(f).boxed()),
            Expr::Neg(expr) => Expr::Neg(expr.map_params(f).boxed()),
            Expr::Square(expr) => Expr::Square(expr.map_params(f).boxed()),
            Expr::Sqrt(expr) => Expr::Sqrt(expr.map_params(f).boxed()),
            Expr::sin(expr) => Expr::sin(expr.map_params(f).boxed()),
            Expr::cos(expr) => Expr::cos(expr.map_params(f).boxed()),
            Expr::arcsin(expr) => Expr::arcsin(expr.map_params(f).boxed()),
            Expr::arccos(expr) => Expr::arccos(expr.map_params(f).boxed()),
        }
    }
}

//___________________________________MACROS____________________________________

/// Macro to create parameter expressions from raw handle numbers
/// Usage: params!(1, 2) -> (Expr::Param(ParamHandle(1)), Expr::Param(ParamHandle(2)))
#[macro_export]
macro_rules! params {
    ($($h:expr),+ $(,)?) => {
        ($(
            $crate::symbolic::symbolic_engine::Expr::Param(
                $crate::symbolic::symbolic_engine::ParamHandle($h),
            )
        ),+)
    };
}
