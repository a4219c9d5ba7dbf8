use crate::sketch::entities::{PointExpr, distance};
use crate::sketch::sketch_document::{Sketch, SketchValues};
use crate::symbolic::symbolic_engine::{ConstraintHandle, EntityHandle, Expr, GroupHandle};
use log::warn;
use strum_macros::Display;

#[derive(Debug, Clone, PartialEq, Display)]
pub enum ConstraintKind {
    PointsCoincident {
        a: EntityHandle,
        b: EntityHandle,
    },
    PointDistance {
        a: EntityHandle,
        b: EntityHandle,
        distance: f64,
    },
    Horizontal {
        a: EntityHandle,
        b: EntityHandle,
    },
    Vertical {
        a: EntityHandle,
        b: EntityHandle,
    },
    /// point held at fixed coordinates
    Lock {
        point: EntityHandle,
        x: f64,
        y: f64,
    },
    PointOnCircle {
        point: EntityHandle,
        circle: EntityHandle,
    },
    /// two segments given by their end points
    EqualLength {
        a: (EntityHandle, EntityHandle),
        b: (EntityHandle, EntityHandle),
    },
    Diameter {
        circle: EntityHandle,
        diameter: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub h: ConstraintHandle,
    pub group: GroupHandle,
    pub kind: ConstraintKind,
    /// a reference dimension only displays its measured value
    pub reference: bool,
}

impl Constraint {
    /// carries a user-editable value
    pub fn is_labelled(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::PointDistance { .. } | ConstraintKind::Diameter { .. }
        )
    }

    pub fn is_coincident(&self) -> bool {
        matches!(self.kind, ConstraintKind::PointsCoincident { .. })
    }

    /// Equations `e = 0` of this constraint, in a fixed order. A constraint on a missing
    /// entity writes nothing.
    pub fn equations(&self, sketch: &Sketch) -> Vec<Expr> {
        let written = self.try_equations(sketch);
        if written.is_none() {
            warn!("{:?} ({}) refers to a missing entity", self.h, self.kind);
        }
        written.unwrap_or_default()
    }

    fn try_equations(&self, sketch: &Sketch) -> Option<Vec<Expr>> {
        let eqs = match &self.kind {
            ConstraintKind::PointsCoincident { a, b } => {
                let (pa, pb) = (sketch.point(*a)?, sketch.point(*b)?);
                vec![pa.0 - pb.0, pa.1 - pb.1]
            }
            ConstraintKind::PointDistance { a, b, distance: d } => {
                let (pa, pb) = (sketch.point(*a)?, sketch.point(*b)?);
                vec![distance(&pa, &pb) - Expr::Const(*d)]
            }
            ConstraintKind::Horizontal { a, b } => {
                let (pa, pb) = (sketch.point(*a)?, sketch.point(*b)?);
                vec![pa.1 - pb.1]
            }
            ConstraintKind::Vertical { a, b } => {
                let (pa, pb) = (sketch.point(*a)?, sketch.point(*b)?);
                vec![pa.0 - pb.0]
            }
            ConstraintKind::Lock { point, x, y } => {
                let p = sketch.point(*point)?;
                vec![p.0 - Expr::Const(*x), p.1 - Expr::Const(*y)]
            }
            ConstraintKind::PointOnCircle { point, circle } => {
                let p = sketch.point(*point)?;
                let (center, radius) = sketch.circle(*circle)?;
                vec![distance(&p, &center) - Expr::Param(radius)]
            }
            ConstraintKind::EqualLength { a, b } => {
                let la = segment_length(sketch, *a)?;
                let lb = segment_length(sketch, *b)?;
                vec![la - lb]
            }
            ConstraintKind::Diameter { circle, diameter } => {
                let (_, radius) = sketch.circle(*circle)?;
                vec![Expr::Const(2.0) * Expr::Param(radius) - Expr::Const(*diameter)]
            }
        };
        Some(eqs)
    }

    /// Current value of the labelled quantity, measured on the sketch.
    pub fn measure(&self, sketch: &Sketch) -> Option<f64> {
        let values = SketchValues(sketch);
        match &self.kind {
            ConstraintKind::PointDistance { a, b, .. } => {
                let (pa, pb) = (sketch.point(*a)?, sketch.point(*b)?);
                Some(distance(&pa, &pb).eval(&values))
            }
            ConstraintKind::Diameter { circle, .. } => {
                let (_, radius) = sketch.circle(*circle)?;
                Some(2.0 * sketch.param(radius)?.val)
            }
            _ => None,
        }
    }

    /// Sets the label to `value`, so the constraint holds at the current point.
    pub fn modify_to_satisfy(&mut self, value: f64) {
        match &mut self.kind {
            ConstraintKind::PointDistance { distance, .. } => *distance = value,
            ConstraintKind::Diameter { diameter, .. } => *diameter = value,
            _ => {}
        }
    }

    pub fn label(&self) -> Option<f64> {
        match self.kind {
            ConstraintKind::PointDistance { distance, .. } => Some(distance),
            ConstraintKind::Diameter { diameter, .. } => Some(diameter),
            _ => None,
        }
    }
}

fn segment_length(sketch: &Sketch, (a, b): (EntityHandle, EntityHandle)) -> Option<Expr> {
    let pa: PointExpr = sketch.point(a)?;
    let pb: PointExpr = sketch.point(b)?;
    Some(distance(&pa, &pb))
}
