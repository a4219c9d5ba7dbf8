use crate::symbolic::symbolic_engine::{EntityHandle, Expr, GroupHandle, ParamHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Point2d { x: ParamHandle, y: ParamHandle },
    Circle { center: EntityHandle, radius: ParamHandle },
    /// center, start and end points; start and end stay on one circle
    Arc {
        center: EntityHandle,
        start: EntityHandle,
        end: EntityHandle,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub h: EntityHandle,
    pub group: GroupHandle,
    pub kind: EntityKind,
}

impl Entity {
    pub fn point_params(&self) -> Option<(ParamHandle, ParamHandle)> {
        match self.kind {
            EntityKind::Point2d { x, y } => Some((x, y)),
            _ => None,
        }
    }

    pub fn radius_param(&self) -> Option<ParamHandle> {
        match self.kind {
            EntityKind::Circle { radius, .. } => Some(radius),
            _ => None,
        }
    }
}

/// Symbolic coordinates of a point.
pub type PointExpr = (Expr, Expr);

pub fn point_expr(x: ParamHandle, y: ParamHandle) -> PointExpr {
    (Expr::Param(x), Expr::Param(y))
}

/// `sqrt((ax - bx)^2 + (ay - by)^2)`
pub fn distance(a: &PointExpr, b: &PointExpr) -> Expr {
    let dx = a.0.clone() - b.0.clone();
    let dy = a.1.clone() - b.1.clone();
    (dx.square() + dy.square()).sqrt()
}
