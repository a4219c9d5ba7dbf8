//! # Sketch document
//!
//! ## Purpose
//! A 2d sketch: parameters, entities, constraints and groups, owned in flat tables. It is the
//! `ConstraintLayer` the solver reads equations from and writes values back to.
//!
//! ## Main Structures
//! - `SketchParam` - value of one unknown, plus the `known`/`free` flags the solver sets
//! - `Group` - solve policy and the status of its last solve
//! - `Sketch` - the tables and the builders (`add_point`, `point_distance`, `lock`, ...)
//!
//! ## Interesting Code Features
//! - groups are solved one at a time; parameters of other groups referenced by a constraint
//!   are constants for that solve
//! - reference dimensions write no equations. They are set to their measured value when the
//!   equations are written and re-measured after a successful solve

use crate::error::SolverError;
use crate::numerical::solver_api::{
    ConstraintLayer, GroupPolicy, SolveReport, SolveStatus,
};
use crate::numerical::system::{Equation, System};
use crate::sketch::constraints::{Constraint, ConstraintKind};
use crate::sketch::entities::{Entity, EntityKind, PointExpr, point_expr};
use crate::symbolic::symbolic_engine::{
    ConstraintHandle, EntityHandle, EquationHandle, EquationOrigin, Expr, GroupHandle,
    ParamHandle,
};
use crate::symbolic::symbolic_engine_derivatives::ParamLookup;
use crate::Utils::config::SolverConfig;
use log::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct SketchParam {
    pub h: ParamHandle,
    pub group: GroupHandle,
    pub val: f64,
    pub known: bool,
    pub free: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub h: GroupHandle,
    pub name: String,
    pub policy: GroupPolicy,
    pub solved: SolveStatus,
}

#[derive(Debug, Clone)]
pub struct Sketch {
    pub config: SolverConfig,
    pub params: Vec<SketchParam>,
    pub entities: Vec<Entity>,
    pub constraints: Vec<Constraint>,
    pub groups: Vec<Group>,
    pub dragged: Vec<ParamHandle>,
    next_param: u32,
    next_entity: u32,
    next_constraint: u32,
}

/// Current sketch values as an evaluation source for `Expr::eval`.
pub struct SketchValues<'a>(pub &'a Sketch);

impl ParamLookup for SketchValues<'_> {
    fn param_value(&self, h: ParamHandle) -> f64 {
        self.0.param(h).map_or(f64::NAN, |p| p.val)
    }
}

impl Default for Sketch {
    fn default() -> Self {
        Sketch::new()
    }
}

impl Sketch {
    pub fn new() -> Sketch {
        Sketch::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Sketch {
        Sketch {
            config,
            params: Vec::new(),
            entities: Vec::new(),
            constraints: Vec::new(),
            groups: Vec::new(),
            dragged: Vec::new(),
            next_param: 1,
            next_entity: 1,
            next_constraint: 1,
        }
    }

    //___________________________________TABLES____________________________________

    pub fn add_group(&mut self, name: &str) -> GroupHandle {
        let h = GroupHandle(self.groups.len() as u32 + 1);
        let policy = GroupPolicy {
            find_to_fix_timeout_ms: self.config.default_find_to_fix_timeout_ms,
            ..GroupPolicy::default()
        };
        self.groups.push(Group {
            h,
            name: name.to_string(),
            policy,
            solved: SolveStatus::default(),
        });
        h
    }

    pub fn group(&self, g: GroupHandle) -> Option<&Group> {
        self.groups.iter().find(|group| group.h == g)
    }

    pub fn group_mut(&mut self, g: GroupHandle) -> Option<&mut Group> {
        self.groups.iter_mut().find(|group| group.h == g)
    }

    pub fn add_param(&mut self, g: GroupHandle, val: f64) -> ParamHandle {
        let h = ParamHandle(self.next_param);
        self.next_param += 1;
        self.params.push(SketchParam {
            h,
            group: g,
            val,
            known: false,
            free: false,
        });
        h
    }

    pub fn param(&self, h: ParamHandle) -> Option<&SketchParam> {
        self.params.iter().find(|p| p.h == h)
    }

    fn param_mut(&mut self, h: ParamHandle) -> Option<&mut SketchParam> {
        self.params.iter_mut().find(|p| p.h == h)
    }

    pub fn entity(&self, e: EntityHandle) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.h == e)
    }

    pub fn constraint(&self, c: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.iter().find(|constraint| constraint.h == c)
    }

    fn add_entity(&mut self, g: GroupHandle, kind: EntityKind) -> EntityHandle {
        let h = EntityHandle(self.next_entity);
        self.next_entity += 1;
        self.entities.push(Entity { h, group: g, kind });
        h
    }

    fn add_constraint(&mut self, g: GroupHandle, kind: ConstraintKind) -> ConstraintHandle {
        let h = ConstraintHandle(self.next_constraint);
        self.next_constraint += 1;
        self.constraints.push(Constraint {
            h,
            group: g,
            kind,
            reference: false,
        });
        h
    }

    //___________________________________ENTITIES____________________________________

    pub fn add_point(&mut self, g: GroupHandle, x: f64, y: f64) -> EntityHandle {
        let x = self.add_param(g, x);
        let y = self.add_param(g, y);
        self.add_entity(g, EntityKind::Point2d { x, y })
    }

    pub fn add_circle(&mut self, g: GroupHandle, center: EntityHandle, radius: f64) -> EntityHandle {
        let radius = self.add_param(g, radius);
        self.add_entity(g, EntityKind::Circle { center, radius })
    }

    pub fn add_arc(
        &mut self,
        g: GroupHandle,
        center: EntityHandle,
        start: EntityHandle,
        end: EntityHandle,
    ) -> EntityHandle {
        self.add_entity(g, EntityKind::Arc { center, start, end })
    }

    /// symbolic coordinates of a point entity
    pub fn point(&self, e: EntityHandle) -> Option<PointExpr> {
        let (x, y) = self.entity(e)?.point_params()?;
        Some(point_expr(x, y))
    }

    /// symbolic center and radius parameter of a circle entity
    pub fn circle(&self, e: EntityHandle) -> Option<(PointExpr, ParamHandle)> {
        match self.entity(e)?.kind {
            EntityKind::Circle { center, radius } => Some((self.point(center)?, radius)),
            _ => None,
        }
    }

    pub fn point_coords(&self, e: EntityHandle) -> (f64, f64) {
        let values = SketchValues(self);
        match self.entity(e).and_then(|entity| entity.point_params()) {
            Some((x, y)) => (values.param_value(x), values.param_value(y)),
            None => (f64::NAN, f64::NAN),
        }
    }

    /// equations an entity writes on its own
    pub fn entity_equations(&self, entity: &Entity) -> Vec<Expr> {
        match entity.kind {
            EntityKind::Arc { center, start, end } => {
                let (Some(c), Some(s), Some(e)) =
                    (self.point(center), self.point(start), self.point(end))
                else {
                    return Vec::new();
                };
                vec![crate::sketch::entities::distance(&c, &s)
                    - crate::sketch::entities::distance(&c, &e)]
            }
            EntityKind::Point2d { .. } | EntityKind::Circle { .. } => Vec::new(),
        }
    }

    //___________________________________CONSTRAINTS____________________________________

    pub fn coincident(&mut self, g: GroupHandle, a: EntityHandle, b: EntityHandle) -> ConstraintHandle {
        self.add_constraint(g, ConstraintKind::PointsCoincident { a, b })
    }

    pub fn point_distance(
        &mut self,
        g: GroupHandle,
        a: EntityHandle,
        b: EntityHandle,
        distance: f64,
    ) -> ConstraintHandle {
        self.add_constraint(g, ConstraintKind::PointDistance { a, b, distance })
    }

    pub fn horizontal(&mut self, g: GroupHandle, a: EntityHandle, b: EntityHandle) -> ConstraintHandle {
        self.add_constraint(g, ConstraintKind::Horizontal { a, b })
    }

    pub fn vertical(&mut self, g: GroupHandle, a: EntityHandle, b: EntityHandle) -> ConstraintHandle {
        self.add_constraint(g, ConstraintKind::Vertical { a, b })
    }

    pub fn lock(&mut self, g: GroupHandle, point: EntityHandle, x: f64, y: f64) -> ConstraintHandle {
        self.add_constraint(g, ConstraintKind::Lock { point, x, y })
    }

    pub fn point_on_circle(
        &mut self,
        g: GroupHandle,
        point: EntityHandle,
        circle: EntityHandle,
    ) -> ConstraintHandle {
        self.add_constraint(g, ConstraintKind::PointOnCircle { point, circle })
    }

    pub fn equal_length(
        &mut self,
        g: GroupHandle,
        a: (EntityHandle, EntityHandle),
        b: (EntityHandle, EntityHandle),
    ) -> ConstraintHandle {
        self.add_constraint(g, ConstraintKind::EqualLength { a, b })
    }

    pub fn diameter(&mut self, g: GroupHandle, circle: EntityHandle, diameter: f64) -> ConstraintHandle {
        self.add_constraint(g, ConstraintKind::Diameter { circle, diameter })
    }

    pub fn set_reference(&mut self, c: ConstraintHandle, reference: bool) {
        if let Some(constraint) = self.constraints.iter_mut().find(|k| k.h == c) {
            constraint.reference = reference;
        }
    }

    pub fn remove_constraint(&mut self, c: ConstraintHandle) {
        self.constraints.retain(|k| k.h != c);
    }

    /// the next solve treats the point's coordinates as dragged
    pub fn drag_point(&mut self, e: EntityHandle) {
        if let Some((x, y)) = self.entity(e).and_then(|entity| entity.point_params()) {
            self.dragged = vec![x, y];
        }
    }

    pub fn stop_dragging(&mut self) {
        self.dragged.clear();
    }

    pub fn set_param(&mut self, h: ParamHandle, val: f64) {
        if let Some(p) = self.param_mut(h) {
            p.val = val;
        }
    }

    //___________________________________SOLVING____________________________________

    /// Solves group `g`, searching for conflicting constraints on failure.
    pub fn solve_group(&mut self, g: GroupHandle) -> Result<SolveReport, SolverError> {
        self.solve_group_with(g, true, false, false)
    }

    pub fn solve_group_with(
        &mut self,
        g: GroupHandle,
        find_bad: bool,
        find_free: bool,
        force_dof_check: bool,
    ) -> Result<SolveReport, SolverError> {
        let mut sys = System::new(self.config.clone());
        let report = sys.solve(self, g, find_bad, find_free, force_dof_check)?;
        if report.result.is_okay() {
            self.remeasure_reference_dims(g);
        }
        Ok(report)
    }

    /// Rank and DOF of group `g` at the current values; nothing moves.
    pub fn check_group(&mut self, g: GroupHandle, find_free: bool) -> Result<SolveReport, SolverError> {
        let mut sys = System::new(self.config.clone());
        sys.solve_rank(self, g, true, find_free)
    }

    fn is_reference_in(&self, constraint: &Constraint, policy: &GroupPolicy) -> bool {
        constraint.is_labelled() && (constraint.reference || policy.all_dims_reference)
    }

    fn remeasure_reference_dims(&mut self, g: GroupHandle) {
        let Some(policy) = self.group(g).map(|group| group.policy.clone()) else {
            return;
        };
        for i in 0..self.constraints.len() {
            let constraint = &self.constraints[i];
            if constraint.group != g || !self.is_reference_in(constraint, &policy) {
                continue;
            }
            if let Some(value) = constraint.measure(self) {
                self.constraints[i].modify_to_satisfy(value);
            }
        }
    }
}

impl ConstraintLayer for Sketch {
    fn group_policy(&self, g: GroupHandle) -> Result<GroupPolicy, SolverError> {
        self.group(g)
            .map(|group| group.policy.clone())
            .ok_or(SolverError::UnknownGroup(g))
    }

    fn write_equations_except_for(
        &mut self,
        g: GroupHandle,
        except: Option<ConstraintHandle>,
        out: &mut Vec<Equation>,
    ) {
        let Some(policy) = self.group(g).map(|group| group.policy.clone()) else {
            return;
        };
        for i in 0..self.constraints.len() {
            let constraint = &self.constraints[i];
            if constraint.group != g || Some(constraint.h) == except {
                continue;
            }
            if self.is_reference_in(constraint, &policy) {
                if let Some(value) = constraint.measure(self) {
                    self.constraints[i].modify_to_satisfy(value);
                }
                continue;
            }
            if policy.relax_constraints && !constraint.is_coincident() {
                continue;
            }
            let origin = EquationOrigin::Constraint(constraint.h);
            for (k, e) in constraint.equations(self).into_iter().enumerate() {
                out.push(Equation::new(EquationHandle::new(origin, k as u32), e));
            }
        }
        for entity in self.entities.iter().filter(|entity| entity.group == g) {
            let origin = EquationOrigin::Entity(entity.h);
            for (k, e) in self.entity_equations(entity).into_iter().enumerate() {
                out.push(Equation::new(EquationHandle::new(origin, k as u32), e));
            }
        }
        debug!("group {:?} wrote {} equations", g, out.len());
    }

    fn group_constraints(&self, g: GroupHandle) -> Vec<(ConstraintHandle, bool)> {
        self.constraints
            .iter()
            .filter(|constraint| constraint.group == g)
            .map(|constraint| (constraint.h, constraint.is_coincident()))
            .collect()
    }

    fn constraint_exists(&self, c: ConstraintHandle) -> bool {
        self.constraint(c).is_some()
    }

    fn group_params(&self, g: GroupHandle) -> Vec<(ParamHandle, f64)> {
        self.params
            .iter()
            .filter(|p| p.group == g)
            .map(|p| (p.h, p.val))
            .collect()
    }

    fn param_value(&self, h: ParamHandle) -> Option<f64> {
        self.param(h).map(|p| p.val)
    }

    fn dragged(&self) -> Vec<ParamHandle> {
        self.dragged.clone()
    }

    fn write_back(&mut self, h: ParamHandle, val: f64, free: bool) {
        if let Some(p) = self.param_mut(h) {
            p.val = val;
            p.known = true;
            p.free = free;
        }
    }

    fn record_status(&mut self, g: GroupHandle, status: SolveStatus) {
        if let Some(group) = self.group_mut(g) {
            info!(
                "group {} ({:?}): {}, dof {}",
                group.name, g, status.how, status.dof
            );
            group.solved = status;
        }
    }
}
