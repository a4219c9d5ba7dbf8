use crate::numerical::solver_api::{ConstraintLayer, SolveResult};
use crate::sketch::sketch_document::Sketch;
use crate::symbolic::symbolic_engine::{EquationOrigin, GroupHandle};
use approx::assert_relative_eq;

/// a fixed group holding two points at (1, 1) and (4, 5)
fn sketch_with_anchors() -> (Sketch, GroupHandle, GroupHandle) {
    let mut sketch = Sketch::new();
    let fixed = sketch.add_group("fixed");
    let g = sketch.add_group("work");
    let a = sketch.add_point(fixed, 1.0, 1.0);
    let b = sketch.add_point(fixed, 4.0, 5.0);
    let p1 = sketch.add_point(g, 0.0, 0.0);
    let p2 = sketch.add_point(g, 2.0, 2.0);
    sketch.coincident(g, p1, a);
    sketch.coincident(g, p2, b);
    (sketch, fixed, g)
}

#[test]
fn test_reference_distance_between_pinned_points() {
    let (mut sketch, _, g) = sketch_with_anchors();
    let p1 = sketch.entities[2].h;
    let p2 = sketch.entities[3].h;
    let d = sketch.point_distance(g, p1, p2, 1.0);
    sketch.set_reference(d, true);
    let report = sketch.solve_group(g).unwrap();
    assert_eq!(report.result, SolveResult::OKAY);
    assert_eq!(report.dof, 0);
    assert!(report.bad.is_empty());
    assert_eq!(sketch.point_coords(p1), (1.0, 1.0));
    assert_eq!(sketch.point_coords(p2), (4.0, 5.0));
    let measured = sketch.constraint(d).and_then(|c| c.label()).unwrap();
    assert_relative_eq!(measured, 5.0, epsilon = 1e-8);
    let status = &sketch.group(g).unwrap().solved;
    assert_eq!(status.how, SolveResult::OKAY);
    assert!(!status.timeout);
}

#[test]
fn test_driving_distance_on_pinned_points_is_flagged() {
    let (mut sketch, fixed, g) = sketch_with_anchors();
    let p1 = sketch.entities[2].h;
    let p2 = sketch.entities[3].h;
    let d = sketch.point_distance(g, p1, p2, 7.0);
    let before: Vec<f64> = sketch.params.iter().map(|p| p.val).collect();
    let report = sketch.solve_group(g).unwrap();
    assert!(report.result.didnt_converge());
    assert!(report.bad.contains(&d));
    // nothing written back
    let after: Vec<f64> = sketch.params.iter().map(|p| p.val).collect();
    assert_eq!(before, after);
    // the fixed group was never touched
    assert_eq!(sketch.group(fixed).unwrap().solved.how, SolveResult::OKAY);
}

#[test]
fn test_lock_horizontal_distance() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let p1 = sketch.add_point(g, 0.0, 0.0);
    let p2 = sketch.add_point(g, 3.0, 3.0);
    sketch.lock(g, p1, 1.0, 2.0);
    sketch.horizontal(g, p1, p2);
    sketch.point_distance(g, p1, p2, 5.0);
    let report = sketch.solve_group(g).unwrap();
    assert_eq!(report.result, SolveResult::OKAY);
    assert_eq!(report.dof, 0);
    let (x, y) = sketch.point_coords(p2);
    assert_relative_eq!(x, 6.0, epsilon = 1e-9);
    assert_relative_eq!(y, 2.0, epsilon = 1e-9);
    assert!(sketch.params.iter().all(|p| p.known));
}

#[test]
fn test_circle_diameter_and_point_on_circle() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let center = sketch.add_point(g, 0.0, 0.0);
    let circle = sketch.add_circle(g, center, 1.0);
    let p = sketch.add_point(g, 2.0, 1.0);
    sketch.lock(g, center, 0.0, 0.0);
    sketch.diameter(g, circle, 4.0);
    sketch.point_on_circle(g, p, circle);
    sketch.vertical(g, center, p);
    let report = sketch.solve_group_with(g, true, true, false).unwrap();
    assert_eq!(report.result, SolveResult::OKAY);
    assert_eq!(report.dof, 0);
    let (x, y) = sketch.point_coords(p);
    assert_relative_eq!(x, 0.0, epsilon = 1e-8);
    assert_relative_eq!(y, 2.0, epsilon = 1e-8);
    assert!(sketch.params.iter().all(|p| !p.free));
}

#[test]
fn test_underconstrained_reports_dof_and_free() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let p1 = sketch.add_point(g, 0.0, 0.0);
    let p2 = sketch.add_point(g, 3.0, 4.0);
    sketch.lock(g, p1, 0.0, 0.0);
    sketch.point_distance(g, p1, p2, 10.0);
    let report = sketch.solve_group_with(g, true, true, false).unwrap();
    assert_eq!(report.result, SolveResult::OKAY);
    assert_eq!(report.dof, 1);
    let (x, y) = sketch.point_coords(p2);
    assert_relative_eq!((x * x + y * y).sqrt(), 10.0, epsilon = 1e-8);
    assert!(sketch.params.iter().any(|p| p.free));
}

#[test]
fn test_arc_writes_entity_equation() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let c = sketch.add_point(g, 0.0, 0.0);
    let s = sketch.add_point(g, 1.0, 0.0);
    let e = sketch.add_point(g, 0.0, 2.0);
    let arc = sketch.add_arc(g, c, s, e);
    let mut out = Vec::new();
    sketch.write_equations_except_for(g, None, &mut out);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].h.origin, EquationOrigin::Entity(arc));
    sketch.lock(g, c, 0.0, 0.0);
    sketch.lock(g, s, 1.0, 0.0);
    sketch.vertical(g, c, e);
    let report = sketch.solve_group(g).unwrap();
    assert_eq!(report.result, SolveResult::OKAY);
    let (_, y) = sketch.point_coords(e);
    assert_relative_eq!(y, 1.0, epsilon = 1e-8);
}

#[test]
fn test_equal_length() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let a0 = sketch.add_point(g, 0.0, 0.0);
    let a1 = sketch.add_point(g, 3.0, 0.0);
    let b0 = sketch.add_point(g, 0.0, 1.0);
    let b1 = sketch.add_point(g, 1.0, 1.0);
    sketch.lock(g, a0, 0.0, 0.0);
    sketch.lock(g, a1, 3.0, 0.0);
    sketch.lock(g, b0, 0.0, 1.0);
    sketch.horizontal(g, b0, b1);
    sketch.equal_length(g, (a0, a1), (b0, b1));
    let report = sketch.solve_group(g).unwrap();
    assert_eq!(report.result, SolveResult::OKAY);
    assert_eq!(report.dof, 0);
    assert_relative_eq!(sketch.point_coords(b1).0, 3.0, epsilon = 1e-8);
}

#[test]
fn test_all_dims_reference_writes_no_labels() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let p1 = sketch.add_point(g, 0.0, 0.0);
    let p2 = sketch.add_point(g, 0.0, 2.0);
    let d = sketch.point_distance(g, p1, p2, 9.0);
    sketch.group_mut(g).unwrap().policy.all_dims_reference = true;
    let mut out = Vec::new();
    sketch.write_equations_except_for(g, None, &mut out);
    assert!(out.is_empty());
    assert_eq!(sketch.constraint(d).and_then(|c| c.label()), Some(2.0));
}

#[test]
fn test_relaxed_group_keeps_coincidence_only() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let p1 = sketch.add_point(g, 0.0, 0.0);
    let p2 = sketch.add_point(g, 1.0, 1.0);
    let c = sketch.coincident(g, p1, p2);
    sketch.horizontal(g, p1, p2);
    sketch.lock(g, p1, 0.0, 0.0);
    sketch.group_mut(g).unwrap().policy.relax_constraints = true;
    let mut out = Vec::new();
    sketch.write_equations_except_for(g, None, &mut out);
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|e| e.h.constraint() == Some(c)));
}

#[test]
fn test_except_leaves_out_one_constraint() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let p1 = sketch.add_point(g, 0.0, 0.0);
    let p2 = sketch.add_point(g, 1.0, 1.0);
    let h = sketch.horizontal(g, p1, p2);
    let v = sketch.vertical(g, p1, p2);
    let mut out = Vec::new();
    sketch.write_equations_except_for(g, Some(h), &mut out);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].h.constraint(), Some(v));
    assert_eq!(sketch.group_constraints(g), vec![(h, false), (v, false)]);
}

#[test]
fn test_redundant_horizontal_found() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let p1 = sketch.add_point(g, 0.0, 0.0);
    let p2 = sketch.add_point(g, 1.0, 1.0);
    sketch.lock(g, p1, 0.0, 0.0);
    sketch.lock(g, p2, 2.0, 0.0);
    let h = sketch.horizontal(g, p1, p2);
    let report = sketch.solve_group_with(g, true, false, true).unwrap();
    assert_eq!(report.result, SolveResult::REDUNDANT_OKAY);
    assert!(report.bad.contains(&h));
    assert!(!report.find_to_fix_timed_out);
    assert_eq!(sketch.point_coords(p2), (2.0, 0.0));
}

#[test]
fn test_check_group_does_not_move() {
    let mut sketch = Sketch::new();
    let g = sketch.add_group("g");
    let p1 = sketch.add_point(g, 0.5, 0.0);
    let p2 = sketch.add_point(g, 1.0, 1.0);
    sketch.horizontal(g, p1, p2);
    let report = sketch.check_group(g, true).unwrap();
    assert_eq!(report.result, SolveResult::OKAY);
    assert_eq!(report.dof, 3);
    assert_eq!(sketch.point_coords(p1), (0.5, 0.0));
    assert!(sketch.params.iter().all(|p| p.free));
}

#[test]
fn test_unknown_group() {
    let mut sketch = Sketch::new();
    assert!(sketch.solve_group(GroupHandle(42)).is_err());
}
