/// Example
/// ```
/// use RustedGCS::numerical::solver_api::SolveResult;
/// use RustedGCS::sketch::sketch_document::Sketch;
/// // a point locked at (1, 2), a second point 5 units away on the same horizontal
/// let mut sketch = Sketch::new();
/// let g = sketch.add_group("g1");
/// let p1 = sketch.add_point(g, 0.0, 0.0);
/// let p2 = sketch.add_point(g, 3.0, 3.0);
/// sketch.lock(g, p1, 1.0, 2.0);
/// sketch.horizontal(g, p1, p2);
/// sketch.point_distance(g, p1, p2, 5.0);
/// let report = sketch.solve_group(g).unwrap();
/// assert_eq!(report.result, SolveResult::OKAY);
/// assert_eq!(report.dof, 0);
/// let (x, y) = sketch.point_coords(p2);
/// assert!((x - 6.0).abs() < 1e-6 && (y - 2.0).abs() < 1e-6);
/// ```
/// result taxonomy, group policy and the trait the document implements
pub mod solver_api;
/// parameter and equation store with explicit per-phase state
pub mod system;
/// symbolic Jacobian assembly, numeric evaluation
pub mod jacobian;
/// collapsing of `a - b = 0` pairs through union-find
pub mod substitution;
/// solving `e = 0` for one unknown in closed form
pub mod isolate;
/// singleton pass and sequential single-use elimination
pub mod elimination;
/// Newton-Raphson with weighted minimum norm least squares steps
pub mod NR_least_squares;
/// rank, DOF, free unknowns
pub mod rank;
/// search for constraints whose removal restores full rank
pub mod find_to_fix;
/// `solve` and `solve_rank`
pub mod solve;
