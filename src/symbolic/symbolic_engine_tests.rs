use crate::params;
use crate::symbolic::symbolic_engine::{Expr, ParamHandle};
use crate::symbolic::symbolic_engine_derivatives::ReferencedParams;
use std::collections::HashMap;
//___________________________________TESTS____________________________________

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn values(pairs: &[(u32, f64)]) -> HashMap<ParamHandle, f64> {
        pairs.iter().map(|(h, v)| (ParamHandle(*h), *v)).collect()
    }

    #[test]
    fn test_operator_overloads() {
        let (x, y) = params!(1, 2);
        let expr = x.clone() - y.clone();
        let expected = Expr::Sub(
            Box::new(Expr::Param(ParamHandle(1))),
            Box::new(Expr::Param(ParamHandle(2))),
        );
        assert_eq!(expr, expected);
        let neg = -x;
        assert_eq!(neg, Expr::Neg(Box::new(Expr::Param(ParamHandle(1)))));
        assert_eq!(format!("{}", y.square()), "(p2)^2");
    }

    #[test]
    fn test_eval() {
        let (x, y) = params!(1, 2);
        // sqrt((x - 3)^2 + y^2)
        let dist = ((x - Expr::Const(3.0)).square() + y.square()).sqrt();
        let vals = values(&[(1, 0.0), (2, 4.0)]);
        assert_relative_eq!(dist.eval(&vals), 5.0);
    }

    #[test]
    fn test_unknown_param_is_nan() {
        let x = Expr::Param(ParamHandle(7));
        assert!(x.eval(&values(&[])).is_nan());
    }

    #[test]
    fn test_partial_wrt_product_and_quotient() {
        let (x, y) = params!(1, 2);
        let vals = values(&[(1, 2.0), (2, 3.0)]);
        // d(x*y)/dx = y
        let d = (x.clone() * y.clone()).partial_wrt(ParamHandle(1)).fold_constants();
        assert_eq!(d, y.clone());
        // d(x/y)/dy = -x/y^2
        let d = (x.clone() / y.clone()).partial_wrt(ParamHandle(2));
        assert_relative_eq!(d.eval(&vals), -2.0 / 9.0, epsilon = 1e-12);
        // d(sin(x)*x)/dx = cos(x)*x + sin(x)
        let f = Expr::sin(x.clone().boxed()) * x;
        let d = f.partial_wrt(ParamHandle(1));
        assert_relative_eq!(d.eval(&vals), 2.0f64.cos() * 2.0 + 2.0f64.sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_partial_of_distance() {
        let (x1, y1, x2, y2) = params!(1, 2, 3, 4);
        let dist = ((x1 - x2).square() + (y1 - y2).square()).sqrt();
        let vals = values(&[(1, 0.0), (2, 0.0), (3, 3.0), (4, 4.0)]);
        let d = dist.partial_wrt(ParamHandle(3)).fold_constants();
        assert_relative_eq!(d.eval(&vals), 0.6, epsilon = 1e-12);
        let d = dist.partial_wrt(ParamHandle(2)).fold_constants();
        assert_relative_eq!(d.eval(&vals), -0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_of_independent_subtree_is_zero() {
        let (x, y) = params!(1, 2);
        let f = Expr::cos(y.boxed()) * Expr::Const(4.0);
        assert!(f.partial_wrt(ParamHandle(1)).is_zero_const());
        let g = x.clone() - x;
        assert!(g.partial_wrt(ParamHandle(1)).folds_to_zero());
    }

    #[test]
    fn test_arcsin_derivative() {
        let x = Expr::Param(ParamHandle(1));
        let d = Expr::arcsin(x.boxed()).partial_wrt(ParamHandle(1));
        let vals = values(&[(1, 0.5)]);
        assert_relative_eq!(d.eval(&vals), 1.0 / (0.75f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_fold_constants() {
        let (x, y) = params!(1, 2);
        let e = Expr::Const(2.0) * Expr::Const(3.0) + x.clone();
        assert_eq!(e.fold_constants(), Expr::Const(6.0) + x.clone());
        let e = (x.clone() * Expr::Const(1.0)) + Expr::Const(0.0);
        assert_eq!(e.fold_constants(), x.clone());
        let e = Expr::Const(4.0).sqrt() * y.clone();
        assert_eq!(e.fold_constants(), Expr::Const(2.0) * y.clone());
        let e = Expr::Const(0.0) * (x.clone() + y.clone());
        assert!(e.fold_constants().is_zero_const());
        // 0 - x keeps its shape
        let e = Expr::Const(0.0) - x.clone();
        assert_eq!(e.fold_constants(), Expr::Const(0.0) - x);
    }

    #[test]
    fn test_params_used_and_counts() {
        let (x, y, z) = params!(1, 2, 3);
        let e = x.clone() * y.clone() + x.clone().square() - z;
        let mut used = Vec::new();
        e.params_used(&mut used);
        assert_eq!(used, vec![ParamHandle(1), ParamHandle(2), ParamHandle(3)]);
        assert_eq!(e.count_references(ParamHandle(1)), 2);
        assert_eq!(e.count_references(ParamHandle(3)), 1);
        assert_eq!(e.count_references(ParamHandle(9)), 0);
        assert!(e.depends_on(ParamHandle(2)));
        assert!(!e.depends_on(ParamHandle(4)));
    }

    #[test]
    fn test_referenced_params() {
        let (x, y, foreign) = params!(1, 2, 100);
        let is_solver = |h: ParamHandle| h.0 < 100;
        let e = x.clone() - foreign.clone();
        assert_eq!(e.referenced_params(&is_solver), ReferencedParams::Exactly(ParamHandle(1)));
        let e = x.clone().square() + x.clone();
        assert_eq!(e.referenced_params(&is_solver), ReferencedParams::Exactly(ParamHandle(1)));
        let e = x - y;
        assert_eq!(e.referenced_params(&is_solver), ReferencedParams::Multiple);
        let e = foreign - Expr::Const(1.0);
        assert_eq!(e.referenced_params(&is_solver), ReferencedParams::None);
    }

    #[test]
    fn test_rewrite_params_as_slots() {
        let (x, foreign) = params!(1, 100);
        let mut index = HashMap::new();
        index.insert(ParamHandle(1), 0usize);
        let e = (x - foreign).rewrite_params_as_slots(&index);
        assert_eq!(
            e,
            Expr::Sub(
                Box::new(Expr::ParamSlot(ParamHandle(1), 0)),
                Box::new(Expr::Param(ParamHandle(100))),
            )
        );
        // a slot differentiates like its handle
        assert_eq!(e.partial_wrt(ParamHandle(1)).fold_constants(), Expr::Const(1.0));
    }

    #[test]
    fn test_substitute_params() {
        let (a, b, c) = params!(1, 2, 3);
        let mut map = HashMap::new();
        map.insert(ParamHandle(1), ParamHandle(2));
        let e = (a + c.clone()).substitute_params(&map);
        assert_eq!(e, b + c);
    }
}
