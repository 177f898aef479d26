// SPDX: CC0-1.0

//! Real roots of single-variable equations.
//!
//! Polynomials with rational coefficients are solved exactly as far as the
//! rational root theorem and the quadratic formula reach. Whatever is left,
//! and every non-polynomial equation, is searched numerically.

use crate::{
    calculus::snap,
    expr::{Expr, Num, Rational},
    poly::Poly,
    simplify::{add_terms, canonical, expand, numer_denom, simplify},
    Number,
};
use log::debug;
use num::{
    integer::gcd,
    traits::{CheckedMul, Zero},
};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolveErr {
    #[error("every value of {0} is a solution")]
    Identity(String),

    #[error("cannot solve {expr} = 0 for {var}, it also depends on {others}")]
    FreeSymbols {
        expr: Expr,
        var: String,
        others: String,
    },
}

const SEARCH_MIN: Number = -10.0;
const SEARCH_MAX: Number = 10.0;
const SEARCH_STEPS: usize = 4000;
const BISECT_ITERS: usize = 200;
// residual above which a sign change is taken to be a pole
const MAX_RESIDUAL: Number = 1e-6;
const MAX_DIVISOR: u64 = 100_000;

/// Solutions of `e = 0`, sorted by value and without duplicates.
pub fn solve(e: &Expr, var: &str) -> Result<Vec<Expr>, SolveErr> {
    let e = simplify(e);
    let (numer, denom) = numer_denom(&e);
    if !numer.depends_on(var) {
        return if numer.is_zero() {
            Err(SolveErr::Identity(var.to_string()))
        } else {
            Ok(Vec::new())
        };
    }

    let expanded = expand(&numer);
    let mut roots = match Poly::from_expr(&expanded, var) {
        Some(p) => polynomial_roots(p),
        None => match linear(&expanded, var) {
            Some(root) => vec![root],
            None => {
                let others: Vec<String> = numer
                    .free_symbols()
                    .into_iter()
                    .filter(|s| s != var)
                    .collect();
                if !others.is_empty() {
                    return Err(SolveErr::FreeSymbols {
                        expr: e,
                        var: var.to_string(),
                        others: others.join(", "),
                    });
                }
                debug!("solving {numer} = 0 numerically");
                numeric_roots(|x| numer.eval_at(var, x).unwrap_or(Number::NAN))
                    .into_iter()
                    .map(snap)
                    .collect()
            }
        },
    };
    roots.retain(|r| admissible(&denom, var, r));
    Ok(sorted(roots))
}

fn polynomial_roots(mut p: Poly) -> Vec<Expr> {
    let mut roots = Vec::new();
    if p.coeff(0).is_zero() {
        roots.push(Expr::zero());
        while p.degree() > 0 && p.coeff(0).is_zero() {
            p = Poly::new(p.coeffs()[1..].to_vec());
        }
    }

    for r in rational_candidates(&p) {
        while p.degree() > 0 {
            match p.deflate(r) {
                Some(q) => {
                    roots.push(Expr::Num(Num::Rat(r)));
                    p = q;
                }
                None => break,
            }
        }
    }

    match p.degree() {
        0 => {}
        1 => roots.push(canonical(
            &(Expr::Num(-Num::Rat(p.coeff(0))) / Expr::Num(Num::Rat(p.coeff(1)))),
        )),
        2 => roots.extend(quadratic(&p)),
        _ => {
            debug!("no closed form for a degree {} factor", p.degree());
            roots.extend(numeric_roots(|x| p.eval_f64(x)).into_iter().map(Expr::float));
        }
    }
    roots
}

fn quadratic(p: &Poly) -> Vec<Expr> {
    let (c, b, a) = (Num::Rat(p.coeff(0)), Num::Rat(p.coeff(1)), Num::Rat(p.coeff(2)));
    let disc = b * b + -(Num::int(4) * a * c);
    if disc.is_negative() {
        return Vec::new();
    }
    let two_a = Expr::Num(Num::int(2) * a);
    if disc.is_zero() {
        return vec![canonical(&(Expr::Num(-b) / two_a))];
    }
    let root = Expr::sqrt(Expr::Num(disc));
    [Expr::int(-1), Expr::one()]
        .into_iter()
        .map(|sign| expand(&canonical(&((Expr::Num(-b) + sign * root.clone()) / two_a.clone()))))
        .collect()
}

/// `±p/q` with `p | a0` and `q | an`, after clearing denominators.
fn rational_candidates(p: &Poly) -> Vec<Rational> {
    let Some(ints) = integer_coeffs(p) else {
        return Vec::new();
    };
    let (Some(&a0), Some(&an)) = (ints.first(), ints.last()) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for q in divisors(an) {
        for n in divisors(a0) {
            out.push(Rational::new(n, q));
            out.push(Rational::new(-n, q));
        }
    }
    out.sort();
    out.dedup();
    out
}

fn integer_coeffs(p: &Poly) -> Option<Vec<i64>> {
    let mut lcm: i64 = 1;
    for c in p.coeffs() {
        let d = *c.denom();
        lcm = (lcm / gcd(lcm, d)).checked_mul(d)?;
    }
    let scale = Rational::from_integer(lcm);
    p.coeffs()
        .iter()
        .map(|c| c.checked_mul(&scale).map(|c| c.to_integer()))
        .collect()
}

fn divisors(n: i64) -> Vec<i64> {
    let n = n.unsigned_abs();
    if n == 0 || n > MAX_DIVISOR {
        return Vec::new();
    }
    (1..=n).filter(|d| n % d == 0).map(|d| d as i64).collect()
}

/// `c1·var + c0 = 0` with coefficients free of `var`.
fn linear(e: &Expr, var: &str) -> Option<Expr> {
    let terms = match e {
        Expr::Add(xs) => xs.as_slice(),
        other => core::slice::from_ref(other),
    };
    let x = Expr::sym(var);
    let mut c0 = Vec::new();
    let mut c1 = Vec::new();
    for t in terms {
        if !t.depends_on(var) {
            c0.push(t.clone());
            continue;
        }
        let c = canonical(&(t.clone() / x.clone()));
        if c.depends_on(var) {
            return None;
        }
        c1.push(c);
    }
    let c1 = add_terms(c1);
    if c1.is_zero() {
        return None;
    }
    Some(simplify(&(-add_terms(c0) / c1)))
}

/// Sign changes on a fixed grid, refined by bisection.
fn numeric_roots(f: impl Fn(Number) -> Number) -> Vec<Number> {
    let step = (SEARCH_MAX - SEARCH_MIN) / SEARCH_STEPS as Number;
    let mut roots = Vec::new();
    let (mut px, mut py) = (SEARCH_MIN, f(SEARCH_MIN));
    for i in 1..=SEARCH_STEPS {
        let x = SEARCH_MIN + step * i as Number;
        let y = f(x);
        if py == 0.0 {
            roots.push(px);
        } else if py.is_finite() && y.is_finite() && y != 0.0 && py.signum() != y.signum() {
            let r = bisect(&f, px, x);
            if f(r).abs() < MAX_RESIDUAL {
                roots.push(r);
            }
        }
        (px, py) = (x, y);
    }
    if py == 0.0 {
        roots.push(px);
    }
    roots
}

fn bisect(f: &impl Fn(Number) -> Number, mut lo: Number, mut hi: Number) -> Number {
    let lo_sign = f(lo).signum();
    for _ in 0..BISECT_ITERS {
        let mid = 0.5 * (lo + hi);
        if mid == lo || mid == hi {
            break;
        }
        let y = f(mid);
        if y == 0.0 {
            return mid;
        }
        if y.signum() == lo_sign {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Roots that make the denominator vanish are not solutions.
fn admissible(denom: &Expr, var: &str, root: &Expr) -> bool {
    if !denom.depends_on(var) {
        return true;
    }
    match root.approx_const() {
        Some(r) => denom
            .eval_at(var, r)
            .is_some_and(|d| d.is_finite() && d.abs() > 1e-12),
        None => true,
    }
}

fn sorted(mut roots: Vec<Expr>) -> Vec<Expr> {
    let key = |r: &Expr| r.approx_const().unwrap_or(Number::NAN);
    roots.sort_by(|a, b| {
        key(a)
            .total_cmp(&key(b))
            .then_with(|| a.to_string().cmp(&b.to_string()))
    });
    roots.dedup_by(|a, b| {
        let (a_val, b_val) = (key(&*a), key(&*b));
        *a == *b || (a_val - b_val).abs() <= 1e-9 * a_val.abs().max(1.0)
    });
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Func;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn x() -> Expr {
        Expr::sym("x")
    }

    fn shown(e: &Expr) -> Vec<String> {
        solve(e, "x")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn rational_roots() {
        assert_eq!(shown(&(Expr::powi(x(), 2) - Expr::int(4))), ["-2", "2"]);
        assert_eq!(shown(&(Expr::int(2) * x() + Expr::one())), ["-1/2"]);
        assert_eq!(shown(&(Expr::powi(x(), 3) - x())), ["-1", "0", "1"]);
    }

    #[test]
    fn repeated_roots_are_reported_once() {
        assert_eq!(shown(&Expr::powi(x() - Expr::one(), 2)), ["1"]);
    }

    #[test]
    fn quadratic_formula() {
        assert_eq!(shown(&(Expr::powi(x(), 2) - Expr::int(2))), ["-sqrt(2)", "sqrt(2)"]);
        assert_eq!(shown(&(Expr::powi(x(), 2) + Expr::one())), Vec::<String>::new());
    }

    #[test]
    fn linear_with_symbolic_coefficients() {
        let e = Expr::sym("a") * x() - Expr::sym("b");
        assert_eq!(shown(&e), ["b/a"]);
    }

    #[test]
    fn other_symbols_are_rejected() {
        let e = Expr::powi(x(), 2) + Expr::sym("a");
        assert!(matches!(solve(&e, "x"), Err(SolveErr::FreeSymbols { .. })));
    }

    #[test]
    fn identities_and_contradictions() {
        assert_eq!(solve(&(x() - x()), "x"), Err(SolveErr::Identity("x".into())));
        assert_eq!(solve(&(Expr::one() - Expr::int(2)), "x"), Ok(Vec::new()));
    }

    #[test]
    fn excludes_poles() {
        assert_eq!(shown(&Expr::powi(x(), -1)), Vec::<String>::new());
        let e = (Expr::powi(x(), 2) - Expr::one()) / (x() - Expr::one());
        assert_eq!(shown(&e), ["-1"]);
    }

    #[test]
    fn transcendental_roots_numerically() {
        let roots = solve(&(Expr::call(Func::Exp, x()) - Expr::int(2)), "x").unwrap();
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(
            roots[0].approx_const().unwrap(),
            core::f64::consts::LN_2,
            epsilon = 1e-8
        );

        let roots = solve(&Expr::call(Func::Sin, x()), "x").unwrap();
        assert_eq!(roots.len(), 7);
        assert_eq!(roots[3].to_string(), "0");
        assert_relative_eq!(
            roots[4].approx_const().unwrap(),
            core::f64::consts::PI,
            epsilon = 1e-8
        );
    }

    #[test]
    fn tangent_poles_are_not_roots() {
        let roots = solve(&Expr::call(Func::Tan, x()), "x").unwrap();
        assert!(roots
            .iter()
            .all(|r| r.approx_const().unwrap().sin().abs() < 1e-6));
    }

    #[test]
    fn irreducible_cubic_falls_back_to_search() {
        let roots = solve(&(Expr::powi(x(), 3) - Expr::int(2)), "x").unwrap();
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0].approx_const().unwrap(), 2f64.cbrt(), epsilon = 1e-9);
    }
}
