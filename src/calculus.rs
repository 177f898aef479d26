// SPDX: CC0-1.0

//! Differentiation, integration, limits and Taylor expansion.
//!
//! Everything here is rule based and works on canonical trees. When the
//! rules run out, limits and definite integrals fall back to numerics;
//! antiderivatives and series do not, and report an error instead.

use crate::{
    expr::{Expr, Func, Num},
    poly::Poly,
    simplify::{add_terms, canonical, expand, mul_factors, numer_denom, power, simplify},
    Number,
};
use core::fmt;
use log::debug;
use num::traits::Zero;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CalculusErr {
    #[error("no closed form found for the integral of {0}")]
    NoAntiderivative(Expr),

    #[error("the integral of {0} does not converge numerically")]
    Quadrature(Expr),

    #[error("the limit of {expr} as {var} -> {point}{dir} does not exist")]
    NoLimit {
        expr: Expr,
        var: String,
        point: Number,
        dir: Direction,
    },

    #[error("{expr} has no Taylor expansion around {var} = {point}")]
    NoSeries {
        expr: Expr,
        var: String,
        point: Number,
    },
}

/// Side from which a limit is approached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Right,
    Left,
    Both,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Right => write!(f, "+"),
            Self::Left => write!(f, "-"),
            Self::Both => Ok(()),
        }
    }
}

impl core::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" | "right" => Ok(Self::Right),
            "-" | "left" => Ok(Self::Left),
            "+-" | "-+" | "both" => Ok(Self::Both),
            other => Err(format!("expected '+', '-' or '+-', found '{other}'")),
        }
    }
}

// sentinel used when mapping infinite limits to zero; the lexer cannot
// produce it, so it never clashes with a user symbol
const INVERSE_VAR: &str = "ε";

const MAX_INTEGRATION_DEPTH: usize = 8;
const MAX_LHOPITAL: usize = 8;
const SIMPSON_INTERVALS: usize = 2000;
// numeric results closer to zero than this are taken to be zero
const SNAP_ZERO: Number = 1e-7;

pub fn diff(e: &Expr, var: &str) -> Expr {
    canonical(&derivative(e, var))
}

fn derivative(e: &Expr, var: &str) -> Expr {
    if !e.depends_on(var) {
        return Expr::zero();
    }
    match e {
        Expr::Num(_) | Expr::Const(_) => Expr::zero(),
        Expr::Sym(_) => Expr::one(),
        Expr::Add(xs) => Expr::Add(xs.iter().map(|x| derivative(x, var)).collect()),
        Expr::Mul(xs) => Expr::Add(
            (0..xs.len())
                .filter(|&i| xs[i].depends_on(var))
                .map(|i| {
                    let mut term = xs.clone();
                    term[i] = derivative(&xs[i], var);
                    Expr::Mul(term)
                })
                .collect(),
        ),
        Expr::Pow(b, x) => {
            let (b, x) = (&**b, &**x);
            match (b.depends_on(var), x.depends_on(var)) {
                (true, false) => Expr::Mul(vec![
                    x.clone(),
                    Expr::pow(b.clone(), x.clone() - Expr::one()),
                    derivative(b, var),
                ]),
                (false, _) => Expr::Mul(vec![
                    e.clone(),
                    Expr::call(Func::Ln, b.clone()),
                    derivative(x, var),
                ]),
                (true, true) => {
                    e.clone()
                        * (derivative(x, var) * Expr::call(Func::Ln, b.clone())
                            + x.clone() * derivative(b, var) / b.clone())
                }
            }
        }
        Expr::Call(fun, a) => {
            let a = &**a;
            let outer = match fun {
                Func::Sin => Expr::call(Func::Cos, a.clone()),
                Func::Cos => -Expr::call(Func::Sin, a.clone()),
                Func::Tan => Expr::powi(Expr::call(Func::Tan, a.clone()), 2) + Expr::one(),
                Func::Asin => Expr::pow(Expr::one() - Expr::powi(a.clone(), 2), Expr::rat(-1, 2)),
                Func::Acos => -Expr::pow(Expr::one() - Expr::powi(a.clone(), 2), Expr::rat(-1, 2)),
                Func::Atan => Expr::powi(Expr::one() + Expr::powi(a.clone(), 2), -1),
                Func::Exp => e.clone(),
                Func::Ln => Expr::powi(a.clone(), -1),
                // sign(a) = a / |a|
                Func::Abs => a.clone() / e.clone(),
            };
            outer * derivative(a, var)
        }
    }
}

/// `d/d var` of `e`, when it does not depend on `var`.
fn slope(e: &Expr, var: &str) -> Option<Expr> {
    let d = diff(e, var);
    (!d.depends_on(var) && !d.is_zero()).then_some(d)
}

fn is_polynomial(e: &Expr, var: &str) -> bool {
    Poly::from_expr(&expand(e), var).is_some()
}

/// Indefinite integral with the constant of integration omitted.
pub fn integrate(e: &Expr, var: &str) -> Result<Expr, CalculusErr> {
    let e = canonical(e);
    match antiderivative(&e, var, 0) {
        Some(f) => Ok(canonical(&f)),
        None => Err(CalculusErr::NoAntiderivative(e)),
    }
}

fn antiderivative(e: &Expr, var: &str, depth: usize) -> Option<Expr> {
    if depth > MAX_INTEGRATION_DEPTH {
        return None;
    }
    let x = Expr::sym(var);
    if !e.depends_on(var) {
        return Some(e.clone() * x);
    }
    match e {
        Expr::Num(_) | Expr::Const(_) => None,
        Expr::Sym(_) => Some(Expr::powi(x, 2) / Expr::int(2)),
        Expr::Add(xs) => xs
            .iter()
            .map(|x| antiderivative(x, var, depth))
            .collect::<Option<Vec<_>>>()
            .map(Expr::Add),
        Expr::Mul(xs) => product_rule(e, xs, var, depth),
        Expr::Pow(b, n) => power_rule(e, b, n, var, depth),
        Expr::Call(fun, u) => Some(primitive(*fun, u)? / slope(u, var)?),
    }
}

/// Antiderivative of `fun(u)` with respect to `u`.
fn primitive(fun: Func, u: &Expr) -> Option<Expr> {
    let u = u.clone();
    let sqrt_one_minus_sq = || Expr::sqrt(Expr::one() - Expr::powi(u.clone(), 2));
    Some(match fun {
        Func::Sin => -Expr::call(Func::Cos, u),
        Func::Cos => Expr::call(Func::Sin, u),
        Func::Tan => -Expr::call(Func::Ln, Expr::call(Func::Cos, u)),
        Func::Exp => Expr::call(Func::Exp, u),
        Func::Ln => u.clone() * Expr::call(Func::Ln, u.clone()) - u,
        Func::Atan => {
            u.clone() * Expr::call(Func::Atan, u.clone())
                - Expr::call(Func::Ln, Expr::powi(u, 2) + Expr::one()) / Expr::int(2)
        }
        Func::Asin => u.clone() * Expr::call(Func::Asin, u.clone()) + sqrt_one_minus_sq(),
        Func::Acos => u.clone() * Expr::call(Func::Acos, u.clone()) - sqrt_one_minus_sq(),
        Func::Abs => u.clone() * Expr::call(Func::Abs, u) / Expr::int(2),
    })
}

fn power_rule(e: &Expr, b: &Expr, n: &Expr, var: &str, depth: usize) -> Option<Expr> {
    if !n.depends_on(var) {
        if let Some(a) = slope(b, var) {
            return Some(if n.as_num() == Some(Num::int(-1)) {
                Expr::call(Func::Ln, b.clone()) / a
            } else {
                let n1 = n.clone() + Expr::one();
                Expr::pow(b.clone(), n1.clone()) / (n1 * a)
            });
        }
        if let Some(found) = quadratic_form(b, n, var) {
            return Some(found);
        }
        if n.as_num().and_then(Num::as_integer).is_some_and(|k| k > 1) {
            let expanded = expand(e);
            if expanded != *e {
                return antiderivative(&expanded, var, depth + 1);
            }
        }
        return None;
    }
    if !b.depends_on(var) {
        let a = slope(n, var)?;
        return Some(e.clone() / (a * Expr::call(Func::Ln, b.clone())));
    }
    None
}

/// `1/(a·x² + c)` and `1/sqrt(c - a·x²)` with positive `a`, `c`.
fn quadratic_form(b: &Expr, n: &Expr, var: &str) -> Option<Expr> {
    let p = Poly::from_expr(&expand(b), var)?;
    if p.degree() != 2 || !p.coeff(1).is_zero() {
        return None;
    }
    let (c, a) = (Expr::Num(Num::Rat(p.coeff(0))), Expr::Num(Num::Rat(p.coeff(2))));
    let (c_pos, a_pos) = (
        !Num::Rat(p.coeff(0)).is_negative() && !p.coeff(0).is_zero(),
        !Num::Rat(p.coeff(2)).is_negative(),
    );
    let x = Expr::sym(var);
    match n.as_num() {
        Some(k) if k == Num::int(-1) && c_pos && a_pos => {
            let scale = Expr::sqrt(a.clone() / c.clone());
            Some(Expr::call(Func::Atan, scale * x) / Expr::sqrt(a * c))
        }
        Some(k) if k == Num::ratio(-1, 2) && c_pos && !a_pos => {
            let a = -a;
            let scale = Expr::sqrt(a.clone() / c);
            Some(Expr::call(Func::Asin, scale * x) / Expr::sqrt(a))
        }
        _ => None,
    }
}

fn product_rule(e: &Expr, xs: &[Expr], var: &str, depth: usize) -> Option<Expr> {
    let (constant, varying): (Vec<Expr>, Vec<Expr>) =
        xs.iter().cloned().partition(|x| !x.depends_on(var));
    if !constant.is_empty() {
        let inner = antiderivative(&mul_factors(varying), var, depth)?;
        return Some(Expr::Mul(constant) * inner);
    }

    if let Some(found) = substitution(e, &varying, var) {
        return Some(found);
    }

    let expanded = expand(e);
    if expanded != *e {
        return antiderivative(&expanded, var, depth + 1);
    }

    if let Some(found) = polynomial_over_linear(e, var, depth) {
        return Some(found);
    }

    // integration by parts: polynomial times one transcendental factor
    let (poly, other): (Vec<Expr>, Vec<Expr>) =
        varying.into_iter().partition(|x| is_polynomial(x, var));
    let [g] = other.as_slice() else {
        return None;
    };
    let p = mul_factors(poly);
    match g {
        Expr::Call(Func::Ln, u) if slope(u, var).is_some() => {
            let q = antiderivative(&p, var, depth + 1)?;
            let rest = canonical(&(q.clone() * derivative(g, var)));
            Some(q * g.clone() - antiderivative(&rest, var, depth + 1)?)
        }
        _ => {
            let big_g = canonical(&antiderivative(g, var, depth + 1)?);
            let rest = canonical(&(diff(&p, var) * big_g.clone()));
            Some(p * big_g - antiderivative(&rest, var, depth + 1)?)
        }
    }
}

/// `c·g·g'` integrates to `c·g²/2` for any factor `g`.
fn substitution(e: &Expr, factors: &[Expr], var: &str) -> Option<Expr> {
    factors.iter().find_map(|g| {
        let dg = diff(g, var);
        if dg.is_zero() {
            return None;
        }
        let c = canonical(&(e.clone() / (g.clone() * dg)));
        (!c.depends_on(var)).then(|| c * Expr::powi(g.clone(), 2) / Expr::int(2))
    })
}

/// `P(x)/(a·x + c)` by polynomial division.
fn polynomial_over_linear(e: &Expr, var: &str, depth: usize) -> Option<Expr> {
    let (numer, denom) = numer_denom(e);
    let d = Poly::from_expr(&expand(&denom), var)?;
    if d.degree() != 1 {
        return None;
    }
    let n = Poly::from_expr(&expand(&numer), var)?;
    let (q, r) = n.div_rem(&d)?;
    let rest = mul_factors(vec![r.to_expr(var), power(d.to_expr(var), Expr::int(-1))]);
    let whole = canonical(&(q.to_expr(var) + rest));
    if whole == *e {
        return None;
    }
    antiderivative(&whole, var, depth + 1)
}

/// `∫ e d var` over `[lower, upper]`, exactly when an antiderivative exists
/// and numerically otherwise.
pub fn integrate_between(
    e: &Expr,
    var: &str,
    lower: Number,
    upper: Number,
) -> Result<Expr, CalculusErr> {
    let e = canonical(e);
    if let Ok(f) = integrate(&e, var) {
        let hi = limit(&f, var, upper, Direction::Left);
        let lo = limit(&f, var, lower, Direction::Right);
        if let (Ok(hi), Ok(lo)) = (hi, lo) {
            let value = simplify(&(hi - lo));
            if value.approx_const().is_some_and(|v| !v.is_nan()) {
                return Ok(value);
            }
        }
    }
    debug!("no usable antiderivative for {e}, using Simpson's rule");
    simpson(&e, var, lower, upper)
        .map(snap)
        .ok_or(CalculusErr::Quadrature(e))
}

fn simpson(e: &Expr, var: &str, lower: Number, upper: Number) -> Option<Number> {
    if !lower.is_finite() || !upper.is_finite() {
        return None;
    }
    let n = SIMPSON_INTERVALS;
    let h = (upper - lower) / n as Number;
    let mut acc = 0.0;
    for i in 0..=n {
        let weight = match i {
            0 => 1.0,
            i if i == n => 1.0,
            i if i % 2 == 1 => 4.0,
            _ => 2.0,
        };
        let y = e.eval_at(var, lower + h * i as Number)?;
        if !y.is_finite() {
            return None;
        }
        acc += weight * y;
    }
    Some(acc * h / 3.0)
}

/// Small-denominator rational close to `v`, or `v` itself.
pub(crate) fn snap(v: Number) -> Expr {
    if !v.is_finite() {
        return Expr::float(v);
    }
    if v.abs() < SNAP_ZERO {
        return Expr::zero();
    }
    for denom in 1..=64i64 {
        let scaled = v * denom as Number;
        let numer = scaled.round();
        if (scaled - numer).abs() < 1e-9 * denom as Number && numer.abs() < 1e15 {
            return Expr::rat(numer as i64, denom);
        }
    }
    Expr::float(v)
}

pub fn limit(e: &Expr, var: &str, point: Number, dir: Direction) -> Result<Expr, CalculusErr> {
    let fail = || CalculusErr::NoLimit {
        expr: e.clone(),
        var: var.to_string(),
        point,
        dir,
    };
    let e = canonical(e);
    if !e.depends_on(var) {
        return Ok(e);
    }
    if point.is_nan() {
        return Err(fail());
    }
    if point.is_infinite() {
        // x = ±1/ε with ε -> 0+
        let sign = if point > 0.0 { 1 } else { -1 };
        let inverse = canonical(&(Expr::int(sign) / Expr::sym(INVERSE_VAR)));
        let mapped = canonical(&e.subs(var, &inverse));
        return one_sided(&mapped, INVERSE_VAR, 0.0, 1.0, 0).ok_or_else(fail);
    }
    match dir {
        Direction::Right => one_sided(&e, var, point, 1.0, 0).ok_or_else(fail),
        Direction::Left => one_sided(&e, var, point, -1.0, 0).ok_or_else(fail),
        Direction::Both => {
            let right = one_sided(&e, var, point, 1.0, 0).ok_or_else(fail)?;
            let left = one_sided(&e, var, point, -1.0, 0).ok_or_else(fail)?;
            match (right.approx_const(), left.approx_const()) {
                (Some(r), Some(l))
                    if r == l
                        || (r.is_finite()
                            && l.is_finite()
                            && (r - l).abs() <= 1e-9 * r.abs().max(1.0)) =>
                {
                    Ok(right)
                }
                _ => Err(fail()),
            }
        }
    }
}

fn value_at(e: &Expr, var: &str, point: Number) -> Option<Number> {
    canonical(&e.subs(var, &Expr::from_number(point))).approx_const()
}

fn one_sided(e: &Expr, var: &str, point: Number, side: Number, depth: usize) -> Option<Expr> {
    let at = canonical(&e.subs(var, &Expr::from_number(point)));
    if at.approx_const().is_some_and(Number::is_finite) {
        return Some(simplify(&at));
    }

    if depth < MAX_LHOPITAL {
        let tiny = |v: Option<Number>| v.is_some_and(|v| v.abs() < 1e-12);
        let huge = |v: Option<Number>| v.is_some_and(Number::is_infinite);

        let (numer, denom) = numer_denom(e);
        if denom.depends_on(var) {
            let n = value_at(&numer, var, point);
            let d = value_at(&denom, var, point);
            if (tiny(n) && tiny(d)) || (huge(n) && huge(d)) {
                if let Some(found) = lhopital(&numer, &denom, var, point, side, depth) {
                    return Some(found);
                }
            }
        }

        // 0·oo as a quotient, logarithms kept in the numerator
        if let Expr::Mul(xs) = e {
            let (zero, rest): (Vec<Expr>, Vec<Expr>) = xs
                .iter()
                .cloned()
                .partition(|x| tiny(value_at(x, var, point)));
            if !zero.is_empty() && rest.iter().any(|x| huge(value_at(x, var, point))) {
                let (zero, rest) = (mul_factors(zero), mul_factors(rest));
                let (numer, denom) = if contains_ln(&rest) && !contains_ln(&zero) {
                    (rest, power(zero, Expr::int(-1)))
                } else {
                    (zero, power(rest, Expr::int(-1)))
                };
                if let Some(found) = lhopital(&numer, &denom, var, point, side, depth) {
                    return Some(found);
                }
            }
        }

        // 1**oo through exp(v·ln u)
        if let Expr::Pow(u, v) = e {
            let near_one = value_at(u, var, point).is_some_and(|b| (b - 1.0).abs() < 1e-12);
            if near_one && huge(value_at(v, var, point)) {
                let exponent = canonical(&((**v).clone() * Expr::call(Func::Ln, (**u).clone())));
                debug!("1**oo, taking the limit of {exponent}");
                if let Some(l) = one_sided(&exponent, var, point, side, depth + 1) {
                    return Some(simplify(&canonical(&Expr::call(Func::Exp, l))));
                }
            }
        }
    }

    numeric_limit(e, var, point, side)
}

fn lhopital(
    numer: &Expr,
    denom: &Expr,
    var: &str,
    point: Number,
    side: Number,
    depth: usize,
) -> Option<Expr> {
    debug!("l'hopital on {numer} / {denom}");
    let next = canonical(&(diff(numer, var) / diff(denom, var)));
    one_sided(&next, var, point, side, depth + 1)
}

fn contains_ln(e: &Expr) -> bool {
    match e {
        Expr::Call(Func::Ln, _) => true,
        Expr::Call(_, a) => contains_ln(a),
        Expr::Add(xs) | Expr::Mul(xs) => xs.iter().any(contains_ln),
        Expr::Pow(b, x) => contains_ln(b) || contains_ln(x),
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => false,
    }
}

fn numeric_limit(e: &Expr, var: &str, point: Number, side: Number) -> Option<Expr> {
    debug!("numeric limit of {e} at {point}");
    let values: Vec<Number> = (4..=9)
        .map(|k| {
            let h = 10f64.powi(-k) * point.abs().max(1.0);
            e.eval_at(var, point + side * h).unwrap_or(Number::NAN)
        })
        .collect();
    let tail = &values[values.len() - 3..];
    if tail.iter().any(|v| v.is_nan()) {
        return None;
    }
    let last = tail[2];
    let converged = tail
        .windows(2)
        .all(|w| (w[1] - w[0]).abs() <= 1e-5 * w[1].abs().max(1.0));
    if converged && last.is_finite() {
        return Some(snap(last));
    }
    // samples may already have overflowed to infinity
    let diverging = tail
        .windows(2)
        .all(|w| w[1].is_infinite() || w[1].abs() > w[0].abs() * 2.0)
        && tail.iter().all(|v| v.signum() == last.signum())
        && last.abs() > 1e6;
    diverging.then(|| Expr::float(Number::INFINITY.copysign(last)))
}

/// Taylor polynomial of `e` around `x0`, terms of order `0..order`.
pub fn series(e: &Expr, var: &str, x0: Number, order: usize) -> Result<Expr, CalculusErr> {
    let fail = || CalculusErr::NoSeries {
        expr: e.clone(),
        var: var.to_string(),
        point: x0,
    };
    let shift = canonical(&(Expr::sym(var) - Expr::from_number(x0)));
    let mut d = canonical(e);
    let mut factorial = Num::int(1);
    let mut terms = Vec::with_capacity(order);
    for k in 0..order {
        if k > 0 {
            factorial = factorial * Num::int(k as i64);
            d = diff(&d, var);
        }
        let c = limit(&d, var, x0, Direction::Both).map_err(|_| fail())?;
        if !c.approx_const().is_some_and(Number::is_finite) {
            return Err(fail());
        }
        if c.is_zero() {
            continue;
        }
        terms.push(mul_factors(vec![
            c,
            Expr::Num(factorial.recip()),
            power(shift.clone(), Expr::int(k as i64)),
        ]));
    }
    Ok(add_terms(terms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn x() -> Expr {
        Expr::sym("x")
    }

    fn sin(e: Expr) -> Expr {
        Expr::call(Func::Sin, e)
    }

    fn exp(e: Expr) -> Expr {
        Expr::call(Func::Exp, e)
    }

    #[test]
    fn differentiates_polynomials() {
        assert_eq!(diff(&Expr::powi(x(), 2), "x").to_string(), "2*x");
        assert_eq!(diff(&(Expr::powi(x(), 3) + x()), "x").to_string(), "3*x**2 + 1");
        assert_eq!(diff(&Expr::int(7), "x").to_string(), "0");
        assert_eq!(diff(&Expr::sym("y"), "x").to_string(), "0");
    }

    #[test]
    fn differentiates_with_chain_and_product_rules() {
        assert_eq!(diff(&sin(x()), "x").to_string(), "cos(x)");
        assert_eq!(diff(&(x() * sin(x())), "x").to_string(), "x*cos(x) + sin(x)");
        assert_eq!(diff(&exp(Expr::int(2) * x()), "x").to_string(), "2*exp(2*x)");
        assert_eq!(diff(&Expr::call(Func::Ln, x()), "x").to_string(), "1/x");
        assert_eq!(
            diff(&Expr::pow(Expr::int(2), x()), "x").to_string(),
            "2**x*log(2)"
        );
    }

    #[test]
    fn integrates_power_rule() {
        assert_eq!(integrate(&(Expr::int(2) * x()), "x").unwrap().to_string(), "x**2");
        assert_eq!(
            integrate(&(Expr::int(3) * Expr::powi(x(), 2)), "x").unwrap().to_string(),
            "x**3"
        );
        assert_eq!(integrate(&Expr::powi(x(), -1), "x").unwrap().to_string(), "log(x)");
        assert_eq!(integrate(&Expr::int(5), "x").unwrap().to_string(), "5*x");
    }

    #[test]
    fn integrates_linear_substitutions() {
        assert_eq!(
            integrate(&Expr::call(Func::Cos, Expr::int(3) * x()), "x").unwrap().to_string(),
            "sin(3*x)/3"
        );
        assert_eq!(integrate(&exp(x()), "x").unwrap().to_string(), "exp(x)");
    }

    #[test]
    fn integrates_by_parts() {
        assert_eq!(
            integrate(&(x() * exp(x())), "x").unwrap().to_string(),
            "x*exp(x) - exp(x)"
        );
        assert_eq!(
            integrate(&Expr::call(Func::Ln, x()), "x").unwrap().to_string(),
            "x*log(x) - x"
        );
    }

    #[test]
    fn integrates_a_factor_times_its_derivative() {
        let cos = Expr::call(Func::Cos, x());
        for e in [sin(x()) * cos, Expr::call(Func::Ln, x()) / x()] {
            let e = canonical(&e);
            let f = integrate(&e, "x").unwrap();
            assert_eq!(diff(&f, "x"), e, "{f}");
        }
    }

    #[test]
    fn integrates_arctangent_form() {
        let e = Expr::powi(Expr::powi(x(), 2) + Expr::one(), -1);
        assert_eq!(integrate(&e, "x").unwrap().to_string(), "atan(x)");
    }

    #[test]
    fn reports_missing_antiderivative() {
        let e = exp(Expr::powi(x(), 2));
        assert!(matches!(
            integrate(&e, "x"),
            Err(CalculusErr::NoAntiderivative(_))
        ));
    }

    #[test]
    fn definite_integrals() {
        let e = Expr::powi(x(), 2);
        assert_eq!(integrate_between(&e, "x", 0.0, 1.0).unwrap().to_string(), "1/3");
        // no elementary antiderivative, falls back to quadrature
        let v = integrate_between(&exp(-Expr::powi(x(), 2)), "x", 0.0, 1.0).unwrap();
        assert_relative_eq!(v.approx_const().unwrap(), 0.746824132812427, epsilon = 1e-9);
    }

    #[test_log::test]
    fn limits_by_lhopital() {
        let e = sin(x()) / x();
        assert_eq!(limit(&e, "x", 0.0, Direction::Both).unwrap().to_string(), "1");
        let e = (Expr::powi(x(), 2) - Expr::one()) / (x() - Expr::one());
        assert_eq!(limit(&e, "x", 1.0, Direction::Right).unwrap().to_string(), "2");
    }

    #[test]
    fn limits_at_infinity() {
        let e = Expr::powi(x(), -1);
        assert_eq!(limit(&e, "x", Number::INFINITY, Direction::Right).unwrap().to_string(), "0");
        let e = (Expr::int(2) * x() + Expr::one()) / (x() + Expr::int(3));
        assert_eq!(limit(&e, "x", Number::INFINITY, Direction::Right).unwrap().to_string(), "2");
    }

    #[test]
    fn one_sided_limits_differ() {
        let e = Expr::powi(x(), -1);
        assert_eq!(limit(&e, "x", 0.0, Direction::Right).unwrap().to_string(), "oo");
        assert_eq!(limit(&e, "x", 0.0, Direction::Left).unwrap().to_string(), "-oo");
        assert!(limit(&e, "x", 0.0, Direction::Both).is_err());
    }

    #[test]
    fn limits_that_overflow_diverge() {
        assert_eq!(limit(&exp(x()), "x", Number::INFINITY, Direction::Right).unwrap().to_string(), "oo");
        let e = -exp(x());
        assert_eq!(limit(&e, "x", Number::INFINITY, Direction::Right).unwrap().to_string(), "-oo");
    }

    #[test_log::test]
    fn zero_times_infinity() {
        let e = x() * Expr::call(Func::Ln, x());
        assert_eq!(limit(&e, "x", 0.0, Direction::Right).unwrap().to_string(), "0");
    }

    #[test_log::test]
    fn one_to_the_infinity() {
        let e = Expr::pow(Expr::one() + Expr::powi(x(), -1), x());
        assert_eq!(limit(&e, "x", Number::INFINITY, Direction::Right).unwrap().to_string(), "E");
    }

    #[test]
    fn snap_rounds_to_small_fractions_and_zero() {
        assert_eq!(snap(-2.07e-8), Expr::zero());
        assert_eq!(snap(0.5000000000001), Expr::rat(1, 2));
        assert_eq!(snap(0.1234567), Expr::float(0.1234567));
    }

    #[test]
    fn directions_parse() {
        assert_eq!("+".parse(), Ok(Direction::Right));
        assert_eq!(" left".parse(), Ok(Direction::Left));
        assert_eq!("+-".parse(), Ok(Direction::Both));
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn oscillating_limit_fails() {
        let e = sin(Expr::powi(x(), -1));
        assert!(matches!(
            limit(&e, "x", 0.0, Direction::Right),
            Err(CalculusErr::NoLimit { .. })
        ));
    }

    #[test]
    fn taylor_series_at_zero() {
        assert_eq!(
            series(&exp(x()), "x", 0.0, 4).unwrap().to_string(),
            "x**3/6 + x**2/2 + x + 1"
        );
        assert_eq!(series(&sin(x()), "x", 0.0, 5).unwrap().to_string(), "-x**3/6 + x");
    }

    #[test]
    fn taylor_series_away_from_zero() {
        let s = series(&Expr::call(Func::Ln, x()), "x", 1.0, 3).unwrap();
        assert_eq!(s.to_string(), "-(x - 1)**2/2 + x - 1");
    }

    #[test]
    fn taylor_series_of_singular_function_fails() {
        assert!(series(&Expr::call(Func::Ln, x()), "x", 0.0, 3).is_err());
    }
}
