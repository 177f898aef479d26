// SPDX: CC0-1.0

//! Dense single-variable polynomials with exact rational coefficients.
//!
//! Every operation is checked: an `i64` overflow anywhere turns the whole
//! result into `None` and callers fall back to a numeric method.

use crate::{
    expr::{Expr, Num, Rational},
    simplify::{add_terms, mul_factors, power},
    Number,
};
use num::traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, One, Zero};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poly {
    // ascending powers, no trailing zeros
    coeffs: Vec<Rational>,
}

fn monomial(term: &Expr, var: &str) -> Option<(usize, Rational)> {
    match term {
        Expr::Num(Num::Rat(r)) => Some((0, *r)),
        Expr::Sym(name) if name == var => Some((1, Rational::one())),
        Expr::Pow(b, x) => match (&**b, x.as_num().and_then(Num::as_integer)) {
            (Expr::Sym(name), Some(k)) if name == var && (1..=256).contains(&k) => {
                Some((k as usize, Rational::one()))
            }
            _ => None,
        },
        Expr::Mul(xs) => {
            let mut degree = 0;
            let mut coeff = Rational::one();
            for x in xs {
                let (k, c) = monomial(x, var)?;
                degree += k;
                coeff = coeff.checked_mul(&c)?;
            }
            Some((degree, coeff))
        }
        _ => None,
    }
}

impl Poly {
    pub fn new(mut coeffs: Vec<Rational>) -> Self {
        while coeffs.last().is_some_and(Zero::is_zero) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    /// Read an expanded canonical expression. Symbolic or float
    /// coefficients are rejected.
    pub fn from_expr(e: &Expr, var: &str) -> Option<Self> {
        let terms = match e {
            Expr::Add(xs) => xs.as_slice(),
            other => core::slice::from_ref(other),
        };
        let mut coeffs: Vec<Rational> = Vec::new();
        for term in terms {
            let (k, c) = monomial(term, var)?;
            if coeffs.len() <= k {
                coeffs.resize(k + 1, Rational::zero());
            }
            coeffs[k] = coeffs[k].checked_add(&c)?;
        }
        Some(Self::new(coeffs))
    }

    pub fn coeffs(&self) -> &[Rational] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// The zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn coeff(&self, k: usize) -> Rational {
        self.coeffs.get(k).copied().unwrap_or_else(Rational::zero)
    }

    pub fn lead(&self) -> Rational {
        self.coeff(self.degree())
    }

    pub fn eval(&self, x: Rational) -> Option<Rational> {
        let mut acc = Rational::zero();
        for c in self.coeffs.iter().rev() {
            acc = acc.checked_mul(&x)?.checked_add(c)?;
        }
        Some(acc)
    }

    pub fn eval_f64(&self, x: Number) -> Number {
        self.coeffs.iter().rev().fold(0.0, |acc, c| {
            acc * x + Num::Rat(*c).to_f64()
        })
    }

    pub fn monic(&self) -> Option<Self> {
        let lead = self.lead();
        if lead.is_zero() {
            return Some(self.clone());
        }
        let coeffs = self
            .coeffs
            .iter()
            .map(|c| c.checked_div(&lead))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(coeffs))
    }

    /// Quotient and remainder; `None` on overflow or division by zero.
    pub fn div_rem(&self, divisor: &Poly) -> Option<(Poly, Poly)> {
        if divisor.is_zero() {
            return None;
        }
        let mut rem = self.coeffs.clone();
        let dd = divisor.degree();
        let lead = divisor.lead();
        if rem.len() <= dd {
            return Some((Poly::new(Vec::new()), self.clone()));
        }
        let mut quot = vec![Rational::zero(); rem.len() - dd];
        for k in (0..quot.len()).rev() {
            let factor = rem[k + dd].checked_div(&lead)?;
            quot[k] = factor;
            for (i, c) in divisor.coeffs.iter().enumerate() {
                rem[k + i] = rem[k + i].checked_sub(&factor.checked_mul(c)?)?;
            }
        }
        rem.truncate(dd);
        Some((Poly::new(quot), Poly::new(rem)))
    }

    /// Monic greatest common divisor.
    pub fn gcd(&self, other: &Poly) -> Option<Poly> {
        let (mut a, mut b) = (self.clone(), other.clone());
        while !b.is_zero() {
            let (_, r) = a.div_rem(&b)?;
            a = b;
            b = r;
        }
        a.monic()
    }

    pub fn derivative(&self) -> Option<Poly> {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, c)| c.checked_mul(&Rational::from_integer(k as i64)))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(coeffs))
    }

    /// Divide out `(x - root)`, which must be a root.
    pub fn deflate(&self, root: Rational) -> Option<Poly> {
        let linear = Poly::new(vec![-root, Rational::one()]);
        let (q, r) = self.div_rem(&linear)?;
        r.is_zero().then_some(q)
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        add_terms(
            self.coeffs
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_zero())
                .map(|(k, c)| {
                    mul_factors(vec![
                        Expr::Num(Num::Rat(*c)),
                        power(Expr::sym(var), Expr::int(k as i64)),
                    ])
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplify::{canonical, expand};
    use pretty_assertions::assert_eq;

    fn r(n: i64) -> Rational {
        Rational::from_integer(n)
    }

    fn poly(src: &Expr) -> Poly {
        Poly::from_expr(&expand(&canonical(src)), "x").unwrap()
    }

    fn x() -> Expr {
        Expr::sym("x")
    }

    #[test]
    fn reads_expanded_polynomials() {
        let p = poly(&(Expr::powi(x() - Expr::int(2), 2) + Expr::rat(1, 2) * x()));
        assert_eq!(p.coeffs(), &[r(4), Rational::new(-7, 2), r(1)]);
        assert_eq!(p.degree(), 2);
    }

    #[test]
    fn rejects_non_polynomials() {
        let e = canonical(&(Expr::powi(x(), -1) + x()));
        assert_eq!(Poly::from_expr(&e, "x"), None);
        let e = canonical(&(Expr::sym("y") * x()));
        assert_eq!(Poly::from_expr(&e, "x"), None);
    }

    #[test]
    fn divides_and_finds_gcd() {
        let a = poly(&(Expr::powi(x(), 2) - Expr::one()));
        let b = poly(&(Expr::powi(x(), 2) + Expr::int(2) * x() + Expr::one()));
        let g = a.gcd(&b).unwrap();
        assert_eq!(g.coeffs(), &[r(1), r(1)]);
        let (q, rem) = a.div_rem(&g).unwrap();
        assert_eq!(q.coeffs(), &[r(-1), r(1)]);
        assert!(rem.is_zero());
    }

    #[test]
    fn deflates_known_roots() {
        let p = poly(&(Expr::powi(x(), 3) - Expr::int(6) * Expr::powi(x(), 2) + Expr::int(11) * x() - Expr::int(6)));
        assert_eq!(p.eval(r(1)), Some(r(0)));
        let q = p.deflate(r(1)).unwrap();
        assert_eq!(q.coeffs(), &[r(6), r(-5), r(1)]);
        assert_eq!(p.deflate(r(5)), None);
    }

    #[test]
    fn converts_back_to_expressions() {
        let p = Poly::new(vec![r(1), r(0), r(-3)]);
        assert_eq!(p.to_expr("x").to_string(), "-3*x**2 + 1");
        assert_eq!(p.derivative().unwrap().coeffs(), &[r(0), r(-6)]);
    }
}
