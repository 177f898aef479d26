// SPDX: CC0-1.0

//! Symbolic expression trees.
//!
//! Trees are built raw by the evaluator and by the calculus rules, then
//! brought into canonical form by [`crate::simplify::canonical`]. Printing
//! assumes canonical form for the nicest output but accepts any tree.

use crate::Number;
use core::{cmp::Ordering, fmt, ops};
use num::{
    rational::Ratio,
    traits::{CheckedAdd, CheckedMul, One, Signed, Zero},
};
use std::collections::BTreeSet;
use thiserror::Error;

pub type Rational = Ratio<i64>;

/// Exact rational when possible, float otherwise. Arithmetic that overflows
/// `i64` degrades to float rather than failing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Num {
    Rat(Rational),
    Float(Number),
}

impl Num {
    pub fn int(n: i64) -> Self {
        Self::Rat(Rational::from_integer(n))
    }

    pub fn ratio(numer: i64, denom: i64) -> Self {
        Self::Rat(Rational::new(numer, denom))
    }

    pub fn from_f64(x: Number) -> Self {
        if x.is_finite() && x.fract() == 0.0 && x.abs() < 9.0e15 {
            Self::int(x as i64)
        } else {
            Self::Float(x)
        }
    }

    pub fn to_f64(self) -> Number {
        match self {
            Self::Rat(r) => *r.numer() as Number / *r.denom() as Number,
            Self::Float(x) => x,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Self::Rat(r) => r.is_zero(),
            Self::Float(x) => x == 0.0,
        }
    }

    pub fn is_one(self) -> bool {
        match self {
            Self::Rat(r) => r.is_one(),
            Self::Float(x) => x == 1.0,
        }
    }

    pub fn is_negative(self) -> bool {
        match self {
            Self::Rat(r) => r.is_negative(),
            Self::Float(x) => x < 0.0,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            Self::Rat(_) => true,
            Self::Float(x) => x.is_finite(),
        }
    }

    pub fn as_integer(self) -> Option<i64> {
        match self {
            Self::Rat(r) if r.is_integer() => Some(*r.numer()),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        self.as_integer().is_some()
    }

    /// Division by zero yields an infinite float.
    pub fn recip(self) -> Self {
        match self {
            Self::Rat(r) if r.is_zero() => Self::Float(Number::INFINITY),
            Self::Rat(r) => Self::Rat(r.recip()),
            Self::Float(x) => Self::Float(x.recip()),
        }
    }

    pub fn abs(self) -> Self {
        match self {
            Self::Rat(r) => Self::Rat(r.abs()),
            Self::Float(x) => Self::Float(x.abs()),
        }
    }

    /// Exact power when the result is representable, `None` when an exact
    /// result would need an irrational (the caller keeps the power symbolic).
    pub fn pow(self, exp: Num) -> Option<Num> {
        match (self, exp) {
            (Self::Rat(base), Self::Rat(e)) if e.is_integer() => {
                let n = *e.numer();
                if base.is_zero() && n < 0 {
                    return Some(Self::Float(Number::INFINITY));
                }
                if n.unsigned_abs() > 512 {
                    return Some(Self::Float(self.to_f64().powf(exp.to_f64())));
                }
                let mut acc = Rational::one();
                for _ in 0..n.unsigned_abs() {
                    acc = match acc.checked_mul(&base) {
                        Some(acc) => acc,
                        None => return Some(Self::Float(self.to_f64().powf(exp.to_f64()))),
                    };
                }
                Some(if n < 0 {
                    Self::Rat(acc.recip())
                } else {
                    Self::Rat(acc)
                })
            }
            (Self::Rat(base), Self::Rat(e)) => {
                if base.is_negative() {
                    return None;
                }
                let root = exact_root(base, *e.denom())?;
                Self::Rat(root).pow(Self::int(*e.numer()))
            }
            _ => Some(Self::Float(self.to_f64().powf(exp.to_f64()))),
        }
    }
}

fn exact_root(r: Rational, degree: i64) -> Option<Rational> {
    fn int_root(n: i64, degree: i64) -> Option<i64> {
        if n < 0 || degree <= 0 || degree > 64 {
            return None;
        }
        let guess = (n as Number).powf(1.0 / degree as Number).round() as i64;
        (guess.saturating_sub(1)..=guess.saturating_add(1))
            .filter(|c| *c >= 0)
            .find(|c| c.checked_pow(degree as u32) == Some(n))
    }
    Some(Rational::new(
        int_root(*r.numer(), degree)?,
        int_root(*r.denom(), degree)?,
    ))
}

impl ops::Add for Num {
    type Output = Num;
    fn add(self, rhs: Num) -> Num {
        match (self, rhs) {
            (Self::Rat(a), Self::Rat(b)) => a
                .checked_add(&b)
                .map(Self::Rat)
                .unwrap_or_else(|| Self::Float(self.to_f64() + rhs.to_f64())),
            _ => Self::Float(self.to_f64() + rhs.to_f64()),
        }
    }
}

impl ops::Mul for Num {
    type Output = Num;
    fn mul(self, rhs: Num) -> Num {
        match (self, rhs) {
            (Self::Rat(a), Self::Rat(b)) => a
                .checked_mul(&b)
                .map(Self::Rat)
                .unwrap_or_else(|| Self::Float(self.to_f64() * rhs.to_f64())),
            _ => Self::Float(self.to_f64() * rhs.to_f64()),
        }
    }
}

impl ops::Neg for Num {
    type Output = Num;
    fn neg(self) -> Num {
        match self {
            Self::Rat(r) => Self::Rat(-r),
            Self::Float(x) => Self::Float(-x),
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rat(r) if r.is_integer() => write!(f, "{}", r.numer()),
            Self::Rat(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Self::Float(x) if x.is_nan() => write!(f, "nan"),
            Self::Float(x) if x.is_infinite() => {
                write!(f, "{}oo", if *x < 0.0 { "-" } else { "" })
            }
            Self::Float(x) if x.fract() == 0.0 && x.abs() < 1.0e16 => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub const fn value(&self) -> Number {
        match self {
            Self::Pi => core::f64::consts::PI,
            Self::E => core::f64::consts::E,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pi => "pi",
            Self::E => "E",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Ln,
    Abs,
}

impl Func {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Exp => "exp",
            Self::Ln => "log",
            Self::Abs => "abs",
        }
    }

    pub fn apply(&self, x: Number) -> Number {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Abs => x.abs(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num(Num),
    Const(Constant),
    Sym(String),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn int(n: i64) -> Self {
        Self::Num(Num::int(n))
    }

    pub fn rat(numer: i64, denom: i64) -> Self {
        Self::Num(Num::ratio(numer, denom))
    }

    pub fn float(x: Number) -> Self {
        Self::Num(Num::Float(x))
    }

    /// Integral values become exact.
    pub fn from_number(x: Number) -> Self {
        Self::Num(Num::from_f64(x))
    }

    pub fn zero() -> Self {
        Self::int(0)
    }

    pub fn one() -> Self {
        Self::int(1)
    }

    pub fn sym(name: impl Into<String>) -> Self {
        Self::Sym(name.into())
    }

    pub fn pow(base: Expr, exp: Expr) -> Self {
        Self::Pow(Box::new(base), Box::new(exp))
    }

    pub fn powi(base: Expr, exp: i64) -> Self {
        Self::pow(base, Self::int(exp))
    }

    pub fn call(fun: Func, arg: Expr) -> Self {
        Self::Call(fun, Box::new(arg))
    }

    pub fn sqrt(arg: Expr) -> Self {
        Self::pow(arg, Self::rat(1, 2))
    }

    pub fn as_num(&self) -> Option<Num> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_num().is_some_and(Num::is_zero)
    }

    pub fn is_one(&self) -> bool {
        self.as_num().is_some_and(Num::is_one)
    }

    pub fn depends_on(&self, var: &str) -> bool {
        match self {
            Self::Num(_) | Self::Const(_) => false,
            Self::Sym(name) => name == var,
            Self::Add(xs) | Self::Mul(xs) => xs.iter().any(|x| x.depends_on(var)),
            Self::Pow(b, e) => b.depends_on(var) || e.depends_on(var),
            Self::Call(_, a) => a.depends_on(var),
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        fn walk(e: &Expr, acc: &mut BTreeSet<String>) {
            match e {
                Expr::Num(_) | Expr::Const(_) => {}
                Expr::Sym(name) => {
                    acc.insert(name.clone());
                }
                Expr::Add(xs) | Expr::Mul(xs) => xs.iter().for_each(|x| walk(x, acc)),
                Expr::Pow(b, e) => {
                    walk(b, acc);
                    walk(e, acc);
                }
                Expr::Call(_, a) => walk(a, acc),
            }
        }
        let mut acc = BTreeSet::new();
        walk(self, &mut acc);
        acc
    }

    /// Replace every occurrence of `var`. The result is raw.
    pub fn subs(&self, var: &str, value: &Expr) -> Expr {
        match self {
            Self::Sym(name) if name == var => value.clone(),
            Self::Num(_) | Self::Const(_) | Self::Sym(_) => self.clone(),
            Self::Add(xs) => Self::Add(xs.iter().map(|x| x.subs(var, value)).collect()),
            Self::Mul(xs) => Self::Mul(xs.iter().map(|x| x.subs(var, value)).collect()),
            Self::Pow(b, e) => Self::pow(b.subs(var, value), e.subs(var, value)),
            Self::Call(fun, a) => Self::call(*fun, a.subs(var, value)),
        }
    }

    /// Floating point value with symbols resolved by `env`; `None` if a
    /// symbol is unbound. Undefined operations give NaN or infinities.
    pub fn approx(&self, env: &dyn Fn(&str) -> Option<Number>) -> Option<Number> {
        Some(match self {
            Self::Num(n) => n.to_f64(),
            Self::Const(c) => c.value(),
            Self::Sym(name) => env(name)?,
            Self::Add(xs) => {
                let mut acc = 0.0;
                for x in xs {
                    acc += x.approx(env)?;
                }
                acc
            }
            Self::Mul(xs) => {
                let mut acc = 1.0;
                for x in xs {
                    acc *= x.approx(env)?;
                }
                acc
            }
            Self::Pow(b, e) => pow_f64(b.approx(env)?, e),
            Self::Call(fun, a) => fun.apply(a.approx(env)?),
        })
    }

    /// Value of an expression without free symbols.
    pub fn approx_const(&self) -> Option<Number> {
        self.approx(&|_| None)
    }

    pub fn eval_at(&self, var: &str, x: Number) -> Option<Number> {
        self.approx(&|name| (name == var).then_some(x))
    }

    /// Node count, used to pick the simplest of several equivalent forms.
    pub fn size(&self) -> usize {
        match self {
            Self::Num(_) | Self::Const(_) | Self::Sym(_) => 1,
            Self::Add(xs) | Self::Mul(xs) => 1 + xs.iter().map(Expr::size).sum::<usize>(),
            Self::Pow(b, e) => 1 + b.size() + e.size(),
            Self::Call(_, a) => 1 + a.size(),
        }
    }

    /// Total polynomial degree, used to order the terms of a sum.
    pub fn degree(&self) -> Number {
        match self {
            Self::Num(_) | Self::Const(_) | Self::Call(..) => 0.0,
            Self::Sym(_) => 1.0,
            Self::Pow(b, e) => match e.as_num() {
                Some(n) => b.degree() * n.to_f64(),
                None => b.degree(),
            },
            Self::Mul(xs) => xs.iter().map(Expr::degree).sum(),
            Self::Add(xs) => xs.iter().map(Expr::degree).fold(0.0, Number::max),
        }
    }

    /// Split a leading numeric coefficient off a term.
    pub fn coeff(&self) -> (Num, Expr) {
        match self {
            Self::Num(n) => (*n, Expr::one()),
            Self::Mul(xs) => match xs.split_first() {
                Some((Self::Num(n), rest)) => (
                    *n,
                    match rest {
                        [single] => single.clone(),
                        _ => Self::Mul(rest.to_vec()),
                    },
                ),
                _ => (Num::int(1), self.clone()),
            },
            _ => (Num::int(1), self.clone()),
        }
    }

    fn is_negative_term(&self) -> bool {
        match self {
            Self::Num(n) => n.is_negative(),
            Self::Mul(xs) => matches!(xs.first(), Some(Self::Num(n)) if n.is_negative()),
            _ => false,
        }
    }

    /// The term with its leading sign flipped, for printing sums.
    fn negated_term(&self) -> Expr {
        match self {
            Self::Num(n) => Self::Num(-*n),
            Self::Mul(xs) => match xs.split_first() {
                Some((Self::Num(n), rest)) if (-*n).is_one() => match rest {
                    [single] => single.clone(),
                    _ => Self::Mul(rest.to_vec()),
                },
                Some((Self::Num(n), rest)) => {
                    let mut xs = Vec::with_capacity(xs.len());
                    xs.push(Self::Num(-*n));
                    xs.extend_from_slice(rest);
                    Self::Mul(xs)
                }
                _ => self.clone(),
            },
            _ => self.clone(),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Num(Num::Rat(r)) if r.is_negative() || !r.is_integer() => PREC_MUL,
            Self::Num(Num::Float(x)) if *x < 0.0 => PREC_MUL,
            Self::Num(_) | Self::Const(_) | Self::Sym(_) | Self::Call(..) => PREC_ATOM,
            Self::Add(_) => PREC_ADD,
            Self::Mul(_) => PREC_MUL,
            Self::Pow(_, e) => match e.as_num() {
                Some(n) if n.is_negative() => PREC_MUL,
                Some(n) if n == Num::ratio(1, 2) => PREC_ATOM,
                _ => PREC_POW,
            },
        }
    }
}

pub(crate) fn pow_f64(base: Number, exp: &Expr) -> Number {
    match exp.as_num() {
        Some(Num::Rat(r)) if r.is_integer() && r.numer().unsigned_abs() <= i32::MAX as u64 => {
            base.powi(*r.numer() as i32)
        }
        // real odd roots of negative numbers
        Some(Num::Rat(r)) if base < 0.0 && r.denom() % 2 == 1 => {
            let root = -(-base).powf(1.0 / *r.denom() as Number);
            root.powi(*r.numer() as i32)
        }
        Some(n) => base.powf(n.to_f64()),
        None => base.powf(exp.approx_const().unwrap_or(Number::NAN)),
    }
}

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_POW: u8 = 3;
const PREC_ATOM: u8 = 4;

struct Wrapped<'a>(&'a Expr, u8);

impl fmt::Display for Wrapped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.precedence() < self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

fn fmt_product(factors: &[Expr], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut coeff = Num::int(1);
    let mut numer: Vec<Expr> = Vec::new();
    let mut denom: Vec<Expr> = Vec::new();
    for x in factors {
        match x {
            Expr::Num(n) => coeff = coeff * *n,
            Expr::Pow(b, e) if e.as_num().is_some_and(Num::is_negative) => {
                let e = -e.as_num().unwrap_or(Num::int(-1));
                denom.push(if e.is_one() {
                    (**b).clone()
                } else {
                    Expr::pow((**b).clone(), Expr::Num(e))
                });
            }
            other => numer.push(other.clone()),
        }
    }

    if coeff.is_negative() {
        f.write_str("-")?;
        coeff = -coeff;
    }
    match coeff {
        Num::Rat(r) => {
            if !r.numer().is_one() || numer.is_empty() {
                numer.insert(0, Expr::int(*r.numer()));
            }
            if !r.denom().is_one() {
                denom.insert(0, Expr::int(*r.denom()));
            }
        }
        Num::Float(x) => {
            if x != 1.0 || numer.is_empty() {
                numer.insert(0, Expr::float(x));
            }
        }
    }
    if numer.is_empty() {
        numer.push(Expr::one());
    }

    for (i, x) in numer.iter().enumerate() {
        if i > 0 {
            f.write_str("*")?;
        }
        write!(f, "{}", Wrapped(x, PREC_MUL))?;
    }
    match denom.as_slice() {
        [] => Ok(()),
        [single] => write!(f, "/{}", Wrapped(single, PREC_POW)),
        many => {
            f.write_str("/(")?;
            for (i, x) in many.iter().enumerate() {
                if i > 0 {
                    f.write_str("*")?;
                }
                write!(f, "{}", Wrapped(x, PREC_MUL))?;
            }
            f.write_str(")")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Const(c) => f.write_str(c.name()),
            Self::Sym(name) => f.write_str(name),
            Self::Add(xs) => {
                for (i, x) in xs.iter().enumerate() {
                    let negative = x.is_negative_term();
                    let shown = if negative { x.negated_term() } else { x.clone() };
                    match (i, negative) {
                        (0, true) => write!(f, "-{}", Wrapped(&shown, PREC_MUL))?,
                        (0, false) => write!(f, "{shown}")?,
                        (_, true) => write!(f, " - {}", Wrapped(&shown, PREC_MUL))?,
                        (_, false) => write!(f, " + {shown}")?,
                    }
                }
                Ok(())
            }
            Self::Mul(xs) => fmt_product(xs, f),
            Self::Pow(b, e) => match e.as_num() {
                Some(n) if n.is_negative() => fmt_product(core::slice::from_ref(self), f),
                Some(n) if n == Num::ratio(1, 2) => write!(f, "sqrt({b})"),
                _ => write!(
                    f,
                    "{}**{}",
                    Wrapped(b, PREC_POW + 1),
                    Wrapped(e, PREC_ATOM)
                ),
            },
            Self::Call(fun, a) => write!(f, "{}({a})", fun.name()),
        }
    }
}

/// Ordering used for the factors of a product.
pub(crate) fn factor_order(a: &Expr, b: &Expr) -> Ordering {
    fn rank(e: &Expr) -> u8 {
        match e {
            Expr::Num(_) => 0,
            Expr::Const(_) => 1,
            Expr::Sym(_) => 2,
            Expr::Pow(b, _) => rank(b).max(2),
            Expr::Call(..) => 4,
            Expr::Add(_) => 5,
            Expr::Mul(_) => 6,
        }
    }
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.to_string().cmp(&b.to_string()))
}

/// Ordering used for the terms of a sum: higher degree first, plain numbers
/// last, then larger terms first.
pub(crate) fn term_order(a: &Expr, b: &Expr) -> Ordering {
    b.degree()
        .partial_cmp(&a.degree())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.as_num().is_some().cmp(&b.as_num().is_some()))
        .then_with(|| b.coeff().1.size().cmp(&a.coeff().1.size()))
        .then_with(|| a.coeff().1.to_string().cmp(&b.coeff().1.to_string()))
        .then_with(|| a.to_string().cmp(&b.to_string()))
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, rhs])
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, -rhs])
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(vec![self, rhs])
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::Mul(vec![self, Expr::powi(rhs, -1)])
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Mul(vec![Expr::int(-1), self])
    }
}

/// Either side of a parsed input: a bare expression or an equation.
#[derive(Clone, Debug, PartialEq)]
pub enum Relation {
    Expr(Expr),
    Equation(Expr, Expr),
}

impl Relation {
    /// Equations become `lhs - rhs`, to be read as `= 0`.
    pub fn into_expr(self) -> Expr {
        match self {
            Self::Expr(e) => e,
            Self::Equation(lhs, rhs) => lhs - rhs,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(e) => write!(f, "{e}"),
            Self::Equation(lhs, rhs) => write!(f, "{lhs} = {rhs}"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{expr} is undefined at {var} = {at}")]
pub struct DomainErr {
    pub expr: String,
    pub var: String,
    pub at: Number,
}

/// An expression compiled for numeric evaluation in a single variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    expr: Expr,
    var: String,
}

impl Lambda {
    /// Fails with the first symbol other than `var`.
    pub fn new(expr: Expr, var: impl Into<String>) -> Result<Self, String> {
        let var = var.into();
        match expr.free_symbols().into_iter().find(|s| *s != var) {
            Some(unbound) => Err(unbound),
            None => Ok(Self { expr, var }),
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn call(&self, x: Number) -> Result<Number, DomainErr> {
        match self.expr.eval_at(&self.var, x) {
            Some(y) if y.is_finite() => Ok(y),
            _ => Err(DomainErr {
                expr: self.expr.to_string(),
                var: self.var.clone(),
                at: x,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn x() -> Expr {
        Expr::sym("x")
    }

    #[test]
    fn num_arithmetic_stays_exact() {
        assert_eq!(Num::ratio(1, 3) + Num::ratio(1, 6), Num::ratio(1, 2));
        assert_eq!(Num::int(4).pow(Num::ratio(1, 2)), Some(Num::int(2)));
        assert_eq!(Num::int(2).pow(Num::ratio(1, 2)), None);
        assert_eq!(Num::int(2).pow(Num::int(-2)), Some(Num::ratio(1, 4)));
    }

    #[test]
    fn num_overflow_degrades_to_float() {
        let big = Num::int(i64::MAX);
        assert!(matches!(big + big, Num::Float(_)));
    }

    #[test]
    fn prints_products_as_fractions() {
        let e = Expr::Mul(vec![Expr::rat(1, 6), Expr::powi(x(), 3)]);
        assert_eq!(e.to_string(), "x**3/6");
        let e = Expr::Mul(vec![Expr::int(-1), Expr::powi(x(), -1)]);
        assert_eq!(e.to_string(), "-1/x");
        let e = Expr::Mul(vec![
            Expr::int(2),
            Expr::powi(Expr::Add(vec![x(), Expr::one()]), -1),
        ]);
        assert_eq!(e.to_string(), "2/(x + 1)");
    }

    #[test]
    fn prints_sums_with_signs() {
        let e = Expr::Add(vec![
            Expr::Mul(vec![Expr::int(-1), Expr::powi(x(), 2)]),
            Expr::Mul(vec![Expr::int(-3), x()]),
            Expr::int(1),
        ]);
        assert_eq!(e.to_string(), "-x**2 - 3*x + 1");
    }

    #[test]
    fn prints_sqrt_and_nested_powers() {
        assert_eq!(Expr::sqrt(Expr::int(2)).to_string(), "sqrt(2)");
        let e = Expr::pow(Expr::Add(vec![x(), Expr::one()]), Expr::rat(1, 3));
        assert_eq!(e.to_string(), "(x + 1)**(1/3)");
    }

    #[test]
    fn approximates_with_bound_symbol() {
        let e = Expr::call(Func::Sin, x()) + Expr::Const(Constant::Pi);
        assert_relative_eq!(
            e.eval_at("x", 0.5).unwrap_or(Number::NAN),
            0.5f64.sin() + core::f64::consts::PI
        );
        assert_eq!(e.approx_const(), None);
    }

    #[test]
    fn cube_root_of_negative_is_real() {
        let e = Expr::pow(x(), Expr::rat(1, 3));
        assert_relative_eq!(e.eval_at("x", -8.0).unwrap_or(Number::NAN), -2.0);
    }

    #[test]
    fn lambda_rejects_other_symbols() {
        assert_eq!(Lambda::new(x() + Expr::sym("y"), "x"), Err(String::from("y")));
        let f = Lambda::new(Expr::call(Func::Ln, x()), "x").unwrap();
        assert!(f.call(-1.0).is_err());
        assert_relative_eq!(f.call(1.0).unwrap(), 0.0);
    }
}
