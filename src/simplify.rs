// SPDX: CC0-1.0

//! Canonical forms and simplification.
//!
//! [`canonical`] is the cheap normalisation every parsed expression goes
//! through: nested sums and products are flattened, numbers folded, like
//! terms collected and equal bases merged. [`simplify`] tries a few heavier
//! rewrites on top and keeps whichever form is smallest.

use crate::{
    expr::{factor_order, term_order, Constant, Expr, Func, Num},
    poly::Poly,
};

pub fn canonical(e: &Expr) -> Expr {
    match e {
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => e.clone(),
        Expr::Add(xs) => add_terms(xs.iter().map(canonical).collect()),
        Expr::Mul(xs) => mul_factors(xs.iter().map(canonical).collect()),
        Expr::Pow(b, x) => power(canonical(b), canonical(x)),
        Expr::Call(fun, a) => call(*fun, canonical(a)),
    }
}

/// Sum of canonical terms.
pub fn add_terms(terms: Vec<Expr>) -> Expr {
    let mut constant = Num::int(0);
    let mut like: Vec<(Expr, Num)> = Vec::new();

    let mut stack = terms;
    while let Some(term) = stack.pop() {
        match term {
            Expr::Add(inner) => stack.extend(inner),
            Expr::Num(n) => constant = constant + n,
            other => {
                let (c, rest) = other.coeff();
                match like.iter_mut().find(|(r, _)| *r == rest) {
                    Some((_, acc)) => *acc = *acc + c,
                    None => like.push((rest, c)),
                }
            }
        }
    }

    let mut out: Vec<Expr> = like
        .into_iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(rest, c)| with_coeff(c, rest))
        .collect();
    if !constant.is_zero() {
        out.push(Expr::Num(constant));
    }
    match out.len() {
        0 => Expr::zero(),
        1 => out.swap_remove(0),
        _ => {
            out.sort_by(term_order);
            Expr::Add(out)
        }
    }
}

fn with_coeff(c: Num, rest: Expr) -> Expr {
    if c.is_one() {
        return rest;
    }
    match rest {
        Expr::Mul(mut xs) => {
            xs.insert(0, Expr::Num(c));
            Expr::Mul(xs)
        }
        other => Expr::Mul(vec![Expr::Num(c), other]),
    }
}

/// Product of canonical factors.
pub fn mul_factors(factors: Vec<Expr>) -> Expr {
    let mut coeff = Num::int(1);
    let mut bases: Vec<(Expr, Vec<Expr>)> = Vec::new();
    let mut exp_args: Vec<Expr> = Vec::new();

    let mut stack = factors;
    while let Some(factor) = stack.pop() {
        match factor {
            Expr::Mul(inner) => stack.extend(inner),
            Expr::Num(n) => coeff = coeff * n,
            Expr::Call(Func::Exp, arg) => exp_args.push(*arg),
            Expr::Pow(b, x) => push_base(&mut bases, *b, *x),
            other => push_base(&mut bases, other, Expr::one()),
        }
    }

    let mut out: Vec<Expr> = Vec::new();
    let mut again = false;
    let mut absorb = |e: Expr, coeff: &mut Num, out: &mut Vec<Expr>| match e {
        Expr::Num(n) => *coeff = *coeff * n,
        Expr::Mul(inner) => {
            again = true;
            out.extend(inner);
        }
        other => out.push(other),
    };
    for (base, exps) in bases {
        let exp = add_terms(exps);
        absorb(power(base, exp), &mut coeff, &mut out);
    }
    if !exp_args.is_empty() {
        absorb(call(Func::Exp, add_terms(exp_args)), &mut coeff, &mut out);
    }

    if again {
        out.push(Expr::Num(coeff));
        return mul_factors(out);
    }
    if coeff.is_zero() {
        return Expr::Num(coeff);
    }
    out.sort_by(factor_order);
    if !coeff.is_one() || out.is_empty() {
        out.insert(0, Expr::Num(coeff));
    }
    match out.len() {
        1 => out.swap_remove(0),
        _ => Expr::Mul(out),
    }
}

fn push_base(bases: &mut Vec<(Expr, Vec<Expr>)>, base: Expr, exp: Expr) {
    match bases.iter_mut().find(|(b, _)| *b == base) {
        Some((_, exps)) => exps.push(exp),
        None => bases.push((base, vec![exp])),
    }
}

/// `base ** exp` for canonical operands.
pub fn power(base: Expr, exp: Expr) -> Expr {
    if exp.is_zero() {
        return Expr::one();
    }
    if exp.is_one() {
        return base;
    }
    if base.is_one() && exp.as_num().map_or(true, Num::is_finite) {
        return Expr::one();
    }
    match (base, exp) {
        // 1 ** oo is indeterminate
        (Expr::Num(b), Expr::Num(x)) if !x.is_finite() && b.abs().is_one() => {
            Expr::float(f64::NAN)
        }
        (Expr::Num(b), Expr::Num(x)) => match b.pow(x) {
            Some(n) => Expr::Num(n),
            None => match (b.as_integer(), x) {
                (Some(n), Num::Rat(r)) if n > 0 && *r.denom() == 2 && r.numer().abs() == 1 => {
                    let (outside, inside) = square_split(n);
                    if outside > 1 {
                        mul_factors(vec![
                            Expr::Num(Num::int(outside).pow(Num::Rat(r * 2)).unwrap_or(Num::int(1))),
                            Expr::pow(Expr::int(inside), Expr::Num(x)),
                        ])
                    } else {
                        Expr::pow(Expr::Num(b), Expr::Num(x))
                    }
                }
                _ => Expr::pow(Expr::Num(b), Expr::Num(x)),
            },
        },
        (Expr::Const(Constant::E), x) => call(Func::Exp, x),
        (Expr::Call(Func::Exp, a), x) => call(Func::Exp, mul_factors(vec![*a, x])),
        (Expr::Pow(b, e), Expr::Num(x)) if x.is_integer() => {
            power(*b, mul_factors(vec![*e, Expr::Num(x)]))
        }
        (Expr::Mul(xs), Expr::Num(x)) if x.is_integer() => mul_factors(
            xs.into_iter()
                .map(|f| power(f, Expr::Num(x)))
                .collect(),
        ),
        (b, x) => Expr::pow(b, x),
    }
}

/// `n = outside² · inside` with `inside` free of square factors.
fn square_split(n: i64) -> (i64, i64) {
    if n > 1_000_000_000_000 {
        return (1, n);
    }
    let (mut outside, mut inside) = (1, n);
    let mut k = 2;
    while k * k <= inside {
        while inside % (k * k) == 0 {
            inside /= k * k;
            outside *= k;
        }
        k += 1;
    }
    (outside, inside)
}

/// `-e` if `e` carries a negative leading coefficient.
fn negative_part(e: &Expr) -> Option<Expr> {
    match e.coeff() {
        (c, rest) if c.is_negative() => Some(mul_factors(vec![Expr::Num(-c), rest])),
        _ => None,
    }
}

/// Function application with the exact identities that keep results tidy.
pub fn call(fun: Func, arg: Expr) -> Expr {
    if let Expr::Num(Num::Float(x)) = arg {
        return Expr::float(fun.apply(x));
    }
    let pi = Expr::Const(Constant::Pi);
    let half_pi = || mul_factors(vec![Expr::rat(1, 2), Expr::Const(Constant::Pi)]);
    match fun {
        Func::Sin | Func::Tan | Func::Asin | Func::Atan if arg.is_zero() => Expr::zero(),
        Func::Sin | Func::Tan if arg == pi => Expr::zero(),
        Func::Cos | Func::Exp if arg.is_zero() => Expr::one(),
        Func::Cos if arg == pi => Expr::int(-1),
        Func::Acos if arg.is_one() => Expr::zero(),
        Func::Acos if arg.is_zero() => half_pi(),
        Func::Asin if arg.is_one() => half_pi(),
        Func::Atan if arg.is_one() => mul_factors(vec![Expr::rat(1, 4), pi]),
        Func::Exp if arg.is_one() => Expr::Const(Constant::E),
        Func::Ln if arg.is_one() => Expr::zero(),
        Func::Ln if arg.is_zero() => Expr::float(f64::NEG_INFINITY),
        Func::Ln if arg == Expr::Const(Constant::E) => Expr::one(),
        Func::Abs => match arg {
            Expr::Num(n) => Expr::Num(n.abs()),
            Expr::Call(Func::Exp, _) | Expr::Call(Func::Abs, _) => arg,
            other => match negative_part(&other) {
                Some(pos) => call(Func::Abs, pos),
                None => Expr::call(Func::Abs, other),
            },
        },
        _ => match (fun, arg) {
            (Func::Exp, Expr::Call(Func::Ln, inner)) => *inner,
            (Func::Ln, Expr::Call(Func::Exp, inner)) => *inner,
            (Func::Sin | Func::Tan | Func::Asin | Func::Atan, arg) => match negative_part(&arg) {
                Some(pos) => mul_factors(vec![Expr::int(-1), call(fun, pos)]),
                None => Expr::call(fun, arg),
            },
            (Func::Cos, arg) => match negative_part(&arg) {
                Some(pos) => call(fun, pos),
                None => Expr::call(fun, arg),
            },
            (fun, arg) => Expr::call(fun, arg),
        },
    }
}

/// Multiply out products of sums and small integer powers of sums.
pub fn expand(e: &Expr) -> Expr {
    match e {
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => e.clone(),
        Expr::Add(xs) => add_terms(xs.iter().map(expand).collect()),
        Expr::Mul(xs) => distribute(xs.iter().map(expand).collect()),
        Expr::Pow(b, x) => {
            let b = expand(b);
            let x = expand(x);
            match (&b, x.as_num().and_then(Num::as_integer)) {
                (Expr::Add(_), Some(n)) if (2..=12).contains(&n) => {
                    distribute(vec![b.clone(); n as usize])
                }
                _ => power(b, x),
            }
        }
        Expr::Call(fun, a) => call(*fun, expand(a)),
    }
}

const MAX_EXPANDED_TERMS: usize = 4096;

fn distribute(factors: Vec<Expr>) -> Expr {
    let mut acc: Vec<Expr> = vec![Expr::one()];
    let mut rest: Vec<Expr> = Vec::new();
    for factor in factors {
        let terms = match factor {
            Expr::Add(terms) if acc.len() * terms.len() <= MAX_EXPANDED_TERMS => terms,
            other => {
                rest.push(other);
                continue;
            }
        };
        acc = acc
            .iter()
            .flat_map(|a| {
                terms
                    .iter()
                    .map(move |t| mul_factors(vec![a.clone(), t.clone()]))
            })
            .collect();
    }
    add_terms(
        acc.into_iter()
            .map(|a| {
                let mut factors = rest.clone();
                factors.push(a);
                mul_factors(factors)
            })
            .collect(),
    )
}

/// Numerator and denominator of a canonical expression.
pub fn numer_denom(e: &Expr) -> (Expr, Expr) {
    let factors: &[Expr] = match e {
        Expr::Mul(xs) => xs,
        other => core::slice::from_ref(other),
    };
    let mut numer = Vec::new();
    let mut denom = Vec::new();
    for f in factors {
        match f {
            Expr::Num(Num::Rat(r)) => {
                numer.push(Expr::int(*r.numer()));
                denom.push(Expr::int(*r.denom()));
            }
            Expr::Pow(b, x) if x.as_num().is_some_and(Num::is_negative) => {
                denom.push(power((**b).clone(), mul_factors(vec![Expr::int(-1), (**x).clone()])));
            }
            other => numer.push(other.clone()),
        }
    }
    (mul_factors(numer), mul_factors(denom))
}

/// Cancel common polynomial factors of a single-variable rational function.
pub fn cancel(e: &Expr) -> Option<Expr> {
    let symbols = e.free_symbols();
    let var = match symbols.iter().collect::<Vec<_>>().as_slice() {
        [var] => (*var).clone(),
        _ => return None,
    };
    let (numer, denom) = numer_denom(e);
    if denom.as_num().is_some() {
        return None;
    }
    let n = Poly::from_expr(&expand(&numer), &var)?;
    let d = Poly::from_expr(&expand(&denom), &var)?;
    let g = n.gcd(&d)?;
    if g.degree() == 0 {
        return None;
    }
    let (nq, _) = n.div_rem(&g)?;
    let (dq, _) = d.div_rem(&g)?;
    Some(mul_factors(vec![
        nq.to_expr(&var),
        power(dq.to_expr(&var), Expr::int(-1)),
    ]))
}

/// Replace `c·sin(u)² + c·cos(u)²` by `c` inside every sum.
fn pythagorean(e: &Expr) -> Expr {
    fn square_of(e: &Expr, fun: Func) -> Option<&Expr> {
        match e {
            Expr::Pow(b, x) if x.as_num() == Some(Num::int(2)) => match &**b {
                Expr::Call(f, arg) if *f == fun => Some(arg),
                _ => None,
            },
            _ => None,
        }
    }

    match e {
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => e.clone(),
        Expr::Mul(xs) => mul_factors(xs.iter().map(pythagorean).collect()),
        Expr::Pow(b, x) => power(pythagorean(b), pythagorean(x)),
        Expr::Call(fun, a) => call(*fun, pythagorean(a)),
        Expr::Add(xs) => {
            let mut terms: Vec<Expr> = xs.iter().map(pythagorean).collect();
            let mut i = 0;
            while i < terms.len() {
                let (c, rest) = terms[i].coeff();
                let partner = square_of(&rest, Func::Sin).and_then(|arg| {
                    let cos = Expr::powi(Expr::call(Func::Cos, arg.clone()), 2);
                    terms
                        .iter()
                        .position(|t| t.coeff() == (c, cos.clone()))
                });
                match partner {
                    Some(j) => {
                        let (hi, lo) = if i > j { (i, j) } else { (j, i) };
                        terms.swap_remove(hi);
                        terms.swap_remove(lo);
                        terms.push(Expr::Num(c));
                        i = 0;
                    }
                    None => i += 1,
                }
            }
            add_terms(terms)
        }
    }
}

/// The smallest of several equivalent forms of `e`.
pub fn simplify(e: &Expr) -> Expr {
    let base = canonical(e);
    let expanded = expand(&base);
    let mut candidates = vec![
        base.clone(),
        expanded.clone(),
        pythagorean(&base),
        pythagorean(&expanded),
    ];
    candidates.extend(cancel(&base));
    candidates
        .into_iter()
        .min_by_key(Expr::size)
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn x() -> Expr {
        Expr::sym("x")
    }

    fn show(e: &Expr) -> String {
        canonical(e).to_string()
    }

    #[test]
    fn folds_numbers() {
        assert_eq!(show(&(Expr::int(2) + Expr::int(3))), "5");
        assert_eq!(show(&(Expr::int(1) / Expr::int(3) + Expr::rat(1, 6))), "1/2");
    }

    #[test]
    fn collects_like_terms() {
        assert_eq!(show(&(x() + x())), "2*x");
        assert_eq!(show(&(x() - x())), "0");
        let e = Expr::powi(x(), 2) + Expr::int(2) * x() + x() * x() + Expr::one();
        assert_eq!(show(&e), "2*x**2 + 2*x + 1");
    }

    #[test]
    fn merges_powers() {
        assert_eq!(show(&(x() * x() * x())), "x**3");
        assert_eq!(show(&(Expr::powi(x(), 3) / x())), "x**2");
        assert_eq!(show(&(x() / x())), "1");
        assert_eq!(show(&Expr::powi(Expr::int(2) * x(), 2)), "4*x**2");
    }

    #[test]
    fn extracts_square_factors() {
        assert_eq!(show(&Expr::sqrt(Expr::int(8))), "2*sqrt(2)");
        assert_eq!(show(&(Expr::sqrt(Expr::int(2)) * Expr::sqrt(Expr::int(2)))), "2");
        assert_eq!(show(&Expr::sqrt(Expr::int(16))), "4");
    }

    #[test]
    fn applies_function_identities() {
        assert_eq!(show(&Expr::call(Func::Sin, Expr::zero())), "0");
        assert_eq!(show(&Expr::call(Func::Exp, Expr::call(Func::Ln, x()))), "x");
        assert_eq!(show(&Expr::call(Func::Cos, -x())), "cos(x)");
        assert_eq!(show(&Expr::call(Func::Sin, -x())), "-sin(x)");
        assert_eq!(show(&Expr::pow(Expr::Const(Constant::E), x())), "exp(x)");
        assert_eq!(
            show(&(Expr::call(Func::Exp, x()) * Expr::call(Func::Exp, x()))),
            "exp(2*x)"
        );
    }

    #[test]
    fn expands_products() {
        let e = Expr::powi(x() + Expr::one(), 2) - Expr::powi(x(), 2);
        assert_eq!(expand(&e).to_string(), "2*x + 1");
        let e = (x() + Expr::one()) * (x() - Expr::one());
        assert_eq!(expand(&e).to_string(), "x**2 - 1");
    }

    #[test]
    fn simplify_prefers_smaller_forms() {
        let e = Expr::powi(x() + Expr::one(), 2) - Expr::powi(x(), 2);
        assert_eq!(simplify(&e).to_string(), "2*x + 1");
        let e = Expr::powi(Expr::call(Func::Sin, x()), 2)
            + Expr::powi(Expr::call(Func::Cos, x()), 2);
        assert_eq!(simplify(&e).to_string(), "1");
        let e = (Expr::powi(x(), 2) - Expr::one()) / (x() - Expr::one());
        assert_eq!(simplify(&e).to_string(), "x + 1");
    }

    #[test]
    fn splits_numerator_and_denominator() {
        let e = canonical(&(Expr::call(Func::Sin, x()) / x()));
        let (n, d) = numer_denom(&e);
        assert_eq!((n.to_string(), d.to_string()), ("sin(x)".into(), "x".into()));
    }
}
