// SPDX: CC0-1.0

use crate::{
    eval::*,
    expr::{Constant, Expr, Func},
    Number,
};
use std::collections::HashMap;

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    // operators
    for op in [
        OperatorTyp::Neg,
        OperatorTyp::Add,
        OperatorTyp::Sub,
        OperatorTyp::Mul,
        OperatorTyp::Div,
        OperatorTyp::Pow,
    ] {
        let (name, fun) = op.fun();
        ret.insert(name.into(), Ident::Fun(fun));
    }

    ret.insert("abs".into(), Ident::Fun(Fun::new(1, abs)));
    ret.insert("sqrt".into(), Ident::Fun(Fun::new(1, sqrt)));
    ret.insert("exp".into(), Ident::Fun(Fun::new(1, exp)));
    ret.insert("ln".into(), Ident::Fun(Fun::new(1, ln)));
    // natural logarithm, as in most algebra systems
    ret.insert("log".into(), Ident::Fun(Fun::new(1, ln)));

    // trig
    ret.insert("sin".into(), Ident::Fun(Fun::new(1, sin)));
    ret.insert("cos".into(), Ident::Fun(Fun::new(1, cos)));
    ret.insert("tan".into(), Ident::Fun(Fun::new(1, tan)));
    ret.insert("asin".into(), Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("acos".into(), Ident::Fun(Fun::new(1, arccos)));
    ret.insert("atan".into(), Ident::Fun(Fun::new(1, arctan)));
    ret.insert("arcsin".into(), Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("arccos".into(), Ident::Fun(Fun::new(1, arccos)));
    ret.insert("arctan".into(), Ident::Fun(Fun::new(1, arctan)));

    let pi = Expr::Const(Constant::Pi);
    ret.insert("pi".into(), Ident::Const(pi.clone()));
    ret.insert("tau".into(), Ident::Const(Expr::int(2) * pi));
    ret.insert("e".into(), Ident::Const(Expr::Const(Constant::E)));
    ret.insert("E".into(), Ident::Const(Expr::Const(Constant::E)));
    ret.insert("oo".into(), Ident::Const(Expr::float(Number::INFINITY)));
    ret.insert("inf".into(), Ident::Const(Expr::float(Number::INFINITY)));
    ret
}

/// Arity is checked by the evaluator before any of these run.
fn args<const N: usize>(args: Vec<Expr>) -> [Expr; N] {
    match args.try_into() {
        Ok(args) => args,
        Err(args) => unreachable!("expected {N} arguments, got {}", args.len()),
    }
}

pub fn neg(a: Vec<Expr>) -> Expr {
    let [x] = args(a);
    -x
}

pub fn add(a: Vec<Expr>) -> Expr {
    let [x, y] = args(a);
    x + y
}

pub fn sub(a: Vec<Expr>) -> Expr {
    let [x, y] = args(a);
    x - y
}

pub fn mul(a: Vec<Expr>) -> Expr {
    let [x, y] = args(a);
    x * y
}

pub fn div(a: Vec<Expr>) -> Expr {
    let [x, y] = args(a);
    x / y
}

pub fn pow(a: Vec<Expr>) -> Expr {
    let [x, exp] = args(a);
    Expr::pow(x, exp)
}

pub fn sqrt(a: Vec<Expr>) -> Expr {
    let [x] = args(a);
    Expr::sqrt(x)
}

fn apply(fun: Func, a: Vec<Expr>) -> Expr {
    let [x] = args(a);
    Expr::call(fun, x)
}

pub fn abs(a: Vec<Expr>) -> Expr {
    apply(Func::Abs, a)
}

pub fn exp(a: Vec<Expr>) -> Expr {
    apply(Func::Exp, a)
}

pub fn ln(a: Vec<Expr>) -> Expr {
    apply(Func::Ln, a)
}

pub fn sin(a: Vec<Expr>) -> Expr {
    apply(Func::Sin, a)
}

pub fn cos(a: Vec<Expr>) -> Expr {
    apply(Func::Cos, a)
}

pub fn tan(a: Vec<Expr>) -> Expr {
    apply(Func::Tan, a)
}

pub fn arcsin(a: Vec<Expr>) -> Expr {
    apply(Func::Asin, a)
}

pub fn arccos(a: Vec<Expr>) -> Expr {
    apply(Func::Acos, a)
}

pub fn arctan(a: Vec<Expr>) -> Expr {
    apply(Func::Atan, a)
}
