// SPDX: CC0-1.0

use crate::{
    expr::{Expr, Num, Relation},
    lex::SubStr,
    stdlib,
};
use core::fmt;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Neg => 4,
            Self::Pow => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Pow => Right,
        }
    }

    /// Prefix operators take their operand from the right.
    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Neg)
    }

    pub const fn fun(&self) -> (&'static str, Fun) {
        match self {
            Self::Neg => ("neg", Fun::new(1, stdlib::neg)),
            Self::Add => ("add", Fun::new(2, stdlib::add)),
            Self::Sub => ("sub", Fun::new(2, stdlib::sub)),
            Self::Mul => ("mul", Fun::new(2, stdlib::mul)),
            Self::Div => ("div", Fun::new(2, stdlib::div)),
            Self::Pow => ("pow", Fun::new(2, stdlib::pow)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Num),
    Ident,
    // `lhs = rhs`, only valid as the final operation
    Equate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.fun().0),
            OperationTyp::Ident => write!(f, "call '{}'", self.loc.get()),
            OperationTyp::Equate => write!(f, "equate"),
        }
    }
}

#[derive(Debug)]
pub enum EvalErrTyp {
    Empty,
    MissingArgs {
        name: IdentKey,
        arity: usize,
        found: usize,
    },
    StackMismatch {
        expected: usize,
        found: usize,
    },
    MisplacedEquals,
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::Empty => write!(f, "cannot evaluate empty expression"),

            EvalErrTyp::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                name = name.get(),
                s = if *arity == 1 { "" } else { "s" }
            ),

            EvalErrTyp::StackMismatch { expected, found } => write!(
                f,
                "expected {expected} value{s} but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),

            EvalErrTyp::MisplacedEquals => {
                write!(f, "'=' must separate the two sides of a single equation")
            }
        }
    }
}

impl std::error::Error for EvalErr {}

#[derive(Debug)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub op: Option<Operation>, // if none, associated with end-of-program checking
}

#[derive(Debug)]
pub struct Fun {
    pub arity: usize,
    pub fun: fn(Vec<Expr>) -> Expr,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(Vec<Expr>) -> Expr) -> Self {
        Self { arity, fun }
    }
}

#[derive(Debug)]
pub enum Ident {
    Const(Expr),
    Fun(Fun),
}

impl Ident {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Const(_) => "constant",
            Self::Fun(_) => "function",
        }
    }
}

#[derive(Clone, Debug, Eq)]
pub enum IdentKey {
    Arc(SubStr),
    Static(&'static str),
}

impl PartialEq for IdentKey {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl core::hash::Hash for IdentKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state)
    }
}

impl IdentKey {
    pub fn get(&self) -> &str {
        match self {
            Self::Arc(s) => s.get(),
            Self::Static(s) => s,
        }
    }
}

impl fmt::Display for IdentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

impl From<SubStr> for IdentKey {
    fn from(s: SubStr) -> Self {
        Self::Arc(s)
    }
}

impl From<&'static str> for IdentKey {
    fn from(s: &'static str) -> Self {
        Self::Static(s)
    }
}

pub type Idents = HashMap<IdentKey, Ident>;

#[derive(Debug, PartialEq)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }
}

/// Run `prog` symbolically. Identifiers missing from `idents` become free
/// symbols. The result is a raw tree.
pub fn eval(prog: &Program, idents: &Idents, stack: &mut Vec<Expr>) -> Result<Relation, EvalErr> {
    fn expect_exactly_n(
        stack: &[Expr],
        op: impl Into<Option<Operation>>,
        n: usize,
    ) -> Result<(), EvalErr> {
        let len = stack.len();
        if len == n {
            Ok(())
        } else {
            Err(EvalErr {
                typ: EvalErrTyp::StackMismatch {
                    expected: n,
                    found: len,
                },
                op: op.into(),
            })
        }
    }

    fn eval_fun(
        stack: &mut Vec<Expr>,
        op: &Operation,
        name: impl Into<IdentKey>,
        fun: &Fun,
    ) -> Result<Expr, EvalErr> {
        let len = stack.len();
        if len < fun.arity {
            return Err(EvalErr {
                typ: EvalErrTyp::MissingArgs {
                    arity: fun.arity,
                    found: len,
                    name: name.into(),
                },
                op: Some(op.clone()),
            });
        }
        // stack: ...a, b, c, d
        //                 ^^^^ args if arity is 2
        let args = stack.split_off(len - fun.arity);
        Ok((fun.fun)(args))
    }

    let mut prog = prog.ops.iter().peekable();

    if prog.peek().is_none() {
        return Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        });
    }

    stack.clear();

    while let Some(op) = prog.next() {
        match op.typ {
            OperationTyp::Operator(typ) => {
                let (name, fun) = typ.fun();
                let val = eval_fun(stack, op, name, &fun)?;
                stack.push(val);
            }

            OperationTyp::Val(num) => stack.push(Expr::Num(num)),

            OperationTyp::Ident => {
                let sym = op.loc.clone();
                let val = match idents.get(&sym.clone().into()) {
                    Some(Ident::Const(val)) => val.clone(),
                    Some(Ident::Fun(fun)) => eval_fun(stack, op, sym, fun)?,
                    None => Expr::sym(sym.get()),
                };
                stack.push(val);
            }

            OperationTyp::Equate => {
                if prog.peek().is_some() {
                    return Err(EvalErr {
                        typ: EvalErrTyp::MisplacedEquals,
                        op: Some(op.clone()),
                    });
                }
                expect_exactly_n(stack, op.clone(), 2)?;
                let rhs = stack.swap_remove(1);
                let lhs = stack.swap_remove(0);
                return Ok(Relation::Equation(lhs, rhs));
            }
        }
    }

    expect_exactly_n(stack, None, 1)?;
    Ok(Relation::Expr(stack.swap_remove(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::Lexer, parse::parse, simplify::canonical, stdlib::standard_idents};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn run(src: &str) -> Result<Relation, EvalErr> {
        let src = Arc::new(src.to_string());
        let prog = parse(Lexer::new(&src), &standard_idents()).unwrap();
        eval(&prog, &standard_idents(), &mut Vec::new())
    }

    fn shown(src: &str) -> String {
        match run(src).unwrap() {
            Relation::Expr(e) => canonical(&e).to_string(),
            Relation::Equation(l, r) => format!("{} = {}", canonical(&l), canonical(&r)),
        }
    }

    #[test]
    fn unknown_identifiers_are_symbols() {
        assert_eq!(shown("x*y + x*y"), "2*x*y");
        assert_eq!(shown("sin(t)**2"), "sin(t)**2");
    }

    #[test]
    fn respects_precedence_and_associativity() {
        assert_eq!(shown("2^3^2"), "512");
        assert_eq!(shown("-2**2"), "-4");
        assert_eq!(shown("2**-1"), "1/2");
        assert_eq!(shown("1 - 2 - 3"), "-4");
        assert_eq!(shown("8/2/2"), "2");
    }

    #[test]
    fn builds_equations() {
        assert_eq!(shown("x**2 = 4"), "x**2 = 4");
    }

    #[test]
    fn equals_must_come_last() {
        let err = run("(x = 1) + 2").unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::MisplacedEquals));
        let err = run("x = 1 = 2").unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::MisplacedEquals));
    }

    #[test]
    fn implicit_multiplication_is_a_stack_mismatch() {
        let err = run("2x").unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::StackMismatch {
                expected: 1,
                found: 2
            }
        ));
        assert!(err.op.is_none());
    }

    #[test]
    fn missing_arguments_name_the_function() {
        let src = Arc::new(String::from("2 +"));
        let prog = parse(Lexer::new(&src), &standard_idents()).unwrap();
        let err = eval(&prog, &standard_idents(), &mut Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "function 'add' requires 2 arguments, but found 1"
        );
    }
}
