// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Ident, Idents, Operation, OperationTyp, OperatorTyp, Program},
    expr::Num,
    lex::{LexErr, LexErrTyp, Lexer, SubStr, TokTyp},
    Number,
};
use core::{fmt, num::ParseFloatError};

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}'", self.typ, self.loc)
    }
}

impl std::error::Error for ParseErr {}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Ident,
    Equals,
    OpenParen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

// functions bind tighter than every operator
const FUNCTION_PRECEDENCE: i8 = 6;

impl ShuntOp {
    fn precedence(&self) -> i8 {
        match self.typ {
            ShuntOpTyp::Operator(op) => op.precedence(),
            ShuntOpTyp::Ident => FUNCTION_PRECEDENCE,
            ShuntOpTyp::Equals | ShuntOpTyp::OpenParen => 0,
        }
    }

    /// `None` for parentheses, which never reach the output.
    fn into_output(self) -> Option<Operation> {
        let typ = match self.typ {
            ShuntOpTyp::Operator(typ) => OperationTyp::Operator(typ),
            ShuntOpTyp::Ident => OperationTyp::Ident,
            ShuntOpTyp::Equals => OperationTyp::Equate,
            ShuntOpTyp::OpenParen => return None,
        };
        Some(Operation { typ, loc: self.loc })
    }
}

/// Integers and fractions stay exact; anything with a decimal point is a
/// float.
fn parse_number(text: &str) -> Result<Num, ParseFloatError> {
    if !text.contains('.') {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Num::int(n));
        }
    }
    text.parse::<Number>().map(Num::Float)
}

pub fn parse(lex: Lexer<'_>, idents: &Idents) -> Result<Program, ParseErr> {
    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack

    // move operators to the output until an open paren or a weaker operator
    fn pop_while(
        ops: &mut Vec<ShuntOp>,
        out: &mut Vec<Operation>,
        keep_going: impl Fn(&ShuntOp) -> bool,
    ) {
        while let Some(op) = ops.pop() {
            if op.typ == ShuntOpTyp::OpenParen || !keep_going(&op) {
                ops.push(op);
                break;
            }
            out.extend(op.into_output());
        }
    }

    for tok in lex {
        let tok = tok?;
        match tok.typ {
            TokTyp::Number => {
                let num = parse_number(tok.loc.get()).map_err(|err| ParseErr {
                    typ: ParseErrTyp::ParseNum(err),
                    loc: tok.loc.clone(),
                })?;
                out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc,
                });
            }

            TokTyp::Ident => {
                if let Some(Ident::Fun(_)) = idents.get(&tok.loc.clone().into()) {
                    ops.push(ShuntOp {
                        typ: ShuntOpTyp::Ident,
                        loc: tok.loc,
                    });
                } else {
                    // constants and free symbols are both values
                    out.push(Operation {
                        typ: OperationTyp::Ident,
                        loc: tok.loc,
                    });
                }
            }

            TokTyp::Op(o1) => {
                // a prefix operator has no left operand to flush
                if !o1.is_prefix() {
                    pop_while(&mut ops, &mut out, |o2| {
                        (o2.precedence() > o1.precedence())
                            || ((o1.precedence() == o2.precedence())
                                && (o1.associativity() == Associativity::Left))
                    });
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::Equals => {
                pop_while(&mut ops, &mut out, |_| true);
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Equals,
                    loc: tok.loc,
                });
            }

            TokTyp::Comma => pop_while(&mut ops, &mut out, |_| true),

            TokTyp::OpenParen => {
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen,
                    loc: tok.loc,
                });
            }

            TokTyp::CloseParen => {
                pop_while(&mut ops, &mut out, |_| true);

                match ops.pop() {
                    Some(op) if op.typ == ShuntOpTyp::OpenParen => {}
                    Some(op) => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParenMismatch,
                            loc: op.loc,
                        })
                    }
                    None => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParenMismatch,
                            loc: tok.loc,
                        })
                    }
                }

                // handle functions
                if ops.last().is_some_and(|op| op.typ == ShuntOpTyp::Ident) {
                    out.extend(ops.pop().and_then(ShuntOp::into_output));
                }
            }

            TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XPipe
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => unreachable!("unsupported token survived until parsing"),
        }
    }

    while let Some(op) = ops.pop() {
        if let ShuntOpTyp::OpenParen = op.typ {
            return Err(ParseErr {
                typ: ParseErrTyp::ParenMismatch,
                loc: op.loc,
            });
        }
        out.extend(op.into_output());
    }

    Ok(Program::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::standard_idents;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn rpn(src: &str) -> Result<Vec<String>, ParseErr> {
        let src = Arc::new(src.to_string());
        let prog = parse(Lexer::new(&src), &standard_idents())?;
        Ok(prog.ops().map(ToString::to_string).collect())
    }

    #[test]
    fn converts_to_postfix() {
        assert_eq!(
            rpn("1 + 2 * x").unwrap(),
            ["push 1", "push 2", "call 'x'", "call 'mul'", "call 'add'"]
        );
    }

    #[test]
    fn functions_bind_tighter_than_operators() {
        assert_eq!(
            rpn("sin(x)^2").unwrap(),
            ["call 'x'", "call 'sin'", "push 2", "call 'pow'"]
        );
    }

    #[test]
    fn equals_splits_the_program() {
        assert_eq!(
            rpn("x + 1 = 2").unwrap(),
            ["call 'x'", "push 1", "call 'add'", "push 2", "equate"]
        );
    }

    #[test]
    fn decimals_are_floats() {
        assert_eq!(rpn("2.5").unwrap(), ["push 2.5"]);
        assert_eq!(rpn("3").unwrap(), ["push 3"]);
        assert!(matches!(
            rpn("1.2.3").unwrap_err().typ,
            ParseErrTyp::ParseNum(_)
        ));
    }

    #[test]
    fn reports_mismatched_parentheses() {
        let err = rpn("(x + 1").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::ParenMismatch));
        assert_eq!(err.loc.start(), 0);
        let err = rpn("x + 1)").unwrap_err();
        assert_eq!(err.loc.start(), 5);
    }
}
