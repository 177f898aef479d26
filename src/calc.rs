// SPDX: CC0-1.0

use crate::{
    calculus::{self, CalculusErr, Direction},
    eval::{self, EvalErr, Idents},
    expr::{Expr, Lambda, Relation},
    history::{Entry, OpKind, Recorded},
    lex::Lexer,
    parse::{self, ParseErr},
    simplify::{canonical, simplify},
    solve::{self, SolveErr},
    stdlib, Number,
};
use chrono::Local;
use core::fmt;
use log::debug;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcErr {
    #[error("parse error: {0}")]
    Parse(#[from] ParseErr),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalErr),

    #[error(transparent)]
    Calculus(#[from] CalculusErr),

    #[error(transparent)]
    Solve(#[from] SolveErr),

    #[error("expected an expression but found the equation {0}")]
    Equation(Relation),

    #[error("'{name}' has no value, only '{var}' may vary")]
    Unbound {
        name: String,
        var: String,
        similar: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Answer {
    Expr(Expr),
    Relation(Relation),
    Roots(Vec<Expr>),
}

impl Answer {
    fn recorded(&self) -> Recorded {
        match self {
            Self::Roots(xs) => Recorded::Many(xs.iter().map(ToString::to_string).collect()),
            other => Recorded::One(other.to_string()),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(e) => write!(f, "{e}"),
            Self::Relation(r) => write!(f, "{r}"),
            Self::Roots(xs) => {
                f.write_str("[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Result of one successful operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub kind: OpKind,
    pub input: String,
    pub answer: Answer,
    pub explanation: String,
    pub params: Map<String, Value>,
    /// The input as a single expression, for plotting.
    pub subject: Expr,
}

impl Outcome {
    pub fn entry(&self) -> Entry {
        Entry {
            kind: self.kind,
            expr: self.input.clone(),
            result: self.answer.recorded(),
            params: self.params.clone(),
            time: Some(Local::now()),
        }
    }
}

/// JSON has no infinities, so those are recorded the way they are typed.
fn number(v: Number) -> Value {
    if v.is_finite() {
        json!(v)
    } else if v > 0.0 {
        json!("oo")
    } else if v < 0.0 {
        json!("-oo")
    } else {
        Value::Null
    }
}

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[derive(Debug)]
pub struct Calculator {
    idents: Idents,
    var: String,
}

impl Calculator {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            idents: stdlib::standard_idents(),
            var: var.into(),
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn idents(&self) -> &Idents {
        &self.idents
    }

    /// Parse and canonicalize either side of `text`.
    pub fn parse(&self, text: &str) -> Result<Relation, CalcErr> {
        let src = Arc::new(text.to_string());
        let prog = parse::parse(Lexer::new(&src), &self.idents)?;
        let rel = eval::eval(&prog, &self.idents, &mut Vec::new())?;
        Ok(match rel {
            Relation::Expr(e) => Relation::Expr(canonical(&e)),
            Relation::Equation(lhs, rhs) => Relation::Equation(canonical(&lhs), canonical(&rhs)),
        })
    }

    fn expr(&self, text: &str) -> Result<Expr, CalcErr> {
        match self.parse(text)? {
            Relation::Expr(e) => Ok(e),
            rel => Err(CalcErr::Equation(rel)),
        }
    }

    fn outcome(
        &self,
        kind: OpKind,
        text: &str,
        subject: Expr,
        answer: Answer,
        explanation: String,
        params: Map<String, Value>,
    ) -> Outcome {
        debug!("{kind} {text:?} -> {answer}");
        Outcome {
            kind,
            input: text.to_string(),
            answer,
            explanation,
            params,
            subject,
        }
    }

    pub fn evaluate(&self, text: &str) -> Result<Outcome, CalcErr> {
        let rel = self.parse(text)?;
        let mut explanation = format!("expression parsed: {rel}");
        if let Relation::Expr(e) = &rel {
            if e.as_num().is_none() {
                if let Some(v) = e.approx_const().filter(|v| v.is_finite()) {
                    explanation.push_str(&format!(" ≈ {v}"));
                }
            }
        }
        let subject = canonical(&rel.clone().into_expr());
        Ok(self.outcome(
            OpKind::Evaluate,
            text,
            subject,
            Answer::Relation(rel),
            explanation,
            Map::new(),
        ))
    }

    pub fn derivative(&self, text: &str) -> Result<Outcome, CalcErr> {
        let e = self.expr(text)?;
        let d = simplify(&calculus::diff(&e, &self.var));
        let explanation = format!("derivative with respect to {}: {d}", self.var);
        Ok(self.outcome(
            OpKind::Derivative,
            text,
            e,
            Answer::Expr(d),
            explanation,
            Map::new(),
        ))
    }

    /// Indefinite without `bounds`, definite over `bounds` otherwise.
    pub fn integral(&self, text: &str, bounds: Option<(Number, Number)>) -> Result<Outcome, CalcErr> {
        let e = self.expr(text)?;
        let (result, explanation, params) = match bounds {
            None => {
                let f = calculus::integrate(&e, &self.var)?;
                let explanation = format!("antiderivative with respect to {}: {f} + C", self.var);
                (f, explanation, Map::new())
            }
            Some((lower, upper)) => {
                let v = calculus::integrate_between(&e, &self.var, lower, upper)?;
                let explanation = format!("integral from {lower} to {upper}: {v}");
                (v, explanation, params(json!({"lower": number(lower), "upper": number(upper)})))
            }
        };
        Ok(self.outcome(
            OpKind::Integral,
            text,
            e,
            Answer::Expr(result),
            explanation,
            params,
        ))
    }

    pub fn limit(&self, text: &str, point: Number, dir: Direction) -> Result<Outcome, CalcErr> {
        let e = self.expr(text)?;
        let l = calculus::limit(&e, &self.var, point, dir)?;
        let explanation = format!("limit as {} -> {point}{dir}: {l}", self.var);
        Ok(self.outcome(
            OpKind::Limit,
            text,
            e,
            Answer::Expr(l),
            explanation,
            params(json!({"point": number(point), "dir": dir.to_string()})),
        ))
    }

    pub fn taylor(&self, text: &str, x0: Number, n: usize) -> Result<Outcome, CalcErr> {
        let e = self.expr(text)?;
        let s = calculus::series(&e, &self.var, x0, n)?;
        let explanation = format!("Taylor series around {} = {x0} ({n} terms): {s}", self.var);
        Ok(self.outcome(
            OpKind::Taylor,
            text,
            e,
            Answer::Expr(s),
            explanation,
            params(json!({"x0": number(x0), "n": n})),
        ))
    }

    /// `lhs = rhs`, or a bare expression meaning `expr = 0`.
    pub fn solve(&self, text: &str) -> Result<Outcome, CalcErr> {
        let e = canonical(&self.parse(text)?.into_expr());
        let roots = solve::solve(&e, &self.var)?;
        let answer = Answer::Roots(roots);
        let explanation = format!("solutions for {}: {answer}", self.var);
        Ok(self.outcome(OpKind::Solve, text, e, answer, explanation, Map::new()))
    }

    pub fn simplify(&self, text: &str) -> Result<Outcome, CalcErr> {
        let e = self.expr(text)?;
        let s = simplify(&e);
        let explanation = format!("simplified: {s}");
        Ok(self.outcome(
            OpKind::Simplify,
            text,
            e,
            Answer::Expr(s),
            explanation,
            Map::new(),
        ))
    }

    /// Compile `text` for numeric evaluation in the free variable.
    pub fn function(&self, text: &str) -> Result<Lambda, CalcErr> {
        let e = canonical(&self.parse(text)?.into_expr());
        self.lambda(e)
    }

    pub fn lambda(&self, e: Expr) -> Result<Lambda, CalcErr> {
        Lambda::new(e, self.var.clone()).map_err(|name| CalcErr::Unbound {
            similar: self.similar(&name),
            name,
            var: self.var.clone(),
        })
    }

    /// The closest known name to `name`, described for a note.
    pub fn similar(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let var = (self.var.as_str(), "variable");
        self.idents
            .iter()
            .map(|(k, v)| (k.get(), v.kind()))
            .chain(core::iter::once(var))
            .map(|(key, kind)| {
                (
                    strsim::normalized_damerau_levenshtein(&name, &key.to_ascii_lowercase()),
                    key,
                    kind,
                )
            })
            .filter(|(sim, key, _)| *sim > 0.3 && !key.eq_ignore_ascii_case(&name))
            .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| b.1.cmp(a.1)))
            .map(|(_, key, kind)| format!("{kind} '{key}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn calc() -> Calculator {
        Calculator::new("x")
    }

    #[test]
    fn evaluates_with_decimal_hint() {
        let out = calc().evaluate("2*pi").unwrap();
        assert_eq!(out.answer.to_string(), "2*pi");
        assert!(out.explanation.starts_with("expression parsed: 2*pi ≈ 6.28"));
        let out = calc().evaluate("1/3 + 1/6").unwrap();
        assert_eq!(out.explanation, "expression parsed: 1/2");
    }

    #[test]
    fn evaluates_equations() {
        let out = calc().evaluate("x + x = 4").unwrap();
        assert_eq!(out.answer.to_string(), "2*x = 4");
        assert_eq!(out.subject.to_string(), "2*x - 4");
    }

    #[test]
    fn calculus_operations() {
        let c = calc();
        assert_eq!(c.derivative("x**2").unwrap().answer.to_string(), "2*x");
        assert_eq!(c.integral("2*x", None).unwrap().answer.to_string(), "x**2");
        assert_eq!(
            c.integral("x", Some((0.0, 2.0))).unwrap().answer.to_string(),
            "2"
        );
        assert_eq!(
            c.limit("sin(x)/x", 0.0, Direction::Right).unwrap().answer.to_string(),
            "1"
        );
        assert_eq!(
            c.taylor("exp(x)", 0.0, 4).unwrap().answer.to_string(),
            "x**3/6 + x**2/2 + x + 1"
        );
        assert_eq!(
            c.simplify("(x + 1)**2 - x**2").unwrap().answer.to_string(),
            "2*x + 1"
        );
    }

    #[test]
    fn solves_equations_and_expressions() {
        let c = calc();
        let out = c.solve("x**2 = 4").unwrap();
        assert_eq!(out.answer.to_string(), "[-2, 2]");
        assert_eq!(out.entry().result, Recorded::Many(vec!["-2".into(), "2".into()]));
        assert_eq!(c.solve("x - 3").unwrap().answer.to_string(), "[3]");
    }

    #[test]
    fn operations_record_their_parameters() {
        let out = calc().taylor("sin(x)", 0.0, 5).unwrap();
        let entry = out.entry();
        assert_eq!(entry.kind, OpKind::Taylor);
        assert_eq!(entry.expr, "sin(x)");
        assert_eq!(entry.params.get("n"), Some(&json!(5)));
        assert!(entry.time.is_some());
    }

    #[test]
    fn infinite_limit_points_survive_in_history() {
        let out = calc().limit("1/x", Number::INFINITY, Direction::Right).unwrap();
        assert_eq!(out.answer.to_string(), "0");
        let value = serde_json::to_value(out.entry()).unwrap();
        assert_eq!(value["point"], json!("oo"));
        let out = calc().limit("exp(x)", Number::NEG_INFINITY, Direction::Right).unwrap();
        assert_eq!(out.params["point"], json!("-oo"));
    }

    #[test]
    fn two_sided_limits_must_agree() {
        assert!(matches!(
            calc().limit("1/x", 0.0, Direction::Both),
            Err(CalcErr::Calculus(CalculusErr::NoLimit { .. }))
        ));
    }

    #[test]
    fn undefined_constants_get_no_decimal_hint() {
        let out = calc().evaluate("sqrt(-1)").unwrap();
        assert!(!out.explanation.contains('≈'), "{}", out.explanation);
        assert!(!out.explanation.contains("NaN"));
    }

    #[test]
    fn calculus_rejects_equations() {
        assert!(matches!(
            calc().derivative("x = 1"),
            Err(CalcErr::Equation(_))
        ));
    }

    #[test]
    fn respects_the_configured_variable() {
        let c = Calculator::new("t");
        assert_eq!(c.derivative("t**3 + x").unwrap().answer.to_string(), "3*t**2");
        let f = c.function("t**2").unwrap();
        assert_relative_eq!(f.call(3.0).unwrap(), 9.0);
    }

    #[test]
    fn unbound_symbols_suggest_a_known_name() {
        match calc().function("sinn + x") {
            Err(CalcErr::Unbound { name, similar, .. }) => {
                assert_eq!(name, "sinn");
                assert_eq!(similar.as_deref(), Some("function 'sin'"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_errors_pass_through() {
        assert!(matches!(calc().evaluate("2 +* 3"), Err(CalcErr::Eval(_))));
        assert!(matches!(calc().evaluate("x <= 2"), Err(CalcErr::Parse(_))));
    }
}
