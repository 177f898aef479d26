// SPDX: CC0-1.0

//! The interactive menu loop.

use crate::{
    calc::{CalcErr, Calculator, Outcome},
    calculus::Direction,
    config::Config,
    eval::EvalErrTyp,
    expr::Lambda,
    history::History,
    lex::{LexErrTyp, SubStr, TokTyp},
    parse::ParseErrTyp,
    plot::{self, Style, PALETTE},
    shell::{self, Command, EndOfInput, Paint},
    Number, Window,
};
use colored::Color;
use core::str::FromStr;
use log::debug;
use std::{
    io::{BufRead, Write},
    sync::Arc,
};

const MAX_PLOTTED: usize = 8;

/// Limit point; `oo` and `inf` are accepted with either sign.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Point(Number);

impl FromStr for Point {
    type Err = core::num::ParseFloatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "oo" | "+oo" => Ok(Self(Number::INFINITY)),
            "-oo" => Ok(Self(Number::NEG_INFINITY)),
            other => other.parse().map(Self),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    config: Config,
    calc: Calculator,
    history: History,
    paint: Paint,
}

/// Unwraps a prompt answer, returning to the menu on a parse error.
macro_rules! answer {
    ($read:expr, $default:expr) => {
        match $read {
            Ok(Some(v)) => v,
            Ok(None) => $default,
            Err(_) => return Ok(()),
        }
    };
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            calc: Calculator::new(config.variable.clone()),
            history: History::new(config.history.clone()),
            paint: Paint {
                enabled: config.color,
            },
            config,
        }
    }

    /// Runs until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, mut inp: R, mut out: W) -> anyhow::Result<()> {
        loop {
            match self.step(&mut inp, &mut out) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) if err.is::<EndOfInput>() => {
                    debug!("input closed");
                    writeln!(out)?;
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        writeln!(out, "goodbye")?;
        out.flush()?;
        Ok(())
    }

    fn menu<W: Write>(&self, mut out: W) -> anyhow::Result<()> {
        let items: Vec<String> = Command::exhaustive()
            .iter()
            .map(|c| format!("{} {}", c.key(), c.name()))
            .collect();
        writeln!(out, "{}", self.paint.paint(items.join(" | "), Color::Cyan))?;
        Ok(())
    }

    /// One menu round; `false` once the user quits.
    fn step<R: BufRead, W: Write>(&mut self, mut inp: R, mut out: W) -> anyhow::Result<bool> {
        self.menu(&mut out)?;
        let choice = shell::input(&mut inp, &mut out, self.paint.paint("> ", Color::Yellow))?;
        if choice.is_empty() {
            return Ok(true);
        }

        match choice.parse::<Command>() {
            Ok(Command::Quit) => return Ok(false),
            Ok(Command::Help) => {
                for c in Command::exhaustive() {
                    writeln!(
                        out,
                        "{key} {name}: {help}",
                        key = c.key(),
                        name = c.name(),
                        help = c.help()
                    )?;
                }
            }
            Ok(Command::History) => self.show_history(&mut out)?,
            Ok(Command::Plot) => self.multi_plot(&mut inp, &mut out)?,
            Ok(cmd) => self.operation(&mut inp, &mut out, cmd)?,
            Err(err) => {
                shell::error(&mut out, self.paint, &err)?;
                if let Some(similar) = err.similar {
                    shell::note(
                        &mut out,
                        format_args!("command '{}' has a similar name", similar.name()),
                    )?;
                }
                shell::note(&mut out, r#"try "h" for help"#)?;
            }
        }

        writeln!(out)?;
        Ok(true)
    }

    fn prompt(&self, text: impl core::fmt::Display) -> String {
        self.paint.paint(text, Color::Yellow)
    }

    fn operation<R: BufRead, W: Write>(
        &mut self,
        mut inp: R,
        mut out: W,
        cmd: Command,
    ) -> anyhow::Result<()> {
        let text = shell::input(&mut inp, &mut out, self.prompt("expression: "))?;
        if text.is_empty() {
            return Ok(());
        }
        let var = self.calc.var().to_string();

        let outcome = match cmd {
            Command::Evaluate => self.calc.evaluate(&text),
            Command::Derivative => self.calc.derivative(&text),
            Command::Integral => {
                let lower = match shell::read_fromstr::<_, _, Number>(
                    &mut inp,
                    &mut out,
                    self.prompt("lower bound (blank for indefinite): "),
                    true,
                )? {
                    Ok(lower) => lower,
                    Err(_) => return Ok(()),
                };
                let bounds = match lower {
                    None => None,
                    Some(lower) => {
                        let upper = shell::read_fromstr::<_, _, Number>(
                            &mut inp,
                            &mut out,
                            self.prompt("upper bound: "),
                            true,
                        )?;
                        match upper {
                            Ok(Some(upper)) => Some((lower, upper)),
                            Ok(None) => {
                                shell::error(&mut out, self.paint, "a definite integral needs both bounds")?;
                                return Ok(());
                            }
                            Err(_) => return Ok(()),
                        }
                    }
                };
                self.calc.integral(&text, bounds)
            }
            Command::Limit => {
                let Point(point) = answer!(
                    shell::read_fromstr::<_, _, Point>(
                        &mut inp,
                        &mut out,
                        self.prompt(format_args!("{var} approaches (default 0): ")),
                        true,
                    )?,
                    Point(0.0)
                );
                let dir = answer!(
                    shell::read_fromstr::<_, _, Direction>(
                        &mut inp,
                        &mut out,
                        self.prompt("direction +, - or +- (default +): "),
                        true,
                    )?,
                    Direction::default()
                );
                self.calc.limit(&text, point, dir)
            }
            Command::Taylor => {
                let x0 = answer!(
                    shell::read_fromstr::<_, _, Number>(
                        &mut inp,
                        &mut out,
                        self.prompt("expansion point (default 0): "),
                        true,
                    )?,
                    0.0
                );
                let n = answer!(
                    shell::read_fromstr::<_, _, usize>(
                        &mut inp,
                        &mut out,
                        self.prompt("number of terms (default 5): "),
                        true,
                    )?,
                    5
                );
                self.calc.taylor(&text, x0, n)
            }
            Command::Solve => self.calc.solve(&text),
            Command::Simplify => self.calc.simplify(&text),
            Command::Plot | Command::History | Command::Help | Command::Quit => {
                unreachable!("'{}' is not a symbolic operation", cmd.name())
            }
        };

        match outcome {
            Ok(outcome) => self.finish(&mut inp, &mut out, outcome),
            Err(err) => {
                self.report(&mut out, &text, &err)?;
                Ok(())
            }
        }
    }

    /// Shows and records a result, then offers to plot its input.
    fn finish<R: BufRead, W: Write>(
        &mut self,
        mut inp: R,
        mut out: W,
        outcome: Outcome,
    ) -> anyhow::Result<()> {
        shell::success(&mut out, self.paint, "result", &outcome.answer)?;
        writeln!(out, "{}", outcome.explanation)?;
        if let Err(err) = self.history.append(outcome.entry()) {
            shell::error(&mut out, self.paint, &err)?;
        }

        let reply = shell::input(&mut inp, &mut out, self.prompt("plot it? [y/N] "))?;
        if !reply.eq_ignore_ascii_case("y") && !reply.eq_ignore_ascii_case("yes") {
            return Ok(());
        }
        match self.calc.lambda(outcome.subject) {
            Ok(f) => self.plot(&mut inp, &mut out, &[f]),
            Err(err) => {
                self.report(&mut out, &outcome.input, &err)?;
                Ok(())
            }
        }
    }

    fn multi_plot<R: BufRead, W: Write>(&mut self, mut inp: R, mut out: W) -> anyhow::Result<()> {
        let count = answer!(
            shell::read_fromstr::<_, _, usize>(
                &mut inp,
                &mut out,
                self.prompt(format_args!("how many functions (1 to {MAX_PLOTTED}, default 1): ")),
                true,
            )?,
            1
        );
        if !(1..=MAX_PLOTTED).contains(&count) {
            shell::error(
                &mut out,
                self.paint,
                format_args!("can plot between 1 and {MAX_PLOTTED} functions, not {count}"),
            )?;
            return Ok(());
        }

        let var = self.calc.var().to_string();
        let mut functions = Vec::with_capacity(count);
        for i in 1..=count {
            let text = shell::input(&mut inp, &mut out, self.prompt(format_args!("f{i}({var}) = ")))?;
            match self.calc.function(&text) {
                Ok(f) => functions.push(f),
                Err(err) => {
                    self.report(&mut out, &text, &err)?;
                    return Ok(());
                }
            }
        }
        self.plot(&mut inp, &mut out, &functions)
    }

    fn plot_window<R: BufRead, W: Write>(
        &self,
        mut inp: R,
        mut out: W,
    ) -> anyhow::Result<Option<Window>> {
        let defaults = &self.config.plot;
        let mut window = defaults.window();
        writeln!(out, "note: leave blank to keep the default")?;
        for (name, dst) in [("x min", &mut window.x.start), ("x max", &mut window.x.end)] {
            match shell::read_fromstr::<_, _, Number>(
                &mut inp,
                &mut out,
                self.prompt(format_args!("{name} (default {cur}): ", cur = *dst)),
                true,
            )? {
                Ok(Some(new)) => *dst = new,
                Ok(None) => {}
                Err(_) => return Ok(None),
            }
        }
        for (name, dst) in [("width", &mut window.width), ("height", &mut window.height)] {
            match shell::read_fromstr::<_, _, usize>(
                &mut inp,
                &mut out,
                self.prompt(format_args!("{name} (default {cur}): ", cur = *dst)),
                true,
            )? {
                Ok(Some(new)) => *dst = new,
                Ok(None) => {}
                Err(_) => return Ok(None),
            }
        }
        Ok(Some(window))
    }

    fn plot<R: BufRead, W: Write>(
        &self,
        mut inp: R,
        mut out: W,
        functions: &[Lambda],
    ) -> anyhow::Result<()> {
        let Some(window) = self.plot_window(&mut inp, &mut out)? else {
            return Ok(());
        };
        debug!("plotting {} function(s) over {window}", functions.len());

        let style = Style {
            chars: core::iter::once(self.config.plot.glyph)
                .chain(PALETTE.iter().skip(1).map(|g| g.ch))
                .collect(),
            colors: Vec::new(),
        };
        let samplers: Vec<_> = functions.iter().map(|f| move |x| f.call(x)).collect();
        match plot::render(&samplers, &window, &style) {
            Ok(grid) => {
                writeln!(out)?;
                for (idx, f) in functions.iter().enumerate() {
                    let glyph = style.glyph(idx);
                    writeln!(
                        out,
                        "{} {}({}) = {}",
                        self.paint.paint(glyph.ch, glyph.color),
                        if functions.len() == 1 { "f".to_string() } else { format!("f{}", idx + 1) },
                        f.var(),
                        f.expr()
                    )?;
                }
                plot::write(&mut out, &grid, self.paint.enabled)?;
            }
            Err(err) => shell::error(&mut out, self.paint, err)?,
        }
        Ok(())
    }

    fn show_history<W: Write>(&self, mut out: W) -> anyhow::Result<()> {
        let entries = self.history.load();
        if entries.is_empty() {
            writeln!(out, "history is empty")?;
            return Ok(());
        }
        let skip = entries.len().saturating_sub(self.config.history_shown);
        for (i, entry) in entries.iter().enumerate().skip(skip) {
            writeln!(
                out,
                "{}. {} {} → {}",
                i + 1,
                self.paint.paint(format_args!("[{}]", entry.kind), Color::Cyan),
                entry.expr,
                entry.result
            )?;
        }
        Ok(())
    }

    /// Prints `err` with the offending span underlined and any notes.
    fn report<W: Write>(&self, mut out: W, text: &str, err: &CalcErr) -> anyhow::Result<()> {
        let src = Arc::new(text.to_string());
        match err {
            CalcErr::Parse(err) => {
                writeln!(out)?;
                shell::underline(&mut out, &err.loc)?;
                shell::error(&mut out, self.paint, format_args!("parse error: {}", err.typ))?;
                match err.typ {
                    ParseErrTyp::LexErr(LexErrTyp::InvalidChar) => shell::note(
                        &mut out,
                        "available tokens are numbers, alphabetic identifiers, and symbols +-*/^=,()",
                    )?,
                    ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ)) => match typ {
                        TokTyp::XGreater | TokTyp::XLess => {
                            shell::note(&mut out, "expected an expression but found an inequality")?
                        }
                        TokTyp::XPipe => shell::note(
                            &mut out,
                            "use the 'abs' function to compute absolute value",
                        )?,
                        TokTyp::XOpenSquareBracket
                        | TokTyp::XCloseSquareBracket
                        | TokTyp::XOpenCurly
                        | TokTyp::XCloseCurly => {
                            shell::note(&mut out, "only round parentheses group terms")?
                        }
                        _ => {}
                    },
                    ParseErrTyp::ParseNum(_) => {
                        shell::note(&mut out, "parsing as floating point number")?
                    }
                    ParseErrTyp::ParenMismatch => {}
                }
            }

            CalcErr::Eval(err) => {
                let loc = err.op.as_ref().map(|op| op.loc.clone());
                writeln!(out)?;
                shell::underline(&mut out, loc.as_ref().unwrap_or(&SubStr::end(src)))?;
                shell::error(&mut out, self.paint, format_args!("evaluation error: {err}"))?;
                if loc.is_none() {
                    shell::note(
                        &mut out,
                        "exactly 1 final value is expected on the stack after evaluation",
                    )?;
                }
                match err.typ {
                    EvalErrTyp::StackMismatch { .. } => shell::note(
                        &mut out,
                        "implicit multiplication is not supported, so for example '5x' would be '5*x'",
                    )?,
                    EvalErrTyp::Empty
                    | EvalErrTyp::MissingArgs { .. }
                    | EvalErrTyp::MisplacedEquals => {}
                }
            }

            CalcErr::Unbound { similar, .. } => {
                shell::error(&mut out, self.paint, err)?;
                if let Some(similar) = similar {
                    shell::note(&mut out, format_args!("{similar} has a similar name"))?;
                }
            }

            CalcErr::Equation(_) => {
                shell::error(&mut out, self.paint, err)?;
                shell::note(
                    &mut out,
                    "only evaluate and solve accept equations, try solve instead",
                )?;
            }

            CalcErr::Calculus(_) | CalcErr::Solve(_) => shell::error(&mut out, self.paint, err)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn points_accept_infinity() {
        assert_eq!("oo".parse(), Ok(Point(Number::INFINITY)));
        assert_eq!("-oo".parse(), Ok(Point(Number::NEG_INFINITY)));
        assert_eq!("-inf".parse(), Ok(Point(Number::NEG_INFINITY)));
        assert_eq!(" 2.5".parse(), Ok(Point(2.5)));
        assert!("x".parse::<Point>().is_err());
    }
}
