// SPDX: CC0-1.0

use crate::lex::SubStr;
use anyhow::Context;
use colored::{Color, Colorize};
use core::fmt;
use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Evaluate,
    Derivative,
    Integral,
    Limit,
    Taylor,
    Solve,
    Plot,
    Simplify,
    History,
    Help,
    Quit,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Evaluate,
            Self::Derivative,
            Self::Integral,
            Self::Limit,
            Self::Taylor,
            Self::Solve,
            Self::Plot,
            Self::Simplify,
            Self::History,
            Self::Help,
            Self::Quit,
        ]
    }

    /// Menu shortcut.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Evaluate => "1",
            Self::Derivative => "2",
            Self::Integral => "3",
            Self::Limit => "4",
            Self::Taylor => "5",
            Self::Solve => "6",
            Self::Plot => "7",
            Self::Simplify => "8",
            Self::History => "9",
            Self::Help => "h",
            Self::Quit => "0",
        }
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Evaluate => "parse an expression or equation into canonical form",
            Self::Derivative => "differentiate with respect to the variable",
            Self::Integral => "integrate, over bounds if given",
            Self::Limit => "take a one-sided or two-sided limit",
            Self::Taylor => "expand into a truncated Taylor series",
            Self::Solve => "find the real solutions of an equation",
            Self::Plot => "plot one or more functions on a text grid",
            Self::Simplify => "find the simplest equivalent form",
            Self::History => "show recent operations",
            Self::Help => "display help for each command",
            Self::Quit => "quit the calculator",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Evaluate => "evaluate",
            Self::Derivative => "derivative",
            Self::Integral => "integral",
            Self::Limit => "limit",
            Self::Taylor => "taylor",
            Self::Solve => "solve",
            Self::Plot => "plot",
            Self::Simplify => "simplify",
            Self::History => "history",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown command '{input}'")]
pub struct UnknownCommand {
    pub input: String,
    pub similar: Option<Command>,
}

impl core::str::FromStr for Command {
    type Err = UnknownCommand;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        for c in Self::exhaustive() {
            if s == c.key() || s == c.name() {
                return Ok(*c);
            }
        }
        let similar = Self::exhaustive()
            .iter()
            .map(|c| (strsim::normalized_damerau_levenshtein(&s, c.name()), *c))
            .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc })
            .filter(|(sim, _)| *sim > 0.3)
            .map(|(_, c)| c);
        Err(UnknownCommand { input: s, similar })
    }
}

/// Raised by [`input`] once the reader is exhausted.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("end of input")]
pub struct EndOfInput;

/// Optional coloring of terminal text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paint {
    pub enabled: bool,
}

impl Paint {
    pub fn paint(&self, text: impl fmt::Display, color: Color) -> String {
        if self.enabled {
            text.to_string().color(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: impl fmt::Display, color: Color) -> String {
        if self.enabled {
            text.to_string().color(color).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

pub fn input<R: BufRead, W: Write>(
    inp: R,
    out: W,
    prompt: impl fmt::Display,
) -> anyhow::Result<String> {
    fn inner<R: BufRead, W: Write>(
        mut inp: R,
        mut out: W,
        prompt: impl fmt::Display,
    ) -> io::Result<Option<String>> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut s = String::new();
        if inp.read_line(&mut s)? == 0 {
            return Ok(None);
        }
        Ok(Some(s.trim().to_string()))
    }

    match inner(inp, out, prompt).context("read from standard input failed")? {
        Some(s) => Ok(s),
        None => Err(EndOfInput.into()),
    }
}

pub fn read_fromstr<R: BufRead, W: Write, T: core::str::FromStr>(
    inp: R,
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(inp, &mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    // NOTE(unicode): columns are byte offsets
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

pub fn error<W: Write>(mut out: W, paint: Paint, msg: impl fmt::Display) -> io::Result<()> {
    writeln!(out, "{} {msg}", paint.bold("error:", Color::Red))
}

pub fn note<W: Write>(mut out: W, msg: impl fmt::Display) -> io::Result<()> {
    writeln!(out, "note: {msg}")
}

pub fn success<W: Write>(
    mut out: W,
    paint: Paint,
    label: &str,
    msg: impl fmt::Display,
) -> io::Result<()> {
    writeln!(
        out,
        "{} {}",
        paint.bold(format_args!("{label}:"), Color::Green),
        paint.paint(msg, Color::Green)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn commands_by_key_and_name() {
        assert_eq!("1".parse(), Ok(Command::Evaluate));
        assert_eq!("Taylor".parse(), Ok(Command::Taylor));
        assert_eq!(" 0 ".parse(), Ok(Command::Quit));
        assert_eq!("h".parse(), Ok(Command::Help));
        for c in Command::exhaustive() {
            assert_eq!(c.key().parse(), Ok(*c));
            assert_eq!(c.name().parse(), Ok(*c));
        }
    }

    #[test]
    fn unknown_commands_suggest() {
        let err = "derivatve".parse::<Command>().unwrap_err();
        assert_eq!(err.similar, Some(Command::Derivative));
        let err = "zzzzzzzzzzzz".parse::<Command>().unwrap_err();
        assert_eq!(err.similar, None);
    }

    #[test]
    fn input_trims_and_detects_eof() {
        let mut inp = Cursor::new("  x**2 \n");
        let mut out = Vec::new();
        assert_eq!(input(&mut inp, &mut out, "> ").unwrap(), "x**2");
        assert_eq!(out, b"> ");
        let err = input(&mut inp, &mut out, "> ").unwrap_err();
        assert!(err.is::<EndOfInput>());
    }

    #[test]
    fn read_fromstr_reports_bad_input() {
        let mut out = Vec::new();
        let got = read_fromstr::<_, _, f64>(Cursor::new("\n"), &mut out, "? ", true).unwrap();
        assert_eq!(got, Ok(None));
        let got = read_fromstr::<_, _, f64>(Cursor::new("2.5\n"), &mut out, "? ", true).unwrap();
        assert_eq!(got, Ok(Some(2.5)));

        let mut out = Vec::new();
        let got = read_fromstr::<_, _, f64>(Cursor::new("abc\n"), &mut out, "? ", true).unwrap();
        assert!(got.is_err());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("abc\n^^^\nparse error:"), "{text}");
    }

    #[test]
    fn underline_marks_span() {
        let src = Arc::new(String::from("2 + |x|"));
        let mut out = Vec::new();
        underline(&mut out, &SubStr::new(Arc::clone(&src), 4, 1)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2 + |x|\n    ^\n");

        let mut out = Vec::new();
        underline(&mut out, &SubStr::end(src)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2 + |x|\n       ^\n");
    }

    #[test]
    fn plain_paint_is_verbatim() {
        let paint = Paint { enabled: false };
        let mut out = Vec::new();
        success(&mut out, paint, "result", "2*x").unwrap();
        error(&mut out, paint, "nope").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "result: 2*x\nerror: nope\n");
    }
}
