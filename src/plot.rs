// SPDX: CC0-1.0

//! Text-grid rasterizer for real functions.
//!
//! Every function is sampled on the same evenly spaced x grid and the
//! samples are thresholded row by row: a cell is filled when a function's
//! value at that column reaches the row's level. Overlaps go to the function
//! registered first.

use crate::{Number, Window};
use colored::{Color, Colorize};
use core::{fmt, ops::Range};
use log::debug;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub color: Color,
}

impl Glyph {
    pub const fn new(ch: char, color: Color) -> Self {
        Self { ch, color }
    }
}

pub const PALETTE: [Glyph; 4] = [
    Glyph::new('█', Color::Blue),
    Glyph::new('▓', Color::Green),
    Glyph::new('▒', Color::Magenta),
    Glyph::new('░', Color::Cyan),
];

/// Characters and colors for each function, cycled by index. An empty list
/// falls back to [`PALETTE`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style {
    pub chars: Vec<char>,
    pub colors: Vec<Color>,
}

impl Style {
    pub fn glyph(&self, idx: usize) -> Glyph {
        let fallback = PALETTE[idx % PALETTE.len()];
        let pick = |len: usize| idx % len.max(1);
        Glyph {
            ch: self.chars.get(pick(self.chars.len())).copied().unwrap_or(fallback.ch),
            color: self
                .colors
                .get(pick(self.colors.len()))
                .copied()
                .unwrap_or(fallback.color),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlotErr {
    #[error("invalid x range: {min} must be less than {max}")]
    InvalidRange { min: Number, max: Number },

    #[error("invalid grid size {width}x{height}: both must be at least 1")]
    InvalidDimension { width: usize, height: usize },

    #[error("no function could be evaluated anywhere on the x range")]
    EvaluationFailure,

    #[error("nothing to plot")]
    NoFunctions,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    /// Top row first.
    pub rows: Vec<Vec<Option<Glyph>>>,
    pub x: Range<Number>,
    pub y: Range<Number>,
}

impl Grid {
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Rows without color.
    pub fn lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.map_or(' ', |g| g.ch)).collect())
            .collect()
    }
}

/// `width` evenly spaced points from `x.start` to `x.end` inclusive.
pub fn samples(x: &Range<Number>, width: usize) -> Vec<Number> {
    match width {
        0 => Vec::new(),
        1 => vec![x.start],
        _ => {
            let step = (x.end - x.start) / (width - 1) as Number;
            let mut xs: Vec<Number> = (0..width).map(|i| x.start + step * i as Number).collect();
            // no rounding drift on the right edge
            if let Some(last) = xs.last_mut() {
                *last = x.end;
            }
            xs
        }
    }
}

pub fn render<F, E>(functions: &[F], window: &Window, style: &Style) -> Result<Grid, PlotErr>
where
    F: Fn(Number) -> Result<Number, E>,
    E: fmt::Display,
{
    let Window { x, width, height } = window;
    let (width, height) = (*width, *height);
    // also rejects NaN bounds
    if !(x.start < x.end) {
        return Err(PlotErr::InvalidRange {
            min: x.start,
            max: x.end,
        });
    }
    if width == 0 || height == 0 {
        return Err(PlotErr::InvalidDimension { width, height });
    }
    if functions.is_empty() {
        return Err(PlotErr::NoFunctions);
    }

    let xs = samples(x, width);
    let ys: Vec<Vec<Number>> = functions
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            xs.iter()
                .map(|&at| match f(at) {
                    Ok(y) if y.is_finite() => y,
                    Ok(y) => {
                        debug!("function {idx} is {y} at x = {at}, leaving the cell blank");
                        Number::NAN
                    }
                    Err(err) => {
                        debug!("function {idx} failed at x = {at}: {err}");
                        Number::NAN
                    }
                })
                .collect()
        })
        .collect();

    let (y_min, y_max) = ys
        .iter()
        .flatten()
        .filter(|y| y.is_finite())
        .fold(None, |acc: Option<(Number, Number)>, &y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
        .ok_or(PlotErr::EvaluationFailure)?;
    let range = if y_max == y_min { 1.0 } else { y_max - y_min };

    let rows = (1..=height)
        .rev()
        .map(|r| {
            let threshold = y_min + range * r as Number / height as Number;
            (0..width)
                .map(|col| {
                    ys.iter()
                        .position(|f| f[col] >= threshold)
                        .map(|idx| style.glyph(idx))
                })
                .collect()
        })
        .collect();

    Ok(Grid {
        rows,
        x: x.clone(),
        y: y_min..y_max,
    })
}

/// Frame, rows and an axis annotation; `height + 3` lines in all.
pub fn write<W: Write>(mut out: W, grid: &Grid, color: bool) -> io::Result<()> {
    let border = format!("+{}+", "-".repeat(grid.width()));
    let paint = |text: &str, c: Color| {
        if color {
            text.color(c).to_string()
        } else {
            text.to_string()
        }
    };

    writeln!(out, "{}", paint(&border, Color::Cyan))?;
    for row in &grid.rows {
        let mut line = String::from("|");
        for cell in row {
            match cell {
                Some(g) => line.push_str(&paint(&g.ch.to_string(), g.color)),
                None => line.push(' '),
            }
        }
        line.push('|');
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{}", paint(&border, Color::Cyan))?;
    writeln!(
        out,
        "{}",
        paint(
            &format!(
                "x: {} → {}, y: {:.2} → {:.2}",
                grid.x.start, grid.x.end, grid.y.start, grid.y.end
            ),
            Color::Yellow
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    type Fun = Box<dyn Fn(Number) -> Result<Number, String>>;

    fn window(x: Range<Number>, width: usize, height: usize) -> Window {
        Window { x, width, height }
    }

    fn fun(f: impl Fn(Number) -> Number + 'static) -> Fun {
        Box::new(move |x: Number| Ok(f(x)))
    }

    #[test]
    fn samples_cover_both_ends() {
        let xs = samples(&(0.0..10.0), 5);
        assert_eq!(xs, [0.0, 2.5, 5.0, 7.5, 10.0]);
        let xs = samples(&(-1.0..0.3), 7);
        assert_eq!(xs.first(), Some(&-1.0));
        assert_eq!(xs.last(), Some(&0.3));
        assert_eq!(samples(&(3.0..4.0), 1), [3.0]);
    }

    #[test]
    fn identity_fixture() {
        let grid = render(&[fun(|x| x)], &window(0.0..10.0, 5, 3), &Style::default()).unwrap();
        assert_eq!(grid.lines(), ["    █", "   ██", "  ███"]);
        assert_eq!(grid.y, 0.0..10.0);
        assert_eq!(grid.rows[0][4], Some(PALETTE[0]));
    }

    #[test]
    fn constant_rows_are_uniform() {
        let grid = render(&[fun(|_| 2.0)], &window(-5.0..5.0, 12, 4), &Style::default()).unwrap();
        for line in grid.lines() {
            let first = line.chars().next().unwrap();
            assert!(line.chars().all(|c| c == first), "{line:?}");
        }
        assert_eq!(grid.y, 2.0..2.0);
    }

    #[test]
    fn first_registered_function_wins() {
        let fs = [fun(|x| x), fun(|x| -x)];
        let grid = render(&fs, &window(-2.0..2.0, 5, 2), &Style::default()).unwrap();
        // -x owns the left, x wins the tie at the center
        assert_eq!(grid.lines(), ["▓   █", "▓▓███"]);

        let fs = [fun(|_| 1.0), fun(|_| 1.0), fun(|_| 0.0)];
        let grid = render(&fs, &window(0.0..1.0, 3, 2), &Style::default()).unwrap();
        assert_eq!(grid.lines(), ["███", "███"]);
    }

    #[test]
    fn invalid_inputs_fail_before_sampling() {
        let style = Style::default();
        let panics = || -> Fun { Box::new(|_: Number| -> Result<Number, String> { panic!("sampled") }) };
        assert_eq!(
            render(&[panics()], &window(5.0..5.0, 10, 10), &style),
            Err(PlotErr::InvalidRange { min: 5.0, max: 5.0 })
        );
        assert_eq!(
            render(&[panics()], &window(0.0..10.0, 0, 10), &style),
            Err(PlotErr::InvalidDimension {
                width: 0,
                height: 10
            })
        );
        assert!(matches!(
            render(&[panics()], &window(Number::NAN..1.0, 3, 3), &style),
            Err(PlotErr::InvalidRange { .. })
        ));
        assert_eq!(
            render::<Fun, String>(&[], &window(0.0..1.0, 3, 3), &style),
            Err(PlotErr::NoFunctions)
        );
    }

    #[test]
    fn failed_samples_stay_blank() {
        let f: Fun = Box::new(|x: Number| {
            if x < 0.0 {
                Err(String::from("undefined"))
            } else {
                Ok(x)
            }
        });
        let grid = render(&[f], &window(-2.0..2.0, 5, 2), &Style::default()).unwrap();
        assert_eq!(grid.lines(), ["    █", "   ██"]);
        assert_relative_eq!(grid.y.start, 0.0);
        assert_relative_eq!(grid.y.end, 2.0);
    }

    #[test]
    fn infinite_samples_do_not_stretch_the_range() {
        let grid = render(
            &[fun(|x| 1.0 / x)],
            &window(0.0..2.0, 3, 2),
            &Style::default(),
        )
        .unwrap();
        assert_eq!(grid.y, 0.5..1.0);
    }

    #[test]
    fn nothing_finite_is_an_error() {
        let f: Fun = Box::new(|_: Number| Err(String::from("nope")));
        assert_eq!(
            render(&[f], &window(0.0..1.0, 4, 4), &Style::default()),
            Err(PlotErr::EvaluationFailure)
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let w = window(-3.0..3.0, 40, 10);
        let a = render(&[fun(f64::sin)], &w, &Style::default()).unwrap();
        let b = render(&[fun(f64::sin)], &w, &Style::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn style_cycles_independently() {
        let style = Style {
            chars: vec!['*', '+'],
            colors: vec![Color::Red],
        };
        assert_eq!(style.glyph(0), Glyph::new('*', Color::Red));
        assert_eq!(style.glyph(3), Glyph::new('+', Color::Red));
        assert_eq!(Style::default().glyph(5), PALETTE[1]);
    }

    #[test]
    fn writes_frame_and_annotation() {
        let grid = render(&[fun(|x| x)], &window(0.0..10.0, 5, 3), &Style::default()).unwrap();
        let mut out = Vec::new();
        write(&mut out, &grid, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            [
                "+-----+",
                "|    █|",
                "|   ██|",
                "|  ███|",
                "+-----+",
                "x: 0 → 10, y: 0.00 → 10.00",
            ]
        );
    }
}
