// SPDX: CC0-1.0

pub mod calc;
pub mod calculus;
pub mod config;
pub mod eval;
pub mod expr;
pub mod history;
pub mod lex;
pub mod parse;
pub mod plot;
pub mod poly;
pub mod session;
pub mod shell;
pub mod simplify;
pub mod solve;
pub mod stdlib;

use core::{fmt, ops::Range};

pub type Number = f64;

/// Region of the plane sampled by the text plotter, and the size of the
/// character grid it is rasterized onto.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    pub x: Range<Number>,
    pub width: usize,
    pub height: usize,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("x range", &self.x)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
