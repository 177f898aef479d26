// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    /// Zero-width span just past the end of `src`.
    pub fn end(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, len, 0)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    Equals,
    Comma,
    OpenParen,
    CloseParen,

    // unsupported tokens
    XGreater,
    XLess,
    XPipe,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident
            | Self::Number
            | Self::Op(_)
            | Self::Equals
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen => false,

            Self::XGreater
            | Self::XLess
            | Self::XPipe
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    /// Whether a `-` or `+` after this token is a sign rather than a binary
    /// operator.
    const fn expects_operand(prev: Option<TokTyp>) -> bool {
        match prev {
            None => true,
            Some(typ) => matches!(
                typ,
                Self::Op(_) | Self::Equals | Self::Comma | Self::OpenParen
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    prev: Option<TokTyp>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            prev: None,
            has_errored: false,
        }
    }

    fn span(&self, start: usize, len: usize) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, len)
    }

    pub fn trim_whitespace(&mut self) {
        while self.cur.next_if(|(_, chr)| chr.is_whitespace()).is_some() {}
    }

    pub fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '^' => TokTyp::Op(OperatorTyp::Pow),
            '=' => TokTyp::Equals,
            ',' => TokTyp::Comma,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,

            '>' => TokTyp::XGreater,
            '<' => TokTyp::XLess,
            '|' => TokTyp::XPipe,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,
            '{' => TokTyp::XOpenCurly,
            '}' => TokTyp::XCloseCurly,
            _ => return None,
        };
        self.cur.next();
        let mut tok = Tok {
            typ,
            loc: self.span(idx, 1),
        };
        // `**` is exponentiation
        if chr == '*' && self.cur.next_if(|(_, next)| *next == '*').is_some() {
            tok.typ = TokTyp::Op(OperatorTyp::Pow);
            tok.loc.shift_right(1);
        }
        Some(tok)
    }

    /// Gather a token whose first character satisfies `first` and whose
    /// remaining characters satisfy `rest`.
    pub fn consume_by<P, Q>(&mut self, typ: TokTyp, first: P, rest: Q) -> Option<Tok>
    where
        P: Fn(char) -> bool,
        Q: Fn(char) -> bool,
    {
        let (idx, _) = self.cur.next_if(|(_, chr)| first(*chr))?;
        let mut end = self.src.len();
        while self.cur.next_if(|(_, chr)| rest(*chr)).is_some() {}
        if let Some((next_idx, _)) = self.cur.peek() {
            end = *next_idx;
        }
        Some(Tok {
            typ,
            loc: self.span(idx, end - idx),
        })
    }

    fn next_tok(&mut self) -> Option<Result<Tok, LexErr>> {
        loop {
            self.trim_whitespace();
            let (next_idx, next_chr) = self.cur.peek().copied()?;

            if let Some(tok) = self.consume_unambiguous() {
                if tok.typ.is_unsupported() {
                    self.has_errored = true;
                    return Some(Err(LexErr {
                        typ: LexErrTyp::Unsupported(tok.typ),
                        loc: tok.loc,
                    }));
                }
                return Some(Ok(tok));
            }

            if next_chr == '-' || next_chr == '+' {
                self.cur.next();
                let sign = TokTyp::expects_operand(self.prev);
                let typ = match (next_chr, sign) {
                    // unary plus is a no-op
                    ('+', true) => continue,
                    ('+', false) => OperatorTyp::Add,
                    (_, true) => OperatorTyp::Neg,
                    (_, false) => OperatorTyp::Sub,
                };
                return Some(Ok(Tok {
                    typ: TokTyp::Op(typ),
                    loc: self.span(next_idx, 1),
                }));
            }

            if let Some(tok) = self.consume_by(
                TokTyp::Ident,
                |chr| chr.is_ascii_alphabetic(),
                |chr| chr.is_ascii_alphanumeric() || chr == '_',
            ) {
                return Some(Ok(tok));
            }

            if let Some(tok) = self.consume_by(
                TokTyp::Number,
                |chr| chr.is_ascii_digit() || chr == '.',
                |chr| chr.is_ascii_digit() || chr == '.',
            ) {
                return Some(Ok(tok));
            }

            self.has_errored = true;
            return Some(Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                loc: self.span(next_idx, next_chr.len_utf8()),
            }));
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }
        let ret = self.next_tok();
        if let Some(Ok(ref tok)) = ret {
            self.prev = Some(tok.typ);
        }
        ret
    }
}
