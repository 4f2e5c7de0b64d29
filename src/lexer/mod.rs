//! Layout-aware lexer.
//!
//! The lexer is pulled one token at a time by the parser, which always
//! passes back the previously-returned token as context (used here for the
//! regex-vs-division and signed-numeral disambiguations, and to detect
//! layout-opening keywords). Layout is not a state machine over bytes: it is
//! a bounded stack of `{opener, column}` frames threaded alongside ordinary
//! scanning, per the off-side rule in the design notes.
//!
//! A single call to [`Lexer::next`] may need to emit more than one token
//! (e.g. two dedents in a row produce two synthetic `end`s before the real
//! token that triggered them); those are queued in `pending` and drained
//! before any new scanning happens.

mod token;

pub use token::{Op, Token, TokenData};

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Position;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnmatchedToken(Position),
    MalformedNumber(String, Position),
    MalformedString(String, Position),
    MalformedRegex(String, Position),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnmatchedToken(pos) => {
                write!(f, "{pos}: Unmatched token on line {}, column {}", pos.line, pos.column)
            }
            LexError::MalformedNumber(text, pos) => {
                write!(f, "{pos}: Malformed numeric literal near '{text}'")
            }
            LexError::MalformedString(msg, pos) => write!(f, "{pos}: Malformed string literal: {msg}"),
            LexError::MalformedRegex(msg, pos) => write!(f, "{pos}: Malformed regex literal: {msg}"),
        }
    }
}

impl StdError for LexError {}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnmatchedToken(pos)
            | LexError::MalformedNumber(_, pos)
            | LexError::MalformedString(_, pos)
            | LexError::MalformedRegex(_, pos) => *pos,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][-+]?[0-9]+)?").unwrap());

struct LayoutFrame {
    opener: Op,
    column: usize,
}

/// One line-terminator check shared by whitespace-skipping and column
/// bookkeeping; covers the common Unicode line-break characters.
fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '$' || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '$' || c == '_'
}

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    layout: Vec<LayoutFrame>,
    pending: VecDeque<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            offset: 0,
            line: 1,
            column: 1,
            layout: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        match c {
            '\r' => {
                if self.peek() != Some('\n') {
                    self.line += 1;
                    self.column = 1;
                }
            }
            c if is_line_terminator(c) => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => {
                self.column = ((self.column - 1) / 8 + 1) * 8 + 1;
            }
            _ => {
                self.column += 1;
            }
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if is_line_terminator(c) => {
                    self.bump();
                }
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if is_line_terminator(c) {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Pulls the next token, given the previously-returned token as
    /// disambiguation/layout context.
    pub fn next(&mut self, prev: &Token) -> LexResult<Token> {
        if let Some(tok) = self.pending.pop_front() {
            return Ok(tok);
        }

        self.skip_trivia();

        if self.peek().is_none() {
            self.flush_layout();
            self.pending.push_back(Token::eof(self.line, self.column));
            return Ok(self.pending.pop_front().unwrap());
        }

        let start_line = self.line;
        let start_column = self.column;
        let tok = self.scan_token(prev, start_line, start_column)?;

        if prev.op.is_layout_opener() {
            self.layout.push(LayoutFrame {
                opener: prev.op,
                column: start_column,
            });
            return Ok(tok);
        }

        if matches!(tok.op, Op::End | Op::In) {
            self.layout.pop();
            return Ok(tok);
        }

        let mut last_op = prev.op;
        loop {
            let Some(frame_column) = self.layout.last().map(|f| f.column) else {
                break;
            };
            if start_column > frame_column {
                break;
            } else if start_column == frame_column {
                if last_op != Op::Semi {
                    self.pending
                        .push_back(Token::new(Op::Semi, TokenData::None, start_line, start_column));
                }
                break;
            } else {
                let frame = self.layout.pop().unwrap();
                let closer = if frame.opener == Op::Let { Op::In } else { Op::End };
                self.pending
                    .push_back(Token::new(closer, TokenData::None, start_line, start_column));
                last_op = closer;
            }
        }

        self.pending.push_back(tok);
        Ok(self.pending.pop_front().unwrap())
    }

    fn flush_layout(&mut self) {
        while let Some(frame) = self.layout.pop() {
            let closer = if frame.opener == Op::Let { Op::In } else { Op::End };
            self.pending
                .push_back(Token::new(closer, TokenData::None, self.line, self.column));
        }
    }

    fn scan_token(&mut self, prev: &Token, line: usize, column: usize) -> LexResult<Token> {
        let rest = &self.source[self.offset..];

        if self.looks_like_number(rest, prev) {
            return self.scan_number(line, column);
        }
        if let Some(tok) = self.scan_operator(rest, line, column) {
            return Ok(tok);
        }
        if rest.starts_with('"') {
            return self.scan_string(line, column);
        }
        if rest.starts_with('/') {
            return self.scan_slash(prev, line, column);
        }
        if rest.chars().next().map(is_ident_start).unwrap_or(false) {
            return Ok(self.scan_ident(line, column));
        }
        Err(LexError::UnmatchedToken(Position::new(line, column)))
    }

    fn looks_like_number(&self, rest: &str, prev: &Token) -> bool {
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('-') if !prev.ends_value() => matches!(chars.next(), Some(c) if c.is_ascii_digit()),
            _ => false,
        }
    }

    fn scan_number(&mut self, line: usize, column: usize) -> LexResult<Token> {
        let rest = &self.source[self.offset..];
        let m = NUMBER_RE
            .find(rest)
            .ok_or_else(|| LexError::MalformedNumber(rest.chars().take(16).collect(), Position::new(line, column)))?;
        let text = m.as_str().to_string();
        for _ in 0..text.chars().count() {
            self.bump();
        }
        let is_float = text.contains('.') || text.contains('e') || text.contains('E');
        let value = if is_float {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| LexError::MalformedNumber(text.clone(), Position::new(line, column)))?
        } else {
            text.parse::<i32>()
                .map(Value::Int)
                .map_err(|_| LexError::MalformedNumber(text.clone(), Position::new(line, column)))?
        };
        Ok(Token::new(Op::Lit, TokenData::Lit(value), line, column))
    }

    const MULTI_OPS: &'static [(&'static str, Op)] = &[
        ("->", Op::Arrow),
        ("<=", Op::Le),
        ("=<", Op::Le),
        (">=", Op::Ge),
        ("==", Op::EqEq),
        ("!=", Op::Ne),
    ];

    const SINGLE_OPS: &'static [(char, Op)] = &[
        ('(', Op::LParen),
        (')', Op::RParen),
        ('[', Op::LBracket),
        (']', Op::RBracket),
        ('{', Op::LBrace),
        ('}', Op::RBrace),
        (',', Op::Comma),
        (':', Op::Colon),
        (';', Op::Semi),
        ('=', Op::Assign),
        ('<', Op::Lt),
        ('>', Op::Gt),
        ('+', Op::Plus),
        ('-', Op::Minus),
        ('*', Op::Star),
        ('~', Op::Tilde),
        ('@', Op::At),
        ('\\', Op::Backslash),
    ];

    fn scan_operator(&mut self, rest: &str, line: usize, column: usize) -> Option<Token> {
        for (lexeme, op) in Self::MULTI_OPS {
            if rest.starts_with(lexeme) {
                for _ in 0..lexeme.chars().count() {
                    self.bump();
                }
                return Some(Token::new(*op, TokenData::None, line, column));
            }
        }
        let c = rest.chars().next()?;
        let (_, op) = Self::SINGLE_OPS.iter().find(|(ch, _)| *ch == c)?;
        self.bump();
        Some(Token::new(*op, TokenData::None, line, column))
    }

    fn scan_string(&mut self, line: usize, column: usize) -> LexResult<Token> {
        self.bump(); // opening quote
        let mut decoded = String::new();
        loop {
            let pos = Position::new(line, column);
            let Some(c) = self.peek() else {
                return Err(LexError::MalformedString("unterminated string literal".into(), pos));
            };
            match c {
                '"' => {
                    self.bump();
                    break;
                }
                '\\' => {
                    self.bump();
                    let Some(esc) = self.peek() else {
                        return Err(LexError::MalformedString("unterminated escape".into(), pos));
                    };
                    self.bump();
                    match esc {
                        '"' => decoded.push('"'),
                        '\\' => decoded.push('\\'),
                        '/' => decoded.push('/'),
                        'b' => decoded.push('\u{8}'),
                        'f' => decoded.push('\u{c}'),
                        'n' => decoded.push('\n'),
                        'r' => decoded.push('\r'),
                        't' => decoded.push('\t'),
                        'u' => {
                            let mut code = 0u32;
                            for _ in 0..4 {
                                let Some(h) = self.peek() else {
                                    return Err(LexError::MalformedString("incomplete \\u escape".into(), pos));
                                };
                                let digit = h
                                    .to_digit(16)
                                    .ok_or_else(|| LexError::MalformedString("invalid \\u escape".into(), pos))?;
                                code = code * 16 + digit;
                                self.bump();
                            }
                            let ch = char::from_u32(code)
                                .ok_or_else(|| LexError::MalformedString("invalid unicode code point".into(), pos))?;
                            decoded.push(ch);
                        }
                        other => {
                            return Err(LexError::MalformedString(format!("unknown escape '\\{other}'"), pos))
                        }
                    }
                }
                _ => {
                    decoded.push(c);
                    self.bump();
                }
            }
        }
        Ok(Token::new(Op::Lit, TokenData::Lit(Value::Str(decoded)), line, column))
    }

    fn scan_slash(&mut self, prev: &Token, line: usize, column: usize) -> LexResult<Token> {
        if prev.ends_value() {
            self.bump();
            return Ok(Token::new(Op::Slash, TokenData::None, line, column));
        }

        self.bump(); // opening '/'
        let mut pattern = String::new();
        loop {
            let pos = Position::new(line, column);
            match self.peek() {
                None => return Err(LexError::MalformedRegex("unterminated regex literal".into(), pos)),
                Some(c) if is_line_terminator(c) => {
                    return Err(LexError::MalformedRegex("newline in regex literal".into(), pos))
                }
                Some('/') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        Some('/') => {
                            pattern.push('/');
                            self.bump();
                        }
                        Some(other) => {
                            pattern.push('\\');
                            pattern.push(other);
                            self.bump();
                        }
                        None => {
                            return Err(LexError::MalformedRegex(
                                "unterminated escape in regex literal".into(),
                                pos,
                            ))
                        }
                    }
                }
                Some(c) => {
                    pattern.push(c);
                    self.bump();
                }
            }
        }
        Ok(Token::new(Op::Regex, TokenData::Regex(pattern), line, column))
    }

    fn scan_ident(&mut self, line: usize, column: usize) -> Token {
        let start = self.offset;
        self.bump();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.offset];
        if let Some(op) = token::KEYWORDS.get(text) {
            return Token::new(*op, TokenData::None, line, column);
        }
        match text {
            "true" => Token::new(Op::Lit, TokenData::Lit(Value::Bool(true)), line, column),
            "false" => Token::new(Op::Lit, TokenData::Lit(Value::Bool(false)), line, column),
            "null" => Token::new(Op::Lit, TokenData::Lit(Value::Null), line, column),
            _ => Token::new(Op::Ident, TokenData::Ident(text.to_string()), line, column),
        }
    }
}

/// Drives a full pull loop over `source`, collecting every token including
/// the trailing `eof`. Convenience for tooling (`--dump-tokens`) and tests.
pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut prev = Token::bof();
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next(&prev)?;
        let done = tok.op == Op::Eof;
        tokens.push(tok.clone());
        prev = tok;
        if done {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(source: &str) -> Vec<Op> {
        tokenize(source).unwrap().into_iter().map(|t| t.op).collect()
    }

    #[test]
    fn division_vs_regex() {
        let toks = tokenize("x / 2 ; y = /a*/").unwrap();
        let ops: Vec<Op> = toks.iter().map(|t| t.op).collect();
        assert_eq!(
            ops,
            vec![Op::Ident, Op::Slash, Op::Lit, Op::Semi, Op::Ident, Op::Assign, Op::Regex, Op::Eof]
        );
        match &toks[6].data {
            TokenData::Regex(pattern) => assert_eq!(pattern, "a*"),
            other => panic!("expected regex payload, got {other:?}"),
        }
    }

    #[test]
    fn off_side_block_inserts_separators_and_closer() {
        let source = "do\n  x = 1\n  y = 2\n  x + y\n";
        let ops = ops(source);
        assert_eq!(
            ops,
            vec![
                Op::Do,
                Op::Ident,
                Op::Assign,
                Op::Lit,
                Op::Semi,
                Op::Ident,
                Op::Assign,
                Op::Lit,
                Op::Semi,
                Op::Ident,
                Op::Plus,
                Op::Ident,
                Op::End,
                Op::Eof,
            ]
        );
    }

    #[test]
    fn tab_stops_advance_to_next_multiple_of_eight() {
        let mut lexer = Lexer::new("\tx");
        let tok = lexer.next(&Token::bof()).unwrap();
        assert_eq!(tok.column, 9);
        let _ = lexer;
        let _ = tok;
    }

    #[test]
    fn explicit_end_pops_frame_without_double_close() {
        let ops = ops("do x = 1 end");
        assert_eq!(
            ops,
            vec![Op::Do, Op::Ident, Op::Assign, Op::Lit, Op::End, Op::Eof]
        );
    }

    #[test]
    fn signed_numeral_vs_binary_minus() {
        assert_eq!(ops("-1"), vec![Op::Lit, Op::Eof]);
        assert_eq!(ops("x - 1"), vec![Op::Ident, Op::Minus, Op::Lit, Op::Eof]);
        assert_eq!(ops("(1)-1"), vec![Op::LParen, Op::Lit, Op::RParen, Op::Minus, Op::Lit, Op::Eof]);
    }

    #[test]
    fn unmatched_byte_is_an_error() {
        assert!(tokenize("x `").is_err());
    }
}
