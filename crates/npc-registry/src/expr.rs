//! Expression syntax shared by the condition and node-type parsers.
//!
//! ```text
//! expr   := name params? args?
//! params := '{' text '}'                 text may contain nested braces
//! args   := '(' [ expr { ',' expr } ] ')'
//! name   := [A-Za-z0-9_]+
//! ```
//!
//! Whitespace is allowed between tokens.  Parameter text is kept verbatim
//! (trimmed); each factory interprets its own parameters.  Expressions nest
//! at most [`MAX_DEPTH`] levels deep.

use std::fmt;

use crate::error::{LoaderError, LoaderResult};

pub const MAX_DEPTH: usize = 64;

/// A parsed `Name{params}(args)` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub name:       String,
    pub parameters: String,
    pub args:       Vec<Expr>,
    /// Byte offset of `name` in the source text.
    pub position:   usize,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.parameters.is_empty() {
            write!(f, "{{{}}}", self.parameters)?;
        }
        if !self.args.is_empty() {
            f.write_str("(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Parse one complete expression; trailing input is an error.
pub fn parse(text: &str) -> LoaderResult<Expr> {
    let mut cursor = Cursor { text, pos: 0, depth: 0 };
    let expr = cursor.expr()?;
    cursor.skip_ws();
    if cursor.pos < text.len() {
        return Err(cursor.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Cursor<'a> {
    text:  &'a str,
    pos:   usize,
    depth: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> LoaderError {
        syntax(self.pos, message)
    }

    fn name(&mut self) -> LoaderResult<(String, usize)> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected a type name, found {c:?}")),
                None => self.error("expected a type name, found end of input"),
            });
        }
        Ok((self.text[start..self.pos].to_string(), start))
    }

    fn params(&mut self) -> LoaderResult<String> {
        let open = self.pos;
        self.bump();
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.text[start..self.pos - 1].trim().to_string());
                    }
                }
                _ => {}
            }
        }
        Err(syntax(open, "unclosed '{'"))
    }

    fn args(&mut self) -> LoaderResult<Vec<Expr>> {
        let open = self.pos;
        self.bump();
        let mut args = Vec::new();
        self.skip_ws();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {
                    self.bump();
                    return Ok(args);
                }
                Some(c) => return Err(self.error(format!("expected ',' or ')', found {c:?}"))),
                None => return Err(syntax(open, "unclosed '('")),
            }
        }
    }

    fn expr(&mut self) -> LoaderResult<Expr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            self.skip_ws();
            return Err(self.error(format!("nesting deeper than {MAX_DEPTH} levels")));
        }
        let (name, position) = self.name()?;
        self.skip_ws();
        let parameters = if self.peek() == Some('{') { self.params()? } else { String::new() };
        self.skip_ws();
        let args = if self.peek() == Some('(') { self.args()? } else { Vec::new() };
        self.depth -= 1;
        Ok(Expr { name, parameters, args, position })
    }
}

fn syntax(position: usize, message: impl Into<String>) -> LoaderError {
    LoaderError::Syntax { position, message: message.into() }
}
