// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! LaTeX expression parser
//!
//! Recursive descent over a byte cursor. Precedence, lowest first:
//!
//! ```text
//! expr    := mul (('+' | '-') mul)*
//! mul     := factor (('\cdot' | <juxtaposition>) factor)*
//! factor  := '-' factor | postfix          ('-' before a digit is a literal)
//! postfix := primary ('!!' | '!' | '^' ('{' expr '}' | primary))*
//! primary := \frac{e}{e} | \binom{e}{e} | \sqrt{e} | \sin ARG | \cos ARG | \ln ARG
//!          | \lfloor e \rfloor | \lceil e \rceil | '|' e '|' | (-1)^{e} | F_{e}
//!          | '{' e '}' | '(' e ')' | VAR | INTEGER
//! ARG     := '{(' e ')}' | '(' e ')' | '{' e '}'
//! ```
//!
//! Spaces and the LaTeX spacing commands (`\,` `\;` `\!` `\:` `\ ` `\quad`
//! `\qquad`) are ignored between tokens.

use crate::ast::{BinaryOp, ExprNode, NodeRef, UnaryOp};
use thiserror::Error;

/// Letter bound to [`ExprNode::Var`] unless a parser is told otherwise
pub const CANONICAL_VAR: u8 = b'n';

/// Deepest accepted nesting of sub-expressions
pub const MAX_NESTING: usize = 200;

const SNIPPET_CHARS: usize = 20;

const SPACING_WORDS: [&str; 2] = ["\\qquad", "\\quad"];

// Commands that may start the right operand of an implicit product
const IMPLICIT_MUL_COMMANDS: [&str; 8] = [
    "\\frac", "\\binom", "\\sqrt", "\\sin", "\\cos", "\\ln", "\\lfloor", "\\lceil",
];

const FUNCTIONS: [(&str, UnaryOp); 3] = [
    ("\\sin", UnaryOp::Sin),
    ("\\cos", UnaryOp::Cos),
    ("\\ln", UnaryOp::Ln),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected token")]
    UnexpectedToken,

    #[error("expected {0:?}")]
    Expected(String),

    #[error("unexpected trailing input")]
    TrailingInput,

    #[error("invalid integer literal {0:?}")]
    InvalidInteger(String),

    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("expected \\sum_{{VAR=START}}^{{\\infty}}")]
    MissingSum,

    #[error("summation variable must be a single letter followed by '='")]
    InvalidSumVariable,

    #[error("missing series body")]
    MissingBody,
}

/// Parse failure with the byte offset where it was detected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset} near {snippet:?}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub offset: usize,
    /// Up to 20 characters of input starting at `offset`
    pub snippet: String,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let rest = source.get(offset..).unwrap_or_default();
        Self {
            kind,
            offset,
            snippet: snippet(rest),
        }
    }
}

fn snippet(rest: &str) -> String {
    let mut chars = rest.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Parse a complete LaTeX expression in the canonical variable `n`
pub fn parse_expr(source: &str) -> Result<NodeRef, SyntaxError> {
    LatexParser::new(source).parse_complete()
}

/// Cursor-based LaTeX parser
pub struct LatexParser<'a> {
    src: &'a str,
    pos: usize,
    var: u8,
    depth: usize,
}

impl<'a> LatexParser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_var(src, CANONICAL_VAR)
    }

    /// Parser that reads `var` as the bound variable
    pub fn with_var(src: &'a str, var: u8) -> Self {
        Self {
            src,
            pos: 0,
            var,
            depth: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.src.len());
    }

    pub fn remaining(&self) -> &'a str {
        self.src.get(self.pos..).unwrap_or_default()
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(kind, self.src, self.pos)
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn has_prefix(&self, token: &str) -> bool {
        self.remaining().starts_with(token)
    }

    /// Consume `token` if the input continues with it
    pub fn eat(&mut self, token: &str) -> bool {
        if self.has_prefix(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// Skip spaces, then require `token`
    pub fn expect(&mut self, token: &str) -> Result<(), SyntaxError> {
        self.skip_spaces();
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(SyntaxErrorKind::Expected(token.to_string())))
        }
    }

    pub fn skip_spaces(&mut self) {
        loop {
            let rest = self.remaining().as_bytes();
            match rest {
                [b, ..] if b.is_ascii_whitespace() => self.pos += 1,
                [b'\\', b',' | b';' | b'!' | b':' | b' ', ..] => self.pos += 2,
                [b'\\', ..] => match SPACING_WORDS.iter().find(|word| self.has_prefix(word)) {
                    Some(word) => self.pos += word.len(),
                    None => return,
                },
                _ => return,
            }
        }
    }

    /// Parse an expression and require the end of input
    pub fn parse_complete(&mut self) -> Result<NodeRef, SyntaxError> {
        let node = self.parse_expr()?;
        self.finish()?;
        Ok(node)
    }

    /// Require that only spacing is left
    pub fn finish(&mut self) -> Result<(), SyntaxError> {
        self.skip_spaces();
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.error(SyntaxErrorKind::TrailingInput))
        }
    }

    pub fn parse_expr(&mut self) -> Result<NodeRef, SyntaxError> {
        self.enter()?;
        let result = self.parse_additive();
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> Result<(), SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(SyntaxErrorKind::NestingTooDeep(MAX_NESTING)));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_additive(&mut self) -> Result<NodeRef, SyntaxError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            self.skip_spaces();
            let op = match self.peek() {
                Some(b'+') => BinaryOp::Add,
                Some(b'-') => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = ExprNode::binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<NodeRef, SyntaxError> {
        let mut left = self.parse_factor()?;
        loop {
            self.skip_spaces();
            if !self.eat("\\cdot") && !self.starts_implicit_operand() {
                return Ok(left);
            }
            let right = self.parse_factor()?;
            left = ExprNode::mul(left, right);
        }
    }

    fn starts_implicit_operand(&self) -> bool {
        match self.peek() {
            Some(b) if b.is_ascii_digit() || b == self.var || b == b'(' || b == b'{' => true,
            Some(b'F') => self.peek_at(1) == Some(b'_'),
            Some(b'\\') => IMPLICIT_MUL_COMMANDS.iter().any(|cmd| self.has_prefix(cmd)),
            _ => false,
        }
    }

    fn parse_factor(&mut self) -> Result<NodeRef, SyntaxError> {
        self.skip_spaces();
        let negative_literal = self.peek_at(1).is_some_and(|b| b.is_ascii_digit());
        if self.peek() == Some(b'-') && !negative_literal {
            self.pos += 1;
            self.enter()?;
            let child = self.parse_factor();
            self.depth -= 1;
            return Ok(ExprNode::neg(child?));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<NodeRef, SyntaxError> {
        let mut node = self.parse_primary()?;
        loop {
            let checkpoint = self.pos;
            self.skip_spaces();

            if self.eat("!!") {
                node = ExprNode::unary(UnaryOp::DoubleFactorial, node);
            } else if self.eat("!") {
                node = ExprNode::factorial(node);
            } else if self.eat("^") {
                self.skip_spaces();
                let exponent = if self.eat("{") {
                    self.parse_group("}")?
                } else {
                    self.parse_primary()?
                };
                node = ExprNode::pow(node, exponent);
            } else {
                self.pos = checkpoint;
                return Ok(node);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<NodeRef, SyntaxError> {
        self.skip_spaces();
        if self.is_at_end() {
            return Err(self.error(SyntaxErrorKind::UnexpectedEnd));
        }

        if self.eat("\\frac{") {
            let (numerator, denominator) = self.parse_two_groups()?;
            return Ok(ExprNode::div(numerator, denominator));
        }
        if self.eat("\\binom{") {
            let (top, bottom) = self.parse_two_groups()?;
            return Ok(ExprNode::binary(BinaryOp::Binomial, top, bottom));
        }
        if self.eat("\\sqrt{") {
            return self.parse_unary_group(UnaryOp::Sqrt, "}");
        }
        for (command, op) in FUNCTIONS {
            if self.eat(command) {
                let argument = self.parse_function_argument()?;
                return Ok(ExprNode::unary(op, argument));
            }
        }
        if self.eat("\\lfloor") {
            return self.parse_unary_group(UnaryOp::Floor, "\\rfloor");
        }
        if self.eat("\\lceil") {
            return self.parse_unary_group(UnaryOp::Ceil, "\\rceil");
        }
        if self.eat("|") {
            return self.parse_unary_group(UnaryOp::Abs, "|");
        }
        if self.eat("(-1)^{") {
            return self.parse_unary_group(UnaryOp::AltSign, "}");
        }
        if self.eat("F_{") {
            return self.parse_unary_group(UnaryOp::Fibonacci, "}");
        }
        if self.eat("{") {
            return self.parse_group("}");
        }
        if self.eat("(") {
            return self.parse_group(")");
        }

        match self.peek() {
            Some(b) if b == self.var => {
                self.pos += 1;
                Ok(ExprNode::var())
            }
            Some(b'-' | b'0'..=b'9') => self.parse_integer().map(ExprNode::constant),
            _ => Err(self.error(SyntaxErrorKind::UnexpectedToken)),
        }
    }

    fn parse_group(&mut self, close: &str) -> Result<NodeRef, SyntaxError> {
        let node = self.parse_expr()?;
        self.expect(close)?;
        Ok(node)
    }

    fn parse_unary_group(&mut self, op: UnaryOp, close: &str) -> Result<NodeRef, SyntaxError> {
        let child = self.parse_group(close)?;
        Ok(ExprNode::unary(op, child))
    }

    // Body of `{A}{B}` after the first opening brace
    fn parse_two_groups(&mut self) -> Result<(NodeRef, NodeRef), SyntaxError> {
        let first = self.parse_group("}")?;
        self.expect("{")?;
        let second = self.parse_group("}")?;
        Ok((first, second))
    }

    fn parse_function_argument(&mut self) -> Result<NodeRef, SyntaxError> {
        self.skip_spaces();
        if self.eat("{(") {
            let argument = self.parse_group(")")?;
            self.expect("}")?;
            Ok(argument)
        } else if self.eat("(") {
            self.parse_group(")")
        } else if self.eat("{") {
            self.parse_group("}")
        } else {
            Err(self.error(SyntaxErrorKind::Expected("(".to_string())))
        }
    }

    /// Optionally signed decimal integer that fits in `i64`
    pub fn parse_integer(&mut self) -> Result<i64, SyntaxError> {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut end = start;
        if bytes.get(end) == Some(&b'-') {
            end += 1;
        }
        let digits_start = end;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        if end == digits_start {
            return Err(self.error(SyntaxErrorKind::Expected("integer".to_string())));
        }

        let literal = &self.src[start..end];
        let value = literal
            .parse::<i64>()
            .map_err(|_| self.error(SyntaxErrorKind::InvalidInteger(literal.to_string())))?;
        self.pos = end;
        Ok(value)
    }
}
