use std::{str::FromStr, sync::Arc};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use regex::Regex;

use crate::{
    ast::{Expression, StringPart},
    error::ParseError,
    interpreter::{
        lexer::Lexer,
        parser::core::{ParseResult, Parser, Precedence},
        token::{Token, TokenKind, interpolation_end},
    },
};

impl Parser<'_> {
    /// Parses a comma-separated list of items until a closing token.
    ///
    /// This utility is shared by list literals, call argument lists and the
    /// brace literals. `cur` must be on the opening delimiter. For each item
    /// the parser is moved onto the item's first token and `parse_item` is
    /// invoked; afterwards either a comma or `closing` must follow.
    ///
    /// An immediately encountered closing token produces no items, and a
    /// comma right before the closing token is accepted. Items may span
    /// several lines.
    ///
    /// Grammar (simplified): `list := (item ("," item)* ","?)?`
    ///
    /// # Parameters
    /// - `closing`: The token kind that terminates the list (e.g. `]`).
    /// - `parse_item`: Parses one element, leaving `cur` on its last token.
    ///
    /// # Returns
    /// The number of items parsed; `cur` is left on `closing`.
    ///
    /// # Errors
    /// Returns a [`ParseError`] if:
    /// - an item fails to parse,
    /// - an unexpected token is encountered,
    /// - the input ends before the closing token.
    pub(super) fn parse_comma_separated<F>(&mut self,
                                           closing: TokenKind,
                                           mut parse_item: F)
                                           -> ParseResult<usize>
        where F: FnMut(&mut Self) -> ParseResult<()>
    {
        let mut count = 0;
        if self.peek_is(closing) {
            self.advance();
            return Ok(count);
        }

        loop {
            self.advance();
            parse_item(self)?;
            count += 1;

            if self.peek_is(TokenKind::Comma) {
                self.advance();
                if self.peek_is(closing) {
                    self.advance();
                    return Ok(count);
                }
                continue;
            }
            if self.peek_is(closing) {
                self.advance();
                return Ok(count);
            }
            return Err(self.unexpected(&self.peek, &format!("',' or '{}'", closing.symbol())));
        }
    }

    /// Decodes a numeric literal token.
    ///
    /// Underscores are digit separators. Decimal integers that overflow
    /// 64 bits become big integers; floats outside the `f64` range become
    /// big decimals; radix literals that overflow become big integers.
    ///
    /// # Errors
    /// Returns [`ParseError::InvalidLiteral`] if the digits do not form a
    /// number, or if an unsigned literal exceeds 64 bits.
    pub(super) fn parse_number(&self, token: Token) -> ParseResult<Expression> {
        let digits = token.literal.replace('_', "");

        let expression = match token.kind {
            TokenKind::Int => match digits.parse::<i64>() {
                Ok(value) => Expression::Integer { token, value },
                Err(_) => {
                    let value = BigInt::from_str(&digits).map_err(|_| invalid_literal(&token, "not an integer"))?;
                    Expression::BigInteger { token,
                                             value: Arc::new(value) }
                },
            },
            TokenKind::Float => {
                let value = digits.parse::<f64>().map_err(|_| invalid_literal(&token, "not a float"))?;
                if value.is_finite() {
                    Expression::Float { token, value }
                } else {
                    let value =
                        BigDecimal::from_str(&digits).map_err(|_| invalid_literal(&token, "not a float"))?;
                    Expression::BigFloat { token,
                                           value: Arc::new(value) }
                }
            },
            TokenKind::UInt => {
                let value = digits[2..].parse::<u64>()
                                       .map_err(|_| invalid_literal(&token, "out of range for an unsigned integer"))?;
                Expression::UInteger { token, value }
            },
            kind => {
                let radix = match kind {
                    TokenKind::Hex => 16,
                    TokenKind::Octal => 8,
                    _ => 2,
                };
                let body = &digits[2..];
                match u64::from_str_radix(body, radix) {
                    Ok(value) => match kind {
                        TokenKind::Hex => Expression::Hex { token, value },
                        TokenKind::Octal => Expression::Octal { token, value },
                        _ => Expression::Binary { token, value },
                    },
                    Err(_) => {
                        let value = BigInt::parse_bytes(body.as_bytes(), radix)
                                    .ok_or_else(|| invalid_literal(&token, "malformed digits"))?;
                        Expression::BigInteger { token,
                                                 value: Arc::new(value) }
                    },
                }
            },
        };

        Ok(expression)
    }

    /// Builds a string literal, splitting out `#{...}` interpolations.
    ///
    /// Raw strings are never interpolated. Each interpolated region must be
    /// exactly one expression.
    pub(super) fn parse_string(&self, token: Token) -> ParseResult<Expression> {
        if token.is(TokenKind::RawString) {
            let parts = vec![StringPart::Text(token.literal.clone())];
            return Ok(Expression::String { token, parts });
        }

        let parts = split_interpolations(&token)?;
        Ok(Expression::String { token, parts })
    }

    /// Compiles a regex literal.
    pub(super) fn parse_regex(&self, token: Token) -> ParseResult<Expression> {
        match Regex::new(&token.literal) {
            Ok(pattern) => Ok(Expression::Regex { token,
                                                  pattern: Arc::new(pattern) }),
            Err(e) => Err(ParseError::InvalidLiteral { literal:  token.literal.clone(),
                                                       reason:   e.to_string(),
                                                       position: token.position, }),
        }
    }
}

fn invalid_literal(token: &Token, reason: &str) -> ParseError {
    ParseError::InvalidLiteral { literal:  token.literal.clone(),
                                 reason:   reason.to_string(),
                                 position: token.position.clone(), }
}

/// Splits processed string text into literal and interpolated parts.
fn split_interpolations(token: &Token) -> ParseResult<Vec<StringPart>> {
    let text = token.literal.as_str();
    let mut parts = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("#{") {
        if start > 0 {
            parts.push(StringPart::Text(rest[..start].to_string()));
        }
        let body = &rest[start + 2..];
        let end = interpolation_end(body).ok_or_else(|| {
                      ParseError::malformed("unterminated interpolation in string literal",
                                            &token.position)
                  })?;
        parts.push(StringPart::Interpolation(parse_fragment(&body[..end], token)?));
        rest = &body[end + 1..];
    }

    if !rest.is_empty() || parts.is_empty() {
        parts.push(StringPart::Text(rest.to_string()));
    }
    Ok(parts)
}

/// Parses one interpolated expression, attributing positions to the string.
fn parse_fragment(source: &str, token: &Token) -> ParseResult<Expression> {
    if source.trim().is_empty() {
        return Err(ParseError::malformed("empty interpolation in string literal",
                                         &token.position));
    }

    let mut parser = Parser::new(Lexer::with_origin(source, &token.position));
    let expression = parser.parse_expression(Precedence::Lowest)?;
    if !parser.peek_is(TokenKind::Eof) {
        return Err(parser.unexpected(&parser.peek, "end of interpolation"));
    }
    match parser.into_errors().into_iter().next() {
        Some(e) => Err(e),
        None => Ok(expression),
    }
}
