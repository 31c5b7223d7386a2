use crate::{
    ast::{ComprehensionClause, Expression},
    interpreter::{
        parser::core::{ParseResult, Parser, Precedence},
        token::{Token, TokenKind},
    },
};

impl Parser<'_> {
    /// Parses a list literal or a list comprehension.
    ///
    /// Grammar:
    /// ```text
    ///     list := "[" (expr ("," expr)* ","?)? "]"
    ///           | "[" expr clause "]"
    /// ```
    pub(super) fn parse_list(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        if self.peek_is(TokenKind::RBracket) {
            self.advance();
            return Ok(Expression::List { token,
                                         elements: Vec::new() });
        }

        self.advance();
        let first = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::For) {
            let clause = self.parse_clause()?;
            self.expect_peek(TokenKind::RBracket)?;
            return Ok(Expression::ListComp { token,
                                             element: Box::new(first),
                                             clause: Box::new(clause) });
        }

        let elements = self.parse_rest(first, TokenKind::RBracket)?;
        Ok(Expression::List { token, elements })
    }

    /// Parses every literal that opens with `{` in expression position:
    /// maps, structs, sets and their comprehensions. `{}` is an empty map.
    pub(super) fn parse_brace_literal(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        if self.peek_is(TokenKind::RBrace) {
            self.advance();
            return Ok(Expression::Map { token,
                                        entries: Vec::new() });
        }

        self.advance();
        let first = self.parse_expression(Precedence::Lowest)?;

        if !self.peek_is(TokenKind::Colon) {
            if self.peek_is(TokenKind::For) {
                let clause = self.parse_clause()?;
                self.expect_peek(TokenKind::RBrace)?;
                return Ok(Expression::SetComp { token,
                                                element: Box::new(first),
                                                clause: Box::new(clause) });
            }
            let elements = self.parse_rest(first, TokenKind::RBrace)?;
            return Ok(Expression::Set { token, elements });
        }

        self.advance();
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::For) {
            let clause = self.parse_clause()?;
            self.expect_peek(TokenKind::RBrace)?;
            return Ok(Expression::MapComp { token,
                                            key: Box::new(first),
                                            value: Box::new(value),
                                            clause: Box::new(clause) });
        }

        let mut entries = vec![(first, value)];
        if self.peek_is(TokenKind::Comma) {
            self.advance();
            self.parse_comma_separated(TokenKind::RBrace, |parser| {
                    let key = parser.parse_expression(Precedence::Lowest)?;
                    parser.expect_peek(TokenKind::Colon)?;
                    parser.advance();
                    let value = parser.parse_expression(Precedence::Lowest)?;
                    entries.push((key, value));
                    Ok(())
                })?;
        } else {
            self.expect_peek(TokenKind::RBrace)?;
        }

        Ok(into_struct(token, entries))
    }

    /// Parses the remaining elements after `first`, ending on `closing`.
    fn parse_rest(&mut self,
                  first: Expression,
                  closing: TokenKind)
                  -> ParseResult<Vec<Expression>> {
        let mut elements = vec![first];
        if self.peek_is(TokenKind::Comma) {
            self.advance();
            self.parse_comma_separated(closing, |parser| {
                    elements.push(parser.parse_expression(Precedence::Lowest)?);
                    Ok(())
                })?;
        } else {
            self.expect_peek(closing)?;
        }
        Ok(elements)
    }

    /// Parses `for a[, b] in iterable [if filter]`, with `for` as the peek
    /// token.
    fn parse_clause(&mut self) -> ParseResult<ComprehensionClause> {
        self.advance();
        self.expect_peek(TokenKind::Ident)?;
        let bindings = self.parse_bindings()?;

        self.advance();
        let iterable = self.parse_expression(Precedence::Lowest)?;

        let filter = if self.peek_is(TokenKind::If) {
            self.advance();
            self.advance();
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };

        Ok(ComprehensionClause { bindings,
                                 iterable,
                                 filter })
    }
}

/// A map literal whose keys are all bare identifiers is a struct literal.
fn into_struct(token: Token, entries: Vec<(Expression, Expression)>) -> Expression {
    let all_names = entries.iter()
                           .all(|(key, _)| matches!(key, Expression::Identifier { .. }));
    if !all_names {
        return Expression::Map { token, entries };
    }

    let fields = entries.into_iter()
                        .filter_map(|(key, value)| match key {
                            Expression::Identifier { name, .. } => Some((name, value)),
                            _ => None,
                        })
                        .collect();
    Expression::Struct { token, fields }
}
