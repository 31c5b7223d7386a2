use std::{collections::HashSet, sync::Arc};

use crate::{
    ast::{
        BlockStatement, CatchClause, Expression, FunctionLiteral, MatchArm, Parameter,
        PrefixOperator, Statement,
    },
    error::ParseError,
    interpreter::{
        parser::core::{ParseResult, Parser, Precedence},
        token::{Token, TokenKind},
    },
};

impl Parser<'_> {
    /// Parses the construct that starts at the current token.
    ///
    /// # Errors
    /// Returns [`ParseError::NoPrefixRule`] for tokens that cannot start an
    /// expression, or the error of the rule that was selected.
    pub(super) fn parse_prefix(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();

        match token.kind {
            TokenKind::Ident => {
                let name = token.literal.clone();
                Ok(Expression::Identifier { token, name })
            },
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Hex
            | TokenKind::Octal
            | TokenKind::Binary
            | TokenKind::UInt => self.parse_number(token),
            TokenKind::String | TokenKind::RawString => self.parse_string(token),
            TokenKind::ExecString => {
                let command = token.literal.clone();
                Ok(Expression::ExecString { token, command })
            },
            TokenKind::Regex => self.parse_regex(token),
            TokenKind::True | TokenKind::False => {
                Ok(Expression::Boolean { value: token.is(TokenKind::True),
                                         token })
            },
            TokenKind::Null => Ok(Expression::Null { token }),
            TokenKind::Minus => self.parse_prefix_operator(PrefixOperator::Neg),
            TokenKind::Bang => self.parse_prefix_operator(PrefixOperator::Bang),
            TokenKind::Not => self.parse_prefix_operator(PrefixOperator::Not),
            TokenKind::Tilde => self.parse_prefix_operator(PrefixOperator::BitNot),
            TokenKind::LParen => self.parse_grouped(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_brace_literal(),
            TokenKind::If => self.parse_if(),
            TokenKind::Match => self.parse_match(),
            TokenKind::For => self.parse_for(),
            TokenKind::Fun => Ok(Expression::Function(Arc::new(self.parse_function_literal(false)?))),
            TokenKind::Eval => self.parse_eval(),
            TokenKind::Try => self.parse_try(),
            _ => {
                let found = if token.is(TokenKind::Eof) {
                    token.kind.symbol().to_string()
                } else {
                    format!("'{}'", token.literal)
                };
                Err(ParseError::NoPrefixRule { found,
                                               position: token.position })
            },
        }
    }

    /// Parses `op operand` for the prefix operators.
    fn parse_prefix_operator(&mut self, operator: PrefixOperator) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;

        Ok(Expression::Prefix { token,
                                operator,
                                right: Box::new(right) })
    }

    /// Parses `( expression )`. Grouping leaves no node behind.
    fn parse_grouped(&mut self) -> ParseResult<Expression> {
        self.advance();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Ok(expression)
    }

    /// Parses an `if` expression with optional `else` and chained `else if`.
    ///
    /// Syntax:
    /// ```text
    ///     if <condition> { ... }
    ///     else if <condition> { ... }
    ///     else { ... }
    /// ```
    /// An `else if` is stored as an else block holding a single `if`
    /// expression statement.
    fn parse_if(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        let consequence = self.parse_block_after()?;

        let alternative = if self.peek_is(TokenKind::Else) {
            self.advance();
            if self.peek_is(TokenKind::If) {
                self.advance();
                let nested_token = self.cur.clone();
                let nested = self.parse_if()?;
                Some(BlockStatement { token:      nested_token.clone(),
                                      statements: vec![Statement::Expression { token:
                                                                                   nested_token,
                                                                               expression:
                                                                                   nested, }], })
            } else {
                Some(self.parse_block_after()?)
            }
        } else {
            None
        };

        Ok(Expression::If { token,
                            condition: Box::new(condition),
                            consequence,
                            alternative })
    }

    /// Parses `match [subject] { cond, cond => { ... } ... }`.
    ///
    /// Arms may be separated by commas. `_` is a wildcard condition.
    fn parse_match(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();

        let subject = if self.peek_is(TokenKind::LBrace) {
            None
        } else {
            self.advance();
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        };
        self.expect_peek(TokenKind::LBrace)?;
        self.advance();

        let mut arms = Vec::new();
        while !self.cur_is(TokenKind::RBrace) {
            if self.cur_is(TokenKind::Eof) {
                return Err(self.unexpected(&self.cur, "'}'"));
            }

            let mut conditions = vec![self.parse_expression(Precedence::Lowest)?];
            while self.peek_is(TokenKind::Comma) {
                self.advance();
                self.advance();
                conditions.push(self.parse_expression(Precedence::Lowest)?);
            }
            self.expect_peek(TokenKind::FatArrow)?;
            let consequence = self.parse_block_after()?;
            arms.push(MatchArm { conditions,
                                 consequence });

            self.advance();
            if self.cur_is(TokenKind::Comma) {
                self.advance();
            }
        }

        if arms.is_empty() {
            return Err(ParseError::malformed("match needs at least one arm", &token.position));
        }

        Ok(Expression::Match { token, subject, arms })
    }

    /// Parses the loop forms.
    ///
    /// Syntax:
    /// ```text
    ///     for <condition> { ... }
    ///     for { ... }
    ///     for x in <iterable> { ... }
    ///     for k, v in <iterable> { ... }
    /// ```
    fn parse_for(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();

        if self.peek_is(TokenKind::LBrace) {
            let condition = Expression::Boolean { token: Token::synthetic(TokenKind::True,
                                                                          "true",
                                                                          &token),
                                                  value: true, };
            let body = self.parse_block_after()?;
            return Ok(Expression::For { token,
                                        condition: Box::new(condition),
                                        body });
        }

        self.advance();
        if self.cur_is(TokenKind::Ident)
           && (self.peek_is(TokenKind::In) || self.peek_is(TokenKind::Comma))
        {
            let bindings = self.parse_bindings()?;
            self.advance();
            let iterable = self.parse_expression(Precedence::Lowest)?;
            let body = self.parse_block_after()?;
            return Ok(Expression::ForIn { token,
                                          bindings,
                                          iterable: Box::new(iterable),
                                          body });
        }

        let condition = self.parse_expression(Precedence::Lowest)?;
        let body = self.parse_block_after()?;
        Ok(Expression::For { token,
                             condition: Box::new(condition),
                             body })
    }

    /// Parses `ident [, ident] in`, with `cur` on the first identifier.
    /// Leaves `cur` on `in`.
    pub(super) fn parse_bindings(&mut self) -> ParseResult<Vec<String>> {
        let mut bindings = vec![self.cur.literal.clone()];
        while self.peek_is(TokenKind::Comma) {
            self.advance();
            self.expect_peek(TokenKind::Ident)?;
            bindings.push(self.cur.literal.clone());
        }
        if bindings.len() > 2 {
            return Err(ParseError::malformed("at most two loop bindings are allowed",
                                             &self.cur.position));
        }
        self.expect_peek(TokenKind::In)?;
        Ok(bindings)
    }

    /// Parses a function literal; `named` selects the `fun name(...)` form.
    ///
    /// Parameters are bare identifiers or `name = default`; once a default
    /// appears every following parameter needs one too.
    pub(super) fn parse_function_literal(&mut self, named: bool) -> ParseResult<FunctionLiteral> {
        let token = self.cur.clone();

        let name = if named {
            self.expect_peek(TokenKind::Ident)?;
            Some(self.cur.literal.clone())
        } else {
            None
        };

        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;
        let body = self.parse_block_after()?;

        Ok(FunctionLiteral { token,
                             name,
                             parameters,
                             body })
    }

    fn parse_parameters(&mut self) -> ParseResult<Vec<Parameter>> {
        let mut parameters: Vec<Parameter> = Vec::new();
        let mut seen = HashSet::new();

        if self.peek_is(TokenKind::RParen) {
            self.advance();
            return Ok(parameters);
        }

        loop {
            self.expect_peek(TokenKind::Ident)?;
            let name = self.cur.literal.clone();
            if !seen.insert(name.clone()) {
                return Err(ParseError::malformed(format!("duplicate parameter '{name}'"),
                                                 &self.cur.position));
            }

            let default = if self.peek_is(TokenKind::Assign) {
                self.advance();
                self.advance();
                Some(self.parse_expression(Precedence::Lowest)?)
            } else if parameters.iter().any(|p| p.default.is_some()) {
                return Err(ParseError::malformed(format!("parameter '{name}' without a default follows a defaulted parameter"),
                                                 &self.cur.position));
            } else {
                None
            };
            parameters.push(Parameter { name, default });

            if self.peek_is(TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect_peek(TokenKind::RParen)?;
            return Ok(parameters);
        }
    }

    /// Parses `eval(expression)`.
    fn parse_eval(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::LParen)?;
        self.advance();
        let source = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;

        Ok(Expression::Eval { token,
                              source: Box::new(source) })
    }

    /// Parses `try { } [catch [(e)] { }] [finally { }]`.
    fn parse_try(&mut self) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let body = self.parse_block_after()?;

        let catch = if self.peek_is(TokenKind::Catch) {
            self.advance();
            let name = if self.peek_is(TokenKind::LParen) {
                self.advance();
                self.expect_peek(TokenKind::Ident)?;
                let name = self.cur.literal.clone();
                self.expect_peek(TokenKind::RParen)?;
                Some(name)
            } else if self.peek_is(TokenKind::Ident) {
                self.advance();
                Some(self.cur.literal.clone())
            } else {
                None
            };
            Some(CatchClause { name,
                               body: self.parse_block_after()? })
        } else {
            None
        };

        let finally = if self.peek_is(TokenKind::Finally) {
            self.advance();
            Some(self.parse_block_after()?)
        } else {
            None
        };

        if catch.is_none() && finally.is_none() {
            return Err(ParseError::malformed("try needs a catch or a finally block",
                                             &token.position));
        }

        Ok(Expression::Try { token,
                             body,
                             catch,
                             finally })
    }
}
