use std::sync::Arc;

use crate::{
    ast::{AssignOperator, Expression, Statement},
    error::ParseError,
    interpreter::{
        parser::core::{ParseResult, Parser, Precedence},
        token::TokenKind,
    },
};

impl Parser<'_> {
    /// Parses one statement starting at the current token.
    ///
    /// A trailing `;` is consumed as part of the statement.
    ///
    /// # Errors
    /// Returns the first error found inside the statement.
    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        let statement = match self.cur.kind {
            TokenKind::Var => self.parse_var_statement()?,
            TokenKind::Val | TokenKind::Const => self.parse_val_statement()?,
            TokenKind::Fun if self.peek_is(TokenKind::Ident) => {
                let function = self.parse_function_literal(true)?;
                Statement::Function { token:    function.token.clone(),
                                      function: Arc::new(function), }
            },
            TokenKind::Return => self.parse_return_statement()?,
            TokenKind::Break => Statement::Break { token: self.cur.clone() },
            TokenKind::Continue => Statement::Continue { token: self.cur.clone() },
            TokenKind::Import => {
                let token = self.cur.clone();
                self.expect_peek(TokenKind::ImportPath)?;
                Statement::Import { token,
                                    path: self.cur.literal.clone() }
            },
            TokenKind::LBrace => Statement::Block(self.parse_block()?),
            _ => {
                let token = self.cur.clone();
                let expression = self.parse_expression(Precedence::Lowest)?;
                Statement::Expression { token, expression }
            },
        };

        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }

        Ok(statement)
    }

    /// Parses `var name = value` and its compound forms (`var name += 1`).
    fn parse_var_statement(&mut self) -> ParseResult<Statement> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::Ident)?;
        let name = self.cur.literal.clone();

        self.advance();
        let operator = AssignOperator::from_token(self.cur.kind).ok_or_else(|| {
                           self.unexpected(&self.cur, "'=' or a compound assignment operator")
                       })?;

        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;

        Ok(Statement::Var { token,
                            name,
                            operator,
                            value })
    }

    /// Parses `val name = value`; `const` is accepted as a synonym.
    fn parse_val_statement(&mut self) -> ParseResult<Statement> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::Ident)?;
        let name = self.cur.literal.clone();

        if !self.peek_is(TokenKind::Assign) {
            return Err(ParseError::malformed(format!("immutable binding '{name}' needs an initial value"),
                                             &self.peek.position));
        }
        self.advance();
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;

        Ok(Statement::Val { token, name, value })
    }

    /// Parses `return` with an optional value. The value is absent when the
    /// statement ends at `;`, `}`, end of input or the end of the line.
    fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        let token = self.cur.clone();

        let ends_here = matches!(self.peek.kind,
                                 TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof)
                        || self.peek.line() > self.cur.line();
        if ends_here {
            return Ok(Statement::Return { token, value: None });
        }

        self.advance();
        let value: Expression = self.parse_expression(Precedence::Lowest)?;
        Ok(Statement::Return { token,
                               value: Some(value) })
    }
}
