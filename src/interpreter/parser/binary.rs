use crate::{
    ast::{AssignOperator, Expression, InfixOperator, StringPart},
    error::ParseError,
    interpreter::{
        parser::core::{ParseResult, Parser, Precedence},
        token::{Token, TokenKind},
    },
};

impl Parser<'_> {
    /// Parses the construct continuing `left`, with `cur` on the operator.
    ///
    /// Covers calls, indexing, member access, assignment and every binary
    /// operator. `**` and the assignments associate to the right; all other
    /// operators associate to the left.
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the right-hand side fails to parse or the
    /// assignment target is not a name or an index expression.
    pub(super) fn parse_infix(&mut self, left: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();

        match token.kind {
            TokenKind::LParen => self.parse_call(left),
            TokenKind::LBracket => self.parse_index(left),
            TokenKind::Dot => self.parse_member(left),
            kind if kind.is_assignment() => self.parse_assignment(left),
            kind => {
                let operator = InfixOperator::from_token(kind).ok_or_else(|| {
                                   self.unexpected(&token, "an operator")
                               })?;
                let precedence = Precedence::of(kind);
                let right_precedence = if operator == InfixOperator::Pow {
                    precedence.lower()
                } else {
                    precedence
                };

                self.advance();
                let right = self.parse_expression(right_precedence)?;

                Ok(Expression::Infix { token,
                                       left: Box::new(left),
                                       operator,
                                       right: Box::new(right) })
            },
        }
    }

    /// Parses a call's argument list: positional arguments first, then
    /// `name = value` pairs. A trailing comma is allowed.
    ///
    /// Grammar: `call := expr "(" (arg ("," arg)* ","?)? ")"`
    fn parse_call(&mut self, function: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();
        let mut arguments = Vec::new();
        let mut named: Vec<(String, Expression)> = Vec::new();

        self.parse_comma_separated(TokenKind::RParen, |parser| {
                let is_named = parser.cur_is(TokenKind::Ident) && parser.peek_is(TokenKind::Assign);
                if is_named {
                    let name = parser.cur.literal.clone();
                    if named.iter().any(|(n, _)| *n == name) {
                        return Err(ParseError::malformed(format!("argument '{name}' given twice"),
                                                         &parser.cur.position));
                    }
                    parser.advance();
                    parser.advance();
                    named.push((name, parser.parse_expression(Precedence::Lowest)?));
                } else {
                    if !named.is_empty() {
                        return Err(ParseError::malformed("positional argument follows a named argument",
                                                         &parser.cur.position));
                    }
                    arguments.push(parser.parse_expression(Precedence::Lowest)?);
                }
                Ok(())
            })?;

        Ok(Expression::Call { token,
                              function: Box::new(function),
                              arguments,
                              named })
    }

    /// Parses `left[index]`.
    fn parse_index(&mut self, left: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.advance();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RBracket)?;

        Ok(Expression::Index { token,
                               left: Box::new(left),
                               index: Box::new(index) })
    }

    /// Parses `left.name`, which is sugar for `left["name"]`.
    fn parse_member(&mut self, left: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::Ident)?;
        let name = self.cur.literal.clone();
        let key = Token::synthetic(TokenKind::String, name.clone(), &self.cur);

        Ok(Expression::Index { token,
                               left: Box::new(left),
                               index: Box::new(Expression::String { token: key,
                                                                    parts: vec![StringPart::Text(name)], }) })
    }

    /// Parses `target op= value`. Only names and index expressions can be
    /// assigned to.
    fn parse_assignment(&mut self, target: Expression) -> ParseResult<Expression> {
        let token = self.cur.clone();

        if !matches!(target, Expression::Identifier { .. } | Expression::Index { .. }) {
            return Err(ParseError::InvalidAssignmentTarget { target:   target.to_string(),
                                                             position: token.position, });
        }
        let operator = AssignOperator::from_token(token.kind).ok_or_else(|| {
                           self.unexpected(&token, "an assignment operator")
                       })?;

        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;

        Ok(Expression::Assign { token,
                                target: Box::new(target),
                                operator,
                                value: Box::new(value) })
    }
}
