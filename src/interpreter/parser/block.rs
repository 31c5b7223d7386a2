use crate::{
    ast::BlockStatement,
    interpreter::{
        parser::core::{ParseResult, Parser},
        token::TokenKind,
    },
};

impl Parser<'_> {
    /// Parses a block delimited by braces.
    ///
    /// Statements inside the block are separated by `;` or newlines. A
    /// statement that fails to parse is recorded and skipped, so one mistake
    /// does not discard the rest of the block.
    ///
    /// Grammar: `block := "{" statement* "}"`
    ///
    /// # Returns
    /// The block, with `cur` left on the closing `}`.
    ///
    /// # Errors
    /// Fails if the input ends before the closing brace.
    pub(super) fn parse_block(&mut self) -> ParseResult<BlockStatement> {
        let token = self.cur.clone();
        let mut statements = Vec::new();
        self.advance();

        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                },
            }
            self.advance();
        }

        if self.cur_is(TokenKind::Eof) {
            return Err(self.unexpected(&self.cur, "'}'"));
        }

        Ok(BlockStatement { token, statements })
    }

    /// Expects a `{` as the next token and parses the block it opens.
    pub(super) fn parse_block_after(&mut self) -> ParseResult<BlockStatement> {
        self.expect_peek(TokenKind::LBrace)?;
        self.parse_block()
    }
}
