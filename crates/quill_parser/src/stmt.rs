use quill_middle::lexer::token::{TokenType, VARIABLE_TYPES};
use quill_middle::parser::error::{Error, TokenTypeSuggestion};
use quill_middle::parser::expr::Expr;
use quill_middle::parser::statement::{
    BlockStatement, Catch, DoWhileLoop, ForLoop, IfStatement, Loop, ReturnStatement, Statement, StatementKind,
    TryCatch, VariableBinding, VariableDeclaration, VariableDeclarationKind, VariableDeclarations, WhileLoop,
};

use crate::Parser;
use crate::expr::ExpressionParser;

pub trait StatementParser {
    fn parse_statement(&mut self) -> Option<Statement>;
    fn parse_throw(&mut self) -> Option<Expr>;
    fn parse_try(&mut self) -> Option<TryCatch>;
    fn parse_return(&mut self) -> Option<ReturnStatement>;
    fn parse_for_loop(&mut self) -> Option<Loop>;
    fn parse_while_loop(&mut self) -> Option<Loop>;
    fn parse_do_while_loop(&mut self) -> Option<Loop>;
    /// Parses the statements of a block, assuming the `{` has been consumed
    fn parse_block(&mut self) -> Option<BlockStatement>;
    /// Parses the bindings of a variable declaration, assuming the `var`/`let`/`const` has been consumed
    fn parse_variable(&mut self, kind: VariableDeclarationKind) -> Option<VariableDeclarations>;
    fn parse_if(&mut self) -> Option<IfStatement>;
}

const CATCH_OR_FINALLY: &[TokenType] = &[TokenType::Catch, TokenType::Finally];

fn variable_kind(ty: TokenType) -> Option<VariableDeclarationKind> {
    match ty {
        TokenType::Var => Some(VariableDeclarationKind::Var),
        TokenType::Let => Some(VariableDeclarationKind::Let),
        TokenType::Const => Some(VariableDeclarationKind::Const),
        _ => None,
    }
}

impl StatementParser for Parser<'_, '_> {
    fn parse_statement(&mut self) -> Option<Statement> {
        self.with_nesting(Self::parse_statement_inner)
    }

    fn parse_throw(&mut self) -> Option<Expr> {
        // no line terminator is allowed between `throw` and its expression
        if self.at_line_start() {
            self.error_unexpected_current(TokenTypeSuggestion::Unknown);
            return None;
        }

        let expr = self.parse_expression()?;
        self.expect_statement_end()?;
        Some(expr)
    }

    fn parse_try(&mut self) -> Option<TryCatch> {
        let try_lo = self.current_span();
        self.expect(&[TokenType::LeftBrace])?;
        let try_ = Statement {
            kind: StatementKind::Block(self.parse_block()?),
            span: self.span_from(try_lo),
        };

        let catch = if self.expect_token_type_and_skip(&[TokenType::Catch], false) {
            let ident = if self.expect_token_type_and_skip(&[TokenType::LeftParen], false) {
                let ident = self.expect_identifier(true)?;
                self.expect(&[TokenType::RightParen])?;
                Some(ident)
            } else {
                None
            };

            let lo = self.current_span();
            self.expect(&[TokenType::LeftBrace])?;
            let body = Statement {
                kind: StatementKind::Block(self.parse_block()?),
                span: self.span_from(lo),
            };

            Some(Catch {
                body: Box::new(body),
                ident,
            })
        } else {
            None
        };

        let finally = if self.expect_token_type_and_skip(&[TokenType::Finally], false) {
            let lo = self.current_span();
            self.expect(&[TokenType::LeftBrace])?;
            Some(Box::new(Statement {
                kind: StatementKind::Block(self.parse_block()?),
                span: self.span_from(lo),
            }))
        } else {
            None
        };

        if catch.is_none() && finally.is_none() {
            self.error_unexpected_current(CATCH_OR_FINALLY);
            return None;
        }

        Some(TryCatch {
            try_: Box::new(try_),
            catch,
            finally,
        })
    }

    fn parse_return(&mut self) -> Option<ReturnStatement> {
        if !self.in_function() {
            let span = self.previous()?.span;
            self.create_error(Error::ReturnOutsideFunction(span));
            return None;
        }

        let returns_nothing = match self.current_ty() {
            None | Some(TokenType::Semicolon | TokenType::RightBrace) => true,
            Some(_) => self.at_line_start(),
        };

        let expr = if returns_nothing {
            Expr::undefined_literal()
        } else {
            self.parse_expression()?
        };

        self.expect_statement_end()?;
        Some(ReturnStatement(expr))
    }

    fn parse_for_loop(&mut self) -> Option<Loop> {
        self.expect(&[TokenType::LeftParen])?;

        let init = if self.expect_token_type_and_skip(&[TokenType::Semicolon], false) {
            None
        } else {
            let lo = self.current_span();
            let kind = if self.expect_token_type_and_skip(VARIABLE_TYPES, false) {
                let kind = variable_kind(self.previous()?.ty)?;
                StatementKind::Variable(self.parse_variable(kind)?)
            } else {
                StatementKind::Expression(self.parse_expression()?)
            };
            let init = Statement {
                kind,
                span: self.span_from(lo),
            };
            self.expect(&[TokenType::Semicolon])?;
            Some(Box::new(init))
        };

        let condition = if self.current_ty() == Some(TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&[TokenType::Semicolon])?;

        let finalizer = if self.current_ty() == Some(TokenType::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&[TokenType::RightParen])?;

        let body = self.with_loop(|this| this.parse_statement())?;

        Some(Loop::For(ForLoop {
            init,
            condition,
            finalizer,
            body: Box::new(body),
        }))
    }

    fn parse_while_loop(&mut self) -> Option<Loop> {
        self.expect(&[TokenType::LeftParen])?;
        let condition = self.parse_expression()?;
        self.expect(&[TokenType::RightParen])?;

        let body = self.with_loop(|this| this.parse_statement())?;

        Some(Loop::While(WhileLoop {
            condition,
            body: Box::new(body),
        }))
    }

    fn parse_do_while_loop(&mut self) -> Option<Loop> {
        let body = self.with_loop(|this| this.parse_statement())?;

        self.expect(&[TokenType::While])?;
        self.expect(&[TokenType::LeftParen])?;
        let condition = self.parse_expression()?;
        self.expect(&[TokenType::RightParen])?;

        // the semicolon after a do-while loop is always optional
        self.expect_token_type_and_skip(&[TokenType::Semicolon], false);

        Some(Loop::DoWhile(DoWhileLoop {
            body: Box::new(body),
            condition,
        }))
    }

    fn parse_block(&mut self) -> Option<BlockStatement> {
        let mut stmts = Vec::new();

        while !self.expect_token_type_and_skip(&[TokenType::RightBrace], false) {
            if self.is_eof() {
                self.create_error(Error::UnexpectedEof);
                return None;
            }

            stmts.push(self.parse_statement()?);
        }

        Some(BlockStatement(stmts))
    }

    fn parse_variable(&mut self, kind: VariableDeclarationKind) -> Option<VariableDeclarations> {
        let mut decls = Vec::new();

        loop {
            let lo = self.current_span();
            let name = self.expect_identifier(true)?;

            let value = if self.expect_token_type_and_skip(&[TokenType::Assignment], false) {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            if kind == VariableDeclarationKind::Const && value.is_none() {
                self.create_error(Error::MissingInitializerInConst(self.span_from(lo)));
                return None;
            }

            decls.push(VariableDeclaration {
                binding: VariableBinding { name, kind },
                value,
            });

            if !self.expect_token_type_and_skip(&[TokenType::Comma], false) {
                break;
            }
        }

        Some(VariableDeclarations(decls))
    }

    fn parse_if(&mut self) -> Option<IfStatement> {
        self.expect(&[TokenType::LeftParen])?;
        let condition = self.parse_expression()?;
        self.expect(&[TokenType::RightParen])?;

        let then = self.parse_statement()?;

        let el = if self.expect_token_type_and_skip(&[TokenType::Else], false) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Some(IfStatement {
            condition,
            then: Box::new(then),
            el,
        })
    }
}

impl Parser<'_, '_> {
    fn parse_statement_inner(&mut self) -> Option<Statement> {
        let lo = self.current_span();
        let ty = self.next()?.ty;

        let kind = match ty {
            TokenType::Var | TokenType::Let | TokenType::Const => {
                let kind = variable_kind(ty)?;
                let decls = self.parse_variable(kind)?;
                self.expect_statement_end()?;
                StatementKind::Variable(decls)
            }
            TokenType::If => StatementKind::If(self.parse_if()?),
            TokenType::Function => StatementKind::Function(self.parse_function(true)?),
            TokenType::LeftBrace => StatementKind::Block(self.parse_block()?),
            TokenType::While => StatementKind::Loop(self.parse_while_loop()?),
            TokenType::Do => StatementKind::Loop(self.parse_do_while_loop()?),
            TokenType::For => StatementKind::Loop(self.parse_for_loop()?),
            TokenType::Try => StatementKind::Try(self.parse_try()?),
            TokenType::Throw => StatementKind::Throw(self.parse_throw()?),
            TokenType::Return => StatementKind::Return(self.parse_return()?),
            TokenType::Continue | TokenType::Break => {
                if !self.in_loop() {
                    self.create_error(Error::IllegalBreak(self.span_from(lo)));
                    return None;
                }
                self.expect_statement_end()?;
                if ty == TokenType::Break {
                    StatementKind::Break
                } else {
                    StatementKind::Continue
                }
            }
            TokenType::Debugger => {
                self.expect_statement_end()?;
                StatementKind::Debugger
            }
            TokenType::Semicolon => StatementKind::Empty,
            _ => {
                // The token belongs to the expression
                self.idx -= 1;
                let expr = self.parse_expression()?;
                self.expect_statement_end()?;
                StatementKind::Expression(expr)
            }
        };

        Some(Statement {
            kind,
            span: self.span_from(lo),
        })
    }
}
