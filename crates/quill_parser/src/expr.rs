use quill_middle::interner::{sym, Symbol};
use quill_middle::lexer::token::{ASSIGNMENT_TYPES, TokenType};
use quill_middle::parser::error::{Error, TokenTypeSuggestion};
use quill_middle::parser::expr::{
    ArrayLiteral, Expr, ExprKind, FunctionCall, GroupingExpr, LiteralExpr, ObjectLiteral, ObjectMemberKind,
    PropertyAccessExpr, UnaryExpr,
};
use quill_middle::parser::statement::{
    FunctionDeclaration, FunctionKind, Parameter, ReturnStatement, Statement, StatementKind,
};
use quill_middle::sourcemap::Span;
use quill_middle::util;

use crate::Parser;
use crate::stmt::StatementParser;

pub trait ExpressionParser {
    fn parse_expression(&mut self) -> Option<Expr>;
    fn parse_assignment(&mut self) -> Option<Expr>;
    fn parse_ternary(&mut self) -> Option<Expr>;
    fn parse_nullish_coalescing(&mut self) -> Option<Expr>;
    fn parse_logical_or(&mut self) -> Option<Expr>;
    fn parse_logical_and(&mut self) -> Option<Expr>;
    fn parse_bitwise_or(&mut self) -> Option<Expr>;
    fn parse_bitwise_xor(&mut self) -> Option<Expr>;
    fn parse_bitwise_and(&mut self) -> Option<Expr>;
    fn parse_equality(&mut self) -> Option<Expr>;
    fn parse_comparison(&mut self) -> Option<Expr>;
    fn parse_bitwise_shift(&mut self) -> Option<Expr>;
    fn parse_term(&mut self) -> Option<Expr>;
    fn parse_factor(&mut self) -> Option<Expr>;
    fn parse_pow(&mut self) -> Option<Expr>;
    fn parse_unary(&mut self) -> Option<Expr>;
    fn parse_postfix(&mut self) -> Option<Expr>;
    fn parse_field_access(&mut self) -> Option<Expr>;
    /// Parses a `new` expression, including the `new.target` meta property, assuming the cursor is at `new`
    fn parse_new(&mut self) -> Option<Expr>;
    fn parse_primary_expr(&mut self) -> Option<Expr>;
    /// Parses a function expression or declaration, assuming `function` has been consumed
    fn parse_function(&mut self, is_declaration: bool) -> Option<FunctionDeclaration>;
    /// Parses an arrow function, assuming the cursor is at its parameter list
    fn parse_arrow_function(&mut self) -> Option<FunctionDeclaration>;
    /// Parses a list of parameters delimited by comma, assuming that the ( has already been consumed
    fn parse_parameter_list(&mut self) -> Option<Vec<Parameter>>;
    /// Parses call arguments, assuming that the ( has already been consumed
    fn parse_arguments(&mut self) -> Option<Vec<Expr>>;
}

impl Parser<'_, '_> {
    fn parse_assignment_inner(&mut self) -> Option<Expr> {
        if self.is_arrow_function_start() {
            let fun = self.parse_arrow_function()?;
            return Some(Expr {
                span: fun.span,
                kind: ExprKind::Function(fun),
            });
        }

        let expr = self.parse_ternary()?;

        if self.expect_token_type_and_skip(ASSIGNMENT_TYPES, false) {
            let operator = self.previous()?.ty;
            self.check_assignment_target(&expr)?;
            let rval = self.parse_assignment()?;
            return Some(Expr::assignment(expr, rval, operator));
        }

        Some(expr)
    }

    /// Parses a left associative chain of binary operators that share a precedence level
    fn read_infix_expression(&mut self, lower: fn(&mut Self) -> Option<Expr>, tokens: &'static [TokenType]) -> Option<Expr> {
        let mut expr = lower(self)?;

        while self.expect_token_type_and_skip(tokens, false) {
            let operator = self.previous()?.ty;
            let rval = lower(self)?;
            expr = Expr::binary(expr, rval, operator);
        }

        Some(expr)
    }

    fn check_assignment_target(&mut self, target: &Expr) -> Option<()> {
        if target.is_valid_assignment_target() {
            Some(())
        } else {
            self.create_error(Error::InvalidAssignmentTarget(target.span));
            None
        }
    }

    /// Arrow functions share their beginning with identifiers and groupings,
    /// so look for the `=>` after the parameter list before committing to either.
    fn is_arrow_function_start(&self) -> bool {
        match self.current_ty() {
            Some(TokenType::Identifier(_)) => self.peek_ty(1) == Some(TokenType::FatArrow),
            Some(TokenType::LeftParen) => {
                let mut depth = 0usize;
                for (offset, token) in self.tokens[self.idx..].iter().enumerate() {
                    match token.ty {
                        TokenType::LeftParen => depth += 1,
                        TokenType::RightParen => {
                            depth -= 1;
                            if depth == 0 {
                                return self.peek_ty(offset + 1) == Some(TokenType::FatArrow);
                            }
                        }
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// Parses the parameters and body of a function, after its name
    fn parse_function_rest(&mut self, name: Option<Symbol>, lo: Span) -> Option<FunctionDeclaration> {
        self.expect(&[TokenType::LeftParen])?;

        self.with_function_context(FunctionKind::Function, |this| {
            let parameters = this.parse_parameter_list()?;
            this.expect(&[TokenType::LeftBrace])?;
            let statements = this.parse_block()?.0;

            Some(FunctionDeclaration {
                name,
                parameters,
                statements,
                ty: FunctionKind::Function,
                span: this.span_from(lo),
            })
        })
    }

    /// Parses the members of an object literal, assuming the `{` has been consumed
    fn parse_object_literal(&mut self) -> Option<ObjectLiteral> {
        let mut members = Vec::new();

        while !self.expect_token_type_and_skip(&[TokenType::RightBrace], false) {
            let token = self.next()?;
            let key = match token.ty {
                TokenType::LeftSquareBrace => {
                    let key = self.parse_assignment()?;
                    self.expect(&[TokenType::RightSquareBrace])?;
                    ObjectMemberKind::Dynamic(key)
                }
                TokenType::String(s) => ObjectMemberKind::Static(s),
                TokenType::Number(n) => ObjectMemberKind::Static(self.interner.intern(util::format_f64(n))),
                other => match other.as_property_name() {
                    Some(name) => ObjectMemberKind::Static(name),
                    None => {
                        self.create_error(Error::unexpected_token(token, TokenTypeSuggestion::Unknown));
                        return None;
                    }
                },
            };

            let value = match (self.current_ty(), &key) {
                (Some(TokenType::Colon), _) => {
                    self.advance();
                    self.parse_assignment()?
                }
                (Some(TokenType::LeftParen), ObjectMemberKind::Static(name)) => {
                    let fun = self.parse_function_rest(Some(*name), token.span)?;
                    Expr {
                        span: fun.span,
                        kind: ExprKind::Function(fun),
                    }
                }
                // shorthand property: `{ a }`
                (Some(TokenType::Comma | TokenType::RightBrace), ObjectMemberKind::Static(name))
                    if token.ty.as_identifier().is_some() =>
                {
                    Expr::identifier(*name, token.span)
                }
                _ => {
                    self.error_unexpected_current(TokenType::Colon);
                    return None;
                }
            };

            members.push((key, value));

            if !self.expect_token_type_and_skip(&[TokenType::Comma], false) {
                self.expect(&[TokenType::RightBrace])?;
                break;
            }
        }

        Some(ObjectLiteral(members))
    }

    /// Parses the elements of an array literal, assuming the `[` has been consumed
    fn parse_array_literal(&mut self) -> Option<ArrayLiteral> {
        let mut items = Vec::new();

        loop {
            match self.current_ty() {
                Some(TokenType::RightSquareBrace) => {
                    self.advance();
                    break;
                }
                // elision: `[, 1]`
                Some(TokenType::Comma) => {
                    self.advance();
                    items.push(Expr::undefined_literal());
                }
                _ => {
                    items.push(self.parse_assignment()?);
                    if !self.expect_token_type_and_skip(&[TokenType::Comma], false) {
                        self.expect(&[TokenType::RightSquareBrace])?;
                        break;
                    }
                }
            }
        }

        Some(ArrayLiteral(items))
    }
}

impl ExpressionParser for Parser<'_, '_> {
    fn parse_expression(&mut self) -> Option<Expr> {
        let mut expr = self.parse_assignment()?;

        while self.expect_token_type_and_skip(&[TokenType::Comma], false) {
            let rval = self.parse_assignment()?;
            expr = Expr {
                span: expr.span.to(rval.span),
                kind: ExprKind::Sequence((Box::new(expr), Box::new(rval))),
            };
        }

        Some(expr)
    }

    fn parse_assignment(&mut self) -> Option<Expr> {
        self.with_nesting(Self::parse_assignment_inner)
    }

    fn parse_ternary(&mut self) -> Option<Expr> {
        let expr = self.parse_nullish_coalescing()?;

        if self.expect_token_type_and_skip(&[TokenType::Conditional], false) {
            let then_branch = self.parse_assignment()?;
            self.expect(&[TokenType::Colon])?;
            let else_branch = self.parse_assignment()?;
            return Some(Expr::conditional(expr, then_branch, else_branch));
        }

        Some(expr)
    }

    fn parse_nullish_coalescing(&mut self) -> Option<Expr> {
        self.read_infix_expression(Self::parse_logical_or, &[TokenType::NullishCoalescing])
    }

    fn parse_logical_or(&mut self) -> Option<Expr> {
        self.read_infix_expression(Self::parse_logical_and, &[TokenType::LogicalOr])
    }

    fn parse_logical_and(&mut self) -> Option<Expr> {
        self.read_infix_expression(Self::parse_bitwise_or, &[TokenType::LogicalAnd])
    }

    fn parse_bitwise_or(&mut self) -> Option<Expr> {
        self.read_infix_expression(Self::parse_bitwise_xor, &[TokenType::BitwiseOr])
    }

    fn parse_bitwise_xor(&mut self) -> Option<Expr> {
        self.read_infix_expression(Self::parse_bitwise_and, &[TokenType::BitwiseXor])
    }

    fn parse_bitwise_and(&mut self) -> Option<Expr> {
        self.read_infix_expression(Self::parse_equality, &[TokenType::BitwiseAnd])
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        self.read_infix_expression(
            Self::parse_comparison,
            &[
                TokenType::Inequality,
                TokenType::Equality,
                TokenType::StrictEquality,
                TokenType::StrictInequality,
            ],
        )
    }

    fn parse_comparison(&mut self) -> Option<Expr> {
        self.read_infix_expression(
            Self::parse_bitwise_shift,
            &[
                TokenType::Greater,
                TokenType::Less,
                TokenType::GreaterEqual,
                TokenType::LessEqual,
                TokenType::In,
                TokenType::Instanceof,
            ],
        )
    }

    fn parse_bitwise_shift(&mut self) -> Option<Expr> {
        self.read_infix_expression(
            Self::parse_term,
            &[
                TokenType::LeftShift,
                TokenType::RightShift,
                TokenType::UnsignedRightShift,
            ],
        )
    }

    fn parse_term(&mut self) -> Option<Expr> {
        self.read_infix_expression(Self::parse_factor, &[TokenType::Plus, TokenType::Minus])
    }

    fn parse_factor(&mut self) -> Option<Expr> {
        self.read_infix_expression(
            Self::parse_pow,
            &[TokenType::Star, TokenType::Slash, TokenType::Remainder],
        )
    }

    fn parse_pow(&mut self) -> Option<Expr> {
        let expr = self.parse_unary()?;

        // right associative: a ** b ** c is a ** (b ** c)
        if self.expect_token_type_and_skip(&[TokenType::Exponentiation], false) {
            let rval = self.parse_pow()?;
            return Some(Expr::binary(expr, rval, TokenType::Exponentiation));
        }

        Some(expr)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let lo = self.current_span();

        if self.expect_token_type_and_skip(
            &[
                TokenType::LogicalNot,
                TokenType::Minus,
                TokenType::Plus,
                TokenType::BitwiseNot,
                TokenType::Delete,
                TokenType::Void,
                TokenType::Typeof,
            ],
            false,
        ) {
            let operator = self.previous()?.ty;
            let rval = self.with_nesting(Self::parse_unary)?;
            return Some(Expr {
                span: lo.to(rval.span),
                kind: ExprKind::Unary(UnaryExpr::new(operator, rval)),
            });
        }

        if self.expect_token_type_and_skip(&[TokenType::Increment, TokenType::Decrement], false) {
            let operator = self.previous()?.ty;
            let rval = self.with_nesting(Self::parse_unary)?;
            self.check_assignment_target(&rval)?;
            return Some(Expr {
                span: lo.to(rval.span),
                kind: ExprKind::Prefix((operator, Box::new(rval))),
            });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let expr = self.parse_field_access()?;

        // a line break before ++ or -- ends the expression
        if matches!(self.current_ty(), Some(TokenType::Increment | TokenType::Decrement)) && !self.at_line_start() {
            let operator = self.next()?.ty;
            self.check_assignment_target(&expr)?;
            return Some(Expr {
                span: self.span_from(expr.span),
                kind: ExprKind::Postfix((operator, Box::new(expr))),
            });
        }

        Some(expr)
    }

    fn parse_field_access(&mut self) -> Option<Expr> {
        let lo = self.current_span();

        let mut expr = match self.current_ty() {
            Some(TokenType::New) => self.with_nesting(Self::parse_new)?,
            _ => self.parse_primary_expr()?,
        };

        loop {
            match self.current_ty() {
                Some(TokenType::LeftParen) => {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    expr = Expr {
                        span: self.span_from(lo),
                        kind: ExprKind::Call(FunctionCall {
                            constructor_call: false,
                            target: Box::new(expr),
                            arguments,
                        }),
                    };
                }
                Some(TokenType::Dot | TokenType::LeftSquareBrace) => {
                    expr = self.parse_member_access(expr, lo)?;
                }
                _ => break,
            }
        }

        Some(expr)
    }

    fn parse_new(&mut self) -> Option<Expr> {
        let new = self.next()?;

        if self.expect_token_type_and_skip(&[TokenType::Dot], false) {
            match self.current_ty() {
                Some(TokenType::Identifier(sym::target)) => self.advance(),
                _ => {
                    self.error_unexpected_current(TokenTypeSuggestion::Unknown);
                    return None;
                }
            }

            let span = self.span_from(new.span);
            if !self.new_target_allowed() {
                self.create_error(Error::NewTargetOutsideFunction(span));
                return None;
            }

            return Some(Expr {
                span,
                kind: ExprKind::NewTarget,
            });
        }

        // The constructor is a member expression: calls end it, since they belong to the `new`
        let callee_lo = self.current_span();
        let mut target = match self.current_ty() {
            Some(TokenType::New) => self.with_nesting(Self::parse_new)?,
            _ => self.parse_primary_expr()?,
        };
        while matches!(self.current_ty(), Some(TokenType::Dot | TokenType::LeftSquareBrace)) {
            target = self.parse_member_access(target, callee_lo)?;
        }

        // `new F` is `new F()`
        let arguments = if self.expect_token_type_and_skip(&[TokenType::LeftParen], false) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Some(Expr {
            span: self.span_from(new.span),
            kind: ExprKind::Call(FunctionCall {
                constructor_call: true,
                target: Box::new(target),
                arguments,
            }),
        })
    }

    fn parse_primary_expr(&mut self) -> Option<Expr> {
        let token = self.next()?;
        let span = token.span;

        let kind = match token.ty {
            TokenType::FalseLit => ExprKind::Literal(LiteralExpr::Boolean(false)),
            TokenType::TrueLit => ExprKind::Literal(LiteralExpr::Boolean(true)),
            TokenType::NullLit => ExprKind::Literal(LiteralExpr::Null),
            TokenType::This => ExprKind::Literal(LiteralExpr::Identifier(sym::this)),
            TokenType::Identifier(ident) => ExprKind::Literal(LiteralExpr::Identifier(ident)),
            TokenType::String(s) => ExprKind::Literal(LiteralExpr::String(s)),
            TokenType::Number(n) => ExprKind::Literal(LiteralExpr::Number(n)),
            TokenType::LeftSquareBrace => ExprKind::Array(self.parse_array_literal()?),
            TokenType::LeftBrace => ExprKind::Object(self.parse_object_literal()?),
            TokenType::LeftParen => {
                let mut exprs = vec![self.parse_assignment()?];

                while self.expect_token_type_and_skip(&[TokenType::Comma], false) {
                    exprs.push(self.parse_assignment()?);
                }
                self.expect(&[TokenType::RightParen])?;

                ExprKind::Grouping(GroupingExpr(exprs))
            }
            TokenType::Function => ExprKind::Function(self.parse_function(false)?),
            _ => {
                self.create_error(Error::unexpected_token(token, TokenTypeSuggestion::Unknown));
                return None;
            }
        };

        Some(Expr {
            span: self.span_from(span),
            kind,
        })
    }

    fn parse_function(&mut self, is_declaration: bool) -> Option<FunctionDeclaration> {
        let lo = self.previous()?.span;
        let name = self.expect_identifier(is_declaration);
        if is_declaration && name.is_none() {
            return None;
        }

        self.parse_function_rest(name, lo)
    }

    fn parse_arrow_function(&mut self) -> Option<FunctionDeclaration> {
        let lo = self.current_span();

        self.with_function_context(FunctionKind::Arrow, |this| {
            let parameters = match this.expect_identifier(false) {
                Some(name) => vec![Parameter { name, default: None }],
                None => {
                    this.expect(&[TokenType::LeftParen])?;
                    this.parse_parameter_list()?
                }
            };

            this.expect(&[TokenType::FatArrow])?;

            let statements = if this.expect_token_type_and_skip(&[TokenType::LeftBrace], false) {
                this.parse_block()?.0
            } else {
                // concise body: `x => x + 1` returns the expression
                let expr = this.parse_assignment()?;
                vec![Statement {
                    span: expr.span,
                    kind: StatementKind::Return(ReturnStatement(expr)),
                }]
            };

            Some(FunctionDeclaration {
                name: None,
                parameters,
                statements,
                ty: FunctionKind::Arrow,
                span: this.span_from(lo),
            })
        })
    }

    fn parse_parameter_list(&mut self) -> Option<Vec<Parameter>> {
        let mut parameters = Vec::new();

        while !self.expect_token_type_and_skip(&[TokenType::RightParen], false) {
            let name = self.expect_identifier(true)?;
            let default = if self.expect_token_type_and_skip(&[TokenType::Assignment], false) {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            parameters.push(Parameter { name, default });

            if !self.expect_token_type_and_skip(&[TokenType::Comma], false) {
                self.expect(&[TokenType::RightParen])?;
                break;
            }
        }

        Some(parameters)
    }

    fn parse_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut arguments = Vec::new();

        while !self.expect_token_type_and_skip(&[TokenType::RightParen], false) {
            arguments.push(self.parse_assignment()?);

            if !self.expect_token_type_and_skip(&[TokenType::Comma], false) {
                self.expect(&[TokenType::RightParen])?;
                break;
            }
        }

        Some(arguments)
    }
}

impl Parser<'_, '_> {
    /// Parses `.name` or `[expr]` after `target`, assuming the cursor is at the `.` or `[`
    fn parse_member_access(&mut self, target: Expr, lo: Span) -> Option<Expr> {
        let token = self.next()?;

        let (computed, property) = if token.ty == TokenType::Dot {
            let name_token = self.next()?;
            match name_token.ty.as_property_name() {
                Some(name) => (false, Expr::identifier(name, name_token.span)),
                None => {
                    self.create_error(Error::unexpected_token(name_token, TokenTypeSuggestion::Unknown));
                    return None;
                }
            }
        } else {
            let property = self.parse_expression()?;
            self.expect(&[TokenType::RightSquareBrace])?;
            (true, property)
        };

        Some(Expr {
            span: self.span_from(lo),
            kind: ExprKind::PropertyAccess(PropertyAccessExpr {
                computed,
                target: Box::new(target),
                property: Box::new(property),
            }),
        })
    }
}
