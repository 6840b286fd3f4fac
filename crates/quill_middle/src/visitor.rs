use crate::interner::Symbol;
use crate::parser::expr::ArrayLiteral;
use crate::parser::expr::AssignmentExpr;
use crate::parser::expr::BinaryExpr;
use crate::parser::expr::ConditionalExpr;
use crate::parser::expr::Expr;
use crate::parser::expr::ExprKind;
use crate::parser::expr::FunctionCall;
use crate::parser::expr::GroupingExpr;
use crate::parser::expr::LiteralExpr;
use crate::parser::expr::ObjectLiteral;
use crate::parser::expr::Postfix;
use crate::parser::expr::Prefix;
use crate::parser::expr::PropertyAccessExpr;
use crate::parser::expr::Seq;
use crate::parser::expr::UnaryExpr;
use crate::parser::statement::BlockStatement;
use crate::parser::statement::DoWhileLoop;
use crate::parser::statement::ForLoop;
use crate::parser::statement::FunctionDeclaration;
use crate::parser::statement::IfStatement;
use crate::parser::statement::Loop;
use crate::parser::statement::ReturnStatement;
use crate::parser::statement::Statement;
use crate::parser::statement::StatementKind;
use crate::parser::statement::TryCatch;
use crate::parser::statement::VariableDeclarations;
use crate::parser::statement::WhileLoop;
use crate::sourcemap::Span;

/// A visitor trait that helps walking an AST
pub trait Visitor<V> {
    /// Accepts a parsed statement
    fn accept(&mut self, stmt: Statement) -> V;

    /// Accepts a parsed expression
    fn accept_expr(&mut self, expr: Expr) -> V;

    /// Visits an expression statement
    fn visit_expression_statement(&mut self, expr: Expr) -> V;

    /// Visits a binary expression
    fn visit_binary_expression(&mut self, span: Span, e: BinaryExpr) -> V;

    /// Visits a grouping expression
    fn visit_grouping_expression(&mut self, span: Span, e: GroupingExpr) -> V;

    /// Visits a literal expression
    fn visit_literal_expression(&mut self, span: Span, e: LiteralExpr) -> V;

    /// Visits an identifier
    fn visit_identifier_expression(&mut self, span: Span, ident: Symbol) -> V;

    /// Visits an unary expression
    fn visit_unary_expression(&mut self, span: Span, e: UnaryExpr) -> V;

    /// Visits a variable declaration
    fn visit_variable_declaration(&mut self, span: Span, v: VariableDeclarations) -> V;

    /// Visits an if statement
    fn visit_if_statement(&mut self, span: Span, i: IfStatement) -> V;

    /// Visits a block statement
    fn visit_block_statement(&mut self, span: Span, b: BlockStatement) -> V;

    /// Visits a function declaration
    fn visit_function_declaration(&mut self, span: Span, f: FunctionDeclaration) -> V;

    /// Visits a while loop
    fn visit_while_loop(&mut self, span: Span, l: WhileLoop) -> V;

    /// Visits a do while loop
    fn visit_do_while_loop(&mut self, span: Span, l: DoWhileLoop) -> V;

    /// Visits a for loop
    fn visit_for_loop(&mut self, span: Span, f: ForLoop) -> V;

    /// Visits an assignment expression
    fn visit_assignment_expression(&mut self, span: Span, e: AssignmentExpr) -> V;

    /// Visits a function call expression, including constructor calls
    fn visit_function_call(&mut self, span: Span, c: FunctionCall) -> V;

    /// Visits a return statement
    fn visit_return_statement(&mut self, span: Span, r: ReturnStatement) -> V;

    /// Visits a conditional expression
    fn visit_conditional_expr(&mut self, span: Span, c: ConditionalExpr) -> V;

    /// Visits a property access expression
    fn visit_property_access_expr(&mut self, span: Span, e: PropertyAccessExpr, preserve_this: bool) -> V;

    /// Visits a sequence expression
    fn visit_sequence_expr(&mut self, span: Span, s: Seq) -> V;

    /// Visits a prefix expression
    fn visit_prefix_expr(&mut self, span: Span, p: Prefix) -> V;

    /// Visits a postfix expression
    fn visit_postfix_expr(&mut self, span: Span, p: Postfix) -> V;

    /// Visits a function expression
    fn visit_function_expr(&mut self, span: Span, f: FunctionDeclaration) -> V;

    /// Visits an array literal
    fn visit_array_literal(&mut self, span: Span, a: ArrayLiteral) -> V;

    /// Visits an object literal
    fn visit_object_literal(&mut self, span: Span, o: ObjectLiteral) -> V;

    /// Visits the `new.target` meta property
    fn visit_new_target(&mut self, span: Span) -> V;

    /// Visits a try catch statement
    fn visit_try_catch(&mut self, span: Span, t: TryCatch) -> V;

    /// Visits a throw statement
    fn visit_throw(&mut self, span: Span, e: Expr) -> V;

    /// Visits a continue statement
    fn visit_continue(&mut self, span: Span) -> V;

    /// Visits a break statement
    fn visit_break(&mut self, span: Span) -> V;

    /// Visits a debugger statement
    fn visit_debugger(&mut self, span: Span) -> V;

    /// Visits an empty expression
    fn visit_empty_expr(&mut self) -> V;

    /// Visits an empty statement
    fn visit_empty_statement(&mut self) -> V;
}

/// Dispatches a statement to the matching `visit_*` method
pub fn accept_default<T, V: Visitor<T>>(this: &mut V, Statement { kind, span }: Statement) -> T {
    match kind {
        StatementKind::Expression(e) => this.visit_expression_statement(e),
        StatementKind::Variable(v) => this.visit_variable_declaration(span, v),
        StatementKind::If(i) => this.visit_if_statement(span, i),
        StatementKind::Block(b) => this.visit_block_statement(span, b),
        StatementKind::Function(f) => this.visit_function_declaration(span, f),
        StatementKind::Loop(Loop::For(f)) => this.visit_for_loop(span, f),
        StatementKind::Loop(Loop::While(w)) => this.visit_while_loop(span, w),
        StatementKind::Loop(Loop::DoWhile(d)) => this.visit_do_while_loop(span, d),
        StatementKind::Return(r) => this.visit_return_statement(span, r),
        StatementKind::Try(t) => this.visit_try_catch(span, t),
        StatementKind::Throw(t) => this.visit_throw(span, t),
        StatementKind::Continue => this.visit_continue(span),
        StatementKind::Break => this.visit_break(span),
        StatementKind::Debugger => this.visit_debugger(span),
        StatementKind::Empty => this.visit_empty_statement(),
    }
}

/// Dispatches an expression to the matching `visit_*` method
pub fn accept_expr_default<T, V: Visitor<T>>(this: &mut V, Expr { kind, span }: Expr) -> T {
    match kind {
        ExprKind::Binary(e) => this.visit_binary_expression(span, e),
        ExprKind::Assignment(e) => this.visit_assignment_expression(span, e),
        ExprKind::Grouping(e) => this.visit_grouping_expression(span, e),
        ExprKind::Literal(LiteralExpr::Identifier(i)) => this.visit_identifier_expression(span, i),
        ExprKind::Literal(l) => this.visit_literal_expression(span, l),
        ExprKind::Unary(e) => this.visit_unary_expression(span, e),
        ExprKind::Call(e) => this.visit_function_call(span, e),
        ExprKind::Conditional(e) => this.visit_conditional_expr(span, e),
        ExprKind::PropertyAccess(e) => this.visit_property_access_expr(span, e, false),
        ExprKind::Sequence(e) => this.visit_sequence_expr(span, e),
        ExprKind::Prefix(e) => this.visit_prefix_expr(span, e),
        ExprKind::Postfix(e) => this.visit_postfix_expr(span, e),
        ExprKind::Function(e) => this.visit_function_expr(span, e),
        ExprKind::Array(e) => this.visit_array_literal(span, e),
        ExprKind::Object(e) => this.visit_object_literal(span, e),
        ExprKind::NewTarget => this.visit_new_target(span),
        ExprKind::Empty => this.visit_empty_expr(),
    }
}
