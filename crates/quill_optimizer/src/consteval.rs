use quill_log::debug;
use quill_middle::interner::StringInterner;
use quill_middle::lexer::token::TokenType;
use quill_middle::parser::expr::{
    ArrayLiteral, AssignmentExpr, BinaryExpr, ConditionalExpr, Expr, ExprKind, FunctionCall, GroupingExpr,
    LiteralExpr, ObjectLiteral, ObjectMemberKind, PropertyAccessExpr, UnaryExpr,
};
use quill_middle::parser::statement::{
    BlockStatement, DoWhileLoop, ForLoop, FunctionDeclaration, IfStatement, Loop, ReturnStatement, Statement,
    StatementKind, TryCatch, VariableDeclaration, VariableDeclarations, WhileLoop,
};

use crate::OptLevel;

/// Folds expressions whose operands are all literals
#[derive(Debug)]
pub struct ConstFunctionEvalCtx<'interner> {
    interner: &'interner mut StringInterner,
    opt_level: OptLevel,
}

/// ECMAScript ToInt32 for a number that is already known
fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32 as i32
}

fn truthy_f64(n: f64) -> bool {
    !n.is_nan() && n != 0.0
}

impl<'interner> ConstFunctionEvalCtx<'interner> {
    pub fn new(interner: &'interner mut StringInterner, opt_level: OptLevel) -> Self {
        Self { interner, opt_level }
    }

    /// Visits the top level statements of a script.
    ///
    /// With [`OptLevel::Aggressive`], expression statements without side effects are removed.
    /// The last statement is kept because it may be the completion value of the script.
    pub fn visit_script(&mut self, stmts: &mut Vec<Statement>) {
        self.visit_many_statements(stmts);

        if self.opt_level == OptLevel::Aggressive && stmts.len() > 1 {
            let last = stmts.len() - 1;
            let mut index = 0;
            stmts.retain(|stmt| {
                let keep = index == last || stmt_has_side_effects(stmt);
                index += 1;
                keep
            });
        }
    }

    pub fn visit_statement(&mut self, statement: &mut Statement) {
        match &mut statement.kind {
            StatementKind::Block(BlockStatement(stmts)) => self.visit_many_statements(stmts),
            StatementKind::Expression(expr) => self.visit(expr),
            StatementKind::Variable(stmt) => self.visit_variable_declaration(stmt),
            StatementKind::If(stmt) => self.visit_if_statement(stmt),
            StatementKind::Function(fun) => self.visit_function_expression(fun),
            StatementKind::Loop(stmt) => self.visit_loop_statement(stmt),
            StatementKind::Return(ReturnStatement(expr)) => self.visit(expr),
            StatementKind::Try(stmt) => self.visit_try_statement(stmt),
            StatementKind::Throw(expr) => self.visit(expr),
            StatementKind::Continue | StatementKind::Break | StatementKind::Debugger | StatementKind::Empty => {}
        }
    }

    pub fn visit_many_statements(&mut self, stmts: &mut [Statement]) {
        for stmt in stmts {
            self.visit_statement(stmt);
        }
    }

    pub fn visit_maybe_expr(&mut self, expr: Option<&mut Expr>) {
        if let Some(expr) = expr {
            self.visit(expr);
        }
    }

    pub fn visit_try_statement(&mut self, TryCatch { try_, catch, finally }: &mut TryCatch) {
        self.visit_statement(try_);
        if let Some(catch) = catch {
            self.visit_statement(&mut catch.body);
        }
        if let Some(finally) = finally {
            self.visit_statement(finally);
        }
    }

    pub fn visit_loop_statement(&mut self, loop_: &mut Loop) {
        match loop_ {
            Loop::For(ForLoop {
                init,
                condition,
                finalizer,
                body,
            }) => {
                if let Some(init) = init {
                    self.visit_statement(init);
                }
                self.visit_maybe_expr(condition.as_mut());
                self.visit_maybe_expr(finalizer.as_mut());
                self.visit_statement(body);
            }
            Loop::While(WhileLoop { condition, body }) => {
                self.visit(condition);
                self.visit_statement(body);
            }
            Loop::DoWhile(DoWhileLoop { body, condition }) => {
                self.visit_statement(body);
                self.visit(condition);
            }
        }
    }

    pub fn visit_variable_declaration(&mut self, VariableDeclarations(declarations): &mut VariableDeclarations) {
        for VariableDeclaration { value, .. } in declarations {
            self.visit_maybe_expr(value.as_mut());
        }
    }

    pub fn visit_if_statement(&mut self, IfStatement { condition, then, el }: &mut IfStatement) {
        self.visit(condition);
        self.visit_statement(then);
        if let Some(el) = el {
            self.visit_statement(el);
        }
    }

    pub fn visit_function_expression(&mut self, FunctionDeclaration { parameters, statements, .. }: &mut FunctionDeclaration) {
        for param in parameters {
            self.visit_maybe_expr(param.default.as_mut());
        }

        self.visit_many_statements(statements);
    }

    pub fn visit(&mut self, expression: &mut Expr) {
        match &mut expression.kind {
            ExprKind::Binary(..) => self.visit_binary_expression(expression),
            ExprKind::Grouping(..) => self.visit_grouping_expression(expression),
            ExprKind::Literal(..) => {}
            ExprKind::Unary(..) => self.visit_unary_expression(expression),
            ExprKind::Assignment(AssignmentExpr { left, right, .. }) => {
                self.visit(left);
                self.visit(right);
            }
            ExprKind::Call(FunctionCall { target, arguments, .. }) => {
                self.visit(target);
                arguments.iter_mut().for_each(|arg| self.visit(arg));
            }
            ExprKind::Conditional(..) => self.visit_conditional_expression(expression),
            ExprKind::PropertyAccess(PropertyAccessExpr { target, property, .. }) => {
                self.visit(target);
                self.visit(property);
            }
            ExprKind::Sequence((left, right)) => {
                self.visit(left);
                self.visit(right);
            }
            ExprKind::Prefix((_, expr)) | ExprKind::Postfix((_, expr)) => self.visit(expr),
            ExprKind::Function(fun) => self.visit_function_expression(fun),
            ExprKind::Array(ArrayLiteral(items)) => items.iter_mut().for_each(|item| self.visit(item)),
            ExprKind::Object(ObjectLiteral(members)) => {
                for (kind, value) in members {
                    if let ObjectMemberKind::Dynamic(key) = kind {
                        self.visit(key);
                    }
                    self.visit(value);
                }
            }
            ExprKind::NewTarget | ExprKind::Empty => {}
        }
    }

    /// `(literal)` is replaced by the literal. Other groupings are kept, since e.g. `(0, a.b)()`
    /// calls `a.b` with a different `this` than `a.b()`.
    fn visit_grouping_expression(&mut self, grouping_expr: &mut Expr) {
        let ExprKind::Grouping(GroupingExpr(exprs)) = &mut grouping_expr.kind else {
            unreachable!()
        };

        exprs.iter_mut().for_each(|e| self.visit(e));

        if let [Expr {
            kind: ExprKind::Literal(lit),
            ..
        }] = exprs.as_slice()
            && !matches!(lit, LiteralExpr::Identifier(..))
        {
            grouping_expr.kind = ExprKind::Literal(lit.clone());
        }
    }

    fn visit_conditional_expression(&mut self, conditional_expr: &mut Expr) {
        let ExprKind::Conditional(ConditionalExpr { condition, then, el }) = &mut conditional_expr.kind else {
            unreachable!()
        };
        self.visit(condition);
        self.visit(then);
        self.visit(el);

        if let ExprKind::Literal(lit) = &condition.kind {
            match lit.is_truthy() {
                Some(true) => {
                    debug!("reduced condition to true");
                    *conditional_expr = (**then).clone();
                }
                Some(false) => {
                    debug!("reduced condition to false");
                    *conditional_expr = (**el).clone();
                }
                None => {}
            }
        }
    }

    fn visit_unary_expression(&mut self, unary_expr: &mut Expr) {
        let ExprKind::Unary(UnaryExpr { operator, expr }) = &mut unary_expr.kind else {
            unreachable!()
        };

        self.visit(expr);

        use ExprKind::*;
        use LiteralExpr::*;

        match (*operator, &expr.kind) {
            (TokenType::Minus, &Literal(Number(n))) => unary_expr.kind = Literal(Number(-n)),
            (TokenType::Plus, &Literal(Number(n))) => unary_expr.kind = Literal(Number(n)),
            (TokenType::BitwiseNot, &Literal(Number(n))) => unary_expr.kind = Literal(Number(!to_int32(n) as f64)),
            (TokenType::LogicalNot, Literal(lit)) => {
                if let Some(b) = lit.is_truthy() {
                    unary_expr.kind = Literal(Boolean(!b));
                }
            }
            _ => {}
        }
    }

    fn visit_binary_expression(&mut self, binary_expr: &mut Expr) {
        let ExprKind::Binary(BinaryExpr { left, right, operator }) = &mut binary_expr.kind else {
            unreachable!()
        };
        self.visit(left);
        self.visit(right);

        use ExprKind::*;
        use LiteralExpr::*;
        use TokenType as T;

        macro_rules! f64_op {
            ($left:ident $t:tt $right:ident) => {{
                binary_expr.kind = Literal(Number($left $t $right));
            }};
        }
        macro_rules! f64_op_to_bool {
            ($left:ident $t:tt $right:ident) => {{
                binary_expr.kind = Literal(Boolean($left $t $right));
            }};
        }
        macro_rules! i32_op {
            ($left:ident $t:tt $right:ident) => {{
                binary_expr.kind = Literal(Number((to_int32($left) $t to_int32($right)) as f64));
            }};
        }
        macro_rules! shift_op {
            ($left:ident, $right:ident, $fun:ident) => {{
                binary_expr.kind = Literal(Number(to_int32($left).$fun(to_int32($right) as u32 & 31) as f64));
            }};
        }

        match (&left.kind, &right.kind, *operator) {
            (&Literal(Number(l)), &Literal(Number(r)), op) => {
                match op {
                    T::Plus => f64_op!(l + r),
                    T::Minus => f64_op!(l - r),
                    T::Star => f64_op!(l * r),
                    T::Slash => f64_op!(l / r),
                    T::Remainder => f64_op!(l % r),
                    T::Exponentiation => binary_expr.kind = Literal(Number(l.powf(r))),
                    T::Greater => f64_op_to_bool!(l > r),
                    T::GreaterEqual => f64_op_to_bool!(l >= r),
                    T::Less => f64_op_to_bool!(l < r),
                    T::LessEqual => f64_op_to_bool!(l <= r),
                    T::Equality | T::StrictEquality => f64_op_to_bool!(l == r),
                    T::Inequality | T::StrictInequality => f64_op_to_bool!(l != r),
                    T::BitwiseOr => i32_op!(l | r),
                    T::BitwiseAnd => i32_op!(l & r),
                    T::BitwiseXor => i32_op!(l ^ r),
                    T::LeftShift => shift_op!(l, r, wrapping_shl),
                    T::RightShift => shift_op!(l, r, wrapping_shr),
                    T::UnsignedRightShift => {
                        binary_expr.kind =
                            Literal(Number(((to_int32(l) as u32) >> (to_int32(r) as u32 & 31)) as f64));
                    }
                    T::LogicalOr => binary_expr.kind = Literal(Number(if truthy_f64(l) { l } else { r })),
                    T::LogicalAnd => binary_expr.kind = Literal(Number(if truthy_f64(l) { r } else { l })),
                    T::NullishCoalescing => binary_expr.kind = Literal(Number(l)),
                    _ => {}
                }
            }
            (Literal(LiteralExpr::String(l)), Literal(LiteralExpr::String(r)), op) => match op {
                T::Equality | T::StrictEquality => binary_expr.kind = Literal(Boolean(l == r)),
                T::Inequality | T::StrictInequality => binary_expr.kind = Literal(Boolean(l != r)),
                T::Plus => {
                    let mut concat = self.interner.resolve(*l).to_owned();
                    concat += self.interner.resolve(*r);
                    binary_expr.kind = Literal(LiteralExpr::String(self.interner.intern(concat)));
                }
                _ => {}
            },
            (Literal(lit), _, T::LogicalOr | T::LogicalAnd | T::NullishCoalescing) if !matches!(lit, Identifier(..)) => {
                let picks_left = match *operator {
                    T::LogicalOr => lit.is_truthy(),
                    T::LogicalAnd => lit.is_truthy().map(|t| !t),
                    _ => Some(!matches!(lit, Null | Undefined)),
                };
                match picks_left {
                    Some(true) => binary_expr.kind = Literal(lit.clone()),
                    Some(false) => *binary_expr = (**right).clone(),
                    None => {}
                }
            }
            _ => {}
        }
    }
}

fn stmt_has_side_effects(stmt: &Statement) -> bool {
    match &stmt.kind {
        StatementKind::Block(BlockStatement(block)) => block.iter().any(stmt_has_side_effects),
        StatementKind::Empty => false,
        StatementKind::Expression(expr) => expr_has_side_effects(expr),
        _ => true,
    }
}

fn expr_has_side_effects(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Array(ArrayLiteral(array)) => array.iter().any(expr_has_side_effects),
        ExprKind::Binary(BinaryExpr { left, right, .. }) => expr_has_side_effects(left) || expr_has_side_effects(right),
        ExprKind::Conditional(ConditionalExpr { condition, then, el }) => {
            expr_has_side_effects(condition) || expr_has_side_effects(then) || expr_has_side_effects(el)
        }
        ExprKind::Empty | ExprKind::Function(..) | ExprKind::NewTarget => false,
        ExprKind::Grouping(GroupingExpr(grouping)) => grouping.iter().any(expr_has_side_effects),
        // might throw a ReferenceError
        ExprKind::Literal(LiteralExpr::Identifier(..)) => true,
        ExprKind::Literal(..) => false,
        ExprKind::Object(ObjectLiteral(object)) => object.iter().any(|(kind, expr)| {
            if let ObjectMemberKind::Dynamic(dynamic) = kind
                && expr_has_side_effects(dynamic)
            {
                return true;
            }
            expr_has_side_effects(expr)
        }),
        _ => true,
    }
}

#[cfg(test)]
mod test {
    use quill_lexer::Lexer;
    use quill_middle::interner::StringInterner;
    use quill_middle::parser::expr::{ExprKind, LiteralExpr};
    use quill_middle::parser::statement::{Statement, StatementKind};
    use quill_parser::Parser;

    use crate::{OptLevel, optimize_ast};

    fn optimize(source: &str, opt: OptLevel) -> (Vec<Statement>, StringInterner) {
        let mut interner = StringInterner::new();
        let tokens = Lexer::new(&mut interner, source).scan_all().unwrap();
        let mut ast = Parser::new(&mut interner, source, tokens).parse_all().unwrap();
        optimize_ast(&mut ast, &mut interner, opt);
        (ast, interner)
    }

    fn literal(stmt: &Statement) -> &LiteralExpr {
        match &stmt.kind {
            StatementKind::Expression(expr) => match &expr.kind {
                ExprKind::Literal(lit) => lit,
                other => panic!("expected a literal, got {other:?}"),
            },
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn folds_arithmetic() {
        let (ast, _) = optimize("(1 + 2) * 3 - -1; 1 << 33; -1 >>> 28; 2 ** 10", OptLevel::Basic);
        assert_eq!(literal(&ast[0]), &LiteralExpr::Number(10.0));
        assert_eq!(literal(&ast[1]), &LiteralExpr::Number(2.0));
        assert_eq!(literal(&ast[2]), &LiteralExpr::Number(15.0));
        assert_eq!(literal(&ast[3]), &LiteralExpr::Number(1024.0));
    }

    #[test]
    fn folds_strings_and_logic() {
        let (ast, interner) = optimize("'new.' + 'target'; !0; null ?? 'x'; 0 || 5; 'a' === 'a'", OptLevel::Basic);
        let LiteralExpr::String(s) = literal(&ast[0]) else {
            panic!("expected a string");
        };
        assert_eq!(interner.resolve(*s), "new.target");
        assert_eq!(literal(&ast[1]), &LiteralExpr::Boolean(true));
        assert!(matches!(literal(&ast[2]), LiteralExpr::String(_)));
        assert_eq!(literal(&ast[3]), &LiteralExpr::Number(5.0));
        assert_eq!(literal(&ast[4]), &LiteralExpr::Boolean(true));
    }

    #[test]
    fn identifiers_are_not_folded() {
        let (ast, _) = optimize("x + 1", OptLevel::Basic);
        let StatementKind::Expression(expr) = &ast[0].kind else {
            panic!("expected an expression statement");
        };
        assert!(matches!(expr.kind, ExprKind::Binary(_)));
    }

    #[test]
    fn none_level_leaves_ast_untouched() {
        let (ast, _) = optimize("1 + 2", OptLevel::None);
        let StatementKind::Expression(expr) = &ast[0].kind else {
            panic!("expected an expression statement");
        };
        assert!(matches!(expr.kind, ExprKind::Binary(_)));
    }

    #[test]
    fn aggressive_drops_dead_statements_but_keeps_completion_value() {
        let (ast, _) = optimize("1; f(); 'a'; 2", OptLevel::Aggressive);
        assert_eq!(ast.len(), 2);
        assert_eq!(literal(&ast[1]), &LiteralExpr::Number(2.0));

        let (ast, _) = optimize("1; f(); 'a'; 2", OptLevel::Basic);
        assert_eq!(ast.len(), 4);
    }

    #[test]
    fn opt_level_from_str() {
        assert_eq!(OptLevel::from_level("0"), Some(OptLevel::None));
        assert_eq!(OptLevel::from_level("2"), Some(OptLevel::Aggressive));
        assert_eq!(OptLevel::from_level("3"), None);
        assert_eq!(OptLevel::default(), OptLevel::Basic);
    }
}
