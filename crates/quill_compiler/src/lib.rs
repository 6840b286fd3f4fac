use std::mem;
use std::rc::Rc;

use quill_log::{Level, debug, span};
use quill_middle::compiler::constant::{Constant, ConstantPool, Function};
use quill_middle::compiler::external::External;
use quill_middle::compiler::instruction::AssignKind;
use quill_middle::compiler::{CompileResult, FunctionCallMetadata};
use quill_middle::interner::{StringInterner, Symbol, sym};
use quill_middle::lexer::token::TokenType;
use quill_middle::parser::error::Error;
use quill_middle::parser::expr::{
    ArrayLiteral, AssignmentExpr, BinaryExpr, ConditionalExpr, Expr, ExprKind, FunctionCall, GroupingExpr,
    LiteralExpr, ObjectLiteral, ObjectMemberKind, Postfix, Prefix, PropertyAccessExpr, Seq, UnaryExpr,
};
use quill_middle::parser::statement::{
    BlockStatement, Catch, DoWhileLoop, ForLoop, FunctionDeclaration, IfStatement, Parameter,
    ReturnStatement, Statement, StatementKind, TryCatch, VariableDeclaration, VariableDeclarationKind,
    VariableDeclarations, WhileLoop,
};
use quill_middle::sourcemap::Span;
use quill_middle::visitor::{self, Visitor};

use crate::builder::{InstructionBuilder, Label};
use crate::instruction::{InstructionWriter, ObjectMember};
use crate::jump_container::JumpContainer;
use crate::scope::Scope;

pub mod builder;
#[cfg(feature = "from_string")]
pub mod from_string;
pub mod instruction;
mod jump_container;
mod scope;
#[cfg(test)]
mod test;
pub mod transformations;

/// A try block that is active at the current position of a function
#[derive(Debug, Clone)]
struct TryBlock {
    /// Runs whenever control leaves the block, including through `return`, `break` and `continue`
    finally: Option<Statement>,
}

#[derive(Debug, Clone, Copy)]
struct Breakable {
    loop_id: usize,
    /// Number of try blocks that were active when the loop was entered
    try_depth: usize,
}

/// Compilation state of a single function
#[derive(Debug)]
struct FunctionState {
    /// Instruction buffer
    buf: Vec<u8>,
    /// A list of constants used throughout this function.
    cp: ConstantPool,
    /// Scope manager, stores local variables
    scope: Scope,
    /// Variables captured from enclosing functions
    externals: Vec<External>,
    /// Whether this is the top level of a script, whose `var` and function declarations are globals
    is_script: bool,
    /// Try blocks the current instruction is in, innermost last
    try_blocks: Vec<TryBlock>,
    /// A stack of loops that `break` and `continue` refer to
    breakables: Vec<Breakable>,
    /// Keeps track of the total number of loops to be able to have unique IDs
    loop_counter: usize,
    /// Container for labels that are jumped to from other nodes, i.e. loop labels
    jc: JumpContainer,
    jump_limit_exceeded: bool,
}

impl FunctionState {
    fn new(is_script: bool) -> Self {
        Self {
            buf: Vec::new(),
            cp: ConstantPool::new(),
            scope: Scope::new(),
            externals: Vec::new(),
            is_script,
            try_blocks: Vec::new(),
            breakables: Vec::new(),
            loop_counter: 0,
            jc: JumpContainer::new(),
            jump_limit_exceeded: false,
        }
    }

    fn add_external(&mut self, external: External) -> Option<u16> {
        match self.externals.iter().position(|e| *e == external) {
            Some(id) => u16::try_from(id).ok(),
            None => {
                let id = u16::try_from(self.externals.len()).ok()?;
                self.externals.push(external);
                Some(id)
            }
        }
    }
}

/// A resolved reference to a local variable
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLocal {
    /// Local id, or external id if `is_extern` is set
    pub id: u16,
    pub kind: VariableDeclarationKind,
    /// Whether the variable lives in an enclosing function
    pub is_extern: bool,
}

pub struct FunctionCompiler<'interner> {
    /// The function that is currently being compiled
    state: FunctionState,
    /// Functions enclosing `state`, innermost last.
    ///
    /// This is used for resolving variables in enclosing environments
    enclosing: Vec<FunctionState>,
    interner: &'interner StringInterner,
    /// Source code of the script, shared by every compiled function
    source: Rc<str>,
}

impl<'interner> FunctionCompiler<'interner> {
    pub fn new(interner: &'interner StringInterner, source: Rc<str>) -> Self {
        Self {
            state: FunctionState::new(true),
            enclosing: Vec::new(),
            interner,
            source,
        }
    }

    /// Compiles the top level of a script.
    ///
    /// If `implicit_return` is set, the value of the last expression statement is returned.
    pub fn compile_ast(mut self, ast: Vec<Statement>, implicit_return: bool) -> Result<CompileResult, Error> {
        let span = span!(Level::TRACE, "compile ast");
        let _enter = span.enter();

        self.compile_body(ast, implicit_return)?;

        let FunctionState {
            buf,
            cp,
            scope,
            externals,
            ..
        } = self.state;

        debug!("compiled script: {} bytes, {} locals", buf.len(), scope.len());

        Ok(CompileResult {
            instructions: buf,
            cp,
            locals: scope.len(),
            externals,
        })
    }

    fn compile_body(&mut self, mut ast: Vec<Statement>, implicit_return: bool) -> Result<(), Error> {
        if implicit_return {
            transformations::ast_patch_implicit_return(&mut ast);
        } else {
            // Push an implicit `return undefined;` statement at the end in case there is not already an explicit one
            transformations::ast_insert_implicit_return(&mut ast);
        }

        let mut ib = InstructionBuilder::new(self);
        for name in transformations::hoisted_declarations(&ast) {
            if ib.state.is_script {
                ib.build_declare_global(name)
                    .map_err(|_| Error::ConstantPoolLimitExceeded(Span::COMPILER_GENERATED))?;
            } else {
                ib.state
                    .scope
                    .add_local(name, VariableDeclarationKind::Var)
                    .map_err(|_| Error::LocalLimitExceeded(Span::COMPILER_GENERATED))?;
            }
        }

        // Function declarations are initialized before any other statement runs
        let (functions, statements): (Vec<_>, Vec<_>) = ast
            .into_iter()
            .partition(|stmt| matches!(stmt.kind, StatementKind::Function(..)));

        ib.accept_multiple(functions)?;
        ib.accept_multiple(statements)?;

        if ib.state.jump_limit_exceeded {
            return Err(Error::JumpLimitExceeded(Span::COMPILER_GENERATED));
        }

        Ok(())
    }

    pub fn accept_multiple(&mut self, stmts: Vec<Statement>) -> Result<(), Error> {
        for stmt in stmts {
            self.accept(stmt)?;
        }
        Ok(())
    }

    /// Tries to find a local in the current or surrounding functions
    ///
    /// A local found in an enclosing function is threaded through the externals of every function in between
    pub fn find_local(&mut self, span: Span, ident: Symbol) -> Result<Option<ResolvedLocal>, Error> {
        if let Some((id, local)) = self.state.scope.find_local(ident) {
            return Ok(Some(ResolvedLocal {
                id,
                kind: local.kind(),
                is_extern: false,
            }));
        }

        let found = self.enclosing.iter().enumerate().rev().find_map(|(depth, state)| {
            state
                .scope
                .find_local(ident)
                .map(|(id, local)| (depth, id, local.kind()))
        });

        let Some((depth, mut id, kind)) = found else {
            return Ok(None);
        };

        // The first function below the owner captures the local itself, all others capture its external
        let mut is_nested_external = false;
        for state in self.enclosing[depth + 1..]
            .iter_mut()
            .chain(std::iter::once(&mut self.state))
        {
            id = state
                .add_external(External { id, is_nested_external })
                .ok_or(Error::LocalLimitExceeded(span))?;
            is_nested_external = true;
        }

        Ok(Some(ResolvedLocal {
            id,
            kind,
            is_extern: true,
        }))
    }

    fn enter_function(&mut self) {
        let outer = mem::replace(&mut self.state, FunctionState::new(false));
        self.enclosing.push(outer);
    }

    fn exit_function(&mut self) -> FunctionState {
        match self.enclosing.pop() {
            Some(outer) => mem::replace(&mut self.state, outer),
            None => unreachable!("exit_function called without a matching enter_function"),
        }
    }

    fn compile_function(&mut self, parameters: Vec<Parameter>, statements: Vec<Statement>) -> Result<(), Error> {
        for param in &parameters {
            self.state
                .scope
                .add_param(param.name)
                .map_err(|_| Error::ParameterLimitExceeded(Span::COMPILER_GENERATED))?;
        }

        for (id, param) in parameters.into_iter().enumerate() {
            if let Some(default) = param.default {
                let id = id as u16;
                let mut ib = InstructionBuilder::new(self);
                ib.build_local_load(id, false);
                ib.build_undef();
                ib.build_strict_eq();
                ib.build_jmpfalsep(Label::ParamDefaultEnd, true);
                ib.accept_expr(default)?;
                ib.build_local_store(AssignKind::Assignment, id, false);
                ib.build_pop();
                ib.add_local_label(Label::ParamDefaultEnd);
            }
        }

        self.compile_body(statements, false)
    }

    /// "Prepares" a loop and returns a unique ID that identifies this loop
    ///
    /// Specifically, this function increments a function-local loop counter and
    /// inserts the loop into the stack of breakables so that `break` (and `continue`)
    /// statements can be resolved at compile-time
    fn prepare_loop(&mut self) -> usize {
        let loop_id = self.state.loop_counter;
        self.state.breakables.push(Breakable {
            loop_id,
            try_depth: self.state.try_blocks.len(),
        });
        self.state.loop_counter += 1;
        loop_id
    }

    fn exit_loop(&mut self) {
        self.state.breakables.pop();
    }

    fn add_global_label(&mut self, label: Label) {
        let state = &mut self.state;
        let in_range = state.jc.add_label(label, &mut state.buf);
        state.jump_limit_exceeded |= !in_range;
    }

    /// Jumps to a label that was previously (or will be) created by a call to `add_global_label`
    fn add_global_jump(&mut self, label: Label) {
        let state = &mut self.state;
        let in_range = state.jc.add_jump(label, &mut state.buf);
        state.jump_limit_exceeded |= !in_range;
    }

    /// Leaves all try blocks above `target_depth`, innermost first, running their finally blocks.
    ///
    /// Used for control flow that exits try blocks without throwing.
    fn leave_try_blocks(&mut self, target_depth: usize) -> Result<(), Error> {
        let blocks = mem::take(&mut self.state.try_blocks);
        let mut result = Ok(());

        for depth in (target_depth..blocks.len()).rev() {
            // a finally block only sees the try blocks that enclose its own try statement
            self.state.try_blocks = blocks[..depth].to_vec();
            InstructionBuilder::new(self).build_try_end();

            if let Some(finally) = &blocks[depth].finally {
                result = self.accept(finally.clone());
                if result.is_err() {
                    break;
                }
            }
        }

        self.state.try_blocks = blocks;
        result
    }

    /// Compiles a store to `target`, combining the old value with `rhs` as described by `kind`
    fn compile_store(&mut self, span: Span, target: Expr, kind: AssignKind, rhs: Option<Expr>) -> Result<(), Error> {
        let cp_limit = |_| Error::ConstantPoolLimitExceeded(span);

        match unwrap_grouping(target).kind {
            ExprKind::Literal(LiteralExpr::Identifier(ident)) if ident != sym::this => {
                if let Some(rhs) = rhs {
                    self.accept_expr(rhs)?;
                }

                match self.find_local(span, ident)? {
                    Some(local) => {
                        if local.kind == VariableDeclarationKind::Const {
                            return Err(Error::ConstAssignment(span));
                        }
                        InstructionBuilder::new(self).build_local_store(kind, local.id, local.is_extern);
                    }
                    None => InstructionBuilder::new(self)
                        .build_global_store(kind, ident)
                        .map_err(cp_limit)?,
                }
            }
            ExprKind::PropertyAccess(PropertyAccessExpr {
                computed,
                target,
                property,
            }) => {
                self.accept_expr(*target)?;

                if computed {
                    self.accept_expr(*property)?;
                    if let Some(rhs) = rhs {
                        self.accept_expr(rhs)?;
                    }
                    InstructionBuilder::new(self).build_dynamic_prop_assign(kind);
                } else {
                    let ident = property.as_identifier().ok_or(Error::InvalidAssignmentTarget(span))?;
                    if let Some(rhs) = rhs {
                        self.accept_expr(rhs)?;
                    }
                    InstructionBuilder::new(self)
                        .build_static_prop_assign(kind, ident)
                        .map_err(cp_limit)?;
                }
            }
            _ => return Err(Error::InvalidAssignmentTarget(span)),
        }

        Ok(())
    }

    /// Compiles `target ||= rhs`, `target &&= rhs` and `target ??= rhs`.
    ///
    /// The target object and key of a property are evaluated once and kept in temporaries.
    fn compile_logical_assignment(&mut self, span: Span, target: Expr, operator: TokenType, rhs: Expr) -> Result<(), Error> {
        let target = unwrap_grouping(target);
        let cp_limit = |_| Error::ConstantPoolLimitExceeded(span);
        let local_limit = |_| Error::LocalLimitExceeded(span);

        match target.kind {
            ExprKind::PropertyAccess(PropertyAccessExpr {
                computed,
                target: object,
                property,
            }) => {
                let object_tmp = self.state.scope.add_temp().map_err(local_limit)?;
                self.accept_expr(*object)?;
                let mut ib = InstructionBuilder::new(self);
                ib.build_local_store(AssignKind::Assignment, object_tmp, false);
                ib.build_pop();

                let key = if computed {
                    let key_tmp = ib.state.scope.add_temp().map_err(local_limit)?;
                    ib.accept_expr(*property)?;
                    ib.build_local_store(AssignKind::Assignment, key_tmp, false);
                    ib.build_pop();
                    PropertyKey::Temp(key_tmp)
                } else {
                    PropertyKey::Static(property.as_identifier().ok_or(Error::InvalidAssignmentTarget(span))?)
                };

                ib.build_local_load(object_tmp, false);
                match key {
                    PropertyKey::Static(ident) => ib.build_static_prop_access(ident, false).map_err(cp_limit)?,
                    PropertyKey::Temp(key_tmp) => {
                        ib.build_local_load(key_tmp, false);
                        ib.build_dynamic_prop_access(false);
                    }
                }

                ib.build_logical_jump(operator);
                ib.build_pop();
                ib.build_local_load(object_tmp, false);
                match key {
                    PropertyKey::Static(ident) => {
                        ib.accept_expr(rhs)?;
                        ib.build_static_prop_assign(AssignKind::Assignment, ident)
                            .map_err(cp_limit)?;
                    }
                    PropertyKey::Temp(key_tmp) => {
                        ib.build_local_load(key_tmp, false);
                        ib.accept_expr(rhs)?;
                        ib.build_dynamic_prop_assign(AssignKind::Assignment);
                    }
                }
                ib.add_local_label(Label::IfEnd);
            }
            kind => {
                let target = Expr { kind, span: target.span };
                let mut ib = InstructionBuilder::new(self);
                ib.accept_expr(target.clone())?;
                ib.build_logical_jump(operator);
                ib.build_pop();
                ib.compile_store(span, target, AssignKind::Assignment, Some(rhs))?;
                ib.add_local_label(Label::IfEnd);
            }
        }

        Ok(())
    }
}

impl InstructionBuilder<'_, '_> {
    /// Jumps to [`Label::IfEnd`] if the last value on the stack short circuits `operator`, keeping the value.
    /// Otherwise falls through with the value still on the stack.
    fn build_logical_jump(&mut self, operator: TokenType) {
        match operator {
            TokenType::LogicalOr | TokenType::LogicalOrAssignment => self.build_jmptruenp(Label::IfEnd, true),
            TokenType::LogicalAnd | TokenType::LogicalAndAssignment => self.build_jmpfalsenp(Label::IfEnd, true),
            _ => {
                self.build_jmpnullishnp(Label::IfBranch, true);
                self.build_jmp(Label::IfEnd, true);
                self.add_local_label(Label::IfBranch);
            }
        }
    }
}

/// The key of a property whose target is kept in a temporary local
#[derive(Debug, Clone, Copy)]
enum PropertyKey {
    Static(Symbol),
    /// A computed key, evaluated into this local
    Temp(u16),
}

/// Strips parentheses around a single expression
fn unwrap_grouping(mut expr: Expr) -> Expr {
    while let ExprKind::Grouping(GroupingExpr(exprs)) = &mut expr.kind {
        if exprs.len() != 1 {
            break;
        }
        match exprs.pop() {
            Some(inner) => expr = inner,
            None => break,
        }
    }
    expr
}

fn assign_kind(operator: TokenType) -> Option<AssignKind> {
    Some(match operator {
        TokenType::Assignment => AssignKind::Assignment,
        TokenType::AdditionAssignment => AssignKind::AddAssignment,
        TokenType::SubtractionAssignment => AssignKind::SubAssignment,
        TokenType::MultiplicationAssignment => AssignKind::MulAssignment,
        TokenType::DivisionAssignment => AssignKind::DivAssignment,
        TokenType::RemainderAssignment => AssignKind::RemAssignment,
        TokenType::ExponentiationAssignment => AssignKind::PowAssignment,
        TokenType::LeftShiftAssignment => AssignKind::ShlAssignment,
        TokenType::RightShiftAssignment => AssignKind::ShrAssignment,
        TokenType::UnsignedRightShiftAssignment => AssignKind::UshrAssignment,
        TokenType::BitwiseAndAssignment => AssignKind::BitAndAssignment,
        TokenType::BitwiseOrAssignment => AssignKind::BitOrAssignment,
        TokenType::BitwiseXorAssignment => AssignKind::BitXorAssignment,
        _ => return None,
    })
}

impl Visitor<Result<(), Error>> for FunctionCompiler<'_> {
    fn accept(&mut self, stmt: Statement) -> Result<(), Error> {
        visitor::accept_default(self, stmt)
    }

    fn accept_expr(&mut self, expr: Expr) -> Result<(), Error> {
        visitor::accept_expr_default(self, expr)
    }

    fn visit_expression_statement(&mut self, expr: Expr) -> Result<(), Error> {
        self.accept_expr(expr)?;
        InstructionBuilder::new(self).build_pop();
        Ok(())
    }

    fn visit_binary_expression(&mut self, span: Span, BinaryExpr { left, right, operator }: BinaryExpr) -> Result<(), Error> {
        let mut ib = InstructionBuilder::new(self);
        ib.accept_expr(*left)?;

        macro_rules! trivial_case {
            ($k:expr) => {{
                ib.accept_expr(*right)?;
                $k(&mut ib)
            }};
        }

        match operator {
            TokenType::Plus => trivial_case!(InstructionBuilder::build_add),
            TokenType::Minus => trivial_case!(InstructionBuilder::build_sub),
            TokenType::Star => trivial_case!(InstructionBuilder::build_mul),
            TokenType::Slash => trivial_case!(InstructionBuilder::build_div),
            TokenType::Remainder => trivial_case!(InstructionBuilder::build_rem),
            TokenType::Exponentiation => trivial_case!(InstructionBuilder::build_pow),
            TokenType::Greater => trivial_case!(InstructionBuilder::build_gt),
            TokenType::GreaterEqual => trivial_case!(InstructionBuilder::build_ge),
            TokenType::Less => trivial_case!(InstructionBuilder::build_lt),
            TokenType::LessEqual => trivial_case!(InstructionBuilder::build_le),
            TokenType::Equality => trivial_case!(InstructionBuilder::build_eq),
            TokenType::Inequality => trivial_case!(InstructionBuilder::build_ne),
            TokenType::StrictEquality => trivial_case!(InstructionBuilder::build_strict_eq),
            TokenType::StrictInequality => trivial_case!(InstructionBuilder::build_strict_ne),
            TokenType::BitwiseOr => trivial_case!(InstructionBuilder::build_bitor),
            TokenType::BitwiseXor => trivial_case!(InstructionBuilder::build_bitxor),
            TokenType::BitwiseAnd => trivial_case!(InstructionBuilder::build_bitand),
            TokenType::LeftShift => trivial_case!(InstructionBuilder::build_bitshl),
            TokenType::RightShift => trivial_case!(InstructionBuilder::build_bitshr),
            TokenType::UnsignedRightShift => trivial_case!(InstructionBuilder::build_bitushr),
            TokenType::In => trivial_case!(InstructionBuilder::build_objin),
            TokenType::Instanceof => trivial_case!(InstructionBuilder::build_instanceof),
            TokenType::LogicalOr | TokenType::LogicalAnd | TokenType::NullishCoalescing => {
                ib.build_logical_jump(operator);
                ib.build_pop(); // only pop the left hand side if it does not short circuit
                ib.accept_expr(*right)?;
                ib.add_local_label(Label::IfEnd);
            }
            other => return Err(Error::Unimplemented(span, format!("binary operator `{other}`"))),
        }

        Ok(())
    }

    fn visit_grouping_expression(&mut self, _span: Span, GroupingExpr(exprs): GroupingExpr) -> Result<(), Error> {
        let last = exprs.len().saturating_sub(1);

        for (index, expr) in exprs.into_iter().enumerate() {
            self.accept_expr(expr)?;
            if index != last {
                InstructionBuilder::new(self).build_pop();
            }
        }

        Ok(())
    }

    fn visit_literal_expression(&mut self, span: Span, expr: LiteralExpr) -> Result<(), Error> {
        let mut ib = InstructionBuilder::new(self);
        match expr {
            LiteralExpr::Undefined => ib.build_undef(),
            expr => ib
                .build_constant(Constant::from_literal(&expr))
                .map_err(|_| Error::ConstantPoolLimitExceeded(span))?,
        }
        Ok(())
    }

    fn visit_identifier_expression(&mut self, span: Span, ident: Symbol) -> Result<(), Error> {
        if ident == sym::this {
            InstructionBuilder::new(self).build_this();
            return Ok(());
        }

        let local = self.find_local(span, ident)?;
        let mut ib = InstructionBuilder::new(self);

        match (local, ident) {
            (Some(local), _) => ib.build_local_load(local.id, local.is_extern),
            (None, sym::globalThis) => ib.build_global(),
            (None, sym::undefined) => ib.build_undef(),
            (None, ident) => ib
                .build_global_load(ident)
                .map_err(|_| Error::ConstantPoolLimitExceeded(span))?,
        }

        Ok(())
    }

    fn visit_unary_expression(&mut self, span: Span, UnaryExpr { operator, expr }: UnaryExpr) -> Result<(), Error> {
        let cp_limit = |_| Error::ConstantPoolLimitExceeded(span);
        let expr = unwrap_grouping(*expr);

        match (operator, expr.kind) {
            // Special case delete operator, as it works different from other unary operators
            (TokenType::Delete, ExprKind::PropertyAccess(PropertyAccessExpr { computed, target, property })) => {
                self.accept_expr(*target)?;
                match (computed, property.as_identifier()) {
                    (false, Some(ident)) => InstructionBuilder::new(self)
                        .build_constant(Constant::String(ident))
                        .map_err(cp_limit)?,
                    _ => self.accept_expr(*property)?,
                }
                InstructionBuilder::new(self).build_dynamic_delete();
            }
            (TokenType::Delete, ExprKind::Literal(LiteralExpr::Identifier(ident))) if ident != sym::this => {
                let is_local = self.find_local(span, ident)?.is_some();
                let mut ib = InstructionBuilder::new(self);
                if is_local {
                    ib.build_constant(Constant::Boolean(false)).map_err(cp_limit)?;
                } else {
                    ib.build_global();
                    ib.build_constant(Constant::String(ident)).map_err(cp_limit)?;
                    ib.build_dynamic_delete();
                }
            }
            (TokenType::Delete, kind) => {
                self.accept_expr(Expr { kind, span: expr.span })?;
                let mut ib = InstructionBuilder::new(self);
                ib.build_pop();
                ib.build_constant(Constant::Boolean(true)).map_err(cp_limit)?;
            }
            // `typeof x` does not throw for undeclared globals
            (TokenType::Typeof, ExprKind::Literal(LiteralExpr::Identifier(ident)))
                if ident != sym::this && self.find_local(span, ident)?.is_none() =>
            {
                InstructionBuilder::new(self)
                    .build_typeof_global(ident)
                    .map_err(cp_limit)?;
            }
            (operator, kind) => {
                self.accept_expr(Expr { kind, span: expr.span })?;
                let mut ib = InstructionBuilder::new(self);

                match operator {
                    TokenType::Plus => ib.build_pos(),
                    TokenType::Minus => ib.build_neg(),
                    TokenType::Typeof => ib.build_typeof(),
                    TokenType::BitwiseNot => ib.build_bitnot(),
                    TokenType::LogicalNot => ib.build_not(),
                    TokenType::Void => {
                        ib.build_pop();
                        ib.build_undef();
                    }
                    _ => return Err(Error::Unimplemented(span, format!("unary operator `{operator}`"))),
                }
            }
        }

        Ok(())
    }

    fn visit_variable_declaration(&mut self, span: Span, VariableDeclarations(decls): VariableDeclarations) -> Result<(), Error> {
        for VariableDeclaration { binding, value } in decls {
            let is_global = binding.kind == VariableDeclarationKind::Var && self.state.is_script;

            if is_global {
                // `var x;` leaves an existing global untouched
                if let Some(value) = value {
                    self.accept_expr(value)?;
                    let mut ib = InstructionBuilder::new(self);
                    ib.build_global_store(AssignKind::Assignment, binding.name)
                        .map_err(|_| Error::ConstantPoolLimitExceeded(span))?;
                    ib.build_pop();
                }
                continue;
            }

            let id = self
                .state
                .scope
                .add_local(binding.name, binding.kind)
                .map_err(|_| Error::LocalLimitExceeded(span))?;

            let value = match (value, binding.kind) {
                (Some(value), _) => value,
                (None, VariableDeclarationKind::Var) => continue,
                // `let x;` resets the binding each time the declaration runs, e.g. in a loop body
                (None, _) => Expr::undefined_literal(),
            };

            self.accept_expr(value)?;
            let mut ib = InstructionBuilder::new(self);
            ib.build_local_store(AssignKind::Assignment, id, false);
            ib.build_pop();
        }

        Ok(())
    }

    fn visit_if_statement(&mut self, _span: Span, IfStatement { condition, then, el }: IfStatement) -> Result<(), Error> {
        let mut ib = InstructionBuilder::new(self);

        ib.accept_expr(condition)?;

        match el {
            Some(el) => {
                ib.build_jmpfalsep(Label::IfBranch, true);
                ib.accept(*then)?;
                ib.build_jmp(Label::IfEnd, true);
                ib.add_local_label(Label::IfBranch);
                ib.accept(*el)?;
            }
            None => {
                ib.build_jmpfalsep(Label::IfEnd, true);
                ib.accept(*then)?;
            }
        }

        ib.add_local_label(Label::IfEnd);
        Ok(())
    }

    fn visit_block_statement(&mut self, _span: Span, BlockStatement(stmts): BlockStatement) -> Result<(), Error> {
        self.state.scope.enter();
        self.accept_multiple(stmts)?;
        self.state.scope.exit();
        Ok(())
    }

    fn visit_function_declaration(&mut self, span: Span, fun: FunctionDeclaration) -> Result<(), Error> {
        let name = fun.name;
        self.visit_function_expr(span, fun)?;

        let mut ib = InstructionBuilder::new(self);
        if let Some(name) = name {
            if ib.state.is_script {
                ib.build_global_store(AssignKind::Assignment, name)
                    .map_err(|_| Error::ConstantPoolLimitExceeded(span))?;
            } else {
                let id = ib
                    .state
                    .scope
                    .add_local(name, VariableDeclarationKind::Var)
                    .map_err(|_| Error::LocalLimitExceeded(span))?;
                ib.build_local_store(AssignKind::Assignment, id, false);
            }
        }
        ib.build_pop();
        Ok(())
    }

    fn visit_while_loop(&mut self, _span: Span, WhileLoop { condition, body }: WhileLoop) -> Result<(), Error> {
        let loop_id = self.prepare_loop();
        let mut ib = InstructionBuilder::new(self);

        ib.add_global_label(Label::LoopCondition { loop_id });
        ib.add_global_label(Label::LoopIncrement { loop_id });
        ib.accept_expr(condition)?;
        ib.build_jmpfalsep(Label::LoopEnd { loop_id }, false);

        ib.accept(*body)?;
        ib.build_jmp(Label::LoopCondition { loop_id }, false);

        ib.add_global_label(Label::LoopEnd { loop_id });
        ib.exit_loop();

        Ok(())
    }

    fn visit_do_while_loop(&mut self, _span: Span, DoWhileLoop { body, condition }: DoWhileLoop) -> Result<(), Error> {
        let loop_id = self.prepare_loop();
        let mut ib = InstructionBuilder::new(self);

        ib.add_global_label(Label::LoopBody { loop_id });
        ib.accept(*body)?;

        ib.add_global_label(Label::LoopIncrement { loop_id });
        ib.accept_expr(condition)?;
        ib.build_jmptruep(Label::LoopBody { loop_id }, false);

        ib.add_global_label(Label::LoopEnd { loop_id });
        ib.exit_loop();

        Ok(())
    }

    fn visit_for_loop(
        &mut self,
        _span: Span,
        ForLoop {
            init,
            condition,
            finalizer,
            body,
        }: ForLoop,
    ) -> Result<(), Error> {
        self.state.scope.enter();

        // Initialization
        if let Some(init) = init {
            self.accept(*init)?;
        }

        let loop_id = self.prepare_loop();
        let mut ib = InstructionBuilder::new(self);

        // Condition
        ib.add_global_label(Label::LoopCondition { loop_id });
        if let Some(condition) = condition {
            ib.accept_expr(condition)?;
            ib.build_jmpfalsep(Label::LoopEnd { loop_id }, false);
        }

        // Body
        ib.accept(*body)?;

        // Increment
        ib.add_global_label(Label::LoopIncrement { loop_id });
        if let Some(finalizer) = finalizer {
            ib.accept_expr(finalizer)?;
            ib.build_pop();
        }
        ib.build_jmp(Label::LoopCondition { loop_id }, false);

        ib.add_global_label(Label::LoopEnd { loop_id });
        ib.exit_loop();
        ib.state.scope.exit();

        Ok(())
    }

    fn visit_assignment_expression(&mut self, span: Span, AssignmentExpr { left, right, operator }: AssignmentExpr) -> Result<(), Error> {
        match operator {
            TokenType::LogicalOrAssignment | TokenType::LogicalAndAssignment | TokenType::LogicalNullishAssignment => {
                self.compile_logical_assignment(span, *left, operator, *right)
            }
            operator => {
                let kind = assign_kind(operator)
                    .ok_or_else(|| Error::Unimplemented(span, format!("assignment operator `{operator}`")))?;
                self.compile_store(span, *left, kind, Some(*right))
            }
        }
    }

    fn visit_function_call(
        &mut self,
        span: Span,
        FunctionCall {
            constructor_call,
            target,
            arguments,
        }: FunctionCall,
    ) -> Result<(), Error> {
        // method calls keep the object on the stack, so it can be passed as `this`
        let Expr { kind, span: target_span } = *target;
        let has_this = match kind {
            ExprKind::PropertyAccess(p) => {
                self.visit_property_access_expr(target_span, p, true)?;
                true
            }
            kind => {
                self.accept_expr(Expr { kind, span: target_span })?;
                false
            }
        };

        let argc = u8::try_from(arguments.len()).map_err(|_| Error::ArgumentLimitExceeded(span))?;

        for arg in arguments {
            self.accept_expr(arg)?;
        }

        let meta = FunctionCallMetadata::new_checked(argc, constructor_call, has_this)
            .ok_or(Error::ArgumentLimitExceeded(span))?;

        InstructionBuilder::new(self).build_call(meta);

        Ok(())
    }

    fn visit_return_statement(&mut self, span: Span, ReturnStatement(expr): ReturnStatement) -> Result<(), Error> {
        let has_finally = self.state.try_blocks.iter().any(|block| block.finally.is_some());

        if !has_finally {
            let tc_depth = u16::try_from(self.state.try_blocks.len()).unwrap_or(u16::MAX);
            self.accept_expr(expr)?;
            InstructionBuilder::new(self).build_ret(tc_depth);
            return Ok(());
        }

        // The return value is computed before any finally block runs
        let tmp = self
            .state
            .scope
            .add_temp()
            .map_err(|_| Error::LocalLimitExceeded(span))?;
        self.accept_expr(expr)?;
        let mut ib = InstructionBuilder::new(self);
        ib.build_local_store(AssignKind::Assignment, tmp, false);
        ib.build_pop();

        self.leave_try_blocks(0)?;

        let mut ib = InstructionBuilder::new(self);
        ib.build_local_load(tmp, false);
        ib.build_ret(0);
        Ok(())
    }

    fn visit_conditional_expr(&mut self, _span: Span, ConditionalExpr { condition, then, el }: ConditionalExpr) -> Result<(), Error> {
        let mut ib = InstructionBuilder::new(self);

        ib.accept_expr(*condition)?;
        ib.build_jmpfalsep(Label::IfBranch, true);

        ib.accept_expr(*then)?;
        ib.build_jmp(Label::IfEnd, true);

        ib.add_local_label(Label::IfBranch);
        ib.accept_expr(*el)?;

        ib.add_local_label(Label::IfEnd);
        Ok(())
    }

    fn visit_property_access_expr(
        &mut self,
        span: Span,
        PropertyAccessExpr {
            computed,
            target,
            property,
        }: PropertyAccessExpr,
        preserve_this: bool,
    ) -> Result<(), Error> {
        self.accept_expr(*target)?;

        match (computed, property.as_identifier()) {
            (false, Some(ident)) => InstructionBuilder::new(self)
                .build_static_prop_access(ident, preserve_this)
                .map_err(|_| Error::ConstantPoolLimitExceeded(span))?,
            _ => {
                self.accept_expr(*property)?;
                InstructionBuilder::new(self).build_dynamic_prop_access(preserve_this);
            }
        }

        Ok(())
    }

    fn visit_sequence_expr(&mut self, _span: Span, (expr1, expr2): Seq) -> Result<(), Error> {
        self.accept_expr(*expr1)?;
        InstructionBuilder::new(self).build_pop();
        self.accept_expr(*expr2)?;

        Ok(())
    }

    fn visit_prefix_expr(&mut self, span: Span, (tt, expr): Prefix) -> Result<(), Error> {
        let kind = match tt {
            TokenType::Increment => AssignKind::PrefixIncrement,
            _ => AssignKind::PrefixDecrement,
        };
        self.compile_store(span, *expr, kind, None)
    }

    fn visit_postfix_expr(&mut self, span: Span, (tt, expr): Postfix) -> Result<(), Error> {
        let kind = match tt {
            TokenType::Increment => AssignKind::PostfixIncrement,
            _ => AssignKind::PostfixDecrement,
        };
        self.compile_store(span, *expr, kind, None)
    }

    fn visit_function_expr(
        &mut self,
        span: Span,
        FunctionDeclaration {
            name,
            parameters,
            statements,
            ty,
            span: source_span,
        }: FunctionDeclaration,
    ) -> Result<(), Error> {
        let params = parameters.len();
        if params > usize::from(u16::MAX) {
            return Err(Error::ParameterLimitExceeded(span));
        }

        debug!(
            "compiling {:?} {}",
            ty,
            name.map_or("<anonymous>", |name| self.interner.resolve(name))
        );

        self.enter_function();
        let result = self.compile_function(parameters, statements);
        let state = self.exit_function();
        result?;

        let FunctionState {
            buf,
            cp,
            scope,
            externals,
            ..
        } = state;

        let function = Function {
            name,
            buffer: buf.into(),
            ty,
            locals: scope.len(),
            params,
            constants: cp.into_vec().into(),
            externals: externals.into(),
            source: Rc::clone(&self.source),
            source_range: (source_span.lo, source_span.hi),
        };

        InstructionBuilder::new(self)
            .build_constant(Constant::Function(Rc::new(function)))
            .map_err(|_| Error::ConstantPoolLimitExceeded(span))
    }

    fn visit_array_literal(&mut self, span: Span, ArrayLiteral(exprs): ArrayLiteral) -> Result<(), Error> {
        let len = u16::try_from(exprs.len()).map_err(|_| Error::ArrayLitLimitExceeded(span))?;

        for expr in exprs {
            self.accept_expr(expr)?;
        }

        InstructionBuilder::new(self).build_arraylit(len);
        Ok(())
    }

    fn visit_object_literal(&mut self, span: Span, ObjectLiteral(exprs): ObjectLiteral) -> Result<(), Error> {
        let mut members = Vec::with_capacity(exprs.len());

        // every value is followed by its key if the key is computed
        for (member, value) in exprs {
            self.accept_expr(value)?;

            match member {
                ObjectMemberKind::Static(ident) => members.push(ObjectMember::Static(ident)),
                ObjectMemberKind::Dynamic(key) => {
                    self.accept_expr(key)?;
                    members.push(ObjectMember::Dynamic);
                }
            }
        }

        InstructionBuilder::new(self)
            .build_objlit(&members)
            .map_err(|_| Error::ObjectLitLimitExceeded(span))
    }

    fn visit_new_target(&mut self, _span: Span) -> Result<(), Error> {
        InstructionBuilder::new(self).build_new_target();
        Ok(())
    }

    fn visit_try_catch(&mut self, span: Span, TryCatch { try_, catch, finally }: TryCatch) -> Result<(), Error> {
        let finally = finally.map(|finally| *finally);
        let has_finally = finally.is_some();
        let local_limit = |_| Error::LocalLimitExceeded(span);

        let mut ib = InstructionBuilder::new(self);

        ib.build_try_block(Label::Catch);
        ib.state.try_blocks.push(TryBlock {
            finally: finally.clone(),
        });
        ib.accept(*try_)?;
        ib.state.try_blocks.pop();
        ib.build_try_end();
        ib.build_jmp(Label::Finally, true);

        ib.add_local_label(Label::Catch);

        // Without a catch clause, the exception goes straight to the rethrowing finally handler
        if let Some(Catch { body, ident }) = catch {
            if has_finally {
                ib.build_try_block(Label::FinallyRethrow);
                ib.state.try_blocks.push(TryBlock {
                    finally: finally.clone(),
                });
            }

            ib.state.scope.enter();
            if let Some(ident) = ident {
                let id = ib
                    .state
                    .scope
                    .add_local(ident, VariableDeclarationKind::Let)
                    .map_err(local_limit)?;
                ib.build_local_store(AssignKind::Assignment, id, false);
            }
            ib.build_pop();
            ib.accept(*body)?;
            ib.state.scope.exit();

            if has_finally {
                ib.state.try_blocks.pop();
                ib.build_try_end();
            }
            ib.build_jmp(Label::Finally, true);
        }

        if let Some(finally) = finally {
            ib.add_local_label(Label::FinallyRethrow);
            let exception = ib.state.scope.add_temp().map_err(local_limit)?;
            ib.build_local_store(AssignKind::Assignment, exception, false);
            ib.build_pop();
            ib.accept(finally.clone())?;
            ib.build_local_load(exception, false);
            ib.build_throw();

            ib.add_local_label(Label::Finally);
            ib.accept(finally)?;
        } else {
            ib.add_local_label(Label::Finally);
        }

        Ok(())
    }

    fn visit_throw(&mut self, _span: Span, expr: Expr) -> Result<(), Error> {
        self.accept_expr(expr)?;
        InstructionBuilder::new(self).build_throw();
        Ok(())
    }

    fn visit_continue(&mut self, span: Span) -> Result<(), Error> {
        let breakable = *self.state.breakables.last().ok_or(Error::IllegalBreak(span))?;
        self.leave_try_blocks(breakable.try_depth)?;
        InstructionBuilder::new(self).build_jmp(
            Label::LoopIncrement {
                loop_id: breakable.loop_id,
            },
            false,
        );
        Ok(())
    }

    fn visit_break(&mut self, span: Span) -> Result<(), Error> {
        let breakable = *self.state.breakables.last().ok_or(Error::IllegalBreak(span))?;
        self.leave_try_blocks(breakable.try_depth)?;
        InstructionBuilder::new(self).build_jmp(
            Label::LoopEnd {
                loop_id: breakable.loop_id,
            },
            false,
        );
        Ok(())
    }

    fn visit_debugger(&mut self, _span: Span) -> Result<(), Error> {
        InstructionBuilder::new(self).build_debugger();
        Ok(())
    }

    fn visit_empty_expr(&mut self) -> Result<(), Error> {
        InstructionBuilder::new(self).build_undef();
        Ok(())
    }

    fn visit_empty_statement(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
