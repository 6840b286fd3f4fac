use quill_middle::interner::Symbol;
use quill_middle::parser::statement::{
    BlockStatement, Catch, IfStatement, Loop, ReturnStatement, Statement, StatementKind, TryCatch,
    VariableDeclarationKind, VariableDeclarations,
};
use rustc_hash::FxHashSet;

/// Implicitly patches the last expression to be returned from the function
///
/// Or inserts `return undefined;` if there is no last expression
pub fn ast_patch_implicit_return(ast: &mut Vec<Statement>) {
    match ast.last_mut().map(|stmt| &mut stmt.kind) {
        Some(StatementKind::Return(..)) => {}
        Some(StatementKind::Expression(..)) => {
            if let Some(Statement {
                kind: StatementKind::Expression(expr),
                span,
            }) = ast.pop()
            {
                ast.push(Statement {
                    kind: StatementKind::Return(ReturnStatement(expr)),
                    span,
                });
            }
        }
        Some(StatementKind::Block(BlockStatement(block))) => ast_patch_implicit_return(block),
        _ => ast_insert_implicit_return(ast),
    }
}

pub fn ast_insert_implicit_return(ast: &mut Vec<Statement>) {
    ast.push(Statement::dummy_return());
}

/// Collects the names of all `var` and function declarations that belong to the function
/// whose body is `ast`, in source order. Nested functions are not descended into.
pub fn hoisted_declarations(ast: &[Statement]) -> Vec<Symbol> {
    let mut seen = FxHashSet::default();
    let mut names = Vec::new();

    for stmt in ast {
        collect_hoisted(stmt, &mut |name| {
            if seen.insert(name) {
                names.push(name);
            }
        });
    }

    names
}

fn collect_hoisted(stmt: &Statement, out: &mut impl FnMut(Symbol)) {
    match &stmt.kind {
        StatementKind::Variable(VariableDeclarations(decls)) => decls
            .iter()
            .filter(|decl| decl.binding.kind == VariableDeclarationKind::Var)
            .for_each(|decl| out(decl.binding.name)),
        StatementKind::Function(fun) => {
            if let Some(name) = fun.name {
                out(name);
            }
        }
        StatementKind::Block(BlockStatement(stmts)) => stmts.iter().for_each(|stmt| collect_hoisted(stmt, out)),
        StatementKind::If(IfStatement { then, el, .. }) => {
            collect_hoisted(then, out);
            if let Some(el) = el {
                collect_hoisted(el, out);
            }
        }
        StatementKind::Loop(Loop::For(f)) => {
            if let Some(init) = &f.init {
                collect_hoisted(init, out);
            }
            collect_hoisted(&f.body, out);
        }
        StatementKind::Loop(Loop::While(w)) => collect_hoisted(&w.body, out),
        StatementKind::Loop(Loop::DoWhile(d)) => collect_hoisted(&d.body, out),
        StatementKind::Try(TryCatch { try_, catch, finally }) => {
            collect_hoisted(try_, out);
            if let Some(Catch { body, .. }) = catch {
                collect_hoisted(body, out);
            }
            if let Some(finally) = finally {
                collect_hoisted(finally, out);
            }
        }
        StatementKind::Expression(..)
        | StatementKind::Return(..)
        | StatementKind::Throw(..)
        | StatementKind::Continue
        | StatementKind::Break
        | StatementKind::Debugger
        | StatementKind::Empty => {}
    }
}
