use quill_middle::interner::Symbol;
use quill_middle::parser::statement::VariableDeclarationKind;

#[derive(Debug, Clone)]
pub struct ScopeLocal {
    /// `None` for temporaries introduced by the compiler
    name: Option<Symbol>,
    kind: VariableDeclarationKind,
    /// Block depth this local was declared at
    depth: u16,
    /// Cleared when the block that declared this local is exited
    in_scope: bool,
}

impl ScopeLocal {
    pub fn kind(&self) -> VariableDeclarationKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct LimitExceededError;

/// Local variables of a function.
///
/// Every local gets its own slot for the lifetime of the frame. Leaving a block only hides its
/// `let` and `const` bindings from name resolution.
#[derive(Debug, Default)]
pub struct Scope {
    depth: u16,
    // length limited to u16
    locals: Vec<ScopeLocal>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the innermost visible local named `identifier`
    pub fn find_local(&self, identifier: Symbol) -> Option<(u16, &ScopeLocal)> {
        self.locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, l)| l.in_scope && l.name == Some(identifier))
            .map(|(i, l)| (i as u16, l))
    }

    /// Declares a local in the current block.
    ///
    /// `var` declarations reuse an existing function level local of the same name, and so do
    /// `let` and `const` redeclarations within the same block.
    pub fn add_local(&mut self, name: Symbol, kind: VariableDeclarationKind) -> Result<u16, LimitExceededError> {
        if let Some((id, local)) = self.find_local(name) {
            let reusable = match kind {
                VariableDeclarationKind::Var => local.kind == VariableDeclarationKind::Var,
                _ => local.depth == self.depth,
            };

            if reusable {
                return Ok(id);
            }
        }

        let depth = match kind {
            VariableDeclarationKind::Var => 0,
            _ => self.depth,
        };

        self.push(Some(name), kind, depth)
    }

    /// Declares a parameter. Parameters always get a new slot, so that their ids match their positions.
    pub fn add_param(&mut self, name: Symbol) -> Result<u16, LimitExceededError> {
        self.push(Some(name), VariableDeclarationKind::Var, 0)
    }

    /// Reserves an unnameable slot for a value the compiler needs to keep around
    pub fn add_temp(&mut self) -> Result<u16, LimitExceededError> {
        self.push(None, VariableDeclarationKind::Let, self.depth)
    }

    fn push(&mut self, name: Option<Symbol>, kind: VariableDeclarationKind, depth: u16) -> Result<u16, LimitExceededError> {
        let id = u16::try_from(self.locals.len()).map_err(|_| LimitExceededError)?;
        self.locals.push(ScopeLocal {
            name,
            kind,
            depth,
            in_scope: true,
        });
        Ok(id)
    }

    pub fn enter(&mut self) {
        self.depth += 1;
    }

    pub fn exit(&mut self) {
        for local in self.locals.iter_mut().rev() {
            if local.depth == self.depth {
                local.in_scope = false;
            }
        }
        self.depth -= 1;
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }
}

#[cfg(test)]
mod test {
    use quill_middle::interner::StringInterner;

    use super::*;

    #[test]
    fn block_scoped_locals_are_hidden_after_exit() {
        let mut interner = StringInterner::new();
        let x = interner.intern("x");
        let mut scope = Scope::new();

        let outer = scope.add_local(x, VariableDeclarationKind::Let).unwrap();
        scope.enter();
        let inner = scope.add_local(x, VariableDeclarationKind::Let).unwrap();
        assert_ne!(outer, inner);
        assert_eq!(scope.find_local(x).map(|(id, _)| id), Some(inner));
        scope.exit();

        assert_eq!(scope.find_local(x).map(|(id, _)| id), Some(outer));
        assert_eq!(scope.len(), 2);
    }

    #[test]
    fn var_declarations_are_function_scoped() {
        let mut interner = StringInterner::new();
        let x = interner.intern("x");
        let mut scope = Scope::new();

        let param = scope.add_param(x).unwrap();
        scope.enter();
        assert_eq!(scope.add_local(x, VariableDeclarationKind::Var).unwrap(), param);
        scope.exit();
        assert!(scope.find_local(x).is_some());
        assert!(scope.add_temp().is_ok());
        assert_eq!(scope.len(), 2);
    }
}
