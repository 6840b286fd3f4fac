use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::interner::Symbol;
use crate::parser::expr::LiteralExpr;
use crate::parser::statement::FunctionKind;

use super::external::External;

/// A compiled function
#[derive(Clone)]
pub struct Function {
    pub name: Option<Symbol>,
    pub buffer: Box<[u8]>,
    pub ty: FunctionKind,
    /// Total number of local slots, including parameters
    pub locals: usize,
    pub params: usize,
    pub constants: Box<[Constant]>,
    pub externals: Box<[External]>,
    /// The source code this function was compiled from
    pub source: Rc<str>,
    /// Byte range of this function in `source`
    pub source_range: (u32, u32),
}

impl Function {
    /// The source text of this function, as returned by `Function.prototype.toString`
    pub fn source_text(&self) -> &str {
        let (lo, hi) = self.source_range;
        self.source.get(lo as usize..hi as usize).unwrap_or_default()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("locals", &self.locals)
            .field("params", &self.params)
            .field("buffer", &self.buffer.len())
            .field("constants", &self.constants)
            .field("externals", &self.externals)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Constant {
    Number(f64),
    String(Symbol),
    Identifier(Symbol),
    Boolean(bool),
    Function(Rc<Function>),
    Null,
    Undefined,
}

impl Constant {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Constant::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<Symbol> {
        match self {
            Constant::String(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<Symbol> {
        match self {
            Constant::Identifier(s) => Some(*s),
            _ => None,
        }
    }

    pub fn from_literal(expr: &LiteralExpr) -> Self {
        match expr {
            LiteralExpr::Number(n) => Self::Number(*n),
            LiteralExpr::Identifier(s) => Self::Identifier(*s),
            LiteralExpr::String(s) => Self::String(*s),
            LiteralExpr::Boolean(b) => Self::Boolean(*b),
            LiteralExpr::Null => Self::Null,
            LiteralExpr::Undefined => Self::Undefined,
        }
    }

    /// Whether two constants can share one constant pool slot
    fn dedupe_eq(&self, other: &Self) -> bool {
        match (self, other) {
            // compare bits so that 0 and -0 stay apart, and NaN can be shared
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Identifier(a), Self::Identifier(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Null, Self::Null) | (Self::Undefined, Self::Undefined) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
}

#[derive(Debug)]
pub struct LimitExceededError;

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constant to the pool, reusing an existing slot for equal primitive constants
    pub fn add(&mut self, constant: Constant) -> Result<u16, LimitExceededError> {
        if let Some(id) = self.constants.iter().position(|c| c.dedupe_eq(&constant)) {
            return Ok(id as u16);
        }

        if self.constants.len() > u16::MAX as usize {
            Err(LimitExceededError)
        } else {
            let id = self.constants.len() as u16;
            self.constants.push(constant);
            Ok(id)
        }
    }

    pub fn into_vec(self) -> Vec<Constant> {
        self.constants
    }
}

impl Deref for ConstantPool {
    type Target = [Constant];

    fn deref(&self) -> &Self::Target {
        &self.constants
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interner::sym;

    #[test]
    fn primitive_constants_are_shared() {
        let mut cp = ConstantPool::new();
        let a = cp.add(Constant::Number(1.0)).unwrap();
        let b = cp.add(Constant::Identifier(sym::target)).unwrap();
        assert_eq!(cp.add(Constant::Number(1.0)).unwrap(), a);
        assert_eq!(cp.add(Constant::Identifier(sym::target)).unwrap(), b);
        assert_ne!(cp.add(Constant::String(sym::target)).unwrap(), b);
        assert_ne!(cp.add(Constant::Number(-0.0)).unwrap(), cp.add(Constant::Number(0.0)).unwrap());
        assert_eq!(cp.len(), 5);
    }
}
