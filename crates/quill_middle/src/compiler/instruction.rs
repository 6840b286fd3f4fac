use strum_macros::FromRepr;

/// A bytecode instruction.
///
/// Operands follow the opcode byte directly. Unless noted otherwise, `u16` operands are little endian
/// and jump offsets are `i16`, relative to the end of the jump instruction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum Instruction {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    BitOr,
    BitXor,
    BitAnd,
    BitShl,
    BitShr,
    BitUshr,
    ObjIn,
    InstanceOf,
    /// Discards the last value on the stack
    Pop,
    /// Pushes `undefined`
    Undef,
    /// Loads a constant: `u16` constant id
    Constant,
    /// Loads a local: `u16` local id
    LdLocal,
    /// `u16` local id, followed by an [`AssignKind`]
    StoreLocal,
    /// Loads a variable captured from an enclosing function: `u16` external id
    LdLocalExt,
    /// `u16` external id, followed by an [`AssignKind`]
    StoreLocalExt,
    /// `u16` identifier constant id. Throws a `ReferenceError` if the global does not exist.
    LdGlobal,
    /// `u16` identifier constant id, followed by an [`AssignKind`]
    StoreGlobal,
    /// Defines a global property as `undefined` unless it already exists: `u16` identifier constant id
    DeclareGlobal,
    /// `typeof ident` for a global, which does not throw for undeclared names: `u16` identifier constant id
    TypeOfGlobal,
    Pos,
    Neg,
    TypeOf,
    BitNot,
    Not,
    /// Returns from the current frame: `u16` number of try blocks to pop
    Ret,
    /// Calls a function: [`FunctionCallMetadata`](super::FunctionCallMetadata)
    Call,
    Jmp,
    /// Jumps if the last value is falsy, and pops it
    JmpFalseP,
    /// Jumps if the last value is falsy, but does **not** pop it
    JmpFalseNP,
    JmpTrueP,
    JmpTrueNP,
    JmpNullishP,
    JmpNullishNP,
    /// `u16` identifier constant id, `u8` whether to keep the target object on the stack as `this`
    StaticPropAccess,
    /// `u8` whether to keep the target object on the stack as `this`
    DynamicPropAccess,
    /// [`AssignKind`], followed by a `u16` identifier constant id
    StaticPropAssign,
    /// [`AssignKind`]
    DynamicPropAssign,
    DeletePropertyDynamic,
    /// `u16` number of elements
    ArrayLit,
    /// `u16` number of key value pairs
    ObjLit,
    This,
    /// Loads `new.target` of the closest enclosing non-arrow function
    NewTarget,
    /// Loads the global object
    Global,
    /// Enters a try block: `i16` offset of the catch block, relative to the end of this instruction.
    /// The catch block starts with the thrown value on the stack.
    Try,
    TryEnd,
    Throw,
    Debugger,
}

/// How a store instruction combines the new value with the old one
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum AssignKind {
    Assignment,
    AddAssignment,
    SubAssignment,
    MulAssignment,
    DivAssignment,
    RemAssignment,
    PowAssignment,
    ShlAssignment,
    ShrAssignment,
    UshrAssignment,
    BitAndAssignment,
    BitOrAssignment,
    BitXorAssignment,
    PrefixIncrement,
    PostfixIncrement,
    PrefixDecrement,
    PostfixDecrement,
}

impl AssignKind {
    /// Whether this kind takes its right hand side from the stack, as opposed to the constant `1`
    pub fn has_rhs(self) -> bool {
        !matches!(
            self,
            Self::PrefixIncrement | Self::PostfixIncrement | Self::PrefixDecrement | Self::PostfixDecrement
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn opcodes_roundtrip() {
        assert_eq!(Instruction::from_repr(Instruction::NewTarget as u8), Some(Instruction::NewTarget));
        assert_eq!(Instruction::from_repr(Instruction::Add as u8), Some(Instruction::Add));
        assert_eq!(Instruction::from_repr(u8::MAX), None);
        assert_eq!(AssignKind::from_repr(AssignKind::PostfixDecrement as u8), Some(AssignKind::PostfixDecrement));
        assert!(!AssignKind::PrefixIncrement.has_rhs());
        assert!(AssignKind::Assignment.has_rhs());
    }
}
