use strum_macros::FromRepr;

use self::constant::ConstantPool;
use self::external::External;

pub mod constant;
pub mod external;
pub mod instruction;

#[derive(Debug, Clone)]
pub struct CompileResult {
    pub instructions: Vec<u8>,
    pub cp: ConstantPool,
    pub locals: usize,
    pub externals: Vec<External>,
}

/// The kind of a property in the operands of an `ObjLit` instruction
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum ObjectMemberKind {
    /// Followed by a `u16` identifier constant id
    Static,
    /// The key is on the stack, after the value
    Dynamic,
}

/// Function call metadata
///
/// Highest bit = set if constructor call
/// 2nd highest bit = set if object call
/// remaining 6 bits = number of arguments
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionCallMetadata(u8);

impl From<u8> for FunctionCallMetadata {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<FunctionCallMetadata> for u8 {
    fn from(value: FunctionCallMetadata) -> Self {
        value.0
    }
}

impl FunctionCallMetadata {
    pub const MAX_ARGS: u8 = 0b00111111;

    pub fn new_checked(mut value: u8, constructor: bool, object: bool) -> Option<Self> {
        if value & 0b11000000 == 0 {
            if constructor {
                value |= 0b10000000;
            }

            if object {
                value |= 0b01000000;
            }

            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0 & !0b11000000
    }

    pub fn is_constructor_call(&self) -> bool {
        self.0 & (1 << 7) != 0
    }

    pub fn is_object_call(&self) -> bool {
        self.0 & (1 << 6) != 0
    }
}

#[cfg(test)]
mod test {
    use super::FunctionCallMetadata;

    #[test]
    fn call_metadata_bits() {
        let meta = FunctionCallMetadata::new_checked(3, true, false).unwrap();
        assert!(meta.is_constructor_call());
        assert!(!meta.is_object_call());
        assert_eq!(meta.value(), 3);
        assert_eq!(FunctionCallMetadata::new_checked(64, false, false), None);
    }
}
