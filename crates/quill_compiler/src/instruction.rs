use quill_middle::compiler::FunctionCallMetadata;
use quill_middle::compiler::ObjectMemberKind;
use quill_middle::compiler::constant::{Constant, LimitExceededError};
use quill_middle::compiler::instruction::{AssignKind, Instruction};
use quill_middle::interner::Symbol;

use crate::builder::{InstructionBuilder, Label};

/// A property of an object literal, as encoded in the operands of `ObjLit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectMember {
    Static(Symbol),
    Dynamic,
}

macro_rules! simple_instruction {
    ($($name:ident),*) => {
        $(
            fn $name(&mut self);
        )*
    }
}

pub trait InstructionWriter {
    /// Builds the [ADD] instruction
    fn build_add(&mut self);
    /// Builds the [SUB] instruction
    fn build_sub(&mut self);
    /// Builds the [MUL] instruction
    fn build_mul(&mut self);
    /// Builds the [DIV] instruction
    fn build_div(&mut self);
    /// Builds the [REM] instruction
    fn build_rem(&mut self);
    /// Builds the [POW] instruction
    fn build_pow(&mut self);
    /// Builds the [GT] instruction
    fn build_gt(&mut self);
    /// Builds the [GE] instruction
    fn build_ge(&mut self);
    /// Builds the [LT] instruction
    fn build_lt(&mut self);
    /// Builds the [LE] instruction
    fn build_le(&mut self);
    /// Builds the [EQ] instruction
    fn build_eq(&mut self);
    /// Builds the [NE] instruction
    fn build_ne(&mut self);
    /// Builds the [POP] instruction
    fn build_pop(&mut self);
    /// Builds the [RET] instruction, which pops `tc_depth` try blocks of the returning frame
    fn build_ret(&mut self, tc_depth: u16);
    /// Adds a constant to the pool and builds the instruction that loads it
    fn build_constant(&mut self, constant: Constant) -> Result<(), LimitExceededError>;
    /// Builds the [POS] instruction
    fn build_pos(&mut self);
    /// Builds the [NEG] instruction
    fn build_neg(&mut self);
    /// Builds the [TYPEOF] instruction
    fn build_typeof(&mut self);
    /// Builds the [BITNOT] instruction
    fn build_bitnot(&mut self);
    /// Builds the [NOT] instruction
    fn build_not(&mut self);
    /// Builds the [THIS] instruction
    fn build_this(&mut self);
    /// Builds the [NEWTARGET] instruction
    fn build_new_target(&mut self);
    /// Builds the [STRICTEQ] instruction
    fn build_strict_eq(&mut self);
    /// Builds the [STRICTNE] instruction
    fn build_strict_ne(&mut self);
    /// Builds the [TRY] instruction, whose handler is the local label `catch`
    fn build_try_block(&mut self, catch: Label);
    /// Builds the [TRYEND] instruction
    fn build_try_end(&mut self);
    /// Builds the [THROW] instruction
    fn build_throw(&mut self);
    fn build_local_load(&mut self, index: u16, is_extern: bool);
    fn build_local_store(&mut self, kind: AssignKind, index: u16, is_extern: bool);
    fn build_global_load(&mut self, ident: Symbol) -> Result<(), LimitExceededError>;
    fn build_global_store(&mut self, kind: AssignKind, ident: Symbol) -> Result<(), LimitExceededError>;
    fn build_declare_global(&mut self, ident: Symbol) -> Result<(), LimitExceededError>;
    fn build_typeof_global(&mut self, ident: Symbol) -> Result<(), LimitExceededError>;
    fn build_call(&mut self, meta: FunctionCallMetadata);
    fn build_jmpfalsep(&mut self, label: Label, is_local_label: bool);
    fn build_jmpfalsenp(&mut self, label: Label, is_local_label: bool);
    fn build_jmptruep(&mut self, label: Label, is_local_label: bool);
    fn build_jmptruenp(&mut self, label: Label, is_local_label: bool);
    fn build_jmpnullishp(&mut self, label: Label, is_local_label: bool);
    fn build_jmpnullishnp(&mut self, label: Label, is_local_label: bool);
    fn build_jmp(&mut self, label: Label, is_local_label: bool);
    fn build_static_prop_access(&mut self, ident: Symbol, preserve_this: bool) -> Result<(), LimitExceededError>;
    fn build_dynamic_prop_access(&mut self, preserve_this: bool);
    fn build_static_prop_assign(&mut self, kind: AssignKind, ident: Symbol) -> Result<(), LimitExceededError>;
    fn build_dynamic_prop_assign(&mut self, kind: AssignKind);
    fn build_arraylit(&mut self, len: u16);
    fn build_objlit(&mut self, members: &[ObjectMember]) -> Result<(), LimitExceededError>;
    simple_instruction!(
        build_bitor,
        build_bitxor,
        build_bitand,
        build_bitshl,
        build_bitshr,
        build_bitushr,
        build_objin,
        build_instanceof,
        build_debugger,
        build_global,
        build_undef,
        build_dynamic_delete
    );
}

macro_rules! impl_instruction_writer {
    ($($fname:ident $value:expr),*) => {
        $(
            fn $fname(&mut self) {
                self.write_instr($value);
            }
        )*
    }
}

impl InstructionBuilder<'_, '_> {
    /// Writes the operand of a jump instruction and registers it with the label
    pub fn build_jmp_header(&mut self, label: Label, is_local_label: bool) {
        self.write_all(&[0, 0]);
        match is_local_label {
            true => self.add_local_jump(label),
            false => self.add_global_jump(label),
        }
    }

    fn build_ident_instr(&mut self, instr: Instruction, ident: Symbol) -> Result<(), LimitExceededError> {
        let id = self.state.cp.add(Constant::Identifier(ident))?;
        self.write_instr(instr);
        self.writew(id);
        Ok(())
    }
}

impl InstructionWriter for InstructionBuilder<'_, '_> {
    impl_instruction_writer! {
        build_add Instruction::Add,
        build_sub Instruction::Sub,
        build_mul Instruction::Mul,
        build_div Instruction::Div,
        build_rem Instruction::Rem,
        build_pow Instruction::Pow,
        build_gt Instruction::Gt,
        build_ge Instruction::Ge,
        build_lt Instruction::Lt,
        build_le Instruction::Le,
        build_eq Instruction::Eq,
        build_ne Instruction::Ne,
        build_pop Instruction::Pop,
        build_pos Instruction::Pos,
        build_neg Instruction::Neg,
        build_typeof Instruction::TypeOf,
        build_bitnot Instruction::BitNot,
        build_not Instruction::Not,
        build_this Instruction::This,
        build_new_target Instruction::NewTarget,
        build_strict_eq Instruction::StrictEq,
        build_strict_ne Instruction::StrictNe,
        build_try_end Instruction::TryEnd,
        build_throw Instruction::Throw,
        build_bitor Instruction::BitOr,
        build_bitxor Instruction::BitXor,
        build_bitand Instruction::BitAnd,
        build_bitshl Instruction::BitShl,
        build_bitshr Instruction::BitShr,
        build_bitushr Instruction::BitUshr,
        build_objin Instruction::ObjIn,
        build_instanceof Instruction::InstanceOf,
        build_debugger Instruction::Debugger,
        build_global Instruction::Global,
        build_undef Instruction::Undef,
        build_dynamic_delete Instruction::DeletePropertyDynamic
    }

    fn build_ret(&mut self, tc_depth: u16) {
        self.write_instr(Instruction::Ret);
        self.writew(tc_depth);
    }

    fn build_constant(&mut self, constant: Constant) -> Result<(), LimitExceededError> {
        let id = self.state.cp.add(constant)?;
        self.write_instr(Instruction::Constant);
        self.writew(id);
        Ok(())
    }

    fn build_try_block(&mut self, catch: Label) {
        self.write_instr(Instruction::Try);
        self.build_jmp_header(catch, true);
    }

    fn build_local_load(&mut self, index: u16, is_extern: bool) {
        let instr = match is_extern {
            true => Instruction::LdLocalExt,
            false => Instruction::LdLocal,
        };
        self.write_instr(instr);
        self.writew(index);
    }

    fn build_local_store(&mut self, kind: AssignKind, index: u16, is_extern: bool) {
        let instr = match is_extern {
            true => Instruction::StoreLocalExt,
            false => Instruction::StoreLocal,
        };
        self.write_instr(instr);
        self.writew(index);
        self.write(kind as u8);
    }

    fn build_global_load(&mut self, ident: Symbol) -> Result<(), LimitExceededError> {
        self.build_ident_instr(Instruction::LdGlobal, ident)
    }

    fn build_global_store(&mut self, kind: AssignKind, ident: Symbol) -> Result<(), LimitExceededError> {
        self.build_ident_instr(Instruction::StoreGlobal, ident)?;
        self.write(kind as u8);
        Ok(())
    }

    fn build_declare_global(&mut self, ident: Symbol) -> Result<(), LimitExceededError> {
        self.build_ident_instr(Instruction::DeclareGlobal, ident)
    }

    fn build_typeof_global(&mut self, ident: Symbol) -> Result<(), LimitExceededError> {
        self.build_ident_instr(Instruction::TypeOfGlobal, ident)
    }

    fn build_call(&mut self, meta: FunctionCallMetadata) {
        self.write_instr(Instruction::Call);
        self.write(meta.into());
    }

    fn build_jmpfalsep(&mut self, label: Label, is_local_label: bool) {
        self.write_instr(Instruction::JmpFalseP);
        self.build_jmp_header(label, is_local_label);
    }

    fn build_jmpfalsenp(&mut self, label: Label, is_local_label: bool) {
        self.write_instr(Instruction::JmpFalseNP);
        self.build_jmp_header(label, is_local_label);
    }

    fn build_jmptruep(&mut self, label: Label, is_local_label: bool) {
        self.write_instr(Instruction::JmpTrueP);
        self.build_jmp_header(label, is_local_label);
    }

    fn build_jmptruenp(&mut self, label: Label, is_local_label: bool) {
        self.write_instr(Instruction::JmpTrueNP);
        self.build_jmp_header(label, is_local_label);
    }

    fn build_jmpnullishp(&mut self, label: Label, is_local_label: bool) {
        self.write_instr(Instruction::JmpNullishP);
        self.build_jmp_header(label, is_local_label);
    }

    fn build_jmpnullishnp(&mut self, label: Label, is_local_label: bool) {
        self.write_instr(Instruction::JmpNullishNP);
        self.build_jmp_header(label, is_local_label);
    }

    fn build_jmp(&mut self, label: Label, is_local_label: bool) {
        self.write_instr(Instruction::Jmp);
        self.build_jmp_header(label, is_local_label);
    }

    fn build_static_prop_access(&mut self, ident: Symbol, preserve_this: bool) -> Result<(), LimitExceededError> {
        self.build_ident_instr(Instruction::StaticPropAccess, ident)?;
        self.write(preserve_this.into());
        Ok(())
    }

    fn build_dynamic_prop_access(&mut self, preserve_this: bool) {
        self.write_instr(Instruction::DynamicPropAccess);
        self.write(preserve_this.into());
    }

    fn build_static_prop_assign(&mut self, kind: AssignKind, ident: Symbol) -> Result<(), LimitExceededError> {
        let id = self.state.cp.add(Constant::Identifier(ident))?;
        self.write_instr(Instruction::StaticPropAssign);
        self.write(kind as u8);
        self.writew(id);
        Ok(())
    }

    fn build_dynamic_prop_assign(&mut self, kind: AssignKind) {
        self.write_instr(Instruction::DynamicPropAssign);
        self.write(kind as u8);
    }

    fn build_arraylit(&mut self, len: u16) {
        self.write_instr(Instruction::ArrayLit);
        self.writew(len);
    }

    fn build_objlit(&mut self, members: &[ObjectMember]) -> Result<(), LimitExceededError> {
        let len = u16::try_from(members.len()).map_err(|_| LimitExceededError)?;
        self.write_instr(Instruction::ObjLit);
        self.writew(len);

        for member in members {
            match *member {
                ObjectMember::Static(ident) => {
                    let id = self.state.cp.add(Constant::Identifier(ident))?;
                    self.write(ObjectMemberKind::Static as u8);
                    self.writew(id);
                }
                ObjectMember::Dynamic => self.write(ObjectMemberKind::Dynamic as u8),
            }
        }

        Ok(())
    }
}
