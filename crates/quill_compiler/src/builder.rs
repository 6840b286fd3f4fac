use std::ops::Deref;
use std::ops::DerefMut;

use quill_middle::compiler::instruction::Instruction;

use crate::FunctionCompiler;
use crate::jump_container::JumpContainer;

#[derive(PartialOrd, Ord, Hash, Eq, PartialEq, Debug, Clone, Copy)]
pub enum Label {
    IfEnd,
    /// The else branch of an if statement or conditional expression
    IfBranch,
    /// The handler of a try block, entered with the thrown value on the stack
    Catch,
    /// Runs the finally block for an exception and rethrows it
    FinallyRethrow,
    /// Runs the finally block after normal completion
    Finally,
    /// Skips the initializer of a parameter default value
    ParamDefaultEnd,
    LoopBody { loop_id: usize },
    LoopCondition { loop_id: usize },
    /// Target of `continue`
    LoopIncrement { loop_id: usize },
    LoopEnd { loop_id: usize },
}

/// Writes instructions into the buffer of the function that is currently being compiled.
///
/// Local labels only live as long as the builder, which makes them usable for control flow
/// that does not escape the visited node, like branches of an if statement.
pub struct InstructionBuilder<'cx, 'interner> {
    inner: &'cx mut FunctionCompiler<'interner>,
    jc: JumpContainer,
}

impl<'cx, 'interner> InstructionBuilder<'cx, 'interner> {
    pub fn new(fc: &'cx mut FunctionCompiler<'interner>) -> Self {
        Self {
            inner: fc,
            jc: JumpContainer::new(),
        }
    }

    pub fn write(&mut self, byte: u8) {
        self.inner.state.buf.push(byte);
    }

    pub fn write_instr(&mut self, instruction: Instruction) {
        self.write(instruction as u8);
    }

    pub fn writew(&mut self, value: u16) {
        self.inner.state.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_all(&mut self, bytes: &[u8]) {
        self.inner.state.buf.extend_from_slice(bytes);
    }

    /// Adds a **local** label at the current instruction pointer, which can be jumped to using add_local_jump
    pub fn add_local_label(&mut self, label: Label) {
        let in_range = self.jc.add_label(label, &mut self.inner.state.buf);
        self.inner.state.jump_limit_exceeded |= !in_range;
    }

    /// Emits a jump instruction to a local label
    ///
    /// Requirement for calling this function: there must be two bytes in the buffer, reserved for this jump
    pub fn add_local_jump(&mut self, label: Label) {
        let in_range = self.jc.add_jump(label, &mut self.inner.state.buf);
        self.inner.state.jump_limit_exceeded |= !in_range;
    }
}

impl<'interner> Deref for InstructionBuilder<'_, 'interner> {
    type Target = FunctionCompiler<'interner>;

    fn deref(&self) -> &Self::Target {
        self.inner
    }
}

impl DerefMut for InstructionBuilder<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner
    }
}
