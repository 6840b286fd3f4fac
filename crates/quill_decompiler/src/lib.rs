use quill_middle::compiler::constant::Constant;
use quill_middle::compiler::instruction::Instruction;
use quill_middle::interner::StringInterner;
use decompiler::FunctionDecompiler;
use thiserror::Error;

mod decompiler;

#[derive(Debug, Error)]
pub enum DecompileError {
    #[error("Abrupt end of file")]
    AbruptEof,
    #[error("Invalid instruction opcode: {_0}")]
    InvalidOp(u8),
    #[error("Invalid assignment kind: {_0}")]
    InvalidAssignKind(u8),
    #[error("Invalid object member kind variant")]
    InvalidObjectMemberKind,
    #[error("Constant {_0} out of bounds")]
    InvalidConstant(u16),
    #[error("{_0:?} expected an identifier constant")]
    ExpectedIdentifier(Instruction),
}

/// Renders the bytecode of a script, followed by every function defined in it
pub fn decompile(
    interner: &StringInterner,
    constants: &[Constant],
    instructions: &[u8],
) -> Result<String, DecompileError> {
    FunctionDecompiler::new(interner, instructions, constants, "<main>").run()
}

#[cfg(test)]
mod test {
    use quill_compiler::FunctionCompiler;
    use quill_middle::interner::StringInterner;
    use quill_optimizer::OptLevel;

    use super::{DecompileError, decompile};

    fn disassemble(source: &str) -> String {
        let mut interner = StringInterner::new();
        let cr = FunctionCompiler::compile_str(&mut interner, source, OptLevel::None).expect("Compile error");
        decompile(&interner, &cr.cp, &cr.instructions).expect("Decompile error")
    }

    #[test]
    fn renders_script() {
        let out = disassemble("print(1 + 2)");
        assert!(out.starts_with("function <main>:\n"));
        assert!(out.contains("ldglobal  print"));
        assert!(out.contains("constant  1"));
        assert!(out.contains("add"));
        assert!(out.contains("call  argc: 1, is_constructor_call: false, is_object_call: false"));
    }

    #[test]
    fn renders_nested_functions() {
        let out = disassemble("function demo() { return () => new.target; }");
        assert!(out.contains("function <main>::demo:\n"));
        assert!(out.contains("function <main>::demo::<anon>:\n"));
        assert!(out.contains("newtarget"));
    }

    #[test]
    fn jumps_show_their_target() {
        let out = disassemble("a || b");
        assert!(out.contains("jmptruenp  @"));
    }

    #[test]
    fn truncated_bytecode_is_an_error() {
        let interner = StringInterner::new();
        // `Constant` without its operand
        let instructions = [quill_middle::compiler::instruction::Instruction::Constant as u8, 0];
        assert!(matches!(
            decompile(&interner, &[], &instructions),
            Err(DecompileError::AbruptEof)
        ));
    }
}
