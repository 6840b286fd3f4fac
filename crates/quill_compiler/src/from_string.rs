use std::rc::Rc;

use quill_lexer::Lexer;
use quill_middle::compiler::CompileResult;
use quill_middle::interner::StringInterner;
use quill_middle::parser::error::Error;
use quill_optimizer::{OptLevel, optimize_ast};
use quill_parser::Parser;

use crate::FunctionCompiler;

impl<'interner> FunctionCompiler<'interner> {
    /// Runs the whole front end on a script: lexing, parsing, optimizing and compiling.
    pub fn compile_str(
        interner: &'interner mut StringInterner,
        input: &str,
        opt: OptLevel,
    ) -> Result<CompileResult, Vec<Error>> {
        let tokens = Lexer::new(interner, input).scan_all()?;
        let mut ast = Parser::new(interner, input, tokens).parse_all()?;

        optimize_ast(&mut ast, interner, opt);

        Self::new(interner, Rc::from(input))
            .compile_ast(ast, true)
            .map_err(|err| vec![err])
    }
}
