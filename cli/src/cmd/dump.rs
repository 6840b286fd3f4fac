use std::fs;
use std::rc::Rc;

use anyhow::{Context, anyhow};
use clap::ArgMatches;
use quill_compiler::FunctionCompiler;
use quill_lexer::Lexer;
use quill_middle::interner::StringInterner;
use quill_middle::parser::error::IntoFormattableErrors;
use quill_parser::Parser;

use crate::util;

pub fn dump(arg: &ArgMatches) -> anyhow::Result<()> {
    let dump_ast = arg.get_flag("ast");
    let dump_bytecode = arg.get_flag("bytecode");
    let dump_tokens = arg.get_flag("tokens");

    let opt = util::opt_level_from_matches(arg)?;
    let path = arg.get_one::<String>("file").context("Missing file")?;
    let source = fs::read_to_string(path)?;

    let interner = &mut StringInterner::new();
    let tokens = Lexer::new(interner, &source)
        .scan_all()
        .map_err(|e| anyhow!("{}", e.formattable(&source, true)))?;

    if dump_tokens {
        println!("{tokens:#?}");
    }

    let mut ast = Parser::new(interner, &source, tokens)
        .parse_all()
        .map_err(|e| anyhow!("{}", e.formattable(&source, true)))?;

    quill_optimizer::optimize_ast(&mut ast, interner, opt);

    if dump_ast {
        println!("{ast:#?}");
    }

    let bytecode = FunctionCompiler::new(interner, Rc::from(source.as_str()))
        .compile_ast(ast, true)
        .map_err(|e| anyhow!("{}", [e].formattable(&source, true)))?;

    if dump_bytecode {
        let out = quill_decompiler::decompile(interner, &bytecode.cp, &bytecode.instructions)?;
        println!("{out}");
    }

    Ok(())
}
