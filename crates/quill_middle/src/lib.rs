//! Types shared between the stages of the quill pipeline: spans, tokens, the syntax tree,
//! front end diagnostics and the bytecode format.

pub mod compiler;
pub mod interner;
pub mod lexer;
pub mod parser;
pub mod sourcemap;
pub mod util;
pub mod visitor;
