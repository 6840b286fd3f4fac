use consteval::ConstFunctionEvalCtx;
use quill_log::{Level, debug, span};
use quill_middle::interner::StringInterner;
use quill_middle::parser::statement::Statement;

pub mod consteval;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OptLevel {
    None,
    #[default]
    Basic,
    Aggressive,
}

impl OptLevel {
    pub fn enabled(&self) -> bool {
        matches!(self, OptLevel::Basic | OptLevel::Aggressive)
    }

    pub fn from_level(s: &str) -> Option<Self> {
        match s {
            "0" => Some(Self::None),
            "1" => Some(Self::Basic),
            "2" => Some(Self::Aggressive),
            _ => None,
        }
    }
}

/// Runs the AST passes enabled by `opt` over a whole script
pub fn optimize_ast(ast: &mut Vec<Statement>, interner: &mut StringInterner, opt: OptLevel) {
    if !opt.enabled() {
        return;
    }

    span!(Level::TRACE, "optimize ast").in_scope(|| {
        let mut cfx = ConstFunctionEvalCtx::new(interner, opt);
        cfx.visit_script(ast);
        debug!("optimized {} top level statements", ast.len());
    })
}
