use anyhow::Context;
use clap::ArgMatches;
use quill_middle::parser::error::IntoFormattableErrors;
use quill_optimizer::OptLevel;
use quill_vm::Vm;
use quill_vm::eval::EvalError;
use quill_vm::util::format_value;

pub fn opt_level_from_matches(args: &ArgMatches) -> anyhow::Result<OptLevel> {
    args.get_one::<String>("opt")
        .and_then(|level| OptLevel::from_level(level))
        .context("Invalid opt level")
}

/// Renders the error of a failed evaluation, with colored diagnostics for early errors
pub fn format_eval_error(vm: &mut Vm, source: &str, err: EvalError) -> String {
    match err {
        EvalError::Middle(errs) => errs.formattable(source, true).to_string(),
        EvalError::Exception(value) => format!("Uncaught {}", format_value(vm, &value)),
        EvalError::Abort(message) => message,
    }
}
