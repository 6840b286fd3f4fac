use quill_optimizer::OptLevel;
use quill_vm::Vm;
use quill_vm::params::VmParams;
use quill_vm::util::format_value;
use rustyline::DefaultEditor;

use crate::util;

pub fn repl() -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut vm = Vm::new(VmParams::new().set_opt_level(OptLevel::Aggressive));

    while let Ok(input) = rl.readline("> ") {
        if input.is_empty() {
            continue;
        }

        rl.add_history_entry(&input)?;

        match vm.eval(&input, OptLevel::Aggressive) {
            Ok(value) => println!("{}", format_value(&mut vm, &value)),
            Err(err) => println!("{}", util::format_eval_error(&mut vm, &input, err)),
        }
    }

    Ok(())
}
