use anyhow::Context;
use clap::ArgMatches;
use quill_vm::Vm;
use quill_vm::params::VmParams;
use quill_vm::util::format_value;

use crate::util;

pub fn eval(args: &ArgMatches) -> anyhow::Result<()> {
    let source = args.get_one::<String>("source").context("Missing source")?;
    let opt = util::opt_level_from_matches(args)?;

    let mut vm = Vm::new(VmParams::new().set_opt_level(opt));
    match vm.eval(source, opt) {
        Ok(value) => println!("{}", format_value(&mut vm, &value)),
        Err(err) => println!("{}", util::format_eval_error(&mut vm, source, err)),
    }

    Ok(())
}
