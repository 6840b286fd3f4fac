use std::fs;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::ArgMatches;
use quill_vm::Vm;
use quill_vm::params::VmParams;
use quill_vm::util::format_value;

use crate::util;

pub fn run(args: &ArgMatches) -> anyhow::Result<()> {
    let path = args.get_one::<String>("file").context("Missing source")?;
    let source = fs::read_to_string(path).context("Failed to read source")?;
    let opt = util::opt_level_from_matches(args)?;
    let quiet = args.get_flag("quiet");

    let before = args.get_flag("timing").then(Instant::now);

    let mut vm = Vm::new(VmParams::new().set_opt_level(opt));
    let result = vm.eval(&source, opt);

    if let Some(before) = before {
        println!("{:?}", before.elapsed());
    }

    match result {
        Ok(value) => {
            if !quiet {
                println!("{}", format_value(&mut vm, &value));
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", util::format_eval_error(&mut vm, &source, err));
            bail!("{path} did not run to completion")
        }
    }
}
