use std::backtrace::{Backtrace, BacktraceStatus};

use anyhow::bail;
use clap::{Arg, ArgAction, Command};
use owo_colors::OwoColorize;

mod cmd;
mod util;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt_level = Arg::new("opt")
        .short('O')
        .long("opt")
        .help("Optimization level")
        .value_parser(["0", "1", "2"])
        .default_value("1");

    let app = Command::new("quill")
        .about("Execute JavaScript code using the quill JavaScript engine")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("eval")
                .about("Evaluate a JavaScript source string")
                .arg(Arg::new("source").required(true))
                .arg(opt_level.clone()),
        )
        .subcommand(
            Command::new("run")
                .about("Run a JavaScript file")
                .arg(Arg::new("file").required(true))
                .arg(Arg::new("timing").short('t').long("timing").action(ArgAction::SetTrue))
                .arg(Arg::new("quiet").short('q').long("quiet").action(ArgAction::SetTrue))
                .arg(opt_level.clone()),
        )
        .subcommand(Command::new("repl").about("Enter a JavaScript REPL"))
        .subcommand(
            Command::new("dump")
                .about("Dumps intermediate code representation")
                .arg(Arg::new("file").required(true))
                .arg(Arg::new("tokens").long("tokens").action(ArgAction::SetTrue))
                .arg(Arg::new("ast").long("ast").action(ArgAction::SetTrue))
                .arg(Arg::new("bytecode").long("bytecode").action(ArgAction::SetTrue))
                .arg(opt_level),
        );

    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}\n", "quill has unexpectedly panicked! this is a bug!".red().bold());

        eprintln!("{info}");

        let backtrace = Backtrace::capture();
        match backtrace.status() {
            BacktraceStatus::Captured => {
                eprintln!("--- begin of backtrace ---");
                eprintln!("{backtrace}");
            }
            BacktraceStatus::Disabled => {
                eprintln!("set RUST_BACKTRACE=1 to print a backtrace");
            }
            BacktraceStatus::Unsupported => {
                eprintln!("backtraces are not supported on this platform");
            }
            _ => {
                eprintln!("backtraces are not available");
            }
        }
    }));

    let matches = app.get_matches();
    match matches.subcommand() {
        Some(("eval", args)) => cmd::eval(args),
        Some(("run", args)) => cmd::run(args),
        Some(("repl", _)) => cmd::repl(),
        Some(("dump", args)) => cmd::dump(args),
        _ => bail!("Unimplemented command"),
    }
}
