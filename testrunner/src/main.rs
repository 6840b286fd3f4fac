use anyhow::bail;
use clap::{Arg, ArgAction, Command};

mod cmd;
mod util;

fn main() -> anyhow::Result<()> {
    let app = Command::new("testrunner")
        .about("Runs the conformance test suite")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run every test below a directory")
                .arg(Arg::new("path").long("path").default_value("tests"))
                .arg(Arg::new("harness").long("harness").default_value("tests/harness"))
                .arg(Arg::new("verbose").short('v').long("verbose").action(ArgAction::SetTrue))
                .arg(
                    Arg::new("disable-diagnostics")
                        .long("disable-diagnostics")
                        .help("Silences panic messages of failing tests")
                        .action(ArgAction::SetTrue),
                ),
        );

    let matches = app.get_matches();
    match matches.subcommand() {
        Some(("run", args)) => cmd::run(args),
        _ => bail!("Unknown command"),
    }
}
