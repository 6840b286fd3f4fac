use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{self, AtomicU32};

use anyhow::{Context, bail};
use clap::ArgMatches;
use once_cell::sync::Lazy;
use quill_optimizer::OptLevel;
use quill_vm::Vm;
use quill_vm::eval::EvalError;
use quill_vm::params::VmParams;
use quill_vm::value::Value;
use serde::Deserialize;

use crate::util;

pub fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let path = matches.get_one::<String>("path").context("Missing path")?;
    let harness = matches.get_one::<String>("harness").context("Missing harness path")?;
    let verbose = matches.get_flag("verbose");
    let disable_diagnostics = matches.get_flag("disable-diagnostics");

    let harness = PathBuf::from(harness);
    let files = util::get_all_files(OsStr::new(path), &harness)?;

    if disable_diagnostics {
        panic::set_hook(Box::new(|_| {}));
    }

    run_inner(files, &harness, verbose)
}

fn run_inner(files: Vec<OsString>, harness: &Path, verbose: bool) -> anyhow::Result<()> {
    #[derive(Default)]
    struct Counter {
        passes: AtomicU32,
        fails: AtomicU32,
        panics: AtomicU32,
    }

    let counter = Counter::default();
    let file_count = files.len();

    let tp = rayon::ThreadPoolBuilder::default().stack_size(8_000_000).build()?;
    tp.scope(|s| {
        for file in files {
            let counter = &counter;
            s.spawn(move |_| {
                let result = run_test(harness, &file, verbose);

                let counter = match result {
                    RunResult::Pass => &counter.passes,
                    RunResult::Fail => &counter.fails,
                    RunResult::Panic => &counter.panics,
                };

                counter.fetch_add(1, atomic::Ordering::Relaxed);
            });
        }
    });

    let passes = counter.passes.load(atomic::Ordering::Relaxed);
    let fails = counter.fails.load(atomic::Ordering::Relaxed);
    let panics = counter.panics.load(atomic::Ordering::Relaxed);
    let rate = if file_count == 0 {
        0.0
    } else {
        ((passes as f32) / (file_count as f32)) * 100.0
    };
    println!("== Result ===");
    println!("Passes: {passes} ({rate:.2}%)");
    println!("Fails: {fails}");
    println!("Panics: {panics}");

    if fails > 0 || panics > 0 {
        bail!("{} of {file_count} tests did not pass", fails + panics);
    }

    Ok(())
}

#[derive(Debug)]
enum RunResult {
    Pass,
    Fail,
    Panic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum NegativePhase {
    Parse,
    Runtime,
}

#[derive(Debug, Deserialize)]
struct NegativeMetadata {
    phase: NegativePhase,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
struct YamlMetadata {
    includes: Option<Vec<String>>,
    negative: Option<NegativeMetadata>,
}

fn extract_yaml_metadata(source: &str) -> anyhow::Result<Option<YamlMetadata>> {
    let Some(start) = source.find("/*---") else {
        return Ok(None);
    };
    let end = source[start..].find("---*/").context("Unterminated front matter")?;
    let full = &source[start + 5..start + end];
    Ok(Some(serde_yaml::from_str(full)?))
}

fn get_harness_code(path: &Path) -> anyhow::Result<String> {
    static CACHE: Lazy<Mutex<HashMap<PathBuf, String>>> = Lazy::new(|| Mutex::new(HashMap::new()));
    let mut lock = CACHE.lock().unwrap_or_else(|poison| poison.into_inner());

    if let Some(code) = lock.get(path) {
        return Ok(code.clone());
    }

    let code = std::fs::read_to_string(path).with_context(|| format!("Failed to read harness file {path:?}"))?;
    lock.insert(path.to_owned(), code.clone());
    Ok(code)
}

/// Reads a test and prepends the harness files it includes
fn prepare_test(harness: &Path, path: &OsStr) -> anyhow::Result<(String, Option<NegativeMetadata>)> {
    let contents = std::fs::read_to_string(path)?;
    let Some(metadata) = extract_yaml_metadata(&contents)? else {
        return Ok((contents, None));
    };

    let mut prelude = String::new();
    for include in metadata.includes.into_iter().flatten() {
        prelude += &get_harness_code(&harness.join(include))?;
        prelude.push('\n');
    }

    Ok((prelude + &contents, metadata.negative))
}

/// The `name` of a thrown error object
fn error_name(vm: &Vm, value: &Value) -> Option<String> {
    match value.get_property(vm, "name") {
        Ok(Value::String(name)) => Some(name.to_string()),
        _ => None,
    }
}

fn run_test(harness: &Path, path: &OsStr, verbose: bool) -> RunResult {
    let display = path.to_string_lossy();
    let (contents, negative) = match prepare_test(harness, path) {
        Ok(test) => test,
        Err(err) => {
            println!("Error in {display}: {err}");
            return RunResult::Fail;
        }
    };

    let maybe_pass = panic::catch_unwind(move || {
        let mut vm = Vm::new(VmParams::default());
        let result = vm.eval(&contents, OptLevel::default());

        let (pass, reason) = match (&result, &negative) {
            (Ok(_), None) => (true, None),
            (Ok(_), Some(negative)) => (false, Some(format!("expected {} in {:?} phase", negative.ty, negative.phase))),
            (Err(EvalError::Middle(errs)), Some(negative)) => (
                negative.phase == NegativePhase::Parse && negative.ty == "SyntaxError",
                Some(format!("{errs:?}")),
            ),
            (Err(EvalError::Exception(value)), Some(negative)) => {
                let name = error_name(&vm, value);
                (
                    negative.phase == NegativePhase::Runtime && name.as_deref() == Some(&*negative.ty),
                    Some(format!("uncaught {}", name.as_deref().unwrap_or("<js value>"))),
                )
            }
            (Err(EvalError::Middle(errs)), None) => (false, Some(format!("{errs:?}"))),
            (Err(EvalError::Exception(value)), None) => {
                let name = error_name(&vm, value);
                (false, Some(format!("uncaught {}", name.as_deref().unwrap_or("<js value>"))))
            }
            (Err(EvalError::Abort(message)), _) => (false, Some(message.clone())),
        };

        match (pass, reason) {
            (false, Some(reason)) => println!("Error in {display}: {reason}"),
            (true, _) if verbose => println!("Passed {display}"),
            _ => {}
        }

        if pass { RunResult::Pass } else { RunResult::Fail }
    });

    match maybe_pass {
        Ok(res) => res,
        Err(_) => {
            println!("Panic in {}", path.to_string_lossy());
            RunResult::Panic
        }
    }
}
