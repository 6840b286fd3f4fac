use quill_optimizer::OptLevel;
use quill_vm::Vm;
use quill_vm::eval::EvalError;
use quill_vm::params::VmParams;

const ASSERT_THROWS: &str = include_str!("../../../tests/harness/assert-throws.js");

fn run(source: &str, opt: OptLevel) {
    let mut vm = Vm::new(VmParams::new());
    let source = format!("{ASSERT_THROWS}\n{source}");
    match vm.eval(&source, opt) {
        Ok(_) => {}
        Err(EvalError::Abort(message)) => panic!("{message}"),
        Err(err) => panic!("script failed: {err:?}"),
    }
}

macro_rules! conformance_tests {
    ($($name:ident: $path:literal;)*) => {
        $(
            #[test]
            fn $name() {
                let source = include_str!(concat!("../../../tests/es2015/", $path));
                run(source, OptLevel::None);
                run(source, OptLevel::Aggressive);
            }
        )*
    };
}

conformance_tests! {
    new_target: "new-target.js";
    new_target_arrow: "new-target-arrow.js";
    new_target_construct: "new-target-construct.js";
    new_target_eval: "new-target-eval.js";
}

#[test]
fn top_level_new_target_is_rejected() {
    let mut vm = Vm::new(VmParams::new());
    let source = include_str!("../../../tests/es2015/new-target-toplevel.js");
    assert!(matches!(vm.eval(source, OptLevel::Basic), Err(EvalError::Middle(_))));
}
