use criterion::{Criterion, criterion_group, criterion_main};
use quill_compiler::FunctionCompiler;
use quill_middle::interner::StringInterner;
use quill_optimizer::OptLevel;
use quill_vm::Vm;
use quill_vm::params::VmParams;

const NEW_TARGET: &str = include_str!("../../../tests/es2015/new-target.js");
const FIBONACCI_RECURSIVE: &str = r"
function fib(n) {
    if (n <= 1) return n;
    return fib(n - 1) + fib(n - 2);
}
fib(12);
";
const FIBONACCI_ITERATIVE: &str = r"
function fib(n) {
    if (n <= 1) return n;
    let fib = 1;
    let prevFib = 1;
    for (let i = 2; i < n; i++) {
        let temp = fib;
        fib += prevFib;
        prevFib = temp;
    }
    return fib;
}
fib(12);
";
const CONSTRUCT: &str = r"
function Point(x, y) {
    this.x = x;
    this.y = y;
    this.kind = () => new.target;
}
let sum = 0;
for (let i = 0; i < 100; i++) {
    let p = new Point(i, i);
    if (p.kind() === Point) sum += p.x + p.y;
}
sum;
";

pub fn benchmark(cr: &mut Criterion) {
    for (name, code) in [
        ("new-target.js", NEW_TARGET),
        ("fib_recursive(12)", FIBONACCI_RECURSIVE),
        ("fib_iterative(12)", FIBONACCI_ITERATIVE),
        ("construct(100)", CONSTRUCT),
    ] {
        cr.bench_function(name, |b| {
            b.iter(|| {
                let mut vm = Vm::new(VmParams::new());
                vm.eval(code, OptLevel::Aggressive).unwrap();
            })
        });
    }

    cr.bench_function("parse+compile new-target.js", |b| {
        b.iter(|| {
            let mut interner = StringInterner::new();
            FunctionCompiler::compile_str(&mut interner, NEW_TARGET, OptLevel::Aggressive).unwrap();
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
