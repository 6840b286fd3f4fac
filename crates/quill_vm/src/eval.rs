use std::rc::Rc;

use quill_compiler::FunctionCompiler;
use quill_middle::compiler::CompileResult;
use quill_middle::parser::error::Error;
use quill_optimizer::OptLevel;

use crate::Vm;
use crate::dispatch::HandleResult;
use crate::frame::Frame;
use crate::value::{Unwind, Value};

#[derive(Debug)]
pub enum EvalError {
    /// The script was rejected before it ran
    Middle(Vec<Error>),
    /// An uncaught exception
    Exception(Value),
    /// Execution was aborted, for example by a failed `assert`
    Abort(String),
}

impl From<Unwind> for EvalError {
    fn from(value: Unwind) -> Self {
        match value {
            Unwind::Error(value) => Self::Exception(value),
            Unwind::Abort(message) => Self::Abort(message),
        }
    }
}

impl Vm {
    /// Compiles and runs a script in the global scope, returning its completion value
    pub fn eval(&mut self, input: &str, opt: OptLevel) -> Result<Value, EvalError> {
        let cr = FunctionCompiler::compile_str(&mut self.interner, input, opt).map_err(EvalError::Middle)?;
        self.execute_script(cr, input).map_err(EvalError::from)
    }

    /// Runs an already compiled script with the global object as `this`
    pub(crate) fn execute_script(&mut self, cr: CompileResult, input: &str) -> Result<Value, Unwind> {
        let mut frame = Frame::from_compile_result(cr, Rc::from(input), Value::Object(self.global()));
        frame.set_sp(self.stack_size());
        self.execute_frame(frame).map(HandleResult::into_value)
    }
}
