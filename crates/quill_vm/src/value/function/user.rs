use std::iter;
use std::rc::Rc;

use quill_middle::compiler::constant::Function as CompiledFunction;

use crate::Vm;
use crate::frame::{Frame, FrameState};
use crate::value::{ExternalValue, Handle, Value};

/// An ordinary function: compiled bytecode plus the variables it captured when it was created
#[derive(Debug, Clone)]
pub struct UserFunction {
    inner: Rc<CompiledFunction>,
    externals: Rc<[ExternalValue]>,
}

impl UserFunction {
    pub fn new(inner: Rc<CompiledFunction>, externals: Rc<[ExternalValue]>) -> Self {
        Self { inner, externals }
    }

    pub fn inner(&self) -> &Rc<CompiledFunction> {
        &self.inner
    }

    pub fn externals(&self) -> &Rc<[ExternalValue]> {
        &self.externals
    }

    /// Pushes the arguments onto the stack and returns the frame that runs this function.
    ///
    /// Exactly `params` slots are pushed: missing arguments become `undefined`, extra ones are dropped.
    pub(crate) fn frame(
        &self,
        vm: &mut Vm,
        this: Value,
        args: Vec<Value>,
        new_target: Option<Handle>,
        is_constructor_call: bool,
        is_flat_call: bool,
    ) -> Frame {
        let sp = vm.stack.len();
        let params = self.inner.params;
        vm.stack
            .extend(args.into_iter().chain(iter::repeat(Value::Undefined)).take(params));

        Frame {
            function: Rc::clone(&self.inner),
            externals: Rc::clone(&self.externals),
            ip: 0,
            sp,
            this,
            new_target,
            state: FrameState::Function {
                is_constructor_call,
                is_flat_call,
            },
        }
    }
}
