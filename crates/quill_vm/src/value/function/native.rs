use crate::Vm;
use crate::value::{Unwind, Value};

pub type NativeFunction = fn(cx: CallContext) -> Result<Value, Unwind>;

#[derive(Debug)]
pub struct CallContext<'vm> {
    pub args: Vec<Value>,
    pub vm: &'vm mut Vm,
    pub this: Value,
    pub is_constructor_call: bool,
}

impl<'vm> CallContext<'vm> {
    pub fn constructor(args: Vec<Value>, vm: &'vm mut Vm, this: Value) -> Self {
        Self {
            args,
            vm,
            this,
            is_constructor_call: true,
        }
    }

    pub fn call(args: Vec<Value>, vm: &'vm mut Vm, this: Value) -> Self {
        Self {
            args,
            vm,
            this,
            is_constructor_call: false,
        }
    }
}
