use crate::Vm;
use crate::frame::Frame;
use crate::value::{Handle, Value};

use super::user::UserFunction;

/// An arrow function. `this` and `new.target` are the ones of the frame that created it.
#[derive(Debug, Clone)]
pub struct Closure {
    pub fun: UserFunction,
    pub this: Value,
    pub new_target: Option<Handle>,
}

impl Closure {
    pub(crate) fn frame(&self, vm: &mut Vm, args: Vec<Value>, is_flat_call: bool) -> Frame {
        self.fun
            .frame(vm, self.this.clone(), args, self.new_target.clone(), false, is_flat_call)
    }
}
