use std::rc::Rc;

use quill_middle::compiler::CompileResult;
use quill_middle::compiler::constant::Function;
use quill_middle::parser::statement::FunctionKind;

use crate::value::{ExternalValue, Handle, Value};

#[derive(Debug, Clone)]
pub struct TryBlock {
    /// Where execution resumes when an exception is caught
    pub catch_ip: usize,
    /// Number of frames when the try block was entered. The owning frame is `frames[frame_idx - 1]`.
    pub frame_idx: usize,
    /// Height of the value stack when the try block was entered
    pub sp: usize,
}

#[derive(Debug, Clone)]
pub enum FrameState {
    /// Regular function
    Function {
        /// Whether the currently executing function is a constructor call
        is_constructor_call: bool,
        /// Whether this frame is a flat function call, i.e. its caller is in the same dispatch loop
        is_flat_call: bool,
    },
    /// Top level frame of a script or an `eval` string
    Script,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub function: Rc<Function>,
    pub ip: usize,
    /// Contains local variable values from the outer scope
    pub externals: Rc<[ExternalValue]>,
    pub this: Value,
    /// `new.target` of this activation. `None` unless this is a constructor call,
    /// or an arrow function created in one.
    pub new_target: Option<Handle>,
    /// Index of the first local slot on the value stack
    pub sp: usize,
    pub state: FrameState,
}

impl Frame {
    /// Creates the top level frame of a compiled script
    pub fn from_compile_result(cr: CompileResult, source: Rc<str>, this: Value) -> Self {
        let function = Function {
            name: None,
            buffer: cr.instructions.into(),
            ty: FunctionKind::Function,
            locals: cr.locals,
            params: 0,
            constants: cr.cp.into_vec().into(),
            externals: cr.externals.into(),
            source_range: (0, source.len() as u32),
            source,
        };

        Self {
            function: Rc::new(function),
            ip: 0,
            externals: Rc::from([]),
            this,
            new_target: None,
            sp: 0,
            state: FrameState::Script,
        }
    }

    pub fn set_sp(&mut self, sp: usize) {
        self.sp = sp;
    }

    pub fn is_constructor_call(&self) -> bool {
        matches!(self.state, FrameState::Function { is_constructor_call: true, .. })
    }

    pub fn is_flat_call(&self) -> bool {
        matches!(self.state, FrameState::Function { is_flat_call: true, .. })
    }
}
