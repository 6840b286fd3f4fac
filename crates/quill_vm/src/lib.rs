use std::ops::RangeBounds;
use std::vec::Drain;

use quill_log::{debug, error};
use quill_middle::compiler::instruction::Instruction;
use quill_middle::interner::StringInterner;

use self::dispatch::HandleResult;
use self::frame::{Frame, TryBlock};
use self::params::VmParams;
use self::statics::Statics;
use self::value::function::CallResult;
use self::value::object::{NamedObject, PropertyValue};
use self::value::{Handle, Unwind, Value};

pub mod dispatch;
pub mod eval;
pub mod frame;
pub mod js_std;
mod macros;
pub mod params;
pub mod statics;
pub mod util;
pub mod value;

#[cfg(test)]
mod test;

#[derive(Debug)]
pub struct Vm {
    frames: Vec<Frame>,
    stack: Vec<Value>,
    global: Handle,
    statics: Box<Statics>,
    try_blocks: Vec<TryBlock>,
    params: VmParams,
    /// Number of `execute_frame` calls currently on the native stack
    reentry: usize,
    pub interner: StringInterner,
}

impl Vm {
    pub fn new(params: VmParams) -> Self {
        let statics = Box::new(Statics::new());
        let global = Handle::new(NamedObject::null());

        let mut vm = Self {
            frames: Vec::new(),
            stack: Vec::with_capacity(512),
            global,
            statics,
            try_blocks: Vec::new(),
            params,
            reentry: 0,
            interner: StringInterner::new(),
        };
        vm.prepare();
        vm
    }

    pub fn global(&self) -> Handle {
        self.global.clone()
    }

    pub fn statics(&self) -> &Statics {
        &self.statics
    }

    pub fn params(&self) -> &VmParams {
        &self.params
    }

    /// Prepare the VM for execution.
    #[rustfmt::skip]
    fn prepare(&mut self) {
        fn set_fn_prototype(vm: &Vm, base: &Handle, proto: &Handle) {
            if let Some(fun) = base.as_function() {
                fun.set_fn_prototype(proto.clone());
            }
            proto.set_property(vm, "constructor".into(), PropertyValue::hidden(Value::Object(base.clone())));
        }

        let vm = &*self;
        let statics = &*vm.statics;

        /// #[prototype] - Internal [[Prototype]] field for this value
        /// #[fn_prototype] - Only valid on function values
        ///                   This will set the `prototype` property of the function
        /// #[properties] - Functions, which get `Function.prototype` as their [[Prototype]]
        /// #[fields] - Any other value
        macro_rules! register_builtin_type {
            (
                $base:expr, {
                    $( #[prototype] $prototype:expr; )?
                    $( #[fn_prototype] $fnprototype:expr; )?
                    $( #[properties] $( $prop:ident: $prop_path:expr; )+ )?
                    $( #[fields] $( $field:ident: $value:expr; )+ )?
                }
            ) => {{
                let base: &Handle = &$base;

                $( base.set_prototype(Some($prototype.clone())); )?
                $( set_fn_prototype(vm, base, &$fnprototype); )?

                // Properties
                $(
                    $({
                        let method = stringify!($prop);
                        let path: &Handle = &$prop_path;
                        register_builtin_type!(path, {
                            #[prototype] statics.function_prototype;
                        });
                        base.set_property(vm, method.into(), PropertyValue::hidden(Value::Object(path.clone())));
                    })+
                )?

                // Fields
                $(
                    $({
                        let field = stringify!($field);
                        base.set_property(vm, field.into(), PropertyValue::hidden($value));
                    })+
                )?
            }};
        }

        register_builtin_type!(statics.object_prototype, {
            #[properties]
            hasOwnProperty: statics.object_has_own_property;
            toString: statics.object_to_string;
        });

        register_builtin_type!(statics.object_ctor, {
            #[prototype] statics.function_prototype;
            #[fn_prototype] statics.object_prototype;
            #[properties]
            getPrototypeOf: statics.object_get_prototype_of;
        });

        register_builtin_type!(statics.function_prototype, {
            #[prototype] statics.object_prototype;
            #[properties]
            call: statics.function_call;
            apply: statics.function_apply;
            toString: statics.function_to_string;
        });

        register_builtin_type!(statics.function_ctor, {
            #[prototype] statics.function_prototype;
            #[fn_prototype] statics.function_prototype;
        });

        register_builtin_type!(statics.array_prototype, {
            #[prototype] statics.object_prototype;
            #[properties]
            join: statics.array_join;
            toString: statics.array_to_string;
        });

        register_builtin_type!(statics.error_prototype, {
            #[prototype] statics.object_prototype;
            #[properties]
            toString: statics.error_to_string;
            #[fields]
            name: Value::string("Error");
            message: Value::string("");
        });

        register_builtin_type!(statics.error_ctor, {
            #[prototype] statics.function_prototype;
            #[fn_prototype] statics.error_prototype;
        });

        macro_rules! register_error_subtype {
            ($($ctor:ident $proto:ident $name:literal),*) => {
                $(
                    register_builtin_type!(statics.$proto, {
                        #[prototype] statics.error_prototype;
                        #[fields]
                        name: Value::string($name);
                        message: Value::string("");
                    });

                    register_builtin_type!(statics.$ctor, {
                        #[prototype] statics.error_ctor;
                        #[fn_prototype] statics.$proto;
                    });
                )*
            };
        }

        register_error_subtype!(
            eval_error_ctor eval_error_prototype "EvalError",
            range_error_ctor range_error_prototype "RangeError",
            reference_error_ctor reference_error_prototype "ReferenceError",
            syntax_error_ctor syntax_error_prototype "SyntaxError",
            type_error_ctor type_error_prototype "TypeError",
            uri_error_ctor uri_error_prototype "URIError"
        );

        register_builtin_type!(statics.console, {
            #[prototype] statics.object_prototype;
            #[properties]
            log: statics.console_log;
        });

        register_builtin_type!(vm.global, {
            #[prototype] statics.object_prototype;
            #[properties]
            assert: statics.assert;
            print: statics.print;
            eval: statics.eval;
            isNaN: statics.is_nan;
            isFinite: statics.is_finite;
            parseInt: statics.parse_int;
            parseFloat: statics.parse_float;
            encodeURI: statics.encode_uri;
            encodeURIComponent: statics.encode_uri_component;
            decodeURI: statics.decode_uri;
            decodeURIComponent: statics.decode_uri_component;
            #[fields]
            globalThis: Value::Object(vm.global.clone());
            console: Value::Object(statics.console.clone());
            Object: Value::Object(statics.object_ctor.clone());
            Function: Value::Object(statics.function_ctor.clone());
            Error: Value::Object(statics.error_ctor.clone());
            EvalError: Value::Object(statics.eval_error_ctor.clone());
            RangeError: Value::Object(statics.range_error_ctor.clone());
            ReferenceError: Value::Object(statics.reference_error_ctor.clone());
            SyntaxError: Value::Object(statics.syntax_error_ctor.clone());
            TypeError: Value::Object(statics.type_error_ctor.clone());
            URIError: Value::Object(statics.uri_error_ctor.clone());
        });

        for (name, value) in [
            ("undefined", Value::Undefined),
            ("NaN", Value::number(f64::NAN)),
            ("Infinity", Value::number(f64::INFINITY)),
        ] {
            vm.global.set_property(vm, name.into(), PropertyValue::frozen(value));
        }
    }

    /// Calls a function and runs it to completion
    pub fn call(&mut self, callee: &Handle, this: Value, args: Vec<Value>) -> Result<Value, Unwind> {
        let Some(function) = callee.as_function() else {
            throw!(self, TypeError, "{} is not a function", Value::Object(callee.clone()).describe())
        };

        match function.begin_call(self, this, args, false)? {
            CallResult::Value(value) => Ok(value),
            CallResult::Frame(frame) => self.execute_frame(frame).map(HandleResult::into_value),
        }
    }

    /// Calls a function as a constructor, with `new_target` as its `new.target`
    pub fn construct(&mut self, callee: &Handle, args: Vec<Value>, new_target: &Handle) -> Result<Value, Unwind> {
        let Some(function) = callee.as_function() else {
            throw!(self, TypeError, "{} is not a constructor", Value::Object(callee.clone()).describe())
        };

        match function.begin_construct(self, args, new_target, false)? {
            CallResult::Value(value) => Ok(value),
            CallResult::Frame(frame) => self.execute_frame(frame).map(HandleResult::into_value),
        }
    }

    /// Pushes a frame and allocates its local slots, if the call stack has room for it
    pub(crate) fn try_push_frame(&mut self, frame: Frame) -> Result<(), Unwind> {
        if self.frames.len() >= self.params.max_frames() {
            self.stack.truncate(frame.sp);
            throw!(self, RangeError, "Maximum call stack size exceeded");
        }

        debug!(depth = self.frames.len(), locals = frame.function.locals, "push frame");
        self.stack.resize(frame.sp + frame.function.locals, Value::Undefined);
        self.frames.push(frame);
        Ok(())
    }

    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub(crate) fn stack_size(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn drain_stack<R>(&mut self, range: R) -> Drain<'_, Value>
    where
        R: RangeBounds<usize>,
    {
        self.stack.drain(range)
    }

    pub(crate) fn fetch_and_inc_ip(&mut self) -> u8 {
        let frame = self.frames.last_mut().expect("No frame");
        let ip = frame.ip;
        frame.ip += 1;
        frame.function.buffer[ip]
    }

    /// Jumps to the innermost try block, unless it belongs to a frame below `max_fp`
    fn handle_rt_error(&mut self, err: Value, max_fp: usize) -> Result<(), Unwind> {
        // Using .last() here instead of .pop() because there is a possibility that we
        // can't use this block (read the comment above the if statement try_fp < max_fp)
        if let Some(last) = self.try_blocks.last() {
            // Do not unwind further than we are allowed to. If the last try block is "outside" of
            // the frame that this execution context was instantiated in, then we can't jump there.
            if last.frame_idx < max_fp {
                return Err(Unwind::Error(err));
            }

            let TryBlock { catch_ip, frame_idx, sp } = self.try_blocks.pop().expect("No try block");
            debug!(frames = self.frames.len() - frame_idx, "unwinding to catch block");

            drop(self.frames.drain(frame_idx..));
            self.stack.truncate(sp);

            let frame = self.frames.last_mut().expect("No frame");
            frame.ip = catch_ip;
            self.stack.push(err);

            Ok(())
        } else {
            Err(Unwind::Error(err))
        }
    }

    /// Removes everything an aborted execution left behind
    fn unwind_execution(&mut self, frame_count: usize, sp: usize) {
        self.frames.truncate(frame_count);
        self.stack.truncate(sp);
        self.try_blocks.retain(|tb| tb.frame_idx <= frame_count);
    }

    /// Executes a frame in this VM, until it returns.
    ///
    /// Functions called from the frame run in the same loop, so this only recurses
    /// into itself through native functions.
    pub fn execute_frame(&mut self, frame: Frame) -> Result<HandleResult, Unwind> {
        if self.reentry >= self.params.max_reentry() {
            self.stack.truncate(frame.sp);
            throw!(self, RangeError, "Maximum call stack size exceeded");
        }

        self.reentry += 1;
        let result = self.run_frame(frame);
        self.reentry -= 1;
        result
    }

    fn run_frame(&mut self, frame: Frame) -> Result<HandleResult, Unwind> {
        let sp = frame.sp;
        let frame_count = self.frames.len();
        self.try_push_frame(frame)?;

        let fp = self.frames.len();

        loop {
            let instruction = Instruction::from_repr(self.fetch_and_inc_ip()).expect("Invalid opcode");

            match dispatch::handle(self, instruction) {
                Ok(Some(hr)) => return Ok(hr),
                Ok(None) => continue,
                Err(Unwind::Error(err)) => {
                    if let Err(err) = self.handle_rt_error(err, fp) {
                        self.unwind_execution(frame_count, sp);
                        return Err(err);
                    }
                }
                Err(abort) => {
                    error!("execution aborted");
                    self.unwind_execution(frame_count, sp);
                    return Err(abort);
                }
            }
        }
    }
}
