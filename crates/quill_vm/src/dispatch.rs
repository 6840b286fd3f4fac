use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use quill_middle::compiler::constant::Constant;
use quill_middle::compiler::instruction::{AssignKind, Instruction};

use crate::frame::Frame;
use crate::value::{ExternalValue, Unwind, Value};
use crate::Vm;

pub enum HandleResult {
    Return(Value),
}

impl HandleResult {
    pub fn into_value(self) -> Value {
        match self {
            HandleResult::Return(v) => v,
        }
    }
}

pub struct DispatchContext<'vm> {
    vm: &'vm mut Vm,
}

impl<'vm> DispatchContext<'vm> {
    pub fn new(vm: &'vm mut Vm) -> Self {
        Self { vm }
    }

    pub fn fetchw_and_inc_ip(&mut self) -> u16 {
        let lo = self.fetch_and_inc_ip();
        let hi = self.fetch_and_inc_ip();
        u16::from_le_bytes([lo, hi])
    }

    pub fn fetch_assign_kind(&mut self) -> AssignKind {
        AssignKind::from_repr(self.fetch_and_inc_ip()).expect("Bytecode contained an invalid assignment kind")
    }

    pub fn get_local(&self, index: usize) -> Value {
        let sp = self.active_frame().sp;
        self.stack
            .get(sp + index)
            .expect("Bytecode attempted to reference invalid local")
            .unbox_external()
    }

    /// Writes a local. Captured locals are written through their box.
    pub fn set_local(&mut self, index: usize, value: Value) {
        let sp = self.active_frame().sp;
        let slot = self
            .vm
            .stack
            .get_mut(sp + index)
            .expect("Bytecode attempted to reference invalid local");

        match slot {
            Value::External(external) => external.set(value),
            slot => *slot = value,
        }
    }

    /// Moves a local into a box shared with a closure, or returns the existing box
    pub fn box_local(&mut self, index: usize) -> ExternalValue {
        let sp = self.active_frame().sp;
        let slot = self
            .vm
            .stack
            .get_mut(sp + index)
            .expect("Bytecode attempted to reference invalid local");

        match slot {
            Value::External(external) => external.clone(),
            slot => {
                let external = ExternalValue::new(std::mem::replace(slot, Value::Undefined));
                *slot = Value::External(external.clone());
                external
            }
        }
    }

    pub fn get_external(&self, index: usize) -> &ExternalValue {
        self.active_frame()
            .externals
            .get(index)
            .expect("Bytecode attempted to reference invalid external")
    }

    pub fn pop_frame(&mut self) -> Frame {
        self.vm
            .pop_frame()
            .expect("Bytecode attempted to pop frame, but no frames exist")
    }

    pub fn push_stack(&mut self, value: Value) {
        self.vm.stack.push(value);
    }

    pub fn pop_stack(&mut self) -> Value {
        self.vm
            .stack
            .pop()
            .expect("Bytecode attempted to pop stack value, but nothing was on the stack")
    }

    pub fn peek_stack(&self) -> Value {
        self.stack
            .last()
            .expect("Bytecode attempted to peek stack value, but nothing was on the stack")
            .clone()
    }

    pub fn pop_stack2(&mut self) -> (Value, Value) {
        let b = self.pop_stack();
        let a = self.pop_stack();
        (a, b)
    }

    pub fn pop_stack_many(&mut self, count: usize) -> Vec<Value> {
        let pos = self.stack_size() - count;
        self.vm.drain_stack(pos..).collect()
    }

    pub fn evaluate_binary<F>(&mut self, fun: F) -> Result<Option<HandleResult>, Unwind>
    where
        F: Fn(&mut Vm, &Value, &Value) -> Result<Value, Unwind>,
    {
        let (left, right) = self.pop_stack2();
        let result = fun(&mut *self.vm, &left, &right)?;
        self.push_stack(result);
        Ok(None)
    }

    pub fn active_frame(&self) -> &Frame {
        self.frames
            .last()
            .expect("Dispatch Context attempted to reference missing frame")
    }

    pub fn active_frame_mut(&mut self) -> &mut Frame {
        self.vm
            .frames
            .last_mut()
            .expect("Dispatch Context attempted to reference missing frame")
    }

    /// Moves the instruction pointer by `offset`, relative to the end of the current operand
    pub fn jump(&mut self, offset: i16) {
        let frame = self.active_frame_mut();
        frame.ip = frame.ip.wrapping_add_signed(isize::from(offset));
    }

    pub fn constant(&self, index: usize) -> &Constant {
        &self.active_frame().function.constants[index]
    }

    pub fn identifier_constant(&self, index: usize) -> Rc<str> {
        let symbol = self
            .constant(index)
            .as_identifier()
            .expect("Bytecode attempted to reference invalid identifier constant");
        self.interner.resolve_rc(symbol)
    }
}

impl Deref for DispatchContext<'_> {
    type Target = Vm;
    fn deref(&self) -> &Self::Target {
        self.vm
    }
}

impl DerefMut for DispatchContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.vm
    }
}

mod handlers {
    use std::rc::Rc;

    use if_chain::if_chain;
    use quill_log::debug;
    use quill_middle::compiler::constant::{Constant, Function as CompiledFunction};
    use quill_middle::compiler::instruction::AssignKind;
    use quill_middle::compiler::{FunctionCallMetadata, ObjectMemberKind};
    use quill_middle::parser::statement::FunctionKind as CompiledFunctionKind;

    use crate::frame::TryBlock;
    use crate::throw;
    use crate::value::array::Array;
    use crate::value::function::closure::Closure;
    use crate::value::function::user::UserFunction;
    use crate::value::function::{CallResult, Function, FunctionKind};
    use crate::value::object::{NamedObject, Object, PropertyDataDescriptor, PropertyValue};
    use crate::value::ops::conversions::ValueConversion;
    use crate::value::ops::{arithmetic, equality};
    use crate::value::{ExternalValue, Handle, Unwind, Value};
    use crate::Vm;

    use super::{DispatchContext, HandleResult};

    type HandlerResult = Result<Option<HandleResult>, Unwind>;

    /// Computes an assignment. Returns the value to store and the value of the expression.
    ///
    /// `old` is only read for compound assignments and increments.
    fn assign_value(vm: &mut Vm, kind: AssignKind, old: Value, rhs: Value) -> Result<(Value, Value), Unwind> {
        let op = match kind {
            AssignKind::Assignment => return Ok((rhs.clone(), rhs)),
            AssignKind::PrefixIncrement | AssignKind::PrefixDecrement => {
                let delta = if kind == AssignKind::PrefixIncrement { 1.0 } else { -1.0 };
                let value = Value::number(old.to_number(vm)? + delta);
                return Ok((value.clone(), value));
            }
            AssignKind::PostfixIncrement | AssignKind::PostfixDecrement => {
                let delta = if kind == AssignKind::PostfixIncrement { 1.0 } else { -1.0 };
                let old = old.to_number(vm)?;
                return Ok((Value::number(old + delta), Value::number(old)));
            }
            AssignKind::AddAssignment => arithmetic::add,
            AssignKind::SubAssignment => arithmetic::sub,
            AssignKind::MulAssignment => arithmetic::mul,
            AssignKind::DivAssignment => arithmetic::div,
            AssignKind::RemAssignment => arithmetic::rem,
            AssignKind::PowAssignment => arithmetic::pow,
            AssignKind::ShlAssignment => arithmetic::shl,
            AssignKind::ShrAssignment => arithmetic::shr,
            AssignKind::UshrAssignment => arithmetic::ushr,
            AssignKind::BitAndAssignment => arithmetic::bitand,
            AssignKind::BitOrAssignment => arithmetic::bitor,
            AssignKind::BitXorAssignment => arithmetic::bitxor,
        };

        let value = op(vm, &old, &rhs)?;
        Ok((value.clone(), value))
    }

    fn pop_rhs(cx: &mut DispatchContext<'_>, kind: AssignKind) -> Value {
        if kind.has_rhs() { cx.pop_stack() } else { Value::Undefined }
    }

    pub fn add(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::add)
    }

    pub fn sub(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::sub)
    }

    pub fn mul(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::mul)
    }

    pub fn div(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::div)
    }

    pub fn rem(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::rem)
    }

    pub fn pow(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::pow)
    }

    pub fn bitor(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::bitor)
    }

    pub fn bitxor(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::bitxor)
    }

    pub fn bitand(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::bitand)
    }

    pub fn bitshl(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::shl)
    }

    pub fn bitshr(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::shr)
    }

    pub fn bitushr(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.evaluate_binary(arithmetic::ushr)
    }

    macro_rules! comparison_handlers {
        ($($name:ident: |$vm:ident, $l:ident, $r:ident| $body:expr;)*) => {
            $(
                pub fn $name(mut cx: DispatchContext<'_>) -> HandlerResult {
                    cx.evaluate_binary(|$vm, $l, $r| Ok(Value::Boolean($body)))
                }
            )*
        };
    }

    comparison_handlers! {
        gt: |vm, l, r| equality::gt(vm, l, r)?;
        ge: |vm, l, r| equality::ge(vm, l, r)?;
        lt: |vm, l, r| equality::lt(vm, l, r)?;
        le: |vm, l, r| equality::le(vm, l, r)?;
        eq: |vm, l, r| equality::loose_eq(vm, l, r)?;
        ne: |vm, l, r| !equality::loose_eq(vm, l, r)?;
        strict_eq: |_vm, l, r| equality::strict_eq(l, r);
        strict_ne: |_vm, l, r| !equality::strict_eq(l, r);
    }

    pub fn objin(mut cx: DispatchContext<'_>) -> HandlerResult {
        let (key, target) = cx.pop_stack2();

        let Value::Object(target) = target else {
            let key = key.describe();
            let target = target.describe();
            throw!(cx, TypeError, "Cannot use 'in' operator to search for {} in {}", key, target)
        };

        let key = key.to_property_key(&mut cx)?;
        let found = target.has_property(&cx, &key);
        cx.push_stack(Value::Boolean(found));
        Ok(None)
    }

    pub fn instanceof(mut cx: DispatchContext<'_>) -> HandlerResult {
        let (value, target) = cx.pop_stack2();

        let target = match target {
            Value::Object(o) if o.is_callable() => o,
            _ => throw!(cx, TypeError, "Right-hand side of 'instanceof' is not callable"),
        };

        let Value::Object(prototype) = target.get_property(&cx, "prototype") else {
            throw!(cx, TypeError, "Function has non-object prototype in instanceof check")
        };

        let mut found = false;
        if let Value::Object(object) = value {
            let mut current = object.get_prototype();
            while let Some(proto) = current {
                if proto.ptr_eq(&prototype) {
                    found = true;
                    break;
                }
                current = proto.get_prototype();
            }
        }

        cx.push_stack(Value::Boolean(found));
        Ok(None)
    }

    pub fn pop(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.pop_stack();
        Ok(None)
    }

    pub fn undef(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.push_stack(Value::Undefined);
        Ok(None)
    }

    /// Creates a function object, resolving its captured variables in the current frame
    fn create_function(cx: &mut DispatchContext<'_>, fun: Rc<CompiledFunction>) -> Value {
        let externals: Rc<[ExternalValue]> = fun
            .externals
            .iter()
            .map(|external| {
                let id = usize::from(external.id);
                if external.is_nested_external {
                    cx.get_external(id).clone()
                } else {
                    cx.box_local(id)
                }
            })
            .collect();

        let name = fun.name.map(|name| cx.interner.resolve_rc(name));
        let user = UserFunction::new(Rc::clone(&fun), externals);

        let kind = match fun.ty {
            CompiledFunctionKind::Function => FunctionKind::User(user),
            CompiledFunctionKind::Arrow => {
                let frame = cx.active_frame();
                FunctionKind::Closure(Closure {
                    fun: user,
                    this: frame.this.clone(),
                    new_target: frame.new_target.clone(),
                })
            }
        };

        Value::Object(Function::new(cx, name, kind))
    }

    pub fn constant(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = cx.fetchw_and_inc_ip();
        let value = match cx.constant(usize::from(id)).clone() {
            Constant::Number(n) => Value::number(n),
            Constant::String(s) | Constant::Identifier(s) => Value::String(cx.interner.resolve_rc(s)),
            Constant::Boolean(b) => Value::Boolean(b),
            Constant::Null => Value::Null,
            Constant::Undefined => Value::Undefined,
            Constant::Function(fun) => create_function(&mut cx, fun),
        };

        cx.push_stack(value);
        Ok(None)
    }

    pub fn ldlocal(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = cx.fetchw_and_inc_ip();
        let value = cx.get_local(usize::from(id));
        cx.push_stack(value);
        Ok(None)
    }

    pub fn storelocal(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = usize::from(cx.fetchw_and_inc_ip());
        let kind = cx.fetch_assign_kind();
        let rhs = pop_rhs(&mut cx, kind);

        let old = match kind {
            AssignKind::Assignment => Value::Undefined,
            _ => cx.get_local(id),
        };
        let (value, result) = assign_value(&mut cx, kind, old, rhs)?;

        cx.set_local(id, value);
        cx.push_stack(result);
        Ok(None)
    }

    pub fn ldlocalext(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = cx.fetchw_and_inc_ip();
        let value = cx.get_external(usize::from(id)).get();
        cx.push_stack(value);
        Ok(None)
    }

    pub fn storelocalext(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = usize::from(cx.fetchw_and_inc_ip());
        let kind = cx.fetch_assign_kind();
        let rhs = pop_rhs(&mut cx, kind);

        let external = cx.get_external(id).clone();
        let old = match kind {
            AssignKind::Assignment => Value::Undefined,
            _ => external.get(),
        };
        let (value, result) = assign_value(&mut cx, kind, old, rhs)?;

        external.set(value);
        cx.push_stack(result);
        Ok(None)
    }

    pub fn ldglobal(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = cx.fetchw_and_inc_ip();
        let name = cx.identifier_constant(usize::from(id));
        let global = cx.global();

        match global.get_property_descriptor(&cx, &name) {
            Some(property) => cx.push_stack(property.value),
            None => throw!(cx, ReferenceError, "{} is not defined", name),
        }
        Ok(None)
    }

    pub fn storeglobal(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = cx.fetchw_and_inc_ip();
        let name = cx.identifier_constant(usize::from(id));
        let kind = cx.fetch_assign_kind();
        let rhs = pop_rhs(&mut cx, kind);
        let global = cx.global();

        let old = match kind {
            // sloppy mode: assigning to an undeclared variable creates a global
            AssignKind::Assignment => Value::Undefined,
            _ => match global.get_property_descriptor(&cx, &name) {
                Some(property) => property.value,
                None => throw!(cx, ReferenceError, "{} is not defined", name),
            },
        };
        let (value, result) = assign_value(&mut cx, kind, old, rhs)?;

        global.assign_property(&cx, name, value);
        cx.push_stack(result);
        Ok(None)
    }

    pub fn declareglobal(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = cx.fetchw_and_inc_ip();
        let name = cx.identifier_constant(usize::from(id));
        let global = cx.global();

        if global.get_own_property_descriptor(&cx, &name).is_none() {
            let descriptor = PropertyDataDescriptor::WRITABLE | PropertyDataDescriptor::ENUMERABLE;
            global.set_property(&cx, name, PropertyValue::new(Value::Undefined, descriptor));
        }
        Ok(None)
    }

    pub fn typeofglobal(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = cx.fetchw_and_inc_ip();
        let name = cx.identifier_constant(usize::from(id));
        let global = cx.global();

        let ty = global
            .get_property_descriptor(&cx, &name)
            .map_or(Value::string("undefined"), |p| p.value.type_of().as_value());
        cx.push_stack(ty);
        Ok(None)
    }

    pub fn pos(mut cx: DispatchContext<'_>) -> HandlerResult {
        let value = cx.pop_stack();
        let number = value.to_number(&mut cx)?;
        cx.push_stack(Value::number(number));
        Ok(None)
    }

    pub fn neg(mut cx: DispatchContext<'_>) -> HandlerResult {
        let value = cx.pop_stack();
        let number = value.to_number(&mut cx)?;
        cx.push_stack(Value::number(-number));
        Ok(None)
    }

    pub fn type_of(mut cx: DispatchContext<'_>) -> HandlerResult {
        let value = cx.pop_stack();
        cx.push_stack(value.type_of().as_value());
        Ok(None)
    }

    pub fn bitnot(mut cx: DispatchContext<'_>) -> HandlerResult {
        let value = cx.pop_stack();
        let number = value.to_int32(&mut cx)?;
        cx.push_stack(Value::number(f64::from(!number)));
        Ok(None)
    }

    pub fn not(mut cx: DispatchContext<'_>) -> HandlerResult {
        let value = cx.pop_stack();
        cx.push_stack(Value::Boolean(!value.to_boolean()));
        Ok(None)
    }

    fn ret_inner(mut cx: DispatchContext<'_>, tc_depth: u16, value: Value) -> HandlerResult {
        let frame = cx.pop_frame();
        cx.stack.truncate(frame.sp);

        let try_blocks = cx.try_blocks.len().saturating_sub(usize::from(tc_depth));
        cx.try_blocks.truncate(try_blocks);

        let is_flat_call = frame.is_flat_call();

        // a constructor that does not return an object evaluates to `this`
        let value = if_chain! {
            if frame.is_constructor_call();
            if !matches!(value, Value::Object(_));
            then {
                frame.this
            } else {
                value
            }
        };

        if is_flat_call {
            cx.push_stack(value);
            Ok(None)
        } else {
            Ok(Some(HandleResult::Return(value)))
        }
    }

    pub fn ret(mut cx: DispatchContext<'_>) -> HandlerResult {
        let tc_depth = cx.fetchw_and_inc_ip();
        let value = cx.pop_stack();
        ret_inner(cx, tc_depth, value)
    }

    pub fn call(mut cx: DispatchContext<'_>) -> HandlerResult {
        let meta = FunctionCallMetadata::from(cx.fetch_and_inc_ip());
        let args = cx.pop_stack_many(usize::from(meta.value()));
        let callee = cx.pop_stack();
        let this = if meta.is_object_call() { cx.pop_stack() } else { Value::Undefined };

        let target = match &callee {
            Value::Object(o) => o.as_function().map(|f| (o, f)),
            _ => None,
        };

        let Some((handle, function)) = target else {
            let callee = callee.describe();
            if meta.is_constructor_call() {
                throw!(cx, TypeError, "{} is not a constructor", callee)
            }
            throw!(cx, TypeError, "{} is not a function", callee)
        };

        let result = if meta.is_constructor_call() {
            function.begin_construct(&mut cx, args, handle, true)?
        } else {
            function.begin_call(&mut cx, this, args, true)?
        };

        match result {
            CallResult::Value(value) => cx.push_stack(value),
            CallResult::Frame(frame) => cx.try_push_frame(frame)?,
        }
        Ok(None)
    }

    pub fn jmp(mut cx: DispatchContext<'_>) -> HandlerResult {
        let offset = cx.fetchw_and_inc_ip() as i16;
        cx.jump(offset);
        Ok(None)
    }

    macro_rules! conditional_jump_handlers {
        ($($name:ident: |$value:ident| $cond:expr, pop = $pop:literal;)*) => {
            $(
                pub fn $name(mut cx: DispatchContext<'_>) -> HandlerResult {
                    let offset = cx.fetchw_and_inc_ip() as i16;
                    let $value = if $pop { cx.pop_stack() } else { cx.peek_stack() };
                    if $cond {
                        cx.jump(offset);
                    }
                    Ok(None)
                }
            )*
        };
    }

    conditional_jump_handlers! {
        jmpfalsep: |value| !value.is_truthy(), pop = true;
        jmpfalsenp: |value| !value.is_truthy(), pop = false;
        jmptruep: |value| value.is_truthy(), pop = true;
        jmptruenp: |value| value.is_truthy(), pop = false;
        jmpnullishp: |value| value.is_nullish(), pop = true;
        jmpnullishnp: |value| value.is_nullish(), pop = false;
    }

    pub fn staticpropaccess(mut cx: DispatchContext<'_>) -> HandlerResult {
        let id = cx.fetchw_and_inc_ip();
        let preserve_this = cx.fetch_and_inc_ip() == 1;
        let key = cx.identifier_constant(usize::from(id));

        let target = if preserve_this { cx.peek_stack() } else { cx.pop_stack() };
        let value = target.get_property(&cx, &key)?;
        cx.push_stack(value);
        Ok(None)
    }

    pub fn dynamicpropaccess(mut cx: DispatchContext<'_>) -> HandlerResult {
        let preserve_this = cx.fetch_and_inc_ip() == 1;
        let key = cx.pop_stack();
        let target = if preserve_this { cx.peek_stack() } else { cx.pop_stack() };

        let key = key.to_property_key(&mut cx)?;
        let value = target.get_property(&cx, &key)?;
        cx.push_stack(value);
        Ok(None)
    }

    pub fn staticpropassign(mut cx: DispatchContext<'_>) -> HandlerResult {
        let kind = cx.fetch_assign_kind();
        let id = cx.fetchw_and_inc_ip();
        let key = cx.identifier_constant(usize::from(id));
        let rhs = pop_rhs(&mut cx, kind);
        let target = cx.pop_stack();

        let old = match kind {
            AssignKind::Assignment => Value::Undefined,
            _ => target.get_property(&cx, &key)?,
        };
        let (value, result) = assign_value(&mut cx, kind, old, rhs)?;

        target.set_property(&cx, key, value)?;
        cx.push_stack(result);
        Ok(None)
    }

    pub fn dynamicpropassign(mut cx: DispatchContext<'_>) -> HandlerResult {
        let kind = cx.fetch_assign_kind();
        let rhs = pop_rhs(&mut cx, kind);
        let (target, key) = cx.pop_stack2();
        let key = key.to_property_key(&mut cx)?;

        let old = match kind {
            AssignKind::Assignment => Value::Undefined,
            _ => target.get_property(&cx, &key)?,
        };
        let (value, result) = assign_value(&mut cx, kind, old, rhs)?;

        target.set_property(&cx, key, value)?;
        cx.push_stack(result);
        Ok(None)
    }

    pub fn deletepropertydynamic(mut cx: DispatchContext<'_>) -> HandlerResult {
        let (target, key) = cx.pop_stack2();
        let key = key.to_property_key(&mut cx)?;
        let deleted = target.delete_property(&cx, &key)?;
        cx.push_stack(Value::Boolean(deleted));
        Ok(None)
    }

    pub fn arraylit(mut cx: DispatchContext<'_>) -> HandlerResult {
        let len = cx.fetchw_and_inc_ip();
        let items = cx.pop_stack_many(usize::from(len));
        let array = Array::from_vec(&cx, items);
        cx.push_stack(Value::Object(Handle::new(array)));
        Ok(None)
    }

    pub fn objlit(mut cx: DispatchContext<'_>) -> HandlerResult {
        let count = cx.fetchw_and_inc_ip();

        let mut keys = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let kind = ObjectMemberKind::from_repr(cx.fetch_and_inc_ip())
                .expect("Bytecode contained an invalid object member kind");
            match kind {
                ObjectMemberKind::Static => {
                    let id = cx.fetchw_and_inc_ip();
                    keys.push(Some(cx.identifier_constant(usize::from(id))));
                }
                ObjectMemberKind::Dynamic => keys.push(None),
            }
        }

        let slots = keys.len() + keys.iter().filter(|k| k.is_none()).count();
        let mut values = cx.pop_stack_many(slots).into_iter();

        let object = NamedObject::new(&cx);
        for key in keys {
            let value = values.next().expect("Missing object literal value");
            let key = match key {
                Some(key) => key,
                None => values
                    .next()
                    .expect("Missing object literal key")
                    .to_property_key(&mut cx)?,
            };
            object.set_property(&cx, key, PropertyValue::static_default(value));
        }

        cx.push_stack(Value::Object(Handle::new(object)));
        Ok(None)
    }

    pub fn this(mut cx: DispatchContext<'_>) -> HandlerResult {
        let this = cx.active_frame().this.clone();
        cx.push_stack(this);
        Ok(None)
    }

    pub fn new_target(mut cx: DispatchContext<'_>) -> HandlerResult {
        let new_target = cx.active_frame().new_target.clone();
        cx.push_stack(new_target.map_or(Value::Undefined, Value::Object));
        Ok(None)
    }

    pub fn global(mut cx: DispatchContext<'_>) -> HandlerResult {
        let global = cx.global();
        cx.push_stack(Value::Object(global));
        Ok(None)
    }

    pub fn try_block(mut cx: DispatchContext<'_>) -> HandlerResult {
        let offset = cx.fetchw_and_inc_ip() as i16;
        let catch_ip = cx.active_frame().ip.wrapping_add_signed(isize::from(offset));
        let frame_idx = cx.frames.len();
        let sp = cx.stack_size();

        cx.try_blocks.push(TryBlock { catch_ip, frame_idx, sp });
        Ok(None)
    }

    pub fn try_end(mut cx: DispatchContext<'_>) -> HandlerResult {
        cx.try_blocks.pop();
        Ok(None)
    }

    pub fn throw(mut cx: DispatchContext<'_>) -> HandlerResult {
        Err(Unwind::Error(cx.pop_stack()))
    }

    pub fn debugger(_cx: DispatchContext<'_>) -> HandlerResult {
        debug!("debugger statement");
        Ok(None)
    }
}

pub fn handle(vm: &mut Vm, instruction: Instruction) -> Result<Option<HandleResult>, Unwind> {
    let cx = DispatchContext::new(vm);
    match instruction {
        Instruction::Add => handlers::add(cx),
        Instruction::Sub => handlers::sub(cx),
        Instruction::Mul => handlers::mul(cx),
        Instruction::Div => handlers::div(cx),
        Instruction::Rem => handlers::rem(cx),
        Instruction::Pow => handlers::pow(cx),
        Instruction::Gt => handlers::gt(cx),
        Instruction::Ge => handlers::ge(cx),
        Instruction::Lt => handlers::lt(cx),
        Instruction::Le => handlers::le(cx),
        Instruction::Eq => handlers::eq(cx),
        Instruction::Ne => handlers::ne(cx),
        Instruction::StrictEq => handlers::strict_eq(cx),
        Instruction::StrictNe => handlers::strict_ne(cx),
        Instruction::BitOr => handlers::bitor(cx),
        Instruction::BitXor => handlers::bitxor(cx),
        Instruction::BitAnd => handlers::bitand(cx),
        Instruction::BitShl => handlers::bitshl(cx),
        Instruction::BitShr => handlers::bitshr(cx),
        Instruction::BitUshr => handlers::bitushr(cx),
        Instruction::ObjIn => handlers::objin(cx),
        Instruction::InstanceOf => handlers::instanceof(cx),
        Instruction::Pop => handlers::pop(cx),
        Instruction::Undef => handlers::undef(cx),
        Instruction::Constant => handlers::constant(cx),
        Instruction::LdLocal => handlers::ldlocal(cx),
        Instruction::StoreLocal => handlers::storelocal(cx),
        Instruction::LdLocalExt => handlers::ldlocalext(cx),
        Instruction::StoreLocalExt => handlers::storelocalext(cx),
        Instruction::LdGlobal => handlers::ldglobal(cx),
        Instruction::StoreGlobal => handlers::storeglobal(cx),
        Instruction::DeclareGlobal => handlers::declareglobal(cx),
        Instruction::TypeOfGlobal => handlers::typeofglobal(cx),
        Instruction::Pos => handlers::pos(cx),
        Instruction::Neg => handlers::neg(cx),
        Instruction::TypeOf => handlers::type_of(cx),
        Instruction::BitNot => handlers::bitnot(cx),
        Instruction::Not => handlers::not(cx),
        Instruction::Ret => handlers::ret(cx),
        Instruction::Call => handlers::call(cx),
        Instruction::Jmp => handlers::jmp(cx),
        Instruction::JmpFalseP => handlers::jmpfalsep(cx),
        Instruction::JmpFalseNP => handlers::jmpfalsenp(cx),
        Instruction::JmpTrueP => handlers::jmptruep(cx),
        Instruction::JmpTrueNP => handlers::jmptruenp(cx),
        Instruction::JmpNullishP => handlers::jmpnullishp(cx),
        Instruction::JmpNullishNP => handlers::jmpnullishnp(cx),
        Instruction::StaticPropAccess => handlers::staticpropaccess(cx),
        Instruction::DynamicPropAccess => handlers::dynamicpropaccess(cx),
        Instruction::StaticPropAssign => handlers::staticpropassign(cx),
        Instruction::DynamicPropAssign => handlers::dynamicpropassign(cx),
        Instruction::DeletePropertyDynamic => handlers::deletepropertydynamic(cx),
        Instruction::ArrayLit => handlers::arraylit(cx),
        Instruction::ObjLit => handlers::objlit(cx),
        Instruction::This => handlers::this(cx),
        Instruction::NewTarget => handlers::new_target(cx),
        Instruction::Global => handlers::global(cx),
        Instruction::Try => handlers::try_block(cx),
        Instruction::TryEnd => handlers::try_end(cx),
        Instruction::Throw => handlers::throw(cx),
        Instruction::Debugger => handlers::debugger(cx),
    }
}
