use crate::js_std;
use crate::value::Handle;
use crate::value::function::native::NativeFunction;
use crate::value::function::{Function, FunctionKind};
use crate::value::object::NamedObject;

/// Builtin objects. Everything is created without a prototype and wired up by `Vm::prepare`.
#[derive(Debug)]
pub struct Statics {
    pub object_ctor: Handle,
    pub object_prototype: Handle,
    pub object_get_prototype_of: Handle,
    pub object_has_own_property: Handle,
    pub object_to_string: Handle,
    pub function_ctor: Handle,
    pub function_prototype: Handle,
    pub function_call: Handle,
    pub function_apply: Handle,
    pub function_to_string: Handle,
    pub array_prototype: Handle,
    pub array_join: Handle,
    pub array_to_string: Handle,
    pub error_ctor: Handle,
    pub error_prototype: Handle,
    pub error_to_string: Handle,
    pub eval_error_ctor: Handle,
    pub eval_error_prototype: Handle,
    pub range_error_ctor: Handle,
    pub range_error_prototype: Handle,
    pub reference_error_ctor: Handle,
    pub reference_error_prototype: Handle,
    pub syntax_error_ctor: Handle,
    pub syntax_error_prototype: Handle,
    pub type_error_ctor: Handle,
    pub type_error_prototype: Handle,
    pub uri_error_ctor: Handle,
    pub uri_error_prototype: Handle,
    pub console: Handle,
    pub console_log: Handle,
    pub print: Handle,
    pub assert: Handle,
    pub eval: Handle,
    pub is_nan: Handle,
    pub is_finite: Handle,
    pub parse_int: Handle,
    pub parse_float: Handle,
    pub encode_uri: Handle,
    pub encode_uri_component: Handle,
    pub decode_uri: Handle,
    pub decode_uri_component: Handle,
}

fn object() -> Handle {
    Handle::new(NamedObject::null())
}

fn function(name: &str, cb: NativeFunction) -> Handle {
    Function::with_obj(Some(name.into()), FunctionKind::Native(cb), NamedObject::null())
}

impl Statics {
    pub fn new() -> Self {
        Self {
            object_ctor: function("Object", js_std::object::constructor),
            object_prototype: object(),
            object_get_prototype_of: function("getPrototypeOf", js_std::object::get_prototype_of),
            object_has_own_property: function("hasOwnProperty", js_std::object::has_own_property),
            object_to_string: function("toString", js_std::object::to_string),
            function_ctor: function("Function", js_std::function::constructor),
            function_prototype: object(),
            function_call: function("call", js_std::function::call),
            function_apply: function("apply", js_std::function::apply),
            function_to_string: function("toString", js_std::function::to_string),
            array_prototype: object(),
            array_join: function("join", js_std::array::join),
            array_to_string: function("toString", js_std::array::to_string),
            error_ctor: function("Error", js_std::error::error_constructor),
            error_prototype: object(),
            error_to_string: function("toString", js_std::error::to_string),
            eval_error_ctor: function("EvalError", js_std::error::eval_error_constructor),
            eval_error_prototype: object(),
            range_error_ctor: function("RangeError", js_std::error::range_error_constructor),
            range_error_prototype: object(),
            reference_error_ctor: function("ReferenceError", js_std::error::reference_error_constructor),
            reference_error_prototype: object(),
            syntax_error_ctor: function("SyntaxError", js_std::error::syntax_error_constructor),
            syntax_error_prototype: object(),
            type_error_ctor: function("TypeError", js_std::error::type_error_constructor),
            type_error_prototype: object(),
            uri_error_ctor: function("URIError", js_std::error::uri_error_constructor),
            uri_error_prototype: object(),
            console: object(),
            console_log: function("log", js_std::global::log),
            print: function("print", js_std::global::print),
            assert: function("assert", js_std::global::assert),
            eval: function("eval", js_std::global::eval),
            is_nan: function("isNaN", js_std::global::is_nan),
            is_finite: function("isFinite", js_std::global::is_finite),
            parse_int: function("parseInt", js_std::global::parse_int),
            parse_float: function("parseFloat", js_std::global::parse_float),
            encode_uri: function("encodeURI", js_std::global::encode_uri),
            encode_uri_component: function("encodeURIComponent", js_std::global::encode_uri_component),
            decode_uri: function("decodeURI", js_std::global::decode_uri),
            decode_uri_component: function("decodeURIComponent", js_std::global::decode_uri_component),
        }
    }
}

impl Default for Statics {
    fn default() -> Self {
        Self::new()
    }
}
