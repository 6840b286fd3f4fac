/// Creates an error object of the given type and returns it from the enclosing function as
/// [`Unwind::Error`](crate::value::Unwind::Error).
///
/// The first argument is anything that dereferences to a [`Vm`](crate::Vm).
#[macro_export]
macro_rules! throw {
    ($vm:expr, $err:ident, $msg:expr) => {
        return Err({
            let vm: &$crate::Vm = &$vm;
            let err = $crate::value::error::Error::new_value(vm, $crate::value::error::ErrorKind::$err, $msg);
            $crate::value::Unwind::Error(err)
        })
    };
    ($vm:expr, $err:ident, $msg:expr, $($arg:expr),*) => {
        return Err({
            let message = ::std::format!($msg, $($arg),*);
            let vm: &$crate::Vm = &$vm;
            let err = $crate::value::error::Error::new_value(vm, $crate::value::error::ErrorKind::$err, message);
            $crate::value::Unwind::Error(err)
        })
    };
}
