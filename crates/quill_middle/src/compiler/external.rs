/// A variable that a function captures from an enclosing function.
///
/// When the closure is created, `id` is resolved in the *enclosing* frame: as a local id if
/// `is_nested_external` is false, otherwise as an external id of the enclosing function,
/// for variables captured through more than one level of nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct External {
    pub id: u16,
    pub is_nested_external: bool,
}
