use std::any::Any;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use bitflags::bitflags;

use crate::Vm;

use super::{Handle, Typeof, Value};

pub type ObjectMap<K, V> = ahash::HashMap<K, V>;

pub trait Object: Debug {
    /// Returns an own property of this object, without looking at the prototype chain
    fn get_own_property_descriptor(&self, vm: &Vm, key: &str) -> Option<PropertyValue>;

    /// Defines or overwrites an own property, ignoring its writability
    fn set_property(&self, vm: &Vm, key: Rc<str>, value: PropertyValue);

    /// Removes an own property. Returns false if the property is not configurable.
    fn delete_property(&self, key: &str) -> bool;

    fn set_prototype(&self, value: Option<Handle>);

    fn get_prototype(&self) -> Option<Handle>;

    fn own_keys(&self) -> Vec<Rc<str>>;

    fn as_any(&self) -> &dyn Any;

    fn type_of(&self) -> Typeof {
        Typeof::Object
    }

    /// The tag used by `Object.prototype.toString`
    fn class_name(&self) -> &'static str {
        "Object"
    }

    fn get_property_descriptor(&self, vm: &Vm, key: &str) -> Option<PropertyValue> {
        if let Some(value) = self.get_own_property_descriptor(vm, key) {
            return Some(value);
        }

        let mut proto = self.get_prototype();
        while let Some(object) = proto {
            if let Some(value) = object.get_own_property_descriptor(vm, key) {
                return Some(value);
            }
            proto = object.get_prototype();
        }
        None
    }

    fn get_property(&self, vm: &Vm, key: &str) -> Value {
        self.get_property_descriptor(vm, key)
            .map_or(Value::Undefined, |p| p.value)
    }

    fn has_property(&self, vm: &Vm, key: &str) -> bool {
        self.get_property_descriptor(vm, key).is_some()
    }

    /// Performs an assignment: writes to non-writable properties are dropped,
    /// an existing own property keeps its attributes.
    fn assign_property(&self, vm: &Vm, key: Rc<str>, value: Value) {
        let descriptor = match self.get_own_property_descriptor(vm, &key) {
            Some(own) => own.descriptor,
            None => match self.get_property_descriptor(vm, &key) {
                Some(inherited) if !inherited.descriptor.contains(PropertyDataDescriptor::WRITABLE) => return,
                _ => PropertyDataDescriptor::default(),
            },
        };

        if descriptor.contains(PropertyDataDescriptor::WRITABLE) {
            self.set_property(vm, key, PropertyValue::new(value, descriptor));
        }
    }
}

/// Forwards [`Object`] methods to a field, for objects that wrap a [`NamedObject`]
#[macro_export]
macro_rules! delegate {
    (override $field:ident, get_own_property_descriptor) => {
        fn get_own_property_descriptor(
            &self,
            vm: &$crate::Vm,
            key: &str,
        ) -> Option<$crate::value::object::PropertyValue> {
            self.$field.get_own_property_descriptor(vm, key)
        }
    };
    (override $field:ident, set_property) => {
        fn set_property(
            &self,
            vm: &$crate::Vm,
            key: ::std::rc::Rc<str>,
            value: $crate::value::object::PropertyValue,
        ) {
            self.$field.set_property(vm, key, value)
        }
    };
    (override $field:ident, delete_property) => {
        fn delete_property(&self, key: &str) -> bool {
            self.$field.delete_property(key)
        }
    };
    (override $field:ident, set_prototype) => {
        fn set_prototype(&self, value: Option<$crate::value::Handle>) {
            self.$field.set_prototype(value)
        }
    };
    (override $field:ident, get_prototype) => {
        fn get_prototype(&self) -> Option<$crate::value::Handle> {
            self.$field.get_prototype()
        }
    };
    (override $field:ident, own_keys) => {
        fn own_keys(&self) -> Vec<::std::rc::Rc<str>> {
            self.$field.own_keys()
        }
    };
    (override $field:ident, as_any) => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
    };
    ($field:ident, $($method:ident),* $(,)?) => {
        $(
            $crate::delegate!(override $field, $method);
        )*
    };
}

bitflags! {
    pub struct PropertyDataDescriptor: u8 {
        const CONFIGURABLE = 1 << 0;
        const ENUMERABLE = 1 << 1;
        const WRITABLE = 1 << 2;
    }
}

impl Default for PropertyDataDescriptor {
    fn default() -> Self {
        Self::CONFIGURABLE | Self::ENUMERABLE | Self::WRITABLE
    }
}

#[derive(Debug, Clone)]
pub struct PropertyValue {
    pub value: Value,
    pub descriptor: PropertyDataDescriptor,
}

impl PropertyValue {
    pub fn new(value: Value, descriptor: PropertyDataDescriptor) -> Self {
        Self { value, descriptor }
    }

    /// A writable, enumerable and configurable property, as created by an assignment
    pub fn static_default(value: Value) -> Self {
        Self::new(value, PropertyDataDescriptor::default())
    }

    /// A writable and configurable, but not enumerable property. Used for builtin methods.
    pub fn hidden(value: Value) -> Self {
        Self::new(
            value,
            PropertyDataDescriptor::WRITABLE | PropertyDataDescriptor::CONFIGURABLE,
        )
    }

    /// A property that can neither be written, deleted nor enumerated
    pub fn frozen(value: Value) -> Self {
        Self::new(value, PropertyDataDescriptor::empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NamedObject {
    prototype: RefCell<Option<Handle>>,
    values: RefCell<ObjectMap<Rc<str>, PropertyValue>>,
}

impl NamedObject {
    /// Creates an empty object inheriting from `Object.prototype`
    pub fn new(vm: &Vm) -> Self {
        Self::with_prototype(Some(vm.statics.object_prototype.clone()))
    }

    pub fn with_prototype(prototype: Option<Handle>) -> Self {
        Self {
            prototype: RefCell::new(prototype),
            values: RefCell::new(ObjectMap::default()),
        }
    }

    /// Creates an object without a prototype
    pub fn null() -> Self {
        Self::with_prototype(None)
    }
}

impl Object for NamedObject {
    fn get_own_property_descriptor(&self, _: &Vm, key: &str) -> Option<PropertyValue> {
        self.values.borrow().get(key).cloned()
    }

    fn set_property(&self, _: &Vm, key: Rc<str>, value: PropertyValue) {
        self.values.borrow_mut().insert(key, value);
    }

    fn delete_property(&self, key: &str) -> bool {
        let mut values = self.values.borrow_mut();
        match values.get(key) {
            Some(value) if !value.descriptor.contains(PropertyDataDescriptor::CONFIGURABLE) => false,
            Some(_) => {
                values.remove(key);
                true
            }
            None => true,
        }
    }

    fn set_prototype(&self, value: Option<Handle>) {
        *self.prototype.borrow_mut() = value;
    }

    fn get_prototype(&self) -> Option<Handle> {
        self.prototype.borrow().clone()
    }

    fn own_keys(&self) -> Vec<Rc<str>> {
        self.values
            .borrow()
            .iter()
            .filter(|(_, v)| v.descriptor.contains(PropertyDataDescriptor::ENUMERABLE))
            .map(|(k, _)| Rc::clone(k))
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Parses a canonical array index (`"0"`, `"17"`, but not `"01"` or `"-1"`)
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn array_indices() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("42"), Some(42));
        assert_eq!(array_index("042"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("length"), None);
        assert_eq!(array_index(""), None);
    }
}
