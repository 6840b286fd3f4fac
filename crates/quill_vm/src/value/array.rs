use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::{Vm, delegate};

use super::Value;
use super::object::{NamedObject, Object, PropertyDataDescriptor, PropertyValue, array_index};

/// An array with dense storage. Holes are stored as `undefined`.
#[derive(Debug)]
pub struct Array {
    items: RefCell<Vec<Value>>,
    obj: NamedObject,
}

impl Array {
    pub fn from_vec(vm: &Vm, items: Vec<Value>) -> Self {
        Self {
            items: RefCell::new(items),
            obj: NamedObject::with_prototype(Some(vm.statics.array_prototype.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }
}

impl Object for Array {
    fn get_own_property_descriptor(&self, vm: &Vm, key: &str) -> Option<PropertyValue> {
        if key == "length" {
            return Some(PropertyValue::new(
                Value::number(self.len() as f64),
                PropertyDataDescriptor::WRITABLE,
            ));
        }

        match array_index(key) {
            Some(index) => self
                .items
                .borrow()
                .get(index)
                .cloned()
                .map(PropertyValue::static_default),
            None => self.obj.get_own_property_descriptor(vm, key),
        }
    }

    fn set_property(&self, vm: &Vm, key: Rc<str>, value: PropertyValue) {
        if &*key == "length" {
            if let Value::Number(n) = value.value {
                if n >= 0.0 && n.fract() == 0.0 {
                    self.items.borrow_mut().resize(n as usize, Value::Undefined);
                }
            }
            return;
        }

        match array_index(&key) {
            Some(index) => {
                let mut items = self.items.borrow_mut();
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value.value;
            }
            None => self.obj.set_property(vm, key, value),
        }
    }

    fn delete_property(&self, key: &str) -> bool {
        match array_index(key) {
            Some(index) => {
                if let Some(slot) = self.items.borrow_mut().get_mut(index) {
                    *slot = Value::Undefined;
                }
                true
            }
            None if key == "length" => false,
            None => self.obj.delete_property(key),
        }
    }

    fn own_keys(&self) -> Vec<Rc<str>> {
        let mut keys: Vec<Rc<str>> = (0..self.len()).map(|i| Rc::from(i.to_string())).collect();
        keys.extend(self.obj.own_keys());
        keys
    }

    fn class_name(&self) -> &'static str {
        "Array"
    }

    delegate!(obj, set_prototype, get_prototype);

    fn as_any(&self) -> &dyn Any {
        self
    }
}
