/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Associated values: arbitrary key-value data attached to a particular class
//! or a particular object, like `objc_setAssociatedObject`.
//!
//! Values are associated *non-polymorphically*. Values set on a class can only
//! be retrieved from that exact class, never from a subclass or superclass,
//! and never through an instance of the class. Likewise, values set on an
//! object are only visible on that object.
//!
//! ```ignore
//! env.objc.set_class_associated_value(base, "animal", "dog");
//! env.objc.set_class_associated_value(subclass, "animal", "cat");
//!
//! // "dog"
//! env.objc.class_associated_value_as::<&str>(base, "animal");
//! // "cat"
//! env.objc.class_associated_value_as::<&str>(subclass, "animal");
//! // None
//! env.objc.object_associated_value(instance_of_subclass, "animal");
//! ```
//!
//! Tables are keyed by identity, so two classes that share a name never share
//! values. A table is created on the first write and is dropped together with
//! its object.

use super::{id, nil, Class, ObjC};
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

/// Key-value pairs associated with a specific class or a specific object.
pub type AssociatedValues = HashMap<String, Rc<dyn Any>>;

/// What a table of associated values belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    /// This exact class (not its subclasses or instances).
    Class(Class),
    /// This exact object.
    Instance(id),
}

impl Owner {
    pub fn identity(self) -> id {
        match self {
            Owner::Class(class) => class,
            Owner::Instance(object) => object,
        }
    }
}

impl ObjC {
    /// Check the owner exists and is what it claims to be.
    fn owner_identity(&self, owner: Owner) -> id {
        let object = owner.identity();
        assert!(object != nil, "nil can't have associated values");
        match owner {
            Owner::Class(class) => assert!(
                self.is_class(class),
                "{:?} is not a class, use the object associated values instead",
                class
            ),
            Owner::Instance(object) => assert!(
                self.object_exists(object) && !self.is_class(object),
                "{:?} is not a live instance, use the class associated values for classes",
                object
            ),
        }
        object
    }

    /// Get the value for `key` set on exactly this owner.
    pub fn associated_value(&self, owner: Owner, key: &str) -> Option<Rc<dyn Any>> {
        let object = self.owner_identity(owner);
        self.associated_values.get(&object)?.get(key).cloned()
    }

    /// Set the value for `key` on exactly this owner, replacing any previous
    /// value.
    pub fn set_associated_value(&mut self, owner: Owner, key: &str, value: Rc<dyn Any>) {
        let object = self.owner_identity(owner);
        self.associated_values
            .entry(object)
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Get a copy of all of an owner's associated values. Changes to the copy
    /// have no effect unless written back with [ObjC::set_associated_values].
    pub fn associated_values(&self, owner: Owner) -> AssociatedValues {
        let object = self.owner_identity(owner);
        self.associated_values
            .get(&object)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace all of an owner's associated values.
    pub fn set_associated_values(&mut self, owner: Owner, values: AssociatedValues) {
        let object = self.owner_identity(owner);
        if values.is_empty() {
            self.associated_values.remove(&object);
        } else {
            self.associated_values.insert(object, values);
        }
    }

    pub fn object_associated_value(&self, object: id, key: &str) -> Option<Rc<dyn Any>> {
        self.associated_value(Owner::Instance(object), key)
    }

    /// Like [ObjC::object_associated_value], but only returns values of type
    /// `T`.
    pub fn object_associated_value_as<T: Any>(&self, object: id, key: &str) -> Option<Rc<T>> {
        self.object_associated_value(object, key)?.downcast().ok()
    }

    pub fn set_object_associated_value<T: Any>(&mut self, object: id, key: &str, value: T) {
        self.set_associated_value(Owner::Instance(object), key, Rc::new(value))
    }

    pub fn object_associated_values(&self, object: id) -> AssociatedValues {
        self.associated_values(Owner::Instance(object))
    }

    pub fn set_object_associated_values(&mut self, object: id, values: AssociatedValues) {
        self.set_associated_values(Owner::Instance(object), values)
    }

    pub fn class_associated_value(&self, class: Class, key: &str) -> Option<Rc<dyn Any>> {
        self.associated_value(Owner::Class(class), key)
    }

    /// Like [ObjC::class_associated_value], but only returns values of type
    /// `T`.
    pub fn class_associated_value_as<T: Any>(&self, class: Class, key: &str) -> Option<Rc<T>> {
        self.class_associated_value(class, key)?.downcast().ok()
    }

    pub fn set_class_associated_value<T: Any>(&mut self, class: Class, key: &str, value: T) {
        self.set_associated_value(Owner::Class(class), key, Rc::new(value))
    }

    pub fn class_associated_values(&self, class: Class) -> AssociatedValues {
        self.associated_values(Owner::Class(class))
    }

    pub fn set_class_associated_values(&mut self, class: Class, values: AssociatedValues) {
        self.set_associated_values(Owner::Class(class), values)
    }
}
