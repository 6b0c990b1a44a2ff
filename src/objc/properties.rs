/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Handling of Objective-C properties.
//!
//! A declared property gets a synthesized getter (`value`) and setter
//! (`setValue:`), like `@property` with `@synthesize` would give it. The
//! backing storage is a per-object table of ivars (instance variables) keyed
//! by property name, so it never touches the host object.
//!
//! The accessors are ordinary methods as far as lookup is concerned: they can
//! be overridden in subclasses, and they can be replaced with
//! [super::replace_method] like any other method.

use super::{id, ClassHostObject, ObjC, IMP, SEL};
use crate::abi::{Args, Value};
use crate::Environment;
use std::rc::Rc;

/// The implementation of a synthesized property accessor. See [IMP::Property].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAccessor {
    Getter { ivar: Rc<str> },
    Setter { ivar: Rc<str> },
}

impl PropertyAccessor {
    pub(super) fn call(&self, env: &mut Environment, this: id, sel: SEL, args: Args) -> Value {
        let Some(record) = env.objc.objects.get_mut(&this) else {
            panic!("Unknown object {:?}", this);
        };
        match self {
            PropertyAccessor::Getter { ivar } => {
                assert!(
                    args.is_empty(),
                    "Getter {:?} takes no arguments, got {:?}",
                    sel,
                    args
                );
                record.ivars.get(&**ivar).cloned().unwrap_or(Value::Void)
            }
            PropertyAccessor::Setter { ivar } => {
                let mut args = args.into_iter();
                let (Some(value), None) = (args.next(), args.next()) else {
                    panic!("Setter {:?} takes exactly one argument", sel);
                };
                log_dbg!("{:?}.{} = {:?}", this, ivar, value);
                record.ivars.insert(ivar.to_string(), value);
                Value::Void
            }
        }
    }
}

/// Name of the setter for a property, e.g. `setValue:` for `value`.
pub fn setter_name(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("set{}{}:", first.to_uppercase(), chars.as_str()),
        None => "set:".to_string(),
    }
}

impl ObjC {
    /// Declare a property on a class, synthesizing its getter and setter.
    ///
    /// An accessor the class already implements itself is left alone, so a
    /// custom getter or setter takes priority over the synthesized one.
    pub fn class_add_property(&mut self, class: super::Class, name: &str) {
        let ivar: Rc<str> = name.into();
        let getter = self.register_selector(name);
        let setter = self.register_selector(&setter_name(name));
        self.class_add_method(
            class,
            getter,
            IMP::Property(PropertyAccessor::Getter { ivar: ivar.clone() }),
        );
        self.class_add_method(
            class,
            setter,
            IMP::Property(PropertyAccessor::Setter { ivar }),
        );
        self.borrow_mut::<ClassHostObject>(class)
            .properties
            .push(name.to_string());
    }

    /// Checks if the class has a property with the provided name in its class
    /// chain.
    pub fn class_has_property(&self, class: super::Class, name: &str) -> bool {
        let mut class = class;
        loop {
            let &ClassHostObject {
                superclass,
                ref properties,
                ..
            } = self.borrow(class);
            if properties.iter().any(|property| property == name) {
                return true;
            } else if superclass == super::nil {
                return false;
            } else {
                class = superclass;
            }
        }
    }
}
