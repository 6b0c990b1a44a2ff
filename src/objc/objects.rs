/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Handling of Objective-C objects.
//!
//! Note that classes are objects too!
//!
//! Resources:
//! - [Apple's documentation of `id`](https://developer.apple.com/documentation/objectivec/id)
//!
//! To make things easier for the host code, our implementation maintains two
//! linked representations of an object: an [objc_object] record that the
//! runtime itself uses (the `isa` and the synthesized property storage), and a
//! [HostObject] trait object, which can be used for any data that only the
//! host methods of the object's class need to access.

use super::{Class, ObjC};
use crate::abi::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Runtime record of an object. See [id].
///
/// The name comes from `objc_object` in Apple's runtime.
#[allow(non_camel_case_types)]
pub(super) struct objc_object {
    /// Tells you what class an object belongs to. This is [nil] for classes,
    /// since we don't have metaclasses.
    pub(super) isa: Class,
    /// Storage for synthesized properties. See [super::properties].
    pub(super) ivars: HashMap<String, Value>,
    pub(super) host_object: Box<dyn AnyHostObject>,
}

/// Generic reference to an Objective-C object (including classes).
///
/// The name is standard Objective-C. Identities are never reused, so two
/// distinct objects can't be confused even after one of them is deallocated.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct id(u32);

impl id {
    pub fn is_null(self) -> bool {
        self == nil
    }
}

impl fmt::Debug for id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id({:#x})", self.0)
    }
}

/// Null reference for Objective-C objects.
///
/// The name is standard Objective-C.
#[allow(non_upper_case_globals)]
pub const nil: id = id(0);

/// Type for host objects.
pub trait HostObject: Any + 'static {}

/// Trait wrapping [HostObject] with a blanket implementation to make
/// downcasting work. Don't implement it yourself.
///
/// This is a workaround for it not being possible to directly cast
/// `&'a dyn HostObject` to `&'a dyn Any`.
pub trait AnyHostObject {
    fn as_any<'a>(&'a self) -> &'a (dyn Any + 'static);
    fn as_any_mut<'a>(&'a mut self) -> &'a mut (dyn Any + 'static);
}
impl<T: HostObject> AnyHostObject for T {
    fn as_any<'a>(&'a self) -> &'a (dyn Any + 'static) {
        self
    }
    fn as_any_mut<'a>(&'a mut self) -> &'a mut (dyn Any + 'static) {
        self
    }
}

/// Empty host object for objects that don't need any host state.
pub struct TrivialHostObject;
impl HostObject for TrivialHostObject {}

impl ObjC {
    fn next_id(&mut self) -> id {
        self.last_id = self
            .last_id
            .checked_add(1)
            .unwrap_or_else(|| panic!("Ran out of object identities"));
        id(self.last_id)
    }

    /// Read the all-important `isa`.
    pub(super) fn read_isa(&self, object: id) -> Class {
        match self.objects.get(&object) {
            Some(record) => record.isa,
            None => panic!("Unknown object {:?}", object),
        }
    }

    /// Create an object that is not an instance of anything (used for
    /// classes).
    pub(super) fn alloc_static_object(&mut self, host_object: Box<dyn AnyHostObject>) -> id {
        let object = self.next_id();
        self.objects.insert(
            object,
            objc_object {
                isa: super::nil,
                ivars: HashMap::new(),
                host_object,
            },
        );
        object
    }

    /// Allocate an object (like `[NSObject alloc]`) and associate it with its
    /// host object.
    pub fn alloc_object(&mut self, isa: Class, host_object: Box<dyn AnyHostObject>) -> id {
        assert!(
            self.is_class(isa),
            "Can't allocate an instance of {:?}, it is not a class",
            isa
        );
        let object = self.next_id();
        self.objects.insert(
            object,
            objc_object {
                isa,
                ivars: HashMap::new(),
                host_object,
            },
        );
        log_dbg!(
            "Allocated {:?} (class \"{}\")",
            object,
            self.get_class_name(isa)
        );
        object
    }

    /// Destroy an object. Its host object, property storage and associated
    /// values are dropped. Classes can't be deallocated.
    pub fn dealloc_object(&mut self, object: id) {
        assert!(
            !self.is_class(object),
            "Classes live for as long as the runtime"
        );
        let Some(record) = self.objects.remove(&object) else {
            panic!("Double free or unknown object {:?}", object);
        };
        self.associated_values.remove(&object);
        log_dbg!("Deallocated {:?} (isa {:?})", object, record.isa);
    }

    /// Returns `true` if the object exists (has been allocated and not yet
    /// deallocated).
    pub fn object_exists(&self, object: id) -> bool {
        self.objects.contains_key(&object)
    }

    /// Get the class of an object. [nil] has no class, so this returns
    /// [nil] for it.
    pub fn object_get_class(&self, object: id) -> Class {
        if object == nil {
            return nil;
        }
        self.read_isa(object)
    }

    pub fn get_host_object(&self, object: id) -> Option<&dyn AnyHostObject> {
        self.objects
            .get(&object)
            .map(|record| &*record.host_object)
    }

    /// Get a reference to a host object and downcast it. Panics if there is
    /// no such object, or if downcasting fails.
    pub fn borrow<T: HostObject>(&self, object: id) -> &T {
        let Some(record) = self.objects.get(&object) else {
            panic!("Unknown object {:?}", object);
        };
        match record.host_object.as_any().downcast_ref() {
            Some(host_object) => host_object,
            None => panic!(
                "Host object of {:?} is not a {}",
                object,
                std::any::type_name::<T>()
            ),
        }
    }

    /// Get a mutable reference to a host object and downcast it. Panics if
    /// there is no such object, or if downcasting fails.
    pub fn borrow_mut<T: HostObject>(&mut self, object: id) -> &mut T {
        let Some(record) = self.objects.get_mut(&object) else {
            panic!("Unknown object {:?}", object);
        };
        match record.host_object.as_any_mut().downcast_mut() {
            Some(host_object) => host_object,
            None => panic!(
                "Host object of {:?} is not a {}",
                object,
                std::any::type_name::<T>()
            ),
        }
    }
}
