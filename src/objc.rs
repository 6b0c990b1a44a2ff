/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Objective-C-style runtime.
//!
//! Apple's [Programming with Objective-C](https://developer.apple.com/library/archive/documentation/Cocoa/Conceptual/ProgrammingWithObjectiveC/Introduction/Introduction.html)
//! is a useful introduction to the object model from a user's perspective.
//! There are further resources in the child modules of this module, but they
//! are more implementation-specific.
//!
//! The runtime exists so that method implementations can be replaced at the
//! class level while keeping the previous implementation reachable
//! ([swizzling]), and so that arbitrary data can be attached to a particular
//! class or object ([associated]). Everything is "host code": classes are
//! declared with [objc_classes] and implemented as Rust functions, and objects
//! carry a Rust [HostObject] for their state.

use std::collections::HashMap;

mod associated;
mod classes;
mod messages;
mod methods;
mod objects;
mod properties;
mod selectors;
pub mod swizzling;

pub use associated::{AssociatedValues, Owner};
pub use classes::{objc_classes, Class, ClassError, ClassExports, ClassTemplate};
pub use messages::{msg, msg_send};
pub use methods::{HostIMP, IMP};
pub use objects::{id, nil, AnyHostObject, HostObject, TrivialHostObject};
pub use properties::PropertyAccessor;
pub use selectors::{selector, SEL};
pub use swizzling::{
    call_implementation_for, call_replaced_closure_method, call_replaced_event_method,
    call_replaced_method, call_replaced_method_returning_object, call_replaced_method_with_args,
    call_replaced_object_method, call_replaced_string_method, implementation_for, replace_method,
    replaced_implementations, SwizzleError,
};

use classes::ClassHostObject;
use objects::objc_object;
use swizzling::ForwardingStack;

/// Main type holding Objective-C runtime state.
pub struct ObjC {
    /// Known selectors (interned method name strings).
    selectors: HashMap<String, SEL>,
    /// Names of known selectors, indexed by [SEL].
    selector_names: Vec<String>,

    /// Mapping of object identities to their runtime representation and host
    /// objects. Classes are objects too.
    ///
    /// If an object isn't in this map, we will consider it not to exist.
    objects: HashMap<id, objc_object>,

    /// Known classes, by name. If several classes were created with the same
    /// name, this has the most recent one.
    classes: HashMap<String, Class>,

    /// Side tables of associated values, keyed by the identity of the owning
    /// class or object. See [associated].
    associated_values: HashMap<id, AssociatedValues>,

    /// Forwarding calls in progress. See [swizzling].
    forwarding_frames: ForwardingStack,

    /// The last identity handed out by [ObjC::alloc_object] and friends.
    last_id: u32,

    /// `NSObject`, the root of the class hierarchy.
    root_class: Class,
}

impl ObjC {
    pub fn new() -> ObjC {
        let mut objc = ObjC {
            selectors: HashMap::new(),
            selector_names: Vec::new(),
            objects: HashMap::new(),
            classes: HashMap::new(),
            associated_values: HashMap::new(),
            forwarding_frames: ForwardingStack::default(),
            last_id: 0,
            root_class: nil,
        };
        objc.link_builtin_classes();
        objc
    }

    /// The root class all built-in classes derive from.
    pub fn root_class(&self) -> Class {
        self.root_class
    }
}

impl Default for ObjC {
    fn default() -> Self {
        ObjC::new()
    }
}
