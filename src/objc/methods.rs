/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Handling of Objective-C methods.
//!
//! Resources:
//! - [Apple's documentation of `class_addMethod`](https://developer.apple.com/documentation/objectivec/1418901-class_addmethod?language=objc)
//! - [Apple's documentation of `class_replaceMethod`](https://developer.apple.com/documentation/objectivec/1418707-class_replacemethod?language=objc)

use super::{id, nil, Class, ClassHostObject, ObjC, PropertyAccessor, SEL};
use crate::abi::{Args, CallFromHost, MethodArg, MethodRet, Value};
use crate::Environment;

/// Type for any function implementing a method.
///
/// The name is standard Objective-C.
///
/// Every implementation conforms to the same convention: it receives the
/// receiver ([id]), the selector of the message ([SEL]) and a frame of
/// arguments.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone)]
pub enum IMP {
    /// A Rust function, usually from [super::objc_classes].
    Host(&'static dyn HostIMP),
    /// Calls the superclass's implementation of the same selector, with the
    /// same receiver and arguments, i.e. `[super sel]` as written in `class`.
    ///
    /// Installed by [super::replace_method] when it replaces a method that
    /// the class only inherits, so that there is a previous implementation to
    /// forward to.
    CallSuper { class: Class },
    /// A synthesized property accessor. See [super::properties].
    Property(PropertyAccessor),
}

impl std::fmt::Debug for IMP {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IMP::Host(host_imp) => write!(f, "Host({:p})", *host_imp as *const dyn HostIMP),
            IMP::CallSuper { class } => write!(f, "CallSuper {{ class: {:?} }}", class),
            IMP::Property(accessor) => write!(f, "Property({:?})", accessor),
        }
    }
}

impl IMP {
    /// Returns `true` if both are the very same implementation.
    pub fn is_same(&self, other: &IMP) -> bool {
        match (self, other) {
            (IMP::Host(a), IMP::Host(b)) => {
                (*a as *const dyn HostIMP).cast::<()>() == (*b as *const dyn HostIMP).cast::<()>()
            }
            (IMP::CallSuper { class: a }, IMP::CallSuper { class: b }) => a == b,
            (IMP::Property(a), IMP::Property(b)) => a == b,
            _ => false,
        }
    }

    /// Call the implementation directly, bypassing method lookup.
    ///
    /// This doesn't record the call as part of a chain of replaced
    /// implementations, so a replaced implementation called this way that
    /// forwards will not reach the one it replaced. See
    /// [super::call_implementation_for] for that.
    pub fn call(&self, env: &mut Environment, this: id, sel: SEL, args: Args) -> Value {
        match self {
            IMP::Host(host_imp) => host_imp.call_from_host(env, this, sel, args),
            IMP::CallSuper { class } => {
                let superclass = env.objc.class_superclass(*class);
                let imp = if superclass == nil {
                    None
                } else {
                    env.objc.class_get_instance_method(superclass, sel)
                };
                let Some(imp) = imp else {
                    panic!(
                        "Superclass of \"{}\" {:?} does not respond to selector \"{}\"!",
                        env.objc.get_class_name(*class),
                        class,
                        sel.as_str(&env.objc),
                    );
                };
                log_dbg!(
                    "Forwarding \"{}\" from {:?} to superclass {:?}",
                    sel.as_str(&env.objc),
                    class,
                    superclass
                );
                imp.call(env, this, sel, args)
            }
            IMP::Property(accessor) => accessor.call(env, this, sel, args),
        }
    }

}

/// Type for any host function implementing a method (see also [IMP]).
pub trait HostIMP: CallFromHost {}

macro_rules! impl_HostIMP {
    ( $($P:ident),* ) => {
        impl<R, $($P),*> HostIMP for fn(&mut Environment, id, SEL, $($P),*) -> R
        where
            R: MethodRet,
            $($P: MethodArg,)*
        {
        }
    }
}

impl_HostIMP!();
impl_HostIMP!(P0);
impl_HostIMP!(P0, P1);
impl_HostIMP!(P0, P1, P2);
impl_HostIMP!(P0, P1, P2, P3);

impl ObjC {
    fn class_host_object_mut(&mut self, class: Class) -> &mut ClassHostObject {
        self.borrow_mut::<ClassHostObject>(class)
    }

    /// Look up the implementation of a selector for instances of a class,
    /// searching its superclasses too.
    pub fn class_get_instance_method(&self, class: Class, sel: SEL) -> Option<IMP> {
        let mut class = class;
        loop {
            let &ClassHostObject {
                superclass,
                ref methods,
                ..
            } = self.borrow(class);
            if let Some(imp) = methods.get(&sel) {
                return Some(imp.clone());
            } else if superclass.is_null() {
                return None;
            } else {
                class = superclass;
            }
        }
    }

    /// Look up the implementation of a selector defined directly on this
    /// exact class, ignoring superclasses.
    pub fn class_get_direct_method(&self, class: Class, sel: SEL) -> Option<IMP> {
        self.borrow::<ClassHostObject>(class)
            .methods
            .get(&sel)
            .cloned()
    }

    /// Returns `true` if instances of the class respond to the selector.
    pub fn class_has_method(&self, class: Class, sel: SEL) -> bool {
        self.class_get_instance_method(class, sel).is_some()
    }

    /// Add a method to a class (like `class_addMethod`). Returns `false`, and
    /// leaves the class unchanged, if the class already has its own
    /// implementation of the selector. An inherited implementation doesn't
    /// count, so this can be used to override one.
    pub fn class_add_method(&mut self, class: Class, sel: SEL, imp: IMP) -> bool {
        let methods = &mut self.class_host_object_mut(class).methods;
        if methods.contains_key(&sel) {
            return false;
        }
        methods.insert(sel, imp);
        true
    }

    /// Set the implementation of a selector on a class (like
    /// `class_replaceMethod`), returning the class's own previous
    /// implementation, if it had one.
    pub fn class_replace_method(&mut self, class: Class, sel: SEL, imp: IMP) -> Option<IMP> {
        self.class_host_object_mut(class).methods.insert(sel, imp)
    }

    /// Names of all the selectors a class responds to, including inherited
    /// ones. Intended for debugging.
    pub fn debug_all_class_selectors_as_strings(&self, class: Class) -> Vec<String> {
        let mut class = class;
        let mut selector_strings = Vec::new();
        loop {
            let &ClassHostObject {
                superclass,
                ref methods,
                ..
            } = self.borrow(class);
            let mut class_selector_strings = methods
                .keys()
                .map(|sel| sel.as_str(self).to_string())
                .collect();
            selector_strings.append(&mut class_selector_strings);
            if superclass == nil {
                break;
            } else {
                class = superclass;
            }
        }
        selector_strings
    }
}
