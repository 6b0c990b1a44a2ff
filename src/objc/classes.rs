/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Handling of Objective-C classes.
//!
//! Classes are objects with a [ClassHostObject]. They are compared by
//! identity, never by name: registering a class template twice creates two
//! unrelated classes that happen to share a name. We don't have metaclasses,
//! so there are no class methods, only instance methods.
//!
//! Resources:
//! - [[objc explain]: Classes and metaclasses](http://www.sealiesoftware.com/blog/archive/2009/04/14/objc_explain_Classes_and_metaclasses.html)

mod class_lists;
use class_lists::CLASS_LISTS;

use super::{id, nil, HostIMP, ObjC, IMP, SEL};
use std::collections::HashMap;

/// Generic reference to an Objective-C class.
///
/// The name is standard Objective-C.
pub type Class = id;

/// Our internal representation of a class, e.g. this is where message sends
/// will look up method implementations.
///
/// Note: `superclass` can be `nil`!
pub(super) struct ClassHostObject {
    pub(super) name: String,
    pub(super) superclass: Class,
    pub(super) methods: HashMap<SEL, IMP>,
    /// Names of properties declared directly on this class. See
    /// [super::properties].
    pub(super) properties: Vec<String>,
}
impl super::HostObject for ClassHostObject {}

/// Errors from defining classes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClassError {
    #[error("Superclass \"{superclass}\" of class \"{class}\" is not known")]
    UnknownSuperclass { class: String, superclass: String },
    #[error("{0:?} is not a class")]
    NotAClass(id),
}

/// A template for a class defined with [objc_classes].
///
/// Host code can use these to declare classes with methods implemented in
/// Rust. The runtime creates the actual class ([ClassHostObject]) from the
/// template with [ObjC::register_classes].
pub struct ClassTemplate {
    pub name: &'static str,
    pub superclass: Option<&'static str>,
    pub instance_methods: &'static [(&'static str, &'static dyn HostIMP)],
}

/// Type for lists of classes exported by host code.
///
/// Each module that wants to declare classes should export a constant using
/// this type. See [objc_classes] for an example.
///
/// The strings are the class names.
pub type ClassExports = &'static [(&'static str, ClassTemplate)];

#[doc(hidden)]
#[macro_export]
macro_rules! _objc_superclass {
    (: $name:ident) => {
        Some(stringify!($name))
    };
    () => {
        None
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! _objc_method {
    (
        $env:ident,
        $this:ident,
        $_cmd:ident,
        $retty:ty,
        $block:block
        $(, $ty:ty, $arg:ident)*
    ) => {
        // The closure must be explicitly casted because a bare closure defaults
        // to a different type than a pure fn pointer, which is the type that
        // HostIMP and CallFromHost are implemented on.
        &((|
            #[allow(unused_variables)]
            $env: &mut $crate::Environment,
            #[allow(unused_variables)]
            $this: $crate::objc::id,
            #[allow(unused_variables)]
            $_cmd: $crate::objc::SEL,
            $($arg: $ty,)*
        | -> $retty {$block}) as fn(
            &mut $crate::Environment,
            $crate::objc::id,
            $crate::objc::SEL,
            $($ty,)*
        ) -> $retty)
    }
}

/// Macro for creating a list of [ClassTemplate]s (i.e. [ClassExports]).
/// It imitates the Objective-C class definition syntax.
///
/// ```ignore
/// pub const CLASSES: ClassExports = objc_classes! {
/// (env, this, _cmd); // Specify names of HostIMP implicit parameters.
///                    // The second one should be `self` to match Objective-C,
///                    // but that's reserved in Rust, hence `this`.
///
/// @implementation MyClass: NSObject
///
/// - (id)foo {
///     // ...
/// }
///
/// - (())barWithQux:(u32)qux baz:(id)baz {
///     // ...
/// }
///
/// @end
/// };
/// ```
///
/// will desugar to approximately:
///
/// ```ignore
/// pub const CLASSES: ClassExports = &[
///     ("MyClass", ClassTemplate {
///         name: "MyClass",
///         superclass: Some("NSObject"),
///         instance_methods: &[
///             ("foo", &(|env: &mut Environment, this: id, _cmd: SEL| -> id {
///                 // ...
///             } as fn(&mut Environment, id, SEL) -> id)),
///             ("barWithQux:baz:", &(|
///                 env: &mut Environment,
///                 this: id,
///                 _cmd: SEL,
///                 qux: u32,
///                 baz: id,
///             | -> () {
///                 // ...
///             } as fn(&mut Environment, id, SEL, u32, id) -> ())),
///         ],
///     })
/// ];
/// ```
#[macro_export] // documentation comment links are annoying without this
macro_rules! objc_classes {
    {
        // Rust's macro hygiene prevents the macro's own names for these
        // parameters being visible, so we have to get names supplied by the
        // macro user.
        ($env:ident, $this:ident, $_cmd:ident);
        $(
            @implementation $class_name:ident $(: $superclass_name:ident)?

            $( - ($im_type:ty) $im_name:ident $(:($im_type1:ty) $im_arg1:ident)?
                              $($im_namen:ident:($im_typen:ty) $im_argn:ident)*
                 $im_block:block )*

            @end
        )+
    } => {
        &[
            $({
                const _OBJC_CURRENT_CLASS: &str = stringify!($class_name);

                (_OBJC_CURRENT_CLASS, $crate::objc::ClassTemplate {
                    name: _OBJC_CURRENT_CLASS,
                    superclass: $crate::_objc_superclass!($(: $superclass_name)?),
                    instance_methods: &[
                        $(
                            (
                                $crate::selector!(
                                    $(($im_type1);)?
                                    $im_name
                                    $(, $im_namen)*
                                ),
                                $crate::_objc_method!(
                                    $env,
                                    $this,
                                    $_cmd,
                                    $im_type,
                                    { $im_block }
                                    $(, $im_type1, $im_arg1)?
                                    $(, $im_typen, $im_argn)*
                                )
                            )
                        ),*
                    ],
                })
            }),+
        ]
    }
}
pub use crate::objc_classes; // #[macro_export] is weird...

impl ObjC {
    /// Create the class object for a template. The superclass must already
    /// exist.
    fn link_template(&mut self, template: &ClassTemplate, superclass: Class) -> Class {
        let methods = template
            .instance_methods
            .iter()
            .map(|&(name, host_imp)| (self.register_selector(name), IMP::Host(host_imp)))
            .collect();
        let class = self.alloc_static_object(Box::new(ClassHostObject {
            name: template.name.to_string(),
            superclass,
            methods,
            properties: Vec::new(),
        }));
        self.classes.insert(template.name.to_string(), class);
        log_dbg!(
            "Linked class \"{}\" {:?} (superclass {:?})",
            template.name,
            class,
            superclass
        );
        class
    }

    /// Called once by [ObjC::new] to create `NSObject` and the other
    /// built-in classes.
    pub(super) fn link_builtin_classes(&mut self) {
        for exports in CLASS_LISTS {
            for (_name, template) in exports.iter() {
                let superclass = match template.superclass {
                    // Built-in lists are ordered so that superclasses come
                    // first.
                    Some(name) => match self.classes.get(name) {
                        Some(&superclass) => superclass,
                        None => panic!("Built-in class {} is out of order", template.name),
                    },
                    None => nil,
                };
                let class = self.link_template(template, superclass);
                if template.name == "NSObject" {
                    self.root_class = class;
                }
            }
        }
        assert!(self.root_class != nil);
    }

    /// Create a class for each template in the list, returning them in the
    /// same order.
    ///
    /// A superclass is found by name, first among the classes earlier in the
    /// same list, then among all previously known classes. Each call creates
    /// new classes, even if a class with the same name exists already. If any
    /// superclass can't be found, no classes are created.
    pub fn register_classes(&mut self, exports: ClassExports) -> Result<Vec<Class>, ClassError> {
        for (index, (_name, template)) in exports.iter().enumerate() {
            let Some(superclass_name) = template.superclass else {
                continue;
            };
            let in_list = exports[..index]
                .iter()
                .any(|(_, earlier)| earlier.name == superclass_name);
            if !in_list && !self.classes.contains_key(superclass_name) {
                return Err(ClassError::UnknownSuperclass {
                    class: template.name.to_string(),
                    superclass: superclass_name.to_string(),
                });
            }
        }

        let mut linked: Vec<(&str, Class)> = Vec::with_capacity(exports.len());
        for (_name, template) in exports.iter() {
            let superclass = match template.superclass {
                Some(superclass_name) => linked
                    .iter()
                    .rev()
                    .find(|&&(name, _)| name == superclass_name)
                    .map(|&(_, class)| class)
                    .or_else(|| self.classes.get(superclass_name).copied())
                    .unwrap_or_else(|| panic!("Superclass {} vanished", superclass_name)),
                None => nil,
            };
            let class = self.link_template(template, superclass);
            linked.push((template.name, class));
        }
        Ok(linked.into_iter().map(|(_, class)| class).collect())
    }

    /// Create an empty class at runtime (like `objc_allocateClassPair`).
    /// Methods can be added with [ObjC::class_add_method]. A `superclass` of
    /// [nil] creates a new root class.
    pub fn allocate_class(&mut self, name: &str, superclass: Class) -> Result<Class, ClassError> {
        if superclass != nil && !self.is_class(superclass) {
            return Err(ClassError::NotAClass(superclass));
        }
        let class = self.alloc_static_object(Box::new(ClassHostObject {
            name: name.to_string(),
            superclass,
            methods: HashMap::new(),
            properties: Vec::new(),
        }));
        self.classes.insert(name.to_string(), class);
        Ok(class)
    }

    /// Get the most recently created class with a particular name.
    pub fn get_known_class(&self, name: &str) -> Option<Class> {
        self.classes.get(name).copied()
    }

    /// Returns `true` if the object is a class.
    pub fn is_class(&self, object: id) -> bool {
        self.get_host_object(object)
            .is_some_and(|host_object| host_object.as_any().is::<ClassHostObject>())
    }

    pub fn get_class_name(&self, class: Class) -> &str {
        &self.borrow::<ClassHostObject>(class).name
    }

    /// Get the superclass, or [nil] for a root class.
    pub fn class_superclass(&self, class: Class) -> Class {
        self.borrow::<ClassHostObject>(class).superclass
    }

    pub fn class_is_subclass_of(&self, class: Class, superclass: Class) -> bool {
        let mut class = class;
        loop {
            if class == superclass {
                return true;
            } else if class == nil {
                return false;
            }
            class = self.class_superclass(class);
        }
    }
}
