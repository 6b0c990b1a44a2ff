/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `NSObject`, the root of the class hierarchy.
//!
//! There are no class methods, so objects are created with
//! [crate::objc::ObjC::alloc_object] rather than `alloc`.

use crate::objc::{id, objc_classes, ClassExports, SEL};

pub const CLASSES: ClassExports = objc_classes! {

(env, this, _cmd);

@implementation NSObject

- (id)init {
    this
}

- (id)class {
    env.objc.object_get_class(this)
}

- (bool)isKindOfClass:(id)class {
    let this_class = env.objc.object_get_class(this);
    env.objc.class_is_subclass_of(this_class, class)
}

- (bool)respondsToSelector:(SEL)selector {
    let class = env.objc.object_get_class(this);
    env.objc.class_has_method(class, selector)
}

@end

};
