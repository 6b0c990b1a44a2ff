/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `NSEvent`. Only key events are supported.

use crate::objc::{id, objc_classes, ClassExports, HostObject};
use crate::Environment;

pub struct NSEventHostObject {
    characters: String,
    key_code: u16,
}
impl HostObject for NSEventHostObject {}

pub const CLASSES: ClassExports = objc_classes! {

(env, this, _cmd);

@implementation NSEvent: NSObject

- (String)characters {
    env.objc.borrow::<NSEventHostObject>(this).characters.clone()
}

- (u16)keyCode {
    env.objc.borrow::<NSEventHostObject>(this).key_code
}

@end

};

/// Create a key event, e.g. to pass to a `keyDown:` method.
pub fn new_key_event(env: &mut Environment, characters: &str, key_code: u16) -> id {
    let class = env.objc.get_known_class("NSEvent").unwrap_or_else(|| {
        panic!("NSEvent is a built-in class, it should always exist");
    });
    let host_object = Box::new(NSEventHostObject {
        characters: characters.to_string(),
        key_code,
    });
    env.objc.alloc_object(class, host_object)
}
