/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Handling of Objective-C messaging (`objc_msgSend` and friends).
//!
//! Resources:
//! - Apple's [Objective-C Runtime Programming Guide](https://developer.apple.com/library/archive/documentation/Cocoa/Conceptual/ObjCRuntimeGuide/Articles/ocrtHowMessagingWorks.html)
//! - [Apple's documentation of `objc_msgSend`](https://developer.apple.com/documentation/objectivec/1456712-objc_msgsend)

use super::{id, nil, SEL};
use crate::abi::{Args, MethodRet, Value};
use crate::Environment;

/// Send a message: look up the implementation of `selector` for the class of
/// `receiver`, starting with its exact class and working up through the
/// superclasses, and call it.
///
/// Sending a message to [nil] does nothing and returns the zero value of the
/// return type. Sending a message the receiver doesn't respond to is a bug in
/// the host code and panics.
pub fn msg_send<R: MethodRet>(env: &mut Environment, receiver: id, selector: SEL, args: Args) -> R {
    R::from_value(send_message(env, receiver, selector, args))
}

pub(super) fn send_message(
    env: &mut Environment,
    receiver: id,
    selector: SEL,
    args: Args,
) -> Value {
    if receiver.is_null() {
        log_dbg!(
            "[nil {}] ignored",
            selector.as_str(&env.objc),
        );
        return Value::Void;
    }

    let class = env.objc.read_isa(receiver);
    if class == nil {
        panic!(
            "Class {:?} (\"{}\") was sent \"{}\", but class methods are not supported!",
            receiver,
            env.objc.get_class_name(receiver),
            selector.as_str(&env.objc),
        );
    }

    let Some(imp) = env.objc.class_get_instance_method(class, selector) else {
        panic!(
            "Object {:?} (class \"{}\", {:?}) does not respond to selector \"{}\"!",
            receiver,
            env.objc.get_class_name(class),
            class,
            selector.as_str(&env.objc),
        );
    };

    log_dbg!(
        "[{:?} {}] {:?} => {:?}",
        receiver,
        selector.as_str(&env.objc),
        args,
        imp
    );

    // Forwarding calls made by this implementation belong to this message
    // send, not to whichever one is in progress further up the stack.
    let _scope = env.objc.enter_forwarding_scope(None);
    imp.call(env, receiver, selector, args)
}

/// Macro for sending a message which imitates the Objective-C messaging syntax.
/// See [msg_send].
///
/// ```ignore
/// let _: () = msg![env; foo setBar:bar];
/// let qux: u32 = msg![env; foo qux];
/// let sum: i32 = msg![env; calculator addA:1 b:2];
/// ```
///
/// Note that argument values that aren't a single token (literal or
/// identifier) must be bracketed, e.g. `msg![env; foo setBar:(bar + 1)]`.
/// The return type must be known, so a message that returns nothing needs an
/// explicit `()`.
#[macro_export]
macro_rules! msg {
    [$env:expr; $receiver:tt $name:ident] => {
        {
            let receiver: $crate::objc::id = $receiver;
            let sel = $env.objc.register_selector(stringify!($name));
            $crate::objc::msg_send($env, receiver, sel, $crate::abi::Args::new())
        }
    };
    [$env:expr; $receiver:tt $($namen:ident:$argn:tt)+] => {
        {
            let receiver: $crate::objc::id = $receiver;
            let mut args = $crate::abi::Args::new();
            $(args.push($crate::abi::MethodArg::to_value($argn));)+
            let sel = $env.objc.register_selector(concat!($(stringify!($namen), ":"),+));
            $crate::objc::msg_send($env, receiver, sel, args)
        }
    };
}
pub use crate::msg; // #[macro_export] is weird...
