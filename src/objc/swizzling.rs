/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Replacing method implementations ("swizzling") while keeping the previous
//! implementation reachable.
//!
//! [replace_method] makes one selector of a class use the implementation of
//! another selector. It's up to the new implementation to forward to the old
//! one, using one of the `call_replaced_*` functions, e.g.:
//!
//! ```ignore
//! pub const CLASSES: ClassExports = objc_classes! {
//! (env, this, _cmd);
//! @implementation Widget: NSObject
//! - (())draw {
//!     // ...
//! }
//! - (())drawReplacement {
//!     log!("about to draw {:?}", this);
//!     // _cmd is "draw" here, since that is the message that was sent.
//!     call_replaced_method(env, this, _cmd);
//! }
//! @end
//! };
//!
//! let draw = env.objc.register_selector("draw");
//! let draw_replacement = env.objc.register_selector("drawReplacement");
//! replace_method(env, widget_class, draw, draw_replacement)?;
//! ```
//!
//! The replaced implementation is recorded in the class's
//! [associated values](super::associated), under the name of the selector.
//! If the class only inherits the method, a stub that calls the superclass's
//! implementation ([IMP::CallSuper]) is added to the class first, so that
//! there is always something to forward to.
//!
//! Replacing the same method several times forms a chain: forwarding from the
//! newest replacement reaches the one it replaced, forwarding from inside that
//! one reaches the one before it, and so on down to the original. To know
//! which link of the chain is currently running, the runtime keeps a stack of
//! forwarding calls in progress; each message send starts a new section of
//! that stack, so a message sent from inside a forwarded call begins again at
//! the newest replacement.
//!
//! None of this is synchronized. Methods should be replaced during
//! initialization, before the classes involved are in use.

use super::{id, nil, Class, ObjC, IMP, SEL};
use crate::abi::{Args, Callback, MethodArg, MethodRet, Value};
use crate::Environment;
use smallvec::smallvec;
use std::cell::RefCell;
use std::rc::Rc;

/// Errors from [replace_method]. These are mistakes in the code that sets up
/// the replacement, not runtime conditions, so retrying is pointless.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SwizzleError {
    #[error("{0:?} is not a class")]
    NotAClass(id),
    #[error("Replacing methods of root class \"{class}\" would affect every object - don't do that")]
    RootClass { class: String },
    #[error("Failed to get implementation for \"{selector}\" on class \"{class}\"")]
    MissingReplacement { class: String, selector: String },
}

/// The implementations a selector of a class has had before its current one,
/// oldest first.
#[derive(Debug, Clone, Default)]
struct ReplacedImplementations(Vec<IMP>);

/// A forwarding call in progress: the implementation at `depth` in the
/// [ReplacedImplementations] of `class`'s `sel` is running.
#[derive(Debug)]
pub(super) struct ForwardingFrame {
    class: Class,
    sel: SEL,
    depth: usize,
}

/// Stack of forwarding calls in progress. A `None` entry separates the frames
/// of each (possibly nested) message send.
pub(super) type ForwardingStack = Rc<RefCell<Vec<Option<ForwardingFrame>>>>;

/// Keeps an entry on the [ForwardingStack] for as long as it's alive. The
/// entry, and anything left above it, is removed on drop, so a call that
/// unwinds can't leave stale frames behind.
#[must_use]
pub(super) struct ForwardingScope {
    stack: ForwardingStack,
    len: usize,
}

impl Drop for ForwardingScope {
    fn drop(&mut self) {
        self.stack.borrow_mut().truncate(self.len);
    }
}

impl ObjC {
    /// Push `frame` (`None` for a message send) onto the forwarding stack
    /// until the returned scope is dropped.
    pub(super) fn enter_forwarding_scope(&self, frame: Option<ForwardingFrame>) -> ForwardingScope {
        let stack = self.forwarding_frames.clone();
        let len = {
            let mut frames = stack.borrow_mut();
            let len = frames.len();
            frames.push(frame);
            len
        };
        ForwardingScope { stack, len }
    }
}

/// Replace the implementation of `old_sel` on `class` with the implementation
/// of `new_sel`, remembering the previous implementation for forwarding.
///
/// The change affects `class` and any subclasses that don't override
/// `old_sel` themselves. If `old_sel` isn't implemented at all, it is simply
/// added with `new_sel`'s implementation, and there is nothing to forward to.
pub fn replace_method(
    env: &mut Environment,
    class: Class,
    old_sel: SEL,
    new_sel: SEL,
) -> Result<(), SwizzleError> {
    let objc = &mut env.objc;

    if !objc.is_class(class) {
        return Err(SwizzleError::NotAClass(class));
    }
    if objc.class_superclass(class) == nil {
        return Err(SwizzleError::RootClass {
            class: objc.get_class_name(class).to_string(),
        });
    }
    let Some(new_imp) = objc.class_get_instance_method(class, new_sel) else {
        return Err(SwizzleError::MissingReplacement {
            class: objc.get_class_name(class).to_string(),
            selector: new_sel.as_str(objc).to_string(),
        });
    };

    if env.options.log_replacements {
        log!(
            "Swizzling {}.{}",
            objc.get_class_name(class),
            old_sel.as_str(objc)
        );
    }

    if objc.class_get_direct_method(class, old_sel).is_none() {
        if objc.class_has_method(class, old_sel) {
            // The method is inherited. Replacing it directly would leave
            // nothing to forward to, so add a method that calls super first.
            log_dbg!(
                "Adding super-calling stub for {}.{}",
                objc.get_class_name(class),
                old_sel.as_str(objc)
            );
            objc.class_add_method(class, old_sel, IMP::CallSuper { class });
        } else {
            log_dbg!(
                "{}.{} is not implemented, adding it",
                objc.get_class_name(class),
                old_sel.as_str(objc)
            );
            objc.class_add_method(class, old_sel, new_imp);
            return Ok(());
        }
    }

    if let Some(old_imp) = objc.class_replace_method(class, old_sel, new_imp) {
        objc.record_replaced_implementation(class, old_sel, old_imp);
    }
    Ok(())
}

impl ObjC {
    fn replaced_implementations(&self, class: Class, sel: SEL) -> Vec<IMP> {
        if !self.is_class(class) {
            return Vec::new();
        }
        self.class_associated_value_as::<ReplacedImplementations>(class, sel.as_str(self))
            .map(|replaced| replaced.0.clone())
            .unwrap_or_default()
    }

    fn record_replaced_implementation(&mut self, class: Class, sel: SEL, imp: IMP) {
        let mut replaced = ReplacedImplementations(self.replaced_implementations(class, sel));
        replaced.0.push(imp);
        let key = sel.as_str(self).to_string();
        self.set_class_associated_value(class, &key, replaced);
    }
}

/// Get the previous implementation of `sel` on exactly `class`, or [None] if
/// it has never been replaced there (replacing it on a superclass or
/// subclass doesn't count).
///
/// Calling the result with [IMP::call] runs it outside of the chain: if it
/// forwards in turn, forwarding starts again from the newest replacement, so
/// it ends up calling itself. Use [call_implementation_for] to call it as a
/// link of the chain.
pub fn implementation_for(env: &Environment, class: Class, sel: SEL) -> Option<IMP> {
    env.objc.replaced_implementations(class, sel).pop()
}

/// Call the implementation [implementation_for] returns, with `this` as the
/// receiver. Forwarding from inside it continues with the implementation it
/// replaced, just as if it had been reached by [call_replaced_method_with_args].
/// Returns [None] if there is no previous implementation.
///
/// `class` should be the class of `this`, since forwarding looks at the
/// receiver's class.
pub fn call_implementation_for(
    env: &mut Environment,
    this: id,
    class: Class,
    sel: SEL,
    args: Args,
) -> Option<Value> {
    if this.is_null() {
        return None;
    }
    let replaced = env.objc.replaced_implementations(class, sel);
    let depth = replaced.len().checked_sub(1)?;
    Some(call_replaced_at(env, this, class, sel, depth, &replaced[depth], args))
}

fn call_replaced_at(
    env: &mut Environment,
    this: id,
    class: Class,
    sel: SEL,
    depth: usize,
    imp: &IMP,
    args: Args,
) -> Value {
    let _scope = env
        .objc
        .enter_forwarding_scope(Some(ForwardingFrame { class, sel, depth }));
    imp.call(env, this, sel, args)
}

/// Get every implementation that `sel` on exactly `class` has had before its
/// current one, oldest first.
pub fn replaced_implementations(env: &Environment, class: Class, sel: SEL) -> Vec<IMP> {
    env.objc.replaced_implementations(class, sel)
}

/// Call the previous implementation of `sel` for the class of `this`, if
/// there is one, with arbitrary arguments. Returns [None] if there is nothing
/// to forward to. All the other `call_replaced_*` functions use this.
pub fn call_replaced_method_with_args(
    env: &mut Environment,
    this: id,
    sel: SEL,
    args: Args,
) -> Option<Value> {
    if this.is_null() {
        return None;
    }
    let class = env.objc.object_get_class(this);
    let replaced = env.objc.replaced_implementations(class, sel);

    // If this is called from an implementation we forwarded to, continue
    // from that one, otherwise start from the newest replacement. Frames
    // before the most recent message send don't count.
    let depth = env
        .objc
        .forwarding_frames
        .borrow()
        .iter()
        .rev()
        .map_while(|frame| frame.as_ref())
        .find(|frame| frame.class == class && frame.sel == sel)
        .map_or(replaced.len(), |frame| frame.depth);

    let Some((depth, imp)) = depth
        .checked_sub(1)
        .and_then(|depth| Some((depth, replaced.get(depth)?)))
    else {
        if env.options.warn_on_missing_forward {
            log!(
                "Warning: {:?} (class \"{}\") has no previous implementation of \"{}\" to forward to",
                this,
                env.objc.get_class_name(class),
                sel.as_str(&env.objc)
            );
        }
        return None;
    };

    Some(call_replaced_at(env, this, class, sel, depth, imp, args))
}

/// Call the previous implementation of a method that takes no parameters, if
/// it exists.
pub fn call_replaced_method(env: &mut Environment, this: id, sel: SEL) {
    call_replaced_method_with_args(env, this, sel, Args::new());
}

/// Call the previous implementation of a method that takes no parameters and
/// returns an object, if it exists. Returns [nil] otherwise.
pub fn call_replaced_method_returning_object(env: &mut Environment, this: id, sel: SEL) -> id {
    call_replaced_method_with_args(env, this, sel, Args::new())
        .map_or(nil, <id as MethodRet>::from_value)
}

/// Call the previous implementation of a method that takes an object
/// parameter, if it exists.
pub fn call_replaced_object_method(env: &mut Environment, this: id, sel: SEL, object: id) {
    call_replaced_method_with_args(env, this, sel, smallvec![MethodArg::to_value(object)]);
}

/// Call the previous implementation of a method that takes an event (an
/// `NSEvent`), if it exists.
pub fn call_replaced_event_method(env: &mut Environment, this: id, sel: SEL, event: id) {
    call_replaced_object_method(env, this, sel, event)
}

/// Call the previous implementation of a method that takes a string
/// parameter, if it exists.
pub fn call_replaced_string_method(env: &mut Environment, this: id, sel: SEL, string: &str) {
    call_replaced_method_with_args(env, this, sel, smallvec![MethodArg::to_value(string)]);
}

/// Call the previous implementation of a method that takes a closure
/// parameter, if it exists.
pub fn call_replaced_closure_method(
    env: &mut Environment,
    this: id,
    sel: SEL,
    closure: Callback,
) {
    call_replaced_method_with_args(env, this, sel, smallvec![MethodArg::to_value(closure)]);
}

#[cfg(test)]
mod tests {
    use super::super::{msg, objc_classes, ClassExports, HostObject};
    use super::*;
    use crate::Options;

    struct Recorder {
        result: String,
        fail: bool,
    }
    impl HostObject for Recorder {}

    fn record(env: &mut Environment, this: id, text: &str) {
        env.objc.borrow_mut::<Recorder>(this).result.push_str(text);
    }

    const CLASSES: ClassExports = objc_classes! {
    (env, this, _cmd);

    @implementation Chained: NSObject
    - (())foo {
        record(env, this, "Original");
    }
    - (())first {
        record(env, this, "First");
        call_replaced_method(env, this, _cmd);
    }
    - (())second {
        record(env, this, "Second");
        call_replaced_method(env, this, _cmd);
    }
    - (())reentrant {
        record(env, this, "[");
        call_replaced_method(env, this, _cmd);
        record(env, this, "]");
    }
    - (())bar {
        record(env, this, "Bar");
    }
    - (())barThenFoo {
        record(env, this, "BarReplacement");
        let _: () = msg![env; this foo];
        call_replaced_method(env, this, _cmd);
    }
    - (())fragile {
        record(env, this, "Fragile");
        if env.objc.borrow::<Recorder>(this).fail {
            panic!("fragile method failed");
        }
    }
    - (())viaLookup {
        record(env, this, "Lookup");
        let class = env.objc.object_get_class(this);
        call_implementation_for(env, this, class, _cmd, Args::new());
    }
    - (i64)count {
        1
    }
    - (i64)countReplacement {
        let replaced = call_replaced_method_with_args(env, this, _cmd, Args::new());
        <i64 as MethodRet>::from_value(replaced.unwrap_or(Value::Int(0))) + 10
    }
    @end
    };

    fn setup(options: Options) -> (Environment, Class, id) {
        let mut env = Environment::new(options);
        let class = env.objc.register_classes(CLASSES).unwrap()[0];
        let object = env.objc.alloc_object(
            class,
            Box::new(Recorder {
                result: String::new(),
                fail: false,
            }),
        );
        (env, class, object)
    }

    fn replace(env: &mut Environment, class: Class, old: &str, new: &str) {
        let old = env.objc.register_selector(old);
        let new = env.objc.register_selector(new);
        replace_method(env, class, old, new).unwrap();
    }

    fn result(env: &mut Environment, object: id) -> String {
        std::mem::take(&mut env.objc.borrow_mut::<Recorder>(object).result)
    }

    #[test]
    fn test_chained_replacements_reach_the_original() {
        let (mut env, class, object) = setup(Options::default());
        replace(&mut env, class, "foo", "first");
        replace(&mut env, class, "foo", "second");

        let _: () = msg![&mut env; object foo];
        assert_eq!(result(&mut env, object), "SecondFirstOriginal");

        let foo = env.objc.register_selector("foo");
        let replaced = replaced_implementations(&env, class, foo);
        assert_eq!(replaced.len(), 2);
        let first = env.objc.register_selector("first");
        let first_imp = env.objc.class_get_direct_method(class, first).unwrap();
        assert!(implementation_for(&env, class, foo)
            .unwrap()
            .is_same(&first_imp));
    }

    #[test]
    fn test_implementation_for_called_as_chain_link() {
        let (mut env, class, object) = setup(Options::default());
        replace(&mut env, class, "foo", "first");
        replace(&mut env, class, "foo", "viaLookup");

        let _: () = msg![&mut env; object foo];
        assert_eq!(result(&mut env, object), "LookupFirstOriginal");

        let bar = env.objc.register_selector("bar");
        assert!(call_implementation_for(&mut env, object, class, bar, Args::new()).is_none());
        assert_eq!(result(&mut env, object), "");
    }

    #[test]
    fn test_unwinding_leaves_no_stale_frames() {
        let (mut env, class, object) = setup(Options::default());
        replace(&mut env, class, "fragile", "first");

        env.objc.borrow_mut::<Recorder>(object).fail = true;
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: () = msg![&mut env; object fragile];
        }));
        assert!(outcome.is_err());
        assert!(env.objc.forwarding_frames.borrow().is_empty());
        assert_eq!(result(&mut env, object), "FirstFragile");

        // Forwarding from outside any method starts at the newest
        // replacement again.
        env.objc.borrow_mut::<Recorder>(object).fail = false;
        let fragile = env.objc.register_selector("fragile");
        call_replaced_method(&mut env, object, fragile);
        assert_eq!(result(&mut env, object), "Fragile");
    }

    #[test]
    fn test_message_send_inside_forwarded_call_starts_again() {
        let (mut env, class, object) = setup(Options::default());
        replace(&mut env, class, "foo", "first");
        replace(&mut env, class, "bar", "barThenFoo");

        let _: () = msg![&mut env; object bar];
        assert_eq!(result(&mut env, object), "BarReplacementFirstOriginalBar");
    }

    #[test]
    fn test_forwarding_stops_when_chain_runs_out() {
        let (mut env, class, object) = setup(Options::default());
        // "reentrant" replaces a method that doesn't exist, so it is just
        // added and has nothing to forward to.
        replace(&mut env, class, "brandNew", "reentrant");
        let brand_new = env.objc.register_selector("brandNew");
        assert!(implementation_for(&env, class, brand_new).is_none());

        let _: () = msg![&mut env; object brandNew];
        assert_eq!(result(&mut env, object), "[]");
    }

    #[test]
    fn test_forwarded_return_value() {
        let (mut env, class, object) = setup(Options {
            warn_on_missing_forward: true,
            ..Options::default()
        });
        let n: i64 = msg![&mut env; object countReplacement];
        // Called directly, there's nothing to forward to.
        assert_eq!(n, 10);

        replace(&mut env, class, "count", "countReplacement");
        let n: i64 = msg![&mut env; object count];
        assert_eq!(n, 11);
    }

    #[test]
    fn test_root_class_is_rejected() {
        let (mut env, _class, _object) = setup(Options::default());
        let root = env.objc.root_class();
        let init = env.objc.register_selector("init");
        let class_sel = env.objc.register_selector("class");
        assert_eq!(
            replace_method(&mut env, root, init, class_sel),
            Err(SwizzleError::RootClass {
                class: "NSObject".to_string()
            })
        );
    }

    #[test]
    fn test_missing_replacement_is_rejected() {
        let (mut env, class, object) = setup(Options::default());
        let foo = env.objc.register_selector("foo");
        let nope = env.objc.register_selector("noSuchMethod");
        assert_eq!(
            replace_method(&mut env, class, foo, nope),
            Err(SwizzleError::MissingReplacement {
                class: "Chained".to_string(),
                selector: "noSuchMethod".to_string(),
            })
        );
        assert_eq!(
            replace_method(&mut env, object, foo, foo),
            Err(SwizzleError::NotAClass(object))
        );

        // Nothing changed.
        let _: () = msg![&mut env; object foo];
        assert_eq!(result(&mut env, object), "Original");
    }
}
