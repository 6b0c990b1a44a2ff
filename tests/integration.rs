/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use std::any::Any;
use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use swizzle_helper::abi::{Args, Callback};
use swizzle_helper::frameworks::app_kit::ns_event::new_key_event;
use swizzle_helper::objc::{
    call_implementation_for, call_replaced_closure_method, call_replaced_event_method,
    call_replaced_method, call_replaced_method_returning_object, call_replaced_object_method,
    call_replaced_string_method, id, implementation_for, msg, nil, objc_classes, replace_method,
    replaced_implementations, Class, ClassExports, HostObject, SwizzleError, TrivialHostObject,
};
use swizzle_helper::{Environment, Options};

/// Host object that collects what the methods called on it did.
struct Recorder {
    output: String,
}
impl HostObject for Recorder {}

fn emit(env: &mut Environment, this: id, text: &str) {
    env.objc.borrow_mut::<Recorder>(this).output.push_str(text);
}

const CLASSES: ClassExports = objc_classes! {
(env, this, _cmd);

@implementation Swizzled: NSObject
- (())foo {
    emit(env, this, "Unswizzled");
}
- (())fooReplacement {
    emit(env, this, "Swizzled");
}
- (())fooForwarding {
    emit(env, this, "Swizzled");
    call_replaced_method(env, this, _cmd);
}
- (())fooForwardingAgain {
    emit(env, this, "SwizzledAgain");
    call_replaced_method(env, this, _cmd);
}
- (())fooViaLookup {
    emit(env, this, "SwizzledByLookup");
    let class = env.objc.object_get_class(this);
    call_implementation_for(env, this, class, _cmd, Args::new());
}
@end

@implementation Base: NSObject
- (())foo {
    emit(env, this, "Unswizzled");
}
- (())fooBase {
    emit(env, this, "Ya");
    call_replaced_method(env, this, _cmd);
}
@end

@implementation Derived: Base
- (())fooDerived {
    emit(env, this, "Yb");
    call_replaced_method(env, this, _cmd);
}
@end

@implementation Grandparent: NSObject
- (())bar {
    emit(env, this, "Unswizzled");
}
@end

@implementation Parent: Grandparent
@end

@implementation Child: Parent
- (())barReplacement {
    emit(env, this, "Swizzled");
    call_replaced_method(env, this, _cmd);
}
@end

@implementation Forwarding: NSObject
- (())greet:(String)name {
    emit(env, this, &format!("Hello {}", name));
}
- (())greetReplacement:(String)name {
    emit(env, this, "Hi! ");
    call_replaced_string_method(env, this, _cmd, &name);
}
- (())keyDown:(id)event {
    let characters: String = msg![env; event characters];
    emit(env, this, &format!("key {}", characters));
}
- (())keyDownReplacement:(id)event {
    emit(env, this, "intercepted ");
    call_replaced_event_method(env, this, _cmd, event);
}
- (())run:(Callback)callback {
    let payload: &dyn Any = &"payload";
    callback(payload);
}
- (())runReplacement:(Callback)callback {
    emit(env, this, "before ");
    call_replaced_closure_method(env, this, _cmd, callback);
}
@end

@implementation Stored: NSObject
- (id)contentsReplacement {
    emit(env, this, "get ");
    call_replaced_method_returning_object(env, this, _cmd)
}
- (())setContentsReplacement:(id)contents {
    emit(env, this, "set ");
    call_replaced_object_method(env, this, _cmd, contents);
}
@end
};

struct Fixture {
    env: Environment,
}

impl Fixture {
    fn new() -> Fixture {
        let options = Options {
            log_replacements: true,
            ..Options::default()
        };
        let mut env = Environment::new(options);
        env.objc.register_classes(CLASSES).unwrap();
        Fixture { env }
    }

    fn class(&self, name: &str) -> Class {
        self.env.objc.get_known_class(name).unwrap()
    }

    fn new_object(&mut self, class_name: &str) -> id {
        let class = self.class(class_name);
        self.env.objc.alloc_object(
            class,
            Box::new(Recorder {
                output: String::new(),
            }),
        )
    }

    fn replace(&mut self, class_name: &str, old: &str, new: &str) -> Result<(), SwizzleError> {
        let class = self.class(class_name);
        let old = self.env.objc.register_selector(old);
        let new = self.env.objc.register_selector(new);
        replace_method(&mut self.env, class, old, new)
    }

    fn output(&mut self, object: id) -> String {
        std::mem::take(&mut self.env.objc.borrow_mut::<Recorder>(object).output)
    }
}

#[test]
fn replaced_method_is_called() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::new();
    let object = fixture.new_object("Swizzled");
    fixture.replace("Swizzled", "foo", "fooReplacement")?;

    let _: () = msg![&mut fixture.env; object foo];
    assert_eq!(fixture.output(object), "Swizzled");
    Ok(())
}

#[test]
fn replacement_forwards_to_original() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::new();
    let object = fixture.new_object("Swizzled");
    fixture.replace("Swizzled", "foo", "fooForwarding")?;

    let _: () = msg![&mut fixture.env; object foo];
    assert_eq!(fixture.output(object), "SwizzledUnswizzled");

    // The replacement itself is unaffected.
    let _: () = msg![&mut fixture.env; object fooReplacement];
    assert_eq!(fixture.output(object), "Swizzled");
    Ok(())
}

#[test]
fn replacement_of_inherited_method_forwards_to_ancestor() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::new();
    let child = fixture.new_object("Child");
    let parent = fixture.new_object("Parent");
    fixture.replace("Child", "bar", "barReplacement")?;

    let _: () = msg![&mut fixture.env; child bar];
    assert_eq!(fixture.output(child), "SwizzledUnswizzled");

    // Only the target class and its subclasses are affected.
    let _: () = msg![&mut fixture.env; parent bar];
    assert_eq!(fixture.output(parent), "Unswizzled");

    let bar = fixture.env.objc.register_selector("bar");
    let child_class = fixture.class("Child");
    let parent_class = fixture.class("Parent");
    assert!(implementation_for(&fixture.env, child_class, bar).is_some());
    assert!(implementation_for(&fixture.env, parent_class, bar).is_none());
    Ok(())
}

#[test]
fn chained_replacements() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::new();
    let object = fixture.new_object("Swizzled");
    fixture.replace("Swizzled", "foo", "fooForwarding")?;
    fixture.replace("Swizzled", "foo", "fooForwardingAgain")?;

    let _: () = msg![&mut fixture.env; object foo];
    assert_eq!(fixture.output(object), "SwizzledAgainSwizzledUnswizzled");

    // Later calls start from the newest replacement again.
    let _: () = msg![&mut fixture.env; object foo];
    assert_eq!(fixture.output(object), "SwizzledAgainSwizzledUnswizzled");

    let foo = fixture.env.objc.register_selector("foo");
    let class = fixture.class("Swizzled");
    assert_eq!(replaced_implementations(&fixture.env, class, foo).len(), 2);
    Ok(())
}

#[test]
fn previous_implementation_called_through_lookup_runs_once() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::new();
    let object = fixture.new_object("Swizzled");
    fixture.replace("Swizzled", "foo", "fooForwarding")?;
    fixture.replace("Swizzled", "foo", "fooViaLookup")?;

    let _: () = msg![&mut fixture.env; object foo];
    assert_eq!(fixture.output(object), "SwizzledByLookupSwizzledUnswizzled");
    Ok(())
}

#[test]
fn forwarding_uses_the_receivers_exact_class() -> Result<(), Box<dyn Error>> {
    // Only the superclass is swizzled: an instance of the subclass runs the
    // replacement, which has nothing to forward to for the subclass.
    let mut fixture = Fixture::new();
    let derived = fixture.new_object("Derived");
    let base = fixture.new_object("Base");
    fixture.replace("Base", "foo", "fooBase")?;

    let _: () = msg![&mut fixture.env; derived foo];
    assert_eq!(fixture.output(derived), "Ya");
    let _: () = msg![&mut fixture.env; base foo];
    assert_eq!(fixture.output(base), "YaUnswizzled");

    // Both swizzled: the subclass forwards to the superclass's current
    // implementation, which again finds nothing for the subclass, and stops.
    let mut fixture = Fixture::new();
    let derived = fixture.new_object("Derived");
    fixture.replace("Base", "foo", "fooBase")?;
    fixture.replace("Derived", "foo", "fooDerived")?;

    let _: () = msg![&mut fixture.env; derived foo];
    assert_eq!(fixture.output(derived), "YbYa");
    Ok(())
}

#[test]
fn root_class_cannot_be_swizzled() {
    let mut fixture = Fixture::new();
    let object = fixture.new_object("Swizzled");
    let result = fixture.replace("NSObject", "init", "class");
    assert_eq!(
        result,
        Err(SwizzleError::RootClass {
            class: "NSObject".to_string()
        })
    );

    // init still works normally.
    let same: id = msg![&mut fixture.env; object init];
    assert_eq!(same, object);
}

#[test]
fn missing_replacement_is_an_error() {
    let mut fixture = Fixture::new();
    let error = fixture
        .replace("Swizzled", "foo", "doesNotExist")
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "Failed to get implementation for \"doesNotExist\" on class \"Swizzled\""
    );
}

#[test]
fn property_accessors_forward() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::new();
    let class = fixture.class("Stored");
    fixture.env.objc.class_add_property(class, "contents");
    fixture.replace("Stored", "contents", "contentsReplacement")?;
    fixture.replace("Stored", "setContents:", "setContentsReplacement:")?;

    let object = fixture.new_object("Stored");
    let value = fixture
        .env
        .objc
        .alloc_object(class, Box::new(TrivialHostObject));

    let unset: id = msg![&mut fixture.env; object contents];
    assert_eq!(unset, nil);
    let _: () = msg![&mut fixture.env; object setContents:value];
    let contents: id = msg![&mut fixture.env; object contents];
    assert_eq!(contents, value);
    assert_eq!(fixture.output(object), "get set get ");
    Ok(())
}

#[test]
fn argument_forwarding_variants() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::new();
    let object = fixture.new_object("Forwarding");
    fixture.replace("Forwarding", "greet:", "greetReplacement:")?;
    fixture.replace("Forwarding", "keyDown:", "keyDownReplacement:")?;
    fixture.replace("Forwarding", "run:", "runReplacement:")?;

    let name = "world";
    let _: () = msg![&mut fixture.env; object greet:name];
    assert_eq!(fixture.output(object), "Hi! Hello world");

    let event = new_key_event(&mut fixture.env, "q", 12);
    let _: () = msg![&mut fixture.env; object keyDown:event];
    assert_eq!(fixture.output(object), "intercepted key q");

    let received = Rc::new(RefCell::new(None));
    let callback: Callback = {
        let received = received.clone();
        Rc::new(move |payload: &dyn Any| {
            *received.borrow_mut() = payload.downcast_ref::<&str>().map(|s| s.to_string());
        })
    };
    let _: () = msg![&mut fixture.env; object run:callback];
    assert_eq!(fixture.output(object), "before ");
    assert_eq!(received.borrow().as_deref(), Some("payload"));
    Ok(())
}

#[test]
fn forwarding_without_previous_implementation_does_nothing() {
    let mut fixture = Fixture::new();
    let object = fixture.new_object("Swizzled");
    // Never replaced, so there's nothing to forward to.
    let _: () = msg![&mut fixture.env; object fooForwarding];
    assert_eq!(fixture.output(object), "Swizzled");

    let contents = fixture.env.objc.register_selector("contents");
    let result = call_replaced_method_returning_object(&mut fixture.env, object, contents);
    assert_eq!(result, nil);
}

#[test]
fn associated_values_are_isolated_by_identity() {
    let mut fixture = Fixture::new();
    let grandparent = fixture.class("Grandparent");
    let parent = fixture.class("Parent");
    let a = fixture.new_object("Parent");
    let b = fixture.new_object("Parent");
    let objc = &mut fixture.env.objc;

    objc.set_object_associated_value(a, "key", 1i32);
    assert!(objc.object_associated_value(b, "key").is_none());

    objc.set_class_associated_value(grandparent, "key", 2i32);
    assert!(objc.class_associated_value(parent, "key").is_none());
    objc.set_class_associated_value(parent, "key", 3i32);
    assert_eq!(
        objc.class_associated_value_as::<i32>(grandparent, "key").as_deref(),
        Some(&2)
    );

    // Instance and class tables never mix.
    assert_eq!(
        objc.object_associated_value_as::<i32>(a, "key").as_deref(),
        Some(&1)
    );
    assert_eq!(
        objc.class_associated_value_as::<i32>(parent, "key").as_deref(),
        Some(&3)
    );
    assert!(objc.object_associated_value(b, "key").is_none());
}

#[test]
fn classes_with_the_same_name_are_swizzled_separately() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::new();
    let first = fixture.class("Swizzled");
    let second = fixture.env.objc.register_classes(CLASSES)?[0];
    assert_ne!(first, second);

    // get_known_class now finds the second one.
    fixture.replace("Swizzled", "foo", "fooReplacement")?;

    let old = fixture
        .env
        .objc
        .alloc_object(first, Box::new(Recorder { output: String::new() }));
    let _: () = msg![&mut fixture.env; old foo];
    assert_eq!(fixture.output(old), "Unswizzled");

    let new = fixture.new_object("Swizzled");
    let _: () = msg![&mut fixture.env; new foo];
    assert_eq!(fixture.output(new), "Swizzled");
    Ok(())
}

#[test]
fn options_from_arguments() {
    let mut options = Options::default();
    options
        .parse_arguments(
            ["--no-log-replacements", "--warn-on-missing-forward"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
    assert!(!options.log_replacements);
    assert!(options.warn_on_missing_forward);
    assert!(options.parse_arguments(["--bogus".to_string()].into_iter()).is_err());
}
