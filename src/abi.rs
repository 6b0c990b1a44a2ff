/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Traits for the calling convention used by method implementations.
//!
//! Every message send carries its arguments in a uniform frame of [Value]s, so
//! that the runtime (and in particular the forwarding machinery in
//! [crate::objc::swizzling]) can pass arguments through to another
//! implementation without knowing their types. Host methods are ordinary Rust
//! [function pointers][fn] with typed parameters; [CallFromHost] translates
//! between the two representations.

use crate::objc::{id, nil, SEL};
use crate::Environment;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Closure payload that can be passed as a method argument.
pub type Callback = Rc<dyn Fn(&dyn Any)>;

/// A single argument or return value in a message frame.
#[derive(Clone)]
pub enum Value {
    /// No value. This is what methods returning `()` produce, and what sending
    /// a message to [nil] produces.
    Void,
    Bool(bool),
    Int(i64),
    Double(f64),
    Object(id),
    Selector(SEL),
    String(Rc<str>),
    Callback(Callback),
}

impl Value {
    /// Short name of the kind of value, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Double(_) => "double",
            Value::Object(_) => "object",
            Value::Selector(_) => "selector",
            Value::String(_) => "string",
            Value::Callback(_) => "callback",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Double(d) => write!(f, "Double({})", d),
            Value::Object(o) => write!(f, "Object({:?})", o),
            Value::Selector(s) => write!(f, "Selector({:?})", s),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Callback(c) => write!(f, "Callback({:p})", Rc::as_ptr(c)),
        }
    }
}

/// Argument frame of a message send. The receiver and selector are passed
/// separately.
pub type Args = SmallVec<[Value; 4]>;

fn type_mismatch(expected: &str, got: &Value) -> ! {
    panic!("Expected {} value, got {} value {:?}", expected, got.kind(), got)
}

/// This trait represents a type that can be passed as a method argument.
pub trait MethodArg: Sized {
    fn from_value(value: Value) -> Self;
    fn to_value(self) -> Value;
}

/// This trait represents a type that can be returned from a method.
///
/// Unlike [MethodArg], converting [Value::Void] is permitted and produces the
/// type's zero value (e.g. [nil] or `false`), because that is what sending a
/// message to [nil] or forwarding to a missing implementation returns.
pub trait MethodRet: Sized {
    fn from_value(value: Value) -> Self;
    fn to_value(self) -> Value;
}

impl MethodArg for Value {
    fn from_value(value: Value) -> Self {
        value
    }
    fn to_value(self) -> Value {
        self
    }
}
impl MethodRet for Value {
    fn from_value(value: Value) -> Self {
        value
    }
    fn to_value(self) -> Value {
        self
    }
}

impl MethodRet for () {
    fn from_value(_value: Value) -> Self {}
    fn to_value(self) -> Value {
        Value::Void
    }
}

impl MethodArg for bool {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Bool(b) => b,
            other => type_mismatch("bool", &other),
        }
    }
    fn to_value(self) -> Value {
        Value::Bool(self)
    }
}

impl MethodArg for i64 {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Int(i) => i,
            other => type_mismatch("integer", &other),
        }
    }
    fn to_value(self) -> Value {
        Value::Int(self)
    }
}

impl MethodArg for f64 {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Double(d) => d,
            other => type_mismatch("double", &other),
        }
    }
    fn to_value(self) -> Value {
        Value::Double(self)
    }
}

impl MethodArg for id {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(o) => o,
            other => type_mismatch("object", &other),
        }
    }
    fn to_value(self) -> Value {
        Value::Object(self)
    }
}

impl MethodArg for SEL {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Selector(s) => s,
            other => type_mismatch("selector", &other),
        }
    }
    fn to_value(self) -> Value {
        Value::Selector(self)
    }
}

impl MethodArg for Rc<str> {
    fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => s,
            other => type_mismatch("string", &other),
        }
    }
    fn to_value(self) -> Value {
        Value::String(self)
    }
}

impl MethodArg for String {
    fn from_value(value: Value) -> Self {
        <Rc<str> as MethodArg>::from_value(value).to_string()
    }
    fn to_value(self) -> Value {
        Value::String(self.into())
    }
}

impl MethodArg for &str {
    // Strings are always owned by the frame, so this is only for passing.
    fn from_value(value: Value) -> Self {
        type_mismatch("borrowed string (unsupported as a parameter)", &value)
    }
    fn to_value(self) -> Value {
        Value::String(self.into())
    }
}

impl MethodArg for Callback {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Callback(c) => c,
            other => type_mismatch("callback", &other),
        }
    }
    fn to_value(self) -> Value {
        Value::Callback(self)
    }
}

macro_rules! impl_MethodArg_with {
    ($for:ty, $with:ty) => {
        impl MethodArg for $for {
            fn from_value(value: Value) -> Self {
                <$with as MethodArg>::from_value(value) as $for
            }
            fn to_value(self) -> Value {
                <$with as MethodArg>::to_value(self as $with)
            }
        }
    };
}

impl_MethodArg_with!(i32, i64);
impl_MethodArg_with!(u32, i64);
impl_MethodArg_with!(i16, i64);
impl_MethodArg_with!(u16, i64);
impl_MethodArg_with!(i8, i64);
impl_MethodArg_with!(u8, i64);
impl_MethodArg_with!(f32, f64);

macro_rules! impl_MethodRet_via_MethodArg {
    ($for:ty, $zero:expr) => {
        impl MethodRet for $for {
            fn from_value(value: Value) -> Self {
                match value {
                    Value::Void => $zero,
                    value => <$for as MethodArg>::from_value(value),
                }
            }
            fn to_value(self) -> Value {
                <$for as MethodArg>::to_value(self)
            }
        }
    };
}

impl_MethodRet_via_MethodArg!(bool, false);
impl_MethodRet_via_MethodArg!(i64, 0);
impl_MethodRet_via_MethodArg!(i32, 0);
impl_MethodRet_via_MethodArg!(u32, 0);
impl_MethodRet_via_MethodArg!(i16, 0);
impl_MethodRet_via_MethodArg!(u16, 0);
impl_MethodRet_via_MethodArg!(i8, 0);
impl_MethodRet_via_MethodArg!(u8, 0);
impl_MethodRet_via_MethodArg!(f64, 0.0);
impl_MethodRet_via_MethodArg!(f32, 0.0);
impl_MethodRet_via_MethodArg!(id, nil);
impl_MethodRet_via_MethodArg!(String, String::new());
impl_MethodRet_via_MethodArg!(Rc<str>, Rc::from(""));

/// This trait represents a host function that can be called by the runtime
/// with a uniform argument frame.
///
/// The implementation
/// * checks the frame has the right number of arguments;
/// * converts each argument to its parameter type with [MethodArg];
/// * executes the actual implementation of the method; and
/// * converts the return value, if any, back with [MethodRet].
///
/// This module provides generic implementations of this trait for Rust
/// [function pointers][fn] with compatible argument and return types. Only
/// unusual cases should need to provide their own implementation.
pub trait CallFromHost {
    fn call_from_host(&self, env: &mut Environment, this: id, _cmd: SEL, args: Args) -> Value;
}

macro_rules! impl_CallFromHost {
    ( $($p:tt => $P:ident),* ) => {
        impl<R, $($P),*> CallFromHost for fn(&mut Environment, id, SEL, $($P),*) -> R
            where R: MethodRet, $($P: MethodArg,)* {
            // ignore warnings for the zero-argument case
            #[allow(unused_variables, unused_mut, clippy::unused_unit)]
            fn call_from_host(
                &self,
                env: &mut Environment,
                this: id,
                _cmd: SEL,
                args: Args,
            ) -> Value {
                let params: &[&str] = &[$(stringify!($P)),*];
                assert!(
                    args.len() == params.len(),
                    "Method {:?} takes {} argument(s), but {} were passed: {:?}",
                    _cmd,
                    params.len(),
                    args.len(),
                    args,
                );
                log_dbg!("CallFromHost {:?} {:?}", _cmd, args);
                let mut frame = args.into_iter();
                let args: ($($P,)*) = (
                    $(<$P as MethodArg>::from_value(frame.next().unwrap_or(Value::Void)),)*
                );
                let retval = self(env, this, _cmd, $(args.$p),*);
                <R as MethodRet>::to_value(retval)
            }
        }
    }
}

impl_CallFromHost!();
impl_CallFromHost!(0 => P0);
impl_CallFromHost!(0 => P0, 1 => P1);
impl_CallFromHost!(0 => P0, 1 => P1, 2 => P2);
impl_CallFromHost!(0 => P0, 1 => P1, 2 => P2, 3 => P3);
