/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! swizzle_helper replaces method implementations of a class at runtime
//! ("swizzling") while keeping the replaced implementation callable, and
//! attaches arbitrary values to specific classes and objects.
//!
//! It comes with the small Objective-C-style runtime it operates on (see
//! [objc]): classes are objects with method tables, messages are looked up by
//! selector through the class hierarchy, and every method is a Rust function
//! ("host" code) declared with [objc::objc_classes].
//!
//! ```ignore
//! let mut env = Environment::new(Options::default());
//! let classes = env.objc.register_classes(CLASSES)?;
//! let draw = env.objc.register_selector("draw");
//! let draw_replacement = env.objc.register_selector("drawReplacement");
//! objc::replace_method(&mut env, classes[0], draw, draw_replacement)?;
//! ```

// Allow items in the crate to have non-snake-case names, e.g. the objc_classes
// macro names closures after Objective-C methods.
#![allow(non_snake_case)]
// rustdoc complains about some public macros that link to private items, but
// we're forced to make those macros public by the weird macro scoping rules,
// so this warning is unhelpful.
#![allow(rustdoc::private_intra_doc_links)]

#[macro_use]
mod log;
pub mod abi;
mod environment;
pub mod frameworks;
pub mod objc;
pub mod options;

pub use environment::Environment;
pub use options::Options;
