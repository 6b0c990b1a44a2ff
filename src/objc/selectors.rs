/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Handling of Objective-C selectors.
//!
//! These are the names used to look up method implementations in Objective-C.
//! They are meant to be treated as opaque values. Selector strings are interned
//! so that comparing two selectors is an integer comparison.
//!
//! Resources:
//! - Apple's [The Objective-C Programming Language](https://developer.apple.com/library/archive/documentation/Cocoa/Conceptual/ObjectiveC/Chapters/ocSelectors.html)

use super::ObjC;

/// Opaque type used for selectors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
#[allow(clippy::upper_case_acronyms)] // silly clippit, this isn't an acronym!
pub struct SEL(u32);

impl SEL {
    pub fn as_str(self, objc: &ObjC) -> &str {
        &objc.selector_names[self.0 as usize]
    }
}

/// Macro for creating a selector name string from a method name in the
/// Objective-C syntax. Unfortunately the type of the first parameter must be
/// provided, so that parameterless and single-parameter names can be told
/// apart.
///
/// ```ignore
/// assert_eq!(selector!(foo), "foo");
/// assert_eq!(selector!((id); setValue), "setValue:");
/// assert_eq!(selector!((id); insertObject, atIndex), "insertObject:atIndex:");
/// ```
#[macro_export]
macro_rules! selector {
    ($name:ident) => { stringify!($name) };
    (($type1:ty); $name1:ident $(, $namen:ident)*) => {
        concat!(stringify!($name1), ":", $(stringify!($namen), ":"),*)
    };
}
pub use crate::selector; // #[macro_export] is weird...

impl ObjC {
    /// Get the selector for a name, creating it if it doesn't exist yet.
    pub fn register_selector(&mut self, name: &str) -> SEL {
        if let Some(&sel) = self.selectors.get(name) {
            return sel;
        }
        let sel = SEL(self.selector_names.len() as u32);
        self.selector_names.push(name.to_string());
        self.selectors.insert(name.to_string(), sel);
        sel
    }

    /// Get the selector for a name, if it has ever been registered.
    pub fn lookup_selector(&self, name: &str) -> Option<SEL> {
        self.selectors.get(name).copied()
    }
}
