/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The state every host method gets access to.
//!
//! Unlike its siblings, this module should be considered private and only used
//! via the re-exports one level up.

use crate::objc;
use crate::options::Options;

/// The struct containing the entire runtime state. A mutable reference to it
/// is passed to every host method implementation.
pub struct Environment {
    pub objc: objc::ObjC,
    pub options: Options,
}

impl Environment {
    /// Create a fresh runtime. The root class (`NSObject`) and the other
    /// built-in classes are registered immediately.
    pub fn new(options: Options) -> Environment {
        log_dbg!(
            "Creating runtime (log replacements: {}, warn on missing forward: {})",
            options.log_replacements,
            options.warn_on_missing_forward
        );
        Environment {
            objc: objc::ObjC::new(),
            options,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new(Options::default())
    }
}
