/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Separate module just for the class lists, since this is the list that grows
//! whenever a framework gains a class.

use crate::frameworks::{app_kit, foundation};

/// All the lists of built-in classes, linked in this order when the runtime
/// is created. Superclasses must come before their subclasses.
pub const CLASS_LISTS: &[super::ClassExports] =
    &[foundation::ns_object::CLASSES, app_kit::ns_event::CLASSES];
