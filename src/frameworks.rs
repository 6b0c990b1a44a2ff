/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Built-in classes.
//!
//! Each child module should be named after the framework the classes come
//! from. See also `objc/classes/class_lists.rs`.

pub mod app_kit;
pub mod foundation;
