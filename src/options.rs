/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Parsing and management of user-configurable options.

pub const DOCUMENTATION: &str = "\
Diagnostic options:
    --log-replacements
    --no-log-replacements
        Enables or disables printing a line for every method replacement,
        e.g. \"Swizzling Widget.draw\".

        The default is to log replacements in debug builds only.

    --warn-on-missing-forward
        Print a warning when a replacement method forwards to the previous
        implementation but there is none. This is not an error: forwarding
        silently does nothing in that case, but it can point at a replacement
        that was installed on the wrong class.
";

/// Struct containing all user-configurable options.
#[derive(Debug, Clone)]
pub struct Options {
    pub log_replacements: bool,
    pub warn_on_missing_forward: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            log_replacements: cfg!(debug_assertions),
            warn_on_missing_forward: false,
        }
    }
}

impl Options {
    /// Parse the command-line argument syntax for an option. Returns `Ok(true)`
    /// if the option was valid and has been applied, and `Ok(false)` if the
    /// option was not recognized.
    pub fn parse_argument(&mut self, arg: &str) -> Result<bool, String> {
        if arg == "--log-replacements" {
            self.log_replacements = true;
        } else if arg == "--no-log-replacements" {
            self.log_replacements = false;
        } else if arg == "--warn-on-missing-forward" {
            self.warn_on_missing_forward = true;
        } else if let Some(value) = arg.strip_prefix("--warn-on-missing-forward=") {
            self.warn_on_missing_forward = value
                .parse()
                .map_err(|_| "Value for --warn-on-missing-forward must be true or false".to_string())?;
        } else {
            return Ok(false);
        };
        Ok(true)
    }

    /// Apply every argument, failing on the first one that is invalid or not
    /// recognized.
    pub fn parse_arguments<T: Iterator<Item = String>>(&mut self, args: T) -> Result<(), String> {
        for arg in args {
            if !self.parse_argument(&arg)? {
                return Err(format!("Unrecognized option: {:?}", arg));
            }
        }
        Ok(())
    }
}
