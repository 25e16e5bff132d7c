//! Parser for the platform option string.
//!
//! The host passes backend options as one comma-separated list of
//! `key=value` tokens (e.g. `"platform=CUDA,memtest=off,device-id=1"`).
//! Keys are case-insensitive and come from a fixed set; every key has a
//! documented default that is seeded before parsing, so a constructed table
//! is always fully populated.

use std::collections::HashMap;

use crate::backend::MemtestMode;
use crate::error::Error;

/// Option keys recognized in the option string.
pub mod keys {
    pub const PLATFORM: &str = "platform";
    pub const DEVICE_ID: &str = "device-id";
    pub const MEMTEST: &str = "memtest";
    pub const FORCE_DEVICE: &str = "force-device";
}

/// Name of the platform assumed when none is requested.
pub const DEFAULT_PLATFORM: &str = "CUDA";

/// Default memory-test duration token, in seconds.
pub const DEFAULT_MEMTEST: &str = "15";

/// Shortest accepted timed memory test, in seconds.
pub const MIN_MEMTEST_SECONDS: u32 = 15;

/// Validated key→value table of platform options.
///
/// Immutable after construction except for [`remove`](Self::remove);
/// [`get`](Self::get) returns `None` only for removed keys.
#[derive(Debug, Clone)]
pub struct PlatformOptions {
    values: HashMap<String, String>,
}

impl PlatformOptions {
    /// Parses an option string, seeding defaults first.
    ///
    /// Whitespace anywhere in the string is ignored. Any unknown key, or any
    /// value failing its key's validation rule, fails with the offending
    /// token in the message.
    pub fn parse(option_string: &str) -> Result<Self, Error> {
        let mut options = Self::with_defaults();

        let stripped: String = option_string
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        for token in stripped.split(',').filter(|t| !t.is_empty()) {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| Error::invalid_option(token, "expected key=value"))?;

            match key.to_ascii_lowercase().as_str() {
                // Existence is checked later against the platforms actually
                // enumerated, not here.
                keys::PLATFORM => options.set(keys::PLATFORM, value),
                keys::MEMTEST => {
                    if MemtestSetting::from_value(value).is_none() {
                        return Err(Error::invalid_option(
                            token,
                            format!(
                                "memtest must be \"full\", \"off\", or a duration of at least \
                                 {MIN_MEMTEST_SECONDS} seconds"
                            ),
                        ));
                    }
                    options.set(keys::MEMTEST, value);
                }
                keys::DEVICE_ID => {
                    if value.parse::<i64>().is_err() {
                        return Err(Error::invalid_option(token, "device-id must be an integer"));
                    }
                    options.set(keys::DEVICE_ID, value);
                }
                keys::FORCE_DEVICE => {
                    if !value.eq_ignore_ascii_case("yes") && !value.eq_ignore_ascii_case("no") {
                        return Err(Error::invalid_option(
                            token,
                            "force-device must be \"yes\" or \"no\"",
                        ));
                    }
                    options.set(keys::FORCE_DEVICE, value);
                }
                _ => {
                    return Err(Error::invalid_option(token, "unknown option"));
                }
            }
        }

        Ok(options)
    }

    fn with_defaults() -> Self {
        let mut options = Self {
            values: HashMap::new(),
        };
        options.set(keys::PLATFORM, DEFAULT_PLATFORM);
        options.set(keys::MEMTEST, DEFAULT_MEMTEST);
        options.set(keys::DEVICE_ID, "0");
        options.set(keys::FORCE_DEVICE, "no");
        options
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_ascii_lowercase(), value.to_string());
    }

    /// The current value of `key` (case-insensitive), or `None` after
    /// removal.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Removes `key` and its value; removing an absent key does nothing.
    pub fn remove(&mut self, key: &str) {
        self.values.remove(&key.to_ascii_lowercase());
    }

    /// The resolved memory-test setting.
    ///
    /// Infallible after [`parse`](Self::parse) unless `memtest` was removed,
    /// in which case the default applies.
    pub fn memtest(&self) -> MemtestSetting {
        self.get(keys::MEMTEST)
            .and_then(MemtestSetting::from_value)
            .unwrap_or(MemtestSetting::Run(MemtestMode::Timed(
                MIN_MEMTEST_SECONDS,
            )))
    }

    /// The selected device id.
    ///
    /// Infallible after [`parse`](Self::parse); a removed key falls back to
    /// device 0.
    pub fn device_id(&self) -> i64 {
        self.get(keys::DEVICE_ID)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Whether an unsupported device should be used anyway.
    pub fn force_device(&self) -> bool {
        self.get(keys::FORCE_DEVICE)
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"))
    }
}

/// Parsed form of the `memtest` option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemtestSetting {
    /// Skip the test entirely (with a warning about reduced safety).
    Off,
    Run(MemtestMode),
}

impl MemtestSetting {
    /// Parses a `memtest` value; `None` means the value is invalid.
    pub fn from_value(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("off") {
            return Some(Self::Off);
        }
        if value.eq_ignore_ascii_case("full") {
            return Some(Self::Run(MemtestMode::Full));
        }
        let seconds: u32 = value.parse().ok()?;
        if seconds < MIN_MEMTEST_SECONDS {
            return None;
        }
        Some(Self::Run(MemtestMode::Timed(seconds)))
    }
}
