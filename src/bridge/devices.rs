//! The supported-hardware table for accelerated platforms.
//!
//! The list of device families validated for production runs ships embedded
//! in the library. A device outside the table can still be used with
//! `force-device=yes`, at the user's risk.

use std::sync::OnceLock;

use serde::Deserialize;

const SUPPORTED_DEVICES_TOML: &str = include_str!("../../resources/supported_devices.toml");

static SUPPORTED_DEVICES: OnceLock<SupportedDevices> = OnceLock::new();

#[derive(Debug, Clone, Deserialize)]
struct SupportedDevices {
    #[serde(default)]
    families: Vec<String>,
}

fn supported_devices() -> &'static SupportedDevices {
    SUPPORTED_DEVICES.get_or_init(|| {
        toml::from_str(SUPPORTED_DEVICES_TOML)
            .expect("Embedded supported-devices table failed to parse. This is a library bug.")
    })
}

/// Whether a driver-reported device name belongs to a validated family.
///
/// Matching is by case-insensitive substring, so a driver string like
/// `"GeForce GTX 480 (3GB)"` matches the `"GeForce GTX 480"` family.
pub fn is_supported_device(device_name: &str) -> bool {
    let name = device_name.to_ascii_lowercase();
    supported_devices()
        .families
        .iter()
        .any(|family| name.contains(&family.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_parses_and_is_nonempty() {
        assert!(!supported_devices().families.is_empty());
    }

    #[test]
    fn known_family_matches_with_driver_suffix() {
        assert!(is_supported_device("GeForce GTX 480"));
        assert!(is_supported_device("geforce gtx 480 (3GB variant)"));
        assert!(is_supported_device("Tesla C2050 / C2070"));
    }

    #[test]
    fn unknown_device_does_not_match() {
        assert!(!is_supported_device("Integrated Graphics 3000"));
        assert!(!is_supported_device(""));
    }
}
