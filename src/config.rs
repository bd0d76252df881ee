//! Startup configuration
//!
//! Nothing is persisted: the gesture style comes from the command line and
//! the running Windows version.

use tracing::warn;

use crate::platform;
use crate::remap::GestureStyle;

/// Command-line flag that forces the Alt+Shift gesture
pub const NO_POPUP_FLAG: &str = "nopopup";

/// First Windows major version with the Win+Space layout picker
const POPUP_MIN_MAJOR_VERSION: u32 = 10;

/// Remapper configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Gesture used to switch layouts
    pub gesture: GestureStyle,

    /// Major OS version reported at startup, if the probe succeeded
    pub os_major_version: Option<u32>,
}

impl Config {
    /// Load configuration from the process arguments and the OS version
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_parts(&args, platform::os_major_version())
    }

    /// Build configuration from arguments (without the program name)
    pub fn from_parts(args: &[String], os_major_version: Option<u32>) -> Self {
        let no_popup = args.first().is_some_and(|arg| arg == NO_POPUP_FLAG);

        for arg in args.iter().skip(usize::from(no_popup)) {
            warn!(%arg, "ignoring unrecognized argument");
        }

        let gesture = if no_popup {
            GestureStyle::CycleLayout
        } else if os_major_version.unwrap_or(0) >= POPUP_MIN_MAJOR_VERSION {
            GestureStyle::PopupPicker
        } else {
            GestureStyle::CycleLayout
        };

        Self {
            gesture,
            os_major_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_popup_on_windows_10() {
        let config = Config::from_parts(&[], Some(10));
        assert_eq!(config.gesture, GestureStyle::PopupPicker);
        assert_eq!(config.os_major_version, Some(10));
    }

    #[test]
    fn test_cycle_layout_on_older_windows() {
        assert_eq!(Config::from_parts(&[], Some(6)).gesture, GestureStyle::CycleLayout);
    }

    #[test]
    fn test_failed_probe_means_old_windows() {
        assert_eq!(Config::from_parts(&[], None).gesture, GestureStyle::CycleLayout);
    }

    #[test]
    fn test_nopopup_flag_wins() {
        let config = Config::from_parts(&args(&["nopopup"]), Some(11));
        assert_eq!(config.gesture, GestureStyle::CycleLayout);
    }

    #[test]
    fn test_other_arguments_ignored() {
        assert_eq!(
            Config::from_parts(&args(&["--popup"]), Some(10)).gesture,
            GestureStyle::PopupPicker
        );
        // Only the first argument is considered
        assert_eq!(
            Config::from_parts(&args(&["verbose", "nopopup"]), Some(10)).gesture,
            GestureStyle::PopupPicker
        );
        assert_eq!(
            Config::from_parts(&args(&["NOPOPUP"]), Some(10)).gesture,
            GestureStyle::PopupPicker
        );
    }
}
