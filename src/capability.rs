//! Device capability classification.
//!
//! The host decides whether it is running on a constrained device from the
//! viewport width, mirroring a `(max-width: 768px)` media query rather than
//! sniffing the user agent. Constrained devices get the static fallback and
//! never start a frame loop.

use serde::{Deserialize, Serialize};

/// Coarse device classification supplied by the host environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Full canvas engine.
    Desktop,
    /// Static fallback only.
    Mobile,
}

impl DeviceClass {
    /// Classify by viewport width: `width <= mobile_max_width` is mobile.
    pub fn classify(viewport_width: f32, mobile_max_width: f32) -> Self {
        if viewport_width <= mobile_max_width {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    /// From the result of a `matchMedia` query for the mobile breakpoint.
    pub fn from_media_match(matches: bool) -> Self {
        if matches {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        self == DeviceClass::Mobile
    }
}

/// When the device classification is evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityPolicy {
    /// Classify once at mount and keep that mode for the whole session.
    Once,
    /// Re-classify whenever the breakpoint is crossed, tearing down the old
    /// mode before building the new one.
    #[default]
    Reactive,
}

/// The media query string for a breakpoint, for hosts that have `matchMedia`.
pub fn media_query(mobile_max_width: f32) -> String {
    format!("(max-width: {}px)", mobile_max_width.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_at_breakpoint() {
        assert_eq!(DeviceClass::classify(768.0, 768.0), DeviceClass::Mobile);
        assert_eq!(DeviceClass::classify(768.5, 768.0), DeviceClass::Desktop);
        assert_eq!(DeviceClass::classify(375.0, 768.0), DeviceClass::Mobile);
    }

    #[test]
    fn test_media_query_text() {
        assert_eq!(media_query(768.0), "(max-width: 768px)");
    }

    #[test]
    fn test_policy_serde() {
        let once: CapabilityPolicy = serde_json::from_str("\"once\"").unwrap();
        assert_eq!(once, CapabilityPolicy::Once);
        assert_eq!(CapabilityPolicy::default(), CapabilityPolicy::Reactive);
    }
}
