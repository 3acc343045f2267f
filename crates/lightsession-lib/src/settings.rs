/*
User-tunable settings for conversation trimming.

Settings arrive as a loose JSON object (stored by the host, edited by hand,
or written by an older version). `LightSessionSettings::normalize` accepts
anything: wrongly typed fields fall back to their defaults and `keepLastN`
is rounded and clamped into [MIN_KEEP_LAST_N, MAX_KEEP_LAST_N]. The window
functions below are what callers feed into `graph::trim`, so no caller has
to keep its own copy of "current settings".
*/

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Storage key under which the host keeps the settings object.
pub const SETTINGS_KEY: &str = "lightsession_settings";

pub const MIN_KEEP_LAST_N: u32 = 1;
pub const MAX_KEEP_LAST_N: u32 = 100;
pub const DEFAULT_KEEP_LAST_N: u32 = 30;

/// Normalised settings. Serialises with the host's camelCase field names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightSessionSettings {
    /// Master switch. Default: true.
    pub enabled: bool,
    /// Number of trailing turns to keep, in 1..=100. Default: 30.
    pub keep_last_n: u32,
    /// Whether the host shows its on-page indicator. Default: true.
    pub show_indicator: bool,
    /// Whether the host applies its reduced-styling mode. Default: false.
    pub ultra_lean: bool,
}

impl Default for LightSessionSettings {
    fn default() -> Self {
        LightSessionSettings {
            enabled: true,
            keep_last_n: DEFAULT_KEEP_LAST_N,
            show_indicator: true,
            ultra_lean: false,
        }
    }
}

impl LightSessionSettings {
    /// Build settings from an arbitrary JSON value. Non-objects and
    /// wrongly-typed fields yield the defaults.
    pub fn normalize(input: &Value) -> Self {
        let defaults = Self::default();
        LightSessionSettings {
            enabled: read_bool(input, "enabled", defaults.enabled),
            keep_last_n: clamp_number(
                input.get("keepLastN"),
                MIN_KEEP_LAST_N,
                MAX_KEEP_LAST_N,
                defaults.keep_last_n,
            ),
            show_indicator: read_bool(input, "showIndicator", defaults.show_indicator),
            ultra_lean: read_bool(input, "ultraLean", defaults.ultra_lean),
        }
    }

    /// Parse and normalise settings from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::normalize(&value))
    }

    /// Load settings from a JSON file.
    ///
    /// The file may hold the settings object itself or a storage dump with the
    /// object under [`SETTINGS_KEY`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        let inner = value.get(SETTINGS_KEY).unwrap_or(&value);
        Ok(Self::normalize(inner))
    }

    /// Turns kept when rewriting a history response, or `None` when disabled.
    ///
    /// One turn more than `keep_last_n` so the turn being streamed next still
    /// leaves `keep_last_n` completed turns in view.
    pub fn fetch_window(&self) -> Option<usize> {
        self.enabled.then(|| self.keep_last_n as usize + 1)
    }

    /// Messages kept when trimming rendered elements, or `None` when disabled.
    pub fn dom_window(&self) -> Option<usize> {
        self.enabled.then_some(self.keep_last_n as usize)
    }
}

fn read_bool(input: &Value, key: &str, fallback: bool) -> bool {
    input.get(key).and_then(Value::as_bool).unwrap_or(fallback)
}

fn clamp_number(value: Option<&Value>, min: u32, max: u32, fallback: u32) -> u32 {
    match value.and_then(Value::as_f64) {
        Some(n) if n.is_finite() => n.round().clamp(min as f64, max as f64) as u32,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_for_missing_or_non_object_input() {
        assert_eq!(
            LightSessionSettings::normalize(&Value::Null),
            LightSessionSettings::default()
        );
        assert_eq!(
            LightSessionSettings::normalize(&json!("junk")),
            LightSessionSettings::default()
        );
        assert_eq!(
            LightSessionSettings::normalize(&json!({})),
            LightSessionSettings::default()
        );
    }

    #[test]
    fn keep_last_n_is_rounded_and_clamped() {
        let cases = [
            (json!(0), 1),
            (json!(-20), 1),
            (json!(4.4), 4),
            (json!(4.5), 5),
            (json!(100), 100),
            (json!(250), 100),
            (json!("12"), DEFAULT_KEEP_LAST_N),
            (json!(null), DEFAULT_KEEP_LAST_N),
        ];
        for (raw, expected) in cases {
            let settings = LightSessionSettings::normalize(&json!({ "keepLastN": raw.clone() }));
            assert_eq!(settings.keep_last_n, expected, "keepLastN = {raw}");
        }
    }

    #[test]
    fn wrongly_typed_flags_fall_back_individually() {
        let settings = LightSessionSettings::normalize(&json!({
            "enabled": "no",
            "showIndicator": false,
            "ultraLean": 1,
            "keepLastN": 8
        }));
        assert_eq!(
            settings,
            LightSessionSettings {
                enabled: true,
                keep_last_n: 8,
                show_indicator: false,
                ultra_lean: false,
            }
        );
    }

    #[test]
    fn windows_follow_enabled_flag() {
        let mut settings = LightSessionSettings::normalize(&json!({ "keepLastN": 4 }));
        assert_eq!(settings.fetch_window(), Some(5));
        assert_eq!(settings.dom_window(), Some(4));

        settings.enabled = false;
        assert_eq!(settings.fetch_window(), None);
        assert_eq!(settings.dom_window(), None);
    }

    #[test]
    fn serialises_with_camel_case_names() {
        let value = serde_json::to_value(LightSessionSettings::default()).unwrap();
        assert_eq!(
            value,
            json!({ "enabled": true, "keepLastN": 30, "showIndicator": true, "ultraLean": false })
        );
    }

    #[test]
    fn parse_errors_surface_from_json_text() {
        assert!(LightSessionSettings::from_json_str("{ not json").is_err());
        let settings = LightSessionSettings::from_json_str(r#"{"keepLastN": 2}"#).unwrap();
        assert_eq!(settings.keep_last_n, 2);
    }
}
