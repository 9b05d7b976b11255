//! Normalized mood parameters and the coercion rules that produce them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Upper bound of every slider.
pub const SLIDER_MAX: u8 = 100;

pub const MIN_BPM: u16 = 60;
pub const MAX_BPM: u16 = 220;

/// The request body as the dashboard sends it, before any coercion.
///
/// Every field is kept as a raw JSON value so that missing, null or
/// non-numeric inputs can be coerced instead of rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawMoodPayload {
    #[serde(default)]
    pub tempo: Value,
    #[serde(default, rename = "typ_value")]
    pub style: Value,
    #[serde(default, rename = "energi_value")]
    pub energy: Value,
    #[serde(default, rename = "trummor_value")]
    pub drums: Value,
    #[serde(default, rename = "bassPlus")]
    pub bass_boost: Value,
    #[serde(default, rename = "dist")]
    pub distortion: Value,
}

impl RawMoodPayload {
    /// Extracts the payload from a request body.
    ///
    /// The dashboard wraps the fields as `{"payload": {...}}`, older clients
    /// post them at the top level. Both are accepted; a body that is not an
    /// object yields an all-default payload.
    pub fn from_body(body: Value) -> Self {
        let inner = match body {
            Value::Object(mut map) => match map.remove("payload") {
                Some(payload) if !payload.is_null() => payload,
                _ => Value::Object(map),
            },
            other => other,
        };
        serde_json::from_value(inner).unwrap_or_else(|err| {
            debug!("Request body is not a mood object ({}), using defaults", err);
            RawMoodPayload::default()
        })
    }
}

/// The canonical, validated input to prompt generation and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ParameterSet {
    pub tempo: u8,
    pub style: u8,
    pub energy: u8,
    pub drums: u8,
    pub bass_boost: bool,
    pub distortion: bool,
}

impl ParameterSet {
    pub fn new(
        tempo: u8,
        style: u8,
        energy: u8,
        drums: u8,
        bass_boost: bool,
        distortion: bool,
    ) -> Self {
        Self {
            tempo: tempo.min(SLIDER_MAX),
            style: style.min(SLIDER_MAX),
            energy: energy.min(SLIDER_MAX),
            drums: drums.min(SLIDER_MAX),
            bass_boost,
            distortion,
        }
    }

    /// Normalizes a raw payload. Never fails: anything unusable becomes 0/false.
    pub fn from_raw(raw: &RawMoodPayload) -> Self {
        let params = Self {
            tempo: coerce_slider(&raw.tempo),
            style: coerce_slider(&raw.style),
            energy: coerce_slider(&raw.energy),
            drums: coerce_slider(&raw.drums),
            bass_boost: coerce_flag(&raw.bass_boost),
            distortion: coerce_flag(&raw.distortion),
        };

        let exact = [&raw.tempo, &raw.style, &raw.energy, &raw.drums]
            .iter()
            .zip([params.tempo, params.style, params.energy, params.drums])
            .all(|(value, coerced)| value.as_u64() == Some(coerced as u64));
        if !exact {
            debug!("Coerced mood payload {:?} into {:?}", raw, params);
        }

        params
    }

    /// Tempo slider mapped linearly onto `[MIN_BPM, MAX_BPM]`.
    pub fn bpm(&self) -> u16 {
        let span = (MAX_BPM - MIN_BPM) as f64;
        let bpm = (MIN_BPM as f64 + span * self.tempo as f64 / SLIDER_MAX as f64).round();
        (bpm as u16).clamp(MIN_BPM, MAX_BPM)
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Rounds and clamps a slider value into `[0, 100]`. Non-numeric input is 0.
pub fn coerce_slider(value: &Value) -> u8 {
    match numeric_value(value) {
        Some(v) if !v.is_nan() => v.round().clamp(0.0, SLIDER_MAX as f64) as u8,
        _ => 0,
    }
}

/// Truthiness of a toggle value.
pub fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
