//! Serde defaults and forgiving field parsers for the config file
//!
//! Hand-edited config files tend to carry values like `"0.05f"` or `"yes"`.
//! These helpers accept what they can and hand the rest to sanitisation
//! instead of rejecting the whole file.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

pub fn default_hover_threshold() -> f32 {
    1.0
}

pub fn default_fade_rate() -> f32 {
    0.05
}

pub fn default_passive_alpha() -> f32 {
    0.1
}

pub fn default_fit_margin() -> f32 {
    1.0
}

pub fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Text(String),
    Other(IgnoredAny),
}

/// Accept a number or numeric text (an optional trailing `f` is ignored).
///
/// Anything unparseable becomes NaN, which sanitisation replaces with the
/// field default.
pub fn lenient_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Lenient::<f32>::deserialize(deserializer)? {
        Lenient::Value(v) => v,
        Lenient::Text(text) => {
            let text = text.trim();
            let text = text.strip_suffix(['f', 'F']).unwrap_or(text);
            text.trim().parse().unwrap_or(f32::NAN)
        }
        Lenient::Other(_) => f32::NAN,
    })
}

/// Accept a boolean, `0`/`1`, or boolean-like text; anything else is `true`
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "false" | "0" | "no" | "off" => false,
            "true" | "1" | "yes" | "on" => true,
            _ => default_true(),
        },
        Flag::Other(_) => default_true(),
    })
}
