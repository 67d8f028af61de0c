//! SI prefix multipliers.
//!
//! Interconnect values live at the extremes of the SI range (kilo-ohm
//! segments, femtofarad loads, picosecond delays), so fixtures read much
//! better as `1.0 * KILO` or `50.0 * FEMTO`.

/// 10¹².
pub const TERA: f64 = 1.0e12;
/// 10⁹.
pub const GIGA: f64 = 1.0e9;
/// 10⁶.
pub const MEGA: f64 = 1.0e6;
/// 10³.
pub const KILO: f64 = 1.0e3;
/// 10⁻³.
pub const MILLI: f64 = 1.0e-3;
/// 10⁻⁶.
pub const MICRO: f64 = 1.0e-6;
/// 10⁻⁹.
pub const NANO: f64 = 1.0e-9;
/// 10⁻¹².
pub const PICO: f64 = 1.0e-12;
/// 10⁻¹⁵.
pub const FEMTO: f64 = 1.0e-15;

/// Parses a SPEF/SPICE-style value with an optional SI suffix (`1k`, `50f`,
/// `2.5MEG`). Suffixes are case-insensitive; `M` is milli and `MEG` is mega.
#[must_use]
pub fn parse_si(text: &str) -> Option<f64> {
    let text = text.trim().to_ascii_uppercase();
    if let Ok(v) = text.parse::<f64>() {
        return Some(v);
    }
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'E')))
        .unwrap_or(text.len());
    if split == 0 {
        return None;
    }
    let (number, suffix) = text.split_at(split);
    let value: f64 = number.parse().ok()?;
    let multiplier = match suffix {
        "T" => TERA,
        "G" => GIGA,
        "MEG" => MEGA,
        "K" => KILO,
        "M" => MILLI,
        "U" => MICRO,
        "N" => NANO,
        "P" => PICO,
        "F" => FEMTO,
        _ => return None,
    };
    Some(value * multiplier)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn parses_plain_and_suffixed_values() {
        assert_relative_eq!(parse_si("1.5").unwrap(), 1.5);
        assert_relative_eq!(parse_si("1k").unwrap(), 1.0e3);
        assert_relative_eq!(parse_si("50f").unwrap(), 50.0e-15, max_relative = 1e-12);
        assert_relative_eq!(parse_si("10MEG").unwrap(), 10.0e6);
        assert_relative_eq!(parse_si("10m").unwrap(), 10.0e-3);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_si(""), None);
        assert_eq!(parse_si("ohm"), None);
        assert_eq!(parse_si("1x"), None);
    }
}
