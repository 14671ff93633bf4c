// Utility helpers for parsing and console formatting.
//
// All of the "dirty" CSV number handling lives here so the rest of the
// pipeline can work with typed `Option<f64>` values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like cell into `f64`, forgiving the formatting noise that
/// shows up in public CSV exports.
///
/// - Accepts `Option<&str>` so callers can pass optional fields straight through.
/// - Trims whitespace and strips thousands separators (`","`).
/// - Accepts scientific notation (`1e5`) but never `nan`/`inf`.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `en` thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // beyond u64 there is nothing sensible to group; keep the plain digits
    let mut res = match int_part.parse::<u64>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Optional metric for console tables; undefined values render as `-`.
pub fn format_metric(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
