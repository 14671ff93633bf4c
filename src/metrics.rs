// Derived metrics and charger-type labels.
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const UNKNOWN_LABEL: &str = "Unknown";

/// Charger-type code (one decimal place) to display label.
static CHARGER_TYPE_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("6.0", "Level 1 AC (Slow Charger)"),
        ("7.0", "Level 2 AC (Fast Charger)"),
        ("8.0", "Level 2 AC (Fast Charger) - Variant"),
        ("10.0", "Level 3 DC (Rapid Charger)"),
        ("11.0", "Level 1 AC (Slow Charger) - Variant"),
        ("12.0", "Level 2 AC (Fast Charger) - Variant 2"),
        ("13.0", "Level 3 DC (Rapid Charger) - Variant"),
        ("14.0", "Level 3 DC (Ultra Fast)"),
        ("15.0", "Bharat AC-001"),
        ("16.0", "Bharat DC-001"),
        ("17.0", "CCS Type 2"),
        ("18.0", "CHAdeMO"),
        ("19.0", "Type 2 AC"),
        ("20.0", "GB/T AC"),
        ("21.0", "GB/T DC"),
        ("22.0", "Tesla Supercharger"),
        ("23.0", "Other AC Charger"),
        ("24.0", "Other DC Charger"),
    ])
});

/// `numerator / denominator`, or `None` when the denominator is absent or
/// not strictly positive. Never returns an infinite or NaN value.
pub fn ratio(numerator: f64, denominator: Option<f64>) -> Option<f64> {
    let d = denominator?;
    if d <= 0.0 || !d.is_finite() {
        return None;
    }
    Some(numerator / d).filter(|v| v.is_finite())
}

/// Label for a charger-type code. The code must match the map key exactly
/// (`"6.0"`, not `"6"`); anything else maps to [`UNKNOWN_LABEL`].
pub fn charger_type_label(code: Option<&str>) -> &'static str {
    code.and_then(|c| CHARGER_TYPE_LABELS.get(c).copied())
        .unwrap_or(UNKNOWN_LABEL)
}
