/// Fixed meters-to-miles factor used by the proxy.
pub const METERS_TO_MILES: f64 = 0.000621371;

/// Converts meters to miles, rounded half-up to one decimal place.
pub fn meters_to_miles(meters: f64) -> f64 {
    (meters * METERS_TO_MILES * 10.0).round() / 10.0
}

/// Renders a meter distance as `"<miles> mi"` with exactly one decimal.
pub fn format_miles(meters: f64) -> String {
    format!("{:.1} mi", meters_to_miles(meters))
}
