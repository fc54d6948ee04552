pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Treats blank strings as absent, trimming the rest.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
