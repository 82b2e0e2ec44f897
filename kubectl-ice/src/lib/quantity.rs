//! Kubernetes resource quantities: parsing into base units and formatting back
//! for display.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// A value moves up to the next memory unit once it is larger than this
/// in the current unit, so `950Mi` is shown as `0.93Gi`.
pub const UNIT_ROLLOVER: f64 = 900.0;

const MEMORY_UNITS: [&str; 7] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

const BINARY_SUFFIXES: [(&str, f64); 6] = [
    ("Ei", 1_152_921_504_606_846_976.0),
    ("Pi", 1_125_899_906_842_624.0),
    ("Ti", 1_099_511_627_776.0),
    ("Gi", 1_073_741_824.0),
    ("Mi", 1_048_576.0),
    ("Ki", 1_024.0),
];

const DECIMAL_SUFFIXES: [(&str, f64); 7] = [
    ("E", 1_000_000_000_000_000_000.0),
    ("P", 1_000_000_000_000_000.0),
    ("T", 1_000_000_000_000.0),
    ("G", 1_000_000_000.0),
    ("M", 1_000_000.0),
    ("k", 1_000.0),
    ("K", 1_000.0),
];

/// Parse a CPU quantity such as `250m`, `0.5` or `100000n` into millicores
pub fn parse_cpu_millicores(value: &str) -> Option<i64> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    let (number, multiplier) = if let Some(number) = raw.strip_suffix('m') {
        (number, 1.0)
    } else if let Some(number) = raw.strip_suffix('u') {
        (number, 0.001)
    } else if let Some(number) = raw.strip_suffix('n') {
        (number, 0.000_001)
    } else {
        (raw, 1000.0)
    };

    to_whole(number.parse::<f64>().ok()? * multiplier)
}

/// Parse a memory quantity such as `128Mi`, `1G` or `1e6` into bytes
pub fn parse_memory_bytes(value: &str) -> Option<i64> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    for (suffix, multiplier) in BINARY_SUFFIXES.iter().chain(DECIMAL_SUFFIXES.iter()) {
        if let Some(number) = raw.strip_suffix(suffix) {
            return to_whole(number.parse::<f64>().ok()? * multiplier);
        }
    }
    to_whole(raw.parse::<f64>().ok()?)
}

fn to_whole(value: f64) -> Option<i64> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 0.0 {
        return None;
    }
    Some(rounded as i64)
}

pub fn cpu_millicores(quantity: &Quantity) -> Option<i64> {
    parse_cpu_millicores(&quantity.0)
}

pub fn memory_bytes(quantity: &Quantity) -> Option<i64> {
    parse_memory_bytes(&quantity.0)
}

/// Millicores below one core, cores above
pub fn format_cpu(millicores: i64) -> String {
    if millicores < 1000 {
        format!("{millicores}m")
    } else {
        trim_decimals(millicores as f64 / 1000.0)
    }
}

/// Bytes in the largest binary unit that keeps the value at or under [`UNIT_ROLLOVER`]
pub fn format_memory(bytes: i64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value > UNIT_ROLLOVER && unit < MEMORY_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{}{}", trim_decimals(value), MEMORY_UNITS[unit])
}

/// Two decimal places at most, without trailing zeros
pub fn trim_decimals(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}
