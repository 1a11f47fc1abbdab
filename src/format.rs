// Human-readable byte sizes

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const STEP: f64 = 1024.0;

/// Formats a byte count in 1024-based units, rounded to two decimals ("1.5 KB").
/// Trailing zeros are dropped, so 1024 renders as "1 KB".
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= STEP && unit < UNITS.len() - 1 {
        value /= STEP;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_plain_bytes() {
        assert_eq!(format_bytes(0), "0 B");
    }

    #[test]
    fn whole_units_drop_decimals() {
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(512 * 1024 * 1024), "512 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2 GB");
    }

    #[test]
    fn fractions_round_to_two_places() {
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1023), "1023 B");
        // 1234567 / 1024^2 = 1.17737...
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
    }

    #[test]
    fn terabytes_is_the_largest_unit() {
        assert_eq!(format_bytes(1024u64.pow(5)), "1024 TB");
    }
}
