const MIB: f64 = 1024.0 * 1024.0;

/// Formats a byte count as mebibytes with two decimals, e.g. `30.71 MB`.
pub fn format_mebibytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MIB)
}

/// Human readable size with an adaptive unit, used by the directory listing.
pub fn format_size<T: Into<f64>>(bytes: T) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes.into();
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if size < 10.0 && unit > 0 {
        format!("{:.1} {}", size, UNITS[unit])
    } else {
        format!("{:.0} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mebibytes_have_two_decimals() {
        assert_eq!(format_mebibytes(0), "0.00 MB");
        assert_eq!(format_mebibytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_mebibytes(32_200_000), "30.71 MB");
    }

    #[test]
    fn adaptive_size() {
        assert_eq!(format_size(512u32), "512 B");
        assert_eq!(format_size(2048u32), "2.0 KB");
        assert_eq!(format_size(50.0 * 1024.0 * 1024.0), "50 MB");
    }
}
