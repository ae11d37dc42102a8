//! Human-readable memory sizes.

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Formats a byte count as `"0B"`, `"N.NMB"` or `"N.NGB"`.
pub fn format_memory(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }

    let mb = bytes as f64 / BYTES_PER_MB;
    let gb = mb / 1024.0;
    if gb >= 1.0 {
        format!("{:.1}GB", gb)
    } else {
        format!("{:.1}MB", mb)
    }
}
