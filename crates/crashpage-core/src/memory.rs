//! Memory figures for the report footer

const KB: u64 = 1024;
const MB: u64 = 1_048_576;

/// Describe a byte count in `B`, `KB` or `MB`, rounded to two decimals
#[allow(clippy::cast_precision_loss)]
pub fn describe_memory(bytes: u64) -> String {
    if bytes < KB {
        return format!("{bytes}B");
    }
    if bytes < MB {
        return format!("{}KB", round2(bytes as f64 / KB as f64));
    }
    format!("{}MB", round2(bytes as f64 / MB as f64))
}

/// Two-decimal rounding without trailing zeros: 1.50 -> "1.5", 2.00 -> "2"
fn round2(value: f64) -> String {
    let formatted = format!("{value:.2}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Peak resident memory of this process, where the platform reports it
pub fn peak_memory_usage() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmHWM:"))
        .and_then(|value| value.trim().strip_suffix("kB"))
        .and_then(|kb| kb.trim().parse::<u64>().ok())
        .map(|kb| kb * KB)
}
