//! Value formatting shared by the views.
//!
//! Zero values render as an empty string so idle rows stay visually quiet.

const PS_PER_NS: f64 = 1_000.0;
const PS_PER_US: f64 = 1_000_000.0;
const PS_PER_MS: f64 = 1_000_000_000.0;
const PS_PER_S: f64 = 1_000_000_000_000.0;

/// Format a picosecond timer value.
pub fn format_time(ps: u64) -> String {
    if ps == 0 {
        return String::new();
    }
    let ps = ps as f64;
    if ps >= 3600.0 * PS_PER_S {
        format!("{:.2} h", ps / (3600.0 * PS_PER_S))
    } else if ps >= 60.0 * PS_PER_S {
        format!("{:.2} m", ps / (60.0 * PS_PER_S))
    } else if ps >= PS_PER_S {
        format!("{:.2} s", ps / PS_PER_S)
    } else if ps >= PS_PER_MS {
        format!("{:.2} ms", ps / PS_PER_MS)
    } else if ps >= PS_PER_US {
        format!("{:.2} us", ps / PS_PER_US)
    } else if ps >= PS_PER_NS {
        format!("{:.2} ns", ps / PS_PER_NS)
    } else {
        format!("{} ps", ps)
    }
}

/// Format `part / whole` as a percentage.
pub fn format_pct(part: u64, whole: u64) -> String {
    if part == 0 || whole == 0 {
        return String::new();
    }
    format!("{:.1}%", 100.0 * part as f64 / whole as f64)
}

/// Format an event count with a decimal suffix.
pub fn format_amount(n: u64) -> String {
    if n == 0 {
        String::new()
    } else if n >= 1_000_000_000_000 {
        format!("{:.2} T", n as f64 / 1e12)
    } else if n >= 1_000_000_000 {
        format!("{:.2} G", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2} M", n as f64 / 1e6)
    } else if n >= 10_000 {
        format!("{:.2} k", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}

/// Format bytes to human-readable size.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        String::new()
    } else if bytes >= 1024 * 1024 * 1024 * 1024 {
        format!("{:.1} TiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1} GiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration in seconds to human-readable.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Cut `s` to at most `width` characters, marking the cut with `~`.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(width - 1).collect();
    out.push('~');
    out
}
