//! Human readable formatting for hashrates and durations.

use std::time::Duration;

/// Format a hashrate with the largest unit that keeps the value above one.
///
/// Zero renders as an empty string, matching how the status line leaves the
/// field blank before the first difficulty sample.
#[must_use]
pub fn hashrate(hashes_per_second: u64) -> String {
    let rate = hashes_per_second as f64;
    match hashes_per_second {
        h if h > 1_000_000_000_000 => format!("{:.3} TH/s", rate / 1e12),
        h if h > 1_000_000_000 => format!("{:.3} GH/s", rate / 1e9),
        h if h > 1_000_000 => format!("{:.3} MH/s", rate / 1e6),
        h if h > 1_000 => format!("{:.3} KH/s", rate / 1e3),
        h if h > 0 => format!("{h} H/s"),
        _ => String::new(),
    }
}

/// Format a duration rounded to whole seconds, e.g. `2h3m4s`.
#[must_use]
pub fn duration(value: Duration) -> String {
    let total = value.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Percentage of `part` in `whole`, guarded against an empty denominator.
#[must_use]
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
