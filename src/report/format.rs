//! Deterministic text formatting shared by the summary sections.

/// Human-readable length of time: `"12.5s"` below a minute, `"2m 5s"` from
/// one minute up. Whole seconds are truncated, never rounded.
///
/// Values that would print as `"60.0s"` are reported as `"1m 0s"`.
pub fn format_duration(seconds: f64) -> String {
    let seconds = non_negative(seconds);
    if seconds < 60.0 && round_to(seconds, 1) < 60.0 {
        return format!("{}s", fixed(seconds, 1));
    }
    if seconds < 60.0 {
        return "1m 0s".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let whole_seconds = (seconds % 60.0).floor() as u64;
    format!("{}m {}s", minutes, whole_seconds)
}

/// Timestamp as `m:ss`, minutes unbounded.
pub fn format_time(seconds: f64) -> String {
    let seconds = non_negative(seconds);
    let minutes = (seconds / 60.0).floor() as u64;
    let whole_seconds = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, whole_seconds)
}

/// Fixed-point rendering with halves rounded away from zero.
///
/// `format!("{:.1}")` rounds ties to even, which would print a 62.5%
/// compliance rate as "62%" at zero decimals.
pub fn fixed(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let rounded = round_to(value, decimals);
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", decimals, rounded)
}

/// Ratio in 0..=1 as a whole percentage, e.g. `0.875` -> `"88"`.
pub fn percent(ratio: f64) -> String {
    fixed(ratio * 100.0, 0)
}

/// Picks the singular or plural form of a noun for `count`.
pub fn plural<'a>(count: u64, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// Seconds label without a trailing `.0`, e.g. `4.0` -> `"4"`, `2.5` -> `"2.5"`.
pub fn seconds_label(seconds: f64) -> String {
    let seconds = non_negative(seconds);
    if seconds.fract() == 0.0 {
        fixed(seconds, 0)
    } else {
        fixed(seconds, 1)
    }
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn non_negative(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}
