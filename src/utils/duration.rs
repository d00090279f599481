// src/utils/duration.rs

//! ISO-8601 period parsing for video durations.

use std::sync::LazyLock;

use regex::Regex;

static PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("period pattern is valid")
});

/// Convert a period string such as `PT1H2M3S` into whole seconds.
///
/// Days, hours, minutes and seconds are each optional. Empty, malformed or
/// overflowing input yields `0`.
pub fn parse_duration(raw: &str) -> u64 {
    let raw = raw.trim();
    let Some(caps) = PERIOD.captures(raw) else {
        return 0;
    };

    let units = [(1, 86_400u64), (2, 3_600), (3, 60), (4, 1)];
    let mut total: u64 = 0;
    for (group, factor) in units {
        let Some(m) = caps.get(group) else { continue };
        let Ok(value) = m.as_str().parse::<u64>() else {
            return 0;
        };
        let Some(next) = value
            .checked_mul(factor)
            .and_then(|part| total.checked_add(part))
        else {
            return 0;
        };
        total = next;
    }
    total
}

/// Render seconds as `H:MM:SS` or `M:SS`; `0` renders as "Unknown".
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "Unknown".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
