// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Lowercases a display name and replaces spaces with underscores, producing
/// the form used as a store index key.
pub fn make_safe_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

const TIME_ORDER_SUFFIXES: [&str; 4] = ["ns", "\u{3bc}s", "ms", "s"];

/// Formats a nanosecond duration with the smallest suffix that keeps the
/// value under 1000.
pub fn format_time(nanos: u64) -> String {
    let mut value = nanos as f64;
    let mut suffix = TIME_ORDER_SUFFIXES[0];

    for next in TIME_ORDER_SUFFIXES {
        suffix = next;
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
    }

    format!("{value:.2}{suffix}")
}

/// Seconds since the unix epoch.
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
