// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::{OffsetDateTime, UtcOffset};

/// Light end of the loss gradient; a value of 0 maps here.
pub const SHADE_LIGHT: (u8, u8, u8) = (255, 237, 160);
/// Dark end of the loss gradient; the session's maximum loss maps here.
pub const SHADE_DARK: (u8, u8, u8) = (128, 0, 38);

/// Neutral color for counties with no joined summary.
pub const SHADE_NEUTRAL: (u8, u8, u8) = (80, 80, 80);

/// Abbreviate a dollar amount: `$1.00B`, `$1.00M`, `$1.0K`, else a grouped
/// rounded integer. Non-finite input is treated as 0.
pub fn format_currency_short(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    if value >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("${:.1}K", value / 1e3)
    } else {
        format!("${}", group_thousands(value.round() as i64))
    }
}

/// `MM/YY` label from the UTC month and year.
pub fn format_month_yy(dt: OffsetDateTime) -> String {
    let utc = dt.to_offset(UtcOffset::UTC);
    format!("{:02}/{:02}", utc.month() as u8, utc.year().rem_euclid(100))
}

/// `YYYY-MM-DD HH:MM UTC` label for the chart readout.
pub fn format_timestamp_utc(dt: OffsetDateTime) -> String {
    dt.to_offset(UtcOffset::UTC)
        .format(&time::macros::format_description!(
            "[year]-[month]-[day] [hour]:[minute] UTC"
        ))
        .unwrap_or_else(|_| dt.to_string())
}

/// Interpolate `value / max` on the fixed light→dark gradient.
///
/// Missing values shade as 0 and a non-positive `max` is floored at 1, so
/// the output is always a valid blend. The scale is relative: it changes
/// meaning whenever `max` changes.
pub fn shade(value: f64, max: f64) -> (u8, u8, u8) {
    let value = if value.is_finite() { value } else { 0.0 };
    let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
    let t = (value / max).clamp(0.0, 1.0);
    (
        lerp_channel(SHADE_LIGHT.0, SHADE_DARK.0, t),
        lerp_channel(SHADE_LIGHT.1, SHADE_DARK.1, t),
        lerp_channel(SHADE_LIGHT.2, SHADE_DARK.2, t),
    )
}

fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    (f64::from(from) + (f64::from(to) - f64::from(from)) * t).round() as u8
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
