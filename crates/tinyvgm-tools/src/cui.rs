pub mod check;
pub mod commands;
pub mod info;

use unicode_width::UnicodeWidthStr;

/// Pad `s` on the right to `width` terminal columns, counting fullwidth
/// characters (e.g. Japanese GD3 text) as two columns.
pub(crate) fn pad_to_width(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

/// Format a play time as `m:ss.mmm`.
pub(crate) fn format_time(duration: std::time::Duration) -> String {
    let millis = duration.as_millis();
    format!(
        "{}:{:02}.{:03}",
        millis / 60_000,
        (millis / 1000) % 60,
        millis % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pads_by_display_width() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("中村", 6), "中村  ");
        assert_eq!(pad_to_width("abcdef", 4), "abcdef");
    }

    #[test]
    fn formats_minutes_and_millis() {
        assert_eq!(format_time(Duration::from_millis(61_005)), "1:01.005");
        assert_eq!(format_time(Duration::ZERO), "0:00.000");
    }
}
