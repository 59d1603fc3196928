use chrono::{DateTime, Utc};
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use super::theme::ThemeColors;

/// Format timestamp for display
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

/// Human-readable age such as "5 minutes ago".
/// Anything older than a month falls back to the calendar date.
pub fn format_relative_time(timestamp: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(*timestamp).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let (value, unit) = match seconds {
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 30 * 86_400 => (s / 86_400, "day"),
        _ => return timestamp.format("%Y-%m-%d").to_string(),
    };

    let plural = if value == 1 { "" } else { "s" };
    format!("{} {}{} ago", value, unit, plural)
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Wrap post content to the given width, one styled line per wrapped row
pub fn format_post_content(content: &str, theme: &ThemeColors, max_width: usize) -> Vec<Line<'static>> {
    let wrap_width = max_width.max(1);
    let mut lines = vec![];

    for line in content.lines() {
        if line.is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        for wrapped in textwrap::wrap(line, wrap_width) {
            lines.push(Line::from(Span::styled(
                wrapped.to_string(),
                Style::default().fg(theme.text),
            )));
        }
    }

    if lines.is_empty() {
        lines.push(Line::from(""));
    }
    lines
}

/// Character counter shown under composer fields, e.g. `12/100`
pub fn format_counter(count: usize, max: usize) -> String {
    format!("{}/{}", count, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time_units() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&now, now), "just now");
        assert_eq!(format_relative_time(&(now - Duration::minutes(1)), now), "1 minute ago");
        assert_eq!(format_relative_time(&(now - Duration::minutes(5)), now), "5 minutes ago");
        assert_eq!(format_relative_time(&(now - Duration::hours(3)), now), "3 hours ago");
        assert_eq!(format_relative_time(&(now - Duration::days(2)), now), "2 days ago");
    }

    #[test]
    fn test_old_posts_show_date() {
        let now = Utc::now();
        let old = now - Duration::days(90);
        assert_eq!(format_relative_time(&old, now), old.format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_future_timestamps_read_as_now() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&(now + Duration::minutes(2)), now), "just now");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("a longer title", 6), "a lon…");
    }

    #[test]
    fn test_content_wraps_to_width() {
        let theme = super::super::theme::get_theme_colors();
        let lines = format_post_content("one two three four", &theme, 9);
        assert_eq!(lines.len(), 2);
    }
}
