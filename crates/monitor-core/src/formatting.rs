use chrono::{DateTime, Local, TimeZone};

/// `strftime` pattern used for output message timestamps.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Prefix `message` with the given timestamp.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use monitor_core::formatting::format_message_at;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
/// assert_eq!(format_message_at(&at, "Printing batch 1"), "<09.03.2024 07:05:01> Printing batch 1");
/// ```
pub fn format_message_at<Tz>(at: &DateTime<Tz>, message: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("<{}> {}", at.format(TIMESTAMP_FORMAT), message)
}

/// Prefix `message` with the current local wall-clock time.
pub fn format_message(message: &str) -> String {
    format_message_at(&Local::now(), message)
}

/// Header pushed before every batch.
pub fn batch_header(batch: u64) -> String {
    format!("Printing batch {batch}")
}

/// Return at most the last `n` lines of `content`, each with trailing
/// whitespace removed.
///
/// A trailing newline does not produce an empty final line.
///
/// # Examples
///
/// ```
/// use monitor_core::formatting::tail_lines;
///
/// assert_eq!(tail_lines("a\nb\nc\n", 2), vec!["b", "c"]);
/// assert_eq!(tail_lines("a  \r\nb", 5), vec!["a", "b"]);
/// assert!(tail_lines("", 3).is_empty());
/// ```
pub fn tail_lines(content: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..]
        .iter()
        .map(|line| line.trim_end().to_string())
        .collect()
}
