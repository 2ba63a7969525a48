use std::time::Duration;

/// Listing style: `3m 5s`, or `42s` under a minute.
pub fn format_duration(seconds: u32) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Player clock style: `m:ss`.
pub fn format_clock(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn song_count_label(count: usize) -> String {
    if count == 1 {
        "1 Song".to_string()
    } else {
        format!("{count} Songs")
    }
}
