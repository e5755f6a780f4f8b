//! Output formatting utilities

use chrono::{DateTime, Local, Utc};
use elimu_types::ResourceState;

/// Format bytes as human-readable
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "?".to_string();
    }
    human_bytes::human_bytes(bytes as f64)
}

/// Format a download time in local time
pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string())
}

/// Shorten long titles for table cells
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Icon shown next to a resource's state
pub fn state_icon(state: ResourceState) -> console::StyledObject<&'static str> {
    use console::style;

    match state {
        ResourceState::Downloaded => style("✓").green(),
        ResourceState::Downloading => style("↓").cyan(),
        ResourceState::NotDownloaded => style("·").dim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Kiswahili – Insha ya Kubuni", 12), "Kiswahili...");
    }

    #[test]
    fn unknown_size() {
        assert_eq!(format_bytes(0), "?");
        assert_eq!(format_time(None), "—");
    }
}
