// System status display: store size, incidents by severity, bot status rows.

use anyhow::Result;
use std::sync::Arc;

use crate::db::IncidentStore;
use crate::output::terminal::colorize_severity;

/// Display system status to the terminal.
pub async fn show(store: &Arc<dyn IncidentStore>, db_display_path: &str) -> Result<()> {
    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    let counts = store.count_by_severity().await?;
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        println!("Incidents: none recorded yet");
    } else {
        println!("Incidents: {} total", total);
        for (severity, count) in counts.iter().rev() {
            println!("  {:<10} {}", colorize_severity(*severity), count);
        }
    }

    let statuses = store.get_all_bot_status().await?;
    if statuses.is_empty() {
        println!("Bot status: never reported");
    } else {
        for s in &statuses {
            println!(
                "Bot status [{}]: {} (last ping {}, {} analyzed, {} incidents, {} deleted, up {})",
                s.platform,
                s.status,
                s.last_ping,
                s.message_count,
                s.incidents_detected,
                s.messages_deleted,
                format_uptime(s.uptime_seconds),
            );
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_uptime(seconds: i64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(7300), "2h 1m");
    }
}
