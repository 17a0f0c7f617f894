use chrono::{DateTime, Utc};

/// Format a timestamp the way the backend's MariaDB layer expects it:
/// `YYYY-MM-DD HH:MM:SS`, UTC.
pub fn mariadb_timestamp(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}
