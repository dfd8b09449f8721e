/// Utility functions for common operations across the codebase

/// Get the current wall-clock time in milliseconds since the Unix epoch.
///
/// Document timestamps (`createdAt`, `updatedAt`) and generated document
/// ids all use millisecond precision, which is what API consumers sort by.
pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
