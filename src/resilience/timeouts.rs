//! Deadline helpers.
//!
//! Used inside `tokio::select!` so that an optional deadline is just another
//! branch: with no deadline the branch never fires.

use std::time::Duration;

/// Convert an optional number of seconds into a duration.
pub fn seconds(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}

/// Resolve after `after`, or never when `after` is `None`.
pub async fn expire(after: Option<Duration>) {
    match after {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expires_after_duration() {
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            expire(Some(Duration::from_millis(10))),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn never_expires_without_deadline() {
        let result = tokio::time::timeout(Duration::from_millis(50), expire(None)).await;
        assert!(result.is_err());
    }

    #[test]
    fn converts_seconds() {
        assert_eq!(seconds(Some(3)), Some(Duration::from_secs(3)));
        assert_eq!(seconds(None), None);
    }
}
