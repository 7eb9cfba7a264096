use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// SHA-256 of the raw fetched text, hex encoded.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of the parser identity and the raw fetched text, hex encoded.
///
/// The same text under a different parser gives a different fingerprint.
pub fn keyed_fingerprint(parser: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parser.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The parsed result of one fetched text, with the fingerprint it came from
/// and when the source last confirmed it.
///
/// Snapshots are never mutated. A revalidation produces a new snapshot that
/// shares the same parsed data.
#[derive(Debug)]
pub struct Snapshot<T> {
    fingerprint: String,
    data: Arc<T>,
    validated_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    pub fn new(fingerprint: String, data: Arc<T>, validated_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint,
            data,
            validated_at,
        }
    }

    /// Same fingerprint and data, validated again at `at`.
    pub fn revalidated(&self, at: DateTime<Utc>) -> Self {
        Self {
            fingerprint: self.fingerprint.clone(),
            data: Arc::clone(&self.data),
            validated_at: at,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn data(&self) -> &Arc<T> {
        &self.data
    }

    pub fn validated_at(&self) -> DateTime<Utc> {
        self.validated_at
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.validated_at < window
    }

    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.validated_at).num_minutes()
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let minutes = self.age_minutes(now);
        if minutes < 1 {
            // also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_at(validated_at: DateTime<Utc>) -> Snapshot<Vec<i32>> {
        Snapshot::new(fingerprint("a,b"), Arc::new(vec![1]), validated_at)
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        assert_eq!(fingerprint("a,b\n"), fingerprint("a,b\n"));
        assert_ne!(fingerprint("a,b\n"), fingerprint("a,c\n"));
        assert_eq!(fingerprint("").len(), 64);
    }

    #[test]
    fn test_keyed_fingerprint_depends_on_parser() {
        assert_eq!(keyed_fingerprint("p", "a,b"), keyed_fingerprint("p", "a,b"));
        assert_ne!(keyed_fingerprint("p", "a,b"), keyed_fingerprint("q", "a,b"));
        assert_ne!(keyed_fingerprint("p", "a,b"), fingerprint("a,b"));
        // the separator keeps parser and text from running together
        assert_ne!(keyed_fingerprint("ab", "c"), keyed_fingerprint("a", "bc"));
    }

    #[test]
    fn test_is_fresh_window() {
        let now = Utc::now();
        let snap = snapshot_at(now - Duration::seconds(299));
        assert!(snap.is_fresh(now, Duration::seconds(300)));
        let snap = snapshot_at(now - Duration::seconds(300));
        assert!(!snap.is_fresh(now, Duration::seconds(300)));
    }

    #[test]
    fn test_revalidated_shares_data() {
        let now = Utc::now();
        let snap = snapshot_at(now - Duration::hours(2));
        let again = snap.revalidated(now);
        assert!(Arc::ptr_eq(snap.data(), again.data()));
        assert_eq!(snap.fingerprint(), again.fingerprint());
        assert_eq!(again.validated_at(), now);
    }

    #[test]
    fn test_age_display() {
        let now = Utc::now();
        assert_eq!(snapshot_at(now).age_display(now), "just now");
        assert_eq!(snapshot_at(now + Duration::minutes(3)).age_display(now), "just now");
        assert_eq!(snapshot_at(now - Duration::minutes(5)).age_display(now), "5m ago");
        assert_eq!(snapshot_at(now - Duration::minutes(95)).age_display(now), "2h ago");
        assert_eq!(snapshot_at(now - Duration::minutes(70)).age_display(now), "1h ago");
        assert_eq!(snapshot_at(now - Duration::hours(50)).age_display(now), "2d ago");
    }
}
