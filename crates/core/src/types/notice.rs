//! Short-lived success and error messages for the visitor.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    /// How long a notice of this level stays visible.
    #[must_use]
    pub const fn lifetime(self) -> Duration {
        match self {
            Self::Success => Duration::seconds(3),
            Self::Error => Duration::seconds(4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    #[must_use]
    pub fn new(level: NoticeLevel, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            level,
            text: text.into(),
            expires_at: now + level.lifetime(),
        }
    }

    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Pending notices in posting order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn success(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.push(Notice::new(NoticeLevel::Success, text, now), now);
    }

    pub fn error(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.push(Notice::new(NoticeLevel::Error, text, now), now);
    }

    // Undrained queues only ever hold live notices.
    fn push(&mut self, notice: Notice, now: DateTime<Utc>) {
        self.0.retain(|pending| pending.is_live(now));
        self.0.push(notice);
    }

    /// Take every live notice, discarding the expired ones.
    pub fn drain_live(&mut self, now: DateTime<Utc>) -> Vec<Notice> {
        std::mem::take(&mut self.0)
            .into_iter()
            .filter(|notice| notice.is_live(now))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetimes() {
        let now = Utc::now();
        let ok = Notice::new(NoticeLevel::Success, "Saved", now);
        let err = Notice::new(NoticeLevel::Error, "Failed", now);
        assert_eq!(ok.expires_at - now, Duration::seconds(3));
        assert_eq!(err.expires_at - now, Duration::seconds(4));
        assert!(ok.is_live(now + Duration::milliseconds(2999)));
        assert!(!ok.is_live(now + Duration::seconds(3)));
    }

    #[test]
    fn test_drain_drops_expired_and_empties_queue() {
        let now = Utc::now();
        let mut notices = Notices::default();
        notices.success("Item added to cart", now);
        notices.error("Product is out of stock", now);

        let later = now + Duration::milliseconds(3500);
        let live = notices.drain_live(later);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].level, NoticeLevel::Error);
        assert!(notices.is_empty());
        assert!(notices.drain_live(later).is_empty());
    }

    #[test]
    fn test_posting_discards_expired_notices() {
        let start = Utc::now();
        let mut notices = Notices::default();
        for i in 0..1000 {
            notices.success("Item added to cart", start + Duration::seconds(10 * i));
        }
        assert_eq!(notices.len(), 1);

        let now = start + Duration::seconds(10_000);
        notices.error("Failed to add item into cart", now);
        notices.success("Item added to cart", now + Duration::seconds(1));
        assert_eq!(notices.len(), 2);
    }
}
