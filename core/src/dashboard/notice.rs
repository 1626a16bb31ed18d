use crate::render::counter::Clock;
use std::time::{Duration, Instant};

/// How long a banner stays up before it is removed.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Bad user-drawn shape, shown next to the map.
    Geometry,
    /// Failed request or unrenderable result, shown as a banner.
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    posted: Instant,
}

/// Transient, dismissible messages. Each expires [`NOTICE_TTL`] after posting.
#[derive(Debug, Clone)]
pub struct NoticeBoard<K> {
    clock: K,
    notices: Vec<Notice>,
    next_id: u64,
}

impl<K: Clock> NoticeBoard<K> {
    pub fn new(clock: K) -> Self {
        Self {
            clock,
            notices: Vec::new(),
            next_id: 0,
        }
    }

    pub fn post(&mut self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.notices.push(Notice {
            id: self.next_id,
            kind,
            message: message.into(),
            posted: self.clock.now(),
        });
        self.next_id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.notices.retain(|notice| notice.id != id);
    }

    /// Drops expired notices. Returns whether any are left.
    pub fn expire(&mut self) -> bool {
        let now = self.clock.now();
        self.notices
            .retain(|notice| now.saturating_duration_since(notice.posted) < NOTICE_TTL);
        !self.notices.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self, kind: NoticeKind) -> Option<&Notice> {
        self.notices.iter().rev().find(|notice| notice.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::counter::ManualClock;

    #[test]
    fn notices_expire_after_three_seconds() {
        let clock = ManualClock::new();
        let mut board = NoticeBoard::new(clock.clone());
        board.post(NoticeKind::Error, "network error: refused");
        clock.advance(Duration::from_secs(2));
        board.post(NoticeKind::Info, "later");

        assert!(board.expire());
        assert_eq!(board.active().count(), 2);

        clock.advance(Duration::from_millis(1500));
        assert!(board.expire());
        assert_eq!(board.active().count(), 1);
        assert!(board.latest(NoticeKind::Error).is_none());

        clock.advance(NOTICE_TTL);
        assert!(!board.expire());
    }

    #[test]
    fn dismiss_removes_a_single_notice() {
        let mut board = NoticeBoard::new(ManualClock::new());
        let first = board.post(NoticeKind::Geometry, "too few points");
        board.post(NoticeKind::Error, "boom");
        board.dismiss(first);
        assert!(board.latest(NoticeKind::Geometry).is_none());
        assert_eq!(board.active().count(), 1);
    }
}
