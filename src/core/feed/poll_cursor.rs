use chrono::{DateTime, Utc};

/// Global poll watermark shared by every channel and account.
///
/// Each cycle covers the half-open window `[cursor, cycle_start)`. Posts made
/// while a cycle is running fall into the next window, so every post is
/// eligible in exactly one cycle.
#[derive(Debug, Clone, Copy)]
pub struct PollCursor {
    since: DateTime<Utc>,
}

/// The time range one poll cycle is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PollWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

impl PollCursor {
    /// Nothing older than `since` is ever delivered.
    pub fn new(since: DateTime<Utc>) -> Self {
        Self { since }
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Window for a cycle starting at `cycle_start`.
    pub fn window(&self, cycle_start: DateTime<Utc>) -> PollWindow {
        PollWindow {
            start: self.since,
            end: cycle_start.max(self.since),
        }
    }

    /// Move past a finished window.
    pub fn advance(&mut self, window: PollWindow) {
        if window.end > self.since {
            self.since = window.end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_window_is_half_open() {
        let t0 = Utc::now();
        let cursor = PollCursor::new(t0);
        let window = cursor.window(t0 + Duration::seconds(60));

        assert!(window.contains(t0));
        assert!(window.contains(t0 + Duration::seconds(59)));
        assert!(!window.contains(t0 + Duration::seconds(60)));
        assert!(!window.contains(t0 - Duration::seconds(1)));
    }

    #[test]
    fn test_old_posts_never_reenter() {
        let t0 = Utc::now();
        let mut cursor = PollCursor::new(t0);
        let post_time = t0 + Duration::seconds(10);

        let first = cursor.window(t0 + Duration::seconds(60));
        assert!(first.contains(post_time));
        cursor.advance(first);

        let second = cursor.window(t0 + Duration::seconds(120));
        assert!(!second.contains(post_time));
        assert_eq!(cursor.since(), t0 + Duration::seconds(60));
    }

    #[test]
    fn test_clock_going_backwards_keeps_cursor() {
        let t0 = Utc::now();
        let mut cursor = PollCursor::new(t0);
        let window = cursor.window(t0 - Duration::seconds(5));

        assert_eq!(window.start, window.end);
        cursor.advance(window);
        assert_eq!(cursor.since(), t0);
    }
}
