//! Monotonic timestamp helper used by C6 (journal, §4.6) and I9.
//!
//! "If the wall clock moves backward, use `max(now, last_timestamp + 1ms)`."

use chrono::{DateTime, Utc};

/// Returns a timestamp that is strictly >= `last` (when `last` is `Some`)
/// and otherwise simply `Utc::now()`. Callers thread `last` through
/// consecutive appends so journal entries never regress even if the wall
/// clock does.
#[must_use]
pub fn next_timestamp(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match last {
        Some(last) if now <= last => last + chrono::Duration::milliseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_past_a_future_last_timestamp() {
        let last = Utc::now() + chrono::Duration::seconds(10);
        let next = next_timestamp(Some(last));
        assert!(next > last);
    }

    #[test]
    fn uses_now_when_no_prior_timestamp() {
        let before = Utc::now();
        let next = next_timestamp(None);
        assert!(next >= before);
    }

    #[test]
    fn monotonic_sequence_never_regresses() {
        let mut last = None;
        let mut prev = chrono::DateTime::<Utc>::MIN_UTC;
        for _ in 0..50 {
            let t = next_timestamp(last);
            assert!(t >= prev);
            prev = t;
            last = Some(t);
        }
    }
}
