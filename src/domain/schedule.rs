//! When a habit reminder is due, and what it says.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, Utc};
use std::fmt::Write;

/// The scheduling fields of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSchedule {
    pub time: NaiveTime,
    pub period_days: i32,
    pub last_dispatch_time: Option<DateTime<Utc>>,
}

impl DispatchSchedule {
    /// Whether a reminder should go out at `now`.
    ///
    /// A habit that was never dispatched is due once the local time of day
    /// reaches its scheduled `time`; the date is not considered. Afterwards it
    /// is due every `period_days` days counted from the last dispatch.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        match self.last_dispatch_time {
            None => now.with_timezone(&offset).time() >= self.time,
            Some(last) => now >= last + Duration::days(i64::from(self.period_days)),
        }
    }
}

/// Content of a reminder message.
#[derive(Debug, Clone, Copy)]
pub struct Reminder<'a> {
    pub action: &'a str,
    pub time: NaiveTime,
    pub place: &'a str,
    pub length_seconds: i32,
    pub reward: Option<&'a str>,
    /// Action of the linked pleasant habit, if any.
    pub linked_action: Option<&'a str>,
}

impl Reminder<'_> {
    #[must_use]
    pub fn compose(&self) -> String {
        let mut text = String::from("Hi!\n");
        let _ = writeln!(
            text,
            "Time to do: {} at {}",
            self.action,
            self.time.format("%H:%M")
        );
        let _ = writeln!(text, "Place: {}", self.place);
        let _ = write!(text, "Duration: {} sec.", self.length_seconds);

        if let Some(reward) = self.reward.filter(|r| !r.trim().is_empty()) {
            let _ = write!(text, "\nReward: {reward}");
        } else if let Some(linked) = self.linked_action {
            let _ = write!(text, "\nAfterwards: {linked}");
        }

        text
    }
}

/// Builds a fixed offset from minutes east of UTC, falling back to UTC when out of range.
#[must_use]
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 19, 30, 0).unwrap()
    }

    #[test]
    fn test_never_dispatched_due_after_time_of_day() {
        let utc = offset_from_minutes(0);
        let schedule = DispatchSchedule {
            time: at(19, 0),
            period_days: 1,
            last_dispatch_time: None,
        };
        assert!(schedule.is_due(now(), utc));

        let exact = DispatchSchedule {
            time: at(19, 30),
            ..schedule
        };
        assert!(exact.is_due(now(), utc));

        let later = DispatchSchedule {
            time: at(20, 0),
            ..schedule
        };
        assert!(!later.is_due(now(), utc));
    }

    #[test]
    fn test_time_of_day_uses_offset() {
        let schedule = DispatchSchedule {
            time: at(21, 0),
            period_days: 1,
            last_dispatch_time: None,
        };
        assert!(!schedule.is_due(now(), offset_from_minutes(0)));
        // 19:30 UTC is 22:30 at +03:00
        assert!(schedule.is_due(now(), offset_from_minutes(180)));
    }

    #[test]
    fn test_dispatched_due_after_period() {
        let utc = offset_from_minutes(0);
        let schedule = DispatchSchedule {
            time: at(7, 0),
            period_days: 2,
            last_dispatch_time: Some(now() - Duration::days(1)),
        };
        assert!(!schedule.is_due(now(), utc));

        let two_days = DispatchSchedule {
            last_dispatch_time: Some(now() - Duration::days(2)),
            ..schedule
        };
        assert!(two_days.is_due(now(), utc));

        let almost = DispatchSchedule {
            last_dispatch_time: Some(now() - Duration::days(2) + Duration::seconds(1)),
            ..schedule
        };
        assert!(!almost.is_due(now(), utc));
    }

    #[test]
    fn test_compose_with_reward() {
        let text = Reminder {
            action: "Run",
            time: at(19, 0),
            place: "Park",
            length_seconds: 120,
            reward: Some("Smoothie"),
            linked_action: None,
        }
        .compose();

        assert_eq!(
            text,
            "Hi!\nTime to do: Run at 19:00\nPlace: Park\nDuration: 120 sec.\nReward: Smoothie"
        );
    }

    #[test]
    fn test_compose_with_linked_habit() {
        let text = Reminder {
            action: "Run",
            time: at(6, 5),
            place: "Park",
            length_seconds: 90,
            reward: None,
            linked_action: Some("Hot bath"),
        }
        .compose();

        assert!(text.contains("Time to do: Run at 06:05"));
        assert!(text.ends_with("Afterwards: Hot bath"));
        assert!(!text.contains("Reward"));
    }

    #[test]
    fn test_offset_out_of_range_falls_back_to_utc() {
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 0);
        assert_eq!(offset_from_minutes(-120).local_minus_utc(), -7200);
    }
}
