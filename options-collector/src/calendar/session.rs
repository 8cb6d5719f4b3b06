//! Regular trading session gate.
//!
//! Pure and stateless: every decision is recomputed from the timestamp it is
//! given, converted into the exchange timezone first so the host's local
//! timezone never matters.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use super::holidays::observed_holiday;

/// Regular session open, exchange-local.
pub const DEFAULT_OPEN: NaiveTime = match NaiveTime::from_hms_opt(9, 30, 0) {
    Some(t) => t,
    None => panic!("invalid session open"),
};

/// Regular session close, exchange-local. Exclusive.
pub const DEFAULT_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(16, 0, 0) {
    Some(t) => t,
    None => panic!("invalid session close"),
};

/// Why the session is open or closed at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Weekend,
    Holiday(&'static str),
    OutsideHours,
}

impl SessionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "market open"),
            Self::Weekend => write!(f, "market closed (weekend)"),
            Self::Holiday(name) => write!(f, "market closed ({})", name),
            Self::OutsideHours => write!(f, "market closed (outside regular hours)"),
        }
    }
}

/// Exchange session calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionCalendar {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
}

impl Default for SessionCalendar {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
            open: DEFAULT_OPEN,
            close: DEFAULT_CLOSE,
        }
    }
}

impl SessionCalendar {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime) -> Self {
        Self { tz, open, close }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Current wall-clock time in the exchange timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Classify an instant against the session rules.
    pub fn session_status<T: TimeZone>(&self, now: &DateTime<T>) -> SessionStatus {
        let local = now.with_timezone(&self.tz);

        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return SessionStatus::Weekend;
        }

        if let Some(holiday) = observed_holiday(local.date_naive()) {
            return SessionStatus::Holiday(holiday.name);
        }

        let time = local.time();
        if time >= self.open && time < self.close {
            SessionStatus::Open
        } else {
            SessionStatus::OutsideHours
        }
    }

    /// Whether `now` falls inside a regular trading session.
    pub fn is_session_open<T: TimeZone>(&self, now: &DateTime<T>) -> bool {
        self.session_status(now).is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use chrono_tz::America::New_York;

    fn eastern(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Tz> {
        New_York.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_regular_weekday_open() {
        let cal = SessionCalendar::default();
        // Wednesday
        assert_eq!(cal.session_status(&eastern(2025, 6, 18, 10, 0, 0)), SessionStatus::Open);
    }

    #[test]
    fn test_session_bounds() {
        let cal = SessionCalendar::default();
        assert!(!cal.is_session_open(&eastern(2025, 6, 18, 9, 29, 59)));
        assert!(cal.is_session_open(&eastern(2025, 6, 18, 9, 30, 0)));
        assert!(cal.is_session_open(&eastern(2025, 6, 18, 15, 59, 59)));
        assert!(!cal.is_session_open(&eastern(2025, 6, 18, 16, 0, 0)));
    }

    #[test]
    fn test_weekends_always_closed() {
        let cal = SessionCalendar::default();
        let mut day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();

        while day <= end {
            if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                for hour in [0, 9, 10, 12, 15, 23] {
                    let ts = eastern(day.year(), day.month(), day.day(), hour, 30, 0);
                    assert_eq!(cal.session_status(&ts), SessionStatus::Weekend, "{}", ts);
                }
            }
            day += Duration::days(1);
        }
    }

    #[test]
    fn test_observed_holidays_closed() {
        let cal = SessionCalendar::default();
        // Independence Day 2026 (Sat) observed Fri 2026-07-03
        assert_eq!(
            cal.session_status(&eastern(2026, 7, 3, 11, 0, 0)),
            SessionStatus::Holiday("Independence Day")
        );
        // Independence Day 2021 (Sun) observed Mon 2021-07-05
        assert_eq!(
            cal.session_status(&eastern(2021, 7, 5, 11, 0, 0)),
            SessionStatus::Holiday("Independence Day")
        );
        // Juneteenth 2025 is a Thursday; the Friday after is a normal day
        assert!(cal.is_session_open(&eastern(2025, 6, 20, 11, 0, 0)));
        assert!(!cal.is_session_open(&eastern(2025, 6, 19, 11, 0, 0)));
    }

    #[test]
    fn test_utc_input_is_converted() {
        let cal = SessionCalendar::default();
        // Summer: EDT = UTC-4
        let open = Utc.with_ymd_and_hms(2025, 6, 18, 13, 30, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 6, 18, 13, 29, 0).unwrap();
        assert!(cal.is_session_open(&open));
        assert!(!cal.is_session_open(&before));

        // Winter: EST = UTC-5
        let open = Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 1, 15, 14, 29, 0).unwrap();
        assert!(cal.is_session_open(&open));
        assert!(!cal.is_session_open(&before));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Holiday("Christmas Day").to_string(), "market closed (Christmas Day)");
        assert_eq!(SessionStatus::Open.to_string(), "market open");
    }
}
