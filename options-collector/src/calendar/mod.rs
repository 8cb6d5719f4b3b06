//! Market calendar: holiday table and regular-session gate.

pub mod holidays;
pub mod session;

pub use holidays::{holidays, observed_date, observed_holiday, Holiday, GOOD_FRIDAY_REFERENCE};
pub use session::{SessionCalendar, SessionStatus, DEFAULT_CLOSE, DEFAULT_OPEN};
