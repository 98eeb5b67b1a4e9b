use jiff::civil::{Date, DateTime};

/// Default number of days ahead that counts as "due soon"
pub const DUE_SOON_DAYS: i64 = 3;

const NANOS_PER_DAY: i128 = 86_400 * 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryStatus {
    pub is_expired: bool,
    pub is_today: bool,
    /// Whole days until the deadline, rounded up. Negative when overdue.
    pub days_remaining: i64,
}

impl ExpiryStatus {
    pub fn is_due_soon(&self, window_days: i64) -> bool {
        !self.is_expired && !self.is_today && self.days_remaining <= window_days
    }

    pub fn days_overdue(&self) -> i64 {
        if self.is_expired {
            -self.days_remaining
        } else {
            0
        }
    }
}

/// Classifies a deadline relative to `now`.
///
/// The deadline counts from the start of its day, so a deadline of today is
/// `is_today` for the whole day and becomes expired once the next day starts.
pub fn classify(deadline: Option<Date>, now: DateTime) -> Option<ExpiryStatus> {
    let deadline = deadline?;
    let until = now.duration_until(deadline.to_datetime(jiff::civil::Time::midnight()));
    let days_remaining = ceil_days(until.as_nanos());

    Some(ExpiryStatus {
        is_expired: days_remaining < 0,
        is_today: days_remaining == 0,
        days_remaining,
    })
}

fn ceil_days(nanos: i128) -> i64 {
    let days = nanos.div_euclid(NANOS_PER_DAY);
    let days = if nanos.rem_euclid(NANOS_PER_DAY) != 0 {
        days + 1
    } else {
        days
    };
    days as i64
}
