use chrono::Weekday;

/// Days whose overtime lands in the weekend bucket
pub const WEEKEND: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];

/// Vacation consumed by a half-day leave
pub const HALF_DAY_VALUE: f64 = 0.5;

/// At or below this many remaining vacation days the balance is flagged yellow
pub const LOW_VACATION_THRESHOLD: f64 = 5.0;

pub const TOKEN_LIFETIME_WEEKS: i64 = 1;
