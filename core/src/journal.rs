use chrono::{Datelike, NaiveDate};

use crate::models::CompletionLog;

/// Drinks per day the user is aiming for.
pub const DAILY_TARGET: u32 = 4;
/// Upper bound on a single day's logged drinks.
pub const MAX_DAILY: u32 = 10;
const STREAK_WINDOW_DAYS: i64 = 30;

#[must_use]
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Outcome of a single counter adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrinkUpdate {
    pub previous: u32,
    pub current: u32,
}

impl DrinkUpdate {
    /// True exactly when this update pushed the day across the target.
    #[must_use]
    pub fn reached_target(self) -> bool {
        self.current >= DAILY_TARGET && self.previous < DAILY_TARGET
    }
}

#[allow(clippy::cast_sign_loss)]
pub fn adjust(log: &mut CompletionLog, date: NaiveDate, delta: i32) -> DrinkUpdate {
    let key = day_key(date);
    let previous = log.get(&key).copied().unwrap_or(0);
    let current = (i64::from(previous) + i64::from(delta)).clamp(0, i64::from(MAX_DAILY)) as u32;
    log.insert(key, current);
    DrinkUpdate { previous, current }
}

pub fn reset(log: &mut CompletionLog, date: NaiveDate) {
    log.insert(day_key(date), 0);
}

#[must_use]
pub fn completed_on(log: &CompletionLog, date: NaiveDate) -> u32 {
    log.get(&day_key(date)).copied().unwrap_or(0)
}

/// Consecutive days reaching the target, counted from `today` backwards
/// within a 30-day window. A gap (including today) ends the streak.
#[must_use]
pub fn streak(log: &CompletionLog, today: NaiveDate) -> u32 {
    let mut streak = 0;
    for offset in 0..STREAK_WINDOW_DAYS {
        let day = today - chrono::Duration::days(offset);
        if completed_on(log, day) >= DAILY_TARGET {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Deterministic daily quote rotation: the same date always picks the same
/// quote.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn quote_index(date: NaiveDate, quote_count: usize) -> usize {
    if quote_count == 0 {
        return 0;
    }
    let seed = date.year().max(0) as usize * 1000 + date.month0() as usize * 32 + date.day() as usize;
    seed % quote_count
}
