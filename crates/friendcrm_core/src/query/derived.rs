//! Birthday and reconnect reports computed from `list_friends`.
//!
//! # Invariants
//! - Reports only read through `StorageDriver::list_friends`.
//! - `now` is sampled once per report and reused for every record.
//! - Day counts are whole calendar days (UTC dates), not rounded durations.

use crate::model::friend::Friend;
use crate::storage::driver::StorageDriver;
use crate::storage::{ListFriendsFilter, StorageResult};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_BIRTHDAY_DAYS_AHEAD: u32 = 7;
pub const DEFAULT_RECONNECT_MIN_DAYS: u32 = 30;

/// A friend overdue for contact, with the whole days since last contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectSuggestion {
    pub friend: Friend,
    pub days_since_last_interaction: i64,
}

/// Returns the nearest date on or after `today` matching the birthday's
/// month and day.
///
/// Feb 29 birthdays fall on Mar 1 in non-leap years. Returns `None` only when
/// the date is not representable (year overflow).
pub fn next_birthday(birthday: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = birthday_in_year(birthday, today.year())?;
    if this_year < today {
        return birthday_in_year(birthday, today.year() + 1);
    }
    Some(this_year)
}

fn birthday_in_year(birthday: NaiveDate, year: i32) -> Option<NaiveDate> {
    birthday
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// Orders friends by next birthday, soonest first.
///
/// Friends without a birthday sort last. Ties fall back to name, then id.
pub fn compare_next_birthdays(a: &Friend, b: &Friend, today: NaiveDate) -> Ordering {
    let next_a = a.birthday.and_then(|date| next_birthday(date, today));
    let next_b = b.birthday.and_then(|date| next_birthday(date, today));
    let by_date = match (next_a, next_b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Friends whose next birthday is within `days_ahead` days of now.
pub async fn birthdays_soon<D>(driver: &D, days_ahead: u32) -> StorageResult<Vec<Friend>>
where
    D: StorageDriver + ?Sized,
{
    birthdays_soon_at(driver, days_ahead, Utc::now()).await
}

/// Same as [`birthdays_soon`] with an explicit `now`.
pub async fn birthdays_soon_at<D>(
    driver: &D,
    days_ahead: u32,
    now: DateTime<Utc>,
) -> StorageResult<Vec<Friend>>
where
    D: StorageDriver + ?Sized,
{
    let today = now.date_naive();
    let window = 0..=i64::from(days_ahead);
    let friends = driver.list_friends(&ListFriendsFilter::all()).await?;
    let scanned = friends.len();

    let mut upcoming: Vec<Friend> = friends
        .into_iter()
        .filter(|friend| {
            friend
                .birthday
                .and_then(|date| next_birthday(date, today))
                .is_some_and(|next| window.contains(&(next - today).num_days()))
        })
        .collect();
    upcoming.sort_by(|a, b| compare_next_birthdays(a, b, today));

    debug!(
        "event=birthdays_soon module=query status=ok days_ahead={} scanned={} matched={}",
        days_ahead,
        scanned,
        upcoming.len()
    );
    Ok(upcoming)
}

/// Friends whose last interaction is at least `min_days` days old, most
/// overdue first.
pub async fn reconnect_soon<D>(driver: &D, min_days: u32) -> StorageResult<Vec<ReconnectSuggestion>>
where
    D: StorageDriver + ?Sized,
{
    reconnect_soon_at(driver, min_days, Utc::now()).await
}

/// Same as [`reconnect_soon`] with an explicit `now`.
pub async fn reconnect_soon_at<D>(
    driver: &D,
    min_days: u32,
    now: DateTime<Utc>,
) -> StorageResult<Vec<ReconnectSuggestion>>
where
    D: StorageDriver + ?Sized,
{
    let today = now.date_naive();
    let friends = driver.list_friends(&ListFriendsFilter::all()).await?;
    let scanned = friends.len();

    let mut overdue: Vec<(DateTime<Utc>, Friend)> = friends
        .into_iter()
        .filter_map(|friend| {
            let most_recent = friend.most_recent_interaction()?;
            let days = (today - most_recent.date_naive()).num_days();
            (days >= i64::from(min_days)).then_some((most_recent, friend))
        })
        .collect();
    overdue.sort_by(|(a_recent, a), (b_recent, b)| {
        a_recent
            .cmp(b_recent)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });

    debug!(
        "event=reconnect_soon module=query status=ok min_days={} scanned={} matched={}",
        min_days,
        scanned,
        overdue.len()
    );
    Ok(overdue
        .into_iter()
        .map(|(most_recent, friend)| ReconnectSuggestion {
            days_since_last_interaction: (today - most_recent.date_naive()).num_days(),
            friend,
        })
        .collect())
}
