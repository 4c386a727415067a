//! Slicing policies over an entry sequence ordered newest first.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};

use super::filename::Entry;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Entries published before `marker` was downloaded
///
/// Stops at the first entry named `marker`, exclusive. Without a match the
/// whole sequence is new.
pub fn only_new_entities<I>(marker: &str, entries: I) -> impl Iterator<Item = Entry>
where
    I: IntoIterator<Item = Entry>,
{
    entries
        .into_iter()
        .take_while(move |entry| entry.to_file_name() != marker)
}

/// The most recent entry only
pub fn only_last_entity<I>(entries: I) -> impl Iterator<Item = Entry>
where
    I: IntoIterator<Item = Entry>,
{
    entries.into_iter().take(1)
}

/// Keeps entries published on or after a cutoff day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FromDate {
    cutoff: NaiveDate,
}

impl FromDate {
    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Compares calendar days only; the time of day is ignored
    pub fn keeps(&self, entry: &Entry) -> bool {
        entry.published_date().date() >= self.cutoff
    }

    /// Filter the whole sequence, preserving its order
    pub fn apply<I>(self, entries: I) -> impl Iterator<Item = Entry>
    where
        I: IntoIterator<Item = Entry>,
    {
        entries.into_iter().filter(move |entry| self.keeps(entry))
    }
}

pub fn only_entities_from_date(cutoff: NaiveDateTime) -> FromDate {
    FromDate {
        cutoff: cutoff.date(),
    }
}

/// `from_date` minus `day_number` days of 86 400 seconds, in local time
pub fn get_n_age_date(day_number: u32, from_date: NaiveDateTime) -> NaiveDateTime {
    n_days_before_in(&Local, day_number, from_date)
}

/// Day arithmetic through absolute time in the given zone
///
/// The subtraction happens on the instant, so a week spanning a DST change
/// ends one hour away from the starting wall clock time. An ambiguous local
/// time resolves to its earliest instant; a time inside a DST gap moves
/// forward by the gap, as `mktime` does. An age reaching past the earliest
/// representable date yields that date, which every entry is on or after.
pub fn n_days_before_in<Tz: TimeZone>(tz: &Tz, day_number: u32, from_date: NaiveDateTime) -> NaiveDateTime {
    let instant = tz
        .from_local_datetime(&from_date)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(from_date - TimeDelta::hours(1)))
                .earliest()
                .map(|before_gap| before_gap + TimeDelta::hours(1))
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&from_date));

    TimeDelta::try_seconds(i64::from(day_number) * SECONDS_PER_DAY)
        .and_then(|age| instant.checked_sub_signed(age))
        .map(|shifted| shifted.naive_local())
        .unwrap_or(NaiveDateTime::MIN)
}
